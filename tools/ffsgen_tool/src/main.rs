//! Executable for generating Firmware File System (FFS) files.
//!
//! ```text
//! ffsgen [OPTIONS] -o <OUTPUT> [INPUT]...
//! ```
//!
//! Each input is written as `[TYPE:]PATH`, where `TYPE` is a section type name such as `PE32` or
//! `EFI_SECTION_RAW`. With `--auto-detect`, the type of an untyped input is taken from its file name.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
mod logger;

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use ffsgen::{
    FfsGenError,
    request::{FileRequest, InputItem},
};
use ffsgen_compressors::CompositeCompressor;
use ffsgen_pi::fw_fs::ffs::section;

#[derive(Parser, Debug)]
#[command(name = "ffsgen", version, about = "Generate a UEFI PI firmware file from section payloads")]
struct Args {
    /// Input payloads, in section order, written as `[TYPE:]PATH`.
    inputs: Vec<String>,
    /// Path for the generated file.
    #[arg(short, long)]
    output: PathBuf,
    /// Display name; emitted as a USER_INTERFACE section and used to derive the file GUID.
    #[arg(short, long)]
    name: Option<String>,
    /// File type name, e.g. DRIVER or EFI_FV_FILETYPE_PEIM. Defaults to FREEFORM.
    #[arg(short = 't', long)]
    file_type: Option<String>,
    /// Version string; emitted as a VERSION section.
    #[arg(long)]
    version_string: Option<String>,
    /// Build number stored in VERSION sections.
    #[arg(long, default_value_t = 0)]
    build_number: u16,
    /// Explicit file GUID in 8-4-4-4-12 form.
    #[arg(short, long)]
    guid: Option<String>,
    /// File GUID to use when neither --guid nor --name is given.
    #[arg(long)]
    default_guid: Option<String>,
    /// Dependency expression operands (GUIDs separated by spaces or commas), or TRUE.
    #[arg(short, long)]
    depex: Option<String>,
    /// Compress all sections into one GUID-defined section.
    #[arg(short, long, default_value_t = false)]
    compress: bool,
    /// Algorithm used by --compress.
    #[arg(long, default_value = "lzma", value_name = "ALGORITHM")]
    compression_algorithm: String,
    /// Detect the section type of untyped inputs from their file names.
    #[arg(short, long, default_value_t = false)]
    auto_detect: bool,
    /// Store the fixed file checksum instead of computing one.
    #[arg(long, default_value_t = false)]
    fixed_checksum: bool,
    /// Increase log verbosity; may be repeated.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Failures of the tool: file access or generation.
#[derive(Debug)]
enum ToolError {
    Read { path: PathBuf, source: io::Error },
    Write { path: PathBuf, source: io::Error },
    Generate(FfsGenError),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::Read { path, source } => write!(f, "cannot read '{}': {source}", path.display()),
            ToolError::Write { path, source } => write!(f, "cannot write '{}': {source}", path.display()),
            ToolError::Generate(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ToolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ToolError::Read { source, .. } | ToolError::Write { source, .. } => Some(source),
            ToolError::Generate(err) => Some(err),
        }
    }
}

impl From<FfsGenError> for ToolError {
    fn from(err: FfsGenError) -> Self {
        ToolError::Generate(err)
    }
}

/// Split an input argument into its optional section type and path.
///
/// The text before the first `:` is treated as a type only if it names a section type, so paths
/// that contain a colon (such as drive letters) are left intact.
fn parse_input(input: &str) -> Result<(Option<section::Type>, &str), FfsGenError> {
    match input.split_once(':') {
        Some((prefix, path)) if !path.is_empty() => match section::Type::from_name(prefix) {
            Some(section_type) => Ok((Some(section_type), path)),
            None if prefix.len() > 1 && !prefix.contains(['/', '\\', '.']) => {
                Err(FfsGenError::UnknownSectionType(prefix.to_string()))
            }
            None => Ok((None, input)),
        },
        _ => Ok((None, input)),
    }
}

fn read_input(input: &str) -> Result<InputItem, ToolError> {
    let (section_type, path) = parse_input(input)?;
    let data = fs::read(path).map_err(|source| ToolError::Read { path: PathBuf::from(path), source })?;
    log::info!("read {} bytes from '{}'", data.len(), path);

    let mut item = InputItem::new(path, data);
    if let Some(section_type) = section_type {
        item = item.with_section_type(section_type);
    }
    Ok(item)
}

fn build_request(args: &Args) -> Result<FileRequest, ToolError> {
    let items = args.inputs.iter().map(|input| read_input(input)).collect::<Result<Vec<_>, _>>()?;

    let mut request = FileRequest::new()
        .with_items(items)
        .with_build_number(args.build_number)
        .with_auto_detect(args.auto_detect)
        .with_fixed_checksum(args.fixed_checksum);
    if let Some(name) = &args.name {
        request = request.with_name(name.as_str());
    }
    if let Some(file_type) = &args.file_type {
        request = request.with_file_type(file_type.as_str());
    }
    if let Some(version) = &args.version_string {
        request = request.with_version(version.as_str());
    }
    if let Some(guid) = &args.guid {
        request = request.with_guid(guid.as_str());
    }
    if let Some(guid) = &args.default_guid {
        request = request.with_default_guid(guid.as_str());
    }
    if let Some(depex) = &args.depex {
        request = request.with_depex_text(depex);
    }
    if args.compress {
        request = request.with_compression(args.compression_algorithm.as_str());
    }
    Ok(request)
}

fn run(args: &Args) -> Result<(), ToolError> {
    let request = build_request(args)?;
    let file = request.build(&CompositeCompressor::default())?;
    write_output(&args.output, &file)?;
    log::info!("wrote {} bytes to '{}'", file.len(), args.output.display());
    Ok(())
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<(), ToolError> {
    fs::write(path, bytes).map_err(|source| ToolError::Write { path: path.to_path_buf(), source })
}

fn main() -> ExitCode {
    let args = Args::parse();
    logger::init(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ffsgen: error: {err}");
            ExitCode::FAILURE
        }
    }
}
