//! Dependency expression (DEPEX) compilation.
//!
//! A generated dependency expression is either the constant "always satisfied" or a list of GUIDs
//! that must all be present. The list form compiles to postfix bytecode: one `PUSH <guid>` per
//! operand in input order, `N - 1` `AND` opcodes, and a final `END`.
//!
//! The section type of the result, and the opcode set used, follow the execution phase of the file
//! type the expression is generated for.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use alloc::vec::Vec;
use ffsgen_pi::{
    depex::OpcodeSet,
    fw_fs::ffs::{file, section},
};
use r_efi::efi;

use crate::{FfsGenError, guid, section::EncodedSection};

/// Operand text that denotes the "always satisfied" expression.
pub const TRUE_OPERAND: &str = "TRUE";

/// A dependency expression to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyExpression {
    /// Always satisfied.
    AlwaysTrue,
    /// Satisfied when every listed GUID is present.
    All(Vec<efi::Guid>),
}

impl DependencyExpression {
    /// Build an expression from operand strings.
    ///
    /// `all_true`, or a single operand equal to `TRUE` (any case), yields
    /// [`DependencyExpression::AlwaysTrue`]. Otherwise every operand must be a canonical GUID and at
    /// least one operand is required.
    pub fn from_operands<S: AsRef<str>>(operands: &[S], all_true: bool) -> Result<Self, FfsGenError> {
        if all_true {
            return Ok(DependencyExpression::AlwaysTrue);
        }
        match operands {
            [] => Err(FfsGenError::EmptyDependencyExpression),
            [single] if single.as_ref().trim().eq_ignore_ascii_case(TRUE_OPERAND) => {
                Ok(DependencyExpression::AlwaysTrue)
            }
            _ => operands
                .iter()
                .map(|operand| guid::parse(operand.as_ref().trim()))
                .collect::<Result<Vec<_>, _>>()
                .map(DependencyExpression::All),
        }
    }

    /// Parse operands separated by whitespace and/or commas.
    ///
    /// ```rust
    /// use ffsgen::depex::DependencyExpression;
    ///
    /// assert_eq!(DependencyExpression::parse("true").unwrap(), DependencyExpression::AlwaysTrue);
    /// let depex = DependencyExpression::parse(
    ///     "26baccb1-6f42-11d4-bce7-0080c73c8881, 1e5668e2-8481-11d4-bcf1-0080c73c8881",
    /// ).unwrap();
    /// assert!(matches!(depex, DependencyExpression::All(ref guids) if guids.len() == 2));
    /// ```
    pub fn parse(text: &str) -> Result<Self, FfsGenError> {
        let operands: Vec<&str> = split_operands(text).collect();
        Self::from_operands(&operands, false)
    }

    /// Compile to bytecode using `opcodes`.
    pub fn compile(&self, opcodes: &OpcodeSet) -> Vec<u8> {
        match self {
            DependencyExpression::AlwaysTrue => alloc::vec![opcodes.r#true, opcodes.end],
            DependencyExpression::All(guids) => {
                let mut bytecode = Vec::with_capacity(guids.len() * 18 + 1);
                for guid in guids {
                    bytecode.push(opcodes.push);
                    bytecode.extend_from_slice(guid.as_bytes());
                }
                bytecode.extend(core::iter::repeat_n(opcodes.and, guids.len().saturating_sub(1)));
                bytecode.push(opcodes.end);
                bytecode
            }
        }
    }

    /// Compile into the dependency expression section for `file_type`.
    ///
    /// Returns [`FfsGenError::NoDepexPhase`] if no dispatcher evaluates expressions for the file type.
    pub fn encode(&self, file_type: file::Type) -> Result<EncodedSection, FfsGenError> {
        let phase = file_type.depex_phase().ok_or(FfsGenError::NoDepexPhase(file_type.name()))?;
        let bytecode = self.compile(phase.opcodes());
        log::debug!("compiled {:?} dependency expression for {}: {} bytes", phase, file_type.name(), bytecode.len());
        crate::section::encode(phase.section_type(), &bytecode)
    }
}

/// Compile `operands` (or the "always true" form) into the dependency expression section for
/// `file_type`.
pub fn encode<S: AsRef<str>>(
    file_type: file::Type,
    operands: &[S],
    all_true: bool,
) -> Result<EncodedSection, FfsGenError> {
    DependencyExpression::from_operands(operands, all_true)?.encode(file_type)
}

/// Split operand text on commas and whitespace, dropping empty pieces.
pub fn split_operands(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c == ',' || c.is_ascii_whitespace()).filter(|s| !s.is_empty())
}

/// Whether `section_type` is the dependency expression section type for `file_type`.
pub fn matches_phase(section_type: section::Type, file_type: file::Type) -> bool {
    file_type.depex_phase().is_some_and(|phase| phase.section_type() == section_type)
}
