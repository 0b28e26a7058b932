//! Dependency expression (DEPEX) definitions.
//!
//! Based on the UEFI Platform Initialization (PI) Specification V1.8A, Volume 1 Section 9 (PEI) and
//! Volume 2 Section 10 (DXE and MM) Dependency Expression Grammar.
//!
//! ## License
//!
//! Copyright (C) Microsoft Corporation.
//!
//! SPDX-License-Identifier: BSD-2-Clause-Patent
//!
use crate::fw_fs::ffs::section;

/// Raw dependency expression opcode values.
pub mod opcode {
    /// Schedule before the GUID operand; first and only opcode.
    pub const BEFORE: u8 = 0x00;
    /// Schedule after the GUID operand; first and only opcode.
    pub const AFTER: u8 = 0x01;
    /// Push the presence of the GUID operand onto the stack.
    pub const PUSH: u8 = 0x02;
    /// Logical AND of the two operands on top of the stack.
    pub const AND: u8 = 0x03;
    /// Logical OR of the two operands on top of the stack.
    pub const OR: u8 = 0x04;
    /// Logical NOT of the operand on top of the stack.
    pub const NOT: u8 = 0x05;
    /// Push TRUE.
    pub const TRUE: u8 = 0x06;
    /// Push FALSE.
    pub const FALSE: u8 = 0x07;
    /// Last opcode of every expression.
    pub const END: u8 = 0x08;
    /// Schedule on request; must be the first opcode.
    pub const SOR: u8 = 0x09;
}

/// Opcode set understood by the dispatcher of one execution phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeSet {
    /// PUSH opcode.
    pub push: u8,
    /// AND opcode.
    pub and: u8,
    /// TRUE opcode.
    pub r#true: u8,
    /// END opcode.
    pub end: u8,
    /// Whether BEFORE, AFTER and SOR are accepted by this phase.
    pub scheduling: bool,
}

const PEI_OPCODES: OpcodeSet =
    OpcodeSet { push: opcode::PUSH, and: opcode::AND, r#true: opcode::TRUE, end: opcode::END, scheduling: false };
const DXE_OPCODES: OpcodeSet =
    OpcodeSet { push: opcode::PUSH, and: opcode::AND, r#true: opcode::TRUE, end: opcode::END, scheduling: true };
const MM_OPCODES: OpcodeSet = DXE_OPCODES;

/// Boot phase whose dispatcher evaluates a dependency expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Pre-EFI Initialization (PEIM dispatch).
    Pei,
    /// Driver Execution Environment (boot driver dispatch).
    Dxe,
    /// Management Mode (SMM/MM driver dispatch).
    Mm,
}

impl Phase {
    /// Section type that carries dependency expressions for this phase.
    pub fn section_type(self) -> section::Type {
        match self {
            Phase::Pei => section::Type::PeiDepex,
            Phase::Dxe => section::Type::DxeDepex,
            Phase::Mm => section::Type::MmDepex,
        }
    }

    /// Opcode set accepted by this phase.
    pub fn opcodes(self) -> &'static OpcodeSet {
        match self {
            Phase::Pei => &PEI_OPCODES,
            Phase::Dxe => &DXE_OPCODES,
            Phase::Mm => &MM_OPCODES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases_select_their_section_types() {
        assert_eq!(Phase::Pei.section_type().raw(), 0x1B);
        assert_eq!(Phase::Dxe.section_type().raw(), 0x13);
        assert_eq!(Phase::Mm.section_type().raw(), 0x1C);
    }

    #[test]
    fn test_only_dxe_and_mm_accept_scheduling_opcodes() {
        assert!(!Phase::Pei.opcodes().scheduling);
        assert!(Phase::Dxe.opcodes().scheduling);
        assert!(Phase::Mm.opcodes().scheduling);
        assert_eq!(Phase::Pei.opcodes().end, opcode::END);
    }
}
