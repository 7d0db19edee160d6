use parse_display::Display;

use crate::constants::{Word, REGISTER_FILE_SIZE};

/// 8-bit halves of the general purpose registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[allow(clippy::upper_case_acronyms)]
pub enum Reg8 {
    AL,
    AH,
    BL,
    BH,
    CL,
    CH,
    DL,
    DH,
}

impl Reg8 {
    /// Position of this half in the register bank
    const fn offset(self) -> usize {
        match self {
            Self::AL => 0,
            Self::AH => 1,
            Self::BL => 2,
            Self::BH => 3,
            Self::CL => 4,
            Self::CH => 5,
            Self::DL => 6,
            Self::DH => 7,
        }
    }
}

/// 16-bit registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[allow(clippy::upper_case_acronyms)]
pub enum Reg16 {
    /// Accumulator
    AX,
    /// Base
    BX,
    /// Counter
    CX,
    /// Data
    DX,
    /// Source index
    SI,
    /// Destination index
    DI,
    /// Base pointer
    BP,
    /// Stack pointer
    SP,
    /// Instruction pointer
    IP,
    /// Code segment
    CS,
    /// Data segment
    DS,
    /// Extra segment
    ES,
    /// Stack segment
    SS,
    /// Flags, never altered by the supported instructions
    FLAGS,
}

impl Reg16 {
    pub const ALL: [Reg16; 14] = [
        Self::AX,
        Self::BX,
        Self::CX,
        Self::DX,
        Self::SI,
        Self::DI,
        Self::BP,
        Self::SP,
        Self::IP,
        Self::CS,
        Self::DS,
        Self::ES,
        Self::SS,
        Self::FLAGS,
    ];

    /// Position of the low byte in the register bank
    const fn offset(self) -> usize {
        self as usize * 2
    }
}

/// The register bank.
///
/// Every 16-bit register is two consecutive bytes, low byte first. The 8-bit
/// registers are views over the first four of them, so writing `AH` changes
/// the high byte of `AX` and writing `AX` changes both `AH` and `AL`.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct Registers {
    bank: [u8; REGISTER_FILE_SIZE],
}

impl Registers {
    #[must_use]
    pub const fn byte(&self, reg: Reg8) -> u8 {
        self.bank[reg.offset()]
    }

    pub fn set_byte(&mut self, reg: Reg8, value: u8) {
        self.bank[reg.offset()] = value;
    }

    #[must_use]
    pub const fn word(&self, reg: Reg16) -> Word {
        let offset = reg.offset();
        Word::from_le_bytes([self.bank[offset], self.bank[offset + 1]])
    }

    pub fn set_word(&mut self, reg: Reg16, value: Word) {
        let offset = reg.offset();
        self.bank[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }
}

impl std::fmt::Debug for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for reg in Reg16::ALL {
            map.entry(&reg, &format_args!("{:#06x}", self.word(reg)));
        }
        map.finish()
    }
}

impl std::fmt::Display for Registers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, reg) in Reg16::ALL.into_iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{reg}={:04X}", self.word(reg))?;
        }
        Ok(())
    }
}
