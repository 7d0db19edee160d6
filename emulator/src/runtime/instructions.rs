use parse_display::Display;
use tracing::debug;

use crate::constants::{self as C, Address, Word};

use super::{Computer, Console, MemoryError, ProcessorError, Reg16, Reg8};

/// Handler selected by an opcode byte
///
/// Each handler gets the address of the first operand byte (the opcode itself
/// was already consumed) and returns the address of the next opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Opcode {
    /// No-op
    #[display("nop")]
    Nop,

    /// Load an immediate byte in AH
    #[display("mov  ah, imm8")]
    MovAhImm8,

    /// Load an immediate word in DX
    #[display("mov  dx, imm16")]
    MovDxImm16,

    /// Return from a `call`
    #[display("ret")]
    Ret,

    /// Call a DOS service
    #[display("int  imm8")]
    Int,

    /// Push the return offset and jump to a relative target
    #[display("call rel8")]
    CallRel8,

    /// Unconditional short jump
    #[display("jmp  rel8")]
    JmpRel8,

    #[display("(invalid)")]
    Invalid,
}

impl Opcode {
    /// Opcode bytes of the supported instructions
    pub const SUPPORTED: [(u8, Opcode); 7] = [
        (90, Opcode::Nop),
        (180, Opcode::MovAhImm8),
        (186, Opcode::MovDxImm16),
        (195, Opcode::Ret),
        (205, Opcode::Int),
        (232, Opcode::CallRel8),
        (235, Opcode::JmpRel8),
    ];

    /// Number of operand bytes read by the handler
    #[must_use]
    pub const fn operand_size(self) -> usize {
        match self {
            Self::Nop | Self::Ret | Self::Invalid => 0,
            Self::MovAhImm8 | Self::Int | Self::CallRel8 | Self::JmpRel8 => 1,
            Self::MovDxImm16 => 2,
        }
    }

    /// Execute the instruction whose operands start at `operand`
    #[tracing::instrument(skip(computer), level = "trace")]
    pub(crate) fn execute<T: Console>(
        self,
        computer: &mut Computer<T>,
        operand: Address,
    ) -> Result<Address, ProcessorError> {
        use Opcode::*;

        match self {
            Nop => Ok(operand),

            MovAhImm8 => {
                let value = computer.memory.read8(operand)?;
                computer.registers.set_byte(Reg8::AH, value);
                Ok(operand + 1)
            }

            MovDxImm16 => {
                let value = computer.memory.read16(operand)?;
                computer.registers.set_word(Reg16::DX, value);
                Ok(operand + 2)
            }

            Ret => {
                let offset = computer.pop()?; // Pop the return offset
                let target = (C::PROGRAM_START + Address::from(offset)) % C::MEMORY_SIZE;
                debug!("Returning to {:#x}", target);
                Ok(target)
            }

            Int => {
                let number = computer.memory.read8(operand)?;
                computer.interrupt(number)?;
                Ok(operand + 1)
            }

            CallRel8 => {
                let displacement = displacement(computer, operand)?;
                let ret = operand + 2;

                // The return address is saved relative to the program start,
                // modulo the 16-bit segment
                #[allow(clippy::cast_possible_truncation)]
                let offset = ret.wrapping_sub(C::PROGRAM_START) as Word;
                computer.push(offset)?;

                let target = relative(ret, displacement)?;
                debug!("Calling {:#x}", target);
                Ok(target)
            }

            JmpRel8 => {
                let displacement = displacement(computer, operand)?;
                let target = relative(operand + 1, displacement)?;
                debug!("Jumping to {:#x}", target);
                Ok(target)
            }

            Invalid => {
                let opcode = computer.memory.read8(operand - 1)?;
                let next = computer.memory.read8(operand).unwrap_or_default();
                #[allow(clippy::cast_possible_wrap)]
                let offset = (operand - 1) as isize - C::PROGRAM_START as isize;
                Err(ProcessorError::InvalidOpcode {
                    opcode,
                    next,
                    offset,
                })
            }
        }
    }
}

/// Read a signed 8-bit displacement
fn displacement<T: Console>(
    computer: &Computer<T>,
    operand: Address,
) -> Result<i8, MemoryError> {
    let byte = computer.memory.read8(operand)?;
    Ok(i8::from_le_bytes([byte]))
}

/// Apply a displacement to the address following an instruction
fn relative(end: Address, displacement: i8) -> Result<Address, MemoryError> {
    end.checked_add_signed(isize::from(displacement))
        .ok_or(MemoryError::OutOfBounds(end))
}

/// Maps every opcode byte to its handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpcodeTable {
    handlers: [Opcode; C::OPCODE_COUNT],
}

impl Default for OpcodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl OpcodeTable {
    /// Build the table: every byte is invalid except the supported instructions
    #[must_use]
    pub fn new() -> Self {
        let mut handlers = [Opcode::Invalid; C::OPCODE_COUNT];
        for (byte, opcode) in Opcode::SUPPORTED {
            handlers[usize::from(byte)] = opcode;
        }
        Self { handlers }
    }

    #[must_use]
    pub fn get(&self, byte: u8) -> Opcode {
        self.handlers[usize::from(byte)]
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::runtime::BufferConsole;

    /// A computer with `bytes` at the program start
    fn computer(bytes: &[u8]) -> Computer<BufferConsole> {
        Computer::with_program("test.com", bytes, BufferConsole::default()).unwrap()
    }

    /// Execute the instruction at the program start, returning the next address
    fn execute(computer: &mut Computer<BufferConsole>) -> Result<Address, ProcessorError> {
        let opcode = computer.memory.read8(C::PROGRAM_START).unwrap();
        let handler = OpcodeTable::new().get(opcode);
        handler.execute(computer, C::PROGRAM_START + 1)
    }

    #[test]
    fn table_test() {
        let table = OpcodeTable::new();
        assert_eq!(table.get(90), Opcode::Nop);
        assert_eq!(table.get(0xB4), Opcode::MovAhImm8);
        assert_eq!(table.get(0xBA), Opcode::MovDxImm16);
        assert_eq!(table.get(0xC3), Opcode::Ret);
        assert_eq!(table.get(0xCD), Opcode::Int);
        assert_eq!(table.get(0xE8), Opcode::CallRel8);
        assert_eq!(table.get(0xEB), Opcode::JmpRel8);

        let valid = (0..=u8::MAX)
            .filter(|&b| table.get(b) != Opcode::Invalid)
            .count();
        assert_eq!(valid, Opcode::SUPPORTED.len());
        assert_eq!(table.get(0), Opcode::Invalid);
        assert_eq!(table.get(1), Opcode::Invalid);
        assert_eq!(table.get(0xFF), Opcode::Invalid);
    }

    #[test]
    fn operand_sizes_match_next_pointer() {
        let p = C::PROGRAM_START + 1;

        let mut c = computer(&[90]);
        assert_eq!(execute(&mut c).unwrap(), p + Opcode::Nop.operand_size());

        let mut c = computer(&[180, 0x09]);
        assert_eq!(execute(&mut c).unwrap(), p + Opcode::MovAhImm8.operand_size());
        assert_eq!(c.registers.byte(Reg8::AH), 0x09);

        let mut c = computer(&[186, 0x0B, 0x01]);
        assert_eq!(execute(&mut c).unwrap(), p + Opcode::MovDxImm16.operand_size());
        assert_eq!(c.registers.word(Reg16::DX), 0x010B);

        let mut c = computer(&[205, 0x21]);
        c.registers.set_byte(Reg8::AH, 0x00);
        assert_eq!(execute(&mut c).unwrap(), p + Opcode::Int.operand_size());
    }

    #[test]
    fn jmp_test() {
        let p = C::PROGRAM_START + 1;
        for (displacement, expected) in [
            (0x00_u8, p + 1),
            (0x05, p + 6),
            (0x7F, p + 0x80),
            (0xFF, p),
            (0xFE, p - 1),
            (0x80, p + 1 - 0x80),
        ] {
            let mut c = computer(&[235, displacement]);
            assert_eq!(execute(&mut c).unwrap(), expected, "{displacement:#x}");
        }
    }

    #[test]
    fn jmp_below_zero_test() {
        let mut c = computer(&[]);
        c.memory.load(0, &[235, 0x80]).unwrap();
        let err = Opcode::JmpRel8.execute(&mut c, 1).unwrap_err();
        assert!(matches!(
            err,
            ProcessorError::Memory(MemoryError::OutOfBounds(2))
        ));
    }

    #[test]
    fn call_test() {
        let p = C::PROGRAM_START + 1;
        let mut c = computer(&[232, 0xFD]);
        // call to p - 3 + 2, i.e. the byte before the call
        assert_eq!(execute(&mut c).unwrap(), p - 1);
        assert_eq!(c.registers.word(Reg16::SP), 2);
        assert_eq!(c.memory.read16(C::STACK_TOP - 2).unwrap(), 3);
    }

    #[test]
    fn call_ret_round_trip() {
        let mut c = computer(&[]);
        c.memory.load(0x200, &[232, 0x10, 0x00]).unwrap();
        c.memory.write8(0x213, 195).unwrap();

        let target = Opcode::CallRel8.execute(&mut c, 0x201).unwrap();
        assert_eq!(target, 0x213);

        let back = Opcode::Ret.execute(&mut c, target + 1).unwrap();
        assert_eq!(back, 0x203);
        assert_eq!(c.registers.word(Reg16::SP), 0);
    }

    #[test]
    fn call_ret_below_program_start() {
        let mut c = computer(&[]);
        let target = Opcode::CallRel8.execute(&mut c, 0x41).unwrap();
        assert_eq!(target, 0x43);
        assert_eq!(Opcode::Ret.execute(&mut c, 0x44).unwrap(), 0x43);
    }

    #[test]
    fn invalid_test() {
        let mut c = computer(&[0x0F, 0xAA]);
        let err = execute(&mut c).unwrap_err();
        assert!(matches!(
            err,
            ProcessorError::InvalidOpcode {
                opcode: 0x0F,
                next: 0xAA,
                offset: 0
            }
        ));
    }

    #[test]
    fn display_test() {
        insta::assert_snapshot!(Opcode::MovDxImm16, @"mov  dx, imm16");
        insta::assert_snapshot!(Opcode::Invalid, @"(invalid)");
    }
}
