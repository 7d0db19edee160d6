use miette::Diagnostic;
use parse_display::Display;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::constants::{self as C, Address, Word};
use crate::loader::LoadError;

mod console;
mod instructions;
mod interrupts;
mod memory;
mod registers;

pub use self::console::{BufferConsole, Console, StdConsole};
pub use self::instructions::{Opcode, OpcodeTable};
pub use self::interrupts::{InterruptTable, Service};
pub use self::memory::{Memory, MemoryError};
pub use self::registers::{Reg16, Reg8, Registers};

#[derive(Error, Diagnostic, Debug)]
pub enum ProcessorError {
    #[error("invalid opcode {opcode:#04x}, {next:#04x} at offset {offset:#06x}")]
    #[diagnostic(
        code(emu8086::invalid_opcode),
        help("only NOP, MOV AH/DX, RET, INT, CALL and JMP are supported")
    )]
    InvalidOpcode {
        /// The faulting opcode
        opcode: u8,
        /// The byte following it
        next: u8,
        /// Position of the opcode relative to the program start
        offset: isize,
    },

    #[error("invalid interrupt {number:#04x} (vector {vector}) with ah: {service:#04x}")]
    #[diagnostic(code(emu8086::invalid_interrupt))]
    InvalidInterrupt {
        /// Operand of the `INT` instruction
        number: u8,
        /// Vector computed from the operand
        vector: isize,
        /// Service selector found in AH
        service: u8,
    },

    #[error("invalid memory access ({0})")]
    #[diagnostic(code(emu8086::memory))]
    Memory(#[from] MemoryError),

    #[error("stack overflow")]
    #[diagnostic(code(emu8086::stack_overflow))]
    StackOverflow,

    #[error("stack underflow: return without a matching call")]
    #[diagnostic(code(emu8086::stack_underflow))]
    StackUnderflow,

    #[error("console error: {0}")]
    #[diagnostic(code(emu8086::console))]
    Console(#[from] std::io::Error),
}

type Result<T> = std::result::Result<T, ProcessorError>;

/// Where the execution loop currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Running,

    /// A terminating service was called
    Halted { code: u8 },
}

/// Why [`Computer::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Outcome {
    /// The program terminated itself
    #[display("halted with code {code}")]
    Halted { code: u8 },

    /// The step bound was reached before the program terminated
    #[display("step limit reached")]
    StepLimit,

    /// The instruction pointer left the address space
    #[display("end of memory reached")]
    EndOfMemory,
}

/// One emulation run: memory, registers, dispatch tables, console and state
pub struct Computer<T = StdConsole> {
    pub registers: Registers,
    pub memory: Memory,
    pub console: T,

    /// Address of the next opcode to fetch
    pub ip: Address,
    pub state: State,

    /// Number of instructions executed so far
    pub steps: usize,

    /// Name of the loaded program, for diagnostics
    pub program: String,

    opcodes: OpcodeTable,
    interrupts: InterruptTable,
}

impl<T> std::fmt::Debug for Computer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Computer {{ program: {:?}, ip: {:#06x}, state: {:?}, registers: {:?}, memory: [...] }}",
            self.program, self.ip, self.state, self.registers
        )
    }
}

impl<T: Console> Computer<T> {
    /// Create a computer with empty memory, ready to run from the program start
    pub fn new(console: T) -> Self {
        let mut computer = Self {
            registers: Registers::default(),
            memory: Memory::default(),
            console,
            ip: C::PROGRAM_START,
            state: State::Running,
            steps: 0,
            program: String::new(),
            opcodes: OpcodeTable::new(),
            interrupts: InterruptTable::new(),
        };
        computer.sync_ip();
        computer
    }

    /// Create a computer and copy the program image at the program start
    ///
    /// # Errors
    ///
    /// Fails if the image is larger than the available address space.
    #[tracing::instrument(skip(program, console))]
    pub fn with_program(
        name: &str,
        program: &[u8],
        console: T,
    ) -> std::result::Result<Self, LoadError> {
        if program.len() > C::MAX_PROGRAM_SIZE {
            return Err(LoadError::TooLarge {
                size: program.len(),
                max: C::MAX_PROGRAM_SIZE,
            });
        }

        let mut computer = Self::new(console);
        computer
            .memory
            .load(C::PROGRAM_START, program)
            .map_err(|_| LoadError::TooLarge {
                size: program.len(),
                max: C::MAX_PROGRAM_SIZE,
            })?;
        computer.program = name.to_owned();
        info!(program = name, size = program.len(), "Loaded program");
        Ok(computer)
    }

    /// Fetch, decode and execute a single instruction
    ///
    /// # Errors
    ///
    /// Fails on an unsupported opcode or interrupt, or an invalid memory access.
    pub fn step(&mut self) -> Result<()> {
        let opcode = self.memory.read8(self.ip)?;
        let handler = self.opcodes.get(opcode);
        trace!(ip = self.ip, opcode, "{handler}");

        let operand = self.ip + 1;
        let next = handler.execute(self, operand)?;
        self.ip = next;
        self.steps += 1;
        self.sync_ip();
        Ok(())
    }

    /// Run until the program halts or a safety bound is hit
    ///
    /// # Errors
    ///
    /// Any error raised by [`Computer::step`] stops the run.
    #[tracing::instrument(skip(self), fields(program = %self.program))]
    pub fn run(&mut self, step_limit: usize) -> Result<Outcome> {
        loop {
            if let State::Halted { code } = self.state {
                return Ok(Outcome::Halted { code });
            }

            if self.steps >= step_limit {
                warn!(steps = self.steps, "Step limit reached, stopping");
                return Ok(Outcome::StepLimit);
            }

            if self.ip >= C::MEMORY_SIZE {
                warn!(ip = self.ip, "Instruction pointer left memory, stopping");
                return Ok(Outcome::EndOfMemory);
            }

            self.step()?;
        }
    }

    /// Stop the execution loop before the next fetch
    pub(crate) fn halt(&mut self, code: u8) {
        self.state = State::Halted { code };
    }

    /// Run the service selected by `INT number` and AH
    pub(crate) fn interrupt(&mut self, number: u8) -> Result<()> {
        let service = self.registers.byte(Reg8::AH);
        let handler = self.interrupts.get(number, service);
        debug!(number, service, "{handler}");
        handler.execute(self, number)
    }

    /// Push a word on the stack
    pub(crate) fn push(&mut self, value: Word) -> Result<()> {
        let sp = self
            .registers
            .word(Reg16::SP)
            .checked_add(2)
            .ok_or(ProcessorError::StackOverflow)?;

        self.memory.write16(C::STACK_TOP - Address::from(sp), value)?;
        self.registers.set_word(Reg16::SP, sp);
        debug!(sp, value, "push");
        Ok(())
    }

    /// Pop a word from the stack
    pub(crate) fn pop(&mut self) -> Result<Word> {
        let sp = self.registers.word(Reg16::SP);
        if sp == 0 {
            return Err(ProcessorError::StackUnderflow);
        }

        let value = self.memory.read16(C::STACK_TOP - Address::from(sp))?;
        self.registers.set_word(Reg16::SP, sp - 2);
        debug!(sp = sp - 2, value, "pop");
        Ok(value)
    }

    /// Mirror the instruction pointer in the IP register, as an offset in the segment
    fn sync_ip(&mut self) {
        #[allow(clippy::cast_possible_truncation)]
        self.registers.set_word(Reg16::IP, self.ip as Word);
    }
}
