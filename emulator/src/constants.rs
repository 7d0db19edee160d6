/// Offset into the flat address space
pub type Address = usize;

/// Width of the 16-bit registers and stack slots
pub type Word = u16;

/// Total size of the computer memory
pub const MEMORY_SIZE: Address = 0x10000;

/// Where the program image is copied before execution
pub const PROGRAM_START: Address = 0x100;

/// Largest program image that fits in memory
pub const MAX_PROGRAM_SIZE: usize = MEMORY_SIZE - PROGRAM_START;

/// The stack grows downward from here
pub const STACK_TOP: Address = MEMORY_SIZE;

/// `INT n` selects the vector `n - VECTOR_BASE`
pub const VECTOR_BASE: u8 = 0x20;

/// Number of interrupt vectors in the dispatch table
pub const VECTOR_COUNT: usize = 16;

/// Number of service selectors per vector
pub const SERVICE_COUNT: usize = 256;

/// Number of one-byte opcodes
pub const OPCODE_COUNT: usize = 256;

/// Size in bytes of the register bank
pub const REGISTER_FILE_SIZE: usize = 28;

/// Terminates strings printed by `INT 21h/AH=09h`
pub const STRING_TERMINATOR: u8 = b'$';

/// Loaded in AL when a read service hits the end of the input
pub const END_OF_INPUT: u8 = 0xFF;

/// Default bound on the number of executed instructions
pub const DEFAULT_STEP_LIMIT: usize = MEMORY_SIZE;
