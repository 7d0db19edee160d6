use parse_display::Display;
use tracing::info;

use crate::constants::{self as C, Address};

use super::{Computer, Console, ProcessorError, Reg16, Reg8};

/// Host service run by an `INT` instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Service {
    /// Stop the program with a zero return code
    #[display("terminate")]
    Terminate,

    /// Read a character from the input into AL
    #[display("read character")]
    ReadChar,

    /// Write DL, which is also returned in AL
    #[display("write character")]
    WriteCharEcho,

    /// Write DL
    #[display("write character")]
    WriteChar,

    /// Write DL, which is also returned in AL
    #[display("direct console output")]
    DirectConsole,

    /// Write the `$`-terminated string at DX
    #[display("print string")]
    PrintString,

    /// Stop the program with the return code in AL
    #[display("exit")]
    Exit,

    #[display("(invalid)")]
    Invalid,
}

/// Services of the `INT 21h` vector, keyed by AH
const DOS_SERVICES: [(u8, Service); 9] = [
    (0x00, Service::Terminate),
    (0x01, Service::ReadChar),
    (0x02, Service::WriteCharEcho),
    (0x05, Service::WriteChar),
    (0x06, Service::DirectConsole),
    (0x07, Service::ReadChar),
    (0x08, Service::ReadChar),
    (0x09, Service::PrintString),
    (0x4C, Service::Exit),
];

impl Service {
    /// Run the service on behalf of the program that issued `INT number`
    pub(crate) fn execute<T: Console>(
        self,
        computer: &mut Computer<T>,
        number: u8,
    ) -> Result<(), ProcessorError> {
        match self {
            Self::Terminate => {
                info!(program = %computer.program, "Program terminated");
                computer.halt(0);
            }

            Self::ReadChar => {
                let byte = computer.console.read_byte()?.unwrap_or(C::END_OF_INPUT);
                computer.registers.set_byte(Reg8::AL, byte);
            }

            Self::WriteCharEcho | Self::DirectConsole => {
                let byte = computer.registers.byte(Reg8::DL);
                computer.console.write_bytes(&[byte])?;
                computer.registers.set_byte(Reg8::AL, byte);
            }

            Self::WriteChar => {
                let byte = computer.registers.byte(Reg8::DL);
                computer.console.write_bytes(&[byte])?;
            }

            Self::PrintString => {
                let address = Address::from(computer.registers.word(Reg16::DX));
                let string = computer.memory.terminated(address, C::STRING_TERMINATOR);
                computer.console.write_bytes(string)?;
            }

            Self::Exit => {
                let code = computer.registers.byte(Reg8::AL);
                info!(program = %computer.program, code, "Program terminated");
                computer.halt(code);
            }

            Self::Invalid => {
                return Err(ProcessorError::InvalidInterrupt {
                    number,
                    vector: isize::from(number) - isize::from(C::VECTOR_BASE),
                    service: computer.registers.byte(Reg8::AH),
                });
            }
        }

        Ok(())
    }
}

/// Maps a vector and a service selector to a [`Service`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterruptTable {
    services: [[Service; C::SERVICE_COUNT]; C::VECTOR_COUNT],
}

impl Default for InterruptTable {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptTable {
    /// Build the table.
    ///
    /// Vector 0 (`INT 20h`) terminates whatever AH holds, vector 1 (`INT 21h`)
    /// holds the DOS services, everything else is invalid.
    #[must_use]
    pub fn new() -> Self {
        let mut services = [[Service::Invalid; C::SERVICE_COUNT]; C::VECTOR_COUNT];
        services[0] = [Service::Terminate; C::SERVICE_COUNT];
        for (selector, service) in DOS_SERVICES {
            services[1][usize::from(selector)] = service;
        }
        Self { services }
    }

    /// Look up the service for `INT number` with the selector `service`
    #[must_use]
    pub fn get(&self, number: u8, service: u8) -> Service {
        number
            .checked_sub(C::VECTOR_BASE)
            .and_then(|vector| self.services.get(usize::from(vector)))
            .map_or(Service::Invalid, |row| row[usize::from(service)])
    }
}
