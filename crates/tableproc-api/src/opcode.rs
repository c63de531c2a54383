use std::fmt;

/// The one protocol version this backend speaks.
pub const PROC_TABLE_API_VERSION: u32 = 1;

/// Message type of every reply.
pub const PROC_TABLE_OK: u32 = 0;
/// Reserved failure message type; never sent by the backend.
pub const PROC_TABLE_FAIL: u32 = 1;

/// Request opcodes, numbered as the parent's imsg types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Opcode {
    Open = 2,
    Close = 3,
    Update = 4,
    Check = 5,
    Lookup = 6,
    Fetch = 7,
}

impl Opcode {
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            Opcode::Open => "OPEN",
            Opcode::Close => "CLOSE",
            Opcode::Update => "UPDATE",
            Opcode::Check => "CHECK",
            Opcode::Lookup => "LOOKUP",
            Opcode::Fetch => "FETCH",
        }
    }
}

impl TryFrom<u32> for Opcode {
    type Error = u32;

    fn try_from(code: u32) -> Result<Self, Self::Error> {
        match code {
            2 => Ok(Opcode::Open),
            3 => Ok(Opcode::Close),
            4 => Ok(Opcode::Update),
            5 => Ok(Opcode::Check),
            6 => Ok(Opcode::Lookup),
            7 => Ok(Opcode::Fetch),
            other => Err(other),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
