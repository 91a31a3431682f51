use std::fmt;
use std::str::FromStr;

use crate::constants::*;
use crate::error::SimError;

/// Address-space identifier of a simulated process (0..=3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(u8);

impl Pid {
    pub const ALL: [Pid; NUM_PROCESSES] = [Pid(0), Pid(1), Pid(2), Pid(3)];

    /// Validate a raw process number. Anything outside 0..=3, negative
    /// numbers included, is an invalid process id.
    pub fn new(raw: i64) -> Result<Self, SimError> {
        match usize::try_from(raw) {
            Ok(index) if index < NUM_PROCESSES => Ok(Pid::ALL[index]),
            _ => Err(SimError::InvalidProcessId(raw)),
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn raw(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One of the two general registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    R1,
    R2,
}

impl Register {
    fn index(self) -> usize {
        match self {
            Register::R1 => 0,
            Register::R2 => 1,
        }
    }
}

impl FromStr for Register {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r1" => Ok(Register::R1),
            "r2" => Ok(Register::R2),
            _ => Err(SimError::InvalidRegister(s.to_string())),
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Register::R1 => write!(f, "r1"),
            Register::R2 => write!(f, "r2"),
        }
    }
}

/// Saved register contents of a single process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterFile {
    regs: [u32; NUM_REGISTERS],
}

impl RegisterFile {
    #[inline]
    pub fn get(&self, reg: Register) -> u32 {
        self.regs[reg.index()]
    }

    #[inline]
    pub fn set(&mut self, reg: Register, value: u32) {
        self.regs[reg.index()] = value;
    }
}
