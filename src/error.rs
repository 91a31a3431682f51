//! Error types for the simulator.
//!
//! `Display` renders the text that follows the `Current PID: n. ` prefix
//! in the output log.

use thiserror::Error;

/// Failure to resolve a virtual page through the TLB and page table
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationFault {
    #[error("Translating. Translation for VPN {vpn} not found in page table")]
    PageNotMapped { vpn: u32 },

    #[error("Error: VPN {vpn} is outside the page table ({pages} pages)")]
    PageOutOfRange { vpn: u32, pages: usize },
}

/// Rejected `define` instruction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Error: attempt to execute instruction before define")]
    NotDefined,

    #[error("Error: multiple calls to define in the same trace")]
    AlreadyDefined,

    #[error("Error: {field} bits ({bits}) exceed the maximum of {max}")]
    FieldTooWide { field: &'static str, bits: u32, max: u32 },
}

/// Fatal condition that stops a trace
#[derive(Error, Debug)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Translation(#[from] TranslationFault),

    #[error("Invalid context switch to process {0}")]
    InvalidProcessId(i64),

    #[error("Error: invalid register operand {0}")]
    InvalidRegister(String),

    #[error("Error: invalid operand {0}")]
    InvalidOperand(String),

    #[error("Error: unknown instruction {0}")]
    UnknownInstruction(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
