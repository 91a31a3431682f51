pub mod config;
pub mod constants;
pub mod entry;
pub mod error;
pub mod io;
pub mod memory;
pub mod process;
pub mod simulator;
pub mod tlb;
pub mod translation;
pub mod vm_manager;

// Re-export commonly used items for convenience
pub use error::{ConfigError, SimError, TranslationFault};
pub use simulator::{RunSummary, Simulator};
pub use tlb::Strategy;
pub use translation::{Translation, Translator, VirtualAddress};
