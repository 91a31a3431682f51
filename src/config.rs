use crate::constants::*;
use crate::error::ConfigError;

/// Address geometry fixed by the `define` instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemConfig {
    pub offset_bits: u32,
    pub pfn_bits: u32,
    pub vpn_bits: u32,
}

impl SystemConfig {
    pub fn new(offset_bits: u32, pfn_bits: u32, vpn_bits: u32) -> Result<Self, ConfigError> {
        check_width("PFN", pfn_bits, PFN_FIELD_BITS)?;
        check_width("VPN", vpn_bits, VPN_FIELD_BITS)?;
        check_width("OFF", offset_bits, MAX_ADDRESS_BITS)?;
        check_width("OFF+PFN", offset_bits + pfn_bits, MAX_ADDRESS_BITS)?;
        check_width("OFF+VPN", offset_bits + vpn_bits, MAX_ADDRESS_BITS)?;

        Ok(SystemConfig { offset_bits, pfn_bits, vpn_bits })
    }

    /// Words of physical memory: 2^(offset + pfn)
    #[inline]
    pub fn physical_words(&self) -> usize {
        1 << (self.offset_bits + self.pfn_bits)
    }

    /// Entries per page table: 2^vpn
    #[inline]
    pub fn page_count(&self) -> usize {
        1 << self.vpn_bits
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        1 << self.pfn_bits
    }

    /// Size of the virtual address space: 2^(offset + vpn)
    #[inline]
    pub fn virtual_words(&self) -> usize {
        1 << (self.offset_bits + self.vpn_bits)
    }

    #[inline]
    pub fn offset_mask(&self) -> u32 {
        (1 << self.offset_bits) - 1
    }
}

fn check_width(field: &'static str, bits: u32, max: u32) -> Result<(), ConfigError> {
    if bits > max {
        return Err(ConfigError::FieldTooWide { field, bits, max });
    }
    Ok(())
}
