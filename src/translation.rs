use crate::config::SystemConfig;
use crate::entry::TlbEntry;
use crate::error::TranslationFault;
use crate::memory::PageTables;
use crate::process::Pid;
use crate::tlb::{Insertion, Strategy, Tlb};

/// Represents the decomposed components of a Virtual Address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualAddress {
    pub va: u32,
    pub vpn: u32,
    pub offset: u32,
}

impl VirtualAddress {
    /// Split a raw VA into page number and offset
    pub fn split(va: u32, config: &SystemConfig) -> Self {
        VirtualAddress {
            va,
            vpn: va >> config.offset_bits,
            offset: va & config.offset_mask(),
        }
    }
}

impl std::fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VA({}) = (vpn={}, offset={})", self.va, self.vpn, self.offset)
    }
}

/// How a page number was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Translation {
    Hit { slot: usize, pfn: u8 },
    /// Refilled from the page table into `slot`
    Miss { slot: usize, pfn: u8, evicted: Option<TlbEntry> },
}

impl Translation {
    pub fn pfn(&self) -> u8 {
        match *self {
            Translation::Hit { pfn, .. } | Translation::Miss { pfn, .. } => pfn,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Translation::Hit { .. })
    }
}

/// A resolved physical address together with how it was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub va: VirtualAddress,
    pub physical: u32,
    pub translation: Translation,
}

/// TLB in front of the per-process linear page tables
pub struct Translator {
    config: SystemConfig,
    tlb: Tlb,
    page_tables: PageTables,
}

impl Translator {
    pub fn new(config: SystemConfig, strategy: Strategy) -> Self {
        Translator {
            config,
            tlb: Tlb::new(strategy),
            page_tables: PageTables::new(&config),
        }
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn tlb(&self) -> &Tlb {
        &self.tlb
    }

    pub fn page_tables(&self) -> &PageTables {
        &self.page_tables
    }

    /// Resolve a page number for `pid`.
    ///
    /// A hit applies the strategy's hit bookkeeping. A miss falls back to the
    /// page table and refills the TLB; an unmapped page fails without
    /// touching the TLB.
    pub fn translate(&mut self, vpn: u32, pid: Pid) -> Result<Translation, TranslationFault> {
        // page numbers past the table can never have been mapped
        let Ok(tag) = u8::try_from(vpn) else {
            return Err(TranslationFault::PageNotMapped { vpn });
        };

        if let Some(slot) = self.tlb.lookup_valid(tag, pid) {
            self.tlb.touch(slot);
            let pfn = self.tlb.entries()[slot].pfn;
            return Ok(Translation::Hit { slot, pfn });
        }

        let pte = self.page_tables.lookup(pid, tag);
        if !pte.valid {
            return Err(TranslationFault::PageNotMapped { vpn });
        }

        let Insertion { slot, evicted } = self.tlb.insert(tag, pid, pte.pfn);
        Ok(Translation::Miss { slot, pfn: pte.pfn, evicted })
    }

    /// PA = (pfn << offset_bits) | offset
    pub fn virtual_to_physical(&mut self, address: u32, pid: Pid) -> Result<Resolved, TranslationFault> {
        let va = VirtualAddress::split(address, &self.config);
        let translation = self.translate(va.vpn, pid)?;
        let physical = (u32::from(translation.pfn()) << self.config.offset_bits) | va.offset;

        Ok(Resolved { va, physical, translation })
    }

    /// Install vpn -> pfn in both the TLB and the page table.
    /// Always an insertion, even if the pair is already cached.
    /// An out of range vpn is rejected before either is touched.
    pub fn map_page(&mut self, pid: Pid, vpn: u8, pfn: u8) -> Result<Insertion, TranslationFault> {
        self.check_page(vpn)?;
        let insertion = self.tlb.insert(vpn, pid, pfn);
        self.page_tables.map(pid, vpn, pfn);
        Ok(insertion)
    }

    /// Drop vpn from the TLB and the page table. Returns the invalidated TLB slot.
    pub fn unmap_page(&mut self, pid: Pid, vpn: u8) -> Result<Option<usize>, TranslationFault> {
        self.check_page(vpn)?;
        let slot = self.tlb.invalidate(vpn, pid);
        self.page_tables.unmap(pid, vpn);
        Ok(slot)
    }

    fn check_page(&self, vpn: u8) -> Result<(), TranslationFault> {
        let pages = self.config.page_count();
        if usize::from(vpn) < pages {
            Ok(())
        } else {
            Err(TranslationFault::PageOutOfRange { vpn: u32::from(vpn), pages })
        }
    }
}
