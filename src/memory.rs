use crate::config::SystemConfig;
use crate::constants::*;
use crate::entry::PageTableEntry;
use crate::process::Pid;

/// Flat word-addressed physical store
pub struct PhysicalMemory {
    data: Box<[u32]>,
}

impl PhysicalMemory {
    /// Create a physical memory of 2^(offset + pfn) words, all zero
    pub fn new(config: &SystemConfig) -> Self {
        PhysicalMemory {
            data: vec![0u32; config.physical_words()].into_boxed_slice(),
        }
    }

    /// Read a word from physical memory
    #[inline]
    pub fn read(&self, address: usize) -> u32 {
        self.data[address]
    }

    /// Write a word to physical memory
    #[inline]
    pub fn write(&mut self, address: usize, value: u32) {
        self.data[address] = value;
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Linear page table of one process
pub struct PageTable {
    entries: Box<[PageTableEntry]>,
}

impl PageTable {
    pub fn new(pages: usize) -> Self {
        PageTable {
            entries: vec![PageTableEntry::default(); pages].into_boxed_slice(),
        }
    }

    /// Install vpn -> pfn, replacing whatever was there.
    /// A vpn past the end is ignored.
    pub fn map(&mut self, vpn: u8, pfn: u8) {
        if let Some(entry) = self.entries.get_mut(vpn as usize) {
            entry.pfn = pfn;
            entry.valid = true;
        }
    }

    /// Clear the valid bit; the stale pfn stays behind
    pub fn unmap(&mut self, vpn: u8) {
        if let Some(entry) = self.entries.get_mut(vpn as usize) {
            entry.valid = false;
        }
    }

    /// Raw stored entry. A vpn past the end reads as unmapped.
    pub fn lookup(&self, vpn: u8) -> PageTableEntry {
        self.entries.get(vpn as usize).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Packed words of every entry, in vpn order
    pub fn encoded(&self) -> Vec<u32> {
        self.entries.iter().map(PageTableEntry::encode).collect()
    }
}

/// The fixed set of per-process page tables, indexed by pid
pub struct PageTables {
    tables: [PageTable; NUM_PROCESSES],
}

impl PageTables {
    pub fn new(config: &SystemConfig) -> Self {
        PageTables {
            tables: std::array::from_fn(|_| PageTable::new(config.page_count())),
        }
    }

    #[inline]
    pub fn map(&mut self, pid: Pid, vpn: u8, pfn: u8) {
        self.tables[pid.index()].map(vpn, pfn);
    }

    #[inline]
    pub fn unmap(&mut self, pid: Pid, vpn: u8) {
        self.tables[pid.index()].unmap(vpn);
    }

    #[inline]
    pub fn lookup(&self, pid: Pid, vpn: u8) -> PageTableEntry {
        self.tables[pid.index()].lookup(vpn)
    }

    pub fn table(&self, pid: Pid) -> &PageTable {
        &self.tables[pid.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SystemConfig {
        SystemConfig::new(2, 2, 2).unwrap()
    }

    #[test]
    fn test_pm_initialization() {
        let pm = PhysicalMemory::new(&config());
        // 2^(2+2) words, all zeroed
        assert_eq!(pm.len(), 16);
        assert_eq!(pm.read(0), 0);
        assert_eq!(pm.read(15), 0);
    }

    #[test]
    fn test_pm_read_write() {
        let mut pm = PhysicalMemory::new(&config());
        pm.write(12, 42);
        assert_eq!(pm.read(12), 42);

        pm.write(12, u32::MAX);
        assert_eq!(pm.read(12), u32::MAX);
        assert_eq!(pm.read(13), 0);
    }

    #[test]
    fn test_page_tables_allocated_per_process() {
        let pts = PageTables::new(&config());
        for pid in Pid::ALL {
            assert_eq!(pts.table(pid).len(), 4);
            assert!(pts.table(pid).encoded().iter().all(|&w| w == 0));
        }
    }

    #[test]
    fn test_map_and_lookup() {
        let mut pts = PageTables::new(&config());
        let pid = Pid::new(1).unwrap();
        pts.map(pid, 2, 3);

        let entry = pts.lookup(pid, 2);
        assert!(entry.valid);
        assert_eq!(entry.pfn, 3);

        // other processes are untouched
        assert!(!pts.lookup(Pid::new(0).unwrap(), 2).valid);
    }

    #[test]
    fn test_out_of_range_vpn_is_ignored() {
        let mut pts = PageTables::new(&config());
        let pid = Pid::default();
        pts.map(pid, 200, 1);
        pts.unmap(pid, 200);
        assert!(pts.table(pid).encoded().iter().all(|&w| w == 0));
        assert!(!pts.lookup(pid, 200).valid);
    }

    #[test]
    fn test_remap_overwrites() {
        let mut pts = PageTables::new(&config());
        let pid = Pid::default();
        pts.map(pid, 1, 2);
        pts.map(pid, 1, 3);
        assert_eq!(pts.lookup(pid, 1).pfn, 3);
        assert!(pts.lookup(pid, 1).valid);
    }

    #[test]
    fn test_unmap_keeps_stale_pfn() {
        let mut pts = PageTables::new(&config());
        let pid = Pid::default();
        pts.map(pid, 0, 3);
        pts.unmap(pid, 0);

        let entry = pts.lookup(pid, 0);
        assert!(!entry.valid);
        assert_eq!(entry.pfn, 3);
    }

    #[test]
    fn test_unmap_of_unmapped_page_is_noop() {
        let mut pts = PageTables::new(&config());
        let pid = Pid::default();
        pts.unmap(pid, 3);
        assert_eq!(pts.lookup(pid, 3), PageTableEntry::default());
    }

    #[test]
    fn test_lookup_past_end_reads_unmapped() {
        let table = PageTable::new(4);
        assert!(!table.lookup(200).valid);
    }

    #[test]
    fn test_encoded_words() {
        let mut table = PageTable::new(4);
        table.map(1, 3);
        assert_eq!(table.encoded(), vec![0, (3 << 9) | 1, 0, 0]);
    }
}
