use crate::config::SystemConfig;
use crate::error::TranslationFault;
use crate::memory::PhysicalMemory;
use crate::process::Pid;
use crate::tlb::Strategy;
use crate::translation::{Resolved, Translator};

/// Everything allocated by `define`: the translator and the physical store
pub struct VmManager {
    translator: Translator,
    pm: PhysicalMemory,
}

impl VmManager {
    pub fn new(config: SystemConfig, strategy: Strategy) -> Self {
        VmManager {
            pm: PhysicalMemory::new(&config),
            translator: Translator::new(config, strategy),
        }
    }

    pub fn config(&self) -> &SystemConfig {
        self.translator.config()
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    pub fn translator_mut(&mut self) -> &mut Translator {
        &mut self.translator
    }

    pub fn memory(&self) -> &PhysicalMemory {
        &self.pm
    }

    /// Read the word at a virtual address
    pub fn load(&mut self, address: u32, pid: Pid) -> Result<(Resolved, u32), TranslationFault> {
        let resolved = self.translator.virtual_to_physical(address, pid)?;
        let value = self.pm.read(resolved.physical as usize);
        Ok((resolved, value))
    }

    /// Write a word at a virtual address
    pub fn store(&mut self, address: u32, pid: Pid, value: u32) -> Result<Resolved, TranslationFault> {
        let resolved = self.translator.virtual_to_physical(address, pid)?;
        self.pm.write(resolved.physical as usize, value);
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::Translation;

    fn vm() -> VmManager {
        VmManager::new(SystemConfig::new(2, 2, 2).unwrap(), Strategy::Lru)
    }

    #[test]
    fn test_define_allocates_store() {
        let vm = vm();
        assert_eq!(vm.memory().len(), 16);
        assert_eq!(vm.translator().tlb().valid_count(), 0);
    }

    #[test]
    fn test_store_then_load() {
        let mut vm = vm();
        let pid = Pid::default();
        vm.translator_mut().map_page(pid, 1, 2).unwrap();

        let resolved = vm.store(5, pid, 99).unwrap(); // vpn 1, offset 1
        assert_eq!(resolved.physical, 9);
        assert_eq!(vm.memory().read(9), 99);

        let (resolved, value) = vm.load(5, pid).unwrap();
        assert_eq!(value, 99);
        assert!(resolved.translation.is_hit());
    }

    #[test]
    fn test_load_reads_physical_frame() {
        let mut vm = vm();
        let pid = Pid::new(2).unwrap();
        vm.translator_mut().map_page(pid, 0, 3).unwrap();
        vm.translator_mut().unmap_page(pid, 0).unwrap();
        vm.translator_mut().map_page(pid, 0, 3).unwrap();

        let (resolved, value) = vm.load(0, pid).unwrap();
        assert_eq!(resolved.physical, 12);
        assert_eq!(value, 0);
        assert_eq!(resolved.translation, Translation::Hit { slot: 0, pfn: 3 });
    }

    #[test]
    fn test_fault_propagates_and_store_is_skipped() {
        let mut vm = vm();
        let pid = Pid::default();
        assert_eq!(
            vm.store(4, pid, 1),
            Err(TranslationFault::PageNotMapped { vpn: 1 })
        );
        assert_eq!(vm.load(4, pid), Err(TranslationFault::PageNotMapped { vpn: 1 }));
        assert!((0..16).all(|pa| vm.memory().read(pa) == 0));
    }

    #[test]
    fn test_shared_frame_between_processes() {
        let mut vm = vm();
        let (a, b) = (Pid::new(0).unwrap(), Pid::new(1).unwrap());
        vm.translator_mut().map_page(a, 0, 2).unwrap();
        vm.translator_mut().map_page(b, 3, 2).unwrap();

        vm.store(1, a, 7).unwrap();
        let (_, value) = vm.load(13, b).unwrap(); // vpn 3, offset 1
        assert_eq!(value, 7);
    }
}
