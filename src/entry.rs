//! Packed word layout of TLB and page table entries.
//!
//! TLB word (27 bits, most significant first):
//!   [26:19] VPN
//!   [18:11] PFN
//!   [10:9]  owning process id
//!   [8]     valid
//!   [7:0]   age (replacement counter, clamped to 255)
//!
//! Page table word (17 bits, most significant first):
//!   [16:9]  PFN
//!   [8:1]   present (carried, never consulted)
//!   [0]     valid

use crate::constants::*;
use crate::process::Pid;

/// A single TLB slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TlbEntry {
    pub vpn: u8,
    pub pfn: u8,
    pub pid: Pid,
    pub valid: bool,
    /// Refills and LRU hits since this slot was last written. Only the
    /// packed word narrows it to eight bits.
    pub age: u64,
}

impl TlbEntry {
    pub fn encode(&self) -> u32 {
        (u32::from(self.vpn) << TLB_VPN_SHIFT)
            | (u32::from(self.pfn) << TLB_PFN_SHIFT)
            | (u32::from(self.pid.raw()) << TLB_PID_SHIFT)
            | (u32::from(self.valid) << TLB_VALID_SHIFT)
            | (u32::from(self.timestamp()) << TLB_AGE_SHIFT)
    }

    pub fn decode(word: u32) -> Self {
        let pid = (word >> TLB_PID_SHIFT) & PID_FIELD_MASK;
        TlbEntry {
            vpn: ((word >> TLB_VPN_SHIFT) & VPN_FIELD_MASK) as u8,
            pfn: ((word >> TLB_PFN_SHIFT) & PFN_FIELD_MASK) as u8,
            // a two-bit field always names one of the four processes
            pid: Pid::ALL[pid as usize],
            valid: (word >> TLB_VALID_SHIFT) & VALID_FIELD_MASK == 1,
            age: u64::from((word >> TLB_AGE_SHIFT) & AGE_FIELD_MASK),
        }
    }

    /// Age as stored in the eight-bit field
    pub fn timestamp(&self) -> u8 {
        u8::try_from(self.age).unwrap_or(u8::MAX)
    }

    /// Does this slot carry the tag (vpn, pid), regardless of validity
    #[inline]
    pub fn tags(&self, vpn: u8, pid: Pid) -> bool {
        self.vpn == vpn && self.pid == pid
    }
}

/// A single linear page table entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageTableEntry {
    pub pfn: u8,
    pub present: u8,
    pub valid: bool,
}

impl PageTableEntry {
    pub fn encode(&self) -> u32 {
        (u32::from(self.pfn) << PTE_PFN_SHIFT)
            | (u32::from(self.present) << PTE_PRESENT_SHIFT)
            | (u32::from(self.valid) << PTE_VALID_SHIFT)
    }

    pub fn decode(word: u32) -> Self {
        PageTableEntry {
            pfn: ((word >> PTE_PFN_SHIFT) & PFN_FIELD_MASK) as u8,
            present: ((word >> PTE_PRESENT_SHIFT) & PRESENT_FIELD_MASK) as u8,
            valid: (word >> PTE_VALID_SHIFT) & VALID_FIELD_MASK == 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_tlb_entry_layout() {
        let entry = TlbEntry {
            vpn: 0xAB,
            pfn: 0xCD,
            pid: Pid::new(2).unwrap(),
            valid: true,
            age: 0x5A,
        };
        // 0xAB << 19 | 0xCD << 11 | 2 << 9 | 1 << 8 | 0x5A
        let expected = (0xAB << 19) | (0xCD << 11) | (2 << 9) | (1 << 8) | 0x5A;
        assert_eq!(entry.encode(), expected);
        assert_eq!(TlbEntry::decode(expected), entry);
    }

    #[test]
    fn test_old_age_clamps_in_word() {
        let entry = TlbEntry { vpn: 1, pfn: 2, pid: Pid::default(), valid: true, age: 300 };
        assert_eq!(entry.timestamp(), u8::MAX);
        assert_eq!(entry.encode() & AGE_FIELD_MASK, 0xFF);
        // the clamp never spills into the valid bit
        assert!(TlbEntry::decode(entry.encode()).valid);
        assert_eq!(TlbEntry::decode(entry.encode()).age, 255);
    }

    #[test]
    fn test_empty_words_decode_to_default() {
        assert_eq!(TlbEntry::decode(0), TlbEntry::default());
        assert_eq!(PageTableEntry::decode(0), PageTableEntry::default());
        assert_eq!(TlbEntry::default().encode(), 0);
    }

    #[test]
    fn test_page_table_entry_layout() {
        let entry = PageTableEntry { pfn: 3, present: 0, valid: true };
        assert_eq!(entry.encode(), (3 << 9) | 1);

        let entry = PageTableEntry { pfn: 0xFF, present: 0xFF, valid: false };
        assert_eq!(entry.encode(), 0x1FFFE);
    }

    #[test]
    fn test_valid_bit_is_independent() {
        let mut entry = TlbEntry { vpn: 7, pfn: 9, pid: Pid::new(1).unwrap(), valid: true, age: 4 };
        let with_valid = entry.encode();
        entry.valid = false;
        assert_eq!(with_valid & !(1 << TLB_VALID_SHIFT), entry.encode());
    }

    fn any_tlb_entry() -> impl Strategy<Value = TlbEntry> {
        (any::<u8>(), any::<u8>(), 0i64..4, any::<bool>(), 0u64..=255).prop_map(
            |(vpn, pfn, pid, valid, age)| TlbEntry {
                vpn,
                pfn,
                pid: Pid::new(pid).unwrap(),
                valid,
                age,
            },
        )
    }

    proptest! {
        #[test]
        fn prop_tlb_entry_roundtrip(entry in any_tlb_entry()) {
            let word = entry.encode();
            prop_assert!(word < 1 << 27);
            prop_assert_eq!(TlbEntry::decode(word), entry);
        }

        #[test]
        fn prop_page_table_entry_roundtrip(pfn: u8, present: u8, valid: bool) {
            let entry = PageTableEntry { pfn, present, valid };
            let word = entry.encode();
            prop_assert!(word < 1 << 17);
            prop_assert_eq!(PageTableEntry::decode(word), entry);
        }
    }
}
