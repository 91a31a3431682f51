//! Translation lookaside buffer.
//!
//! Eight fully associative slots tagged by (VPN, pid). Every slot carries an
//! age counter: refills age all valid slots by one and reset the written slot
//! to zero. The counter is wide; only the packed word clamps it to 255. When no slot can be reused and none is free, the oldest slot is
//! evicted (lowest index wins a tie).
//!
//! The two strategies only differ on a hit: LRU refreshes the hit slot the
//! same way a refill would, FIFO leaves every counter alone.

use std::fmt;
use std::str::FromStr;

use crate::constants::*;
use crate::entry::TlbEntry;
use crate::process::Pid;

/// TLB replacement strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    #[default]
    Fifo,
    Lru,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FIFO" => Ok(Strategy::Fifo),
            "LRU" => Ok(Strategy::Lru),
            _ => Err(format!("unknown strategy '{}', expected FIFO or LRU", s)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Fifo => write!(f, "FIFO"),
            Strategy::Lru => write!(f, "LRU"),
        }
    }
}

/// Where a refill landed, and what it displaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insertion {
    pub slot: usize,
    /// A live mapping for a different (vpn, pid) that was overwritten
    pub evicted: Option<TlbEntry>,
}

pub struct Tlb {
    entries: [TlbEntry; TLB_SIZE],
    strategy: Strategy,
}

impl Tlb {
    pub fn new(strategy: Strategy) -> Self {
        Tlb {
            entries: [TlbEntry::default(); TLB_SIZE],
            strategy,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Slot tagged (vpn, pid), valid or not
    pub fn lookup(&self, vpn: u8, pid: Pid) -> Option<usize> {
        self.entries.iter().position(|e| e.tags(vpn, pid))
    }

    /// Slot holding a live mapping for (vpn, pid)
    pub fn lookup_valid(&self, vpn: u8, pid: Pid) -> Option<usize> {
        self.entries.iter().position(|e| e.valid && e.tags(vpn, pid))
    }

    /// Write (vpn, pid) -> pfn into the refill target slot.
    pub fn insert(&mut self, vpn: u8, pid: Pid, pfn: u8) -> Insertion {
        let slot = self
            .lookup(vpn, pid)
            .or_else(|| self.first_invalid())
            .unwrap_or_else(|| self.victim());

        let old = self.entries[slot];
        let evicted = (old.valid && !old.tags(vpn, pid)).then_some(old);

        self.age_valid_entries();
        self.entries[slot] = TlbEntry {
            vpn,
            pfn,
            pid,
            valid: true,
            age: 0,
        };

        Insertion { slot, evicted }
    }

    /// Hit bookkeeping for `slot`. Only LRU tracks use.
    pub fn touch(&mut self, slot: usize) {
        match self.strategy {
            Strategy::Fifo => {}
            Strategy::Lru => {
                self.age_valid_entries();
                self.entries[slot].age = 0;
            }
        }
    }

    /// Drop the live mapping for (vpn, pid), if any. Age is left as is.
    pub fn invalidate(&mut self, vpn: u8, pid: Pid) -> Option<usize> {
        let slot = self.lookup_valid(vpn, pid)?;
        self.entries[slot].valid = false;
        Some(slot)
    }

    pub fn entry(&self, slot: usize) -> Option<&TlbEntry> {
        self.entries.get(slot)
    }

    pub fn entries(&self) -> &[TlbEntry; TLB_SIZE] {
        &self.entries
    }

    pub fn valid_count(&self) -> usize {
        self.entries.iter().filter(|e| e.valid).count()
    }

    /// Packed words of every slot
    pub fn encoded(&self) -> [u32; TLB_SIZE] {
        self.entries.map(|e| e.encode())
    }

    fn first_invalid(&self) -> Option<usize> {
        self.entries.iter().position(|e| !e.valid)
    }

    /// Oldest slot; strict comparison keeps the lowest index on ties
    fn victim(&self) -> usize {
        let mut victim = 0;
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.age > self.entries[victim].age {
                victim = i;
            }
        }
        victim
    }

    fn age_valid_entries(&mut self) {
        for entry in self.entries.iter_mut().filter(|e| e.valid) {
            entry.age += 1;
        }
    }
}
