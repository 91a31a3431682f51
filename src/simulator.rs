//! Trace driver.
//!
//! Owns the define gate, the current process and every process's saved
//! registers, dispatches parsed instructions onto the VM and renders each
//! outcome into the output log.

use std::io::Write;

use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::constants::*;
use crate::error::{ConfigError, Result, SimError, TranslationFault};
use crate::io::{Instruction, LoadSource, StoreSource, TraceLog};
use crate::process::{Pid, Register, RegisterFile};
use crate::tlb::Strategy;
use crate::translation::Translation;
use crate::vm_manager::VmManager;

/// Counters for a completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub instructions: usize,
    pub log_lines: usize,
}

pub struct Simulator {
    strategy: Strategy,
    vm: Option<VmManager>,
    pid: Pid,
    registers: [RegisterFile; NUM_PROCESSES],
}

impl Simulator {
    pub fn new(strategy: Strategy) -> Self {
        Simulator {
            strategy,
            vm: None,
            pid: Pid::default(),
            registers: [RegisterFile::default(); NUM_PROCESSES],
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn vm(&self) -> Option<&VmManager> {
        self.vm.as_ref()
    }

    /// Register contents of the running process
    pub fn register(&self, reg: Register) -> u32 {
        self.registers[self.pid.index()].get(reg)
    }

    /// Run a whole trace. The first fatal error is written to `log` and
    /// returned; nothing after it is executed.
    pub fn run<W: Write>(&mut self, trace: &str, log: &mut TraceLog<W>) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for (number, line) in trace.lines().enumerate() {
            match self.run_line(line, log) {
                Ok(true) => summary.instructions += 1,
                Ok(false) => {}
                Err(SimError::Io(e)) => return Err(SimError::Io(e)),
                Err(e) => {
                    warn!("line {}: stopping trace: {}", number + 1, e);
                    log.record(self.pid, &e)?;
                    log.flush()?;
                    return Err(e);
                }
            }
        }

        info!("Reached end of trace after {} instructions", summary.instructions);
        log.flush()?;
        summary.log_lines = log.lines();
        Ok(summary)
    }

    /// Parse and execute one line. Returns whether it held an instruction.
    pub fn run_line<W: Write>(&mut self, line: &str, log: &mut TraceLog<W>) -> Result<bool> {
        // the define gate looks at the opcode before any operand is parsed
        if let Some(op) = line.split_whitespace().next().filter(|op| !op.starts_with('%')) {
            self.check_define_gate(op == "define")?;
        }

        match Instruction::parse(line)? {
            Some(instruction) => {
                debug!("[pid {}] {:?}", self.pid, instruction);
                self.execute(instruction, log)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn execute<W: Write>(&mut self, instruction: Instruction, log: &mut TraceLog<W>) -> Result<()> {
        self.check_define_gate(instruction.is_define())?;

        match instruction {
            Instruction::Define { offset_bits, pfn_bits, vpn_bits } => {
                let config = SystemConfig::new(offset_bits, pfn_bits, vpn_bits)?;
                info!(
                    "defined {} words of physical memory, {} pages per process, {} TLB",
                    config.physical_words(),
                    config.page_count(),
                    self.strategy
                );
                self.vm = Some(VmManager::new(config, self.strategy));
                log.record(
                    self.pid,
                    format_args!(
                        "Memory instantiation complete. OFF bits: {}. PFN bits: {}. VPN bits: {}",
                        offset_bits, pfn_bits, vpn_bits
                    ),
                )?;
            }
            Instruction::CtxSwitch(raw) => {
                // registers live per process, so switching is just a new index
                self.pid = Pid::new(raw)?;
                log.record(
                    self.pid,
                    format_args!("Switched execution context to process: {}", self.pid),
                )?;
            }
            Instruction::Map { vpn, pfn } => {
                let pid = self.pid;
                let vm = self.vm_mut()?;
                let vpn = check_vpn(vm.config(), vpn)?;
                let pfn = check_pfn(vm.config(), pfn)?;
                let insertion = vm.translator_mut().map_page(pid, vpn, pfn)?;
                if let Some(evicted) = insertion.evicted {
                    debug!("map evicted {:?} from TLB slot {}", evicted, insertion.slot);
                }
                log.record(
                    pid,
                    format_args!(
                        "Mapped virtual page number {} to physical frame number {}",
                        vpn, pfn
                    ),
                )?;
            }
            Instruction::Unmap { vpn } => {
                let pid = self.pid;
                let vm = self.vm_mut()?;
                let vpn = check_vpn(vm.config(), vpn)?;
                if vm.translator_mut().unmap_page(pid, vpn)?.is_none() {
                    debug!("unmap of VPN {} found no live TLB entry", vpn);
                }
                log.record(pid, format_args!("Unmapped virtual page number {}", vpn))?;
            }
            Instruction::Load { reg, source: LoadSource::Immediate(value) } => {
                self.registers[self.pid.index()].set(reg, value);
                log.record(
                    self.pid,
                    format_args!("Loaded immediate {} into register {}", value, reg),
                )?;
            }
            Instruction::Load { reg, source: LoadSource::Address(address) } => {
                let pid = self.pid;
                let vm = self.vm_mut()?;
                check_address(vm.config(), address)?;
                let (resolved, value) = match vm.load(address, pid) {
                    Ok(loaded) => loaded,
                    Err(fault) => return Err(record_fault(log, pid, fault)),
                };
                record_translation(log, pid, resolved.va.vpn, &resolved.translation)?;

                self.registers[pid.index()].set(reg, value);
                log.record(
                    pid,
                    format_args!(
                        "Loaded value of location {} ({}) into register {}",
                        address, value, reg
                    ),
                )?;
            }
            Instruction::Store { address, source } => {
                let pid = self.pid;
                let value = match source {
                    StoreSource::Immediate(value) => value,
                    StoreSource::Register(reg) => self.registers[pid.index()].get(reg),
                };
                let vm = self.vm_mut()?;
                check_address(vm.config(), address)?;
                let resolved = match vm.store(address, pid, value) {
                    Ok(resolved) => resolved,
                    Err(fault) => return Err(record_fault(log, pid, fault)),
                };
                record_translation(log, pid, resolved.va.vpn, &resolved.translation)?;

                match source {
                    StoreSource::Immediate(_) => log.record(
                        pid,
                        format_args!("Stored immediate {} into location {}", value, address),
                    )?,
                    StoreSource::Register(reg) => log.record(
                        pid,
                        format_args!(
                            "Stored value of register {} ({}) into location {}",
                            reg, value, address
                        ),
                    )?,
                }
            }
            Instruction::Add => {
                let regs = &mut self.registers[self.pid.index()];
                let (a, b) = (regs.get(Register::R1), regs.get(Register::R2));
                let sum = a.wrapping_add(b);
                regs.set(Register::R1, sum);
                log.record(
                    self.pid,
                    format_args!(
                        "Added contents of registers r1 ({}) and r2 ({}). Result: {}",
                        a, b, sum
                    ),
                )?;
            }
            Instruction::RInspect(reg) => {
                let value = self.register(reg);
                log.record(self.pid, format_args!("Inspected register {}. Content: {}", reg, value))?;
            }
            Instruction::PInspect { vpn } => {
                let pid = self.pid;
                let vm = self.vm_ref()?;
                let vpn = check_vpn(vm.config(), vpn)?;
                let entry = vm.translator().page_tables().lookup(pid, vpn);
                log.record(
                    pid,
                    format_args!(
                        "Inspected page table entry {}. Physical frame number: {}. Valid: {}",
                        vpn,
                        entry.pfn,
                        u8::from(entry.valid)
                    ),
                )?;
            }
            Instruction::TInspect { slot } => {
                let pid = self.pid;
                let vm = self.vm_ref()?;
                let entry = vm
                    .translator()
                    .tlb()
                    .entry(slot as usize)
                    .copied()
                    .ok_or_else(|| {
                        SimError::InvalidOperand(format!(
                            "{} (TLB entry must be below {})",
                            slot, TLB_SIZE
                        ))
                    })?;
                log.record(
                    pid,
                    format_args!(
                        "Inspected TLB entry {}. VPN: {}. PFN: {}. Valid: {}. PID: {}. Timestamp: {}",
                        slot,
                        entry.vpn,
                        entry.pfn,
                        u8::from(entry.valid),
                        entry.pid,
                        entry.timestamp()
                    ),
                )?;
            }
            Instruction::LInspect { address } => {
                let pid = self.pid;
                let vm = self.vm_ref()?;
                let words = vm.memory().len();
                if address as usize >= words {
                    return Err(SimError::InvalidOperand(format!(
                        "{} (physical location must be below {})",
                        address, words
                    )));
                }
                let value = vm.memory().read(address as usize);
                log.record(
                    pid,
                    format_args!("Inspected physical location {}. Value: {}", address, value),
                )?;
            }
        }

        Ok(())
    }

    /// Dump the packed TLB and page table words at debug level
    pub fn dump_state(&self) {
        let Some(vm) = &self.vm else {
            debug!("no state to dump: define never ran");
            return;
        };
        let translator = vm.translator();
        debug!(
            "{} TLB, {} of {} slots valid",
            translator.tlb().strategy(),
            translator.tlb().valid_count(),
            TLB_SIZE
        );
        for (slot, word) in translator.tlb().encoded().iter().enumerate() {
            debug!("TLB[{}] = {:#09x}", slot, word);
        }
        for pid in Pid::ALL {
            let words = translator.page_tables().table(pid).encoded();
            let live = words.iter().filter(|&&w| w & 1 == 1).count();
            debug!("PT[{}] ({} valid) = {:x?}", pid, live, words);
        }
    }

    fn check_define_gate(&self, is_define: bool) -> Result<()> {
        match (self.vm.is_some(), is_define) {
            (false, false) => Err(ConfigError::NotDefined.into()),
            (true, true) => Err(ConfigError::AlreadyDefined.into()),
            _ => Ok(()),
        }
    }

    fn vm_ref(&self) -> Result<&VmManager> {
        self.vm.as_ref().ok_or_else(|| ConfigError::NotDefined.into())
    }

    fn vm_mut(&mut self) -> Result<&mut VmManager> {
        self.vm.as_mut().ok_or_else(|| ConfigError::NotDefined.into())
    }
}

fn check_vpn(config: &SystemConfig, vpn: u32) -> Result<u8> {
    if vpn as usize >= config.page_count() {
        return Err(SimError::InvalidOperand(format!(
            "{} (VPN must be below {})",
            vpn,
            config.page_count()
        )));
    }
    // page_count never exceeds 256
    Ok(vpn as u8)
}

fn check_pfn(config: &SystemConfig, pfn: u32) -> Result<u8> {
    if pfn as usize >= config.frame_count() {
        return Err(SimError::InvalidOperand(format!(
            "{} (PFN must be below {})",
            pfn,
            config.frame_count()
        )));
    }
    Ok(pfn as u8)
}

fn check_address(config: &SystemConfig, address: u32) -> Result<()> {
    if address as usize >= config.virtual_words() {
        return Err(SimError::InvalidOperand(format!(
            "{} (virtual address must be below {})",
            address,
            config.virtual_words()
        )));
    }
    Ok(())
}

fn record_translation<W: Write>(
    log: &mut TraceLog<W>,
    pid: Pid,
    vpn: u32,
    translation: &Translation,
) -> Result<()> {
    match *translation {
        Translation::Hit { slot, pfn } => log.record(
            pid,
            format_args!(
                "Translating. Lookup for VPN {} hit in TLB entry {}. PFN is {}",
                vpn, slot, pfn
            ),
        )?,
        Translation::Miss { slot, pfn, evicted } => {
            if let Some(evicted) = evicted {
                debug!("refill evicted {:?} from TLB slot {}", evicted, slot);
            }
            log.record(
                pid,
                format_args!("Translating. Lookup for VPN {} caused a TLB miss", vpn),
            )?;
            log.record(
                pid,
                format_args!("Translating. Successfully mapped VPN {} to PFN {}", vpn, pfn),
            )?;
        }
    }
    Ok(())
}

/// Unmapped pages only ever follow a TLB miss, so the miss line precedes the error.
fn record_fault<W: Write>(
    log: &mut TraceLog<W>,
    pid: Pid,
    fault: TranslationFault,
) -> SimError {
    if let TranslationFault::PageNotMapped { vpn } = fault {
        if let Err(e) = log.record(
            pid,
            format_args!("Translating. Lookup for VPN {} caused a TLB miss", vpn),
        ) {
            return SimError::Io(e);
        }
    }
    fault.into()
}
