use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, SimError};
use crate::process::{Pid, Register};

/// Source operand of `load`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Immediate(u32),
    Address(u32),
}

/// Source operand of `store`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreSource {
    Immediate(u32),
    Register(Register),
}

/// One parsed trace line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Define { offset_bits: u32, pfn_bits: u32, vpn_bits: u32 },
    CtxSwitch(i64),
    Map { vpn: u32, pfn: u32 },
    Unmap { vpn: u32 },
    Load { reg: Register, source: LoadSource },
    Store { address: u32, source: StoreSource },
    Add,
    RInspect(Register),
    PInspect { vpn: u32 },
    TInspect { slot: u32 },
    LInspect { address: u32 },
}

impl Instruction {
    /// Parse a trace line. Blank lines and `%` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&op, args)) = tokens.split_first() else {
            return Ok(None);
        };
        if op.starts_with('%') {
            return Ok(None);
        }

        let instruction = match op {
            "define" => {
                let [off, pfn, vpn] = operands::<3>(op, args)?;
                Instruction::Define {
                    offset_bits: parse_number(off)?,
                    pfn_bits: parse_number(pfn)?,
                    vpn_bits: parse_number(vpn)?,
                }
            }
            "ctxswitch" => {
                let [pid] = operands::<1>(op, args)?;
                Instruction::CtxSwitch(parse_number(pid)?)
            }
            "map" => {
                let [vpn, pfn] = operands::<2>(op, args)?;
                Instruction::Map { vpn: parse_number(vpn)?, pfn: parse_number(pfn)? }
            }
            "unmap" => {
                let [vpn] = operands::<1>(op, args)?;
                Instruction::Unmap { vpn: parse_number(vpn)? }
            }
            "load" => {
                let [reg, src] = operands::<2>(op, args)?;
                let reg = reg.parse()?;
                let source = match parse_immediate(src)? {
                    Some(imm) => LoadSource::Immediate(imm),
                    None => LoadSource::Address(parse_number(src)?),
                };
                Instruction::Load { reg, source }
            }
            "store" => {
                let [dst, src] = operands::<2>(op, args)?;
                let address = parse_number(dst)?;
                let source = match parse_immediate(src)? {
                    Some(imm) => StoreSource::Immediate(imm),
                    None => StoreSource::Register(src.parse()?),
                };
                Instruction::Store { address, source }
            }
            "add" => {
                operands::<0>(op, args)?;
                Instruction::Add
            }
            "rinspect" => {
                let [reg] = operands::<1>(op, args)?;
                Instruction::RInspect(reg.parse()?)
            }
            "pinspect" => {
                let [vpn] = operands::<1>(op, args)?;
                Instruction::PInspect { vpn: parse_number(vpn)? }
            }
            "tinspect" => {
                let [slot] = operands::<1>(op, args)?;
                Instruction::TInspect { slot: parse_number(slot)? }
            }
            "linspect" => {
                let [address] = operands::<1>(op, args)?;
                Instruction::LInspect { address: parse_number(address)? }
            }
            _ => return Err(SimError::UnknownInstruction(op.to_string())),
        };

        Ok(Some(instruction))
    }

    pub fn is_define(&self) -> bool {
        matches!(self, Instruction::Define { .. })
    }
}

fn operands<'a, const N: usize>(op: &str, args: &[&'a str]) -> Result<[&'a str; N]> {
    <[&str; N]>::try_from(args).map_err(|_| {
        SimError::InvalidOperand(format!(
            "{} expects {} operand(s), got {}",
            op,
            N,
            args.len()
        ))
    })
}

/// Unsigned operands parse as `u32`; `ctxswitch` takes a signed pid so that
/// negative ids reach the process check instead of failing here.
fn parse_number<T: FromStr>(token: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| SimError::InvalidOperand(token.to_string()))
}

/// `#<value>` operands
fn parse_immediate(token: &str) -> Result<Option<u32>> {
    match token.strip_prefix('#') {
        Some(value) => parse_number(value).map(Some),
        None => Ok(None),
    }
}

pub fn read_trace<P: AsRef<Path>>(path: P) -> Result<String> {
    Ok(fs::read_to_string(path.as_ref())?)
}

/// Writes `Current PID: n. <message>` lines
pub struct TraceLog<W: Write> {
    out: W,
    lines: usize,
}

impl TraceLog<BufWriter<File>> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(TraceLog::new(BufWriter::new(File::create(path.as_ref())?)))
    }
}

impl<W: Write> TraceLog<W> {
    pub fn new(out: W) -> Self {
        TraceLog { out, lines: 0 }
    }

    pub fn record(&mut self, pid: Pid, message: impl fmt::Display) -> io::Result<()> {
        self.lines += 1;
        writeln!(self.out, "Current PID: {}. {}", pid, message)
    }

    pub fn lines(&self) -> usize {
        self.lines
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
