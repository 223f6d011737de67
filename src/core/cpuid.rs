//! x86 identification-instruction contract.

use crate::core::error::ProbeError;
use serde::Serialize;

/// Output registers of one CPUID call at a (leaf, subleaf) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CpuRegisterSet {
    pub eax: u32,
    pub ebx: u32,
    pub ecx: u32,
    pub edx: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    Eax,
    Ebx,
    Ecx,
    Edx,
}

impl CpuRegisterSet {
    pub fn get(&self, register: Register) -> u32 {
        match register {
            Register::Eax => self.eax,
            Register::Ebx => self.ebx,
            Register::Ecx => self.ecx,
            Register::Edx => self.edx,
        }
    }

    pub fn bit(&self, register: Register, bit: u8) -> bool {
        self.get(register) & (1 << bit) != 0
    }
}

pub const EXTENDED_BASE: u32 = 0x8000_0000;

/// Anything that can answer CPUID queries: the processor itself, or a
/// recorded register dump.
pub trait CpuidSource {
    /// Issues the instruction with no level check. `None` when the
    /// instruction is unavailable on this target.
    fn execute(&self, leaf: u32, subleaf: u32) -> Option<CpuRegisterSet>;

    /// Highest leaf answered in the range starting at `base` (0 or 0x8000_0000).
    fn max_leaf(&self, base: u32) -> Result<u32, ProbeError> {
        self.execute(base, 0)
            .map(|regs| regs.eax)
            .ok_or(ProbeError::MissingRegister("cpuid"))
    }

    /// Probes the maximum supported leaf first and only then issues the
    /// functional query.
    fn query(&self, leaf: u32, subleaf: u32) -> Result<CpuRegisterSet, ProbeError> {
        let max = self.max_leaf(leaf & EXTENDED_BASE)?;
        if max < leaf {
            return Err(ProbeError::UnsupportedLevel { requested: leaf, max });
        }
        self.execute(leaf, subleaf)
            .ok_or(ProbeError::MissingRegister("cpuid"))
    }
}
