//! x86-64 acquisition through the CPUID instruction.

use crate::core::cpuid::{CpuRegisterSet, CpuidSource, EXTENDED_BASE};
use crate::core::error::ProbeError;
use crate::core::tiers::{self, Tier, X86Feature};
use crate::platform::HostCapabilityProvider;
use std::fmt;

/// The processor's own CPUID instruction.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCpuid;

impl CpuidSource for NativeCpuid {
    #[allow(unused_unsafe)]
    fn execute(&self, leaf: u32, subleaf: u32) -> Option<CpuRegisterSet> {
        #[cfg(target_arch = "x86_64")]
        {
            // SAFETY: CPUID is part of the x86-64 baseline.
            let regs = unsafe { std::arch::x86_64::__cpuid_count(leaf, subleaf) };
            Some(CpuRegisterSet {
                eax: regs.eax,
                ebx: regs.ebx,
                ecx: regs.ecx,
                edx: regs.edx,
            })
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            let _ = (leaf, subleaf);
            None
        }
    }
}

/// Decoded processor signature from leaf 1 EAX.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub family: u32,
    pub model: u32,
    pub stepping: u32,
}

impl Signature {
    pub fn decode(eax: u32) -> Self {
        let stepping = eax & 0x0f;
        let model = (eax >> 4) & 0x0f;
        let family = (eax >> 8) & 0x0f;
        let ext_model = (eax >> 16) & 0x0f;
        let ext_family = (eax >> 20) & 0xff;

        // Extended family only counts for family 15, extended model for 6 and 15.
        let reported_family = if family == 15 { family + ext_family } else { family };
        let reported_model = if family == 6 || family == 15 {
            model + (ext_model << 4)
        } else {
            model
        };

        Self {
            family: reported_family,
            model: reported_model,
            stepping,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Family {} Model {}", self.family, self.model)
    }
}

fn registers_to_string(words: &[u32]) -> Result<String, ProbeError> {
    let bytes: Vec<u8> = words.iter().flat_map(|word| word.to_le_bytes()).collect();
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let text = String::from_utf8_lossy(&bytes[..end]).trim().to_string();
    if text.is_empty() {
        return Err(ProbeError::MissingRegister("cpuid string"));
    }
    Ok(text)
}

/// 12-character vendor id from leaf 0, in EBX, EDX, ECX order.
pub fn vendor_string<S: CpuidSource + ?Sized>(cpuid: &S) -> Result<String, ProbeError> {
    let regs = cpuid.query(0, 0)?;
    registers_to_string(&[regs.ebx, regs.edx, regs.ecx])
}

/// 48-character brand string from leaves 0x8000_0002 to 0x8000_0004.
pub fn brand_string<S: CpuidSource + ?Sized>(cpuid: &S) -> Result<String, ProbeError> {
    let max = cpuid.max_leaf(EXTENDED_BASE)?;
    if max < 0x8000_0004 {
        return Err(ProbeError::UnsupportedLevel { requested: 0x8000_0004, max });
    }
    let mut words = Vec::with_capacity(12);
    for leaf in 0x8000_0002..=0x8000_0004 {
        let regs = cpuid.query(leaf, 0)?;
        words.extend_from_slice(&[regs.eax, regs.ebx, regs.ecx, regs.edx]);
    }
    registers_to_string(&words)
}

pub fn signature<S: CpuidSource + ?Sized>(cpuid: &S) -> Result<Signature, ProbeError> {
    cpuid.query(1, 0).map(|regs| Signature::decode(regs.eax))
}

pub type CoreCounter = fn() -> Result<u32, ProbeError>;

/// x86-64 host: identity and features from CPUID, core count from the OS.
pub struct X86Host<S> {
    cpuid: S,
    cores: CoreCounter,
}

impl<S: CpuidSource> X86Host<S> {
    pub fn new(cpuid: S, cores: CoreCounter) -> Self {
        Self { cpuid, cores }
    }
}

impl<S: CpuidSource + Send + Sync> HostCapabilityProvider for X86Host<S> {
    fn name(&self) -> &'static str {
        "x86-64 cpuid"
    }

    fn vendor(&self) -> Result<String, ProbeError> {
        vendor_string(&self.cpuid)
    }

    fn brand(&self) -> Result<String, ProbeError> {
        brand_string(&self.cpuid)
    }

    fn part(&self) -> Result<String, ProbeError> {
        signature(&self.cpuid).map(|sig| sig.to_string())
    }

    fn core_count(&self) -> Result<u32, ProbeError> {
        (self.cores)()
    }

    fn features(&self) -> Result<String, ProbeError> {
        Ok(tiers::feature_summary(&self.cpuid))
    }

    fn supports(&self, tier: Tier) -> bool {
        tiers::supports(&self.cpuid, tier)
    }

    fn has_feature(&self, feature: X86Feature) -> bool {
        tiers::has_feature(&self.cpuid, feature)
    }

    fn cpuid(&self) -> Option<&dyn CpuidSource> {
        Some(&self.cpuid)
    }
}
