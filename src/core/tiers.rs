//! x86 SIMD extension tiers and their prerequisite chain.
//!
//! Bit positions follow the Intel SDM / AMD APM CPUID tables
//! (https://en.wikipedia.org/wiki/CPUID).

use crate::core::cpuid::{CpuRegisterSet, CpuidSource, Register};
use crate::core::error::ProbeError;
use bitflags::bitflags;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitLocation {
    pub leaf: u32,
    pub subleaf: u32,
    pub register: Register,
    pub bit: u8,
}

const fn at(leaf: u32, register: Register, bit: u8) -> BitLocation {
    BitLocation { leaf, subleaf: 0, register, bit }
}

/// Individual CPUID feature bits used by the tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum X86Feature {
    Mmx,
    Sse,
    Sse2,
    Sse3,
    Ssse3,
    Sse41,
    Sse42,
    Popcnt,
    Aes,
    Pclmulqdq,
    Avx,
    Avx2,
    Fma3,
    Movbe,
    Osxsave,
    Bmi1,
    Bmi2,
    Lzcnt,
    Avx512F,
    Avx512Cd,
    Avx512Er,
    Avx512Pf,
    Avx512Vl,
    Avx512Dq,
    Avx512Bw,
    Avx512Ifma,
    Avx512Vbmi,
}

impl X86Feature {
    pub const ALL: [X86Feature; 27] = [
        X86Feature::Mmx,
        X86Feature::Sse,
        X86Feature::Sse2,
        X86Feature::Sse3,
        X86Feature::Ssse3,
        X86Feature::Sse41,
        X86Feature::Sse42,
        X86Feature::Popcnt,
        X86Feature::Aes,
        X86Feature::Pclmulqdq,
        X86Feature::Avx,
        X86Feature::Avx2,
        X86Feature::Fma3,
        X86Feature::Movbe,
        X86Feature::Osxsave,
        X86Feature::Bmi1,
        X86Feature::Bmi2,
        X86Feature::Lzcnt,
        X86Feature::Avx512F,
        X86Feature::Avx512Cd,
        X86Feature::Avx512Er,
        X86Feature::Avx512Pf,
        X86Feature::Avx512Vl,
        X86Feature::Avx512Dq,
        X86Feature::Avx512Bw,
        X86Feature::Avx512Ifma,
        X86Feature::Avx512Vbmi,
    ];

    pub const fn location(self) -> BitLocation {
        use Register::*;
        match self {
            X86Feature::Mmx => at(1, Edx, 23),
            X86Feature::Sse => at(1, Edx, 25),
            X86Feature::Sse2 => at(1, Edx, 26),
            X86Feature::Sse3 => at(1, Ecx, 0),
            X86Feature::Ssse3 => at(1, Ecx, 9),
            X86Feature::Sse41 => at(1, Ecx, 19),
            X86Feature::Sse42 => at(1, Ecx, 20),
            X86Feature::Popcnt => at(1, Ecx, 23),
            X86Feature::Aes => at(1, Ecx, 25),
            X86Feature::Pclmulqdq => at(1, Ecx, 1),
            X86Feature::Avx => at(1, Ecx, 28),
            X86Feature::Fma3 => at(1, Ecx, 12),
            X86Feature::Movbe => at(1, Ecx, 22),
            X86Feature::Osxsave => at(1, Ecx, 27),
            X86Feature::Avx2 => at(7, Ebx, 5),
            X86Feature::Bmi1 => at(7, Ebx, 3),
            X86Feature::Bmi2 => at(7, Ebx, 8),
            X86Feature::Avx512F => at(7, Ebx, 16),
            X86Feature::Avx512Dq => at(7, Ebx, 17),
            X86Feature::Avx512Ifma => at(7, Ebx, 21),
            X86Feature::Avx512Pf => at(7, Ebx, 26),
            X86Feature::Avx512Er => at(7, Ebx, 27),
            X86Feature::Avx512Cd => at(7, Ebx, 28),
            X86Feature::Avx512Bw => at(7, Ebx, 30),
            X86Feature::Avx512Vl => at(7, Ebx, 31),
            X86Feature::Avx512Vbmi => at(7, Ecx, 1),
            X86Feature::Lzcnt => at(0x8000_0001, Ecx, 5),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            X86Feature::Mmx => "mmx",
            X86Feature::Sse => "sse",
            X86Feature::Sse2 => "sse2",
            X86Feature::Sse3 => "sse3",
            X86Feature::Ssse3 => "ssse3",
            X86Feature::Sse41 => "sse4.1",
            X86Feature::Sse42 => "sse4.2",
            X86Feature::Popcnt => "popcnt",
            X86Feature::Aes => "aes",
            X86Feature::Pclmulqdq => "pclmulqdq",
            X86Feature::Avx => "avx",
            X86Feature::Avx2 => "avx2",
            X86Feature::Fma3 => "fma",
            X86Feature::Movbe => "movbe",
            X86Feature::Osxsave => "osxsave",
            X86Feature::Bmi1 => "bmi1",
            X86Feature::Bmi2 => "bmi2",
            X86Feature::Lzcnt => "lzcnt",
            X86Feature::Avx512F => "avx512f",
            X86Feature::Avx512Cd => "avx512cd",
            X86Feature::Avx512Er => "avx512er",
            X86Feature::Avx512Pf => "avx512pf",
            X86Feature::Avx512Vl => "avx512vl",
            X86Feature::Avx512Dq => "avx512dq",
            X86Feature::Avx512Bw => "avx512bw",
            X86Feature::Avx512Ifma => "avx512ifma",
            X86Feature::Avx512Vbmi => "avx512vbmi",
        }
    }
}

/// One named step of the SIMD prerequisite chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Sse3,
    Sse42,
    Avx,
    Avx2,
    /// Haswell-class bundle: FMA3, MOVBE, OSXSAVE, BMI1, BMI2, LZCNT.
    Gen4,
    Avx512FCd,
    Avx512ErPf,
    Avx512VlDqBw,
    Avx512IfmaVbmi,
}

impl Tier {
    /// Ascending dependency order; every tier comes after its parent.
    pub const ALL: [Tier; 9] = [
        Tier::Sse3,
        Tier::Sse42,
        Tier::Avx,
        Tier::Avx2,
        Tier::Gen4,
        Tier::Avx512FCd,
        Tier::Avx512ErPf,
        Tier::Avx512VlDqBw,
        Tier::Avx512IfmaVbmi,
    ];

    pub const fn parent(self) -> Option<Tier> {
        match self {
            Tier::Sse3 => None,
            Tier::Sse42 => Some(Tier::Sse3),
            Tier::Avx => Some(Tier::Sse42),
            Tier::Avx2 => Some(Tier::Avx),
            Tier::Gen4 => Some(Tier::Avx2),
            Tier::Avx512FCd => Some(Tier::Gen4),
            Tier::Avx512ErPf | Tier::Avx512VlDqBw | Tier::Avx512IfmaVbmi => Some(Tier::Avx512FCd),
        }
    }

    /// Bits this tier checks itself, in evaluation order.
    pub const fn requirements(self) -> &'static [X86Feature] {
        use X86Feature::*;
        match self {
            Tier::Sse3 => &[Ssse3, Sse3, Sse2, Sse, Mmx],
            Tier::Sse42 => &[Sse42, Sse41, Popcnt, Aes, Pclmulqdq],
            Tier::Avx => &[Avx],
            Tier::Avx2 => &[Avx2],
            Tier::Gen4 => &[Fma3, Movbe, Osxsave, Bmi1, Bmi2, Lzcnt],
            Tier::Avx512FCd => &[Avx512F, Avx512Cd],
            Tier::Avx512ErPf => &[Avx512Er, Avx512Pf],
            Tier::Avx512VlDqBw => &[Avx512Vl, Avx512Dq, Avx512Bw],
            Tier::Avx512IfmaVbmi => &[Avx512Ifma, Avx512Vbmi],
        }
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Tier::Sse3 => "SSE3",
            Tier::Sse42 => "SSE4.2",
            Tier::Avx => "AVX",
            Tier::Avx2 => "AVX2",
            Tier::Gen4 => "GEN4",
            Tier::Avx512FCd => "AVX512-F-CD",
            Tier::Avx512ErPf => "AVX512-ER-PF",
            Tier::Avx512VlDqBw => "AVX512-VL-DQ-BW",
            Tier::Avx512IfmaVbmi => "AVX512-IFMA-VBMI",
        }
    }

    pub const fn flag(self) -> TierSet {
        match self {
            Tier::Sse3 => TierSet::SSE3,
            Tier::Sse42 => TierSet::SSE4_2,
            Tier::Avx => TierSet::AVX,
            Tier::Avx2 => TierSet::AVX2,
            Tier::Gen4 => TierSet::GEN4,
            Tier::Avx512FCd => TierSet::AVX512_F_CD,
            Tier::Avx512ErPf => TierSet::AVX512_ER_PF,
            Tier::Avx512VlDqBw => TierSet::AVX512_VL_DQ_BW,
            Tier::Avx512IfmaVbmi => TierSet::AVX512_IFMA_VBMI,
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TierSet: u16 {
        const SSE3             = 1 << 0;
        const SSE4_2           = 1 << 1;
        const AVX              = 1 << 2;
        const AVX2             = 1 << 3;
        const GEN4             = 1 << 4;
        const AVX512_F_CD      = 1 << 5;
        const AVX512_ER_PF     = 1 << 6;
        const AVX512_VL_DQ_BW  = 1 << 7;
        const AVX512_IFMA_VBMI = 1 << 8;
    }
}

impl TierSet {
    pub fn tiers(self) -> impl Iterator<Item = Tier> {
        Tier::ALL.into_iter().filter(move |tier| self.contains(tier.flag()))
    }

    pub fn mnemonics(self) -> Vec<&'static str> {
        self.tiers().map(Tier::mnemonic).collect()
    }
}

/// Reads one feature bit with no prerequisite checks.
pub fn has_feature<S: CpuidSource + ?Sized>(cpuid: &S, feature: X86Feature) -> bool {
    let loc = feature.location();
    match cpuid.query(loc.leaf, loc.subleaf) {
        Ok(regs) => regs.bit(loc.register, loc.bit),
        Err(err) => {
            trace!("{}: {}", feature.name(), err);
            false
        }
    }
}

/// Checks only the tier's own bits. Leaves are re-queried whenever the
/// requirement moves to a different one; nothing is kept between calls.
fn local_match<S: CpuidSource + ?Sized>(cpuid: &S, tier: Tier) -> Result<bool, ProbeError> {
    let mut current: Option<(u32, u32, CpuRegisterSet)> = None;
    for feature in tier.requirements() {
        let loc = feature.location();
        let regs = match current {
            Some((leaf, subleaf, regs)) if leaf == loc.leaf && subleaf == loc.subleaf => regs,
            _ => {
                let regs = cpuid.query(loc.leaf, loc.subleaf)?;
                current = Some((loc.leaf, loc.subleaf, regs));
                regs
            }
        };
        if !regs.bit(loc.register, loc.bit) {
            trace!("{}: missing {}", tier.mnemonic(), feature.name());
            return Ok(false);
        }
    }
    Ok(true)
}

/// True when the tier's own bits are set and its parent tier holds.
pub fn supports<S: CpuidSource + ?Sized>(cpuid: &S, tier: Tier) -> bool {
    match local_match(cpuid, tier) {
        Ok(true) => {}
        Ok(false) => return false,
        Err(err) => {
            trace!("{}: {}", tier.mnemonic(), err);
            return false;
        }
    }
    match tier.parent() {
        Some(parent) => supports(cpuid, parent),
        None => true,
    }
}

pub fn supported_tiers<S: CpuidSource + ?Sized>(cpuid: &S) -> TierSet {
    Tier::ALL
        .into_iter()
        .filter(|&tier| supports(cpuid, tier))
        .fold(TierSet::empty(), |set, tier| set | tier.flag())
}

/// Last supported tier in dependency order.
pub fn highest_tier<S: CpuidSource + ?Sized>(cpuid: &S) -> Option<Tier> {
    supported_tiers(cpuid).tiers().last()
}

/// Space-separated tier mnemonics, one per supported tier.
pub fn feature_summary<S: CpuidSource + ?Sized>(cpuid: &S) -> String {
    supported_tiers(cpuid).mnemonics().join(" ")
}
