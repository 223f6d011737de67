//! Public query surface.
//!
//! The buffer functions mirror the C contract: the buffer is cleared before
//! any platform work, and on failure it is left holding an empty string.
//! The `Result` functions underneath are what the buffer functions fill
//! from, for Rust callers that want the reason for a failure.

use crate::core::buffer::OutputBuffer;
use crate::core::error::ProbeError;
use crate::core::tiers::{self, Tier, TierSet, X86Feature};
use crate::platform::{self, HostCapabilityProvider};
use serde::Serialize;
use tracing::debug;

pub fn vendor() -> Result<String, ProbeError> {
    platform::host().vendor()
}

pub fn brand() -> Result<String, ProbeError> {
    platform::host().brand()
}

pub fn part() -> Result<String, ProbeError> {
    platform::host().part()
}

/// Core count as a short description, e.g. `"8-Core"`.
pub fn core_count() -> Result<String, ProbeError> {
    platform::host().core_count().map(|cores| format!("{}-Core", cores))
}

/// Space-separated feature mnemonics in ascending dependency order.
pub fn feature_summary() -> Result<String, ProbeError> {
    platform::host().features()
}

fn fill(
    what: &str,
    buffer: &mut [u8],
    query: impl FnOnce(&dyn HostCapabilityProvider) -> Result<String, ProbeError>,
) -> bool {
    let mut out = match OutputBuffer::new(buffer) {
        Ok(out) => out,
        Err(_) => return false,
    };
    match query(platform::host()).and_then(|text| out.write(&text)) {
        Ok(()) => true,
        Err(err) => {
            debug!("{} unavailable: {}", what, err);
            false
        }
    }
}

pub fn get_vendor(buffer: &mut [u8]) -> bool {
    fill("vendor", buffer, |host| host.vendor())
}

pub fn get_brand(buffer: &mut [u8]) -> bool {
    fill("brand", buffer, |host| host.brand())
}

pub fn get_part(buffer: &mut [u8]) -> bool {
    fill("part", buffer, |host| host.part())
}

pub fn get_core_count(buffer: &mut [u8]) -> bool {
    fill("core count", buffer, |_| core_count())
}

pub fn get_feature_summary(buffer: &mut [u8]) -> bool {
    fill("features", buffer, |host| host.features())
}

pub fn cpu_has_sse3() -> bool {
    platform::host().supports(Tier::Sse3)
}

pub fn cpu_has_sse4_2() -> bool {
    platform::host().supports(Tier::Sse42)
}

pub fn cpu_has_avx() -> bool {
    platform::host().supports(Tier::Avx)
}

pub fn cpu_has_avx2() -> bool {
    platform::host().supports(Tier::Avx2)
}

/// FMA3, MOVBE, OSXSAVE, BMI1, BMI2 and LZCNT on top of AVX2.
pub fn is_cpu_gen_4() -> bool {
    platform::host().supports(Tier::Gen4)
}

pub fn cpu_has_avx512_f_cd() -> bool {
    platform::host().supports(Tier::Avx512FCd)
}

pub fn cpu_has_avx512_er_pf() -> bool {
    platform::host().supports(Tier::Avx512ErPf)
}

pub fn cpu_has_avx512_vl_dq_bw() -> bool {
    platform::host().supports(Tier::Avx512VlDqBw)
}

pub fn cpu_has_avx512_ifma_vbmi() -> bool {
    platform::host().supports(Tier::Avx512IfmaVbmi)
}

pub fn cpu_supports(tier: Tier) -> bool {
    platform::host().supports(tier)
}

/// Single CPUID bit, without the tier chain.
pub fn cpu_has_feature(feature: X86Feature) -> bool {
    platform::host().has_feature(feature)
}

pub fn supported_tiers() -> TierSet {
    match platform::host().cpuid() {
        Some(cpuid) => tiers::supported_tiers(cpuid),
        None => TierSet::empty(),
    }
}

/// Deepest tier that holds, `None` when even SSE3 is missing.
pub fn highest_tier() -> Option<Tier> {
    supported_tiers().tiers().last()
}

/// Everything the identity functions report, in one serializable value.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub provider: &'static str,
    pub vendor: Option<String>,
    pub brand: Option<String>,
    pub part: Option<String>,
    pub cores: Option<String>,
    pub features: Option<String>,
    pub tiers: Vec<&'static str>,
}

impl Report {
    pub fn collect() -> Self {
        Self {
            provider: platform::host().name(),
            vendor: vendor().ok(),
            brand: brand().ok(),
            part: part().ok(),
            cores: core_count().ok(),
            features: feature_summary().ok(),
            tiers: supported_tiers().mnemonics(),
        }
    }
}
