//! Host CPU identification.
//!
//! Reports vendor, brand, part, core count and SIMD capability for the
//! processor the program runs on, using CPUID on x86-64, the ARM ID
//! registers, `sysctlbyname` on macOS, system-information calls on Windows,
//! or `/proc/cpuinfo` on Linux. Nothing is cached: every query goes back
//! to the hardware.

pub mod api;
pub mod core;
pub mod ffi;
pub mod platform;

pub use crate::api::{
    brand, core_count, cpu_has_avx, cpu_has_avx2, cpu_has_avx512_er_pf, cpu_has_avx512_f_cd,
    cpu_has_avx512_ifma_vbmi, cpu_has_avx512_vl_dq_bw, cpu_has_feature, cpu_has_sse3,
    cpu_has_sse4_2, cpu_supports, feature_summary, get_brand, get_core_count, get_feature_summary,
    get_part, get_vendor, highest_tier, is_cpu_gen_4, part, supported_tiers, vendor, Report,
};
pub use crate::core::error::ProbeError;
pub use crate::core::tiers::{Tier, TierSet, X86Feature};
