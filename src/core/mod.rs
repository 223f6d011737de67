pub mod buffer;
pub mod cpuid;
pub mod cpuinfo;
pub mod error;
pub mod lookup;
pub mod tiers;
