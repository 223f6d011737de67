//! Host capability providers, one per OS / architecture combination.

pub mod arm;
pub mod procfs;
pub mod x86;

#[cfg(target_vendor = "apple")]
pub mod macos;
#[cfg(windows)]
pub mod win32;

use crate::core::cpuid::CpuidSource;
use crate::core::error::ProbeError;
use crate::core::tiers::{Tier, X86Feature};
use arm::IdRegisters;
use std::sync::OnceLock;
use tracing::debug;

/// Raw identity queries for one kind of host. Every call goes back to the
/// hardware or OS; implementations keep no results.
pub trait HostCapabilityProvider: Send + Sync {
    fn name(&self) -> &'static str;
    fn vendor(&self) -> Result<String, ProbeError>;
    fn brand(&self) -> Result<String, ProbeError>;
    fn part(&self) -> Result<String, ProbeError>;
    fn core_count(&self) -> Result<u32, ProbeError>;
    fn features(&self) -> Result<String, ProbeError>;

    /// x86 SIMD tiers; every other host supports none.
    fn supports(&self, _tier: Tier) -> bool {
        false
    }

    fn has_feature(&self, _feature: X86Feature) -> bool {
        false
    }

    fn cpuid(&self) -> Option<&dyn CpuidSource> {
        None
    }

    fn id_registers(&self) -> Result<IdRegisters, ProbeError> {
        Err(ProbeError::SourceUnavailable("ID registers".to_string()))
    }
}

/// Host with no acquisition path at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unsupported;

impl HostCapabilityProvider for Unsupported {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn vendor(&self) -> Result<String, ProbeError> {
        Err(ProbeError::SourceUnavailable("vendor".to_string()))
    }

    fn brand(&self) -> Result<String, ProbeError> {
        Err(ProbeError::SourceUnavailable("brand".to_string()))
    }

    fn part(&self) -> Result<String, ProbeError> {
        Err(ProbeError::SourceUnavailable("part".to_string()))
    }

    fn core_count(&self) -> Result<u32, ProbeError> {
        Err(ProbeError::SourceUnavailable("core count".to_string()))
    }

    fn features(&self) -> Result<String, ProbeError> {
        Err(ProbeError::SourceUnavailable("features".to_string()))
    }
}

/// Core count for x86 hosts comes from the OS, not CPUID.
#[cfg(target_arch = "x86_64")]
#[allow(unreachable_code)]
fn os_core_count() -> Result<u32, ProbeError> {
    #[cfg(target_os = "linux")]
    return procfs::ProcfsHost::default().physical_cores();
    #[cfg(target_vendor = "apple")]
    return macos::core_count();
    #[cfg(windows)]
    return win32::processor_count();
    Err(ProbeError::SourceUnavailable("core count".to_string()))
}

#[allow(unreachable_code)]
fn select() -> Box<dyn HostCapabilityProvider> {
    #[cfg(target_arch = "x86_64")]
    return Box::new(x86::X86Host::new(x86::NativeCpuid, os_core_count));
    #[cfg(all(target_arch = "aarch64", target_os = "linux"))]
    return Box::new(arm::MidrHost::new(
        arm::read_id_registers,
        crate::core::cpuinfo::PROC_CPUINFO,
    ));
    #[cfg(all(target_arch = "arm", target_os = "linux"))]
    return Box::new(procfs::ProcfsHost::default());
    #[cfg(all(target_arch = "aarch64", target_vendor = "apple"))]
    return Box::new(macos::AppleSiliconHost);
    #[cfg(all(target_arch = "aarch64", windows))]
    return Box::new(win32::WindowsArmHost);
    Box::new(Unsupported)
}

/// The provider for this process, chosen on first use.
pub fn host() -> &'static dyn HostCapabilityProvider {
    static HOST: OnceLock<Box<dyn HostCapabilityProvider>> = OnceLock::new();
    HOST.get_or_init(|| {
        let host = select();
        debug!(provider = host.name(), "selected host provider");
        host
    })
    .as_ref()
}
