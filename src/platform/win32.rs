//! Windows acquisition through system-information calls.

use crate::core::error::ProbeError;
use crate::platform::HostCapabilityProvider;
use windows::Win32::System::SystemInformation::{
    GetNativeSystemInfo, PROCESSOR_ARCHITECTURE_ARM64, SYSTEM_INFO,
};
use windows::Win32::System::Threading::{
    IsProcessorFeaturePresent, PF_ARM_V82_DP_INSTRUCTIONS_AVAILABLE,
    PF_ARM_V8_INSTRUCTIONS_AVAILABLE, PF_ARM_VFP_32_REGISTERS_AVAILABLE, PROCESSOR_FEATURE_ID,
};

fn native_system_info() -> SYSTEM_INFO {
    let mut info = SYSTEM_INFO::default();
    // SAFETY: `info` is a valid, writable SYSTEM_INFO for the whole call.
    unsafe { GetNativeSystemInfo(&mut info) };
    info
}

fn feature_present(feature: PROCESSOR_FEATURE_ID) -> bool {
    // SAFETY: takes a plain feature id and touches no caller memory.
    unsafe { IsProcessorFeaturePresent(feature) }.as_bool()
}

/// Logical processors reported by the OS.
pub fn processor_count() -> Result<u32, ProbeError> {
    match native_system_info().dwNumberOfProcessors {
        0 => Err(ProbeError::MissingRegister("dwNumberOfProcessors")),
        count => Ok(count),
    }
}

/// Windows on ARM64. There is no vendor or brand source here.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsArmHost;

impl HostCapabilityProvider for WindowsArmHost {
    fn name(&self) -> &'static str {
        "windows system info"
    }

    fn vendor(&self) -> Result<String, ProbeError> {
        Err(ProbeError::SourceUnavailable("vendor".to_string()))
    }

    fn brand(&self) -> Result<String, ProbeError> {
        Err(ProbeError::SourceUnavailable("brand".to_string()))
    }

    fn part(&self) -> Result<String, ProbeError> {
        let info = native_system_info();
        // SAFETY: GetNativeSystemInfo always fills the architecture variant of the union.
        let arch = unsafe { info.Anonymous.Anonymous.wProcessorArchitecture };
        if arch == PROCESSOR_ARCHITECTURE_ARM64 && feature_present(PF_ARM_V8_INSTRUCTIONS_AVAILABLE) {
            Ok("Armv8".to_string())
        } else {
            Err(ProbeError::NoMatch)
        }
    }

    fn core_count(&self) -> Result<u32, ProbeError> {
        processor_count()
    }

    fn features(&self) -> Result<String, ProbeError> {
        let mut tokens = Vec::new();
        if feature_present(PF_ARM_VFP_32_REGISTERS_AVAILABLE) {
            tokens.push("NEON");
        }
        if feature_present(PF_ARM_V82_DP_INSTRUCTIONS_AVAILABLE) {
            tokens.push("DP");
        }
        Ok(tokens.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processor_count_positive() {
        assert!(processor_count().unwrap() > 0);
    }

    #[test]
    fn test_feature_summary_is_stable() {
        assert_eq!(WindowsArmHost.features().unwrap(), WindowsArmHost.features().unwrap());
    }
}
