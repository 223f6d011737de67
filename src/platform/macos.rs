//! macOS acquisition through named `sysctlbyname` parameters.

use crate::core::error::ProbeError;
use crate::platform::HostCapabilityProvider;
use std::ffi::CString;
use tracing::trace;

fn sysctl_raw(name: &str, out: &mut [u8]) -> Result<usize, ProbeError> {
    let c_name = CString::new(name)
        .map_err(|_| ProbeError::SourceUnavailable(format!("invalid sysctl name {:?}", name)))?;
    let mut size = out.len();
    // SAFETY: `c_name` is NUL-terminated and `size` matches `out`.
    let ret = unsafe {
        libc::sysctlbyname(
            c_name.as_ptr(),
            out.as_mut_ptr().cast(),
            &mut size,
            std::ptr::null_mut(),
            0,
        )
    };
    if ret != 0 {
        trace!("sysctl {} failed", name);
        return Err(ProbeError::SourceUnavailable(name.to_string()));
    }
    Ok(size)
}

pub fn sysctl_string(name: &str) -> Result<String, ProbeError> {
    let mut buf = [0u8; 256];
    let size = sysctl_raw(name, &mut buf)?;
    let bytes = &buf[..size.min(buf.len())];
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let text = String::from_utf8_lossy(&bytes[..end]).trim().to_string();
    if text.is_empty() {
        return Err(ProbeError::SourceUnavailable(name.to_string()));
    }
    Ok(text)
}

/// Integer parameters come back as either 32 or 64 bits.
pub fn sysctl_int(name: &str) -> Result<i64, ProbeError> {
    let mut buf = [0u8; 8];
    match sysctl_raw(name, &mut buf)? {
        4 => Ok(i64::from(i32::from_ne_bytes([buf[0], buf[1], buf[2], buf[3]]))),
        8 => Ok(i64::from_ne_bytes(buf)),
        _ => Err(ProbeError::SourceUnavailable(name.to_string())),
    }
}

fn flag(name: &str) -> bool {
    matches!(sysctl_int(name), Ok(1))
}

pub fn core_count() -> Result<u32, ProbeError> {
    let cores = sysctl_int("machdep.cpu.core_count")?;
    match u32::try_from(cores) {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(ProbeError::NoMatch),
    }
}

/// Apple silicon: everything comes from sysctl.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppleSiliconHost;

impl AppleSiliconHost {
    /// `"<level name>:<physical cores>"` for each performance level.
    fn perf_levels(&self) -> Vec<String> {
        let levels = sysctl_int("hw.nperflevels").unwrap_or(0);
        (0..levels)
            .filter_map(|level| {
                let name = sysctl_string(&format!("hw.perflevel{}.name", level)).ok()?;
                let count = sysctl_int(&format!("hw.perflevel{}.physicalcpu", level)).ok()?;
                Some(format!("{}:{}", name, count))
            })
            .collect()
    }
}

impl HostCapabilityProvider for AppleSiliconHost {
    fn name(&self) -> &'static str {
        "macos sysctl"
    }

    fn vendor(&self) -> Result<String, ProbeError> {
        sysctl_string("machdep.cpu.vendor")
    }

    fn brand(&self) -> Result<String, ProbeError> {
        sysctl_string("machdep.cpu.brand_string")
    }

    /// The architecture version is implied by the optional features.
    fn part(&self) -> Result<String, ProbeError> {
        if flag("hw.optional.arm.FEAT_SME") {
            Ok("Armv9".to_string())
        } else if flag("hw.optional.arm64") {
            Ok("Armv8".to_string())
        } else {
            Err(ProbeError::NoMatch)
        }
    }

    fn core_count(&self) -> Result<u32, ProbeError> {
        core_count()
    }

    fn features(&self) -> Result<String, ProbeError> {
        let mut tokens = self.perf_levels();
        for (name, token) in [
            ("hw.optional.neon", "NEON"),
            ("hw.optional.arm.FEAT_SME", "SME"),
            ("hw.optional.arm.FEAT_SME2", "SME2"),
        ] {
            if flag(name) {
                tokens.push(token.to_string());
            }
        }
        Ok(tokens.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_name_is_an_error() {
        assert!(matches!(
            sysctl_int("hw.optional.does_not_exist"),
            Err(ProbeError::SourceUnavailable(_))
        ));
        assert!(sysctl_string("machdep.cpu.does_not_exist").is_err());
    }

    #[test]
    fn test_interior_nul_name() {
        assert!(sysctl_int("hw.\0ncpu").is_err());
    }

    #[test]
    fn test_core_count_positive() {
        assert!(core_count().unwrap() > 0);
    }

    #[cfg(target_arch = "aarch64")]
    #[test]
    fn test_apple_silicon_part() {
        let part = AppleSiliconHost.part().unwrap();
        assert!(part == "Armv8" || part == "Armv9");
        assert!(AppleSiliconHost.features().unwrap().contains("NEON"));
    }
}
