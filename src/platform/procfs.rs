//! Linux hosts answered entirely from `/proc/cpuinfo`.

use crate::core::cpuinfo::{CpuinfoScanner, PROC_CPUINFO};
use crate::core::error::ProbeError;
use crate::core::lookup;
use crate::platform::HostCapabilityProvider;
use std::path::{Path, PathBuf};

/// 32-bit ARM Linux, and the pseudo-file half of the other Linux hosts.
/// Every query reopens the file, so each one scans from the top.
#[derive(Debug, Clone)]
pub struct ProcfsHost {
    path: PathBuf,
}

impl Default for ProcfsHost {
    fn default() -> Self {
        Self::new(PROC_CPUINFO)
    }
}

impl ProcfsHost {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn scanner(&self) -> Result<CpuinfoScanner<std::io::BufReader<std::fs::File>>, ProbeError> {
        CpuinfoScanner::open(&self.path)
    }

    /// No explicit count field exists on ARM, so count the processor entries.
    pub fn processor_count(&self) -> Result<u32, ProbeError> {
        let mut scan = self.scanner()?;
        let mut cores = 0i64;
        loop {
            match scan.next_value("processor", 10) {
                Ok(index) if index >= 0 => cores = index + 1,
                // End of file, or an entry that is not an index.
                Ok(_) | Err(ProbeError::SourceUnavailable(_)) | Err(ProbeError::NoMatch) => break,
                Err(err) => return Err(err),
            }
        }
        positive(cores)
    }

    /// x86 reports physical cores per package directly.
    pub fn physical_cores(&self) -> Result<u32, ProbeError> {
        let cores = self.scanner()?.next_value("cpu cores", 10)?;
        positive(cores)
    }

    pub fn model(&self) -> Result<String, ProbeError> {
        Ok(self.scanner()?.next_entry("Model")?.to_string())
    }
}

fn positive(cores: i64) -> Result<u32, ProbeError> {
    match u32::try_from(cores) {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(ProbeError::NoMatch),
    }
}

impl HostCapabilityProvider for ProcfsHost {
    fn name(&self) -> &'static str {
        "linux procfs"
    }

    fn vendor(&self) -> Result<String, ProbeError> {
        let implementer = self.scanner()?.next_value("CPU implementer", 16)?;
        lookup::vendor_name(implementer).map(str::to_string)
    }

    fn brand(&self) -> Result<String, ProbeError> {
        self.model()
    }

    fn part(&self) -> Result<String, ProbeError> {
        // Same handle for both keys: "CPU part" must follow "CPU implementer".
        let mut scan = self.scanner()?;
        let implementer = scan.next_value("CPU implementer", 16)?;
        let part = scan.next_value("CPU part", 16)?;
        lookup::part_name(implementer, part).map(str::to_string)
    }

    fn core_count(&self) -> Result<u32, ProbeError> {
        self.processor_count()
    }

    fn features(&self) -> Result<String, ProbeError> {
        Ok(self.scanner()?.next_entry("Features")?.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PI_ZERO: &str = "processor\t: 0\n\
model name\t: ARMv6-compatible processor rev 7 (v6l)\n\
BogoMIPS\t: 697.95\n\
Features\t: half thumb fastmult vfp edsp java tls\n\
CPU implementer\t: 0x41\n\
CPU architecture: 7\n\
CPU variant\t: 0x0\n\
CPU part\t: 0xb76\n\
CPU revision\t: 7\n\
\n\
Hardware\t: BCM2835\n\
Revision\t: 9000c1\n\
Model\t\t: Raspberry Pi Zero W Rev 1.1\n";

    const PI_4: &str = "processor\t: 0\nCPU implementer\t: 0x41\nCPU part\t: 0xd08\n\n\
processor\t: 1\nCPU implementer\t: 0x41\nCPU part\t: 0xd08\n\n\
processor\t: 2\nCPU implementer\t: 0x41\nCPU part\t: 0xd08\n\n\
processor\t: 3\nCPU implementer\t: 0x41\nCPU part\t: 0xd08\n\n\
Model\t\t: Raspberry Pi 4 Model B Rev 1.4\n";

    fn fixture(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_single_core_arm11() {
        let file = fixture(PI_ZERO);
        let host = ProcfsHost::new(file.path());
        assert_eq!(host.vendor().unwrap(), "ARM");
        assert_eq!(host.part().unwrap(), "ARM1176");
        assert_eq!(host.brand().unwrap(), "Raspberry Pi Zero W Rev 1.1");
        assert_eq!(host.core_count().unwrap(), 1);
        assert_eq!(host.features().unwrap(), "half thumb fastmult vfp edsp java tls");
    }

    #[test]
    fn test_quad_core_a72() {
        let file = fixture(PI_4);
        let host = ProcfsHost::new(file.path());
        assert_eq!(host.part().unwrap(), "Cortex-A72");
        assert_eq!(host.core_count().unwrap(), 4);
        assert!(host.features().is_err());
    }

    #[test]
    fn test_part_before_implementer_fails() {
        let file = fixture("CPU part\t: 0xd03\nCPU implementer\t: 0x41\n");
        let host = ProcfsHost::new(file.path());
        assert!(host.part().is_err());
        assert_eq!(host.vendor().unwrap(), "ARM");
    }

    #[test]
    fn test_unknown_implementer() {
        let file = fixture("CPU implementer\t: 0x99\nCPU part\t: 0x001\n");
        let host = ProcfsHost::new(file.path());
        assert!(matches!(host.vendor(), Err(ProbeError::NoMatch)));
        assert!(matches!(host.part(), Err(ProbeError::NoMatch)));
    }

    #[test]
    fn test_x86_physical_cores() {
        let file = fixture("processor\t: 0\nvendor_id\t: GenuineIntel\ncpu cores\t: 6\n");
        let host = ProcfsHost::new(file.path());
        assert_eq!(host.physical_cores().unwrap(), 6);

        let zero = fixture("cpu cores\t: 0\n");
        assert!(ProcfsHost::new(zero.path()).physical_cores().is_err());
    }

    #[test]
    fn test_non_utf8_line_does_not_shorten_count() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            b"processor\t: 0\nBogus\t: \xff\xfe\n\nprocessor\t: 1\n\nprocessor\t: 2\n\n\
processor\t: 3\nModel\t\t: Example Board\n",
        )
        .unwrap();
        let host = ProcfsHost::new(file.path());
        assert_eq!(host.core_count().unwrap(), 4);
        assert_eq!(host.model().unwrap(), "Example Board");
    }

    #[test]
    fn test_read_error_is_not_a_count() {
        // Opening a directory succeeds on Linux; reading it fails.
        let dir = tempfile::tempdir().unwrap();
        let host = ProcfsHost::new(dir.path());
        match host.core_count() {
            Err(ProbeError::Io(_)) | Err(ProbeError::SourceUnavailable(_)) => {}
            other => panic!("expected a read failure, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let host = ProcfsHost::new("/nonexistent/cpuinfo");
        assert!(matches!(host.vendor(), Err(ProbeError::SourceUnavailable(_))));
        assert!(host.core_count().is_err());
    }

    #[test]
    fn test_repeated_queries_match() {
        let file = fixture(PI_4);
        let host = ProcfsHost::new(file.path());
        assert_eq!(host.part().unwrap(), host.part().unwrap());
        assert_eq!(host.core_count().unwrap(), host.core_count().unwrap());
    }
}
