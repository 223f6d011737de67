//! ARM64 Linux acquisition from the identification system registers.
//!
//! Register layouts: Arm ARM, MIDR_EL1 / ID_AA64ISAR0_EL1 / ID_AA64ISAR1_EL1 /
//! ID_AA64PFR0_EL1. EL0 reads of these registers are trapped and emulated
//! by the kernel when it advertises HWCAP_CPUID.

use crate::core::error::ProbeError;
use crate::core::lookup;
use crate::platform::procfs::ProcfsHost;
use crate::platform::HostCapabilityProvider;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IdRegisters {
    pub midr: u64,
    pub isar0: u64,
    pub isar1: u64,
    pub pfr0: u64,
}

/// MIDR_EL1 fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Midr {
    pub implementer: u8,
    pub variant: u8,
    pub architecture: u8,
    pub part: u16,
    pub revision: u8,
}

impl Midr {
    pub fn decode(raw: u64) -> Self {
        Self {
            implementer: ((raw >> 24) & 0xff) as u8,
            variant: field(raw, 20),
            architecture: field(raw, 16),
            part: ((raw >> 4) & 0xfff) as u16,
            revision: field(raw, 0),
        }
    }

    pub fn vendor_name(&self) -> Result<&'static str, ProbeError> {
        lookup::vendor_name(i64::from(self.implementer))
    }

    pub fn part_name(&self) -> Result<&'static str, ProbeError> {
        lookup::part_name(i64::from(self.implementer), i64::from(self.part))
    }

    /// Only meaningful for pre-v7 cores; 0b1111 means "see the feature registers".
    pub fn architecture_name(&self) -> Result<&'static str, ProbeError> {
        lookup::architecture_name(i64::from(self.architecture))
    }
}

fn field(value: u64, shift: u32) -> u8 {
    ((value >> shift) & 0x0f) as u8
}

// 0b1111 in the signed PFR0 fields means "not implemented".
const NOT_IMPLEMENTED: u8 = 0x0f;

/// Feature tokens in register order: DP, FCMA, SVE, AdvSIMD, FP.
pub fn feature_tokens(regs: &IdRegisters) -> Vec<&'static str> {
    let mut tokens = Vec::new();
    if field(regs.isar0, 44) != 0 {
        tokens.push("DP");
    }
    if field(regs.isar1, 16) != 0 {
        tokens.push("FCMA");
    }
    if field(regs.pfr0, 32) != 0 {
        tokens.push("SVE");
    }
    if field(regs.pfr0, 20) != NOT_IMPLEMENTED {
        tokens.push("AdvSIMD");
    }
    if field(regs.pfr0, 16) != NOT_IMPLEMENTED {
        tokens.push("FP");
    }
    tokens
}

#[cfg(all(target_arch = "aarch64", target_os = "linux"))]
fn kernel_emulates_id_registers() -> bool {
    const HWCAP_CPUID: libc::c_ulong = 1 << 11;

    // SAFETY: getauxval has no preconditions and returns 0 for absent entries.
    let hwcap = unsafe { libc::getauxval(libc::AT_HWCAP) };
    hwcap & HWCAP_CPUID != 0
}

/// Reads the four identification registers of the current core.
#[cfg(all(target_arch = "aarch64", target_os = "linux"))]
pub fn read_id_registers() -> Result<IdRegisters, ProbeError> {
    macro_rules! mrs {
        ($reg:literal) => {{
            let value: u64;
            // SAFETY: reading an ID register has no side effects; the kernel
            // emulates the access once HWCAP_CPUID is set.
            unsafe {
                std::arch::asm!(concat!("mrs {}, ", $reg), out(reg) value, options(nomem, nostack, preserves_flags));
            }
            value
        }};
    }

    if !kernel_emulates_id_registers() {
        return Err(ProbeError::MissingRegister("HWCAP_CPUID"));
    }
    Ok(IdRegisters {
        midr: mrs!("MIDR_EL1"),
        isar0: mrs!("ID_AA64ISAR0_EL1"),
        isar1: mrs!("ID_AA64ISAR1_EL1"),
        pfr0: mrs!("ID_AA64PFR0_EL1"),
    })
}

#[cfg(not(all(target_arch = "aarch64", target_os = "linux")))]
pub fn read_id_registers() -> Result<IdRegisters, ProbeError> {
    Err(ProbeError::MissingRegister("ID registers"))
}

pub type RegisterReader = fn() -> Result<IdRegisters, ProbeError>;

/// ARM64 Linux: vendor, part and features from the ID registers;
/// brand and core count from the pseudo-file.
pub struct MidrHost {
    registers: RegisterReader,
    procfs: ProcfsHost,
}

impl MidrHost {
    pub fn new(registers: RegisterReader, cpuinfo: impl Into<PathBuf>) -> Self {
        Self {
            registers,
            procfs: ProcfsHost::new(cpuinfo),
        }
    }

    fn midr(&self) -> Result<Midr, ProbeError> {
        (self.registers)().map(|regs| Midr::decode(regs.midr))
    }
}

impl HostCapabilityProvider for MidrHost {
    fn name(&self) -> &'static str {
        "arm64 id registers"
    }

    fn vendor(&self) -> Result<String, ProbeError> {
        self.midr()?.vendor_name().map(str::to_string)
    }

    fn brand(&self) -> Result<String, ProbeError> {
        self.procfs.model()
    }

    fn part(&self) -> Result<String, ProbeError> {
        self.midr()?.part_name().map(str::to_string)
    }

    fn core_count(&self) -> Result<u32, ProbeError> {
        self.procfs.processor_count()
    }

    fn features(&self) -> Result<String, ProbeError> {
        let regs = (self.registers)()?;
        Ok(feature_tokens(&regs).join(" "))
    }

    fn id_registers(&self) -> Result<IdRegisters, ProbeError> {
        (self.registers)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    // Cortex-A72 r0p3 (Raspberry Pi 4).
    fn cortex_a72() -> Result<IdRegisters, ProbeError> {
        Ok(IdRegisters {
            midr: 0x410f_d083,
            isar0: 0x0000_0000_0001_1120,
            isar1: 0,
            pfr0: 0x0000_0000_0000_2222,
        })
    }

    // Neoverse-N1 with dot product and half-precision SIMD.
    fn neoverse_n1() -> Result<IdRegisters, ProbeError> {
        Ok(IdRegisters {
            midr: 0x413f_d0c1,
            isar0: 0x0000_1000_1021_1120,
            isar1: 0x0000_0000_0001_0001,
            pfr0: 0x1100_0000_0011_0011,
        })
    }

    fn broken() -> Result<IdRegisters, ProbeError> {
        Err(ProbeError::MissingRegister("MIDR_EL1"))
    }

    #[test]
    fn test_midr_decode() {
        let midr = Midr::decode(0x410f_d083);
        assert_eq!(midr.implementer, 0x41);
        assert_eq!(midr.variant, 0);
        assert_eq!(midr.architecture, 0xf);
        assert_eq!(midr.part, 0xd08);
        assert_eq!(midr.revision, 3);
        assert_eq!(midr.part_name().unwrap(), "Cortex-A72");
        assert!(midr.architecture_name().is_err());
    }

    #[test]
    fn test_legacy_architecture_field() {
        // ARM926EJ-S: architecture 0b0110 (Armv5TEJ).
        let midr = Midr::decode(0x4106_9265);
        assert_eq!(midr.architecture_name().unwrap(), "Armv5TEJ");
        assert_eq!(midr.part_name().unwrap(), "ARM926");
    }

    #[test]
    fn test_feature_tokens() {
        assert_eq!(feature_tokens(&cortex_a72().unwrap()), vec!["AdvSIMD", "FP"]);
        assert_eq!(
            feature_tokens(&neoverse_n1().unwrap()),
            vec!["DP", "FCMA", "AdvSIMD", "FP"]
        );
    }

    #[test]
    fn test_not_implemented_simd() {
        let regs = IdRegisters {
            pfr0: 0x0000_0001_00ff_0000,
            ..Default::default()
        };
        assert_eq!(feature_tokens(&regs), vec!["SVE"]);
    }

    #[test]
    fn test_host_from_registers() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"processor\t: 0\n\nprocessor\t: 1\n\nModel\t\t: Example Board\n")
            .unwrap();
        let host = MidrHost::new(neoverse_n1, file.path());
        assert_eq!(host.vendor().unwrap(), "ARM");
        assert_eq!(host.part().unwrap(), "Neoverse-N1");
        assert_eq!(host.brand().unwrap(), "Example Board");
        assert_eq!(host.core_count().unwrap(), 2);
        assert_eq!(host.features().unwrap(), "DP FCMA AdvSIMD FP");
    }

    #[test]
    fn test_register_failure_propagates() {
        let host = MidrHost::new(broken, "/nonexistent/cpuinfo");
        assert!(matches!(host.vendor(), Err(ProbeError::MissingRegister(_))));
        assert!(host.part().is_err());
        assert!(host.features().is_err());
        assert!(host.brand().is_err());
    }

    #[test]
    fn test_unknown_implementer_has_no_name() {
        fn foreign() -> Result<IdRegisters, ProbeError> {
            Ok(IdRegisters { midr: 0x990f_0010, ..Default::default() })
        }
        let host = MidrHost::new(foreign, "/nonexistent/cpuinfo");
        assert!(matches!(host.vendor(), Err(ProbeError::NoMatch)));
        assert!(matches!(host.part(), Err(ProbeError::NoMatch)));
    }
}
