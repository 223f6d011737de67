//! ARM implementer / part identification tables.
//!
//! Codes follow the public armids database (https://github.com/bp0/armids).

use crate::core::error::ProbeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImplementerPartEntry {
    pub implementer: u8,
    /// `None` marks the vendor-level entry for `implementer`.
    pub part: Option<u16>,
    pub name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchitectureEntry {
    pub architecture: u8,
    pub name: &'static str,
}

const fn vendor(implementer: u8, name: &'static str) -> ImplementerPartEntry {
    ImplementerPartEntry { implementer, part: None, name }
}

const fn part(implementer: u8, part: u16, name: &'static str) -> ImplementerPartEntry {
    ImplementerPartEntry { implementer, part: Some(part), name }
}

pub static PART_TABLE: &[ImplementerPartEntry] = &[
    vendor(0x41, "ARM"),
    part(0x41, 0x810, "ARM810"),
    part(0x41, 0x920, "ARM920"),
    part(0x41, 0x922, "ARM922"),
    part(0x41, 0x926, "ARM926"),
    part(0x41, 0x940, "ARM940"),
    part(0x41, 0x946, "ARM946"),
    part(0x41, 0x966, "ARM966"),
    part(0x41, 0xa20, "ARM1020"),
    part(0x41, 0xa22, "ARM1022"),
    part(0x41, 0xa26, "ARM1026"),
    part(0x41, 0xb02, "ARM11 MPCore"),
    part(0x41, 0xb36, "ARM1136"),
    part(0x41, 0xb56, "ARM1156"),
    part(0x41, 0xb76, "ARM1176"),
    part(0x41, 0xc05, "Cortex-A5"),
    part(0x41, 0xc07, "Cortex-A7"),
    part(0x41, 0xc08, "Cortex-A8"),
    part(0x41, 0xc09, "Cortex-A9"),
    part(0x41, 0xc0d, "Cortex-A12/A17"),
    part(0x41, 0xc0f, "Cortex-A15"),
    part(0x41, 0xc0e, "Cortex-A17"),
    part(0x41, 0xc14, "Cortex-R4"),
    part(0x41, 0xc15, "Cortex-R5"),
    part(0x41, 0xc17, "Cortex-R7"),
    part(0x41, 0xc18, "Cortex-R8"),
    part(0x41, 0xc20, "Cortex-M0"),
    part(0x41, 0xc21, "Cortex-M1"),
    part(0x41, 0xc23, "Cortex-M3"),
    part(0x41, 0xc24, "Cortex-M4"),
    part(0x41, 0xc27, "Cortex-M7"),
    part(0x41, 0xc60, "Cortex-M0+"),
    part(0x41, 0xd01, "Cortex-A32"),
    part(0x41, 0xd03, "Cortex-A53"),
    part(0x41, 0xd04, "Cortex-A35"),
    part(0x41, 0xd05, "Cortex-A55"),
    part(0x41, 0xd07, "Cortex-A57"),
    part(0x41, 0xd08, "Cortex-A72"),
    part(0x41, 0xd09, "Cortex-A73"),
    part(0x41, 0xd0a, "Cortex-A75"),
    part(0x41, 0xd0b, "Cortex-A76"),
    part(0x41, 0xd0c, "Neoverse-N1"),
    part(0x41, 0xd0d, "Cortex-A77"),
    part(0x41, 0xd13, "Cortex-R52"),
    part(0x41, 0xd20, "Cortex-M23"),
    part(0x41, 0xd21, "Cortex-M33"),
    part(0x41, 0xd4a, "Neoverse-E1"),
    vendor(0x42, "Broadcom"),
    part(0x42, 0x00f, "Brahma B15"),
    part(0x42, 0x100, "Brahma B53"),
    part(0x42, 0x516, "ThunderX2"),
    vendor(0x43, "Cavium"),
    part(0x43, 0x0a0, "ThunderX"),
    part(0x43, 0x0a1, "ThunderX 88XX"),
    part(0x43, 0x0a2, "ThunderX 81XX"),
    part(0x43, 0x0a3, "ThunderX 83XX"),
    part(0x43, 0x0af, "ThunderX2 99xx"),
    vendor(0x44, "DEC"),
    part(0x44, 0xa10, "SA110"),
    part(0x44, 0xa11, "SA1100"),
    vendor(0x4e, "nVidia"),
    part(0x4e, 0x000, "Denver"),
    part(0x4e, 0x003, "Denver 2"),
    vendor(0x50, "APM"),
    part(0x50, 0x000, "X-Gene"),
    vendor(0x51, "Qualcomm"),
    // FIXME: the Qualcomm cores below carry nVidia's 0x4e rather than 0x51.
    // Kept as-is for output compatibility until the intended codes are confirmed.
    part(0x4e, 0x00f, "Scorpion"),
    part(0x4e, 0x02d, "Scorpion"),
    part(0x4e, 0x04d, "Krait"),
    part(0x4e, 0x06f, "Krait"),
    part(0x4e, 0x201, "Kryo"),
    part(0x4e, 0x205, "Kryo"),
    part(0x4e, 0x211, "Kryo"),
    part(0x4e, 0x800, "Falkor V1/Kryo"),
    part(0x4e, 0x801, "Kryo V2"),
    part(0x4e, 0x802, "Kryo 3xx gold"),
    part(0x4e, 0x803, "Kryo 3xx silver"),
    part(0x4e, 0x805, "Kryo 5xx silver"),
    part(0x4e, 0xc00, "Falkor"),
    part(0x4e, 0xc01, "Saphira"),
    vendor(0x53, "Samsung"),
    part(0x53, 0x001, "exynos-m1"),
    vendor(0x54, "Texas Instruments"),
    vendor(0x56, "Marvell"),
    part(0x56, 0x131, "Feroceon 88FR131"),
    part(0x56, 0x581, "PJ4/PJ4b"),
    part(0x56, 0x584, "PJ4B-MP"),
    vendor(0x66, "Faraday"),
    part(0x66, 0x526, "FA526"),
    part(0x66, 0x626, "FA626"),
    vendor(0x69, "Intel"),
    part(0x69, 0x200, "i80200"),
    part(0x69, 0x210, "PXA250A"),
    part(0x69, 0x212, "PXA210A"),
    part(0x69, 0x242, "i80321-400"),
    part(0x69, 0x243, "i80321-600"),
    part(0x69, 0x290, "PXA250B/PXA26x"),
    part(0x69, 0x292, "PXA210B"),
    part(0x69, 0x2c2, "i80321-400-B0"),
    part(0x69, 0x2c3, "i80321-600-B0"),
    part(0x69, 0x2d0, "PXA250C/PXA255/PXA26x"),
    part(0x69, 0x2d2, "PXA210C"),
    part(0x69, 0x2e3, "i80219"),
    part(0x69, 0x411, "PXA27x"),
    part(0x69, 0x41c, "IPX425-533"),
    part(0x69, 0x41d, "IPX425-400"),
    part(0x69, 0x41f, "IPX425-266"),
    part(0x69, 0x682, "PXA32x"),
    part(0x69, 0x683, "PXA930/PXA935"),
    part(0x69, 0x688, "PXA30x"),
    part(0x69, 0x689, "PXA31x"),
    part(0x69, 0xb11, "SA1110"),
    part(0x69, 0xc12, "IPX1200"),
];

/// Pre-v7 architecture field of MIDR, bits [19:16].
pub static ARCHITECTURE_TABLE: &[ArchitectureEntry] = &[
    ArchitectureEntry { architecture: 0b0001, name: "Armv4" },
    ArchitectureEntry { architecture: 0b0010, name: "Armv4T" },
    ArchitectureEntry { architecture: 0b0011, name: "Armv5" },
    ArchitectureEntry { architecture: 0b0100, name: "Armv5T" },
    ArchitectureEntry { architecture: 0b0101, name: "Armv5TE" },
    ArchitectureEntry { architecture: 0b0110, name: "Armv5TEJ" },
    ArchitectureEntry { architecture: 0b0111, name: "Armv6" },
];

fn find(implementer: u8, part: Option<u16>) -> Result<&'static str, ProbeError> {
    PART_TABLE
        .iter()
        .find(|entry| entry.implementer == implementer && entry.part == part)
        .map(|entry| entry.name)
        .ok_or(ProbeError::NoMatch)
}

/// Vendor name for an implementer code. Codes are signed because the
/// pseudo-file path reports "not found" as a negative value.
pub fn vendor_name(implementer: i64) -> Result<&'static str, ProbeError> {
    let implementer = u8::try_from(implementer).map_err(|_| ProbeError::NoMatch)?;
    if implementer == 0 {
        return Err(ProbeError::NoMatch);
    }
    find(implementer, None)
}

/// Core design name for an (implementer, part) pair.
pub fn part_name(implementer: i64, part: i64) -> Result<&'static str, ProbeError> {
    let implementer = u8::try_from(implementer).map_err(|_| ProbeError::NoMatch)?;
    let part = u16::try_from(part).map_err(|_| ProbeError::NoMatch)?;
    if implementer == 0 || part == 0 {
        return Err(ProbeError::NoMatch);
    }
    find(implementer, Some(part))
}

pub fn architecture_name(architecture: i64) -> Result<&'static str, ProbeError> {
    ARCHITECTURE_TABLE
        .iter()
        .find(|entry| i64::from(entry.architecture) == architecture)
        .map(|entry| entry.name)
        .ok_or(ProbeError::NoMatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_lookup() {
        assert_eq!(vendor_name(0x41).unwrap(), "ARM");
        assert_eq!(vendor_name(0x51).unwrap(), "Qualcomm");
        assert!(matches!(vendor_name(0x99), Err(ProbeError::NoMatch)));
    }

    #[test]
    fn test_part_lookup() {
        assert_eq!(part_name(0x41, 0xd03).unwrap(), "Cortex-A53");
        assert_eq!(part_name(0x41, 0xd0c).unwrap(), "Neoverse-N1");
        assert_eq!(part_name(0x69, 0xc12).unwrap(), "IPX1200");
        assert!(matches!(part_name(0x99, 0xd03), Err(ProbeError::NoMatch)));
        assert!(matches!(part_name(0x41, 0xfff), Err(ProbeError::NoMatch)));
    }

    #[test]
    fn test_non_positive_codes_fail() {
        assert!(vendor_name(0).is_err());
        assert!(vendor_name(-1).is_err());
        assert!(part_name(0x41, -1).is_err());
        // Denver is in the table but part 0 is never looked up.
        assert!(part_name(0x4e, 0).is_err());
        assert!(part_name(-1, 0xd03).is_err());
    }

    #[test]
    fn test_out_of_range_codes_fail() {
        assert!(vendor_name(0x141).is_err());
        assert!(part_name(0x41, 0x1_0d03).is_err());
    }

    #[test]
    fn test_first_match_wins() {
        // 0x4e/0x00f only appears once, under the colliding vendor code.
        assert_eq!(part_name(0x4e, 0x00f).unwrap(), "Scorpion");
        assert_eq!(vendor_name(0x4e).unwrap(), "nVidia");
    }

    #[test]
    fn test_architecture_lookup() {
        assert_eq!(architecture_name(0b0001).unwrap(), "Armv4");
        assert_eq!(architecture_name(0b0111).unwrap(), "Armv6");
        assert!(architecture_name(0b1111).is_err());
        assert!(architecture_name(0).is_err());
    }

    #[test]
    fn test_every_part_has_a_vendor() {
        for entry in PART_TABLE.iter().filter(|e| e.part.is_some()) {
            assert!(vendor_name(i64::from(entry.implementer)).is_ok(), "{}", entry.name);
        }
    }
}
