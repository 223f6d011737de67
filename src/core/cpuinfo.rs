//! Sequential `key : value` scanner for `/proc/cpuinfo`-style pseudo-files.
//!
//! Lookups only ever move forward through the reader. Two lookups on the
//! same scanner find entries in file order; reopening is the only way to
//! rewind. Each scanner owns its line buffer, so concurrent scans never
//! share storage.

use crate::core::error::ProbeError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::Range;
use std::path::Path;

pub const PROC_CPUINFO: &str = "/proc/cpuinfo";

pub struct CpuinfoScanner<R> {
    reader: R,
    raw: Vec<u8>,
    line: String,
}

impl CpuinfoScanner<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ProbeError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|err| ProbeError::SourceUnavailable(format!("{}: {}", path.display(), err)))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> CpuinfoScanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            raw: Vec::new(),
            line: String::new(),
        }
    }

    /// Advances to the next line starting with `key` and returns its value.
    /// Lines are matched as bytes, so non-UTF-8 lines elsewhere in the file
    /// are skipped like any other non-matching line.
    pub fn next_entry(&mut self, key: &str) -> Result<&str, ProbeError> {
        let range = loop {
            self.raw.clear();
            if self.reader.read_until(b'\n', &mut self.raw)? == 0 {
                return Err(ProbeError::SourceUnavailable(format!("no '{}' entry", key)));
            }
            if !self.raw.starts_with(key.as_bytes()) {
                continue;
            }
            self.line.clear();
            self.line.push_str(&String::from_utf8_lossy(&self.raw));
            if let Some(range) = value_range(&self.line, key) {
                break range;
            }
        };
        Ok(&self.line[range])
    }

    /// Like [`next_entry`](Self::next_entry), then parses the leading number
    /// of the value in `radix`. Trailing non-digits are ignored.
    pub fn next_value(&mut self, key: &str, radix: u32) -> Result<i64, ProbeError> {
        let value = self.next_entry(key)?;
        parse_leading(value, radix).ok_or(ProbeError::NoMatch)
    }
}

fn value_range(line: &str, key: &str) -> Option<Range<usize>> {
    if !line.starts_with(key) {
        return None;
    }
    let colon = key.len() + line[key.len()..].find(':')?;
    let end = if line.ends_with('\n') { line.len() - 1 } else { line.len() };
    let mut start = colon + 1;
    // "key:" with nothing after it is not an entry.
    if start >= end {
        return None;
    }
    if line[start..end].starts_with(' ') {
        start += 1;
    }
    Some(start..end)
}

/// Parses the numeric prefix of `text`, accepting an optional sign and,
/// for radix 16, an optional `0x` prefix.
pub fn parse_leading(text: &str, radix: u32) -> Option<i64> {
    let text = text.trim_start();
    let (negative, text) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let text = if radix == 16 {
        text.strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .filter(|rest| rest.starts_with(|c: char| c.is_ascii_hexdigit()))
            .unwrap_or(text)
    } else {
        text
    };

    let digits = text.find(|c: char| !c.is_digit(radix)).unwrap_or(text.len());
    if digits == 0 {
        return None;
    }
    let value = i64::from_str_radix(&text[..digits], radix).ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    const ARM_CPUINFO: &str = "processor\t: 0\n\
BogoMIPS\t: 108.00\n\
Features\t: fp asimd evtstrm crc32 cpuid\n\
CPU implementer\t: 0x41\n\
CPU architecture: 8\n\
CPU variant\t: 0x0\n\
CPU part\t: 0xd03\n\
CPU revision\t: 4\n\
\n\
processor\t: 1\n\
CPU part\t: 0xd03\n\
\n\
Hardware\t: BCM2835\n\
Model\t\t: Raspberry Pi 3 Model B Rev 1.2\n";

    fn scanner(text: &str) -> CpuinfoScanner<Cursor<Vec<u8>>> {
        CpuinfoScanner::new(Cursor::new(text.as_bytes().to_vec()))
    }

    fn scanner_bytes(bytes: &[u8]) -> CpuinfoScanner<Cursor<Vec<u8>>> {
        CpuinfoScanner::new(Cursor::new(bytes.to_vec()))
    }

    #[test]
    fn test_entry_strips_one_space_and_newline() {
        let mut scan = scanner(ARM_CPUINFO);
        assert_eq!(scan.next_entry("Features").unwrap(), "fp asimd evtstrm crc32 cpuid");
        assert_eq!(scan.next_entry("Model").unwrap(), "Raspberry Pi 3 Model B Rev 1.2");
    }

    #[test]
    fn test_value_parses_hex_and_decimal() {
        let mut scan = scanner(ARM_CPUINFO);
        assert_eq!(scan.next_value("CPU implementer", 16).unwrap(), 0x41);
        assert_eq!(scan.next_value("CPU part", 16).unwrap(), 0xd03);
        assert_eq!(scan.next_value("CPU revision", 10).unwrap(), 4);
    }

    #[test]
    fn test_scan_never_rewinds() {
        let mut scan = scanner(ARM_CPUINFO);
        assert!(scan.next_entry("CPU part").is_ok());
        // "CPU implementer" only appears before the first "CPU part".
        assert!(matches!(
            scan.next_entry("CPU implementer"),
            Err(ProbeError::SourceUnavailable(_))
        ));
    }

    #[test]
    fn test_repeated_key_walks_forward() {
        let mut scan = scanner(ARM_CPUINFO);
        assert_eq!(scan.next_value("processor", 10).unwrap(), 0);
        assert_eq!(scan.next_value("processor", 10).unwrap(), 1);
        assert!(scan.next_value("processor", 10).is_err());
    }

    #[test]
    fn test_key_is_a_prefix_match() {
        // "CPU" matches the first line beginning with it.
        let mut scan = scanner(ARM_CPUINFO);
        assert_eq!(scan.next_entry("CPU").unwrap(), "0x41");
    }

    #[test]
    fn test_empty_value_line_is_skipped() {
        let mut scan = scanner("flags:\nflags\t: sse sse2\n");
        assert_eq!(scan.next_entry("flags").unwrap(), "sse sse2");
    }

    #[test]
    fn test_line_without_colon_is_skipped() {
        let mut scan = scanner("cpu cores\n\ncpu cores\t: 8\n");
        assert_eq!(scan.next_value("cpu cores", 10).unwrap(), 8);
    }

    #[test]
    fn test_last_line_without_newline() {
        let mut scan = scanner("model name\t: Example CPU");
        assert_eq!(scan.next_entry("model name").unwrap(), "Example CPU");
    }

    #[test]
    fn test_non_utf8_line_is_skipped() {
        let mut scan = scanner_bytes(b"processor\t: 0\nBogus\t: \xff\xfe\nModel\t\t: Example Board\n");
        assert_eq!(scan.next_value("processor", 10).unwrap(), 0);
        assert_eq!(scan.next_entry("Model").unwrap(), "Example Board");
    }

    #[test]
    fn test_non_utf8_matching_line_is_decoded_lossily() {
        let mut scan = scanner_bytes(b"Hardware\t: BCM\xff2835\n");
        assert_eq!(scan.next_entry("Hardware").unwrap(), "BCM\u{fffd}2835");
    }

    #[test]
    fn test_non_numeric_value_fails() {
        let mut scan = scanner("CPU implementer\t: unknown\n");
        assert!(matches!(scan.next_value("CPU implementer", 16), Err(ProbeError::NoMatch)));
    }

    #[test]
    fn test_parse_leading() {
        assert_eq!(parse_leading("0x41", 16), Some(0x41));
        assert_eq!(parse_leading("d03", 16), Some(0xd03));
        assert_eq!(parse_leading("  12 cores", 10), Some(12));
        assert_eq!(parse_leading("-1", 10), Some(-1));
        assert_eq!(parse_leading("5TEJ", 10), Some(5));
        assert_eq!(parse_leading("0x", 16), Some(0));
        assert_eq!(parse_leading("", 10), None);
        assert_eq!(parse_leading("x", 10), None);
    }

    #[test]
    fn test_open_missing_file() {
        let result = CpuinfoScanner::open("/nonexistent/cpuinfo");
        assert!(matches!(result, Err(ProbeError::SourceUnavailable(_))));
    }

    #[test]
    fn test_open_real_file() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = NamedTempFile::new()?;
        file.write_all(ARM_CPUINFO.as_bytes())?;
        let mut scan = CpuinfoScanner::open(file.path())?;
        assert_eq!(scan.next_entry("Hardware")?, "BCM2835");
        Ok(())
    }
}
