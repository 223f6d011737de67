use crate::core::error::ProbeError;

/// Caller-owned, fixed-capacity storage for one NUL-terminated string.
///
/// Construction validates and clears the storage, so a value of this type
/// always holds a valid (possibly empty) terminated string.
#[derive(Debug)]
pub struct OutputBuffer<'a> {
    bytes: &'a mut [u8],
}

impl<'a> OutputBuffer<'a> {
    /// Clears `bytes` to an empty string. Zero capacity is rejected without touching anything.
    pub fn new(bytes: &'a mut [u8]) -> Result<Self, ProbeError> {
        if bytes.is_empty() {
            return Err(ProbeError::BufferInvalid);
        }
        bytes.fill(0);
        Ok(Self { bytes })
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Stores `text` and its terminator, or nothing at all if it does not
    /// fit or contains a NUL of its own.
    pub fn write(&mut self, text: &str) -> Result<(), ProbeError> {
        if let Some(position) = text.bytes().position(|b| b == 0) {
            return Err(ProbeError::InteriorNul { position });
        }
        let needed = text.len() + 1;
        if needed > self.bytes.len() {
            return Err(ProbeError::BufferTooSmall {
                needed,
                capacity: self.bytes.len(),
            });
        }
        self.bytes[..text.len()].copy_from_slice(text.as_bytes());
        self.bytes[text.len()] = 0;
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        terminated_str(self.bytes)
    }
}

/// Reads the string stored in a terminated buffer, up to the first NUL.
pub fn terminated_str(bytes: &[u8]) -> &str {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    std::str::from_utf8(&bytes[..end]).unwrap_or("")
}
