use crate::sensor::Measurement;

pub const PREFIX: &[u8] = b"tmp=";
pub const DIGITS: usize = 14;
const TERMINATOR: &[u8] = b"\r\n";

/// Length of the line put on the wire.
pub const LINE_LEN: usize = PREFIX.len() + DIGITS + TERMINATOR.len();
/// Length of the line buffer including the trailing NUL.
pub const BUFFER_LEN: usize = LINE_LEN + 1;

/// Fixed width text line for one measurement: `tmp=00000000001234\r\n`.
///
/// The value is right aligned and zero padded to [`DIGITS`] digits. Wider values would
/// keep only their lowest digits, which cannot happen for a 32 bit measurement.
#[derive(Clone, PartialEq, Eq)]
pub struct Report {
    measurement: Measurement,
    buffer: [u8; BUFFER_LEN],
}

impl Report {
    pub fn new(measurement: Measurement) -> Self {
        let mut buffer = [0u8; BUFFER_LEN];
        let (prefix, rest) = buffer.split_at_mut(PREFIX.len());
        prefix.copy_from_slice(PREFIX);
        let (digits, rest) = rest.split_at_mut(DIGITS);
        let mut value = measurement.ticks();
        for digit in digits.iter_mut().rev() {
            *digit = b'0' + (value % 10) as u8;
            value /= 10;
        }
        rest[..TERMINATOR.len()].copy_from_slice(TERMINATOR);
        Self { measurement, buffer }
    }

    pub fn measurement(&self) -> Measurement {
        self.measurement
    }

    /// The line as sent on the serial link.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..LINE_LEN]
    }

    /// The whole line buffer, NUL terminated.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.buffer
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(self.as_bytes()).unwrap_or_default()
    }
}

impl From<Measurement> for Report {
    fn from(measurement: Measurement) -> Self {
        Report::new(measurement)
    }
}

impl core::fmt::Debug for Report {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Report").field(&self.as_str().trim_end()).finish()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Report {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Report({=str})", self.as_str().trim_end())
    }
}
