//! Wire tag registry for the BERT format.
//!
//! One byte per term kind, plus the four version markers and the bounds of
//! the 4-byte signed integer form. Pure constants; unknown bytes are a
//! decoder-side error, not a registry concern.

/// Atom: u16 length + text bytes.
pub const ATOM: u8 = 100;
/// Binary: u32 length + opaque bytes.
pub const BIN: u8 = 109;
/// Encoding-tagged string (v2): u32 length + payload, then a nested BIN
/// segment carrying the encoding name.
pub const ENC_STRING: u8 = 112;
/// Float: 31 bytes of NUL-padded ASCII decimal.
pub const FLOAT: u8 = 99;
/// Integer: 4-byte big-endian two's complement.
pub const INT: u8 = 98;
/// Bignum with u32 magnitude byte count.
pub const LARGE_BIGNUM: u8 = 111;
/// Tuple with u32 arity.
pub const LARGE_TUPLE: u8 = 105;
/// List: u32 element count, elements, NIL terminator.
pub const LIST: u8 = 108;
/// Empty list.
pub const NIL: u8 = 106;
/// Bignum with u8 magnitude byte count.
pub const SMALL_BIGNUM: u8 = 110;
/// Small integer: one unsigned byte.
pub const SMALL_INT: u8 = 97;
/// Tuple with u8 arity.
pub const SMALL_TUPLE: u8 = 104;
/// Erlang string: u16 length + raw bytes, decoded as a byte list.
pub const STRING: u8 = 107;
/// Unicode string (v2): u32 length + UTF-8 bytes.
pub const UNICODE_STRING: u8 = 113;

/// Version marker for the base byte-level grammar.
pub const MAGIC: u8 = 131;
/// Version marker for the byte-level grammar with the v2 string extensions.
pub const VERSION_2: u8 = 132;
/// Version marker for the delegated unchecked-packer grammar.
pub const VERSION_3: u8 = 133;
/// Version marker for the delegated checked-packer grammar.
pub const VERSION_4: u8 = 134;

/// Largest value encoded with the 4-byte INT form.
pub const MAX_INT: i64 = (1 << 27) - 1;
/// Smallest value encoded with the 4-byte INT form.
pub const MIN_INT: i64 = -(1 << 27);

/// Fixed byte width of the FLOAT ASCII representation.
pub const FLOAT_LEN: usize = 31;

/// Protocol version selecting the grammar of an encoded stream.
///
/// The version is an explicit per-call parameter on the encode side; decoding
/// always self-describes from the leading marker byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Version {
    /// Base grammar, marker 131.
    #[default]
    V1,
    /// Base grammar plus UNICODE_STRING / ENC_STRING, marker 132.
    V2,
    /// Delegated to the external packer's unchecked path, marker 133.
    V3,
    /// Delegated to the external packer's checked path, marker 134.
    V4,
}

impl Version {
    /// Returns the marker byte written at the start of a stream.
    pub fn marker(self) -> u8 {
        match self {
            Version::V1 => MAGIC,
            Version::V2 => VERSION_2,
            Version::V3 => VERSION_3,
            Version::V4 => VERSION_4,
        }
    }

    /// Maps a leading marker byte back to a version.
    pub fn from_marker(byte: u8) -> Option<Version> {
        match byte {
            MAGIC => Some(Version::V1),
            VERSION_2 => Some(Version::V2),
            VERSION_3 => Some(Version::V3),
            VERSION_4 => Some(Version::V4),
            _ => None,
        }
    }

    /// True for the versions that hand the payload to an external packer.
    pub fn is_delegated(self) -> bool {
        matches!(self, Version::V3 | Version::V4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_roundtrip() {
        for v in [Version::V1, Version::V2, Version::V3, Version::V4] {
            assert_eq!(Version::from_marker(v.marker()), Some(v));
        }
        assert_eq!(Version::from_marker(0), None);
        assert_eq!(Version::from_marker(130), None);
        assert_eq!(Version::from_marker(135), None);
    }

    #[test]
    fn test_int_bounds() {
        assert_eq!(MAX_INT, 134_217_727);
        assert_eq!(MIN_INT, -134_217_728);
    }
}
