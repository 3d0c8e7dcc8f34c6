//! Encoder engine for the BERT wire format.
//!
//! Converts the term to complex form, writes the version marker, then walks
//! the tree emitting tag-prefixed bytes. The delegated versions skip the
//! byte-level grammar entirely and hand the term to the external packer.

use num_bigint::Sign;

use crate::codec::convert::to_complex;
use crate::codec::primitives::Writer;
use crate::error::EncodeError;
use crate::limits::MAX_ATOM_LEN;
use crate::model::Term;
use crate::pack::TermPacker;
use crate::tags::{
    ATOM, BIN, ENC_STRING, FLOAT, FLOAT_LEN, INT, LARGE_BIGNUM, LARGE_TUPLE, LIST, MAX_INT,
    MIN_INT, NIL, SMALL_BIGNUM, SMALL_INT, SMALL_TUPLE, STRING, UNICODE_STRING, Version,
};

/// Per-call encoding configuration.
///
/// The version is explicit here rather than ambient process state, so
/// concurrent callers cannot race on it.
#[derive(Clone, Copy, Default)]
pub struct EncodeOptions<'a> {
    /// Protocol version to emit. Defaults to [`Version::V1`].
    pub version: Version,
    /// External packer for the delegated versions. Requesting v3/v4 without
    /// one is an error, never a silent fallback.
    pub packer: Option<&'a dyn TermPacker>,
}

impl<'a> EncodeOptions<'a> {
    /// Options for the given version with no packer.
    pub fn with_version(version: Version) -> Self {
        Self {
            version,
            packer: None,
        }
    }

    /// Attaches an external packer.
    pub fn packer(mut self, packer: &'a dyn TermPacker) -> Self {
        self.packer = Some(packer);
        self
    }
}

/// Encodes a term with the base version (v1).
pub fn encode_term(term: &Term) -> Result<Vec<u8>, EncodeError> {
    encode_term_with_options(term, &EncodeOptions::default())
}

/// Encodes a term with explicit options.
pub fn encode_term_with_options(
    term: &Term,
    options: &EncodeOptions<'_>,
) -> Result<Vec<u8>, EncodeError> {
    let version = options.version;
    if version.is_delegated() {
        let packer = options
            .packer
            .ok_or(EncodeError::UnsupportedVersion { version })?;
        let packed = match version {
            Version::V3 => packer.pack_unsafe(term)?,
            _ => packer.pack(term)?,
        };
        let mut writer = Writer::with_capacity(packed.len() + 1);
        writer.write_byte(version.marker());
        writer.write_bytes(&packed);
        return Ok(writer.into_bytes());
    }

    let complex = to_complex(term);
    let mut encoder = Encoder::new(version);
    encoder.writer.write_byte(version.marker());
    encoder.write_term(&complex)?;
    Ok(encoder.writer.into_bytes())
}

struct Encoder {
    writer: Writer,
    version: Version,
}

impl Encoder {
    fn new(version: Version) -> Self {
        Self {
            writer: Writer::new(),
            version,
        }
    }

    /// Serializes one complex-form term without a version marker.
    fn write_term(&mut self, term: &Term) -> Result<(), EncodeError> {
        match term {
            Term::Int(value) => self.write_integer(value),
            Term::Float(value) => self.write_float(*value),
            Term::Atom(name) => self.write_atom(name),
            Term::Binary { data, encoding } => self.write_binary(data, encoding.as_deref()),
            Term::ByteList(bytes) => self.write_bytelist(bytes),
            Term::List(items) => self.write_list(items),
            Term::Tuple(items) => self.write_tuple(items),
            // Only complex form reaches the engine; these kinds were
            // rewritten into {bert, ...} tuples by the form converter.
            Term::Nil
            | Term::Bool(_)
            | Term::Map(_)
            | Term::Regex { .. }
            | Term::Timestamp(_) => Err(EncodeError::UnrepresentableTerm { kind: term.kind() }),
        }
    }

    fn write_integer(&mut self, value: &num_bigint::BigInt) -> Result<(), EncodeError> {
        if let Ok(small) = i64::try_from(value) {
            if (0..=255).contains(&small) {
                self.writer.write_byte(SMALL_INT);
                self.writer.write_byte(small as u8);
                return Ok(());
            }
            if (MIN_INT..=MAX_INT).contains(&small) {
                self.writer.write_byte(INT);
                self.writer.write_u32_be(small as i32 as u32);
                return Ok(());
            }
        }
        self.write_bignum(value)
    }

    fn write_bignum(&mut self, value: &num_bigint::BigInt) -> Result<(), EncodeError> {
        // Little-endian magnitude, minimal length: one byte per 8 bits.
        let (sign, magnitude) = value.to_bytes_le();
        if magnitude.len() < 256 {
            self.writer.write_byte(SMALL_BIGNUM);
            self.writer.write_byte(magnitude.len() as u8);
        } else {
            if magnitude.len() > u32::MAX as usize {
                return Err(EncodeError::LengthExceedsLimit {
                    field: "bignum",
                    len: magnitude.len(),
                });
            }
            self.writer.write_byte(LARGE_BIGNUM);
            self.writer.write_u32_be(magnitude.len() as u32);
        }
        self.writer
            .write_byte(if sign == Sign::Minus { 1 } else { 0 });
        self.writer.write_bytes(&magnitude);
        Ok(())
    }

    fn write_float(&mut self, value: f64) -> Result<(), EncodeError> {
        if !value.is_finite() {
            return Err(EncodeError::NonFiniteFloat { value });
        }
        self.writer.write_byte(FLOAT);
        self.writer.write_bytes(&format_float(value));
        Ok(())
    }

    fn write_atom(&mut self, name: &str) -> Result<(), EncodeError> {
        if name.len() > MAX_ATOM_LEN {
            return Err(EncodeError::AtomTooLong { len: name.len() });
        }
        self.writer.write_byte(ATOM);
        self.writer.write_u16_be(name.len() as u16);
        self.writer.write_bytes(name.as_bytes());
        Ok(())
    }

    fn write_binary(&mut self, data: &[u8], encoding: Option<&str>) -> Result<(), EncodeError> {
        if self.version == Version::V2 {
            if let Some(name) = encoding {
                if name.eq_ignore_ascii_case("UTF-8") || name.eq_ignore_ascii_case("US-ASCII") {
                    return self.write_unicode_string(data, name);
                }
                return self.write_enc_string(data, name);
            }
        }
        // The base version always emits the opaque binary tag; any declared
        // encoding is dropped on the wire.
        self.write_length_prefixed(BIN, "binary", data)
    }

    fn write_unicode_string(&mut self, data: &[u8], name: &str) -> Result<(), EncodeError> {
        if std::str::from_utf8(data).is_err() {
            return Err(EncodeError::InvalidUtf8 {
                encoding: name.to_string(),
            });
        }
        self.write_length_prefixed(UNICODE_STRING, "unicode string", data)
    }

    fn write_enc_string(&mut self, data: &[u8], name: &str) -> Result<(), EncodeError> {
        self.write_length_prefixed(ENC_STRING, "encoded string", data)?;
        self.write_length_prefixed(BIN, "encoding name", name.as_bytes())
    }

    fn write_length_prefixed(
        &mut self,
        tag: u8,
        field: &'static str,
        data: &[u8],
    ) -> Result<(), EncodeError> {
        if data.len() > u32::MAX as usize {
            return Err(EncodeError::LengthExceedsLimit {
                field,
                len: data.len(),
            });
        }
        self.writer.write_byte(tag);
        self.writer.write_u32_be(data.len() as u32);
        self.writer.write_bytes(data);
        Ok(())
    }

    fn write_bytelist(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        if bytes.len() <= u16::MAX as usize {
            self.writer.write_byte(STRING);
            self.writer.write_u16_be(bytes.len() as u16);
            self.writer.write_bytes(bytes);
            return Ok(());
        }
        // Over-long byte lists fall back to a proper list of small integers,
        // the same shape Erlang itself emits past the u16 string limit.
        self.writer.write_byte(LIST);
        self.writer.write_u32_be(bytes.len() as u32);
        for byte in bytes {
            self.writer.write_byte(SMALL_INT);
            self.writer.write_byte(*byte);
        }
        self.writer.write_byte(NIL);
        Ok(())
    }

    fn write_list(&mut self, items: &[Term]) -> Result<(), EncodeError> {
        if items.is_empty() {
            self.writer.write_byte(NIL);
            return Ok(());
        }
        if items.len() > u32::MAX as usize {
            return Err(EncodeError::LengthExceedsLimit {
                field: "list",
                len: items.len(),
            });
        }
        self.writer.write_byte(LIST);
        self.writer.write_u32_be(items.len() as u32);
        for item in items {
            self.write_term(item)?;
        }
        self.writer.write_byte(NIL);
        Ok(())
    }

    fn write_tuple(&mut self, items: &[Term]) -> Result<(), EncodeError> {
        if items.len() < 256 {
            self.writer.write_byte(SMALL_TUPLE);
            self.writer.write_byte(items.len() as u8);
        } else {
            if items.len() > u32::MAX as usize {
                return Err(EncodeError::LengthExceedsLimit {
                    field: "tuple",
                    len: items.len(),
                });
            }
            self.writer.write_byte(LARGE_TUPLE);
            self.writer.write_u32_be(items.len() as u32);
        }
        for item in items {
            self.write_term(item)?;
        }
        Ok(())
    }
}

/// Formats a float as a 15-fractional-digit scientific-notation ASCII string,
/// NUL-padded to exactly 31 bytes. Precision on the wire is bounded by this
/// representation, not by native f64 precision.
fn format_float(value: f64) -> [u8; FLOAT_LEN] {
    let scientific = format!("{value:.15e}");
    // `{:e}` always produces a mantissa, 'e', and a decimal exponent.
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let repr = format!("{mantissa}e{exponent:+03}");

    let mut buf = [0u8; FLOAT_LEN];
    buf[..repr.len()].copy_from_slice(repr.as_bytes());
    buf
}
