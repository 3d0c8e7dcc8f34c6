//! Decoder engine for the BERT wire format.
//!
//! The leading version byte alone selects the grammar: the byte-level
//! versions dispatch on tag bytes below, the delegated versions hand the
//! remaining bytes to the external packer. The inverse of the form converter
//! runs inline as the reserved `{bert, ...}` tuple pattern is recognized.

use num_bigint::{BigInt, Sign};

use crate::codec::primitives::Reader;
use crate::error::DecodeError;
use crate::limits::MAX_DEPTH;
use crate::model::term::map_insert;
use crate::model::{RegexFlags, Term, Timestamp};
use crate::pack::TermPacker;
use crate::tags::{
    ATOM, BIN, ENC_STRING, FLOAT, FLOAT_LEN, INT, LARGE_BIGNUM, LARGE_TUPLE, LIST, NIL,
    SMALL_BIGNUM, SMALL_INT, SMALL_TUPLE, STRING, UNICODE_STRING, Version,
};

/// Decodes a term from an encoded stream.
///
/// Streams carrying a delegated version marker fail with
/// [`DecodeError::UnsupportedVersion`]; use [`decode_term_with_packer`] when
/// an external packer is available.
pub fn decode_term(input: &[u8]) -> Result<Term, DecodeError> {
    decode_inner(input, None)
}

/// Decodes a term, delegating v3/v4 streams to the given packer.
pub fn decode_term_with_packer(
    input: &[u8],
    packer: &dyn TermPacker,
) -> Result<Term, DecodeError> {
    decode_inner(input, Some(packer))
}

fn decode_inner(input: &[u8], packer: Option<&dyn TermPacker>) -> Result<Term, DecodeError> {
    let mut reader = Reader::new(input);
    let marker = reader.read_byte("version marker")?;
    match Version::from_marker(marker) {
        Some(Version::V1 | Version::V2) => Decoder::new(reader).read_term(),
        Some(version @ Version::V3) => packer
            .ok_or(DecodeError::UnsupportedVersion { version })?
            .unpack_unsafe(&input[1..]),
        Some(version @ Version::V4) => packer
            .ok_or(DecodeError::UnsupportedVersion { version })?
            .unpack(&input[1..]),
        None => Err(DecodeError::BadMagic { found: marker }),
    }
}

struct Decoder<'a> {
    reader: Reader<'a>,
    depth: usize,
}

impl<'a> Decoder<'a> {
    fn new(reader: Reader<'a>) -> Self {
        Self { reader, depth: 0 }
    }

    /// Reads one term, dispatching on a look-ahead tag byte.
    fn read_term(&mut self) -> Result<Term, DecodeError> {
        if self.depth >= MAX_DEPTH {
            return Err(DecodeError::DepthLimitExceeded { max: MAX_DEPTH });
        }
        self.depth += 1;
        let tag = self.reader.peek_byte("term tag")?;
        let term = match tag {
            ATOM => self.read_atom().map(Term::Atom),
            SMALL_INT => self.read_small_int(),
            INT => self.read_int(),
            SMALL_BIGNUM | LARGE_BIGNUM => self.read_bignum(tag),
            FLOAT => self.read_float(),
            SMALL_TUPLE => self.read_small_tuple(),
            LARGE_TUPLE => self.read_large_tuple(),
            NIL => self.read_nil(),
            STRING => self.read_erl_string(),
            LIST => self.read_list(),
            BIN => self.read_bin(),
            ENC_STRING => self.read_enc_string(),
            UNICODE_STRING => self.read_unicode_string(),
            other => Err(DecodeError::UnknownTag { tag: other }),
        };
        self.depth -= 1;
        term
    }

    /// Consumes a tag byte, asserting it matches what dispatch saw.
    fn expect_tag(&mut self, expected: u8, context: &'static str) -> Result<(), DecodeError> {
        let found = self.reader.read_byte(context)?;
        if found != expected {
            return Err(DecodeError::TagMismatch {
                context,
                expected,
                found,
            });
        }
        Ok(())
    }

    fn read_atom(&mut self) -> Result<String, DecodeError> {
        self.expect_tag(ATOM, "atom")?;
        let len = self.reader.read_u16_be("atom length")? as usize;
        // Zero-length atoms are valid and distinct.
        let bytes = self.reader.read_bytes(len, "atom text")?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| DecodeError::InvalidUtf8 { field: "atom" })
    }

    fn read_small_int(&mut self) -> Result<Term, DecodeError> {
        self.expect_tag(SMALL_INT, "small int")?;
        let value = self.reader.read_byte("small int value")?;
        Ok(Term::Int(BigInt::from(value)))
    }

    fn read_int(&mut self) -> Result<Term, DecodeError> {
        self.expect_tag(INT, "int")?;
        // Big-endian two's complement; the full i32 range is accepted even
        // though our encoder only ever emits the +/-2^27 band here.
        let value = self.reader.read_u32_be("int value")? as i32;
        Ok(Term::Int(BigInt::from(value)))
    }

    fn read_bignum(&mut self, tag: u8) -> Result<Term, DecodeError> {
        let size = if tag == SMALL_BIGNUM {
            self.expect_tag(SMALL_BIGNUM, "small bignum")?;
            self.reader.read_byte("bignum size")? as usize
        } else {
            self.expect_tag(LARGE_BIGNUM, "large bignum")?;
            self.reader.read_u32_be("bignum size")? as usize
        };
        let sign = match self.reader.read_byte("bignum sign")? {
            0 => Sign::Plus,
            1 => Sign::Minus,
            _ => {
                return Err(DecodeError::MalformedEncoding {
                    context: "bignum sign byte must be 0 or 1",
                });
            }
        };
        let magnitude = self.reader.read_bytes(size, "bignum magnitude")?;
        Ok(Term::Int(BigInt::from_bytes_le(sign, magnitude)))
    }

    fn read_float(&mut self) -> Result<Term, DecodeError> {
        self.expect_tag(FLOAT, "float")?;
        let bytes = self.reader.read_bytes(FLOAT_LEN, "float text")?;
        let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
        let text = std::str::from_utf8(&bytes[..end])
            .map_err(|_| DecodeError::InvalidUtf8 { field: "float" })?;
        text.parse::<f64>()
            .map(Term::Float)
            .map_err(|_| DecodeError::InvalidFloat {
                repr: text.to_string(),
            })
    }

    fn read_small_tuple(&mut self) -> Result<Term, DecodeError> {
        self.expect_tag(SMALL_TUPLE, "small tuple")?;
        let arity = self.reader.read_byte("tuple arity")? as usize;
        self.read_tuple(arity)
    }

    fn read_large_tuple(&mut self) -> Result<Term, DecodeError> {
        self.expect_tag(LARGE_TUPLE, "large tuple")?;
        let arity = self.reader.read_u32_be("tuple arity")? as usize;
        self.read_tuple(arity)
    }

    fn read_tuple(&mut self, arity: usize) -> Result<Term, DecodeError> {
        if arity == 0 {
            return Ok(Term::Tuple(Vec::new()));
        }
        // Every element takes at least one byte; a declared arity beyond the
        // remaining input can only be truncated or hostile.
        if arity > self.reader.remaining_len() {
            return Err(DecodeError::UnexpectedEof {
                context: "tuple elements",
            });
        }
        let first = self.read_term()?;
        if matches!(&first, Term::Atom(name) if name == "bert") {
            return self.read_complex();
        }
        let mut items = Vec::with_capacity(arity);
        items.push(first);
        for _ in 1..arity {
            items.push(self.read_term()?);
        }
        Ok(Term::Tuple(items))
    }

    /// Reconstructs a native value from a reserved `{bert, ...}` tuple. The
    /// `bert` atom has already been consumed.
    fn read_complex(&mut self) -> Result<Term, DecodeError> {
        let label = match self.read_term()? {
            Term::Atom(name) => name,
            _ => {
                return Err(DecodeError::MalformedEncoding {
                    context: "complex type tag must be an atom",
                });
            }
        };
        match label.as_str() {
            "nil" => Ok(Term::Nil),
            "true" => Ok(Term::Bool(true)),
            "false" => Ok(Term::Bool(false)),
            "time" => self.read_time(),
            "regex" => self.read_regex(),
            "dict" => self.read_dict(),
            _ => Err(DecodeError::UnknownComplexTag { tag: label }),
        }
    }

    fn read_time(&mut self) -> Result<Term, DecodeError> {
        let megasec = self.read_integer_component("timestamp megaseconds")?;
        let sec = self.read_integer_component("timestamp seconds")?;
        let usec = self.read_integer_component("timestamp microseconds")?;
        Ok(Term::Timestamp(Timestamp { megasec, sec, usec }))
    }

    fn read_integer_component(&mut self, context: &'static str) -> Result<i64, DecodeError> {
        match self.read_term()? {
            Term::Int(value) => {
                i64::try_from(&value).map_err(|_| DecodeError::MalformedEncoding { context })
            }
            _ => Err(DecodeError::MalformedEncoding { context }),
        }
    }

    fn read_regex(&mut self) -> Result<Term, DecodeError> {
        let source = match self.read_term()? {
            Term::Binary { data, .. } | Term::ByteList(data) => String::from_utf8(data)
                .map_err(|_| DecodeError::InvalidUtf8 {
                    field: "regex source",
                })?,
            _ => {
                return Err(DecodeError::MalformedEncoding {
                    context: "regex source must be string-like",
                });
            }
        };
        let options = match self.read_term()? {
            Term::List(items) => items,
            _ => {
                return Err(DecodeError::MalformedEncoding {
                    context: "regex options must be a list",
                });
            }
        };
        let mut flags = RegexFlags::default();
        for option in options {
            match option {
                Term::Atom(name) => match name.as_str() {
                    "caseless" => flags.caseless = true,
                    "extended" => flags.extended = true,
                    "multiline" => flags.multiline = true,
                    // Unrecognized flag atoms pass through silently.
                    _ => {}
                },
                _ => {
                    return Err(DecodeError::MalformedEncoding {
                        context: "regex flag must be an atom",
                    });
                }
            }
        }
        Ok(Term::Regex { source, flags })
    }

    fn read_dict(&mut self) -> Result<Term, DecodeError> {
        let tag = self.reader.peek_byte("dict pairs")?;
        let mut entries: Vec<(Term, Term)> = Vec::new();
        match tag {
            // An empty map's pair list is the bare empty-list tag.
            NIL => {
                self.expect_tag(NIL, "dict pairs")?;
            }
            LIST => {
                self.expect_tag(LIST, "dict pairs")?;
                let len = self.reader.read_u32_be("dict pair count")? as usize;
                if len > self.reader.remaining_len() {
                    return Err(DecodeError::UnexpectedEof {
                        context: "dict pairs",
                    });
                }
                for _ in 0..len {
                    let (key, value) = match self.read_term()? {
                        Term::Tuple(items) | Term::List(items) if items.len() == 2 => {
                            let mut items = items.into_iter();
                            // len checked above, both unwraps are total
                            (items.next().unwrap(), items.next().unwrap())
                        }
                        _ => {
                            return Err(DecodeError::MalformedEncoding {
                                context: "dict pair must have two elements",
                            });
                        }
                    };
                    map_insert(&mut entries, key, value);
                }
                self.expect_terminator(len)?;
            }
            found => {
                return Err(DecodeError::TagMismatch {
                    context: "dict pairs",
                    expected: LIST,
                    found,
                });
            }
        }
        Ok(Term::Map(entries))
    }

    fn read_nil(&mut self) -> Result<Term, DecodeError> {
        self.expect_tag(NIL, "empty list")?;
        Ok(Term::List(Vec::new()))
    }

    fn read_erl_string(&mut self) -> Result<Term, DecodeError> {
        self.expect_tag(STRING, "string")?;
        let len = self.reader.read_u16_be("string length")? as usize;
        let bytes = self.reader.read_bytes(len, "string bytes")?;
        Ok(Term::ByteList(bytes.to_vec()))
    }

    fn read_list(&mut self) -> Result<Term, DecodeError> {
        self.expect_tag(LIST, "list")?;
        let len = self.reader.read_u32_be("list length")? as usize;
        if len > self.reader.remaining_len() {
            return Err(DecodeError::UnexpectedEof {
                context: "list elements",
            });
        }
        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            items.push(self.read_term()?);
        }
        self.expect_terminator(len)?;
        Ok(Term::List(items))
    }

    /// Consumes the mandatory trailing NIL of a proper list.
    fn expect_terminator(&mut self, len: usize) -> Result<(), DecodeError> {
        let found = self.reader.read_byte("list terminator")?;
        if found != NIL {
            return Err(DecodeError::MissingListTerminator { len, found });
        }
        Ok(())
    }

    fn read_bin(&mut self) -> Result<Term, DecodeError> {
        self.expect_tag(BIN, "binary")?;
        let len = self.reader.read_u32_be("binary length")? as usize;
        let bytes = self.reader.read_bytes(len, "binary bytes")?;
        Ok(Term::Binary {
            data: bytes.to_vec(),
            encoding: None,
        })
    }

    fn read_unicode_string(&mut self) -> Result<Term, DecodeError> {
        self.expect_tag(UNICODE_STRING, "unicode string")?;
        let len = self.reader.read_u32_be("unicode string length")? as usize;
        let bytes = self.reader.read_bytes(len, "unicode string bytes")?;
        if std::str::from_utf8(bytes).is_err() {
            return Err(DecodeError::InvalidUtf8 {
                field: "unicode string",
            });
        }
        Ok(Term::Binary {
            data: bytes.to_vec(),
            encoding: Some("UTF-8".to_string()),
        })
    }

    fn read_enc_string(&mut self) -> Result<Term, DecodeError> {
        self.expect_tag(ENC_STRING, "encoded string")?;
        let len = self.reader.read_u32_be("encoded string length")? as usize;
        let payload = self.reader.read_bytes(len, "encoded string bytes")?.to_vec();

        // The payload is followed immediately by a binary segment carrying
        // the encoding name.
        self.expect_tag(BIN, "encoding name")?;
        let name_len = self.reader.read_u32_be("encoding name length")? as usize;
        let name_bytes = self.reader.read_bytes(name_len, "encoding name bytes")?;
        let name = std::str::from_utf8(name_bytes)
            .map_err(|_| DecodeError::InvalidUtf8 {
                field: "encoding name",
            })?
            .to_string();

        Ok(Term::Binary {
            data: payload,
            encoding: Some(name),
        })
    }
}


#[cfg(test)]
mod prop_tests {
    use proptest::prelude::*;

    use super::*;
    use crate::codec::encode::{EncodeOptions, encode_term_with_options};

    fn leaf_strategy() -> impl Strategy<Value = Term> {
        prop_oneof![
            Just(Term::Nil),
            any::<bool>().prop_map(Term::Bool),
            any::<i64>().prop_map(Term::from),
            // Dyadic rationals survive the 31-byte decimal form exactly.
            (-(1i32 << 20)..(1i32 << 20)).prop_map(|k| Term::Float(f64::from(k) / 256.0)),
            "[a-z_]{0,12}".prop_map(Term::atom),
            proptest::collection::vec(any::<u8>(), 0..48).prop_map(Term::binary),
            proptest::collection::vec(any::<u8>(), 0..48).prop_map(Term::ByteList),
            (0i64..10_000, 0i64..1_000_000, 0i64..1_000_000).prop_map(|(megasec, sec, usec)| {
                Term::Timestamp(Timestamp { megasec, sec, usec })
            }),
            ("[a-z]{1,8}", any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
                |(source, caseless, extended, multiline)| Term::Regex {
                    source,
                    flags: RegexFlags {
                        caseless,
                        extended,
                        multiline,
                    },
                }
            ),
        ]
    }

    fn term_strategy() -> impl Strategy<Value = Term> {
        leaf_strategy().prop_recursive(4, 48, 6, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..6).prop_map(Term::List),
                proptest::collection::vec(inner.clone(), 0..6).prop_map(Term::Tuple),
                proptest::collection::vec(("[a-z]{1,6}", inner), 0..5).prop_map(|pairs| {
                    Term::map(
                        pairs
                            .into_iter()
                            .map(|(key, value)| (Term::atom(key), value)),
                    )
                }),
            ]
        })
    }

    proptest! {
        #[test]
        fn roundtrip_v1(term in term_strategy()) {
            let bytes = encode_term_with_options(&term, &EncodeOptions::default()).unwrap();
            prop_assert_eq!(decode_term(&bytes).unwrap(), term);
        }

        #[test]
        fn roundtrip_v2(term in term_strategy()) {
            let options = EncodeOptions::with_version(Version::V2);
            let bytes = encode_term_with_options(&term, &options).unwrap();
            prop_assert_eq!(decode_term(&bytes).unwrap(), term);
        }

        #[test]
        fn truncated_input_never_hangs_or_succeeds(term in term_strategy()) {
            let bytes = encode_term_with_options(&term, &EncodeOptions::default()).unwrap();
            let cut = bytes.len() - 1;
            prop_assert!(decode_term(&bytes[..cut]).is_err());
        }
    }
}
