//! Codec for BERT (Binary ERlang Term), the external-term-format dialect
//! used by BERT-RPC.
//!
//! Terms are modeled as a closed [`Term`] tree covering integers of arbitrary
//! precision, floats, atoms, binaries, byte lists, lists, tuples, and the
//! complex kinds (nil, booleans, maps, regexes, timestamps) that ride the
//! wire as reserved `{bert, ...}` tuples.
//!
//! ```
//! use bert::{Term, decode_term, encode_term};
//!
//! let term = Term::map([(Term::atom("name"), Term::utf8("TPW"))]);
//! let bytes = encode_term(&term)?;
//! assert_eq!(decode_term(&bytes)?, term);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Byte-level streams start with marker 131 (v1) or 132 (v2, which adds the
//! encoding-aware string tags). Markers 133 and 134 delegate the payload to
//! an external [`TermPacker`]; without one those streams are refused. The
//! version is an explicit per-call choice via [`EncodeOptions`], never
//! ambient state.

pub mod codec;
pub mod error;
pub mod limits;
pub mod model;
pub mod pack;
pub mod tags;

pub use codec::{
    EncodeOptions, decode_term, decode_term_with_packer, encode_term, encode_term_with_options,
    to_complex,
};
pub use error::{DecodeError, EncodeError};
pub use model::{RegexFlags, Term, Timestamp};
pub use pack::TermPacker;
pub use tags::Version;
