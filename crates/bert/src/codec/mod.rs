//! Binary codec for BERT streams.
//!
//! Split into the byte-level primitives, the complex-form converter, and the
//! encoder and decoder engines built on top of them.

pub mod convert;
pub mod decode;
pub mod encode;
pub mod primitives;

pub use convert::to_complex;
pub use decode::{decode_term, decode_term_with_packer};
pub use encode::{EncodeOptions, encode_term, encode_term_with_options};
pub use primitives::{Reader, Writer};
