//! External packer interface for the delegated versions.
//!
//! Streams with the v3 or v4 marker carry the term in the packer's own
//! arbitrary-precision format instead of the byte-level tag grammar. The core
//! never implements this trait; the host process supplies an implementation
//! and its presence is what makes v3/v4 usable at all.

use crate::error::{DecodeError, EncodeError};
use crate::model::Term;

/// Packs and unpacks terms for the delegated protocol versions.
///
/// v4 uses the validated `pack`/`unpack` pair; v3 uses the unchecked fast
/// path, which defaults to the validated one for packers that do not
/// distinguish the two.
pub trait TermPacker {
    /// Packs a term, validating it.
    fn pack(&self, term: &Term) -> Result<Vec<u8>, EncodeError>;

    /// Unpacks a term, validating the input.
    fn unpack(&self, bytes: &[u8]) -> Result<Term, DecodeError>;

    /// Packs a term without validation.
    fn pack_unsafe(&self, term: &Term) -> Result<Vec<u8>, EncodeError> {
        self.pack(term)
    }

    /// Unpacks a term without validation.
    fn unpack_unsafe(&self, bytes: &[u8]) -> Result<Term, DecodeError> {
        self.unpack(bytes)
    }
}
