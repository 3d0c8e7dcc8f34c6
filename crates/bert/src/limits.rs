//! Security limits for decoding.
//!
//! The grammar itself cannot express cycles, but it can express arbitrarily
//! deep nesting; the depth cap keeps adversarial input from exhausting the
//! call stack.

/// Maximum nesting depth of lists, tuples and dict pairs while decoding.
pub const MAX_DEPTH: usize = 1024;

/// Maximum byte length of an atom (fixed by the u16 length prefix).
pub const MAX_ATOM_LEN: usize = u16::MAX as usize;
