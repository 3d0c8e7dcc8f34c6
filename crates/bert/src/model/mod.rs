//! Native term tree for BERT values.

pub mod term;

pub use term::{RegexFlags, Term, Timestamp};
