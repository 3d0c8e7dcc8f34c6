//! The `Term` value tree and its auxiliary types.
//!
//! A `Term` is built fresh per encode or decode call and owns all of its
//! nested values; the grammar cannot express sharing or cycles.

use num_bigint::BigInt;

/// Option flags carried by a [`Term::Regex`] pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RegexFlags {
    /// Case-insensitive matching (wire atom `caseless`).
    pub caseless: bool,
    /// Extended / free-spacing mode (wire atom `extended`).
    pub extended: bool,
    /// Multiline mode (wire atom `multiline`).
    pub multiline: bool,
}

/// A three-part time value: `megasec * 1_000_000 + sec` whole seconds since
/// the Unix epoch, plus `usec` microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Timestamp {
    pub megasec: i64,
    pub sec: i64,
    pub usec: i64,
}

impl Timestamp {
    /// Builds a timestamp from whole epoch seconds and a microsecond part.
    pub fn from_epoch(seconds: i64, usec: u32) -> Timestamp {
        Timestamp {
            megasec: seconds.div_euclid(1_000_000),
            sec: seconds.rem_euclid(1_000_000),
            usec: i64::from(usec),
        }
    }

    /// Whole seconds since the Unix epoch.
    pub fn epoch_seconds(&self) -> i64 {
        self.megasec * 1_000_000 + self.sec
    }
}

/// A BERT term.
///
/// Closed union over every value kind the format can carry. `Nil`, `Bool`,
/// `Map`, `Regex` and `Timestamp` have no tag of their own on the wire; the
/// codec rewrites them through reserved `{bert, ...}` tuples (complex form).
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// The nil value. Distinct from the empty list.
    Nil,
    Bool(bool),
    /// Arbitrary-precision integer. The wire form (1-byte, 4-byte or bignum)
    /// is selected from the value alone.
    Int(BigInt),
    Float(f64),
    /// Interned text label. The empty atom is valid and distinct.
    Atom(String),
    /// Opaque bytes, optionally carrying a declared text-encoding name.
    /// `None` means raw binary data.
    Binary {
        data: Vec<u8>,
        encoding: Option<String>,
    },
    /// Ordered sequence of bytes, the legacy wire "string" shape. Distinct
    /// from `Binary` even when both hold text.
    ByteList(Vec<u8>),
    List(Vec<Term>),
    Tuple(Vec<Term>),
    /// Association list of key/value pairs. Insertion order carries no
    /// meaning; a duplicate key replaces the earlier pair.
    Map(Vec<(Term, Term)>),
    Regex {
        source: String,
        flags: RegexFlags,
    },
    Timestamp(Timestamp),
}

impl Term {
    /// Builds an atom term.
    pub fn atom(name: impl Into<String>) -> Term {
        Term::Atom(name.into())
    }

    /// Builds an integer term.
    pub fn int(value: impl Into<BigInt>) -> Term {
        Term::Int(value.into())
    }

    /// Builds a raw binary term with no declared encoding.
    pub fn binary(data: impl Into<Vec<u8>>) -> Term {
        Term::Binary {
            data: data.into(),
            encoding: None,
        }
    }

    /// Builds a binary term holding UTF-8 text.
    pub fn utf8(text: impl Into<String>) -> Term {
        Term::Binary {
            data: text.into().into_bytes(),
            encoding: Some("UTF-8".to_string()),
        }
    }

    /// Builds a map term, applying replace-on-duplicate-key insertion.
    pub fn map(pairs: impl IntoIterator<Item = (Term, Term)>) -> Term {
        let mut entries: Vec<(Term, Term)> = Vec::new();
        for (key, value) in pairs {
            map_insert(&mut entries, key, value);
        }
        Term::Map(entries)
    }

    /// Short kind name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Term::Nil => "nil",
            Term::Bool(_) => "bool",
            Term::Int(_) => "integer",
            Term::Float(_) => "float",
            Term::Atom(_) => "atom",
            Term::Binary { .. } => "binary",
            Term::ByteList(_) => "bytelist",
            Term::List(_) => "list",
            Term::Tuple(_) => "tuple",
            Term::Map(_) => "map",
            Term::Regex { .. } => "regex",
            Term::Timestamp(_) => "timestamp",
        }
    }
}

/// Inserts into an association list, replacing the value of an existing key.
pub(crate) fn map_insert(entries: &mut Vec<(Term, Term)>, key: Term, value: Term) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key, value)),
    }
}

impl From<i64> for Term {
    fn from(value: i64) -> Term {
        Term::Int(BigInt::from(value))
    }
}

impl From<i32> for Term {
    fn from(value: i32) -> Term {
        Term::Int(BigInt::from(value))
    }
}

impl From<BigInt> for Term {
    fn from(value: BigInt) -> Term {
        Term::Int(value)
    }
}

impl From<f64> for Term {
    fn from(value: f64) -> Term {
        Term::Float(value)
    }
}

impl From<bool> for Term {
    fn from(value: bool) -> Term {
        Term::Bool(value)
    }
}

impl From<&str> for Term {
    fn from(value: &str) -> Term {
        Term::utf8(value)
    }
}

impl From<Timestamp> for Term {
    fn from(value: Timestamp) -> Term {
        Term::Timestamp(value)
    }
}

impl From<Vec<Term>> for Term {
    fn from(value: Vec<Term>) -> Term {
        Term::List(value)
    }
}
