//! Form converter: rewrites a native term tree into complex form.
//!
//! Complex form is the wire-representable shape: the kinds the base tag set
//! cannot express directly (nil, booleans, timestamps, regexes, maps) become
//! reserved `{bert, ...}` tuples. The decoder applies the inverse rewrite
//! inline as it recognizes the reserved tuple pattern.

use num_bigint::BigInt;

use crate::model::{RegexFlags, Term, Timestamp};

/// Recursively converts a term into complex form.
///
/// Pure and side-effect free; the input is left untouched. Skipped entirely
/// for the delegated versions, whose packer encodes native shapes directly.
pub fn to_complex(term: &Term) -> Term {
    match term {
        Term::Nil => bert_tuple(vec![Term::atom("nil")]),
        Term::Bool(true) => bert_tuple(vec![Term::atom("true")]),
        Term::Bool(false) => bert_tuple(vec![Term::atom("false")]),
        Term::Timestamp(ts) => convert_timestamp(ts),
        Term::Regex { source, flags } => convert_regex(source, flags),
        Term::Map(entries) => convert_map(entries),
        Term::List(items) => Term::List(items.iter().map(to_complex).collect()),
        Term::Tuple(items) => Term::Tuple(items.iter().map(to_complex).collect()),
        other => other.clone(),
    }
}

fn bert_tuple(mut rest: Vec<Term>) -> Term {
    let mut items = Vec::with_capacity(rest.len() + 1);
    items.push(Term::atom("bert"));
    items.append(&mut rest);
    Term::Tuple(items)
}

fn convert_timestamp(ts: &Timestamp) -> Term {
    bert_tuple(vec![
        Term::atom("time"),
        Term::Int(BigInt::from(ts.megasec)),
        Term::Int(BigInt::from(ts.sec)),
        Term::Int(BigInt::from(ts.usec)),
    ])
}

fn convert_regex(source: &str, flags: &RegexFlags) -> Term {
    let mut options = Vec::new();
    if flags.caseless {
        options.push(Term::atom("caseless"));
    }
    if flags.extended {
        options.push(Term::atom("extended"));
    }
    if flags.multiline {
        options.push(Term::atom("multiline"));
    }
    bert_tuple(vec![
        Term::atom("regex"),
        Term::utf8(source),
        Term::List(options),
    ])
}

fn convert_map(entries: &[(Term, Term)]) -> Term {
    let pairs = entries
        .iter()
        .map(|(k, v)| Term::Tuple(vec![to_complex(k), to_complex(v)]))
        .collect();
    bert_tuple(vec![Term::atom("dict"), Term::List(pairs)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_nil() {
        assert_eq!(
            to_complex(&Term::Nil),
            Term::Tuple(vec![Term::atom("bert"), Term::atom("nil")])
        );
    }

    #[test]
    fn test_convert_nested_nil() {
        let before = Term::List(vec![Term::Nil, Term::List(vec![Term::Nil])]);
        let nil = Term::Tuple(vec![Term::atom("bert"), Term::atom("nil")]);
        let after = Term::List(vec![nil.clone(), Term::List(vec![nil])]);
        assert_eq!(to_complex(&before), after);
    }

    #[test]
    fn test_convert_booleans() {
        assert_eq!(
            to_complex(&Term::Bool(true)),
            Term::Tuple(vec![Term::atom("bert"), Term::atom("true")])
        );
        assert_eq!(
            to_complex(&Term::Bool(false)),
            Term::Tuple(vec![Term::atom("bert"), Term::atom("false")])
        );
    }

    #[test]
    fn test_convert_map() {
        let before = Term::map([(Term::atom("foo"), Term::utf8("bar"))]);
        let after = Term::Tuple(vec![
            Term::atom("bert"),
            Term::atom("dict"),
            Term::List(vec![Term::Tuple(vec![
                Term::atom("foo"),
                Term::utf8("bar"),
            ])]),
        ]);
        assert_eq!(to_complex(&before), after);
    }

    #[test]
    fn test_convert_nested_map() {
        let before = Term::map([(
            Term::atom("foo"),
            Term::map([(Term::atom("baz"), Term::utf8("bar"))]),
        )]);
        let inner = Term::Tuple(vec![
            Term::atom("bert"),
            Term::atom("dict"),
            Term::List(vec![Term::Tuple(vec![
                Term::atom("baz"),
                Term::utf8("bar"),
            ])]),
        ]);
        let after = Term::Tuple(vec![
            Term::atom("bert"),
            Term::atom("dict"),
            Term::List(vec![Term::Tuple(vec![Term::atom("foo"), inner])]),
        ]);
        assert_eq!(to_complex(&before), after);
    }

    #[test]
    fn test_convert_timestamp() {
        let ts = Timestamp::from_epoch(1_254_976_067, 0);
        assert_eq!(
            to_complex(&Term::Timestamp(ts)),
            Term::Tuple(vec![
                Term::atom("bert"),
                Term::atom("time"),
                Term::from(1254i64),
                Term::from(976_067i64),
                Term::from(0i64),
            ])
        );
    }

    #[test]
    fn test_convert_regex() {
        let re = Term::Regex {
            source: "^c(a)t$".to_string(),
            flags: RegexFlags {
                caseless: true,
                extended: true,
                multiline: false,
            },
        };
        assert_eq!(
            to_complex(&re),
            Term::Tuple(vec![
                Term::atom("bert"),
                Term::atom("regex"),
                Term::utf8("^c(a)t$"),
                Term::List(vec![Term::atom("caseless"), Term::atom("extended")]),
            ])
        );
    }

    #[test]
    fn test_passthrough_kinds_unchanged() {
        for term in [
            Term::from(42i64),
            Term::Float(9.9),
            Term::atom("cat"),
            Term::binary(vec![0, 1, 2]),
            Term::ByteList(vec![97, 97]),
        ] {
            assert_eq!(to_complex(&term), term);
        }
    }

    #[test]
    fn test_tuple_recurses_elementwise() {
        let before = Term::Tuple(vec![Term::atom("user"), Term::Bool(true)]);
        let after = Term::Tuple(vec![
            Term::atom("user"),
            Term::Tuple(vec![Term::atom("bert"), Term::atom("true")]),
        ]);
        assert_eq!(to_complex(&before), after);
    }
}
