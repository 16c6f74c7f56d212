//! Predicate trees evaluated by the engine.

use std::fmt;

/// A node of a query tree.
///
/// Term and phrase leaves carry relevance weight. `Filter` and
/// `ValueRange` restrict the match set without adding any.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Every document, with zero weight.
    MatchAll,
    /// No document.
    MatchNothing,
    Term {
        term: String,
        /// Within-query frequency; scales the term's weight.
        wqf: u32,
    },
    /// Terms in order, each within `window` positions of the first.
    ///
    /// Degrades to `And` on documents indexed without positions.
    Phrase {
        terms: Vec<String>,
        window: Option<u32>,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Xor(Vec<Predicate>),
    AndNot(Box<Predicate>, Box<Predicate>),
    /// Matches the left side; the right side only adds weight.
    AndMaybe(Box<Predicate>, Box<Predicate>),
    /// Matches both sides, weighted by the left side only.
    Filter(Box<Predicate>, Box<Predicate>),
    /// Like `Or`, but weighted as a single term.
    Synonym(Vec<Predicate>),
    /// Slot value between the bounds (inclusive, bytewise); a missing bound is open.
    ValueRange {
        slot: u32,
        lo: Option<Vec<u8>>,
        hi: Option<Vec<u8>>,
    },
}

impl Predicate {
    pub fn term(term: impl Into<String>) -> Self {
        Predicate::Term {
            term: term.into(),
            wqf: 1,
        }
    }

    pub fn phrase<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Predicate::Phrase {
            terms: terms.into_iter().map(Into::into).collect(),
            window: None,
        }
    }

    /// `And` of the given predicates, flattening trivial cases.
    pub fn and(mut items: Vec<Predicate>) -> Self {
        match items.len() {
            0 => Predicate::MatchNothing,
            1 => items.remove(0),
            _ => Predicate::And(items),
        }
    }

    /// `Or` of the given predicates, flattening trivial cases.
    pub fn or(mut items: Vec<Predicate>) -> Self {
        match items.len() {
            0 => Predicate::MatchNothing,
            1 => items.remove(0),
            _ => Predicate::Or(items),
        }
    }

    pub fn and_not(self, other: Predicate) -> Self {
        Predicate::AndNot(Box::new(self), Box::new(other))
    }

    pub fn and_maybe(self, other: Predicate) -> Self {
        Predicate::AndMaybe(Box::new(self), Box::new(other))
    }

    pub fn filter(self, filter: Predicate) -> Self {
        Predicate::Filter(Box::new(self), Box::new(filter))
    }

    pub fn is_match_nothing(&self) -> bool {
        matches!(self, Predicate::MatchNothing)
    }

    /// All term strings appearing in scored or unscored leaves.
    pub fn terms(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_terms(&mut out);
        out
    }

    fn collect_terms<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Term { term, .. } => out.push(term),
            Predicate::Phrase { terms, .. } => out.extend(terms.iter().map(|t| t.as_str())),
            Predicate::And(items)
            | Predicate::Or(items)
            | Predicate::Xor(items)
            | Predicate::Synonym(items) => items.iter().for_each(|p| p.collect_terms(out)),
            Predicate::AndNot(l, r) | Predicate::AndMaybe(l, r) | Predicate::Filter(l, r) => {
                l.collect_terms(out);
                r.collect_terms(out);
            }
            Predicate::MatchAll | Predicate::MatchNothing | Predicate::ValueRange { .. } => {}
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, op: &str, items: &[Predicate]) -> fmt::Result {
    f.write_str("(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " {op} ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(")")
}

fn hex(bytes: &Option<Vec<u8>>) -> String {
    match bytes {
        Some(b) => b.iter().map(|x| format!("{x:02x}")).collect(),
        None => "*".to_string(),
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::MatchAll => f.write_str("<alldocuments>"),
            Predicate::MatchNothing => f.write_str("<nothing>"),
            Predicate::Term { term, wqf } if *wqf > 1 => write!(f, "{term}#{wqf}"),
            Predicate::Term { term, .. } => f.write_str(term),
            Predicate::Phrase { terms, .. } => write!(f, "({})", terms.join(" PHRASE ")),
            Predicate::And(items) => join(f, "AND", items),
            Predicate::Or(items) => join(f, "OR", items),
            Predicate::Xor(items) => join(f, "XOR", items),
            Predicate::Synonym(items) => join(f, "SYNONYM", items),
            Predicate::AndNot(l, r) => write!(f, "({l} AND_NOT {r})"),
            Predicate::AndMaybe(l, r) => write!(f, "({l} AND_MAYBE {r})"),
            Predicate::Filter(l, r) => write!(f, "({l} FILTER {r})"),
            Predicate::ValueRange { slot, lo, hi } => {
                write!(f, "VALUE_RANGE {slot} {} {}", hex(lo), hex(hi))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let p = Predicate::and(vec![Predicate::term("cow"), Predicate::term("dog")])
            .filter(Predicate::term("XSTATUSactive"));
        assert_eq!(p.to_string(), "((cow AND dog) FILTER XSTATUSactive)");
    }

    #[test]
    fn test_flattening() {
        assert_eq!(Predicate::or(vec![]), Predicate::MatchNothing);
        assert_eq!(
            Predicate::and(vec![Predicate::term("cow")]),
            Predicate::term("cow")
        );
    }

    #[test]
    fn test_terms() {
        let p = Predicate::term("a").and_not(Predicate::phrase(["b", "c"]));
        assert_eq!(p.terms(), vec!["a", "b", "c"]);
    }
}
