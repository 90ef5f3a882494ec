//! Declared values as produced by the CSS parser.
//!
//! A [`CssValue`] is the ordered list of lexical terms of one declaration,
//! e.g. `bold 12pt/1.5 "Gill Sans", serif`. Interpretation is left to the
//! processors; the cascade only compares and orders values.

use std::fmt;
use std::hash::{Hash, Hasher};

use restyle_types::Ident;
use serde::{Deserialize, Serialize};

/// Units accepted on dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Px,
    Pt,
    Pc,
    In,
    Cm,
    Mm,
    Em,
    Ex,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Px => "px",
            Unit::Pt => "pt",
            Unit::Pc => "pc",
            Unit::In => "in",
            Unit::Cm => "cm",
            Unit::Mm => "mm",
            Unit::Em => "em",
            Unit::Ex => "ex",
        }
    }
}

/// One lexical unit of a declared value.
///
/// Floats compare and hash by bit pattern so that values can be used as
/// map keys and compared for bit-for-bit identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    Ident(Ident),
    String(String),
    Integer(i32),
    Number(f32),
    Dimension(f32, Unit),
    Percentage(f32),
    /// Hex colour without the leading `#`.
    Hash(String),
    Uri(String),
    Function { name: Ident, args: Vec<Term> },
    Inherit,
    Comma,
    Slash,
}

impl Term {
    pub fn ident(name: &str) -> Self {
        Term::Ident(Ident::new(name))
    }

    /// The keyword, if this term is an identifier.
    pub fn as_ident(&self) -> Option<&Ident> {
        match self {
            Term::Ident(id) => Some(id),
            _ => None,
        }
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Term::Ident(a), Term::Ident(b)) => a == b,
            (Term::String(a), Term::String(b)) => a == b,
            (Term::Integer(a), Term::Integer(b)) => a == b,
            (Term::Number(a), Term::Number(b)) => a.to_bits() == b.to_bits(),
            (Term::Dimension(a, ua), Term::Dimension(b, ub)) => {
                a.to_bits() == b.to_bits() && ua == ub
            },
            (Term::Percentage(a), Term::Percentage(b)) => a.to_bits() == b.to_bits(),
            (Term::Hash(a), Term::Hash(b)) => a.eq_ignore_ascii_case(b),
            (Term::Uri(a), Term::Uri(b)) => a == b,
            (
                Term::Function { name: na, args: aa },
                Term::Function { name: nb, args: ab },
            ) => na == nb && aa == ab,
            (Term::Inherit, Term::Inherit)
            | (Term::Comma, Term::Comma)
            | (Term::Slash, Term::Slash) => true,
            _ => false,
        }
    }
}

impl Eq for Term {}

impl Hash for Term {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Term::Ident(id) => id.hash(state),
            Term::String(s) | Term::Uri(s) => s.hash(state),
            Term::Hash(h) => h.to_ascii_lowercase().hash(state),
            Term::Integer(i) => i.hash(state),
            Term::Number(v) | Term::Percentage(v) => v.to_bits().hash(state),
            Term::Dimension(v, unit) => {
                v.to_bits().hash(state);
                unit.hash(state);
            },
            Term::Function { name, args } => {
                name.hash(state);
                args.hash(state);
            },
            Term::Inherit | Term::Comma | Term::Slash => {},
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Ident(id) => write!(f, "{id}"),
            Term::String(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            Term::Integer(i) => write!(f, "{i}"),
            Term::Number(v) => write!(f, "{v}"),
            Term::Dimension(v, unit) => write!(f, "{v}{}", unit.as_str()),
            Term::Percentage(v) => write!(f, "{v}%"),
            Term::Hash(h) => write!(f, "#{h}"),
            Term::Uri(u) => write!(f, "url({u})"),
            Term::Function { name, args } => {
                write!(f, "{name}(")?;
                write_terms(f, args)?;
                f.write_str(")")
            },
            Term::Inherit => f.write_str("inherit"),
            Term::Comma => f.write_str(","),
            Term::Slash => f.write_str("/"),
        }
    }
}

fn write_terms(f: &mut fmt::Formatter<'_>, terms: &[Term]) -> fmt::Result {
    let mut previous: Option<&Term> = None;
    for term in terms {
        let glued = matches!(term, Term::Comma | Term::Slash)
            || matches!(previous, Some(Term::Slash));
        if previous.is_some() && !glued {
            f.write_str(" ")?;
        }
        write!(f, "{term}")?;
        previous = Some(term);
    }
    Ok(())
}

/// The value of one declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CssValue {
    pub terms: Vec<Term>,
}

impl CssValue {
    pub fn new(terms: Vec<Term>) -> Self {
        Self { terms }
    }

    /// A value consisting of a single keyword.
    pub fn ident(name: &str) -> Self {
        Self::new(vec![Term::ident(name)])
    }

    pub fn inherit() -> Self {
        Self::new(vec![Term::Inherit])
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// The only term of a single-term value.
    pub fn single(&self) -> Option<&Term> {
        match self.terms.as_slice() {
            [term] => Some(term),
            _ => None,
        }
    }

    /// The keyword of a single-keyword value.
    pub fn as_ident(&self) -> Option<&Ident> {
        self.single().and_then(Term::as_ident)
    }

    pub fn is_inherit(&self) -> bool {
        matches!(self.single(), Some(Term::Inherit))
    }
}

impl From<Term> for CssValue {
    fn from(term: Term) -> Self {
        Self::new(vec![term])
    }
}

impl fmt::Display for CssValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_terms(f, &self.terms)
    }
}
