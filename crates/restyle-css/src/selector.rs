//! Selector model and matching.
//!
//! Selectors are built by the CSS parser and are immutable afterwards.
//! A [`Selector`] stores its compounds left-to-right; the last compound is
//! the *subject*, the element the declarations apply to. Matching runs
//! right-to-left against an [`ElementPath`], the chain of elements from the
//! root down to the subject together with the [`State`] each one is being
//! evaluated in.

use std::fmt;

use restyle_dom::{Document, ElementData, NodeId};
use restyle_types::{Ident, RestyleError, Result};
use serde::{Deserialize, Serialize};

use crate::specificity::Specificity;
use crate::state::State;

// -------------------------------------------------------------------
// Conditions
// -------------------------------------------------------------------

/// The dynamic and structural pseudo-classes understood by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PseudoClass {
    Link,
    Visited,
    Hover,
    Focus,
    Active,
    FirstChild,
}

impl PseudoClass {
    /// Look up a pseudo-class by name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        let pc = match name.to_ascii_lowercase().as_str() {
            "link" => PseudoClass::Link,
            "visited" => PseudoClass::Visited,
            "hover" => PseudoClass::Hover,
            "focus" => PseudoClass::Focus,
            "active" => PseudoClass::Active,
            "first-child" => PseudoClass::FirstChild,
            _ => return None,
        };
        Some(pc)
    }

    pub fn name(self) -> &'static str {
        match self {
            PseudoClass::Link => "link",
            PseudoClass::Visited => "visited",
            PseudoClass::Hover => "hover",
            PseudoClass::Focus => "focus",
            PseudoClass::Active => "active",
            PseudoClass::FirstChild => "first-child",
        }
    }

    /// The [`State`] bits this pseudo-class depends on.
    pub fn state_bits(self) -> u8 {
        match self {
            PseudoClass::Link | PseudoClass::Visited => State::VISITED,
            PseudoClass::Hover => State::HOVERED,
            PseudoClass::Focus => State::FOCUSED,
            PseudoClass::Active => State::ACTIVE,
            PseudoClass::FirstChild => 0,
        }
    }

    fn matches(self, doc: &Document, node: NodeId, elem: &ElementData, state: State) -> bool {
        match self {
            PseudoClass::Link => elem.is_anchor() && !state.is_visited(),
            PseudoClass::Visited => elem.is_anchor() && state.is_visited(),
            PseudoClass::Hover => state.is_hovered(),
            PseudoClass::Focus => state.is_focused(),
            PseudoClass::Active => state.is_active(),
            PseudoClass::FirstChild => doc.is_first_element_child(node),
        }
    }
}

/// A test on a single element, attached to a compound selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// `[name]` when `value` is `None`, `[name=value]` otherwise.
    Attribute { name: Ident, value: Option<String> },
    /// `[name~=value]`: `value` is one of the whitespace-separated words.
    OneOfAttribute { name: Ident, value: String },
    /// `[name|=value]`: equal to `value` or starting with `value-`.
    BeginHyphenAttribute { name: Ident, value: String },
    /// `.value`
    Class(String),
    /// `#value`
    Id(String),
    /// `:lang(value)`
    Lang(String),
    /// `:link`, `:hover`, ...
    PseudoClass(PseudoClass),
    /// Both conditions must match.
    And(Box<Condition>, Box<Condition>),
}

impl Condition {
    /// Build a pseudo-class condition, rejecting names the resolver does
    /// not support (`:nth-child`, `:not()`, ...).
    pub fn pseudo_class(name: &str) -> Result<Condition> {
        PseudoClass::from_name(name)
            .map(Condition::PseudoClass)
            .ok_or_else(|| RestyleError::Selector(format!(":{name}")))
    }

    pub fn and(left: Condition, right: Condition) -> Condition {
        Condition::And(Box::new(left), Box::new(right))
    }

    /// Test this condition against an element in a given state.
    pub fn matches(&self, doc: &Document, node: NodeId, state: State) -> bool {
        let Some(elem) = doc.element(node) else {
            return false;
        };
        match self {
            Condition::Attribute { name, value } => {
                match (elem.get_attribute(name.folded()), value) {
                    (Some(actual), None) => !actual.is_empty(),
                    (Some(actual), Some(expected)) => actual == expected,
                    (None, _) => false,
                }
            },
            Condition::OneOfAttribute { name, value } => elem
                .get_attribute(name.folded())
                .is_some_and(|v| v.split_ascii_whitespace().any(|w| w == value)),
            Condition::BeginHyphenAttribute { name, value } => elem
                .get_attribute(name.folded())
                .is_some_and(|v| hyphen_prefixed(v, value, false)),
            Condition::Class(class) => elem.has_class(class),
            Condition::Id(id) => elem.id() == Some(id.as_str()),
            Condition::Lang(lang) => doc
                .language(node)
                .is_some_and(|actual| hyphen_prefixed(&actual, lang, true)),
            Condition::PseudoClass(pc) => pc.matches(doc, node, elem, state),
            Condition::And(left, right) => {
                left.matches(doc, node, state) && right.matches(doc, node, state)
            },
        }
    }

    /// Add this condition's weight to a specificity accumulator.
    pub fn add_specificity(&self, spec: &mut Specificity) {
        match self {
            Condition::Id(_) => spec.add_id(),
            Condition::And(left, right) => {
                left.add_specificity(spec);
                right.add_specificity(spec);
            },
            _ => spec.add_attribute_or_pseudo_class(),
        }
    }

    /// State bits of every dynamic pseudo-class in this condition.
    pub fn state_bits(&self) -> u8 {
        match self {
            Condition::PseudoClass(pc) => pc.state_bits(),
            Condition::And(left, right) => left.state_bits() | right.state_bits(),
            _ => 0,
        }
    }
}

/// `actual` equals `expected` or starts with `expected` followed by `-`.
fn hyphen_prefixed(actual: &str, expected: &str, ignore_case: bool) -> bool {
    let (actual, expected) = if ignore_case {
        (actual.to_ascii_lowercase(), expected.to_ascii_lowercase())
    } else {
        (actual.to_string(), expected.to_string())
    };
    actual == expected
        || actual
            .strip_prefix(&expected)
            .is_some_and(|rest| rest.starts_with('-'))
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Attribute { name, value: None } => write!(f, "[{name}]"),
            Condition::Attribute {
                name,
                value: Some(v),
            } => write!(f, "[{name}=\"{v}\"]"),
            Condition::OneOfAttribute { name, value } => write!(f, "[{name}~=\"{value}\"]"),
            Condition::BeginHyphenAttribute { name, value } => {
                write!(f, "[{name}|=\"{value}\"]")
            },
            Condition::Class(c) => write!(f, ".{c}"),
            Condition::Id(id) => write!(f, "#{id}"),
            Condition::Lang(l) => write!(f, ":lang({l})"),
            Condition::PseudoClass(pc) => write!(f, ":{}", pc.name()),
            Condition::And(left, right) => write!(f, "{left}{right}"),
        }
    }
}

// -------------------------------------------------------------------
// Selectors
// -------------------------------------------------------------------

/// How two compounds of a selector relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    /// `A B`
    Descendant,
    /// `A > B`
    Child,
    /// `A + B`
    AdjacentSibling,
}

/// An element name (or `*`) with an optional condition and pseudo-element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Compound {
    /// `None` is the universal selector.
    #[serde(default)]
    pub element: Option<Ident>,
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub pseudo_element: Option<Ident>,
}

impl Compound {
    /// `*`
    pub fn any() -> Self {
        Self::default()
    }

    /// A named element, e.g. `p`.
    pub fn element(name: &str) -> Self {
        Self {
            element: Some(Ident::new(name)),
            ..Self::default()
        }
    }

    /// Add a condition, combining with any existing one.
    pub fn with(mut self, condition: Condition) -> Self {
        self.condition = Some(match self.condition.take() {
            Some(existing) => Condition::and(existing, condition),
            None => condition,
        });
        self
    }

    pub fn with_pseudo_element(mut self, name: &str) -> Self {
        self.pseudo_element = Some(Ident::new(name));
        self
    }

    fn add_specificity(&self, spec: &mut Specificity) {
        if self.element.is_some() {
            spec.add_name_or_pseudo_element();
        }
        if let Some(cond) = &self.condition {
            cond.add_specificity(spec);
        }
        if self.pseudo_element.is_some() {
            spec.add_name_or_pseudo_element();
        }
    }

    fn matches(&self, doc: &Document, node: NodeId, state: State) -> bool {
        let Some(elem) = doc.element(node) else {
            return false;
        };
        if let Some(name) = &self.element
            && elem.tag != *name
        {
            return false;
        }
        self.condition
            .as_ref()
            .is_none_or(|c| c.matches(doc, node, state))
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.element, &self.condition) {
            (Some(name), _) => write!(f, "{name}")?,
            (None, None) => f.write_str("*")?,
            (None, Some(_)) => {},
        }
        if let Some(cond) = &self.condition {
            write!(f, "{cond}")?;
        }
        if let Some(pe) = &self.pseudo_element {
            write!(f, "::{pe}")?;
        }
        Ok(())
    }
}

/// A complex selector such as `div.note > p:first-child`.
///
/// `parts[i].1` is the combinator linking `parts[i - 1]` to `parts[i]`;
/// it is `None` for the first part only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selector {
    pub parts: Vec<(Compound, Option<Combinator>)>,
}

/// The elements from the root down to the one being matched, with the state
/// each is evaluated in. `elements` and `states` have the same length.
#[derive(Debug, Clone, Copy)]
pub struct ElementPath<'a> {
    pub doc: &'a Document,
    pub elements: &'a [NodeId],
    pub states: &'a [State],
}

impl<'a> ElementPath<'a> {
    pub fn new(doc: &'a Document, elements: &'a [NodeId], states: &'a [State]) -> Self {
        debug_assert_eq!(elements.len(), states.len());
        Self {
            doc,
            elements,
            states,
        }
    }

    /// The element being matched.
    pub fn subject(&self) -> Option<NodeId> {
        self.elements.last().copied()
    }

    pub fn subject_state(&self) -> State {
        self.states.last().copied().unwrap_or_default()
    }
}

/// Position reached while walking a selector right-to-left.
#[derive(Clone, Copy)]
struct Cursor {
    node: NodeId,
    state: State,
    /// Number of path entries that are ancestors of `node`.
    depth: usize,
}

impl Selector {
    /// A selector made of a single compound.
    pub fn new(subject: Compound) -> Self {
        Self {
            parts: vec![(subject, None)],
        }
    }

    /// `self B`
    pub fn descendant(self, compound: Compound) -> Self {
        self.then(Combinator::Descendant, compound)
    }

    /// `self > B`
    pub fn child(self, compound: Compound) -> Self {
        self.then(Combinator::Child, compound)
    }

    /// `self + B`
    pub fn adjacent(self, compound: Compound) -> Self {
        self.then(Combinator::AdjacentSibling, compound)
    }

    fn then(mut self, combinator: Combinator, compound: Compound) -> Self {
        self.parts.push((compound, Some(combinator)));
        self
    }

    /// The rightmost compound.
    pub fn subject(&self) -> Option<&Compound> {
        self.parts.last().map(|(c, _)| c)
    }

    /// The pseudo-element this selector styles, if any.
    pub fn pseudo_element(&self) -> Option<&Ident> {
        self.subject().and_then(|c| c.pseudo_element.as_ref())
    }

    /// Compute the specificity of this selector.
    pub fn specificity(&self) -> Specificity {
        let mut spec = Specificity::ZERO;
        for (compound, _) in &self.parts {
            compound.add_specificity(&mut spec);
        }
        spec
    }

    /// State bits of every dynamic pseudo-class used anywhere in the chain.
    pub fn state_bits(&self) -> u8 {
        self.parts
            .iter()
            .filter_map(|(c, _)| c.condition.as_ref())
            .fold(0, |bits, c| bits | c.state_bits())
    }

    /// Check whether this selector matches the last element of `path`.
    ///
    /// `pseudo_element` names the pseudo-element being resolved; selectors
    /// ending in a pseudo-element only match when it is requested, and
    /// plain selectors only match the element itself.
    pub fn matches(&self, path: &ElementPath<'_>, pseudo_element: Option<&Ident>) -> bool {
        if self.pseudo_element() != pseudo_element {
            return false;
        }
        let Some(node) = path.subject() else {
            return false;
        };
        if self.parts.is_empty() {
            return false;
        }
        let cursor = Cursor {
            node,
            state: path.subject_state(),
            depth: path.elements.len() - 1,
        };
        self.matches_from(path, self.parts.len() - 1, cursor)
    }

    /// Convenience for matching outside a tree walk: every ancestor is
    /// taken in the default state.
    pub fn matches_element(&self, doc: &Document, node: NodeId, state: State) -> bool {
        let elements = doc.element_path(node);
        let mut states = vec![State::DEFAULT; elements.len()];
        if let Some(last) = states.last_mut() {
            *last = state;
        }
        self.matches(&ElementPath::new(doc, &elements, &states), None)
    }

    fn matches_from(&self, path: &ElementPath<'_>, index: usize, cursor: Cursor) -> bool {
        let (compound, combinator) = &self.parts[index];
        if !compound.matches(path.doc, cursor.node, cursor.state) {
            return false;
        }
        if index == 0 {
            return true;
        }
        let next = index - 1;
        match combinator {
            Some(Combinator::Child) => match cursor.depth.checked_sub(1) {
                Some(parent) => self.matches_from(path, next, path.at(parent)),
                None => false,
            },
            Some(Combinator::AdjacentSibling) => {
                match path.doc.previous_element_sibling(cursor.node) {
                    Some(sibling) => {
                        let sibling_cursor = Cursor {
                            node: sibling,
                            state: State::DEFAULT,
                            depth: cursor.depth,
                        };
                        self.matches_from(path, next, sibling_cursor)
                    },
                    None => false,
                }
            },
            Some(Combinator::Descendant) | None => (0..cursor.depth)
                .rev()
                .any(|ancestor| self.matches_from(path, next, path.at(ancestor))),
        }
    }
}

impl ElementPath<'_> {
    fn at(&self, index: usize) -> Cursor {
        Cursor {
            node: self.elements[index],
            state: self.states[index],
            depth: index,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (compound, combinator) in &self.parts {
            match combinator {
                Some(Combinator::Descendant) => f.write_str(" ")?,
                Some(Combinator::Child) => f.write_str(" > ")?,
                Some(Combinator::AdjacentSibling) => f.write_str(" + ")?,
                None => {},
            }
            write!(f, "{compound}")?;
        }
        Ok(())
    }
}

// -------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestPage;

    fn class(c: &str) -> Condition {
        Condition::Class(c.into())
    }

    #[test]
    fn specificity_orders_id_class_name() {
        let id = Selector::new(Compound::any().with(Condition::Id("a".into())));
        let classes = Selector::new(Compound::any().with(class("b")).with(class("c")));
        let name = Selector::new(Compound::element("div"));
        assert!(id.specificity() > classes.specificity());
        assert!(classes.specificity() > name.specificity());
    }

    #[test]
    fn specificity_of_complex_selector() {
        // ul#nav li.active::first-line
        let sel = Selector::new(Compound::element("ul").with(Condition::Id("nav".into())))
            .descendant(
                Compound::element("li")
                    .with(class("active"))
                    .with_pseudo_element("first-line"),
            );
        let spec = sel.specificity();
        assert_eq!((spec.ids, spec.attributes, spec.names), (1, 1, 3));
    }

    #[test]
    fn unsupported_pseudo_class_is_rejected() {
        assert!(Condition::pseudo_class("hover").is_ok());
        assert!(Condition::pseudo_class("First-Child").is_ok());
        let err = Condition::pseudo_class("nth-child").unwrap_err();
        assert!(matches!(err, RestyleError::Selector(_)));
        assert!(Condition::pseudo_class("not").is_err());
    }

    #[test]
    fn attribute_conditions() {
        let mut page = TestPage::new();
        let p = page.element(
            page.body,
            "p",
            &[("title", "hello world"), ("lang", "en-GB"), ("empty", "")],
        );
        let doc = &page.doc;
        let s = State::DEFAULT;

        let present = Condition::Attribute { name: "TITLE".into(), value: None };
        assert!(present.matches(doc, p, s));
        let empty = Condition::Attribute { name: "empty".into(), value: None };
        assert!(!empty.matches(doc, p, s));
        let exact = Condition::Attribute { name: "title".into(), value: Some("hello".into()) };
        assert!(!exact.matches(doc, p, s));
        let word = Condition::OneOfAttribute { name: "title".into(), value: "world".into() };
        assert!(word.matches(doc, p, s));
        let hyphen = Condition::BeginHyphenAttribute { name: "lang".into(), value: "en".into() };
        assert!(hyphen.matches(doc, p, s));
        let wrong = Condition::BeginHyphenAttribute { name: "lang".into(), value: "e".into() };
        assert!(!wrong.matches(doc, p, s));
    }

    #[test]
    fn lang_uses_nearest_ancestor() {
        let mut page = TestPage::new();
        let div = page.element(page.body, "div", &[("lang", "fr-CA")]);
        let span = page.element(div, "span", &[]);
        let doc = &page.doc;
        assert!(Condition::Lang("fr".into()).matches(doc, span, State::DEFAULT));
        assert!(Condition::Lang("FR-ca".into()).matches(doc, span, State::DEFAULT));
        assert!(!Condition::Lang("fr-c".into()).matches(doc, span, State::DEFAULT));
        assert!(!Condition::Lang("en".into()).matches(doc, span, State::DEFAULT));
    }

    #[test]
    fn and_requires_both() {
        let mut page = TestPage::new();
        let p = page.element(page.body, "p", &[("class", "a b"), ("id", "x")]);
        let both = Condition::and(class("a"), Condition::Id("x".into()));
        let one = Condition::and(class("a"), Condition::Id("y".into()));
        assert!(both.matches(&page.doc, p, State::DEFAULT));
        assert!(!one.matches(&page.doc, p, State::DEFAULT));
    }

    #[test]
    fn link_and_visited_depend_on_state() {
        let mut page = TestPage::new();
        let a = page.element(page.body, "a", &[("href", "/")]);
        let p = page.element(page.body, "p", &[]);
        let visited = State::from_bits(State::VISITED);
        let link = Condition::PseudoClass(PseudoClass::Link);
        let vis = Condition::PseudoClass(PseudoClass::Visited);
        assert!(link.matches(&page.doc, a, State::DEFAULT));
        assert!(!link.matches(&page.doc, a, visited));
        assert!(vis.matches(&page.doc, a, visited));
        assert!(!vis.matches(&page.doc, p, visited));
    }

    #[test]
    fn descendant_and_child_combinators() {
        let mut page = TestPage::new();
        let div = page.element(page.body, "div", &[]);
        let section = page.element(div, "section", &[]);
        let p = page.element(section, "p", &[]);

        let descendant = Selector::new(Compound::element("div")).descendant(Compound::element("p"));
        let child = Selector::new(Compound::element("div")).child(Compound::element("p"));
        let grand = Selector::new(Compound::element("div"))
            .child(Compound::element("section"))
            .child(Compound::element("p"));
        let s = State::DEFAULT;
        assert!(descendant.matches_element(&page.doc, p, s));
        assert!(!child.matches_element(&page.doc, p, s));
        assert!(grand.matches_element(&page.doc, p, s));
    }

    #[test]
    fn descendant_backtracks_past_nearest_match() {
        // div > div p: the nearest div ancestor is not a child of a div,
        // the farther one is.
        let mut page = TestPage::new();
        let outer = page.element(page.body, "div", &[]);
        let inner = page.element(outer, "div", &[]);
        let span = page.element(inner, "span", &[]);
        let p = page.element(span, "p", &[]);
        let sel = Selector::new(Compound::element("body"))
            .child(Compound::element("div"))
            .descendant(Compound::element("p"));
        assert!(sel.matches_element(&page.doc, p, State::DEFAULT));
    }

    #[test]
    fn adjacent_sibling_skips_text() {
        let mut page = TestPage::new();
        let h1 = page.element(page.body, "h1", &[]);
        page.doc.append_text(page.body, "\n");
        let p = page.element(page.body, "p", &[]);
        let p2 = page.element(page.body, "p", &[]);
        let sel = Selector::new(Compound::element("h1")).adjacent(Compound::element("p"));
        assert!(sel.matches_element(&page.doc, p, State::DEFAULT));
        assert!(!sel.matches_element(&page.doc, p2, State::DEFAULT));
        assert!(!sel.matches_element(&page.doc, h1, State::DEFAULT));
    }

    #[test]
    fn first_child() {
        let mut page = TestPage::new();
        let a = page.element(page.body, "p", &[]);
        let b = page.element(page.body, "p", &[]);
        let first = Compound::element("p").with(Condition::PseudoClass(PseudoClass::FirstChild));
        let sel = Selector::new(first);
        assert!(sel.matches_element(&page.doc, a, State::DEFAULT));
        assert!(!sel.matches_element(&page.doc, b, State::DEFAULT));
    }

    #[test]
    fn ancestor_state_is_honoured() {
        let mut page = TestPage::new();
        let div = page.element(page.body, "div", &[]);
        let p = page.element(div, "p", &[]);
        let hovered_div = Compound::element("div").with(Condition::PseudoClass(PseudoClass::Hover));
        let sel = Selector::new(hovered_div).descendant(Compound::element("p"));

        let elements = [page.html, page.body, div, p];
        let plain = [State::DEFAULT; 4];
        let hovered = [
            State::DEFAULT,
            State::DEFAULT,
            State::from_bits(State::HOVERED),
            State::DEFAULT,
        ];
        assert!(!sel.matches(&ElementPath::new(&page.doc, &elements, &plain), None));
        assert!(sel.matches(&ElementPath::new(&page.doc, &elements, &hovered), None));
        assert_eq!(sel.state_bits(), State::HOVERED);
    }

    #[test]
    fn pseudo_element_only_matches_when_requested() {
        let mut page = TestPage::new();
        let p = page.element(page.body, "p", &[]);
        let sel = Selector::new(Compound::element("p").with_pseudo_element("first-letter"));
        let elements = [page.html, page.body, p];
        let states = [State::DEFAULT; 3];
        let path = ElementPath::new(&page.doc, &elements, &states);
        let first_letter = Ident::new("first-letter");
        assert!(!sel.matches(&path, None));
        assert!(sel.matches(&path, Some(&first_letter)));
        assert!(!Selector::new(Compound::element("p")).matches(&path, Some(&first_letter)));
    }

    #[test]
    fn tag_names_match_case_insensitively() {
        let mut page = TestPage::new();
        let p = page.element(page.body, "P", &[]);
        let sel = Selector::new(Compound::element("p"));
        assert!(sel.matches_element(&page.doc, p, State::DEFAULT));
        assert!(Selector::new(Compound::any()).matches_element(&page.doc, p, State::DEFAULT));
    }

    #[test]
    fn display_round_trips_to_css_text() {
        let sel = Selector::new(Compound::element("ul").with(Condition::Id("nav".into())))
            .child(Compound::any().with(class("item")))
            .adjacent(Compound::element("a").with(Condition::PseudoClass(PseudoClass::Hover)));
        assert_eq!(sel.to_string(), "ul#nav > .item + a:hover");
    }
}
