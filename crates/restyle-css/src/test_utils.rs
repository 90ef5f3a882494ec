//! Builders shared by the unit tests.

use restyle_dom::{Document, ElementData, NodeId};

use crate::cascade::{CssRule, CssRuleSet, Origin};
use crate::selector::{Compound, Selector};
use crate::specificity::Specificity;
use crate::stylesheet::{Rule, Stylesheet};
use crate::value::{CssValue, Term, Unit};

/// A document pre-populated with `<html><body></body></html>`.
pub struct TestPage {
    pub doc: Document,
    pub html: NodeId,
    pub body: NodeId,
}

impl TestPage {
    pub fn new() -> Self {
        let mut doc = Document::new();
        let html = doc.append_element(doc.root, ElementData::new("html"));
        let body = doc.append_element(html, ElementData::new("body"));
        Self { doc, html, body }
    }

    /// Append an element with the given attributes under `parent`.
    pub fn element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let mut data = ElementData::new(tag);
        for (name, value) in attrs {
            data = data.with_attribute(*name, *value);
        }
        self.doc.append_element(parent, data)
    }
}

/// `tag { rules }`
pub fn tag_rule(tag: &str, rules: Vec<Rule>) -> (Vec<Selector>, Vec<Rule>) {
    (vec![Selector::new(Compound::element(tag))], rules)
}

/// A stylesheet from a list of selector groups.
pub fn sheet(groups: Vec<(Vec<Selector>, Vec<Rule>)>) -> Stylesheet {
    let mut sheet = Stylesheet::new();
    for (selectors, rules) in groups {
        sheet.add_rules(selectors, rules);
    }
    sheet
}

pub fn ident(name: &str) -> CssValue {
    CssValue::ident(name)
}

pub fn dim(value: f32, unit: Unit) -> CssValue {
    CssValue::from(Term::Dimension(value, unit))
}

pub fn decl(name: &str, value: CssValue) -> Rule {
    Rule::new(name, value)
}

/// A rule set holding `rules` as author declarations in the given order.
pub fn rule_set(rules: &[Rule]) -> CssRuleSet<'_> {
    CssRuleSet::from_candidates(
        rules
            .iter()
            .enumerate()
            .map(|(order, rule)| CssRule {
                rule,
                specificity: Specificity::ZERO,
                origin: Origin::Author,
                order,
            })
            .collect(),
    )
}
