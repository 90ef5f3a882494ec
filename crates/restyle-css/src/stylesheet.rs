//! Stylesheet data model.
//!
//! This is the AST handed over by the CSS parser: a stylesheet groups its
//! contents by media, each media group holding rule sets, `@font-face` and
//! `@page` blocks and comments in source order.

use restyle_types::Ident;
use serde::{Deserialize, Serialize};

use crate::selector::Selector;
use crate::value::CssValue;

/// A single declaration, e.g. `color: red !important`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    pub name: Ident,
    pub value: CssValue,
    #[serde(default)]
    pub important: bool,
}

impl Rule {
    pub fn new(name: &str, value: impl Into<CssValue>) -> Self {
        Self {
            name: Ident::new(name),
            value: value.into(),
            important: false,
        }
    }

    /// Mark this declaration `!important`.
    pub fn important(mut self) -> Self {
        self.important = true;
        self
    }
}

/// A selector group and the declarations it applies, e.g. `h1, h2 { ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectorRulesPair {
    pub selectors: Vec<Selector>,
    pub rules: Vec<Rule>,
}

/// One node of a media group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaElement {
    SelectorRules(SelectorRulesPair),
    FontFace(Vec<Rule>),
    Page {
        #[serde(default)]
        pseudo: Option<Ident>,
        rules: Vec<Rule>,
    },
    Comment(String),
}

/// A named group of stylesheet contents (`@media print { ... }`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub name: Ident,
    #[serde(default)]
    pub elements: Vec<MediaElement>,
}

impl Media {
    /// Name of the group holding everything outside `@media` blocks.
    pub const ALL: &'static str = "all";

    pub fn new(name: &str) -> Self {
        Self {
            name: Ident::new(name),
            elements: Vec::new(),
        }
    }

    /// Whether this group applies when rendering for `active`.
    pub fn applies_to(&self, active: &str) -> bool {
        self.name.is(Self::ALL) || self.name.is(active)
    }

    /// The selector/rule pairs of this group in source order.
    pub fn selector_rules(&self) -> impl Iterator<Item = &SelectorRulesPair> {
        self.elements.iter().filter_map(|e| match e {
            MediaElement::SelectorRules(pair) => Some(pair),
            _ => None,
        })
    }
}

/// An `@import` statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportNode {
    pub uri: String,
    /// Media list; empty means every media.
    #[serde(default)]
    pub medias: Vec<Ident>,
}

impl ImportNode {
    pub fn applies_to(&self, active: &str) -> bool {
        media_list_applies(&self.medias, active)
    }
}

/// Whether a media list (`screen, print`) includes `active`. An empty list
/// applies everywhere.
pub fn media_list_applies(medias: &[Ident], active: &str) -> bool {
    medias.is_empty() || medias.iter().any(|m| m.is(Media::ALL) || m.is(active))
}

/// A parsed stylesheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stylesheet {
    /// Media groups in order of first appearance; names are unique.
    #[serde(default)]
    pub medias: Vec<Media>,
    #[serde(default)]
    pub imports: Vec<ImportNode>,
    /// Encoding the text was decoded with; informational only.
    #[serde(default)]
    pub encoding: Option<String>,
    /// Where the sheet was loaded from, for diagnostics.
    #[serde(default)]
    pub url: Option<String>,
}

impl Stylesheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The group with the given name, if present.
    pub fn media(&self, name: &str) -> Option<&Media> {
        self.medias.iter().find(|m| m.name.is(name))
    }

    /// The group with the given name, created on first use.
    pub fn media_mut(&mut self, name: &str) -> &mut Media {
        let index = match self.medias.iter().position(|m| m.name.is(name)) {
            Some(index) => index,
            None => {
                self.medias.push(Media::new(name));
                self.medias.len() - 1
            },
        };
        &mut self.medias[index]
    }

    /// Append a rule set to the `all` group.
    pub fn add_rules(&mut self, selectors: Vec<Selector>, rules: Vec<Rule>) {
        self.add_media_rules(Media::ALL, selectors, rules);
    }

    /// Append a rule set to a named media group.
    pub fn add_media_rules(&mut self, media: &str, selectors: Vec<Selector>, rules: Vec<Rule>) {
        self.media_mut(media)
            .elements
            .push(MediaElement::SelectorRules(SelectorRulesPair { selectors, rules }));
    }

    /// Builder-style variant of [`Stylesheet::add_rules`].
    pub fn with_rules(mut self, selectors: Vec<Selector>, rules: Vec<Rule>) -> Self {
        self.add_rules(selectors, rules);
        self
    }

    pub fn add_import(&mut self, uri: &str, medias: &[&str]) {
        self.imports.push(ImportNode {
            uri: uri.to_string(),
            medias: medias.iter().map(|m| Ident::new(*m)).collect(),
        });
    }

    /// Media groups that apply to the `active` output media.
    pub fn applicable_medias<'a>(&'a self, active: &str) -> impl Iterator<Item = &'a Media> {
        self.medias.iter().filter(move |m| m.applies_to(active))
    }

    /// State bits of every dynamic pseudo-class used by any selector.
    pub fn referenced_states(&self) -> u8 {
        self.medias
            .iter()
            .flat_map(Media::selector_rules)
            .flat_map(|pair| pair.selectors.iter())
            .fold(0, |bits, sel| bits | sel.state_bits())
    }

    /// Total number of declarations across all rule sets.
    pub fn rule_count(&self) -> usize {
        self.medias
            .iter()
            .flat_map(Media::selector_rules)
            .map(|pair| pair.rules.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::{Compound, Condition, PseudoClass};
    use crate::state::State;

    fn p() -> Selector {
        Selector::new(Compound::element("p"))
    }

    #[test]
    fn rule_equality_covers_all_fields() {
        let a = Rule::new("Color", CssValue::ident("red"));
        assert_eq!(a, Rule::new("color", CssValue::ident("RED")));
        assert_ne!(a, a.clone().important());
        assert_ne!(a, Rule::new("color", CssValue::ident("blue")));
    }

    #[test]
    fn media_groups_are_created_once() {
        let mut sheet = Stylesheet::new();
        sheet.add_rules(vec![p()], vec![Rule::new("color", CssValue::ident("red"))]);
        let black = Rule::new("color", CssValue::ident("black"));
        sheet.add_media_rules("Print", vec![p()], vec![black]);
        sheet.add_media_rules("print", vec![p()], vec![]);
        assert_eq!(sheet.medias.len(), 2);
        assert_eq!(sheet.media("PRINT").unwrap().elements.len(), 2);
        assert_eq!(sheet.rule_count(), 2);
    }

    #[test]
    fn applicable_medias_include_all() {
        let mut sheet = Stylesheet::new();
        sheet.add_media_rules("screen", vec![p()], vec![]);
        sheet.add_media_rules("print", vec![p()], vec![]);
        sheet.add_rules(vec![p()], vec![]);
        let names: Vec<_> = sheet
            .applicable_medias("screen")
            .map(|m| m.name.to_string())
            .collect();
        assert_eq!(names, ["screen", "all"]);
    }

    #[test]
    fn import_media_lists() {
        let mut sheet = Stylesheet::new();
        sheet.add_import("a.css", &[]);
        sheet.add_import("b.css", &["print"]);
        sheet.add_import("c.css", &["Screen", "print"]);
        let applies: Vec<_> = sheet.imports.iter().map(|i| i.applies_to("screen")).collect();
        assert_eq!(applies, [true, false, true]);
    }

    #[test]
    fn non_rule_elements_are_kept_but_not_matched() {
        let mut sheet = Stylesheet::new();
        let all = sheet.media_mut(Media::ALL);
        all.elements.push(MediaElement::Comment("banner".into()));
        all.elements.push(MediaElement::FontFace(vec![Rule::new(
            "font-family",
            CssValue::ident("Foo"),
        )]));
        all.elements.push(MediaElement::Page {
            pseudo: None,
            rules: vec![],
        });
        assert_eq!(sheet.media(Media::ALL).unwrap().selector_rules().count(), 0);
        assert_eq!(sheet.rule_count(), 0);
    }

    #[test]
    fn referenced_states_collects_pseudo_classes() {
        let sheet = Stylesheet::new()
            .with_rules(
                vec![Selector::new(
                    Compound::element("a").with(Condition::PseudoClass(PseudoClass::Visited)),
                )],
                vec![],
            )
            .with_rules(
                vec![Selector::new(
                    Compound::any().with(Condition::PseudoClass(PseudoClass::Focus)),
                )],
                vec![],
            );
        assert_eq!(sheet.referenced_states(), State::VISITED | State::FOCUSED);
    }

    #[test]
    fn deserializes_from_json() {
        let json = r#"{
            "medias": [{
                "name": "all",
                "elements": [{"selector_rules": {
                    "selectors": [{"parts": [[{"element": "p"}, null]]}],
                    "rules": [{"name": "color", "value": [{"ident": "red"}]}]
                }}]
            }],
            "imports": [{"uri": "x.css", "medias": ["print"]}]
        }"#;
        let sheet: Stylesheet = serde_json::from_str(json).unwrap();
        assert_eq!(sheet.rule_count(), 1);
        assert!(!sheet.imports[0].applies_to("screen"));
        assert_eq!(sheet.encoding, None);
    }
}
