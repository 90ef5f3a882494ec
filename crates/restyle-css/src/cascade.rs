//! The CSS 2.1 cascade.
//!
//! [`RuleSetResolver`] turns the collected stylesheets into the ordered
//! list of declarations that apply to one element in one state. Candidates
//! are gathered from every origin, then stable-sorted by precedence bucket,
//! specificity and source order, so the last declaration of a property in
//! the resulting [`CssRuleSet`] is the one that wins.

use std::collections::HashMap;

use restyle_dom::NodeId;
use restyle_types::Ident;
use serde::{Deserialize, Serialize};

use crate::selector::{ElementPath, Selector};
use crate::specificity::Specificity;
use crate::stylesheet::{Rule, Stylesheet};
use crate::value::CssValue;

// -----------------------------------------------------------------------
// Inputs
// -----------------------------------------------------------------------

/// Where a declaration comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    UserAgent,
    User,
    Author,
}

impl Origin {
    /// Cascade bucket of a declaration, lowest first: user-agent, user
    /// normal, author normal, author important, user important.
    pub fn precedence(self, important: bool) -> u8 {
        match (self, important) {
            (Origin::UserAgent, _) => 0,
            (Origin::User, false) => 1,
            (Origin::Author, false) => 2,
            (Origin::Author, true) => 3,
            (Origin::User, true) => 4,
        }
    }
}

/// Every stylesheet that applies to a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleSources {
    #[serde(default)]
    pub user_agent: Stylesheet,
    #[serde(default)]
    pub user: Option<Stylesheet>,
    /// Author sheets in document order, imports before their importer.
    #[serde(default)]
    pub author: Vec<Stylesheet>,
    /// Declarations from `style` attributes.
    #[serde(default)]
    pub inline: HashMap<NodeId, Vec<Rule>>,
    /// Declarations translated from presentational HTML attributes.
    #[serde(default)]
    pub hints: HashMap<NodeId, Vec<Rule>>,
}

impl StyleSources {
    pub fn new(user_agent: Stylesheet) -> Self {
        Self {
            user_agent,
            ..Self::default()
        }
    }

    /// All sheets with their origin, in cascade input order.
    pub fn sheets(&self) -> impl Iterator<Item = (Origin, &Stylesheet)> {
        std::iter::once((Origin::UserAgent, &self.user_agent))
            .chain(self.user.iter().map(|s| (Origin::User, s)))
            .chain(self.author.iter().map(|s| (Origin::Author, s)))
    }

    /// State bits of every dynamic pseudo-class used by any sheet.
    pub fn referenced_states(&self) -> u8 {
        self.sheets()
            .fold(0, |bits, (_, sheet)| bits | sheet.referenced_states())
    }
}

// -----------------------------------------------------------------------
// Output
// -----------------------------------------------------------------------

/// One declaration together with its cascade metadata.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CssRule<'a> {
    pub rule: &'a Rule,
    pub specificity: Specificity,
    pub origin: Origin,
    /// Position of the declaring rule set in the cascade input.
    pub order: usize,
}

impl<'a> CssRule<'a> {
    pub fn name(&self) -> &'a Ident {
        &self.rule.name
    }

    pub fn value(&self) -> &'a CssValue {
        &self.rule.value
    }

    pub fn precedence(&self) -> u8 {
        self.origin.precedence(self.rule.important)
    }
}

/// The declarations applying to one element in one state, in ascending
/// cascade order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CssRuleSet<'a> {
    rules: Vec<CssRule<'a>>,
}

impl<'a> CssRuleSet<'a> {
    /// Sort candidates into cascade order. The sort is stable, so equal
    /// candidates keep their declaration order.
    pub fn from_candidates(mut rules: Vec<CssRule<'a>>) -> Self {
        rules.sort_by(|a, b| {
            a.precedence()
                .cmp(&b.precedence())
                .then_with(|| a.specificity.cmp(&b.specificity))
                .then_with(|| a.order.cmp(&b.order))
        });
        Self { rules }
    }

    /// Every matched declaration, lowest precedence first.
    pub fn rules(&self) -> &[CssRule<'a>] {
        &self.rules
    }

    pub fn iter(&self) -> impl Iterator<Item = &CssRule<'a>> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Index of the winning declaration for `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.rules.iter().rposition(|r| r.rule.name.is(name))
    }

    /// The winning declaration for `name`.
    pub fn get(&self, name: &str) -> Option<&'a Rule> {
        self.position(name).map(|i| self.rules[i].rule)
    }

    /// The winning value for `name`.
    pub fn value(&self, name: &str) -> Option<&'a CssValue> {
        self.get(name).map(|r| &r.value)
    }

    /// One declaration per property, the last of each in cascade order.
    /// The survivors keep their relative order.
    pub fn effective(&self) -> Vec<CssRule<'a>> {
        let mut last: HashMap<&Ident, usize> = HashMap::new();
        for (i, r) in self.rules.iter().enumerate() {
            last.insert(&r.rule.name, i);
        }
        self.rules
            .iter()
            .enumerate()
            .filter(|(i, r)| last.get(&r.rule.name) == Some(i))
            .map(|(_, r)| *r)
            .collect()
    }
}

impl<'r, 'a> IntoIterator for &'r CssRuleSet<'a> {
    type Item = &'r CssRule<'a>;
    type IntoIter = std::slice::Iter<'r, CssRule<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

// -----------------------------------------------------------------------
// Selector index
// -----------------------------------------------------------------------

/// A selector of a rule set, with the data needed to emit its rules.
#[derive(Debug, Clone, Copy)]
struct Candidate<'s> {
    order: usize,
    selector: &'s Selector,
    specificity: Specificity,
    rules: &'s [Rule],
}

/// One stylesheet's applicable rule sets, bucketed by subject element name.
#[derive(Debug)]
struct IndexedSheet<'s> {
    origin: Origin,
    by_tag: HashMap<&'s str, Vec<Candidate<'s>>>,
    any: Vec<Candidate<'s>>,
}

impl<'s> IndexedSheet<'s> {
    fn build(origin: Origin, sheet: &'s Stylesheet, media: &str, next_order: &mut usize) -> Self {
        let mut index = Self {
            origin,
            by_tag: HashMap::new(),
            any: Vec::new(),
        };
        for group in sheet.applicable_medias(media) {
            for pair in group.selector_rules() {
                let order = *next_order;
                *next_order += 1;
                for selector in &pair.selectors {
                    let candidate = Candidate {
                        order,
                        selector,
                        specificity: selector.specificity(),
                        rules: &pair.rules,
                    };
                    match selector.subject().and_then(|c| c.element.as_ref()) {
                        Some(tag) => index.by_tag.entry(tag.folded()).or_default().push(candidate),
                        None => index.any.push(candidate),
                    }
                }
            }
        }
        index
    }

    /// Candidates for an element name, merged back into source order.
    fn candidates<'c>(&'c self, tag: &str) -> impl Iterator<Item = &'c Candidate<'s>> {
        let tagged = self.by_tag.get(tag).map(Vec::as_slice).unwrap_or(&[]);
        let any = self.any.as_slice();
        let (mut i, mut j) = (0, 0);
        std::iter::from_fn(move || {
            let next = match (tagged.get(i), any.get(j)) {
                (Some(a), Some(b)) if a.order <= b.order => {
                    i += 1;
                    a
                },
                (_, Some(b)) => {
                    j += 1;
                    b
                },
                (Some(a), None) => {
                    i += 1;
                    a
                },
                (None, None) => return None,
            };
            Some(next)
        })
    }
}

// -----------------------------------------------------------------------
// Resolver
// -----------------------------------------------------------------------

/// Computes [`CssRuleSet`]s for elements of one document.
#[derive(Debug)]
pub struct RuleSetResolver<'s> {
    sheets: Vec<IndexedSheet<'s>>,
    /// Number of non-author sheets at the front of `sheets`.
    author_start: usize,
    inline: &'s HashMap<NodeId, Vec<Rule>>,
    hints: &'s HashMap<NodeId, Vec<Rule>>,
    hint_order: usize,
    inline_order: usize,
    referenced_states: u8,
}

impl<'s> RuleSetResolver<'s> {
    /// Index `sources` for the `media` output media. Groups of other media
    /// are dropped here and never tested.
    pub fn new(sources: &'s StyleSources, media: &str) -> Self {
        let mut next_order = 0;
        let mut sheets = Vec::new();
        sheets.push(IndexedSheet::build(
            Origin::UserAgent,
            &sources.user_agent,
            media,
            &mut next_order,
        ));
        if let Some(user) = &sources.user {
            sheets.push(IndexedSheet::build(Origin::User, user, media, &mut next_order));
        }
        let author_start = sheets.len();
        let hint_order = next_order;
        next_order += 1;
        for sheet in &sources.author {
            sheets.push(IndexedSheet::build(Origin::Author, sheet, media, &mut next_order));
        }
        log::debug!(
            "Indexed {} stylesheets ({} rule sets) for media `{media}`",
            sheets.len(),
            next_order - 1
        );
        Self {
            sheets,
            author_start,
            inline: &sources.inline,
            hints: &sources.hints,
            hint_order,
            inline_order: next_order,
            referenced_states: sources.referenced_states(),
        }
    }

    /// State bits referenced by any selector of the input.
    pub fn referenced_states(&self) -> u8 {
        self.referenced_states
    }

    /// Resolve the declarations for the last element of `path`.
    pub fn resolve(&self, path: &ElementPath<'_>) -> CssRuleSet<'s> {
        self.resolve_with(path, None)
    }

    /// Resolve the declarations for a pseudo-element (e.g. `first-line`)
    /// of the last element of `path`. Hints and `style` attributes do not
    /// apply to pseudo-elements.
    pub fn resolve_pseudo_element(&self, path: &ElementPath<'_>, pseudo: &Ident) -> CssRuleSet<'s> {
        self.resolve_with(path, Some(pseudo))
    }

    fn resolve_with(&self, path: &ElementPath<'_>, pseudo: Option<&Ident>) -> CssRuleSet<'s> {
        let Some(node) = path.subject() else {
            return CssRuleSet::default();
        };
        let Some(elem) = path.doc.element(node) else {
            return CssRuleSet::default();
        };
        let tag = elem.tag.folded();

        let mut matched = Vec::new();
        for (i, sheet) in self.sheets.iter().enumerate() {
            if i == self.author_start && pseudo.is_none() {
                self.push_hints(&mut matched, node);
            }
            collect_sheet(sheet, tag, path, pseudo, &mut matched);
        }
        if pseudo.is_none() {
            if self.author_start == self.sheets.len() {
                self.push_hints(&mut matched, node);
            }
            self.push_attribute_rules(
                &mut matched,
                self.inline.get(&node),
                Specificity::INLINE,
                self.inline_order,
            );
        }

        let set = CssRuleSet::from_candidates(matched);
        log::trace!("<{}>: {} declarations matched", elem.tag, set.len());
        set
    }

    fn push_hints(&self, out: &mut Vec<CssRule<'s>>, node: NodeId) {
        self.push_attribute_rules(out, self.hints.get(&node), Specificity::ZERO, self.hint_order);
    }

    fn push_attribute_rules(
        &self,
        out: &mut Vec<CssRule<'s>>,
        rules: Option<&'s Vec<Rule>>,
        specificity: Specificity,
        order: usize,
    ) {
        for rule in rules.into_iter().flatten() {
            out.push(CssRule {
                rule,
                specificity,
                origin: Origin::Author,
                order,
            });
        }
    }
}

/// Test one sheet's candidates for `tag` and emit the rules of every
/// matching rule set. When several selectors of one group match, the most
/// specific one counts.
fn collect_sheet<'s>(
    sheet: &IndexedSheet<'s>,
    tag: &str,
    path: &ElementPath<'_>,
    pseudo: Option<&Ident>,
    out: &mut Vec<CssRule<'s>>,
) {
    let mut pending: Option<Candidate<'s>> = None;
    for candidate in sheet.candidates(tag) {
        if !candidate.selector.matches(path, pseudo) {
            continue;
        }
        if let Some(current) = pending.as_mut()
            && current.order == candidate.order
        {
            current.specificity = current.specificity.max(candidate.specificity);
            continue;
        }
        if let Some(done) = pending.replace(*candidate) {
            emit(sheet.origin, &done, out);
        }
    }
    if let Some(done) = pending {
        emit(sheet.origin, &done, out);
    }
}

fn emit<'s>(origin: Origin, candidate: &Candidate<'s>, out: &mut Vec<CssRule<'s>>) {
    out.extend(candidate.rules.iter().map(|rule| CssRule {
        rule,
        specificity: candidate.specificity,
        origin,
        order: candidate.order,
    }));
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
