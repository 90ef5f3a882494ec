//! Stylesheet collection.
//!
//! Gathers every stylesheet that applies to a page: `<link>` and `<style>`
//! elements, the `link`/`vlink`/`alink` colours of `<body>`, `@import`
//! chains, `style` attributes and presentational hints. Network access and
//! CSS parsing are injected through [`StylesheetFetcher`] and
//! [`StylesheetParser`]; failures are logged and the sheet is skipped.
//!
//! Independent sheets are fetched in parallel, but the result is always in
//! document order, with each sheet's imports placed before the sheet that
//! imports them.

use std::collections::HashMap;

use rayon::prelude::*;
use restyle_dom::{Document, ElementData, NodeId};
use restyle_types::{Ident, ResolverConfig, Result};

use crate::cascade::StyleSources;
use crate::default::user_agent_stylesheet;
use crate::hints::presentational_hints;
use crate::selector::{Compound, Condition, PseudoClass, Selector};
use crate::stylesheet::{Rule, Stylesheet, media_list_applies};
use crate::value::{CssValue, Term};

// -----------------------------------------------------------------------
// Collaborators
// -----------------------------------------------------------------------

/// A downloaded stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedStylesheet {
    /// Final URL, after resolution against the base and redirects.
    pub url: String,
    pub text: String,
    /// Charset announced by the server, if any.
    pub encoding: Option<String>,
}

/// Retrieves linked and imported stylesheets.
pub trait StylesheetFetcher: Send + Sync {
    /// Fetch `href`, resolved against `base` when it is relative.
    fn fetch(&self, base: Option<&str>, href: &str) -> Result<FetchedStylesheet>;
}

/// Turns CSS text into the stylesheet model.
pub trait StylesheetParser: Send + Sync {
    fn parse_stylesheet(&self, text: &str, encoding: Option<&str>) -> Result<Stylesheet>;

    /// The contents of a `style` attribute.
    fn parse_declarations(&self, text: &str) -> Result<Vec<Rule>>;
}

// -----------------------------------------------------------------------
// Collector
// -----------------------------------------------------------------------

/// A source of author styles found in the document, in document order.
#[derive(Debug)]
enum Slot {
    Link { href: String },
    Style { text: String },
    Ready(Stylesheet),
}

/// Where an `@import` chain currently stands.
#[derive(Debug, Clone, Copy)]
struct ImportScope<'a> {
    base: Option<&'a str>,
    encoding: Option<&'a str>,
    /// URLs of the sheets being imported, outermost first.
    chain: &'a [String],
}

pub struct StylesheetCollector<'a> {
    fetcher: &'a dyn StylesheetFetcher,
    parser: &'a dyn StylesheetParser,
    media: String,
    max_import_depth: usize,
    user_agent: Stylesheet,
    user: Option<Stylesheet>,
}

impl<'a> StylesheetCollector<'a> {
    pub fn new(
        fetcher: &'a dyn StylesheetFetcher,
        parser: &'a dyn StylesheetParser,
        config: &ResolverConfig,
    ) -> Self {
        Self {
            fetcher,
            parser,
            media: config.media.clone(),
            max_import_depth: config.max_import_depth,
            user_agent: user_agent_stylesheet(),
            user: None,
        }
    }

    pub fn with_user_agent(mut self, sheet: Stylesheet) -> Self {
        self.user_agent = sheet;
        self
    }

    pub fn with_user(mut self, sheet: Stylesheet) -> Self {
        self.user = Some(sheet);
        self
    }

    /// Collect everything that styles `doc`.
    pub fn collect(&self, doc: &Document) -> StyleSources {
        let elements = doc.elements_in_order(doc.root);
        let base = elements
            .iter()
            .filter_map(|&id| doc.element(id))
            .find(|e| e.is("base"))
            .and_then(|e| e.get_attribute("href"))
            .map(|href| href.trim().to_string());
        let preferred = preferred_title(doc, &elements);

        let slots: Vec<Slot> = elements
            .iter()
            .filter_map(|&id| Some((id, doc.element(id)?)))
            .filter_map(|(id, elem)| self.slot(doc, id, elem, preferred.as_deref()))
            .collect();

        let scope = ImportScope {
            base: base.as_deref(),
            encoding: doc.encoding.as_deref(),
            chain: &[],
        };
        let author: Vec<Stylesheet> = slots
            .par_iter()
            .map(|slot| self.load_slot(slot, scope))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect();

        let inline = self.inline_styles(doc, &elements);
        let hints = presentational_hints(doc);
        log::debug!(
            "Collected {} author sheets, {} inline styles, {} hinted elements",
            author.len(),
            inline.len(),
            hints.len()
        );

        StyleSources {
            user_agent: self.user_agent.clone(),
            user: self.user.clone(),
            author,
            inline,
            hints,
        }
    }

    fn slot(
        &self,
        doc: &Document,
        id: NodeId,
        elem: &ElementData,
        preferred: Option<&str>,
    ) -> Option<Slot> {
        if elem.is("link") {
            if !is_css(elem) || !self.media_applies(elem) {
                return None;
            }
            let rel = LinkRel::of(elem)?;
            let title = elem.get_attribute("title").map(str::trim).filter(|t| !t.is_empty());
            let keep = match (rel, title) {
                (LinkRel::Alternate, _) => false,
                (LinkRel::Stylesheet, None) => true,
                (LinkRel::Stylesheet, Some(title)) => {
                    preferred.is_some_and(|p| p.eq_ignore_ascii_case(title))
                },
            };
            let href = elem.get_attribute("href").map(str::trim).filter(|h| !h.is_empty())?;
            if !keep {
                log::debug!("Skipping alternate stylesheet {href}");
                return None;
            }
            return Some(Slot::Link { href: href.to_string() });
        }
        if elem.is("style") {
            if !is_css(elem) || !self.media_applies(elem) {
                return None;
            }
            let text = doc.text_content(id);
            return (!text.trim().is_empty()).then_some(Slot::Style { text });
        }
        if elem.is("body") {
            return body_link_colours(elem).map(Slot::Ready);
        }
        None
    }

    fn media_applies(&self, elem: &ElementData) -> bool {
        let medias: Vec<Ident> = elem
            .get_attribute("media")
            .unwrap_or_default()
            .split([' ', ','])
            .filter(|m| !m.is_empty())
            .map(Ident::new)
            .collect();
        media_list_applies(&medias, &self.media)
    }

    fn load_slot(&self, slot: &Slot, scope: ImportScope<'_>) -> Vec<Stylesheet> {
        match slot {
            Slot::Link { href } => self.import(href, scope),
            Slot::Style { text } => match self.parser.parse_stylesheet(text, scope.encoding) {
                Ok(sheet) => self.with_imports(sheet, scope),
                Err(e) => {
                    log::warn!("Cannot parse <style> content: {e}");
                    Vec::new()
                },
            },
            Slot::Ready(sheet) => vec![sheet.clone()],
        }
    }

    /// Fetch and parse one linked or imported sheet, then its imports.
    fn import(&self, href: &str, scope: ImportScope<'_>) -> Vec<Stylesheet> {
        if href.starts_with("mailto:") {
            return Vec::new();
        }
        if scope.chain.len() > self.max_import_depth {
            log::warn!("Import depth limit {} reached at {href}", self.max_import_depth);
            return Vec::new();
        }
        let fetched = match self.fetcher.fetch(scope.base, href) {
            Ok(fetched) => fetched,
            Err(e) => {
                log::warn!("Cannot get stylesheet {href}: {e}");
                return Vec::new();
            },
        };
        if scope.chain.contains(&fetched.url) {
            log::warn!("Import cycle through {}", fetched.url);
            return Vec::new();
        }
        let encoding = fetched.encoding.as_deref().or(scope.encoding);
        let mut sheet = match self.parser.parse_stylesheet(&fetched.text, encoding) {
            Ok(sheet) => sheet,
            Err(e) => {
                log::warn!("Cannot parse stylesheet {}: {e}", fetched.url);
                return Vec::new();
            },
        };
        if sheet.url.is_none() {
            sheet.url = Some(fetched.url.clone());
        }
        if sheet.encoding.is_none() {
            sheet.encoding = encoding.map(str::to_string);
        }

        let mut chain = scope.chain.to_vec();
        chain.push(fetched.url.clone());
        let inner = ImportScope {
            base: Some(&fetched.url),
            encoding: sheet.encoding.as_deref(),
            chain: &chain,
        };
        let imported = self.imports_of(&sheet, inner);
        imported.into_iter().chain(std::iter::once(sheet)).collect()
    }

    /// A parsed inline sheet preceded by its imports.
    fn with_imports(&self, sheet: Stylesheet, scope: ImportScope<'_>) -> Vec<Stylesheet> {
        let mut out = self.imports_of(&sheet, scope);
        out.push(sheet);
        out
    }

    fn imports_of(&self, sheet: &Stylesheet, scope: ImportScope<'_>) -> Vec<Stylesheet> {
        sheet
            .imports
            .par_iter()
            .filter(|import| import.applies_to(&self.media))
            .map(|import| self.import(&import.uri, scope))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect()
    }

    fn inline_styles(&self, doc: &Document, elements: &[NodeId]) -> HashMap<NodeId, Vec<Rule>> {
        let mut inline = HashMap::new();
        for &id in elements {
            let Some(style) = doc.element(id).and_then(|e| e.get_attribute("style")) else {
                continue;
            };
            if style.trim().is_empty() {
                continue;
            }
            match self.parser.parse_declarations(style) {
                Ok(rules) if !rules.is_empty() => {
                    inline.insert(id, rules);
                },
                Ok(_) => {},
                Err(e) => log::warn!("Cannot parse style attribute {style:?}: {e}"),
            }
        }
        inline
    }
}

// -----------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkRel {
    Stylesheet,
    Alternate,
}

impl LinkRel {
    fn of(elem: &ElementData) -> Option<LinkRel> {
        let rel = elem.get_attribute("rel")?;
        let mut tokens = rel.split_ascii_whitespace();
        if !tokens.clone().any(|t| t.eq_ignore_ascii_case("stylesheet")) {
            return None;
        }
        if tokens.any(|t| t.eq_ignore_ascii_case("alternate")) {
            Some(LinkRel::Alternate)
        } else {
            Some(LinkRel::Stylesheet)
        }
    }
}

/// `type` absent or `text/css`.
fn is_css(elem: &ElementData) -> bool {
    elem.get_attribute("type")
        .map(str::trim)
        .is_none_or(|t| t.is_empty() || t.eq_ignore_ascii_case("text/css"))
}

/// The preferred stylesheet set: `<meta http-equiv="Default-Style">`, else
/// the title of the first titled, non-alternate stylesheet link.
fn preferred_title(doc: &Document, elements: &[NodeId]) -> Option<String> {
    let elems = || elements.iter().filter_map(|&id| doc.element(id));
    let meta = elems()
        .filter(|e| e.is("meta"))
        .find(|e| {
            e.get_attribute("http-equiv")
                .is_some_and(|h| h.trim().eq_ignore_ascii_case("default-style"))
        })
        .and_then(|e| e.get_attribute("content"));
    if let Some(title) = meta {
        return Some(title.trim().to_string());
    }
    elems()
        .filter(|e| e.is("link") && LinkRel::of(e) == Some(LinkRel::Stylesheet))
        .find_map(|e| e.get_attribute("title").map(str::trim).filter(|t| !t.is_empty()))
        .map(str::to_string)
}

/// `<body link vlink alink>` as `a:link`, `a:visited` and `a:active` rules.
fn body_link_colours(body: &ElementData) -> Option<Stylesheet> {
    let mut sheet = Stylesheet::new();
    for (attr, pseudo) in [
        ("alink", PseudoClass::Active),
        ("link", PseudoClass::Link),
        ("vlink", PseudoClass::Visited),
    ] {
        let Some(colour) = body.get_attribute(attr).map(str::trim).filter(|c| !c.is_empty()) else {
            continue;
        };
        let value = match colour.strip_prefix('#') {
            Some(hex) => CssValue::from(Term::Hash(hex.to_ascii_lowercase())),
            None => CssValue::ident(&colour.to_ascii_lowercase()),
        };
        let selector = Selector::new(Compound::element("a").with(Condition::PseudoClass(pseudo)));
        sheet.add_rules(vec![selector], vec![Rule::new("color", value)]);
    }
    (sheet.rule_count() > 0).then_some(sheet)
}
