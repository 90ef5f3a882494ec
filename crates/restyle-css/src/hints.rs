//! Presentational hints.
//!
//! Legacy HTML attributes such as `bgcolor` or `<font size>` are turned
//! into plain declarations. The cascade treats them as author rules of zero
//! specificity placed before every author stylesheet, so any author rule
//! overrides them.

use std::collections::HashMap;

use restyle_dom::{Document, ElementData, NodeId, NodeKind};

use crate::stylesheet::Rule;
use crate::value::{CssValue, Term, Unit};

/// Hint declarations for every element of `doc` that carries any.
pub fn presentational_hints(doc: &Document) -> HashMap<NodeId, Vec<Rule>> {
    let hints: HashMap<_, _> = doc
        .nodes
        .iter()
        .enumerate()
        .filter_map(|(id, node)| match &node.kind {
            NodeKind::Element(elem) => Some((id, element_hints(elem))),
            _ => None,
        })
        .filter(|(_, rules)| !rules.is_empty())
        .collect();
    log::debug!("Presentational hints on {} elements", hints.len());
    hints
}

/// Hint declarations of a single element, in a fixed attribute order.
pub fn element_hints(elem: &ElementData) -> Vec<Rule> {
    let mut rules = Vec::new();
    let attr = |name: &str| elem.get_attribute(name).map(str::trim).filter(|v| !v.is_empty());

    if let Some(value) = attr("height").and_then(length) {
        rules.push(Rule::new("height", value));
    }
    if let Some(value) = attr("width").and_then(length) {
        rules.push(Rule::new("width", value));
    }
    if let Some(value) = attr("hspace").and_then(length) {
        rules.push(Rule::new("margin-left", value.clone()));
        rules.push(Rule::new("margin-right", value));
    }
    if let Some(value) = attr("vspace").and_then(length) {
        rules.push(Rule::new("margin-top", value.clone()));
        rules.push(Rule::new("margin-bottom", value));
    }
    if let Some(value) = attr("color") {
        rules.push(Rule::new("color", colour(value)));
    }
    if let Some(value) = attr("bgcolor") {
        rules.push(Rule::new("background-color", colour(value)));
    }
    if let Some(value) = attr("background") {
        rules.push(Rule::new("background-image", Term::Uri(value.to_string())));
    }
    if let Some(value) = attr("size") {
        if elem.is("font") {
            if let Some(size) = font_size(value) {
                rules.push(Rule::new("font-size", size));
            }
        } else if elem.is("hr")
            && let Some(height) = length(value)
        {
            rules.push(Rule::new("height", height));
        }
    }
    if let Some(value) = attr("face") {
        rules.push(Rule::new("font-family", family_list(value)));
    }
    if let Some(value) = attr("align") {
        rules.push(Rule::new("text-align", CssValue::ident(&value.to_ascii_lowercase())));
    }
    if let Some(value) = attr("valign") {
        rules.push(Rule::new("vertical-align", CssValue::ident(&value.to_ascii_lowercase())));
    }
    if elem.get_attribute("nowrap").is_some() {
        rules.push(Rule::new("white-space", CssValue::ident("nowrap")));
    }
    if let Some(value) = attr("clear") {
        let clear = if value.eq_ignore_ascii_case("all") { "both" } else { value };
        rules.push(Rule::new("clear", CssValue::ident(&clear.to_ascii_lowercase())));
    }
    if elem.is("iframe") {
        if let Some(value) = attr("marginheight").and_then(length) {
            rules.push(Rule::new("margin-top", value.clone()));
            rules.push(Rule::new("margin-bottom", value));
        }
        if let Some(value) = attr("marginwidth").and_then(length) {
            rules.push(Rule::new("margin-left", value.clone()));
            rules.push(Rule::new("margin-right", value));
        }
    }
    if let Some(value) = attr("border").and_then(length) {
        rules.push(Rule::new("border-width", value));
    }
    if elem.is("body")
        && let Some(value) = attr("text")
    {
        rules.push(Rule::new("color", colour(value)));
    }
    if (elem.is("ul") || elem.is("ol") || elem.is("li"))
        && let Some(value) = attr("type")
    {
        rules.push(Rule::new("list-style-type", CssValue::ident(list_style(value))));
    }
    rules
}

// -------------------------------------------------------------------
// Attribute values
// -------------------------------------------------------------------

/// An HTML length: bare numbers are pixels, `N%` a percentage.
fn length(value: &str) -> Option<CssValue> {
    if let Some(percent) = value.strip_suffix('%') {
        return percent.trim().parse::<f32>().ok().map(|p| Term::Percentage(p).into());
    }
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number
        .parse::<f32>()
        .ok()
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| Term::Dimension(n, Unit::Px).into())
}

/// `#rrggbb`, a bare hex triplet or a colour name.
fn colour(value: &str) -> CssValue {
    if let Some(hex) = value.strip_prefix('#') {
        return Term::Hash(hex.to_ascii_lowercase()).into();
    }
    if matches!(value.len(), 3 | 6) && value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Term::Hash(value.to_ascii_lowercase()).into();
    }
    CssValue::ident(&value.to_ascii_lowercase())
}

/// `<font size>`: 1 to 7 absolute, `+n`/`-n` relative to the default of 3.
fn font_size(value: &str) -> Option<CssValue> {
    const KEYWORDS: [&str; 7] = [
        "x-small", "small", "medium", "large", "x-large", "xx-large", "xx-large",
    ];
    let size: i32 = match value.as_bytes().first() {
        Some(b'+') => value[1..].trim().parse::<i32>().ok()?.saturating_add(3),
        Some(b'-') => 3i32.saturating_sub(value[1..].trim().parse().ok()?),
        _ => value.parse().ok()?,
    };
    let index = usize::try_from(size.clamp(1, 7) - 1).ok()?;
    Some(CssValue::ident(KEYWORDS[index]))
}

/// `face="Arial, Times New Roman"` as a comma separated family list.
fn family_list(value: &str) -> CssValue {
    let mut terms = Vec::new();
    for family in value.split(',').map(str::trim).filter(|f| !f.is_empty()) {
        if !terms.is_empty() {
            terms.push(Term::Comma);
        }
        terms.extend(family.split_whitespace().map(Term::ident));
    }
    CssValue::new(terms)
}

fn list_style(value: &str) -> &str {
    match value {
        "1" => "decimal",
        "a" => "lower-alpha",
        "A" => "upper-alpha",
        "i" => "lower-roman",
        "I" => "upper-roman",
        other => other,
    }
}
