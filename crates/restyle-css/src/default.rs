//! Built-in user-agent stylesheet.

use crate::selector::{Compound, Condition, PseudoClass, Selector};
use crate::stylesheet::{Rule, Stylesheet};
use crate::value::{CssValue, Term, Unit};

/// Element groups and their declarations, following CSS 2.1 defaults.
const ELEMENT_RULES: &[(&[&str], &[(&str, &str)])] = &[
    (&["b", "strong", "th"], &[("font-weight", "bold")]),
    (&["i", "em", "cite", "var", "address", "dfn"], &[("font-style", "italic")]),
    (&["h1"], &[("font-size", "2em"), ("font-weight", "bold")]),
    (&["h2"], &[("font-size", "1.5em"), ("font-weight", "bold")]),
    (&["h3"], &[("font-size", "1.17em"), ("font-weight", "bold")]),
    (&["h4"], &[("font-weight", "bold")]),
    (&["h5"], &[("font-size", "0.83em"), ("font-weight", "bold")]),
    (&["h6"], &[("font-size", "0.67em"), ("font-weight", "bold")]),
    (&["pre", "code", "kbd", "samp", "tt"], &[("font-family", "monospace")]),
    (&["small", "sub", "sup"], &[("font-size", "smaller")]),
    (&["big"], &[("font-size", "larger")]),
    (&["u", "ins"], &[("text-decoration", "underline")]),
    (&["s", "strike", "del"], &[("text-decoration", "line-through")]),
    (&["center"], &[("text-align", "center")]),
];

const LINK_COLOUR: &str = "#0000ee";
const VISITED_COLOUR: &str = "#551a8b";

/// The default stylesheet applied with user-agent origin.
pub fn user_agent_stylesheet() -> Stylesheet {
    let mut sheet = Stylesheet::new();
    sheet.url = Some("about:user-agent".to_string());
    for (tags, declarations) in ELEMENT_RULES {
        let selectors = tags.iter().map(|t| Selector::new(Compound::element(t))).collect();
        let rules = declarations
            .iter()
            .map(|(name, value)| Rule::new(name, parse_value(value)))
            .collect();
        sheet.add_rules(selectors, rules);
    }
    let links = [
        (PseudoClass::Link, LINK_COLOUR),
        (PseudoClass::Visited, VISITED_COLOUR),
    ];
    for (pseudo, colour) in links {
        let anchor = Selector::new(Compound::element("a").with(Condition::PseudoClass(pseudo)));
        sheet.add_rules(
            vec![anchor],
            vec![
                Rule::new("color", parse_value(colour)),
                Rule::new("text-decoration", CssValue::ident("underline")),
            ],
        );
    }
    sheet
}

/// Values in the table above: `1.5em`, `#rrggbb` or a keyword.
fn parse_value(text: &str) -> CssValue {
    if let Some(hex) = text.strip_prefix('#') {
        return Term::Hash(hex.to_string()).into();
    }
    if let Some(number) = text.strip_suffix("em")
        && let Ok(value) = number.parse::<f32>()
    {
        return Term::Dimension(value, Unit::Em).into();
    }
    CssValue::ident(text)
}
