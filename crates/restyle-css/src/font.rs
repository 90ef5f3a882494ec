//! Effective font computation.
//!
//! The font is the most involved derived property: the `font` shorthand
//! expands into six longhands, sizes and line heights come in several
//! units, and `bolder`/`lighter`/`larger`/`smaller`/`em` are relative to the
//! parent element's font. [`FontProcessor`] computes a fresh [`Font`] per
//! element from the parent's copy.

use restyle_types::Ident;
use serde::Serialize;

use crate::cascade::CssRuleSet;
use crate::processor::{ProcessContext, Processor};
use crate::properties::{Properties, PropertyValue};
use crate::value::{CssValue, Term, Unit};

pub const DEFAULT_FAMILY: &str = "sans serif";
pub const DEFAULT_SIZE: i32 = 12;
pub const DEFAULT_WEIGHT: u16 = 400;
pub const DEFAULT_LINE_HEIGHT: f32 = 1.1;
pub const MIN_SIZE: i32 = 8;
pub const MAX_SIZE: i32 = 18;

/// Ratio between adjacent sizes for `larger` and `smaller`.
const SIZE_STEP: f32 = 1.15;
/// Size factor of the small system fonts (`icon`, `status-bar`, ...).
const SMALL_SYSTEM_FONT: f32 = 0.8;

const PT_PER_PX: f32 = 0.75;
const PT_PER_PC: f32 = 12.0;
const PT_PER_IN: f32 = 72.0;
const CM_PER_IN: f32 = 2.54;
const MM_PER_IN: f32 = 25.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontVariant {
    #[default]
    Normal,
    SmallCaps,
}

/// The computed font of one element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
    /// Family names in order of preference.
    pub family: Vec<String>,
    pub style: FontStyle,
    pub variant: FontVariant,
    /// 100 to 900 in steps of 100.
    pub weight: u16,
    /// Points, clamped to `MIN_SIZE..=MAX_SIZE`.
    pub size: i32,
    /// Multiple of `size`.
    pub line_height: f32,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            family: vec![DEFAULT_FAMILY.to_string()],
            style: FontStyle::Normal,
            variant: FontVariant::Normal,
            weight: DEFAULT_WEIGHT,
            size: DEFAULT_SIZE,
            line_height: DEFAULT_LINE_HEIGHT,
        }
    }
}

impl Font {
    /// Key the computed font is stored under in [`Properties`].
    pub const KEY: &'static str = "font";

    /// Line height in points.
    pub fn get_line_height(&self) -> i32 {
        (self.size as f32 * self.line_height).round() as i32
    }

    pub fn is_bold(&self) -> bool {
        self.weight >= 600
    }
}

/// Next heavier weight for `bolder`.
pub fn bolder(weight: u16) -> u16 {
    match weight {
        0..=300 => 400,
        400 | 500 => 700,
        _ => 900,
    }
}

/// Next lighter weight for `lighter`.
pub fn lighter(weight: u16) -> u16 {
    match weight {
        0..=500 => 100,
        600 | 700 => 400,
        _ => 700,
    }
}

// -------------------------------------------------------------------
// Processor
// -------------------------------------------------------------------

/// Computes the effective [`Font`] of every element.
#[derive(Debug, Clone)]
pub struct FontProcessor {
    key: Ident,
}

impl FontProcessor {
    pub fn new() -> Self {
        Self {
            key: Ident::new(Font::KEY),
        }
    }
}

impl Default for FontProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for FontProcessor {
    fn key(&self) -> &Ident {
        &self.key
    }

    fn process(&self, ctx: &ProcessContext<'_, '_>) -> Option<PropertyValue> {
        let fallback = Font::default();
        let parent = ctx.parent().and_then(Properties::font).unwrap_or(&fallback);
        Some(PropertyValue::Font(compute_font(ctx.rules, parent)))
    }
}

/// Compute an element's font from its rule set and its parent's font.
///
/// The last `font` shorthand that can be interpreted sets every
/// sub-property; longhands that come after it in cascade order are then
/// applied one by one. Without a shorthand the parent's font is the
/// starting point and all longhands apply.
pub fn compute_font(rules: &CssRuleSet<'_>, parent: &Font) -> Font {
    let shorthand = rules
        .rules()
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, r)| r.name().is("font"))
        .find_map(|(i, r)| expand_shorthand(r.value(), parent).map(|font| (i, font)));

    let (mut font, start) = match shorthand {
        Some((index, font)) => (font, index + 1),
        None => (parent.clone(), 0),
    };
    for rule in &rules.rules()[start..] {
        apply_longhand(&mut font, rule.name().folded(), rule.value(), parent);
    }
    font
}

// -------------------------------------------------------------------
// Shorthand
// -------------------------------------------------------------------

/// Expand a `font` shorthand value, or `None` if it cannot be read.
fn expand_shorthand(value: &CssValue, parent: &Font) -> Option<Font> {
    if value.is_inherit() {
        return Some(parent.clone());
    }
    if let Some(name) = value.as_ident()
        && let Some(font) = system_font(name.folded())
    {
        return Some(font);
    }

    let mut font = Font::default();
    let mut rest = value.terms();

    if let Some((first, tail)) = rest.split_first()
        && let Some(style) = parse_style(first)
    {
        font.style = style;
        rest = tail;
    }
    if let Some((first, tail)) = rest.split_first()
        && let Some(variant) = parse_variant(first)
    {
        font.variant = variant;
        rest = tail;
    }
    if let Some((first, tail)) = rest.split_first()
        && let Some(weight) = parse_weight(first, parent)
    {
        font.weight = weight;
        rest = tail;
    }

    let (size, tail) = rest.split_first()?;
    font.size = parse_size(size, parent)?;
    rest = tail;

    if let [Term::Slash, line_height, tail @ ..] = rest {
        font.line_height = parse_line_height(line_height, font.size)?;
        rest = tail;
    }

    font.family = parse_family(rest, parent).unwrap_or_else(|| parent.family.clone());
    Some(font)
}

fn system_font(name: &str) -> Option<Font> {
    let mut font = Font::default();
    match name {
        "caption" | "message-box" => {},
        "icon" | "small-caption" | "status-bar" => {
            font.size = (DEFAULT_SIZE as f32 * SMALL_SYSTEM_FONT).round() as i32;
        },
        "menu" => font.weight = bolder(DEFAULT_WEIGHT),
        _ => return None,
    }
    Some(font)
}

// -------------------------------------------------------------------
// Longhands
// -------------------------------------------------------------------

fn apply_longhand(font: &mut Font, name: &str, value: &CssValue, parent: &Font) {
    let applied = match name {
        "font-family" => {
            let family = if value.is_inherit() {
                Some(parent.family.clone())
            } else {
                parse_family(value.terms(), parent)
            };
            family.map(|f| font.family = f)
        },
        "font-style" => component(value, parent.style, parse_style).map(|s| font.style = s),
        "font-variant" => component(value, parent.variant, parse_variant).map(|v| font.variant = v),
        "font-weight" => {
            component(value, parent.weight, |t| parse_weight(t, parent)).map(|w| font.weight = w)
        },
        "font-size" => {
            component(value, parent.size, |t| parse_size(t, parent)).map(|s| font.size = s)
        },
        "line-height" => {
            let size = font.size;
            component(value, parent.line_height, |t| parse_line_height(t, size))
                .map(|lh| font.line_height = lh)
        },
        _ => return,
    };
    if applied.is_none() {
        log::trace!("Ignoring {name}: {value}");
    }
}

/// Read a single-term longhand value; `inherit` yields the parent's value.
fn component<T>(
    value: &CssValue,
    inherited: T,
    parse: impl FnOnce(&Term) -> Option<T>,
) -> Option<T> {
    match value.single()? {
        Term::Inherit => Some(inherited),
        term => parse(term),
    }
}

// -------------------------------------------------------------------
// Value parsers
// -------------------------------------------------------------------

fn keyword(term: &Term) -> Option<&str> {
    term.as_ident().map(Ident::folded)
}

fn parse_style(term: &Term) -> Option<FontStyle> {
    match keyword(term)? {
        "normal" => Some(FontStyle::Normal),
        "italic" => Some(FontStyle::Italic),
        "oblique" => Some(FontStyle::Oblique),
        _ => None,
    }
}

fn parse_variant(term: &Term) -> Option<FontVariant> {
    match keyword(term)? {
        "normal" => Some(FontVariant::Normal),
        "small-caps" => Some(FontVariant::SmallCaps),
        _ => None,
    }
}

fn parse_weight(term: &Term, parent: &Font) -> Option<u16> {
    match term {
        Term::Integer(n) => Some((n / 100 * 100).clamp(100, 900) as u16),
        _ => match keyword(term)? {
            "normal" => Some(DEFAULT_WEIGHT),
            "bold" => Some(700),
            "bolder" => Some(bolder(parent.weight)),
            "lighter" => Some(lighter(parent.weight)),
            _ => None,
        },
    }
}

fn parse_size(term: &Term, parent: &Font) -> Option<i32> {
    let parent_size = parent.size as f32;
    let points = match term {
        Term::Dimension(v, unit) => to_points(*v, *unit, parent_size),
        Term::Percentage(p) => parent_size * p / 100.0,
        _ => match keyword(term)? {
            "xx-small" => 8.0,
            "x-small" => 9.0,
            "small" => 10.0,
            "medium" => 12.0,
            "large" => 14.0,
            "x-large" => 16.0,
            "xx-large" => 18.0,
            "larger" => parent_size * SIZE_STEP,
            "smaller" => parent_size / SIZE_STEP,
            _ => return None,
        },
    };
    if !points.is_finite() {
        return None;
    }
    Some((points.round() as i32).clamp(MIN_SIZE, MAX_SIZE))
}

/// Line height as a multiple of `size` points.
fn parse_line_height(term: &Term, size: i32) -> Option<f32> {
    let size = size as f32;
    let multiplier = match term {
        Term::Integer(n) => *n as f32,
        Term::Number(v) => *v,
        Term::Percentage(p) => p / 100.0,
        Term::Dimension(v, Unit::Em) => *v,
        Term::Dimension(v, Unit::Ex) => v / 2.0,
        Term::Dimension(v, unit) => to_points(*v, *unit, size) / size,
        _ => match keyword(term)? {
            "normal" => DEFAULT_LINE_HEIGHT,
            _ => return None,
        },
    };
    (multiplier.is_finite() && multiplier >= 0.0).then_some(multiplier)
}

/// Convert a length to points; font-relative units use `font_size`.
fn to_points(value: f32, unit: Unit, font_size: f32) -> f32 {
    match unit {
        Unit::Pt => value,
        Unit::Px => value * PT_PER_PX,
        Unit::Pc => value * PT_PER_PC,
        Unit::In => value * PT_PER_IN,
        Unit::Cm => value * PT_PER_IN / CM_PER_IN,
        Unit::Mm => value * PT_PER_IN / MM_PER_IN,
        Unit::Em => value * font_size,
        Unit::Ex => value * font_size / 2.0,
    }
}

/// Comma-separated family names. Unquoted names made of several words are
/// joined with single spaces; `inherit` stands for the parent's list.
fn parse_family(terms: &[Term], parent: &Font) -> Option<Vec<String>> {
    let mut families = Vec::new();
    if terms.is_empty() {
        return None;
    }
    for group in terms.split(|t| matches!(t, Term::Comma)) {
        match group {
            [Term::String(name)] => families.push(name.clone()),
            [Term::Inherit] => families.extend(parent.family.iter().cloned()),
            words if !words.is_empty() && words.iter().all(|t| t.as_ident().is_some()) => {
                let name: Vec<&str> =
                    words.iter().filter_map(Term::as_ident).map(Ident::as_str).collect();
                families.push(name.join(" "));
            },
            _ => {},
        }
    }
    if families.is_empty() { None } else { Some(families) }
}

// -------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------
