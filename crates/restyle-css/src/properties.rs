//! Computed properties of one element in one state.

use std::collections::BTreeMap;

use restyle_types::Ident;
use serde::Serialize;

use crate::font::Font;
use crate::value::CssValue;

/// A computed value. Each processor decides which variant it stores.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    Font(Font),
    /// A declared value kept as written, e.g. a colour.
    Declared(CssValue),
}

/// Computed values keyed by case-insensitive property name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Properties {
    values: BTreeMap<Ident, PropertyValue>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.values.get(key.to_ascii_lowercase().as_str())
    }

    pub fn insert(&mut self, key: Ident, value: PropertyValue) {
        self.values.insert(key, value);
    }

    /// The computed font, if a font processor ran for this element.
    pub fn font(&self) -> Option<&Font> {
        match self.get(Font::KEY) {
            Some(PropertyValue::Font(font)) => Some(font),
            _ => None,
        }
    }

    /// A declared value stored under `key`.
    pub fn declared(&self, key: &str) -> Option<&CssValue> {
        match self.get(key) {
            Some(PropertyValue::Declared(value)) => Some(value),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Ident, &PropertyValue)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
