//! Ready-made [`Recorder`]s.

use restyle_dom::NodeId;
use serde::Serialize;

use crate::font::Font;
use crate::properties::Properties;
use crate::resolver::{Recorder, StyleStack};
use crate::state::State;

/// Collects the computed font of every element and state.
#[derive(Debug, Default)]
pub struct FontRecorder {
    pub fonts: Vec<(NodeId, State, Font)>,
}

impl FontRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The font of `node` in its default state.
    pub fn font_of(&self, node: NodeId) -> Option<&Font> {
        self.fonts
            .iter()
            .find(|(n, state, _)| *n == node && state.is_default())
            .map(|(_, _, font)| font)
    }
}

impl Recorder for FontRecorder {
    fn element(&mut self, stack: &StyleStack<'_>) {
        let font = stack.properties().and_then(Properties::font);
        if let (Some(node), Some(font)) = (stack.element(), font) {
            self.fonts.push((node, stack.state(), font.clone()));
        }
    }
}

/// Computed properties of one element in one state.
#[derive(Debug, Clone, Serialize)]
pub struct ElementStyle {
    pub node: NodeId,
    pub tag: String,
    /// e.g. `default` or `hover+active`.
    pub state: String,
    pub properties: Properties,
}

/// A run of text and the element it is styled by.
#[derive(Debug, Clone, Serialize)]
pub struct TextStyle {
    pub node: NodeId,
    pub element: Option<NodeId>,
    pub text: String,
}

/// Keeps every computed frame, for serialisation.
#[derive(Debug, Default, Serialize)]
pub struct StyleRecorder {
    pub elements: Vec<ElementStyle>,
    pub texts: Vec<TextStyle>,
}

impl StyleRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames recorded for `node`, default state first.
    pub fn styles_of(&self, node: NodeId) -> impl Iterator<Item = &ElementStyle> {
        self.elements.iter().filter(move |e| e.node == node)
    }
}

impl Recorder for StyleRecorder {
    fn element(&mut self, stack: &StyleStack<'_>) {
        let Some(node) = stack.element() else {
            return;
        };
        let tag = stack
            .doc
            .element(node)
            .map(|e| e.tag.to_string())
            .unwrap_or_default();
        self.elements.push(ElementStyle {
            node,
            tag,
            state: stack.state().to_string(),
            properties: stack.properties().cloned().unwrap_or_default(),
        });
    }

    fn text(&mut self, stack: &StyleStack<'_>, node: NodeId, text: &str) {
        // Only the default frame; other states repeat the same text.
        if !stack.states.iter().all(|s| s.is_default()) {
            return;
        }
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        self.texts.push(TextStyle {
            node,
            element: stack.element(),
            text: trimmed.to_string(),
        });
    }
}
