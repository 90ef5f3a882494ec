//! Property resolution over a whole document.
//!
//! [`PropertyResolver`] walks the DOM in pre-order, depth first, keeping
//! parallel stacks of elements, states and computed [`Properties`] from the
//! root to the current node. An element's properties are complete before
//! any of its children is visited, which is what lets processors inherit
//! by reading the parent frame.

use restyle_dom::{Document, NodeId, NodeKind};
use restyle_types::{Ident, ResolverConfig};

use crate::budget::TimeBudget;
use crate::cascade::{RuleSetResolver, StyleSources};
use crate::font::FontProcessor;
use crate::processor::{DeclaredValueProcessor, ProcessContext, Processor};
use crate::properties::Properties;
use crate::selector::ElementPath;
use crate::state::{State, StateFilter};

// -----------------------------------------------------------------------
// Recorder protocol
// -----------------------------------------------------------------------

/// Read-only view of the traversal stack.
///
/// During [`Recorder::element`] all three stacks have the same length and
/// the top entries describe the current element. During
/// [`Recorder::before_element`] and [`Recorder::after_element`] the element
/// is pushed but has no state or properties frame.
#[derive(Debug, Clone, Copy)]
pub struct StyleStack<'a> {
    pub doc: &'a Document,
    pub elements: &'a [NodeId],
    pub states: &'a [State],
    pub properties: &'a [Properties],
}

impl StyleStack<'_> {
    pub fn element(&self) -> Option<NodeId> {
        self.elements.last().copied()
    }

    pub fn state(&self) -> State {
        self.states.last().copied().unwrap_or_default()
    }

    /// Properties of the innermost element that has a frame.
    pub fn properties(&self) -> Option<&Properties> {
        self.properties.last()
    }
}

/// Receives the results of a resolution pass.
pub trait Recorder {
    fn before_element(&mut self, _stack: &StyleStack<'_>) {}

    /// Called once per (element, state) with that frame on top of the stack.
    fn element(&mut self, stack: &StyleStack<'_>);

    fn after_element(&mut self, _stack: &StyleStack<'_>) {}

    /// A text node; the top frame is the enclosing element's.
    fn text(&mut self, _stack: &StyleStack<'_>, _node: NodeId, _text: &str) {}
}

/// How a resolution pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    Completed { elements: usize },
    /// The time budget ran out; results cover the first `elements` elements.
    Aborted { elements: usize },
}

impl ResolveOutcome {
    pub fn elements(&self) -> usize {
        match self {
            ResolveOutcome::Completed { elements } | ResolveOutcome::Aborted { elements } => {
                *elements
            },
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, ResolveOutcome::Completed { .. })
    }
}

// -----------------------------------------------------------------------
// Resolver
// -----------------------------------------------------------------------

/// Computes properties for every element of a document.
pub struct PropertyResolver<'s> {
    rule_sets: RuleSetResolver<'s>,
    processors: Vec<Box<dyn Processor>>,
    states: StateFilter,
    skipped_tags: Vec<Ident>,
}

/// Traversal stacks for one pass.
struct Walk<'a> {
    doc: &'a Document,
    budget: &'a dyn TimeBudget,
    elements: Vec<NodeId>,
    states: Vec<State>,
    properties: Vec<Properties>,
    resolved: usize,
    aborted: bool,
}

impl<'a> Walk<'a> {
    fn stack(&self) -> StyleStack<'_> {
        StyleStack {
            doc: self.doc,
            elements: &self.elements,
            states: &self.states,
            properties: &self.properties,
        }
    }
}

impl<'s> PropertyResolver<'s> {
    /// A resolver without processors.
    pub fn new(sources: &'s StyleSources, config: &ResolverConfig) -> Self {
        let rule_sets = RuleSetResolver::new(sources, &config.media);
        let states = StateFilter::new(config, rule_sets.referenced_states());
        Self {
            rule_sets,
            processors: Vec::new(),
            states,
            skipped_tags: config.skipped_tags.iter().map(|t| Ident::new(t.as_str())).collect(),
        }
    }

    pub fn with_processor(mut self, processor: impl Processor + 'static) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    /// Font, `color` and `background-color`.
    pub fn with_default_processors(self) -> Self {
        self.with_processor(FontProcessor::new())
            .with_processor(DeclaredValueProcessor::color())
            .with_processor(DeclaredValueProcessor::background_color())
    }

    pub fn rule_sets(&self) -> &RuleSetResolver<'s> {
        &self.rule_sets
    }

    /// Walk `doc`, notifying `recorders` of every computed element.
    ///
    /// `budget` is polled before each element; once it has expired the walk
    /// unwinds and reports [`ResolveOutcome::Aborted`].
    pub fn resolve(
        &self,
        doc: &Document,
        recorders: &mut [&mut dyn Recorder],
        budget: &dyn TimeBudget,
    ) -> ResolveOutcome {
        let mut walk = Walk {
            doc,
            budget,
            elements: Vec::new(),
            states: Vec::new(),
            properties: Vec::new(),
            resolved: 0,
            aborted: false,
        };
        self.visit(&mut walk, recorders, doc.root);

        if walk.aborted {
            log::warn!("Time budget exhausted after {} elements", walk.resolved);
            ResolveOutcome::Aborted {
                elements: walk.resolved,
            }
        } else {
            log::debug!("Resolved properties for {} elements", walk.resolved);
            ResolveOutcome::Completed {
                elements: walk.resolved,
            }
        }
    }

    fn visit(&self, walk: &mut Walk<'_>, recorders: &mut [&mut dyn Recorder], node: NodeId) {
        if walk.aborted {
            return;
        }
        let doc = walk.doc;
        match &doc.get(node).kind {
            NodeKind::Document => self.visit_children(walk, recorders, node),
            NodeKind::Comment(_) => {},
            NodeKind::Text(text) => {
                let stack = walk.stack();
                for recorder in recorders.iter_mut() {
                    recorder.text(&stack, node, text);
                }
            },
            NodeKind::Element(elem) => {
                if self.skipped_tags.contains(&elem.tag) {
                    self.visit_text_only(walk, recorders, node);
                } else if walk.budget.expired() {
                    walk.aborted = true;
                } else {
                    self.visit_element(walk, recorders, node);
                }
            },
        }
    }

    fn visit_children(
        &self,
        walk: &mut Walk<'_>,
        recorders: &mut [&mut dyn Recorder],
        node: NodeId,
    ) {
        let doc = walk.doc;
        for &child in &doc.get(node).children {
            self.visit(walk, recorders, child);
            if walk.aborted {
                return;
            }
        }
    }

    fn visit_element(
        &self,
        walk: &mut Walk<'_>,
        recorders: &mut [&mut dyn Recorder],
        node: NodeId,
    ) {
        let doc = walk.doc;
        walk.elements.push(node);
        walk.resolved += 1;
        let stack = walk.stack();
        for recorder in recorders.iter_mut() {
            recorder.before_element(&stack);
        }

        for state in self.states.states_for(doc, node, &walk.states) {
            walk.states.push(state);
            let current = self.compute(walk);
            walk.properties.push(current);

            let stack = walk.stack();
            for recorder in recorders.iter_mut() {
                recorder.element(&stack);
            }
            self.visit_children(walk, recorders, node);

            walk.properties.pop();
            walk.states.pop();
            if walk.aborted {
                break;
            }
        }

        let stack = walk.stack();
        for recorder in recorders.iter_mut() {
            recorder.after_element(&stack);
        }
        walk.elements.pop();
    }

    /// Run every processor for the element and state on top of the stacks.
    fn compute(&self, walk: &Walk<'_>) -> Properties {
        let path = ElementPath::new(walk.doc, &walk.elements, &walk.states);
        let rules = self.rule_sets.resolve(&path);
        let mut current = Properties::new();
        for processor in &self.processors {
            let ctx = ProcessContext {
                doc: walk.doc,
                elements: &walk.elements,
                states: &walk.states,
                ancestors: &walk.properties,
                current: &current,
                rules: &rules,
            };
            if let Some(value) = processor.process(&ctx) {
                current.insert(processor.key().clone(), value);
            }
        }
        current
    }

    /// Text inside a skipped subtree is still reported, with the frame of
    /// the nearest styled ancestor on top.
    fn visit_text_only(
        &self,
        walk: &mut Walk<'_>,
        recorders: &mut [&mut dyn Recorder],
        node: NodeId,
    ) {
        let doc = walk.doc;
        for &child in &doc.get(node).children {
            match &doc.get(child).kind {
                NodeKind::Text(text) => {
                    let stack = walk.stack();
                    for recorder in recorders.iter_mut() {
                        recorder.text(&stack, child, text);
                    }
                },
                NodeKind::Element(_) => self.visit_text_only(walk, recorders, child),
                NodeKind::Document | NodeKind::Comment(_) => {},
            }
        }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
