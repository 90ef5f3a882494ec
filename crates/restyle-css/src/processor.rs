//! Property processors.
//!
//! A processor turns the matched declarations of one element into a single
//! computed value. Processors are pure: they read the ancestors' computed
//! properties and the element's rule set, and return the value the resolver
//! stores under [`Processor::key`] for the current element.

use restyle_dom::{Document, NodeId};
use restyle_types::Ident;

use crate::cascade::CssRuleSet;
use crate::properties::{Properties, PropertyValue};
use crate::state::State;
use crate::value::CssValue;

/// Everything a processor may look at for one element.
pub struct ProcessContext<'c, 's> {
    pub doc: &'c Document,
    /// Element chain from the root; the last entry is the current element.
    pub elements: &'c [NodeId],
    /// States of `elements`.
    pub states: &'c [State],
    /// Computed properties of the ancestors, outermost first. Has one entry
    /// fewer than `elements`.
    pub ancestors: &'c [Properties],
    /// Values computed by earlier processors for the current element.
    pub current: &'c Properties,
    pub rules: &'c CssRuleSet<'s>,
}

impl ProcessContext<'_, '_> {
    pub fn element(&self) -> Option<NodeId> {
        self.elements.last().copied()
    }

    pub fn state(&self) -> State {
        self.states.last().copied().unwrap_or_default()
    }

    /// The parent element's computed properties.
    pub fn parent(&self) -> Option<&Properties> {
        self.ancestors.last()
    }
}

/// Computes one derived property per element.
pub trait Processor: Send + Sync {
    /// Key the result is stored under.
    fn key(&self) -> &Ident;

    /// Compute the value for the current element. `None` leaves the key
    /// unset.
    fn process(&self, ctx: &ProcessContext<'_, '_>) -> Option<PropertyValue>;
}

// -------------------------------------------------------------------
// Declared value
// -------------------------------------------------------------------

/// Stores the winning declared value of one property.
///
/// `inherit` takes the parent's value. Inherited properties (e.g. `color`)
/// also fall back to the parent when nothing is declared; others fall back
/// to the initial value, if one is given.
#[derive(Debug, Clone)]
pub struct DeclaredValueProcessor {
    name: Ident,
    inherited: bool,
    initial: Option<CssValue>,
}

impl DeclaredValueProcessor {
    pub fn new(name: &str, inherited: bool) -> Self {
        Self {
            name: Ident::new(name),
            inherited,
            initial: None,
        }
    }

    pub fn with_initial(mut self, initial: CssValue) -> Self {
        self.initial = Some(initial);
        self
    }

    /// `color`, inherited.
    pub fn color() -> Self {
        Self::new("color", true)
    }

    /// `background-color`, not inherited, initially `transparent`.
    pub fn background_color() -> Self {
        Self::new("background-color", false).with_initial(CssValue::ident("transparent"))
    }

    fn parent_value<'p>(&self, ctx: &'p ProcessContext<'_, '_>) -> Option<&'p CssValue> {
        ctx.parent().and_then(|p| p.declared(self.name.folded()))
    }
}

impl Processor for DeclaredValueProcessor {
    fn key(&self) -> &Ident {
        &self.name
    }

    fn process(&self, ctx: &ProcessContext<'_, '_>) -> Option<PropertyValue> {
        let value = match ctx.rules.value(self.name.folded()) {
            Some(v) if v.is_inherit() => self.parent_value(ctx).cloned(),
            Some(v) => Some(v.clone()),
            None if self.inherited => self.parent_value(ctx).cloned(),
            None => None,
        };
        value
            .or_else(|| self.initial.clone())
            .map(PropertyValue::Declared)
    }
}
