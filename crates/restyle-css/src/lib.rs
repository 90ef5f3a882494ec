//! CSS cascade resolution for HTML pages.
//!
//! Given a DOM and the stylesheets that apply to it (user-agent, user,
//! author, `style` attributes and presentational hints), this crate works
//! out for every element the declarations that win the CSS 2.1 cascade and
//! feeds them to property processors, which compute values such as the
//! effective font. Elements can be resolved in each reachable combination
//! of the `:hover`, `:focus`, `:active` and `:visited` states so that a
//! rewriter sees every way a page can be rendered.
//!
//! The pipeline is [`StylesheetCollector`] -> [`StyleSources`] ->
//! [`PropertyResolver`] -> [`Recorder`]s.

pub mod budget;
pub mod cascade;
pub mod collector;
pub mod default;
pub mod font;
pub mod hints;
pub mod processor;
pub mod properties;
pub mod recorder;
pub mod resolver;
pub mod selector;
pub mod specificity;
pub mod state;
pub mod stylesheet;
pub mod value;

#[cfg(test)]
pub(crate) mod test_utils;

// -----------------------------------------------------------------------
// Public re-exports
// -----------------------------------------------------------------------

pub use budget::{Deadline, TimeBudget, Unlimited};
pub use cascade::{CssRule, CssRuleSet, Origin, RuleSetResolver, StyleSources};
pub use collector::{FetchedStylesheet, StylesheetCollector, StylesheetFetcher, StylesheetParser};
pub use default::user_agent_stylesheet;
pub use font::{Font, FontProcessor, FontStyle, FontVariant};
pub use hints::presentational_hints;
pub use processor::{DeclaredValueProcessor, ProcessContext, Processor};
pub use properties::{Properties, PropertyValue};
pub use recorder::{FontRecorder, StyleRecorder};
pub use resolver::{PropertyResolver, Recorder, ResolveOutcome, StyleStack};
pub use selector::{Combinator, Compound, Condition, ElementPath, PseudoClass, Selector};
pub use specificity::Specificity;
pub use state::{State, StateFilter};
pub use stylesheet::{ImportNode, Media, MediaElement, Rule, SelectorRulesPair, Stylesheet};
pub use value::{CssValue, Term, Unit};
