//! Dynamic pseudo-class state.
//!
//! A static rewriter cannot observe which element is hovered, focused,
//! active or visited, so every element can in principle be styled in any of
//! the 16 combinations. [`StateFilter`] decides which of those are evaluated
//! for a given element.

use std::fmt;

use restyle_dom::{Document, NodeId};
use restyle_types::{ResolverConfig, StatePolicy};
use serde::Serialize;

/// A combination of the four dynamic pseudo-class flags.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct State(u8);

impl State {
    pub const VISITED: u8 = 1;
    pub const HOVERED: u8 = 2;
    pub const FOCUSED: u8 = 4;
    pub const ACTIVE: u8 = 8;
    pub const MASK: u8 = 0b1111;

    /// Nothing hovered, focused, active or visited.
    pub const DEFAULT: State = State(0);

    /// Every state, indexed by its bit pattern.
    pub const ALL: [State; 16] = {
        let mut table = [State(0); 16];
        let mut i = 0;
        while i < 16 {
            table[i] = State(i as u8);
            i += 1;
        }
        table
    };

    /// Look up the state for a bit pattern; bits above the mask are ignored.
    pub fn from_bits(bits: u8) -> State {
        Self::ALL[(bits & Self::MASK) as usize]
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    /// Position of this state in [`State::ALL`].
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_visited(self) -> bool {
        self.0 & Self::VISITED != 0
    }

    pub fn is_hovered(self) -> bool {
        self.0 & Self::HOVERED != 0
    }

    pub fn is_focused(self) -> bool {
        self.0 & Self::FOCUSED != 0
    }

    pub fn is_active(self) -> bool {
        self.0 & Self::ACTIVE != 0
    }

    pub fn is_default(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State({self})")
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_default() {
            return f.write_str("default");
        }
        let names = [
            (Self::VISITED, "visited"),
            (Self::HOVERED, "hover"),
            (Self::FOCUSED, "focus"),
            (Self::ACTIVE, "active"),
        ];
        let mut first = true;
        for (bit, name) in names {
            if self.0 & bit != 0 {
                if !first {
                    f.write_str("+")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

// ------------------------------------------------------------------
// State selection
// ------------------------------------------------------------------

/// Chooses the states evaluated for each element.
#[derive(Debug, Clone, Copy)]
pub struct StateFilter {
    policy: StatePolicy,
    allowed: u8,
}

impl StateFilter {
    /// Build a filter from the configuration. `referenced` holds the state
    /// bits used by any selector of the input and only matters for
    /// [`StatePolicy::Referenced`].
    pub fn new(config: &ResolverConfig, referenced: u8) -> Self {
        let mut allowed = 0;
        if config.allow_visited {
            allowed |= State::VISITED;
        }
        if config.allow_hover {
            allowed |= State::HOVERED;
        }
        if config.allow_focus {
            allowed |= State::FOCUSED;
        }
        if config.allow_active {
            allowed |= State::ACTIVE;
        }
        if config.state_policy == StatePolicy::Referenced {
            allowed &= referenced;
        }
        Self {
            policy: config.state_policy,
            allowed,
        }
    }

    /// The states to evaluate for `node`, given the states its ancestors
    /// are currently evaluated in. Always starts with [`State::DEFAULT`].
    pub fn states_for(&self, doc: &Document, node: NodeId, ancestors: &[State]) -> Vec<State> {
        if self.policy == StatePolicy::DefaultOnly || self.allowed == 0 {
            return vec![State::DEFAULT];
        }
        let Some(elem) = doc.element(node) else {
            return vec![State::DEFAULT];
        };
        if elem.is("html") || elem.is("body") {
            return vec![State::DEFAULT];
        }
        let ancestor_hovered = ancestors.iter().any(|s| s.is_hovered());
        let ancestor_focused = ancestors.iter().any(|s| s.is_focused());
        let anchor = elem.is_anchor();
        let focusable = elem.accepts_focus();

        State::ALL
            .iter()
            .copied()
            .filter(|state| {
                if state.bits() & !self.allowed != 0 {
                    return false;
                }
                if (state.is_visited() || state.is_active()) && !anchor {
                    return false;
                }
                if state.is_focused() && (!focusable || ancestor_focused) {
                    return false;
                }
                !(state.is_hovered() && ancestor_hovered)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use restyle_dom::ElementData;

    use super::*;

    fn page() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let html = doc.append_element(doc.root, ElementData::new("html"));
        let body = doc.append_element(html, ElementData::new("body"));
        let a = doc.append_element(body, ElementData::new("a").with_attribute("href", "/x"));
        let input = doc.append_element(body, ElementData::new("input"));
        (doc, body, a, input)
    }

    fn reachable() -> StateFilter {
        let config = ResolverConfig {
            state_policy: StatePolicy::Reachable,
            ..ResolverConfig::default()
        };
        StateFilter::new(&config, 0)
    }

    #[test]
    fn table_holds_sixteen_distinct_states() {
        for (i, state) in State::ALL.iter().enumerate() {
            assert_eq!(state.index(), i);
        }
        assert_eq!(State::from_bits(0xff), State::ALL[15]);
        assert_eq!(State::DEFAULT, State::ALL[0]);
    }

    #[test]
    fn flag_accessors() {
        let s = State::from_bits(State::HOVERED | State::ACTIVE);
        assert!(s.is_hovered() && s.is_active());
        assert!(!s.is_visited() && !s.is_focused());
        assert_eq!(s.to_string(), "hover+active");
        assert_eq!(State::DEFAULT.to_string(), "default");
    }

    #[test]
    fn default_policy_yields_only_default() {
        let (doc, _, a, _) = page();
        let states = StateFilter::new(&ResolverConfig::default(), 0xff).states_for(&doc, a, &[]);
        assert_eq!(states, vec![State::DEFAULT]);
    }

    #[test]
    fn anchors_reach_all_sixteen_minus_focus() {
        let (doc, _, a, _) = page();
        let states = reachable().states_for(&doc, a, &[State::DEFAULT]);
        assert_eq!(states.len(), 8);
        assert!(states.iter().all(|s| !s.is_focused()));
        assert_eq!(states[0], State::DEFAULT);
    }

    #[test]
    fn inputs_cannot_be_visited_or_active() {
        let (doc, _, _, input) = page();
        let states = reachable().states_for(&doc, input, &[State::DEFAULT]);
        assert_eq!(
            states,
            vec![
                State::DEFAULT,
                State::from_bits(State::HOVERED),
                State::from_bits(State::FOCUSED),
                State::from_bits(State::HOVERED | State::FOCUSED),
            ]
        );
    }

    #[test]
    fn body_is_always_default() {
        let (doc, body, _, _) = page();
        assert_eq!(reachable().states_for(&doc, body, &[]), vec![State::DEFAULT]);
    }

    #[test]
    fn hover_appears_once_per_chain() {
        let (doc, _, a, _) = page();
        let hovered = State::from_bits(State::HOVERED);
        let states = reachable().states_for(&doc, a, &[State::DEFAULT, hovered]);
        assert!(states.iter().all(|s| !s.is_hovered()));
    }

    #[test]
    fn focus_appears_once_per_chain() {
        let mut doc = Document::new();
        let body = doc.append_element(doc.root, ElementData::new("body"));
        let option = doc.append_element(body, ElementData::new("option"));
        let input = doc.append_element(option, ElementData::new("input"));
        let filter = reachable();

        let focused = State::from_bits(State::FOCUSED);
        assert!(filter.states_for(&doc, option, &[State::DEFAULT]).contains(&focused));
        assert_eq!(
            filter.states_for(&doc, input, &[State::DEFAULT, focused]),
            vec![State::DEFAULT, State::from_bits(State::HOVERED)]
        );
        let unfocused_option = filter.states_for(&doc, input, &[State::DEFAULT, State::DEFAULT]);
        assert!(unfocused_option.contains(&focused));
    }

    #[test]
    fn referenced_policy_restricts_to_used_bits() {
        let (doc, _, a, _) = page();
        let config = ResolverConfig {
            state_policy: StatePolicy::Referenced,
            ..ResolverConfig::default()
        };
        let filter = StateFilter::new(&config, State::HOVERED);
        assert_eq!(
            filter.states_for(&doc, a, &[]),
            vec![State::DEFAULT, State::from_bits(State::HOVERED)]
        );
    }

    #[test]
    fn allow_masks_apply() {
        let (doc, _, a, _) = page();
        let config = ResolverConfig {
            state_policy: StatePolicy::Reachable,
            allow_hover: false,
            allow_active: false,
            ..ResolverConfig::default()
        };
        let states = StateFilter::new(&config, 0).states_for(&doc, a, &[]);
        assert_eq!(
            states,
            vec![State::DEFAULT, State::from_bits(State::VISITED)]
        );
    }
}
