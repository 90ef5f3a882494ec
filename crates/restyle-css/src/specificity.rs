//! Selector specificity.

use serde::Serialize;

/// CSS specificity in the (inline, id, attribute, name) tuple form.
///
/// Field order matters: the derived `Ord` compares lexicographically, so a
/// single id outweighs any number of classes and an inline `style`
/// declaration outweighs every selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Specificity {
    /// 1 if the declaration comes from a `style` attribute.
    pub inline: u8,
    /// Count of id conditions.
    pub ids: u16,
    /// Count of attribute, class and pseudo-class conditions.
    pub attributes: u16,
    /// Count of element names and pseudo-elements.
    pub names: u16,
}

impl Specificity {
    /// Specificity of a selector with no parts, e.g. `*`.
    pub const ZERO: Specificity = Specificity {
        inline: 0,
        ids: 0,
        attributes: 0,
        names: 0,
    };

    /// Specificity of declarations from a `style` attribute.
    pub const INLINE: Specificity = Specificity {
        inline: 1,
        ids: 0,
        attributes: 0,
        names: 0,
    };

    pub fn add_id(&mut self) {
        self.ids = self.ids.saturating_add(1);
    }

    pub fn add_attribute_or_pseudo_class(&mut self) {
        self.attributes = self.attributes.saturating_add(1);
    }

    pub fn add_name_or_pseudo_element(&mut self) {
        self.names = self.names.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(ids: u16, attributes: u16, names: u16) -> Specificity {
        Specificity {
            inline: 0,
            ids,
            attributes,
            names,
        }
    }

    #[test]
    fn id_beats_classes_beats_names() {
        // #a > .b.c > div
        let id = spec(1, 0, 0);
        let classes = spec(0, 2, 0);
        let name = spec(0, 0, 1);
        assert!(id > classes);
        assert!(classes > name);

        let mut sorted = vec![classes, id, name];
        sorted.sort();
        assert_eq!(sorted, vec![name, classes, id]);
    }

    #[test]
    fn inline_outranks_everything() {
        assert!(Specificity::INLINE > spec(u16::MAX, u16::MAX, u16::MAX));
    }

    #[test]
    fn accumulator_counts_each_kind() {
        let mut s = Specificity::ZERO;
        s.add_id();
        s.add_attribute_or_pseudo_class();
        s.add_attribute_or_pseudo_class();
        s.add_name_or_pseudo_element();
        assert_eq!(s, spec(1, 2, 1));
    }

    #[test]
    fn counters_saturate() {
        let mut s = spec(u16::MAX, 0, 0);
        s.add_id();
        assert_eq!(s.ids, u16::MAX);
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn ordering_is_lexicographic(
                a in (0u16..50, 0u16..50, 0u16..50),
                b in (0u16..50, 0u16..50, 0u16..50),
            ) {
                let sa = spec(a.0, a.1, a.2);
                let sb = spec(b.0, b.1, b.2);
                prop_assert_eq!(sa.cmp(&sb), a.cmp(&b));
            }

            #[test]
            fn adding_never_decreases(ids in 0u16..5, attrs in 0u16..5, names in 0u16..5) {
                let mut s = Specificity::ZERO;
                let mut previous = s;
                for _ in 0..ids {
                    s.add_id();
                    prop_assert!(s > previous);
                    previous = s;
                }
                for _ in 0..attrs {
                    s.add_attribute_or_pseudo_class();
                    prop_assert!(s > previous);
                    previous = s;
                }
                for _ in 0..names {
                    s.add_name_or_pseudo_element();
                    prop_assert!(s > previous);
                    previous = s;
                }
            }
        }
    }
}
