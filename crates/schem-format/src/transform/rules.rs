use crate::block_state::namespaced;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// How one block-state property reacts to rotation and mirroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyRule {
    /// `facing`: horizontal direction turns with the region, `up`/`down` stay.
    Facing,
    /// `axis`: `x` and `z` trade places on quarter turns.
    Axis,
    /// `rotation`: 16-step angle, as on signs and banners.
    Rotation,
    /// `shape` of stairs: left and right swap when mirrored.
    StairShape,
    /// `hinge` of doors: left and right swap when mirrored.
    Hinge,
    /// `north`/`east`/`south`/`west` connection keys move with the region.
    Faces,
}

mod generated {
    use super::PropertyRule;

    include!(concat!(env!("OUT_DIR"), "/rotation_rules.rs"));
}

static VANILLA: Lazy<RotationRules> = Lazy::new(|| {
    RotationRules::from_entries(
        generated::ROTATION_RULES
            .iter()
            .map(|&(name, rules)| (name, rules.to_vec())),
    )
});

/// Block name to the properties that must be rewritten when it is turned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationRules {
    rules: HashMap<String, Vec<PropertyRule>>,
}

impl RotationRules {
    /// The table generated at build time from `rotation_rules.json`.
    pub fn vanilla() -> &'static RotationRules {
        &VANILLA
    }

    pub fn empty() -> Self {
        RotationRules::default()
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<PropertyRule>)>,
        S: AsRef<str>,
    {
        let mut table = RotationRules::empty();
        for (name, rules) in entries {
            table.insert(name.as_ref(), rules);
        }
        table
    }

    pub fn insert(&mut self, name: &str, rules: Vec<PropertyRule>) {
        self.rules.insert(namespaced(name).into_owned(), rules);
    }

    /// Bare names are looked up in the `minecraft` namespace.
    pub fn rules_for(&self, name: &str) -> Option<&[PropertyRule]> {
        self.rules.get(namespaced(name).as_ref()).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vanilla_table() {
        let rules = RotationRules::vanilla();
        assert!(!rules.is_empty());
        assert_eq!(
            rules.rules_for("minecraft:oak_stairs"),
            Some(&[PropertyRule::Facing, PropertyRule::StairShape][..])
        );
        assert_eq!(rules.rules_for("oak_log"), Some(&[PropertyRule::Axis][..]));
        assert_eq!(rules.rules_for("minecraft:stone"), None);
    }

    #[test]
    fn test_custom_entries() {
        let rules = RotationRules::from_entries([("mymod:pipe", vec![PropertyRule::Faces])]);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules.rules_for("mymod:pipe"), Some(&[PropertyRule::Faces][..]));
        assert_eq!(rules.rules_for("pipe"), None);
    }
}
