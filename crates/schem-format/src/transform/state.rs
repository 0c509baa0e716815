//! Rewrites block-state properties for a single rotation or mirror step.

use super::rules::{PropertyRule, RotationRules};
use super::{Mirror, Rotation};
use crate::block_state::BlockState;
use std::fmt;

const HORIZONTAL: [&str; 4] = ["north", "east", "south", "west"];

/// One geometric step applied to the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Rotate(Rotation),
    Mirror(Mirror),
}

/// Something the transform could not rewrite. The block is kept as it was.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransformWarning {
    /// The block has a directional property but the rule table has no entry covering it.
    NoRule { block: String, property: String },
    /// The rule applies but the value is not one it knows how to turn.
    UnknownValue {
        block: String,
        property: String,
        value: String,
    },
}

impl fmt::Display for TransformWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformWarning::NoRule { block, property } => write!(
                f,
                "no rotation rule for '{}' of {}, left unchanged",
                property, block
            ),
            TransformWarning::UnknownValue {
                block,
                property,
                value,
            } => write!(
                f,
                "cannot turn {}={} of {}, left unchanged",
                property, value, block
            ),
        }
    }
}

fn turn(direction: &str, step: Step) -> Option<&'static str> {
    let i = HORIZONTAL.iter().position(|d| *d == direction)?;
    let turned = match step {
        Step::Rotate(rotation) => (i + rotation.quarter_turns() as usize) % 4,
        // east/west sit at odd positions, north/south at even ones
        Step::Mirror(Mirror::X) if i % 2 == 1 => (i + 2) % 4,
        Step::Mirror(Mirror::Z) if i % 2 == 0 => (i + 2) % 4,
        Step::Mirror(_) => i,
    };
    Some(HORIZONTAL[turned])
}

fn facing(value: &str, step: Step) -> Option<String> {
    match value {
        "up" | "down" => Some(value.to_owned()),
        _ => turn(value, step).map(str::to_owned),
    }
}

fn axis(value: &str, step: Step) -> Option<String> {
    let swap = matches!(step, Step::Rotate(rotation) if rotation.quarter_turns() % 2 == 1);
    match value {
        "x" if swap => Some("z".to_owned()),
        "z" if swap => Some("x".to_owned()),
        "x" | "y" | "z" => Some(value.to_owned()),
        _ => None,
    }
}

/// Sixteen steps per turn, clockwise from south.
fn rotation16(value: &str, step: Step) -> Option<String> {
    let r = value.parse::<u8>().ok().filter(|&r| r < 16)?;
    let turned = match step {
        Step::Rotate(rotation) => (r + 4 * rotation.quarter_turns()) % 16,
        Step::Mirror(Mirror::X) => (16 - r) % 16,
        Step::Mirror(Mirror::Z) => (24 - r) % 16,
    };
    Some(turned.to_string())
}

fn handedness(value: &str, step: Step) -> Option<String> {
    let flipped = match value {
        "left" => "right",
        "right" => "left",
        "inner_left" => "inner_right",
        "inner_right" => "inner_left",
        "outer_left" => "outer_right",
        "outer_right" => "outer_left",
        "straight" => "straight",
        _ => return None,
    };
    match step {
        Step::Mirror(_) => Some(flipped.to_owned()),
        Step::Rotate(_) => Some(value.to_owned()),
    }
}

fn property_of(rule: PropertyRule) -> Option<&'static str> {
    match rule {
        PropertyRule::Facing => Some("facing"),
        PropertyRule::Axis => Some("axis"),
        PropertyRule::Rotation => Some("rotation"),
        PropertyRule::StairShape => Some("shape"),
        PropertyRule::Hinge => Some("hinge"),
        PropertyRule::Faces => None,
    }
}

/// Rewrites one palette entry. Names that do not parse as block states pass through.
pub(crate) fn transform_state(
    name: &str,
    rules: &RotationRules,
    step: Step,
    warnings: &mut Vec<TransformWarning>,
) -> String {
    let Ok(original) = BlockState::parse(name) else {
        return name.to_owned();
    };
    if !original.has_properties() {
        return name.to_owned();
    }
    let mut state = original.clone();
    let block_rules = rules.rules_for(&state.name).unwrap_or(&[]);

    for directional in ["facing", "axis", "rotation"] {
        let covered = block_rules
            .iter()
            .any(|&rule| property_of(rule) == Some(directional));
        if !covered && state.get(directional).is_some() {
            warnings.push(TransformWarning::NoRule {
                block: state.name.clone(),
                property: directional.to_owned(),
            });
        }
    }

    for &rule in block_rules {
        if rule == PropertyRule::Faces {
            for (key, _) in state.properties.iter_mut() {
                if let Some(turned) = turn(key, step) {
                    *key = turned.to_owned();
                }
            }
            continue;
        }

        let Some(property) = property_of(rule) else {
            continue;
        };
        let Some(value) = state.get(property) else {
            continue;
        };
        let turned = match rule {
            PropertyRule::Facing => facing(value, step),
            PropertyRule::Axis => axis(value, step),
            PropertyRule::Rotation => rotation16(value, step),
            PropertyRule::StairShape | PropertyRule::Hinge => handedness(value, step),
            PropertyRule::Faces => None,
        };
        match turned {
            Some(turned) => state.set(property, turned),
            None => warnings.push(TransformWarning::UnknownValue {
                block: state.name.clone(),
                property: property.to_owned(),
                value: value.to_owned(),
            }),
        }
    }

    if state == original {
        return name.to_owned();
    }
    state.to_string()
}
