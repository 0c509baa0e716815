use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

#[derive(Deserialize, Debug)]
struct RuleGroup {
    properties: Vec<String>,
    blocks: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct LegacyBlock {
    id: u16,
    name: String,
}

const PROPERTY_RULES: &[&str] = &["Facing", "Axis", "Rotation", "StairShape", "Hinge", "Faces"];

fn main() {
    let rules_json_path = "rotation_rules.json";
    let legacy_json_path = "legacy_blocks.json";

    let rules_json =
        fs::read_to_string(rules_json_path).expect("Failed to read rotation_rules.json");
    let groups: Vec<RuleGroup> =
        serde_json::from_str(&rules_json).expect("Failed to parse rotation_rules.json");

    let legacy_json =
        fs::read_to_string(legacy_json_path).expect("Failed to read legacy_blocks.json");
    let legacy: Vec<LegacyBlock> =
        serde_json::from_str(&legacy_json).expect("Failed to parse legacy_blocks.json");

    let out_dir = env::var_os("OUT_DIR").unwrap();

    let dest_path = Path::new(&out_dir).join("rotation_rules.rs");
    let mut out_file = File::create(&dest_path).expect("Failed to create rotation_rules.rs");

    writeln!(
        &mut out_file,
        "pub static ROTATION_RULES: &[(&str, &[PropertyRule])] = &["
    )
    .unwrap();

    let mut seen = HashSet::new();
    for group in &groups {
        for property in &group.properties {
            assert!(
                PROPERTY_RULES.contains(&property.as_str()),
                "Unknown property rule {}",
                property
            );
        }
        let rules = group
            .properties
            .iter()
            .map(|p| format!("PropertyRule::{}", p))
            .collect::<Vec<_>>()
            .join(", ");

        for block in &group.blocks {
            assert!(seen.insert(block.clone()), "Duplicate rule for {}", block);
            writeln!(&mut out_file, "    ({:?}, &[{}]),", block, rules).unwrap();
        }
    }

    writeln!(&mut out_file, "];").unwrap();

    let dest_path = Path::new(&out_dir).join("legacy_blocks.rs");
    let mut out_file = File::create(&dest_path).expect("Failed to create legacy_blocks.rs");

    writeln!(&mut out_file, "pub static LEGACY_BLOCKS: &[(u16, &str)] = &[").unwrap();
    for block in &legacy {
        assert!(block.id < 4096, "Legacy id {} out of range", block.id);
        writeln!(&mut out_file, "    ({}, {:?}),", block.id, block.name).unwrap();
    }
    writeln!(&mut out_file, "];").unwrap();

    println!("cargo:rerun-if-changed={}", rules_json_path);
    println!("cargo:rerun-if-changed={}", legacy_json_path);
}
