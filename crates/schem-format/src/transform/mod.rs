//! Quarter-turn rotation and mirroring of whole regions.
//!
//! Positions turn around the paste origin, seen from above with +x east and +z
//! south. Palette entries are rewritten through a [`RotationRules`] table so
//! that stairs, logs, signs and the like keep pointing the right way.

pub mod rules;
mod state;

pub use rules::{PropertyRule, RotationRules};
pub use state::TransformWarning;

use crate::region::{BiomeLayer, BlockEntity, BlockPalette, Region};
use schem_common::{BlockPos, Dimensions, Result, SchemError};
use schem_logger::{log, LogSeverity};
use schem_nbt::{Compound, Tag};
use serde::{Deserialize, Serialize};
use state::{transform_state, Step};
use std::collections::HashSet;

/// Clockwise turn seen from above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    None,
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

impl Rotation {
    pub fn from_degrees(degrees: i32) -> Result<Rotation> {
        match degrees {
            0 => Ok(Rotation::None),
            90 => Ok(Rotation::Clockwise90),
            180 => Ok(Rotation::Clockwise180),
            270 => Ok(Rotation::Clockwise270),
            other => Err(SchemError::invalid(
                "rotation",
                format!("{} degrees is not a quarter turn", other),
            )),
        }
    }

    pub fn degrees(self) -> i32 {
        i32::from(self.quarter_turns()) * 90
    }

    pub fn quarter_turns(self) -> u8 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 1,
            Rotation::Clockwise180 => 2,
            Rotation::Clockwise270 => 3,
        }
    }
}

/// Axis along which positions are reflected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mirror {
    /// x becomes -x: east and west swap.
    X,
    /// z becomes -z: north and south swap.
    Z,
}

/// Result of a transform. Warnings are also logged, so callers may ignore them.
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed {
    pub region: Region,
    pub warnings: Vec<TransformWarning>,
}

fn turn_point(step: Step, pos: BlockPos) -> BlockPos {
    let (x, z) = turn_xz(step, pos.x, pos.z);
    BlockPos::new(x, pos.y, z)
}

fn turn_xz<T>(step: Step, x: T, z: T) -> (T, T)
where
    T: std::ops::Neg<Output = T> + Copy,
{
    match step {
        Step::Rotate(rotation) => (0..rotation.quarter_turns()).fold((x, z), |(x, z), _| (-z, x)),
        Step::Mirror(Mirror::X) => (-x, z),
        Step::Mirror(Mirror::Z) => (x, -z),
    }
}

/// Min corner of a box after turning it.
fn turned_min(step: Step, min: BlockPos, max: BlockPos) -> BlockPos {
    turn_point(step, min).min(turn_point(step, max))
}

/// World offset of the turned region. Turned in 64 bits since `-i32::MIN` does not fit.
fn turned_offset(step: Step, offset: BlockPos, size: Dimensions) -> Result<BlockPos> {
    let corner = far_corner(size);
    let (x0, z0) = (i64::from(offset.x), i64::from(offset.z));
    let (ax, az) = turn_xz(step, x0, z0);
    let (bx, bz) = turn_xz(step, x0 + i64::from(corner.x), z0 + i64::from(corner.z));
    let fit = |value: i64, axis: &str| {
        i32::try_from(value).map_err(|_| {
            SchemError::invalid(
                format!("offset.{}", axis),
                format!("turned offset {} does not fit in 32 bits", value),
            )
        })
    };
    Ok(BlockPos::new(fit(ax.min(bx), "x")?, offset.y, fit(az.min(bz), "z")?))
}

fn turned_size(step: Step, size: Dimensions) -> Dimensions {
    match step {
        Step::Rotate(rotation) if rotation.quarter_turns() % 2 == 1 => size.swapped(),
        _ => size,
    }
}

fn far_corner(size: Dimensions) -> BlockPos {
    BlockPos::new(
        i32::from(size.width) - 1,
        i32::from(size.height) - 1,
        i32::from(size.length) - 1,
    )
}

fn double_list(tag: Option<&Tag>) -> Option<[f64; 3]> {
    match tag?.as_list()? {
        [Tag::Double(x), Tag::Double(y), Tag::Double(z)] => Some([*x, *y, *z]),
        _ => None,
    }
}

/// Folds an angle into (-180, 180]. Angles already in range come back bit for bit.
fn wrap_degrees(yaw: f64) -> f64 {
    if yaw > -180.0 && yaw <= 180.0 {
        return yaw;
    }
    let folded = yaw.rem_euclid(360.0);
    if folded > 180.0 {
        folded - 360.0
    } else {
        folded
    }
}

/// Entity positions are continuous: the region spans `0..width` and `0..length`.
/// A reflected coordinate is `extent - value`, so applying the step again restores
/// every value whose reflection is representable. Halves, quarters and other short
/// binary fractions always are; `0.1` is not, and comes back within one ulp of the extent.
fn transform_entity(entity: &Compound, step: Step, size: Dimensions) -> Compound {
    let mut entity = entity.clone();
    if step == Step::Rotate(Rotation::None) {
        return entity;
    }

    if let Some([x, y, z]) = double_list(entity.get("Pos")) {
        let (width, length) = (f64::from(size.width), f64::from(size.length));
        let (x, z) = match step {
            Step::Rotate(rotation) => match rotation.quarter_turns() {
                1 => (length - z, x),
                2 => (width - x, length - z),
                3 => (z, width - x),
                _ => (x, z),
            },
            Step::Mirror(Mirror::X) => (width - x, z),
            Step::Mirror(Mirror::Z) => (x, length - z),
        };
        entity.insert(
            "Pos".to_owned(),
            Tag::List(vec![Tag::Double(x), Tag::Double(y), Tag::Double(z)]),
        );
    }

    if let Some(Tag::List(angles)) = entity.get_mut("Rotation") {
        if let Some(Tag::Float(yaw)) = angles.first_mut() {
            let before = f64::from(*yaw);
            let after = match step {
                Step::Rotate(rotation) => before + f64::from(rotation.degrees()),
                Step::Mirror(Mirror::X) => -before,
                Step::Mirror(Mirror::Z) => 180.0 - before,
            };
            // A step that lands on the same heading keeps the stored value.
            if wrap_degrees(after) != wrap_degrees(before) {
                *yaw = wrap_degrees(after) as f32;
            }
        }
    }

    entity
}

/// Applies rotations and mirrors using a fixed property rule table.
#[derive(Debug, Clone, Copy)]
pub struct Transformer<'a> {
    rules: &'a RotationRules,
}

impl<'a> Transformer<'a> {
    pub fn new(rules: &'a RotationRules) -> Self {
        Transformer { rules }
    }

    /// Turns the region clockwise. For 90 and 270 degrees width and length swap.
    pub fn rotate(&self, region: &Region, rotation: Rotation) -> Result<Transformed> {
        self.apply(region, Step::Rotate(rotation))
    }

    pub fn mirror(&self, region: &Region, mirror: Mirror) -> Result<Transformed> {
        self.apply(region, Step::Mirror(mirror))
    }

    /// Rewrites a single block-state string as [`Transformer::rotate`] would.
    pub fn rotate_state(&self, name: &str, rotation: Rotation) -> (String, Vec<TransformWarning>) {
        let mut warnings = Vec::new();
        let name = transform_state(name, self.rules, Step::Rotate(rotation), &mut warnings);
        (name, warnings)
    }

    pub fn mirror_state(&self, name: &str, mirror: Mirror) -> (String, Vec<TransformWarning>) {
        let mut warnings = Vec::new();
        let name = transform_state(name, self.rules, Step::Mirror(mirror), &mut warnings);
        (name, warnings)
    }

    fn apply(&self, region: &Region, step: Step) -> Result<Transformed> {
        region.validate()?;

        let size = region.size;
        let new_size = turned_size(step, size);
        let corner = far_corner(size);
        let shift = turned_min(step, BlockPos::ZERO, corner);
        let cell = |pos: BlockPos| -> usize {
            let p = turn_point(step, pos).sub(shift);
            new_size.index_of(p.x as usize, p.y as usize, p.z as usize)
        };

        let offset = turned_offset(step, region.offset, size)?;

        let mut warnings = Vec::new();
        let mut palette = BlockPalette::new();
        let remap: Vec<u32> = region
            .palette
            .entries()
            .iter()
            .map(|name| palette.get_or_insert(&transform_state(name, self.rules, step, &mut warnings)))
            .collect();

        let mut blocks = vec![0; region.volume()];
        let mut biome_data = region.biomes.as_ref().map(|_| vec![0; region.volume()]);
        for y in 0..i32::from(size.height) {
            for z in 0..i32::from(size.length) {
                for x in 0..i32::from(size.width) {
                    let from = size.index_of(x as usize, y as usize, z as usize);
                    let to = cell(BlockPos::new(x, y, z));
                    blocks[to] = remap[region.blocks[from] as usize];
                    if let (Some(data), Some(biomes)) = (biome_data.as_mut(), region.biomes.as_ref()) {
                        data[to] = biomes.data[from];
                    }
                }
            }
        }

        let block_entities = region
            .block_entities
            .iter()
            .map(|be| BlockEntity {
                pos: turn_point(step, be.pos).sub(shift),
                data: be.data.clone(),
            })
            .collect();

        let entities = region
            .entities
            .iter()
            .map(|entity| transform_entity(entity, step, size))
            .collect();

        let mut seen = HashSet::new();
        warnings.retain(|warning| seen.insert(warning.clone()));
        for warning in &warnings {
            log(format!("{}", warning), LogSeverity::Warning);
        }

        Ok(Transformed {
            region: Region {
                size: new_size,
                offset,
                palette,
                blocks,
                biomes: region.biomes.as_ref().zip(biome_data).map(|(biomes, data)| BiomeLayer {
                    palette: biomes.palette.clone(),
                    data,
                }),
                block_entities,
                entities,
                metadata: region.metadata.clone(),
                data_version: region.data_version,
            },
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    // 3 wide, 1 high, 2 long:
    //   z=0: stone  air   log[x]
    //   z=1: air    glass air
    fn sample() -> Region {
        let mut region = Region::new(Dimensions::new(3, 1, 2));
        region.offset = BlockPos::new(10, 5, 20);
        region
            .set_block(BlockPos::new(0, 0, 0), "minecraft:stone")
            .unwrap();
        region
            .set_block(BlockPos::new(2, 0, 0), "minecraft:oak_log[axis=x]")
            .unwrap();
        region
            .set_block(BlockPos::new(1, 0, 1), "minecraft:glass")
            .unwrap();
        region.block_entities.push(BlockEntity {
            pos: BlockPos::new(2, 0, 0),
            data: Compound::new(),
        });
        region
    }

    fn transformer() -> Transformer<'static> {
        Transformer::new(RotationRules::vanilla())
    }

    #[test]
    fn test_from_degrees() {
        assert_eq!(Rotation::from_degrees(270), Ok(Rotation::Clockwise270));
        assert_eq!(Rotation::Clockwise180.degrees(), 180);
        assert_matches!(Rotation::from_degrees(45), Err(SchemError::InvalidValue { .. }));
        assert_matches!(Rotation::from_degrees(-90), Err(SchemError::InvalidValue { .. }));
    }

    #[test]
    fn test_rotate_clockwise() {
        let rotated = transformer()
            .rotate(&sample(), Rotation::Clockwise90)
            .unwrap()
            .region;

        assert_eq!(rotated.size, Dimensions::new(2, 1, 3));
        // (x, z) lands on (length - 1 - z, x)
        assert_eq!(rotated.block_at(BlockPos::new(1, 0, 0)), Some("minecraft:stone"));
        assert_eq!(rotated.block_at(BlockPos::new(0, 0, 1)), Some("minecraft:glass"));
        assert_eq!(
            rotated.block_at(BlockPos::new(1, 0, 2)),
            Some("minecraft:oak_log[axis=z]")
        );
        assert_eq!(rotated.block_entities[0].pos, BlockPos::new(1, 0, 2));
        // x range 10..=12, z range 20..=21 turns into x -21..=-20, z 10..=12
        assert_eq!(rotated.offset, BlockPos::new(-21, 5, 10));
        rotated.validate().unwrap();
    }

    #[test]
    fn test_mirror_x() {
        let mirrored = transformer().mirror(&sample(), Mirror::X).unwrap().region;

        assert_eq!(mirrored.size, Dimensions::new(3, 1, 2));
        assert_eq!(mirrored.block_at(BlockPos::new(2, 0, 0)), Some("minecraft:stone"));
        assert_eq!(
            mirrored.block_at(BlockPos::new(0, 0, 0)),
            Some("minecraft:oak_log[axis=x]")
        );
        assert_eq!(mirrored.offset, BlockPos::new(-12, 5, 20));
    }

    #[test]
    fn test_four_turns_are_identity() {
        let t = transformer();
        let region = sample();
        let mut turned = region.clone();
        for _ in 0..4 {
            turned = t.rotate(&turned, Rotation::Clockwise90).unwrap().region;
        }
        assert_eq!(turned, region);
    }

    #[test]
    fn test_biomes_follow_cells() {
        let mut region = sample();
        region.biomes = Some(BiomeLayer {
            palette: BlockPalette::from_entries(["minecraft:plains", "minecraft:river"]).unwrap(),
            data: vec![1, 0, 0, 0, 0, 0],
        });
        let rotated = transformer()
            .rotate(&region, Rotation::Clockwise90)
            .unwrap()
            .region;
        let biomes = rotated.biomes.unwrap();
        let at = rotated.size.index_of(1, 0, 0);

        assert_eq!(biomes.data[at], 1);
        assert_eq!(biomes.data.iter().filter(|&&b| b == 1).count(), 1);
    }

    #[test]
    fn test_entity_position_and_yaw() {
        let mut region = sample();
        region.entities.push(Compound::from([
            (
                "Pos".to_owned(),
                Tag::List(vec![Tag::Double(0.5), Tag::Double(1.0), Tag::Double(1.5)]),
            ),
            (
                "Rotation".to_owned(),
                Tag::List(vec![Tag::Float(135.0), Tag::Float(10.0)]),
            ),
        ]));

        let rotated = transformer()
            .rotate(&region, Rotation::Clockwise90)
            .unwrap()
            .region;
        let entity = &rotated.entities[0];

        // (x, z) lands on (length - z, x)
        assert_eq!(double_list(entity.get("Pos")), Some([0.5, 1.0, 0.5]));
        assert_eq!(
            entity.get("Rotation"),
            Some(&Tag::List(vec![Tag::Float(-135.0), Tag::Float(10.0)]))
        );
    }

    fn entity(pos: [f64; 3], yaw: f32) -> Compound {
        Compound::from([
            (
                "Pos".to_owned(),
                Tag::List(pos.iter().map(|&v| Tag::Double(v)).collect()),
            ),
            (
                "Rotation".to_owned(),
                Tag::List(vec![Tag::Float(yaw), Tag::Float(0.0)]),
            ),
        ])
    }

    fn yaw_of(entity: &Compound) -> Option<&Tag> {
        entity.get("Rotation")?.as_list()?.first()
    }

    #[test]
    fn test_wrap_degrees_keeps_half_turn() {
        assert_eq!(wrap_degrees(180.0), 180.0);
        assert_eq!(wrap_degrees(-180.0), 180.0);
        assert_eq!(wrap_degrees(270.0), -90.0);
        assert_eq!(wrap_degrees(540.0), 180.0);
        assert_eq!(wrap_degrees(-179.5), -179.5);
    }

    #[test]
    fn test_entity_identity_at_half_turn_yaw() {
        let t = transformer();
        let mut region = sample();
        region.entities.push(entity([0.375, 0.0, 1.8125], 180.0));
        region.entities.push(entity([2.999755859375, 0.5, 0.0625], -45.5));

        let mut turned = region.clone();
        for _ in 0..4 {
            turned = t.rotate(&turned, Rotation::Clockwise90).unwrap().region;
        }
        assert_eq!(turned, region);

        for axis in [Mirror::X, Mirror::Z] {
            let once = t.mirror(&region, axis).unwrap().region;
            let expected = match axis {
                Mirror::X => 180.0,
                Mirror::Z => 0.0,
            };
            assert_eq!(yaw_of(&once.entities[0]), Some(&Tag::Float(expected)));
            assert_eq!(t.mirror(&once, axis).unwrap().region, region);
        }
    }

    #[test]
    fn test_same_heading_keeps_stored_yaw() {
        let mut region = sample();
        region.entities.push(entity([1.0, 0.0, 1.0], -180.0));

        let mirrored = transformer().mirror(&region, Mirror::X).unwrap().region;
        assert_eq!(yaw_of(&mirrored.entities[0]), Some(&Tag::Float(-180.0)));

        let unturned = transformer().rotate(&region, Rotation::None).unwrap().region;
        assert_eq!(unturned, region);
    }

    #[test]
    fn test_decimal_positions_stay_within_one_ulp() {
        let t = transformer();
        let mut region = sample();
        region.entities.push(entity([0.1, 0.0, 0.3], 180.0));

        let once = t.mirror(&region, Mirror::X).unwrap().region;
        // 3 - 0.1 is rounded once, to the nearest double
        assert_eq!(double_list(once.entities[0].get("Pos")), Some([3.0 - 0.1, 0.0, 0.3]));

        let twice = t.mirror(&once, Mirror::X).unwrap().region;
        let [x, y, z] = double_list(twice.entities[0].get("Pos")).unwrap();
        assert!((x - 0.1).abs() <= 3.0 * f64::EPSILON);
        assert_eq!((y, z), (0.0, 0.3));
        assert_eq!(yaw_of(&twice.entities[0]), Some(&Tag::Float(180.0)));

        let mut turned = region.clone();
        for _ in 0..4 {
            turned = t.rotate(&turned, Rotation::Clockwise90).unwrap().region;
        }
        let [x, _, z] = double_list(turned.entities[0].get("Pos")).unwrap();
        assert!((x - 0.1).abs() <= 3.0 * f64::EPSILON);
        assert!((z - 0.3).abs() <= 2.0 * f64::EPSILON);
        assert_eq!(yaw_of(&turned.entities[0]), Some(&Tag::Float(180.0)));
    }

    #[test]
    fn test_extreme_offset_is_rejected() {
        let mut region = Region::new(Dimensions::new(1, 1, 1));
        region.offset = BlockPos::new(0, 0, i32::MIN);
        assert_matches!(
            transformer().mirror(&region, Mirror::Z),
            Err(SchemError::InvalidValue { path, .. }) if path == "offset.z"
        );
        assert_matches!(
            transformer().rotate(&region, Rotation::Clockwise90),
            Err(SchemError::InvalidValue { path, .. }) if path == "offset.x"
        );
        assert!(transformer().mirror(&region, Mirror::X).is_ok());
    }

    #[test]
    fn test_spaced_entries_are_not_merged() {
        let mut region = Region::new(Dimensions::new(2, 1, 1));
        region
            .set_block(BlockPos::new(0, 0, 0), "minecraft:oak_log[ axis=x]")
            .unwrap();
        region
            .set_block(BlockPos::new(1, 0, 0), "minecraft:oak_log[axis=z]")
            .unwrap();

        let t = transformer();
        let rotated = t.rotate(&region, Rotation::Clockwise90).unwrap().region;
        assert_eq!(rotated.palette.len(), region.palette.len());

        let mut turned = region.clone();
        for _ in 0..4 {
            turned = t.rotate(&turned, Rotation::Clockwise90).unwrap().region;
        }
        assert_eq!(turned, region);
    }

    #[test]
    fn test_warnings_are_collected_once() {
        let mut region = Region::new(Dimensions::new(2, 1, 1));
        region
            .set_block(BlockPos::new(0, 0, 0), "mymod:fan[facing=north,on=true]")
            .unwrap();
        region
            .set_block(BlockPos::new(1, 0, 0), "mymod:fan[facing=north,on=false]")
            .unwrap();

        let result = transformer().rotate(&region, Rotation::Clockwise90).unwrap();
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(
            result.region.block_at(BlockPos::new(0, 0, 0)),
            Some("mymod:fan[facing=north,on=true]")
        );
    }

    #[test]
    fn test_invalid_region_rejected() {
        let mut region = sample();
        region.blocks.pop();
        assert_matches!(
            transformer().rotate(&region, Rotation::Clockwise90),
            Err(SchemError::InvalidValue { .. })
        );
    }
}
