#![allow(dead_code)]

use schem::format::region::{BiomeLayer, BlockEntity, BlockPalette};
use schem::{BlockPos, Compression, Dimensions, FormatVersion, Region, SchematicBuilder, Tag, WriteOptions};
use schem::nbt::Compound;

/// Every version that keeps block names as strings.
pub const MODERN_VERSIONS: [FormatVersion; 4] = [
    FormatVersion::SpongeV1,
    FormatVersion::SpongeV2,
    FormatVersion::SpongeV3,
    FormatVersion::Litematic,
];

pub fn options(version: FormatVersion, compression: Compression) -> WriteOptions {
    WriteOptions {
        version,
        compression,
    }
}

/// Two cells in a row: stone then air.
pub fn stone_and_air() -> Region {
    let mut region = Region::new(Dimensions::new(2, 1, 1));
    region.palette = BlockPalette::from_entries(["minecraft:air", "minecraft:stone"]).unwrap();
    region.blocks = vec![1, 0];
    region
}

/// A small porch with directional blocks, a chest and a sign.
pub fn porch() -> Region {
    let mut builder = SchematicBuilder::new();
    for x in 0..4 {
        for z in 0..3 {
            builder.set_block(BlockPos::new(x, 64, z), "minecraft:oak_planks");
        }
    }
    builder
        .set_block(
            BlockPos::new(1, 65, 0),
            "minecraft:oak_stairs[facing=north,half=bottom,shape=straight,waterlogged=false]",
        )
        .set_block(
            BlockPos::new(2, 65, 0),
            "minecraft:oak_stairs[facing=north,half=bottom,shape=outer_left,waterlogged=false]",
        )
        .set_block(BlockPos::new(0, 65, 2), "minecraft:oak_log[axis=x]")
        .set_block(BlockPos::new(3, 65, 2), "minecraft:chest[facing=west,type=single,waterlogged=false]")
        .set_block(BlockPos::new(3, 66, 1), "minecraft:oak_sign[rotation=5,waterlogged=false]")
        .set_block(
            BlockPos::new(0, 66, 0),
            "minecraft:oak_fence[east=true,north=false,south=false,waterlogged=false,west=false]",
        )
        .set_block_entity(
            BlockPos::new(3, 65, 2),
            Compound::from([("Id".to_owned(), Tag::string("minecraft:chest"))]),
        )
        .set_offset(BlockPos::new(-2, 0, -1))
        .set_metadata("Name", Tag::string("porch"))
        .set_data_version(3465);
    builder.build().unwrap()
}

pub fn with_biomes(mut region: Region) -> Region {
    let volume = region.volume();
    region.biomes = Some(BiomeLayer {
        palette: BlockPalette::from_entries(["minecraft:plains"]).unwrap(),
        data: vec![0; volume],
    });
    region
}

pub fn with_entity(mut region: Region) -> Region {
    region.entities.push(Compound::from([
        ("Id".to_owned(), Tag::string("minecraft:armor_stand")),
        (
            "Pos".to_owned(),
            Tag::List(vec![Tag::Double(1.5), Tag::Double(1.0), Tag::Double(0.5)]),
        ),
        (
            "Rotation".to_owned(),
            Tag::List(vec![Tag::Float(90.0), Tag::Float(0.0)]),
        ),
    ]));
    region
}

fn mob(pos: [f64; 3], yaw: f32, pitch: f32) -> Compound {
    Compound::from([
        ("Id".to_owned(), Tag::string("minecraft:pig")),
        (
            "Pos".to_owned(),
            Tag::List(pos.iter().map(|&v| Tag::Double(v)).collect()),
        ),
        (
            "Rotation".to_owned(),
            Tag::List(vec![Tag::Float(yaw), Tag::Float(pitch)]),
        ),
    ])
}

/// Entities on odd fractions of a block facing due north and south-west-ish.
pub fn with_herd(mut region: Region) -> Region {
    region.entities.push(mob([0.8125, 1.0, 2.6875], 180.0, 12.5));
    region.entities.push(mob([3.99609375, 2.25, 0.015625], -67.25, -30.0));
    region
}

/// An entity at decimal coordinates that binary doubles only approximate.
pub fn with_decimal_entity(mut region: Region) -> Region {
    region.entities.push(mob([0.1, 1.0, 0.3], 180.0, 0.0));
    region
}

pub fn entity_pos(entity: &Compound) -> [f64; 3] {
    match entity.get("Pos").and_then(Tag::as_list) {
        Some([Tag::Double(x), Tag::Double(y), Tag::Double(z)]) => [*x, *y, *z],
        other => panic!("entity without a Pos list: {:?}", other),
    }
}

pub fn block_entity(pos: BlockPos, id: &str) -> BlockEntity {
    BlockEntity {
        pos,
        data: Compound::from([("Id".to_owned(), Tag::string(id))]),
    }
}
