use std::{path::Path, sync::Arc};

use anyhow::Context;
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    assets::texture_atlas::TextureAtlasLayout,
    voxels::{block::BlockType, face::Face},
};

pub const BLOCK_DEFS_PATH: &str = "assets/defs/blocks.ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlockParams {
    /// Solid, hides the faces of its neighbors and has its own faces culled
    #[default]
    Default,
    /// Always emits every face
    DontCull,
    /// See-through, implies `DontCull`
    Transparent,
}

impl BlockParams {
    pub fn is_dont_cull(self) -> bool {
        matches!(self, BlockParams::DontCull | BlockParams::Transparent)
    }

    pub fn is_transparent(self) -> bool {
        self == BlockParams::Transparent
    }
}

/// Receives block geometry. Implemented by the chunk mesh builder.
pub trait MeshSink {
    /// Appends a quad as 4 vertices and 2 triangles, indexed from the current vertex count.
    fn push_quad(&mut self, corners: [Vec3; 4], uvs: [Vec2; 4], brightness: f32);

    fn vertex_count(&self) -> u32;
}

pub trait BlockModel: Send + Sync {
    /// Emits the single face of the block at `pos` (chunk-local, in blocks) facing `face`.
    fn build_face(&self, face: Face, pos: Vec3, atlas: &TextureAtlasLayout, sink: &mut dyn MeshSink);

    /// Emits the whole block, used for blocks that are never culled.
    fn build_mesh(&self, pos: Vec3, atlas: &TextureAtlasLayout, sink: &mut dyn MeshSink) {
        for face in Face::ALL {
            self.build_face(face, pos, atlas, sink);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureIndices {
    pub top: u16,
    pub bottom: u16,
    pub side: u16,
}

impl TextureIndices {
    pub fn new_single(index: u16) -> Self {
        TextureIndices {
            top: index,
            bottom: index,
            side: index,
        }
    }

    pub fn get_face_index(&self, face: Face) -> u16 {
        match face {
            Face::Top => self.top,
            Face::Bottom => self.bottom,
            _ => self.side,
        }
    }

    fn max(&self) -> u16 {
        self.top.max(self.bottom).max(self.side)
    }
}

/// A unit cube textured from the atlas.
#[derive(Debug, Clone)]
pub struct CubeModel {
    pub textures: TextureIndices,
}

impl BlockModel for CubeModel {
    fn build_face(&self, face: Face, pos: Vec3, atlas: &TextureAtlasLayout, sink: &mut dyn MeshSink) {
        let corners = face.corners().map(|corner| corner + pos);
        let uvs = atlas.tile_uvs(self.textures.get_face_index(face));
        sink.push_quad(corners, uvs, face.brightness());
    }
}

pub struct BlockEntry {
    pub name: String,
    pub params: BlockParams,
    pub model: Arc<dyn BlockModel>,
}

impl std::fmt::Debug for BlockEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockEntry")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("air can't be registered")]
    Air,
    #[error("block id {0} is already registered as '{1}'")]
    Duplicate(u8, String),
    #[error("block id {id} doesn't fit into a registry of {capacity} blocks")]
    Capacity { id: u8, capacity: usize },
    #[error("block '{name}' uses texture {index}, the atlas only has {capacity} tiles")]
    TextureOutOfAtlas {
        name: String,
        index: u16,
        capacity: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BlockTextureDefinition {
    Single(u16),
    PerFace { top: u16, bottom: u16, side: u16 },
}

impl From<&BlockTextureDefinition> for TextureIndices {
    fn from(definition: &BlockTextureDefinition) -> Self {
        match *definition {
            BlockTextureDefinition::Single(index) => TextureIndices::new_single(index),
            BlockTextureDefinition::PerFace { top, bottom, side } => {
                TextureIndices { top, bottom, side }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDefinition {
    pub id: u8,
    pub name: String,
    #[serde(default)]
    pub params: BlockParams,
    pub textures: BlockTextureDefinition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockDefinitions {
    #[serde(default)]
    pub atlas: TextureAtlasLayout,
    pub blocks: Vec<BlockDefinition>,
}

/// Culling parameters and geometry of every block type except air.
///
/// Read-only once built, shared between all worker threads.
pub struct BlockRegistry {
    // Indexed by block id - 1
    entries: Vec<Option<BlockEntry>>,
    atlas: TextureAtlasLayout,
}

impl BlockRegistry {
    /// Room for every id a `BlockType` can hold.
    pub const MAX_CAPACITY: usize = u8::MAX as usize;

    pub fn new(capacity: usize, atlas: TextureAtlasLayout) -> Self {
        let capacity = capacity.min(Self::MAX_CAPACITY);
        BlockRegistry {
            entries: (0..capacity).map(|_| None).collect(),
            atlas,
        }
    }

    /// The built-in block set, matching `assets/defs/blocks.ron`.
    pub fn with_default_blocks() -> Self {
        Self::from_definitions(&default_definitions())
            .unwrap_or_else(|error| panic!("Built-in block definitions are invalid: {}", error))
    }

    pub fn from_definitions(definitions: &BlockDefinitions) -> Result<Self, RegistryError> {
        let mut registry = BlockRegistry::new(Self::MAX_CAPACITY, definitions.atlas);

        for definition in &definitions.blocks {
            let textures = TextureIndices::from(&definition.textures);
            if !registry.atlas.contains(textures.max()) {
                return Err(RegistryError::TextureOutOfAtlas {
                    name: definition.name.clone(),
                    index: textures.max(),
                    capacity: registry.atlas.capacity(),
                });
            }

            registry.register(
                BlockType(definition.id),
                BlockEntry {
                    name: definition.name.clone(),
                    params: definition.params,
                    model: Arc::new(CubeModel { textures }),
                },
            )?;
        }

        Ok(registry)
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let defs_data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read block defs file {}", path.display()))?;
        let definitions: BlockDefinitions =
            ron::from_str(&defs_data).context("Failed to parse block defs file")?;
        let registry = Self::from_definitions(&definitions)
            .with_context(|| format!("Invalid block definitions in {}", path.display()))?;
        Ok(registry)
    }

    pub fn register(&mut self, block: BlockType, entry: BlockEntry) -> Result<(), RegistryError> {
        if block.is_air() {
            return Err(RegistryError::Air);
        }

        let capacity = self.entries.len();
        let Some(slot) = self.entries.get_mut(block.id() as usize - 1) else {
            return Err(RegistryError::Capacity {
                id: block.id(),
                capacity,
            });
        };

        if let Some(existing) = slot {
            return Err(RegistryError::Duplicate(block.id(), existing.name.clone()));
        }

        *slot = Some(entry);
        Ok(())
    }

    /// Panics if the block isn't registered: a block type without an entry is a
    /// registration bug, not something to paper over.
    pub fn get(&self, block: BlockType) -> &BlockEntry {
        match self.try_get(block) {
            Some(entry) => entry,
            None => panic!("Block type {} is not registered", block.id()),
        }
    }

    pub fn try_get(&self, block: BlockType) -> Option<&BlockEntry> {
        if block.is_air() {
            return None;
        }

        self.entries
            .get(block.id() as usize - 1)
            .and_then(Option::as_ref)
    }

    /// True if a face next to this block must be emitted. Air counts as see-through.
    pub fn reveals_neighbors(&self, block: BlockType) -> bool {
        block.is_air() || self.get(block).params.is_dont_cull()
    }

    pub fn atlas(&self) -> &TextureAtlasLayout {
        &self.atlas
    }

    pub fn len(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlockType, &BlockEntry)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| Some((BlockType(index as u8 + 1), entry.as_ref()?)))
    }
}

fn default_definitions() -> BlockDefinitions {
    let block = |block: BlockType, name: &str, params, textures| BlockDefinition {
        id: block.id(),
        name: name.to_string(),
        params,
        textures,
    };

    BlockDefinitions {
        atlas: TextureAtlasLayout::default(),
        blocks: vec![
            block(
                BlockType::STONE,
                "stone",
                BlockParams::Default,
                BlockTextureDefinition::Single(0),
            ),
            block(
                BlockType::EARTH,
                "earth",
                BlockParams::Default,
                BlockTextureDefinition::Single(1),
            ),
            block(
                BlockType::WOOD,
                "wood",
                BlockParams::Default,
                BlockTextureDefinition::PerFace {
                    top: 3,
                    bottom: 3,
                    side: 2,
                },
            ),
            block(
                BlockType::DEBUG,
                "debug",
                BlockParams::DontCull,
                BlockTextureDefinition::Single(5),
            ),
            block(
                BlockType::GLASS,
                "glass",
                BlockParams::Transparent,
                BlockTextureDefinition::Single(4),
            ),
        ],
    }
}
