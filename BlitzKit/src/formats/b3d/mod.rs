//! B3D (Blitz3D) model format
//!
//! A little-endian tag/length/value tree rooted at a `BB3D` chunk. Texture
//! and brush lists, a node hierarchy with meshes, bone weights and keyframes
//! are decoded into a flat [`SceneGraph`]; see [`crate::scene`] for the
//! assembly pass that turns it into renderable surfaces.

mod chunk;
mod graph;
mod inspect;
mod reader;
mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use chunk::{CHUNK_HEADER_SIZE, Chunk, ChunkId, ChunkPayload, ChunkTag};
pub use graph::SceneGraph;
pub use inspect::{BrushSummary, MeshSummary, ModelSummary, NodeKind, NodeSummary, TextureSummary};
pub use reader::{load_model, load_model_with, read_model, read_model_with};
pub use types::{
    BlendMode, BoneId, BoneWeights, Brush, BrushList, KeyFlags, KeyframeTrack, MeshData, MeshId,
    NodeId, ObjectHandle, SceneNode, SparseKeys, TextureFlags, TextureKind, TextureRef,
    TriangleList, Vertex, VertexBuffer, VertexFlags,
};

/// "BB3D" root tag
pub const B3D_MAGIC: [u8; 4] = *b"BB3D";

/// Highest frame number accepted in `KEYS` records.
pub const MAX_KEY_FRAME: usize = 1 << 20;

/// Deepest chunk nesting accepted, the root chunk counting as one level.
pub const MAX_CHUNK_DEPTH: usize = 256;
