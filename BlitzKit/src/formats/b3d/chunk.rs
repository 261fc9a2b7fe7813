//! Chunk tree records
//!
//! Every chunk of a model lives in one flat arena owned by the
//! [`SceneGraph`](super::SceneGraph); parent and child links are indices
//! into that arena.

use std::fmt;

use super::types::{BoneId, MeshId, NodeId};

/// Size of a chunk header: 4-byte tag plus 4-byte length.
pub const CHUNK_HEADER_SIZE: u64 = 8;

/// Index of a chunk in [`SceneGraph::chunks`](super::SceneGraph::chunks).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(pub usize);

impl ChunkId {
    /// Arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Known chunk tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkTag {
    /// `BB3D` root container.
    Bb3d,
    /// `TEXS` texture reference list.
    Texs,
    /// `BRUS` brush (material) list.
    Brus,
    /// `NODE` scene node.
    Node,
    /// `MESH` mesh container.
    Mesh,
    /// `VRTS` vertex data.
    Vrts,
    /// `TRIS` triangle list.
    Tris,
    /// `BONE` vertex weights.
    Bone,
    /// `KEYS` keyframes.
    Keys,
    /// `ANIM` animation summary.
    Anim,
    /// Any other tag, skipped by length.
    Other([u8; 4]),
}

impl ChunkTag {
    /// Classify a raw tag.
    #[must_use]
    pub fn from_bytes(tag: [u8; 4]) -> Self {
        match &tag {
            b"BB3D" => Self::Bb3d,
            b"TEXS" => Self::Texs,
            b"BRUS" => Self::Brus,
            b"NODE" => Self::Node,
            b"MESH" => Self::Mesh,
            b"VRTS" => Self::Vrts,
            b"TRIS" => Self::Tris,
            b"BONE" => Self::Bone,
            b"KEYS" => Self::Keys,
            b"ANIM" => Self::Anim,
            _ => Self::Other(tag),
        }
    }

    /// The raw 4 bytes of this tag.
    #[must_use]
    pub fn to_bytes(self) -> [u8; 4] {
        match self {
            Self::Bb3d => *b"BB3D",
            Self::Texs => *b"TEXS",
            Self::Brus => *b"BRUS",
            Self::Node => *b"NODE",
            Self::Mesh => *b"MESH",
            Self::Vrts => *b"VRTS",
            Self::Tris => *b"TRIS",
            Self::Bone => *b"BONE",
            Self::Keys => *b"KEYS",
            Self::Anim => *b"ANIM",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.to_bytes() {
            if byte.is_ascii_graphic() || byte == b' ' {
                write!(f, "{}", char::from(byte))?;
            } else {
                write!(f, "\\x{byte:02x}")?;
            }
        }
        Ok(())
    }
}

/// Decoded content attached to a chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkPayload {
    /// Pure container (the root) or a chunk still being decoded.
    Container,
    /// Index into [`SceneGraph::texture_lists`](super::SceneGraph::texture_lists).
    Textures(usize),
    /// Index into [`SceneGraph::brush_lists`](super::SceneGraph::brush_lists).
    Brushes(usize),
    /// The scene node this chunk produced.
    Node(NodeId),
    /// The mesh this chunk produced.
    Mesh(MeshId),
    /// Vertex data appended to a mesh's shared buffer.
    Vertices {
        /// Owning mesh.
        mesh: MeshId,
        /// Number of vertices this chunk contributed.
        count: usize,
    },
    /// A triangle list of a mesh.
    Triangles {
        /// Owning mesh.
        mesh: MeshId,
        /// Index into the mesh's triangle lists.
        list: usize,
    },
    /// Bone weights.
    Bone(BoneId),
    /// Keyframes merged into the enclosing node's track.
    Keys {
        /// Number of key records in this chunk.
        records: usize,
    },
    /// Animation summary record.
    Anim {
        /// Declared frame count.
        frames: i32,
        /// Declared frame rate (unused by assembly).
        fps: f32,
    },
    /// Not decoded: unknown tag, disabled feature, or misplaced chunk.
    Skipped,
}

/// One chunk of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Chunk tag.
    pub tag: ChunkTag,
    /// Absolute offset of the tag.
    pub start: u64,
    /// Total length including the 8-byte header, clamped to the parent.
    pub length: u64,
    /// Length field as stored in the file (header excluded).
    pub declared_length: u32,
    /// Containing chunk; `None` for the root.
    pub parent: Option<ChunkId>,
    /// Child chunks in file order.
    pub children: Vec<ChunkId>,
    /// Decoded content.
    pub payload: ChunkPayload,
}

impl Chunk {
    /// Absolute offset one past the last byte.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.start + self.length
    }

    /// Absolute offset of the first body byte.
    #[must_use]
    pub fn body_start(&self) -> u64 {
        self.start + CHUNK_HEADER_SIZE
    }

    /// Body length (header excluded).
    #[must_use]
    pub fn body_len(&self) -> u64 {
        self.length.saturating_sub(CHUNK_HEADER_SIZE)
    }

    /// True when the stored length had to be shortened to fit the parent.
    #[must_use]
    pub fn was_clamped(&self) -> bool {
        u64::from(self.declared_length) + CHUNK_HEADER_SIZE != self.length
    }
}
