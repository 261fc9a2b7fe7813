//! Decoded B3D records
//!
//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT

use bitflags::bitflags;
use glam::{Quat, Vec2, Vec3, Vec4};
use serde::Serialize;

use super::chunk::ChunkId;

// ============================================================================
// Identifiers
// ============================================================================

/// Index into [`SceneGraph::nodes`](super::SceneGraph::nodes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub usize);

/// Index into [`SceneGraph::meshes`](super::SceneGraph::meshes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MeshId(pub usize);

/// Index into [`SceneGraph::bones`](super::SceneGraph::bones).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BoneId(pub usize);

/// Opaque handle to an engine object built from a node.
///
/// The decoder never sets this; consumers attach their own handles with
/// [`SceneGraph::attach_object`](super::SceneGraph::attach_object).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle(pub u64);

// ============================================================================
// Textures & brushes
// ============================================================================

bitflags! {
    /// Texture flag bits as stored in `TEXS` records.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TextureFlags: u32 {
        /// Color channel.
        const COLOR = 0x0001;
        /// Texture carries alpha.
        const ALPHA = 0x0002;
        /// Black pixels are transparent.
        const MASKED = 0x0004;
        /// Mipmapped.
        const MIPMAP = 0x0008;
        /// Clamp U coordinates.
        const CLAMP_U = 0x0010;
        /// Clamp V coordinates.
        const CLAMP_V = 0x0020;
        /// Spherical environment map; never bound to the primary slot.
        const SPHERE_MAP = 0x0040;
        /// Cubic environment map.
        const CUBE_MAP = 0x0080;
        /// Uses the secondary UV channel.
        const SECONDARY_UV = 0x1_0000;
    }
}

/// Texture or brush blend mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BlendMode {
    /// 0
    Replace,
    /// 1
    Alpha,
    /// 2
    Multiply,
    /// 3
    Add,
    /// 4
    Dot3,
    /// 5
    Multiply2,
    /// Any other stored value.
    Unknown(i32),
}

impl BlendMode {
    /// Map a stored blend value.
    #[must_use]
    pub fn from_raw(value: i32) -> Self {
        match value {
            0 => Self::Replace,
            1 => Self::Alpha,
            2 => Self::Multiply,
            3 => Self::Add,
            4 => Self::Dot3,
            5 => Self::Multiply2,
            other => Self::Unknown(other),
        }
    }

    /// The stored blend value.
    #[must_use]
    pub fn to_raw(self) -> i32 {
        match self {
            Self::Replace => 0,
            Self::Alpha => 1,
            Self::Multiply => 2,
            Self::Add => 3,
            Self::Dot3 => 4,
            Self::Multiply2 => 5,
            Self::Unknown(other) => other,
        }
    }
}

/// How a texture file name should be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TextureKind {
    /// `.bmp`
    Bitmap,
    /// `.dds`
    BlockTexture,
    /// Anything else (PNG, JPEG, ...).
    Other,
}

impl TextureKind {
    /// Classify by file extension, ignoring case.
    #[must_use]
    pub fn from_file_name(name: &str) -> Self {
        let ext = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("bmp") => Self::Bitmap,
            Some("dds") => Self::BlockTexture,
            _ => Self::Other,
        }
    }
}

/// One `TEXS` record.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureRef {
    /// File name as stored, possibly with a directory.
    pub name: String,
    /// Flag bits (unknown bits are preserved).
    pub flags: TextureFlags,
    /// Blend mode.
    pub blend: BlendMode,
    /// UV offset.
    pub offset: Vec2,
    /// UV scale; Y is negated relative to the file.
    pub scale: Vec2,
    /// Rotation in radians.
    pub rotation: f32,
}

impl TextureRef {
    /// File name with any `/` or `\` directory stripped.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.name.as_str())
    }

    /// Decoder to use for this texture.
    #[must_use]
    pub fn kind(&self) -> TextureKind {
        TextureKind::from_file_name(&self.name)
    }

    /// Whether this texture may occupy a brush's primary slot.
    #[must_use]
    pub fn uses_primary_slot(&self) -> bool {
        !self.flags.contains(TextureFlags::SPHERE_MAP)
    }
}

/// One `BRUS` record.
#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    /// Material name.
    pub name: String,
    /// RGBA color, 0-1.
    pub color: Vec4,
    /// Shininess.
    pub shininess: f32,
    /// Blend mode.
    pub blend: BlendMode,
    /// Effect bits, kept raw.
    pub fx: i32,
    /// Texture slot indices into the texture list, `-1` for an empty slot.
    pub texture_ids: Vec<i32>,
}

impl Brush {
    /// Texture slot `slot`, if set.
    #[must_use]
    pub fn texture(&self, slot: usize) -> Option<usize> {
        self.texture_ids
            .get(slot)
            .and_then(|&id| usize::try_from(id).ok())
    }
}

/// All brushes of one `BRUS` chunk.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BrushList {
    /// Texture slots per brush.
    pub texnum: usize,
    /// Brushes in file order.
    pub brushes: Vec<Brush>,
}

// ============================================================================
// Geometry
// ============================================================================

bitflags! {
    /// `VRTS` flag bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VertexFlags: u32 {
        /// Each vertex stores a normal.
        const NORMALS = 0x1;
        /// Each vertex stores an RGBA color.
        const COLORS = 0x2;
    }
}

/// A decoded vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    /// Position (axis-flipped).
    pub position: Vec3,
    /// Normal (axis-flipped), zero when absent.
    pub normal: Vec3,
    /// RGBA color, opaque white when absent.
    pub color: Vec4,
    /// Texture coordinates, `[set][component]`. A single `[0, 0]` pair when
    /// the buffer declares no sets or zero-width sets.
    pub tex_coords: Vec<Vec<f32>>,
}

impl Vertex {
    /// First two components of coordinate set `set`.
    #[must_use]
    pub fn uv(&self, set: usize) -> Option<Vec2> {
        let coords = self.tex_coords.get(set)?;
        Some(Vec2::new(
            coords.first().copied().unwrap_or(0.0),
            coords.get(1).copied().unwrap_or(0.0),
        ))
    }
}

/// Vertex data shared by every triangle list of one mesh.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VertexBuffer {
    /// Flags shared by every `VRTS` header of the mesh.
    pub flags: VertexFlags,
    /// Texture coordinate sets shared by every `VRTS` header.
    pub tex_coord_sets: i32,
    /// Components per set shared by every `VRTS` header.
    pub tex_coord_set_size: i32,
    /// Vertices of all `VRTS` chunks, in file order.
    pub vertices: Vec<Vertex>,
}

impl VertexBuffer {
    /// Number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// True when no vertices were read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// One `TRIS` chunk.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriangleList {
    /// Brush index, `-1` to inherit.
    pub brush_id: i32,
    /// Vertex index triples with the winding already corrected.
    pub triangles: Vec<[i32; 3]>,
}

/// One `MESH` chunk.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    /// Brush index; `-1` means each triangle list names its own brush.
    pub brush_id: i32,
    /// Merged vertex buffer.
    pub vertices: VertexBuffer,
    /// Triangle lists in file order.
    pub triangle_lists: Vec<TriangleList>,
    /// `VRTS` chunks that fed [`Self::vertices`].
    pub vertex_chunks: Vec<ChunkId>,
    /// `TRIS` chunks, parallel to [`Self::triangle_lists`].
    pub triangle_chunks: Vec<ChunkId>,
}

impl MeshData {
    /// Total triangle count over all lists.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangle_lists.iter().map(|l| l.triangles.len()).sum()
    }

    /// True when every triangle list shares the mesh brush.
    #[must_use]
    pub fn has_single_material(&self) -> bool {
        self.brush_id != -1
    }
}

// ============================================================================
// Skinning & animation
// ============================================================================

/// One `BONE` chunk: parallel vertex ids and weights.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoneWeights {
    /// Vertex indices into the owning mesh.
    pub vertex_ids: Vec<i32>,
    /// Weights, parallel to `vertex_ids`.
    pub weights: Vec<f32>,
}

impl BoneWeights {
    /// Iterate `(vertex, weight)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (i32, f32)> + '_ {
        self.vertex_ids.iter().copied().zip(self.weights.iter().copied())
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertex_ids.len()
    }

    /// True when the chunk had no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertex_ids.is_empty()
    }
}

bitflags! {
    /// Channels present in a keyframe track.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeyFlags: u32 {
        /// Position keys.
        const POSITION = 0x1;
        /// Scale keys.
        const SCALE = 0x2;
        /// Rotation keys.
        const ROTATION = 0x4;
    }
}

/// Array indexed by frame number with a parallel "set" mask.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SparseKeys<T> {
    used: Vec<bool>,
    values: Vec<T>,
}

impl<T: Copy + Default> SparseKeys<T> {
    /// Store `value` at `frame`, growing to `frame + 1` entries if needed.
    pub fn insert(&mut self, frame: usize, value: T) {
        if self.used.len() <= frame {
            self.used.resize(frame + 1, false);
            self.values.resize(frame + 1, T::default());
        }
        self.used[frame] = true;
        self.values[frame] = value;
    }

    /// Value at `frame` if that frame was set.
    #[must_use]
    pub fn get(&self, frame: usize) -> Option<T> {
        match self.used.get(frame) {
            Some(true) => self.values.get(frame).copied(),
            _ => None,
        }
    }

    /// Whether `frame` was set.
    #[must_use]
    pub fn is_used(&self, frame: usize) -> bool {
        self.used.get(frame).copied().unwrap_or(false)
    }

    /// Array length (highest set frame + 1).
    #[must_use]
    pub fn len(&self) -> usize {
        self.used.len()
    }

    /// True when no frame was ever set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    /// Set frames in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, T)> + '_ {
        self.used
            .iter()
            .zip(&self.values)
            .enumerate()
            .filter(|(_, (used, _))| **used)
            .map(|(frame, (_, value))| (frame, *value))
    }

    /// Number of set frames.
    #[must_use]
    pub fn used_count(&self) -> usize {
        self.used.iter().filter(|u| **u).count()
    }
}

/// Keyframes of one node, merged over all its `KEYS` chunks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyframeTrack {
    /// Union of the flags of every merged chunk.
    pub flags: KeyFlags,
    /// Position keys (axis-flipped).
    pub positions: SparseKeys<Vec3>,
    /// Scale keys (axis-flipped).
    pub scales: SparseKeys<Vec3>,
    /// Rotation keys (axis-flipped, not normalized).
    pub rotations: SparseKeys<Quat>,
}

impl KeyframeTrack {
    /// Longest channel length.
    #[must_use]
    pub fn frame_span(&self) -> usize {
        self.positions
            .len()
            .max(self.scales.len())
            .max(self.rotations.len())
    }
}

// ============================================================================
// Scene nodes
// ============================================================================

/// One `NODE` chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    /// Node name.
    pub name: String,
    /// Local position (axis-flipped).
    pub position: Vec3,
    /// Local scale (axis-flipped).
    pub scale: Vec3,
    /// Local rotation, unit length (axis-flipped).
    pub rotation: Quat,
    /// Containing node, when the chunk sits directly inside a `NODE`.
    pub parent: Option<NodeId>,
    /// First `MESH` child.
    pub mesh: Option<MeshId>,
    /// First `BONE` child.
    pub bone: Option<BoneId>,
    /// Merged `KEYS` children.
    pub animation: Option<KeyframeTrack>,
    /// 1-based id in completion order (children before parents).
    pub id: u32,
    /// The `NODE` chunk.
    pub chunk: ChunkId,
    /// Engine object attached by a consumer.
    pub object: Option<ObjectHandle>,
}

impl SceneNode {
    /// True when this node is a skeletal joint.
    #[must_use]
    pub fn is_bone(&self) -> bool {
        self.bone.is_some()
    }
}
