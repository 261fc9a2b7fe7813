//! B3D model inspection utilities
//!
//! Serializable summaries used by the CLI `model inspect` / `model json`
//! commands.

use std::path::Path;

use serde::Serialize;

use super::graph::SceneGraph;
use super::reader::read_model;
use super::types::{BlendMode, SceneNode, TextureKind, VertexFlags};
use crate::error::Result;

/// Role of a node in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    /// Carries a mesh.
    Mesh,
    /// Skeletal joint.
    Bone,
    /// Transform only.
    Pivot,
}

impl NodeKind {
    fn of(node: &SceneNode) -> Self {
        if node.bone.is_some() {
            Self::Bone
        } else if node.mesh.is_some() {
            Self::Mesh
        } else {
            Self::Pivot
        }
    }
}

/// One node of a model.
#[derive(Debug, Clone, Serialize)]
pub struct NodeSummary {
    pub id: u32,
    pub name: String,
    pub path: String,
    pub parent: Option<u32>,
    pub kind: NodeKind,
    pub key_frames: usize,
}

/// One mesh of a model.
#[derive(Debug, Clone, Serialize)]
pub struct MeshSummary {
    pub node: String,
    pub brush_id: i32,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub triangle_lists: usize,
    pub has_normals: bool,
    pub has_colors: bool,
    pub tex_coord_sets: i32,
}

/// One brush of a model.
#[derive(Debug, Clone, Serialize)]
pub struct BrushSummary {
    pub name: String,
    pub color: [f32; 4],
    pub blend: BlendMode,
    pub texture_ids: Vec<i32>,
}

/// One texture reference of a model.
#[derive(Debug, Clone, Serialize)]
pub struct TextureSummary {
    pub name: String,
    pub file_name: String,
    pub kind: TextureKind,
    pub flags: u32,
    pub blend: BlendMode,
}

/// Complete model overview.
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub version: i32,
    pub chunk_count: usize,
    pub nodes: Vec<NodeSummary>,
    pub meshes: Vec<MeshSummary>,
    pub brushes: Vec<BrushSummary>,
    pub textures: Vec<TextureSummary>,
    pub bone_count: usize,
    pub anim_frames: i32,
}

impl ModelSummary {
    /// Summarize a decoded model.
    #[must_use]
    pub fn from_graph(graph: &SceneGraph) -> Self {
        let nodes = graph
            .node_ids()
            .map(|id| {
                let node = graph.node(id);
                NodeSummary {
                    id: node.id,
                    name: node.name.clone(),
                    path: graph.node_path(id),
                    parent: node.parent.map(|p| graph.node(p).id),
                    kind: NodeKind::of(node),
                    key_frames: node.animation.as_ref().map_or(0, |t| t.frame_span()),
                }
            })
            .collect();

        let meshes = graph
            .nodes
            .iter()
            .filter_map(|node| node.mesh.map(|mesh| (node, graph.mesh(mesh))))
            .map(|(node, mesh)| MeshSummary {
                node: node.name.clone(),
                brush_id: mesh.brush_id,
                vertex_count: mesh.vertices.len(),
                triangle_count: mesh.triangle_count(),
                triangle_lists: mesh.triangle_lists.len(),
                has_normals: mesh.vertices.flags.contains(VertexFlags::NORMALS),
                has_colors: mesh.vertices.flags.contains(VertexFlags::COLORS),
                tex_coord_sets: mesh.vertices.tex_coord_sets,
            })
            .collect();

        let brushes = graph
            .brushes()
            .iter()
            .map(|brush| BrushSummary {
                name: brush.name.clone(),
                color: brush.color.to_array(),
                blend: brush.blend,
                texture_ids: brush.texture_ids.clone(),
            })
            .collect();

        let textures = graph
            .textures()
            .iter()
            .map(|tex| TextureSummary {
                name: tex.name.clone(),
                file_name: tex.file_name().to_string(),
                kind: tex.kind(),
                flags: tex.flags.bits(),
                blend: tex.blend,
            })
            .collect();

        Self {
            version: graph.version,
            chunk_count: graph.chunks.len(),
            nodes,
            meshes,
            brushes,
            textures,
            bone_count: graph.nodes.iter().filter(|n| n.is_bone()).count(),
            anim_frames: graph.anim_frames,
        }
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Read a model from disk and summarize it.
///
/// # Errors
/// Returns an error if the file cannot be read or decoded.
pub fn inspect_model<P: AsRef<Path>>(source: P) -> Result<ModelSummary> {
    let graph = read_model(source)?;
    Ok(ModelSummary::from_graph(&graph))
}
