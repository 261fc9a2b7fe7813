//! Decoded model: chunk arena plus the typed records it produced

use super::chunk::{Chunk, ChunkId};
use super::types::{
    BoneId, BoneWeights, Brush, BrushList, MeshData, MeshId, NodeId, ObjectHandle, SceneNode,
    TextureRef,
};

/// Everything decoded from one model file.
///
/// All cross references are indices into the vectors held here; no record
/// owns another.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneGraph {
    /// Version number stored after the root header.
    pub version: i32,
    /// Chunk arena; index 0 is the root.
    pub chunks: Vec<Chunk>,
    /// One entry per `TEXS` chunk.
    pub texture_lists: Vec<Vec<TextureRef>>,
    /// One entry per `BRUS` chunk.
    pub brush_lists: Vec<BrushList>,
    /// Nodes in completion order; `nodes[i].id == i + 1`.
    pub nodes: Vec<SceneNode>,
    /// One entry per `MESH` chunk.
    pub meshes: Vec<MeshData>,
    /// One entry per `BONE` chunk.
    pub bones: Vec<BoneWeights>,
    /// Largest frame count over all `ANIM` chunks; 0 without animation.
    pub anim_frames: i32,
}

impl SceneGraph {
    /// The texture list brushes refer to (the first `TEXS` chunk).
    #[must_use]
    pub fn textures(&self) -> &[TextureRef] {
        self.texture_lists.first().map_or(&[], Vec::as_slice)
    }

    /// The brush list meshes refer to (the first `BRUS` chunk).
    #[must_use]
    pub fn brushes(&self) -> &[Brush] {
        self.brush_lists.first().map_or(&[], |list| list.brushes.as_slice())
    }

    /// Root chunk id.
    #[must_use]
    pub fn root(&self) -> ChunkId {
        ChunkId(0)
    }

    /// Chunk by id.
    #[must_use]
    pub fn chunk(&self, id: ChunkId) -> &Chunk {
        &self.chunks[id.0]
    }

    /// Node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id.0]
    }

    /// Mesh by id.
    #[must_use]
    pub fn mesh(&self, id: MeshId) -> &MeshData {
        &self.meshes[id.0]
    }

    /// Bone weights by id.
    #[must_use]
    pub fn bone(&self, id: BoneId) -> &BoneWeights {
        &self.bones[id.0]
    }

    /// Iterate nodes with their ids.
    pub fn node_ids(&self) -> impl DoubleEndedIterator<Item = NodeId> + ExactSizeIterator {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Nodes whose parent is `parent`, in node order.
    #[must_use]
    pub fn children_of(&self, parent: NodeId) -> Vec<NodeId> {
        self.node_ids()
            .filter(|&id| self.node(id).parent == Some(parent))
            .collect()
    }

    /// Nodes without a parent node.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        self.node_ids()
            .filter(|&id| self.node(id).parent.is_none())
            .collect()
    }

    /// Chain from the outermost ancestor down to `node`, inclusive.
    #[must_use]
    pub fn ancestry(&self, node: NodeId) -> Vec<NodeId> {
        let mut chain = vec![node];
        let mut current = self.node(node).parent;
        while let Some(parent) = current {
            // parent links always point to later nodes, so this terminates
            chain.push(parent);
            current = self.node(parent).parent;
        }
        chain.reverse();
        chain
    }

    /// Slash-joined names from the outermost ancestor down to `node`.
    #[must_use]
    pub fn node_path(&self, node: NodeId) -> String {
        self.ancestry(node)
            .into_iter()
            .map(|id| self.node(id).name.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// First node named `name`.
    #[must_use]
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.node_ids().find(|&id| self.node(id).name == name)
    }

    /// Record the engine object built for `node`.
    pub fn attach_object(&mut self, node: NodeId, handle: ObjectHandle) {
        self.nodes[node.0].object = Some(handle);
    }

    /// True when the file declares a non-empty animation.
    #[must_use]
    pub fn has_animation(&self) -> bool {
        self.anim_frames > 0
    }
}
