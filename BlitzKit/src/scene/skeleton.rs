//! Skeleton grouping and per-vertex skin weights
//!
//! B3D has no explicit link between a run of bones and the mesh they
//! deform. Walking the nodes in reverse completion order, every contiguous
//! run of bone nodes forms one skeleton, owned by the parent of the first
//! bone met in that run.

use glam::Mat4;
use serde::Serialize;

use crate::formats::b3d::{NodeId, SceneGraph};

/// Influences kept per vertex.
pub const MAX_INFLUENCES: usize = 4;

/// Up to four `(bone, weight)` influences on one vertex.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct VertexInfluences {
    /// Bone indices into [`Skeleton::bones`].
    pub bones: [u32; MAX_INFLUENCES],
    /// Weight per slot; zero marks a free slot.
    pub weights: [f32; MAX_INFLUENCES],
}

impl VertexInfluences {
    /// Put `weight` in the first slot whose weight is still zero.
    ///
    /// Returns false when all four slots are taken and the influence is
    /// dropped.
    #[allow(clippy::float_cmp)]
    pub fn add(&mut self, bone: u32, weight: f32) -> bool {
        match self.weights.iter().position(|w| *w == 0.0) {
            Some(slot) => {
                self.bones[slot] = bone;
                self.weights[slot] = weight;
                true
            }
            None => false,
        }
    }

    /// Number of non-zero slots.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn count(&self) -> usize {
        self.weights.iter().filter(|w| **w != 0.0).count()
    }
}

/// One run of bone nodes and the weights it contributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Skeleton {
    /// Parent of the first bone met; the node whose mesh is skinned.
    pub owner: Option<NodeId>,
    /// Bone nodes in run order; a bone's index here is its skin index.
    pub bones: Vec<NodeId>,
    /// Inverse world matrix of each bone, parallel to `bones`.
    pub inverse_bind: Vec<Mat4>,
    /// Influences per vertex of the owner's mesh.
    pub influences: Vec<VertexInfluences>,
    /// Influences beyond four on one vertex.
    pub dropped: usize,
}

impl Skeleton {
    fn start(graph: &SceneGraph, first_bone: NodeId) -> Self {
        let owner = graph.node(first_bone).parent;
        let vertex_count = owner
            .and_then(|o| graph.node(o).mesh)
            .map_or(0, |m| graph.mesh(m).vertices.len());
        Self {
            owner,
            bones: Vec::new(),
            inverse_bind: Vec::new(),
            influences: vec![VertexInfluences::default(); vertex_count],
            dropped: 0,
        }
    }

    fn push_bone(&mut self, graph: &SceneGraph, node: NodeId, world: &Mat4) {
        let index = self.bones.len() as u32;
        if let Some(bone) = graph.node(node).bone {
            for (vertex, weight) in graph.bone(bone).iter() {
                let slot = usize::try_from(vertex)
                    .ok()
                    .and_then(|v| self.influences.get_mut(v));
                match slot {
                    Some(influences) => {
                        if !influences.add(index, weight) {
                            self.dropped += 1;
                        }
                    }
                    None => tracing::debug!(
                        "Bone {} weights vertex {vertex} outside its mesh",
                        graph.node(node).name
                    ),
                }
            }
        }
        self.bones.push(node);
        self.inverse_bind.push(world.inverse());
    }

    /// True when any vertex received a weight.
    #[must_use]
    pub fn has_weights(&self) -> bool {
        self.influences.iter().any(|v| v.count() > 0)
    }
}

/// Group bone runs into skeletons. `world` holds each node's world matrix.
#[must_use]
pub fn build_skeletons(graph: &SceneGraph, world: &[Mat4]) -> Vec<Skeleton> {
    let mut skeletons = Vec::new();
    let mut current: Option<Skeleton> = None;

    for id in graph.node_ids().rev() {
        if !graph.node(id).is_bone() {
            skeletons.extend(current.take());
            continue;
        }
        let skeleton = current.get_or_insert_with(|| Skeleton::start(graph, id));
        skeleton.push_bone(graph, id, &world[id.0]);
    }
    skeletons.extend(current);

    for skeleton in &skeletons {
        if skeleton.dropped > 0 {
            tracing::warn!(
                "Dropped {} bone influences beyond {MAX_INFLUENCES} per vertex",
                skeleton.dropped
            );
        }
    }
    skeletons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::b3d::fixtures::{bone, mesh, model, node};
    use crate::formats::b3d::load_model;
    use crate::scene::world_transforms;

    fn skeletons_of(data: &[u8]) -> (SceneGraph, Vec<Skeleton>) {
        let graph = load_model(data).unwrap();
        let skeletons = build_skeletons(&graph, &world_transforms(&graph));
        (graph, skeletons)
    }

    fn bone_names(graph: &SceneGraph, skeleton: &Skeleton) -> Vec<String> {
        skeleton
            .bones
            .iter()
            .map(|&id| graph.node(id).name.clone())
            .collect()
    }

    #[test]
    fn test_first_free_slot_wins() {
        let mut v = VertexInfluences::default();
        assert!(v.add(0, 0.5));
        assert!(v.add(1, 0.0));
        // the zero weight did not claim its slot
        assert!(v.add(2, 0.25));
        assert_eq!(v.bones[..2], [0, 2]);
        assert!(v.add(3, 0.1));
        assert!(v.add(4, 0.1));
        assert!(!v.add(5, 0.05));
        assert_eq!(v.count(), 4);
        assert_eq!(v.weights, [0.5, 0.25, 0.1, 0.1]);
    }

    #[test]
    fn test_fifth_influence_is_dropped() {
        let body = (1..=5).fold(node("body").child(mesh(0, &[[0.0; 3]], &[])), |body, i| {
            body.child(node(&format!("b{i}")).child(bone(&[(0, i as f32 / 10.0)])))
        });
        let (graph, skeletons) = skeletons_of(&model(vec![body]));

        assert_eq!(skeletons.len(), 1);
        let skeleton = &skeletons[0];
        assert_eq!(skeleton.owner, graph.find_node("body"));
        // reverse completion order: the last sibling is met first
        assert_eq!(bone_names(&graph, skeleton), vec!["b5", "b4", "b3", "b2", "b1"]);
        assert_eq!(skeleton.inverse_bind.len(), 5);
        assert_eq!(skeleton.dropped, 1);

        let vertex = skeleton.influences[0];
        assert_eq!(vertex.bones, [0, 1, 2, 3]);
        assert_eq!(vertex.weights, [0.5, 0.4, 0.3, 0.2]);
    }

    #[test]
    fn test_non_bone_node_splits_runs() {
        let data = model(vec![
            node("a")
                .child(mesh(0, &[[0.0; 3], [1.0; 3]], &[]))
                .child(node("a_bone").child(bone(&[(0, 1.0)]))),
            node("b")
                .child(mesh(0, &[[0.0; 3], [1.0; 3]], &[]))
                .child(node("b_bone").child(bone(&[(1, 1.0)]))),
        ]);
        let (graph, skeletons) = skeletons_of(&data);

        assert_eq!(skeletons.len(), 2);
        assert_eq!(skeletons[0].owner, graph.find_node("b"));
        assert_eq!(bone_names(&graph, &skeletons[0]), vec!["b_bone"]);
        assert_eq!(skeletons[0].influences[1].weights[0], 1.0);
        assert_eq!(skeletons[0].influences[0].count(), 0);

        assert_eq!(skeletons[1].owner, graph.find_node("a"));
        assert_eq!(bone_names(&graph, &skeletons[1]), vec!["a_bone"]);
        assert_eq!(skeletons[1].influences[0].weights[0], 1.0);
        assert!(skeletons.iter().all(|s| s.dropped == 0 && s.has_weights()));
    }
}
