//! Scene assembly
//!
//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! Turns a decoded [`SceneGraph`] into engine-neutral pieces: world
//! transforms, materials, skeletons with per-vertex influences, renderable
//! surfaces and one looping animation clip.
//!
//! ```no_run
//! use blitzkit::formats::b3d::read_model;
//! use blitzkit::scene::assemble;
//!
//! let graph = read_model("ninja.b3d")?;
//! let scene = assemble(&graph);
//! println!("{} surfaces", scene.surfaces.len());
//! # Ok::<(), blitzkit::Error>(())
//! ```

mod animation;
mod materials;
mod skeleton;
mod surfaces;

use glam::Mat4;
use serde::Serialize;

use crate::formats::b3d::SceneGraph;

pub use animation::{
    AnimationClip, AnimationCurve, CLIP_NAME, CurveProperty, FRAMES_PER_SECOND, Keyframe,
    build_clip,
};
pub use materials::{ALPHA_CUTOFF, Material, TextureLayer, Transparency, build_materials};
pub use skeleton::{MAX_INFLUENCES, Skeleton, VertexInfluences, build_skeletons};
pub use surfaces::{MaterialSlot, SkinBinding, SubMesh, Surface, smooth_normals};

/// Everything built from one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssembledScene {
    /// World matrix per node, indexed like [`SceneGraph::nodes`].
    pub world_transforms: Vec<Mat4>,
    /// One material per brush.
    pub materials: Vec<Material>,
    pub skeletons: Vec<Skeleton>,
    /// One surface per mesh node, in reverse completion order.
    pub surfaces: Vec<Surface>,
    pub animation: Option<AnimationClip>,
}

impl AssembledScene {
    /// Material for `slot`, falling back to the placeholder.
    #[must_use]
    pub fn material(&self, slot: MaterialSlot) -> Material {
        match slot {
            MaterialSlot::Brush(index) => self
                .materials
                .get(index)
                .cloned()
                .unwrap_or_else(Material::placeholder),
            MaterialSlot::Placeholder => Material::placeholder(),
        }
    }
}

/// World matrix of every node.
///
/// Parents complete after their children, so walking backwards always sees
/// a parent before its children.
#[must_use]
pub fn world_transforms(graph: &SceneGraph) -> Vec<Mat4> {
    let mut world = vec![Mat4::IDENTITY; graph.nodes.len()];
    for id in graph.node_ids().rev() {
        let node = graph.node(id);
        let local = Mat4::from_scale_rotation_translation(node.scale, node.rotation, node.position);
        world[id.0] = match node.parent {
            Some(parent) => world[parent.0] * local,
            None => local,
        };
    }
    world
}

/// Assemble a decoded model.
#[must_use]
pub fn assemble(graph: &SceneGraph) -> AssembledScene {
    let world = world_transforms(graph);
    let materials = build_materials(graph);
    let skeletons = build_skeletons(graph, &world);

    let surfaces: Vec<Surface> = graph
        .node_ids()
        .rev()
        .filter_map(|id| surfaces::build_surface(graph, id, materials.len(), &skeletons))
        .collect();

    let animation = build_clip(graph);
    tracing::debug!(
        "Assembled {} surfaces, {} materials, {} skeletons",
        surfaces.len(),
        materials.len(),
        skeletons.len()
    );

    AssembledScene {
        world_transforms: world,
        materials,
        skeletons,
        surfaces,
        animation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::b3d::fixtures::{ChunkBuilder, anim, bone, mesh, model, node, node_at};
    use crate::formats::b3d::{NodeId, load_model};
    use glam::Vec3;

    fn skinned_model() -> Vec<u8> {
        model(vec![
            node("body")
                .child(mesh(
                    0,
                    &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                    &[[0, 1, 2]],
                ))
                .child(
                    node_at("hip", [0.0, 1.0, 0.0])
                        .child(bone(&[(0, 1.0), (1, 0.5)]))
                        .child(node_at("knee", [0.0, 2.0, 0.0]).child(bone(&[(1, 0.5), (2, 1.0)]))),
                ),
        ])
    }

    #[test]
    fn test_world_transforms_compose_parents() {
        let graph = load_model(&skinned_model()).unwrap();
        let world = world_transforms(&graph);
        // knee, hip, body
        assert!(world[0].w_axis.truncate().abs_diff_eq(Vec3::new(0.0, 0.0, 3.0), 1e-6));
        assert!(world[1].w_axis.truncate().abs_diff_eq(Vec3::new(0.0, 0.0, 1.0), 1e-6));
        assert_eq!(world[2], Mat4::IDENTITY);
    }

    #[test]
    fn test_skinned_mesh() {
        let graph = load_model(&skinned_model()).unwrap();
        let scene = assemble(&graph);

        assert_eq!(scene.skeletons.len(), 1);
        let skeleton = &scene.skeletons[0];
        assert_eq!(skeleton.owner, Some(NodeId(2)));
        assert_eq!(skeleton.bones, vec![NodeId(1), NodeId(0)]);
        let hip_origin = skeleton.inverse_bind[0].transform_point3(Vec3::new(0.0, 0.0, 1.0));
        assert!(hip_origin.abs_diff_eq(Vec3::ZERO, 1e-6));

        assert_eq!(scene.surfaces.len(), 1);
        let surface = &scene.surfaces[0];
        assert_eq!(surface.node, NodeId(2));
        assert_eq!(surface.positions.len(), 3);
        assert!(surface.generated_normals);
        assert_eq!(surface.uv0, surface.uv1);

        let skin = surface.skin.as_ref().unwrap();
        assert_eq!(skin.skeleton, 0);
        assert_eq!(skin.influences[0].bones[0], 0);
        assert_eq!(skin.influences[0].weights, [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(skin.influences[1].bones[..2], [0, 1]);
        assert_eq!(skin.influences[1].weights[..2], [0.5, 0.5]);
        assert_eq!(skin.influences[2].bones[0], 1);
    }

    #[test]
    fn test_single_material_without_brushes_uses_placeholder() {
        let graph = load_model(&skinned_model()).unwrap();
        let scene = assemble(&graph);
        let submeshes = &scene.surfaces[0].submeshes;
        assert_eq!(submeshes.len(), 1);
        assert_eq!(submeshes[0].material, MaterialSlot::Placeholder);
        assert_eq!(submeshes[0].indices, vec![0, 2, 1]);
        assert_eq!(scene.material(submeshes[0].material).name, "Default");
    }

    #[test]
    fn test_per_list_materials() {
        let brus = ChunkBuilder::new(b"BRUS")
            .i32(0)
            .cstr("paint")
            .floats(&[1.0, 0.0, 0.0, 1.0, 0.0])
            .ints(&[1, 0]);
        let vrts = ChunkBuilder::new(b"VRTS")
            .ints(&[0, 0, 0])
            .floats(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0]);
        let mesh = ChunkBuilder::new(b"MESH")
            .i32(-1)
            .child(vrts)
            .child(ChunkBuilder::new(b"TRIS").i32(0).ints(&[0, 1, 2]))
            .child(ChunkBuilder::new(b"TRIS").i32(5).ints(&[1, 3, 2, 0, 1, 9]));
        let graph = load_model(&model(vec![brus, node("crate").child(mesh)])).unwrap();
        let scene = assemble(&graph);

        assert_eq!(scene.materials.len(), 1);
        assert_eq!(scene.materials[0].name, "paint");
        let submeshes = &scene.surfaces[0].submeshes;
        assert_eq!(submeshes.len(), 2);
        assert_eq!(submeshes[0].material, MaterialSlot::Brush(0));
        assert_eq!(submeshes[1].material, MaterialSlot::Placeholder);
        // the triangle naming vertex 9 is dropped
        assert_eq!(submeshes[1].indices, vec![1, 2, 3]);
        assert_eq!(scene.surfaces[0].triangle_count(), 2);
    }

    #[test]
    fn test_animation_clip() {
        let keys = ChunkBuilder::new(b"KEYS")
            .i32(1)
            .i32(0)
            .floats(&[0.0, 0.0, 0.0])
            .i32(24)
            .floats(&[1.0, 2.0, 3.0]);
        let data = model(vec![node("root").child(node("arm").child(keys)), anim(48)]);
        let scene = assemble(&load_model(&data).unwrap());

        let clip = scene.animation.unwrap();
        assert_eq!(clip.name, "Animation");
        assert!(clip.looping);
        assert!((clip.duration() - 2.0).abs() < 1e-6);
        assert_eq!(clip.curves.len(), 3);
        assert!(clip.curves.iter().all(|c| c.path == "root/arm"));
        // stored (x, y, z) arrives as (x, z, y)
        let y = &clip.curves[1];
        assert_eq!(y.property, CurveProperty::PositionY);
        assert_eq!(y.keys[1], Keyframe { time: 1.0, value: 3.0 });
    }

    #[test]
    fn test_static_model_has_no_clip() {
        let graph = load_model(&skinned_model()).unwrap();
        assert!(assemble(&graph).animation.is_none());
    }
}
