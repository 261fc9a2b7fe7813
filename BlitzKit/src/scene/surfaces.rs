//! Mesh nodes to renderable surfaces

use glam::{Vec2, Vec3, Vec4};
use serde::Serialize;

use super::skeleton::{Skeleton, VertexInfluences};
use crate::formats::b3d::{MeshData, NodeId, SceneGraph, VertexFlags};

/// Material a submesh draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MaterialSlot {
    /// Index into the assembled materials, one per brush.
    Brush(usize),
    /// The placeholder material; the brush id was out of range.
    Placeholder,
}

impl MaterialSlot {
    fn resolve(brush_id: i32, brush_count: usize, node: &str) -> Self {
        match usize::try_from(brush_id) {
            Ok(id) if id < brush_count => Self::Brush(id),
            _ => {
                tracing::warn!("Mesh {node} uses missing brush {brush_id}; using placeholder");
                Self::Placeholder
            }
        }
    }
}

/// Indices drawn with one material.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubMesh {
    /// Material the indices are drawn with.
    pub material: MaterialSlot,
    /// Triangle vertex indices, three per triangle.
    pub indices: Vec<u32>,
}

/// Skin binding of a surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkinBinding {
    /// Index into the assembled skeletons.
    pub skeleton: usize,
    /// Influences per vertex, parallel to the surface's positions.
    pub influences: Vec<VertexInfluences>,
}

/// One renderable mesh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Surface {
    /// Node carrying the mesh.
    pub node: NodeId,
    /// Vertex positions in the node's local space.
    pub positions: Vec<Vec3>,
    /// One normal per position, read or generated.
    pub normals: Vec<Vec3>,
    /// RGBA vertex colours, white when the mesh has none.
    pub colors: Vec<Vec4>,
    /// First texture coordinate set.
    pub uv0: Vec<Vec2>,
    /// Second set, or a copy of the first when the mesh has only one.
    pub uv1: Vec<Vec2>,
    /// One index list per material.
    pub submeshes: Vec<SubMesh>,
    /// Bone influences when a skeleton deforms this mesh.
    pub skin: Option<SkinBinding>,
    /// Normals were computed from faces rather than read.
    pub generated_normals: bool,
}

impl Surface {
    /// Total triangle count over all submeshes.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.indices.len() / 3).sum()
    }
}

/// Build one surface for `node`, which must carry a mesh.
pub(crate) fn build_surface(
    graph: &SceneGraph,
    node: NodeId,
    brush_count: usize,
    skeletons: &[Skeleton],
) -> Option<Surface> {
    let scene_node = graph.node(node);
    let mesh = graph.mesh(scene_node.mesh?);
    let vertices = &mesh.vertices.vertices;

    let positions: Vec<Vec3> = vertices.iter().map(|v| v.position).collect();
    let colors = vertices.iter().map(|v| v.color).collect();
    let uv0: Vec<Vec2> = vertices
        .iter()
        .map(|v| v.uv(0).unwrap_or(Vec2::ZERO))
        .collect();
    let uv1 = if mesh.vertices.tex_coord_sets > 1 {
        vertices
            .iter()
            .map(|v| v.uv(1).unwrap_or(Vec2::ZERO))
            .collect()
    } else {
        uv0.clone()
    };

    let submeshes = build_submeshes(mesh, positions.len(), brush_count, &scene_node.name);

    let generated_normals = !mesh.vertices.flags.contains(VertexFlags::NORMALS);
    let normals = if generated_normals {
        smooth_normals(&positions, &submeshes)
    } else {
        vertices.iter().map(|v| v.normal).collect()
    };

    let skin = skeletons
        .iter()
        .position(|s| s.owner == Some(node) && s.has_weights())
        .map(|index| {
            let mut influences = skeletons[index].influences.clone();
            influences.resize(positions.len(), VertexInfluences::default());
            SkinBinding {
                skeleton: index,
                influences,
            }
        });

    Some(Surface {
        node,
        positions,
        normals,
        colors,
        uv0,
        uv1,
        submeshes,
        skin,
        generated_normals,
    })
}

fn build_submeshes(
    mesh: &MeshData,
    vertex_count: usize,
    brush_count: usize,
    node: &str,
) -> Vec<SubMesh> {
    let mut skipped = 0usize;
    let mut collect = |indices: &mut Vec<u32>, triangles: &[[i32; 3]]| {
        for triangle in triangles {
            let valid = triangle
                .iter()
                .all(|&i| usize::try_from(i).is_ok_and(|i| i < vertex_count));
            if valid {
                indices.extend(triangle.iter().map(|&i| i as u32));
            } else {
                skipped += 1;
            }
        }
    };

    let submeshes = if mesh.has_single_material() {
        let mut indices = Vec::with_capacity(mesh.triangle_count() * 3);
        for list in &mesh.triangle_lists {
            collect(&mut indices, &list.triangles);
        }
        vec![SubMesh {
            material: MaterialSlot::resolve(mesh.brush_id, brush_count, node),
            indices,
        }]
    } else {
        mesh.triangle_lists
            .iter()
            .map(|list| {
                let mut indices = Vec::with_capacity(list.triangles.len() * 3);
                collect(&mut indices, &list.triangles);
                SubMesh {
                    material: MaterialSlot::resolve(list.brush_id, brush_count, node),
                    indices,
                }
            })
            .collect()
    };

    if skipped > 0 {
        tracing::warn!("Mesh {node}: skipped {skipped} triangles with out-of-range indices");
    }
    submeshes
}

/// Area-weighted vertex normals from the triangles of every submesh.
#[must_use]
pub fn smooth_normals(positions: &[Vec3], submeshes: &[SubMesh]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for triangle in submeshes
        .iter()
        .flat_map(|s| s.indices.chunks_exact(3))
    {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
        let face = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    normals
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::ZERO))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smooth_normals_of_flat_quad() {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let submeshes = vec![SubMesh {
            material: MaterialSlot::Placeholder,
            indices: vec![0, 1, 2, 0, 2, 3],
        }];
        let normals = smooth_normals(&positions, &submeshes);
        for normal in normals {
            assert!((normal - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn test_unreferenced_vertex_has_zero_normal() {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::ONE];
        let submeshes = vec![SubMesh {
            material: MaterialSlot::Brush(0),
            indices: vec![0, 1, 2],
        }];
        assert_eq!(smooth_normals(&positions, &submeshes)[3], Vec3::ZERO);
    }

    #[test]
    fn test_material_slot_bounds() {
        assert_eq!(MaterialSlot::resolve(1, 2, "m"), MaterialSlot::Brush(1));
        assert_eq!(MaterialSlot::resolve(2, 2, "m"), MaterialSlot::Placeholder);
        assert_eq!(MaterialSlot::resolve(-1, 2, "m"), MaterialSlot::Placeholder);
    }
}
