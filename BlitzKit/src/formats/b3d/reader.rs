//! B3D chunk tree walker and per-tag decoders
//!
//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use std::fs;
use std::path::Path;

use glam::{Quat, Vec2, Vec3, Vec4};

use super::chunk::{CHUNK_HEADER_SIZE, Chunk, ChunkId, ChunkPayload, ChunkTag};
use super::graph::SceneGraph;
use super::types::{
    BlendMode, BoneId, BoneWeights, Brush, BrushList, KeyFlags, KeyframeTrack, MeshData, MeshId,
    NodeId, SceneNode, TextureFlags, TextureRef, TriangleList, Vertex, VertexFlags,
};
use super::{B3D_MAGIC, MAX_CHUNK_DEPTH, MAX_KEY_FRAME};
use crate::config::LoadOptions;
use crate::error::{Error, Result};
use crate::formats::common::{ByteCursor, flip_quat, flip_vec3};

/// Read and decode a B3D file from disk.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read, otherwise the same
/// errors as [`load_model`].
pub fn read_model<P: AsRef<Path>>(path: P) -> Result<SceneGraph> {
    read_model_with(path, &LoadOptions::default())
}

/// Read and decode a B3D file from disk with explicit options.
///
/// # Errors
///
/// See [`read_model`].
pub fn read_model_with<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<SceneGraph> {
    let data = fs::read(path)?;
    load_model_with(&data, options)
}

/// Decode a B3D model from bytes.
///
/// # Errors
///
/// - [`Error::NotAModel`] if the data does not start with `BB3D`
/// - [`Error::TruncatedInput`] if a record runs past its chunk or the data
/// - [`Error::UnexpectedEof`] if a chunk's declared length runs past the data
/// - [`Error::InvalidFormat`] for negative lengths or frame numbers, or
///   chunks nested deeper than [`MAX_CHUNK_DEPTH`]
pub fn load_model(data: &[u8]) -> Result<SceneGraph> {
    load_model_with(data, &LoadOptions::default())
}

/// Decode a B3D model from bytes with explicit options.
///
/// # Errors
///
/// See [`load_model`].
pub fn load_model_with(data: &[u8], options: &LoadOptions) -> Result<SceneGraph> {
    if data.len() >= 4 && data[..4] != B3D_MAGIC {
        let mut tag = [0u8; 4];
        tag.copy_from_slice(&data[..4]);
        return Err(Error::NotAModel(tag));
    }

    let mut reader = ModelReader {
        cursor: ByteCursor::new(data),
        options: *options,
        graph: SceneGraph::default(),
        open_nodes: Vec::new(),
        depth: 0,
    };
    reader.read_chunk(None)?;
    let graph = reader.graph;

    tracing::debug!(
        "Decoded B3D v{}: {} chunks, {} nodes, {} meshes, {} bones, {} animation frames",
        graph.version,
        graph.chunks.len(),
        graph.nodes.len(),
        graph.meshes.len(),
        graph.bones.len(),
        graph.anim_frames
    );
    Ok(graph)
}

/// Walk state for one decode call.
struct ModelReader<'a> {
    cursor: ByteCursor<'a>,
    options: LoadOptions,
    graph: SceneGraph,
    /// Nodes whose children are still being read, innermost last.
    open_nodes: Vec<SceneNode>,
    /// Chunks currently open, the root included.
    depth: usize,
}

impl ModelReader<'_> {
    /// Read one chunk header at the cursor, decode its body and leave the
    /// cursor at the chunk's end.
    fn read_chunk(&mut self, parent: Option<ChunkId>) -> Result<ChunkId> {
        let start = self.cursor.position();
        let tag = ChunkTag::from_bytes(self.cursor.read_tag()?);
        let field = self.cursor.read_i32()?;
        let declared_length = u32::try_from(field).map_err(|_| {
            Error::InvalidFormat(format!("chunk {tag} at {start} has negative length {field}"))
        })?;

        let declared_end = start + CHUNK_HEADER_SIZE + u64::from(declared_length);
        if declared_end > self.cursor.len() {
            return Err(Error::UnexpectedEof {
                offset: start,
                target: declared_end,
            });
        }
        let outer_limit = self.cursor.limit();
        let end = if declared_end > outer_limit {
            tracing::warn!(
                "Chunk {tag} at {start} ends at {declared_end}, past its container end {outer_limit}; clamping"
            );
            outer_limit
        } else {
            declared_end
        };

        let id = ChunkId(self.graph.chunks.len());
        self.graph.chunks.push(Chunk {
            tag,
            start,
            length: end - start,
            declared_length,
            parent,
            children: Vec::new(),
            payload: ChunkPayload::Container,
        });
        if let Some(parent) = parent {
            self.graph.chunks[parent.0].children.push(id);
        }

        if self.depth == MAX_CHUNK_DEPTH {
            return Err(Error::InvalidFormat(format!(
                "chunk {tag} at {start} nested deeper than {MAX_CHUNK_DEPTH} levels"
            )));
        }
        self.cursor.set_limit(end);
        self.depth += 1;
        let payload = self.decode(id, tag, parent);
        self.depth -= 1;
        self.graph.chunks[id.0].payload = payload?;
        self.cursor.set_limit(outer_limit);
        self.cursor.seek_to(end)?;
        Ok(id)
    }

    /// Read child chunks until the current limit is reached.
    fn read_children(&mut self, id: ChunkId) -> Result<()> {
        while !self.cursor.at_limit() {
            self.read_chunk(Some(id))?;
        }
        Ok(())
    }

    fn decode(
        &mut self,
        id: ChunkId,
        tag: ChunkTag,
        parent: Option<ChunkId>,
    ) -> Result<ChunkPayload> {
        let animation = self.options.enable_animation;
        match tag {
            ChunkTag::Bb3d if parent.is_none() => {
                self.graph.version = self.cursor.read_i32()?;
                self.read_children(id)?;
                Ok(ChunkPayload::Container)
            }
            ChunkTag::Texs => self.read_textures(),
            ChunkTag::Brus => self.read_brushes(),
            ChunkTag::Node => self.read_node(id),
            ChunkTag::Mesh => self.read_mesh(id, parent),
            ChunkTag::Vrts => self.read_vertices(id, parent),
            ChunkTag::Tris => self.read_triangles(id, parent),
            ChunkTag::Bone => self.read_bone(parent),
            ChunkTag::Keys if animation => self.read_keys(parent),
            ChunkTag::Anim if animation => self.read_anim(),
            _ => Ok(ChunkPayload::Skipped),
        }
    }

    // ==================== Materials ====================

    fn read_textures(&mut self) -> Result<ChunkPayload> {
        let mut list = Vec::new();
        while !self.cursor.at_limit() {
            let name = self.cursor.read_cstring()?;
            let flags = TextureFlags::from_bits_retain(self.cursor.read_i32()? as u32);
            let blend = BlendMode::from_raw(self.cursor.read_i32()?);
            let offset = Vec2::new(self.cursor.read_f32()?, self.cursor.read_f32()?);
            let scale_x = self.cursor.read_f32()?;
            let scale_y = -self.cursor.read_f32()?;
            let rotation = self.cursor.read_f32()?;
            list.push(TextureRef {
                name,
                flags,
                blend,
                offset,
                scale: Vec2::new(scale_x, scale_y),
                rotation,
            });
        }
        tracing::debug!("TEXS: {} texture references", list.len());
        self.graph.texture_lists.push(list);
        Ok(ChunkPayload::Textures(self.graph.texture_lists.len() - 1))
    }

    fn read_brushes(&mut self) -> Result<ChunkPayload> {
        let texnum = self.cursor.read_i32()?;
        let texnum = usize::try_from(texnum)
            .map_err(|_| Error::InvalidFormat(format!("BRUS has negative texture count {texnum}")))?;

        let mut brushes = Vec::new();
        while !self.cursor.at_limit() {
            let name = self.cursor.read_cstring()?;
            let color = self.read_vec4()?;
            let shininess = self.cursor.read_f32()?;
            let blend = BlendMode::from_raw(self.cursor.read_i32()?);
            let fx = self.cursor.read_i32()?;
            let texture_ids = (0..texnum)
                .map(|_| self.cursor.read_i32())
                .collect::<Result<Vec<_>>>()?;
            brushes.push(Brush {
                name,
                color,
                shininess,
                blend,
                fx,
                texture_ids,
            });
        }
        tracing::debug!("BRUS: {} brushes, {texnum} texture slots", brushes.len());
        self.graph.brush_lists.push(BrushList { texnum, brushes });
        Ok(ChunkPayload::Brushes(self.graph.brush_lists.len() - 1))
    }

    // ==================== Hierarchy ====================

    fn read_node(&mut self, id: ChunkId) -> Result<ChunkPayload> {
        let name = self.cursor.read_cstring()?;
        let position = flip_vec3(self.read_vec3()?);
        let scale = flip_vec3(self.read_vec3()?);
        let rotation = flip_quat(normalize_quat(self.read_wxyz()?));

        self.open_nodes.push(SceneNode {
            name,
            position,
            scale,
            rotation,
            parent: None,
            mesh: None,
            bone: None,
            animation: None,
            id: 0,
            chunk: id,
            object: None,
        });
        let children = self.read_children(id);
        let Some(mut node) = self.open_nodes.pop() else {
            return Err(Error::InvalidFormat("node stack underflow".to_string()));
        };
        children?;

        let node_id = NodeId(self.graph.nodes.len());
        node.id = (node_id.0 + 1) as u32;
        self.graph.nodes.push(node);

        // child nodes completed before this one existed; link them now
        for &child in &self.graph.chunks[id.0].children {
            if let ChunkPayload::Node(child_node) = self.graph.chunks[child.0].payload {
                self.graph.nodes[child_node.0].parent = Some(node_id);
            }
        }
        Ok(ChunkPayload::Node(node_id))
    }

    fn read_mesh(&mut self, id: ChunkId, parent: Option<ChunkId>) -> Result<ChunkPayload> {
        let brush_id = self.cursor.read_i32()?;
        let mesh_id = MeshId(self.graph.meshes.len());
        self.graph.meshes.push(MeshData {
            brush_id,
            ..MeshData::default()
        });
        // VRTS/TRIS children locate the mesh through this payload
        self.graph.chunks[id.0].payload = ChunkPayload::Mesh(mesh_id);
        self.read_children(id)?;

        match self.enclosing_node(parent) {
            Some(node) => {
                if node.mesh.is_none() {
                    node.mesh = Some(mesh_id);
                }
            }
            None => tracing::warn!("MESH chunk outside a NODE; it will not be assembled"),
        }
        Ok(ChunkPayload::Mesh(mesh_id))
    }

    fn owning_mesh(&self, parent: Option<ChunkId>) -> Option<MeshId> {
        match parent.map(|p| &self.graph.chunks[p.0].payload) {
            Some(ChunkPayload::Mesh(mesh)) => Some(*mesh),
            _ => None,
        }
    }

    // ==================== Geometry ====================

    fn read_vertices(&mut self, id: ChunkId, parent: Option<ChunkId>) -> Result<ChunkPayload> {
        let Some(mesh_id) = self.owning_mesh(parent) else {
            tracing::warn!("VRTS chunk outside a MESH; skipping");
            return Ok(ChunkPayload::Skipped);
        };

        let flags = VertexFlags::from_bits_retain(self.cursor.read_i32()? as u32);
        let sets = self.cursor.read_i32()?;
        let set_size = self.cursor.read_i32()?;
        let set_count = usize::try_from(sets).unwrap_or(0);
        let set_width = usize::try_from(set_size).unwrap_or(0);

        let buffer = &self.graph.meshes[mesh_id.0].vertices;
        if !self.graph.meshes[mesh_id.0].vertex_chunks.is_empty()
            && (buffer.flags != flags
                || buffer.tex_coord_sets != sets
                || buffer.tex_coord_set_size != set_size)
        {
            return Err(Error::InvalidFormat(format!(
                "VRTS layout (flags {:#x}, {sets}x{set_size} coords) differs from earlier VRTS in the same MESH (flags {:#x}, {}x{} coords)",
                flags.bits(),
                buffer.flags.bits(),
                buffer.tex_coord_sets,
                buffer.tex_coord_set_size
            )));
        }

        let mut vertices = Vec::new();
        while !self.cursor.at_limit() {
            let position = flip_vec3(self.read_vec3()?);
            let normal = if flags.contains(VertexFlags::NORMALS) {
                flip_vec3(self.read_vec3()?)
            } else {
                Vec3::ZERO
            };
            let color = if flags.contains(VertexFlags::COLORS) {
                self.read_vec4()?
            } else {
                Vec4::ONE
            };
            let tex_coords = if set_count == 0 || set_width == 0 {
                vec![vec![0.0, 0.0]]
            } else {
                let mut sets = Vec::new();
                for _ in 0..set_count {
                    let set = (0..set_width)
                        .map(|_| self.cursor.read_f32())
                        .collect::<Result<Vec<_>>>()?;
                    sets.push(set);
                }
                sets
            };
            vertices.push(Vertex {
                position,
                normal,
                color,
                tex_coords,
            });
        }

        let count = vertices.len();
        let mesh = &mut self.graph.meshes[mesh_id.0];
        mesh.vertices.flags = flags;
        mesh.vertices.tex_coord_sets = sets;
        mesh.vertices.tex_coord_set_size = set_size;
        mesh.vertices.vertices.extend(vertices);
        mesh.vertex_chunks.push(id);
        Ok(ChunkPayload::Vertices {
            mesh: mesh_id,
            count,
        })
    }

    fn read_triangles(&mut self, id: ChunkId, parent: Option<ChunkId>) -> Result<ChunkPayload> {
        let Some(mesh_id) = self.owning_mesh(parent) else {
            tracing::warn!("TRIS chunk outside a MESH; skipping");
            return Ok(ChunkPayload::Skipped);
        };

        let brush_id = self.cursor.read_i32()?;
        let mut triangles = Vec::new();
        while !self.cursor.at_limit() {
            let a = self.cursor.read_i32()?;
            let b = self.cursor.read_i32()?;
            let c = self.cursor.read_i32()?;
            // stored winding is reversed relative to the flipped axes
            triangles.push([a, c, b]);
        }

        let mesh = &mut self.graph.meshes[mesh_id.0];
        mesh.triangle_lists.push(TriangleList { brush_id, triangles });
        mesh.triangle_chunks.push(id);
        Ok(ChunkPayload::Triangles {
            mesh: mesh_id,
            list: mesh.triangle_lists.len() - 1,
        })
    }

    // ==================== Skinning & animation ====================

    /// The node currently being read, if `parent` is its chunk.
    fn enclosing_node(&mut self, parent: Option<ChunkId>) -> Option<&mut SceneNode> {
        let parent = parent?;
        self.open_nodes.last_mut().filter(|node| node.chunk == parent)
    }

    fn read_bone(&mut self, parent: Option<ChunkId>) -> Result<ChunkPayload> {
        let mut bone = BoneWeights::default();
        while !self.cursor.at_limit() {
            bone.vertex_ids.push(self.cursor.read_i32()?);
            bone.weights.push(self.cursor.read_f32()?);
        }

        let bone_id = BoneId(self.graph.bones.len());
        self.graph.bones.push(bone);
        match self.enclosing_node(parent) {
            Some(node) => {
                if node.bone.is_none() {
                    node.bone = Some(bone_id);
                }
            }
            None => tracing::warn!("BONE chunk outside a NODE; weights are unused"),
        }
        Ok(ChunkPayload::Bone(bone_id))
    }

    fn read_keys(&mut self, parent: Option<ChunkId>) -> Result<ChunkPayload> {
        if self.enclosing_node(parent).is_none() {
            tracing::warn!("KEYS chunk outside a NODE; skipping");
            return Ok(ChunkPayload::Skipped);
        }

        let local = KeyFlags::from_bits_retain(self.cursor.read_i32()? as u32);
        let mut track = KeyframeTrack::default();
        let mut records = 0;
        while !self.cursor.at_limit() {
            let frame = self.cursor.read_i32()?;
            let frame = usize::try_from(frame)
                .ok()
                .filter(|f| *f <= MAX_KEY_FRAME)
                .ok_or_else(|| Error::InvalidFormat(format!("KEYS frame {frame} out of range")))?;
            if local.contains(KeyFlags::POSITION) {
                track.positions.insert(frame, flip_vec3(self.read_vec3()?));
            }
            if local.contains(KeyFlags::SCALE) {
                track.scales.insert(frame, flip_vec3(self.read_vec3()?));
            }
            if local.contains(KeyFlags::ROTATION) {
                track.rotations.insert(frame, flip_quat(self.read_wxyz()?));
            }
            records += 1;
        }

        let Some(node) = self.enclosing_node(parent) else {
            return Ok(ChunkPayload::Skipped);
        };
        let merged = node.animation.get_or_insert_with(KeyframeTrack::default);
        merged.flags |= local;
        for (frame, value) in track.positions.iter() {
            merged.positions.insert(frame, value);
        }
        for (frame, value) in track.scales.iter() {
            merged.scales.insert(frame, value);
        }
        for (frame, value) in track.rotations.iter() {
            merged.rotations.insert(frame, value);
        }
        Ok(ChunkPayload::Keys { records })
    }

    fn read_anim(&mut self) -> Result<ChunkPayload> {
        let _flags = self.cursor.read_i32()?;
        let frames = self.cursor.read_i32()?;
        let fps = self.cursor.read_f32()?;
        self.graph.anim_frames = self.graph.anim_frames.max(frames);
        Ok(ChunkPayload::Anim { frames, fps })
    }

    // ==================== Compound reads ====================

    fn read_vec3(&mut self) -> Result<Vec3> {
        Ok(Vec3::new(
            self.cursor.read_f32()?,
            self.cursor.read_f32()?,
            self.cursor.read_f32()?,
        ))
    }

    fn read_vec4(&mut self) -> Result<Vec4> {
        Ok(Vec4::new(
            self.cursor.read_f32()?,
            self.cursor.read_f32()?,
            self.cursor.read_f32()?,
            self.cursor.read_f32()?,
        ))
    }

    /// Rotation stored as `w, x, y, z`.
    fn read_wxyz(&mut self) -> Result<Quat> {
        let w = self.cursor.read_f32()?;
        let x = self.cursor.read_f32()?;
        let y = self.cursor.read_f32()?;
        let z = self.cursor.read_f32()?;
        Ok(Quat::from_xyzw(x, y, z, w))
    }
}

/// Normalize a stored rotation; a zero or non-finite one becomes identity.
fn normalize_quat(q: Quat) -> Quat {
    Quat::from_vec4(Vec4::from(q).try_normalize().unwrap_or(Vec4::W))
}
