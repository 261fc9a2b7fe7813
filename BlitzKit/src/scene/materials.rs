//! Brush to material mapping

use glam::Vec4;
use serde::Serialize;

use crate::formats::b3d::{BlendMode, Brush, SceneGraph, TextureFlags, TextureRef};

/// Cutoff used by [`Transparency::Cutout`] materials.
pub const ALPHA_CUTOFF: f32 = 0.5;

/// How a material blends with what is behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Transparency {
    Opaque,
    /// Blended by alpha.
    Fade,
    /// Alpha tested against [`ALPHA_CUTOFF`].
    Cutout,
}

/// A texture stacked on top of the primary one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextureLayer {
    /// Index into the model's texture list.
    pub texture: usize,
    pub blend: BlendMode,
    /// Spherical environment map instead of UV mapped.
    pub sphere_map: bool,
}

/// A renderable material built from one brush.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub name: String,
    pub color: Vec4,
    pub shininess: f32,
    pub blend: BlendMode,
    /// Main texture, from the brush's first slot.
    pub primary: Option<usize>,
    pub layers: Vec<TextureLayer>,
    pub transparency: Transparency,
}

impl Material {
    /// Opaque white material without textures.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            name: "Default".to_string(),
            color: Vec4::ONE,
            shininess: 0.0,
            blend: BlendMode::Replace,
            primary: None,
            layers: Vec::new(),
            transparency: Transparency::Opaque,
        }
    }

    /// Build from `brush`, resolving its slots against `textures`.
    #[must_use]
    pub fn from_brush(brush: &Brush, textures: &[TextureRef]) -> Self {
        let resolve = |slot: usize| {
            let id = brush.texture(slot)?;
            match textures.get(id) {
                Some(texture) => Some((id, texture)),
                None => {
                    tracing::warn!(
                        "Brush {} slot {slot} names missing texture {id}",
                        brush.name
                    );
                    None
                }
            }
        };

        let first = resolve(0);
        let primary = first.filter(|(_, tex)| tex.uses_primary_slot());
        let layer_start = usize::from(primary.is_some());

        // an empty first slot leaves the brush untextured
        let layers = match first {
            Some(_) => (layer_start..brush.texture_ids.len())
                .filter_map(resolve)
                .filter_map(|(id, tex)| layer_for(id, tex))
                .collect(),
            None => Vec::new(),
        };

        Self {
            name: brush.name.clone(),
            color: brush.color,
            shininess: brush.shininess,
            blend: brush.blend,
            primary: primary.map(|(id, _)| id),
            layers,
            transparency: transparency(brush, first.map(|(_, tex)| tex)),
        }
    }
}

/// A layer for the texture, or `None` when its flags or blend mode do not
/// stack.
fn layer_for(texture: usize, tex: &TextureRef) -> Option<TextureLayer> {
    // a plain colour map cannot be layered
    if tex.flags == TextureFlags::COLOR {
        return None;
    }
    let sphere_map = tex.flags.contains(TextureFlags::SPHERE_MAP);
    let stacks = if sphere_map {
        matches!(tex.blend, BlendMode::Multiply | BlendMode::Add)
    } else {
        matches!(
            tex.blend,
            BlendMode::Multiply | BlendMode::Add | BlendMode::Multiply2
        )
    };
    stacks.then_some(TextureLayer {
        texture,
        blend: tex.blend,
        sphere_map,
    })
}

#[allow(clippy::float_cmp)]
fn transparency(brush: &Brush, first: Option<&TextureRef>) -> Transparency {
    let alpha_texture =
        first.is_some_and(|tex| tex.flags.intersects(TextureFlags::ALPHA | TextureFlags::MASKED));
    if brush.color.w == 1.0 && !alpha_texture {
        return Transparency::Opaque;
    }

    let unmasked = first.is_some_and(|tex| !tex.flags.contains(TextureFlags::MASKED));
    if unmasked || brush.texture_ids.is_empty() {
        Transparency::Fade
    } else {
        Transparency::Cutout
    }
}

/// One material per brush in file order.
#[must_use]
pub fn build_materials(graph: &SceneGraph) -> Vec<Material> {
    let textures = graph.textures();
    graph
        .brushes()
        .iter()
        .map(|brush| Material::from_brush(brush, textures))
        .collect()
}
