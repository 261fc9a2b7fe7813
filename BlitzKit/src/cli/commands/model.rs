//! CLI commands for B3D models

use std::path::Path;
use std::time::Instant;

use crate::cli::progress::{CUBE, DISK, GEAR, LOOKING_GLASS, print_done, print_step};
use crate::config::LoadOptions;
use crate::formats::b3d::{ModelSummary, NodeKind, read_model_with};
use crate::scene::{Transparency, assemble};

/// Print the structure of a model
pub fn inspect(path: &Path, options: &LoadOptions, assemble_scene: bool) -> anyhow::Result<()> {
    let graph = read_model_with(path, options)?;
    let summary = ModelSummary::from_graph(&graph);

    println!("{CUBE}B3D Model: {}", path.display());
    println!();
    println!("Version: {}", summary.version);
    println!("Chunks: {}", summary.chunk_count);
    println!("Animation frames: {}", summary.anim_frames);
    println!();

    println!("Nodes ({}):", summary.nodes.len());
    for node in summary.nodes.iter().rev() {
        let depth = node.path.matches('/').count();
        let kind = match node.kind {
            NodeKind::Mesh => "mesh",
            NodeKind::Bone => "bone",
            NodeKind::Pivot => "pivot",
        };
        let keys = if node.key_frames > 0 {
            format!(", {} key frames", node.key_frames)
        } else {
            String::new()
        };
        println!("  {}{} [{kind}{keys}]", "  ".repeat(depth), node.name);
    }

    if !summary.meshes.is_empty() {
        println!();
        println!("Meshes ({}):", summary.meshes.len());
        for mesh in &summary.meshes {
            println!(
                "  {}: {} vertices, {} triangles in {} lists, brush {}",
                mesh.node, mesh.vertex_count, mesh.triangle_count, mesh.triangle_lists, mesh.brush_id
            );
        }
    }

    if !summary.brushes.is_empty() {
        println!();
        println!("Brushes ({}):", summary.brushes.len());
        for (i, brush) in summary.brushes.iter().enumerate() {
            println!("  [{i}] {} textures {:?}", brush.name, brush.texture_ids);
        }
    }

    if !summary.textures.is_empty() {
        println!();
        println!("Textures ({}):", summary.textures.len());
        for (i, tex) in summary.textures.iter().enumerate() {
            println!("  [{i}] {} ({:?}, flags {:#x})", tex.name, tex.kind, tex.flags);
        }
    }

    if assemble_scene {
        let scene = assemble(&graph);
        println!();
        println!("Assembled:");
        for surface in &scene.surfaces {
            let skin = surface
                .skin
                .as_ref()
                .map(|s| format!(", skinned by skeleton {}", s.skeleton))
                .unwrap_or_default();
            println!(
                "  {}: {} submeshes, {} triangles{skin}",
                graph.node_path(surface.node),
                surface.submeshes.len(),
                surface.triangle_count()
            );
        }
        for (i, skeleton) in scene.skeletons.iter().enumerate() {
            println!("  skeleton {i}: {} bones", skeleton.bones.len());
        }
        let blended = scene
            .materials
            .iter()
            .filter(|m| m.transparency != Transparency::Opaque)
            .count();
        println!("  materials: {} ({blended} transparent)", scene.materials.len());
        if let Some(clip) = &scene.animation {
            println!(
                "  clip \"{}\": {} curves, {:.2}s",
                clip.name,
                clip.curves.len(),
                clip.duration()
            );
        }
    }

    Ok(())
}

/// Write a model summary to a JSON file
pub fn export_json(path: &Path, output: &Path, options: &LoadOptions) -> anyhow::Result<()> {
    let started = Instant::now();

    print_step(1, 3, LOOKING_GLASS, "Reading model...");
    let graph = read_model_with(path, options)?;

    print_step(2, 3, GEAR, "Summarizing...");
    let json = ModelSummary::from_graph(&graph).to_json()?;

    print_step(3, 3, DISK, "Writing JSON...");
    std::fs::write(output, json)?;

    print_done(started.elapsed());
    Ok(())
}
