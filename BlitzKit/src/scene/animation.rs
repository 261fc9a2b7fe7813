//! Keyframe tracks to a looping animation clip

use serde::Serialize;

use crate::formats::b3d::{KeyFlags, KeyframeTrack, SceneGraph};

/// Playback rate for key frame numbers.
pub const FRAMES_PER_SECOND: f32 = 24.0;

/// Name given to the assembled clip.
pub const CLIP_NAME: &str = "Animation";

/// One animated scalar of a node transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CurveProperty {
    PositionX,
    PositionY,
    PositionZ,
    ScaleX,
    ScaleY,
    ScaleZ,
    RotationX,
    RotationY,
    RotationZ,
    RotationW,
}

impl CurveProperty {
    const POSITION: [Self; 3] = [Self::PositionX, Self::PositionY, Self::PositionZ];
    const SCALE: [Self; 3] = [Self::ScaleX, Self::ScaleY, Self::ScaleZ];
    const ROTATION: [Self; 4] = [
        Self::RotationX,
        Self::RotationY,
        Self::RotationZ,
        Self::RotationW,
    ];

    /// Transform property name, e.g. `localPosition.x`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PositionX => "localPosition.x",
            Self::PositionY => "localPosition.y",
            Self::PositionZ => "localPosition.z",
            Self::ScaleX => "localScale.x",
            Self::ScaleY => "localScale.y",
            Self::ScaleZ => "localScale.z",
            Self::RotationX => "localRotation.x",
            Self::RotationY => "localRotation.y",
            Self::RotationZ => "localRotation.z",
            Self::RotationW => "localRotation.w",
        }
    }
}

/// A key at `time` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
}

/// Keys for one property of one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationCurve {
    /// Slash-joined node names from the scene root.
    pub path: String,
    pub property: CurveProperty,
    pub keys: Vec<Keyframe>,
}

/// All curves of a model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnimationClip {
    pub name: String,
    pub looping: bool,
    /// Frame count declared by the model.
    pub frames: i32,
    pub curves: Vec<AnimationCurve>,
}

impl AnimationClip {
    /// Clip length in seconds.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.frames as f32 / FRAMES_PER_SECOND
    }
}

fn frame_time(frame: usize) -> f32 {
    frame as f32 / FRAMES_PER_SECOND
}

fn track_curves(path: &str, track: &KeyframeTrack) -> Vec<AnimationCurve> {
    let mut curves = Vec::new();
    let mut push = |properties: &[CurveProperty], keys: Vec<(usize, Vec<f32>)>| {
        for (component, property) in properties.iter().enumerate() {
            curves.push(AnimationCurve {
                path: path.to_string(),
                property: *property,
                keys: keys
                    .iter()
                    .map(|(frame, values)| Keyframe {
                        time: frame_time(*frame),
                        value: values[component],
                    })
                    .collect(),
            });
        }
    };

    if track.flags.contains(KeyFlags::POSITION) {
        let keys = track
            .positions
            .iter()
            .map(|(frame, v)| (frame, v.to_array().to_vec()))
            .collect();
        push(&CurveProperty::POSITION, keys);
    }
    if track.flags.contains(KeyFlags::SCALE) {
        let keys = track
            .scales
            .iter()
            .map(|(frame, v)| (frame, v.to_array().to_vec()))
            .collect();
        push(&CurveProperty::SCALE, keys);
    }
    if track.flags.contains(KeyFlags::ROTATION) {
        let keys = track
            .rotations
            .iter()
            .map(|(frame, q)| (frame, q.to_array().to_vec()))
            .collect();
        push(&CurveProperty::ROTATION, keys);
    }
    curves
}

/// Build the model's clip, or `None` when it declares no frames.
///
/// Nodes are visited in reverse completion order, so parents come before
/// their children.
#[must_use]
pub fn build_clip(graph: &SceneGraph) -> Option<AnimationClip> {
    if !graph.has_animation() {
        return None;
    }

    let curves: Vec<AnimationCurve> = graph
        .node_ids()
        .rev()
        .filter_map(|id| {
            let track = graph.node(id).animation.as_ref()?;
            Some(track_curves(&graph.node_path(id), track))
        })
        .flatten()
        .collect();

    tracing::debug!(
        "Built clip with {} curves over {} frames",
        curves.len(),
        graph.anim_frames
    );
    Some(AnimationClip {
        name: CLIP_NAME.to_string(),
        looping: true,
        frames: graph.anim_frames,
        curves,
    })
}
