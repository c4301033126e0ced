//! Morph-target baking for keyframe animations.
//!
//! The source format animates by storing absolute vertex positions per
//! keyframe; glTF morph targets want relative deltas blended by weights.
//! This module matches a clip to a mesh, replays its keyframe snapshots
//! in each primitive's compacted vertex order, and bakes the deltas plus
//! a one-hot weight track and a time axis.

use glam::Vec3;

use crate::error::{ConvertError, Result};
use crate::primitives::{flip_z, Primitive};
use crate::resolver::normalize_name;
use crate::types::{AnimationLibrary, AnimationRecord};

/// At most one clip is encoded per mesh. A capability limit of the output
/// convention used here, not a recoverable error: extra matches are
/// logged and dropped.
pub const MAX_ANIMATION_CLIPS_PER_MESH: usize = 1;

/// Per-primitive morph data: one relative-delta array per keyframe.
#[derive(Debug, Clone, PartialEq)]
pub struct MorphTargets {
    /// `keyframes[k][i]` is the position delta of compacted vertex `i`
    /// at keyframe `k`, relative to the primitive's base position.
    pub keyframes: Vec<Vec<[f32; 3]>>,
}

/// A clip baked against one mesh's primitives, ready for encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledAnimation {
    /// Clip name.
    pub name: String,
    /// Time axis, one value per keyframe.
    pub times: Vec<f32>,
    /// Flattened one-hot weight rows: K rows of K weights, row k carrying
    /// a single 1.0 at its own morph-target slot.
    pub weights: Vec<f32>,
    /// Morph data per primitive, parallel to the primitive list.
    pub primitives: Vec<MorphTargets>,
}

impl SampledAnimation {
    /// Number of keyframes in the baked clip.
    pub fn keyframe_count(&self) -> usize {
        self.times.len()
    }
}

/// All clips in the library matching `mesh_name`, case-insensitively.
pub fn matching_clips<'a>(
    library: &'a AnimationLibrary,
    mesh_name: &str,
) -> Vec<&'a AnimationRecord> {
    let wanted = normalize_name(mesh_name);
    library
        .records()
        .iter()
        .filter(|record| {
            record
                .mesh_names
                .iter()
                .any(|name| normalize_name(name) == wanted)
        })
        .collect()
}

/// The clip to encode for `mesh_name`, or `None` if nothing matches.
///
/// When more than [`MAX_ANIMATION_CLIPS_PER_MESH`] clips match, the first
/// match wins and the rest are dropped with a warning.
pub fn select_clip<'a>(
    library: &'a AnimationLibrary,
    mesh_name: &str,
) -> Option<&'a AnimationRecord> {
    let clips = matching_clips(library, mesh_name);
    if clips.len() > MAX_ANIMATION_CLIPS_PER_MESH {
        tracing::warn!(
            mesh = mesh_name,
            matched = clips.len(),
            kept = MAX_ANIMATION_CLIPS_PER_MESH,
            "multiple animation clips match; encoding the first only"
        );
    }
    clips.into_iter().next()
}

/// Bake a clip's absolute keyframe snapshots into per-primitive relative
/// deltas, a one-hot weight track, and a time axis.
///
/// `vertex_count` is the mesh record's vertex count; every keyframe
/// snapshot must be parallel to the mesh's vertex list.
pub fn sample_morph_targets(
    record: &AnimationRecord,
    primitives: &[Primitive],
    vertex_count: usize,
) -> Result<SampledAnimation> {
    let keyframe_count = record.keyframe_count();
    if keyframe_count == 0 {
        return Err(ConvertError::Precondition(format!(
            "animation '{}' has no keyframes",
            record.name
        )));
    }

    for (k, keyframe) in record.keyframes.iter().enumerate() {
        if keyframe.positions.len() != vertex_count {
            return Err(ConvertError::Precondition(format!(
                "animation '{}' keyframe {k} has {} positions, mesh has {vertex_count}",
                record.name,
                keyframe.positions.len()
            )));
        }
    }

    let times = match &record.key_times {
        Some(times) => {
            if times.len() != keyframe_count {
                return Err(ConvertError::Precondition(format!(
                    "animation '{}' has {} key times for {keyframe_count} keyframes",
                    record.name,
                    times.len()
                )));
            }
            times.clone()
        }
        None => (0..keyframe_count).map(|frame| frame as f32).collect(),
    };

    let baked = primitives
        .iter()
        .map(|primitive| bake_primitive(record, primitive))
        .collect();

    // Row k is all zero except a 1.0 at keyframe k's own target slot.
    let mut weights = vec![0.0f32; keyframe_count * keyframe_count];
    for frame in 0..keyframe_count {
        weights[frame * keyframe_count + frame] = 1.0;
    }

    Ok(SampledAnimation {
        name: record.name.clone(),
        times,
        weights,
        primitives: baked,
    })
}

/// Replay a clip's snapshots in one primitive's compacted vertex order
/// and subtract the base positions.
fn bake_primitive(record: &AnimationRecord, primitive: &Primitive) -> MorphTargets {
    let keyframes = record
        .keyframes
        .iter()
        .map(|keyframe| {
            primitive
                .source_vertices
                .iter()
                .zip(&primitive.positions)
                .map(|(&source, &base)| {
                    // Snapshots share the source coordinate convention, so
                    // they get the same Z flip as the base positions.
                    let snapshot = Vec3::from(flip_z(keyframe.positions[source as usize]));
                    (snapshot - Vec3::from(base)).to_array()
                })
                .collect()
        })
        .collect();
    MorphTargets { keyframes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::build_primitives;
    use crate::types::{Keyframe, MeshRecord, Polygon, VertexPair};

    fn mesh() -> MeshRecord {
        MeshRecord {
            name: "Door_A".to_string(),
            vertices: vec![
                VertexPair {
                    position: [0.0, 0.0, 0.0],
                    normal: [0.0, 1.0, 0.0],
                },
                VertexPair {
                    position: [1.0, 0.0, 0.0],
                    normal: [0.0, 1.0, 0.0],
                },
                VertexPair {
                    position: [1.0, 1.0, 1.0],
                    normal: [0.0, 1.0, 0.0],
                },
            ],
            polygons: vec![Polygon {
                indices: [0, 1, 2],
                texture_slot: 0,
                uvs: [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]],
            }],
            texture_names: vec!["t".to_string()],
        }
    }

    fn clip(mesh_names: &[&str], key_times: Option<Vec<f32>>, keyframes: usize) -> AnimationRecord {
        AnimationRecord {
            name: "open".to_string(),
            mesh_names: mesh_names.iter().map(|s| s.to_string()).collect(),
            key_times,
            keyframes: (0..keyframes)
                .map(|k| Keyframe {
                    positions: vec![
                        [k as f32, 0.0, 0.0],
                        [1.0 + k as f32, 0.0, 0.0],
                        [1.0, 1.0, 1.0],
                    ],
                })
                .collect(),
        }
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let library = AnimationLibrary::from_records(vec![clip(&["door_a"], None, 2)]);
        assert_eq!(matching_clips(&library, "DOOR_A").len(), 1);
        assert_eq!(matching_clips(&library, "door_b").len(), 0);
    }

    #[test]
    fn test_select_clip_keeps_first_match() {
        let mut second = clip(&["door_a"], None, 2);
        second.name = "close".to_string();
        let library = AnimationLibrary::from_records(vec![clip(&["door_a"], None, 2), second]);

        let selected = select_clip(&library, "Door_A").unwrap();
        assert_eq!(selected.name, "open");
    }

    #[test]
    fn test_explicit_key_times_pass_through() {
        let record = clip(&["door_a"], Some(vec![0.0, 0.5, 1.2]), 3);
        let primitives = build_primitives(&mesh(), 1).unwrap();
        let sampled = sample_morph_targets(&record, &primitives, 3).unwrap();
        assert_eq!(sampled.times, vec![0.0, 0.5, 1.2]);
    }

    #[test]
    fn test_default_time_axis_is_frame_indices() {
        let record = clip(&["door_a"], None, 4);
        let primitives = build_primitives(&mesh(), 1).unwrap();
        let sampled = sample_morph_targets(&record, &primitives, 3).unwrap();
        assert_eq!(sampled.times, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_one_hot_weight_rows() {
        let record = clip(&["door_a"], None, 3);
        let primitives = build_primitives(&mesh(), 1).unwrap();
        let sampled = sample_morph_targets(&record, &primitives, 3).unwrap();
        #[rustfmt::skip]
        assert_eq!(sampled.weights, vec![
            1.0, 0.0, 0.0,
            0.0, 1.0, 0.0,
            0.0, 0.0, 1.0,
        ]);
    }

    #[test]
    fn test_deltas_are_relative_and_z_flipped() {
        let record = clip(&["door_a"], None, 2);
        let primitives = build_primitives(&mesh(), 1).unwrap();
        let sampled = sample_morph_targets(&record, &primitives, 3).unwrap();

        let targets = &sampled.primitives[0];
        assert_eq!(targets.keyframes.len(), 2);
        // Keyframe 0 equals the base pose for vertices 0 and 1.
        assert_eq!(targets.keyframes[0][0], [0.0, 0.0, 0.0]);
        // Keyframe 1 moves vertex 0 by +1 in X. Compacted order is
        // (0, 2, 1) after the winding fix, so vertex 0 stays first and
        // source vertex 1 lands at compacted slot 2.
        assert_eq!(targets.keyframes[1][0], [1.0, 0.0, 0.0]);
        assert_eq!(targets.keyframes[1][2], [1.0, 0.0, 0.0]);
        // Vertex 2 (compacted slot 1) never moves; its snapshot Z matches
        // the flipped base Z exactly.
        assert_eq!(targets.keyframes[1][1], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_snapshot_length_mismatch_aborts() {
        let mut record = clip(&["door_a"], None, 2);
        record.keyframes[1].positions.pop();
        let primitives = build_primitives(&mesh(), 1).unwrap();
        let err = sample_morph_targets(&record, &primitives, 3).unwrap_err();
        assert!(matches!(err, ConvertError::Precondition(_)));
    }

    #[test]
    fn test_key_time_length_mismatch_aborts() {
        let record = clip(&["door_a"], Some(vec![0.0]), 2);
        let primitives = build_primitives(&mesh(), 1).unwrap();
        let err = sample_morph_targets(&record, &primitives, 3).unwrap_err();
        assert!(matches!(err, ConvertError::Precondition(_)));
    }

    #[test]
    fn test_zero_keyframes_abort() {
        let record = AnimationRecord {
            name: "empty".to_string(),
            mesh_names: vec!["door_a".to_string()],
            key_times: None,
            keyframes: Vec::new(),
        };
        let err = sample_morph_targets(&record, &[], 3).unwrap_err();
        assert!(matches!(err, ConvertError::Precondition(_)));
    }
}
