//! Decoded input records.
//!
//! These types mirror what the format decoders hand over: they are plain
//! serde-deserializable data with no conversion logic of their own. All of
//! them are immutable from the converter's point of view.

use serde::{Deserialize, Serialize};

/// One mesh vertex: a position and its normal, decoded as a pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VertexPair {
    /// Position in source coordinates (left-handed, +Z into the screen).
    pub position: [f32; 3],
    /// Per-vertex normal, same coordinate convention as `position`.
    pub normal: [f32; 3],
}

/// A textured triangle.
///
/// `uvs[i]` belongs to `indices[i]`; a polygon always carries exactly one
/// UV pair per referenced vertex, in face order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    /// Indices into [`MeshRecord::vertices`], source winding order.
    pub indices: [u32; 3],
    /// Index into the mesh's declared texture table.
    pub texture_slot: u32,
    /// Texture coordinates, one per face vertex.
    pub uvs: [[f32; 2]; 3],
}

/// A decoded mesh record: vertices, textured triangles, and the mesh's
/// own declared texture order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshRecord {
    /// Base name of the mesh; also names the output artifact.
    pub name: String,
    /// Ordered vertex list.
    pub vertices: Vec<VertexPair>,
    /// Ordered polygon list.
    pub polygons: Vec<Polygon>,
    /// The declared texture-name table (the mesh's canonical texture order).
    #[serde(default)]
    pub texture_names: Vec<String>,
}

impl MeshRecord {
    /// Number of vertices in the record.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of polygons in the record.
    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }
}

/// Image payload format of a resolved texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureFormat {
    /// Directly embeddable; passed through unchanged.
    Png,
    /// Legacy bitmap; re-encoded to PNG before embedding.
    Bmp,
}

/// A texture resolved by the external texture provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTexture {
    /// Name used for matching against the mesh's declared table.
    pub name: String,
    /// Raw image payload in `format`.
    pub data: Vec<u8>,
    /// Payload format.
    pub format: TextureFormat,
    /// Whether the image carries any non-opaque pixels.
    pub has_alpha: bool,
}

impl ResolvedTexture {
    pub fn new(
        name: impl Into<String>,
        data: Vec<u8>,
        format: TextureFormat,
        has_alpha: bool,
    ) -> Self {
        Self {
            name: name.into(),
            data,
            format,
            has_alpha,
        }
    }
}

/// An absolute vertex-position snapshot for one keyframe.
///
/// `positions` is parallel to [`MeshRecord::vertices`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub positions: Vec<[f32; 3]>,
}

/// A decoded keyframe animation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationRecord {
    /// Clip name.
    pub name: String,
    /// Names of the meshes this clip applies to, as decoded from the
    /// name-to-animation lookup table.
    #[serde(default)]
    pub mesh_names: Vec<String>,
    /// Explicit per-keyframe timestamps. When absent, integer frame
    /// indices are used as the time axis.
    #[serde(default)]
    pub key_times: Option<Vec<f32>>,
    /// Ordered keyframes.
    pub keyframes: Vec<Keyframe>,
}

impl AnimationRecord {
    /// Number of keyframes in the clip.
    pub fn keyframe_count(&self) -> usize {
        self.keyframes.len()
    }
}

/// The read-only animation lookup built once per run and passed by
/// reference into each conversion. Never mutated after construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationLibrary {
    records: Vec<AnimationRecord>,
}

impl AnimationLibrary {
    /// Create an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a library from decoded records.
    pub fn from_records(records: Vec<AnimationRecord>) -> Self {
        Self { records }
    }

    /// All records, in insertion order.
    pub fn records(&self) -> &[AnimationRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
