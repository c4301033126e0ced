//! Primitive building: per-texture partitioning and vertex deduplication.
//!
//! The source format stores one flat polygon list with per-face texture
//! slots; glTF wants one primitive per material. This module partitions
//! faces by slot and compacts each partition's vertices.

use std::collections::HashMap;

use glam::Vec3;

use crate::error::{ConvertError, Result};
use crate::types::MeshRecord;

/// One texture-homogeneous sub-mesh with compacted vertex arrays.
///
/// A compacted vertex is identified by the pair (original vertex index,
/// UV coordinate): two faces referencing the same original vertex with
/// different UVs get two distinct compacted vertices, so UV seams stay
/// sharp. `indices` only ever references positions local to this
/// primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    /// Slot in the reordered texture list this primitive is painted with.
    pub texture_slot: usize,
    /// Compacted vertex positions (destination coordinates).
    pub positions: Vec<[f32; 3]>,
    /// Compacted vertex normals, parallel to `positions`.
    pub normals: Vec<[f32; 3]>,
    /// Compacted texture coordinates, parallel to `positions`.
    pub uvs: Vec<[f32; 2]>,
    /// Triangle indices into the compacted arrays, three per face.
    pub indices: Vec<u32>,
    /// Original vertex index behind each compacted vertex; lets the
    /// animation sampler replay keyframe snapshots in compacted order.
    pub source_vertices: Vec<u32>,
}

impl Primitive {
    fn new(texture_slot: usize) -> Self {
        Self {
            texture_slot,
            positions: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            indices: Vec::new(),
            source_vertices: Vec::new(),
        }
    }

    /// Append a compacted vertex and return its local index.
    fn push_vertex(
        &mut self,
        position: [f32; 3],
        normal: [f32; 3],
        uv: [f32; 2],
        source: u32,
    ) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.normals.push(normal);
        self.uvs.push(uv);
        self.source_vertices.push(source);
        index
    }

    /// Number of compacted vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Positions as a flat array (for encoding).
    pub fn positions_flat(&self) -> Vec<f32> {
        self.positions.iter().flat_map(|p| *p).collect()
    }

    /// Normals as a flat array (for encoding).
    pub fn normals_flat(&self) -> Vec<f32> {
        self.normals.iter().flat_map(|n| *n).collect()
    }

    /// UVs as a flat array (for encoding).
    pub fn uvs_flat(&self) -> Vec<f32> {
        self.uvs.iter().flat_map(|uv| *uv).collect()
    }
}

/// Negate Z: the source format is left-handed, glTF is right-handed.
pub(crate) fn flip_z(v: [f32; 3]) -> [f32; 3] {
    Vec3::new(v[0], v[1], -v[2]).to_array()
}

/// Partition a mesh record's faces into per-texture primitives.
///
/// Iterates texture slots `0..texture_count` in order; a slot with no
/// faces emits no primitive, so the result is compacted (primitive `i`
/// corresponds to the i-th non-empty slot, not literally slot `i`).
/// Downstream material/texture/image registration must follow the same
/// compacted order.
pub fn build_primitives(record: &MeshRecord, texture_count: usize) -> Result<Vec<Primitive>> {
    let vertex_count = record.vertices.len() as u32;
    for (i, polygon) in record.polygons.iter().enumerate() {
        for &index in &polygon.indices {
            if index >= vertex_count {
                return Err(ConvertError::Precondition(format!(
                    "polygon {i} references vertex {index} but mesh '{}' has {vertex_count}",
                    record.name
                )));
            }
        }
    }

    let mut primitives = Vec::new();
    for slot in 0..texture_count {
        match build_slot_primitive(record, slot) {
            Some(primitive) => primitives.push(primitive),
            None => tracing::debug!(mesh = %record.name, slot, "no faces for texture slot"),
        }
    }
    Ok(primitives)
}

/// Build the primitive for one texture slot, or `None` if no face uses it.
fn build_slot_primitive(record: &MeshRecord, slot: usize) -> Option<Primitive> {
    let mut primitive = Primitive::new(slot);
    // Dedup key: (original vertex index, UV bit patterns). Insertion order
    // lives in the primitive's own arrays, so hash order never leaks into
    // the output.
    let mut seen: HashMap<(u32, u32, u32), u32> = HashMap::new();

    for polygon in &record.polygons {
        if polygon.texture_slot as usize != slot {
            continue;
        }
        // Corrected winding: emit a, c, b so front faces stay front-facing
        // after the Z flip.
        for corner in [0usize, 2, 1] {
            let vertex_index = polygon.indices[corner];
            let uv = polygon.uvs[corner];
            let key = (vertex_index, uv[0].to_bits(), uv[1].to_bits());
            let compacted = *seen.entry(key).or_insert_with(|| {
                let pair = &record.vertices[vertex_index as usize];
                primitive.push_vertex(
                    flip_z(pair.position),
                    flip_z(pair.normal),
                    uv,
                    vertex_index,
                )
            });
            primitive.indices.push(compacted);
        }
    }

    if primitive.indices.is_empty() {
        None
    } else {
        Some(primitive)
    }
}
