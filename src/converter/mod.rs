//! Converter capability interface.
//!
//! The surrounding tool converts several proprietary format families;
//! each family plugs in one [`Converter`] implementation rather than a
//! deep inheritance chain. This crate ships the mesh-to-glTF family;
//! sibling families (audio, text, scenes) live with their own decoders.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::export::gltf::convert_record;
use crate::types::{AnimationLibrary, MeshRecord, ResolvedTexture};

/// Per-run read-only inputs, injected into each conversion call.
///
/// Built once per batch and shared by reference; nothing here is mutated
/// after construction, so conversions for independent records can run in
/// parallel at record granularity without coordination.
#[derive(Debug, Clone, Copy)]
pub struct ConvertContext<'a> {
    /// Externally resolved textures for the record, arbitrary order.
    pub textures: &'a [ResolvedTexture],
    /// The name-to-animation lookup for the containing object collection.
    pub animations: &'a AnimationLibrary,
    /// When false, animation lookup is skipped entirely (static output).
    pub include_animation: bool,
}

/// One proprietary format family: decode its records, convert them to
/// the destination format.
pub trait Converter {
    /// The decoded record type this family operates on.
    type Record;

    /// Decode a previously-decoded record from its serialized form.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Record>;

    /// Convert one record, returning the paths of the written artifacts.
    fn convert(
        &self,
        record: &Self::Record,
        ctx: &ConvertContext<'_>,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>>;
}

/// Mesh records to glTF.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshGltfConverter;

impl MeshGltfConverter {
    pub fn new() -> Self {
        Self
    }
}

impl Converter for MeshGltfConverter {
    type Record = MeshRecord;

    fn decode(&self, bytes: &[u8]) -> Result<MeshRecord> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn convert(
        &self,
        record: &MeshRecord,
        ctx: &ConvertContext<'_>,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        let path = convert_record(record, ctx, output_dir)?;
        Ok(vec![path])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_mesh_record() {
        let json = r#"{
            "name": "cart",
            "vertices": [{"position": [0.0, 0.0, 0.0], "normal": [0.0, 1.0, 0.0]}],
            "polygons": [],
            "texture_names": ["wood"]
        }"#;

        let converter = MeshGltfConverter::new();
        let record = converter.decode(json.as_bytes()).unwrap();
        assert_eq!(record.name, "cart");
        assert_eq!(record.vertex_count(), 1);
        assert_eq!(record.texture_names, vec!["wood"]);
    }

    #[test]
    fn test_decode_rejects_malformed_input() {
        let converter = MeshGltfConverter::new();
        assert!(converter.decode(b"not json").is_err());
    }

    #[test]
    fn test_convert_empty_record_writes_artifact() {
        let record = MeshRecord {
            name: "empty".to_string(),
            vertices: Vec::new(),
            polygons: Vec::new(),
            texture_names: Vec::new(),
        };
        let library = AnimationLibrary::new();
        let ctx = ConvertContext {
            textures: &[],
            animations: &library,
            include_animation: true,
        };
        let dir = tempfile::tempdir().unwrap();

        let converter = MeshGltfConverter::new();
        let paths = converter.convert(&record, &ctx, dir.path()).unwrap();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].exists());
        assert_eq!(paths[0].file_name().unwrap(), "empty.gltf");
    }
}
