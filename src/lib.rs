//! # Meshforge
//!
//! A Rust library for converting decoded legacy game mesh records into
//! self-contained glTF assets.
//!
//! ## Overview
//!
//! This library takes an already-decoded mesh record (vertices, normals,
//! textured triangles, the mesh's declared texture order) plus a set of
//! resolved textures and an optional animation lookup, and produces one
//! `.gltf` artifact per record: a single mesh of per-texture primitives
//! with embedded images and at most one morph-target animation clip.
//!
//! Buffers and images are embedded as data URIs, so the artifact is a
//! single portable file.
//!
//! ## Quick Start
//!
//! ```ignore
//! use meshforge::{convert_record, AnimationLibrary, ConvertContext};
//!
//! // Decode a mesh record (typically from the decoder's JSON output)
//! let record: meshforge::MeshRecord = serde_json::from_str(&json)?;
//!
//! // Resolve textures and animations with your own providers
//! let textures: Vec<meshforge::ResolvedTexture> = load_textures(&record)?;
//! let animations = AnimationLibrary::new();
//!
//! let ctx = ConvertContext {
//!     textures: &textures,
//!     animations: &animations,
//!     include_animation: true,
//! };
//!
//! // Write `<name>.gltf` into the output directory
//! let path = convert_record(&record, &ctx, output_dir)?;
//! ```
//!
//! ## Pipeline
//!
//! One conversion call runs, in order: texture-order resolution
//! ([`resolver`]), per-texture vertex deduplication and primitive
//! partitioning ([`primitives`]), optional morph-target baking
//! ([`animation`]), and binary buffer/accessor packing plus container
//! assembly ([`export`]). Each call owns its encoder and derived data;
//! the only shared inputs are the read-only texture set and animation
//! library in [`ConvertContext`].

pub mod animation;
pub mod converter;
pub mod error;
pub mod export;
pub mod primitives;
pub mod resolver;
pub mod types;

// Re-export main types for convenience
pub use animation::{
    sample_morph_targets, select_clip, SampledAnimation, MAX_ANIMATION_CLIPS_PER_MESH,
};
pub use converter::{ConvertContext, Converter, MeshGltfConverter};
pub use error::{ConvertError, Result};
pub use export::encoder::{ElementShape, StreamEncoder};
pub use export::gltf::{build_root, convert_record, write_artifact};
pub use primitives::{build_primitives, Primitive};
pub use resolver::{normalize_name, reorder_textures};
pub use types::{
    AnimationLibrary, AnimationRecord, Keyframe, MeshRecord, Polygon, ResolvedTexture,
    TextureFormat, VertexPair,
};
