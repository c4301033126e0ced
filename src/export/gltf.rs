//! glTF assembly and writing.
//!
//! Orchestrates one conversion: resolve texture order, build primitives,
//! optionally bake the matched animation clip, stream every numeric block
//! through the encoder, and serialize a single self-contained `.gltf`
//! artifact (buffers and images embedded as data URIs).

use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::{prelude::BASE64_STANDARD, Engine as _};
use gltf_json as json;
use json::validation::Checked::Valid;

use crate::animation::{sample_morph_targets, select_clip, SampledAnimation};
use crate::converter::ConvertContext;
use crate::error::{ConvertError, Result};
use crate::export::encoder::{ElementShape, StreamEncoder};
use crate::primitives::{build_primitives, Primitive};
use crate::resolver::reorder_textures;
use crate::types::{MeshRecord, ResolvedTexture, TextureFormat};

/// Convert one decoded mesh record into a `.gltf` artifact in
/// `output_dir`, named from the record's own base name.
///
/// The full container is assembled in memory before any file write
/// begins; no partial artifact is ever written.
pub fn convert_record(
    record: &MeshRecord,
    ctx: &ConvertContext<'_>,
    output_dir: &Path,
) -> Result<PathBuf> {
    let textures = reorder_textures(&record.texture_names, ctx.textures);
    let primitives = build_primitives(record, textures.len())?;

    let animation = if ctx.include_animation && !primitives.is_empty() {
        match select_clip(ctx.animations, &record.name) {
            Some(clip) => {
                tracing::debug!(mesh = %record.name, clip = %clip.name, "baking animation clip");
                Some(sample_morph_targets(clip, &primitives, record.vertex_count())?)
            }
            None => None,
        }
    } else {
        None
    };

    let root = build_root(&primitives, &textures, animation.as_ref())?;
    write_artifact(&root, output_dir, &record.name)
}

/// Assemble the glTF container: one scene, one node, one mesh holding all
/// primitives, plus per-primitive material/texture/image entries in
/// compacted order and at most one morph-weight animation.
pub fn build_root(
    primitives: &[Primitive],
    textures: &[&ResolvedTexture],
    animation: Option<&SampledAnimation>,
) -> Result<json::Root> {
    if let Some(sampled) = animation {
        if sampled.primitives.len() != primitives.len() {
            return Err(ConvertError::Precondition(format!(
                "animation '{}' was baked for {} primitives, mesh has {}",
                sampled.name,
                sampled.primitives.len(),
                primitives.len()
            )));
        }
    }

    let mut encoder = StreamEncoder::new();
    let mut gltf_primitives = Vec::with_capacity(primitives.len());
    let mut images = Vec::with_capacity(primitives.len());
    let mut gltf_textures = Vec::with_capacity(primitives.len());
    let mut materials = Vec::with_capacity(primitives.len());

    for (i, primitive) in primitives.iter().enumerate() {
        let indices = encoder.push_u32(
            &primitive.indices,
            ElementShape::Scalar,
            Some(json::buffer::Target::ElementArrayBuffer),
            false,
        )?;
        let positions = encoder.push_f32(
            &primitive.positions_flat(),
            ElementShape::Vec3,
            Some(json::buffer::Target::ArrayBuffer),
            true,
        )?;
        let normals = encoder.push_f32(
            &primitive.normals_flat(),
            ElementShape::Vec3,
            Some(json::buffer::Target::ArrayBuffer),
            true,
        )?;
        let uvs = encoder.push_f32(
            &primitive.uvs_flat(),
            ElementShape::Vec2,
            Some(json::buffer::Target::ArrayBuffer),
            true,
        )?;

        let mut attributes = std::collections::BTreeMap::new();
        attributes.insert(
            Valid(json::mesh::Semantic::Positions),
            json::Index::new(positions),
        );
        attributes.insert(
            Valid(json::mesh::Semantic::Normals),
            json::Index::new(normals),
        );
        attributes.insert(
            Valid(json::mesh::Semantic::TexCoords(0)),
            json::Index::new(uvs),
        );

        // One morph target per keyframe, in keyframe order.
        let targets = match animation {
            Some(sampled) => {
                let mut list = Vec::with_capacity(sampled.keyframe_count());
                for deltas in &sampled.primitives[i].keyframes {
                    let flat: Vec<f32> = deltas.iter().flat_map(|d| *d).collect();
                    let accessor = encoder.push_f32(
                        &flat,
                        ElementShape::Vec3,
                        Some(json::buffer::Target::ArrayBuffer),
                        true,
                    )?;
                    list.push(json::mesh::MorphTarget {
                        positions: Some(json::Index::new(accessor)),
                        normals: None,
                        tangents: None,
                    });
                }
                Some(list)
            }
            None => None,
        };

        gltf_primitives.push(json::mesh::Primitive {
            attributes,
            extensions: Default::default(),
            extras: Default::default(),
            indices: Some(json::Index::new(indices)),
            material: Some(json::Index::new(i as u32)),
            mode: Valid(json::mesh::Mode::Triangles),
            targets,
        });

        // Image, texture, and material share the primitive's compacted
        // position, so their indices line up by construction.
        let texture = textures[primitive.texture_slot];
        images.push(json::Image {
            buffer_view: None,
            mime_type: None,
            uri: Some(image_data_uri(texture)?),
            extensions: Default::default(),
            extras: Default::default(),
        });
        gltf_textures.push(json::Texture {
            sampler: None,
            source: json::Index::new(i as u32),
            extensions: Default::default(),
            extras: Default::default(),
        });
        materials.push(create_material(i as u32, texture.has_alpha));
    }

    let mut animations = Vec::new();
    if let Some(sampled) = animation {
        let weights = encoder.push_f32(&sampled.weights, ElementShape::Scalar, None, false)?;
        let times = encoder.push_f32(&sampled.times, ElementShape::Scalar, None, true)?;

        animations.push(json::Animation {
            extensions: Default::default(),
            extras: Default::default(),
            channels: vec![json::animation::Channel {
                sampler: json::Index::new(0),
                target: json::animation::Target {
                    extensions: Default::default(),
                    extras: Default::default(),
                    node: json::Index::new(0),
                    path: Valid(json::animation::Property::MorphTargetWeights),
                },
                extensions: Default::default(),
                extras: Default::default(),
            }],
            samplers: vec![json::animation::Sampler {
                extensions: Default::default(),
                extras: Default::default(),
                input: json::Index::new(times),
                interpolation: Valid(json::animation::Interpolation::Linear),
                output: json::Index::new(weights),
            }],
        });
    }

    let (buffers, buffer_views, accessors) = encoder.into_parts();

    Ok(json::Root {
        accessors,
        animations,
        buffers,
        buffer_views,
        images,
        materials,
        meshes: vec![json::Mesh {
            extensions: Default::default(),
            extras: Default::default(),
            primitives: gltf_primitives,
            weights: None,
        }],
        nodes: vec![json::Node {
            camera: None,
            children: None,
            extensions: Default::default(),
            extras: Default::default(),
            matrix: None,
            mesh: Some(json::Index::new(0)),
            rotation: None,
            scale: None,
            translation: None,
            skin: None,
            weights: None,
        }],
        scenes: vec![json::Scene {
            extensions: Default::default(),
            extras: Default::default(),
            nodes: vec![json::Index::new(0)],
        }],
        scene: Some(json::Index::new(0)),
        textures: gltf_textures,
        ..Default::default()
    })
}

/// Serialize the container and write it once as `<base_name>.gltf`.
pub fn write_artifact(root: &json::Root, output_dir: &Path, base_name: &str) -> Result<PathBuf> {
    let json_string = json::serialize::to_string(root)
        .map_err(|e| ConvertError::Export(format!("failed to serialize glTF JSON: {e}")))?;

    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("{base_name}.gltf"));
    std::fs::write(&path, json_string)?;
    Ok(path)
}

/// Embed a resolved texture as a PNG data URI.
///
/// PNG payloads pass through unchanged; legacy bitmaps are re-encoded.
fn image_data_uri(texture: &ResolvedTexture) -> Result<String> {
    let png = match texture.format {
        TextureFormat::Png => texture.data.clone(),
        TextureFormat::Bmp => {
            let decoded =
                image::load_from_memory_with_format(&texture.data, image::ImageFormat::Bmp)?;
            let mut out = Vec::new();
            decoded.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)?;
            out
        }
    };
    Ok(format!(
        "data:image/png;base64,{}",
        BASE64_STANDARD.encode(png)
    ))
}

/// Textured double-sided material; blend mode only when the texture
/// carries alpha.
fn create_material(texture_index: u32, has_alpha: bool) -> json::Material {
    let alpha_mode = if has_alpha {
        json::material::AlphaMode::Blend
    } else {
        json::material::AlphaMode::Opaque
    };

    json::Material {
        pbr_metallic_roughness: json::material::PbrMetallicRoughness {
            base_color_texture: Some(json::texture::Info {
                index: json::Index::new(texture_index),
                tex_coord: 0,
                extensions: Default::default(),
                extras: Default::default(),
            }),
            base_color_factor: json::material::PbrBaseColorFactor([1.0, 1.0, 1.0, 1.0]),
            metallic_factor: json::material::StrengthFactor(0.0),
            roughness_factor: json::material::StrengthFactor(1.0),
            metallic_roughness_texture: None,
            extensions: Default::default(),
            extras: Default::default(),
        },
        alpha_mode: Valid(alpha_mode),
        alpha_cutoff: None,
        double_sided: true,
        normal_texture: None,
        occlusion_texture: None,
        emissive_texture: None,
        emissive_factor: json::material::EmissiveFactor([0.0, 0.0, 0.0]),
        extensions: Default::default(),
        extras: Default::default(),
    }
}
