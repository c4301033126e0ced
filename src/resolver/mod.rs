//! Texture-order resolution.
//!
//! Meshes declare their own canonical texture order; the texture provider
//! returns textures in arbitrary order, possibly a superset or subset.
//! This module reorders the resolved set to match the declared table.

use crate::types::ResolvedTexture;

/// Normalize a name for matching: trim whitespace and ASCII-lowercase.
///
/// Texture reorder and animation lookup both match through this function,
/// so matching is symmetric between the two.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Reorder resolved textures into the mesh's declared texture order.
///
/// Declared names with no resolved match are skipped (not null-padded), so
/// later matches shift forward. Resolved textures with no declared match
/// are appended after the matched ones, preserving their relative order.
/// Unmatched names in either direction are expected for legacy data and
/// are not errors.
pub fn reorder_textures<'a>(
    declared: &[String],
    resolved: &'a [ResolvedTexture],
) -> Vec<&'a ResolvedTexture> {
    let resolved_names: Vec<String> = resolved
        .iter()
        .map(|texture| normalize_name(&texture.name))
        .collect();

    // Declared names that actually have a resolved match, in declared order.
    let matched_declared: Vec<String> = declared
        .iter()
        .map(|name| normalize_name(name))
        .filter(|name| resolved_names.iter().any(|resolved| resolved == name))
        .collect();

    let mut slots: Vec<Option<&ResolvedTexture>> = vec![None; matched_declared.len()];
    let mut unmatched: Vec<&ResolvedTexture> = Vec::new();

    for (texture, name) in resolved.iter().zip(&resolved_names) {
        match matched_declared.iter().position(|declared| declared == name) {
            // First occurrence claims the slot; duplicates fall through to
            // the trailing list.
            Some(slot) if slots[slot].is_none() => slots[slot] = Some(texture),
            _ => {
                tracing::debug!(texture = %texture.name, "texture not in declared table");
                unmatched.push(texture);
            }
        }
    }

    slots.into_iter().flatten().chain(unmatched).collect()
}
