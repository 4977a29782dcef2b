//! Name conventions (§4.7): the `\x00\x01<Class>` sentinel, Mixamo bone-name
//! normalization, the editor-helper discard pattern, and texture filename
//! sanitization.

use regex::Regex;
use std::sync::OnceLock;

/// FBX class names that can appear after the `nameWithClass` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FbxClass {
    Model,
    NodeAttribute,
    Geometry,
    Material,
    Texture,
    Video,
    Deformer,
    Pose,
    AnimStack,
    AnimLayer,
    AnimCurveNode,
    AnimCurve,
    SceneInfo,
}

impl FbxClass {
    fn as_str(self) -> &'static str {
        match self {
            FbxClass::Model => "Model",
            FbxClass::NodeAttribute => "NodeAttribute",
            FbxClass::Geometry => "Geometry",
            FbxClass::Material => "Material",
            FbxClass::Texture => "Texture",
            FbxClass::Video => "Video",
            FbxClass::Deformer => "Deformer",
            FbxClass::Pose => "Pose",
            FbxClass::AnimStack => "AnimStack",
            FbxClass::AnimLayer => "AnimLayer",
            FbxClass::AnimCurveNode => "AnimCurveNode",
            FbxClass::AnimCurve => "AnimCurve",
            FbxClass::SceneInfo => "SceneInfo",
        }
    }
}

/// `n + 0x00 + 0x01 + cls`, the sentinel FBX uses to tag an object name with
/// its owning class inline in the `Model`/`Geometry`/etc. node's name
/// property.
pub fn name_with_class(name: &str, class: FbxClass) -> String {
    format!("{name}\u{0}\u{1}{}", class.as_str())
}

fn mixamo_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^mixamorig([A-Z].*)$").unwrap())
}

/// Rewrites `mixamorigHips` to `mixamorig:Hips`. Names already containing a
/// colon (already normalized) pass through unchanged.
pub fn normalize_mixamo_name(name: &str) -> String {
    if let Some(caps) = mixamo_pattern().captures(name) {
        format!("mixamorig:{}", &caps[1])
    } else {
        name.to_string()
    }
}

fn discard_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(mesh_\d+|widget|handle|helper|bonevis)").unwrap()
    })
}

/// True when a plain mesh's name matches the editor-helper discard
/// convention (§4.2).
pub fn is_discarded_mesh_name(name: &str) -> bool {
    discard_pattern().is_match(name)
}

/// Sanitizes a texture name for filesystem safety: non-alphanumeric
/// characters become `_`; an empty result falls back to `Texture_<uuid>`.
pub fn sanitize_texture_name(name: &str, fallback_uuid: u64) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if sanitized.is_empty() {
        format!("Texture_{fallback_uuid:016x}")
    } else {
        sanitized
    }
}
