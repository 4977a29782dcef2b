//! Export options (§6) and the animation clip input types.
//!
//! Plain, `serde`-deserializable structs so a host tool can source them from
//! a manifest file the same way `nether-export` loads `assets.toml` — this
//! crate performs no file I/O of its own.

use serde::Deserialize;

fn default_scale() -> f32 {
    100.0
}

/// Options controlling what `parse` includes in the exported file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Include skin deformers, clusters, vertex groups, and the bind pose.
    pub export_skin: bool,
    /// Include material nodes and material→model connections.
    pub export_materials: bool,
    /// Skip objects whose `visible` flag is false.
    pub only_visible: bool,
    /// Include `Video` nodes with PNG byte content for each referenced
    /// texture.
    pub embed_images: bool,
    /// When embedding, downscale textures whose width or height exceeds
    /// this. `None` means unlimited.
    pub max_texture_size: Option<u32>,
    /// Multiplier applied to vertex positions and to the translation column
    /// of every exported matrix.
    pub scale: f32,
    /// Clips to emit.
    pub animations: Vec<AnimationClipInput>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            export_skin: true,
            export_materials: true,
            only_visible: true,
            embed_images: true,
            max_texture_size: None,
            scale: default_scale(),
            animations: Vec::new(),
        }
    }
}

/// One animation clip passed in via [`ParseOptions::animations`].
#[derive(Debug, Clone, Deserialize)]
pub struct AnimationClipInput {
    pub name: String,
    pub duration: f32,
    pub tracks: Vec<AnimationTrackInput>,
}

/// One keyframed channel within a clip.
#[derive(Debug, Clone, Deserialize)]
pub struct AnimationTrackInput {
    /// `"<bone>.<property>"`, property ∈ {`position`, `scale`, `quaternion`}.
    pub name: String,
    pub times: Vec<f32>,
    pub values: Vec<f32>,
}
