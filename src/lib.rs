//! Encodes an in-memory 3D scene graph to the binary FBX 7500 interchange
//! format: a single-threaded pure transformation from [`SceneNode`] +
//! [`ParseOptions`] to a byte buffer.
//!
//! The pipeline: [`collector`] partitions the scene into models, skinned
//! meshes, and bones, and allocates ids via [`ids`]; [`builder`] and
//! [`skinning`]/[`animation`] turn those into an [`node::FbxNode`] tree;
//! [`writer`] serializes that tree to bytes.

mod animation;
mod builder;
mod collector;
pub mod error;
mod ids;
mod names;
mod node;
mod options;
mod scene;
mod skinning;
mod writer;

pub use error::TextureError;
pub use options::{AnimationClipInput, AnimationTrackInput, ParseOptions};
pub use scene::{
    MaterialRef, MeshData, RotationOrder, SceneNode, SkinBinding, Skeleton, TextureRef, UserData,
};

use hashbrown::HashMap;

use builder::connections::Connections;
use collector::ObjectKind;
use ids::IdRegistry;
use names::normalize_mixamo_name;
use node::FbxNode;
use writer::{BinaryWriter, TopLevelNodes};

/// Tallies how many of each object type end up in `Objects`, in the fixed
/// order `Definitions` lists them.
#[derive(Default)]
struct ObjectCounts {
    model: i64,
    node_attribute: i64,
    geometry: i64,
    material: i64,
    texture: i64,
    video: i64,
    deformer: i64,
    pose: i64,
    anim_stack: i64,
    anim_layer: i64,
    anim_curve_node: i64,
    anim_curve: i64,
}

impl ObjectCounts {
    fn as_definitions(&self) -> Vec<(&'static str, i64)> {
        [
            ("Model", self.model),
            ("NodeAttribute", self.node_attribute),
            ("Geometry", self.geometry),
            ("Material", self.material),
            ("Texture", self.texture),
            ("Video", self.video),
            ("Deformer", self.deformer),
            ("Pose", self.pose),
            ("AnimationStack", self.anim_stack),
            ("AnimationLayer", self.anim_layer),
            ("AnimationCurveNode", self.anim_curve_node),
            ("AnimationCurve", self.anim_curve),
        ]
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .collect()
    }
}

/// Encodes `root` into a binary FBX 7500 byte buffer.
pub fn parse(root: &SceneNode, options: &ParseOptions) -> Vec<u8> {
    let flat = collector::flatten(root);
    let mut ids = IdRegistry::new();
    let collected = collector::collect(&flat, options, &mut ids);
    let mut connections = Connections::new();
    let mut counts = ObjectCounts::default();
    let mut objects_children = Vec::new();

    if let Some(armature) = &collected.armature {
        let armature_node = flat[armature.flat_index].node;
        objects_children.push(builder::models::model_node(
            armature.id,
            &armature_node.name,
            "Null",
            armature_node.translation,
            armature_node.rotation_euler,
            armature_node.rotation_order,
            armature_node.scale,
            options.scale,
            false,
        ));
        counts.model += 1;
        let attr_id = ids.alloc();
        objects_children.push(builder::models::node_attribute(
            attr_id,
            &armature_node.name,
            "Null",
            "Null",
        ));
        counts.node_attribute += 1;
        connections.oo(attr_id, armature.id);
        // The synthetic armature is always a top-level node; it connects
        // to the scene root regardless of where its source node sat.
        connections.oo(armature.id, 0);
    }

    for obj in &collected.objects {
        let node = flat[obj.flat_index].node;
        let is_bone = obj.kind == ObjectKind::LimbNode;
        let parent_id = collected.collected_ancestor_id(obj.flat_index).unwrap_or(0);

        // Bone names are normalized the same way everywhere they appear
        // (vertex groups, cluster names, track resolution, §4.7) — including
        // the bone's own Model/NodeAttribute, so a reimporter's track lookup
        // and the scene's bone names agree.
        let display_name = if is_bone {
            normalize_mixamo_name(&node.name)
        } else {
            node.name.clone()
        };

        objects_children.push(builder::models::model_node(
            obj.id,
            &display_name,
            obj.kind.as_fbx_str(),
            node.translation,
            node.rotation_euler,
            node.rotation_order,
            node.scale,
            options.scale,
            is_bone,
        ));
        counts.model += 1;
        connections.oo(obj.id, parent_id);

        match obj.kind {
            ObjectKind::LimbNode => {
                let attr_id = ids.alloc();
                objects_children.push(builder::models::node_attribute(
                    attr_id,
                    &display_name,
                    "LimbNode",
                    "Skeleton",
                ));
                counts.node_attribute += 1;
                connections.oo(attr_id, obj.id);
            }
            ObjectKind::Null => {
                let attr_id = ids.alloc();
                objects_children.push(builder::models::node_attribute(
                    attr_id, &node.name, "Null", "Null",
                ));
                counts.node_attribute += 1;
                connections.oo(attr_id, obj.id);
            }
            ObjectKind::Mesh => {
                build_mesh_object(
                    obj.id,
                    node,
                    &flat,
                    &collected,
                    options,
                    &mut ids,
                    &mut connections,
                    &mut counts,
                    &mut objects_children,
                );
            }
        }
    }

    if !options.animations.is_empty() {
        let bone_lookup: HashMap<String, u64> = collected
            .objects
            .iter()
            .filter(|o| o.kind == ObjectKind::LimbNode)
            .map(|o| (normalize_mixamo_name(&flat[o.flat_index].node.name), o.id))
            .collect();

        for clip in &options.animations {
            let result = animation::build_clip(&mut ids, &mut connections, clip, &bone_lookup, options.scale);
            for node in &result.nodes {
                match node.name.as_str() {
                    "AnimationStack" => counts.anim_stack += 1,
                    "AnimationLayer" => counts.anim_layer += 1,
                    "AnimationCurveNode" => counts.anim_curve_node += 1,
                    "AnimationCurve" => counts.anim_curve += 1,
                    _ => {}
                }
            }
            objects_children.extend(result.nodes);
        }
    }

    let objects = FbxNode::new("Objects").children(objects_children);
    let connections = connections.into_node();

    let top_level = TopLevelNodes {
        file_id: builder::header::file_id(),
        creation_time: builder::header::creation_time(),
        creator: builder::header::creator(),
        header_extension: builder::header::header_extension(),
        global_settings: builder::header::global_settings(),
        documents: builder::header::documents(&mut ids),
        references: builder::header::references(),
        definitions: builder::header::definitions(&counts.as_definitions()),
        objects,
        connections,
    };

    BinaryWriter::assemble(top_level)
}

/// Builds a mesh object's `Geometry`, material/texture, and (if skinned)
/// skin deformer + bind pose, as the `Mesh` arm of the main object loop.
#[allow(clippy::too_many_arguments)]
fn build_mesh_object(
    model_id: u64,
    node: &SceneNode,
    flat: &[collector::FlatNode<'_>],
    collected: &collector::CollectResult,
    options: &ParseOptions,
    ids: &mut IdRegistry,
    connections: &mut Connections,
    counts: &mut ObjectCounts,
    objects_children: &mut Vec<FbxNode>,
) {
    let mesh = node
        .mesh
        .as_ref()
        .expect("collector only assigns ObjectKind::Mesh to nodes carrying MeshData");
    let is_skinned = options.export_skin && mesh.skin.is_some() && node.skeleton.is_some();

    let bone_names: Option<Vec<String>> = is_skinned.then(|| {
        node.skeleton
            .as_ref()
            .unwrap()
            .bones
            .iter()
            .map(|&bone_flat| normalize_mixamo_name(&flat[bone_flat].node.name))
            .collect()
    });

    let geometry_id = ids.alloc();
    objects_children.push(builder::geometry::geometry_node(
        geometry_id,
        &node.name,
        mesh,
        options.scale,
        bone_names.as_deref(),
    ));
    counts.geometry += 1;
    connections.oo(geometry_id, model_id);

    if options.export_materials {
        let material = mesh.materials.first().cloned().unwrap_or_default();
        let material_id = ids.alloc();
        objects_children.push(builder::materials::material_node(material_id, &material));
        counts.material += 1;
        connections.oo(material_id, model_id);

        if options.embed_images {
            if let Some(texture) = &material.texture {
                embed_texture(texture, material_id, options, ids, connections, counts, objects_children);
            }
        }
    }

    if is_skinned {
        let skeleton = node.skeleton.as_ref().unwrap();
        let bone_ids: Vec<u64> = skeleton
            .bones
            .iter()
            .map(|&b| collected.id_of(b).expect("bone flat index was collected"))
            .collect();
        let bone_names = bone_names.clone().unwrap();
        let bone_world: Vec<glam::Mat4> = skeleton.bones.iter().map(|&b| flat[b].node.world_matrix).collect();

        if let Some(skin_result) = skinning::build_skin(
            ids,
            connections,
            geometry_id,
            &node.name,
            node.world_matrix,
            mesh,
            skeleton,
            &bone_ids,
            &bone_names,
            &bone_world,
            options.scale,
        ) {
            counts.deformer += 1 + bone_ids.len() as i64;
            objects_children.extend(skin_result.nodes);

            let mut pose_entries = Vec::with_capacity(skin_result.pose_entries.len() + 2);
            if let Some(armature) = &collected.armature {
                pose_entries.push((armature.id, flat[armature.flat_index].node.world_matrix));
            }
            pose_entries.push((model_id, node.world_matrix));
            pose_entries.extend(skin_result.pose_entries);

            let pose_id = ids.alloc();
            objects_children.push(skinning::bind_pose_node(pose_id, &pose_entries, options.scale));
            counts.pose += 1;
        }
    }
}

/// Decodes, optionally downscales, and embeds `texture`'s PNG bytes as a
/// `Video` + `Texture` pair. Logs a warning and omits the texture entirely
/// on any failure (§7: unreadable/CORS-tainted image).
#[allow(clippy::too_many_arguments)]
fn embed_texture(
    texture: &scene::TextureRef,
    material_id: u64,
    options: &ParseOptions,
    ids: &mut IdRegistry,
    connections: &mut Connections,
    counts: &mut ObjectCounts,
    objects_children: &mut Vec<FbxNode>,
) {
    let Some(png_bytes) = &texture.png_bytes else {
        tracing::warn!(texture = %texture.name, "texture image unreadable, omitting");
        return;
    };

    match builder::textures::prepare_embedded_png(png_bytes, options.max_texture_size) {
        Ok(bytes) => {
            let filename = builder::textures::embedded_filename(&texture.name, material_id);
            let video_id = ids.alloc();
            let texture_id = ids.alloc();
            objects_children.push(builder::textures::video_node(video_id, &filename, bytes));
            objects_children.push(builder::textures::texture_node(texture_id, &filename));
            counts.video += 1;
            counts.texture += 1;
            connections.oo(video_id, texture_id);
            connections.op(texture_id, material_id, "DiffuseColor");
        }
        Err(err) => {
            tracing::warn!(error = %err, texture = %texture.name, "failed to embed texture, omitting");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn empty_scene_produces_a_valid_file() {
        let root = SceneNode::empty("Root");
        let options = ParseOptions::default();
        let bytes = parse(&root, &options);
        assert_eq!(&bytes[0..21], b"Kaydara FBX Binary  \0");
        assert_eq!(bytes[21], 0x1A);
        assert_eq!(bytes[22], 0x00);
    }

    #[test]
    fn single_mesh_scene_emits_a_model_and_geometry() {
        let mut root = SceneNode::empty("Root");
        let mut cube = SceneNode::empty("Cube");
        cube.translation = Vec3::new(1.0, 0.0, 0.0);
        cube.mesh = Some(MeshData {
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            indices: vec![0, 1, 2],
            ..Default::default()
        });
        root.children.push(cube);

        let bytes = parse(&root, &ParseOptions::default());
        assert!(bytes.len() > 200);
        assert_eq!(&bytes[bytes.len() - 16..], &writer_closing_magic());
    }

    fn writer_closing_magic() -> [u8; 16] {
        [
            0xF8, 0x5A, 0x8C, 0x6A, 0xDE, 0xF5, 0xD9, 0x7E, 0xEC, 0xE9, 0x0C, 0xE3, 0x75, 0x8F, 0x29,
            0x0B,
        ]
    }
}
