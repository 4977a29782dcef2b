//! Skin/Cluster/BindPose construction (§4.4).
//!
//! `Transform`/`TransformLink` are the interoperability-critical pair: any
//! importer that respects them reconstructs the bind pose regardless of
//! this encoder's own conventions, which is why they get their own
//! translation-scaling step independent of the rest of the matrix.

use glam::Mat4;

use crate::builder::connections::Connections;
use crate::ids::IdRegistry;
use crate::names::{name_with_class, FbxClass};
use crate::node::FbxNode;
use crate::scene::{MeshData, Skeleton};

fn mat4_to_scaled_cols(m: Mat4, translation_scale: f32) -> Vec<f64> {
    let mut cols = m.to_cols_array();
    cols[12] *= translation_scale;
    cols[13] *= translation_scale;
    cols[14] *= translation_scale;
    cols.iter().map(|&v| v as f64).collect()
}

fn skin_node(id: u64, geometry_name: &str) -> FbxNode {
    FbxNode::new("Deformer")
        .prop(id as i64)
        .prop(name_with_class(geometry_name, FbxClass::Deformer))
        .prop("Skin")
        .child(FbxNode::leaf_i32("Version", 101))
        .child(FbxNode::new("Link_DeformAcuracy").prop(50.0f64))
}

#[allow(clippy::too_many_arguments)]
fn cluster_node(
    id: u64,
    bone_name: &str,
    indexes: Vec<i32>,
    weights: Vec<f64>,
    transform: Vec<f64>,
    transform_link: Vec<f64>,
) -> FbxNode {
    FbxNode::new("Deformer")
        .prop(id as i64)
        .prop(name_with_class(bone_name, FbxClass::Deformer))
        .prop("Cluster")
        .child(FbxNode::leaf_i32("Version", 100))
        .child(FbxNode::new("Indexes").prop(indexes))
        .child(FbxNode::new("Weights").prop(weights))
        .child(FbxNode::new("Transform").prop(transform))
        .child(FbxNode::new("TransformLink").prop(transform_link))
        .child(FbxNode::leaf_str("LinkMode", "Normalize"))
}

/// One `PoseNode` entry: the id of the model this bind matrix belongs to.
pub type PoseEntry = (u64, Mat4);

pub fn bind_pose_node(id: u64, entries: &[PoseEntry], output_scale: f32) -> FbxNode {
    let mut node = FbxNode::new("Pose")
        .prop(id as i64)
        .prop(name_with_class("BindPose", FbxClass::Pose))
        .prop("BindPose")
        .child(FbxNode::leaf_str("Type", "BindPose"))
        .child(FbxNode::leaf_i32("Version", 100))
        .child(FbxNode::leaf_i64("NbPoseNodes", entries.len() as i64));
    for (node_id, matrix) in entries {
        node = node.child(
            FbxNode::new("PoseNode")
                .child(FbxNode::leaf_i64("Node", *node_id as i64))
                .child(FbxNode::new("Matrix").prop(mat4_to_scaled_cols(*matrix, output_scale))),
        );
    }
    node
}

pub struct SkinBuildResult {
    pub nodes: Vec<FbxNode>,
    /// One entry per bone, for the caller to fold into the mesh's `BindPose`.
    pub pose_entries: Vec<PoseEntry>,
}

/// Builds the `Skin` deformer and one `Cluster` per bone for a single
/// skinned mesh. Returns `None` when the mesh carries no skin binding (§7:
/// skip skin emission, mesh still exported).
#[allow(clippy::too_many_arguments)]
pub fn build_skin(
    ids: &mut IdRegistry,
    connections: &mut Connections,
    geometry_id: u64,
    geometry_name: &str,
    mesh_bind: Mat4,
    mesh: &MeshData,
    skeleton: &Skeleton,
    bone_ids: &[u64],
    bone_names: &[String],
    bone_world: &[Mat4],
    output_scale: f32,
) -> Option<SkinBuildResult> {
    let skin_binding = mesh.skin.as_ref()?;
    let skin_id = ids.alloc();
    let mut nodes = vec![skin_node(skin_id, geometry_name)];
    connections.oo(skin_id, geometry_id);

    let mut pose_entries = Vec::with_capacity(bone_ids.len());

    for (bone_idx, (&bone_id, bone_name)) in bone_ids.iter().zip(bone_names.iter()).enumerate() {
        let mut indexes = Vec::new();
        let mut weights = Vec::new();
        for (v_idx, (joints, w)) in skin_binding
            .joint_indices
            .iter()
            .zip(skin_binding.joint_weights.iter())
            .enumerate()
        {
            for slot in 0..4 {
                if joints[slot] as usize == bone_idx && w[slot] > 0.0 {
                    indexes.push(v_idx as i32);
                    weights.push(w[slot] as f64);
                }
            }
        }

        let bone_bind = bone_world[bone_idx];
        let transform_link = match skeleton.bone_inverses.get(bone_idx).copied().flatten() {
            Some(inverse) => mesh_bind * inverse.inverse(),
            None => bone_bind,
        };

        let cluster_id = ids.alloc();
        nodes.push(cluster_node(
            cluster_id,
            bone_name,
            indexes,
            weights,
            mat4_to_scaled_cols(mesh_bind, output_scale),
            mat4_to_scaled_cols(transform_link, output_scale),
        ));
        connections.oo(cluster_id, skin_id);
        connections.oo(bone_id, cluster_id);

        pose_entries.push((bone_id, bone_bind));
    }

    Some(SkinBuildResult { nodes, pose_entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SkinBinding;

    fn mesh_with_single_vertex_bound_to_bone_zero() -> MeshData {
        MeshData {
            positions: vec![glam::Vec3::ZERO],
            indices: vec![],
            normals: None,
            uvs: None,
            materials: vec![],
            skin: Some(SkinBinding {
                joint_indices: vec![[0, 0, 0, 0]],
                joint_weights: vec![[1.0, 0.0, 0.0, 0.0]],
            }),
        }
    }

    #[test]
    fn cluster_picks_up_the_bound_vertex() {
        let mesh = mesh_with_single_vertex_bound_to_bone_zero();
        let skeleton = Skeleton {
            bones: vec![0],
            bone_inverses: vec![None],
        };
        let mut ids = IdRegistry::new();
        let mut connections = Connections::new();
        let result = build_skin(
            &mut ids,
            &mut connections,
            1,
            "Cube",
            Mat4::IDENTITY,
            &mesh,
            &skeleton,
            &[2],
            &["Bone".to_string()],
            &[Mat4::IDENTITY],
            100.0,
        )
        .unwrap();

        // nodes[0] is the Skin deformer, nodes[1] is the one Cluster.
        assert_eq!(result.nodes.len(), 2);
        let cluster = &result.nodes[1];
        let indexes = cluster
            .children
            .iter()
            .find(|c| c.name == "Indexes")
            .unwrap();
        match &indexes.properties[0] {
            crate::node::PropertyValue::Int32Array(arr) => assert_eq!(arr, &vec![0]),
            _ => panic!("expected Int32Array"),
        }
    }

    #[test]
    fn missing_bind_inverse_falls_back_to_bone_world() {
        let mesh = mesh_with_single_vertex_bound_to_bone_zero();
        let skeleton = Skeleton {
            bones: vec![0],
            bone_inverses: vec![None],
        };
        let bone_world = Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        let mut ids = IdRegistry::new();
        let mut connections = Connections::new();
        let result = build_skin(
            &mut ids,
            &mut connections,
            1,
            "Cube",
            Mat4::IDENTITY,
            &mesh,
            &skeleton,
            &[2],
            &["Bone".to_string()],
            &[bone_world],
            1.0,
        )
        .unwrap();
        assert_eq!(result.pose_entries[0].1, bone_world);
    }
}
