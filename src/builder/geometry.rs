//! Geometry node construction (§4.3): scaled positions, polygon-vertex
//! index encoding, per-polygon-vertex normal/UV layers, the always-zero
//! material layer (§9 open question), and the optional vertex-group bone
//! list.

use glam::{Vec2, Vec3};

use crate::names::{name_with_class, FbxClass};
use crate::node::FbxNode;
use crate::scene::MeshData;

/// Encodes a flat triangle index buffer into FBX's `PolygonVertexIndex`
/// form: the last index of each triangle is stored as `-(i+1)` (§3).
fn polygon_vertex_indices(indices: &[u32]) -> Vec<i32> {
    let mut out = Vec::with_capacity(indices.len());
    for triangle in indices.chunks_exact(3) {
        out.push(triangle[0] as i32);
        out.push(triangle[1] as i32);
        out.push(-(triangle[2] as i32) - 1);
    }
    out
}

fn layer_element_normal(indices: &[u32], normals: &[Vec3]) -> FbxNode {
    let mut flat = Vec::with_capacity(indices.len() * 3);
    for &i in indices {
        let n = normals[i as usize];
        flat.push(n.x as f64);
        flat.push(n.y as f64);
        flat.push(n.z as f64);
    }
    FbxNode::new("LayerElementNormal")
        .prop(0i32)
        .child(FbxNode::leaf_i32("Version", 101))
        .child(FbxNode::leaf_str("Name", ""))
        .child(FbxNode::leaf_str("MappingInformationType", "ByPolygonVertex"))
        .child(FbxNode::leaf_str("ReferenceInformationType", "Direct"))
        .child(FbxNode::new("Normals").prop(flat))
}

fn layer_element_uv(indices: &[u32], uvs: &[Vec2]) -> FbxNode {
    let mut flat = Vec::with_capacity(indices.len() * 2);
    for &i in indices {
        let uv = uvs[i as usize];
        flat.push(uv.x as f64);
        flat.push(uv.y as f64);
    }
    FbxNode::new("LayerElementUV")
        .prop(0i32)
        .child(FbxNode::leaf_i32("Version", 101))
        .child(FbxNode::leaf_str("Name", ""))
        .child(FbxNode::leaf_str("MappingInformationType", "ByPolygonVertex"))
        .child(FbxNode::leaf_str("ReferenceInformationType", "Direct"))
        .child(FbxNode::new("UV").prop(flat))
}

/// Always zero (§9 open question: multi-material meshes all point at slot
/// 0 — matches the one-material-per-mesh convention this encoder follows).
fn layer_element_material(polygon_count: usize) -> FbxNode {
    FbxNode::new("LayerElementMaterial")
        .prop(0i32)
        .child(FbxNode::leaf_i32("Version", 101))
        .child(FbxNode::leaf_str("Name", ""))
        .child(FbxNode::leaf_str("MappingInformationType", "ByPolygon"))
        .child(FbxNode::leaf_str("ReferenceInformationType", "IndexToDirect"))
        .child(FbxNode::new("Materials").prop(vec![0i32; polygon_count]))
}

fn layer_node() -> FbxNode {
    FbxNode::new("Layer")
        .prop(0i32)
        .child(FbxNode::leaf_i32("Version", 100))
        .child(
            FbxNode::new("LayerElement")
                .child(FbxNode::leaf_str("Type", "LayerElementNormal"))
                .child(FbxNode::leaf_i64("TypedIndex", 0)),
        )
        .child(
            FbxNode::new("LayerElement")
                .child(FbxNode::leaf_str("Type", "LayerElementUV"))
                .child(FbxNode::leaf_i64("TypedIndex", 0)),
        )
        .child(
            FbxNode::new("LayerElement")
                .child(FbxNode::leaf_str("Type", "LayerElementMaterial"))
                .child(FbxNode::leaf_i64("TypedIndex", 0)),
        )
}

/// `bone_names`, when present, are already normalized and in bone-index
/// order (§4.7); the caller resolves them from the skeleton before calling.
pub fn geometry_node(
    id: u64,
    raw_name: &str,
    mesh: &MeshData,
    output_scale: f32,
    bone_names: Option<&[String]>,
) -> FbxNode {
    let mut positions = Vec::with_capacity(mesh.positions.len() * 3);
    for p in &mesh.positions {
        let scaled = *p * output_scale;
        positions.push(scaled.x as f64);
        positions.push(scaled.y as f64);
        positions.push(scaled.z as f64);
    }

    let mut node = FbxNode::new("Geometry")
        .prop(id as i64)
        .prop(name_with_class(raw_name, FbxClass::Geometry))
        .prop("Mesh")
        .child(FbxNode::new("Vertices").prop(positions))
        .child(FbxNode::new("PolygonVertexIndex").prop(polygon_vertex_indices(&mesh.indices)))
        .child(FbxNode::leaf_i32("GeometryVersion", 124));

    if let Some(normals) = &mesh.normals {
        node = node.child(layer_element_normal(&mesh.indices, normals));
    }
    if let Some(uvs) = &mesh.uvs {
        node = node.child(layer_element_uv(&mesh.indices, uvs));
    }
    node = node.child(layer_element_material(mesh.indices.len() / 3));
    node = node.child(layer_node());

    if let Some(names) = bone_names {
        node = node.child(
            FbxNode::new("VertexGroups")
                .children(names.iter().map(|n| FbxNode::leaf_str("Name", n))),
        );
    }

    node
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_triangle_index_is_negated() {
        let encoded = polygon_vertex_indices(&[0, 1, 2, 2, 3, 0]);
        assert_eq!(encoded, vec![0, 1, -3, 2, 3, -1]);
        for chunk in encoded.chunks_exact(3) {
            assert!(chunk[2] < 0);
            assert!(chunk[0] >= 0 && chunk[1] >= 0);
            let original = -chunk[2] - 1;
            assert!(original >= 0);
        }
    }

    #[test]
    fn material_layer_is_all_zero() {
        let node = layer_element_material(4);
        let materials = node
            .children
            .iter()
            .find(|c| c.name == "Materials")
            .unwrap();
        match &materials.properties[0] {
            crate::node::PropertyValue::Int32Array(arr) => {
                assert_eq!(arr.len(), 4);
                assert!(arr.iter().all(|&v| v == 0));
            }
            _ => panic!("expected Int32Array"),
        }
    }
}
