//! Model nodes (§4.3): local T/R/S, rotation order, bone-specific
//! properties, and each object's paired `NodeAttribute`.

use glam::Vec3;

use crate::names::{name_with_class, FbxClass};
use crate::node::FbxNode;
use crate::scene::RotationOrder;

fn rotation_order_int(order: RotationOrder) -> i32 {
    order as i32
}

fn p_vec3(name: &str, prop_type: &str, flags: &str, v: Vec3) -> FbxNode {
    FbxNode::new("P")
        .prop(name)
        .prop(prop_type)
        .prop("")
        .prop(flags)
        .prop(v.x as f64)
        .prop(v.y as f64)
        .prop(v.z as f64)
}

fn p_bool(name: &str, value: bool) -> FbxNode {
    FbxNode::new("P").prop(name).prop("bool").prop("").prop("").prop(value)
}

fn p_enum(name: &str, value: i32) -> FbxNode {
    FbxNode::new("P").prop(name).prop("enum").prop("").prop("").prop(value)
}

/// Builds a `Model` node for any object kind (Null/Mesh/LimbNode). `is_bone`
/// adds `RotationActive`/`SegmentScaleCompensate` (§4.3). Rotation values are
/// converted degrees-from-radians; `rotation_order` is carried as a separate
/// enum property rather than folded into the angles themselves.
#[allow(clippy::too_many_arguments)]
pub fn model_node(
    id: u64,
    raw_name: &str,
    fbx_kind: &str,
    translation: Vec3,
    rotation_euler: Vec3,
    rotation_order: RotationOrder,
    scale: Vec3,
    output_scale: f32,
    is_bone: bool,
) -> FbxNode {
    let scaled_translation = translation * output_scale;
    let rotation_degrees = Vec3::new(
        rotation_euler.x.to_degrees(),
        rotation_euler.y.to_degrees(),
        rotation_euler.z.to_degrees(),
    );

    let mut properties70 = FbxNode::new("Properties70")
        .child(p_enum("InheritType", 1))
        .child(p_vec3(
            "Lcl Translation",
            "Lcl Translation",
            "A",
            scaled_translation,
        ))
        .child(p_vec3("Lcl Rotation", "Lcl Rotation", "A", rotation_degrees))
        .child(p_vec3("Lcl Scaling", "Lcl Scaling", "A", scale))
        .child(p_enum("RotationOrder", rotation_order_int(rotation_order)));

    if is_bone {
        properties70 = properties70
            .child(p_bool("RotationActive", true))
            .child(p_bool("SegmentScaleCompensate", true));
    }

    FbxNode::new("Model")
        .prop(id as i64)
        .prop(name_with_class(raw_name, FbxClass::Model))
        .prop(fbx_kind)
        .child(FbxNode::leaf_i32("Version", 232))
        .child(properties70)
}

/// The `NodeAttribute` sibling bones and the synthetic armature receive.
pub fn node_attribute(id: u64, raw_name: &str, fbx_kind: &str, type_flags: &str) -> FbxNode {
    FbxNode::new("NodeAttribute")
        .prop(id as i64)
        .prop(name_with_class(raw_name, FbxClass::NodeAttribute))
        .prop(fbx_kind)
        .child(FbxNode::leaf_str("TypeFlags", type_flags))
}
