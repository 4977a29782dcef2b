//! Lambert material nodes (§4.3).

use glam::Vec3;

use crate::names::{name_with_class, FbxClass};
use crate::node::FbxNode;
use crate::scene::MaterialRef;

const DEFAULT_DIFFUSE: Vec3 = Vec3::new(0.5, 0.5, 0.5);

fn p_color(name: &str, v: Vec3) -> FbxNode {
    FbxNode::new("P")
        .prop(name)
        .prop("Color")
        .prop("")
        .prop("A")
        .prop(v.x as f64)
        .prop(v.y as f64)
        .prop(v.z as f64)
}

fn p_double(name: &str, value: f64) -> FbxNode {
    FbxNode::new("P").prop(name).prop("Number").prop("").prop("A").prop(value)
}

pub fn material_node(id: u64, material: &MaterialRef) -> FbxNode {
    let diffuse = material.diffuse.unwrap_or(DEFAULT_DIFFUSE);
    let transparency = 1.0 - material.opacity;

    FbxNode::new("Material")
        .prop(id as i64)
        .prop(name_with_class(&material.name, FbxClass::Material))
        .prop("")
        .child(FbxNode::leaf_i32("Version", 102))
        .child(FbxNode::leaf_str("ShadingModel", "Lambert"))
        .child(FbxNode::leaf_i32("MultiLayer", 0))
        .child(
            FbxNode::new("Properties70")
                .child(p_color("DiffuseColor", diffuse))
                .child(p_double("TransparencyFactor", transparency as f64)),
        )
}
