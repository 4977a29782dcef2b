//! The fixed top-level scaffolding nodes: `FileId`/`CreationTime`/`Creator`,
//! `FBXHeaderExtension`, `GlobalSettings`, `Documents`, `References`, and
//! `Definitions` (§4.1 item 3, grounded on the header/documents/definitions
//! helpers in the reference FBX writer this module generalizes).
//!
//! Output must be deterministic for identical inputs (§5), so the file id
//! and creation timestamp are fixed constants rather than sourced from a
//! clock or RNG.

use crate::ids::IdRegistry;
use crate::node::{FbxNode, PropertyValue};

const FIXED_FILE_ID: [u8; 16] = [
    0x28, 0xB3, 0x2A, 0xEB, 0xB6, 0x24, 0xCC, 0xC2, 0xBF, 0xC8, 0xB0, 0x2A, 0xA9, 0x2B, 0xFC, 0xF1,
];

pub fn file_id() -> FbxNode {
    FbxNode::new("FileId").prop(PropertyValue::Raw(FIXED_FILE_ID.to_vec()))
}

pub fn creation_time() -> FbxNode {
    FbxNode::leaf_str("CreationTime", "1970-01-01 00:00:00:000")
}

pub fn creator() -> FbxNode {
    FbxNode::leaf_str("Creator", "fbx-export")
}

fn p_int32(name: &str, value: i32) -> FbxNode {
    FbxNode::new("P")
        .prop(name)
        .prop("int")
        .prop("Integer")
        .prop("")
        .prop(value)
}

fn p_double(name: &str, value: f64) -> FbxNode {
    FbxNode::new("P")
        .prop(name)
        .prop("double")
        .prop("Number")
        .prop("")
        .prop(value)
}

pub fn header_extension() -> FbxNode {
    FbxNode::new("FBXHeaderExtension")
        .child(FbxNode::leaf_i32("FBXHeaderVersion", 1003))
        .child(FbxNode::leaf_i32("FBXVersion", 7500))
        .child(creator())
        .child(
            FbxNode::new("CreationTimeStamp")
                .child(FbxNode::leaf_i32("Version", 1000))
                .child(FbxNode::leaf_i32("Year", 1970))
                .child(FbxNode::leaf_i32("Month", 1))
                .child(FbxNode::leaf_i32("Day", 1))
                .child(FbxNode::leaf_i32("Hour", 0))
                .child(FbxNode::leaf_i32("Minute", 0))
                .child(FbxNode::leaf_i32("Second", 0))
                .child(FbxNode::leaf_i32("Millisecond", 0)),
        )
}

/// Axis conventions are fixed Y-up/Z-forward; scale is already baked into
/// exported positions and matrices (§6's `scale` option), so
/// `UnitScaleFactor` stays 1.0 regardless of it.
pub fn global_settings() -> FbxNode {
    FbxNode::new("GlobalSettings")
        .child(FbxNode::leaf_i32("Version", 1000))
        .child(
            FbxNode::new("Properties70")
                .child(p_int32("UpAxis", 1))
                .child(p_int32("UpAxisSign", 1))
                .child(p_int32("FrontAxis", 2))
                .child(p_int32("FrontAxisSign", 1))
                .child(p_int32("CoordAxis", 0))
                .child(p_int32("CoordAxisSign", 1))
                .child(p_double("UnitScaleFactor", 1.0))
                .child(p_int32("TimeMode", 0))
                .child(p_double("CustomFrameRate", -1.0)),
        )
}

pub fn documents(ids: &mut IdRegistry) -> FbxNode {
    let doc_id = ids.alloc() as i64;
    FbxNode::new("Documents")
        .child(FbxNode::leaf_i32("Count", 1))
        .child(
            FbxNode::new("Document")
                .prop(doc_id)
                .prop("Scene")
                .prop("Scene")
                .child(FbxNode::new("Properties70"))
                .child(FbxNode::leaf_i64("RootNode", 0)),
        )
}

pub fn references() -> FbxNode {
    FbxNode::new("References")
}

/// One `(object_type, count)` entry per kind of object the `Objects` node
/// will contain, used to populate `Definitions`. Callers compute `counts`
/// from the active options, so this function itself does not need them.
pub fn definitions(counts: &[(&str, i64)]) -> FbxNode {
    let total: i64 = counts.iter().map(|(_, n)| *n).sum();
    let mut node = FbxNode::new("Definitions")
        .child(FbxNode::leaf_i32("Version", 100))
        .child(FbxNode::leaf_i32("Count", total as i32));
    for (object_type, count) in counts {
        node = node.child(
            FbxNode::new("ObjectType")
                .prop(*object_type)
                .child(FbxNode::leaf_i32("Count", *count as i32)),
        );
    }
    node
}
