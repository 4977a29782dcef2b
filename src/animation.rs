//! Animation subsystem (§4.5): KTime conversion, track resolution, the
//! quaternion→Euler conversion with cross-key continuity correction, and
//! curve-node/curve construction plus their connections.
//!
//! The continuity fold (§9) is written as an explicit loop carrying the
//! previous key's Euler angles, not a stateless per-key map — a library
//! that returns a principal-branch Euler is necessary but not sufficient;
//! unwinding has to see the previous key.

use std::f32::consts::PI;

use glam::{EulerRot, Quat, Vec3};
use hashbrown::HashMap;

use crate::builder::connections::Connections;
use crate::ids::IdRegistry;
use crate::names::{name_with_class, normalize_mixamo_name, FbxClass};
use crate::node::FbxNode;
use crate::options::AnimationClipInput;

const KTIME_TICKS_PER_SECOND: f64 = 46_186_158_000.0;

fn to_ktime(seconds: f32) -> i64 {
    (seconds as f64 * KTIME_TICKS_PER_SECOND).round() as i64
}

enum TrackKind {
    Position,
    Scale,
    Quaternion,
}

fn parse_track_kind(property: &str) -> Option<TrackKind> {
    match property {
        "position" => Some(TrackKind::Position),
        "scale" => Some(TrackKind::Scale),
        "quaternion" => Some(TrackKind::Quaternion),
        _ => None,
    }
}

/// Unwinds a sequence of Euler triples so that, axis by axis, no step
/// between consecutive keys exceeds π — the fix for naive quaternion→Euler
/// conversion jumping across a branch cut.
fn unwind_euler_sequence(raw: &[Vec3]) -> Vec<Vec3> {
    let mut out = Vec::with_capacity(raw.len());
    let mut prev: Option<Vec3> = None;
    for &e in raw {
        let mut cur = e;
        if let Some(p) = prev {
            for axis in 0..3 {
                let diff = cur[axis] - p[axis];
                if diff.abs() > PI {
                    cur[axis] -= diff.signum() * 2.0 * PI;
                }
            }
        }
        out.push(cur);
        prev = Some(cur);
    }
    out
}

struct ConvertedTrack {
    key_attr: &'static str,
    property_name: &'static str,
    axes: [Vec<f32>; 3],
}

fn convert_track(kind: TrackKind, values: &[f32], output_scale: f32) -> ConvertedTrack {
    match kind {
        TrackKind::Position => {
            let (mut xs, mut ys, mut zs) = (Vec::new(), Vec::new(), Vec::new());
            for chunk in values.chunks_exact(3) {
                xs.push(chunk[0] * output_scale);
                ys.push(chunk[1] * output_scale);
                zs.push(chunk[2] * output_scale);
            }
            ConvertedTrack {
                key_attr: "T",
                property_name: "Lcl Translation",
                axes: [xs, ys, zs],
            }
        }
        TrackKind::Scale => {
            let (mut xs, mut ys, mut zs) = (Vec::new(), Vec::new(), Vec::new());
            for chunk in values.chunks_exact(3) {
                xs.push(chunk[0]);
                ys.push(chunk[1]);
                zs.push(chunk[2]);
            }
            ConvertedTrack {
                key_attr: "S",
                property_name: "Lcl Scaling",
                axes: [xs, ys, zs],
            }
        }
        TrackKind::Quaternion => {
            let raw_eulers: Vec<Vec3> = values
                .chunks_exact(4)
                .map(|c| {
                    let q = Quat::from_xyzw(c[0], c[1], c[2], c[3]);
                    let (x, y, z) = q.to_euler(EulerRot::XYZ);
                    Vec3::new(x, y, z)
                })
                .collect();
            let unwound = unwind_euler_sequence(&raw_eulers);
            let (mut xs, mut ys, mut zs) = (Vec::new(), Vec::new(), Vec::new());
            for e in unwound {
                xs.push(e.x.to_degrees());
                ys.push(e.y.to_degrees());
                zs.push(e.z.to_degrees());
            }
            ConvertedTrack {
                key_attr: "R",
                property_name: "Lcl Rotation",
                axes: [xs, ys, zs],
            }
        }
    }
}

fn p_ktime(name: &str, value: i64) -> FbxNode {
    FbxNode::new("P")
        .prop(name)
        .prop("KTime")
        .prop("Time")
        .prop("")
        .prop(value)
}

fn p_number(name: &str, value: f64) -> FbxNode {
    FbxNode::new("P").prop(name).prop("Number").prop("").prop("A").prop(value)
}

fn build_curve_node(id: u64, key_attr: &str, defaults: [f32; 3]) -> FbxNode {
    FbxNode::new("AnimationCurveNode")
        .prop(id as i64)
        .prop(name_with_class(key_attr, FbxClass::AnimCurveNode))
        .prop("")
        .child(
            FbxNode::new("Properties70")
                .child(p_number("d|X", defaults[0] as f64))
                .child(p_number("d|Y", defaults[1] as f64))
                .child(p_number("d|Z", defaults[2] as f64)),
        )
}

fn build_curve(id: u64, key_times: &[i64], values: &[f32]) -> FbxNode {
    let n = values.len();
    FbxNode::new("AnimationCurve")
        .prop(id as i64)
        .prop(name_with_class("", FbxClass::AnimCurve))
        .prop("")
        .child(FbxNode::leaf_i32("KeyVer", 4009))
        .child(FbxNode::new("KeyTime").prop(key_times.to_vec()))
        .child(FbxNode::new("KeyValueFloat").prop(values.to_vec()))
        .child(FbxNode::new("KeyAttrFlags").prop(vec![256i32; n]))
        .child(FbxNode::new("KeyAttrDataFloat").prop(vec![0.0f32; 4 * n]))
        .child(FbxNode::new("KeyAttrRefCount").prop(vec![1i32; n]))
}

pub struct AnimationBuildResult {
    pub nodes: Vec<FbxNode>,
}

/// Builds one clip's `AnimationStack`/`AnimationLayer`/curve-nodes/curves
/// and wires their connections. `bone_lookup` maps a Mixamo-normalized bone
/// name to that bone's `Model` id, across the whole scene.
pub fn build_clip(
    ids: &mut IdRegistry,
    connections: &mut Connections,
    clip: &AnimationClipInput,
    bone_lookup: &HashMap<String, u64>,
    output_scale: f32,
) -> AnimationBuildResult {
    let stack_id = ids.alloc();
    let layer_id = ids.alloc();
    let duration_ktime = to_ktime(clip.duration);

    let mut nodes = vec![
        FbxNode::new("AnimationStack")
            .prop(stack_id as i64)
            .prop(name_with_class(&clip.name, FbxClass::AnimStack))
            .prop("")
            .child(
                FbxNode::new("Properties70")
                    .child(p_ktime("LocalStop", duration_ktime))
                    .child(p_ktime("ReferenceStop", duration_ktime)),
            ),
        FbxNode::new("AnimationLayer")
            .prop(layer_id as i64)
            .prop(name_with_class("BaseLayer", FbxClass::AnimLayer))
            .prop(""),
    ];
    connections.oo(layer_id, stack_id);

    for track in &clip.tracks {
        let Some((bone_part, property)) = track.name.rsplit_once('.') else {
            continue;
        };
        let Some(kind) = parse_track_kind(property) else {
            continue;
        };
        let normalized = normalize_mixamo_name(bone_part);
        let Some(&bone_id) = bone_lookup.get(&normalized) else {
            continue;
        };

        let converted = convert_track(kind, &track.values, output_scale);
        let key_times: Vec<i64> = track.times.iter().map(|&t| to_ktime(t)).collect();
        let defaults = [
            converted.axes[0].first().copied().unwrap_or(0.0),
            converted.axes[1].first().copied().unwrap_or(0.0),
            converted.axes[2].first().copied().unwrap_or(0.0),
        ];

        let curve_node_id = ids.alloc();
        nodes.push(build_curve_node(curve_node_id, converted.key_attr, defaults));
        connections.oo(curve_node_id, layer_id);
        connections.op(curve_node_id, bone_id, converted.property_name);

        for (axis_label, values) in ["X", "Y", "Z"].iter().zip(converted.axes.iter()) {
            let curve_id = ids.alloc();
            nodes.push(build_curve(curve_id, &key_times, values));
            connections.op(curve_id, curve_node_id, &format!("d|{axis_label}"));
        }
    }

    AnimationBuildResult { nodes }
}
