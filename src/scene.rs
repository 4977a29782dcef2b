//! The input scene-graph contract.
//!
//! The encoder does not know how a scene was built or loaded — it only reads
//! an already-constructed hierarchy of these plain, owned types. Callers
//! project their own scene representation into this shape once, at the call
//! site; there is no trait to implement and no generic graph type to thread
//! through the rest of the crate.

use glam::{Mat4, Quat, Vec2, Vec3};

/// Rotation order for a node's local Euler rotation, matching FBX's
/// `RotationOrder` enum values 0..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationOrder {
    Xyz = 0,
    Xzy = 1,
    Yxz = 2,
    Yzx = 3,
    Zxy = 4,
    Zyx = 5,
}

impl Default for RotationOrder {
    fn default() -> Self {
        RotationOrder::Xyz
    }
}

/// Per-vertex skin binding: up to 4 bone influences per vertex.
#[derive(Debug, Clone)]
pub struct SkinBinding {
    /// 4 bone indices per vertex, flattened: `indices[4*v + slot]`.
    pub joint_indices: Vec<[u32; 4]>,
    /// 4 weights per vertex, parallel to `joint_indices`.
    pub joint_weights: Vec<[f32; 4]>,
}

/// An ordered bone list plus parallel bind-inverse matrices.
#[derive(Debug, Clone)]
pub struct Skeleton {
    /// Indices into the scene's flattened node list, in skeleton order.
    pub bones: Vec<usize>,
    /// Bind-pose inverse matrix per bone, parallel to `bones`. `None` means
    /// no bind inverse was supplied for that bone (see §7's fallback policy).
    pub bone_inverses: Vec<Option<Mat4>>,
}

/// Mesh geometry and optional skinning data attached to a [`SceneNode`].
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    /// Flat triangle index buffer (3 indices per triangle). Triangulation
    /// is assumed; no other polygon size is supported.
    pub indices: Vec<u32>,
    pub normals: Option<Vec<Vec3>>,
    pub uvs: Option<Vec<Vec2>>,
    /// Material names referenced by this mesh, in slot order. Every polygon
    /// is assigned slot 0 regardless of this list's length (§4.3).
    pub materials: Vec<MaterialRef>,
    pub skin: Option<SkinBinding>,
}

/// A material as attached to a mesh.
#[derive(Debug, Clone)]
pub struct MaterialRef {
    pub name: String,
    /// Diffuse color; defaults to mid-gray when absent.
    pub diffuse: Option<Vec3>,
    /// 0.0 = fully transparent, 1.0 = fully opaque.
    pub opacity: f32,
    /// Optional diffuse texture, embedded as `Video` + `Texture` when
    /// `embed_images` is enabled.
    pub texture: Option<TextureRef>,
}

impl Default for MaterialRef {
    fn default() -> Self {
        MaterialRef {
            name: "Material".to_string(),
            diffuse: None,
            opacity: 1.0,
            texture: None,
        }
    }
}

/// A texture reference: a filename plus already-encoded PNG bytes.
#[derive(Debug, Clone)]
pub struct TextureRef {
    pub name: String,
    /// Already-encoded PNG bytes. Decoding failure at embed time (simulating
    /// an unreadable/CORS-tainted source image) is represented by `None`.
    pub png_bytes: Option<Vec<u8>>,
}

/// Arbitrary per-node flags a caller's scene graph may carry. Only the
/// `export` flag is read by the encoder (§4.2).
#[derive(Debug, Clone, Default)]
pub struct UserData {
    /// `Some(false)` opts a node out of export entirely.
    pub export: Option<bool>,
    /// Marks a node as a skeleton-helper visualization (bone gizmos etc.),
    /// which the collector always skips regardless of `onlyVisible`.
    pub is_skeleton_helper: bool,
}

/// A node in the input scene graph: a transform plus optional mesh data.
///
/// The tree is expressed with owned `Vec<SceneNode>` children rather than
/// indices or `Rc`/`Weak` back-references — the encoder only ever reads
/// downward from the root it is given (§9's "cyclic owner/weak references"
/// note: parent pointers, where needed, are reconstructed during traversal,
/// not stored on the node).
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub name: String,
    pub translation: Vec3,
    pub rotation_euler: Vec3,
    pub rotation_order: RotationOrder,
    pub scale: Vec3,
    /// World matrix at the time the scene was captured (bind time, for a
    /// skinned mesh or bone).
    pub world_matrix: Mat4,
    pub visible: bool,
    pub user_data: UserData,
    pub mesh: Option<MeshData>,
    /// Present only on mesh nodes that are skinned.
    pub skeleton: Option<Skeleton>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// A bare empty/group node at the origin.
    pub fn empty(name: impl Into<String>) -> Self {
        SceneNode {
            name: name.into(),
            translation: Vec3::ZERO,
            rotation_euler: Vec3::ZERO,
            rotation_order: RotationOrder::Xyz,
            scale: Vec3::ONE,
            world_matrix: Mat4::IDENTITY,
            visible: true,
            user_data: UserData::default(),
            mesh: None,
            skeleton: None,
            children: Vec::new(),
        }
    }

    /// Local rotation as a quaternion, honoring `rotation_order`.
    pub fn local_rotation_quat(&self) -> Quat {
        euler_order_to_quat(self.rotation_euler, self.rotation_order)
    }
}

pub(crate) fn euler_order_to_quat(euler: Vec3, order: RotationOrder) -> Quat {
    let glam_order = match order {
        RotationOrder::Xyz => glam::EulerRot::XYZ,
        RotationOrder::Xzy => glam::EulerRot::XZY,
        RotationOrder::Yxz => glam::EulerRot::YXZ,
        RotationOrder::Yzx => glam::EulerRot::YZX,
        RotationOrder::Zxy => glam::EulerRot::ZXY,
        RotationOrder::Zyx => glam::EulerRot::ZYX,
    };
    Quat::from_euler(glam_order, euler.x, euler.y, euler.z)
}
