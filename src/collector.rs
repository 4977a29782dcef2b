//! Scene traversal and object partitioning (§4.2).
//!
//! Traversal happens once, up front, into a flat list whose order everything
//! downstream treats as canonical: `Skeleton::bones` indexes into it, parent
//! links are resolved through it, and objects are classified against it.
//! Bones are excluded from ordinary classification and appended afterward as
//! a de-duplicated union, per the spec's "after collection" step.

use hashbrown::{HashMap, HashSet};

use crate::ids::IdRegistry;
use crate::names::is_discarded_mesh_name;
use crate::options::ParseOptions;
use crate::scene::SceneNode;

/// One scene node plus its parent's flat index (`None` for the root).
pub struct FlatNode<'a> {
    pub node: &'a SceneNode,
    pub parent: Option<usize>,
}

/// Flattens the scene depth-first, preorder. Every `Skeleton::bones` entry
/// and every parent link in the rest of this crate refers to an index into
/// the returned slice.
pub fn flatten(root: &SceneNode) -> Vec<FlatNode<'_>> {
    let mut out = Vec::new();
    flatten_rec(root, None, &mut out);
    out
}

fn flatten_rec<'a>(node: &'a SceneNode, parent: Option<usize>, out: &mut Vec<FlatNode<'a>>) {
    let index = out.len();
    out.push(FlatNode { node, parent });
    for child in &node.children {
        flatten_rec(child, Some(index), out);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Null,
    Mesh,
    LimbNode,
}

impl ObjectKind {
    pub fn as_fbx_str(self) -> &'static str {
        match self {
            ObjectKind::Null => "Null",
            ObjectKind::Mesh => "Mesh",
            ObjectKind::LimbNode => "LimbNode",
        }
    }
}

pub struct CollectedObject {
    pub flat_index: usize,
    pub id: u64,
    pub kind: ObjectKind,
}

/// A mesh the collector deemed eligible for skin export, with its bones
/// resolved to flat indices (parallel to `Skeleton::bones`).
pub struct SkinnedMesh {
    pub flat_index: usize,
    pub bone_flat_indices: Vec<usize>,
}

/// The synthetic `Armature` model, standing in for the non-bone parent of
/// the first skinned mesh's root bones (§4.3; see DESIGN.md for the
/// disjoint-skeleton limitation this inherits).
pub struct Armature {
    pub flat_index: usize,
    pub id: u64,
}

pub struct CollectResult {
    pub objects: Vec<CollectedObject>,
    pub skinned_meshes: Vec<SkinnedMesh>,
    pub armature: Option<Armature>,
    /// Every collected object's and bone's id, keyed by flat index, so the
    /// connection stage can resolve parents without re-walking the tree.
    pub id_by_flat_index: HashMap<usize, u64>,
    pub parent: Vec<Option<usize>>,
}

impl CollectResult {
    pub fn id_of(&self, flat_index: usize) -> Option<u64> {
        self.id_by_flat_index.get(&flat_index).copied()
    }

    /// Walks up the parent chain from `flat_index` until it finds a flat
    /// index that was actually collected (skipped ancestors are stepped
    /// over), returning its id, or `None` meaning "connect to the scene
    /// root" (id 0).
    pub fn collected_ancestor_id(&self, flat_index: usize) -> Option<u64> {
        let mut current = self.parent[flat_index];
        while let Some(index) = current {
            if let Some(id) = self.id_of(index) {
                return Some(id);
            }
            current = self.parent[index];
        }
        None
    }
}

pub fn collect(
    flat: &[FlatNode<'_>],
    options: &ParseOptions,
    ids: &mut IdRegistry,
) -> CollectResult {
    let parent: Vec<Option<usize>> = flat.iter().map(|n| n.parent).collect();

    let mut skinned_meshes = Vec::new();
    let mut bone_set: HashSet<usize> = HashSet::new();
    if options.export_skin {
        for (index, flat_node) in flat.iter().enumerate() {
            let node = flat_node.node;
            let (Some(mesh), Some(skeleton)) = (&node.mesh, &node.skeleton) else {
                continue;
            };
            if mesh.positions.is_empty() || mesh.skin.is_none() {
                continue;
            }
            bone_set.extend(skeleton.bones.iter().copied());
            skinned_meshes.push(SkinnedMesh {
                flat_index: index,
                bone_flat_indices: skeleton.bones.clone(),
            });
        }
    }

    // First skinned mesh's first root bone (one whose own parent isn't a
    // bone) determines the armature, per the documented limitation.
    let armature_flat_index = skinned_meshes.first().and_then(|first| {
        first
            .bone_flat_indices
            .iter()
            .find_map(|&bone_index| match parent[bone_index] {
                Some(p) if !bone_set.contains(&p) => Some(p),
                _ => None,
            })
    });

    let mut objects = Vec::new();
    let mut id_by_flat_index = HashMap::new();

    let armature = armature_flat_index.map(|flat_index| {
        let id = ids.alloc();
        id_by_flat_index.insert(flat_index, id);
        Armature { flat_index, id }
    });

    for (index, flat_node) in flat.iter().enumerate() {
        if bone_set.contains(&index) || Some(index) == armature_flat_index {
            continue;
        }
        let node = flat_node.node;
        if !node.visible && options.only_visible {
            continue;
        }
        if node.user_data.export == Some(false) {
            continue;
        }
        if node.user_data.is_skeleton_helper {
            continue;
        }

        let kind = match &node.mesh {
            Some(mesh)
                if options.export_skin
                    && !mesh.positions.is_empty()
                    && mesh.skin.is_some()
                    && node.skeleton.is_some() =>
            {
                ObjectKind::Mesh
            }
            Some(_) if is_discarded_mesh_name(&node.name) => continue,
            Some(_) => ObjectKind::Mesh,
            None => ObjectKind::Null,
        };

        let id = ids.alloc();
        id_by_flat_index.insert(index, id);
        objects.push(CollectedObject {
            flat_index: index,
            id,
            kind,
        });
    }

    let mut bone_indices: Vec<usize> = bone_set.into_iter().collect();
    bone_indices.sort_unstable();
    for index in bone_indices {
        let id = ids.alloc();
        id_by_flat_index.insert(index, id);
        objects.push(CollectedObject {
            flat_index: index,
            id,
            kind: ObjectKind::LimbNode,
        });
    }

    CollectResult {
        objects,
        skinned_meshes,
        armature,
        id_by_flat_index,
        parent,
    }
}
