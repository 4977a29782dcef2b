//! Connection accumulation (§3 "Connection exhaustiveness", §4.5 item 4).
//!
//! `oo`/`op` always take `(child, parent)` order: the source is the entity
//! that logically belongs to the destination (bone→cluster, geometry→model,
//! texture→material), matching how the format's own connections read.

use crate::node::FbxNode;

#[derive(Default)]
pub struct Connections {
    entries: Vec<FbxNode>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn oo(&mut self, child: u64, parent: u64) {
        self.entries.push(
            FbxNode::new("C")
                .prop("OO")
                .prop(child as i64)
                .prop(parent as i64),
        );
    }

    pub fn op(&mut self, child: u64, parent: u64, property: &str) {
        self.entries.push(
            FbxNode::new("C")
                .prop("OP")
                .prop(child as i64)
                .prop(parent as i64)
                .prop(property),
        );
    }

    pub fn into_node(self) -> FbxNode {
        FbxNode::new("Connections").children(self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_one_c_node_per_edge() {
        let mut connections = Connections::new();
        connections.oo(1, 0);
        connections.op(2, 1, "DiffuseColor");
        let node = connections.into_node();
        assert_eq!(node.name, "Connections");
        assert_eq!(node.children.len(), 2);
    }
}
