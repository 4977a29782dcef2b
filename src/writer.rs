//! Binary serialization of the FBX node tree (§4.1): node framing,
//! self-describing property encoding, and the fixed file header/footer.
//!
//! The growable buffer exposes a small reserve/patch API rather than
//! threading offsets through return values (§9): a slot is reserved with a
//! placeholder value, written into later once the real value is known.

use crate::node::{FbxNode, PropertyValue};

/// Node names that always get a trailing null-record sentinel, even when
/// they have no children (§4.1).
const FORCED_SENTINEL_NAMES: &[&str] = &["AnimationStack", "AnimationLayer"];

const MAGIC: &[u8; 21] = b"Kaydara FBX Binary  \0";
const FOOTER_ID: [u8; 16] = [
    0xFA, 0xBC, 0xAB, 0x09, 0xD0, 0xC8, 0xD4, 0x66, 0xB1, 0x76, 0xFB, 0x83, 0x1C, 0xF7, 0x26, 0x7E,
];
const CLOSING_MAGIC: [u8; 16] = [
    0xF8, 0x5A, 0x8C, 0x6A, 0xDE, 0xF5, 0xD9, 0x7E, 0xEC, 0xE9, 0x0C, 0xE3, 0x75, 0x8F, 0x29, 0x0B,
];
const FBX_VERSION: u32 = 7500;

pub struct BinaryWriter {
    buf: Vec<u8>,
}

impl BinaryWriter {
    pub fn new() -> Self {
        // Most scenes produce at least a few KB of node framing; starting
        // above the default `Vec` growth avoids the first few reallocations.
        BinaryWriter {
            buf: Vec::with_capacity(4096),
        }
    }

    fn reserve_u64(&mut self) -> usize {
        let offset = self.buf.len();
        self.buf.extend_from_slice(&0u64.to_le_bytes());
        offset
    }

    fn patch_u64(&mut self, offset: usize, value: u64) {
        self.buf[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
    }

    fn push_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn push_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn push_i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Recursively writes one node (and its subtree) with full framing.
    fn write_node(&mut self, node: &FbxNode) {
        let end_offset_slot = self.reserve_u64();
        self.push_i64(node.properties.len() as i64);
        let prop_list_len_slot = self.reserve_u64();
        self.push_u8(node.name.len() as u8);
        self.push_bytes(node.name.as_bytes());

        let props_start = self.buf.len();
        for prop in &node.properties {
            self.write_property(prop);
        }
        let prop_list_len = (self.buf.len() - props_start) as u64;
        self.patch_u64(prop_list_len_slot, prop_list_len);

        for child in &node.children {
            self.write_node(child);
        }

        let needs_null_record =
            !node.children.is_empty() || FORCED_SENTINEL_NAMES.contains(&node.name.as_str());
        if needs_null_record {
            self.buf.extend_from_slice(&[0u8; 25]);
        }

        let end_offset = self.buf.len() as u64;
        self.patch_u64(end_offset_slot, end_offset);
    }

    fn write_property(&mut self, prop: &PropertyValue) {
        match prop {
            PropertyValue::Bool(v) => {
                self.push_u8(b'C');
                self.push_u8(if *v { 1 } else { 0 });
            }
            PropertyValue::Int16(v) => {
                self.push_u8(b'Y');
                self.buf.extend_from_slice(&v.to_le_bytes());
            }
            PropertyValue::Int32(v) => {
                self.push_u8(b'I');
                self.buf.extend_from_slice(&v.to_le_bytes());
            }
            PropertyValue::Int64(v) => {
                self.push_u8(b'L');
                self.buf.extend_from_slice(&v.to_le_bytes());
            }
            PropertyValue::Float32(v) => {
                self.push_u8(b'F');
                self.buf.extend_from_slice(&v.to_le_bytes());
            }
            PropertyValue::Float64(v) => {
                self.push_u8(b'D');
                self.buf.extend_from_slice(&v.to_le_bytes());
            }
            PropertyValue::String(s) => {
                self.push_u8(b'S');
                self.push_u32(s.len() as u32);
                self.push_bytes(s.as_bytes());
            }
            PropertyValue::Raw(bytes) => {
                self.push_u8(b'R');
                self.push_u32(bytes.len() as u32);
                self.push_bytes(bytes);
            }
            PropertyValue::Int32Array(arr) => {
                self.write_typed_array(b'i', arr.len(), 4, |w| {
                    for v in arr {
                        w.buf.extend_from_slice(&v.to_le_bytes());
                    }
                });
            }
            PropertyValue::Int64Array(arr) => {
                self.write_typed_array(b'l', arr.len(), 8, |w| {
                    for v in arr {
                        w.buf.extend_from_slice(&v.to_le_bytes());
                    }
                });
            }
            PropertyValue::Float32Array(arr) => {
                self.write_typed_array(b'f', arr.len(), 4, |w| {
                    for v in arr {
                        w.buf.extend_from_slice(&v.to_le_bytes());
                    }
                });
            }
            PropertyValue::Float64Array(arr) => {
                self.write_typed_array(b'd', arr.len(), 8, |w| {
                    for v in arr {
                        w.buf.extend_from_slice(&v.to_le_bytes());
                    }
                });
            }
            PropertyValue::BoolArray(arr) => {
                self.write_typed_array(b'b', arr.len(), 1, |w| {
                    for v in arr {
                        w.push_u8(if *v { 1 } else { 0 });
                    }
                });
            }
        }
    }

    /// Writes a typed-array property header (tag, count, encoding,
    /// byte-length) and then the payload via `write_payload`. A zero-length
    /// array always collapses to the `d` tag with no payload (§4.1).
    fn write_typed_array(
        &mut self,
        tag: u8,
        count: usize,
        element_size: usize,
        write_payload: impl FnOnce(&mut Self),
    ) {
        if count == 0 {
            self.push_u8(b'd');
            self.push_u32(0);
            self.push_u32(0);
            self.push_u32(0);
            return;
        }
        self.push_u8(tag);
        self.push_u32(count as u32);
        self.push_u32(0); // encoding: always uncompressed
        self.push_u32((count * element_size) as u32);
        write_payload(self);
    }

    /// Assembles the complete file: magic, version, top-level children in
    /// their fixed order, terminal null record, and footer (§4.1 item 3+).
    pub fn assemble(top_level: TopLevelNodes) -> Vec<u8> {
        let mut w = BinaryWriter::new();
        w.push_bytes(MAGIC);
        w.push_u8(0x1A);
        w.push_u8(0x00);
        w.push_u32(FBX_VERSION);

        w.write_node(&top_level.file_id);
        w.write_node(&top_level.creation_time);
        w.write_node(&top_level.creator);
        w.write_node(&top_level.header_extension);
        w.write_node(&top_level.global_settings);
        w.write_node(&top_level.documents);
        w.write_node(&top_level.references);
        w.write_node(&top_level.definitions);
        w.write_node(&top_level.objects);
        w.write_node(&top_level.connections);

        w.buf.extend_from_slice(&[0u8; 25]);

        w.push_bytes(&FOOTER_ID);
        w.buf.extend_from_slice(&[0u8; 4]);

        let pos = w.buf.len();
        let rem = pos % 16;
        let pad = if rem == 0 { 16 } else { 16 - rem };
        w.buf.extend(std::iter::repeat(0u8).take(pad));

        w.push_u32(FBX_VERSION);
        w.buf.extend_from_slice(&[0u8; 120]);
        w.push_bytes(&CLOSING_MAGIC);

        w.buf
    }
}

impl Default for BinaryWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// The ten fixed top-level nodes, in the order §4.1 item 3 requires.
pub struct TopLevelNodes {
    pub file_id: FbxNode,
    pub creation_time: FbxNode,
    pub creator: FbxNode,
    pub header_extension: FbxNode,
    pub global_settings: FbxNode,
    pub documents: FbxNode,
    pub references: FbxNode,
    pub definitions: FbxNode,
    pub objects: FbxNode,
    pub connections: FbxNode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::PropertyValue;

    fn minimal_top_level() -> TopLevelNodes {
        TopLevelNodes {
            file_id: FbxNode::new("FileId").prop(PropertyValue::Raw(vec![0u8; 16])),
            creation_time: FbxNode::leaf_str("CreationTime", "2026-01-01 00:00:00:000"),
            creator: FbxNode::leaf_str("Creator", "fbx-export"),
            header_extension: FbxNode::new("FBXHeaderExtension"),
            global_settings: FbxNode::new("GlobalSettings"),
            documents: FbxNode::new("Documents"),
            references: FbxNode::new("References"),
            definitions: FbxNode::new("Definitions"),
            objects: FbxNode::new("Objects"),
            connections: FbxNode::new("Connections"),
        }
    }

    #[test]
    fn magic_and_closing_magic() {
        let bytes = BinaryWriter::assemble(minimal_top_level());
        assert_eq!(&bytes[0..21], MAGIC);
        assert_eq!(bytes[21], 0x1A);
        assert_eq!(bytes[22], 0x00);
        assert_eq!(u32::from_le_bytes(bytes[23..27].try_into().unwrap()), 7500);
        assert_eq!(&bytes[bytes.len() - 16..], &CLOSING_MAGIC);
    }

    #[test]
    fn zero_length_array_collapses_to_d_tag() {
        let mut w = BinaryWriter::new();
        w.write_property(&PropertyValue::Int32Array(vec![]));
        assert_eq!(w.buf[0], b'd');
        assert_eq!(w.buf.len(), 1 + 4 + 4 + 4);
        assert_eq!(&w.buf[1..], &[0u8; 12]);
    }

    #[test]
    fn node_end_offset_is_correct() {
        let node = FbxNode::new("Leaf").prop(42i64);
        let mut w = BinaryWriter::new();
        w.write_node(&node);
        let end_offset = u64::from_le_bytes(w.buf[0..8].try_into().unwrap());
        assert_eq!(end_offset, w.buf.len() as u64);
    }

    #[test]
    fn null_record_only_when_children_or_forced() {
        let leaf = FbxNode::new("Leaf").prop(1i64);
        let mut w = BinaryWriter::new();
        w.write_node(&leaf);
        // header(25) + namelen(1) + "Leaf"(4) + one L prop(9) = 39, no null record
        assert_eq!(w.buf.len(), 25 + 4 + 9);

        let stack = FbxNode::new("AnimationStack");
        let mut w2 = BinaryWriter::new();
        w2.write_node(&stack);
        // header(25) + namelen(1) + "AnimationStack"(14) + null record(25)
        assert_eq!(w2.buf.len(), 25 + 14 + 25);
    }
}
