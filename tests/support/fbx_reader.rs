//! Decode-only reader, the inverse of `src/writer.rs`. Exists purely so the
//! round-trip tests can assert the binary invariants from §8 without pulling
//! in a full FBX importer crate; it is not part of the library's public
//! surface.

#[derive(Debug, Clone)]
pub enum ReadValue {
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Raw(Vec<u8>),
    Int32Array(Vec<i32>),
    Int64Array(Vec<i64>),
    Float32Array(Vec<f32>),
    Float64Array(Vec<f64>),
    BoolArray(Vec<bool>),
}

#[derive(Debug, Clone)]
pub struct ReadNode {
    pub name: String,
    pub properties: Vec<ReadValue>,
    pub children: Vec<ReadNode>,
}

impl ReadNode {
    pub fn child(&self, name: &str) -> Option<&ReadNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ReadNode> {
        self.children.iter().filter(move |c| c.name == name)
    }
}

pub struct FbxFile {
    pub version: u32,
    pub top_level: Vec<ReadNode>,
}

impl FbxFile {
    pub fn node(&self, name: &str) -> Option<&ReadNode> {
        self.top_level.iter().find(|n| n.name == name)
    }
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn u8(&mut self) -> u8 {
        let v = self.buf[self.pos];
        self.pos += 1;
        v
    }

    fn u32(&mut self) -> u32 {
        let v = u32::from_le_bytes(self.buf[self.pos..self.pos + 4].try_into().unwrap());
        self.pos += 4;
        v
    }

    fn u64(&mut self) -> u64 {
        let v = u64::from_le_bytes(self.buf[self.pos..self.pos + 8].try_into().unwrap());
        self.pos += 8;
        v
    }

    fn i16(&mut self) -> i16 {
        let v = i16::from_le_bytes(self.buf[self.pos..self.pos + 2].try_into().unwrap());
        self.pos += 2;
        v
    }

    fn i32(&mut self) -> i32 {
        let v = i32::from_le_bytes(self.buf[self.pos..self.pos + 4].try_into().unwrap());
        self.pos += 4;
        v
    }

    fn i64(&mut self) -> i64 {
        let v = i64::from_le_bytes(self.buf[self.pos..self.pos + 8].try_into().unwrap());
        self.pos += 8;
        v
    }

    fn f32(&mut self) -> f32 {
        let v = f32::from_le_bytes(self.buf[self.pos..self.pos + 4].try_into().unwrap());
        self.pos += 4;
        v
    }

    fn f64(&mut self) -> f64 {
        let v = f64::from_le_bytes(self.buf[self.pos..self.pos + 8].try_into().unwrap());
        self.pos += 8;
        v
    }

    fn bytes(&mut self, len: usize) -> &'a [u8] {
        let v = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        v
    }

    fn property(&mut self) -> ReadValue {
        match self.u8() {
            b'C' => ReadValue::Bool(self.u8() != 0),
            b'Y' => ReadValue::Int16(self.i16()),
            b'I' => ReadValue::Int32(self.i32()),
            b'L' => ReadValue::Int64(self.i64()),
            b'F' => ReadValue::Float32(self.f32()),
            b'D' => ReadValue::Float64(self.f64()),
            b'S' => {
                let len = self.u32() as usize;
                ReadValue::String(String::from_utf8_lossy(self.bytes(len)).into_owned())
            }
            b'R' => {
                let len = self.u32() as usize;
                ReadValue::Raw(self.bytes(len).to_vec())
            }
            b'i' => {
                let count = self.u32() as usize;
                self.u32(); // encoding
                self.u32(); // byte length
                ReadValue::Int32Array((0..count).map(|_| self.i32()).collect())
            }
            b'l' => {
                let count = self.u32() as usize;
                self.u32();
                self.u32();
                ReadValue::Int64Array((0..count).map(|_| self.i64()).collect())
            }
            b'f' => {
                let count = self.u32() as usize;
                self.u32();
                self.u32();
                ReadValue::Float32Array((0..count).map(|_| self.f32()).collect())
            }
            b'd' => {
                let count = self.u32() as usize;
                self.u32();
                self.u32();
                ReadValue::Float64Array((0..count).map(|_| self.f64()).collect())
            }
            b'b' => {
                let count = self.u32() as usize;
                self.u32();
                self.u32();
                ReadValue::BoolArray((0..count).map(|_| self.u8() != 0).collect())
            }
            tag => panic!("unknown property tag {tag:#x}"),
        }
    }

    /// Reads one node, or `None` if positioned at a 25-byte null-record
    /// sentinel (which this consumes).
    fn node(&mut self) -> Option<ReadNode> {
        let start = self.pos;
        let end_offset = self.u64();
        if end_offset == 0 {
            self.pos = start + 25;
            return None;
        }

        let num_properties = self.u64();
        let prop_list_len = self.u64();
        let name_len = self.u8() as usize;
        let name = String::from_utf8_lossy(self.bytes(name_len)).into_owned();

        let props_start = self.pos;
        let mut properties = Vec::with_capacity(num_properties as usize);
        while (self.pos - props_start) < prop_list_len as usize {
            properties.push(self.property());
        }

        let mut children = Vec::new();
        while self.pos < end_offset as usize {
            match self.node() {
                Some(child) => children.push(child),
                None => break,
            }
        }

        self.pos = end_offset as usize;
        Some(ReadNode { name, properties, children })
    }
}

pub fn read(bytes: &[u8]) -> FbxFile {
    assert_eq!(&bytes[0..21], b"Kaydara FBX Binary  \0");
    assert_eq!(bytes[21], 0x1A);
    assert_eq!(bytes[22], 0x00);

    let mut cursor = Cursor { buf: bytes, pos: 23 };
    let version = cursor.u32();

    let mut top_level = Vec::new();
    loop {
        match cursor.node() {
            Some(node) => top_level.push(node),
            None => break,
        }
    }

    FbxFile { version, top_level }
}
