//! Assembles device tree blobs for the integration tests.
#![allow(dead_code)]

use fdt_lookup::spec::{FdtTok, FDT_MAGIC};

const HEADER_SIZE: usize = 40;
// One all-zero entry terminates the (empty) memory reservation map.
const RSVMAP_SIZE: usize = 16;

#[derive(Default)]
pub struct FdtBuilder {
    structure: Vec<u8>,
    strings: Vec<u8>,
}

impl FdtBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn pad(&mut self) {
        while self.structure.len() % 4 != 0 {
            self.structure.push(0);
        }
    }

    pub fn token(&mut self, raw: u32) -> &mut Self {
        self.structure.extend_from_slice(&raw.to_be_bytes());
        self
    }

    pub fn begin_node(&mut self, name: &str) -> &mut Self {
        self.token(FdtTok::BeginNode as u32);
        self.structure.extend_from_slice(name.as_bytes());
        self.structure.push(0);
        self.pad();
        self
    }

    pub fn end_node(&mut self) -> &mut Self {
        self.token(FdtTok::EndNode as u32)
    }

    pub fn nop(&mut self) -> &mut Self {
        self.token(FdtTok::Nop as u32)
    }

    pub fn end(&mut self) -> &mut Self {
        self.token(FdtTok::End as u32)
    }

    /// Offset of the strings block entry for `name`, adding it if needed.
    pub fn string(&mut self, name: &str) -> u32 {
        let mut off = 0;
        for s in self.strings.split(|&b| b == 0) {
            if s == name.as_bytes() && off < self.strings.len() {
                return off as u32;
            }
            off += s.len() + 1;
        }
        let off = self.strings.len();
        self.strings.extend_from_slice(name.as_bytes());
        self.strings.push(0);
        off as u32
    }

    pub fn prop_raw(&mut self, nameoff: u32, value: &[u8]) -> &mut Self {
        self.token(FdtTok::Prop as u32);
        self.token(value.len() as u32);
        self.token(nameoff);
        self.structure.extend_from_slice(value);
        self.pad();
        self
    }

    pub fn prop(&mut self, name: &str, value: &[u8]) -> &mut Self {
        let nameoff = self.string(name);
        self.prop_raw(nameoff, value)
    }

    pub fn prop_cells(&mut self, name: &str, cells: &[u32]) -> &mut Self {
        let value: Vec<u8> = cells.iter().flat_map(|c| c.to_be_bytes()).collect();
        self.prop(name, &value)
    }

    pub fn prop_u32(&mut self, name: &str, value: u32) -> &mut Self {
        self.prop_cells(name, &[value])
    }

    pub fn prop_str(&mut self, name: &str, value: &str) -> &mut Self {
        let mut bytes = value.as_bytes().to_vec();
        bytes.push(0);
        self.prop(name, &bytes)
    }

    /// Current end of the structure block. Called right after `begin_node` this is the offset
    /// of the node's body; right after `end_node` it is where the stream resumes.
    pub fn mark(&self) -> usize {
        self.structure.len()
    }

    pub fn build(&self) -> Vec<u8> {
        let off_dt_struct = HEADER_SIZE + RSVMAP_SIZE;
        let off_dt_strings = off_dt_struct + self.structure.len();
        let totalsize = off_dt_strings + self.strings.len();
        let header: [u32; 10] = [
            FDT_MAGIC,
            totalsize as u32,
            off_dt_struct as u32,
            off_dt_strings as u32,
            HEADER_SIZE as u32,
            17,
            16,
            0,
            self.strings.len() as u32,
            self.structure.len() as u32,
        ];

        let mut blob: Vec<u8> = header.iter().flat_map(|f| f.to_be_bytes()).collect();
        blob.resize(off_dt_struct, 0);
        blob.extend_from_slice(&self.structure);
        blob.extend_from_slice(&self.strings);
        blob
    }
}

pub const MEMORY_REG: [u32; 8] = [
    0x0,
    0x8000_0000,
    0x0,
    0x0800_0000,
    0x1,
    0x0,
    0x0,
    0x1000_0000,
];

/// An unnamed root with `#address-cells` = `#size-cells` = 2 and a `memory@80000000` child
/// holding `device_type` and an eight cell `reg`.
///
/// Returns the builder (still open for more root children) and the memory node's body offset.
pub fn boot_tree() -> (FdtBuilder, usize) {
    let mut b = FdtBuilder::new();
    b.begin_node("")
        .prop_u32("#address-cells", 2)
        .prop_u32("#size-cells", 2)
        .begin_node("memory@80000000");
    let memory_body = b.mark();
    b.prop_str("device_type", "memory")
        .prop_cells("reg", &MEMORY_REG)
        .end_node();
    (b, memory_body)
}

/// [`boot_tree`], closed and assembled.
pub fn boot_blob() -> (Vec<u8>, usize) {
    let (mut b, memory_body) = boot_tree();
    b.end_node().end();
    (b.build(), memory_body)
}
