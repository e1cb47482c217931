//! Layout of the flattened device tree blob, bit for bit.
use core::mem::size_of;

use endian_type::types::u32_be;
use num_derive::FromPrimitive;

pub const FDT_MAGIC: u32 = 0xd00d_feed;

#[derive(FromPrimitive, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdtTok {
    BeginNode = 0x1,
    EndNode = 0x2,
    Prop = 0x3,
    Nop = 0x4,
    End = 0x9,
}

// These are never read through a reference. They only provide field offsets
// (via `offset_of!`) and sizes for the checked buffer reader.

// Blob header, every field big-endian.
#[repr(C)]
pub struct fdt_header {
    pub magic: u32_be,
    pub totalsize: u32_be,
    pub off_dt_struct: u32_be,
    pub off_dt_strings: u32_be,
    pub off_mem_rsvmap: u32_be,
    pub version: u32_be,
    pub last_comp_version: u32_be,
    pub boot_cpuid_phys: u32_be,
    pub size_dt_strings: u32_be,
    pub size_dt_struct: u32_be,
}

#[repr(C)]
pub struct fdt_prop_header {
    pub len: u32_be,
    pub nameoff: u32_be,
}

assert_eq_size!(fdt_header, [u32; 10]);
assert_eq_size!(fdt_prop_header, [u32; 2]);

/// Size of a structure block token (and the unit every region is padded to).
pub const FDT_TOKEN_SIZE: usize = size_of::<u32>();

/// Size of one address/size cell inside a property value.
pub const FDT_CELL_SIZE: usize = size_of::<u32>();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layouts_match_the_blob() {
        assert_eq!(size_of::<fdt_header>(), 40);
        assert_eq!(offset_of!(fdt_header, totalsize), 4);
        assert_eq!(offset_of!(fdt_header, boot_cpuid_phys), 28);
        assert_eq!(offset_of!(fdt_header, size_dt_struct), 36);
        assert_eq!(offset_of!(fdt_prop_header, nameoff), 4);
        assert_eq!(size_of::<u32_be>(), FDT_TOKEN_SIZE);
    }
}
