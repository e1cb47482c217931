#[cfg(doc)]
use crate::base::parse::ParsedTok;

use core::mem::size_of;
use core::ops::Range;
use core::slice;

use crate::bstr::ByteStr;
use crate::error::{DevTreeError, Result};
use crate::priv_util::SliceRead;
use crate::spec::{fdt_header, FDT_MAGIC};

use super::parse::DevTreeParseIter;
use super::lookup::{lookup, LookupResult, MatchMode};
use super::walk::{walk, StructCursor};

const fn is_aligned<T>(offset: usize) -> bool {
    offset % size_of::<T>() == 0
}

macro_rules! get_be32_field {
    ( $f:ident, $s:ident , $buf:expr ) => {
        $buf.read_be_u32(offset_of!($s, $f))
    };
}

/// The decoded FDT header.
///
/// This is an independent copy in native byte order; decoding never writes to the blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FdtHeader {
    pub magic: u32,
    pub totalsize: u32,
    pub off_dt_struct: u32,
    pub off_dt_strings: u32,
    pub off_mem_rsvmap: u32,
    pub version: u32,
    pub last_comp_version: u32,
    pub boot_cpuid_phys: u32,
    pub size_dt_strings: u32,
    pub size_dt_struct: u32,
}

impl FdtHeader {
    pub const SIZE: usize = size_of::<fdt_header>();

    /// Decode the ten header fields at the start of `buf` and check the magic number.
    pub fn read(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(DevTreeError::UnboundedRead {
                offset: 0,
                len: Self::SIZE,
            });
        }

        let magic = get_be32_field!(magic, fdt_header, buf)?;
        if magic != FDT_MAGIC {
            return Err(DevTreeError::InvalidMagicNumber(magic));
        }

        Ok(Self {
            magic,
            totalsize: get_be32_field!(totalsize, fdt_header, buf)?,
            off_dt_struct: get_be32_field!(off_dt_struct, fdt_header, buf)?,
            off_dt_strings: get_be32_field!(off_dt_strings, fdt_header, buf)?,
            off_mem_rsvmap: get_be32_field!(off_mem_rsvmap, fdt_header, buf)?,
            version: get_be32_field!(version, fdt_header, buf)?,
            last_comp_version: get_be32_field!(last_comp_version, fdt_header, buf)?,
            boot_cpuid_phys: get_be32_field!(boot_cpuid_phys, fdt_header, buf)?,
            size_dt_strings: get_be32_field!(size_dt_strings, fdt_header, buf)?,
            size_dt_struct: get_be32_field!(size_dt_struct, fdt_header, buf)?,
        })
    }

    fn structure_range(&self) -> Result<Range<usize>> {
        block_range(self.off_dt_struct, self.size_dt_struct, self.totalsize)
    }

    fn strings_range(&self) -> Result<Range<usize>> {
        block_range(self.off_dt_strings, self.size_dt_strings, self.totalsize)
    }
}

fn block_range(offset: u32, size: u32, totalsize: u32) -> Result<Range<usize>> {
    let start = offset as usize;
    let len = size as usize;
    match start.checked_add(len) {
        Some(end) if end <= totalsize as usize => Ok(start..end),
        _ => Err(DevTreeError::UnboundedRead { offset: start, len }),
    }
}

/// A parseable Flattened Device Tree.
///
/// Holds the decoded header and the structure and strings blocks, each bounded by the sizes
/// declared in the header. Every read the walker or the lookup engine performs is checked
/// against these bounds.
///
/// This parser was written according to the v0.3 specification provided at
/// https://www.devicetree.org/
#[derive(Copy, Clone, Debug)]
pub struct DevTree<'dt> {
    buf: &'dt [u8],
    header: FdtHeader,
    structure: &'dt [u8],
    strings: &'dt [u8],
}

impl<'dt> PartialEq for DevTree<'dt> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.buf, other.buf)
    }
}

impl<'dt> DevTree<'dt> {
    pub const MIN_HEADER_SIZE: usize = FdtHeader::SIZE;

    /// Verify the magic header of a Device Tree buffer
    #[inline]
    pub fn verify_magic(buf: &[u8]) -> Result<()> {
        FdtHeader::read(buf).map(|_| ())
    }

    /// Using the provided byte slice this method will:
    ///
    /// 1. Verify that the slice begins with the magic Device Tree header
    /// 2. Return the reported `totalsize` field of the Device Tree header
    ///
    /// Firmware usually hands over only a pointer. This method can be called on the first
    /// [`Self::MIN_HEADER_SIZE`] bytes to learn how much memory the blob spans before
    /// constructing the [`DevTree`].
    #[inline]
    pub fn read_totalsize(buf: &[u8]) -> Result<usize> {
        Ok(FdtHeader::read(buf)?.totalsize as usize)
    }

    /// Construct the parseable DevTree object from the provided byte slice.
    ///
    /// The buffer may be longer than the header's `totalsize`; the excess is ignored.
    pub fn new(buf: &'dt [u8]) -> Result<Self> {
        let header = FdtHeader::read(buf)?;

        let totalsize = header.totalsize as usize;
        if totalsize > buf.len() {
            return Err(DevTreeError::UnboundedRead {
                offset: 0,
                len: totalsize,
            });
        }
        let buf = &buf[..totalsize];

        if !is_aligned::<u32>(header.off_dt_struct as usize) {
            return Err(DevTreeError::malformed(
                0,
                "structure block is not 32-bit aligned",
            ));
        }

        let structure = &buf[header.structure_range()?];
        let strings = &buf[header.strings_range()?];

        Ok(Self {
            buf,
            header,
            structure,
            strings,
        })
    }

    /// Construct the parseable DevTree object from a raw byte pointer
    ///
    /// # Safety
    ///
    /// Callers of this method the must guarantee the following:
    ///
    /// - `addr` points to a device tree blob that stays readable and unmodified for `'dt`.
    /// - At least `totalsize` bytes (as reported by the blob's header) are readable from `addr`.
    pub unsafe fn from_raw_pointer(addr: *const u8) -> Result<Self> {
        if addr.is_null() {
            return Err(DevTreeError::InvalidParameter("null device tree pointer"));
        }
        let buf: &[u8] = slice::from_raw_parts(addr, Self::MIN_HEADER_SIZE);
        let buf_size = Self::read_totalsize(buf)?;
        let buf: &'dt [u8] = slice::from_raw_parts(addr, buf_size);

        Self::new(buf)
    }

    /// Returns the decoded header.
    #[inline]
    #[must_use]
    pub fn header(&self) -> &FdtHeader {
        &self.header
    }

    /// Returns the totalsize field of the Device Tree. This is the number of bytes of the device
    /// tree structure.
    #[inline]
    #[must_use]
    pub fn totalsize(&self) -> usize {
        self.header.totalsize as usize
    }

    /// Returns the rsvmap offset field of the Device Tree
    #[inline]
    #[must_use]
    pub fn off_mem_rsvmap(&self) -> usize {
        self.header.off_mem_rsvmap as usize
    }

    /// Returns the dt_struct offset field of the Device Tree
    #[inline]
    #[must_use]
    pub fn off_dt_struct(&self) -> usize {
        self.header.off_dt_struct as usize
    }

    /// Returns the dt_strings offset field of the Device Tree
    #[inline]
    #[must_use]
    pub fn off_dt_strings(&self) -> usize {
        self.header.off_dt_strings as usize
    }

    #[inline]
    #[must_use]
    pub fn magic(&self) -> u32 {
        self.header.magic
    }

    #[inline]
    #[must_use]
    pub fn version(&self) -> u32 {
        self.header.version
    }

    #[inline]
    #[must_use]
    pub fn boot_cpuid_phys(&self) -> u32 {
        self.header.boot_cpuid_phys
    }

    #[inline]
    #[must_use]
    pub fn last_comp_version(&self) -> u32 {
        self.header.last_comp_version
    }

    #[inline]
    #[must_use]
    pub fn size_dt_strings(&self) -> u32 {
        self.header.size_dt_strings
    }

    #[inline]
    #[must_use]
    pub fn size_dt_struct(&self) -> u32 {
        self.header.size_dt_struct
    }

    /// The whole blob, cut to `totalsize`.
    pub fn buf(&self) -> &'dt [u8] {
        self.buf
    }

    /// The structure block, cut to `size_dt_struct`.
    pub fn structure(&self) -> &'dt [u8] {
        self.structure
    }

    /// The strings block, cut to `size_dt_strings`.
    pub fn strings(&self) -> &'dt [u8] {
        self.strings
    }

    /// Resolve a property name offset against the strings block.
    pub fn string_at(&self, nameoff: usize) -> Result<ByteStr<'dt>> {
        Ok(ByteStr::from_nul_terminated(self.strings, nameoff)?)
    }

    /// Returns an iterator over low level parsing tokens, [`ParsedTok`].
    #[must_use]
    pub fn parse_iter(&self) -> DevTreeParseIter<'dt> {
        DevTreeParseIter::new(self.structure)
    }

    /// Walk the entire structure block once and check that every node is closed and the stream
    /// ends with an END token at the top level.
    pub fn validate(&self) -> Result<()> {
        match walk(self, StructCursor::ROOT, 0)? {
            None => Ok(()),
            // Only reachable through a stray END_NODE, which walk already rejects.
            Some(cursor) => Err(DevTreeError::malformed(
                cursor.offset(),
                "structure ended without an END token",
            )),
        }
    }

    /// Look up `path` starting at the root of the structure block.
    ///
    /// Paths start with `/`, which enters the unnamed root node. See [`lookup`].
    pub fn lookup(&self, path: &str, mode: MatchMode) -> Result<LookupResult<'dt>> {
        lookup(self, StructCursor::ROOT, path, mode)
    }

    /// Look up `path` relative to a subtree returned by an earlier lookup.
    pub fn lookup_at(
        &self,
        cursor: StructCursor,
        path: &str,
        mode: MatchMode,
    ) -> Result<LookupResult<'dt>> {
        lookup(self, cursor, path, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::FdtTok;

    fn header_bytes(fields: [u32; 10]) -> [u8; 40] {
        let mut buf = [0u8; 40];
        for (i, f) in fields.iter().enumerate() {
            buf[i * 4..i * 4 + 4].copy_from_slice(&f.to_be_bytes());
        }
        buf
    }

    #[test]
    fn header_too_small() {
        assert_eq!(
            FdtHeader::read(&[0xd0, 0x0d, 0xfe, 0xed]),
            Err(DevTreeError::UnboundedRead {
                offset: 0,
                len: 40
            })
        );
    }

    #[test]
    fn header_bad_magic() {
        let buf = header_bytes([0xfeed_d00d, 40, 40, 40, 40, 17, 16, 0, 0, 0]);
        assert_eq!(
            DevTree::new(&buf),
            Err(DevTreeError::InvalidMagicNumber(0xfeed_d00d))
        );
    }

    #[test]
    fn header_decodes_without_touching_blob() {
        let buf = header_bytes([FDT_MAGIC, 40, 40, 40, 40, 17, 16, 3, 0, 0]);
        let copy = buf;
        let header = FdtHeader::read(&buf).unwrap();
        assert_eq!(header.magic, FDT_MAGIC);
        assert_eq!(header.version, 17);
        assert_eq!(header.last_comp_version, 16);
        assert_eq!(header.boot_cpuid_phys, 3);
        assert_eq!(buf, copy);
    }

    #[test]
    fn totalsize_beyond_buffer() {
        let buf = header_bytes([FDT_MAGIC, 64, 40, 40, 40, 17, 16, 0, 0, 0]);
        assert_eq!(
            DevTree::new(&buf),
            Err(DevTreeError::UnboundedRead {
                offset: 0,
                len: 64
            })
        );
    }

    #[test]
    fn block_outside_totalsize() {
        let buf = header_bytes([FDT_MAGIC, 40, 40, 40, 40, 17, 16, 0, 0, 8]);
        assert_eq!(
            DevTree::new(&buf),
            Err(DevTreeError::UnboundedRead { offset: 40, len: 8 })
        );
        let buf = header_bytes([FDT_MAGIC, 40, 40, 0xffff_fff0, 40, 17, 16, 0, 0x20, 0]);
        assert!(matches!(
            DevTree::new(&buf),
            Err(DevTreeError::UnboundedRead { .. })
        ));
    }

    #[test]
    fn unaligned_structure_block() {
        let buf = header_bytes([FDT_MAGIC, 40, 38, 40, 40, 17, 16, 0, 0, 0]);
        assert!(matches!(
            DevTree::new(&buf),
            Err(DevTreeError::MalformedStructure { .. })
        ));
    }

    #[test]
    fn totalsize_probe() {
        let buf = header_bytes([FDT_MAGIC, 40, 40, 40, 40, 17, 16, 0, 0, 0]);
        assert_eq!(DevTree::read_totalsize(&buf), Ok(40));
        assert!(DevTree::verify_magic(&buf).is_ok());
    }

    #[test]
    fn from_raw_pointer_uses_totalsize() {
        let mut buf = [0u8; 48];
        buf[..40].copy_from_slice(&header_bytes([FDT_MAGIC, 44, 40, 44, 40, 17, 16, 0, 0, 4]));
        buf[40..44].copy_from_slice(&(FdtTok::End as u32).to_be_bytes());
        let dt = unsafe { DevTree::from_raw_pointer(buf.as_ptr()) }.unwrap();
        assert_eq!(dt.totalsize(), 44);
        assert_eq!(dt.buf().len(), 44);
        assert_eq!(dt.structure().len(), 4);
        assert!(dt.strings().is_empty());
        assert_eq!(
            unsafe { DevTree::from_raw_pointer(core::ptr::null()) },
            Err(DevTreeError::InvalidParameter("null device tree pointer"))
        );
    }

    #[test]
    fn equality_is_identity_of_the_blob() {
        let mut buf = [0u8; 44];
        buf[..40].copy_from_slice(&header_bytes([FDT_MAGIC, 44, 40, 44, 40, 17, 16, 0, 0, 4]));
        buf[40..44].copy_from_slice(&(FdtTok::End as u32).to_be_bytes());
        let copy = buf;

        let dt = DevTree::new(&buf).unwrap();
        assert_eq!(dt, DevTree::new(&buf).unwrap());
        assert_ne!(dt, DevTree::new(&copy).unwrap());
    }
}
