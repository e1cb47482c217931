use crate::bstr::ByteStr;
use crate::error::{DevTreeError, Result};
use crate::priv_util::SliceRead;
use crate::spec::FDT_CELL_SIZE;

/// The value of a device tree property, borrowed straight from the blob.
///
/// Device Tree Properties are not strongly typed; the accessors below only decode the common
/// encodings. Every read is bounds checked against the value's true (unpadded) length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropValue<'dt> {
    propbuf: &'dt [u8],
}

impl<'dt> PropValue<'dt> {
    pub(crate) const fn new(propbuf: &'dt [u8]) -> Self {
        Self { propbuf }
    }

    /// Returns this property's data as a raw slice
    #[inline]
    #[must_use]
    pub fn raw(&self) -> &'dt [u8] {
        self.propbuf
    }

    /// Returns the length of the property value within the device tree
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.propbuf.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.propbuf.is_empty()
    }

    /// Read a big-endian [`u32`] from the provided offset in this device tree property's value.
    /// Convert the read value into the machines' native [`u32`] format and return it.
    ///
    /// If an offset which would cause this read to access memory outside of this property's value
    /// an [`Err`] containing [`DevTreeError::UnboundedRead`] will be returned.
    #[inline]
    pub fn get_u32(&self, offset: usize) -> Result<u32> {
        Ok(self.propbuf.read_be_u32(offset)?)
    }

    /// Read a big-endian [`u64`] from the provided offset in this device tree property's value.
    ///
    /// See [`PropValue::get_u32`].
    #[inline]
    pub fn get_u64(&self, offset: usize) -> Result<u64> {
        Ok(self.propbuf.read_be_u64(offset)?)
    }

    /// Read a value made of `cells` 32-bit cells, as `#address-cells` and `#size-cells` describe.
    ///
    /// Only one or two cells fit a [`u64`]; any other count is an
    /// [`DevTreeError::InvalidParameter`].
    pub fn get_cells(&self, offset: usize, cells: u32) -> Result<u64> {
        match cells {
            1 => self.get_u32(offset).map(u64::from),
            2 => self.get_u64(offset),
            _ => Err(DevTreeError::InvalidParameter(
                "cell count must be 1 or 2",
            )),
        }
    }

    /// Number of whole 32-bit cells in the value.
    #[inline]
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.len() / FDT_CELL_SIZE
    }

    /// Returns the property as a string, up to its NUL terminator.
    pub fn get_str(&self) -> Result<&'dt str> {
        ByteStr::from_nul_terminated(self.propbuf, 0)?.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        let buf: [u8; 12] = [0, 0, 0, 2, 0, 0, 0, 0, 0x80, 0, 0, 0];
        let value = PropValue::new(&buf);
        assert_eq!(value.len(), 12);
        assert_eq!(value.cell_count(), 3);
        assert_eq!(value.get_u32(0), Ok(2));
        assert_eq!(value.get_cells(0, 1), Ok(2));
        assert_eq!(value.get_cells(4, 2), Ok(0x8000_0000));
        assert_eq!(
            value.get_cells(0, 3),
            Err(DevTreeError::InvalidParameter("cell count must be 1 or 2"))
        );
        assert_eq!(
            value.get_u64(8),
            Err(DevTreeError::UnboundedRead { offset: 8, len: 8 })
        );
    }

    #[test]
    fn strings() {
        assert_eq!(PropValue::new(b"memory\0").get_str(), Ok("memory"));
        assert!(PropValue::new(b"memory").get_str().is_err());
        assert!(matches!(
            PropValue::new(b"\xff\0").get_str(),
            Err(DevTreeError::StrError(_))
        ));
        assert!(PropValue::new(b"").is_empty());
    }
}
