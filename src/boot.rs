//! Boot time hardware discovery.
//!
//! This is the one place in the crate that decides whether the machine can boot. Everything
//! below it reports problems as [`DevTreeError`] values; [`boot`] logs the diagnostic and hands
//! it to a [`Halt`] implementation, which never returns.

use crate::base::{DevTree, LookupResult, MatchMode, PropValue, StructCursor};
use crate::error::{DevTreeError, Result};
use crate::spec::FDT_CELL_SIZE;

/// The only `#address-cells` / `#size-cells` value supported: 64-bit addresses and sizes.
pub const SUPPORTED_CELLS: u32 = 2;

/// Stops the boot sequence. Called at most once, with the error that stopped it.
pub trait Halt {
    fn halt(&self, err: &DevTreeError) -> !;
}

/// A range of physical memory from the memory node's `reg` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    pub address: u64,
    pub size: u64,
}

/// What the kernel learns from the device tree before anything else is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootConfig<'dt> {
    pub address_cells: u32,
    pub size_cells: u32,
    pub boot_cpuid_phys: u32,
    /// Body of the memory node.
    pub memory_node: StructCursor,
    reg: PropValue<'dt>,
}

impl<'dt> BootConfig<'dt> {
    /// Query the addressing width and the memory layout.
    ///
    /// Fails with [`DevTreeError::UnsupportedConfiguration`] when:
    ///
    /// - the root node lacks `#address-cells` or `#size-cells`, or either is not a single cell;
    /// - addresses are not 64-bit ([`SUPPORTED_CELLS`]) or sizes differ in width from addresses;
    /// - a `/reserved-memory` node uses different cell counts than the root, or translates
    ///   addresses through a non-empty `ranges`;
    /// - there is no `memory@<unit-address>` node, its `device_type` is not `"memory"`, or its
    ///   `reg` is not a whole number of (address, size) pairs.
    pub fn discover(dt: &DevTree<'dt>) -> Result<Self> {
        let address_cells = required_cells(dt.lookup("/#address-cells", MatchMode::Exact)?)?;
        let size_cells = required_cells(dt.lookup("/#size-cells", MatchMode::Exact)?)?;
        debug!(
            "#address-cells = {}, #size-cells = {}",
            address_cells, size_cells
        );

        if address_cells != SUPPORTED_CELLS {
            return Err(DevTreeError::UnsupportedConfiguration(
                "only 64-bit addressing is supported",
            ));
        }
        if size_cells != address_cells {
            return Err(DevTreeError::UnsupportedConfiguration(
                "#size-cells differs from #address-cells",
            ));
        }

        if let Some(reserved) = dt.lookup("/reserved-memory", MatchMode::Exact)?.subtree() {
            for name in ["#address-cells", "#size-cells"].iter() {
                if let Some(value) = dt.lookup_at(reserved, name, MatchMode::Exact)?.prop() {
                    if single_cell(value)? != address_cells {
                        return Err(DevTreeError::UnsupportedConfiguration(
                            "/reserved-memory cell counts differ from the root node",
                        ));
                    }
                }
            }
            if let Some(ranges) = dt.lookup_at(reserved, "ranges", MatchMode::Exact)?.prop() {
                if !ranges.is_empty() {
                    return Err(DevTreeError::UnsupportedConfiguration(
                        "/reserved-memory ranges must be empty",
                    ));
                }
            }
        }

        let memory_node = dt
            .lookup("/memory@", MatchMode::Prefix)?
            .subtree()
            .ok_or(DevTreeError::UnsupportedConfiguration("no memory node"))?;

        let device_type = dt
            .lookup_at(memory_node, "device_type", MatchMode::Exact)?
            .prop()
            .ok_or(DevTreeError::UnsupportedConfiguration(
                "memory node has no device_type",
            ))?;
        if device_type.get_str()? != "memory" {
            return Err(DevTreeError::UnsupportedConfiguration(
                "memory node device_type is not \"memory\"",
            ));
        }

        let reg = dt
            .lookup_at(memory_node, "reg", MatchMode::Exact)?
            .prop()
            .ok_or(DevTreeError::UnsupportedConfiguration(
                "memory node has no reg",
            ))?;
        let entry_len = (address_cells + size_cells) as usize * FDT_CELL_SIZE;
        if reg.is_empty() || reg.len() % entry_len != 0 {
            return Err(DevTreeError::UnsupportedConfiguration(
                "memory reg is not a list of (address, size) pairs",
            ));
        }

        Ok(Self {
            address_cells,
            size_cells,
            boot_cpuid_phys: dt.boot_cpuid_phys(),
            memory_node,
            reg,
        })
    }

    /// The memory node's `reg` property, undecoded.
    pub fn reg(&self) -> PropValue<'dt> {
        self.reg
    }

    pub fn memory_regions(&self) -> MemoryRegions<'dt> {
        MemoryRegions {
            reg: self.reg,
            address_cells: self.address_cells,
            size_cells: self.size_cells,
            offset: 0,
        }
    }
}

fn required_cells(result: LookupResult<'_>) -> Result<u32> {
    let value = result
        .prop()
        .ok_or(DevTreeError::UnsupportedConfiguration(
            "root node lacks #address-cells or #size-cells",
        ))?;
    single_cell(value)
}

fn single_cell(value: PropValue<'_>) -> Result<u32> {
    if value.len() != FDT_CELL_SIZE {
        return Err(DevTreeError::UnsupportedConfiguration(
            "cell count property is not a single cell",
        ));
    }
    value.get_u32(0)
}

/// Iterator over the (address, size) pairs of a memory node's `reg` property.
#[derive(Debug, Clone)]
pub struct MemoryRegions<'dt> {
    reg: PropValue<'dt>,
    address_cells: u32,
    size_cells: u32,
    offset: usize,
}

impl<'dt> Iterator for MemoryRegions<'dt> {
    type Item = MemoryRegion;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.reg.len() {
            return None;
        }
        let size_off = self.offset + self.address_cells as usize * FDT_CELL_SIZE;
        let address = self.reg.get_cells(self.offset, self.address_cells).ok()?;
        let size = self.reg.get_cells(size_off, self.size_cells).ok()?;
        self.offset = size_off + self.size_cells as usize * FDT_CELL_SIZE;
        Some(MemoryRegion { address, size })
    }
}

fn probe<'dt>(dt: Result<DevTree<'dt>>) -> Result<BootConfig<'dt>> {
    let dt = dt?;
    info!(
        "device tree: {} bytes, version {} (compatible with {})",
        dt.totalsize(),
        dt.version(),
        dt.last_comp_version()
    );
    dt.validate()?;
    let config = BootConfig::discover(&dt)?;
    for region in config.memory_regions() {
        info!(
            "memory: {:#x} - {:#x}",
            region.address,
            region.address.saturating_add(region.size)
        );
    }
    Ok(config)
}

fn finish<'dt, H: Halt + ?Sized>(result: Result<BootConfig<'dt>>, halt: &H) -> BootConfig<'dt> {
    match result {
        Ok(config) => config,
        Err(err) => {
            error!("device tree: {}", err);
            halt.halt(&err)
        }
    }
}

/// Decode, validate and query the device tree in `blob`, or halt.
pub fn boot<'dt, H: Halt + ?Sized>(blob: &'dt [u8], halt: &H) -> BootConfig<'dt> {
    finish(probe(DevTree::new(blob)), halt)
}

/// Like [`boot`], for the bare pointer firmware hands to the kernel.
///
/// # Safety
///
/// See [`DevTree::from_raw_pointer`]. The blob must stay untouched for the rest of boot.
pub unsafe fn boot_from_pointer<H: Halt + ?Sized>(
    addr: *const u8,
    halt: &H,
) -> BootConfig<'static> {
    finish(probe(DevTree::from_raw_pointer(addr)), halt)
}
