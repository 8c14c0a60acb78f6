//! Memory-mapped I/O address ranges.
//!
//! Device accesses happen outside the translated guest code, so the tracer's
//! memory callbacks never see them. Reference accesses that fall in these ranges
//! are excluded from the load/store checks.

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Half-open address range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MmioRegion {
    pub start: u64,
    pub end: u64,
}

impl MmioRegion {
    pub const fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub const fn contains(&self, addr: u64) -> bool {
        self.start <= addr && addr < self.end
    }
}

impl fmt::Display for MmioRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:08x}, 0x{:08x})", self.start, self.end)
    }
}

/// Parses `START:END` with hexadecimal bounds (`0x` prefix optional).
impl FromStr for MmioRegion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidMmioRegion(s.to_string());
        let (start, end) = s.split_once(':').ok_or_else(invalid)?;
        let start = parse_hex(start).ok_or_else(invalid)?;
        let end = parse_hex(end).ok_or_else(invalid)?;
        if end <= start {
            return Err(invalid());
        }
        Ok(Self::new(start, end))
    }
}

fn parse_hex(s: &str) -> Option<u64> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u64::from_str_radix(&digits.replace('_', ""), 16).ok()
}

/// Device ranges of QEMU's `virt` machine that the tracer cannot observe.
pub const QEMU_VIRT_REGIONS: &[(&str, MmioRegion)] = &[
    ("uart0", MmioRegion::new(0x1000_0000, 0x1000_0100)),
    ("virt-test", MmioRegion::new(0x0010_0000, 0x0010_0010)),
    ("clint", MmioRegion::new(0x0200_0000, 0x0200_FFFF)),
    ("plic", MmioRegion::new(0x0C00_0000, 0x0FFF_FFFF)),
];

/// Set of MMIO ranges consulted by the memory checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MmioMap {
    regions: Vec<MmioRegion>,
}

impl MmioMap {
    pub const fn new(regions: Vec<MmioRegion>) -> Self {
        Self { regions }
    }

    /// The compiled-in QEMU `virt` map.
    pub fn qemu_virt() -> Self {
        Self::new(QEMU_VIRT_REGIONS.iter().map(|&(_, r)| r).collect())
    }

    pub fn push(&mut self, region: MmioRegion) {
        self.regions.push(region);
    }

    pub fn regions(&self) -> &[MmioRegion] {
        &self.regions
    }

    /// Whether `addr` lies in any configured range.
    pub fn contains(&self, addr: u64) -> bool {
        self.regions.iter().any(|r| r.contains(addr))
    }
}
