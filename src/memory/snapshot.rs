//! Sparse in-memory guest image backed by captured byte regions

use crate::core::types::{Address, QueryResult};
use crate::memory::provider::{GuestArchitecture, MemoryFault, MemoryProvider};
use std::collections::BTreeMap;

/// Memory provider over a set of captured regions.
///
/// A read succeeds only when the whole range lies inside one region;
/// anything else faults like an unmapped page would.
#[derive(Debug, Clone, Default)]
pub struct SnapshotMemory {
    architecture: GuestArchitecture,
    regions: BTreeMap<Address, Vec<u8>>,
}

impl SnapshotMemory {
    /// Creates an empty snapshot for the given architecture
    pub fn new(architecture: GuestArchitecture) -> Self {
        SnapshotMemory {
            architecture,
            regions: BTreeMap::new(),
        }
    }

    /// Adds (or replaces) the region starting at `base`
    pub fn map(&mut self, base: Address, bytes: Vec<u8>) {
        self.regions.insert(base, bytes);
    }

    /// Builder form of [`SnapshotMemory::map`]
    pub fn with_region(mut self, base: Address, bytes: Vec<u8>) -> Self {
        self.map(base, bytes);
        self
    }

    /// Adds a region given as a hex string
    pub fn map_hex(&mut self, base: Address, data: &str) -> QueryResult<()> {
        let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
        self.map(base, hex::decode(cleaned)?);
        Ok(())
    }

    /// Number of captured regions
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }
}

impl MemoryProvider for SnapshotMemory {
    fn read_bytes(&self, address: Address, width: usize) -> Result<Vec<u8>, MemoryFault> {
        let (base, bytes) = self
            .regions
            .range(..=address)
            .next_back()
            .ok_or_else(|| MemoryFault::new(address, "unmapped address"))?;

        let start = (address.as_u64() - base.as_u64()) as usize;
        let end = start
            .checked_add(width)
            .ok_or_else(|| MemoryFault::new(address, "read length overflow"))?;
        bytes
            .get(start..end)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| MemoryFault::new(address, "read crosses end of mapped region"))
    }

    fn architecture(&self) -> GuestArchitecture {
        self.architecture
    }
}
