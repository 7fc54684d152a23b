//! Abstraction over the guest memory subsystem

use crate::core::types::Address;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a memory provider (unmapped page, paged out, ...)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason} at {address}")]
pub struct MemoryFault {
    pub address: Address,
    pub reason: String,
}

impl MemoryFault {
    pub fn new(address: Address, reason: impl Into<String>) -> Self {
        MemoryFault {
            address,
            reason: reason.into(),
        }
    }
}

/// Guest architecture, which fixes the pointer width
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuestArchitecture {
    X86,
    #[default]
    X64,
    Arm,
    Arm64,
}

impl GuestArchitecture {
    /// Returns the pointer size for this architecture
    pub fn pointer_size(&self) -> usize {
        match self {
            GuestArchitecture::X86 | GuestArchitecture::Arm => 4,
            GuestArchitecture::X64 | GuestArchitecture::Arm64 => 8,
        }
    }

    /// Checks if this is a 64-bit architecture
    pub fn is_64bit(&self) -> bool {
        matches!(self, GuestArchitecture::X64 | GuestArchitecture::Arm64)
    }
}

/// Source of guest memory, supplied by the hosting analysis engine.
///
/// Implementations must return exactly `width` bytes or a fault, and must
/// not retry internally on behalf of the caller.
pub trait MemoryProvider {
    /// Reads `width` bytes starting at `address`
    fn read_bytes(&self, address: Address, width: usize) -> Result<Vec<u8>, MemoryFault>;

    /// Architecture of the guest being read
    fn architecture(&self) -> GuestArchitecture {
        GuestArchitecture::X64
    }
}

impl<P: MemoryProvider + ?Sized> MemoryProvider for &P {
    fn read_bytes(&self, address: Address, width: usize) -> Result<Vec<u8>, MemoryFault> {
        (**self).read_bytes(address, width)
    }

    fn architecture(&self) -> GuestArchitecture {
        (**self).architecture()
    }
}

impl<P: MemoryProvider + ?Sized> MemoryProvider for Arc<P> {
    fn read_bytes(&self, address: Address, width: usize) -> Result<Vec<u8>, MemoryFault> {
        (**self).read_bytes(address, width)
    }

    fn architecture(&self) -> GuestArchitecture {
        (**self).architecture()
    }
}
