//! Guest memory access and typed decoding
//!
//! This module provides:
//! - The [`MemoryProvider`] seam to the hosting engine's memory subsystem
//! - Byte-accurate, endian-aware decoding of member descriptors
//! - A region-backed [`SnapshotMemory`] provider for captured images

pub mod provider;
pub mod reader;
pub mod snapshot;

pub use provider::{GuestArchitecture, MemoryFault, MemoryProvider};
pub use reader::{read_member, TypedReader};
pub use snapshot::SnapshotMemory;
