//! Typed memory reading: one fetch, one decode per member

pub mod decode;

use crate::core::types::{
    Address, MemberDescriptor, PrimitiveValue, QueryError, QueryResult, StructuredType,
};
use crate::memory::provider::MemoryProvider;
use tracing::trace;

/// Reads one member at `address` and decodes it.
///
/// Pointer members are read at the guest pointer width and returned as
/// [`PrimitiveValue::Pointer`] without being followed; double pointers are
/// also a single read of the outer pointer. Undecodable descriptors fail
/// with `UnsupportedType` before memory is touched, and provider faults
/// surface as `MemoryAccess`. The provider is called exactly once on every
/// other path.
pub fn read_member<P: MemoryProvider + ?Sized>(
    provider: &P,
    address: Address,
    rdt: &MemberDescriptor,
) -> QueryResult<PrimitiveValue> {
    let width = decode::read_width(rdt, provider.architecture().pointer_size())?;

    let bytes = provider
        .read_bytes(address, width)
        .map_err(|fault| QueryError::memory_access(address, width, fault.reason))?;
    if bytes.len() != width {
        return Err(QueryError::memory_access(
            address,
            width,
            format!("short read of {} bytes", bytes.len()),
        ));
    }

    let value = decode::decode(rdt, &bytes)?;
    trace!(member = %rdt.name, address = %address, width, value = %value, "read member");
    Ok(value)
}

/// Typed reader bound to one memory provider
pub struct TypedReader<'a, P: MemoryProvider + ?Sized> {
    provider: &'a P,
}

impl<'a, P: MemoryProvider + ?Sized> TypedReader<'a, P> {
    /// Create a new typed reader
    pub fn new(provider: &'a P) -> Self {
        TypedReader { provider }
    }

    /// Read a member located at `address`
    pub fn read_member(
        &self,
        address: Address,
        rdt: &MemberDescriptor,
    ) -> QueryResult<PrimitiveValue> {
        read_member(self.provider, address, rdt)
    }

    /// Read a member of the structure that starts at `base`
    pub fn read_field(
        &self,
        base: Address,
        rdt: &MemberDescriptor,
    ) -> QueryResult<PrimitiveValue> {
        let address = base.checked_add(rdt.offset_bytes)?;
        self.read_member(address, rdt)
    }

    /// Read every member of `st` located at `base`, one result per member.
    ///
    /// Aggregate members yield `UnsupportedType`; walking into them is up to
    /// the caller.
    pub fn read_members<'s>(
        &self,
        base: Address,
        st: &'s StructuredType,
    ) -> Vec<(&'s str, QueryResult<PrimitiveValue>)> {
        st.members
            .iter()
            .map(|m| (m.name.as_str(), self.read_field(base, m)))
            .collect()
    }

    /// Read `count` consecutive elements shaped like `element`, starting at `address`
    pub fn read_elements(
        &self,
        address: Address,
        element: &MemberDescriptor,
        count: usize,
    ) -> Vec<QueryResult<PrimitiveValue>> {
        let stride = if element.is_indirect() {
            // An unreadable slot width fails per element in read_member.
            decode::pointer_width(element, self.provider.architecture().pointer_size())
                .unwrap_or_default() as u64
        } else {
            element.size_bytes
        };
        (0..count as u64)
            .map(|i| {
                let addr = address.checked_add(i.saturating_mul(stride))?;
                self.read_member(addr, element)
            })
            .collect()
    }
}
