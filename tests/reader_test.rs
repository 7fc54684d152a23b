use dwarf_query::{
    read_member, Address, Bitfield, GuestArchitecture, MemberDescriptor, MemoryFault,
    MemoryProvider, PrimitiveValue, QueryError, SnapshotMemory, StructuredType, TypeCategory,
    TypedReader,
};
use pretty_assertions::assert_eq;
use std::cell::RefCell;

/// Provider that records every fetch and returns fixed bytes
struct Recording {
    bytes: Vec<u8>,
    fault: bool,
    reads: RefCell<Vec<(Address, usize)>>,
}

impl Recording {
    fn new(bytes: &[u8]) -> Self {
        Recording {
            bytes: bytes.to_vec(),
            fault: false,
            reads: RefCell::new(Vec::new()),
        }
    }

    fn faulting() -> Self {
        Recording {
            fault: true,
            ..Recording::new(&[])
        }
    }
}

impl MemoryProvider for Recording {
    fn read_bytes(&self, address: Address, width: usize) -> Result<Vec<u8>, MemoryFault> {
        self.reads.borrow_mut().push((address, width));
        if self.fault {
            return Err(MemoryFault::new(address, "page not present"));
        }
        Ok(self.bytes.iter().copied().cycle().take(width).collect())
    }
}

fn scalar(category: TypeCategory, size: u64, le: bool, signed: bool) -> MemberDescriptor {
    MemberDescriptor::new("m")
        .with_layout(0, size)
        .with_category(category)
        .with_encoding(le, signed)
}

#[test]
fn test_int_endianness() {
    let mem = Recording::new(&[0x01, 0x00, 0x00, 0x00]);
    let a = Address::new(0x7fff_0000);

    let le = read_member(&mem, a, &scalar(TypeCategory::Int, 4, true, true)).unwrap();
    let be = read_member(&mem, a, &scalar(TypeCategory::Int, 4, false, true)).unwrap();

    assert_eq!(le, PrimitiveValue::Int(1));
    assert_eq!(be, PrimitiveValue::Int(16_777_216));
    assert_eq!(*mem.reads.borrow(), vec![(a, 4), (a, 4)]);
}

#[test]
fn test_integer_widths_and_signedness() {
    let mem = Recording::new(&[0xFF]);
    let a = Address::new(0x1000);
    let cases = [
        (1, true, PrimitiveValue::Int(-1)),
        (1, false, PrimitiveValue::UInt(0xFF)),
        (2, true, PrimitiveValue::Int(-1)),
        (2, false, PrimitiveValue::UInt(0xFFFF)),
        (4, false, PrimitiveValue::UInt(u32::MAX)),
        (8, true, PrimitiveValue::Long(-1)),
        (8, false, PrimitiveValue::ULong(u64::MAX)),
    ];
    for (size, signed, expected) in cases {
        let rdt = scalar(TypeCategory::Int, size, true, signed);
        assert_eq!(read_member(&mem, a, &rdt).unwrap(), expected, "size {}", size);
    }
}

#[test]
fn test_bool_char_and_floats() {
    let a = Address::new(0x2000);

    let mem = Recording::new(&[0x00, 0x02]);
    assert_eq!(
        read_member(&mem, a, &scalar(TypeCategory::Bool, 2, false, false)).unwrap(),
        PrimitiveValue::Bool(true)
    );

    let mem = Recording::new(b"A");
    assert_eq!(
        read_member(&mem, a, &scalar(TypeCategory::Char, 1, true, true)).unwrap(),
        PrimitiveValue::Char(b'A')
    );

    let mem = Recording::new(&1.5f32.to_le_bytes());
    assert_eq!(
        read_member(&mem, a, &scalar(TypeCategory::Float, 4, true, true)).unwrap(),
        PrimitiveValue::Float(1.5)
    );

    let mem = Recording::new(&(-0.25f64).to_be_bytes());
    assert_eq!(
        read_member(&mem, a, &scalar(TypeCategory::Float, 8, false, true)).unwrap(),
        PrimitiveValue::Double(-0.25)
    );
}

#[test]
fn test_long_double() {
    // 1.0 in x87 extended precision, padded to 16 bytes
    let mut bytes = vec![0u8; 16];
    bytes[7] = 0x80;
    bytes[8] = 0xFF;
    bytes[9] = 0x3F;
    let mem = SnapshotMemory::new(GuestArchitecture::X64).with_region(Address::new(0x10), bytes);

    let value = read_member(
        &mem,
        Address::new(0x10),
        &scalar(TypeCategory::Float, 16, true, true),
    )
    .unwrap();
    match value {
        PrimitiveValue::LongDouble(ext) => assert_eq!(ext.to_f64(), 1.0),
        other => panic!("expected long double, got {:?}", other),
    }
}

#[test]
fn test_null_pointer_is_not_chased() {
    let mem = Recording::new(&[0x00]);
    let ptr = MemberDescriptor::pointer("next", "list_head").with_layout(0, 8);

    let value = read_member(&mem, Address::new(0x3000), &ptr).unwrap();
    assert_eq!(value, PrimitiveValue::Pointer(Address::null()));
    assert!(value.as_address().unwrap().is_null());
    assert_eq!(mem.reads.borrow().len(), 1);
}

#[test]
fn test_double_pointer_reads_one_pointer() {
    let mem = SnapshotMemory::new(GuestArchitecture::X86)
        .with_region(Address::new(0x100), vec![0x00, 0x20, 0x00, 0x00, 0xAA, 0xAA]);
    let mut argv = MemberDescriptor::pointer("argv", "char").with_layout(0, 4);
    argv.is_pointer = false;
    argv.is_double_pointer = true;

    assert_eq!(
        read_member(&mem, Address::new(0x100), &argv).unwrap(),
        PrimitiveValue::Pointer(Address::new(0x2000))
    );
}

#[test]
fn test_fault_is_reported_not_defaulted() {
    let mem = Recording::faulting();
    let err = read_member(
        &mem,
        Address::new(0xdead_0000),
        &scalar(TypeCategory::Int, 4, true, true),
    )
    .unwrap_err();

    assert!(matches!(err, QueryError::MemoryAccess { width: 4, .. }));
    assert!(err.is_per_read());
    assert_eq!(mem.reads.borrow().len(), 1);
}

#[test]
fn test_unsupported_descriptors_skip_memory() {
    let mem = Recording::new(&[0]);
    let a = Address::new(0x1000);
    let rejected = vec![
        scalar(TypeCategory::Int, 4, true, true).invalidated(),
        scalar(TypeCategory::Struct, 16, true, false),
        scalar(TypeCategory::Union, 8, true, false),
        scalar(TypeCategory::Enum, 4, true, false),
        scalar(TypeCategory::Func, 0, true, false),
        scalar(TypeCategory::Void, 0, true, false),
        scalar(TypeCategory::Int, 3, true, true),
        scalar(TypeCategory::Char, 2, true, true),
        scalar(TypeCategory::Float, 2, true, true),
        MemberDescriptor::array("a", 8, "int", TypeCategory::Int, 4).unwrap(),
    ];

    for rdt in &rejected {
        let err = read_member(&mem, a, rdt).unwrap_err();
        assert!(
            matches!(err, QueryError::UnsupportedType(_)),
            "{} should be unsupported",
            rdt
        );
    }
    assert!(mem.reads.borrow().is_empty());
}

#[test]
fn test_bitfields() {
    // storage 0b1011_0100: bits 2..5 hold 0b1101
    let mem = Recording::new(&[0b1011_0100, 0, 0, 0]);
    let a = Address::new(0);

    let mut unsigned = scalar(TypeCategory::Int, 4, true, false);
    unsigned.bitfield = Some(Bitfield {
        bit_position: 2,
        bit_length: 4,
    });
    assert_eq!(read_member(&mem, a, &unsigned).unwrap(), PrimitiveValue::UInt(0b1101));

    let mut signed = unsigned.clone();
    signed.is_signed = true;
    assert_eq!(read_member(&mem, a, &signed).unwrap(), PrimitiveValue::Int(-3));

    let mut flag = scalar(TypeCategory::Bool, 1, true, false);
    flag.bitfield = Some(Bitfield {
        bit_position: 2,
        bit_length: 1,
    });
    assert_eq!(read_member(&mem, a, &flag).unwrap(), PrimitiveValue::Bool(true));

    let mut overflow = unsigned.clone();
    overflow.bitfield = Some(Bitfield {
        bit_position: 30,
        bit_length: 4,
    });
    assert!(matches!(
        read_member(&mem, a, &overflow),
        Err(QueryError::UnsupportedType(_))
    ));
}

#[test]
fn test_typed_reader_struct_and_elements() {
    let mut bytes = vec![0u8; 16];
    bytes[0..4].copy_from_slice(&7u32.to_le_bytes());
    bytes[4..8].copy_from_slice(&(-2i32).to_le_bytes());
    bytes[8..12].copy_from_slice(&3u32.to_le_bytes());
    let mem = SnapshotMemory::new(GuestArchitecture::X64).with_region(Address::new(0x4000), bytes);

    let st = StructuredType::new("triple")
        .with_size(16)
        .with_member(scalar(TypeCategory::Int, 4, true, false).with_layout(0, 4))
        .with_member(
            MemberDescriptor::new("neg")
                .with_layout(4, 4)
                .with_category(TypeCategory::Int)
                .with_encoding(true, true),
        )
        .with_member(MemberDescriptor::array("arr", 8, "int", TypeCategory::Int, 4).unwrap());

    let reader = TypedReader::new(&mem);
    let results = reader.read_members(Address::new(0x4000), &st);
    assert_eq!(results[0].1.as_ref().unwrap(), &PrimitiveValue::UInt(7));
    assert_eq!(results[1].1.as_ref().unwrap(), &PrimitiveValue::Int(-2));
    assert!(matches!(results[2].1, Err(QueryError::UnsupportedType(_))));

    let element = scalar(TypeCategory::Int, 4, true, false);
    let elements = reader.read_elements(Address::new(0x4000), &element, 5);
    assert_eq!(elements.len(), 5);
    assert_eq!(elements[2].as_ref().unwrap(), &PrimitiveValue::UInt(3));
    assert!(matches!(elements[4], Err(QueryError::MemoryAccess { .. })));
}
