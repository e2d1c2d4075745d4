use slate_common::{ErrorClass, result::Result};

use crate::{
    FlatTable, MAX_FIELD_COUNT, Offset, OwnedRoot, buffer_has_identifier,
    builder::Builder,
    defs::daemon::{GetVersionResponse, OpenResponse, OpenResponseArgs},
    offset::AnyTable,
    options::BuilderOptions,
    root, root_table, size_prefixed_root_table,
    table::Table,
};

fn open_response(builder: &mut Builder, success: u8, error_msg: Option<&str>) -> Vec<u8> {
    let error_msg = error_msg.map(|s| builder.create_string(s)).transpose().unwrap();
    let root_offset = OpenResponse::create(
        builder,
        &OpenResponseArgs {
            success,
            error_msg,
        },
    )
    .unwrap();
    builder.finish(root_offset, None).unwrap().to_vec()
}

#[test]
fn test_open_response_success_with_message() {
    let mut builder = Builder::new();
    let s = builder.create_string("ok").unwrap();
    builder.start_object(2).unwrap();
    builder.add_scalar(0, 1u8, 0).unwrap();
    builder.add_offset(1, s).unwrap();
    let root_offset = builder.end_object().unwrap();
    let buf = builder.finish(root_offset, None).unwrap();

    let response = root::<OpenResponse>(buf).unwrap();
    assert_eq!(response.success().unwrap(), 1);
    assert_eq!(response.error_msg().unwrap(), Some("ok"));
}

#[test]
fn test_open_response_defaults_only() {
    let mut builder = Builder::new();
    builder.start_object(2).unwrap();
    builder.add_scalar(0, 0u8, 0).unwrap();
    let root_offset = builder.end_object().unwrap();
    let buf = builder.finish(root_offset, None).unwrap();

    let response = root::<OpenResponse>(buf).unwrap();
    let table = response.as_table();
    assert!(!table.has_field(OpenResponse::VT_ERROR_MSG));
    assert!(!table.has_field(OpenResponse::VT_SUCCESS));
    assert_eq!(response.success().unwrap(), 0);
    assert_eq!(response.error_msg().unwrap(), None);
    assert_eq!(response.error_msg_bytes().unwrap(), None);
}

#[test]
fn test_default_elision_is_byte_identical() {
    let build = |write_default: bool| {
        let mut builder = Builder::new();
        let s = builder.create_string("payload").unwrap();
        builder.start_object(3).unwrap();
        if write_default {
            builder.add_scalar(0, 0u32, 0).unwrap();
            builder.add_scalar(2, 1.5f64, 1.5).unwrap();
        }
        builder.add_offset(1, s).unwrap();
        let root_offset = builder.end_object().unwrap();
        builder.finish(root_offset, None).unwrap().to_vec()
    };
    assert_eq!(build(true), build(false));
}

#[test]
fn test_force_defaults_writes_fields() {
    let options = BuilderOptions::default().with_force_defaults(true);
    let mut forced = Builder::with_options(options);
    let forced_buf = open_response(&mut forced, 0, None);
    let mut plain = Builder::new();
    let plain_buf = open_response(&mut plain, 0, None);

    assert_ne!(forced_buf, plain_buf);
    let response = root::<OpenResponse>(&forced_buf).unwrap();
    assert!(response.as_table().has_field(OpenResponse::VT_SUCCESS));
    assert_eq!(response.success().unwrap(), 0);
}

#[test]
fn test_round_trip_random_scalars() {
    #[derive(Debug, Clone, Copy)]
    enum Value {
        U8(u8),
        I16(i16),
        U32(u32),
        I64(i64),
        F32(f32),
        F64(f64),
        Bool(bool),
    }

    fn random_value() -> Value {
        match fastrand::u8(0..7) {
            0 => Value::U8(fastrand::u8(..)),
            1 => Value::I16(fastrand::i16(..)),
            2 => Value::U32(fastrand::u32(..)),
            3 => Value::I64(fastrand::i64(..)),
            4 => Value::F32(fastrand::f32()),
            5 => Value::F64(fastrand::f64()),
            _ => Value::Bool(fastrand::bool()),
        }
    }

    for _ in 0..50 {
        let field_count = fastrand::u16(1..40);
        let values: Vec<Option<Value>> = (0..field_count)
            .map(|_| fastrand::bool().then(random_value))
            .collect();

        let mut builder = Builder::new();
        builder.start_object(field_count).unwrap();
        for (slot, value) in values.iter().enumerate() {
            let slot = slot as u16;
            let written = match *value {
                Some(Value::U8(v)) => builder.add_scalar_opt(slot, Some(v)),
                Some(Value::I16(v)) => builder.add_scalar_opt(slot, Some(v)),
                Some(Value::U32(v)) => builder.add_scalar_opt(slot, Some(v)),
                Some(Value::I64(v)) => builder.add_scalar_opt(slot, Some(v)),
                Some(Value::F32(v)) => builder.add_scalar_opt(slot, Some(v)),
                Some(Value::F64(v)) => builder.add_scalar_opt(slot, Some(v)),
                Some(Value::Bool(v)) => builder.add_scalar_opt(slot, Some(v)),
                None => builder.add_scalar_opt::<u8>(slot, None),
            };
            written.unwrap();
        }
        let root_offset = builder.end_object().unwrap();
        let buf = builder.finish(root_offset, None).unwrap();

        let table = root_table(buf).unwrap();
        for (slot, value) in values.iter().enumerate() {
            let slot = slot as u16;
            assert_eq!(table.has_field(slot), value.is_some());
            match *value {
                Some(Value::U8(v)) => assert_eq!(table.field_opt::<u8>(slot).unwrap(), Some(v)),
                Some(Value::I16(v)) => {
                    assert_eq!(table.field_opt::<i16>(slot).unwrap(), Some(v))
                }
                Some(Value::U32(v)) => {
                    assert_eq!(table.field_opt::<u32>(slot).unwrap(), Some(v))
                }
                Some(Value::I64(v)) => {
                    assert_eq!(table.field_opt::<i64>(slot).unwrap(), Some(v))
                }
                Some(Value::F32(v)) => {
                    assert_eq!(table.field::<f32>(slot, 0.0).unwrap().to_bits(), v.to_bits())
                }
                Some(Value::F64(v)) => {
                    assert_eq!(table.field::<f64>(slot, 0.0).unwrap().to_bits(), v.to_bits())
                }
                Some(Value::Bool(v)) => {
                    assert_eq!(table.field_opt::<bool>(slot).unwrap(), Some(v))
                }
                None => assert_eq!(table.field::<u64>(slot, 99).unwrap(), 99),
            }
        }
    }
}

#[test]
fn test_vtable_dedup_shares_location() {
    const N: u32 = 10;
    let mut builder = Builder::new();
    let mut items = Vec::new();
    for i in 1..=N {
        builder.start_object(2).unwrap();
        builder.add_scalar(0, i, 0).unwrap();
        builder.add_scalar(1, i * 10, 0).unwrap();
        items.push(builder.end_object().unwrap());
    }
    let stats = builder.vtable_stats();
    assert_eq!(stats.written, 1);
    assert_eq!(stats.reused, N as usize - 1);

    let list = builder.create_vector_of_offsets(&items).unwrap();
    builder.start_object(1).unwrap();
    builder.add_offset(0, list).unwrap();
    let root_offset = builder.end_object().unwrap();
    let buf = builder.finish(root_offset, None).unwrap();

    let tables = root_table(buf)
        .unwrap()
        .vector::<Offset<AnyTable>>(0)
        .unwrap()
        .unwrap();
    assert_eq!(tables.len(), N as usize);
    let first_vtable = tables.get(0).unwrap().vtable().loc();
    for (i, table) in tables.iter().enumerate() {
        let table = table.unwrap();
        assert_eq!(table.vtable().loc(), first_vtable);
        assert_eq!(table.field::<u32>(0, 0).unwrap(), i as u32 + 1);
        assert_eq!(table.field::<u32>(1, 0).unwrap(), (i as u32 + 1) * 10);
    }
}

const SMALL_OBJECT_COUNT: u8 = 6;

/// Writes `SMALL_OBJECT_COUNT` objects filled by `add_fields` into a list held
/// by the root, checking that the builder emitted a single vtable for them.
fn build_object_list(
    field_count: u16,
    add_fields: impl Fn(&mut Builder, u8) -> Result<()>,
) -> Vec<u8> {
    let mut builder = Builder::new();
    let mut items = Vec::new();
    for i in 1..=SMALL_OBJECT_COUNT {
        builder.start_object(field_count).unwrap();
        add_fields(&mut builder, i).unwrap();
        items.push(builder.end_object().unwrap());
    }
    let stats = builder.vtable_stats();
    assert_eq!(stats.written, 1);
    assert_eq!(stats.reused, SMALL_OBJECT_COUNT as usize - 1);

    let list = builder.create_vector_of_offsets(&items).unwrap();
    builder.start_object(1).unwrap();
    builder.add_offset(0, list).unwrap();
    let root_offset = builder.end_object().unwrap();
    builder.finish(root_offset, None).unwrap().to_vec()
}

/// The tables of the root's list, after checking that they share one vtable.
fn object_list(buf: &[u8]) -> Vec<Table<'_>> {
    let tables = root_table(buf)
        .unwrap()
        .vector::<Offset<AnyTable>>(0)
        .unwrap()
        .unwrap()
        .iter()
        .collect::<Result<Vec<_>>>()
        .unwrap();
    assert_eq!(tables.len(), SMALL_OBJECT_COUNT as usize);
    let first_vtable = tables[0].vtable().loc();
    assert!(tables.iter().all(|t| t.vtable().loc() == first_vtable));
    tables
}

#[test]
fn test_vtable_dedup_small_fields() {
    let buf = build_object_list(1, |builder, i| builder.add_scalar(0, i, 0));
    for (i, table) in object_list(&buf).iter().enumerate() {
        assert_eq!(table.field::<u8>(0, 0).unwrap(), i as u8 + 1);
    }

    let buf = build_object_list(1, |builder, i| builder.add_scalar_opt(0, Some(i % 2 == 0)));
    for (i, table) in object_list(&buf).iter().enumerate() {
        assert_eq!(table.field_opt::<bool>(0).unwrap(), Some(i % 2 == 1));
    }

    let buf = build_object_list(2, |builder, i| {
        builder.add_scalar(0, i, 0)?;
        builder.add_scalar(1, u16::from(i) * 300, 0)
    });
    for (i, table) in object_list(&buf).iter().enumerate() {
        let i = i as u8 + 1;
        assert_eq!(table.field::<u8>(0, 0).unwrap(), i);
        assert_eq!(table.field::<u16>(1, 0).unwrap(), u16::from(i) * 300);
    }
}

#[test]
fn test_field_order_does_not_change_layout() {
    let mut builder = Builder::new();
    builder.start_object(3).unwrap();
    builder.add_scalar(0, 1u8, 0).unwrap();
    builder.add_scalar(1, 2u64, 0).unwrap();
    builder.add_scalar(2, 3u16, 0).unwrap();
    let first = builder.end_object().unwrap();
    builder.start_object(3).unwrap();
    builder.add_scalar(2, 3u16, 0).unwrap();
    builder.add_scalar(0, 1u8, 0).unwrap();
    builder.add_scalar(1, 2u64, 0).unwrap();
    let second = builder.end_object().unwrap();
    assert_eq!(builder.vtable_stats().written, 1);

    let root_offset = builder.create_vector_of_offsets(&[first, second]).unwrap();
    builder.start_object(1).unwrap();
    builder.add_offset(0, root_offset).unwrap();
    let root_offset = builder.end_object().unwrap();
    let buf = builder.finish(root_offset, None).unwrap();
    let tables = root_table(buf)
        .unwrap()
        .vector::<Offset<AnyTable>>(0)
        .unwrap()
        .unwrap();
    for table in tables.iter() {
        let table = table.unwrap();
        assert_eq!(table.field::<u8>(0, 0).unwrap(), 1);
        assert_eq!(table.field::<u64>(1, 0).unwrap(), 2);
        assert_eq!(table.field::<u16>(2, 0).unwrap(), 3);
        // The u64 sits 8-byte aligned in the finished buffer.
        assert_eq!((table.loc() + table.vtable().entry(1) as usize) % 8, 0);
    }
}

#[test]
fn test_vtable_dedup_disabled() {
    let options = BuilderOptions::default().with_dedup_vtables(false);
    let mut builder = Builder::with_options(options);
    for i in 1..=4u16 {
        builder.start_object(1).unwrap();
        builder.add_scalar(0, i, 0).unwrap();
        builder.end_object().unwrap();
    }
    let stats = builder.vtable_stats();
    assert_eq!(stats.written, 4);
    assert_eq!(stats.reused, 0);
}

#[test]
fn test_schema_evolution() {
    // Old writer knows a single field.
    let mut builder = Builder::new();
    builder.start_object(1).unwrap();
    builder.add_scalar(0, 7u32, 0).unwrap();
    let root_offset = builder.end_object().unwrap();
    let old = builder.finish(root_offset, None).unwrap().to_vec();

    // New reader knows four.
    let table = root_table(&old).unwrap();
    assert_eq!(table.field::<u32>(0, 0).unwrap(), 7);
    assert_eq!(table.field::<u16>(1, 11).unwrap(), 11);
    assert_eq!(table.string(2).unwrap(), None);
    assert!(table.table(3).unwrap().is_none());

    // New writer, old reader.
    let mut builder = Builder::new();
    let note = builder.create_string("added later").unwrap();
    builder.start_object(4).unwrap();
    builder.add_scalar(0, 8u32, 0).unwrap();
    builder.add_scalar(1, 12u16, 11).unwrap();
    builder.add_offset(2, note).unwrap();
    let root_offset = builder.end_object().unwrap();
    let new = builder.finish(root_offset, None).unwrap();
    assert_eq!(root_table(new).unwrap().field::<u32>(0, 0).unwrap(), 8);
}

#[test]
fn test_vectors_round_trip() {
    let mut builder = Builder::new();
    let numbers = builder.create_vector(&[3u64, 1, 4, 1, 5, 9]).unwrap();
    let flags = builder.create_vector(&[true, false, true]).unwrap();
    let names = builder.create_vector_of_strings(&["alpha", "", "gamma"]).unwrap();
    let blob = builder.create_byte_string(&[0xff, 0x00, 0x80]).unwrap();
    let empty = builder.create_vector::<i32>(&[]).unwrap();

    builder.start_vector(3, 2, 2).unwrap();
    for v in [30i16, 20, 10] {
        builder.push_element(v).unwrap();
    }
    let manual = builder.end_vector::<i16>().unwrap();

    builder.start_object(6).unwrap();
    builder.add_offset(0, numbers).unwrap();
    builder.add_offset(1, flags).unwrap();
    builder.add_offset(2, names).unwrap();
    builder.add_offset(3, blob).unwrap();
    builder.add_offset(4, empty).unwrap();
    builder.add_offset(5, manual).unwrap();
    let root_offset = builder.end_object().unwrap();
    let buf = builder.finish(root_offset, None).unwrap();

    let table = root_table(buf).unwrap();
    let numbers = table.vector::<u64>(0).unwrap().unwrap();
    assert_eq!(numbers.to_vec().unwrap(), [3, 1, 4, 1, 5, 9]);
    if cfg!(target_endian = "little") {
        assert_eq!(numbers.as_slice(), Some(&[3u64, 1, 4, 1, 5, 9][..]));
    }

    let flags = table.vector::<bool>(1).unwrap().unwrap();
    assert_eq!(flags.to_vec().unwrap(), [true, false, true]);

    let names = table.vector::<Offset<str>>(2).unwrap().unwrap();
    assert_eq!(names.to_vec().unwrap(), ["alpha", "", "gamma"]);

    assert_eq!(table.bytes(3).unwrap(), Some(&[0xff, 0x00, 0x80][..]));
    // Not valid UTF-8, so the string view fails while the byte view works.
    assert_eq!(table.string(3).unwrap_err().class(), ErrorClass::Format);

    let empty = table.vector::<i32>(4).unwrap().unwrap();
    assert!(empty.is_empty());
    assert_eq!(empty.iter().count(), 0);

    // Elements are pushed last to first.
    let manual = table.vector::<i16>(5).unwrap().unwrap();
    assert_eq!(manual.to_vec().unwrap(), [10, 20, 30]);
}

#[test]
fn test_nested_tables_and_table_vectors() {
    let mut builder = Builder::new();
    let mut responses = Vec::new();
    for version in ["1.0", "2.0", "3.0"] {
        let s = builder.create_shared_string(version).unwrap();
        responses.push(GetVersionResponse::create(&mut builder, Some(s)).unwrap());
    }
    let list = builder.create_vector_of_offsets(&responses).unwrap();
    let child = {
        let s = builder.create_shared_string("2.0").unwrap();
        GetVersionResponse::create(&mut builder, Some(s)).unwrap()
    };
    builder.start_object(2).unwrap();
    builder.add_offset(0, child).unwrap();
    builder.add_offset(1, list).unwrap();
    let root_offset = builder.end_object().unwrap();
    let buf = builder.finish(root_offset, None).unwrap();

    let table = root_table(buf).unwrap();
    let child = table.table(0).unwrap().map(GetVersionResponse::from_table).unwrap();
    assert_eq!(child.version().unwrap(), Some("2.0"));

    let versions = table
        .vector::<Offset<AnyTable>>(1)
        .unwrap()
        .unwrap()
        .tables::<GetVersionResponse>()
        .map(|r| r.and_then(|r| r.version()).map(|v| v.unwrap_or_default()))
        .collect::<Result<Vec<_>>>()
        .unwrap();
    assert_eq!(versions, ["1.0", "2.0", "3.0"]);
}

/// A table that exposes its nested tables through the provided trait methods.
struct Envelope<'a> {
    table: Table<'a>,
}

impl<'a> FlatTable<'a> for Envelope<'a> {
    const FIELD_COUNT: u16 = 4;

    fn from_table(table: Table<'a>) -> Self {
        Envelope { table }
    }

    fn as_table(&self) -> Table<'a> {
        self.table
    }
}

#[test]
fn test_unions() {
    const RESPONSE_GET_VERSION: u8 = 1;

    let mut builder = Builder::new();
    let version = builder.create_string("4.1").unwrap();
    let payload = GetVersionResponse::create(&mut builder, Some(version)).unwrap();
    let items = builder.create_vector_of_offsets(&[payload]).unwrap();
    builder.start_object(Envelope::FIELD_COUNT).unwrap();
    builder.add_scalar(0, RESPONSE_GET_VERSION, 0).unwrap();
    builder.add_offset(1, payload).unwrap();
    builder.add_offset(3, items).unwrap();
    let root_offset = builder.end_object().unwrap();
    let buf = builder.finish(root_offset, None).unwrap();

    let envelope = root::<Envelope>(buf).unwrap();
    let (tag, value) = envelope.as_table().union(0, 1).unwrap().unwrap();
    assert_eq!(tag, RESPONSE_GET_VERSION);
    assert_eq!(
        GetVersionResponse::from_table(value).version().unwrap(),
        Some("4.1")
    );
    let nested: GetVersionResponse = envelope.read_table(1).unwrap().unwrap();
    assert_eq!(nested.version().unwrap(), Some("4.1"));
    assert_eq!(envelope.read_tables::<GetVersionResponse>(3).unwrap().unwrap().len(), 1);
    assert!(envelope.read_tables::<GetVersionResponse>(2).unwrap().is_none());

    // NONE tag.
    builder.reset();
    builder.start_object(2).unwrap();
    let root_offset = builder.end_object().unwrap();
    let buf = builder.finish(root_offset, None).unwrap();
    assert!(root_table(buf).unwrap().union(0, 1).unwrap().is_none());

    // Tag without a value.
    builder.reset();
    builder.start_object(2).unwrap();
    builder.add_scalar(0, RESPONSE_GET_VERSION, 0).unwrap();
    let root_offset = builder.end_object().unwrap();
    let buf = builder.finish(root_offset, None).unwrap();
    let err = root_table(buf).unwrap().union(0, 1).unwrap_err();
    assert!(err.is_format_error());
}

#[test]
fn test_identifier_and_size_prefix() {
    let mut builder = Builder::new();
    let msg = builder.create_string("id").unwrap();
    let root_offset = OpenResponse::create(
        &mut builder,
        &OpenResponseArgs {
            success: 1,
            error_msg: Some(msg),
        },
    )
    .unwrap();
    let buf = builder.finish_size_prefixed(root_offset, Some(b"MBD2")).unwrap();

    let size = u32::from_le_bytes(buf[..4].try_into().unwrap()) as usize;
    assert_eq!(size, buf.len() - 4);
    assert!(buffer_has_identifier(buf, b"MBD2", true));
    assert!(!buffer_has_identifier(buf, b"MBD2", false));

    let response = OpenResponse::from_table(size_prefixed_root_table(buf).unwrap());
    assert_eq!(response.success().unwrap(), 1);
    assert_eq!(response.error_msg().unwrap(), Some("id"));

    let mut builder = Builder::new();
    let root_offset = GetVersionResponse::create(&mut builder, None).unwrap();
    let buf = builder.finish(root_offset, Some(b"MBD2")).unwrap();
    assert!(buffer_has_identifier(buf, b"MBD2", false));
    assert!(GetVersionResponse::root(buf).is_ok());
}

#[test]
fn test_field_count_limit() {
    let mut builder = Builder::new();
    builder.start_object(MAX_FIELD_COUNT).unwrap();
    builder.add_scalar(MAX_FIELD_COUNT - 1, 1u8, 0).unwrap();
    let root_offset = builder.end_object().unwrap();
    let buf = builder.finish(root_offset, None).unwrap();
    let table = root_table(buf).unwrap();
    assert_eq!(table.vtable().slot_count(), MAX_FIELD_COUNT as usize);
    assert_eq!(table.field::<u8>(MAX_FIELD_COUNT - 1, 0).unwrap(), 1);

    let mut builder = Builder::new();
    assert!(builder.start_object(MAX_FIELD_COUNT + 1).unwrap_err().is_state_error());
}

/// Reads everything reachable from a sample message layout, ignoring errors.
fn walk(buf: &[u8]) -> Result<()> {
    let table = root_table(buf)?;
    table.field::<u64>(0, 0)?;
    table.string(1)?;
    if let Some(numbers) = table.vector::<u32>(2)? {
        for n in numbers.iter() {
            n?;
        }
        let _ = numbers.as_slice();
    }
    if let Some(names) = table.vector::<Offset<str>>(3)? {
        for name in names {
            name?;
        }
    }
    if let Some(child) = table.table(4)? {
        GetVersionResponse::from_table(child).verify()?;
    }
    table.union(5, 4)?;
    table.bytes(1)?;
    Ok(())
}

fn sample_message() -> Vec<u8> {
    let mut builder = Builder::new();
    let text = builder.create_string("corruption target").unwrap();
    let numbers = builder.create_vector(&[1u32, 2, 3, 4, 5]).unwrap();
    let names = builder.create_vector_of_strings(&["a", "bb", "ccc"]).unwrap();
    let version = builder.create_string("1.2.3").unwrap();
    let child = GetVersionResponse::create(&mut builder, Some(version)).unwrap();
    builder.start_object(6).unwrap();
    builder.add_scalar(0, u64::MAX, 0).unwrap();
    builder.add_offset(1, text).unwrap();
    builder.add_offset(2, numbers).unwrap();
    builder.add_offset(3, names).unwrap();
    builder.add_offset(4, child).unwrap();
    builder.add_scalar(5, 1u8, 0).unwrap();
    let root_offset = builder.end_object().unwrap();
    builder.finish(root_offset, None).unwrap().to_vec()
}

#[test]
fn test_corrupted_buffers_never_panic() {
    let original = sample_message();
    walk(&original).unwrap();

    for _ in 0..2000 {
        let mut buf = original.clone();
        for _ in 0..fastrand::usize(1..8) {
            let pos = fastrand::usize(..buf.len());
            buf[pos] = fastrand::u8(..);
        }
        let _ = walk(&buf);
    }

    for len in 0..original.len() {
        let _ = walk(&original[..len]);
    }

    for _ in 0..500 {
        let len = fastrand::usize(0..64);
        let garbage: Vec<u8> = (0..len).map(|_| fastrand::u8(..)).collect();
        let _ = walk(&garbage);
    }
}

#[test]
fn test_truncated_buffer_reports_format_error() {
    let original = sample_message();
    for len in 0..crate::MIN_BUFFER_SIZE {
        let err = root_table(&original[..len]).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Format);
    }
}

#[test]
fn test_owned_root_concurrent_readers() {
    let mut builder = Builder::new();
    let msg = builder.create_string("shared across threads").unwrap();
    let root_offset = OpenResponse::create(
        &mut builder,
        &OpenResponseArgs {
            success: 1,
            error_msg: Some(msg),
        },
    )
    .unwrap();
    builder.finish(root_offset, None).unwrap();
    let owned = builder.into_owned_root().unwrap();

    std::thread::scope(|s| {
        for _ in 0..8 {
            let owned = owned.clone();
            s.spawn(move || {
                for _ in 0..100 {
                    let response = owned.get::<OpenResponse>();
                    assert_eq!(response.success().unwrap(), 1);
                    assert_eq!(
                        response.error_msg().unwrap(),
                        Some("shared across threads")
                    );
                }
            });
        }
    });

    let bytes = owned.into_bytes();
    let reopened = OwnedRoot::new(bytes.clone()).unwrap();
    assert_eq!(reopened.bytes(), &bytes);
}

#[test]
fn test_builder_reuse_across_messages() {
    let mut builder = Builder::with_capacity(8);
    let first = open_response(&mut builder, 1, Some("first"));
    builder.reset();
    let second = open_response(&mut builder, 0, Some("second"));
    builder.reset();
    let again = open_response(&mut builder, 1, Some("first"));

    assert_eq!(first, again);
    let response = root::<OpenResponse>(&second).unwrap();
    assert_eq!(response.error_msg().unwrap(), Some("second"));
}

#[test]
fn test_typed_offsets_from_adapters() {
    let mut builder = Builder::new();
    let root_offset: Offset<OpenResponse<'static>> =
        OpenResponse::create(&mut builder, &OpenResponseArgs::default()).unwrap();
    let any: Offset<AnyTable> = root_offset.cast();
    assert_eq!(any.value(), root_offset.value());
    let buf = builder.finish(any, None).unwrap();
    assert_eq!(root::<OpenResponse>(buf).unwrap().success().unwrap(), 0);
}
