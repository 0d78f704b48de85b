use super::*;

fn prop_list(entries: &[&[u8]]) -> Vec<u8> {
    let mut buf = u32::try_from(entries.len()).unwrap().to_le_bytes().to_vec();
    for e in entries {
        buf.extend_from_slice(e);
    }
    buf
}

#[test]
fn test_scalar_values() -> Result<(), TnefError> {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0x0e, 0x00, 0x00, 0x00, // count
        0x01, 0x00, 0x01, 0x00, // [0] Null
        0x02, 0x00, 0x02, 0x00, // [1] Int16(-2)
        0xfe, 0xff, 0x00, 0x00,
        0x03, 0x00, 0x03, 0x00, // [2] Int32(0x1337acab)
        0xab, 0xac, 0x37, 0x13,
        0x04, 0x00, 0x04, 0x00, // [3] Float32(1234.5678)
        0x2b, 0x52, 0x9a, 0x44,
        0x05, 0x00, 0x05, 0x00, // [4] Float64(-1234.56789012345678)
        0xe0, 0x0f, 0xfd, 0x84, 0x45, 0x4a, 0x93, 0xc0,
        0x06, 0x00, 0x06, 0x00, // [5] Currency(1331200)
        0x00, 0x50, 0x14, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x07, 0x00, 0x07, 0x00, // [6] AppTime(2.5)
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x40,
        0x0b, 0x00, 0x08, 0x00, // [7] Bool(true)
        0x01, 0x00, 0x00, 0x00,
        0x0b, 0x00, 0x09, 0x00, // [8] Bool(false)
        0x00, 0x00, 0x00, 0x00,
        0x14, 0x00, 0x0a, 0x00, // [9] Int64(0x1337d00ddeadbeef)
        0xef, 0xbe, 0xad, 0xde, 0x0d, 0xd0, 0x37, 0x13,
        0x1e, 0x00, 0x0b, 0x00, // [10] String8("hello")
        0x01, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00,
        0x68, 0x65, 0x6c, 0x6c, 0x6f, 0x00, 0x00, 0x00,
        0x1f, 0x00, 0x0c, 0x00, // [11] Unicode("TNEF")
        0x01, 0x00, 0x00, 0x00, 0x08, 0x00, 0x00, 0x00,
        0x54, 0x00, 0x4e, 0x00, 0x45, 0x00, 0x46, 0x00,
        0x40, 0x00, 0x0d, 0x00, // [12] Time(1995-11-16 17:43:44)
        0x00, 0x88, 0xf9, 0x12, 0x4b, 0xb4, 0xba, 0x01,
        0x02, 0x01, 0x0e, 0x00, // [13] Binary([1, 2, 3])
        0x01, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00,
        0x01, 0x02, 0x03, 0x00,
    ];

    let props = PropertyList::parse(data)?;
    assert_eq!(props.len(), 14);
    assert_eq!(props.entries[0].value, PropertyValue::Null);
    assert_eq!(props.entries[0].value.kind(), "null");
    assert_eq!(props.entries[1].value, PropertyValue::Int16(-2));
    assert_eq!(props.as_int(0x0002), Some(-2));
    assert_eq!(props.entries[2].value, PropertyValue::Int32(0x1337acab));
    assert_eq!(props.entries[3].value, PropertyValue::Float32(1234.5678));
    assert_eq!(
        props.entries[4].value,
        PropertyValue::Float64(-1234.56789012345678)
    );
    assert_eq!(props.entries[5].value, PropertyValue::Currency(133_1200));
    assert_eq!(props.as_int(0x0006), Some(133_1200));
    assert_eq!(props.entries[6].value, PropertyValue::AppTime(2.5));
    assert_eq!(props.find(0x0007).unwrap().as_float(), Some(2.5));
    assert_eq!(props.as_bool(0x0008), Some(true));
    assert_eq!(props.as_bool(0x0009), Some(false));
    assert_eq!(props.entries[8].value.kind(), "bool");
    assert_eq!(
        props.entries[9].value,
        PropertyValue::Int64(0x1337d00ddeadbeef)
    );
    assert_eq!(
        props.entries[10].value,
        PropertyValue::String8(b"hello".to_vec())
    );
    assert_eq!(props.as_text(0x000b).unwrap(), "hello");
    assert_eq!(props.entries[11].value, PropertyValue::Unicode("TNEF".into()));
    assert_eq!(props.as_text(0x000c).unwrap(), "TNEF");
    assert_eq!(props.entries[11].value.kind(), "string");
    assert_eq!(
        props.entries[12].value,
        PropertyValue::Time(0x01bab44b12f98800)
    );
    assert_eq!(
        props.as_time(0x000d),
        Some(time::OffsetDateTime::new_utc(
            time::Date::from_calendar_date(1995, time::Month::November, 16).unwrap(),
            time::Time::from_hms(17, 43, 44).unwrap()
        ))
    );
    assert_eq!(props.entries[13].value, PropertyValue::Binary(vec![1, 2, 3]));
    assert_eq!(props.as_bytes(0x000e), Some([1u8, 2, 3].as_slice()));
    assert!(props.find(0xbeef).is_none());
    Ok(())
}

#[test]
fn test_clsid_and_object() -> Result<(), TnefError> {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0x02, 0x00, 0x00, 0x00,
        0x48, 0x00, 0x01, 0x00, // [0] Clsid
        0x53, 0xff, 0x4b, 0x99, 0xf9, 0xdd, 0xad, 0x42,
        0xa5, 0x6a, 0xff, 0xea, 0x36, 0x17, 0xac, 0x16,
        0x0d, 0x00, 0x02, 0x00, // [1] Object([0xca, 0xfe])
        0x01, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00,
        0xca, 0xfe, 0x00, 0x00,
    ];
    let props = PropertyList::parse(data)?;
    assert_eq!(props.len(), 2);
    match &props.entries[0].value {
        PropertyValue::Clsid(guid) => {
            assert_eq!(guid.to_string(), "994bff53-ddf9-42ad-a56a-ffea3617ac16")
        }
        other => panic!("Invalid property {:?}", other),
    }
    assert_eq!(props.entries[0].value.kind(), "guid");
    assert_eq!(props.entries[1].value, PropertyValue::Object(vec![0xca, 0xfe]));
    assert_eq!(props.entries[1].value.kind(), "object");
    Ok(())
}

#[test]
fn test_named_properties() -> Result<(), TnefError> {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0x03, 0x00, 0x00, 0x00,
        0x03, 0x00, 0x01, 0x80, // [0] named by number
        0x53, 0xff, 0x4b, 0x99, 0xf9, 0xdd, 0xad, 0x42,
        0xa5, 0x6a, 0xff, 0xea, 0x36, 0x17, 0xac, 0x16,
        0x00, 0x00, 0x00, 0x00, // numeric discriminator
        0x78, 0x56, 0x34, 0x12, // id
        0x2a, 0x00, 0x00, 0x00, // Int32(42)
        0x03, 0x00, 0x02, 0x80, // [1] named by string, odd byte length
        0x53, 0xff, 0x4b, 0x99, 0xf9, 0xdd, 0xad, 0x42,
        0xa5, 0x6a, 0xff, 0xea, 0x36, 0x17, 0xac, 0x16,
        0x01, 0x00, 0x00, 0x00, // string discriminator
        0x07, 0x00, 0x00, 0x00, // 7 bytes of name
        0x61, 0x00, 0x62, 0x00, 0x63, 0x00, 0x61, 0x00, // "abc" + odd byte + pad
        0x07, 0x00, 0x00, 0x00, // Int32(7)
        0x03, 0x00, 0x03, 0x00, // [2] plain id, must stay in sync
        0x2b, 0x00, 0x00, 0x00,
    ];
    let props = PropertyList::parse(data)?;
    assert_eq!(props.len(), 3);
    let name = props.entries[0].name.as_ref().unwrap();
    assert_eq!(
        name.guid.to_string(),
        "994bff53-ddf9-42ad-a56a-ffea3617ac16"
    );
    assert_eq!(name.id, NamedId::Number(0x12345678));
    assert_eq!(props.entries[0].value, PropertyValue::Int32(42));
    let name = props.entries[1].name.as_ref().unwrap();
    assert_eq!(name.id, NamedId::Name("abc".into()));
    assert_eq!(props.entries[1].value, PropertyValue::Int32(7));
    assert!(props.entries[2].name.is_none());
    assert_eq!(props.entries[2].value, PropertyValue::Int32(43));
    Ok(())
}

#[test]
fn test_multi_values() -> Result<(), TnefError> {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0x06, 0x00, 0x00, 0x00,
        0x02, 0x10, 0x01, 0x00, // [0] MultiInt16([1, 2, 3]) + block pad
        0x03, 0x00, 0x00, 0x00,
        0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x00, 0x00,
        0x03, 0x10, 0x02, 0x00, // [1] MultiInt32([-1, 7])
        0x02, 0x00, 0x00, 0x00,
        0xff, 0xff, 0xff, 0xff, 0x07, 0x00, 0x00, 0x00,
        0x0b, 0x10, 0x03, 0x00, // [2] MultiBool([true]) + block pad
        0x01, 0x00, 0x00, 0x00,
        0x05, 0x00, 0x00, 0x00,
        0x1e, 0x10, 0x04, 0x00, // [3] MultiString8(["ab", "c"])
        0x02, 0x00, 0x00, 0x00,
        0x03, 0x00, 0x00, 0x00, 0x61, 0x62, 0x00, 0x00,
        0x02, 0x00, 0x00, 0x00, 0x63, 0x00, 0x00, 0x00,
        0x1f, 0x10, 0x05, 0x00, // [4] MultiUnicode(["ab", "c"])
        0x02, 0x00, 0x00, 0x00,
        0x04, 0x00, 0x00, 0x00, 0x61, 0x00, 0x62, 0x00,
        0x02, 0x00, 0x00, 0x00, 0x63, 0x00, 0x00, 0x00,
        0x02, 0x11, 0x06, 0x00, // [5] MultiBinary([[0xaa], []])
        0x02, 0x00, 0x00, 0x00,
        0x01, 0x00, 0x00, 0x00, 0xaa, 0x00, 0x00, 0x00,
        0x00, 0x00, 0x00, 0x00,
    ];
    let props = PropertyList::parse(data)?;
    assert_eq!(props.len(), 6);
    assert_eq!(props.entries[0].value, PropertyValue::MultiInt16(vec![1, 2, 3]));
    assert_eq!(props.entries[0].count, 3);
    assert_eq!(props.entries[0].value.kind(), "int16");
    assert_eq!(props.entries[1].value, PropertyValue::MultiInt32(vec![-1, 7]));
    assert_eq!(props.entries[2].value, PropertyValue::MultiBool(vec![true]));
    assert_eq!(
        props.entries[3].value,
        PropertyValue::MultiString8(vec![b"ab".to_vec(), b"c".to_vec()])
    );
    assert_eq!(
        props.entries[4].value,
        PropertyValue::MultiUnicode(vec!["ab".into(), "c".into()])
    );
    assert_eq!(
        props.entries[5].value,
        PropertyValue::MultiBinary(vec![vec![0xaa], vec![]])
    );
    Ok(())
}

#[test]
fn test_multi_fixed_width() -> Result<(), TnefError> {
    #[rustfmt::skip]
    let data: &[u8] = &[
        0x02, 0x00, 0x00, 0x00,
        0x40, 0x10, 0x01, 0x00, // [0] MultiTime
        0x02, 0x00, 0x00, 0x00,
        0x00, 0x88, 0xf9, 0x12, 0x4b, 0xb4, 0xba, 0x01,
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x48, 0x10, 0x02, 0x00, // [1] MultiClsid
        0x01, 0x00, 0x00, 0x00,
        0x53, 0xff, 0x4b, 0x99, 0xf9, 0xdd, 0xad, 0x42,
        0xa5, 0x6a, 0xff, 0xea, 0x36, 0x17, 0xac, 0x16,
    ];
    let props = PropertyList::parse(data)?;
    assert_eq!(
        props.entries[0].value,
        PropertyValue::MultiTime(vec![0x01bab44b12f98800, 0])
    );
    match &props.entries[1].value {
        PropertyValue::MultiClsid(guids) => {
            assert_eq!(guids.len(), 1);
            assert_eq!(
                guids[0].to_string(),
                "994bff53-ddf9-42ad-a56a-ffea3617ac16"
            );
        }
        other => panic!("Invalid property {:?}", other),
    }
    Ok(())
}

#[test]
fn test_scalar_count_mismatch() -> Result<(), TnefError> {
    // A scalar sized type declaring two elements consumes both and
    // decodes to an empty value
    #[rustfmt::skip]
    let data: &[u8] = &[
        0x02, 0x00, 0x00, 0x00,
        0x02, 0x01, 0x01, 0x00,
        0x02, 0x00, 0x00, 0x00,
        0x01, 0x00, 0x00, 0x00, 0xaa, 0x00, 0x00, 0x00,
        0x01, 0x00, 0x00, 0x00, 0xbb, 0x00, 0x00, 0x00,
        0x03, 0x00, 0x02, 0x00,
        0x2a, 0x00, 0x00, 0x00,
    ];
    let props = PropertyList::parse(data)?;
    assert_eq!(props.len(), 2);
    assert_eq!(props.entries[0].value, PropertyValue::Binary(Vec::new()));
    assert_eq!(props.entries[0].count, 2);
    assert_eq!(props.entries[1].value, PropertyValue::Int32(42));
    Ok(())
}

#[test]
fn test_missing_trailing_pad() -> Result<(), TnefError> {
    // The last element may be emitted without its trailing pad
    let mut entry = vec![0x1e, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00];
    entry.extend_from_slice(&[0x03, 0x00, 0x00, 0x00]);
    entry.extend_from_slice(b"abc");
    let data = prop_list(&[&entry]);
    let props = PropertyList::parse(&data)?;
    assert_eq!(props.entries[0].value, PropertyValue::String8(b"abc".to_vec()));
    Ok(())
}

#[test]
fn test_declared_count_not_trusted() -> Result<(), TnefError> {
    // 99 declared, 1 present
    let data: &[u8] = &[
        0x63, 0x00, 0x00, 0x00, 0x03, 0x00, 0x01, 0x00, 0x2a, 0x00, 0x00, 0x00,
    ];
    let props = PropertyList::parse(data)?;
    assert_eq!(props.len(), 1);
    // count only, no entries
    let props = PropertyList::parse(&[0x05, 0x00, 0x00, 0x00])?;
    assert!(props.is_empty());
    Ok(())
}

#[test]
fn test_unknown_tag_types() {
    for tag_type in [0x2003u16, 0x8003, 0x000au16, 0x1001, 0x0fff] {
        let mut data = vec![0x01, 0x00, 0x00, 0x00];
        data.extend_from_slice(&tag_type.to_le_bytes());
        data.extend_from_slice(&[0x01, 0x00, 0xff, 0xff, 0xff, 0xff]);
        match PropertyList::parse(&data) {
            Err(TnefError::UnknownTagType(t)) => assert_eq!(t, tag_type),
            other => panic!("Unexpected result for {:04x}: {:?}", tag_type, other),
        }
    }
}

#[test]
fn test_truncations() {
    let cases: &[&[u8]] = &[
        // entry header cut short
        &[0x01, 0x00, 0x00, 0x00, 0x03, 0x00],
        // fixed value cut short
        &[0x01, 0x00, 0x00, 0x00, 0x03, 0x00, 0x01, 0x00, 0x2a, 0x00],
        // named-property guid cut short
        &[
            0x01, 0x00, 0x00, 0x00, 0x03, 0x00, 0x01, 0x80, 0x53, 0xff, 0x4b, 0x99,
        ],
        // declared element length exceeds the blob
        &[
            0x01, 0x00, 0x00, 0x00, 0x02, 0x01, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00,
            0xff, 0xff, 0xff, 0x7f, 0xaa,
        ],
        // multi element list cut short
        &[
            0x01, 0x00, 0x00, 0x00, 0x03, 0x10, 0x01, 0x00, 0x04, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00,
        ],
    ];
    for (n, data) in cases.iter().enumerate() {
        match PropertyList::parse(data) {
            Err(TnefError::Truncated) => {}
            other => panic!("Unexpected result for case {}: {:?}", n, other),
        }
    }
}

#[test]
fn test_too_short() {
    for data in [[].as_slice(), &[0x01], &[0x01, 0x00, 0x00]] {
        assert!(matches!(
            PropertyList::parse(data),
            Err(TnefError::PropertyListTooShort)
        ));
    }
}
