use cardano_cbor::reader::{PeekState, Reader};
use cardano_cbor::writer::Writer;

#[test]
fn decodes_million_as_five_bytes() {
    let bytes = hex::decode("1A000F4240").unwrap();
    let mut reader = Reader::from_bytes(&bytes).unwrap();
    assert_eq!(reader.read_uint().unwrap(), 1_000_000);
}

#[test]
fn encodes_million_as_five_bytes() {
    let mut writer = Writer::new();
    writer.write_uint(1_000_000);
    assert_eq!(writer.encode_hex(), "1a000f4240");
}

#[test]
fn small_array_round_trips() {
    let bytes = hex::decode("820102").unwrap();
    let mut reader = Reader::from_bytes(&bytes).unwrap();

    assert_eq!(reader.peek_state().unwrap(), PeekState::StartArray);
    let len = reader.read_start_array().unwrap();
    assert_eq!(len, 2);
    assert_eq!(reader.read_uint().unwrap(), 1);
    assert_eq!(reader.read_uint().unwrap(), 2);
    reader.read_end_array().unwrap();

    let mut writer = Writer::new();
    writer.write_start_array(2);
    writer.write_uint(1);
    writer.write_uint(2);
    assert_eq!(writer.encode(), bytes);
}

#[test]
fn indefinite_bytestring_concatenates_chunks() {
    let bytes = hex::decode("5F42010243030405FF").unwrap();
    let mut reader = Reader::from_bytes(&bytes).unwrap();
    let decoded = reader.read_bytestring().unwrap();
    assert_eq!(decoded, vec![0x01, 0x02, 0x03, 0x04, 0x05]);
}

#[test]
fn half_float_known_values() {
    let mut reader = Reader::from_bytes(&hex::decode("F93C00").unwrap()).unwrap();
    assert_eq!(reader.read_double().unwrap(), 1.0);

    let mut reader = Reader::from_bytes(&hex::decode("F97C00").unwrap()).unwrap();
    assert_eq!(reader.read_double().unwrap(), f64::INFINITY);

    let mut reader = Reader::from_bytes(&hex::decode("F90001").unwrap()).unwrap();
    let v = reader.read_double().unwrap();
    assert!((v - 5.960_464_5e-8).abs() < 1e-12);
}

#[test]
fn map_key_missing_value_is_detected() {
    // a2 01 02 03 (declares two pairs, but only three scalars follow)
    let bytes = hex::decode("A2010203").unwrap();
    let mut reader = Reader::from_bytes(&bytes).unwrap();
    reader.read_start_map().unwrap();
    reader.read_uint().unwrap();
    reader.read_uint().unwrap();
    reader.read_uint().unwrap();
    let err = reader.read_end_map().unwrap_err();
    assert!(err.to_string().contains("Key missing value"));
}

#[test]
fn peek_state_is_idempotent() {
    let bytes = hex::decode("820102").unwrap();
    let mut reader = Reader::from_bytes(&bytes).unwrap();
    let a = reader.peek_state().unwrap();
    let b = reader.peek_state().unwrap();
    assert_eq!(a, b);
    // peeking did not consume anything
    assert_eq!(reader.bytes_remaining(), bytes.len());
}

#[test]
fn tag_without_value_fails() {
    // tag 2 immediately followed by end of an enclosing definite array
    let bytes = hex::decode("81C2").unwrap();
    let mut reader = Reader::from_bytes(&bytes).unwrap();
    reader.read_start_array().unwrap();
    reader.read_tag().unwrap();
    let err = reader.read_end_array().unwrap_err();
    assert!(err.to_string().contains("Tag not followed by value"));
}

#[test]
fn bignum_round_trips_negative() {
    use num_bigint::BigInt;

    let mut writer = Writer::new();
    let value = BigInt::from(-300);
    writer.write_bignum(&value);

    let mut reader = Reader::from_bytes(&writer.encode()).unwrap();
    assert_eq!(reader.read_bignum().unwrap(), value);
}

#[test]
fn skip_value_skips_nested_containers() {
    // [1, [2, 3], {4: 5}]
    let mut writer = Writer::new();
    writer.write_start_array(3);
    writer.write_uint(1);
    writer.write_start_array(2);
    writer.write_uint(2);
    writer.write_uint(3);
    writer.write_start_map(1);
    writer.write_uint(4);
    writer.write_uint(5);

    let bytes = writer.encode();
    let mut reader = Reader::from_bytes(&bytes).unwrap();
    reader.read_start_array().unwrap();
    reader.read_uint().unwrap();
    reader.skip_value().unwrap();
    reader.skip_value().unwrap();
    reader.read_end_array().unwrap();
    assert_eq!(reader.bytes_remaining(), 0);
}
