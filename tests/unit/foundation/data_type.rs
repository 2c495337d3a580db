use super::*;

#[test]
fn integer_targets_round_and_saturate() {
    let mut b = [0u8; 1];
    DataType::Byte.write_f64(300.0, &mut b);
    assert_eq!(b[0], 255);
    DataType::Byte.write_f64(-4.0, &mut b);
    assert_eq!(b[0], 0);
    DataType::Byte.write_f64(14.5, &mut b);
    assert_eq!(b[0], 15);
    DataType::Byte.write_f64(f64::NAN, &mut b);
    assert_eq!(b[0], 0);

    let mut w = [0u8; 2];
    DataType::Int16.write_f64(-40000.0, &mut w);
    assert_eq!(i16::from_ne_bytes(w), i16::MIN);
}

#[test]
fn copy_words_converts_between_types() {
    let src: Vec<u8> = [1.4f32, 250.6, -3.0]
        .iter()
        .flat_map(|v| v.to_ne_bytes())
        .collect();
    let mut dst = [0u8; 3];
    copy_words(&src, DataType::Float32, &mut dst, DataType::Byte, 3);
    assert_eq!(dst, [1, 251, 0]);

    let mut wide = [0u8; 6];
    copy_words(&dst, DataType::Byte, &mut wide, DataType::UInt16, 3);
    let back: Vec<u16> = wide
        .chunks_exact(2)
        .map(|c| u16::from_ne_bytes([c[0], c[1]]))
        .collect();
    assert_eq!(back, vec![1, 251, 0]);
}

#[test]
fn fill_words_repeats_the_encoded_value() {
    let mut buf = [0u8; 8];
    fill_words(&mut buf, DataType::Int16, -2.0);
    for c in buf.chunks_exact(2) {
        assert_eq!(i16::from_ne_bytes([c[0], c[1]]), -2);
    }
}

#[test]
fn union_picks_a_type_holding_both() {
    assert_eq!(DataType::Byte.union(DataType::UInt16), DataType::UInt16);
    assert_eq!(DataType::Byte.union(DataType::Int16), DataType::Int16);
    assert_eq!(DataType::UInt16.union(DataType::Int16), DataType::Int32);
    assert_eq!(DataType::Int16.union(DataType::Float32), DataType::Float32);
    assert_eq!(DataType::Int32.union(DataType::Float32), DataType::Float64);
    assert_eq!(DataType::UInt32.union(DataType::Int32), DataType::Float64);
}
