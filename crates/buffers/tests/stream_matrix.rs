use fracpack_buffers::{BufferError, InputStream, OutputStream};

#[test]
fn writer_backpatch_matrix() {
    let mut out = OutputStream::new();
    out.write_u16(0x0004);
    let slot = out.position();
    out.write_u32(0);
    let payload = out.position();
    out.patch_u32(slot, payload - slot);
    out.write_u32(0xffff_ffff);
    assert_eq!(
        out.finish(),
        [0x04, 0x00, 0x04, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff]
    );
}

#[test]
fn writer_float_and_wide_ints() {
    let mut out = OutputStream::with_capacity(16);
    out.write_u64(0x0102_0304_0506_0708);
    out.write_f32(1.0);
    out.write_f64(-2.0);
    let data = out.finish();
    assert_eq!(&data[..8], &[8, 7, 6, 5, 4, 3, 2, 1]);

    let mut input = InputStream::new(&data);
    assert_eq!(input.read_u64().unwrap(), 0x0102_0304_0506_0708);
    assert_eq!(input.read_f32().unwrap(), 1.0);
    assert_eq!(input.read_f64().unwrap(), -2.0);
    assert_eq!(input.remaining(), 0);
}

#[test]
fn known_positions_matrix() {
    let data = [0u8; 16];
    let mut input = InputStream::new(&data);
    input.advance(4).unwrap();

    assert_eq!(input.set_position(8), Err(BufferError::BadOffset));
    assert_eq!(input.set_position(2), Err(BufferError::BadOffset));
    assert_eq!(input.set_position(17), Err(BufferError::OutOfBounds));
    input.set_position(4).unwrap();

    input.set_unknown_pos();
    assert!(!input.known_pos());
    input.set_position(8).unwrap();
    input.set_position(8).unwrap();
    assert_eq!(input.set_position(6), Err(BufferError::BadOffset));
    assert_eq!(input.position(), 8);
}

#[test]
fn scoped_reads_restore_state() {
    let data = [1, 0, 0, 0, 2, 0, 0, 0, 3];
    let mut input = InputStream::new(&data);
    input.advance(8).unwrap();
    input.set_unknown_pos();

    let inner: Result<u32, BufferError> = input.scoped(4, |s| {
        assert!(s.known_pos());
        s.read_u32()
    });
    assert_eq!(inner.unwrap(), 2);
    assert_eq!(input.position(), 8);
    assert!(!input.known_pos());

    let failed: Result<u32, BufferError> = input.scoped(6, |s| s.read_u32());
    assert_eq!(failed, Err(BufferError::OutOfBounds));
    assert_eq!(input.position(), 8);
    assert_eq!(input.read_u32_at(0).unwrap(), 1);
    assert_eq!(input.read_u32_at(6), Err(BufferError::OutOfBounds));
}

#[test]
fn limit_narrows_the_window() {
    let data = [0xaa; 12];
    let mut input = InputStream::new(&data);
    input.advance(2).unwrap();

    assert_eq!(input.limit(1), Err(BufferError::OutOfBounds));
    assert_eq!(input.limit(13), Err(BufferError::OutOfBounds));
    let outer = input.limit(6).unwrap();
    assert_eq!(outer, 12);
    assert_eq!(input.remaining(), 4);
    assert_eq!(input.read_bytes(5), Err(BufferError::OutOfBounds));
    input.read_u32().unwrap();
    input.unlimit(outer);
    assert_eq!(input.remaining(), 6);
    input.seek(12).unwrap();
    assert_eq!(input.seek(13), Err(BufferError::OutOfBounds));
}
