use embedded_hal::i2c::I2c;

mod fake_hal;
use fake_hal::i2c::*;

#[test]
#[should_panic]
fn too_many_writes_panics() {
    let mut i2c = I2C::new(vec![], vec![]);
    let _ = i2c.write(0x40, &[0]);
}

#[test]
#[should_panic]
fn too_many_reads_panics() {
    let mut i2c = I2C::new(vec![], vec![]);
    let mut buffer = [0u8; 2];
    let _ = i2c.read(0x40, &mut buffer);
}

#[test]
fn write_ack_records_data() -> Result<(), I2cError> {
    let mut i2c = I2C::new(vec![FakeWrite::Ack(), FakeWrite::Ack()], vec![]);

    i2c.write(0x40, &[0x02, 0x20, 0x00])?;
    i2c.write(0x41, &[0xFE])?;

    assert_eq!(i2c.get_written_data(), [vec![0x02, 0x20, 0x00], vec![0xFE]]);
    assert_eq!(i2c.get_addresses(), [0x40, 0x41]);
    Ok(())
}

#[test]
fn write_nack_fails_without_recording() -> Result<(), I2cError> {
    let mut i2c = I2C::new(vec![FakeWrite::Nack(), FakeWrite::Ack()], vec![]);

    let result = i2c.write(0x40, &[0x02]);
    assert_eq!(result, Err(I2cError()));
    assert!(i2c.get_written_data().is_empty());

    i2c.write(0x40, &[0x01])?;
    assert_eq!(i2c.get_written_data(), [vec![0x01]]);
    Ok(())
}

#[test]
fn read_success_fills_buffer() -> Result<(), I2cError> {
    let mut i2c = I2C::new(vec![], vec![FakeRead::Success(0x12, 0x34)]);
    let mut buffer = [0u8; 2];

    i2c.read(0x40, &mut buffer)?;

    assert_eq!(buffer, [0x12, 0x34]);
    assert_eq!(i2c.remaining_reads(), 0);
    Ok(())
}

#[test]
fn read_nack_fails() {
    let mut i2c = I2C::new(vec![], vec![FakeRead::Nack()]);
    let mut buffer = [0u8; 2];

    let result = i2c.read(0x40, &mut buffer);

    assert_eq!(result, Err(I2cError()));
    assert_eq!(buffer, [0, 0]);
}
