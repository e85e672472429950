use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

#[derive(Debug, PartialEq)]
pub struct I2cError();

impl embedded_hal::i2c::Error for I2cError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
    }
}

#[derive(Clone, Debug)]
pub enum FakeWrite {
    Ack(),
    Nack(),
}

#[derive(Clone, Debug)]
pub enum FakeRead {
    Success(u8, u8),
    Nack(),
}

/// A scripted I2C bus. Each write or read consumes the next queued outcome, and panics if none
/// is left.
pub struct I2C {
    writes: Vec<FakeWrite>,
    reads: Vec<FakeRead>,
    written_data: Vec<Vec<u8>>,
    addresses: Vec<u8>,
}

impl I2C {
    pub fn new(writes: Vec<FakeWrite>, reads: Vec<FakeRead>) -> I2C {
        I2C {
            writes: writes,
            reads: reads,
            written_data: Vec::new(),
            addresses: Vec::new(),
        }
    }

    /// Payloads of acknowledged writes, in order.
    pub fn get_written_data(&self) -> &[Vec<u8>] {
        self.written_data.as_slice()
    }

    /// Addresses of every transaction, in order.
    pub fn get_addresses(&self) -> &[u8] {
        self.addresses.as_slice()
    }

    pub fn remaining_writes(&self) -> usize {
        self.writes.len()
    }

    pub fn remaining_reads(&self) -> usize {
        self.reads.len()
    }
}

impl ErrorType for I2C {
    type Error = I2cError;
}

impl I2c for I2C {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.addresses.push(address);
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => match self.writes.remove(0) {
                    FakeWrite::Ack() => self.written_data.push(bytes.to_vec()),
                    FakeWrite::Nack() => return Err(I2cError()),
                },
                Operation::Read(buffer) => {
                    if buffer.len() != 2 {
                        panic!("Only 2-byte reads are supported.");
                    }
                    match self.reads.remove(0) {
                        FakeRead::Success(msb, lsb) => {
                            buffer[0] = msb;
                            buffer[1] = lsb;
                        }
                        FakeRead::Nack() => return Err(I2cError()),
                    }
                }
            }
        }
        Ok(())
    }
}
