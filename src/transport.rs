use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

/// The fixed 7-bit bus address of every HDC1080.
pub const DEVICE_ADDRESS: u8 = 0b100_0000;

/// The maximum number of 16-bit words that can follow the register pointer in a single write.
pub const MAX_PAYLOAD_WORDS: usize = 4;

const FRAME_CAPACITY: usize = 1 + 2 * MAX_PAYLOAD_WORDS;
const READ_LENGTH: usize = 2;

/// An undecoded 16-bit value as received from the device.
pub type RawWord = u16;

#[derive(Debug, PartialEq)]
pub enum Error<TIoError> {
    /// Wrapped error from the I2C driver. Covers missing acknowledgements and a busy bus.
    Wrapped(TIoError),
    /// Fewer than two bytes were available to decode.
    ShortRead,
    /// Invalid argument was provided.
    InvalidArgument,
}

impl<TIoError> From<TIoError> for Error<TIoError> {
    fn from(error: TIoError) -> Error<TIoError> {
        Error::Wrapped(error)
    }
}

/// Pointers into the device's internal register space.
///
/// See section 8.6 of the [datasheet](https://www.ti.com/lit/ds/symlink/hdc1080.pdf).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Register {
    /// Result of the last temperature conversion. Read-only.
    TemperatureResult = 0x00,
    /// Result of the last humidity conversion. Read-only.
    HumidityResult = 0x01,
    /// Acquisition settings, heater and resolution. Written as a full 16-bit word.
    Configuration = 0x02,
    /// Bits 40-25 of the serial ID.
    SerialIdHigh = 0xFB,
    /// Bits 24-9 of the serial ID.
    SerialIdMid = 0xFC,
    /// Bits 8-0 of the serial ID, left-aligned.
    SerialIdLow = 0xFD,
    /// Always 0x5449 ("TI") on a genuine part.
    ManufacturerId = 0xFE,
    /// Always 0x1050 on a genuine part.
    DeviceId = 0xFF,
}

impl Register {
    /// The serial ID registers, most-significant word first.
    pub const SERIAL_ID: [Register; 3] = [
        Register::SerialIdHigh,
        Register::SerialIdMid,
        Register::SerialIdLow,
    ];

    /// The single-byte pointer that selects this register.
    pub fn pointer(self) -> u8 {
        self as u8
    }
}

/// Decodes a big-endian word, where the first byte received is the most-significant.
pub fn decode_word<TIoError>(bytes: &[u8]) -> Result<RawWord, Error<TIoError>> {
    match bytes {
        [msb, lsb] => Ok(((*msb as u16) << 8) | *lsb as u16),
        _ => Err(Error::ShortRead),
    }
}

/// A register pointer followed by its encoded payload, ready to be sent in one write.
#[derive(Debug, PartialEq)]
pub struct Frame {
    bytes: [u8; FRAME_CAPACITY],
    len: usize,
}

impl Frame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }
}

/// Encodes a write to `register`.
///
/// Each word is sent as a single byte if its high byte is zero, otherwise as two bytes with the
/// most-significant byte first. A configuration word of 0x0000 is therefore sent as a single 0x00
/// byte.
///
/// Returns [`Error::InvalidArgument`] if more than [`MAX_PAYLOAD_WORDS`] words are given.
pub fn encode_words<TIoError>(
    register: Register,
    values: &[RawWord],
) -> Result<Frame, Error<TIoError>> {
    if values.len() > MAX_PAYLOAD_WORDS {
        return Err(Error::InvalidArgument);
    }

    let mut frame = Frame {
        bytes: [0; FRAME_CAPACITY],
        len: 1,
    };
    frame.bytes[0] = register.pointer();
    for word in values {
        if (word & 0xFF00) == 0 {
            frame.bytes[frame.len] = *word as u8;
            frame.len += 1;
        } else {
            frame.bytes[frame.len..frame.len + 2].copy_from_slice(&word.to_be_bytes());
            frame.len += 2;
        }
    }
    Ok(frame)
}

/// The outcome of [`RegisterTransport::read`].
///
/// A read is two bus transactions, so each is reported separately. Only the pointer write says
/// anything about whether the device acknowledged its address.
#[derive(Debug, PartialEq)]
pub struct ReadResult<TIoError> {
    /// Outcome of writing the register pointer.
    pub pointer_write: Result<(), Error<TIoError>>,
    /// The decoded word, if two bytes were received.
    pub word: Result<RawWord, Error<TIoError>>,
}

impl<TIoError> ReadResult<TIoError> {
    /// The received word, or 0 if nothing usable was received.
    ///
    /// A zero word means "no data" and must never be taken as a real reading.
    pub fn word_or_zero(&self) -> RawWord {
        *self.word.as_ref().unwrap_or(&0)
    }
}

/// Point-to-point register access to a device at [`DEVICE_ADDRESS`].
///
/// The transport assumes it has exclusive use of the bus for the duration of each call and does
/// not retry. Callers that share a physical bus must serialize access themselves.
#[derive(Debug)]
pub struct RegisterTransport<TI2c> {
    i2c: TI2c,
}

impl<TI2c, TIoError> RegisterTransport<TI2c>
where
    TI2c: I2c<Error = TIoError>,
{
    pub fn new(i2c: TI2c) -> Self {
        RegisterTransport { i2c }
    }

    /// Writes the register pointer followed by `values` in a single transaction.
    ///
    /// An empty `values` writes only the pointer, which selects the register for a later read.
    pub fn write(&mut self, register: Register, values: &[RawWord]) -> Result<(), Error<TIoError>> {
        let frame = encode_words(register, values)?;
        self.i2c.write(DEVICE_ADDRESS, frame.as_bytes())?;
        Ok(())
    }

    /// Selects `register`, waits `settle_delay_ms`, then reads back its 16-bit value.
    ///
    /// The read is attempted even if the pointer write fails, so the two outcomes are returned
    /// independently. A zero delay skips waiting entirely.
    pub fn read<TDelay>(
        &mut self,
        register: Register,
        settle_delay_ms: u32,
        delay: &mut TDelay,
    ) -> ReadResult<TIoError>
    where
        TDelay: DelayNs,
    {
        let pointer_write = self.write(register, &[]);
        if settle_delay_ms > 0 {
            delay.delay_ms(settle_delay_ms);
        }

        let mut rx_buf = [0u8; READ_LENGTH];
        let word = match self.i2c.read(DEVICE_ADDRESS, &mut rx_buf) {
            Ok(()) => decode_word(&rx_buf),
            Err(error) => Err(Error::Wrapped(error)),
        };
        ReadResult {
            pointer_write,
            word,
        }
    }

    /// Gives back the underlying bus.
    pub fn release(self) -> TI2c {
        self.i2c
    }
}
