use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::transport::{Error, RawWord, ReadResult, Register, RegisterTransport};

/// Configuration bit that turns on the internal heater.
pub const HEATER_ENABLE: u16 = 1 << 13;

/// Temperature returned before any valid measurement has been made. This is the lowest value the
/// conversion formula can produce.
pub const DEFAULT_TEMPERATURE: f32 = -40.0;

/// Relative humidity returned before any valid measurement has been made, as a fraction.
pub const DEFAULT_HUMIDITY: f32 = 1.0;

/// Resolution of a temperature conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TemperatureResolution {
    /// 14-bit conversion. Takes up to 6.35ms.
    FourteenBit,
    /// 11-bit conversion. Takes up to 3.65ms.
    ElevenBit,
}

impl TemperatureResolution {
    /// The bits written to the configuration register to select this resolution.
    pub fn configuration_bits(self) -> u16 {
        match self {
            TemperatureResolution::FourteenBit => 0,
            TemperatureResolution::ElevenBit => 1 << 10,
        }
    }

    /// How long to wait between triggering a conversion and reading its result.
    pub fn settle_delay_ms(self) -> u32 {
        match self {
            TemperatureResolution::FourteenBit => 7,
            TemperatureResolution::ElevenBit => 4,
        }
    }
}

impl Default for TemperatureResolution {
    fn default() -> Self {
        TemperatureResolution::FourteenBit
    }
}

/// Resolution of a humidity conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HumidityResolution {
    /// 14-bit conversion. Takes up to 6.5ms.
    FourteenBit,
    /// 11-bit conversion. Takes up to 3.85ms.
    ElevenBit,
    /// 8-bit conversion. Takes up to 2.5ms.
    EightBit,
}

impl HumidityResolution {
    /// The bits written to the configuration register to select this resolution.
    pub fn configuration_bits(self) -> u16 {
        match self {
            HumidityResolution::FourteenBit => 0,
            HumidityResolution::ElevenBit => 0b01 << 8,
            HumidityResolution::EightBit => 0b10 << 8,
        }
    }

    /// How long to wait between triggering a conversion and reading its result.
    pub fn settle_delay_ms(self) -> u32 {
        match self {
            HumidityResolution::FourteenBit => 7,
            HumidityResolution::ElevenBit => 4,
            HumidityResolution::EightBit => 3,
        }
    }
}

impl Default for HumidityResolution {
    fn default() -> Self {
        HumidityResolution::FourteenBit
    }
}

/// Converts a raw temperature word to degrees Celsius.
pub fn raw_to_celsius(raw: RawWord) -> f32 {
    (raw as f32 / 65536.0) * 165.0 - 40.0
}

/// Converts a raw humidity word to relative humidity, as a fraction in \[0, 1).
pub fn raw_to_relative_humidity(raw: RawWord) -> f32 {
    raw as f32 / 65536.0
}

/// A pair of temperature and humidity values.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AirSample {
    /// Degrees Celsius.
    pub temperature: f32,
    /// Relative humidity as a fraction in \[0, 1\].
    pub humidity: f32,
}

impl AirSample {
    /// Relative humidity in percent.
    pub fn humidity_percent(&self) -> f32 {
        self.humidity * 100.0
    }
}

impl Default for AirSample {
    fn default() -> Self {
        AirSample {
            temperature: DEFAULT_TEMPERATURE,
            humidity: DEFAULT_HUMIDITY,
        }
    }
}

/// Identification registers of the device. Fields that could not be read are 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Identity {
    pub manufacturer_id: u16,
    pub device_id: u16,
    /// The three serial words, assembled most-significant first into the low 48 bits.
    pub serial: u64,
}

/// Assembles the three serial ID words, most-significant first.
pub fn assemble_serial(words: [RawWord; 3]) -> u64 {
    ((words[0] as u64) << 32) | ((words[1] as u64) << 16) | words[2] as u64
}

/// Whether recent writes to the device have been acknowledged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Availability {
    /// The last write was acknowledged, or too few writes have failed since then to matter.
    Available,
    /// More than [`Options::max_consecutive_failures`] writes in a row have failed, or none has
    /// succeeded yet. Measurements keep returning cached values until a write succeeds.
    Unavailable,
}

/// Options to modify the behavior of the HDC1080 driver.
#[derive(Clone, Copy, Debug)]
pub struct Options {
    /// The number of consecutive failed writes that are tolerated before the device is
    /// considered unavailable. Must be in the range \[1, 254\], so that a single failure never
    /// makes the device unavailable and the saturating failure counter can still exceed it.
    pub max_consecutive_failures: u8,
}

/// Tolerates 10 failed writes in a row; the 11th makes the device unavailable.
pub const DEFAULT_OPTIONS: Options = Options {
    max_consecutive_failures: 10,
};

impl Default for Options {
    fn default() -> Self {
        DEFAULT_OPTIONS
    }
}

#[derive(Debug)]
struct AvailabilityState {
    state: Availability,
    consecutive_failures: u8,
}

impl AvailabilityState {
    fn new() -> Self {
        AvailabilityState {
            state: Availability::Unavailable,
            consecutive_failures: 0,
        }
    }

    /// The only place availability changes.
    fn record<TIoError>(&mut self, outcome: &Result<(), Error<TIoError>>, max_failures: u8) {
        match outcome {
            Ok(()) => {
                if self.state == Availability::Unavailable {
                    info!("hdc1080 available");
                }
                self.state = Availability::Available;
                self.consecutive_failures = 0;
            }
            Err(_) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                debug!(
                    "hdc1080 write failed ({} consecutive)",
                    self.consecutive_failures
                );
                if self.consecutive_failures > max_failures
                    && self.state == Availability::Available
                {
                    warn!(
                        "hdc1080 unavailable after {} failed writes",
                        self.consecutive_failures
                    );
                    self.state = Availability::Unavailable;
                }
            }
        }
    }
}

/// Driver for an HDC1080 humidity and temperature sensor.
///
/// None of the measurement calls fail. If the device can't be reached, or stops acknowledging
/// writes for long enough to be considered [`Availability::Unavailable`], the last good value is
/// returned instead. Measurements still go out on the bus while the device is unavailable, so it
/// recovers as soon as a write is acknowledged again.
///
/// Each measurement blocks for its conversion time (3-7ms) plus bus latency.
#[derive(Debug)]
pub struct Hdc1080<TI2c, TDelay> {
    transport: RegisterTransport<TI2c>,
    delay: TDelay,
    options: Options,
    availability: AvailabilityState,
    last_sample: AirSample,
    identity: Identity,
}

impl<TI2c, TIoError, TDelay> Hdc1080<TI2c, TDelay>
where
    TI2c: I2c<Error = TIoError>,
    TDelay: DelayNs,
{
    /// Constructs the driver with [`DEFAULT_OPTIONS`] and probes the identification registers.
    ///
    /// A failed probe leaves the affected [`Identity`] fields at 0 and does not stop later
    /// measurements from being attempted.
    pub fn new(i2c: TI2c, delay: TDelay) -> Self {
        let mut sensor = Hdc1080::with_options(i2c, delay, DEFAULT_OPTIONS);
        sensor.identify();
        sensor
    }

    /// Constructs the driver and probes the identification registers.
    ///
    /// If options is `None`, then [`DEFAULT_OPTIONS`] is used. Returns
    /// [`Error::InvalidArgument`] if `max_consecutive_failures` is 0, since a single failed write
    /// would then make the device unavailable, or `u8::MAX`, since the failure counter saturates
    /// there and the device could never become unavailable.
    pub fn new_with_options(
        i2c: TI2c,
        delay: TDelay,
        options: Option<Options>,
    ) -> Result<Self, Error<TIoError>> {
        let options = options.unwrap_or(DEFAULT_OPTIONS);
        if options.max_consecutive_failures == 0 || options.max_consecutive_failures == u8::MAX {
            return Err(Error::InvalidArgument);
        }
        let mut sensor = Hdc1080::with_options(i2c, delay, options);
        sensor.identify();
        Ok(sensor)
    }

    fn with_options(i2c: TI2c, delay: TDelay, options: Options) -> Self {
        Hdc1080 {
            transport: RegisterTransport::new(i2c),
            delay,
            options,
            availability: AvailabilityState::new(),
            last_sample: AirSample::default(),
            identity: Identity::default(),
        }
    }

    /// Reads the manufacturer ID, device ID and serial ID, and stores them for [`Self::identity`].
    pub fn identify(&mut self) -> Identity {
        let manufacturer_id = self.read_register(Register::ManufacturerId, 0);
        let device_id = self.read_register(Register::DeviceId, 0);
        let mut serial_words = [0; 3];
        for (word, register) in serial_words.iter_mut().zip(Register::SERIAL_ID.iter()) {
            *word = self.read_register(*register, 0);
        }

        self.identity = Identity {
            manufacturer_id,
            device_id,
            serial: assemble_serial(serial_words),
        };
        debug!(
            "hdc1080 manufacturer {:?} device {:?} serial {:?}",
            manufacturer_id, device_id, self.identity.serial
        );
        self.identity
    }

    /// The identification read by the last call to [`Self::identify`].
    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Measures the temperature in degrees Celsius.
    ///
    /// Returns the previous value (initially [`DEFAULT_TEMPERATURE`]) if the device is unavailable
    /// or returned no data.
    pub fn measure_temperature(&mut self, resolution: TemperatureResolution) -> f32 {
        let raw = self.measure_raw(
            resolution.configuration_bits(),
            Register::TemperatureResult,
            resolution.settle_delay_ms(),
        );
        if self.accepts(raw) {
            self.last_sample.temperature = raw_to_celsius(raw);
        }
        self.last_sample.temperature
    }

    /// Measures the relative humidity as a fraction in \[0, 1).
    ///
    /// Returns the previous value (initially [`DEFAULT_HUMIDITY`]) if the device is unavailable or
    /// returned no data.
    pub fn measure_humidity(&mut self, resolution: HumidityResolution) -> f32 {
        let raw = self.measure_raw(
            resolution.configuration_bits(),
            Register::HumidityResult,
            resolution.settle_delay_ms(),
        );
        if self.accepts(raw) {
            self.last_sample.humidity = raw_to_relative_humidity(raw);
        }
        self.last_sample.humidity
    }

    /// Measures temperature, then humidity, as two separate conversions.
    pub fn measure_temperature_and_humidity(
        &mut self,
        temperature_resolution: TemperatureResolution,
        humidity_resolution: HumidityResolution,
    ) -> AirSample {
        AirSample {
            temperature: self.measure_temperature(temperature_resolution),
            humidity: self.measure_humidity(humidity_resolution),
        }
    }

    /// Turns the internal heater on or off.
    ///
    /// The whole configuration register is rewritten, so any resolution bits are cleared. Each
    /// measurement writes its own resolution anyway, which in turn clears the heater bit.
    pub fn set_heater(&mut self, enabled: bool) {
        let configuration = if enabled { HEATER_ENABLE } else { 0 };
        let outcome = self
            .transport
            .write(Register::Configuration, &[configuration]);
        self.record_write(&outcome);
    }

    /// Whether recent writes to the device have been acknowledged.
    pub fn availability(&self) -> Availability {
        self.availability.state
    }

    /// Shorthand for `availability() == Availability::Available`.
    pub fn is_available(&self) -> bool {
        self.availability.state == Availability::Available
    }

    /// The number of writes that have failed since the last successful one.
    pub fn consecutive_failures(&self) -> u8 {
        self.availability.consecutive_failures
    }

    /// The cached values, without making a new measurement.
    pub fn last_sample(&self) -> AirSample {
        self.last_sample
    }

    /// Destroys the driver, giving back the bus and delay.
    pub fn release(self) -> (TI2c, TDelay) {
        (self.transport.release(), self.delay)
    }

    fn measure_raw(
        &mut self,
        configuration: u16,
        register: Register,
        settle_delay_ms: u32,
    ) -> RawWord {
        let outcome = self
            .transport
            .write(Register::Configuration, &[configuration]);
        self.record_write(&outcome);
        self.read_register(register, settle_delay_ms)
    }

    fn read_register(&mut self, register: Register, settle_delay_ms: u32) -> RawWord {
        let result: ReadResult<TIoError> = self
            .transport
            .read(register, settle_delay_ms, &mut self.delay);
        self.record_write(&result.pointer_write);
        if result.word.is_err() {
            debug!("hdc1080 read of {:?} returned no data", register);
        }
        result.word_or_zero()
    }

    fn record_write(&mut self, outcome: &Result<(), Error<TIoError>>) {
        self.availability
            .record(outcome, self.options.max_consecutive_failures);
    }

    fn accepts(&self, raw: RawWord) -> bool {
        if raw == 0 {
            return false;
        }
        if !self.is_available() {
            trace!("hdc1080 unavailable, keeping cached value");
            return false;
        }
        true
    }
}
