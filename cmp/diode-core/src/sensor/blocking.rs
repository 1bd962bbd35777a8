//! Busy waiting variant of the sensor read.
//!
//! Kept for boards that have nothing else to do between readings. Every read spins until
//! the pin has charged and discharged again, so it must never run inside a cooperative
//! task that shares the executor with others.

use embedded_hal::{delay::DelayNs, digital::PinState};

use crate::{
    pin::{self, SensePin},
    sensor::{Measurement, Phase, SamplerError},
    serial::{self, SerialTx},
    tick::Tick,
};

/// Charges the pin, releases it and counts the reads until it reports discharged.
///
/// With `limit` set, a phase that needs more than `limit` reads fails with
/// [`SamplerError::SensorTimeout`] (ticks counted in reads). Without it a disconnected
/// sensor blocks forever.
pub fn read<P: SensePin>(pin: &mut P, charge_level: PinState, limit: Option<u32>) -> Result<Measurement, SamplerError> {
    pin::charge(pin, charge_level)?;
    let mut waited: Tick = 0;
    while !pin::is_charged(pin, charge_level)? {
        waited = waited.wrapping_add(1);
        if limit.is_some_and(|limit| waited >= limit) {
            return Err(SamplerError::SensorTimeout {
                phase: Phase::Charging,
                ticks: waited,
            });
        }
    }

    pin::release(pin)?;
    let mut count: Tick = 0;
    while pin::is_charged(pin, charge_level)? {
        count = count.wrapping_add(1);
        if limit.is_some_and(|limit| count >= limit) {
            return Err(SamplerError::SensorTimeout {
                phase: Phase::Discharging,
                ticks: count,
            });
        }
    }
    Ok(Measurement::new(count))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub charge_level: PinState,
    pub read_limit: Option<u32>,
    /// Pause after every reading.
    pub interval_ms: u32,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            charge_level: PinState::High,
            read_limit: None,
            interval_ms: 100,
        }
    }

    pub fn from_build_config() -> Self {
        Self {
            read_limit: crate::config::BLOCKING_READ_LIMIT,
            interval_ms: crate::config::BLOCKING_INTERVAL_MS,
            ..Self::new()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Read, report, wait. The loop of the simple sensor boards.
pub struct Monitor<P: SensePin, D: DelayNs, Tx: SerialTx> {
    pin: P,
    delay: D,
    tx: Tx,
    config: Config,
}

impl<P: SensePin, D: DelayNs, Tx: SerialTx> Monitor<P, D, Tx> {
    pub fn new(mut pin: P, delay: D, tx: Tx, config: Config) -> Result<Self, SamplerError> {
        pin::charge(&mut pin, config.charge_level)?;
        Ok(Self { pin, delay, tx, config })
    }

    pub fn once(&mut self) -> Result<Measurement, SamplerError> {
        let result = read(&mut self.pin, self.config.charge_level, self.config.read_limit);
        match result {
            Ok(measurement) => {
                debug!("Blocking> {:?}", measurement);
                serial::report(&mut self.tx, measurement);
            }
            Err(e) => warn!("Blocking> read failed: {:?}", e),
        }
        self.delay.delay_ms(self.config.interval_ms);
        result
    }

    pub fn tx(&self) -> &Tx {
        &self.tx
    }

    pub fn release(self) -> (P, D, Tx) {
        (self.pin, self.delay, self.tx)
    }
}
