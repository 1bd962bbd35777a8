//! Diode sensing on a single GPIO pin.
//!
//! The pin charges the diode's capacitance, then floats while the reverse (dark) current of
//! the diode discharges it. The time until the pin reads the discharged level is the raw
//! measurement: the weaker the diode current, the longer it takes. For a photo diode or an
//! LED this means darker, for a plain diode colder.

pub mod blocking;
pub mod sampler;

use embedded_hal::digital::PinState;

use crate::tick::Tick;

/// Raw discharge duration in ticks of the tick source that timed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement(Tick);

impl Measurement {
    pub const fn new(ticks: Tick) -> Self {
        Self(ticks)
    }

    pub const fn ticks(&self) -> Tick {
        self.0
    }
}

impl From<Measurement> for Tick {
    fn from(measurement: Measurement) -> Self {
        measurement.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Pin drives the capacitance to the charge level.
    Charging,
    /// Pin floats and the diode current discharges the capacitance.
    Discharging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollResult {
    Pending,
    Ready(Measurement),
}

impl PollResult {
    pub fn is_ready(&self) -> bool {
        matches!(self, PollResult::Ready(_))
    }

    pub fn ready(self) -> Option<Measurement> {
        match self {
            PollResult::Ready(measurement) => Some(measurement),
            PollResult::Pending => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SamplerError {
    Gpio,
    /// The pin stayed in `phase` for `ticks` without reaching the expected level.
    SensorTimeout { phase: Phase, ticks: Tick },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SamplerConfig {
    /// Level the pin drives while charging. The discharged level is the opposite one.
    pub charge_level: PinState,
    /// Maximum ticks a phase may last before [`SamplerError::SensorTimeout`] is raised.
    /// `None` keeps waiting forever.
    pub timeout: Option<Tick>,
}

impl SamplerConfig {
    pub const fn new() -> Self {
        Self {
            charge_level: PinState::High,
            timeout: None,
        }
    }

    pub fn from_build_config() -> Self {
        Self::new().with_timeout(crate::config::SAMPLE_TIMEOUT_TICKS)
    }

    pub fn with_charge_level(mut self, charge_level: PinState) -> Self {
        self.charge_level = charge_level;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Tick>) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn timed_out(&self, ticks: Tick) -> bool {
        self.timeout.is_some_and(|timeout| ticks >= timeout)
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self::new()
    }
}
