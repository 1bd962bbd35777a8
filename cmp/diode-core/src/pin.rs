use embedded_hal::digital::{InputPin, OutputPin, PinState};

use crate::sensor::SamplerError;

/// GPIO line that can switch between a driven output and a floating input.
///
/// The diode and its capacitance hang off this single pin: it is driven to charge the
/// capacitance and released to let the diode current discharge it.
pub trait SensePin: InputPin + OutputPin {
    /// Turns the pin into a push-pull output keeping the last set level.
    fn set_as_output(&mut self) -> Result<(), Self::Error>;

    /// Turns the pin into an input without pull resistors.
    fn set_as_floating_input(&mut self) -> Result<(), Self::Error>;
}

impl<P: SensePin + ?Sized> SensePin for &mut P {
    fn set_as_output(&mut self) -> Result<(), Self::Error> {
        P::set_as_output(self)
    }

    fn set_as_floating_input(&mut self) -> Result<(), Self::Error> {
        P::set_as_floating_input(self)
    }
}

/// Drives the pin to `level` to (re)charge the capacitance.
pub(crate) fn charge<P: SensePin>(pin: &mut P, level: PinState) -> Result<(), SamplerError> {
    pin.set_state(level).map_err(|_| SamplerError::Gpio)?;
    pin.set_as_output().map_err(|_| SamplerError::Gpio)
}

/// Lets the pin float so the capacitance discharges through the diode.
pub(crate) fn release<P: SensePin>(pin: &mut P) -> Result<(), SamplerError> {
    pin.set_as_floating_input().map_err(|_| SamplerError::Gpio)
}

pub(crate) fn is_charged<P: SensePin>(pin: &mut P, level: PinState) -> Result<bool, SamplerError> {
    match level {
        PinState::High => pin.is_high(),
        PinState::Low => pin.is_low(),
    }
    .map_err(|_| SamplerError::Gpio)
}
