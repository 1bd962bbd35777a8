#![no_std]

use core::convert::Infallible;

use diode_core::pin::SensePin;
use embassy_nrf::gpio::{Flex, OutputDrive, Pull};
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

/// Sensing pin on an nRF GPIO.
///
/// The output mode keeps the input buffer connected, the sampler reads the pin back while
/// it is still being driven.
pub struct DiodePin<'d> {
    pin: Flex<'d>,
}

impl<'d> DiodePin<'d> {
    pub fn new(pin: Flex<'d>) -> Self {
        Self { pin }
    }
}

impl ErrorType for DiodePin<'_> {
    type Error = Infallible;
}

impl InputPin for DiodePin<'_> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pin.is_high())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pin.is_low())
    }
}

impl OutputPin for DiodePin<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.pin.set_low();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.pin.set_high();
        Ok(())
    }
}

impl SensePin for DiodePin<'_> {
    fn set_as_output(&mut self) -> Result<(), Self::Error> {
        self.pin.set_as_input_output(Pull::None, OutputDrive::Standard);
        Ok(())
    }

    fn set_as_floating_input(&mut self) -> Result<(), Self::Error> {
        self.pin.set_as_input(Pull::None);
        Ok(())
    }
}
