#![no_std]
#![no_main]

use defmt::*;
use diode_core::{
    sensor::blocking::{self, Monitor},
    serial,
};
use diode_monitor::DiodePin;
use embassy_executor::Spawner;
use embassy_futures::join::*;
use embassy_nrf::{
    bind_interrupts,
    buffered_uarte::{self, BufferedUarte},
    gpio::{Flex, Level, Output, OutputDrive},
    peripherals, uarte,
};
use embassy_time::Delay;
use {defmt_rtt as _, panic_probe as _};

bind_interrupts!(struct Irqs {
    UARTE0 => buffered_uarte::InterruptHandler<peripherals::UARTE0>;
});

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_nrf::init(Default::default());
    let mut led = Output::new(p.P1_12, Level::Low, OutputDrive::Standard);

    let mut config = uarte::Config::default();
    config.parity = uarte::Parity::EXCLUDED;
    config.baudrate = uarte::Baudrate::BAUD9600;
    let mut tx_buffer = [0u8; 64];
    let mut rx_buffer = [0u8; 16];
    let uart = BufferedUarte::new(p.UARTE0, p.TIMER0, p.PPI_CH0, p.PPI_CH1, p.PPI_GROUP0, p.P0_08, p.P0_06, Irqs, config, &mut rx_buffer, &mut tx_buffer);

    let mut serial_state = serial::State::new();
    let (serial_runner, report_tx) = serial::new(&mut serial_state, uart);

    // reverse biased diode between P0.31 and GND
    let sensor = DiodePin::new(Flex::new(p.P0_31));
    let monitor_config = blocking::Config::from_build_config();
    info!("temperature sensor, blocking, {}", monitor_config);
    let mut monitor = unwrap!(Monitor::new(sensor, Delay, report_tx, monitor_config));

    let sampling = async {
        loop {
            led.toggle();
            monitor.once().ok();
            monitor.tx().wait_idle().await;
        }
    };

    join(serial_runner.run(), sampling).await;
}
