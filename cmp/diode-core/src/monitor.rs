use embassy_futures::yield_now;

use crate::{
    pin::SensePin,
    sensor::{Measurement, PollResult, SamplerError, sampler::Sampler},
    serial::{self, SerialTx},
    tick::TickSource,
};

/// Cooperative sampling loop: one sampler poll per iteration, measurements go out on the
/// serial link whenever it is free.
pub struct Runner<P: SensePin, T: TickSource, Tx: SerialTx> {
    sampler: Sampler<P, T>,
    tx: Tx,
}

pub fn new<P: SensePin, T: TickSource, Tx: SerialTx>(sampler: Sampler<P, T>, tx: Tx) -> Runner<P, T, Tx> {
    Runner { sampler, tx }
}

impl<P: SensePin, T: TickSource, Tx: SerialTx> Runner<P, T, Tx> {
    pub async fn run(mut self) {
        loop {
            self.once();
            yield_now().await;
        }
    }

    /// Polls the sampler once and reports a finished measurement. Never waits.
    pub fn once(&mut self) -> Option<Measurement> {
        match self.sampler.poll() {
            Ok(PollResult::Ready(measurement)) => {
                debug!("Monitor> {:?}", measurement);
                serial::report(&mut self.tx, measurement);
                Some(measurement)
            }
            Ok(PollResult::Pending) => None,
            Err(SamplerError::SensorTimeout { phase, ticks }) => {
                warn!("Monitor> sensor timeout in {:?} after {} ticks", phase, ticks);
                None
            }
            Err(e) => {
                error!("Monitor> sampling failed: {:?}", e);
                None
            }
        }
    }

    pub fn sampler(&self) -> &Sampler<P, T> {
        &self.sampler
    }

    pub fn tx(&self) -> &Tx {
        &self.tx
    }

    pub fn tx_mut(&mut self) -> &mut Tx {
        &mut self.tx
    }
}
