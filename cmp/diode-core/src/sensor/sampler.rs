use crate::{
    pin::{self, SensePin},
    sensor::{Measurement, Phase, PollResult, SamplerConfig, SamplerError},
    tick::{Tick, TickSource, elapsed},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum State {
    /// `since` is unset until the first poll after start up, so a charging timeout is
    /// counted from that poll and not from `Sampler::new`.
    Charging { since: Option<Tick> },
    Discharging { cycle_start: Tick },
}

/// Non-blocking charge/discharge sampler.
///
/// Every [`Sampler::poll`] draws exactly one tick and does a bounded amount of pin work.
/// A discharge is timed from the poll that releases the pin up to and including the poll
/// that sees the discharged level. Its duration is handed out as `Ready` by the poll that
/// sees the pin charged again, i.e. while the next cycle is already being armed. The
/// first charge after start up therefore yields `Pending`.
pub struct Sampler<P: SensePin, T: TickSource> {
    pin: P,
    ticks: T,
    config: SamplerConfig,
    state: State,
    completed: Option<Measurement>,
}

impl<P: SensePin, T: TickSource> Sampler<P, T> {
    /// Takes over `pin` and starts charging it.
    pub fn new(mut pin: P, ticks: T, config: SamplerConfig) -> Result<Self, SamplerError> {
        pin::charge(&mut pin, config.charge_level)?;
        debug!("Sampler> start charging, timeout {:?}", config.timeout);
        Ok(Self {
            pin,
            ticks,
            config,
            state: State::Charging { since: None },
            completed: None,
        })
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::Charging { .. } => Phase::Charging,
            State::Discharging { .. } => Phase::Discharging,
        }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Gives back the pin and the tick source. The pin is left as it is.
    pub fn release(self) -> (P, T) {
        (self.pin, self.ticks)
    }

    pub fn poll(&mut self) -> Result<PollResult, SamplerError> {
        let now = self.ticks.next_tick();
        match self.state {
            State::Charging { since } => self.poll_charging(since.unwrap_or(now), now),
            State::Discharging { cycle_start } => self.poll_discharging(cycle_start, now),
        }
    }

    fn poll_charging(&mut self, since: Tick, now: Tick) -> Result<PollResult, SamplerError> {
        self.state = State::Charging { since: Some(since) };
        let charging = elapsed(since, now);
        if pin::is_charged(&mut self.pin, self.config.charge_level)? {
            pin::release(&mut self.pin)?;
            self.state = State::Discharging { cycle_start: now };
            trace!("Sampler> charged after {} ticks => discharging", charging);
            return Ok(match self.completed.take() {
                Some(measurement) => PollResult::Ready(measurement),
                None => PollResult::Pending,
            });
        }
        if self.config.timed_out(charging) {
            warn!("Sampler> not charged after {} ticks => charging again", charging);
            self.recharge(now)?;
            return Err(SamplerError::SensorTimeout {
                phase: Phase::Charging,
                ticks: charging,
            });
        }
        Ok(PollResult::Pending)
    }

    fn poll_discharging(&mut self, cycle_start: Tick, now: Tick) -> Result<PollResult, SamplerError> {
        let discharging = elapsed(cycle_start, now);
        if pin::is_charged(&mut self.pin, self.config.charge_level)? {
            if self.config.timed_out(discharging) {
                warn!("Sampler> not discharged after {} ticks => cycle dropped", discharging);
                self.recharge(now)?;
                return Err(SamplerError::SensorTimeout {
                    phase: Phase::Discharging,
                    ticks: discharging,
                });
            }
            return Ok(PollResult::Pending);
        }

        self.recharge(now)?;
        self.completed = Some(Measurement::new(discharging));
        trace!("Sampler> discharged after {} ticks => charging", discharging);
        Ok(PollResult::Pending)
    }

    fn recharge(&mut self, since: Tick) -> Result<(), SamplerError> {
        self.state = State::Charging { since: Some(since) };
        pin::charge(&mut self.pin, self.config.charge_level)
    }
}

#[cfg(test)]
pub mod tests {
    use embedded_hal::digital::PinState;

    use super::*;
    use crate::pin::mocks::{PinOp, ScriptedPin};
    use crate::tick::FreeRunningCounter;

    fn sampler(levels: &[bool]) -> Sampler<ScriptedPin, FreeRunningCounter> {
        Sampler::new(ScriptedPin::new(levels), FreeRunningCounter::new(), SamplerConfig::default()).unwrap()
    }

    fn cycle(discharge_polls: usize) -> Vec<bool> {
        let mut levels = vec![true; discharge_polls];
        levels.push(false);
        levels
    }

    fn ready(ticks: Tick) -> Result<PollResult, SamplerError> {
        Ok(PollResult::Ready(Measurement::new(ticks)))
    }

    const PENDING: Result<PollResult, SamplerError> = Ok(PollResult::Pending);

    #[test]
    fn starts_charging_with_driven_pin() {
        let sampler = sampler(&[]);
        assert_eq!(sampler.phase(), Phase::Charging);
        let (pin, ticks) = sampler.release();
        assert_eq!(pin.ops, [PinOp::SetHigh, PinOp::Output]);
        assert_eq!(ticks.peek(), 0);
    }

    #[test]
    fn first_charge_yields_pending() {
        let mut sampler = sampler(&[true]);
        assert_eq!(sampler.poll(), PENDING);
        assert_eq!(sampler.phase(), Phase::Discharging);
    }

    #[test]
    fn measurement_equals_discharge_polls() {
        for k in [1usize, 2, 5, 17] {
            // charge completes, k - 1 polls still charged, then discharged and charged again
            let mut levels = vec![true];
            levels.extend(cycle(k - 1));
            levels.push(true);
            let mut sampler = sampler(&levels);
            for _ in 0..k + 1 {
                assert_eq!(sampler.poll(), PENDING);
            }
            assert_eq!(sampler.poll(), ready(k as Tick));
            assert_eq!(sampler.phase(), Phase::Discharging);
        }
    }

    #[test]
    fn reports_previous_cycle_when_charge_completes() {
        let mut levels = vec![true];
        levels.extend(cycle(2));
        levels.extend([false, false, true]);
        let mut sampler = sampler(&levels);
        for _ in 0..4 {
            assert_eq!(sampler.poll(), PENDING);
        }
        assert_eq!(sampler.phase(), Phase::Charging);

        assert_eq!(sampler.poll(), PENDING);
        assert_eq!(sampler.phase(), Phase::Charging);
        assert_eq!(sampler.poll(), PENDING);
        assert_eq!(sampler.phase(), Phase::Charging);
        assert_eq!(sampler.poll(), ready(3));
        assert_eq!(sampler.phase(), Phase::Discharging);
    }

    #[test]
    fn one_measurement_per_cycle_in_order() {
        let durations = [3usize, 1, 7, 2];
        let mut levels = vec![false, false];
        for (i, k) in durations.iter().enumerate() {
            levels.push(true);
            levels.extend(cycle(k - 1));
            levels.extend(core::iter::repeat_n(false, i % 3));
        }
        levels.push(true);

        let mut sampler = sampler(&levels);
        let mut measurements = Vec::new();
        for _ in 0..levels.len() + 10 {
            if let PollResult::Ready(measurement) = sampler.poll().unwrap() {
                measurements.push(measurement.ticks() as usize);
            }
        }
        assert_eq!(measurements, durations);
    }

    #[test]
    fn stuck_pin_stays_pending_across_wrap() {
        let mut sampler = Sampler::new(
            ScriptedPin::new(&[]),
            FreeRunningCounter::starting_at(Tick::MAX - 5_000),
            SamplerConfig::default(),
        )
        .unwrap();
        for _ in 0..10_000 {
            assert_eq!(sampler.poll(), PENDING);
            assert_eq!(sampler.phase(), Phase::Charging);
        }
        let (pin, ticks) = sampler.release();
        assert_eq!(pin.reads(), 10_000);
        assert_eq!(pin.ops.len(), 10_002);
        assert_eq!(ticks.peek(), 4_999);
    }

    #[test]
    fn cycle_across_wrap_matches_unwrapped_cycle() {
        let mut levels = vec![true];
        levels.extend(cycle(4));
        levels.push(true);

        let mut wrapping =
            Sampler::new(ScriptedPin::new(&levels), FreeRunningCounter::starting_at(Tick::MAX - 2), SamplerConfig::default()).unwrap();
        let mut plain = sampler(&levels);
        let mut wrapping_results = Vec::new();
        let mut plain_results = Vec::new();
        for _ in 0..levels.len() {
            wrapping_results.push(wrapping.poll());
            plain_results.push(plain.poll());
        }
        assert_eq!(wrapping_results.last(), Some(&ready(5)));
        assert_eq!(wrapping_results, plain_results);
    }

    #[test]
    fn drives_pin_through_cycle() {
        let mut sampler = sampler(&[true, false, true]);
        sampler.pin.take_ops();

        sampler.poll().unwrap();
        assert_eq!(sampler.pin.take_ops(), [PinOp::Read(true), PinOp::FloatingInput]);
        sampler.poll().unwrap();
        assert_eq!(sampler.pin.take_ops(), [PinOp::Read(false), PinOp::SetHigh, PinOp::Output]);
        sampler.poll().unwrap();
        assert_eq!(sampler.pin.take_ops(), [PinOp::Read(true), PinOp::FloatingInput]);
    }

    #[test]
    fn low_charge_level_inverts_pin() {
        let config = SamplerConfig::new().with_charge_level(PinState::Low);
        let mut sampler = Sampler::new(ScriptedPin::new(&[false, false, true, false]), FreeRunningCounter::new(), config).unwrap();
        assert_eq!(sampler.pin.take_ops(), [PinOp::SetLow, PinOp::Output]);
        assert_eq!(sampler.poll(), PENDING);
        assert_eq!(sampler.poll(), PENDING);
        assert_eq!(sampler.poll(), PENDING);
        assert_eq!(sampler.phase(), Phase::Charging);
        assert_eq!(sampler.poll(), ready(2));
    }

    #[test]
    fn charging_timeout_recharges_and_keeps_sampling() {
        let config = SamplerConfig::new().with_timeout(Some(5));
        let mut sampler = Sampler::new(ScriptedPin::new(&[]), FreeRunningCounter::new(), config).unwrap();
        for _ in 0..5 {
            assert_eq!(sampler.poll(), PENDING);
        }
        sampler.pin.take_ops();
        assert_eq!(
            sampler.poll(),
            Err(SamplerError::SensorTimeout {
                phase: Phase::Charging,
                ticks: 5
            })
        );
        assert_eq!(sampler.pin.take_ops(), [PinOp::Read(false), PinOp::SetHigh, PinOp::Output]);
        assert_eq!(sampler.phase(), Phase::Charging);
        for _ in 0..4 {
            assert_eq!(sampler.poll(), PENDING);
        }
        assert!(sampler.poll().is_err());
    }

    #[test]
    fn discharging_timeout_drops_cycle() {
        let config = SamplerConfig::new().with_timeout(Some(5));
        let mut levels = vec![true; 6];
        levels.extend([true, true, true, false, true]);
        let mut sampler = Sampler::new(ScriptedPin::new(&levels), FreeRunningCounter::new(), config).unwrap();
        for _ in 0..5 {
            assert_eq!(sampler.poll(), PENDING);
        }
        assert_eq!(
            sampler.poll(),
            Err(SamplerError::SensorTimeout {
                phase: Phase::Discharging,
                ticks: 5
            })
        );
        assert_eq!(sampler.phase(), Phase::Charging);
        for _ in 0..4 {
            assert_eq!(sampler.poll(), PENDING);
        }
        assert_eq!(sampler.poll(), ready(3));
    }

    #[test]
    fn charging_timeout_counts_from_first_poll() {
        let config = SamplerConfig::new().with_timeout(Some(2));
        let mut sampler = Sampler::new(ScriptedPin::new(&[]), FreeRunningCounter::starting_at(1_000), config).unwrap();
        assert_eq!(sampler.poll(), PENDING);
        assert_eq!(sampler.poll(), PENDING);
        assert_eq!(
            sampler.poll(),
            Err(SamplerError::SensorTimeout {
                phase: Phase::Charging,
                ticks: 2
            })
        );
    }

    #[test]
    fn recharge_is_timed_from_the_discharged_poll() {
        let config = SamplerConfig::new().with_timeout(Some(3));
        let mut sampler = Sampler::new(ScriptedPin::new(&[true, false]), FreeRunningCounter::new(), config).unwrap();
        assert_eq!(sampler.poll(), PENDING);
        assert_eq!(sampler.poll(), PENDING);
        assert_eq!(sampler.phase(), Phase::Charging);
        assert_eq!(sampler.poll(), PENDING);
        assert_eq!(sampler.poll(), PENDING);
        assert_eq!(
            sampler.poll(),
            Err(SamplerError::SensorTimeout {
                phase: Phase::Charging,
                ticks: 3
            })
        );
    }

    #[test]
    fn pin_failure_is_reported() {
        let result = Sampler::new(ScriptedPin::failing(), FreeRunningCounter::new(), SamplerConfig::default());
        assert!(matches!(result, Err(SamplerError::Gpio)));
    }

    #[test]
    fn borrowed_tick_source_is_advanced() {
        let mut counter = FreeRunningCounter::new();
        {
            let mut sampler = Sampler::new(ScriptedPin::new(&[]), &mut counter, SamplerConfig::default()).unwrap();
            for _ in 0..3 {
                sampler.poll().unwrap();
            }
        }
        assert_eq!(counter.peek(), 3);
    }
}
