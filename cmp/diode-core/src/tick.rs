use core::cell::Cell;

use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};
use embassy_time::Instant;

/// Free running reference counter value.
pub type Tick = u32;

/// Source of monotonically increasing ticks.
///
/// Values wrap silently after `Tick::MAX`, so differences between two ticks must always
/// be taken with [`elapsed`].
pub trait TickSource {
    /// Returns the current tick and advances the source.
    fn next_tick(&mut self) -> Tick;
}

impl<T: TickSource + ?Sized> TickSource for &mut T {
    fn next_tick(&mut self) -> Tick {
        (**self).next_tick()
    }
}

/// Ticks elapsed between `start` and `end`, correct across a single wraparound.
pub fn elapsed(start: Tick, end: Tick) -> Tick {
    end.wrapping_sub(start)
}

/// Counter that advances by exactly one per [`TickSource::next_tick`] call.
///
/// This turns the number of host loop iterations into the time base.
#[derive(Debug, Default, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FreeRunningCounter {
    tick: Tick,
}

impl FreeRunningCounter {
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    pub const fn starting_at(tick: Tick) -> Self {
        Self { tick }
    }

    /// Value the next call to `next_tick` will return.
    pub fn peek(&self) -> Tick {
        self.tick
    }
}

impl TickSource for FreeRunningCounter {
    fn next_tick(&mut self) -> Tick {
        let tick = self.tick;
        self.tick = tick.wrapping_add(1);
        tick
    }
}

/// [`FreeRunningCounter`] that can live in a `static` and be advanced through a shared
/// reference, e.g. from an interrupt handler and the main loop at the same time.
pub struct SharedTickCounter {
    tick: Mutex<CriticalSectionRawMutex, Cell<Tick>>,
}

impl SharedTickCounter {
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    pub const fn starting_at(tick: Tick) -> Self {
        Self {
            tick: Mutex::new(Cell::new(tick)),
        }
    }

    pub fn next_tick(&self) -> Tick {
        self.tick.lock(|tick| {
            let current = tick.get();
            tick.set(current.wrapping_add(1));
            current
        })
    }

    pub fn reset(&self, tick: Tick) {
        self.tick.lock(|current| current.set(tick));
    }
}

impl Default for SharedTickCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for &SharedTickCounter {
    fn next_tick(&mut self) -> Tick {
        SharedTickCounter::next_tick(*self)
    }
}

/// Hardware backed tick source reading the embassy time driver.
///
/// Advances by the timer ticks elapsed since the previous call instead of one per call,
/// so measurements taken with it are in `embassy_time::TICK_HZ` units.
#[derive(Debug, Default, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UptimeTicks;

impl TickSource for UptimeTicks {
    fn next_tick(&mut self) -> Tick {
        // truncation is the wraparound
        Instant::now().as_ticks() as Tick
    }
}
