use core::cell::Cell;

use embassy_futures::yield_now;
use embassy_sync::{blocking_mutex::raw::NoopRawMutex, signal::Signal};
use embedded_io_async::Write;

use crate::{report::Report, sensor::Measurement};

/// Transmit side of the serial link as seen by the sampling loops.
pub trait SerialTx {
    /// A previous report is still being transmitted.
    fn is_busy(&self) -> bool;

    fn send(&mut self, report: Report);
}

impl<T: SerialTx + ?Sized> SerialTx for &mut T {
    fn is_busy(&self) -> bool {
        T::is_busy(self)
    }

    fn send(&mut self, report: Report) {
        T::send(self, report)
    }
}

/// Sends `measurement` unless the link is busy. Reports are never queued: while busy the
/// measurement is dropped and the next one gets its chance.
pub fn report(tx: &mut impl SerialTx, measurement: Measurement) -> bool {
    if tx.is_busy() {
        debug!("Serial> busy => {:?} dropped", measurement);
        return false;
    }
    tx.send(Report::new(measurement));
    true
}

pub struct State {
    busy: Cell<bool>,
    pending: Signal<NoopRawMutex, Report>,
}

impl State {
    pub fn new() -> Self {
        State {
            busy: Cell::new(false),
            pending: Signal::new(),
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to hand reports to the [`Runner`]. Busy from `send` until the runner has written
/// the report out.
pub struct ReportTx<'a> {
    state: &'a State,
}

impl ReportTx<'_> {
    /// Resolves once the last report has left the stream. Lets a loop that blocks between
    /// readings hand the executor to the [`Runner`] first.
    pub async fn wait_idle(&self) {
        while self.state.busy.get() {
            yield_now().await;
        }
    }
}

impl SerialTx for ReportTx<'_> {
    fn is_busy(&self) -> bool {
        self.state.busy.get()
    }

    fn send(&mut self, report: Report) {
        self.state.busy.set(true);
        self.state.pending.signal(report);
    }
}

pub struct Runner<'a, Stream: Write> {
    state: &'a State,
    stream: Stream,
}

impl<Stream: Write> Runner<'_, Stream> {
    pub async fn run(mut self) {
        loop {
            self.once().await;
        }
    }

    pub async fn once(&mut self) {
        let report = self.state.pending.wait().await;
        trace!("Serial.TX> {:?}", report);
        let written = match self.stream.write_all(report.as_bytes()).await {
            Ok(()) => self.stream.flush().await,
            Err(e) => Err(e),
        };
        if written.is_err() {
            warn!("Serial.TX> write failed => {:?} dropped", report);
        }
        self.state.busy.set(false);
    }
}

pub fn new<'a, Stream: Write>(state: &'a mut State, stream: Stream) -> (Runner<'a, Stream>, ReportTx<'a>) {
    let state = &*state;
    (Runner { state, stream }, ReportTx { state })
}
