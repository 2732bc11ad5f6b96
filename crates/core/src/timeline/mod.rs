use crate::entity::Signal;

/// Turns host frame timestamps (milliseconds) into per-frame deltas.
#[derive(Debug, Default, Clone)]
pub struct FrameClock {
    previous: Option<f64>,
    elapsed: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delta since the previous call. The first frame reports `0` so the
    /// animation does not jump by however long the host took to start.
    pub fn advance(&mut self, timestamp: f64) -> f64 {
        let delta = match self.previous {
            Some(previous) => (timestamp - previous).max(0.0),
            None => 0.0,
        };
        self.previous = Some(timestamp);
        self.elapsed += delta;
        delta
    }

    /// Session time in milliseconds.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

#[derive(Debug, Clone)]
struct ScheduledSignal {
    due: f64,
    seq: u64,
    signal: Signal,
}

/// One-shot timers on the session clock. Once scheduled a timer cannot be
/// cancelled.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now: f64,
    next_seq: u64,
    pending: Vec<ScheduledSignal>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, delay_ms: f64, signal: Signal) {
        self.pending.push(ScheduledSignal {
            due: self.now + delay_ms.max(0.0),
            seq: self.next_seq,
            signal,
        });
        self.next_seq += 1;
    }

    /// Moves the clock forward and returns the timers that came due, earliest
    /// first. Timers due at the same moment fire in scheduling order.
    pub fn advance(&mut self, dt: f64) -> Vec<Signal> {
        self.now += dt;
        let now = self.now;
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|timer| timer.due <= now);
        self.pending = pending;
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|timer| timer.signal).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
