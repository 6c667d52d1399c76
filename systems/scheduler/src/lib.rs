#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-rate tick scheduling and the input queue feeding it.
//!
//! The scheduler turns elapsed frame time into a whole number of fixed ticks.
//! Input producers only enqueue [`InputEvent`] values; the driver drains the
//! queue at frame boundaries, before running the ticks of that frame.

use std::{
    sync::mpsc::{self, Receiver, Sender},
    time::Duration,
};

use maze_chase_core::{Heading, InputEvent};
use serde::Deserialize;
use tracing::{debug, warn};

/// Tick rate and backlog limits.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of fixed ticks per simulated second.
    pub tick_rate_hz: u32,
    /// Upper bound on ticks produced by a single call to [`TickScheduler::advance`].
    pub max_ticks_per_advance: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            max_ticks_per_advance: 5,
        }
    }
}

/// Whether the scheduler is producing ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Elapsed time is converted into ticks.
    Running,
    /// Elapsed time is discarded until the scheduler resumes.
    Paused,
    /// The session ended; only a restart produces ticks again.
    Stopped,
}

/// Accumulates elapsed time and releases it as fixed ticks.
#[derive(Clone, Debug)]
pub struct TickScheduler {
    tick: Duration,
    max_ticks: u32,
    accumulator: Duration,
    state: RunState,
}

impl TickScheduler {
    /// Creates a running scheduler. A zero rate or limit falls back to one.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let rate = config.tick_rate_hz.max(1);
        Self {
            tick: Duration::from_secs(1) / rate,
            max_ticks: config.max_ticks_per_advance.max(1),
            accumulator: Duration::ZERO,
            state: RunState::Running,
        }
    }

    /// Duration of a single tick.
    #[must_use]
    pub const fn tick_duration(&self) -> Duration {
        self.tick
    }

    /// Current run state.
    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Adds `elapsed` to the accumulator and returns how many ticks to run.
    ///
    /// Backlog beyond `max_ticks_per_advance` is dropped so a stalled frame
    /// never triggers a spiral of catch-up ticks.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        if self.state != RunState::Running {
            return 0;
        }

        self.accumulator = self.accumulator.saturating_add(elapsed);
        let mut ticks = 0;
        while self.accumulator >= self.tick && ticks < self.max_ticks {
            self.accumulator -= self.tick;
            ticks += 1;
        }

        if self.accumulator >= self.tick {
            warn!(
                dropped_backlog_ms = self.accumulator.as_millis() as u64,
                max_ticks = self.max_ticks,
                "tick backlog dropped"
            );
            self.accumulator = Duration::ZERO;
        }
        ticks
    }

    /// Stops producing ticks while keeping the accumulated time.
    pub fn pause(&mut self) {
        if self.state == RunState::Running {
            self.state = RunState::Paused;
            debug!("scheduler paused");
        }
    }

    /// Resumes a paused scheduler. Stopped schedulers stay stopped.
    pub fn resume(&mut self) {
        if self.state == RunState::Paused {
            self.state = RunState::Running;
            debug!("scheduler resumed");
        }
    }

    /// Flips between running and paused.
    pub fn toggle_pause(&mut self) {
        match self.state {
            RunState::Running => self.pause(),
            RunState::Paused => self.resume(),
            RunState::Stopped => {}
        }
    }

    /// Halts tick production until [`TickScheduler::restart`].
    pub fn stop(&mut self) {
        self.state = RunState::Stopped;
        self.accumulator = Duration::ZERO;
        debug!("scheduler stopped");
    }

    /// Clears the accumulator and resumes tick production.
    pub fn restart(&mut self) {
        self.state = RunState::Running;
        self.accumulator = Duration::ZERO;
        debug!("scheduler restarted");
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

/// Creates a connected input producer and consumer.
#[must_use]
pub fn input_channel() -> (InputSender, InputQueue) {
    let (sender, receiver) = mpsc::channel();
    (InputSender { sender }, InputQueue { receiver })
}

/// Producer half of the input queue. Cheap to clone.
#[derive(Clone, Debug)]
pub struct InputSender {
    sender: Sender<InputEvent>,
}

impl InputSender {
    /// Enqueues an input event. Returns `false` once the queue is gone.
    pub fn send(&self, event: InputEvent) -> bool {
        self.sender.send(event).is_ok()
    }

    /// Parses a raw key name and enqueues it; unrecognized keys are ignored.
    pub fn send_key(&self, key: &str) -> bool {
        match key.parse::<InputEvent>() {
            Ok(event) => self.send(event),
            Err(error) => {
                warn!(%error, "ignoring input");
                false
            }
        }
    }
}

/// Input gathered since the previous frame boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Most recent heading request, if any.
    pub heading: Option<Heading>,
    /// Whether the pause state should flip. Pairs of toggles cancel out.
    pub toggle_pause: bool,
}

/// Consumer half of the input queue, owned by the driver.
#[derive(Debug)]
pub struct InputQueue {
    receiver: Receiver<InputEvent>,
}

impl InputQueue {
    /// Drains every pending event.
    pub fn drain(&self) -> TickInput {
        let mut input = TickInput::default();
        for event in self.receiver.try_iter() {
            match event.heading() {
                Some(heading) => input.heading = Some(heading),
                None => input.toggle_pause = !input.toggle_pause,
            }
        }
        input
    }
}
