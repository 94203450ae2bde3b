use crate::domain::market_data::SeriesChange;
use serde::{Deserialize, Serialize};

/// Playback speed multiplier. Presets are a UI convenience; any positive
/// finite value is accepted.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplaySpeed(f64);

impl ReplaySpeed {
    pub const PRESETS: [f64; 5] = [0.5, 1.0, 2.0, 4.0, 8.0];

    /// Delay for 1x playback.
    pub const BASE_INTERVAL_MS: f64 = 800.0;
    /// Floor so high speeds cannot flood the event loop.
    pub const MIN_INTERVAL_MS: u32 = 120;

    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value > 0.0).then_some(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// `max(120, round(800 / speed))` milliseconds.
    pub fn tick_interval_ms(&self) -> u32 {
        let raw = (Self::BASE_INTERVAL_MS / self.0).round();
        if raw >= u32::MAX as f64 {
            return u32::MAX;
        }
        (raw as u32).max(Self::MIN_INTERVAL_MS)
    }

    /// Next preset above the current speed, wrapping to the slowest.
    pub fn next_preset(&self) -> Self {
        let next = Self::PRESETS
            .iter()
            .copied()
            .find(|&p| p > self.0)
            .unwrap_or(Self::PRESETS[0]);
        Self(next)
    }
}

impl Default for ReplaySpeed {
    fn default() -> Self {
        Self(1.0)
    }
}

/// User and timer intents the replay reducer understands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ReplayAction {
    Toggle(bool),
    PlayPause,
    Restart,
    Seek(f64),
    SpeedChange(f64),
    StepForward,
    StepBackward,
    Tick,
}

/// Scrubber over the candle window.
///
/// `current_step` is 1-based (0 only without data) and always within
/// `0..=total_steps`. A disabled replay shows the whole series; playback
/// needs replay enabled and at least two steps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayState {
    pub enabled: bool,
    pub playing: bool,
    pub speed: ReplaySpeed,
    pub current_step: usize,
    pub total_steps: usize,
}

impl Default for ReplayState {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ReplayState {
    pub fn new(total_steps: usize) -> Self {
        Self {
            enabled: false,
            playing: false,
            speed: ReplaySpeed::default(),
            current_step: total_steps,
            total_steps,
        }
    }

    /// Pure reducer: the state after `action`.
    pub fn reduce(mut self, action: ReplayAction) -> Self {
        match action {
            ReplayAction::Toggle(enabled) => self.toggle(enabled),
            ReplayAction::PlayPause => self.play_pause(),
            ReplayAction::Restart if self.enabled => self.restart(),
            ReplayAction::Seek(value) if self.enabled => self.seek(value),
            // A disabled replay always shows the full series.
            ReplayAction::Restart | ReplayAction::Seek(_) => {}
            ReplayAction::SpeedChange(value) => self.speed_change(value),
            ReplayAction::StepForward => self.step_by(1),
            ReplayAction::StepBackward => self.step_by(-1),
            ReplayAction::Tick => self.tick(),
        }
        self
    }

    pub fn toggle(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.playing = false;
            self.current_step = self.total_steps;
        } else if self.current_step >= self.total_steps {
            self.current_step = self.first_step();
        }
    }

    pub fn play_pause(&mut self) {
        if !self.enabled {
            return;
        }
        if self.total_steps <= 1 {
            self.playing = false;
            return;
        }
        if !self.playing && self.at_end() {
            self.current_step = 1;
            self.playing = true;
            return;
        }
        self.playing = !self.playing;
    }

    pub fn restart(&mut self) {
        self.playing = false;
        self.current_step = self.first_step();
    }

    /// Clamp `round(value)` into `[1, total_steps]`; NaN lands on step 1.
    pub fn seek(&mut self, value: f64) {
        if self.total_steps == 0 {
            self.current_step = 0;
            return;
        }
        let rounded = value.round();
        self.current_step = if rounded.is_nan() || rounded < 1.0 {
            1
        } else if rounded >= self.total_steps as f64 {
            self.total_steps
        } else {
            rounded as usize
        };
    }

    pub fn speed_change(&mut self, value: f64) {
        if let Some(speed) = ReplaySpeed::new(value) {
            self.speed = speed;
        }
    }

    /// Manual step; pauses playback.
    fn step_by(&mut self, delta: i64) {
        if !self.enabled || self.total_steps == 0 {
            return;
        }
        self.playing = false;
        self.seek(self.current_step as f64 + delta as f64);
    }

    /// One autoplay step; stops on reaching the last step.
    pub fn tick(&mut self) {
        if !self.is_ticking() {
            return;
        }
        self.current_step += 1;
        if self.at_end() {
            self.playing = false;
        }
    }

    /// Keep the cursor on the same candle after the series changed.
    ///
    /// Inactive replay follows the new length. Active replay shifts by the
    /// candles inserted before the old oldest bar; appended bars lie past the
    /// window and leave the cursor alone.
    pub fn reconcile(&mut self, change: SeriesChange) {
        self.total_steps = change.new_len;
        if !self.enabled {
            self.current_step = self.total_steps;
            self.playing = false;
            return;
        }

        if change.previous_len == 0 {
            self.current_step = self.first_step();
        } else {
            self.current_step = self.current_step.saturating_add(change.prepended);
        }
        self.current_step = self.current_step.min(self.total_steps);
        if self.total_steps > 0 && self.current_step == 0 {
            self.current_step = 1;
        }
        if self.total_steps <= 1 || self.at_end() {
            self.playing = false;
        }
    }

    /// The timer should be running.
    pub fn is_ticking(&self) -> bool {
        self.enabled && self.playing && self.total_steps > 1 && self.current_step < self.total_steps
    }

    /// Autoplay period while ticking.
    pub fn tick_interval_ms(&self) -> Option<u32> {
        self.is_ticking().then(|| self.speed.tick_interval_ms())
    }

    /// Candles to show: the full series unless replay narrows it.
    pub fn visible_len(&self) -> usize {
        if self.enabled { self.current_step } else { self.total_steps }
    }

    /// Cursor is within two steps of the oldest loaded candle.
    pub fn near_start(&self) -> bool {
        self.enabled && self.total_steps > 0 && self.current_step <= 2
    }

    pub fn at_end(&self) -> bool {
        self.current_step >= self.total_steps
    }

    fn first_step(&self) -> usize {
        if self.total_steps > 1 { 1 } else { self.total_steps }
    }
}
