//! Scroll window controller.
//!
//! Drives a scrolling oscilloscope trace. Every tick advances a time
//! offset, regenerates the samples of the visible window from the closed
//! form signal and replaces the display buffer with them. Nothing is
//! appended incrementally across ticks.
//!
//! The controller is `Idle` until [`ScrollController::start`] and returns
//! to `Idle` on [`ScrollController::stop`] or drop. At most one timer task
//! exists per controller: `start` always cancels the previous one first.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::ScrollConfig;
use crate::display::{AxisRange, DataSink, SeriesId, SharedSurface};
use crate::dsp::{SamplingPolicy, SignalParameters, TimeWindow};
use crate::error::{ScopeError, ScopeResult};

/// The per-run scroll state, owned by the tick task.
///
/// Separate from the timer so a single tick can be exercised without a
/// runtime.
pub struct Scroller {
    params: SignalParameters,
    config: ScrollConfig,
    policy: SamplingPolicy,
    surface: SharedSurface,
    series: SeriesId,
    /// Ticks since the last reset. The offset is derived from it rather
    /// than accumulated, so it does not drift over long runs.
    ticks: u64,
}

impl Scroller {
    pub fn new(
        params: SignalParameters,
        config: ScrollConfig,
        policy: SamplingPolicy,
        surface: SharedSurface,
        series: SeriesId,
    ) -> Self {
        Self {
            params,
            config,
            policy,
            surface,
            series,
            ticks: 0,
        }
    }

    pub fn params(&self) -> &SignalParameters {
        &self.params
    }

    /// Current offset of the visible window.
    pub fn offset(&self) -> f64 {
        self.ticks as f64 * self.config.tick_time_step
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::starting_at(self.offset(), self.config.window_duration)
    }

    /// Reset the offset and draw the static window `[0, window_duration]`.
    pub fn render_initial(&mut self) -> ScopeResult<TimeWindow> {
        self.ticks = 0;
        let window = self.window();
        self.render(window)?;
        Ok(window)
    }

    /// Advance one tick and redraw the shifted window.
    pub fn tick(&mut self) -> ScopeResult<TimeWindow> {
        self.ticks += 1;
        let window = self.window();
        self.render(window)?;
        Ok(window)
    }

    fn render(&self, window: TimeWindow) -> ScopeResult<()> {
        // Sample before taking the lock so the UI never waits on the math
        let samples = self.policy.sample(window, &self.params);

        let mut surface = self.surface.lock();
        surface.set_visible_x(AxisRange::new(window.start, window.end));
        let data = surface.data_mut(self.series)?;
        data.clear();
        data.append_range(samples.times(), samples.values());
        Ok(())
    }
}

/// Counts live tick tasks. Decrements when the task's future is dropped,
/// which happens on completion as well as on abort.
struct TimerGuard(Arc<AtomicUsize>);

impl TimerGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn run_ticks(mut scroller: Scroller, period: Duration, guard: TimerGuard) {
    let _guard = guard;
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        match scroller.tick() {
            Ok(window) => {
                tracing::trace!(start = window.start, end = window.end, "scroll tick");
            }
            Err(e) => {
                tracing::warn!(error = %e, "scroll tick failed, stopping timer");
                break;
            }
        }
    }
}

/// Owns the scroll timer of one scrolling display.
pub struct ScrollController {
    surface: SharedSurface,
    series: SeriesId,
    config: ScrollConfig,
    policy: SamplingPolicy,
    runtime: Handle,
    params: Option<SignalParameters>,
    timer: Option<JoinHandle<()>>,
    live_timers: Arc<AtomicUsize>,
}

impl ScrollController {
    /// Create an idle controller bound to `series` on `surface`.
    ///
    /// Must be called from inside a Tokio runtime; the timer task is
    /// spawned onto that runtime.
    pub fn new(
        surface: SharedSurface,
        series: SeriesId,
        config: ScrollConfig,
        policy: SamplingPolicy,
    ) -> ScopeResult<Self> {
        let runtime = Handle::try_current().map_err(|_| ScopeError::NoRuntime)?;
        Ok(Self {
            surface,
            series,
            config,
            policy,
            runtime,
            params: None,
            timer: None,
            live_timers: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Parameters of the current (or last) run.
    pub fn params(&self) -> Option<SignalParameters> {
        self.params
    }

    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    /// Whether a timer is armed.
    pub fn is_running(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    /// Number of tick tasks that still exist for this controller.
    pub fn active_timers(&self) -> usize {
        self.live_timers.load(Ordering::SeqCst)
    }

    /// The x range the surface currently shows.
    pub fn visible_range(&self) -> AxisRange {
        self.surface
            .lock()
            .axis(crate::display::AxisKind::X)
            .visible_range
    }

    /// Cancel any running timer, reset the offset, draw the initial window
    /// and arm a new timer.
    pub fn start(&mut self, params: SignalParameters) -> ScopeResult<()> {
        params.validate()?;
        self.stop();

        let mut scroller = Scroller::new(
            params,
            self.config,
            self.policy,
            self.surface.clone(),
            self.series,
        );
        let window = scroller.render_initial()?;

        let guard = TimerGuard::new(self.live_timers.clone());
        let period = self.config.tick_period();
        self.timer = Some(self.runtime.spawn(run_ticks(scroller, period, guard)));
        self.params = Some(params);

        tracing::debug!(
            surface = %self.surface.lock().id(),
            amplitude = params.amplitude,
            frequency = params.frequency,
            phase = params.phase,
            window_end = window.end,
            "scroll controller started"
        );
        Ok(())
    }

    /// Restart with new parameters. A running controller given identical
    /// parameters is left alone. Returns whether a restart happened.
    pub fn update(&mut self, params: SignalParameters) -> ScopeResult<bool> {
        if self.is_running() && self.params == Some(params) {
            return Ok(false);
        }
        self.start(params)?;
        Ok(true)
    }

    /// Cancel the timer. Safe to call when idle.
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            tracing::debug!(surface = %self.surface.lock().id(), "scroll controller stopped");
        }
    }
}

impl Drop for ScrollController {
    fn drop(&mut self) {
        self.stop();
    }
}
