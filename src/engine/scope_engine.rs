//! Scope Engine
//!
//! Owns every display's lifecycle on one dedicated thread running a
//! current-thread Tokio runtime. All timer ticks, readiness polls and
//! backend replies are serialized on that thread, so display buffers are
//! only ever written by one task at a time.
//!
//! Per display the engine:
//! 1. waits for the UI to mount the container ([`wait_for_surface`]),
//! 2. configures the surface's axes and series,
//! 3. starts a [`ScrollController`] (scrolling displays) or renders the
//!    latest backend data (static displays).
//!
//! A teardown cancels whichever of those steps is in progress.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::thread::JoinHandle as ThreadHandle;

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;

use super::channels::{EngineChannels, EngineHandle, EventSender, UiHandle};
use super::commands::{ScopeCommand, ScopeEvent};
use super::displays::{render_clipped, render_steps, DisplayId};
use super::scroll::ScrollController;
use crate::backend::{
    AnalogRequest, AnalogResponse, DigitalRequest, DigitalResponse, DigitalSignals,
    ModulationBackend,
};
use crate::config::ScopeConfig;
use crate::display::{wait_for_surface, SeriesId, SharedSurface, SurfaceRegistry};
use crate::dsp::{clip, SampleSequence, SignalParameters};
use crate::error::{ScopeError, ScopeResult};

/// A surface that became available for a display.
struct SurfaceArrival {
    display: DisplayId,
    epoch: u64,
    surface: SharedSurface,
}

/// A backend reply tagged with the request generation it answers.
enum BackendReply {
    Analog {
        generation: u64,
        result: ScopeResult<AnalogResponse>,
    },
    Digital {
        generation: u64,
        result: ScopeResult<DigitalResponse>,
    },
}

/// Lifecycle state of one display.
#[derive(Default)]
struct DisplaySlot {
    /// Bumped on every attach; arrivals from older attaches are ignored.
    epoch: u64,
    waiter: Option<JoinHandle<()>>,
    surface: Option<(SharedSurface, SeriesId)>,
    scroller: Option<ScrollController>,
}

impl DisplaySlot {
    fn is_attached(&self) -> bool {
        self.waiter.is_some() || self.surface.is_some()
    }

    fn detach(&mut self) {
        if let Some(waiter) = self.waiter.take() {
            waiter.abort();
        }
        if let Some(mut scroller) = self.scroller.take() {
            scroller.stop();
        }
        self.surface = None;
    }
}

struct EngineState {
    config: ScopeConfig,
    registry: Arc<SurfaceRegistry>,
    backend: Arc<dyn ModulationBackend>,
    events: EventSender,
    arrivals: UnboundedSender<SurfaceArrival>,
    replies: UnboundedSender<BackendReply>,
    slots: HashMap<DisplayId, DisplaySlot>,
    carrier: SignalParameters,
    modulating: SignalParameters,
    analog: Option<SampleSequence>,
    digital: Option<DigitalSignals>,
    analog_generation: u64,
    digital_generation: u64,
    analog_task: Option<JoinHandle<()>>,
    digital_task: Option<JoinHandle<()>>,
}

impl EngineState {
    fn attach(&mut self, id: DisplayId) {
        let slot = self.slots.entry(id).or_default();
        if slot.is_attached() {
            tracing::debug!(display = %id, "display already attached");
            return;
        }
        slot.epoch += 1;
        let epoch = slot.epoch;

        let registry = self.registry.clone();
        let arrivals = self.arrivals.clone();
        let poll_interval = self.config.surface.poll_interval();
        slot.waiter = Some(tokio::spawn(async move {
            let surface =
                wait_for_surface(registry, id.container_id().to_string(), poll_interval)
                    .await;
            let _ = arrivals.send(SurfaceArrival {
                display: id,
                epoch,
                surface,
            });
        }));
    }

    fn teardown(&mut self, id: DisplayId) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.detach();
        }
        self.registry.release(id.container_id());
        tracing::debug!(display = %id, "display torn down");
    }

    fn on_surface_ready(&mut self, arrival: SurfaceArrival) {
        let id = arrival.display;
        let Some(slot) = self.slots.get_mut(&id) else {
            return;
        };
        if slot.epoch != arrival.epoch || slot.waiter.is_none() {
            tracing::debug!(display = %id, "ignoring surface from a cancelled attach");
            return;
        }
        slot.waiter = None;
        let series = id.layout(&self.config).apply(&arrival.surface);
        slot.surface = Some((arrival.surface, series));
        self.events.send(ScopeEvent::SurfaceReady(id));

        if id.is_scrolling() {
            self.restart_scroller(id);
        } else if let Err(e) = self.render_static(id) {
            tracing::warn!(display = %id, error = %e, "initial render failed");
        }
    }

    fn params_for(&self, id: DisplayId) -> Option<SignalParameters> {
        match id {
            DisplayId::Carrier => Some(self.carrier),
            DisplayId::Modulating => Some(self.modulating),
            _ => None,
        }
    }

    fn set_params(&mut self, id: DisplayId, params: SignalParameters) {
        if let Err(e) = params.validate() {
            tracing::warn!(display = %id, error = %e, "rejecting signal parameters");
            self.events.send(ScopeEvent::Rejected(e.to_string()));
            return;
        }
        match id {
            DisplayId::Carrier => self.carrier = params,
            DisplayId::Modulating => self.modulating = params,
            _ => return,
        }
        self.restart_scroller(id);
    }

    /// Start or restart a scrolling display with its current parameters.
    /// Waits silently when the surface is not ready yet.
    fn restart_scroller(&mut self, id: DisplayId) {
        let Some(params) = self.params_for(id) else {
            return;
        };
        let scroll = self.config.scroll;
        let policy = self.config.sampler;
        let Some(slot) = self.slots.get_mut(&id) else {
            return;
        };
        let Some((surface, series)) = slot.surface.clone() else {
            return;
        };

        if slot.scroller.is_none() {
            match ScrollController::new(surface, series, scroll, policy) {
                Ok(controller) => slot.scroller = Some(controller),
                Err(e) => {
                    tracing::error!(display = %id, error = %e, "cannot create scroll controller");
                    return;
                }
            }
        }
        let Some(controller) = slot.scroller.as_mut() else {
            return;
        };

        match controller.update(params) {
            Ok(true) => self
                .events
                .send(ScopeEvent::ScrollStarted { display: id, params }),
            Ok(false) => tracing::trace!(display = %id, "parameters unchanged, scroll continues"),
            Err(e) => self.events.send(ScopeEvent::Rejected(e.to_string())),
        }
    }

    fn request_analog(&mut self, request: AnalogRequest) {
        self.analog_generation += 1;
        let generation = self.analog_generation;
        if let Some(task) = self.analog_task.take() {
            task.abort();
        }

        tracing::debug!(
            generation,
            kind = request.kind.name(),
            backend = self.backend.name(),
            "requesting analog waveform"
        );
        let backend = self.backend.clone();
        let replies = self.replies.clone();
        self.analog_task = Some(tokio::spawn(async move {
            let result = backend.analog(&request).await;
            let _ = replies.send(BackendReply::Analog { generation, result });
        }));
    }

    fn request_digital(&mut self, request: DigitalRequest) {
        self.digital_generation += 1;
        let generation = self.digital_generation;
        if let Some(task) = self.digital_task.take() {
            task.abort();
        }

        tracing::debug!(
            generation,
            kind = request.kind.name(),
            backend = self.backend.name(),
            "requesting digital waveform"
        );
        let backend = self.backend.clone();
        let replies = self.replies.clone();
        self.digital_task = Some(tokio::spawn(async move {
            let result = backend.digital(&request).await;
            let _ = replies.send(BackendReply::Digital { generation, result });
        }));
    }

    fn on_backend_reply(&mut self, reply: BackendReply) {
        match reply {
            BackendReply::Analog { generation, result } => {
                if generation != self.analog_generation {
                    tracing::debug!(generation, "dropping stale analog response");
                    return;
                }
                self.analog_task = None;
                match result.and_then(AnalogResponse::into_sequence) {
                    Ok(samples) => {
                        let points = clip(samples.view(), self.config.display.analog_x_max).len();
                        self.analog = Some(samples);
                        self.render_group(&[DisplayId::AnalogModulated]);
                        self.events.send(ScopeEvent::AnalogRendered { points });
                    }
                    Err(e) => self.report_backend_error(e),
                }
            }
            BackendReply::Digital { generation, result } => {
                if generation != self.digital_generation {
                    tracing::debug!(generation, "dropping stale digital response");
                    return;
                }
                self.digital_task = None;
                match result.and_then(DigitalResponse::into_signals) {
                    Ok(signals) => {
                        let bits = signals.bit_sequence.clone();
                        self.digital = Some(signals);
                        self.render_group(&DisplayId::DIGITAL);
                        self.events.send(ScopeEvent::DigitalRendered { bits });
                    }
                    Err(e) => self.report_backend_error(e),
                }
            }
        }
    }

    fn report_backend_error(&self, error: ScopeError) {
        tracing::warn!(error = %error, "backend request failed, keeping last data");
        self.events.send(ScopeEvent::BackendError(error.to_string()));
    }

    fn render_group(&self, displays: &[DisplayId]) {
        for &id in displays {
            if let Err(e) = self.render_static(id) {
                tracing::warn!(display = %id, error = %e, "render failed");
            }
        }
    }

    /// Draw the latest backend data on a static display. Does nothing
    /// until both the surface and the data exist.
    fn render_static(&self, id: DisplayId) -> ScopeResult<bool> {
        let Some((surface, series)) = self
            .slots
            .get(&id)
            .and_then(|slot| slot.surface.as_ref())
        else {
            return Ok(false);
        };
        let analog_x_max = self.config.display.analog_x_max;
        let digital_x_max = self.config.display.digital_x_max;

        let rendered = match (id, &self.analog, &self.digital) {
            (DisplayId::AnalogModulated, Some(samples), _) => {
                render_clipped(surface, *series, samples, analog_x_max)?
            }
            (DisplayId::DigitalCarrier, _, Some(signals)) => {
                render_clipped(surface, *series, &signals.carrier, digital_x_max)?
            }
            (DisplayId::DigitalModulated, _, Some(signals)) => {
                render_clipped(surface, *series, &signals.modulated, digital_x_max)?
            }
            (DisplayId::DigitalBits, _, Some(signals)) => {
                render_steps(surface, *series, &signals.bits)?
            }
            _ => false,
        };
        if rendered {
            tracing::debug!(display = %id, "static display rendered");
        }
        Ok(rendered)
    }

    fn apply(&mut self, batch: Vec<ScopeCommand>) -> ControlFlow<()> {
        for command in batch {
            match command {
                ScopeCommand::Attach(display) => self.attach(display),
                ScopeCommand::SetCarrier(params) => self.set_params(DisplayId::Carrier, params),
                ScopeCommand::SetModulating(params) => {
                    self.set_params(DisplayId::Modulating, params)
                }
                ScopeCommand::RequestAnalog(request) => self.request_analog(request),
                ScopeCommand::RequestDigital(request) => self.request_digital(request),
                ScopeCommand::Teardown(display) => self.teardown(display),
                ScopeCommand::Shutdown => return ControlFlow::Break(()),
            }
        }
        ControlFlow::Continue(())
    }

    fn shutdown(&mut self) {
        for display in DisplayId::ALL {
            self.teardown(display);
        }
        for task in [self.analog_task.take(), self.digital_task.take()]
            .into_iter()
            .flatten()
        {
            task.abort();
        }
    }
}

/// Run the engine until a `Shutdown` command arrives or the UI handle is
/// dropped. Must be polled inside a Tokio runtime with time enabled.
pub(crate) async fn run_engine(
    config: ScopeConfig,
    registry: Arc<SurfaceRegistry>,
    backend: Arc<dyn ModulationBackend>,
    mut handle: EngineHandle,
) {
    let (arrivals, mut arrival_rx) = mpsc::unbounded_channel();
    let (replies, mut reply_rx) = mpsc::unbounded_channel();
    let events = handle.event_sender();

    let mut state = EngineState {
        carrier: config.carrier,
        modulating: config.modulating,
        config,
        registry,
        backend,
        events: events.clone(),
        arrivals,
        replies,
        slots: HashMap::new(),
        analog: None,
        digital: None,
        analog_generation: 0,
        digital_generation: 0,
        analog_task: None,
        digital_task: None,
    };

    tracing::info!(backend = state.backend.name(), "scope engine started");
    for display in DisplayId::ALL {
        state.attach(display);
    }

    loop {
        tokio::select! {
            batch = handle.next_batch() => {
                let Some(batch) = batch else {
                    tracing::debug!("command channel closed");
                    break;
                };
                if state.apply(batch).is_break() {
                    break;
                }
            }
            Some(arrival) = arrival_rx.recv() => state.on_surface_ready(arrival),
            Some(reply) = reply_rx.recv() => state.on_backend_reply(reply),
        }
    }

    state.shutdown();
    tracing::info!("scope engine stopped");
    events.send(ScopeEvent::Stopped);
}

/// Spawns the engine thread.
pub struct ScopeEngine;

impl ScopeEngine {
    /// Start the engine on a dedicated thread and return the UI's handle.
    pub fn spawn(
        config: ScopeConfig,
        registry: Arc<SurfaceRegistry>,
        backend: Arc<dyn ModulationBackend>,
    ) -> ScopeResult<ScopeHandle> {
        config.validate()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (ui, engine) = EngineChannels::new().split();

        let thread = std::thread::Builder::new()
            .name("scope-engine".into())
            .spawn(move || {
                runtime.block_on(run_engine(config, registry, backend, engine));
            })?;

        Ok(ScopeHandle {
            ui,
            thread: Some(thread),
        })
    }
}

/// The UI's side of a running engine. Dropping it shuts the engine down.
pub struct ScopeHandle {
    ui: UiHandle,
    thread: Option<ThreadHandle<()>>,
}

impl ScopeHandle {
    pub fn send(&self, command: ScopeCommand) -> ScopeResult<()> {
        self.ui.send_command(command)
    }

    pub fn set_carrier(&self, params: SignalParameters) -> ScopeResult<()> {
        self.send(ScopeCommand::SetCarrier(params))
    }

    pub fn set_modulating(&self, params: SignalParameters) -> ScopeResult<()> {
        self.send(ScopeCommand::SetModulating(params))
    }

    pub fn request_analog(&self, request: AnalogRequest) -> ScopeResult<()> {
        self.send(ScopeCommand::RequestAnalog(request))
    }

    pub fn request_digital(&self, request: DigitalRequest) -> ScopeResult<()> {
        self.send(ScopeCommand::RequestDigital(request))
    }

    pub fn attach(&self, display: DisplayId) -> ScopeResult<()> {
        self.send(ScopeCommand::Attach(display))
    }

    pub fn teardown(&self, display: DisplayId) -> ScopeResult<()> {
        self.send(ScopeCommand::Teardown(display))
    }

    pub fn try_recv_event(&mut self) -> Option<ScopeEvent> {
        self.ui.recv_event()
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = ScopeEvent> + '_ {
        self.ui.drain_events()
    }

    /// Whether the engine thread is still running.
    pub fn is_running(&self) -> bool {
        self.thread
            .as_ref()
            .is_some_and(|thread| !thread.is_finished())
    }

    /// Stop the engine and wait for its thread. Idempotent.
    pub fn shutdown(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        let _ = self.ui.send_command(ScopeCommand::Shutdown);
        if thread.join().is_err() {
            tracing::error!("scope engine thread panicked");
        }
    }
}

impl Drop for ScopeHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::backend::{AnalogKind, LocalBackend};
    use crate::display::AxisKind;

    /// Counts calls and delegates to the local math.
    #[derive(Default)]
    struct CountingBackend {
        analog_calls: AtomicUsize,
    }

    #[async_trait]
    impl ModulationBackend for CountingBackend {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn analog(&self, request: &AnalogRequest) -> ScopeResult<AnalogResponse> {
            self.analog_calls.fetch_add(1, Ordering::SeqCst);
            LocalBackend::compute_analog(request)
        }

        async fn digital(&self, request: &DigitalRequest) -> ScopeResult<DigitalResponse> {
            LocalBackend::compute_digital(request)
        }
    }

    struct Harness {
        ui: UiHandle,
        registry: Arc<SurfaceRegistry>,
        engine: JoinHandle<()>,
    }

    impl Harness {
        fn start(mounted: &[DisplayId], backend: Arc<dyn ModulationBackend>) -> Self {
            let registry = Arc::new(SurfaceRegistry::new());
            for display in mounted {
                registry.mount(display.container_id());
            }
            let (ui, engine) = EngineChannels::new().split();
            let engine = tokio::spawn(run_engine(
                ScopeConfig::default(),
                registry.clone(),
                backend,
                engine,
            ));
            Self {
                ui,
                registry,
                engine,
            }
        }

        fn events(&mut self) -> Vec<ScopeEvent> {
            self.ui.drain_events().collect()
        }

        fn surface(&self, display: DisplayId) -> SharedSurface {
            self.registry.surface(display.container_id()).unwrap()
        }

        fn points(&self, display: DisplayId) -> usize {
            self.surface(display).lock().series()[0].data.len()
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    fn analog_request() -> AnalogRequest {
        AnalogRequest {
            carrier_amplitude: 5.0,
            carrier_frequency: 300.0,
            modulating_frequency: 20.0,
            modulation_index: 0.6,
            kind: AnalogKind::Am,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_mounted_scrollers_start() {
        let mut h = Harness::start(&DisplayId::ANALOG, Arc::new(LocalBackend::new()));
        settle().await;

        let events = h.events();
        assert!(events.contains(&ScopeEvent::SurfaceReady(DisplayId::Carrier)));
        assert!(events.contains(&ScopeEvent::ScrollStarted {
            display: DisplayId::Carrier,
            params: SignalParameters::CARRIER,
        }));
        assert!(events.contains(&ScopeEvent::ScrollStarted {
            display: DisplayId::Modulating,
            params: SignalParameters::MODULATING,
        }));
        // Static display is configured but empty until the backend answers.
        assert!(events.contains(&ScopeEvent::SurfaceReady(DisplayId::AnalogModulated)));
        assert_eq!(h.points(DisplayId::AnalogModulated), 0);

        assert_eq!(h.points(DisplayId::Carrier), 1001);
        let x = h.surface(DisplayId::Carrier).lock().axis(AxisKind::X).visible_range;
        assert_eq!((x.min, x.max), (0.0, 0.1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scroll_advances_on_engine() {
        let h = Harness::start(&[DisplayId::Carrier], Arc::new(LocalBackend::new()));
        settle().await;
        tokio::time::sleep(Duration::from_millis(120)).await;

        let x = h.surface(DisplayId::Carrier).lock().axis(AxisKind::X).visible_range;
        assert!((x.min - 0.002).abs() < 1e-12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_late_mount() {
        let mut h = Harness::start(&[], Arc::new(LocalBackend::new()));
        settle().await;
        assert!(h.events().is_empty());

        h.registry.mount(DisplayId::Carrier.container_id());
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(h
            .events()
            .contains(&ScopeEvent::SurfaceReady(DisplayId::Carrier)));
        assert_eq!(h.points(DisplayId::Carrier), 1001);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_carrier_restarts_once() {
        let mut h = Harness::start(&[DisplayId::Carrier], Arc::new(LocalBackend::new()));
        settle().await;
        h.events();

        let params = SignalParameters::new(2.0, 100.0, 0.5).unwrap();
        h.ui.send_command(ScopeCommand::SetCarrier(params)).unwrap();
        settle().await;
        assert_eq!(
            h.events(),
            vec![ScopeEvent::ScrollStarted {
                display: DisplayId::Carrier,
                params,
            }]
        );

        // Same parameters again: no restart.
        h.ui.send_command(ScopeCommand::SetCarrier(params)).unwrap();
        settle().await;
        assert!(h.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_parameters_rejected() {
        let mut h = Harness::start(&[DisplayId::Carrier], Arc::new(LocalBackend::new()));
        settle().await;
        h.events();

        let bad = SignalParameters {
            amplitude: 1.0,
            frequency: f64::NAN,
            phase: 0.0,
        };
        h.ui.send_command(ScopeCommand::SetCarrier(bad)).unwrap();
        settle().await;

        let events = h.events();
        assert!(matches!(events.as_slice(), [ScopeEvent::Rejected(_)]));
        assert_eq!(h.points(DisplayId::Carrier), 1001);
    }

    #[tokio::test(start_paused = true)]
    async fn test_analog_request_renders_clipped() {
        let mut h = Harness::start(&DisplayId::ANALOG, Arc::new(LocalBackend::new()));
        settle().await;
        h.events();

        h.ui.send_command(ScopeCommand::RequestAnalog(analog_request()))
            .unwrap();
        settle().await;

        assert!(h
            .events()
            .contains(&ScopeEvent::AnalogRendered { points: 500 }));
        assert_eq!(h.points(DisplayId::AnalogModulated), 500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backend_error_keeps_last_data() {
        let mut h = Harness::start(&DisplayId::ANALOG, Arc::new(LocalBackend::new()));
        settle().await;
        h.ui.send_command(ScopeCommand::RequestAnalog(analog_request()))
            .unwrap();
        settle().await;
        h.events();

        let mut bad = analog_request();
        bad.modulating_frequency = 400.0;
        h.ui.send_command(ScopeCommand::RequestAnalog(bad)).unwrap();
        settle().await;

        let events = h.events();
        assert!(matches!(events.as_slice(), [ScopeEvent::BackendError(_)]));
        assert_eq!(h.points(DisplayId::AnalogModulated), 500);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_requests_coalesce() {
        let backend = Arc::new(CountingBackend::default());
        let mut h = Harness::start(&DisplayId::ANALOG, backend.clone());
        settle().await;
        h.events();

        for _ in 0..5 {
            h.ui.send_command(ScopeCommand::RequestAnalog(analog_request()))
                .unwrap();
        }
        settle().await;

        assert_eq!(backend.analog_calls.load(Ordering::SeqCst), 1);
        let rendered = h
            .events()
            .into_iter()
            .filter(|e| matches!(e, ScopeEvent::AnalogRendered { .. }))
            .count();
        assert_eq!(rendered, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_data_before_mount_renders_on_ready() {
        let mut h = Harness::start(&[], Arc::new(LocalBackend::new()));
        settle().await;
        h.ui.send_command(ScopeCommand::RequestDigital(DigitalRequest::default()))
            .unwrap();
        settle().await;
        assert!(h.events().contains(&ScopeEvent::DigitalRendered {
            bits: vec![1, 0, 1, 1, 0, 0, 1, 0],
        }));

        for display in DisplayId::DIGITAL {
            h.registry.mount(display.container_id());
        }
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(h.points(DisplayId::DigitalCarrier), 2000);
        assert_eq!(h.points(DisplayId::DigitalModulated), 2000);
        // 10110010 has five level changes, each adding one hold point.
        assert_eq!(h.points(DisplayId::DigitalBits), 2005);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_stops_updates() {
        let mut h = Harness::start(&[DisplayId::Carrier], Arc::new(LocalBackend::new()));
        settle().await;
        let surface = h.surface(DisplayId::Carrier);

        h.ui.send_command(ScopeCommand::Teardown(DisplayId::Carrier))
            .unwrap();
        settle().await;
        assert!(h.registry.surface(DisplayId::Carrier.container_id()).is_none());

        let revision = surface.lock().series()[0].data.revision();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(surface.lock().series()[0].data.revision(), revision);

        // Re-attaching brings the display back with the same parameters.
        h.events();
        h.ui.send_command(ScopeCommand::Attach(DisplayId::Carrier))
            .unwrap();
        settle().await;
        assert!(h
            .events()
            .contains(&ScopeEvent::SurfaceReady(DisplayId::Carrier)));
        assert_eq!(h.points(DisplayId::Carrier), 1001);
    }

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_lifecycle_logs_name_the_display() {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let h = Harness::start(&[DisplayId::Carrier], Arc::new(LocalBackend::new()));
        settle().await;
        h.ui.send_command(ScopeCommand::Teardown(DisplayId::Carrier))
            .unwrap();
        settle().await;

        let logs = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
        assert!(logs.contains("display torn down"));
        assert!(logs.contains("display=carrier-oscilloscope"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_before_ready_cancels_wait() {
        let mut h = Harness::start(&[], Arc::new(LocalBackend::new()));
        settle().await;
        h.ui.send_command(ScopeCommand::Teardown(DisplayId::Carrier))
            .unwrap();
        settle().await;

        h.registry.mount(DisplayId::Carrier.container_id());
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(!h
            .events()
            .contains(&ScopeEvent::SurfaceReady(DisplayId::Carrier)));
        assert!(h.registry.surface(DisplayId::Carrier.container_id()).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_loop() {
        let mut h = Harness::start(&[DisplayId::Carrier], Arc::new(LocalBackend::new()));
        settle().await;

        h.ui.send_command(ScopeCommand::Shutdown).unwrap();
        (&mut h.engine).await.unwrap();

        assert_eq!(h.events().last(), Some(&ScopeEvent::Stopped));
        assert!(h.ui.send_command(ScopeCommand::Shutdown).is_err());
    }

    #[test]
    fn test_spawned_engine_shuts_down() {
        let registry = Arc::new(SurfaceRegistry::new());
        let mut handle = ScopeEngine::spawn(
            ScopeConfig::default(),
            registry,
            Arc::new(LocalBackend::new()),
        )
        .unwrap();
        assert!(handle.set_carrier(SignalParameters::CARRIER).is_ok());

        handle.shutdown();
        assert!(!handle.is_running());
        assert!(handle.drain_events().any(|e| e == ScopeEvent::Stopped));
        assert!(handle.set_carrier(SignalParameters::CARRIER).is_err());
    }

    #[test]
    fn test_spawn_rejects_invalid_config() {
        let mut config = ScopeConfig::default();
        config.scroll.tick_period_ms = 0;
        assert!(matches!(
            ScopeEngine::spawn(
                config,
                Arc::new(SurfaceRegistry::new()),
                Arc::new(LocalBackend::new())
            ),
            Err(ScopeError::Config(_))
        ));
    }
}
