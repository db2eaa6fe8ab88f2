//! Main application struct for the Modulation Scope
//!
//! Contains the ScopeApp which implements eframe::App. The app owns the
//! UI state (tabs, parameter controls, status line) and talks to the scope
//! engine thread only through its command/event handle. Chart surfaces are
//! shared through the [`SurfaceRegistry`]: the app mounts a container the
//! first time its widget is laid out and draws whatever the engine wrote.

use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::egui::{self, Align, Layout, RichText, Slider};

use super::theme;
use crate::backend::{filter_bits, AnalogKind, AnalogRequest, DigitalKind, DigitalRequest};
use crate::config::ScopeConfig;
use crate::display::SurfaceRegistry;
use crate::dsp::SignalParameters;
use crate::engine::{DisplayId, ScopeCommand, ScopeEvent, ScopeHandle};
use crate::widgets::{oscilloscope_display, OscilloscopeConfig};

/// Quiet period after the last parameter edit before a backend request
/// goes out.
const REQUEST_DEBOUNCE: Duration = Duration::from_millis(500);

/// How long a status message stays in the status bar.
const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

const DISPLAY_HEIGHT: f32 = 220.0;

/// Top-level pages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tab {
    Analog,
    Digital,
}

impl Tab {
    pub fn name(&self) -> &'static str {
        match self {
            Tab::Analog => "Analog (AM / FM / PM)",
            Tab::Digital => "Digital (ASK / FSK / PSK)",
        }
    }

    /// Displays shown on this page.
    pub fn displays(&self) -> [DisplayId; 3] {
        match self {
            Tab::Analog => DisplayId::ANALOG,
            Tab::Digital => DisplayId::DIGITAL,
        }
    }
}

/// Fires once a quiet period has passed since the last `touch`.
#[derive(Debug)]
pub struct Debounce {
    delay: Duration,
    pending: Option<Instant>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Restart the quiet period.
    pub fn touch(&mut self, now: Instant) {
        self.pending = Some(now);
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// True exactly once, when the quiet period has elapsed.
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(at) if now.saturating_duration_since(at) >= self.delay => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }
}

struct StatusMessage {
    text: String,
    is_error: bool,
    shown_at: Instant,
}

/// Analog page controls.
struct AnalogControls {
    carrier: SignalParameters,
    modulating: SignalParameters,
    kind: AnalogKind,
    /// Set after the first explicit request; edits then refresh the
    /// modulated display automatically.
    active: bool,
}

impl AnalogControls {
    fn request(&self) -> AnalogRequest {
        AnalogRequest::from_signals(&self.carrier, &self.modulating, self.kind)
    }
}

/// Digital page controls.
struct DigitalControls {
    request: DigitalRequest,
    active: bool,
}

/// Main application state for the Modulation Scope
pub struct ScopeApp {
    engine: ScopeHandle,
    registry: Arc<SurfaceRegistry>,
    config: ScopeConfig,
    tab: Tab,
    analog: AnalogControls,
    digital: DigitalControls,
    analog_debounce: Debounce,
    digital_debounce: Debounce,
    /// Bits of the last digital response.
    last_bits: Vec<u8>,
    status: Option<StatusMessage>,
    /// Whether theme has been applied
    theme_applied: bool,
}

impl ScopeApp {
    pub fn new(engine: ScopeHandle, registry: Arc<SurfaceRegistry>, config: ScopeConfig) -> Self {
        let analog = AnalogControls {
            carrier: config.carrier,
            modulating: config.modulating,
            kind: AnalogKind::Am,
            active: false,
        };
        Self {
            engine,
            registry,
            config,
            tab: Tab::Analog,
            analog,
            digital: DigitalControls {
                request: DigitalRequest::default(),
                active: false,
            },
            analog_debounce: Debounce::new(REQUEST_DEBOUNCE),
            digital_debounce: Debounce::new(REQUEST_DEBOUNCE),
            last_bits: Vec::new(),
            status: None,
            theme_applied: false,
        }
    }

    fn send(&mut self, command: ScopeCommand) {
        if let Err(e) = self.engine.send(command) {
            self.show_error(e.to_string());
        }
    }

    fn show_info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
            shown_at: Instant::now(),
        });
    }

    fn show_error(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::warn!(message = %text, "showing error");
        self.status = Some(StatusMessage {
            text,
            is_error: true,
            shown_at: Instant::now(),
        });
    }

    fn request_analog(&mut self) {
        self.analog.active = true;
        self.analog_debounce.cancel();
        self.send(ScopeCommand::RequestAnalog(self.analog.request()));
    }

    fn request_digital(&mut self) {
        self.digital.active = true;
        self.digital_debounce.cancel();
        let mut request = self.digital.request.clone();
        if request.kind != DigitalKind::Fsk {
            request.fp_low = None;
            request.fp_high = None;
        }
        self.send(ScopeCommand::RequestDigital(request));
    }

    /// Unmount the current page's containers and re-attach the new page.
    fn switch_tab(&mut self, tab: Tab) {
        if tab == self.tab {
            return;
        }
        for display in self.tab.displays() {
            self.registry.unmount(display.container_id());
            self.send(ScopeCommand::Teardown(display));
        }
        for display in tab.displays() {
            self.send(ScopeCommand::Attach(display));
        }
        tracing::debug!(from = ?self.tab, to = ?tab, "switched page");
        self.tab = tab;
    }

    fn handle_events(&mut self) {
        let events: Vec<ScopeEvent> = self.engine.drain_events().collect();
        for event in events {
            match event {
                ScopeEvent::SurfaceReady(id) => {
                    tracing::debug!(display = %id, "surface ready");
                }
                ScopeEvent::ScrollStarted { display: id, params } => {
                    tracing::debug!(display = %id, frequency = params.frequency, "scroll restarted");
                }
                ScopeEvent::AnalogRendered { points } => {
                    self.show_info(format!(
                        "{} updated ({} points)",
                        self.analog.kind.title(),
                        points
                    ));
                }
                ScopeEvent::DigitalRendered { bits } => {
                    self.show_info(format!("{} updated", self.digital.request.kind.title()));
                    self.last_bits = bits;
                }
                ScopeEvent::Rejected(message) | ScopeEvent::BackendError(message) => {
                    self.show_error(message);
                }
                ScopeEvent::Stopped => self.show_error("Scope engine stopped"),
            }
        }
    }

    /// Draw the top toolbar with the page selector
    fn draw_toolbar(&self, ui: &mut egui::Ui, actions: &mut UiActions) {
        ui.horizontal(|ui| {
            ui.add_space(8.0);
            ui.label(
                RichText::new("MODULATION SCOPE")
                    .size(18.0)
                    .color(theme::text::PRIMARY)
                    .strong(),
            );

            ui.add_space(20.0);
            ui.separator();
            ui.add_space(20.0);

            for tab in [Tab::Analog, Tab::Digital] {
                let selected = self.tab == tab;
                if ui.selectable_label(selected, tab.name()).clicked() && !selected {
                    actions.switch_tab = Some(tab);
                }
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                let (text, color) = if self.engine.is_running() {
                    ("● Engine running", theme::accent::SUCCESS)
                } else {
                    ("○ Engine stopped", theme::text::DISABLED)
                };
                ui.label(RichText::new(text).color(color).small());
            });
        });
    }

    fn draw_analog_controls(&mut self, ui: &mut egui::Ui, actions: &mut UiActions) {
        ui.heading("Carrier");
        actions.carrier_changed |= signal_controls(ui, &mut self.analog.carrier);
        ui.add_space(12.0);

        ui.heading("Modulating signal");
        actions.modulating_changed |= signal_controls(ui, &mut self.analog.modulating);
        ui.add_space(12.0);

        ui.heading("Modulation");
        let before = self.analog.kind;
        egui::ComboBox::from_label("Type")
            .selected_text(self.analog.kind.name())
            .show_ui(ui, |ui| {
                for &kind in AnalogKind::all() {
                    ui.selectable_value(&mut self.analog.kind, kind, kind.title());
                }
            });
        actions.analog_kind_changed |= self.analog.kind != before;

        let index = self.analog.request().modulation_index;
        ui.label(
            RichText::new(format!("Modulation index m = {:.2}", index))
                .color(theme::text::SECONDARY),
        );
        if self.analog.modulating.frequency >= self.analog.carrier.frequency {
            ui.label(
                RichText::new("Modulating frequency must be below the carrier")
                    .color(theme::accent::ERROR)
                    .small(),
            );
        }

        ui.add_space(12.0);
        if ui.button("Modulate").clicked() {
            actions.modulate_analog = true;
        }
    }

    fn draw_digital_controls(&mut self, ui: &mut egui::Ui, actions: &mut UiActions) {
        let request = &mut self.digital.request;

        ui.heading("Carrier");
        let mut changed = ui
            .add(
                Slider::new(&mut request.carrier_amplitude, 1.0..=5.0)
                    .step_by(0.1)
                    .text("Amplitude (V)"),
            )
            .changed();
        changed |= ui
            .add(
                Slider::new(&mut request.carrier_frequency, 20.0..=5000.0)
                    .logarithmic(true)
                    .text("Frequency (Hz)"),
            )
            .changed();
        ui.add_space(12.0);

        ui.heading("Bit sequence");
        if ui.text_edit_singleline(&mut request.bit_sequence).changed() {
            request.bit_sequence = filter_bits(&request.bit_sequence);
            changed = true;
        }
        ui.add_space(12.0);

        ui.heading("Modulation");
        let before = request.kind;
        egui::ComboBox::from_label("Type")
            .selected_text(request.kind.name())
            .show_ui(ui, |ui| {
                for &kind in DigitalKind::all() {
                    ui.selectable_value(&mut request.kind, kind, kind.title());
                }
            });
        actions.digital_kind_changed |= request.kind != before;

        if request.kind == DigitalKind::Fsk {
            let low = request.fp_low.get_or_insert(800.0);
            changed |= ui
                .add(Slider::new(low, 20.0..=5000.0).logarithmic(true).text("f low (Hz)"))
                .changed();
            let high = request.fp_high.get_or_insert(1200.0);
            changed |= ui
                .add(Slider::new(high, 20.0..=5000.0).logarithmic(true).text("f high (Hz)"))
                .changed();
        }

        actions.digital_params_changed |= changed;
        ui.add_space(12.0);
        if ui.button("Modulate").clicked() {
            actions.modulate_digital = true;
        }
    }

    /// Draw one chart, mounting its container on first layout.
    fn draw_display(&self, ui: &mut egui::Ui, display: DisplayId) {
        let id = display.container_id();
        if !self.registry.is_mounted(id) {
            self.registry.mount(id);
        }

        let config = OscilloscopeConfig::new(ui.available_width(), DISPLAY_HEIGHT);
        let surface = self.registry.surface(id);
        let guard = surface.as_ref().map(|s| s.lock());
        oscilloscope_display(ui, display.title(), guard.as_deref(), &config);
    }

    fn draw_bits(&self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            ui.label(RichText::new("Bits:").color(theme::text::SECONDARY));
            for &bit in &self.last_bits {
                let color = if bit == 1 {
                    theme::bit::ONE
                } else {
                    theme::bit::ZERO
                };
                ui.label(
                    RichText::new(format!(" {} ", bit))
                        .monospace()
                        .strong()
                        .background_color(color)
                        .color(theme::text::PRIMARY),
                );
            }
        });
    }

    fn draw_main_area(&self, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical().show(ui, |ui| {
            if self.tab == Tab::Digital && !self.last_bits.is_empty() {
                self.draw_bits(ui);
                ui.add_space(8.0);
            }
            for display in self.tab.displays() {
                self.draw_display(ui, display);
                ui.add_space(8.0);
            }
        });
    }

    /// Draw the bottom status bar
    fn draw_status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.add_space(8.0);

            match &self.status {
                Some(status) if status.is_error => {
                    ui.label(
                        RichText::new(format!("⚠ {}", status.text))
                            .color(theme::accent::ERROR)
                            .small(),
                    );
                }
                Some(status) => {
                    ui.label(
                        RichText::new(&status.text)
                            .color(theme::text::SECONDARY)
                            .small(),
                    );
                }
                None => {
                    ui.label(RichText::new("Ready").color(theme::text::SECONDARY).small());
                }
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.label(
                    RichText::new(format!(
                        "window {:.2} s • tick {} ms",
                        self.config.scroll.window_duration, self.config.scroll.tick_period_ms
                    ))
                    .color(theme::text::DISABLED)
                    .small(),
                );
            });
        });
    }

    fn apply_actions(&mut self, actions: UiActions, now: Instant) {
        if let Some(tab) = actions.switch_tab {
            self.switch_tab(tab);
        }

        if actions.carrier_changed {
            self.send(ScopeCommand::SetCarrier(self.analog.carrier));
        }
        if actions.modulating_changed {
            self.send(ScopeCommand::SetModulating(self.analog.modulating));
        }
        if self.analog.active && (actions.carrier_changed || actions.modulating_changed) {
            self.analog_debounce.touch(now);
        }
        if actions.modulate_analog || (self.analog.active && actions.analog_kind_changed) {
            self.request_analog();
        }

        if self.digital.active && actions.digital_params_changed {
            self.digital_debounce.touch(now);
        }
        if actions.modulate_digital || (self.digital.active && actions.digital_kind_changed) {
            self.request_digital();
        }
    }
}

/// Amplitude/frequency/phase sliders. Returns whether anything changed.
fn signal_controls(ui: &mut egui::Ui, params: &mut SignalParameters) -> bool {
    let mut changed = ui
        .add(
            Slider::new(&mut params.amplitude, 1.0..=5.0)
                .step_by(0.1)
                .text("Amplitude (V)"),
        )
        .changed();
    changed |= ui
        .add(
            Slider::new(&mut params.frequency, 20.0..=5000.0)
                .logarithmic(true)
                .text("Frequency (Hz)"),
        )
        .changed();
    changed |= ui
        .add(Slider::new(&mut params.phase, 0.0..=std::f64::consts::TAU).text("Phase (rad)"))
        .changed();
    changed
}

/// Actions collected while drawing, applied after the panels are done
#[derive(Default)]
struct UiActions {
    switch_tab: Option<Tab>,
    carrier_changed: bool,
    modulating_changed: bool,
    analog_kind_changed: bool,
    modulate_analog: bool,
    digital_params_changed: bool,
    digital_kind_changed: bool,
    modulate_digital: bool,
}

impl eframe::App for ScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Apply theme on first frame
        if !self.theme_applied {
            theme::apply_theme(ctx);
            self.theme_applied = true;
        }

        self.handle_events();

        let now = Instant::now();
        if self.analog_debounce.ready(now) {
            self.request_analog();
        }
        if self.digital_debounce.ready(now) {
            self.request_digital();
        }
        if self
            .status
            .as_ref()
            .is_some_and(|s| now.saturating_duration_since(s.shown_at) > STATUS_TIMEOUT)
        {
            self.status = None;
        }

        let mut actions = UiActions::default();

        egui::TopBottomPanel::top("toolbar")
            .frame(
                egui::Frame::none()
                    .fill(theme::background::PANEL)
                    .inner_margin(egui::Margin::symmetric(0.0, 8.0)),
            )
            .show(ctx, |ui| self.draw_toolbar(ui, &mut actions));

        egui::TopBottomPanel::bottom("status_bar")
            .frame(
                egui::Frame::none()
                    .fill(theme::background::PANEL)
                    .inner_margin(egui::Margin::symmetric(0.0, 4.0)),
            )
            .show(ctx, |ui| self.draw_status_bar(ui));

        egui::SidePanel::left("controls")
            .resizable(false)
            .default_width(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| match self.tab {
                    Tab::Analog => self.draw_analog_controls(ui, &mut actions),
                    Tab::Digital => self.draw_digital_controls(ui, &mut actions),
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| self.draw_main_area(ui));

        // Handle deferred actions (to avoid borrow checker issues)
        self.apply_actions(actions, now);

        // Scrolling traces change every tick, debounced requests need a
        // frame after their quiet period.
        ctx.request_repaint_after(self.config.scroll.tick_period());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_displays() {
        assert!(Tab::Analog.displays().contains(&DisplayId::Carrier));
        assert!(Tab::Digital.displays().contains(&DisplayId::DigitalBits));
        assert!(!Tab::Digital.displays().contains(&DisplayId::Carrier));
    }

    #[test]
    fn test_debounce_fires_once_after_quiet_period() {
        let start = Instant::now();
        let mut debounce = Debounce::new(Duration::from_millis(500));
        assert!(!debounce.ready(start));

        debounce.touch(start);
        assert!(debounce.is_pending());
        assert!(!debounce.ready(start + Duration::from_millis(499)));
        assert!(debounce.ready(start + Duration::from_millis(500)));
        assert!(!debounce.ready(start + Duration::from_millis(900)));
    }

    #[test]
    fn test_debounce_touch_restarts_period() {
        let start = Instant::now();
        let mut debounce = Debounce::new(Duration::from_millis(500));
        debounce.touch(start);
        debounce.touch(start + Duration::from_millis(400));
        assert!(!debounce.ready(start + Duration::from_millis(600)));
        assert!(debounce.ready(start + Duration::from_millis(900)));

        debounce.touch(start);
        debounce.cancel();
        assert!(!debounce.ready(start + Duration::from_secs(10)));
    }
}
