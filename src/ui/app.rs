/// Main App Orchestrator and UI State Management
///
/// Provides the eframe::App implementation for the options window. Each
/// frame drains backend push events into the controller, applies the
/// theme, then draws navigation, messages, the active panel and the
/// custom filter dialog.

use crate::backend::BackendEvent;
use crate::config::{AppState, SettingsManager};
use crate::log_collector::LogLine;
use crate::ui::controller::PageController;
use crate::ui::router::Panel;
use eframe::egui;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Lines kept in the in-window log view
const MAX_LOG_LINES: usize = 2000;

/// Transient UI state - state that doesn't persist across sessions
#[derive(Clone)]
pub struct UIState {
    /// Dirty flag: set when data changes, cleared after repaint request
    pub needs_repaint: bool,

    /// Last repaint time (for idle-based fallback repaints)
    pub last_repaint_time: Instant,

    /// Recent log lines for the log panel
    pub log_lines: VecDeque<String>,

    /// Whether the log panel is expanded
    pub show_log: bool,

    /// Whether the saved panel hash has been applied
    pub initial_panel_restored: bool,

    /// Cached theme index to avoid recalculating visuals
    pub cached_theme_idx: Option<usize>,

    /// Cached font size to avoid resetting pixels_per_point every frame
    pub cached_font_size: Option<f32>,
}

impl Default for UIState {
    fn default() -> Self {
        Self {
            needs_repaint: true,
            last_repaint_time: Instant::now(),
            log_lines: VecDeque::with_capacity(MAX_LOG_LINES),
            show_log: false,
            initial_panel_restored: false,
            cached_theme_idx: None,
            cached_font_size: None,
        }
    }
}

/// Main Application UI Structure
pub struct AppUI {
    /// Page state and backend access
    pub controller: PageController,

    /// Persisted window preferences
    pub app_state: AppState,

    /// Transient UI state
    pub ui_state: UIState,

    /// Push events from the filtering service
    pub events_rx: Option<mpsc::Receiver<BackendEvent>>,

    /// Log lines mirrored from the LogCollector
    pub log_rx: Option<mpsc::Receiver<LogLine>>,
}

impl AppUI {
    pub fn new(
        controller: PageController,
        app_state: AppState,
        events_rx: Option<mpsc::Receiver<BackendEvent>>,
        log_rx: Option<mpsc::Receiver<LogLine>>,
    ) -> Self {
        Self {
            controller,
            app_state,
            ui_state: UIState::default(),
            events_rx,
            log_rx,
        }
    }

    /// Process all pending backend events from the channel.
    /// Returns the number of events handled.
    pub fn process_backend_events(&mut self) -> usize {
        let mut handled = 0;
        if let Some(ref mut rx) = self.events_rx {
            let now = Instant::now();
            while let Ok(event) = rx.try_recv() {
                self.controller.handle_event(event, now);
                handled += 1;
            }
        }
        if handled > 0 {
            self.ui_state.needs_repaint = true;
        }
        handled
    }

    /// Move mirrored log lines into the bounded log view buffer
    pub fn process_log_lines(&mut self) {
        if let Some(ref mut rx) = self.log_rx {
            while let Ok(line) = rx.try_recv() {
                self.ui_state.log_lines.push_back(line.formatted());
                while self.ui_state.log_lines.len() > MAX_LOG_LINES {
                    self.ui_state.log_lines.pop_front();
                }
                self.ui_state.needs_repaint = true;
            }
        }
    }

    /// Navigate to the saved panel once the session is known. Category
    /// hashes are deferred by the router until categories exist.
    fn restore_initial_panel(&mut self) {
        if self.ui_state.initial_panel_restored || self.controller.session().is_none() {
            return;
        }
        self.ui_state.initial_panel_restored = true;
        if self.app_state.restore_last_panel && !self.app_state.last_panel_hash.is_empty() {
            let hash = self.app_state.last_panel_hash.clone();
            log::debug!("[UI] Restoring last panel {}", hash);
            self.controller.navigate(&hash);
        }
    }

    /// Remember the visible panel so the next start can reopen it
    fn track_panel(&mut self) {
        if self.controller.router().pending().is_some() {
            return;
        }
        let hash = self.controller.current_panel().hash();
        if self.app_state.last_panel_hash != hash {
            self.app_state.last_panel_hash = hash;
            self.persist_state();
        }
    }

    fn persist_state(&self) {
        match SettingsManager::save(&self.app_state) {
            Ok(path) => log::debug!("[UI] Window preferences saved to {}", path.display()),
            Err(e) => log::warn!("[UI] Failed to save window preferences: {}", e),
        }
    }

    /// Render the navigation column
    fn render_nav(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("nav_panel")
            .resizable(false)
            .exact_width(190.0)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                ui.heading("Settings");
                ui.separator();

                let highlight = self.controller.router().nav_highlight();
                for panel in Panel::NAV {
                    if ui
                        .selectable_label(highlight == panel, panel.label())
                        .clicked()
                    {
                        self.controller.show_panel(panel);
                    }
                }

                ui.with_layout(egui::Layout::bottom_up(egui::Align::LEFT), |ui| {
                    ui.add_space(4.0);
                    let label = if self.ui_state.show_log { "Hide log" } else { "Show log" };
                    if ui.button(label).clicked() {
                        self.ui_state.show_log = !self.ui_state.show_log;
                    }
                });
            });
    }

    /// Render transient messages (errors, info)
    fn render_messages(&mut self, ctx: &egui::Context) {
        if let Some(msg) = self.controller.error_message.clone() {
            egui::TopBottomPanel::top("error_panel").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(
                        egui::Color32::from_rgb(255, 100, 100),
                        format!("Error: {}", msg),
                    );
                    if ui.button("Dismiss").clicked() {
                        self.controller.error_message = None;
                    }
                });
            });
        }

        if let Some(msg) = self.controller.info_message.clone() {
            egui::TopBottomPanel::top("info_panel").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(egui::Color32::from_rgb(100, 150, 255), msg);
                    if ui.button("Dismiss").clicked() {
                        self.controller.info_message = None;
                    }
                });
            });
        }
    }

    /// Render the timed popups anchored to the bottom right
    fn render_popups(&mut self, ctx: &egui::Context, now: Instant) {
        let popups = [
            ("reset_popup", self.controller.reset_popup()),
            ("notice_popup", self.controller.notice_popup()),
        ];
        let mut offset = -12.0;
        for (id, popup) in popups {
            if !popup.is_visible(now) {
                continue;
            }
            let Some(message) = popup.message() else {
                continue;
            };
            egui::Area::new(egui::Id::new(id))
                .anchor(egui::Align2::RIGHT_BOTTOM, [-12.0, offset])
                .order(egui::Order::Foreground)
                .show(ctx, |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.label(egui::RichText::new(&message.title).strong());
                        if let Some(ref body) = message.body {
                            ui.label(body);
                        }
                    });
                });
            offset -= 64.0;
        }
    }

    fn render_log_panel(&mut self, ctx: &egui::Context) {
        if !self.ui_state.show_log {
            return;
        }
        egui::TopBottomPanel::bottom("log_panel")
            .resizable(true)
            .default_height(160.0)
            .show(ctx, |ui| {
                super::widgets::terminal_viewport(ui, self.ui_state.log_lines.iter());
            });
    }

    /// Render the central content based on the visible panel
    fn render_content(&mut self, ctx: &egui::Context, now: Instant) {
        let mut state_changed = false;
        egui::CentralPanel::default().show(ctx, |ui| match self.controller.current_panel() {
            Panel::General => {
                state_changed = super::settings::render_general_settings(
                    ui,
                    &mut self.controller,
                    &mut self.app_state,
                    now,
                );
            }
            Panel::Filters => super::filters::render_filters_root(ui, &mut self.controller),
            Panel::Category(group_id) => {
                super::filters::render_category(ui, &mut self.controller, group_id)
            }
            Panel::Whitelist => super::editors::render_whitelist(ui, &mut self.controller),
            Panel::UserFilter => super::editors::render_user_filter(ui, &mut self.controller),
            Panel::About => super::settings::render_about(ui, &mut self.controller),
        });
        if state_changed {
            self.persist_state();
        }
    }

    /// Apply theme and font size from the window preferences.
    /// Only re-applies when the values actually changed.
    fn apply_theme_from_state(&mut self, ctx: &egui::Context) {
        if self.ui_state.cached_theme_idx != Some(self.app_state.theme_idx) {
            let visuals = match self.app_state.theme_idx {
                1 => egui::Visuals::dark(),
                2 => egui::Visuals::light(),
                _ => Self::create_adblock_visuals(),
            };
            ctx.set_visuals(visuals);
            self.ui_state.cached_theme_idx = Some(self.app_state.theme_idx);
        }

        if self.ui_state.cached_font_size != Some(self.app_state.ui_font_size)
            && self.app_state.ui_font_size > 0.0
        {
            // Point sizes map onto pixels_per_point (baseline: 10.4pt)
            ctx.set_pixels_per_point(self.app_state.ui_font_size / 10.4);
            self.ui_state.cached_font_size = Some(self.app_state.ui_font_size);
        }
    }

    /// Green-accented dark theme
    fn create_adblock_visuals() -> egui::Visuals {
        let mut visuals = egui::Visuals::dark();

        let green = egui::Color32::from_rgb(0x67, 0xb2, 0x79);
        let dark_bg = egui::Color32::from_rgb(0x1e, 0x22, 0x25);
        let hover_bg = egui::Color32::from_rgb(0x2a, 0x30, 0x33);
        let text = egui::Color32::from_rgb(0xe0, 0xe4, 0xe6);

        visuals.panel_fill = dark_bg;
        visuals.window_fill = dark_bg;
        visuals.window_stroke.color = green;
        visuals.window_stroke.width = 1.0;

        visuals.selection.bg_fill = green.linear_multiply(0.5);
        visuals.selection.stroke.color = green;

        visuals.widgets.noninteractive.bg_fill = dark_bg;
        visuals.widgets.inactive.bg_fill = hover_bg;
        visuals.widgets.hovered.bg_fill = hover_bg;
        visuals.widgets.hovered.bg_stroke.color = green;
        visuals.widgets.active.bg_fill = green;

        visuals.override_text_color = Some(text);
        visuals.hyperlink_color = green;

        visuals
    }
}

impl eframe::App for AppUI {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();

        self.apply_theme_from_state(ctx);
        self.process_backend_events();
        self.process_log_lines();
        self.restore_initial_panel();

        // ADAPTIVE REPAINTING: repaint on new data, otherwise only when a
        // popup is due to hide or the idle fallback elapses
        const IDLE_REPAINT_INTERVAL_MS: u64 = 500;
        if self.ui_state.needs_repaint {
            ctx.request_repaint();
            self.ui_state.needs_repaint = false;
            self.ui_state.last_repaint_time = now;
        } else {
            ctx.request_repaint_after(Duration::from_millis(IDLE_REPAINT_INTERVAL_MS));
        }
        if let Some(until_hide) = self.controller.tick(now) {
            ctx.request_repaint_after(until_hide);
        }

        self.render_nav(ctx);
        self.render_messages(ctx);
        self.render_log_panel(ctx);
        self.render_content(ctx, now);
        self.render_popups(ctx, now);

        if let Some(request) =
            super::custom_filter::render_custom_filter_modal(ctx, &mut self.controller.custom_filter)
        {
            self.controller.submit_custom_filter_request(request);
        }

        self.track_panel();
    }
}
