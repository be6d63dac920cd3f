/// General Settings and About Views
///
/// Filtering options are backed by user settings on the service side and
/// drawn as toggle switches. Window preferences (theme, font size, debug
/// logging) are local and persisted through `SettingsManager`.
use crate::config::AppState;
use crate::models::setting_keys;
use crate::ui::controller::PageController;
use crate::ui::widgets::{toggle_switch, ToggleKey};
use eframe::egui;
use std::time::Instant;

pub const THEMES: [&str; 3] = ["Adblock", "Dark", "Light"];

/// User settings shown on the general panel, in display order
const SETTING_LABELS: [(&str, &str); 6] = [
    (setting_keys::ALLOW_ACCEPTABLE_ADS, "Allow search ads and self-promotion"),
    (setting_keys::AUTODETECT_FILTERS, "Activate relevant filters automatically"),
    (setting_keys::USE_OPTIMIZED_FILTERS, "Use optimized filters"),
    (setting_keys::SAFEBROWSING_ENABLED, "Enable phishing and malware protection"),
    (setting_keys::SHOW_PAGE_STATISTIC, "Show the number of blocked ads"),
    (
        setting_keys::SHOW_APP_UPDATED_NOTIFICATION,
        "Show notifications about extension updates",
    ),
];

/// Render the General settings panel (`#general-settings`).
///
/// Returns true when a window preference changed and needs saving.
pub fn render_general_settings(
    ui: &mut egui::Ui,
    controller: &mut PageController,
    app_state: &mut AppState,
    now: Instant,
) -> bool {
    ui.heading("General settings");
    ui.separator();

    let mut state_changed = false;

    ui.group(|ui| {
        ui.label(egui::RichText::new("Filtering").strong());
        ui.separator();
        if controller.session().is_none() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Waiting for the filtering service...");
            });
        } else {
            for (key, label) in SETTING_LABELS {
                ui.horizontal(|ui| {
                    toggle_switch(ui, &mut controller.toggles, &ToggleKey::Setting(key.to_string()));
                    ui.label(label);
                });
            }
        }
    });
    controller.process_toggle_changes();

    ui.add_space(8.0);
    ui.group(|ui| {
        ui.label(egui::RichText::new("Statistics & logs").strong());
        ui.separator();
        ui.horizontal(|ui| {
            if ui.button("Reset statistics").clicked() {
                controller.reset_stats(now);
            }
            if ui.button("Open log folder").clicked() {
                controller.open_log();
            }
            ui.label(
                egui::RichText::new(controller.log_dir().display().to_string())
                    .small()
                    .monospace(),
            );
        });
    });

    ui.add_space(8.0);
    ui.group(|ui| {
        ui.label(egui::RichText::new("Backup").strong());
        ui.separator();
        ui.horizontal(|ui| {
            if ui.button("Import settings...").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("JSON", &["json"])
                    .pick_file()
                {
                    // Failures are already shown as a popup
                    let _ = controller.import_settings_from_path(&path, now);
                }
            }
        });
    });

    ui.add_space(8.0);
    ui.group(|ui| {
        ui.label(egui::RichText::new("Appearance").strong());
        ui.separator();

        ui.horizontal(|ui| {
            ui.label("Theme:");
            let selected = THEMES.get(app_state.theme_idx).copied().unwrap_or(THEMES[0]);
            egui::ComboBox::from_id_source("settings_theme_combo")
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    for (i, theme) in THEMES.iter().enumerate() {
                        if ui
                            .selectable_value(&mut app_state.theme_idx, i, *theme)
                            .changed()
                        {
                            state_changed = true;
                        }
                    }
                });
        });

        ui.horizontal(|ui| {
            ui.label("Font size:");
            if ui
                .add(egui::Slider::new(&mut app_state.ui_font_size, 8.0..=24.0).text("pt"))
                .changed()
            {
                state_changed = true;
            }
        });

        if ui
            .checkbox(&mut app_state.restore_last_panel, "Reopen the last panel on start")
            .changed()
        {
            state_changed = true;
        }
        if ui
            .checkbox(&mut app_state.debug_logging, "Enable debug logging")
            .changed()
        {
            let level = if app_state.debug_logging {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            };
            log::set_max_level(level);
            log::info!("[UI] [SETTINGS] Log level set to {}", level);
            state_changed = true;
        }
    });

    state_changed
}

/// Render the About panel (`#about`)
pub fn render_about(ui: &mut egui::Ui, controller: &mut PageController) {
    ui.heading("About");
    ui.separator();

    let (version, platform) = match controller.session() {
        Some(session) => {
            let env = &session.environment_options;
            let platform = if env.is_mac_os {
                "macOS"
            } else if env.is_windows {
                "Windows"
            } else {
                "Linux"
            };
            (env.app_version.clone(), platform)
        }
        None => (crate::VERSION.to_string(), "unknown"),
    };

    egui::Grid::new("about_grid").num_columns(2).show(ui, |ui| {
        ui.label("Version:");
        ui.label(version);
        ui.end_row();
        ui.label("Platform:");
        ui.label(platform);
        ui.end_row();
        if let Some(session) = controller.session() {
            ui.label("Rules applied:");
            ui.label(session.request_filter_info.rules_count.to_string());
            ui.end_row();
            ui.label("Enabled filters:");
            ui.label(session.enabled_filters.len().to_string());
            ui.end_row();
        }
    });

    ui.add_space(8.0);
    if ui.button("Open store page").clicked() {
        controller.open_store();
    }
}
