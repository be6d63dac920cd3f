/// Custom egui Widgets
///
/// - toggle_switch: iOS-style switch painted over a checkbox state
/// - ToggleRegistry: checked state and change queue behind every switch
/// - terminal_viewport: monospace log viewer

use crate::models::{FilterId, GroupId};
use eframe::egui;
use egui::{Color32, Stroke, Vec2};
use std::collections::HashMap;

/// Identity of a checkbox on the page
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ToggleKey {
    Filter(FilterId),
    Group(GroupId),
    Setting(String),
}

impl ToggleKey {
    /// Keys owned by the filter list, dropped on every full re-render
    pub fn is_filter_scope(&self) -> bool {
        matches!(self, ToggleKey::Filter(_) | ToggleKey::Group(_))
    }
}

/// Synthetic change event produced by a click
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleChange {
    pub key: ToggleKey,
    pub checked: bool,
}

/// Checked state for decorated checkboxes.
///
/// A key is decorated once; decorating it again keeps the existing state
/// and doesn't add a second change handler. Clicks queue a `ToggleChange`,
/// programmatic `set_checked` does not.
#[derive(Debug, Default, Clone)]
pub struct ToggleRegistry {
    states: HashMap<ToggleKey, bool>,
    changes: Vec<ToggleChange>,
}

impl ToggleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decorate every key not yet decorated. Returns how many were new.
    pub fn decorate<I>(&mut self, items: I) -> usize
    where
        I: IntoIterator<Item = (ToggleKey, bool)>,
    {
        let mut added = 0;
        for (key, checked) in items {
            if !self.states.contains_key(&key) {
                self.states.insert(key, checked);
                added += 1;
            }
        }
        added
    }

    pub fn is_decorated(&self, key: &ToggleKey) -> bool {
        self.states.contains_key(key)
    }

    /// Active (switched on) state. Undecorated keys are inactive.
    pub fn is_active(&self, key: &ToggleKey) -> bool {
        self.states.get(key).copied().unwrap_or(false)
    }

    /// Invert the checkbox and queue a change event
    pub fn click(&mut self, key: &ToggleKey) -> Option<ToggleChange> {
        let state = self.states.get_mut(key)?;
        *state = !*state;
        let change = ToggleChange {
            key: key.clone(),
            checked: *state,
        };
        self.changes.push(change.clone());
        Some(change)
    }

    /// Force the state of a group of checkboxes without change events
    pub fn set_checked<'a, I>(&mut self, keys: I, checked: bool)
    where
        I: IntoIterator<Item = &'a ToggleKey>,
    {
        for key in keys {
            if let Some(state) = self.states.get_mut(key) {
                *state = checked;
            }
        }
    }

    pub fn take_changes(&mut self) -> Vec<ToggleChange> {
        std::mem::take(&mut self.changes)
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&ToggleKey) -> bool,
    {
        self.states.retain(|key, _| keep(key));
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Draws a toggle switch for `key` and forwards clicks to the registry
pub fn toggle_switch(
    ui: &mut egui::Ui,
    registry: &mut ToggleRegistry,
    key: &ToggleKey,
) -> egui::Response {
    let desired_size = ui.spacing().interact_size.y * Vec2::new(2.0, 1.0);
    let (rect, mut response) = ui.allocate_exact_size(desired_size, egui::Sense::click());

    if response.clicked() && registry.click(key).is_some() {
        response.mark_changed();
    }

    let on = registry.is_active(key);
    if ui.is_rect_visible(rect) {
        let how_on = ui.ctx().animate_bool(response.id, on);
        let visuals = ui.style().interact_selectable(&response, on);
        let rect = rect.expand(visuals.expansion);
        let radius = 0.5 * rect.height();

        let track = if on {
            Color32::from_rgb(0x67, 0xb2, 0x79)
        } else {
            visuals.bg_fill
        };
        ui.painter().rect(rect, radius, track, visuals.bg_stroke);

        let circle_x = egui::lerp((rect.left() + radius)..=(rect.right() - radius), how_on);
        let center = egui::pos2(circle_x, rect.center().y);
        ui.painter().circle(
            center,
            0.75 * radius,
            Color32::WHITE,
            Stroke::new(1.0, Color32::from_gray(120)),
        );
    }

    response
}

/// Terminal-style log viewer with monospace font
pub fn terminal_viewport<'a, I>(ui: &mut egui::Ui, lines: I)
where
    I: IntoIterator<Item = &'a String>,
{
    egui::ScrollArea::vertical()
        .auto_shrink([false; 2])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            let mut empty = true;
            for line in lines {
                empty = false;
                ui.monospace(line);
            }
            if empty {
                ui.monospace("Awaiting output...");
            }
        });
}
