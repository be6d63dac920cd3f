/// Filters View
///
/// Draws the category list and a single category panel from the
/// controller's view-models. Nothing here touches the cache; clicks are
/// collected as `FilterAction`s and applied once drawing is done.

use crate::filters::view::{format_timestamp, CategoryView, FilterListTab, FilterView};
use crate::models::{FilterId, GroupId};
use crate::ui::controller::PageController;
use crate::ui::widgets::{toggle_switch, ToggleKey};
use eframe::egui;

#[derive(Debug, Clone, PartialEq)]
enum FilterAction {
    Navigate(String),
    OpenHomepage(String),
    Remove(FilterId),
    AddCustomFilter,
    SelectTab(GroupId, FilterListTab),
    CheckUpdates,
}

/// Render the list of categories (`#antibanner`)
pub fn render_filters_root(ui: &mut egui::Ui, controller: &mut PageController) {
    ui.heading("Filters");
    ui.separator();

    let mut actions = Vec::new();

    ui.horizontal(|ui| {
        let checking = controller.is_checking_updates();
        let label = if checking { "Checking..." } else { "Check filters updates" };
        if ui.add_enabled(!checking, egui::Button::new(label)).clicked() {
            actions.push(FilterAction::CheckUpdates);
        }
        ui.label(
            egui::RichText::new(format!(
                "Last update: {}",
                format_timestamp(controller.index().last_update_time())
            ))
            .small(),
        );
    });
    ui.add_space(8.0);

    if controller.category_views().is_empty() {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Loading filters...");
        });
        apply_actions(controller, actions);
        return;
    }

    let views: Vec<CategoryView> = controller.category_views().to_vec();
    egui::ScrollArea::vertical()
        .auto_shrink([false; 2])
        .show(ui, |ui| {
            for view in &views {
                ui.group(|ui| {
                    ui.horizontal(|ui| {
                        if !view.shows_empty_state() {
                            toggle_switch(ui, &mut controller.toggles, &ToggleKey::Group(view.group_id));
                        }
                        ui.vertical(|ui| {
                            if ui.link(egui::RichText::new(&view.name).strong()).clicked() {
                                actions.push(FilterAction::Navigate(view.hash.clone()));
                            }
                            ui.label(
                                egui::RichText::new(format!(
                                    "Enabled filters: {} of {}",
                                    view.enabled_count, view.total_count
                                ))
                                .small(),
                            );
                        });
                    });
                });
            }
        });

    apply_actions(controller, actions);
}

/// Render one category panel (`#antibannerN`)
pub fn render_category(ui: &mut egui::Ui, controller: &mut PageController, group_id: GroupId) {
    let Some(view) = controller.category_view(group_id).cloned() else {
        ui.label("This category is not available.");
        return;
    };
    let mut actions = Vec::new();

    ui.horizontal(|ui| {
        if ui.button("< Filters").clicked() {
            actions.push(FilterAction::Navigate(crate::ui::router::FILTERS_HASH.to_string()));
        }
        ui.heading(&view.name);
        if !view.shows_empty_state() {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                toggle_switch(ui, &mut controller.toggles, &ToggleKey::Group(group_id));
            });
        }
    });
    ui.separator();

    if view.shows_empty_state() {
        ui.vertical_centered(|ui| {
            ui.add_space(24.0);
            ui.label("You have no custom filters yet");
            ui.label(
                egui::RichText::new("Subscribe to any filter list by its URL").small(),
            );
            ui.add_space(8.0);
            if ui.button("Add custom filter").clicked() {
                actions.push(FilterAction::AddCustomFilter);
            }
        });
        apply_actions(controller, actions);
        return;
    }

    let tab = if view.is_custom {
        FilterListTab::Other
    } else {
        let tab = controller.selected_tab(group_id);
        ui.horizontal(|ui| {
            for (candidate, label) in [
                (FilterListTab::Recommended, "Recommended"),
                (FilterListTab::Other, "Other"),
            ] {
                if ui.selectable_label(tab == candidate, label).clicked() && tab != candidate {
                    actions.push(FilterAction::SelectTab(group_id, candidate));
                }
            }
        });
        tab
    };

    if view.is_custom && ui.button("Add custom filter").clicked() {
        actions.push(FilterAction::AddCustomFilter);
    }

    // Custom filters always live in `other`
    let list: &[FilterView] = if view.is_custom {
        &view.other
    } else {
        view.filters(tab)
    };

    egui::ScrollArea::vertical()
        .auto_shrink([false; 2])
        .show(ui, |ui| {
            if list.is_empty() {
                ui.label("No filters in this list");
            }
            for filter in list {
                render_filter_row(ui, controller, filter, &mut actions);
            }
        });

    apply_actions(controller, actions);
}

fn render_filter_row(
    ui: &mut egui::Ui,
    controller: &mut PageController,
    filter: &FilterView,
    actions: &mut Vec<FilterAction>,
) {
    ui.group(|ui| {
        ui.set_width(ui.available_width());
        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(&filter.name).strong());
                    if filter.trusted {
                        ui.label(egui::RichText::new("trusted").small().italics());
                    }
                });
                if !filter.description.is_empty() {
                    ui.label(&filter.description);
                }
                ui.label(
                    egui::RichText::new(format!(
                        "version {}  updated: {}  rules: {}",
                        filter.version, filter.updated, filter.rules_count
                    ))
                    .small(),
                );
                if !filter.tags.is_empty() {
                    ui.horizontal_wrapped(|ui| {
                        for tag in &filter.tags {
                            ui.label(egui::RichText::new(format!("#{}", tag.keyword)).small())
                                .on_hover_text(&tag.description);
                        }
                    });
                }
                ui.horizontal(|ui| {
                    if let Some(ref homepage) = filter.homepage {
                        if ui.link("homepage").clicked() {
                            actions.push(FilterAction::OpenHomepage(homepage.clone()));
                        }
                    }
                    if filter.removable && ui.button("Delete").clicked() {
                        actions.push(FilterAction::Remove(filter.filter_id));
                    }
                });
            });
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                toggle_switch(ui, &mut controller.toggles, &ToggleKey::Filter(filter.filter_id));
            });
        });
    });
}

fn apply_actions(controller: &mut PageController, actions: Vec<FilterAction>) {
    for action in actions {
        match action {
            FilterAction::Navigate(hash) => {
                controller.navigate(&hash);
            }
            FilterAction::OpenHomepage(url) => controller.open_homepage(&url),
            FilterAction::Remove(filter_id) => controller.remove_custom_filter(filter_id),
            FilterAction::AddCustomFilter => controller.custom_filter.open(),
            FilterAction::SelectTab(group_id, tab) => controller.select_tab(group_id, tab),
            FilterAction::CheckUpdates => controller.check_updates(),
        }
    }
    // Clicks made while drawing become requests right away
    controller.process_toggle_changes();
}
