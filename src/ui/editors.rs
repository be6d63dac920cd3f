/// Whitelist and User Filter Views
///
/// Both panels are a multiline editor with save/revert and text file
/// import/export. File dialogs go through rfd.

use crate::ui::controller::{EditorKind, PageController};
use eframe::egui;

pub fn render_whitelist(ui: &mut egui::Ui, controller: &mut PageController) {
    ui.heading("Whitelist");
    ui.label("Ad filtering is disabled on the websites listed here. One domain per line.");
    ui.separator();

    if !controller.whitelist.is_loaded() {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Loading whitelist...");
        });
        return;
    }

    if !controller.whitelist_errors.is_empty() {
        ui.group(|ui| {
            ui.colored_label(
                egui::Color32::from_rgb(255, 100, 100),
                "These lines are not valid domains:",
            );
            for (line_no, line) in &controller.whitelist_errors {
                ui.monospace(format!("{:>4}: {}", line_no, line));
            }
        });
    }

    let save = render_toolbar(ui, controller, EditorKind::Whitelist);
    render_text_area(ui, controller.whitelist.text_mut(), "whitelist_editor");
    if save {
        controller.save_whitelist();
    }
}

pub fn render_user_filter(ui: &mut egui::Ui, controller: &mut PageController) {
    ui.heading("User filter");
    ui.label("Your own blocking rules, one per line.");
    ui.separator();

    if !controller.user_rules.is_loaded() {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Loading rules...");
        });
        return;
    }

    let save = render_toolbar(ui, controller, EditorKind::UserFilter);
    render_text_area(ui, controller.user_rules.text_mut(), "user_filter_editor");
    if save {
        controller.save_user_rules();
    }
}

/// Save/Revert/Import/Export row. Returns true when Save was clicked.
fn render_toolbar(ui: &mut egui::Ui, controller: &mut PageController, kind: EditorKind) -> bool {
    let mut save = false;
    let editor = match kind {
        EditorKind::Whitelist => &controller.whitelist,
        EditorKind::UserFilter => &controller.user_rules,
    };
    let dirty = editor.is_dirty();
    let line_count = editor.lines().len();

    ui.horizontal(|ui| {
        if ui.add_enabled(dirty, egui::Button::new("Save")).clicked() {
            save = true;
        }
        if ui.add_enabled(dirty, egui::Button::new("Revert")).clicked() {
            match kind {
                EditorKind::Whitelist => controller.whitelist.revert(),
                EditorKind::UserFilter => controller.user_rules.revert(),
            }
        }
        ui.separator();

        if ui.button("Import...").clicked() {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("Text", &["txt"])
                .pick_file()
            {
                if let Err(e) = controller.import_editor_file(kind, &path) {
                    log::warn!("[UI] [EDITOR] Import from {} failed: {}", path.display(), e);
                    controller.error_message = Some(e.user_message());
                }
            }
        }
        if ui.button("Export...").clicked() {
            let name = match kind {
                EditorKind::Whitelist => "whitelist.txt",
                EditorKind::UserFilter => "rules.txt",
            };
            if let Some(path) = rfd::FileDialog::new().set_file_name(name).save_file() {
                match controller.export_editor_file(kind, &path) {
                    Ok(()) => {
                        controller.info_message = Some(format!("Exported to {}", path.display()))
                    }
                    Err(e) => controller.error_message = Some(e.user_message()),
                }
            }
        }

        ui.label(egui::RichText::new(format!("{} entries", line_count)).small());
        if dirty {
            ui.label(egui::RichText::new("unsaved changes").small().italics());
        }
    });
    save
}

fn render_text_area(ui: &mut egui::Ui, text: &mut String, id: &str) {
    egui::ScrollArea::vertical()
        .id_source(id)
        .auto_shrink([false; 2])
        .show(ui, |ui| {
            ui.add(
                egui::TextEdit::multiline(text)
                    .code_editor()
                    .desired_rows(20)
                    .desired_width(f32::INFINITY),
            );
        });
}
