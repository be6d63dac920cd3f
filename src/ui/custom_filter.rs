/// "Add custom filter" dialog
///
/// Steps: enter a URL, wait while the service downloads the list, then
/// approve it (title and trusted flag) or see why it failed.

use crate::backend::BackendRequest;
use crate::models::CustomFilterInfo;
use eframe::egui;

#[derive(Debug, Clone, PartialEq)]
pub enum ModalState {
    Closed,
    EnterUrl { url: String, error: Option<String> },
    Checking { url: String },
    Approve { info: CustomFilterInfo, title: String, trusted: bool },
    Error { url: String, message: String },
}

impl Default for ModalState {
    fn default() -> Self {
        ModalState::Closed
    }
}

#[derive(Debug, Clone, Default)]
pub struct CustomFilterModal {
    state: ModalState,
}

/// Accept http(s) and file URLs only
pub fn validate_filter_url(url: &str) -> Result<String, String> {
    let url = url.trim();
    if url.is_empty() {
        return Err("Enter the URL of a filter list".to_string());
    }
    let valid_scheme = ["http://", "https://", "file://"]
        .iter()
        .any(|scheme| url.len() > scheme.len() && url.starts_with(scheme));
    if !valid_scheme || url.contains(char::is_whitespace) {
        return Err(format!("Not a valid filter URL: {}", url));
    }
    Ok(url.to_string())
}

impl CustomFilterModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ModalState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != ModalState::Closed
    }

    pub fn open(&mut self) {
        self.state = ModalState::EnterUrl {
            url: String::new(),
            error: None,
        };
    }

    pub fn close(&mut self) {
        self.state = ModalState::Closed;
    }

    /// Validate the entered URL and move to `Checking`.
    /// Returns the request that starts the download.
    pub fn submit_url(&mut self, url: &str) -> Option<BackendRequest> {
        match validate_filter_url(url) {
            Ok(url) => {
                self.state = ModalState::Checking { url: url.clone() };
                Some(BackendRequest::CheckCustomFilter { url })
            }
            Err(error) => {
                self.state = ModalState::EnterUrl {
                    url: url.to_string(),
                    error: Some(error),
                };
                None
            }
        }
    }

    /// Download finished. Ignored unless still checking this URL.
    pub fn on_info(&mut self, info: CustomFilterInfo) -> bool {
        match &self.state {
            ModalState::Checking { url } if *url == info.url => {
                let title = info.name.clone();
                self.state = ModalState::Approve {
                    info,
                    title,
                    trusted: false,
                };
                true
            }
            _ => false,
        }
    }

    /// Download failed. Ignored unless still checking this URL.
    pub fn on_error(&mut self, url: &str, message: &str) -> bool {
        match &self.state {
            ModalState::Checking { url: checking } if checking == url => {
                self.state = ModalState::Error {
                    url: url.to_string(),
                    message: message.to_string(),
                };
                true
            }
            _ => false,
        }
    }

    /// Subscribe to the approved list and close
    pub fn confirm(&mut self) -> Option<BackendRequest> {
        match std::mem::take(&mut self.state) {
            ModalState::Approve { info, title, trusted } => {
                let title = if title.trim().is_empty() {
                    info.name
                } else {
                    title.trim().to_string()
                };
                Some(BackendRequest::AddCustomFilter {
                    url: info.url,
                    title,
                    trusted,
                })
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Back to URL entry from the error step, keeping the URL
    pub fn retry(&mut self) {
        if let ModalState::Error { url, .. } = &self.state {
            self.state = ModalState::EnterUrl {
                url: url.clone(),
                error: None,
            };
        }
    }
}

/// Render the dialog. Returns a request to send when the user advances it.
pub fn render_custom_filter_modal(
    ctx: &egui::Context,
    modal: &mut CustomFilterModal,
) -> Option<BackendRequest> {
    if !modal.is_open() {
        return None;
    }

    let mut request = None;
    let mut keep_open = true;

    egui::Window::new("Add custom filter")
        .collapsible(false)
        .resizable(false)
        .open(&mut keep_open)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.set_min_width(420.0);
            match modal.state.clone() {
                ModalState::Closed => {}
                ModalState::EnterUrl { mut url, error } => {
                    ui.label("Enter the URL or path of the filter list:");
                    let edit = ui.text_edit_singleline(&mut url);
                    if let Some(ref err) = error {
                        ui.colored_label(egui::Color32::from_rgb(255, 100, 100), err);
                    }
                    let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    if ui.button("Next").clicked() || submitted {
                        request = modal.submit_url(&url);
                    } else {
                        modal.state = ModalState::EnterUrl { url, error };
                    }
                }
                ModalState::Checking { url } => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(format!("Downloading {}", url));
                    });
                }
                ModalState::Approve { info, mut title, mut trusted } => {
                    egui::Grid::new("custom_filter_info").num_columns(2).show(ui, |ui| {
                        ui.label("Title:");
                        ui.text_edit_singleline(&mut title);
                        ui.end_row();
                        ui.label("Description:");
                        ui.label(&info.description);
                        ui.end_row();
                        ui.label("Version:");
                        ui.label(&info.version);
                        ui.end_row();
                        ui.label("Rules count:");
                        ui.label(info.rules_count.to_string());
                        ui.end_row();
                        ui.label("Homepage:");
                        ui.label(&info.homepage);
                        ui.end_row();
                        ui.label("URL:");
                        ui.label(&info.url);
                        ui.end_row();
                    });
                    ui.checkbox(&mut trusted, "Trusted")
                        .on_hover_text("Trusted filters may use rules that run scripts");
                    let subscribe = ui.button("Subscribe").clicked();
                    modal.state = ModalState::Approve { info, title, trusted };
                    if subscribe {
                        request = modal.confirm();
                    }
                }
                ModalState::Error { url, message } => {
                    ui.colored_label(
                        egui::Color32::from_rgb(255, 100, 100),
                        format!("Could not load {}", url),
                    );
                    ui.label(message);
                    if ui.button("Try again").clicked() {
                        modal.retry();
                    }
                }
            }
        });

    if !keep_open {
        modal.close();
    }
    request
}
