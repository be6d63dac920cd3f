/// Page Controller
///
/// Owns everything the options page knows between frames: the session
/// context built from the init response, the filter cache and its
/// view-models, the toggle registry, both editors, the custom filter dialog
/// and the transient popups. Backend push events are routed here by
/// `handle_event`; user actions turn into `BackendRequest`s.
///
/// All mutation happens on the egui thread, so the controller is owned
/// directly by `AppUI` without locking.

use crate::backend::{BackendClient, BackendEvent, BackendRequest};
use crate::config::AppState;
use crate::editor::{parse_whitelist, RulesEditor};
use crate::error::{AppError, ImportError};
use crate::filters::view::{build_category_views, CategoryView, FilterListTab};
use crate::filters::FilterIndex;
use crate::models::{
    Constants, EnvironmentOptions, Filter, FilterId, GroupId, InitResponse, RequestFilterInfo,
    UserSettings,
};
use crate::ui::custom_filter::CustomFilterModal;
use crate::ui::popup::{PopupMessage, TransientPopup};
use crate::ui::router::{NavOutcome, Panel, TabRouter};
use crate::ui::widgets::{ToggleKey, ToggleRegistry};
use crate::ui::Launcher;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Page-wide state received once at initialisation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionContext {
    pub user_settings: UserSettings,
    pub enabled_filters: BTreeSet<FilterId>,
    pub environment_options: EnvironmentOptions,
    pub request_filter_info: RequestFilterInfo,
    pub constants: Constants,
}

impl From<InitResponse> for SessionContext {
    fn from(response: InitResponse) -> Self {
        SessionContext {
            user_settings: response.user_settings,
            enabled_filters: response.enabled_filters.into_iter().collect(),
            environment_options: response.environment_options,
            request_filter_info: response.request_filter_info,
            constants: response.constants,
        }
    }
}

/// Which text editor an import/export targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    Whitelist,
    UserFilter,
}

pub struct PageController {
    backend: Arc<dyn BackendClient>,
    launcher: Arc<dyn Launcher>,

    session: Option<SessionContext>,
    index: FilterIndex,
    category_views: Vec<CategoryView>,
    selected_tabs: HashMap<GroupId, FilterListTab>,

    pub toggles: ToggleRegistry,
    router: TabRouter,
    whitelist_shown: Arc<AtomicBool>,

    pub whitelist: RulesEditor,
    pub whitelist_errors: Vec<(usize, String)>,
    pub user_rules: RulesEditor,
    pub custom_filter: CustomFilterModal,

    reset_popup: TransientPopup,
    notice_popup: TransientPopup,
    pub error_message: Option<String>,
    pub info_message: Option<String>,
    checking_updates: bool,

    log_dir: PathBuf,
    store_url: String,
}

impl PageController {
    pub fn new(
        backend: Arc<dyn BackendClient>,
        launcher: Arc<dyn Launcher>,
        log_dir: PathBuf,
        state: &AppState,
    ) -> Self {
        let whitelist_shown = Arc::new(AtomicBool::new(false));
        let flag = whitelist_shown.clone();
        let router = TabRouter::new().with_whitelist_callback(Box::new(move || {
            flag.store(true, Ordering::Release);
        }));
        let popup_duration = Duration::from_millis(state.popup_duration_ms);

        Self {
            backend,
            launcher,
            session: None,
            index: FilterIndex::new(),
            category_views: Vec::new(),
            selected_tabs: HashMap::new(),
            toggles: ToggleRegistry::new(),
            router,
            whitelist_shown,
            whitelist: RulesEditor::new(),
            whitelist_errors: Vec::new(),
            user_rules: RulesEditor::new(),
            custom_filter: CustomFilterModal::new(),
            reset_popup: TransientPopup::new(popup_duration),
            notice_popup: TransientPopup::new(popup_duration),
            error_message: None,
            info_message: None,
            checking_updates: false,
            log_dir,
            store_url: state.store_url.clone(),
        }
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn session(&self) -> Option<&SessionContext> {
        self.session.as_ref()
    }

    pub fn index(&self) -> &FilterIndex {
        &self.index
    }

    pub fn category_views(&self) -> &[CategoryView] {
        &self.category_views
    }

    pub fn category_view(&self, group_id: GroupId) -> Option<&CategoryView> {
        self.category_views.iter().find(|c| c.group_id == group_id)
    }

    pub fn current_panel(&self) -> Panel {
        self.router.current()
    }

    pub fn router(&self) -> &TabRouter {
        &self.router
    }

    pub fn reset_popup(&self) -> &TransientPopup {
        &self.reset_popup
    }

    pub fn notice_popup(&self) -> &TransientPopup {
        &self.notice_popup
    }

    pub fn is_checking_updates(&self) -> bool {
        self.checking_updates
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn selected_tab(&self, group_id: GroupId) -> FilterListTab {
        self.selected_tabs.get(&group_id).copied().unwrap_or_else(|| {
            self.category_view(group_id)
                .map(|c| c.default_tab())
                .unwrap_or_default()
        })
    }

    pub fn select_tab(&mut self, group_id: GroupId, tab: FilterListTab) {
        self.selected_tabs.insert(group_id, tab);
    }

    // ---------------------------------------------------------------------
    // Outbound
    // ---------------------------------------------------------------------

    /// Send a request; failures land in the error banner
    pub fn send(&mut self, request: BackendRequest) -> bool {
        let name = request.name();
        match self.backend.send(request) {
            Ok(()) => true,
            Err(e) => {
                log::error!("[Controller] Failed to send {}: {}", name, e);
                self.error_message = Some(AppError::from(e).user_message());
                false
            }
        }
    }

    /// Kick off page initialisation
    pub fn initialize(&mut self) -> bool {
        log::info!("[Controller] Requesting initialisation data");
        self.send(BackendRequest::Initialize)
    }

    pub fn navigate(&mut self, hash: &str) -> NavOutcome {
        let outcome = self.router.navigate(hash);
        self.after_navigation();
        outcome
    }

    pub fn show_panel(&mut self, panel: Panel) -> NavOutcome {
        self.navigate(&panel.hash())
    }

    fn after_navigation(&mut self) {
        if self.whitelist_shown.swap(false, Ordering::AcqRel) {
            log::debug!("[Controller] Whitelist panel shown, refreshing domains");
            self.send(BackendRequest::GetWhitelist);
        }
    }

    /// Turn queued toggle clicks into backend requests
    pub fn process_toggle_changes(&mut self) -> usize {
        let changes = self.toggles.take_changes();
        let count = changes.len();
        for change in changes {
            let request = match change.key {
                ToggleKey::Filter(id) if change.checked => BackendRequest::EnableFilter(id),
                ToggleKey::Filter(id) => BackendRequest::DisableFilter(id),
                ToggleKey::Group(gid) if change.checked => BackendRequest::EnableGroup(gid),
                ToggleKey::Group(gid) => BackendRequest::DisableGroup(gid),
                ToggleKey::Setting(ref key) => BackendRequest::ChangeUserSetting {
                    key: key.clone(),
                    value: change.checked,
                },
            };
            if !self.send(request) {
                // The service never saw the click, put the switch back
                self.toggles.set_checked(&[change.key], !change.checked);
            }
        }
        count
    }

    pub fn reset_stats(&mut self, now: Instant) {
        if self.send(BackendRequest::ResetBlockedStats) {
            self.reset_popup
                .show(PopupMessage::new("Statistics of blocked ads has been reset"), now);
        }
    }

    pub fn open_log(&mut self) {
        if let Err(e) = self.launcher.open_path(&self.log_dir) {
            log::warn!("[Controller] Could not open log directory: {}", e);
            self.error_message = Some(
                AppError::OsCommand {
                    cmd: "open log".to_string(),
                    reason: e,
                }
                .user_message(),
            );
        }
    }

    pub fn open_store(&mut self) {
        if let Err(e) = self.launcher.open_url(&self.store_url) {
            log::warn!("[Controller] Could not open store page: {}", e);
            self.error_message = Some(
                AppError::OsCommand {
                    cmd: "open store".to_string(),
                    reason: e,
                }
                .user_message(),
            );
        }
    }

    pub fn open_homepage(&mut self, url: &str) {
        if let Err(e) = self.launcher.open_url(url) {
            self.error_message = Some(AppError::InvalidInput(e).user_message());
        }
    }

    /// Forward the full text of a settings file to the backend. Read
    /// failures surface as a popup.
    pub fn import_settings_from_path(&mut self, path: &Path, now: Instant) -> Result<(), ImportError> {
        let result = read_settings_file(path).and_then(|content| {
            self.backend
                .send(BackendRequest::ImportSettings(content))
                .map_err(ImportError::from)
        });
        if let Err(ref e) = result {
            log::warn!("[Controller] Settings import from {} failed: {}", path.display(), e);
            self.notice_popup
                .show(PopupMessage::with_body("Settings import failed", e.to_string()), now);
        } else {
            log::info!("[Controller] Settings file {} sent for import", path.display());
        }
        result
    }

    pub fn check_updates(&mut self) {
        if self.checking_updates {
            return;
        }
        if self.send(BackendRequest::CheckFiltersUpdate) {
            self.checking_updates = true;
        }
    }

    pub fn remove_custom_filter(&mut self, filter_id: FilterId) {
        match self.index.get(filter_id) {
            Some(filter) if filter.is_custom() => {
                self.send(BackendRequest::RemoveCustomFilter(filter_id));
            }
            _ => log::warn!("[Controller] Refusing to remove non-custom filter {}", filter_id),
        }
    }

    pub fn save_whitelist(&mut self) -> bool {
        let parsed = parse_whitelist(self.whitelist.text());
        if !parsed.is_valid() {
            self.error_message = Some(
                AppError::InvalidInput(format!(
                    "{} whitelist line(s) are not valid domains",
                    parsed.invalid.len()
                ))
                .user_message(),
            );
            self.whitelist_errors = parsed.invalid;
            return false;
        }
        self.whitelist_errors.clear();
        if self.send(BackendRequest::SaveWhitelist(parsed.domains)) {
            self.whitelist.mark_saved();
            return true;
        }
        false
    }

    pub fn save_user_rules(&mut self) -> bool {
        let rules = self.user_rules.lines();
        if self.send(BackendRequest::SaveUserRules(rules)) {
            self.user_rules.mark_saved();
            return true;
        }
        false
    }

    /// Append a text file to one of the editors
    pub fn import_editor_file(&mut self, kind: EditorKind, path: &Path) -> Result<(), AppError> {
        let content = std::fs::read_to_string(path)?;
        match kind {
            EditorKind::Whitelist => self.whitelist.append(&content),
            EditorKind::UserFilter => self.user_rules.append(&content),
        }
        Ok(())
    }

    /// Write the editor lines to a text file
    pub fn export_editor_file(&self, kind: EditorKind, path: &Path) -> Result<(), AppError> {
        let lines = match kind {
            EditorKind::Whitelist => self.whitelist.lines(),
            EditorKind::UserFilter => self.user_rules.lines(),
        };
        let mut content = lines.join("\n");
        content.push('\n');
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Send a request produced by the custom filter dialog
    pub fn submit_custom_filter_request(&mut self, request: BackendRequest) {
        self.send(request);
    }

    // ---------------------------------------------------------------------
    // Inbound
    // ---------------------------------------------------------------------

    pub fn handle_event(&mut self, event: BackendEvent, now: Instant) {
        match event {
            BackendEvent::Initialized(response) => self.on_initialized(*response),
            BackendEvent::FiltersMetadata(metadata) => {
                self.index
                    .init_loaded_filters(metadata.filters, metadata.categories);
                if let Some(ref mut session) = self.session {
                    session.enabled_filters = self
                        .index
                        .filters()
                        .iter()
                        .filter(|f| f.enabled)
                        .map(|f| f.filter_id)
                        .collect();
                }
                self.render_categories();
            }
            BackendEvent::FilterEnabledChanged { filter, enabled } => {
                self.on_filter_enabled_changed(&filter, enabled)
            }
            BackendEvent::FilterAdded(filter) => {
                log::info!("[Controller] Filter added: {} ({})", filter.name, filter.filter_id);
                let (filter_id, enabled) = (filter.filter_id, filter.enabled);
                self.index.upsert_filter(filter);
                self.track_enabled(filter_id, enabled);
                self.render_categories();
            }
            BackendEvent::FilterRemoved(filter_id) => {
                log::info!("[Controller] Filter removed: {}", filter_id);
                self.index.remove_filter(filter_id);
                self.track_enabled(filter_id, false);
                self.render_categories();
            }
            BackendEvent::WhitelistLoaded(domains) => {
                self.whitelist.load(domains);
                self.whitelist_errors.clear();
            }
            BackendEvent::UserRulesLoaded(rules) => self.user_rules.load(rules),
            BackendEvent::FiltersUpdateChecked { updated } => {
                self.checking_updates = false;
                self.info_message = Some(if updated.is_empty() {
                    "All filters are up to date".to_string()
                } else {
                    let names: Vec<&str> = updated.iter().map(|f| f.name.as_str()).collect();
                    format!("Updated {} filter(s): {}", updated.len(), names.join(", "))
                });
            }
            BackendEvent::CustomFilterInfo(info) => {
                if !self.custom_filter.on_info(info) {
                    log::debug!("[Controller] Ignoring stale custom filter info");
                }
            }
            BackendEvent::CustomFilterError { url, message } => {
                if !self.custom_filter.on_error(&url, &message) {
                    log::debug!("[Controller] Ignoring stale custom filter error for {}", url);
                }
            }
            BackendEvent::SettingsImported(success) => {
                let popup = if success {
                    PopupMessage::with_body(
                        "Settings imported",
                        "Your settings have been successfully imported",
                    )
                } else {
                    PopupMessage::with_body(
                        "Settings import failed",
                        "The file does not contain valid settings",
                    )
                };
                self.notice_popup.show(popup, now);
            }
            BackendEvent::BlockedStatsReset => {
                log::info!("[Controller] Blocked ads statistics reset");
            }
            BackendEvent::SettingChanged { key, value } => {
                if let Some(ref mut session) = self.session {
                    session.user_settings.set(key.clone(), value);
                }
                self.toggles.set_checked(&[ToggleKey::Setting(key)], value);
            }
        }
    }

    fn on_initialized(&mut self, response: InitResponse) {
        let session = SessionContext::from(response);
        log::info!(
            "[Controller] Session initialised: {} enabled filters, app {}",
            session.enabled_filters.len(),
            session.environment_options.app_version
        );
        self.toggles.retain(|k| k.is_filter_scope());
        self.toggles.decorate(
            session
                .user_settings
                .values
                .iter()
                .map(|(key, value)| (ToggleKey::Setting(key.clone()), *value)),
        );
        self.session = Some(session);

        self.send(BackendRequest::RequestFiltersMetadata);
        self.send(BackendRequest::GetWhitelist);
        self.send(BackendRequest::GetUserRules);
    }

    fn on_filter_enabled_changed(&mut self, filter: &Filter, enabled: bool) {
        self.track_enabled(filter.filter_id, enabled);
        if self.index.update_enabled(filter, enabled) {
            self.render_categories();
            return;
        }

        // Targeted refresh of one switch and its group counter
        let key = ToggleKey::Filter(filter.filter_id);
        self.toggles.set_checked(&[key], enabled);
        for view in &mut self.category_views {
            if view.set_filter_enabled(filter.filter_id, enabled) {
                let group_key = ToggleKey::Group(view.group_id);
                self.toggles
                    .set_checked(&[group_key], view.enabled_count > 0);
            }
        }
    }

    fn track_enabled(&mut self, filter_id: FilterId, enabled: bool) {
        if let Some(ref mut session) = self.session {
            if enabled {
                session.enabled_filters.insert(filter_id);
            } else {
                session.enabled_filters.remove(&filter_id);
            }
        }
    }

    /// Rebuild every category view from the cache and re-run the
    /// decoration pass over the fresh switches
    pub fn render_categories(&mut self) {
        self.category_views = build_category_views(&self.index);
        self.toggles.retain(|k| !k.is_filter_scope());
        self.decorate_toggles();

        let group_ids: Vec<GroupId> = self.category_views.iter().map(|c| c.group_id).collect();
        self.selected_tabs.retain(|gid, _| group_ids.contains(gid));
        if self.router.set_rendered_categories(group_ids).is_some() {
            self.after_navigation();
        }
    }

    /// Decorate every switch currently on the page. Already-decorated
    /// switches are left alone.
    pub fn decorate_toggles(&mut self) -> usize {
        let mut items = Vec::new();
        for view in &self.category_views {
            if view.shows_empty_state() {
                continue;
            }
            items.push((ToggleKey::Group(view.group_id), view.enabled_count > 0));
            for filter in view.recommended.iter().chain(view.other.iter()) {
                items.push((ToggleKey::Filter(filter.filter_id), filter.enabled));
            }
        }
        if let Some(ref session) = self.session {
            for (key, value) in &session.user_settings.values {
                items.push((ToggleKey::Setting(key.clone()), *value));
            }
        }
        self.toggles.decorate(items)
    }

    /// Per-frame housekeeping: hide expired popups. Returns the time until
    /// the next pending hide, if any.
    pub fn tick(&mut self, now: Instant) -> Option<Duration> {
        self.reset_popup.tick(now);
        self.notice_popup.tick(now);
        [self.reset_popup.remaining(now), self.notice_popup.remaining(now)]
            .into_iter()
            .flatten()
            .min()
    }
}

fn read_settings_file(path: &Path) -> Result<String, ImportError> {
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Err(ImportError::Empty);
    }
    Ok(content)
}
