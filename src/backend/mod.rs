//! Message contract between the options page and the filtering service.
//!
//! Requests are fire-and-forget; every answer arrives later as a pushed
//! `BackendEvent`. Shapes mirror what the page needs and are provisional until
//! the real service publishes its own contract.

pub mod fetcher;
pub mod service;

use crate::error::BackendError;
use crate::models::{
    CustomFilterInfo, Filter, FilterId, FiltersMetadata, GroupId, InitResponse,
};
use tokio::sync::mpsc;

pub use fetcher::{FilterFetcher, HttpFetcher};
pub use service::BackendService;

/// Outbound requests from the page.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendRequest {
    Initialize,
    RequestFiltersMetadata,
    GetWhitelist,
    SaveWhitelist(Vec<String>),
    GetUserRules,
    SaveUserRules(Vec<String>),
    EnableFilter(FilterId),
    DisableFilter(FilterId),
    EnableGroup(GroupId),
    DisableGroup(GroupId),
    CheckFiltersUpdate,
    CheckCustomFilter { url: String },
    AddCustomFilter { url: String, title: String, trusted: bool },
    RemoveCustomFilter(FilterId),
    ImportSettings(String),
    ResetBlockedStats,
    ChangeUserSetting { key: String, value: bool },
}

impl BackendRequest {
    /// Short label for logging.
    pub fn name(&self) -> &'static str {
        match self {
            BackendRequest::Initialize => "initialize",
            BackendRequest::RequestFiltersMetadata => "getFiltersMetadata",
            BackendRequest::GetWhitelist => "getWhitelistDomains",
            BackendRequest::SaveWhitelist(_) => "saveWhitelistDomains",
            BackendRequest::GetUserRules => "getUserRules",
            BackendRequest::SaveUserRules(_) => "saveUserRules",
            BackendRequest::EnableFilter(_) => "addAndEnableFilter",
            BackendRequest::DisableFilter(_) => "disableAntiBannerFilter",
            BackendRequest::EnableGroup(_) => "enableFiltersGroup",
            BackendRequest::DisableGroup(_) => "disableFiltersGroup",
            BackendRequest::CheckFiltersUpdate => "checkAntiBannerFiltersUpdate",
            BackendRequest::CheckCustomFilter { .. } => "loadCustomFilterInfo",
            BackendRequest::AddCustomFilter { .. } => "subscribeToCustomFilter",
            BackendRequest::RemoveCustomFilter(_) => "removeAntiBannerFilter",
            BackendRequest::ImportSettings(_) => "applySettingsJson",
            BackendRequest::ResetBlockedStats => "resetBlockedAdsCount",
            BackendRequest::ChangeUserSetting { .. } => "changeUserSetting",
        }
    }
}

/// Push notifications from the service.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    Initialized(Box<InitResponse>),
    FiltersMetadata(FiltersMetadata),
    FilterEnabledChanged { filter: Filter, enabled: bool },
    FilterAdded(Filter),
    FilterRemoved(FilterId),
    WhitelistLoaded(Vec<String>),
    UserRulesLoaded(Vec<String>),
    FiltersUpdateChecked { updated: Vec<Filter> },
    CustomFilterInfo(CustomFilterInfo),
    CustomFilterError { url: String, message: String },
    SettingsImported(bool),
    BlockedStatsReset,
    SettingChanged { key: String, value: bool },
}

/// Sending side of the page/service channel.
pub trait BackendClient: Send + Sync {
    fn send(&self, request: BackendRequest) -> Result<(), BackendError>;
}

/// Production client backed by a bounded tokio channel.
#[derive(Clone)]
pub struct ChannelBackend {
    tx: mpsc::Sender<BackendRequest>,
}

impl ChannelBackend {
    pub fn new(tx: mpsc::Sender<BackendRequest>) -> Self {
        Self { tx }
    }
}

impl BackendClient for ChannelBackend {
    fn send(&self, request: BackendRequest) -> Result<(), BackendError> {
        let name = request.name();
        log::debug!("[BACKEND] -> {}", name);
        self.tx.try_send(request).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => BackendError::ChannelFull(name.to_string()),
            mpsc::error::TrySendError::Closed(_) => BackendError::Disconnected,
        })
    }
}
