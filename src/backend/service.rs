//! In-process filtering service.
//!
//! Answers every `BackendRequest` from in-memory state so the options window
//! runs standalone. It keeps no rule engine; it only tracks the state the page
//! displays and pushes the matching events back.

use super::fetcher::{parse_filter_header, FilterFetcher};
use super::{BackendEvent, BackendRequest};
use crate::models::{
    setting_keys, Category, CategoryFilters, Constants, EnvironmentOptions, Filter, FilterId,
    FiltersMetadata, GroupId, InitResponse, RequestFilterInfo, TagDetails, UserSettings,
    CUSTOM_FILTERS_GROUP_ID, CUSTOM_FILTERS_START_ID,
};
use anyhow::Context;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Settings bundle accepted by `ImportSettings`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsBundle {
    #[serde(rename = "general-settings")]
    general_settings: BTreeMap<String, bool>,
    filters: BundleFilters,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BundleFilters {
    #[serde(rename = "enabled-filters")]
    enabled_filters: Vec<FilterId>,
    #[serde(rename = "user-filter")]
    user_filter: BundleRules,
    whitelist: BundleWhitelist,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BundleRules {
    rules: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BundleWhitelist {
    domains: Vec<String>,
}

/// State owned by the service task.
pub struct BackendService {
    filters: Vec<Filter>,
    categories: Vec<Category>,
    whitelist: Vec<String>,
    user_rules: Vec<String>,
    user_settings: UserSettings,
    blocked_count: u64,
    next_custom_id: FilterId,
    checked_custom: HashMap<String, crate::models::CustomFilterInfo>,
    fetcher: Arc<dyn FilterFetcher>,
}

impl BackendService {
    pub fn new(metadata: FiltersMetadata, fetcher: Arc<dyn FilterFetcher>) -> Self {
        let next_custom_id = metadata
            .filters
            .iter()
            .map(|f| f.filter_id + 1)
            .max()
            .unwrap_or(0)
            .max(CUSTOM_FILTERS_START_ID);

        let mut user_settings = UserSettings::default();
        user_settings.set(setting_keys::USE_OPTIMIZED_FILTERS, false);
        user_settings.set(setting_keys::SHOW_PAGE_STATISTIC, true);
        user_settings.set(setting_keys::AUTODETECT_FILTERS, true);
        user_settings.set(setting_keys::SAFEBROWSING_ENABLED, false);
        user_settings.set(setting_keys::SHOW_APP_UPDATED_NOTIFICATION, true);
        user_settings.set(setting_keys::ALLOW_ACCEPTABLE_ADS, true);

        Self {
            filters: metadata.filters,
            categories: metadata.categories,
            whitelist: Vec::new(),
            user_rules: Vec::new(),
            user_settings,
            blocked_count: 0,
            next_custom_id,
            checked_custom: HashMap::new(),
            fetcher,
        }
    }

    /// Service seeded with the bundled filter catalog.
    pub fn with_default_catalog(fetcher: Arc<dyn FilterFetcher>) -> Self {
        Self::new(default_catalog(), fetcher)
    }

    /// Serve requests until the page side hangs up.
    pub async fn run(
        mut self,
        mut requests: mpsc::Receiver<BackendRequest>,
        events: mpsc::Sender<BackendEvent>,
    ) {
        log::info!("[SERVICE] Filtering service started");
        while let Some(request) = requests.recv().await {
            log::debug!("[SERVICE] <- {}", request.name());
            for event in self.handle(request).await {
                if events.send(event).await.is_err() {
                    log::warn!("[SERVICE] Page disconnected, stopping service");
                    return;
                }
            }
        }
        log::info!("[SERVICE] Request channel closed, service stopped");
    }

    /// Apply one request and return the events it produces.
    pub async fn handle(&mut self, request: BackendRequest) -> Vec<BackendEvent> {
        match request {
            BackendRequest::Initialize => vec![BackendEvent::Initialized(Box::new(
                self.init_response(),
            ))],
            BackendRequest::RequestFiltersMetadata => vec![self.metadata_event()],
            BackendRequest::GetWhitelist => {
                vec![BackendEvent::WhitelistLoaded(self.whitelist.clone())]
            }
            BackendRequest::SaveWhitelist(domains) => {
                self.whitelist = domains;
                vec![BackendEvent::WhitelistLoaded(self.whitelist.clone())]
            }
            BackendRequest::GetUserRules => {
                vec![BackendEvent::UserRulesLoaded(self.user_rules.clone())]
            }
            BackendRequest::SaveUserRules(rules) => {
                self.user_rules = rules;
                vec![BackendEvent::UserRulesLoaded(self.user_rules.clone())]
            }
            BackendRequest::EnableFilter(id) => self.set_enabled(&[id], true),
            BackendRequest::DisableFilter(id) => self.set_enabled(&[id], false),
            BackendRequest::EnableGroup(group_id) => {
                let ids = self.group_enable_targets(group_id);
                self.set_enabled(&ids, true)
            }
            BackendRequest::DisableGroup(group_id) => {
                let ids: Vec<FilterId> = self
                    .filters
                    .iter()
                    .filter(|f| f.group_id == group_id && f.enabled)
                    .map(|f| f.filter_id)
                    .collect();
                self.set_enabled(&ids, false)
            }
            BackendRequest::CheckFiltersUpdate => self.check_updates(),
            BackendRequest::CheckCustomFilter { url } => self.check_custom_filter(url).await,
            BackendRequest::AddCustomFilter { url, title, trusted } => {
                self.add_custom_filter(url, title, trusted)
            }
            BackendRequest::RemoveCustomFilter(id) => self.remove_custom_filter(id),
            BackendRequest::ImportSettings(json) => match self.import_settings(&json) {
                Ok(settings) => {
                    let mut events = vec![
                        BackendEvent::SettingsImported(true),
                        self.metadata_event(),
                        BackendEvent::WhitelistLoaded(self.whitelist.clone()),
                        BackendEvent::UserRulesLoaded(self.user_rules.clone()),
                    ];
                    events.extend(
                        settings
                            .into_iter()
                            .map(|(key, value)| BackendEvent::SettingChanged { key, value }),
                    );
                    events
                }
                Err(e) => {
                    log::warn!("[SERVICE] Settings import rejected: {:#}", e);
                    vec![BackendEvent::SettingsImported(false)]
                }
            },
            BackendRequest::ResetBlockedStats => {
                self.blocked_count = 0;
                vec![BackendEvent::BlockedStatsReset]
            }
            BackendRequest::ChangeUserSetting { key, value } => {
                self.user_settings.set(key.clone(), value);
                vec![BackendEvent::SettingChanged { key, value }]
            }
        }
    }

    fn init_response(&self) -> InitResponse {
        let enabled: Vec<&Filter> = self.filters.iter().filter(|f| f.enabled).collect();
        InitResponse {
            user_settings: self.user_settings.clone(),
            enabled_filters: enabled.iter().map(|f| f.filter_id).collect(),
            environment_options: EnvironmentOptions::current(),
            request_filter_info: RequestFilterInfo {
                rules_count: enabled.iter().map(|f| f.rules_count).sum::<u64>()
                    + self.user_rules.len() as u64,
            },
            constants: Constants::default(),
        }
    }

    /// Category lists carry current filter records.
    fn metadata_event(&self) -> BackendEvent {
        let current = |list: &[Filter]| -> Vec<Filter> {
            list.iter()
                .filter_map(|f| self.filters.iter().find(|c| c.filter_id == f.filter_id))
                .cloned()
                .collect()
        };
        let categories = self
            .categories
            .iter()
            .map(|c| Category {
                filters: CategoryFilters {
                    other_filters: current(&c.filters.other_filters),
                    recommended_filters: current(&c.filters.recommended_filters),
                },
                ..c.clone()
            })
            .collect();
        BackendEvent::FiltersMetadata(FiltersMetadata {
            filters: self.filters.clone(),
            categories,
        })
    }

    /// Recommended filters of the group, or every filter if none is recommended.
    fn group_enable_targets(&self, group_id: GroupId) -> Vec<FilterId> {
        let recommended: Vec<FilterId> = self
            .categories
            .iter()
            .find(|c| c.group_id == group_id)
            .map(|c| {
                c.filters
                    .recommended_filters
                    .iter()
                    .map(|f| f.filter_id)
                    .collect()
            })
            .unwrap_or_default();
        if recommended.is_empty() {
            self.filters
                .iter()
                .filter(|f| f.group_id == group_id)
                .map(|f| f.filter_id)
                .collect()
        } else {
            recommended
        }
    }

    fn set_enabled(&mut self, ids: &[FilterId], enabled: bool) -> Vec<BackendEvent> {
        let mut events = Vec::new();
        for id in ids {
            match self.filters.iter_mut().find(|f| f.filter_id == *id) {
                Some(filter) if filter.enabled != enabled => {
                    filter.enabled = enabled;
                    events.push(BackendEvent::FilterEnabledChanged {
                        filter: filter.clone(),
                        enabled,
                    });
                }
                Some(_) => {}
                None => log::warn!("[SERVICE] Unknown filter id {}", id),
            }
        }
        events
    }

    fn check_updates(&mut self) -> Vec<BackendEvent> {
        let now = chrono::Utc::now().timestamp_millis();
        let mut updated = Vec::new();
        for filter in self.filters.iter_mut().filter(|f| f.enabled) {
            filter.time_updated = Some(now);
            filter.last_update_time = Some(now);
            updated.push(filter.clone());
        }
        vec![
            BackendEvent::FiltersUpdateChecked { updated },
            self.metadata_event(),
        ]
    }

    async fn check_custom_filter(&mut self, url: String) -> Vec<BackendEvent> {
        let result = self
            .fetcher
            .fetch(&url)
            .await
            .and_then(|content| parse_filter_header(&url, &content));
        match result {
            Ok(info) => {
                self.checked_custom.insert(url, info.clone());
                vec![BackendEvent::CustomFilterInfo(info)]
            }
            Err(e) => vec![BackendEvent::CustomFilterError {
                url,
                message: e.to_string(),
            }],
        }
    }

    fn add_custom_filter(&mut self, url: String, title: String, trusted: bool) -> Vec<BackendEvent> {
        if let Some(existing) = self
            .filters
            .iter()
            .find(|f| f.custom_url.as_deref() == Some(url.as_str()))
        {
            let id = existing.filter_id;
            return self.set_enabled(&[id], true);
        }

        let info = self.checked_custom.remove(&url).unwrap_or_default();
        let filter = Filter {
            filter_id: self.next_custom_id,
            group_id: CUSTOM_FILTERS_GROUP_ID,
            name: if title.trim().is_empty() {
                info.name.clone()
            } else {
                title.trim().to_string()
            },
            description: info.description,
            version: info.version,
            homepage: info.homepage,
            time_updated: info.time_updated,
            last_update_time: Some(chrono::Utc::now().timestamp_millis()),
            rules_count: info.rules_count,
            tags_details: Vec::new(),
            enabled: true,
            custom_url: Some(url),
            trusted,
        };
        self.next_custom_id += 1;

        if let Some(custom) = self.categories.iter_mut().find(|c| c.is_custom()) {
            custom.filters.other_filters.push(filter.clone());
        }
        self.filters.push(filter.clone());
        log::info!("[SERVICE] Subscribed custom filter {} ({})", filter.filter_id, filter.name);
        vec![BackendEvent::FilterAdded(filter)]
    }

    fn remove_custom_filter(&mut self, id: FilterId) -> Vec<BackendEvent> {
        let is_custom = self
            .filters
            .iter()
            .any(|f| f.filter_id == id && f.is_custom());
        if !is_custom {
            log::warn!("[SERVICE] Refusing to remove built-in filter {}", id);
            return Vec::new();
        }
        self.filters.retain(|f| f.filter_id != id);
        for category in &mut self.categories {
            category.filters.other_filters.retain(|f| f.filter_id != id);
        }
        vec![BackendEvent::FilterRemoved(id)]
    }

    /// Apply a settings bundle. Returns the general settings it carried.
    fn import_settings(&mut self, json: &str) -> anyhow::Result<Vec<(String, bool)>> {
        let bundle: SettingsBundle =
            serde_json::from_str(json).context("settings file is not a valid bundle")?;

        for filter in &mut self.filters {
            filter.enabled = bundle.filters.enabled_filters.contains(&filter.filter_id);
        }
        for (key, value) in &bundle.general_settings {
            self.user_settings.set(key.clone(), *value);
        }
        self.whitelist = bundle.filters.whitelist.domains;
        self.user_rules = bundle
            .filters
            .user_filter
            .rules
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        Ok(bundle.general_settings.into_iter().collect())
    }

    pub fn blocked_count(&self) -> u64 {
        self.blocked_count
    }

    pub fn record_blocked(&mut self, count: u64) {
        self.blocked_count += count;
    }
}

fn tag(keyword: &str, description: &str) -> TagDetails {
    TagDetails {
        keyword: keyword.to_string(),
        description: description.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
fn builtin(
    filter_id: FilterId,
    group_id: GroupId,
    name: &str,
    description: &str,
    homepage: &str,
    rules_count: u64,
    enabled: bool,
    tags: Vec<TagDetails>,
) -> Filter {
    Filter {
        filter_id,
        group_id,
        name: name.to_string(),
        description: description.to_string(),
        version: "2.0.0".to_string(),
        homepage: homepage.to_string(),
        time_updated: Some(1_557_914_400_000),
        last_update_time: None,
        rules_count,
        tags_details: tags,
        enabled,
        custom_url: None,
        trusted: true,
    }
}

fn group(group_id: GroupId, name: &str, display_number: u32, recommended: &[&Filter], other: &[&Filter]) -> Category {
    Category {
        group_id,
        group_name: name.to_string(),
        display_number,
        filters: CategoryFilters {
            recommended_filters: recommended.iter().map(|f| (*f).clone()).collect(),
            other_filters: other.iter().map(|f| (*f).clone()).collect(),
        },
    }
}

/// Filter catalog bundled with the application.
pub fn default_catalog() -> FiltersMetadata {
    let ads = tag("purpose:ads", "Blocks advertising");
    let privacy = tag("purpose:privacy", "Blocks trackers and analytics");
    let social = tag("purpose:social", "Removes social media widgets");
    let annoyances = tag("purpose:annoyances", "Removes pop-ups and cookie notices");
    let security = tag("purpose:security", "Blocks malicious domains");

    let base = builtin(2, 1, "Base filter", "Removes ads from websites with English content.", "https://kb.adguard.com/general/adguard-ad-filters", 95_000, true, vec![ads.clone()]);
    let easylist = builtin(101, 1, "EasyList", "The primary filter list that removes most adverts from international webpages.", "https://easylist.to/", 70_000, false, vec![ads.clone()]);
    let mobile = builtin(11, 1, "Mobile ads filter", "Filter for all known mobile ad networks.", "", 8_000, false, vec![ads]);
    let tracking = builtin(3, 2, "Tracking Protection filter", "Blocks trackers and web analytics.", "", 40_000, true, vec![privacy.clone()]);
    let easyprivacy = builtin(118, 2, "EasyPrivacy", "Supplementary list that removes tracking.", "https://easylist.to/", 30_000, false, vec![privacy.clone()]);
    let url_tracking = builtin(17, 2, "URL Tracking filter", "Strips tracking parameters from URLs.", "", 1_500, false, vec![privacy]);
    let social_media = builtin(4, 3, "Social media filter", "Removes share and like buttons.", "", 12_000, false, vec![social]);
    let annoyance = builtin(14, 4, "Annoyances filter", "Blocks irritating elements on web pages.", "", 35_000, false, vec![annoyances]);
    let malware = builtin(208, 5, "Online Malicious URL Blocklist", "Blocks domains serving malware.", "", 9_000, false, vec![security]);

    let categories = vec![
        group(1, "Ad Blocking", 1, &[&base, &mobile], &[&easylist]),
        group(2, "Privacy", 2, &[&tracking, &url_tracking], &[&easyprivacy]),
        group(3, "Social Widgets", 3, &[&social_media], &[]),
        group(4, "Annoyances", 4, &[&annoyance], &[]),
        group(5, "Security", 5, &[], &[&malware]),
        group(CUSTOM_FILTERS_GROUP_ID, "Custom", 99, &[], &[]),
    ];
    let filters = vec![
        base, easylist, mobile, tracking, easyprivacy, url_tracking, social_media, annoyance, malware,
    ];
    FiltersMetadata { filters, categories }
}
