//! Core data types for the options window.
//!
//! Everything here crosses the page/backend channel, so field names follow the
//! camelCase wire shape of the filter metadata (`filterId`, `groupId`, ...).

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type FilterId = u32;
pub type GroupId = u32;

/// Group that holds user-subscribed (custom) filter lists.
pub const CUSTOM_FILTERS_GROUP_ID: GroupId = 0;

/// First id handed out to custom filters; built-in filters stay below it.
pub const CUSTOM_FILTERS_START_ID: FilterId = 1000;

/// User setting keys understood by the general settings panel.
pub mod setting_keys {
    pub const USE_OPTIMIZED_FILTERS: &str = "use-optimized-filters";
    pub const SHOW_PAGE_STATISTIC: &str = "show-page-statistic";
    pub const AUTODETECT_FILTERS: &str = "autodetect-filters";
    pub const SAFEBROWSING_ENABLED: &str = "safebrowsing-enabled";
    pub const SHOW_APP_UPDATED_NOTIFICATION: &str = "show-app-updated-notification";
    pub const ALLOW_ACCEPTABLE_ADS: &str = "allow-acceptable-ads";
}

/// Keyword tag attached to a filter, shown as a small chip in the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDetails {
    pub keyword: String,
    #[serde(default)]
    pub description: String,
}

/// A named rule list that can be enabled or disabled.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Filter {
    pub filter_id: FilterId,
    pub group_id: GroupId,
    pub name: String,
    pub description: String,
    pub version: String,
    pub homepage: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub time_updated: Option<i64>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub last_update_time: Option<i64>,
    pub rules_count: u64,
    pub tags_details: Vec<TagDetails>,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_url: Option<String>,
    pub trusted: bool,
}

impl Filter {
    /// Minimal filter record, used for push events that only carry ids.
    pub fn new(filter_id: FilterId, group_id: GroupId) -> Self {
        Filter {
            filter_id,
            group_id,
            ..Default::default()
        }
    }

    /// Latest known update time of this filter in epoch millis.
    ///
    /// Zero values are treated as absent.
    pub fn update_timestamp(&self) -> Option<i64> {
        [self.time_updated, self.last_update_time]
            .into_iter()
            .flatten()
            .filter(|ts| *ts > 0)
            .max()
    }

    /// User-added filters are the only ones carrying a subscription URL.
    pub fn is_custom(&self) -> bool {
        self.custom_url.is_some()
    }
}

/// Filters of one category, split the way the category panel shows them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryFilters {
    pub other_filters: Vec<Filter>,
    pub recommended_filters: Vec<Filter>,
}

/// A named collection of related filters (a.k.a. group).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Category {
    pub group_id: GroupId,
    pub group_name: String,
    pub display_number: u32,
    pub filters: CategoryFilters,
}

impl Category {
    pub fn is_custom(&self) -> bool {
        self.group_id == CUSTOM_FILTERS_GROUP_ID
    }

    /// Recommended filters first, then the rest.
    pub fn all_filters(&self) -> impl Iterator<Item = &Filter> {
        self.filters
            .recommended_filters
            .iter()
            .chain(self.filters.other_filters.iter())
    }
}

/// Full filter metadata answer from the backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FiltersMetadata {
    pub filters: Vec<Filter>,
    pub categories: Vec<Category>,
}

/// User settings as a flat key/value map.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub values: BTreeMap<String, bool>,
}

impl UserSettings {
    pub fn flag(&self, key: &str) -> bool {
        self.values.get(key).copied().unwrap_or(false)
    }

    pub fn set(&mut self, key: impl Into<String>, value: bool) {
        self.values.insert(key.into(), value);
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvironmentOptions {
    pub is_mac_os: bool,
    pub is_windows: bool,
    pub app_version: String,
}

impl EnvironmentOptions {
    /// Options describing the platform this binary was built for.
    pub fn current() -> Self {
        EnvironmentOptions {
            is_mac_os: cfg!(target_os = "macos"),
            is_windows: cfg!(target_os = "windows"),
            app_version: crate::VERSION.to_string(),
        }
    }
}

/// Aggregate state of the request filter (everything currently applied).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestFilterInfo {
    pub rules_count: u64,
}

/// Well-known ids shared between the page and the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Constants {
    pub user_filter_id: FilterId,
    pub whitelist_filter_id: FilterId,
    pub custom_group_id: GroupId,
}

impl Default for Constants {
    fn default() -> Self {
        Constants {
            user_filter_id: 0,
            whitelist_filter_id: 100,
            custom_group_id: CUSTOM_FILTERS_GROUP_ID,
        }
    }
}

/// Initialisation response sent once per page load.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InitResponse {
    pub user_settings: UserSettings,
    pub enabled_filters: Vec<FilterId>,
    pub environment_options: EnvironmentOptions,
    pub request_filter_info: RequestFilterInfo,
    pub constants: Constants,
}

/// Metadata read from the header of a downloaded custom filter list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomFilterInfo {
    pub url: String,
    pub name: String,
    pub description: String,
    pub version: String,
    pub homepage: String,
    pub rules_count: u64,
    pub time_updated: Option<i64>,
}

/// Accepts epoch millis (number) or an RFC 3339 / ISO-8601 string.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct TimestampVisitor;

    impl<'de> Visitor<'de> for TimestampVisitor {
        type Value = Option<i64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("epoch millis or a date-time string")
        }

        fn visit_i64<E>(self, value: i64) -> Result<Option<i64>, E>
        where
            E: de::Error,
        {
            Ok(if value > 0 { Some(value) } else { None })
        }

        fn visit_u64<E>(self, value: u64) -> Result<Option<i64>, E>
        where
            E: de::Error,
        {
            Ok(i64::try_from(value).ok().filter(|v| *v > 0))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Option<i64>, E>
        where
            E: de::Error,
        {
            self.visit_i64(value as i64)
        }

        fn visit_str<E>(self, value: &str) -> Result<Option<i64>, E>
        where
            E: de::Error,
        {
            if value.trim().is_empty() {
                return Ok(None);
            }
            parse_date_time(value)
                .map(Some)
                .ok_or_else(|| de::Error::invalid_value(de::Unexpected::Str(value), &self))
        }

        fn visit_none<E>(self) -> Result<Option<i64>, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Option<i64>, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(TimestampVisitor)
}

/// Parse the date formats seen in filter metadata into epoch millis.
pub fn parse_date_time(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(value) {
        return Some(dt.timestamp_millis());
    }
    // "2019-05-15T10:00:00+0000" (no colon in the offset)
    if let Ok(dt) = chrono::DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.timestamp_millis());
    }
    value.parse::<i64>().ok().filter(|v| *v > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_deserializes_camel_case() {
        let json = r#"{
            "filterId": 2,
            "groupId": 1,
            "name": "Base filter",
            "timeUpdated": 1000,
            "rulesCount": 42,
            "tagsDetails": [{"keyword": "purpose:ads", "description": "Blocks ads"}],
            "enabled": true
        }"#;
        let filter: Filter = serde_json::from_str(json).unwrap();
        assert_eq!(filter.filter_id, 2);
        assert_eq!(filter.group_id, 1);
        assert_eq!(filter.time_updated, Some(1000));
        assert_eq!(filter.tags_details[0].keyword, "purpose:ads");
        assert!(filter.enabled);
        assert!(!filter.is_custom());
    }

    #[test]
    fn test_timestamp_accepts_date_strings() {
        let json = r#"{"filterId": 3, "timeUpdated": "2019-05-15T10:00:00+0000"}"#;
        let filter: Filter = serde_json::from_str(json).unwrap();
        assert_eq!(filter.time_updated, Some(1_557_914_400_000));
    }

    #[test]
    fn test_zero_timestamp_is_absent() {
        let json = r#"{"filterId": 3, "timeUpdated": 0, "lastUpdateTime": null}"#;
        let filter: Filter = serde_json::from_str(json).unwrap();
        assert_eq!(filter.update_timestamp(), None);
    }

    #[test]
    fn test_update_timestamp_takes_latest_field() {
        let mut filter = Filter::new(1, 1);
        filter.time_updated = Some(100);
        filter.last_update_time = Some(250);
        assert_eq!(filter.update_timestamp(), Some(250));
    }

    #[test]
    fn test_user_settings_missing_flag_is_false() {
        let mut settings = UserSettings::default();
        assert!(!settings.flag(setting_keys::SHOW_PAGE_STATISTIC));
        settings.set(setting_keys::SHOW_PAGE_STATISTIC, true);
        assert!(settings.flag(setting_keys::SHOW_PAGE_STATISTIC));
    }
}
