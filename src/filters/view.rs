//! View-models for the filters panels.
//!
//! The renderer never reads `Filter` records directly; it draws these plain
//! structs, rebuilt in full from the cache on every re-render.

use super::FilterIndex;
use crate::models::{Filter, FilterId, GroupId, TagDetails};
use chrono::{Local, TimeZone};

/// Which sub-list of a category is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterListTab {
    #[default]
    Recommended,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterView {
    pub filter_id: FilterId,
    pub name: String,
    pub description: String,
    pub version: String,
    pub updated: String,
    pub rules_count: u64,
    pub tags: Vec<TagDetails>,
    pub homepage: Option<String>,
    pub enabled: bool,
    pub removable: bool,
    pub trusted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryView {
    pub group_id: GroupId,
    pub name: String,
    pub hash: String,
    pub enabled_count: usize,
    pub total_count: usize,
    pub recommended: Vec<FilterView>,
    pub other: Vec<FilterView>,
    pub is_custom: bool,
}

impl CategoryView {
    /// Custom category without any subscriptions gets the "add" layout.
    pub fn shows_empty_state(&self) -> bool {
        self.is_custom && self.total_count == 0
    }

    /// Mark one filter enabled/disabled without rebuilding the view.
    ///
    /// Returns `false` if the filter is not part of this category.
    pub fn set_filter_enabled(&mut self, filter_id: FilterId, enabled: bool) -> bool {
        let entry = self
            .recommended
            .iter_mut()
            .chain(self.other.iter_mut())
            .find(|f| f.filter_id == filter_id);
        match entry {
            Some(entry) => {
                entry.enabled = enabled;
                self.enabled_count = self
                    .recommended
                    .iter()
                    .chain(self.other.iter())
                    .filter(|f| f.enabled)
                    .count();
                true
            }
            None => false,
        }
    }

    pub fn filters(&self, tab: FilterListTab) -> &[FilterView] {
        match tab {
            FilterListTab::Recommended => &self.recommended,
            FilterListTab::Other => &self.other,
        }
    }

    /// Sub-tab to open first: recommended unless there are none.
    pub fn default_tab(&self) -> FilterListTab {
        if self.recommended.is_empty() && !self.other.is_empty() {
            FilterListTab::Other
        } else {
            FilterListTab::Recommended
        }
    }
}

/// Location hash of a category panel.
pub fn category_hash(group_id: GroupId) -> String {
    format!("#antibanner{}", group_id)
}

/// Human readable update time, "never" when unknown.
pub fn format_timestamp(millis: Option<i64>) -> String {
    millis
        .and_then(|ms| Local.timestamp_millis_opt(ms).single())
        .map(|dt| dt.format("%d.%m.%Y %H:%M").to_string())
        .unwrap_or_else(|| "never".to_string())
}

impl From<&Filter> for FilterView {
    fn from(filter: &Filter) -> Self {
        FilterView {
            filter_id: filter.filter_id,
            name: filter.name.clone(),
            description: filter.description.clone(),
            version: filter.version.clone(),
            updated: format_timestamp(filter.update_timestamp()),
            rules_count: filter.rules_count,
            tags: filter.tags_details.clone(),
            homepage: Some(filter.homepage.clone()).filter(|h| !h.is_empty()),
            enabled: filter.enabled,
            removable: filter.is_custom(),
            trusted: filter.trusted,
        }
    }
}

/// Build every category view, ordered by display number.
pub fn build_category_views(index: &FilterIndex) -> Vec<CategoryView> {
    let mut categories: Vec<_> = index.categories().iter().collect();
    categories.sort_by_key(|c| (c.display_number, c.group_id));

    categories
        .into_iter()
        .map(|category| {
            let (recommended, other) = index.group_entries(category.group_id);
            let recommended: Vec<FilterView> =
                recommended.into_iter().map(FilterView::from).collect();
            let other: Vec<FilterView> = other.into_iter().map(FilterView::from).collect();
            let enabled_count = recommended
                .iter()
                .chain(other.iter())
                .filter(|f| f.enabled)
                .count();

            CategoryView {
                group_id: category.group_id,
                name: category.group_name.clone(),
                hash: category_hash(category.group_id),
                enabled_count,
                total_count: recommended.len() + other.len(),
                recommended,
                other,
                is_custom: category.is_custom(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, CategoryFilters, CUSTOM_FILTERS_GROUP_ID};

    fn index_with_custom_group(custom_filters: Vec<Filter>) -> FilterIndex {
        let mut base = Filter::new(2, 1);
        base.enabled = true;
        base.homepage = "https://example.org".to_string();

        let mut index = FilterIndex::new();
        let mut all = vec![base.clone()];
        all.extend(custom_filters.iter().cloned());
        index.init_loaded_filters(
            all,
            vec![
                Category {
                    group_id: CUSTOM_FILTERS_GROUP_ID,
                    group_name: "Custom".to_string(),
                    display_number: 99,
                    filters: CategoryFilters {
                        other_filters: custom_filters,
                        recommended_filters: vec![],
                    },
                },
                Category {
                    group_id: 1,
                    group_name: "Ad Blocking".to_string(),
                    display_number: 1,
                    filters: CategoryFilters {
                        other_filters: vec![],
                        recommended_filters: vec![base],
                    },
                },
            ],
        );
        index
    }

    #[test]
    fn test_views_sorted_by_display_number() {
        let views = build_category_views(&index_with_custom_group(vec![]));
        assert_eq!(views[0].group_id, 1);
        assert_eq!(views[0].hash, "#antibanner1");
        assert_eq!(views[0].enabled_count, 1);
        assert_eq!(views[0].recommended[0].homepage.as_deref(), Some("https://example.org"));
    }

    #[test]
    fn test_empty_custom_category_shows_empty_state() {
        let views = build_category_views(&index_with_custom_group(vec![]));
        let custom = views.iter().find(|v| v.is_custom).unwrap();
        assert!(custom.shows_empty_state());
    }

    #[test]
    fn test_custom_filters_are_removable() {
        let mut custom = Filter::new(1000, CUSTOM_FILTERS_GROUP_ID);
        custom.custom_url = Some("https://lists.example.org/list.txt".to_string());
        let views = build_category_views(&index_with_custom_group(vec![custom]));
        let view = views.iter().find(|v| v.is_custom).unwrap();
        assert!(!view.shows_empty_state());
        assert!(view.other[0].removable);
        assert_eq!(view.default_tab(), FilterListTab::Other);
    }

    #[test]
    fn test_set_filter_enabled_updates_count() {
        let mut views = build_category_views(&index_with_custom_group(vec![]));
        assert!(views[0].set_filter_enabled(2, false));
        assert_eq!(views[0].enabled_count, 0);
        assert!(!views[0].set_filter_enabled(42, true));
    }

    #[test]
    fn test_format_timestamp_unknown() {
        assert_eq!(format_timestamp(None), "never");
    }
}
