//! Filter metadata cache.
//!
//! Holds the last-fetched categories and filters, an index by filter id and the
//! overall last update time. The backend is the source of truth; this cache is
//! initialised once per page load and patched by push events.

pub mod view;

use crate::models::{Category, Filter, FilterId, GroupId};
use std::collections::HashMap;

/// In-memory index of filter metadata.
///
/// `filters_by_id` always maps every id in `filters` to its position, one entry
/// per id. `last_update_time` never decreases.
#[derive(Debug, Clone, Default)]
pub struct FilterIndex {
    filters: Vec<Filter>,
    filters_by_id: HashMap<FilterId, usize>,
    categories: Vec<Category>,
    last_update_time: Option<i64>,
}

impl FilterIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole filter and category lists.
    ///
    /// Duplicate ids collapse onto their first position with the last record
    /// winning.
    pub fn init_loaded_filters(&mut self, filters: Vec<Filter>, categories: Vec<Category>) {
        self.filters.clear();
        self.filters_by_id.clear();

        let mut newest: Option<i64> = None;
        for filter in filters {
            newest = newest.max(filter.update_timestamp());
            match self.filters_by_id.get(&filter.filter_id) {
                Some(&pos) => self.filters[pos] = filter,
                None => {
                    self.filters_by_id.insert(filter.filter_id, self.filters.len());
                    self.filters.push(filter);
                }
            }
        }

        self.categories = categories;
        self.last_update_time = self.last_update_time.max(newest);

        log::debug!(
            "[FILTERS] Cache initialised: {} filters, {} categories, last update {:?}",
            self.filters.len(),
            self.categories.len(),
            self.last_update_time
        );
    }

    /// Enabled flag of an indexed filter; unknown ids are reported as disabled.
    pub fn is_enabled(&self, filter_id: FilterId) -> bool {
        self.get(filter_id).map_or(false, |f| f.enabled)
    }

    /// Set the enabled flag, appending the filter if it was not indexed yet.
    ///
    /// Returns `true` when the filter was newly discovered.
    pub fn update_enabled(&mut self, filter: &Filter, enabled: bool) -> bool {
        if let Some(&pos) = self.filters_by_id.get(&filter.filter_id) {
            self.filters[pos].enabled = enabled;
            return false;
        }

        let mut discovered = filter.clone();
        discovered.enabled = enabled;
        self.last_update_time = self.last_update_time.max(discovered.update_timestamp());

        if let Some(category) = self
            .categories
            .iter_mut()
            .find(|c| c.group_id == discovered.group_id)
        {
            let listed = category
                .all_filters()
                .any(|f| f.filter_id == discovered.filter_id);
            if !listed {
                category.filters.other_filters.push(discovered.clone());
            }
        }

        self.filters_by_id
            .insert(discovered.filter_id, self.filters.len());
        self.filters.push(discovered);
        log::debug!("[FILTERS] Discovered filter {}", filter.filter_id);
        true
    }

    /// Insert a full filter record, replacing the indexed one if the id is
    /// already known. Returns `true` when the filter was newly discovered.
    pub fn upsert_filter(&mut self, filter: Filter) -> bool {
        let Some(&pos) = self.filters_by_id.get(&filter.filter_id) else {
            let enabled = filter.enabled;
            return self.update_enabled(&filter, enabled);
        };

        let previous_group = self.filters[pos].group_id;
        if previous_group != filter.group_id {
            for category in &mut self.categories {
                category
                    .filters
                    .other_filters
                    .retain(|f| f.filter_id != filter.filter_id);
                category
                    .filters
                    .recommended_filters
                    .retain(|f| f.filter_id != filter.filter_id);
            }
            if let Some(category) = self
                .categories
                .iter_mut()
                .find(|c| c.group_id == filter.group_id)
            {
                category.filters.other_filters.push(filter.clone());
            }
        }

        self.last_update_time = self.last_update_time.max(filter.update_timestamp());
        log::debug!("[FILTERS] Replaced filter record {}", filter.filter_id);
        self.filters[pos] = filter;
        false
    }

    /// Drop a filter (custom filter deleted by the user).
    pub fn remove_filter(&mut self, filter_id: FilterId) -> Option<Filter> {
        let pos = self.filters_by_id.remove(&filter_id)?;
        let removed = self.filters.remove(pos);
        for idx in self.filters_by_id.values_mut() {
            if *idx > pos {
                *idx -= 1;
            }
        }
        for category in &mut self.categories {
            category
                .filters
                .other_filters
                .retain(|f| f.filter_id != filter_id);
            category
                .filters
                .recommended_filters
                .retain(|f| f.filter_id != filter_id);
        }
        Some(removed)
    }

    pub fn get(&self, filter_id: FilterId) -> Option<&Filter> {
        self.filters_by_id
            .get(&filter_id)
            .and_then(|&pos| self.filters.get(pos))
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, group_id: GroupId) -> Option<&Category> {
        self.categories.iter().find(|c| c.group_id == group_id)
    }

    pub fn last_update_time(&self) -> Option<i64> {
        self.last_update_time
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Current filter records of a category, split into (recommended, other).
    ///
    /// Category lists may be stale after push events, so entries are resolved
    /// through the index; indexed filters of the group that the category does
    /// not list yet are appended to `other`.
    pub fn group_entries(&self, group_id: GroupId) -> (Vec<&Filter>, Vec<&Filter>) {
        let Some(category) = self.category(group_id) else {
            return (Vec::new(), Vec::new());
        };

        let resolve = |list: &[Filter]| -> Vec<&Filter> {
            list.iter()
                .filter_map(|f| self.get(f.filter_id))
                .collect()
        };
        let recommended = resolve(&category.filters.recommended_filters);
        let mut other = resolve(&category.filters.other_filters);

        for filter in self.filters.iter().filter(|f| f.group_id == group_id) {
            let listed = recommended
                .iter()
                .chain(other.iter())
                .any(|f| f.filter_id == filter.filter_id);
            if !listed {
                other.push(filter);
            }
        }
        (recommended, other)
    }

    /// Number of enabled filters shown in a category.
    pub fn enabled_count(&self, group_id: GroupId) -> usize {
        let (recommended, other) = self.group_entries(group_id);
        recommended
            .iter()
            .chain(other.iter())
            .filter(|f| f.enabled)
            .count()
    }
}
