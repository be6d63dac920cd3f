//! Integration tests for the loaded filter metadata cache
//!
//! Test Organization:
//! - Initialisation and lookup
//! - Push-event patching (update_enabled, remove_filter)
//! - View-model rebuild
//! - Property tests (proptest)

use adblock_options::filters::view::{build_category_views, FilterListTab};
use adblock_options::models::{Category, CategoryFilters, Filter, FilterId, GroupId};
use adblock_options::FilterIndex;
use proptest::prelude::*;

fn filter(id: FilterId, group: GroupId, enabled: bool, time_updated: Option<i64>) -> Filter {
    Filter {
        enabled,
        time_updated,
        name: format!("Filter {}", id),
        ..Filter::new(id, group)
    }
}

fn category(group_id: GroupId, recommended: Vec<Filter>, other: Vec<Filter>) -> Category {
    Category {
        group_id,
        group_name: format!("Group {}", group_id),
        display_number: group_id,
        filters: CategoryFilters {
            other_filters: other,
            recommended_filters: recommended,
        },
    }
}

// ============================================================================
// INITIALISATION
// ============================================================================

#[test]
fn test_init_then_lookup() {
    let mut index = FilterIndex::new();
    let f1 = filter(1, 10, true, Some(100));
    index.init_loaded_filters(vec![f1.clone()], vec![category(10, vec![f1], vec![])]);

    assert!(index.is_enabled(1));
    assert_eq!(index.last_update_time(), Some(100));
}

#[test]
fn test_unknown_filter_is_disabled() {
    let index = FilterIndex::new();
    assert!(!index.is_enabled(42));
    assert!(index.get(42).is_none());
}

#[test]
fn test_init_replaces_previous_contents() {
    let mut index = FilterIndex::new();
    index.init_loaded_filters(vec![filter(1, 10, true, Some(100))], vec![]);
    index.init_loaded_filters(vec![filter(2, 10, true, Some(50))], vec![]);

    assert!(index.get(1).is_none());
    assert!(index.is_enabled(2));
    // Older data never moves the timestamp backwards
    assert_eq!(index.last_update_time(), Some(100));
}

#[test]
fn test_zero_and_missing_timestamps_are_ignored() {
    let mut index = FilterIndex::new();
    index.init_loaded_filters(
        vec![filter(1, 1, true, Some(0)), filter(2, 1, true, None)],
        vec![],
    );
    assert_eq!(index.last_update_time(), None);
}

// ============================================================================
// PUSH EVENT PATCHING
// ============================================================================

#[test]
fn test_update_enabled_appends_unknown_filter() {
    let mut index = FilterIndex::new();
    index.init_loaded_filters(
        vec![filter(1, 10, true, Some(100))],
        vec![category(10, vec![], vec![])],
    );

    let discovered = index.update_enabled(&Filter::new(2, 10), true);

    assert!(discovered);
    assert!(index.is_enabled(2));
    assert_eq!(index.len(), 2);
    let (_, other) = index.group_entries(10);
    assert!(other.iter().any(|f| f.filter_id == 2));
}

#[test]
fn test_update_enabled_patches_known_filter_in_place() {
    let mut index = FilterIndex::new();
    index.init_loaded_filters(vec![filter(1, 10, true, Some(100))], vec![]);

    assert!(!index.update_enabled(&Filter::new(1, 10), false));
    assert!(!index.is_enabled(1));
    assert_eq!(index.len(), 1);
}

#[test]
fn test_remove_filter_keeps_index_consistent() {
    let mut index = FilterIndex::new();
    let custom = Filter {
        custom_url: Some("https://x.test/list.txt".to_string()),
        ..filter(1000, 0, true, None)
    };
    index.init_loaded_filters(
        vec![filter(1, 1, true, None), custom.clone(), filter(3, 1, false, None)],
        vec![category(0, vec![], vec![custom])],
    );

    let removed = index.remove_filter(1000).unwrap();
    assert_eq!(removed.filter_id, 1000);
    assert!(index.get(1000).is_none());
    assert_eq!(index.get(3).map(|f| f.filter_id), Some(3));
    assert_eq!(index.enabled_count(0), 0);
    assert!(index.remove_filter(1000).is_none());
}

#[test]
fn test_upsert_replaces_known_record() {
    let mut index = FilterIndex::new();
    let custom = Filter {
        custom_url: Some("https://old.test/list.txt".to_string()),
        ..filter(1000, 0, false, Some(100))
    };
    index.init_loaded_filters(vec![custom.clone()], vec![category(0, vec![], vec![custom])]);

    let renamed = Filter {
        name: "Renamed list".to_string(),
        custom_url: Some("https://new.test/list.txt".to_string()),
        rules_count: 12,
        ..filter(1000, 0, true, Some(300))
    };
    assert!(!index.upsert_filter(renamed));

    let stored = index.get(1000).unwrap();
    assert_eq!(stored.name, "Renamed list");
    assert_eq!(stored.custom_url.as_deref(), Some("https://new.test/list.txt"));
    assert_eq!(stored.rules_count, 12);
    assert!(index.is_enabled(1000));
    assert_eq!(index.len(), 1);
    assert_eq!(index.last_update_time(), Some(300));
    let views = build_category_views(&index);
    assert_eq!(views[0].filters(FilterListTab::Other)[0].name, "Renamed list");
}

#[test]
fn test_upsert_moves_filter_between_groups() {
    let mut index = FilterIndex::new();
    let moving = filter(7, 1, true, None);
    index.init_loaded_filters(
        vec![moving.clone()],
        vec![category(1, vec![moving], vec![]), category(2, vec![], vec![])],
    );

    index.upsert_filter(filter(7, 2, true, None));

    assert_eq!(index.enabled_count(1), 0);
    let (_, other) = index.group_entries(2);
    assert_eq!(other.len(), 1);
    assert_eq!(other[0].filter_id, 7);
}

#[test]
fn test_upsert_appends_unknown_filter() {
    let mut index = FilterIndex::new();
    index.init_loaded_filters(vec![], vec![category(0, vec![], vec![])]);
    assert!(index.upsert_filter(filter(1000, 0, true, None)));
    assert!(index.is_enabled(1000));
}

// ============================================================================
// VIEW-MODELS
// ============================================================================

#[test]
fn test_views_reflect_patched_state() {
    let mut index = FilterIndex::new();
    let f1 = filter(1, 2, true, None);
    let f2 = filter(2, 2, false, None);
    index.init_loaded_filters(
        vec![f1.clone(), f2.clone()],
        vec![category(2, vec![f1], vec![f2])],
    );
    index.update_enabled(&Filter::new(2, 2), true);

    let views = build_category_views(&index);
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].enabled_count, 2);
    assert_eq!(views[0].hash, "#antibanner2");
    assert_eq!(views[0].filters(FilterListTab::Other)[0].filter_id, 2);
    assert!(views[0].filters(FilterListTab::Other)[0].enabled);
}

#[test]
fn test_views_are_ordered_by_display_number() {
    let mut index = FilterIndex::new();
    let mut late = category(1, vec![], vec![]);
    late.display_number = 9;
    let early = category(5, vec![], vec![]);
    index.init_loaded_filters(vec![], vec![late, early]);

    let ids: Vec<GroupId> = build_category_views(&index).iter().map(|v| v.group_id).collect();
    assert_eq!(ids, vec![5, 1]);
}

// ============================================================================
// PROPERTIES
// ============================================================================

fn arb_filters() -> impl Strategy<Value = Vec<Filter>> {
    prop::collection::vec(
        (0u32..40, 0u32..5, any::<bool>(), prop::option::of(0i64..1_000_000)),
        0..30,
    )
    .prop_map(|items| {
        items
            .into_iter()
            .map(|(id, group, enabled, ts)| filter(id, group, enabled, ts))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_last_update_time_is_max_and_monotonic(batches in prop::collection::vec(arb_filters(), 1..5)) {
        let mut index = FilterIndex::new();
        let mut previous: Option<i64> = None;
        for batch in batches {
            let batch_max = batch.iter().filter_map(|f| f.update_timestamp()).max();
            index.init_loaded_filters(batch, vec![]);
            let current = index.last_update_time();
            prop_assert!(current >= previous);
            prop_assert_eq!(current, previous.max(batch_max));
            previous = current;
        }
    }

    #[test]
    fn prop_update_enabled_then_is_enabled(
        initial in arb_filters(),
        id in 0u32..60,
        group in 0u32..5,
        enabled in any::<bool>(),
    ) {
        let mut index = FilterIndex::new();
        index.init_loaded_filters(initial, vec![]);
        index.update_enabled(&Filter::new(id, group), enabled);
        prop_assert_eq!(index.is_enabled(id), enabled);
    }

    #[test]
    fn prop_index_has_one_entry_per_id(filters in arb_filters()) {
        let mut index = FilterIndex::new();
        let mut ids: Vec<FilterId> = filters.iter().map(|f| f.filter_id).collect();
        let last_enabled: std::collections::HashMap<FilterId, bool> =
            filters.iter().map(|f| (f.filter_id, f.enabled)).collect();
        index.init_loaded_filters(filters, vec![]);

        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(index.len(), ids.len());
        for (id, enabled) in last_enabled {
            prop_assert_eq!(index.is_enabled(id), enabled);
        }
    }

    #[test]
    fn prop_is_enabled_never_panics(id in any::<u32>()) {
        let index = FilterIndex::new();
        prop_assert!(!index.is_enabled(id));
    }
}
