//! Integration tests for hash routing between settings panels

use adblock_options::ui::router::{NavOutcome, Panel, TabRouter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn counting_router() -> (TabRouter, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let router = TabRouter::new().with_whitelist_callback(Box::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    }));
    (router, calls)
}

#[test]
fn test_whitelist_hash_switches_panel_and_fires_callback_once() {
    let (mut router, calls) = counting_router();
    assert_eq!(router.current(), Panel::General);

    let outcome = router.navigate("#whitelist");

    assert_eq!(
        outcome,
        NavOutcome::Switched {
            previous: Panel::General,
            current: Panel::Whitelist
        }
    );
    assert!(router.is_visible(Panel::Whitelist));
    assert!(!router.is_visible(Panel::General));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_callback_only_fires_for_whitelist() {
    let (mut router, calls) = counting_router();
    router.navigate("#userfilter");
    router.navigate("#about");
    router.navigate("#general-settings");
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    router.navigate("#whitelist");
    router.navigate("#about");
    router.navigate("#whitelist");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_same_panel_is_unchanged_without_callback() {
    let (mut router, calls) = counting_router();
    router.navigate("#whitelist");
    assert_eq!(router.navigate("#whitelist"), NavOutcome::Unchanged);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unrendered_category_is_deferred() {
    let (mut router, _) = counting_router();
    router.navigate("#about");

    let outcome = router.navigate("#antibanner5");

    assert_eq!(outcome, NavOutcome::Deferred);
    assert_eq!(router.current(), Panel::About);
    assert_eq!(router.pending(), Some(5));
}

#[test]
fn test_deferred_category_opens_after_render() {
    let (mut router, _) = counting_router();
    router.navigate("#antibanner5");

    let outcome = router.set_rendered_categories([1, 5]);

    assert_eq!(
        outcome,
        Some(NavOutcome::Switched {
            previous: Panel::General,
            current: Panel::Category(5)
        })
    );
    assert_eq!(router.nav_highlight(), Panel::Filters);
    assert_eq!(router.pending(), None);
}

#[test]
fn test_deferred_category_missing_after_render_keeps_waiting() {
    let (mut router, _) = counting_router();
    router.navigate("#about");
    router.navigate("#antibanner7");

    assert_eq!(router.set_rendered_categories([1, 2]), None);
    assert_eq!(router.current(), Panel::About);
    assert_eq!(router.pending(), Some(7));
}

#[test]
fn test_missing_category_after_first_render_is_deferred() {
    let (mut router, _) = counting_router();
    router.set_rendered_categories([1, 2]);
    router.navigate("#about");

    assert_eq!(router.navigate("#antibanner5"), NavOutcome::Deferred);
    assert_eq!(router.current(), Panel::About);

    let outcome = router.set_rendered_categories([1, 2, 5]);
    assert_eq!(
        outcome,
        Some(NavOutcome::Switched {
            previous: Panel::About,
            current: Panel::Category(5)
        })
    );
    assert_eq!(router.pending(), None);
}

#[test]
fn test_later_navigation_cancels_deferred_category() {
    let (mut router, _) = counting_router();
    router.navigate("#antibanner5");
    router.navigate("#userfilter");

    assert_eq!(router.set_rendered_categories([5]), None);
    assert_eq!(router.current(), Panel::UserFilter);
}

#[test]
fn test_garbage_hash_shows_default_panel() {
    let (mut router, _) = counting_router();
    router.navigate("#whitelist");
    router.navigate("");
    assert_eq!(router.current(), Panel::General);
}
