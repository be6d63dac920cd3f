//! Integration tests for the in-process filtering service
//!
//! Custom filter downloads run against a local mockito server.

use adblock_options::backend::service::default_catalog;
use adblock_options::backend::{BackendEvent, BackendRequest, BackendService, HttpFetcher};
use adblock_options::models::FilterId;
use std::sync::Arc;
use tokio::sync::mpsc;

const LIST: &str = "[Adblock Plus 2.0]\n\
    ! Title: Mock List\n\
    ! Version: 3.1\n\
    ||ads.mock.test^\n\
    ||tracker.mock.test^\n";

fn service() -> BackendService {
    BackendService::with_default_catalog(Arc::new(HttpFetcher::new()))
}

fn changed_ids(events: &[BackendEvent], expect_enabled: bool) -> Vec<FilterId> {
    events
        .iter()
        .filter_map(|e| match e {
            BackendEvent::FilterEnabledChanged { filter, enabled } if *enabled == expect_enabled => {
                Some(filter.filter_id)
            }
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_metadata_matches_catalog() {
    let mut svc = service();
    let events = svc.handle(BackendRequest::RequestFiltersMetadata).await;
    assert_eq!(events, vec![BackendEvent::FiltersMetadata(default_catalog())]);
}

#[tokio::test]
async fn test_enable_then_disable_filter() {
    let mut svc = service();
    let events = svc.handle(BackendRequest::EnableFilter(101)).await;
    assert_eq!(changed_ids(&events, true), vec![101]);

    let events = svc.handle(BackendRequest::DisableFilter(101)).await;
    assert_eq!(changed_ids(&events, false), vec![101]);

    // Metadata reflects the latest state
    match &svc.handle(BackendRequest::RequestFiltersMetadata).await[0] {
        BackendEvent::FiltersMetadata(metadata) => {
            let easylist = metadata.filters.iter().find(|f| f.filter_id == 101).unwrap();
            assert!(!easylist.enabled);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_enable_group_without_recommended_enables_all() {
    let mut svc = service();
    let events = svc.handle(BackendRequest::EnableGroup(5)).await;
    assert_eq!(changed_ids(&events, true), vec![208]);

    let events = svc.handle(BackendRequest::DisableGroup(5)).await;
    assert_eq!(changed_ids(&events, false), vec![208]);
}

#[tokio::test]
async fn test_unknown_filter_produces_no_event() {
    let mut svc = service();
    assert!(svc.handle(BackendRequest::EnableFilter(9999)).await.is_empty());
}

#[tokio::test]
async fn test_whitelist_and_user_rules_round_trip() {
    let mut svc = service();
    svc.handle(BackendRequest::SaveWhitelist(vec!["example.org".to_string()]))
        .await;
    svc.handle(BackendRequest::SaveUserRules(vec!["||ads.test^".to_string()]))
        .await;

    assert_eq!(
        svc.handle(BackendRequest::GetWhitelist).await,
        vec![BackendEvent::WhitelistLoaded(vec!["example.org".to_string()])]
    );
    assert_eq!(
        svc.handle(BackendRequest::GetUserRules).await,
        vec![BackendEvent::UserRulesLoaded(vec!["||ads.test^".to_string()])]
    );
}

#[tokio::test]
async fn test_change_user_setting_is_echoed() {
    let mut svc = service();
    let events = svc
        .handle(BackendRequest::ChangeUserSetting {
            key: "use-optimized-filters".to_string(),
            value: true,
        })
        .await;
    assert_eq!(
        events,
        vec![BackendEvent::SettingChanged {
            key: "use-optimized-filters".to_string(),
            value: true
        }]
    );

    match &svc.handle(BackendRequest::Initialize).await[0] {
        BackendEvent::Initialized(init) => {
            assert!(init.user_settings.flag("use-optimized-filters"))
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_reset_blocked_stats() {
    let mut svc = service();
    svc.record_blocked(42);
    assert_eq!(
        svc.handle(BackendRequest::ResetBlockedStats).await,
        vec![BackendEvent::BlockedStatsReset]
    );
    assert_eq!(svc.blocked_count(), 0);
}

#[tokio::test]
async fn test_check_updates_reports_enabled_filters() {
    let mut svc = service();
    let events = svc.handle(BackendRequest::CheckFiltersUpdate).await;
    match &events[0] {
        BackendEvent::FiltersUpdateChecked { updated } => {
            let ids: Vec<FilterId> = updated.iter().map(|f| f.filter_id).collect();
            assert_eq!(ids, vec![2, 3]);
            assert!(updated.iter().all(|f| f.last_update_time.is_some()));
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert!(matches!(events[1], BackendEvent::FiltersMetadata(_)));
}

// ============================================================================
// SETTINGS IMPORT
// ============================================================================

#[tokio::test]
async fn test_import_settings_applies_bundle() {
    let mut svc = service();
    let bundle = r#"{
        "general-settings": {"use-optimized-filters": true},
        "filters": {
            "enabled-filters": [101, 4],
            "user-filter": {"rules": "||ads.test^\n\n##.banner"},
            "whitelist": {"domains": ["example.org"]}
        }
    }"#;

    let events = svc
        .handle(BackendRequest::ImportSettings(bundle.to_string()))
        .await;

    assert_eq!(events[0], BackendEvent::SettingsImported(true));
    match &events[1] {
        BackendEvent::FiltersMetadata(metadata) => {
            let mut enabled: Vec<FilterId> = metadata
                .filters
                .iter()
                .filter(|f| f.enabled)
                .map(|f| f.filter_id)
                .collect();
            enabled.sort_unstable();
            assert_eq!(enabled, vec![4, 101]);
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(
        events[2],
        BackendEvent::WhitelistLoaded(vec!["example.org".to_string()])
    );
    assert_eq!(
        events[3],
        BackendEvent::UserRulesLoaded(vec!["||ads.test^".to_string(), "##.banner".to_string()])
    );
    assert_eq!(
        events[4],
        BackendEvent::SettingChanged {
            key: "use-optimized-filters".to_string(),
            value: true
        }
    );
}

#[tokio::test]
async fn test_import_invalid_settings_leaves_state_untouched() {
    let mut svc = service();
    let events = svc
        .handle(BackendRequest::ImportSettings("not json".to_string()))
        .await;
    assert_eq!(events, vec![BackendEvent::SettingsImported(false)]);

    match &svc.handle(BackendRequest::Initialize).await[0] {
        BackendEvent::Initialized(init) => assert_eq!(init.enabled_filters, vec![2, 3]),
        other => panic!("unexpected event {:?}", other),
    }
}

// ============================================================================
// CUSTOM FILTERS
// ============================================================================

#[tokio::test]
async fn test_check_custom_filter_reads_header() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/list.txt")
        .with_status(200)
        .with_body(LIST)
        .create_async()
        .await;
    let url = format!("{}/list.txt", server.url());

    let mut svc = service();
    let events = svc
        .handle(BackendRequest::CheckCustomFilter { url: url.clone() })
        .await;

    mock.assert_async().await;
    match &events[0] {
        BackendEvent::CustomFilterInfo(info) => {
            assert_eq!(info.url, url);
            assert_eq!(info.name, "Mock List");
            assert_eq!(info.version, "3.1");
            assert_eq!(info.rules_count, 2);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_check_custom_filter_http_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/missing.txt")
        .with_status(404)
        .create_async()
        .await;
    let url = format!("{}/missing.txt", server.url());

    let mut svc = service();
    let events = svc
        .handle(BackendRequest::CheckCustomFilter { url: url.clone() })
        .await;

    match &events[0] {
        BackendEvent::CustomFilterError { url: failed, message } => {
            assert_eq!(failed, &url);
            assert!(message.contains("404"));
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_check_custom_filter_from_file_url() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("local.txt");
    std::fs::write(&path, LIST)?;
    let url = format!("file://{}", path.display());

    let mut svc = service();
    let events = svc.handle(BackendRequest::CheckCustomFilter { url }).await;
    assert!(matches!(&events[0], BackendEvent::CustomFilterInfo(info) if info.name == "Mock List"));
    Ok(())
}

#[tokio::test]
async fn test_add_and_remove_custom_filter() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/list.txt")
        .with_status(200)
        .with_body(LIST)
        .create_async()
        .await;
    let url = format!("{}/list.txt", server.url());

    let mut svc = service();
    svc.handle(BackendRequest::CheckCustomFilter { url: url.clone() })
        .await;
    let events = svc
        .handle(BackendRequest::AddCustomFilter {
            url: url.clone(),
            title: String::new(),
            trusted: false,
        })
        .await;

    let added = match &events[0] {
        BackendEvent::FilterAdded(filter) => filter.clone(),
        other => panic!("unexpected event {:?}", other),
    };
    assert_eq!(added.filter_id, 1000);
    assert_eq!(added.group_id, 0);
    assert_eq!(added.name, "Mock List");
    assert_eq!(added.rules_count, 2);
    assert!(added.enabled && added.is_custom() && !added.trusted);

    // Subscribing again only re-enables the existing entry
    let again = svc
        .handle(BackendRequest::AddCustomFilter {
            url,
            title: "Renamed".to_string(),
            trusted: true,
        })
        .await;
    assert!(again.is_empty());

    assert_eq!(
        svc.handle(BackendRequest::RemoveCustomFilter(1000)).await,
        vec![BackendEvent::FilterRemoved(1000)]
    );
    assert!(svc
        .handle(BackendRequest::RemoveCustomFilter(1000))
        .await
        .is_empty());
}

// ============================================================================
// CHANNEL LOOP
// ============================================================================

#[tokio::test]
async fn test_run_answers_over_channels() {
    let (req_tx, req_rx) = mpsc::channel(8);
    let (evt_tx, mut evt_rx) = mpsc::channel(8);
    let handle = tokio::spawn(service().run(req_rx, evt_tx));

    req_tx.send(BackendRequest::GetWhitelist).await.unwrap();
    req_tx.send(BackendRequest::ResetBlockedStats).await.unwrap();
    drop(req_tx);

    assert_eq!(
        evt_rx.recv().await,
        Some(BackendEvent::WhitelistLoaded(Vec::new()))
    );
    assert_eq!(evt_rx.recv().await, Some(BackendEvent::BlockedStatsReset));
    handle.await.unwrap();
    assert_eq!(evt_rx.recv().await, None);
}
