//! Debounce, staleness and selection behaviour of the quick search.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{ScriptedCatalog, maharashtra};
use locus_catalog::LocationRecord;
use locus_cascade::{LocationQuickSearch, QuickSearchController, SearchConfig};
use tokio::time::sleep;

fn search(catalog: &Arc<ScriptedCatalog>) -> QuickSearchController {
    QuickSearchController::new(catalog.clone(), SearchConfig::default())
}

fn localities(records: &[LocationRecord]) -> Vec<&str> {
    records.iter().map(|r| r.locality.as_str()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_short_queries_never_reach_catalog() {
    let catalog = ScriptedCatalog::new(maharashtra());
    let qs = search(&catalog);

    qs.input("ab");
    sleep(Duration::from_millis(500)).await;
    assert_eq!(catalog.total_calls(), 0);

    qs.input("abc");
    sleep(Duration::from_millis(500)).await;
    assert_eq!(catalog.calls(), ["search:abc"]);
}

#[tokio::test(start_paused = true)]
async fn test_back_to_back_keystrokes_search_once() {
    let catalog = ScriptedCatalog::new(maharashtra());
    let qs = search(&catalog);

    qs.input("ab");
    qs.input("abc");
    sleep(Duration::from_millis(400)).await;

    assert_eq!(catalog.calls(), ["search:abc"]);
    assert_eq!(qs.view().results_for.as_deref(), Some("abc"));
}

#[tokio::test(start_paused = true)]
async fn test_length_is_counted_on_trimmed_text() {
    let catalog = ScriptedCatalog::new(maharashtra());
    let qs = search(&catalog);

    qs.input("  mu  ");
    sleep(Duration::from_millis(500)).await;
    assert_eq!(catalog.total_calls(), 0);
    assert_eq!(qs.view().query, "  mu  ");
}

#[tokio::test(start_paused = true)]
async fn test_each_keystroke_restarts_debounce() {
    let catalog = ScriptedCatalog::new(maharashtra());
    let qs = search(&catalog);

    qs.input("mum");
    sleep(Duration::from_millis(200)).await;
    qs.input("mumb");
    sleep(Duration::from_millis(200)).await;
    assert_eq!(catalog.total_calls(), 0);

    sleep(Duration::from_millis(200)).await;
    assert_eq!(catalog.calls(), ["search:mumb"]);
    let view = qs.view();
    assert_eq!(localities(&view.results), ["Mumbai", "Mumbai"]);
    assert_eq!(view.results_for.as_deref(), Some("mumb"));
    assert!(!view.loading);
}

#[tokio::test(start_paused = true)]
async fn test_late_response_for_older_query_is_dropped() {
    let catalog = ScriptedCatalog::new(maharashtra());
    catalog.delay("search:mum", Duration::from_millis(1000));
    let qs = search(&catalog);

    qs.input("mum");
    sleep(Duration::from_millis(350)).await;
    assert!(qs.view().loading);

    qs.input("pun");
    sleep(Duration::from_millis(400)).await;
    assert_eq!(localities(&qs.view().results), ["Pune", "Pune"]);

    sleep(Duration::from_millis(1000)).await;
    let view = qs.view();
    assert_eq!(view.query, "pun");
    assert_eq!(catalog.finished(), ["search:pun"]);
    assert_eq!(localities(&view.results), ["Pune", "Pune"]);
    assert_eq!(catalog.count("search:mum"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_shortening_query_clears_results() {
    let catalog = ScriptedCatalog::new(maharashtra());
    let qs = search(&catalog);

    qs.input("pune");
    sleep(Duration::from_millis(400)).await;
    assert_eq!(qs.view().results.len(), 2);

    qs.input("pu");
    assert!(qs.view().results.is_empty());
    qs.input("");
    assert!(qs.view().results.is_empty());
    assert_eq!(catalog.total_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_search_clears_results() {
    let catalog = ScriptedCatalog::new(maharashtra());
    catalog.fail("search:mumb");
    let qs = search(&catalog);

    qs.input("mum");
    sleep(Duration::from_millis(400)).await;
    assert_eq!(qs.view().results.len(), 2);

    qs.input("mumb");
    sleep(Duration::from_millis(400)).await;
    let view = qs.view();
    assert!(view.results.is_empty());
    assert_eq!(view.results_for.as_deref(), Some("mumb"));
    assert!(!view.loading);
}

#[tokio::test(start_paused = true)]
async fn test_results_are_capped() {
    let catalog = ScriptedCatalog::new(maharashtra());
    let config = SearchConfig {
        max_results: 1,
        ..SearchConfig::default()
    };
    let qs = QuickSearchController::new(catalog.clone(), config);

    qs.input("maharashtra");
    sleep(Duration::from_millis(400)).await;
    assert_eq!(qs.view().results.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_discards_in_flight_search() {
    let catalog = ScriptedCatalog::new(maharashtra());
    catalog.delay("search:mum", Duration::from_millis(500));
    let qs = search(&catalog);

    qs.input("mum");
    sleep(Duration::from_millis(350)).await;
    assert!(qs.view().loading);
    qs.shutdown();
    sleep(Duration::from_millis(1000)).await;

    assert!(qs.view().results.is_empty());
    assert!(catalog.finished().is_empty(), "in-flight search kept running");
    qs.input("pune");
    sleep(Duration::from_millis(400)).await;
    assert_eq!(catalog.calls(), ["search:mum"]);
}

#[tokio::test(start_paused = true)]
async fn test_drop_cancels_pending_timer() {
    let catalog = ScriptedCatalog::new(maharashtra());
    let qs = search(&catalog);

    qs.input("mum");
    drop(qs);
    sleep(Duration::from_millis(1000)).await;

    assert_eq!(catalog.total_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_selecting_result_emits_triple_once_and_resets() {
    let catalog = ScriptedCatalog::new(maharashtra());
    let picked = Arc::new(Mutex::new(Vec::new()));
    let sink = picked.clone();
    let qs = LocationQuickSearch::new(
        catalog.clone(),
        SearchConfig::default(),
        move |region, locality, postal_code| {
            sink.lock()
                .unwrap()
                .push(format!("{region}|{locality}|{postal_code}"));
        },
    );

    qs.input("mum");
    sleep(Duration::from_millis(400)).await;
    assert_eq!(qs.view().results[0].label(), "Mumbai, Maharashtra - 400001");

    assert!(qs.select(0));
    assert_eq!(*picked.lock().unwrap(), ["Maharashtra|Mumbai|400001"]);
    let view = qs.view();
    assert_eq!(view.query, "");
    assert!(view.results.is_empty());

    assert!(!qs.select(0));
    assert_eq!(picked.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_postal_code_search_yields_full_location() {
    let catalog = ScriptedCatalog::new(maharashtra());
    let picked = Arc::new(Mutex::new(Vec::new()));
    let sink = picked.clone();
    let qs = LocationQuickSearch::new(
        catalog.clone(),
        SearchConfig::default(),
        move |region, locality, postal_code| {
            sink.lock().unwrap().push((
                region.to_string(),
                locality.to_string(),
                postal_code.to_string(),
            ));
        },
    );

    qs.input("400001");
    sleep(Duration::from_millis(400)).await;
    let view = qs.view();
    let index = view
        .results
        .iter()
        .position(|r| *r == LocationRecord::new("Maharashtra", "Mumbai", "400001"))
        .expect("postal code hit");

    assert!(qs.select(index));
    assert_eq!(
        *picked.lock().unwrap(),
        [(
            "Maharashtra".to_string(),
            "Mumbai".to_string(),
            "400001".to_string()
        )]
    );
    assert_eq!(qs.view().query, "");
}

#[tokio::test(start_paused = true)]
async fn test_selection_drops_pending_search() {
    let catalog = ScriptedCatalog::new(maharashtra());
    catalog.delay("search:mumb", Duration::from_millis(500));
    let qs = search(&catalog);

    qs.input("mum");
    sleep(Duration::from_millis(400)).await;
    qs.input("mumb");
    sleep(Duration::from_millis(350)).await;
    assert!(qs.select(1).is_some());

    sleep(Duration::from_millis(1000)).await;
    assert!(qs.view().results.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_results() {
    let catalog = ScriptedCatalog::new(maharashtra());
    let qs = search(&catalog);
    let mut rx = qs.subscribe();

    qs.input("pune");
    rx.wait_for(|v| !v.results.is_empty()).await.unwrap();

    assert_eq!(localities(&rx.borrow().results), ["Pune", "Pune"]);
}
