use std::time::Duration;

use pretty_assertions::assert_eq;
use sniffer_engine::{EngineSettings, Harvester, PageIndex, SearchEvent};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn listing_page(name: &str, href: &str) -> String {
    format!(
        r#"<html><body>
        <section class="mg-t10 border soft-list">
          <ul id="li-change-color" class="soft-list-bd hover-one">
            <li><a class="mg-r10" href="{href}">{name}</a></li>
          </ul>
        </section>
        </body></html>"#
    )
}

async fn stub_page(server: &MockServer, page: PageIndex, name: &str, href: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/font/list_200_{page}.html")))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(name, href)))
        .mount(server)
        .await;
}

fn settings_for(server: &MockServer) -> EngineSettings {
    EngineSettings {
        listing_url_template: format!("{}/font/list_200_{{page}}.html", server.uri()),
        fallback_total_pages: 3,
        concurrency: 4,
        max_retries: 0,
        base_delay: Duration::from_millis(1),
        ..EngineSettings::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn full_run_filters_by_keyword_and_ends_with_done() {
    sniffer_logging::initialize_for_tests();

    let server = MockServer::start().await;
    // Page 1 carries no pager, so the configured fallback of 3 pages is used.
    stub_page(&server, 1, "Song A", "/font/a1.html").await;
    stub_page(&server, 2, "Song B", "/font/b2.html").await;
    stub_page(&server, 3, "Other", "/font/c3.html").await;

    let engine = Harvester::new(settings_for(&server));
    let events: Vec<SearchEvent> = tokio::task::spawn_blocking(move || {
        engine.search("Song").collect()
    })
    .await
    .expect("search run");

    // Pages complete in nondeterministic order; compare results as a set.
    let mut found: Vec<(String, String, PageIndex)> = events
        .iter()
        .filter_map(|event| match event {
            SearchEvent::Result {
                record,
                source_page,
            } => Some((record.name.clone(), record.detail_url.clone(), *source_page)),
            _ => None,
        })
        .collect();
    found.sort();
    assert_eq!(
        found,
        vec![
            ("Song A".to_string(), format!("{}/font/a1.html", server.uri()), 1),
            ("Song B".to_string(), format!("{}/font/b2.html", server.uri()), 2),
        ]
    );

    let dones: Vec<&SearchEvent> = events
        .iter()
        .filter(|event| matches!(event, SearchEvent::Done { .. }))
        .collect();
    assert_eq!(dones.len(), 1);
    let Some(SearchEvent::Done { total_found, stats }) = events.last() else {
        panic!("stream must end with Done");
    };
    assert_eq!(*total_found, 2);

    // Discovery probes page 1 before the three page tasks run.
    assert_eq!(stats.total_requests, 4);
    assert_eq!(stats.successful_requests, 4);
    assert_eq!(stats.failed_requests, 0);
    assert_eq!(stats.retried_requests, 0);

    assert!(!events
        .iter()
        .any(|event| matches!(event, SearchEvent::Error { .. })));
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_pages_are_skipped_without_aborting_the_run() {
    sniffer_logging::initialize_for_tests();

    let server = MockServer::start().await;
    stub_page(&server, 1, "Song A", "/font/a1.html").await;
    Mock::given(method("GET"))
        .and(path("/font/list_200_2.html"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    stub_page(&server, 3, "Song C", "/font/c3.html").await;

    let engine = Harvester::new(settings_for(&server));
    let events: Vec<SearchEvent> = tokio::task::spawn_blocking(move || {
        engine.search("Song").collect()
    })
    .await
    .expect("search run");

    let mut names: Vec<String> = events
        .iter()
        .filter_map(|event| match event {
            SearchEvent::Result { record, .. } => Some(record.name.clone()),
            _ => None,
        })
        .collect();
    names.sort();
    assert_eq!(names, vec!["Song A", "Song C"]);

    let Some(SearchEvent::Done { total_found, stats }) = events.last() else {
        panic!("stream must end with Done");
    };
    assert_eq!(*total_found, 2);
    assert_eq!(stats.failed_requests, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn preset_cancellation_yields_no_results_and_no_done() {
    let server = MockServer::start().await;
    stub_page(&server, 1, "Song A", "/font/a1.html").await;

    let engine = Harvester::new(settings_for(&server));
    engine.cancel_token().cancel();

    let events: Vec<SearchEvent> = tokio::task::spawn_blocking(move || {
        engine.search("Song").collect()
    })
    .await
    .expect("search run");

    assert!(!events
        .iter()
        .any(|event| matches!(event, SearchEvent::Result { .. })));
    assert!(!events
        .iter()
        .any(|event| matches!(event, SearchEvent::Done { .. })));
    assert!(events.iter().any(|event| matches!(
        event,
        SearchEvent::Status { text } if text == "search aborted"
    )));
}

#[tokio::test(flavor = "multi_thread")]
async fn cancellation_with_no_pending_completions_still_suppresses_done() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/font/list_200_1.html"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    // Discovery fails and the fallback of zero pages leaves the drain loop
    // with nothing to process, so only the final check can observe the token.
    let settings = EngineSettings {
        fallback_total_pages: 0,
        ..settings_for(&server)
    };
    let engine = Harvester::new(settings);
    engine.cancel_token().cancel();

    let events: Vec<SearchEvent> = tokio::task::spawn_blocking(move || {
        engine.search("Song").collect()
    })
    .await
    .expect("search run");

    assert!(!events
        .iter()
        .any(|event| matches!(event, SearchEvent::Done { .. })));
    assert!(events.iter().any(|event| matches!(
        event,
        SearchEvent::Status { text } if text == "search aborted"
    )));
}

#[tokio::test(flavor = "multi_thread")]
async fn mid_run_cancellation_stops_progress_at_the_next_completion() {
    sniffer_logging::initialize_for_tests();

    let server = MockServer::start().await;
    // Page 1 answers immediately; the rest are slow enough that their
    // completions are only drained after the token fires.
    stub_page(&server, 1, "Song A", "/font/a1.html").await;
    for page in 2..=3 {
        Mock::given(method("GET"))
            .and(path(format!("/font/list_200_{page}.html")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(500))
                    .set_body_string(listing_page("Song Slow", "/font/slow.html")),
            )
            .mount(&server)
            .await;
    }

    let engine = Harvester::new(settings_for(&server));
    let after_cancel: Vec<SearchEvent> = tokio::task::spawn_blocking(move || {
        let stream = engine.search("Song");
        while let Some(event) = stream.recv() {
            let is_progress =
                matches!(&event, SearchEvent::Status { text } if text.starts_with("page "));
            if is_progress {
                stream.cancel();
                break;
            }
        }

        let mut rest = Vec::new();
        while let Some(event) = stream.recv() {
            rest.push(event);
        }
        rest
    })
    .await
    .expect("search run");

    assert!(after_cancel.iter().any(|event| matches!(
        event,
        SearchEvent::Status { text } if text == "search aborted"
    )));
    assert!(!after_cancel
        .iter()
        .any(|event| matches!(event, SearchEvent::Done { .. })));
    assert!(!after_cancel.iter().any(|event| matches!(
        event,
        SearchEvent::Status { text } if text.starts_with("page ")
    )));
}

#[test]
fn stats_snapshots_are_idempotent_and_detached() {
    let engine = Harvester::new(EngineSettings::default());
    let first = engine.stats();
    let second = engine.stats();
    assert_eq!(first, second);
    assert_eq!(first.total_requests, 0);
}

#[test]
fn worker_count_is_clamped_to_the_valid_range() {
    let low = EngineSettings {
        concurrency: 0,
        ..EngineSettings::default()
    };
    assert_eq!(low.worker_count(), 1);

    let high = EngineSettings {
        concurrency: 99,
        ..EngineSettings::default()
    };
    assert_eq!(high.worker_count(), 20);

    let within = EngineSettings::default();
    assert_eq!(within.worker_count(), 8);
}
