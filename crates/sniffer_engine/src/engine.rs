use std::sync::{mpsc, Arc};
use std::thread;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::discover::discover_total_pages;
use crate::fetch::{ReqwestTransport, Transport};
use crate::parse::parse_records;
use crate::retry::RetryingFetcher;
use crate::settings::EngineSettings;
use crate::stats::{RequestCounters, RunStats};
use crate::types::{FontRecord, PageIndex, SearchEvent};

/// Receives the events of a run as they are produced.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: SearchEvent);
}

/// Sink that forwards events into an mpsc channel, dropping them once the
/// consumer has gone away.
pub struct ChannelEventSink {
    tx: mpsc::Sender<SearchEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<SearchEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: SearchEvent) {
        let _ = self.tx.send(event);
    }
}

/// The harvesting engine. One instance drives at most one run: [`search`]
/// consumes the engine, so a new run needs a fresh instance (and fresh
/// counters).
///
/// [`search`]: Harvester::search
pub struct Harvester {
    settings: EngineSettings,
    counters: Arc<RequestCounters>,
    cancel: CancellationToken,
}

impl Harvester {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            counters: Arc::new(RequestCounters::default()),
            cancel: CancellationToken::new(),
        }
    }

    /// Token polled by the run at every checkpoint. Clone it before calling
    /// [`search`](Self::search) to cancel from another thread.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Detached copy of the request counters; callable mid-run.
    pub fn stats(&self) -> RunStats {
        self.counters.snapshot()
    }

    /// Starts a run and returns the event stream. The run is driven by a
    /// dedicated thread with its own runtime; the caller pulls events at its
    /// own pace and the engine never throttles on the consumer.
    pub fn search(self, keyword: impl Into<String>) -> SearchStream {
        let keyword = keyword.into();
        let (event_tx, event_rx) = mpsc::channel();
        let counters = self.counters.clone();
        let cancel = self.cancel.clone();
        let settings = self.settings;

        thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
            let sink = ChannelEventSink::new(event_tx);
            runtime.block_on(run_search(settings, counters, cancel, keyword, &sink));
        });

        SearchStream {
            event_rx,
            counters: self.counters,
            cancel: self.cancel,
        }
    }
}

/// Consumer end of one run. The stream ends after `Done`, or without it
/// when the run was cancelled.
pub struct SearchStream {
    event_rx: mpsc::Receiver<SearchEvent>,
    counters: Arc<RequestCounters>,
    cancel: CancellationToken,
}

impl SearchStream {
    /// Blocks until the next event, or `None` once the stream has ended.
    pub fn recv(&self) -> Option<SearchEvent> {
        self.event_rx.recv().ok()
    }

    /// Returns the next event if one is ready.
    pub fn try_recv(&self) -> Option<SearchEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Detached copy of the request counters; callable mid-run.
    pub fn stats(&self) -> RunStats {
        self.counters.snapshot()
    }

    /// Requests cooperative cancellation of the run.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Iterator for SearchStream {
    type Item = SearchEvent;

    fn next(&mut self) -> Option<SearchEvent> {
        self.recv()
    }
}

async fn run_search(
    settings: EngineSettings,
    counters: Arc<RequestCounters>,
    cancel: CancellationToken,
    keyword: String,
    sink: &dyn EventSink,
) {
    let transport: Arc<dyn Transport> = match ReqwestTransport::new(&settings) {
        Ok(transport) => Arc::new(transport),
        Err(err) => {
            sink.emit(SearchEvent::Error {
                text: format!("failed to build http client: {err}"),
            });
            return;
        }
    };

    let fetcher = Arc::new(RetryingFetcher::new(
        transport,
        settings.clone(),
        counters.clone(),
        cancel.clone(),
    ));

    sink.emit(SearchEvent::Status {
        text: "detecting total page count...".to_string(),
    });
    let total_pages = discover_total_pages(&fetcher, settings.fallback_total_pages).await;
    sink.emit(SearchEvent::Status {
        text: format!("detected {total_pages} pages"),
    });

    let workers = settings.worker_count();
    sink.emit(SearchEvent::Status {
        text: format!("starting {workers} workers | keyword: '{keyword}'"),
    });

    // All page tasks are submitted up front; the semaphore bounds how many
    // run at once. Completions are drained in whatever order they arrive.
    let keyword_lowercased = keyword.to_lowercase();
    let semaphore = Arc::new(Semaphore::new(workers));
    let mut tasks: JoinSet<(PageIndex, Vec<FontRecord>)> = JoinSet::new();
    for page in 1..=total_pages {
        let fetcher = fetcher.clone();
        let semaphore = semaphore.clone();
        let keyword_lowercased = keyword_lowercased.clone();
        let page_url = settings.listing_url(page);

        tasks.spawn(async move {
            // The engine never closes the semaphore, so acquisition can only
            // fail on a broken invariant.
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("semaphore is never closed");
            let Some(html) = fetcher.fetch_page(page).await else {
                return (page, Vec::new());
            };
            (page, parse_records(&html, &keyword_lowercased, &page_url))
        });
    }

    let mut completed: PageIndex = 0;
    let mut total_found: usize = 0;

    while let Some(joined) = tasks.join_next().await {
        if cancel.is_cancelled() {
            // In-flight tasks are abandoned, not awaited.
            tasks.abort_all();
            sink.emit(SearchEvent::Status {
                text: "search aborted".to_string(),
            });
            return;
        }

        match joined {
            Ok((page, records)) => {
                completed += 1;
                sink.emit(SearchEvent::Status {
                    text: format!(
                        "page {page} done | processed {completed}/{total_pages} pages \
                         | found {total_found} fonts"
                    ),
                });

                for record in records {
                    total_found += 1;
                    sink.emit(SearchEvent::Result {
                        record,
                        source_page: page,
                    });
                }
            }
            Err(err) => {
                counters.record_task_failure();
                log::warn!("page task failed: {err}");
                sink.emit(SearchEvent::Status {
                    text: format!("page task failed: {err}"),
                });
            }
        }
    }

    // The token may fire after the last completion was processed (or before
    // the first one of a zero-page run); a cancelled run must never report
    // completion.
    if cancel.is_cancelled() {
        sink.emit(SearchEvent::Status {
            text: "search aborted".to_string(),
        });
        return;
    }

    let stats = counters.snapshot();
    sink.emit(SearchEvent::Status {
        text: format!(
            "search complete: found {total_found} fonts | requests: total={} \
             success={} failed={} retried={}",
            stats.total_requests,
            stats.successful_requests,
            stats.failed_requests,
            stats.retried_requests,
        ),
    });
    sink.emit(SearchEvent::Done { total_found, stats });
}
