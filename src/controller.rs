use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::config::QueryOptions;
use crate::fetcher::NewsFetcher;
use crate::model::NewsItem;
use crate::parser;

/// Indicator text shown when a fetch settles with no usable articles.
pub const NO_NEWS_TEXT: &str = "No news found";
/// Indicator text shown when the network is unreachable at trigger time.
pub const NO_CONNECTION_TEXT: &str = "No internet connection";

/// Answers whether the network is currently reachable. Consulted once per
/// trigger, before any request is issued.
pub trait ConnectivityProbe: Send + Sync {
    fn is_reachable(&self) -> bool;
}

/// Probe that always reports the network as reachable.
pub struct AssumeOnline;

impl ConnectivityProbe for AssumeOnline {
    fn is_reachable(&self) -> bool {
        true
    }
}

/// Probe that attempts a short TCP connection to a host.
pub struct TcpProbe {
    host: String,
    port: u16,
}

impl TcpProbe {
    const PROBE_TIMEOUT: Duration = Duration::from_millis(1_500);

    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl ConnectivityProbe for TcpProbe {
    fn is_reachable(&self) -> bool {
        use std::net::{TcpStream, ToSocketAddrs};

        let addr = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next());
        match addr {
            Some(addr) => TcpStream::connect_timeout(&addr, Self::PROBE_TIMEOUT).is_ok(),
            None => false,
        }
    }
}

/// Probe for the host of the given endpoint URL. An endpoint that does not
/// parse is assumed online, so the fetch path gets to report it as an empty
/// result instead of a missing connection.
pub fn probe_for_endpoint(endpoint: &str) -> Arc<dyn ConnectivityProbe> {
    match url::Url::parse(endpoint) {
        Ok(url) => match url.host_str() {
            Some(host) => Arc::new(TcpProbe::new(
                host,
                url.port_or_known_default().unwrap_or(443),
            )),
            None => Arc::new(AssumeOnline),
        },
        Err(_) => Arc::new(AssumeOnline),
    }
}

/// Externally triggered controller inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Initial activation of the list.
    Activate,
    /// Explicit refresh request.
    Refresh,
    /// Activation (tap) of the item at the given index.
    OpenItem(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    NoConnectivity,
    NetworkError,
}

/// Controller states. Entering `Loading` discards any previously held list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListState {
    Idle,
    Loading,
    Loaded(Vec<NewsItem>),
    Empty,
    Failed(FailureReason),
}

impl ListState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ListState::Loaded(_) | ListState::Empty | ListState::Failed(_)
        )
    }
}

/// One-way notifications from the controller to the presentation layer.
/// The controller never renders or navigates itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    ShowLoading,
    HideLoading,
    /// Indicator text for the empty/error slot; `None` clears it.
    StatusText(Option<&'static str>),
    RenderList(Vec<NewsItem>),
    OpenUrl(String),
}

// Completion report from a spawned fetch task. The token identifies which
// trigger the result belongs to; stale tokens are discarded.
struct FetchDone {
    token: u64,
    outcome: Result<Vec<NewsItem>, FailureReason>,
}

/// Cloneable front door to a running controller.
#[derive(Clone)]
pub struct ControllerHandle {
    triggers: mpsc::UnboundedSender<Trigger>,
    state: watch::Receiver<ListState>,
}

impl ControllerHandle {
    pub fn activate(&self) {
        let _ = self.triggers.send(Trigger::Activate);
    }

    pub fn refresh(&self) {
        let _ = self.triggers.send(Trigger::Refresh);
    }

    pub fn open_item(&self, index: usize) {
        let _ = self.triggers.send(Trigger::OpenItem(index));
    }

    /// Snapshot of the current controller state.
    pub fn state(&self) -> ListState {
        self.state.borrow().clone()
    }

    /// Wait for the next terminal state, skipping intermediate `Loading`
    /// transitions. Returns the last seen state if the controller has gone
    /// away.
    pub async fn settled(&mut self) -> ListState {
        loop {
            if self.state.changed().await.is_err() {
                return self.state.borrow().clone();
            }
            let current = self.state.borrow_and_update().clone();
            if current.is_terminal() {
                return current;
            }
        }
    }
}

/// Orchestrates fetcher and parser and owns the list state machine:
/// `Idle -> Loading -> {Loaded, Empty, Failed}`.
///
/// A single task owns all mutable state. Fetches run on spawned tasks and
/// report back over a channel, stamped with a monotonically increasing
/// request token; only the latest token is honored, so a slow stale fetch
/// can never overwrite the outcome of a newer trigger.
pub struct NewsListController {
    fetcher: Arc<NewsFetcher>,
    connectivity: Arc<dyn ConnectivityProbe>,
    options_rx: watch::Receiver<QueryOptions>,
    triggers_rx: mpsc::UnboundedReceiver<Trigger>,
    results_tx: mpsc::UnboundedSender<FetchDone>,
    results_rx: mpsc::UnboundedReceiver<FetchDone>,
    events_tx: mpsc::UnboundedSender<ViewEvent>,
    state_tx: watch::Sender<ListState>,
    seq: u64,
    options_open: bool,
}

impl NewsListController {
    pub fn new(
        fetcher: Arc<NewsFetcher>,
        connectivity: Arc<dyn ConnectivityProbe>,
        options_rx: watch::Receiver<QueryOptions>,
    ) -> (
        Self,
        ControllerHandle,
        mpsc::UnboundedReceiver<ViewEvent>,
    ) {
        let (triggers_tx, triggers_rx) = mpsc::unbounded_channel();
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ListState::Idle);

        let controller = Self {
            fetcher,
            connectivity,
            options_rx,
            triggers_rx,
            results_tx,
            results_rx,
            events_tx,
            state_tx,
            seq: 0,
            options_open: true,
        };
        let handle = ControllerHandle {
            triggers: triggers_tx,
            state: state_rx,
        };

        (controller, handle, events_rx)
    }

    /// Run until every handle has been dropped.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                trigger = self.triggers_rx.recv() => match trigger {
                    Some(Trigger::Activate) => {
                        info!("News list activated");
                        self.start_fetch();
                    }
                    Some(Trigger::Refresh) => {
                        info!("Refresh requested");
                        self.start_fetch();
                    }
                    Some(Trigger::OpenItem(index)) => self.open_item(index),
                    None => break,
                },
                changed = self.options_rx.changed(), if self.options_open => match changed {
                    Ok(()) => {
                        info!("Query options changed, refetching");
                        self.start_fetch();
                    }
                    Err(_) => {
                        // Preferences side is gone; release the subscription.
                        debug!("Query options channel closed");
                        self.options_open = false;
                    }
                },
                Some(done) = self.results_rx.recv() => self.finish(done),
            }
        }
        debug!("Controller shutting down");
    }

    fn start_fetch(&mut self) {
        // Every trigger claims a new token so that any outstanding fetch
        // becomes stale, whichever way this trigger resolves.
        self.seq += 1;
        let token = self.seq;

        if !self.connectivity.is_reachable() {
            warn!("No connectivity, not fetching");
            self.emit(ViewEvent::RenderList(Vec::new()));
            self.enter_failed(FailureReason::NoConnectivity);
            return;
        }

        self.set_state(ListState::Loading);
        self.emit(ViewEvent::RenderList(Vec::new()));
        self.emit(ViewEvent::StatusText(None));
        self.emit(ViewEvent::ShowLoading);

        let options = self.options_rx.borrow().clone();
        let fetcher = self.fetcher.clone();
        let results = self.results_tx.clone();
        tokio::spawn(async move {
            let outcome = fetch_and_parse(&fetcher, &options).await;
            let _ = results.send(FetchDone { token, outcome });
        });
    }

    fn finish(&mut self, done: FetchDone) {
        if done.token != self.seq {
            debug!("Discarding result of superseded request {}", done.token);
            return;
        }

        match done.outcome {
            Ok(items) if !items.is_empty() => {
                info!("Loaded {} news items", items.len());
                self.emit(ViewEvent::HideLoading);
                self.emit(ViewEvent::StatusText(None));
                self.emit(ViewEvent::RenderList(items.clone()));
                self.set_state(ListState::Loaded(items));
            }
            Ok(_) => {
                info!("Fetch produced no news items");
                self.emit(ViewEvent::HideLoading);
                self.emit(ViewEvent::StatusText(Some(NO_NEWS_TEXT)));
                self.set_state(ListState::Empty);
            }
            Err(reason) => self.enter_failed(reason),
        }
    }

    fn enter_failed(&mut self, reason: FailureReason) {
        let text = match reason {
            FailureReason::NoConnectivity => NO_CONNECTION_TEXT,
            FailureReason::NetworkError => NO_NEWS_TEXT,
        };
        self.emit(ViewEvent::HideLoading);
        self.emit(ViewEvent::StatusText(Some(text)));
        self.set_state(ListState::Failed(reason));
    }

    fn open_item(&self, index: usize) {
        let url = match &*self.state_tx.borrow() {
            ListState::Loaded(items) => items.get(index).map(|item| item.url.clone()),
            _ => None,
        };
        match url {
            Some(url) => {
                info!("Opening external link {}", url);
                self.emit(ViewEvent::OpenUrl(url));
            }
            None => debug!("Ignoring activation of item {}", index),
        }
    }

    fn set_state(&self, state: ListState) {
        self.state_tx.send_replace(state);
    }

    fn emit(&self, event: ViewEvent) {
        let _ = self.events_tx.send(event);
    }
}

async fn fetch_and_parse(
    fetcher: &NewsFetcher,
    options: &QueryOptions,
) -> Result<Vec<NewsItem>, FailureReason> {
    let url = match fetcher.request_url(options) {
        Ok(url) => url,
        Err(e) => {
            // An unusable endpoint behaves like an empty response, not a
            // network failure.
            warn!("Could not build request URL: {}", e);
            return Ok(Vec::new());
        }
    };

    match fetcher.fetch_raw(url).await {
        Ok(body) => Ok(parser::parse(Some(&body))),
        Err(e) => {
            error!("News fetch failed: {}", e);
            Err(FailureReason::NetworkError)
        }
    }
}
