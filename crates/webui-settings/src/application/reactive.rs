//! Reactive runtime: declared dependencies, async node state, refresh loop.
//!
//! # How it fits together (for beginners)
//!
//! Synchronous derived values need no runtime at all: they recompute on every
//! read (see [`SettingsContext`]).  Async nodes are different: their value
//! arrives later, over the network, and the UI wants to show something while
//! waiting.  This module gives each async node:
//!
//! - an explicit state, [`AsyncState`]: `Pending`, `Resolved(value)` or
//!   `Failed(reason)`;
//! - a `tokio::sync::watch` channel, so consumers can await state changes
//!   instead of polling;
//! - a generation counter, so a slow request that was started before a newer
//!   one can never overwrite the newer result.
//!
//! Every derived node declares its upstream inputs in [`NodeId::dependencies`].
//! When the store reports a write, [`ReactiveSettings`] computes the set of
//! async nodes affected by that key and refreshes only those.
//!
//! ```text
//! SettingStore::set ──► SettingChange{key} ──► affected_by(key)
//!                                                  │
//!                         ┌────────────────────────┴─────┐
//!                         ▼                              ▼
//!                 ServerSideCookies.refresh     SavedTemplates.refresh
//! ```

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use webui_settings_core::{cookies_flag, CustomTemplate};

use crate::application::context::SettingsContext;
use crate::application::remote::{ApiError, RemoteSettings};

/// How often the refresh loop checks the shutdown flag while idle.
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(200);

// ── Dependency graph ─────────────────────────────────────────────────────────

/// Every derived node of the settings graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeId {
    EffectiveTheme,
    ComposedServerAddress,
    BaseUrl,
    RpcWebSocketEndpoint,
    RpcHttpEndpoint,
    ServerSideCookies,
    SessionCookiesFlag,
    SavedTemplates,
    SettingsSnapshot,
}

/// One upstream input of a derived node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    /// A persisted setting, by storage key.
    Setting(&'static str),
    /// The page location from the environment probe.
    Location,
    /// The OS color-scheme preference.
    ColorScheme,
    /// Another derived node.
    Node(NodeId),
}

impl NodeId {
    pub const ALL: [NodeId; 9] = [
        NodeId::EffectiveTheme,
        NodeId::ComposedServerAddress,
        NodeId::BaseUrl,
        NodeId::RpcWebSocketEndpoint,
        NodeId::RpcHttpEndpoint,
        NodeId::ServerSideCookies,
        NodeId::SessionCookiesFlag,
        NodeId::SavedTemplates,
        NodeId::SettingsSnapshot,
    ];

    /// Direct upstream inputs of this node.
    pub fn dependencies(self) -> &'static [Dependency] {
        use Dependency::{ColorScheme, Location, Node, Setting};
        match self {
            NodeId::EffectiveTheme => &[Setting("theme"), ColorScheme],
            NodeId::ComposedServerAddress => &[
                Setting("server-addr"),
                Setting("server-port"),
                Setting("reverseProxy"),
                Setting("reverseProxySubDir"),
            ],
            NodeId::BaseUrl | NodeId::RpcWebSocketEndpoint | NodeId::RpcHttpEndpoint => {
                &[Location, Node(NodeId::ComposedServerAddress)]
            }
            NodeId::ServerSideCookies | NodeId::SavedTemplates => &[Node(NodeId::BaseUrl)],
            NodeId::SessionCookiesFlag => &[Node(NodeId::ServerSideCookies)],
            // The snapshot reads every setting; any write affects it.
            NodeId::SettingsSnapshot => &[
                Node(NodeId::EffectiveTheme),
                Node(NodeId::BaseUrl),
                Node(NodeId::RpcWebSocketEndpoint),
                Node(NodeId::RpcHttpEndpoint),
            ],
        }
    }

    /// `true` for nodes that resolve over the network.
    pub fn is_async(self) -> bool {
        matches!(
            self,
            NodeId::ServerSideCookies | NodeId::SessionCookiesFlag | NodeId::SavedTemplates
        )
    }

    fn depends_directly_on(self, input: Dependency) -> bool {
        self.dependencies().contains(&input)
    }
}

/// Nodes affected, directly or transitively, by a change to `input`.
pub fn affected_by(input: Dependency) -> BTreeSet<NodeId> {
    let mut affected = BTreeSet::new();
    let mut frontier = vec![input];
    while let Some(dep) = frontier.pop() {
        for node in NodeId::ALL {
            if node.depends_directly_on(dep) && affected.insert(node) {
                frontier.push(Dependency::Node(node));
            }
        }
    }
    affected
}

/// Nodes affected by a write to the setting stored under `key`.
///
/// The snapshot node is included for every catalogued key, since it reads
/// all of them.
pub fn affected_by_key(key: &str, catalog_keys: &[&'static str]) -> BTreeSet<NodeId> {
    let Some(&key) = catalog_keys.iter().find(|k| **k == key) else {
        return BTreeSet::new();
    };
    let mut affected = affected_by(Dependency::Setting(key));
    affected.insert(NodeId::SettingsSnapshot);
    affected
}

// ── Async node state ─────────────────────────────────────────────────────────

/// Observable state of an async derived node.
#[derive(Debug, Clone, PartialEq)]
pub enum AsyncState<T> {
    /// A request is in flight (or none has been issued yet).
    Pending,
    /// The latest request succeeded.
    Resolved(T),
    /// The latest request failed; the reason is kept for diagnostics.
    Failed(String),
}

impl<T: Clone> AsyncState<T> {
    /// The resolved value, or `fallback` while pending or after a failure.
    pub fn value_or(&self, fallback: T) -> T {
        match self {
            AsyncState::Resolved(value) => value.clone(),
            AsyncState::Pending | AsyncState::Failed(_) => fallback,
        }
    }
}

/// Proof that a refresh was started; handed back on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// State holder for one async node.
///
/// The generation counter is only mutated inside the watch channel's
/// critical section, so "start a refresh" and "store a completion" are
/// totally ordered.
pub struct AsyncNode<T> {
    id: NodeId,
    generation: AtomicU64,
    state: watch::Sender<AsyncState<T>>,
}

impl<T: Clone> AsyncNode<T> {
    pub fn new(id: NodeId) -> Self {
        let (state, _) = watch::channel(AsyncState::Pending);
        Self {
            id,
            generation: AtomicU64::new(0),
            state,
        }
    }

    /// Current state.
    pub fn state(&self) -> AsyncState<T> {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<AsyncState<T>> {
        self.state.subscribe()
    }

    /// Marks the node pending and returns the ticket for the new request.
    pub fn begin(&self) -> Ticket {
        let mut ticket = Ticket(0);
        self.state.send_modify(|state| {
            ticket = Ticket(self.generation.fetch_add(1, Ordering::SeqCst) + 1);
            *state = AsyncState::Pending;
        });
        ticket
    }

    /// Stores the outcome of the request identified by `ticket`.
    ///
    /// Returns `false` (and leaves the state untouched) when a newer request
    /// was started in the meantime.
    pub fn complete(&self, ticket: Ticket, outcome: Result<T, ApiError>) -> bool {
        let id = self.id;
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != ticket.0 {
                debug!(node = ?id, ticket = ticket.0, "discarding superseded result");
                return false;
            }
            *state = match outcome {
                Ok(value) => AsyncState::Resolved(value),
                Err(e) => AsyncState::Failed(e.to_string()),
            };
            true
        })
    }
}

// ── Reactive settings runtime ────────────────────────────────────────────────

/// Owns the async nodes and keeps them in step with the store.
pub struct ReactiveSettings {
    remote: RemoteSettings,
    cookies: AsyncNode<String>,
    templates: AsyncNode<Vec<CustomTemplate>>,
}

impl ReactiveSettings {
    pub fn new(remote: RemoteSettings) -> Arc<Self> {
        Arc::new(Self {
            remote,
            cookies: AsyncNode::new(NodeId::ServerSideCookies),
            templates: AsyncNode::new(NodeId::SavedTemplates),
        })
    }

    pub fn context(&self) -> &Arc<SettingsContext> {
        self.remote.context()
    }

    pub fn cookies(&self) -> &AsyncNode<String> {
        &self.cookies
    }

    pub fn templates(&self) -> &AsyncNode<Vec<CustomTemplate>> {
        &self.templates
    }

    /// Session cookies flag derived from the cookies node's current state;
    /// `""` until the cookies node resolves with non-empty content.
    pub fn session_cookies_flag(&self) -> AsyncState<String> {
        match self.cookies.state() {
            AsyncState::Resolved(cookies) => AsyncState::Resolved(cookies_flag(&cookies).to_string()),
            AsyncState::Pending => AsyncState::Pending,
            AsyncState::Failed(reason) => AsyncState::Failed(reason),
        }
    }

    /// Re-fetches the server-side cookies.
    pub async fn refresh_cookies(&self) {
        let ticket = self.cookies.begin();
        let outcome = self.remote.try_server_side_cookies().await;
        if let Err(e) = &outcome {
            warn!(error = %e, "cookies refresh failed");
        }
        self.cookies.complete(ticket, outcome);
    }

    /// Re-fetches the saved templates.
    pub async fn refresh_templates(&self) {
        let ticket = self.templates.begin();
        let outcome = self.remote.try_saved_templates().await;
        if let Err(e) = &outcome {
            warn!(error = %e, "templates refresh failed");
        }
        self.templates.complete(ticket, outcome);
    }

    /// Refreshes the async nodes in `nodes`, each on its own task so a slow
    /// request never delays an independent one.  Synchronous nodes in the set
    /// are ignored; the cookies flag is refreshed through the cookies node.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime (`tokio::spawn`).
    pub fn spawn_refresh(self: &Arc<Self>, nodes: &BTreeSet<NodeId>) {
        let mut cookies = false;
        let mut templates = false;
        for node in nodes.iter().filter(|n| n.is_async()) {
            match node {
                NodeId::SavedTemplates => templates = true,
                _ => cookies = true,
            }
        }

        if cookies {
            let this = Arc::clone(self);
            tokio::spawn(async move { this.refresh_cookies().await });
        }
        if templates {
            let this = Arc::clone(self);
            tokio::spawn(async move { this.refresh_templates().await });
        }
    }

    /// Call after the page location changed (navigation): refreshes every
    /// node that reads the location.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime (`tokio::spawn`).
    pub fn location_changed(self: &Arc<Self>) {
        self.spawn_refresh(&affected_by(Dependency::Location));
    }

    /// Runs the refresh loop until `running` is cleared.
    ///
    /// Starts resolving every async node, then refreshes the affected ones on
    /// every store write.  Requests run on their own tasks, so a hung request
    /// never delays shutdown or the handling of later writes.  A lagged
    /// subscription (too many writes at once) refreshes everything.
    pub async fn run(self: Arc<Self>, running: Arc<AtomicBool>) {
        let mut changes = self.context().store().subscribe();
        let keys = self.context().catalog().keys();

        info!("reactive settings runtime started");
        self.spawn_refresh(&NodeId::ALL.into_iter().collect());

        while running.load(Ordering::Relaxed) {
            tokio::select! {
                change = changes.recv() => match change {
                    Ok(change) => {
                        let affected = affected_by_key(&change.key, &keys);
                        debug!(key = %change.key, ?affected, "setting changed");
                        self.spawn_refresh(&affected);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "change notifications lagged, refreshing all nodes");
                        self.spawn_refresh(&NodeId::ALL.into_iter().collect());
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                () = tokio::time::sleep(SHUTDOWN_POLL_INTERVAL) => {}
            }
        }

        info!("reactive settings runtime stopped");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::context::EnvironmentProbe;
    use crate::application::remote::{MockRemoteApi, RemoteApi};
    use crate::infrastructure::environment::StaticEnvironment;
    use crate::infrastructure::storage::MemoryStore;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use webui_settings_core::{Location, COOKIES_FLAG};

    /// API whose requests never finish in test time.
    struct HangingApi;

    #[async_trait]
    impl RemoteApi for HangingApi {
        async fn get_json(&self, _url: &str) -> Result<Value, ApiError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Value::Null)
        }
    }

    fn make_reactive(api: impl RemoteApi + 'static) -> Arc<ReactiveSettings> {
        let env = Arc::new(StaticEnvironment::new(
            Location::new("http:", "nas.local", "3033"),
            false,
        ));
        let ctx = Arc::new(SettingsContext::new(
            Arc::new(MemoryStore::new()),
            env as Arc<dyn EnvironmentProbe>,
        ));
        ReactiveSettings::new(RemoteSettings::new(ctx, Arc::new(api)))
    }

    // ── Dependency graph ──────────────────────────────────────────────────────

    #[test]
    fn test_server_port_affects_urls_and_async_nodes() {
        let affected = affected_by(Dependency::Setting("server-port"));
        for node in [
            NodeId::ComposedServerAddress,
            NodeId::BaseUrl,
            NodeId::RpcWebSocketEndpoint,
            NodeId::RpcHttpEndpoint,
            NodeId::ServerSideCookies,
            NodeId::SessionCookiesFlag,
            NodeId::SavedTemplates,
        ] {
            assert!(affected.contains(&node), "{node:?} must depend on server-port");
        }
        assert!(!affected.contains(&NodeId::EffectiveTheme));
    }

    #[test]
    fn test_theme_affects_no_async_node() {
        let affected = affected_by(Dependency::Setting("theme"));
        assert!(affected.contains(&NodeId::EffectiveTheme));
        assert!(affected.iter().all(|n| !n.is_async()));
    }

    #[test]
    fn test_color_scheme_only_affects_theme_and_snapshot() {
        let affected = affected_by(Dependency::ColorScheme);
        let expected: BTreeSet<_> = [NodeId::EffectiveTheme, NodeId::SettingsSnapshot].into();
        assert_eq!(affected, expected);
    }

    #[test]
    fn test_affected_by_key_includes_snapshot_for_plain_toggle() {
        let keys = ["listview"];
        let affected = affected_by_key("listview", &keys);
        let expected: BTreeSet<_> = [NodeId::SettingsSnapshot].into();
        assert_eq!(affected, expected);
    }

    #[test]
    fn test_affected_by_key_ignores_unknown_key() {
        assert!(affected_by_key("nope", &["listview"]).is_empty());
    }

    // ── AsyncNode ─────────────────────────────────────────────────────────────

    #[test]
    fn test_new_node_is_pending() {
        let node: AsyncNode<String> = AsyncNode::new(NodeId::ServerSideCookies);
        assert_eq!(node.state(), AsyncState::Pending);
    }

    #[test]
    fn test_complete_with_current_ticket_resolves() {
        let node = AsyncNode::new(NodeId::ServerSideCookies);
        let ticket = node.begin();
        assert!(node.complete(ticket, Ok("c".to_string())));
        assert_eq!(node.state(), AsyncState::Resolved("c".to_string()));
    }

    #[test]
    fn test_superseded_result_is_discarded() {
        // Arrange: two overlapping refreshes
        let node = AsyncNode::new(NodeId::SavedTemplates);
        let stale = node.begin();
        let fresh = node.begin();

        // Act: the fresh one finishes first, then the stale one
        assert!(node.complete(fresh, Ok(vec![1])));
        let accepted = node.complete(stale, Ok(vec![0]));

        // Assert
        assert!(!accepted);
        assert_eq!(node.state(), AsyncState::Resolved(vec![1]));
    }

    #[test]
    fn test_failure_is_recorded_and_falls_back() {
        let node: AsyncNode<String> = AsyncNode::new(NodeId::ServerSideCookies);
        let ticket = node.begin();
        node.complete(
            ticket,
            Err(ApiError::Request {
                url: "http://x".to_string(),
                message: "refused".to_string(),
            }),
        );
        assert!(matches!(node.state(), AsyncState::Failed(_)));
        assert_eq!(node.state().value_or(String::new()), "");
    }

    #[test]
    fn test_subscriber_observes_resolution() {
        let node = AsyncNode::new(NodeId::ServerSideCookies);
        let mut rx = node.subscribe();
        let ticket = node.begin();
        node.complete(ticket, Ok("c".to_string()));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), AsyncState::Resolved("c".to_string()));
    }

    // ── ReactiveSettings ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_refresh_resolves_both_nodes() {
        // Arrange
        let mut api = MockRemoteApi::new();
        api.expect_get_json().returning(|url| {
            if url.ends_with("/api/v1/cookies") {
                Ok(json!({ "cookies": "session" }))
            } else {
                Ok(json!([{ "id": "1", "name": "n", "content": "-x" }]))
            }
        });
        let reactive = make_reactive(api);

        // Act
        tokio::join!(reactive.refresh_cookies(), reactive.refresh_templates());

        // Assert
        assert_eq!(reactive.cookies().state(), AsyncState::Resolved("session".to_string()));
        assert_eq!(
            reactive.session_cookies_flag(),
            AsyncState::Resolved(COOKIES_FLAG.to_string())
        );
        match reactive.templates().state() {
            AsyncState::Resolved(list) => assert_eq!(list.len(), 1),
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_refresh_exposes_failed_state() {
        let mut api = MockRemoteApi::new();
        api.expect_get_json().returning(|url| {
            Err(ApiError::Request {
                url: url.to_string(),
                message: "refused".to_string(),
            })
        });
        let reactive = make_reactive(api);

        tokio::join!(reactive.refresh_cookies(), reactive.refresh_templates());

        assert!(matches!(reactive.cookies().state(), AsyncState::Failed(_)));
        assert!(matches!(reactive.session_cookies_flag(), AsyncState::Failed(_)));
        assert!(reactive.templates().state().value_or(Vec::new()).is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_promptly_while_first_requests_hang() {
        // Arrange
        let reactive = make_reactive(HangingApi);
        let running = Arc::new(AtomicBool::new(true));
        let handle = tokio::spawn(Arc::clone(&reactive).run(Arc::clone(&running)));
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Act
        running.store(false, Ordering::Relaxed);
        let stopped = tokio::time::timeout(Duration::from_secs(2), handle).await;

        // Assert
        assert!(stopped.is_ok(), "run must return after the shutdown flag is cleared");
        assert_eq!(reactive.cookies().state(), AsyncState::Pending);
    }

    #[tokio::test]
    async fn test_spawn_refresh_routes_flag_through_cookies_node() {
        // Arrange
        let mut api = MockRemoteApi::new();
        api.expect_get_json()
            .withf(|url: &str| url.ends_with("/api/v1/cookies"))
            .times(1)
            .returning(|_| Ok(json!({ "cookies": "session" })));
        let reactive = make_reactive(api);
        let mut rx = reactive.cookies().subscribe();

        // Act: only the derived flag and a synchronous node are requested
        reactive.spawn_refresh(&[NodeId::SessionCookiesFlag, NodeId::BaseUrl].into());
        while !matches!(*rx.borrow_and_update(), AsyncState::Resolved(_)) {
            rx.changed().await.unwrap();
        }

        // Assert
        assert_eq!(
            reactive.session_cookies_flag(),
            AsyncState::Resolved(COOKIES_FLAG.to_string())
        );
        assert_eq!(reactive.templates().state(), AsyncState::Pending);
    }

    #[test]
    fn test_value_or_uses_fallback_while_pending() {
        let state: AsyncState<Vec<u8>> = AsyncState::Pending;
        assert!(state.value_or(Vec::new()).is_empty());
    }
}
