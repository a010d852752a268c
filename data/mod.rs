/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Caching fetch layer over the analysis API.
//!
//! Every response is cached twice: in memory (moka, keyed by full URL) and
//! in the local store under `data-<url>`, so a revisited view renders from
//! cache without touching the network. The cache key is the canonical URL,
//! which works because the query codec is normalizing.
//!
//! The model also owns the bootstrap blob the host page embeds: dataset and
//! analysis listings, readable names and server constants, available
//! synchronously with zero network.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use log::warn;
use serde::Deserialize;
use serde_json::Value;

use crate::api::{self, ApiRequest};
use crate::events::Subscription;
use crate::selection::{Field, SelectionModel};
use crate::storage::{DATA_PREFIX, LocalStore, StoreError};

const MEMORY_CACHE_CAPACITY: u64 = 256;
const TOP3_SCHEME: &str = "Top3";

/// Errors surfaced by the fetch layer.
#[derive(Debug)]
pub enum DataError {
    /// The request never produced a payload.
    Transport(String),
    /// The server answered with an in-band `error` message.
    Server(String),
    /// The bootstrap blob or a cached payload failed to parse.
    Parse(String),
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::Transport(e) => write!(
                f,
                "Odds are you couldn't connect to your server. Here is some error info: {e}"
            ),
            DataError::Server(e) => write!(f, "{e}"),
            DataError::Parse(e) => write!(f, "Malformed data: {e}"),
        }
    }
}

/// Fetches one URL and parses the body as JSON. The production
/// implementation is [`HttpTransport`]; tests use [`StaticTransport`].
pub trait JsonTransport {
    fn fetch(&self, url: &str) -> Result<Value, DataError>;
}

/// Blocking HTTP transport.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| DataError::Transport(format!("{e}")))?;
        Ok(Self { client })
    }
}

impl JsonTransport for HttpTransport {
    fn fetch(&self, url: &str) -> Result<Value, DataError> {
        let parsed = url::Url::parse(url).map_err(|e| DataError::Transport(format!("{e}")))?;
        let response = self
            .client
            .get(parsed)
            .send()
            .map_err(|e| DataError::Transport(format!("{e}")))?
            .error_for_status()
            .map_err(|e| DataError::Transport(format!("{e}")))?;
        response
            .json::<Value>()
            .map_err(|e| DataError::Transport(format!("{e}")))
    }
}

/// Canned URL-to-payload transport. Unknown URLs fail the way an
/// unreachable server would; fetch counts are tracked so tests can assert
/// cache hits never touch the transport.
pub struct StaticTransport {
    responses: RefCell<BTreeMap<String, Value>>,
    fetches: RefCell<Vec<String>>,
}

impl StaticTransport {
    pub fn new() -> Self {
        Self {
            responses: RefCell::new(BTreeMap::new()),
            fetches: RefCell::new(Vec::new()),
        }
    }

    pub fn insert(&self, url: impl Into<String>, payload: Value) {
        self.responses.borrow_mut().insert(url.into(), payload);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.borrow().len()
    }

    pub fn fetched_urls(&self) -> Vec<String> {
        self.fetches.borrow().clone()
    }
}

impl Default for StaticTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonTransport for StaticTransport {
    fn fetch(&self, url: &str) -> Result<Value, DataError> {
        self.fetches.borrow_mut().push(url.to_string());
        self.responses
            .borrow()
            .get(url)
            .cloned()
            .ok_or_else(|| DataError::Transport(format!("connection refused: {url}")))
    }
}

/// On a fetch, how the caches are consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Memory, then local store, then the network.
    #[default]
    CacheFirst,
    /// Straight to the network; both caches are overwritten on success.
    Refresh,
}

/// Server constants embedded in the host page.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerInfo {
    pub api_path: String,
    #[serde(default = "default_max_documents")]
    pub max_documents_per_request: u64,
}

fn default_max_documents() -> u64 {
    500
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisInfo {
    #[serde(default)]
    pub readable_name: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    #[serde(default)]
    pub metrics: BTreeMap<String, Value>,
    #[serde(default)]
    pub topic_name_schemes: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetInfo {
    #[serde(default)]
    pub readable_name: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    #[serde(default)]
    pub metrics: BTreeMap<String, Value>,
    #[serde(default)]
    pub analyses: BTreeMap<String, AnalysisInfo>,
}

/// The page-embedded listing of everything browsable, parsed once at
/// startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Bootstrap {
    pub server: ServerInfo,
    #[serde(default)]
    pub datasets: BTreeMap<String, DatasetInfo>,
}

impl Bootstrap {
    pub fn from_json(blob: &str) -> Result<Self, DataError> {
        serde_json::from_str(blob).map_err(|e| DataError::Parse(format!("{e}")))
    }
}

/// Topic display names for the current analysis, keyed by scheme then by
/// topic number.
type TopicNames = BTreeMap<String, BTreeMap<String, String>>;

/// The shared fetch-and-cache model.
pub struct DataModel {
    transport: Box<dyn JsonTransport>,
    store: Rc<dyn LocalStore>,
    memory: moka::sync::Cache<String, Arc<Value>>,
    bootstrap: Bootstrap,
    selection: Rc<SelectionModel>,
    topic_names: RefCell<TopicNames>,
    // Held so the preload listener lives as long as the model.
    _selection_sub: RefCell<Option<Subscription>>,
}

impl DataModel {
    pub fn new(
        transport: Box<dyn JsonTransport>,
        store: Rc<dyn LocalStore>,
        selection: Rc<SelectionModel>,
        bootstrap: Bootstrap,
    ) -> Rc<Self> {
        let model = Rc::new(Self {
            transport,
            store,
            memory: moka::sync::Cache::new(MEMORY_CACHE_CAPACITY),
            bootstrap,
            selection: selection.clone(),
            topic_names: RefCell::new(TopicNames::new()),
            _selection_sub: RefCell::new(None),
        });

        // Preload topic names whenever the analysis changes so name lookups
        // stay synchronous for views.
        let weak: Weak<DataModel> = Rc::downgrade(&model);
        let sub = selection.on_change(move |change| {
            let Some(model) = weak.upgrade() else {
                return;
            };
            if change.changed.contains(&Field::Analysis)
                || change.changed.contains(&Field::Dataset)
            {
                model.reload_topic_names();
            }
        });
        *model._selection_sub.borrow_mut() = Some(sub);

        model
    }

    pub fn server(&self) -> &ServerInfo {
        &self.bootstrap.server
    }

    // --- fetch ---------------------------------------------------------

    /// Build the request URL and fetch it. Callbacks run synchronously
    /// before this returns; exactly one of them is invoked.
    pub fn submit_query(
        &self,
        request: &ApiRequest,
        policy: CachePolicy,
        on_success: impl FnOnce(Arc<Value>),
        on_error: impl FnOnce(&str),
    ) {
        self.fetch_by_url(&self.url_for(request), policy, on_success, on_error);
    }

    pub fn fetch_by_url(
        &self,
        url: &str,
        policy: CachePolicy,
        on_success: impl FnOnce(Arc<Value>),
        on_error: impl FnOnce(&str),
    ) {
        match self.fetch_by_url_sync(url, policy) {
            Ok(data) => on_success(data),
            Err(e) => on_error(&e.to_string()),
        }
    }

    /// Blocking fetch for bootstrap-sized queries.
    pub fn query_sync(
        &self,
        request: &ApiRequest,
        policy: CachePolicy,
    ) -> Result<Arc<Value>, DataError> {
        self.fetch_by_url_sync(&self.url_for(request), policy)
    }

    pub fn fetch_by_url_sync(
        &self,
        url: &str,
        policy: CachePolicy,
    ) -> Result<Arc<Value>, DataError> {
        if policy == CachePolicy::CacheFirst {
            if let Some(hit) = self.memory.get(url) {
                return Ok(hit);
            }
            if let Some(raw) = self.store.get(&Self::persist_key(url)) {
                match serde_json::from_str::<Value>(&raw) {
                    Ok(parsed) => {
                        let parsed = Arc::new(parsed);
                        self.memory.insert(url.to_string(), parsed.clone());
                        return Ok(parsed);
                    },
                    Err(e) => {
                        // A corrupt cached entry degrades to a refetch.
                        warn!("Dropping unparsable cached response for {url}: {e}");
                        self.store.remove(&Self::persist_key(url));
                    },
                }
            }
        }

        let payload = self.transport.fetch(url)?;
        if let Some(message) = api::error_message(&payload) {
            return Err(DataError::Server(message.to_string()));
        }

        let serialized = payload.to_string();
        let payload = Arc::new(payload);
        self.memory.insert(url.to_string(), payload.clone());
        self.persist(url, &serialized);
        Ok(payload)
    }

    /// Full request URL for a query against the bootstrap-configured API
    /// endpoint.
    pub fn url_for(&self, request: &ApiRequest) -> String {
        format!("{}?{}", self.bootstrap.server.api_path, request.to_query())
    }

    fn persist_key(url: &str) -> String {
        format!("{DATA_PREFIX}{url}")
    }

    /// Write-through persist with one eviction-and-retry on quota. A second
    /// failure leaves the entry memory-only.
    fn persist(&self, url: &str, serialized: &str) {
        let key = Self::persist_key(url);
        match self.store.put(&key, serialized) {
            Ok(()) => {},
            Err(StoreError::Quota) => {
                self.store.clear_prefix(DATA_PREFIX);
                if self.store.put(&key, serialized).is_err() {
                    warn!("Response for {url} does not fit in local storage; keeping it in memory only");
                }
            },
            Err(StoreError::Backend(e)) => {
                warn!("Failed to persist response for {url}: {e}");
            },
        }
    }

    /// Drop every persisted response. The in-memory cache is untouched.
    pub fn clear_persisted(&self) {
        self.store.clear_prefix(DATA_PREFIX);
    }

    // --- bootstrap accessors -------------------------------------------

    pub fn dataset_names(&self) -> Vec<String> {
        self.bootstrap.datasets.keys().cloned().collect()
    }

    pub fn analysis_names(&self, dataset: &str) -> Vec<String> {
        self.bootstrap
            .datasets
            .get(dataset)
            .map(|info| info.analyses.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn topic_name_schemes(&self, dataset: &str, analysis: &str) -> Vec<String> {
        self.bootstrap
            .datasets
            .get(dataset)
            .and_then(|info| info.analyses.get(analysis))
            .map(|info| info.topic_name_schemes.clone())
            .unwrap_or_default()
    }

    pub fn dataset_readable_name(&self, dataset: &str) -> String {
        self.bootstrap
            .datasets
            .get(dataset)
            .and_then(|info| info.readable_name.clone())
            .unwrap_or_else(|| dataset.to_string())
    }

    pub fn analysis_readable_name(&self, dataset: &str, analysis: &str) -> String {
        self.bootstrap
            .datasets
            .get(dataset)
            .and_then(|info| info.analyses.get(analysis))
            .and_then(|info| info.readable_name.clone())
            .unwrap_or_else(|| analysis.to_string())
    }

    /// The dataset's `Document Count` metric, when the bootstrap carries
    /// one.
    pub fn dataset_document_count(&self, dataset: &str) -> Option<u64> {
        self.bootstrap
            .datasets
            .get(dataset)?
            .metrics
            .get("Document Count")?
            .as_u64()
    }

    // --- topic names ---------------------------------------------------

    fn reload_topic_names(&self) {
        self.topic_names.borrow_mut().clear();
        if !self.selection.is_non_empty(&[Field::Dataset, Field::Analysis]) {
            return;
        }
        let selection = self.selection.snapshot();
        let request = ApiRequest::for_selection(&selection)
            .topics("*")
            .topic_attr(&["names"]);
        let data = match self.query_sync(&request, CachePolicy::CacheFirst) {
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to preload topic names: {e}");
                return;
            },
        };
        let Some(topics) = api::extract_topics(&data, &selection).and_then(Value::as_object)
        else {
            return;
        };

        let mut names = TopicNames::new();
        for (number, topic) in topics {
            let Some(schemes) = topic.get("names").and_then(Value::as_object) else {
                continue;
            };
            for (scheme, name) in schemes {
                let Some(name) = name.as_str() else {
                    continue;
                };
                names
                    .entry(scheme.clone())
                    .or_default()
                    .insert(number.clone(), name.to_string());
            }
        }
        *self.topic_names.borrow_mut() = names;
    }

    /// Display name for a topic under the selected naming scheme, falling
    /// back to the `Top3` scheme and finally to the bare number. Never
    /// errors; an unknown topic just reads as its number.
    pub fn topic_name(&self, number: u64) -> String {
        let number = number.to_string();
        let names = self.topic_names.borrow();
        let scheme = self.selection.get(Field::TopicNameScheme);
        if !scheme.is_empty()
            && let Some(name) = names.get(&scheme).and_then(|map| map.get(&number))
        {
            return name.clone();
        }
        if let Some(name) = names.get(TOP3_SCHEME).and_then(|map| map.get(&number)) {
            return name.clone();
        }
        number
    }

    /// `"<name> (#<n>)"`, or `"Topic #<n>"` when only the number is known.
    pub fn topic_label(&self, number: u64) -> String {
        let name = self.topic_name(number);
        if name == number.to_string() {
            format!("Topic #{number}")
        } else {
            format!("{name} (#{number})")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Bootstrap, CachePolicy, DataError, DataModel, JsonTransport, StaticTransport};
    use crate::api::ApiRequest;
    use crate::selection::{Field, SelectionModel};
    use crate::storage::{LocalStore, MemoryStore};
    use serde_json::{Value, json};
    use std::rc::Rc;

    fn bootstrap() -> Bootstrap {
        Bootstrap::from_json(
            r#"{
                "server": {"api_path": "/api", "max_documents_per_request": 100},
                "datasets": {
                    "corpus1": {
                        "readable_name": "State of the Union",
                        "metrics": {"Document Count": 224},
                        "analyses": {
                            "lda10": {
                                "readable_name": "LDA 10 topics",
                                "topic_name_schemes": ["Top3", "TopBigram"]
                            }
                        }
                    },
                    "corpus2": {"analyses": {"hlda": {}}}
                }
            }"#,
        )
        .unwrap()
    }

    struct Fixture {
        transport: Rc<StaticTransport>,
        store: Rc<MemoryStore>,
        selection: Rc<SelectionModel>,
        model: Rc<DataModel>,
    }

    // StaticTransport is shared between the fixture and the model, so
    // tests can seed responses and count fetches after construction.
    struct SharedTransport(Rc<StaticTransport>);

    impl JsonTransport for SharedTransport {
        fn fetch(&self, url: &str) -> Result<Value, DataError> {
            self.0.fetch(url)
        }
    }

    fn fixture() -> Fixture {
        fixture_with_store(Rc::new(MemoryStore::new()))
    }

    fn fixture_with_store(store: Rc<MemoryStore>) -> Fixture {
        let transport = Rc::new(StaticTransport::new());
        let selection = SelectionModel::new();
        let model = DataModel::new(
            Box::new(SharedTransport(transport.clone())),
            store.clone(),
            selection.clone(),
            bootstrap(),
        );
        Fixture {
            transport,
            store,
            selection,
            model,
        }
    }

    #[test]
    fn identical_queries_hit_the_network_once() {
        let f = fixture();
        let request = ApiRequest::new().datasets("corpus1").dataset_attr(&["metrics"]);
        let url = f.model.url_for(&request);
        f.transport.insert(url, json!({"datasets": {"corpus1": {}}}));

        f.model.query_sync(&request, CachePolicy::CacheFirst).unwrap();
        f.model.query_sync(&request, CachePolicy::CacheFirst).unwrap();

        assert_eq!(f.transport.fetch_count(), 1);
    }

    #[test]
    fn persisted_responses_survive_a_fresh_model() {
        let store = Rc::new(MemoryStore::new());
        let request = ApiRequest::new().datasets("corpus1");

        {
            let f = fixture_with_store(store.clone());
            let url = f.model.url_for(&request);
            f.transport.insert(url, json!({"datasets": {"corpus1": {}}}));
            f.model.query_sync(&request, CachePolicy::CacheFirst).unwrap();
        }

        // New model, same store, no transport response seeded.
        let f = fixture_with_store(store);
        let data = f.model.query_sync(&request, CachePolicy::CacheFirst).unwrap();
        assert!(data.get("datasets").is_some());
        assert_eq!(f.transport.fetch_count(), 0);
    }

    #[test]
    fn refresh_policy_bypasses_both_caches() {
        let f = fixture();
        let request = ApiRequest::new().datasets("corpus1");
        let url = f.model.url_for(&request);
        f.transport.insert(url.clone(), json!({"version": 1}));
        f.model.query_sync(&request, CachePolicy::CacheFirst).unwrap();

        f.transport.insert(url, json!({"version": 2}));
        let refreshed = f.model.query_sync(&request, CachePolicy::Refresh).unwrap();
        assert_eq!(refreshed.get("version").and_then(Value::as_u64), Some(2));

        // The refreshed payload replaces the cached one.
        let cached = f.model.query_sync(&request, CachePolicy::CacheFirst).unwrap();
        assert_eq!(cached.get("version").and_then(Value::as_u64), Some(2));
    }

    #[test]
    fn transport_failure_reaches_the_error_callback() {
        let f = fixture();
        let request = ApiRequest::new().datasets("nowhere");
        let mut message = None;
        f.model.submit_query(
            &request,
            CachePolicy::CacheFirst,
            |_| panic!("unexpected success"),
            |e| message = Some(e.to_string()),
        );
        let message = message.unwrap();
        assert!(message.contains("couldn't connect to your server"), "{message}");
    }

    #[test]
    fn in_band_server_error_is_not_cached() {
        let f = fixture();
        let request = ApiRequest::new().datasets("corpus1");
        let url = f.model.url_for(&request);
        f.transport.insert(url.clone(), json!({"error": "No dataset with that name"}));

        let mut message = None;
        f.model.submit_query(
            &request,
            CachePolicy::CacheFirst,
            |_| panic!("unexpected success"),
            |e| message = Some(e.to_string()),
        );
        assert_eq!(message.as_deref(), Some("No dataset with that name"));

        // The failed response must not poison the caches.
        f.transport.insert(url, json!({"datasets": {}}));
        f.model.query_sync(&request, CachePolicy::CacheFirst).unwrap();
        assert_eq!(f.transport.fetch_count(), 2);
    }

    #[test]
    fn quota_exhaustion_evicts_data_entries_and_retries() {
        // Budget fits one response plus its key but not two.
        let store = Rc::new(MemoryStore::with_byte_budget(120));
        store.put("favs-datasets", "[\"corpus1\"]").unwrap();
        let f = fixture_with_store(store);

        let first = ApiRequest::new().datasets("corpus1");
        let second = ApiRequest::new().datasets("corpus2");
        f.transport.insert(
            f.model.url_for(&first),
            json!({"datasets": {"corpus1": {"analyses": {}}}}),
        );
        f.transport.insert(
            f.model.url_for(&second),
            json!({"datasets": {"corpus2": {"analyses": {}}}}),
        );

        f.model.query_sync(&first, CachePolicy::CacheFirst).unwrap();
        f.model.query_sync(&second, CachePolicy::CacheFirst).unwrap();

        // The first entry was evicted to make room; other namespaces
        // survive the sweep.
        assert_eq!(f.store.keys_with_prefix("data-").len(), 1);
        assert_eq!(f.store.get("favs-datasets").as_deref(), Some("[\"corpus1\"]"));
    }

    #[test]
    fn corrupt_persisted_entry_degrades_to_refetch() {
        let f = fixture();
        let request = ApiRequest::new().datasets("corpus1");
        let url = f.model.url_for(&request);
        f.store.put(&format!("data-{url}"), "{not json").unwrap();
        f.transport.insert(url, json!({"datasets": {}}));

        let data = f.model.query_sync(&request, CachePolicy::CacheFirst).unwrap();
        assert!(data.get("datasets").is_some());
        assert_eq!(f.transport.fetch_count(), 1);
    }

    #[test]
    fn bootstrap_accessors_list_datasets_and_analyses() {
        let f = fixture();
        assert_eq!(f.model.dataset_names(), vec!["corpus1", "corpus2"]);
        assert_eq!(f.model.analysis_names("corpus1"), vec!["lda10"]);
        assert!(f.model.analysis_names("missing").is_empty());
        assert_eq!(
            f.model.topic_name_schemes("corpus1", "lda10"),
            vec!["Top3", "TopBigram"]
        );
        assert_eq!(f.model.dataset_document_count("corpus1"), Some(224));
        assert_eq!(f.model.dataset_document_count("corpus2"), None);
    }

    #[test]
    fn readable_names_fall_back_to_identifiers() {
        let f = fixture();
        assert_eq!(f.model.dataset_readable_name("corpus1"), "State of the Union");
        assert_eq!(f.model.dataset_readable_name("corpus2"), "corpus2");
        assert_eq!(
            f.model.analysis_readable_name("corpus1", "lda10"),
            "LDA 10 topics"
        );
        assert_eq!(f.model.analysis_readable_name("corpus2", "hlda"), "hlda");
    }

    fn seed_topic_names(f: &Fixture) {
        let request = ApiRequest::new()
            .datasets("corpus1")
            .analyses("lda10")
            .topics("*")
            .topic_attr(&["names"]);
        f.transport.insert(
            f.model.url_for(&request),
            json!({
                "datasets": {"corpus1": {"analyses": {"lda10": {"topics": {
                    "0": {"names": {"Top3": "army war peace", "TopBigram": "war effort"}},
                    "1": {"names": {"Top3": "tax budget revenue"}}
                }}}}}
            }),
        );
    }

    #[test]
    fn analysis_change_preloads_topic_names() {
        let f = fixture();
        seed_topic_names(&f);

        f.selection.update(&[
            (Field::Dataset, "corpus1".to_string()),
            (Field::Analysis, "lda10".to_string()),
        ]);

        assert_eq!(f.model.topic_name(0), "army war peace");
        assert_eq!(f.model.topic_label(1), "tax budget revenue (#1)");
    }

    #[test]
    fn topic_name_prefers_selected_scheme_then_top3_then_number() {
        let f = fixture();
        seed_topic_names(&f);
        f.selection.update(&[
            (Field::Dataset, "corpus1".to_string()),
            (Field::Analysis, "lda10".to_string()),
        ]);

        f.selection
            .update(&[(Field::TopicNameScheme, "TopBigram".to_string())]);
        assert_eq!(f.model.topic_name(0), "war effort");
        // Scheme missing this topic: fall back to Top3.
        assert_eq!(f.model.topic_name(1), "tax budget revenue");
        // Unknown topic: the bare number.
        assert_eq!(f.model.topic_name(9), "9");
        assert_eq!(f.model.topic_label(9), "Topic #9");
    }

    #[test]
    fn unreachable_preload_leaves_names_empty_without_failing() {
        let f = fixture();
        // No transport response seeded for the preload query.
        f.selection.update(&[
            (Field::Dataset, "corpus1".to_string()),
            (Field::Analysis, "lda10".to_string()),
        ]);
        assert_eq!(f.model.topic_name(0), "0");
    }

    #[test]
    fn clear_persisted_drops_only_data_entries() {
        let f = fixture();
        let request = ApiRequest::new().datasets("corpus1");
        f.transport
            .insert(f.model.url_for(&request), json!({"datasets": {}}));
        f.model.query_sync(&request, CachePolicy::CacheFirst).unwrap();
        f.store.put("favs-datasets", "[]").unwrap();

        f.model.clear_persisted();
        assert!(f.store.keys_with_prefix("data-").is_empty());
        assert!(f.store.get("favs-datasets").is_some());
    }
}
