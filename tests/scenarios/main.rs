/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! End-to-end scenarios: a wired [`App`] driven purely through address-bar
//! fragments, the way a host embedding the crate would drive it.

use std::rc::Rc;

use serde_json::{Value, json};
use topical_guide::api::ApiRequest;
use topical_guide::app::App;
use topical_guide::data::{Bootstrap, CachePolicy, DataError, JsonTransport, StaticTransport};
use topical_guide::router::RecordingAddressBar;
use topical_guide::selection::Field;
use topical_guide::storage::MemoryStore;
use topical_guide::views::{View, ViewContext, ViewError, ViewFactory};

/// Lets the test keep a handle on the transport the model owns.
struct SharedTransport(Rc<StaticTransport>);

impl JsonTransport for SharedTransport {
    fn fetch(&self, url: &str) -> Result<Value, DataError> {
        self.0.fetch(url)
    }
}

/// A topic listing view close to what the real browser ships: it queries
/// the analysis API for every topic's names and writes one labelled line
/// per topic.
struct TopicListView {
    context: ViewContext,
}

impl View for TopicListView {
    fn display_name(&self) -> &str {
        "Topics"
    }

    fn render(&mut self) -> Result<(), ViewError> {
        let data = &self.context.app.data;
        let selection = self.context.app.selection.snapshot();
        let request = ApiRequest::for_selection(&selection)
            .topics("*")
            .topic_attr(&["names"]);
        let response = data
            .query_sync(&request, CachePolicy::CacheFirst)
            .map_err(|e| ViewError::Render(e.to_string()))?;

        let mut lines = Vec::new();
        if let Some(topics) =
            topical_guide::api::extract_topics(&response, &selection).and_then(Value::as_object)
        {
            for number in topics.keys() {
                if let Ok(number) = number.parse::<u64>() {
                    lines.push(data.topic_label(number));
                }
            }
        }
        self.context.output.set(lines.join("\n"));
        Ok(())
    }
}

struct Harness {
    app: App,
    transport: Rc<StaticTransport>,
    address: Rc<RecordingAddressBar>,
}

fn harness() -> Harness {
    let transport = Rc::new(StaticTransport::new());
    transport.insert(
        "/api?analyses=lda10&datasets=corpus1&topic_attr=names&topics=*",
        json!({
            "datasets": {"corpus1": {"analyses": {"lda10": {"topics": {
                "0": {"names": {"Top3": "army war peace"}},
                "1": {"names": {"Top3": "tax budget revenue"}}
            }}}}}
        }),
    );

    let bootstrap = Bootstrap::from_json(
        r#"{
            "server": {"api_path": "/api"},
            "datasets": {
                "corpus1": {
                    "readable_name": "State of the Union Addresses",
                    "analyses": {"lda10": {"readable_name": "LDA 10 topics"}}
                }
            }
        }"#,
    )
    .unwrap();

    let address = Rc::new(RecordingAddressBar::new());
    let app = App::new(
        Box::new(SharedTransport(transport.clone())),
        Rc::new(MemoryStore::new()),
        bootstrap,
        address.clone(),
    );
    app.registry
        .add_view(&[], ViewFactory::new("Topics", |context| {
            Box::new(TopicListView { context })
        }));
    Harness {
        app,
        transport,
        address,
    }
}

#[test]
fn routing_a_fragment_mounts_the_view_and_applies_its_selection() {
    let h = harness();
    h.address.set_fragment("topics?analysis=lda10&dataset=corpus1");
    h.app.start();

    let registry = &h.app.registry;
    assert_eq!(registry.current_path(), "topics");
    assert_eq!(registry.page_title(), "Topical Guide — Topics");
    assert_eq!(h.app.context.selection.get(Field::Dataset), "corpus1");
    assert_eq!(h.app.context.selection.get(Field::Analysis), "lda10");

    let output = registry.current_output().unwrap();
    assert!(output.contains("army war peace (#0)"));
    assert!(output.contains("tax budget revenue (#1)"));
}

#[test]
fn a_bare_path_is_normalized_to_carry_the_selection() {
    let h = harness();
    h.app.context.select_default_dataset();
    h.address.set_fragment("topics");
    h.app.start();

    let last = h.address.history().pop().unwrap();
    assert_eq!(last.fragment, "topics?analysis=lda10&dataset=corpus1");
    assert!(last.replaced);
}

#[test]
fn selection_changes_append_a_history_entry() {
    let h = harness();
    h.address.set_fragment("topics?analysis=lda10&dataset=corpus1");
    h.app.start();
    let before = h.address.history().len();

    h.app
        .context
        .selection
        .update(&[(Field::Topic, "1".to_string())]);

    let history = h.address.history();
    assert_eq!(history.len(), before + 1);
    let last = history.last().unwrap();
    assert_eq!(
        last.fragment,
        "topics?analysis=lda10&dataset=corpus1&topic=1"
    );
    assert!(!last.replaced);
}

#[test]
fn settings_changes_carry_the_payload_into_the_fragment() {
    let h = harness();
    h.address.set_fragment("topics?analysis=lda10&dataset=corpus1");
    h.app.start();

    let settings = h.app.registry.current_settings().unwrap();
    settings.set("sort_by", json!("name"));

    let last = h.address.history().pop().unwrap();
    assert!(!last.replaced);
    assert!(last.fragment.contains("settings=%7B%22sort_by%22%3A%22name%22%7D"));
}

#[test]
fn revisiting_a_view_renders_from_cache_without_refetching() {
    let h = harness();
    h.address.set_fragment("topics?analysis=lda10&dataset=corpus1");
    h.app.start();
    let fetched = h.transport.fetch_count();
    assert!(fetched > 0);

    h.app.router.handle_fragment("elsewhere");
    h.app
        .router
        .handle_fragment("topics?analysis=lda10&dataset=corpus1");

    assert_eq!(h.app.registry.current_path(), "topics");
    assert!(h.app.registry.current_output().unwrap().contains("army war peace"));
    assert_eq!(h.transport.fetch_count(), fetched);
}

#[test]
fn view_settings_survive_navigating_away_and_back() {
    let h = harness();
    h.address.set_fragment("topics?analysis=lda10&dataset=corpus1");
    h.app.start();
    h.app
        .registry
        .current_settings()
        .unwrap()
        .set("sort_by", json!("name"));

    h.app.router.handle_fragment("elsewhere");
    h.app
        .router
        .handle_fragment("topics?analysis=lda10&dataset=corpus1");

    let settings = h.app.registry.current_settings().unwrap();
    assert_eq!(settings.get_str("sort_by").as_deref(), Some("name"));
}

#[test]
fn unknown_paths_fall_back_to_the_default_view() {
    let h = harness();
    h.address.set_fragment("nowhere/special");
    h.app.start();

    let output = h.app.registry.current_output().unwrap();
    assert!(output.contains("Welcome to the Default Page"));
    assert_eq!(h.app.registry.page_title(), "Topical Guide — Default Page");
}

#[test]
fn url_settings_are_applied_before_the_first_render() {
    let h = harness();
    h.address.set_fragment(
        "topics?analysis=lda10&dataset=corpus1&settings=%7B%22sort_by%22%3A%22name%22%7D",
    );
    h.app.start();

    let settings = h.app.registry.current_settings().unwrap();
    assert_eq!(settings.get_str("sort_by").as_deref(), Some("name"));
}
