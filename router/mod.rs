/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Fragment routing: the URL is the authority on application state.
//!
//! An incoming fragment `<path>?<query>` drives one `change_view`; the
//! query's selection fields and its optional JSON `settings` payload ride
//! along. In the other direction the router regenerates the canonical
//! fragment whenever the selection or the current view's settings change,
//! so the address bar always holds a shareable URL. Rewrites append a
//! history entry; only the initial bare-path normalization replaces one.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use log::warn;
use serde_json::{Map, Value};

use crate::app::AppContext;
use crate::events::Subscription;
use crate::query::{self, QueryMap, QueryValue};
use crate::selection::Field;
use crate::views::{NavigationRequest, ViewRegistry};

/// The host's address bar. Fragments are exchanged without the leading
/// `#`. `replace` navigation rewrites the current history entry instead of
/// appending one.
pub trait AddressBar {
    fn fragment(&self) -> String;
    fn navigate(&self, fragment: &str, replace: bool);
}

/// One recorded navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationRecord {
    pub fragment: String,
    pub replaced: bool,
}

/// In-memory address bar. Hosts without a real one can use it directly;
/// tests assert on its history.
#[derive(Default)]
pub struct RecordingAddressBar {
    fragment: RefCell<String>,
    history: RefCell<Vec<NavigationRecord>>,
}

impl RecordingAddressBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fragment(&self, fragment: &str) {
        *self.fragment.borrow_mut() = fragment.to_string();
    }

    pub fn history(&self) -> Vec<NavigationRecord> {
        self.history.borrow().clone()
    }
}

impl AddressBar for RecordingAddressBar {
    fn fragment(&self) -> String {
        self.fragment.borrow().clone()
    }

    fn navigate(&self, fragment: &str, replace: bool) {
        *self.fragment.borrow_mut() = fragment.to_string();
        self.history.borrow_mut().push(NavigationRecord {
            fragment: fragment.to_string(),
            replaced: replace,
        });
    }
}

pub struct Router {
    registry: Rc<ViewRegistry>,
    app: Rc<AppContext>,
    address: Rc<dyn AddressBar>,
    self_weak: Weak<Router>,
    /// Canonical query last written to or derived from the address bar;
    /// rewrites that regenerate the same query are dropped.
    current_query: RefCell<String>,
    /// Subscriptions to the mounted view's era, rebuilt on `view_changed`.
    view_subs: RefCell<Vec<Subscription>>,
    /// Set while a fragment is being applied, so the resulting model
    /// changes do not echo back into the address bar mid-navigation.
    handling: Cell<bool>,
    _view_changed_sub: RefCell<Option<Subscription>>,
}

impl Router {
    pub fn new(
        registry: Rc<ViewRegistry>,
        app: Rc<AppContext>,
        address: Rc<dyn AddressBar>,
    ) -> Rc<Self> {
        let router = Rc::new_cyclic(|weak: &Weak<Router>| Self {
            registry: registry.clone(),
            app,
            address,
            self_weak: weak.clone(),
            current_query: RefCell::new(String::new()),
            view_subs: RefCell::new(Vec::new()),
            handling: Cell::new(false),
            _view_changed_sub: RefCell::new(None),
        });

        let weak = Rc::downgrade(&router);
        let sub = registry.on_view_changed(move |_| {
            if let Some(router) = weak.upgrade() {
                router.rebind();
            }
        });
        *router._view_changed_sub.borrow_mut() = Some(sub);

        router
    }

    /// Route whatever fragment the address bar currently holds.
    pub fn handle_current_fragment(&self) {
        self.handle_fragment(&self.address.fragment());
    }

    /// Apply one fragment: mount the view it names and apply its query.
    /// Hosts call this on every external fragment change.
    pub fn handle_fragment(&self, fragment: &str) {
        self.handling.set(true);

        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        let (path, raw_query) = match fragment.split_once('?') {
            Some((path, query)) => (path, query),
            None => (fragment, ""),
        };

        let mut params = query::decode(raw_query);
        let mut settings = Map::new();
        if let Some(raw) = params.remove("settings")
            && !raw.is_empty()
        {
            match serde_json::from_str::<Map<String, Value>>(&raw) {
                Ok(parsed) => settings = parsed,
                Err(e) => warn!("Ignoring unparsable settings in URL: {e}"),
            }
        }
        let selection = params
            .into_iter()
            .filter_map(|(key, value)| Field::from_key(&key).map(|field| (field, value)))
            .collect();

        self.registry.change_view(
            path,
            NavigationRequest {
                selection,
                settings,
            },
        );

        // A bare path gets its canonical query written back so the URL is
        // shareable from the first page load.
        let generated = self.generate_query();
        if raw_query.is_empty() {
            self.address.navigate(&self.fragment_for(&generated), true);
        }
        *self.current_query.borrow_mut() = generated;

        self.handling.set(false);
    }

    /// The canonical query for the current selection and view settings.
    fn generate_query(&self) -> String {
        let mut map = QueryMap::new();
        for (key, value) in self.app.selection.subset(&Field::ALL) {
            map.insert(key.to_string(), QueryValue::Text(value));
        }
        if let Some(settings) = self.registry.current_settings() {
            let json = settings.to_json();
            if json.as_object().is_some_and(|object| !object.is_empty()) {
                map.insert(
                    "settings".to_string(),
                    QueryValue::Text(json.to_string()),
                );
            }
        }
        query::encode(&map)
    }

    fn fragment_for(&self, generated_query: &str) -> String {
        let path = self.registry.current_path();
        if generated_query.is_empty() {
            path
        } else {
            format!("{path}?{generated_query}")
        }
    }

    fn rewrite_url(&self, replace: bool) {
        if self.handling.get() {
            return;
        }
        let generated = self.generate_query();
        if generated == *self.current_query.borrow() {
            return;
        }
        self.address.navigate(&self.fragment_for(&generated), replace);
        *self.current_query.borrow_mut() = generated;
    }

    /// Drop the previous view's subscriptions and follow the new one.
    fn rebind(&self) {
        let mut subs = self.view_subs.borrow_mut();
        subs.clear();

        let weak = self.self_weak.clone();
        subs.push(self.app.selection.on_change(move |_| {
            if let Some(router) = weak.upgrade() {
                router.rewrite_url(false);
            }
        }));

        if let Some(settings) = self.registry.current_settings() {
            let weak = self.self_weak.clone();
            subs.push(settings.on_change(move |_| {
                if let Some(router) = weak.upgrade() {
                    router.rewrite_url(false);
                }
            }));
        }
    }
}
