/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Application wiring.
//!
//! [`AppContext`] is the capability bundle views receive: the selection,
//! the data model, favorites and the local store, constructed once from
//! the page-embedded bootstrap blob. [`App`] adds the view registry and
//! router on top and is what a host embeds.

use std::rc::Rc;

use crate::data::{Bootstrap, DataError, DataModel, HttpTransport, JsonTransport};
use crate::favorites::FavoritesModel;
use crate::router::{AddressBar, Router};
use crate::selection::{Field, SelectionModel};
use crate::storage::LocalStore;
use crate::views::ViewRegistry;

/// Shared model collaborators. Everything is `Rc`-held and single-threaded;
/// clone the context freely.
pub struct AppContext {
    pub selection: Rc<SelectionModel>,
    pub data: Rc<DataModel>,
    pub favorites: Rc<FavoritesModel>,
    pub store: Rc<dyn LocalStore>,
}

impl AppContext {
    pub fn new(
        transport: Box<dyn JsonTransport>,
        store: Rc<dyn LocalStore>,
        bootstrap: Bootstrap,
    ) -> Rc<Self> {
        let selection = SelectionModel::new();
        let data = DataModel::new(transport, store.clone(), selection.clone(), bootstrap);
        let favorites = FavoritesModel::new(store.clone(), selection.clone());
        Rc::new(Self {
            selection,
            data,
            favorites,
            store,
        })
    }

    /// Select the first dataset and its first analysis when nothing is
    /// selected yet, so the initial page has something to show.
    pub fn select_default_dataset(&self) {
        if !self.selection.get(Field::Dataset).is_empty() {
            return;
        }
        let Some(dataset) = self.data.dataset_names().into_iter().next() else {
            return;
        };
        let analysis = self
            .data
            .analysis_names(&dataset)
            .into_iter()
            .next()
            .unwrap_or_default();
        self.selection.update(&[
            (Field::Dataset, dataset),
            (Field::Analysis, analysis),
        ]);
    }
}

/// A fully wired application: models, view registry and router.
pub struct App {
    pub context: Rc<AppContext>,
    pub registry: Rc<ViewRegistry>,
    pub router: Rc<Router>,
}

impl App {
    /// Wire an application over explicit collaborators. Hosts that talk to
    /// a real server over HTTP use [`App::with_http_transport`].
    pub fn new(
        transport: Box<dyn JsonTransport>,
        store: Rc<dyn LocalStore>,
        bootstrap: Bootstrap,
        address: Rc<dyn AddressBar>,
    ) -> Self {
        let context = AppContext::new(transport, store, bootstrap);
        let registry = ViewRegistry::new(context.clone());
        let router = Router::new(registry.clone(), context.clone(), address);
        Self {
            context,
            registry,
            router,
        }
    }

    pub fn with_http_transport(
        store: Rc<dyn LocalStore>,
        bootstrap: Bootstrap,
        address: Rc<dyn AddressBar>,
    ) -> Result<Self, DataError> {
        Ok(Self::new(
            Box::new(HttpTransport::new()?),
            store,
            bootstrap,
            address,
        ))
    }

    /// Sweep stale cached responses and route the fragment currently in the
    /// address bar. Call once after every view is registered.
    pub fn start(&self) {
        self.context.data.clear_persisted();
        self.router.handle_current_fragment();
    }
}
