/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Topical Guide client core: the state layer of a topic-modeling corpus
//! browser.
//!
//! The crate keeps four things in agreement without a page reload: the URL
//! fragment, the shared selection (dataset, analysis, topic, document),
//! per-view settings, and the single mounted view. Server responses are
//! cached in memory and in a local store so navigation is instant after
//! first fetch.
//!
//! Hosts construct an [`app::App`] from a bootstrap blob, register views
//! with the registry, and feed fragment changes to the router.

pub mod api;
pub mod app;
pub mod data;
pub mod events;
pub mod favorites;
pub mod query;
pub mod router;
pub mod selection;
pub mod settings;
pub mod storage;
pub mod views;

pub use app::{App, AppContext};
pub use router::{AddressBar, RecordingAddressBar, Router};
pub use selection::{Field, SelectionModel};
pub use views::{NavigationRequest, View, ViewContext, ViewError, ViewFactory, ViewRegistry};
