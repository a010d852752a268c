/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! View registration and the single-current-view lifecycle.
//!
//! Views register under a URL-safe path derived from their menu placement
//! plus display name. `change_view` is the only way a view mounts or
//! unmounts: it disposes the old view, applies the navigation's selection,
//! builds scoped settings, constructs and renders the new view, and fires
//! one `view_changed` signal. Resolution never fails; an unknown path gets
//! the fallback view.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use log::warn;
use serde_json::{Map, Value};

use crate::app::AppContext;
use crate::events::{SignalHub, Subscription};
use crate::query;
use crate::selection::Field;
use crate::settings::ViewSettings;
use crate::views::{DefaultView, Liveness, View, ViewContext, ViewFactory, ViewOutput};

/// What a navigation carries into `change_view`: selection fields from the
/// query plus any settings payload from the URL.
#[derive(Default)]
pub struct NavigationRequest {
    pub selection: Vec<(Field, String)>,
    pub settings: Map<String, Value>,
}

impl NavigationRequest {
    pub fn new() -> Self {
        Self::default()
    }
}

/// One node of the navigation menu tree.
#[derive(Debug, Clone, PartialEq)]
pub enum NavNode {
    Link { path: String },
    Menu { children: BTreeMap<String, NavNode> },
}

/// Fired after a new view has mounted and rendered.
#[derive(Debug, Clone)]
pub struct ViewChanged {
    pub path: String,
}

struct Registration {
    factory: Rc<ViewFactory>,
}

struct Mounted {
    view: Box<dyn View>,
    settings: Rc<ViewSettings>,
    output: ViewOutput,
    liveness: Liveness,
}

pub struct ViewRegistry {
    app: Rc<AppContext>,
    self_weak: Weak<ViewRegistry>,
    root: RefCell<Option<Rc<ViewFactory>>>,
    views: RefCell<BTreeMap<String, Registration>>,
    navigation: RefCell<BTreeMap<String, NavNode>>,
    current: RefCell<Option<Mounted>>,
    current_path: RefCell<String>,
    page_title: RefCell<String>,
    view_changed: SignalHub<ViewChanged>,
}

impl ViewRegistry {
    pub fn new(app: Rc<AppContext>) -> Rc<Self> {
        Rc::new_cyclic(|weak| Self {
            app,
            self_weak: weak.clone(),
            root: RefCell::new(None),
            views: RefCell::new(BTreeMap::new()),
            navigation: RefCell::new(BTreeMap::new()),
            current: RefCell::new(None),
            current_path: RefCell::new(String::new()),
            page_title: RefCell::new(String::new()),
            view_changed: SignalHub::new(),
        })
    }

    /// The view mounted for the empty path. Not part of the navigation
    /// tree and not addressable by name.
    pub fn set_root_view(&self, factory: ViewFactory) {
        *self.root.borrow_mut() = Some(Rc::new(factory));
    }

    /// Register a view under the given menu placement. The URL path is
    /// derived from the menu names plus the view's display name; a
    /// duplicate path or a menu/link conflict is logged and the
    /// registration dropped.
    pub fn add_view(&self, menu_path: &[&str], factory: ViewFactory) {
        let mut display_path: Vec<String> = menu_path.iter().map(|s| s.to_string()).collect();
        display_path.push(factory.display_name.clone());
        let path = derive_path(&display_path);

        if self.views.borrow().contains_key(&path) {
            warn!("Cannot add the path \"{path}\": it already exists.");
            return;
        }
        if !self.insert_navigation(&display_path, &path) {
            return;
        }
        self.views.borrow_mut().insert(
            path,
            Registration {
                factory: Rc::new(factory),
            },
        );
    }

    fn insert_navigation(&self, display_path: &[String], path: &str) -> bool {
        // Validate the whole walk before touching the tree, so a rejected
        // registration leaves no half-built menus behind.
        {
            let navigation = self.navigation.borrow();
            let mut children: &BTreeMap<String, NavNode> = &navigation;
            for (index, name) in display_path.iter().enumerate() {
                let is_leaf = index == display_path.len() - 1;
                match children.get(name) {
                    None => break,
                    Some(NavNode::Menu { children: inner }) => {
                        if is_leaf {
                            warn!("Cannot turn the existing menu \"{name}\" into a link.");
                            return false;
                        }
                        children = inner;
                    },
                    Some(NavNode::Link { .. }) => {
                        if is_leaf {
                            warn!("Cannot squash the existing link \"{name}\" with a new link.");
                        } else {
                            warn!("Cannot turn the existing link \"{name}\" into a menu.");
                        }
                        return false;
                    },
                }
            }
        }

        let mut navigation = self.navigation.borrow_mut();
        let mut children: &mut BTreeMap<String, NavNode> = &mut navigation;
        for (index, name) in display_path.iter().enumerate() {
            let is_leaf = index == display_path.len() - 1;
            if is_leaf {
                children.insert(
                    name.clone(),
                    NavNode::Link {
                        path: path.to_string(),
                    },
                );
            } else {
                let entry = children.entry(name.clone()).or_insert_with(|| NavNode::Menu {
                    children: BTreeMap::new(),
                });
                match entry {
                    NavNode::Menu { children: inner } => children = inner,
                    // Ruled out by the validation walk.
                    NavNode::Link { .. } => return false,
                }
            }
        }
        true
    }

    /// Swap the current view for the one registered at `path`. Never
    /// fails: the empty path resolves to the root view and an unknown path
    /// to the fallback view.
    pub fn change_view(&self, path: &str, request: NavigationRequest) {
        let path = path.to_lowercase();

        if let Some(mut mounted) = self.current.borrow_mut().take() {
            mounted.view.dispose();
            mounted.liveness.kill();
        }

        // The path must be current before the selection applies; router
        // listeners regenerate the URL from both.
        *self.current_path.borrow_mut() = path.clone();
        self.app.selection.update(&request.selection);

        let factory = self.resolve(&path);
        let settings = ViewSettings::load(
            self.app.store.clone(),
            &self.app.selection.snapshot(),
            &path,
            factory.default_settings.clone(),
        );
        settings.overlay(request.settings);

        let output = ViewOutput::new();
        let liveness = Liveness::new();
        let context = ViewContext {
            app: self.app.clone(),
            settings: settings.clone(),
            registry: self.self_weak.clone(),
            output: output.clone(),
            liveness: liveness.clone(),
        };
        let mut view = factory.build(context);
        if let Err(e) = view.render() {
            warn!("The following error occurred while trying to render the view: {e}");
        }

        *self.page_title.borrow_mut() = format!("Topical Guide — {}", view.display_name());
        *self.current.borrow_mut() = Some(Mounted {
            view,
            settings,
            output,
            liveness,
        });
        self.view_changed.emit(ViewChanged { path });
    }

    fn resolve(&self, path: &str) -> Rc<ViewFactory> {
        let registered = if path.is_empty() {
            self.root.borrow().clone()
        } else {
            self.views
                .borrow()
                .get(path)
                .map(|registration| registration.factory.clone())
        };
        registered.unwrap_or_else(|| Rc::new(DefaultView::factory()))
    }

    pub fn has_view(&self, path: &str) -> bool {
        self.views.borrow().contains_key(path)
    }

    pub fn current_path(&self) -> String {
        self.current_path.borrow().clone()
    }

    pub fn page_title(&self) -> String {
        self.page_title.borrow().clone()
    }

    pub fn current_settings(&self) -> Option<Rc<ViewSettings>> {
        self.current
            .borrow()
            .as_ref()
            .map(|mounted| mounted.settings.clone())
    }

    /// The current view's rendered content.
    pub fn current_output(&self) -> Option<String> {
        self.current
            .borrow()
            .as_ref()
            .map(|mounted| mounted.output.content())
    }

    pub fn current_display_name(&self) -> Option<String> {
        self.current
            .borrow()
            .as_ref()
            .map(|mounted| mounted.view.display_name().to_string())
    }

    pub fn current_help(&self) -> Option<String> {
        self.current
            .borrow()
            .as_ref()
            .map(|mounted| mounted.view.render_help())
    }

    /// A copy of the navigation menu tree, for hosts rendering a menu bar.
    pub fn navigation(&self) -> BTreeMap<String, NavNode> {
        self.navigation.borrow().clone()
    }

    pub fn on_view_changed(&self, listener: impl Fn(&ViewChanged) + 'static) -> Subscription {
        self.view_changed.subscribe(listener)
    }
}

/// URL-safe path for a menu placement: spaces become underscores, each
/// segment is percent-escaped, segments join with `/`, and the whole thing
/// lowercases.
fn derive_path(display_path: &[String]) -> String {
    display_path
        .iter()
        .map(|segment| query::escape(&segment.replace(' ', "_")))
        .collect::<Vec<_>>()
        .join("/")
        .to_lowercase()
}
