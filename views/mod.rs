/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The view capability surface.
//!
//! A view is anything implementing [`View`]: it renders into the output
//! slot it was handed, cleans up in `dispose`, and may offer a help text.
//! Views never reach for globals; everything they touch arrives in their
//! [`ViewContext`] at construction time.

pub mod registry;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde_json::Map;

use crate::app::AppContext;
use crate::settings::ViewSettings;

pub use registry::{NavNode, NavigationRequest, ViewChanged, ViewRegistry};

/// A render failure. Logged at the registry boundary; the failed view
/// stays mounted so its output slot can carry an error message.
#[derive(Debug)]
pub enum ViewError {
    Render(String),
}

impl std::fmt::Display for ViewError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewError::Render(e) => write!(f, "{e}"),
        }
    }
}

/// Where a mounted view writes its rendered content. Cheap to clone; the
/// registry hands out a fresh slot per mount, so writes from a disposed
/// view land in a slot nothing displays any more.
#[derive(Clone, Default)]
pub struct ViewOutput {
    content: Rc<RefCell<String>>,
}

impl ViewOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, content: impl Into<String>) {
        *self.content.borrow_mut() = content.into();
    }

    /// The conventional one-line server-error rendering.
    pub fn render_error(&self, message: &str) {
        self.set(format!("Oops, there was a server error: {message}"));
    }

    pub fn content(&self) -> String {
        self.content.borrow().clone()
    }
}

/// Cancellation token for callbacks that may outlive their view. Capture a
/// clone at request time and check it in the callback; the registry kills
/// the token when the view is disposed.
#[derive(Clone)]
pub struct Liveness {
    alive: Rc<Cell<bool>>,
}

impl Liveness {
    pub fn new() -> Self {
        Self {
            alive: Rc::new(Cell::new(true)),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }

    pub(crate) fn kill(&self) {
        self.alive.set(false);
    }
}

/// Everything a view may touch, injected at construction.
pub struct ViewContext {
    pub app: Rc<AppContext>,
    pub settings: Rc<ViewSettings>,
    pub registry: Weak<ViewRegistry>,
    pub output: ViewOutput,
    pub liveness: Liveness,
}

pub trait View {
    /// Human readable name, shown in the page title.
    fn display_name(&self) -> &str;

    fn render(&mut self) -> Result<(), ViewError>;

    fn render_help(&self) -> String {
        "The creators of this view didn't create a help page for you.".to_string()
    }

    /// Drop subscriptions and any other held resources. The registry kills
    /// the liveness token and detaches the output slot itself.
    fn dispose(&mut self) {}
}

/// Constructs one view per mount.
pub struct ViewFactory {
    pub display_name: String,
    /// Settings the view starts from when nothing is persisted yet.
    pub default_settings: Map<String, serde_json::Value>,
    build: Box<dyn Fn(ViewContext) -> Box<dyn View>>,
}

impl ViewFactory {
    pub fn new(
        display_name: impl Into<String>,
        build: impl Fn(ViewContext) -> Box<dyn View> + 'static,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            default_settings: Map::new(),
            build: Box::new(build),
        }
    }

    pub fn with_default_settings(mut self, defaults: Map<String, serde_json::Value>) -> Self {
        self.default_settings = defaults;
        self
    }

    pub fn build(&self, context: ViewContext) -> Box<dyn View> {
        (self.build)(context)
    }
}

/// Shown for the root before a host registers one, and for any path no
/// view claims.
pub struct DefaultView {
    output: ViewOutput,
}

impl DefaultView {
    pub fn new(context: ViewContext) -> Self {
        Self {
            output: context.output,
        }
    }

    pub fn factory() -> ViewFactory {
        ViewFactory::new("Default Page", |context| {
            Box::new(DefaultView::new(context))
        })
    }
}

impl View for DefaultView {
    fn display_name(&self) -> &str {
        "Default Page"
    }

    fn render(&mut self) -> Result<(), ViewError> {
        self.output.set(
            "Welcome to the Default Page. You're seeing this message either because \
             this view is not implemented, this view doesn't exist, or an error \
             occurred while trying to render the view.",
        );
        Ok(())
    }
}
