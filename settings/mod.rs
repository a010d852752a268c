/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Per-view settings, persisted per dataset and analysis.
//!
//! A view gets a fresh [`ViewSettings`] each time it mounts. The bag starts
//! from the view's defaults, then whatever was persisted for this
//! (dataset, analysis, view path) scope wins on top. Every mutation writes
//! the whole document back, so sort orders and filter choices survive both
//! navigation and restarts. While the dataset or analysis is unset there is
//! no scope to persist under and saves quietly stay in memory.

use std::cell::RefCell;
use std::rc::Rc;

use log::warn;
use serde_json::{Map, Value};

use crate::events::{SignalHub, Subscription};
use crate::selection::SelectionState;
use crate::storage::{LocalStore, SETTINGS_PREFIX};

/// Fired after one save-worth of settings mutations.
#[derive(Debug, Clone)]
pub struct SettingsChange {
    pub changed: Vec<String>,
}

pub struct ViewSettings {
    store: Rc<dyn LocalStore>,
    /// `None` while dataset or analysis is unset.
    scope_key: Option<String>,
    values: RefCell<Map<String, Value>>,
    changed: SignalHub<SettingsChange>,
}

impl ViewSettings {
    /// Build the bag for one mounted view: defaults first, persisted values
    /// for the scope on top.
    pub fn load(
        store: Rc<dyn LocalStore>,
        selection: &SelectionState,
        view_path: &str,
        defaults: Map<String, Value>,
    ) -> Rc<Self> {
        let scope_key = Self::scope_key_for(selection, view_path);
        let mut values = defaults;
        if let Some(key) = &scope_key
            && let Some(raw) = store.get(key)
        {
            match serde_json::from_str::<Map<String, Value>>(&raw) {
                Ok(persisted) => {
                    for (name, value) in persisted {
                        values.insert(name, value);
                    }
                },
                Err(e) => warn!("Dropping unparsable settings under {key}: {e}"),
            }
        }
        Rc::new(Self {
            store,
            scope_key,
            values: RefCell::new(values),
            changed: SignalHub::new(),
        })
    }

    fn scope_key_for(selection: &SelectionState, view_path: &str) -> Option<String> {
        let dataset = selection.dataset();
        let analysis = selection.analysis();
        if dataset.is_empty() || analysis.is_empty() {
            return None;
        }
        Some(format!("{SETTINGS_PREFIX}{dataset}-{analysis}-{view_path}"))
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.borrow().get(name).cloned()
    }

    /// Convenience for the common string-valued setting.
    pub fn get_str(&self, name: &str) -> Option<String> {
        self.get(name)?.as_str().map(str::to_string)
    }

    /// Set one value, persist the document and fire one notification.
    /// Writing the value already present is a silent no-op.
    pub fn set(&self, name: &str, value: Value) {
        let mut overlay = Map::new();
        overlay.insert(name.to_string(), value);
        self.overlay(overlay);
    }

    /// Apply several values at once: one save, one notification. Values
    /// equal to what the bag already holds are discarded; an overlay that
    /// changes nothing neither saves nor notifies.
    pub fn overlay(&self, incoming: Map<String, Value>) {
        let mut changed = Vec::new();
        {
            let mut values = self.values.borrow_mut();
            for (name, value) in incoming {
                if values.get(&name) == Some(&value) {
                    continue;
                }
                changed.push(name.clone());
                values.insert(name, value);
            }
        }
        if changed.is_empty() {
            return;
        }
        self.save();
        self.changed.emit(SettingsChange { changed });
    }

    /// The whole bag as a JSON object, as embedded in shareable URLs.
    pub fn to_json(&self) -> Value {
        Value::Object(self.values.borrow().clone())
    }

    pub fn on_change(&self, listener: impl Fn(&SettingsChange) + 'static) -> Subscription {
        self.changed.subscribe(listener)
    }

    fn save(&self) {
        let Some(key) = &self.scope_key else {
            return;
        };
        let document = Value::Object(self.values.borrow().clone()).to_string();
        if let Err(e) = self.store.put(key, &document) {
            warn!("Failed to persist settings under {key}: {e}");
        }
    }
}
