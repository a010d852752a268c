/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Shared selection state: which dataset, analysis, topic and document the
//! user is currently looking at.
//!
//! All mutation goes through [`SelectionModel::update`], which stages the
//! incoming fields, applies the dependency cascade (a dataset change
//! invalidates everything scoped under it), commits atomically and fires
//! exactly one change notification. Views and the router both subscribe to
//! that single signal, so a batch of related changes never causes a render
//! storm.

use std::cell::RefCell;
use std::rc::Rc;

use crate::events::{SignalHub, Subscription};

/// The selectable fields, in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Dataset,
    Analysis,
    Topic,
    Document,
    MetadataName,
    MetadataValue,
    MetadataRange,
    TopicNameScheme,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Dataset,
        Field::Analysis,
        Field::Topic,
        Field::Document,
        Field::MetadataName,
        Field::MetadataValue,
        Field::MetadataRange,
        Field::TopicNameScheme,
    ];

    /// Fields cleared when this one changes to a different value.
    fn cascade_targets(self) -> &'static [Field] {
        match self {
            Field::Dataset => &[
                Field::Analysis,
                Field::Topic,
                Field::Document,
                Field::MetadataName,
                Field::MetadataValue,
                Field::MetadataRange,
            ],
            Field::Analysis => &[Field::Topic],
            _ => &[],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Dataset => "dataset",
            Field::Analysis => "analysis",
            Field::Topic => "topic",
            Field::Document => "document",
            Field::MetadataName => "metadata_name",
            Field::MetadataValue => "metadata_value",
            Field::MetadataRange => "metadata_range",
            Field::TopicNameScheme => "topic_name_scheme",
        }
    }

    /// Inverse of [`Field::as_str`] for query keys; unknown keys are not
    /// selection fields.
    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.as_str() == key)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Fired after a batch of selection changes commits.
#[derive(Debug, Clone)]
pub struct SelectionChange {
    /// The fields whose values actually changed, cascade clears included.
    pub changed: Vec<Field>,
}

/// The current selection values. The empty string means unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    values: [String; 8],
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: Field) -> &str {
        &self.values[field.index()]
    }

    pub fn dataset(&self) -> &str {
        self.get(Field::Dataset)
    }

    pub fn analysis(&self) -> &str {
        self.get(Field::Analysis)
    }

    pub fn topic(&self) -> &str {
        self.get(Field::Topic)
    }

    pub fn document(&self) -> &str {
        self.get(Field::Document)
    }

    pub fn topic_name_scheme(&self) -> &str {
        self.get(Field::TopicNameScheme)
    }

    /// True when every listed field holds a non-empty value.
    pub fn is_non_empty(&self, fields: &[Field]) -> bool {
        fields.iter().all(|field| !self.get(*field).is_empty())
    }

    /// The listed fields as `(key, value)` pairs, omitting unset ones.
    pub fn subset(&self, fields: &[Field]) -> Vec<(&'static str, String)> {
        fields
            .iter()
            .filter(|field| !self.get(**field).is_empty())
            .map(|field| (field.as_str(), self.get(*field).to_string()))
            .collect()
    }

    /// Apply a batch without notification plumbing; returns the fields that
    /// actually changed, cascade clears included, in [`Field::ALL`] order.
    pub fn update_silent(&mut self, partial: &[(Field, String)]) -> Vec<Field> {
        // Stage only the fields whose staged value differs from the current
        // one; an update that stages nothing is a no-op.
        let mut staged: [Option<String>; 8] = Default::default();
        for (field, value) in partial {
            if self.get(*field) != value.as_str() {
                staged[field.index()] = Some(value.clone());
            }
        }
        if staged.iter().all(Option::is_none) {
            return Vec::new();
        }

        // Cascade: a changed field clears its dependents unless the caller
        // staged them explicitly in the same batch.
        for field in Field::ALL {
            if staged[field.index()].is_none() {
                continue;
            }
            for target in field.cascade_targets() {
                if staged[target.index()].is_none() && !self.get(*target).is_empty() {
                    staged[target.index()] = Some(String::new());
                }
            }
        }

        let mut changed = Vec::new();
        for field in Field::ALL {
            let Some(value) = staged[field.index()].take() else {
                continue;
            };
            if self.values[field.index()] != value {
                self.values[field.index()] = value;
                changed.push(field);
            }
        }
        changed
    }
}

/// The shared, observable selection. Clone the `Rc` freely; all clones see
/// the same state and the same change signal.
pub struct SelectionModel {
    state: RefCell<SelectionState>,
    changed: SignalHub<SelectionChange>,
}

impl SelectionModel {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            state: RefCell::new(SelectionState::new()),
            changed: SignalHub::new(),
        })
    }

    pub fn get(&self, field: Field) -> String {
        self.state.borrow().get(field).to_string()
    }

    pub fn snapshot(&self) -> SelectionState {
        self.state.borrow().clone()
    }

    pub fn is_non_empty(&self, fields: &[Field]) -> bool {
        self.state.borrow().is_non_empty(fields)
    }

    pub fn subset(&self, fields: &[Field]) -> Vec<(&'static str, String)> {
        self.state.borrow().subset(fields)
    }

    /// Stage and commit a batch of field changes. Fires one
    /// [`SelectionChange`] if anything changed, none otherwise.
    pub fn update(&self, partial: &[(Field, String)]) {
        let changed = self.state.borrow_mut().update_silent(partial);
        if !changed.is_empty() {
            self.changed.emit(SelectionChange { changed });
        }
    }

    /// Like [`SelectionModel::update`] but never notifies. Used when the
    /// caller will trigger its own downstream refresh, e.g. the registry
    /// applying an incoming navigation before mounting the view.
    pub fn update_quiet(&self, partial: &[(Field, String)]) -> Vec<Field> {
        self.state.borrow_mut().update_silent(partial)
    }

    pub fn on_change(&self, listener: impl Fn(&SelectionChange) + 'static) -> Subscription {
        self.changed.subscribe(listener)
    }
}
