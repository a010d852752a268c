/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Starred datasets, analyses, topics and documents.
//!
//! Each category is a persisted string set. Datasets are global; the other
//! categories are scoped under the current selection, so starring topic `3`
//! in one analysis says nothing about topic `3` anywhere else. Keys:
//!
//! - `favs-datasets`
//! - `favs-dataset-<dataset>-analyses`
//! - `favs-dataset-<dataset>-analysis-<analysis>-topics`
//! - `favs-dataset-<dataset>-analysis-<analysis>-documents`
//!
//! The model reloads itself when the selection changes, so `has` always
//! answers for the sets that belong to what the user is looking at.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

use log::warn;

use crate::events::{SignalHub, Subscription};
use crate::selection::SelectionModel;
use crate::storage::{FAVORITES_PREFIX, LocalStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FavoriteKind {
    Datasets,
    Analyses,
    Topics,
    Documents,
}

impl FavoriteKind {
    pub const ALL: [FavoriteKind; 4] = [
        FavoriteKind::Datasets,
        FavoriteKind::Analyses,
        FavoriteKind::Topics,
        FavoriteKind::Documents,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Fired once per add/remove/toggle batch that changed anything.
#[derive(Debug, Clone)]
pub struct FavoritesChange {
    pub kind: FavoriteKind,
}

pub struct FavoritesModel {
    store: Rc<dyn LocalStore>,
    selection: Rc<SelectionModel>,
    sets: RefCell<[BTreeSet<String>; 4]>,
    changed: SignalHub<FavoritesChange>,
    _selection_sub: RefCell<Option<Subscription>>,
}

impl FavoritesModel {
    pub fn new(store: Rc<dyn LocalStore>, selection: Rc<SelectionModel>) -> Rc<Self> {
        let model = Rc::new(Self {
            store,
            selection: selection.clone(),
            sets: RefCell::new(Default::default()),
            changed: SignalHub::new(),
            _selection_sub: RefCell::new(None),
        });
        model.reload();

        let weak: Weak<FavoritesModel> = Rc::downgrade(&model);
        let sub = selection.on_change(move |_| {
            if let Some(model) = weak.upgrade() {
                model.reload();
            }
        });
        *model._selection_sub.borrow_mut() = Some(sub);

        model
    }

    fn storage_key(&self, kind: FavoriteKind) -> String {
        let dataset = self.selection.get(crate::selection::Field::Dataset);
        let analysis = self.selection.get(crate::selection::Field::Analysis);
        match kind {
            FavoriteKind::Datasets => format!("{FAVORITES_PREFIX}datasets"),
            FavoriteKind::Analyses => {
                format!("{FAVORITES_PREFIX}dataset-{dataset}-analyses")
            },
            FavoriteKind::Topics => {
                format!("{FAVORITES_PREFIX}dataset-{dataset}-analysis-{analysis}-topics")
            },
            FavoriteKind::Documents => {
                format!("{FAVORITES_PREFIX}dataset-{dataset}-analysis-{analysis}-documents")
            },
        }
    }

    fn reload(&self) {
        let mut sets = self.sets.borrow_mut();
        for kind in FavoriteKind::ALL {
            let key = self.storage_key(kind);
            sets[kind.index()] = match self.store.get(&key) {
                Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                    warn!("Dropping unparsable favorites under {key}: {e}");
                    BTreeSet::new()
                }),
                None => BTreeSet::new(),
            };
        }
    }

    fn save(&self, kind: FavoriteKind) {
        let key = self.storage_key(kind);
        let serialized = match serde_json::to_string(&self.sets.borrow()[kind.index()]) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize favorites: {e}");
                return;
            },
        };
        if let Err(e) = self.store.put(&key, &serialized) {
            warn!("Failed to persist favorites under {key}: {e}");
        }
    }

    pub fn has(&self, kind: FavoriteKind, item: &str) -> bool {
        self.sets.borrow()[kind.index()].contains(item)
    }

    pub fn all(&self, kind: FavoriteKind) -> Vec<String> {
        self.sets.borrow()[kind.index()].iter().cloned().collect()
    }

    /// Star the given items. One save and one notification per call, none
    /// when every item was already starred.
    pub fn add(&self, kind: FavoriteKind, items: &[&str]) {
        let mut changed = false;
        {
            let mut sets = self.sets.borrow_mut();
            for item in items {
                changed |= sets[kind.index()].insert(item.to_string());
            }
        }
        if changed {
            self.save(kind);
            self.changed.emit(FavoritesChange { kind });
        }
    }

    pub fn remove(&self, kind: FavoriteKind, items: &[&str]) {
        let mut changed = false;
        {
            let mut sets = self.sets.borrow_mut();
            for item in items {
                changed |= sets[kind.index()].remove(*item);
            }
        }
        if changed {
            self.save(kind);
            self.changed.emit(FavoritesChange { kind });
        }
    }

    pub fn toggle(&self, kind: FavoriteKind, item: &str) {
        if self.has(kind, item) {
            self.remove(kind, &[item]);
        } else {
            self.add(kind, &[item]);
        }
    }

    /// Forget every starred item, persisted and in memory.
    pub fn clear_persisted(&self) {
        self.store.clear_prefix(FAVORITES_PREFIX);
        let mut sets = self.sets.borrow_mut();
        for set in sets.iter_mut() {
            set.clear();
        }
    }

    pub fn on_change(&self, listener: impl Fn(&FavoritesChange) + 'static) -> Subscription {
        self.changed.subscribe(listener)
    }
}
