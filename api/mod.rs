/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Request builder and response accessors for the corpus analysis API.
//!
//! A request is just a canonical query mapping; the server walks `datasets`
//! then `analyses` then `topics`/`documents` and returns a nested JSON
//! object mirroring that walk. The accessors here pull out the commonly
//! traversed slices and keep the path-digging in one place.

use serde_json::Value;

use crate::query::{QueryMap, QueryValue, encode};
use crate::selection::SelectionState;

/// A query against the analysis API, built up field by field. `*` selects
/// every item at a level.
#[derive(Debug, Clone, Default)]
pub struct ApiRequest {
    params: QueryMap,
}

impl ApiRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope the request to the currently selected dataset and analysis.
    /// Unset selection fields are omitted, which the server reads as "none".
    pub fn for_selection(selection: &SelectionState) -> Self {
        let mut request = Self::new();
        if !selection.dataset().is_empty() {
            request = request.datasets(selection.dataset());
        }
        if !selection.analysis().is_empty() {
            request = request.analyses(selection.analysis());
        }
        request
    }

    pub fn datasets(mut self, names: &str) -> Self {
        self.set("datasets", names);
        self
    }

    pub fn analyses(mut self, names: &str) -> Self {
        self.set("analyses", names);
        self
    }

    pub fn topics(mut self, numbers: &str) -> Self {
        self.set("topics", numbers);
        self
    }

    pub fn documents(mut self, names: &str) -> Self {
        self.set("documents", names);
        self
    }

    pub fn dataset_attr(mut self, attrs: &[&str]) -> Self {
        self.set_list("dataset_attr", attrs);
        self
    }

    pub fn analysis_attr(mut self, attrs: &[&str]) -> Self {
        self.set_list("analysis_attr", attrs);
        self
    }

    pub fn topic_attr(mut self, attrs: &[&str]) -> Self {
        self.set_list("topic_attr", attrs);
        self
    }

    pub fn document_attr(mut self, attrs: &[&str]) -> Self {
        self.set_list("document_attr", attrs);
        self
    }

    /// Offset into the document listing for paging.
    pub fn document_continue(mut self, offset: u64) -> Self {
        self.params.insert(
            "document_continue".to_string(),
            QueryValue::Number(offset as f64),
        );
        self
    }

    /// Page size for the document listing.
    pub fn document_limit(mut self, limit: u64) -> Self {
        self.params.insert(
            "document_limit".to_string(),
            QueryValue::Number(limit as f64),
        );
        self
    }

    fn set(&mut self, key: &str, value: &str) {
        self.params
            .insert(key.to_string(), QueryValue::Text(value.to_string()));
    }

    fn set_list(&mut self, key: &str, values: &[&str]) {
        self.params.insert(
            key.to_string(),
            QueryValue::List(values.iter().map(|v| v.to_string()).collect()),
        );
    }

    /// The canonical query string for this request. Equal requests always
    /// encode identically, so this doubles as the cache key.
    pub fn to_query(&self) -> String {
        encode(&self.params)
    }

    pub fn params(&self) -> &QueryMap {
        &self.params
    }
}

/// The `topics` object under the selected dataset and analysis, if the
/// response carries one. A response missing any level yields `None` rather
/// than an error; callers treat that the same as zero topics.
pub fn extract_topics<'a>(data: &'a Value, selection: &SelectionState) -> Option<&'a Value> {
    extract_analysis(data, selection)?.get("topics")
}

/// The `documents` object under the selected dataset and analysis.
pub fn extract_documents<'a>(data: &'a Value, selection: &SelectionState) -> Option<&'a Value> {
    extract_analysis(data, selection)?.get("documents")
}

fn extract_analysis<'a>(data: &'a Value, selection: &SelectionState) -> Option<&'a Value> {
    data.get("datasets")?
        .get(selection.dataset())?
        .get("analyses")?
        .get(selection.analysis())
}

/// Server-reported failure, carried in-band as an `error` key on an
/// otherwise well-formed response.
pub fn error_message(data: &Value) -> Option<&str> {
    data.get("error")?.as_str()
}
