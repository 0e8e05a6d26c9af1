//! Call history.

use serde::Serialize;

use crate::http::request::RequestOptions;
use crate::http::url::normalize_url;

/// One handled fetch call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallRecord {
    pub url: String,
    pub options: RequestOptions,
    /// Identifier of the route that answered, `None` when no route matched.
    pub route: Option<String>,
}

/// Which calls to select.
#[derive(Debug, Clone, Copy)]
pub enum CallFilter<'a> {
    All,
    Matched,
    Unmatched,
    /// Calls answered by the route with this identifier.
    Route(&'a str),
    /// Calls made to this URL, compared in canonical form.
    Url(&'a str),
}

impl CallFilter<'_> {
    fn accepts(&self, call: &CallRecord) -> bool {
        match self {
            CallFilter::All => true,
            CallFilter::Matched => call.route.is_some(),
            CallFilter::Unmatched => call.route.is_none(),
            CallFilter::Route(identifier) => call.route.as_deref() == Some(*identifier),
            CallFilter::Url(url) => call.url == normalize_url(url),
        }
    }
}

#[derive(Debug, Default)]
pub struct CallHistory {
    calls: Vec<CallRecord>,
}

impl CallHistory {
    pub fn record(&mut self, call: CallRecord) {
        self.calls.push(call);
    }

    pub fn calls(&self, filter: CallFilter<'_>) -> Vec<CallRecord> {
        self.calls
            .iter()
            .filter(|call| filter.accepts(call))
            .cloned()
            .collect()
    }

    pub fn last(&self, filter: CallFilter<'_>) -> Option<CallRecord> {
        self.calls.iter().rev().find(|call| filter.accepts(call)).cloned()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}
