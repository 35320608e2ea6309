//! Lazy raw-data section.
//!
//! The `/data` table is only fetched the first time the section is opened.
//! After that, opening and closing it flips visibility on the cached table.
//!
//! ```text
//! Hidden ──activate──▶ Loading ──ok──▶ Visible(table)
//!                         └──err──▶ Hidden (error kept, nothing cached)
//! Visible(table) ──activate──▶ HiddenCached(table)
//! HiddenCached(table) ──activate──▶ Visible(table)
//! ```

use serde::Serialize;

use crate::api::schema;
use crate::api::{Endpoint, FetchError, Fetcher, Query};
use crate::pipeline::failure_message;
use crate::render::Table;
use crate::transform::data::{RAW_TITLE, raw_data_table};

/// Where the toggle is.
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleState {
    /// Not loaded. Holds the error from the last failed load, if any.
    Hidden { last_error: Option<String> },
    /// A fetch is in flight.
    Loading,
    Visible(Table),
    HiddenCached(Table),
}

/// What an activation did.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", content = "detail", rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// Data was fetched and is now shown.
    Fetched,
    /// Cached data is shown again.
    Shown,
    Hidden,
    /// A load is already in flight; nothing was started.
    Pending,
    Failed(String),
}

/// Raw-data toggle. Starts hidden and unloaded.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDataToggle {
    state: ToggleState,
}

impl Default for RawDataToggle {
    fn default() -> Self {
        Self::new()
    }
}

impl RawDataToggle {
    pub fn new() -> Self {
        Self {
            state: ToggleState::Hidden { last_error: None },
        }
    }

    pub fn state(&self) -> &ToggleState {
        &self.state
    }

    /// True once a table has been cached.
    pub fn is_loaded(&self) -> bool {
        matches!(self.state, ToggleState::Visible(_) | ToggleState::HiddenCached(_))
    }

    /// The table, when it is currently shown.
    pub fn visible_table(&self) -> Option<&Table> {
        match &self.state {
            ToggleState::Visible(table) => Some(table),
            _ => None,
        }
    }

    /// Short state name for JSON responses.
    pub fn label(&self) -> &'static str {
        match self.state {
            ToggleState::Hidden { .. } => "hidden",
            ToggleState::Loading => "loading",
            ToggleState::Visible(_) => "visible",
            ToggleState::HiddenCached(_) => "hidden_cached",
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        match &self.state {
            ToggleState::Hidden { last_error } => last_error.as_deref(),
            _ => None,
        }
    }

    /// First half of an activation.
    ///
    /// Returns `None` when the caller must fetch and then call
    /// [`finish`](Self::finish); otherwise the transition is already done.
    pub fn begin(&mut self) -> Option<ToggleOutcome> {
        let state = std::mem::replace(&mut self.state, ToggleState::Loading);
        let (next, outcome) = match state {
            ToggleState::Hidden { .. } => (ToggleState::Loading, None),
            ToggleState::Loading => (ToggleState::Loading, Some(ToggleOutcome::Pending)),
            ToggleState::Visible(table) => (ToggleState::HiddenCached(table), Some(ToggleOutcome::Hidden)),
            ToggleState::HiddenCached(table) => (ToggleState::Visible(table), Some(ToggleOutcome::Shown)),
        };
        self.state = next;
        outcome
    }

    /// Second half of an activation: store the fetched table or the error.
    ///
    /// Ignored unless a load is in flight.
    pub fn finish(&mut self, result: Result<Table, FetchError>) -> ToggleOutcome {
        if self.state != ToggleState::Loading {
            return ToggleOutcome::Pending;
        }
        match result {
            Ok(table) => {
                self.state = ToggleState::Visible(table);
                ToggleOutcome::Fetched
            }
            Err(e) => {
                let message = failure_message(RAW_TITLE, &e);
                self.state = ToggleState::Hidden {
                    last_error: Some(message.clone()),
                };
                ToggleOutcome::Failed(message)
            }
        }
    }

    /// Run a whole activation, fetching through `fetcher` if needed.
    pub fn activate<F: Fetcher + ?Sized>(&mut self, fetcher: &F) -> ToggleOutcome {
        match self.begin() {
            Some(outcome) => outcome,
            None => self.finish(fetch_table(fetcher)),
        }
    }
}

/// Fetch `/data` and build its table.
pub fn fetch_table<F: Fetcher + ?Sized>(fetcher: &F) -> Result<Table, FetchError> {
    let body = fetcher.fetch(Endpoint::Data, &Query::new())?;
    let rows = schema::parse_raw_data(body)?;
    Ok(raw_data_table(&rows))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    struct Fixed(Value);

    impl Fetcher for Fixed {
        fn fetch(&self, _endpoint: Endpoint, _query: &Query) -> Result<Value, FetchError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn begin_while_loading_is_pending() {
        let mut toggle = RawDataToggle::new();
        assert_eq!(toggle.begin(), None);
        assert_eq!(toggle.label(), "loading");
        assert_eq!(toggle.begin(), Some(ToggleOutcome::Pending));
        assert_eq!(toggle.state(), &ToggleState::Loading);
    }

    #[test]
    fn finish_without_begin_is_ignored() {
        let mut toggle = RawDataToggle::new();
        let outcome = toggle.finish(Ok(Table::new(RAW_TITLE, ["a"])));
        assert_eq!(outcome, ToggleOutcome::Pending);
        assert!(!toggle.is_loaded());
    }

    #[test]
    fn failure_keeps_message_and_nothing_cached() {
        let mut toggle = RawDataToggle::new();
        toggle.begin();
        let outcome = toggle.finish(Err(FetchError::malformed(Endpoint::Data, "expected an array")));
        assert!(matches!(outcome, ToggleOutcome::Failed(ref m) if m.starts_with("Unable to load Raw data")));
        assert!(!toggle.is_loaded());
        assert!(toggle.last_error().is_some());
        assert_eq!(toggle.label(), "hidden");
    }

    #[test]
    fn malformed_body_fails_activation() {
        let mut toggle = RawDataToggle::new();
        let outcome = toggle.activate(&Fixed(json!({"not": "rows"})));
        assert!(matches!(outcome, ToggleOutcome::Failed(_)));
    }

    #[test]
    fn visible_table_only_when_shown() {
        let mut toggle = RawDataToggle::new();
        toggle.activate(&Fixed(json!([{"Age": 55}])));
        assert_eq!(toggle.visible_table().map(|t| t.headers.clone()), Some(vec!["Age".to_string()]));
        toggle.activate(&Fixed(json!([])));
        assert!(toggle.visible_table().is_none());
        assert_eq!(toggle.label(), "hidden_cached");
    }

    #[test]
    fn outcome_json() {
        let json = serde_json::to_value(ToggleOutcome::Fetched).unwrap();
        assert_eq!(json["result"], "fetched");
    }
}
