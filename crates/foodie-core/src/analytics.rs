//! # Analytics
//!
//! Fire-and-forget event tracking.
//!
//! ## Events
//! ```text
//! ┌──────────────────────┬──────────────────────────────────────────────────┐
//! │ Event                │ Params                                           │
//! ├──────────────────────┼──────────────────────────────────────────────────┤
//! │ recipe_filter        │ category                                         │
//! │ search               │ search_term, result_count                        │
//! │ recipe_interaction   │ action (favorite | unfavorite), recipe_id        │
//! │ form_submit          │ form_type (newsletter | contact)                 │
//! │ page_view            │ page_path                                        │
//! └──────────────────────┴──────────────────────────────────────────────────┘
//! ```
//!
//! Sinks may fail. [`AnalyticsService`] logs the failure and carries on, so
//! tracking never changes the outcome of a user action.

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::AnalyticsError;

/// Ordered event parameters.
pub type EventParams = IndexMap<String, Value>;

// =============================================================================
// Event Names
// =============================================================================

pub const RECIPE_FILTER: &str = "recipe_filter";
pub const SEARCH: &str = "search";
pub const RECIPE_INTERACTION: &str = "recipe_interaction";
pub const FORM_SUBMIT: &str = "form_submit";
pub const PAGE_VIEW: &str = "page_view";

// =============================================================================
// Port
// =============================================================================

/// Destination for analytics events.
pub trait AnalyticsSink: Send + Sync {
    fn track_event(&self, name: &str, params: &EventParams) -> Result<(), AnalyticsError>;
}

// =============================================================================
// Sinks
// =============================================================================

/// Emits every event as an `info` tracing record.
#[derive(Debug, Clone, Default)]
pub struct TracingAnalytics {
    measurement_id: Option<String>,
}

impl TracingAnalytics {
    pub fn new(measurement_id: Option<String>) -> Self {
        TracingAnalytics { measurement_id }
    }
}

impl AnalyticsSink for TracingAnalytics {
    fn track_event(&self, name: &str, params: &EventParams) -> Result<(), AnalyticsError> {
        let params = serde_json::to_string(params).map_err(|e| AnalyticsError::Rejected {
            event: name.to_string(),
            reason: e.to_string(),
        })?;
        info!(
            event = %name,
            measurement_id = self.measurement_id.as_deref().unwrap_or("-"),
            params = %params,
            "Analytics event"
        );
        Ok(())
    }
}

/// Keeps every event in memory. Used to assert on tracking in tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingAnalytics {
    events: Arc<Mutex<Vec<(String, EventParams)>>>,
}

impl RecordingAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events recorded so far, oldest first.
    pub fn events(&self) -> Vec<(String, EventParams)> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Recorded events with the given name.
    pub fn events_named(&self, name: &str) -> Vec<EventParams> {
        self.events()
            .into_iter()
            .filter(|(event, _)| event == name)
            .map(|(_, params)| params)
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl AnalyticsSink for RecordingAnalytics {
    fn track_event(&self, name: &str, params: &EventParams) -> Result<(), AnalyticsError> {
        self.events
            .lock()
            .map_err(|_| AnalyticsError::Unavailable("recorder lock poisoned".to_string()))?
            .push((name.to_string(), params.clone()));
        Ok(())
    }
}

// =============================================================================
// Service
// =============================================================================

/// Failure-tolerant front for an [`AnalyticsSink`], scoped to one session.
#[derive(Clone)]
pub struct AnalyticsService {
    sink: Arc<dyn AnalyticsSink>,
    enabled: bool,
    session_id: Uuid,
    session_start: DateTime<Utc>,
}

impl std::fmt::Debug for AnalyticsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsService")
            .field("enabled", &self.enabled)
            .field("session_id", &self.session_id)
            .field("session_start", &self.session_start)
            .finish_non_exhaustive()
    }
}

impl AnalyticsService {
    /// Starts a new session forwarding to `sink`.
    pub fn new(sink: Arc<dyn AnalyticsSink>) -> Self {
        AnalyticsService {
            sink,
            enabled: true,
            session_id: Uuid::new_v4(),
            session_start: Utc::now(),
        }
    }

    /// A service that only logs events at debug level.
    pub fn disabled() -> Self {
        Self::new(Arc::new(TracingAnalytics::default())).with_enabled(false)
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Time elapsed since this session started.
    pub fn session_duration(&self) -> Duration {
        Utc::now() - self.session_start
    }

    /// Sends one event. Never fails.
    pub fn track_event(&self, name: &str, params: EventParams) {
        if !self.enabled {
            debug!(event = %name, params = ?params, "Analytics disabled, event not sent");
            return;
        }

        if let Err(e) = self.sink.track_event(name, &params) {
            warn!(event = %name, error = %e, "Analytics event dropped");
        }
    }

    pub fn track_page_view(&self, page_path: &str) {
        self.track_event(PAGE_VIEW, params([("page_path", Value::from(page_path))]));
    }

    pub fn track_form_submission(&self, form_type: &str) {
        self.track_event(FORM_SUBMIT, params([("form_type", Value::from(form_type))]));
    }

    pub fn track_recipe_interaction(&self, action: &str, recipe_id: &str) {
        self.track_event(
            RECIPE_INTERACTION,
            params([
                ("action", Value::from(action)),
                ("recipe_id", Value::from(recipe_id)),
            ]),
        );
    }

    pub fn track_search(&self, search_term: &str, result_count: usize) {
        self.track_event(
            SEARCH,
            params([
                ("search_term", Value::from(search_term)),
                ("result_count", Value::from(result_count)),
            ]),
        );
    }

    pub fn track_filter(&self, category: &str) {
        self.track_event(RECIPE_FILTER, params([("category", Value::from(category))]));
    }
}

fn params<const N: usize>(pairs: [(&str, Value); N]) -> EventParams {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
