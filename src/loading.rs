// ⏳ Loading State - per-resource progress/error tracking
//
// Owned by whoever drives the requests (CLI run, TUI app, server state)
// and dropped with it. Unknown resources read as idle.

use crate::error::Resource;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LoadState {
    pub is_loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    /// Consecutive failures since the last success
    pub retry_count: u32,
}

#[derive(Debug, Default)]
pub struct LoadTracker {
    states: HashMap<Resource, LoadState>,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state (idle default for resources never touched)
    pub fn state(&self, resource: Resource) -> LoadState {
        self.states.get(&resource).cloned().unwrap_or_default()
    }

    pub fn is_loading(&self, resource: Resource) -> bool {
        self.states.get(&resource).map_or(false, |s| s.is_loading)
    }

    pub fn any_loading(&self) -> bool {
        self.states.values().any(|s| s.is_loading)
    }

    /// Starting a load clears the previous error; stopping keeps it
    pub fn set_loading(&mut self, resource: Resource, loading: bool) {
        let state = self.states.entry(resource).or_default();
        state.is_loading = loading;
        if loading {
            state.error = None;
        }
    }

    pub fn set_error(&mut self, resource: Resource, message: &str) {
        let state = self.states.entry(resource).or_default();
        state.is_loading = false;
        state.error = Some(message.to_string());
        state.retry_count += 1;
    }

    pub fn set_success(&mut self, resource: Resource) {
        self.set_success_at(resource, Utc::now());
    }

    pub fn set_success_at(&mut self, resource: Resource, at: DateTime<Utc>) {
        let state = self.states.entry(resource).or_default();
        state.is_loading = false;
        state.error = None;
        state.last_updated = Some(at);
        state.retry_count = 0;
    }

    pub fn clear_error(&mut self, resource: Resource) {
        if let Some(state) = self.states.get_mut(&resource) {
            state.error = None;
        }
    }

    pub fn reset(&mut self, resource: Resource) {
        self.states.insert(resource, LoadState::default());
    }

    /// Snapshot keyed by resource name, for status reporting
    pub fn snapshot(&self) -> HashMap<&'static str, LoadState> {
        self.states
            .iter()
            .map(|(resource, state)| (resource.as_str(), state.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untouched_resource_is_idle() {
        let tracker = LoadTracker::new();
        assert_eq!(tracker.state(Resource::Banks), LoadState::default());
        assert!(!tracker.any_loading());
    }

    #[test]
    fn test_error_then_success() {
        let mut tracker = LoadTracker::new();

        tracker.set_loading(Resource::Rates, true);
        assert!(tracker.is_loading(Resource::Rates));

        tracker.set_error(Resource::Rates, "Erro do servidor");
        tracker.set_loading(Resource::Rates, true);
        tracker.set_error(Resource::Rates, "Erro do servidor");

        let state = tracker.state(Resource::Rates);
        assert!(!state.is_loading);
        assert_eq!(state.retry_count, 2);
        assert_eq!(state.error.as_deref(), Some("Erro do servidor"));

        tracker.set_success(Resource::Rates);
        let state = tracker.state(Resource::Rates);
        assert_eq!(state.retry_count, 0);
        assert!(state.error.is_none());
        assert!(state.last_updated.is_some());
    }

    #[test]
    fn test_loading_clears_error_but_stopping_keeps_it() {
        let mut tracker = LoadTracker::new();
        tracker.set_error(Resource::PostalCode, "CEP não encontrado");

        tracker.set_loading(Resource::PostalCode, false);
        assert!(tracker.state(Resource::PostalCode).error.is_some());

        tracker.set_loading(Resource::PostalCode, true);
        assert!(tracker.state(Resource::PostalCode).error.is_none());
        // retry count survives until a success
        assert_eq!(tracker.state(Resource::PostalCode).retry_count, 1);
    }

    #[test]
    fn test_clear_error_and_reset() {
        let mut tracker = LoadTracker::new();
        tracker.set_error(Resource::Banks, "falhou");
        tracker.clear_error(Resource::Banks);
        assert!(tracker.state(Resource::Banks).error.is_none());
        assert_eq!(tracker.state(Resource::Banks).retry_count, 1);

        tracker.reset(Resource::Banks);
        assert_eq!(tracker.state(Resource::Banks), LoadState::default());
    }

    #[test]
    fn test_resources_are_independent() {
        let mut tracker = LoadTracker::new();
        tracker.set_loading(Resource::Banks, true);
        assert!(!tracker.is_loading(Resource::RegistryNumber));
        assert!(tracker.any_loading());
        assert!(tracker.snapshot().contains_key("banks"));
    }
}
