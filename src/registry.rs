//! Named breaker registry.
//!
//! # Responsibilities
//! - One breaker per protected dependency, created on first use
//! - Per-name strategy overrides from configuration
//! - State snapshot for diagnostics
//!
//! # Design Decisions
//! - Per-dependency breakers, never a global one
//! - Concurrent access through `DashMap`; breakers are shared as `Arc<Breaker>`

use std::sync::Arc;

use dashmap::DashMap;

use crate::breaker::{Breaker, State};
use crate::config::{BreakerSettings, Strategy};
use crate::observability::{AlertSink, TracingAlertSink};

/// Registry of breakers keyed by name.
pub struct BreakerRegistry {
    breakers: DashMap<String, Arc<Breaker>>,
    settings: BreakerSettings,
    default_strategy: Strategy,
    alerts: Arc<dyn AlertSink>,
}

impl BreakerRegistry {
    /// Registry where every breaker uses `default_strategy`.
    pub fn new(default_strategy: Strategy) -> Self {
        Self {
            breakers: DashMap::new(),
            settings: BreakerSettings::default(),
            default_strategy,
            alerts: Arc::new(TracingAlertSink),
        }
    }

    /// Registry honoring the defaults and per-name entries of `settings`.
    pub fn from_config(settings: BreakerSettings) -> Self {
        let default_strategy = Strategy::from(settings.defaults.clone());
        Self {
            settings,
            ..Self::new(default_strategy)
        }
    }

    /// Replace the alert sink handed to breakers created from now on.
    pub fn with_alert_sink(mut self, alerts: Arc<dyn AlertSink>) -> Self {
        self.alerts = alerts;
        self
    }

    /// Breaker for `name`, created on first use.
    pub fn get_or_create(&self, name: &str) -> Arc<Breaker> {
        if let Some(existing) = self.breakers.get(name) {
            return Arc::clone(existing.value());
        }

        let entry = self.breakers.entry(name.to_string()).or_insert_with(|| {
            let strategy = self.strategy_for(name);
            tracing::info!(breaker = %name, "Registering circuit breaker");
            Arc::new(Breaker::with_alert_sink(name, strategy, Arc::clone(&self.alerts)))
        });
        Arc::clone(entry.value())
    }

    fn strategy_for(&self, name: &str) -> Strategy {
        self.settings
            .override_for(name)
            .unwrap_or(self.default_strategy)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Breaker>> {
        self.breakers.get(name).map(|r| Arc::clone(r.value()))
    }

    /// Forget a breaker. Its probe is cancelled once the last handle is dropped.
    pub fn remove(&self, name: &str) -> Option<Arc<Breaker>> {
        self.breakers.remove(name).map(|(_, breaker)| breaker)
    }

    /// Reset every breaker to Closed.
    pub fn reset_all(&self) {
        for entry in self.breakers.iter() {
            entry.value().reset();
        }
    }

    /// `(name, state)` for every breaker, sorted by name.
    pub fn snapshot(&self) -> Vec<(String, State)> {
        let mut states: Vec<_> = self
            .breakers
            .iter()
            .map(|r| (r.key().clone(), r.value().state()))
            .collect();
        states.sort_by(|a, b| a.0.cmp(&b.0));
        states
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}
