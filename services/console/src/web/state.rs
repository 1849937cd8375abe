//! services/console/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use swim_admin_core::aggregator::FetchAggregator;
use swim_admin_core::ports::AdminApiService;
use swim_admin_core::query::FilterState;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<dyn AdminApiService>,
    pub config: Arc<Config>,
    /// Carries the fan-out bound and the shutdown token for every aggregation.
    pub aggregator: FetchAggregator,
}

impl AppState {
    pub fn new(api: Arc<dyn AdminApiService>, config: Arc<Config>) -> Self {
        let aggregator = FetchAggregator::new().with_concurrency(config.fanout_limit);
        Self {
            api,
            config,
            aggregator,
        }
    }

    /// A fresh filter state using the configured page size.
    pub fn default_filter(&self) -> FilterState {
        FilterState::with_page_size(self.config.default_page_size)
    }
}
