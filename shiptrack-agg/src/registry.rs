//! Provider registry and identifier classification
//!
//! The registry is an explicit value constructed once at startup from
//! resolved credentials and handed to the dispatcher; there is no global
//! adapter table. Classification iterates adapters in registration order and
//! the first matching pattern wins, so the order below is part of the
//! observable contract:
//!
//! 1. maersk (`^[A-Z]{4}\d{7}$`, ISO 6346 container)
//! 2. cma-cgm (`^CMDU\d{7,10}$`, bill of lading)
//! 3. ups (`^1Z[A-Z0-9]{16}$`)
//! 4. dhl (`^\d{10}$`, waybill)
//!
//! `CMDU` + exactly 7 digits matches both the container and bill-of-lading
//! shapes; registration order routes it to maersk. Ambiguous identifiers are
//! an accepted limitation of shape-based dispatch, not a guarantee of
//! correctness.

use std::sync::Arc;

use shiptrack_common::config::ResolvedCredentials;

use crate::providers::{
    CarrierAdapter, CmaCgmClient, DhlClient, MaerskClient, UpsClient,
};

/// Ordered collection of ground/ocean provider adapters
pub struct ProviderRegistry {
    adapters: Vec<Arc<dyn CarrierAdapter>>,
}

impl ProviderRegistry {
    /// Build a registry from an explicit adapter list (registration order
    /// is preserved and significant)
    pub fn new(adapters: Vec<Arc<dyn CarrierAdapter>>) -> Self {
        Self { adapters }
    }

    /// Build the standard registry in the documented registration order
    pub fn standard(credentials: &ResolvedCredentials) -> shiptrack_common::Result<Self> {
        Ok(Self::new(vec![
            Arc::new(MaerskClient::new(credentials.maersk.clone())?),
            Arc::new(CmaCgmClient::new(credentials.cmacgm.clone())?),
            Arc::new(UpsClient::new(credentials.ups.clone())?),
            Arc::new(DhlClient::new(credentials.dhl.clone())?),
        ]))
    }

    /// Classify an identifier against registered patterns, first match wins
    ///
    /// Matching is whitespace- and case-insensitive; the identifier itself
    /// is never mutated. `None` means "cannot auto-detect", which callers
    /// must treat as a routing outcome, not an error.
    pub fn classify(&self, identifier: &str) -> Option<Arc<dyn CarrierAdapter>> {
        let normalized = identifier.trim().to_uppercase();
        self.adapters
            .iter()
            .find(|adapter| adapter.pattern().is_match(&normalized))
            .cloned()
    }

    /// Look up a provider by name (case-insensitive)
    pub fn by_name(&self, name: &str) -> Option<Arc<dyn CarrierAdapter>> {
        let wanted = name.trim().to_lowercase();
        self.adapters
            .iter()
            .find(|adapter| adapter.name() == wanted)
            .cloned()
    }

    /// Registered provider names in registration order
    pub fn names(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
