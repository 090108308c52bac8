//! Backend setup health contract.
//!
//! Schema provisioning is handled outside the core; the core only consumes a
//! healthy/unhealthy signal plus a fixed set of named component checks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;

/// Result of the backend's `diagnose_database_setup` check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DbDiagnostics {
    pub profiles_table_exists: bool,
    pub os_table_exists: bool,
    pub tecnicos_table_exists: bool,
    pub settings_table_exists: bool,
    pub ensure_profile_fn_exists: bool,
}

impl DbDiagnostics {
    /// All components present.
    pub fn all_present() -> Self {
        Self {
            profiles_table_exists: true,
            os_table_exists: true,
            tecnicos_table_exists: true,
            settings_table_exists: true,
            ensure_profile_fn_exists: true,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Names of the failing checks.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("profiles_table", self.profiles_table_exists),
            ("os_table", self.os_table_exists),
            ("tecnicos_table", self.tecnicos_table_exists),
            ("settings_table", self.settings_table_exists),
            ("ensure_profile_fn", self.ensure_profile_fn_exists),
        ]
        .into_iter()
        .filter_map(|(name, ok)| (!ok).then_some(name))
        .collect()
    }
}

/// Overall setup state surfaced to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupHealth {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<DbDiagnostics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SetupHealth {
    pub fn healthy() -> Self {
        Self {
            healthy: true,
            diagnostics: None,
            error: None,
        }
    }

    pub fn unhealthy(error: impl Into<String>, diagnostics: Option<DbDiagnostics>) -> Self {
        Self {
            healthy: false,
            diagnostics,
            error: Some(error.into()),
        }
    }
}

impl Default for SetupHealth {
    fn default() -> Self {
        Self::healthy()
    }
}

/// Runs the backend's component checks.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn diagnose(&self) -> StoreResult<DbDiagnostics>;
}
