//! Shared-secret admin gate for import and export.
//!
//! Access is requested with an `admin` query parameter, e.g.
//! `?admin=s3cret` or a full URL carrying it. When a secret is configured
//! (config `admin_key`, else the `WEEKLY_DIGEST_ADMIN_KEY` value baked in at
//! build time) the parameter must equal it. With no secret configured the
//! bare flag (`?admin`, `?admin=1`, `?admin=true`) is enough.
//!
//! A grant is remembered in the persistence adapter and honoured on later
//! runs without the parameter.

use std::sync::Arc;

use tracing::{info, warn};
use url::form_urlencoded;

use crate::storage::{ADMIN_KEY, KeyValueStore, read_json, write_json};

const ADMIN_PARAM: &str = "admin";

pub struct AdminGate {
    secret: Option<String>,
    kv: Arc<dyn KeyValueStore>,
}

impl AdminGate {
    /// Build a gate. `configured` wins over the build-time secret; blank
    /// values count as unset.
    pub fn new(configured: Option<String>, kv: Arc<dyn KeyValueStore>) -> Self {
        let secret = configured
            .filter(|s| !s.trim().is_empty())
            .or_else(|| option_env!("WEEKLY_DIGEST_ADMIN_KEY").map(str::to_string))
            .filter(|s| !s.trim().is_empty());
        Self { secret, kv }
    }

    /// Whether a grant from an earlier run is on record.
    pub fn remembered(&self) -> bool {
        match read_json::<bool>(self.kv.as_ref(), ADMIN_KEY) {
            Ok(flag) => flag.unwrap_or(false),
            Err(e) => {
                warn!(error = %e, "Admin flag unreadable");
                false
            }
        }
    }

    /// Whether `query` alone grants access.
    pub fn grants(&self, query: &str) -> bool {
        let query = query.split_once('?').map_or(query, |(_, q)| q);
        let query = query.split('#').next().unwrap_or_default();

        let Some(value) = form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == ADMIN_PARAM)
            .map(|(_, v)| v.into_owned())
        else {
            return false;
        };

        match &self.secret {
            Some(secret) => value == *secret,
            None => matches!(value.to_ascii_lowercase().as_str(), "" | "1" | "true" | "yes"),
        }
    }

    /// Check access, remembering a fresh grant.
    pub fn check(&self, query: Option<&str>) -> bool {
        if self.remembered() {
            return true;
        }
        let Some(query) = query else {
            return false;
        };
        if !self.grants(query) {
            warn!("Admin access denied");
            return false;
        }
        if let Err(e) = write_json(self.kv.as_ref(), ADMIN_KEY, &true) {
            warn!(error = %e, "Could not remember admin grant");
        }
        info!("Admin access granted");
        true
    }
}
