use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use apikit::TracedClient;
use tracing::{debug, info};
use url::Url;

use crate::config::PersonnelConfig;
use crate::contract::client::{AuthApi, PersonnelApi};
use crate::domain::cache::DataCache;
use crate::domain::ports::{Clock, TokenStore};
use crate::domain::session::{Session, SessionHandle};
use crate::domain::workspace::Workspace;
use crate::infra::http::{HttpAuthClient, HttpPersonnelClient};

/// Where the two remote services live and how long a call may take.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub auth_base_url: String,
    pub api_base_url: String,
    pub timeout: Duration,
}

/// Wire the HTTP adapters, session and cache into a [`Workspace`].
pub fn build_workspace(
    cfg: &PersonnelConfig,
    endpoints: &Endpoints,
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
) -> anyhow::Result<Workspace> {
    info!("Initializing personnel workspace");

    let auth_base = Url::parse(&endpoints.auth_base_url)
        .with_context(|| format!("invalid auth base URL '{}'", endpoints.auth_base_url))?;
    let api_base = Url::parse(&endpoints.api_base_url)
        .with_context(|| format!("invalid API base URL '{}'", endpoints.api_base_url))?;
    debug!(
        auth = %auth_base,
        api = %api_base,
        timeout_ms = endpoints.timeout.as_millis() as u64,
        ttl_sec = cfg.cache_ttl_sec,
        "Resolved personnel endpoints"
    );

    let http = TracedClient::with_timeout(Some(endpoints.timeout))
        .context("failed to build HTTP client")?;
    let handle = SessionHandle::default();

    let auth: Arc<dyn AuthApi> = Arc::new(HttpAuthClient::new(http.clone(), auth_base));
    let api: Arc<dyn PersonnelApi> = Arc::new(
        HttpPersonnelClient::new(http, api_base, Arc::new(handle.clone()))
            .with_people_fetch_size(cfg.people_fetch_size),
    );

    let session = Session::new(auth, api.clone(), store, handle.clone());
    let cache = DataCache::new(
        api.clone(),
        handle,
        clock.clone(),
        cfg.cache_ttl(),
        endpoints.timeout,
    );
    Ok(Workspace::new(session, cache, api, clock))
}
