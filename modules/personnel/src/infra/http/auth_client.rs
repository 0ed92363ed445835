use apikit::TracedClient;
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use crate::contract::client::AuthApi;
use crate::contract::error::{PersonnelError, PersonnelResult};
use crate::contract::model::{AuthGrant, Identity, Role};
use crate::infra::http::response;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Body of both `/auth/login` and `/auth/validate`.
#[derive(Deserialize)]
struct TokenReply {
    #[serde(default)]
    token: Option<String>,
    email: String,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    roles: Vec<String>,
}

impl TokenReply {
    fn identity(&self) -> Identity {
        let role = self
            .role
            .as_deref()
            .or(self.roles.first().map(String::as_str))
            .map(Role::parse)
            .unwrap_or_else(|| Role::Unknown(String::new()));
        Identity::new(self.email.clone(), role)
    }
}

/// Adapter for the authentication service.
pub struct HttpAuthClient {
    client: TracedClient,
    base: Url,
}

impl HttpAuthClient {
    pub fn new(client: TracedClient, base: Url) -> Self {
        Self { client, base }
    }
}

#[async_trait]
impl AuthApi for HttpAuthClient {
    #[instrument(name = "personnel.http.auth.login", skip_all, fields(auth_base = %self.base))]
    async fn login(&self, email: &str, password: &str) -> PersonnelResult<AuthGrant> {
        let url = response::join(&self.base, &["auth", "login"])?;
        let resp = self
            .client
            .send(
                self.client
                    .request(Method::POST, url.as_str(), None)
                    .json(&LoginRequest { email, password }),
            )
            .await?;

        if matches!(
            resp.status(),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Err(PersonnelError::InvalidCredentials);
        }
        let reply: TokenReply = response::json(resp, None).await?;
        let identity = reply.identity();
        let token = reply
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| PersonnelError::decode("login reply carries no token"))?;
        Ok(AuthGrant { token, identity })
    }

    #[instrument(name = "personnel.http.auth.validate", skip_all, fields(auth_base = %self.base))]
    async fn validate(&self, token: &str) -> PersonnelResult<Identity> {
        let url = response::join(&self.base, &["auth", "validate"])?;
        let resp = self
            .client
            .send(
                self.client
                    .request(Method::POST, url.as_str(), None)
                    .form(&[("token", token)]),
            )
            .await?;
        let reply: TokenReply = response::json(resp, None).await?;
        Ok(reply.identity())
    }
}
