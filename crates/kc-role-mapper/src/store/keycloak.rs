//! Keycloak Admin REST API adapter.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::MapperConfig;
use crate::error::{MapperError, MapperResult};
use crate::model::{Group, Realm, Role};

use super::IdentityStore;

/// Page size used when listing groups.
const PAGE_SIZE: usize = 100;

/// Token endpoint response. Only the access token is used.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Identity store backed by a Keycloak server.
///
/// Authenticates once with the OAuth2 password grant and reuses the access
/// token for every later call. All calls are scoped to one realm.
#[derive(Debug, Clone)]
pub struct KeycloakClient {
    client: reqwest::Client,
    base_url: String,
    realm: String,
    token: String,
}

impl KeycloakClient {
    /// Authenticates against the server described by `config`.
    ///
    /// ## Errors
    ///
    /// Returns `MapperError::Auth` if the token request fails or is rejected.
    pub async fn connect(config: &MapperConfig) -> MapperResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let base_url = config.base_url();

        let token_url = format!(
            "{}/realms/{}/protocol/openid-connect/token",
            base_url,
            urlencoding::encode(&config.auth_realm)
        );
        tracing::debug!(url = %token_url, user = %config.username, "requesting admin token");

        let params = [
            ("grant_type", "password"),
            ("client_id", config.client_id.as_str()),
            ("username", config.username.as_str()),
            ("password", config.password.as_str()),
        ];
        let response = client
            .post(&token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| MapperError::Auth(format!("token request to {token_url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(MapperError::Auth(format!(
                "token request rejected ({}): {}",
                status.as_u16(),
                message
            )));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| MapperError::Auth(format!("malformed token response: {e}")))?;

        Ok(Self {
            client,
            base_url,
            realm: config.realm.clone(),
            token: token.access_token,
        })
    }

    /// Gets the server base URL (including the context path).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn realm_url(&self, path: &str) -> String {
        format!(
            "{}/admin/realms/{}{}",
            self.base_url,
            urlencoding::encode(&self.realm),
            path
        )
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> MapperResult<reqwest::Response> {
        tracing::debug!(%method, %url, "admin API request");
        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Makes a GET request, mapping 404 to `None`.
    async fn get_optional<T: DeserializeOwned>(&self, url: &str) -> MapperResult<Option<T>> {
        let response = self.send::<()>(Method::GET, url, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        handle_response(response).await.map(Some)
    }

    /// Makes a GET request.
    async fn get<T: DeserializeOwned>(&self, url: &str) -> MapperResult<T> {
        let response = self.send::<()>(Method::GET, url, None).await?;
        handle_response(response).await
    }

    /// Fetches every page of a group listing.
    async fn get_all_groups(&self, url: &str) -> MapperResult<Vec<Group>> {
        let mut groups = Vec::new();
        loop {
            let page_url = format!("{url}&first={}&max={PAGE_SIZE}", groups.len());
            let page: Vec<Group> = self.get(&page_url).await?;
            let done = page.len() < PAGE_SIZE;
            groups.extend(page);
            if done {
                return Ok(groups);
            }
        }
    }

    /// Fills in children that the listing reported but did not inline.
    fn load_children<'a>(
        &'a self,
        groups: &'a mut [Group],
    ) -> Pin<Box<dyn Future<Output = MapperResult<()>> + Send + 'a>> {
        Box::pin(async move {
            for group in groups.iter_mut() {
                if group.has_unloaded_children() {
                    let url = self.realm_url(&format!(
                        "/groups/{}/children?briefRepresentation=false",
                        urlencoding::encode(&group.id)
                    ));
                    group.sub_groups = self.get_all_groups(&url).await?;
                }
                self.load_children(&mut group.sub_groups).await?;
            }
            Ok(())
        })
    }

    fn role_mappings_url(&self, group_id: &str) -> String {
        self.realm_url(&format!(
            "/groups/{}/role-mappings/realm",
            urlencoding::encode(group_id)
        ))
    }
}

#[async_trait]
impl IdentityStore for KeycloakClient {
    fn realm(&self) -> &str {
        &self.realm
    }

    async fn get_realm(&self, name: &str) -> MapperResult<Realm> {
        let url = format!(
            "{}/admin/realms/{}",
            self.base_url,
            urlencoding::encode(name)
        );
        self.get_optional(&url)
            .await?
            .ok_or_else(|| MapperError::not_found("Realm", name))
    }

    async fn list_groups(&self) -> MapperResult<Vec<Group>> {
        let url = self.realm_url("/groups?briefRepresentation=false");
        let mut groups = self.get_all_groups(&url).await?;
        self.load_children(&mut groups).await?;
        Ok(groups)
    }

    async fn get_group(&self, id: &str) -> MapperResult<Group> {
        let url = self.realm_url(&format!("/groups/{}", urlencoding::encode(id)));
        self.get_optional(&url)
            .await?
            .ok_or_else(|| MapperError::not_found("Group", id))
    }

    async fn find_role_by_name(&self, name: &str) -> MapperResult<Option<Role>> {
        let url = self.realm_url(&format!("/roles/{}", urlencoding::encode(name)));
        self.get_optional(&url).await
    }

    async fn create_role(&self, name: &str) -> MapperResult<Role> {
        let url = self.realm_url("/roles");
        let response = self
            .send(Method::POST, &url, Some(&Role::named(name)))
            .await?;
        if response.status() == StatusCode::CONFLICT {
            return Err(MapperError::already_exists("Role", name));
        }
        handle_empty_response(response).await?;

        self.find_role_by_name(name)
            .await?
            .ok_or_else(|| MapperError::not_found("Role", name))
    }

    async fn add_realm_roles_to_group(&self, group_id: &str, roles: &[Role]) -> MapperResult<()> {
        let url = self.role_mappings_url(group_id);
        let response = self.send(Method::POST, &url, Some(roles)).await?;
        handle_empty_response(response).await
    }

    async fn remove_realm_roles_from_group(
        &self,
        group_id: &str,
        roles: &[Role],
    ) -> MapperResult<()> {
        let url = self.role_mappings_url(group_id);
        let response = self.send(Method::DELETE, &url, Some(roles)).await?;
        handle_empty_response(response).await
    }
}

/// Handles a response with a body.
async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> MapperResult<T> {
    let status = response.status();

    if status.is_success() {
        response.json().await.map_err(MapperError::Http)
    } else {
        Err(api_error(response).await)
    }
}

/// Handles a response without a body.
async fn handle_empty_response(response: reqwest::Response) -> MapperResult<()> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(api_error(response).await)
    }
}

async fn api_error(response: reqwest::Response) -> MapperError {
    let status = response.status();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    MapperError::Api {
        status: status.as_u16(),
        message,
    }
}
