//! Full reconciliation against the identity provider
//!
//! Webhooks keep the mirror current; this job repairs it after missed
//! deliveries or when a deployment starts from an empty store. It walks every
//! organization, every membership and every member user through the provider's
//! REST API and applies the same idempotent upserts the webhook path uses.
//! A failing item is recorded and skipped; the run always completes.
//!
//! # Example
//!
//! ```no_run
//! use collabhub_shared::store::memory::MemoryStore;
//! use collabhub_shared::sync::{HttpIdentityProviderClient, Reconciler};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpIdentityProviderClient::new("https://api.clerk.com", "sk_test_...");
//! let report = Reconciler::new(Arc::new(client), Arc::new(MemoryStore::new()))
//!     .run()
//!     .await?;
//! println!("{} organizations, {} failures", report.organizations, report.failures.len());
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{info, warn};

use crate::store::Store;
use crate::webhook::event::{MembershipData, OrganizationData, UserData};

const PAGE_SIZE: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Identity provider request failed: {0}")]
    Request(String),

    #[error("Identity provider returned {status}: {message}")]
    Rejected { status: u16, message: String },
}

#[async_trait]
pub trait IdentityProviderClient: Send + Sync {
    async fn list_organizations(&self) -> Result<Vec<OrganizationData>, ProviderError>;

    async fn list_memberships(&self, org_id: &str) -> Result<Vec<MembershipData>, ProviderError>;

    async fn get_user(&self, user_id: &str) -> Result<UserData, ProviderError>;
}

/// Provider backend API client (`/v1/organizations`, `/v1/users`)
#[derive(Clone)]
pub struct HttpIdentityProviderClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct Page<T> {
    data: Vec<T>,
    #[serde(default)]
    total_count: Option<usize>,
}

impl HttpIdentityProviderClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ProviderError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))
    }

    async fn paginate<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ProviderError> {
        let mut items = Vec::new();
        loop {
            let page: Page<T> = self
                .get(
                    path,
                    &[
                        ("limit", PAGE_SIZE.to_string()),
                        ("offset", items.len().to_string()),
                    ],
                )
                .await?;

            let received = page.data.len();
            items.extend(page.data);

            let done = match page.total_count {
                Some(total) => items.len() >= total,
                None => received < PAGE_SIZE,
            };
            if done || received == 0 {
                return Ok(items);
            }
        }
    }
}

#[async_trait]
impl IdentityProviderClient for HttpIdentityProviderClient {
    async fn list_organizations(&self) -> Result<Vec<OrganizationData>, ProviderError> {
        self.paginate("/v1/organizations").await
    }

    async fn list_memberships(&self, org_id: &str) -> Result<Vec<MembershipData>, ProviderError> {
        self.paginate(&format!("/v1/organizations/{}/memberships", org_id))
            .await
    }

    async fn get_user(&self, user_id: &str) -> Result<UserData, ProviderError> {
        self.get(&format!("/v1/users/{}", user_id), &[]).await
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub organizations: usize,
    pub users: usize,
    pub memberships: usize,
    pub failures: Vec<String>,
}

pub struct Reconciler {
    provider: Arc<dyn IdentityProviderClient>,
    store: Arc<dyn Store>,
}

impl Reconciler {
    pub fn new(provider: Arc<dyn IdentityProviderClient>, store: Arc<dyn Store>) -> Self {
        Self { provider, store }
    }

    /// Fails only when the organization list itself cannot be fetched
    pub async fn run(&self) -> Result<SyncReport, ProviderError> {
        let mut report = SyncReport::default();
        let mut synced_users = HashSet::new();

        let organizations = self.provider.list_organizations().await?;
        info!(count = organizations.len(), "Reconciling organizations");

        for data in organizations {
            let external_id = data.id.clone();
            let org = match self.store.upsert_organization(data.into_upsert()).await {
                Ok(org) => org,
                Err(err) => {
                    warn!(external_org_id = %external_id, error = %err, "Organization sync failed");
                    report.failures.push(format!("organization {}: {}", external_id, err));
                    continue;
                }
            };
            report.organizations += 1;

            let memberships = match self.provider.list_memberships(&external_id).await {
                Ok(memberships) => memberships,
                Err(err) => {
                    warn!(external_org_id = %external_id, error = %err, "Membership listing failed");
                    report.failures.push(format!("memberships of {}: {}", external_id, err));
                    continue;
                }
            };

            for membership in memberships {
                let Ok(user_id) = membership.user_id().map(str::to_string) else {
                    report
                        .failures
                        .push(format!("membership in {}: no user id", external_id));
                    continue;
                };

                if !synced_users.contains(&user_id) {
                    if let Err(message) = self.sync_user(&user_id).await {
                        warn!(user_id = %user_id, error = %message, "User sync failed");
                        report.failures.push(format!("user {}: {}", user_id, message));
                        continue;
                    }
                    synced_users.insert(user_id.clone());
                    report.users += 1;
                }

                match self
                    .store
                    .upsert_org_membership(org.id, &user_id, &membership.role())
                    .await
                {
                    Ok(_) => report.memberships += 1,
                    Err(err) => {
                        warn!(org_id = %org.id, user_id = %user_id, error = %err, "Membership sync failed");
                        report
                            .failures
                            .push(format!("membership {} in {}: {}", user_id, external_id, err));
                    }
                }
            }
        }

        info!(
            organizations = report.organizations,
            users = report.users,
            memberships = report.memberships,
            failures = report.failures.len(),
            "Reconciliation finished"
        );
        Ok(report)
    }

    async fn sync_user(&self, user_id: &str) -> Result<(), String> {
        let data = self
            .provider
            .get_user(user_id)
            .await
            .map_err(|e| e.to_string())?;
        let user = data.into_upsert().map_err(|e| e.to_string())?;
        self.store
            .upsert_user(user)
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}
