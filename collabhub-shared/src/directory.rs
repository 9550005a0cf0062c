//! Tenant resolution
//!
//! Maps the identity provider's organization id onto the mirrored
//! [`Organization`] row. An organization created at the provider is not
//! visible here until its webhook has been processed, so a miss is reported
//! as `NotFound("Organization")`, which [`ServiceError::is_retryable`]
//! treats as transient.

use std::sync::Arc;

use tracing::debug;

use crate::error::{ServiceError, ServiceResult};
use crate::models::Organization;
use crate::store::Store;

#[derive(Clone)]
pub struct OrganizationDirectory {
    store: Arc<dyn Store>,
}

impl OrganizationDirectory {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Looks up the organization mirrored for `external_org_id`
    pub async fn resolve(&self, external_org_id: &str) -> ServiceResult<Organization> {
        match self
            .store
            .find_organization_by_external_id(external_org_id)
            .await?
        {
            Some(org) => Ok(org),
            None => {
                debug!(external_org_id = %external_org_id, "Organization not mirrored yet");
                Err(ServiceError::not_found("Organization"))
            }
        }
    }
}
