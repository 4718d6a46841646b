//! Idempotent get-or-create of the storage bucket and the translation role.
//!
//! Provisioning runs once per batch, before any per-item work. Any error
//! other than the expected "role not found" aborts the run.

use std::sync::Arc;

use serde_json::json;
use tracing::info;
use transx_storage::ObjectStore;

use crate::error::{ServiceError, WorkerError, WorkerResult};
use crate::services::IdentityService;

/// Principal allowed to assume the provisioned role.
pub const TRANSLATE_SERVICE_PRINCIPAL: &str = "translate.amazonaws.com";

/// Managed policies attached to a newly created role.
pub const ROLE_POLICY_ARNS: [&str; 2] = [
    "arn:aws:iam::aws:policy/AmazonTranscribeFullAccess",
    "arn:aws:iam::aws:policy/AmazonS3FullAccess",
];

/// Trust policy letting the translation service assume the role.
pub fn trust_policy_document() -> String {
    json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Effect": "Allow",
                "Principal": { "Service": TRANSLATE_SERVICE_PRINCIPAL },
                "Action": "sts:AssumeRole"
            }
        ]
    })
    .to_string()
}

/// Shared resources resolved once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedResources {
    pub bucket: String,
    pub role_arn: String,
}

pub struct ResourceProvisioner {
    store: Arc<dyn ObjectStore>,
    identity: Arc<dyn IdentityService>,
}

impl ResourceProvisioner {
    pub fn new(store: Arc<dyn ObjectStore>, identity: Arc<dyn IdentityService>) -> Self {
        Self { store, identity }
    }

    /// Ensure both the bucket and the role exist.
    pub async fn provision(
        &self,
        bucket: &str,
        role_name: &str,
    ) -> WorkerResult<ProvisionedResources> {
        self.ensure_bucket(bucket).await?;
        let role_arn = self.ensure_role(role_name).await?;
        Ok(ProvisionedResources {
            bucket: bucket.to_string(),
            role_arn,
        })
    }

    /// Create the bucket unless it is already listed.
    pub async fn ensure_bucket(&self, name: &str) -> WorkerResult<()> {
        let buckets = self
            .store
            .list_buckets()
            .await
            .map_err(|e| WorkerError::provisioning(format!("listing buckets: {}", e)))?;

        if buckets.iter().any(|b| b == name) {
            info!(bucket = name, "Bucket found");
            return Ok(());
        }

        info!(bucket = name, "Creating bucket");
        self.store
            .create_bucket(name)
            .await
            .map_err(|e| WorkerError::provisioning(format!("creating bucket {}: {}", name, e)))
    }

    /// Look the role up by name, creating it on first use. Returns its ARN.
    pub async fn ensure_role(&self, name: &str) -> WorkerResult<String> {
        match self.identity.get_role(name).await {
            Ok(arn) => {
                info!(role = name, "Role found");
                Ok(arn)
            }
            Err(ServiceError::RoleNotFound(_)) => self.create_role(name).await,
            Err(e) => Err(WorkerError::provisioning(format!(
                "looking up role {}: {}",
                name, e
            ))),
        }
    }

    async fn create_role(&self, name: &str) -> WorkerResult<String> {
        info!(role = name, "Creating role");
        let arn = self
            .identity
            .create_role(name, &trust_policy_document())
            .await
            .map_err(|e| WorkerError::provisioning(format!("creating role {}: {}", name, e)))?;

        for policy in ROLE_POLICY_ARNS {
            self.identity
                .attach_policy(name, policy)
                .await
                .map_err(|e| {
                    WorkerError::provisioning(format!(
                        "attaching {} to role {}: {}",
                        policy, name, e
                    ))
                })?;
        }

        Ok(arn)
    }
}
