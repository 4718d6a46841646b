//! IAM role client.

use async_trait::async_trait;
use aws_sdk_iam::error::DisplayErrorContext;
use aws_sdk_iam::Client;
use aws_types::SdkConfig;

use super::IdentityService;
use crate::error::{ServiceError, ServiceResult};

#[derive(Clone)]
pub struct AwsIdentity {
    client: Client,
}

impl AwsIdentity {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl IdentityService for AwsIdentity {
    async fn get_role(&self, name: &str) -> ServiceResult<String> {
        match self.client.get_role().role_name(name).send().await {
            Ok(output) => output
                .role()
                .map(|role| role.arn().to_string())
                .ok_or_else(|| ServiceError::unexpected(format!("role {} has no body", name))),
            Err(e) => {
                let not_found = e
                    .as_service_error()
                    .map(|se| se.is_no_such_entity_exception())
                    .unwrap_or(false);
                if not_found {
                    Err(ServiceError::RoleNotFound(name.to_string()))
                } else {
                    Err(ServiceError::identity(DisplayErrorContext(&e).to_string()))
                }
            }
        }
    }

    async fn create_role(&self, name: &str, trust_policy: &str) -> ServiceResult<String> {
        let output = self
            .client
            .create_role()
            .role_name(name)
            .assume_role_policy_document(trust_policy)
            .send()
            .await
            .map_err(|e| ServiceError::identity(DisplayErrorContext(&e).to_string()))?;

        output
            .role()
            .map(|role| role.arn().to_string())
            .ok_or_else(|| ServiceError::unexpected(format!("created role {} has no body", name)))
    }

    async fn attach_policy(&self, role_name: &str, policy_arn: &str) -> ServiceResult<()> {
        self.client
            .attach_role_policy()
            .role_name(role_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| ServiceError::identity(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }
}
