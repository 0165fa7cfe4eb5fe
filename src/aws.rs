use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sts::Client;
use aws_smithy_types::date_time::Format;

use crate::saml::RoleBinding;

const FALLBACK_REGION: &str = "us-east-1";

/// The credential set handed back by STS, rendered once to text. The
/// expiration stays a pass-through string from here on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporaryCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: String,
}

/// Trades one role binding for temporary credentials. AssumeRoleWithSAML is
/// unsigned, so no pre-existing credentials are loaded; the region resolves
/// from the environment chain with a fixed fallback.
pub async fn assume_role_with_saml(binding: &RoleBinding) -> Result<TemporaryCredentials> {
    let config = {
        let loaded = aws_config::defaults(BehaviorVersion::latest())
            .no_credentials()
            .load()
            .await;
        if loaded.region().is_some() {
            loaded
        } else {
            aws_config::defaults(BehaviorVersion::latest())
                .no_credentials()
                .region(Region::new(FALLBACK_REGION))
                .load()
                .await
        }
    };
    let client = Client::new(&config);

    log::debug!("assuming {} via {}", binding.role_arn, binding.principal_arn);
    let response = client
        .assume_role_with_saml()
        .role_arn(&binding.role_arn)
        .principal_arn(&binding.principal_arn)
        .saml_assertion(&binding.assertion)
        .send()
        .await
        .context("AssumeRoleWithSAML request failed")?;

    let credentials = response
        .credentials()
        .context("STS response contained no credentials")?;

    Ok(TemporaryCredentials {
        access_key_id: credentials.access_key_id().to_string(),
        secret_access_key: credentials.secret_access_key().to_string(),
        session_token: credentials.session_token().to_string(),
        expiration: credentials
            .expiration()
            .fmt(Format::DateTime)
            .context("STS returned an unrenderable expiration")?,
    })
}
