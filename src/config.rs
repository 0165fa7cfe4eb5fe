use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

pub const CONFIG_FILE_NAME: &str = ".fedauth.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Adfs,
    Okta,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdfsSettings {
    pub url: String,
    #[serde(default)]
    pub ntlmauth: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OktaSettings {
    pub organization: String,
    pub app_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub provider: ProviderKind,
    #[serde(default = "default_sslverify")]
    pub sslverify: bool,
    #[serde(default = "default_profile")]
    pub aws_credential_profile: String,
    pub adfs: Option<AdfsSettings>,
    pub okta: Option<OktaSettings>,
}

fn default_sslverify() -> bool {
    true
}

fn default_profile() -> String {
    "federated".to_string()
}

impl AuthConfig {
    pub fn load() -> Result<Self> {
        Self::from_file(&find_config_file()?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .with_context(|| format!("could not read {}", path.display()))?;
        settings
            .try_deserialize::<AuthConfig>()
            .with_context(|| format!("invalid config in {}", path.display()))
    }

    pub fn adfs(&self) -> Result<&AdfsSettings> {
        self.adfs
            .as_ref()
            .context("config section [adfs] is required when provider = \"adfs\"")
    }

    pub fn okta(&self) -> Result<&OktaSettings> {
        self.okta
            .as_ref()
            .context("config section [okta] is required when provider = \"okta\"")
    }
}

fn find_config_file() -> Result<PathBuf> {
    let local_config_path = PathBuf::from(CONFIG_FILE_NAME);
    if local_config_path.is_file() {
        return Ok(local_config_path);
    }

    if let Some(home) = dirs::home_dir() {
        let global_config_path = home.join(CONFIG_FILE_NAME);
        if global_config_path.is_file() {
            return Ok(global_config_path);
        }
    }

    bail!("could not find {CONFIG_FILE_NAME} in the working directory or your home directory")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(contents: &str) -> Result<AuthConfig> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fedauth.toml");
        std::fs::write(&path, contents).unwrap();
        AuthConfig::from_file(&path)
    }

    #[test]
    fn parses_a_full_config() {
        let config = parse(
            r#"
            provider = "okta"
            sslverify = false
            aws_credential_profile = "work"

            [okta]
            organization = "example.okta.com"
            app_url = "https://example.okta.com/app/amazon_aws/abc/sso/saml"
            "#,
        )
        .unwrap();

        assert_eq!(config.provider, ProviderKind::Okta);
        assert!(!config.sslverify);
        assert_eq!(config.aws_credential_profile, "work");
        assert_eq!(config.okta().unwrap().organization, "example.okta.com");
    }

    #[test]
    fn sslverify_and_profile_have_defaults() {
        let config = parse(
            r#"
            provider = "adfs"

            [adfs]
            url = "https://sts.example.com/adfs/ls/IdpInitiatedSignOn.aspx"
            "#,
        )
        .unwrap();

        assert!(config.sslverify);
        assert_eq!(config.aws_credential_profile, "federated");
        assert!(!config.adfs().unwrap().ntlmauth);
    }

    #[test]
    fn missing_provider_key_fails_naming_it() {
        let err = parse("sslverify = true").unwrap_err();
        assert!(format!("{err:#}").contains("provider"));
    }

    #[test]
    fn unknown_provider_tag_is_rejected() {
        assert!(parse(r#"provider = "pingfed""#).is_err());
    }

    #[test]
    fn missing_section_for_selected_provider_is_fatal() {
        let config = parse(r#"provider = "okta""#).unwrap();
        let err = config.okta().unwrap_err();
        assert!(err.to_string().contains("[okta]"));
    }
}
