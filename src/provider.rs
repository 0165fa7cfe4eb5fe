use anyhow::Result;

use crate::adfs::AdfsProvider;
use crate::config::{AuthConfig, ProviderKind};
use crate::okta::OktaProvider;
use crate::saml::SamlAssertion;
use crate::ui::Ui;

/// The configured identity provider. The rest of the pipeline only ever sees
/// `authenticate()`; nothing outside this module matches on the variant.
pub enum Provider<'a> {
    Adfs(AdfsProvider<'a>),
    Okta(OktaProvider<'a>),
}

impl std::fmt::Debug for Provider<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Adfs(_) => f.write_str("Provider::Adfs"),
            Provider::Okta(_) => f.write_str("Provider::Okta"),
        }
    }
}

impl<'a> Provider<'a> {
    pub fn from_config(
        config: &AuthConfig,
        http_client: &'a reqwest::Client,
        ui: &'a dyn Ui,
    ) -> Result<Self> {
        match config.provider {
            ProviderKind::Adfs => {
                let settings = config.adfs()?;
                Ok(Provider::Adfs(AdfsProvider {
                    ui,
                    http_client,
                    idp_url: settings.url.clone(),
                    ntlm_auth: settings.ntlmauth,
                }))
            }
            ProviderKind::Okta => {
                let settings = config.okta()?;
                Ok(Provider::Okta(OktaProvider {
                    ui,
                    http_client,
                    base_uri: format!("https://{}", settings.organization),
                    app_url: settings.app_url.clone(),
                }))
            }
        }
    }

    pub async fn authenticate(&self) -> Result<SamlAssertion> {
        match self {
            Provider::Adfs(provider) => provider.authenticate().await,
            Provider::Okta(provider) => provider.authenticate().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::ui::testing::ScriptedUi;

    fn config(contents: &str) -> AuthConfig {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fedauth.toml");
        std::fs::write(&path, contents).unwrap();
        AuthConfig::from_file(&path).unwrap()
    }

    #[test]
    fn selects_the_variant_from_the_config_tag() {
        let config = config(
            r#"
            provider = "okta"

            [okta]
            organization = "example.okta.com"
            app_url = "https://example.okta.com/app/amazon_aws/abc/sso/saml"
            "#,
        );
        let ui = ScriptedUi::new("u", "p", &[]);
        let client = reqwest::Client::new();

        let provider = Provider::from_config(&config, &client, &ui).unwrap();
        match provider {
            Provider::Okta(okta) => assert_eq!(okta.base_uri, "https://example.okta.com"),
            Provider::Adfs(_) => panic!("wrong provider variant"),
        }
    }

    #[test]
    fn missing_settings_for_the_selected_provider_are_fatal() {
        let config = config(r#"provider = "adfs""#);
        let ui = ScriptedUi::new("u", "p", &[]);
        let client = reqwest::Client::new();

        let err = Provider::from_config(&config, &client, &ui).unwrap_err();
        assert!(err.to_string().contains("[adfs]"));
    }
}
