use std::collections::HashMap;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;

use crate::saml::{self, SamlAssertion};
use crate::ui::Ui;

const SUPPORTED_FACTOR_TYPES: [&str; 2] = ["sms", "token:software:totp"];

/// REST-based IdP login: primary authentication against the authn API, an
/// optional second-factor challenge, then one-time-token redemption against
/// the application URL to obtain the assertion-bearing page.
pub struct OktaProvider<'a> {
    pub ui: &'a dyn Ui,
    pub http_client: &'a reqwest::Client,
    pub base_uri: String,
    pub app_url: String,
}

#[derive(Deserialize, Debug)]
struct AuthnResponse {
    status: String,
    #[serde(rename = "stateToken")]
    state_token: Option<String>,
    #[serde(rename = "sessionToken")]
    session_token: Option<String>,
    #[serde(rename = "_embedded", default)]
    embedded: Embedded,
}

#[derive(Deserialize, Debug, Default)]
struct Embedded {
    #[serde(default)]
    factors: Vec<MfaFactor>,
}

#[derive(Deserialize, Debug)]
struct MfaFactor {
    #[serde(rename = "factorType")]
    factor_type: String,
    #[serde(rename = "_links")]
    links: HashMap<String, Link>,
}

#[derive(Deserialize, Debug)]
struct Link {
    href: String,
}

#[derive(Deserialize, Debug)]
struct VerifyResponse {
    status: String,
    #[serde(rename = "sessionToken")]
    session_token: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiError {
    #[serde(rename = "errorSummary")]
    error_summary: String,
    #[serde(rename = "errorCode")]
    error_code: String,
}

impl OktaProvider<'_> {
    pub async fn authenticate(&self) -> Result<SamlAssertion> {
        let (username, password) = self.ui.get_username_and_password();

        let mut request_data = HashMap::new();
        request_data.insert("username", username.as_str());
        request_data.insert("password", password.as_str());

        let authn_url = format!("{}/api/v1/authn", self.base_uri);
        let response = self
            .http_client
            .post(&authn_url)
            .json(&request_data)
            .send()
            .await
            .with_context(|| format!("could not connect to {authn_url}"))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let error: ApiError = response
                .json()
                .await
                .with_context(|| format!("primary authentication failed, HTTP status code: {status}"))?;
            bail!(
                "primary authentication failed: {} (error code: {})",
                error.error_summary,
                error.error_code
            );
        }

        let authn: AuthnResponse = response
            .json()
            .await
            .context("unexpected primary authentication response")?;
        log::debug!("primary authentication status: {}", authn.status);

        match authn.status.as_str() {
            "SUCCESS" => {
                let session_token = authn
                    .session_token
                    .context("authentication succeeded without a session token")?;
                self.redeem_session_token(&session_token).await
            }
            "MFA_REQUIRED" => {
                let state_token = authn
                    .state_token
                    .context("MFA required but no state token was returned")?;
                let factor = choose_factor(&authn.embedded.factors, self.ui)?;
                let verify = self.verify_second_factor(factor, &state_token).await?;
                if verify.status != "SUCCESS" {
                    bail!("authentication failed with status: {}", verify.status);
                }
                let session_token = verify
                    .session_token
                    .context("second factor verified without a session token")?;
                self.redeem_session_token(&session_token).await
            }
            other => bail!("unable to login: {other}"),
        }
    }

    async fn verify_second_factor(
        &self,
        factor: &MfaFactor,
        state_token: &str,
    ) -> Result<VerifyResponse> {
        let verify_url = &factor
            .links
            .get("verify")
            .context("chosen factor has no verify link")?
            .href;

        // the state-token-only POST triggers delivery of the passcode
        let mut trigger_data = HashMap::new();
        trigger_data.insert("stateToken", state_token);
        self.http_client
            .post(verify_url)
            .json(&trigger_data)
            .send()
            .await
            .with_context(|| format!("could not connect to {verify_url}"))?;

        let passcode = self.ui.get_line("Please provide your one-time passcode");

        let mut request_data = HashMap::new();
        request_data.insert("stateToken", state_token);
        request_data.insert("passCode", passcode.as_str());

        let response = self
            .http_client
            .post(verify_url)
            .json(&request_data)
            .send()
            .await
            .with_context(|| format!("could not connect to {verify_url}"))?;
        if response.status() != reqwest::StatusCode::OK {
            let error: ApiError = response
                .json()
                .await
                .context("second factor verification failed")?;
            bail!("second factor verification failed: {}", error.error_summary);
        }

        response
            .json()
            .await
            .context("unexpected second factor verification response")
    }

    async fn redeem_session_token(&self, session_token: &str) -> Result<SamlAssertion> {
        let response = self
            .http_client
            .get(&self.app_url)
            .query(&[("onetimetoken", session_token)])
            .send()
            .await
            .with_context(|| format!("could not connect to {}", self.app_url))?;
        let body = response.text().await?;

        saml::extract_assertion(&body)
            .context("authentication failed: no SAML assertion in the application response")
    }
}

fn choose_factor<'f>(factors: &'f [MfaFactor], ui: &dyn Ui) -> Result<&'f MfaFactor> {
    println!("\nPlease choose a second factor:\n");
    for (i, factor) in factors.iter().enumerate() {
        println!("[{}] - {}", i, factor.factor_type);
    }
    let choice = ui.get_line("Choose a second factor");
    let index: usize = choice
        .parse()
        .map_err(|_| anyhow!("'{choice}' is not a valid second factor choice"))?;
    if index >= factors.len() {
        bail!("'{index}' is not a valid second factor choice");
    }

    let factor = &factors[index];
    if !SUPPORTED_FACTOR_TYPES.contains(&factor.factor_type.as_str()) {
        bail!("unsupported second factor: {}", factor.factor_type);
    }
    Ok(factor)
}
