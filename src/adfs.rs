use anyhow::{bail, Context, Result};
use scraper::Html;
use scraper::Selector;
use url::Url;

use crate::saml::{self, SamlAssertion};
use crate::ui::Ui;

/// Form-based IdP login. Fetches the sign-in page, fills whatever login form
/// it finds and posts it back, without any per-IdP field mapping.
pub struct AdfsProvider<'a> {
    pub ui: &'a dyn Ui,
    pub http_client: &'a reqwest::Client,
    pub idp_url: String,
    pub ntlm_auth: bool,
}

#[derive(Debug)]
struct LoginForm {
    action: String,
    fields: Vec<(String, String)>,
}

impl AdfsProvider<'_> {
    pub async fn authenticate(&self) -> Result<SamlAssertion> {
        let (username, password) = self.ui.get_username_and_password();

        let mut request = self.http_client.get(&self.idp_url);
        if self.ntlm_auth {
            // integrated auth: the domain credentials ride on the request
            // itself instead of the form payload
            request = request.basic_auth(&username, Some(&password));
        }
        let form_response = request
            .send()
            .await
            .with_context(|| format!("could not connect to {}", self.idp_url))?;
        let form_html = form_response.text().await?;

        let form = build_login_form(&form_html, &username, &password)?;
        let action = resolve_action(&self.idp_url, &form.action)?;
        log::debug!("submitting login form to {action}");

        let response = self
            .http_client
            .post(action.clone())
            .form(&form.fields)
            .send()
            .await
            .with_context(|| format!("could not connect to {action}"))?;
        if response.status() != reqwest::StatusCode::OK {
            bail!(
                "there was a problem logging in via ADFS, HTTP status code: {}",
                response.status().as_u16()
            );
        }

        let body = response.text().await?;
        saml::extract_assertion(&body)
            .context("authentication failed: no SAML assertion in the login response")
    }
}

/// Builds the submission payload from every named input on the page: names
/// containing "user" get the username, names containing "pass" get the
/// password, anything else keeps its existing value (hidden fields carry the
/// login session state). The substring match is deliberately loose so that
/// arbitrary IdP login forms work without a field map.
fn build_login_form(html: &str, username: &str, password: &str) -> Result<LoginForm> {
    let document = Html::parse_document(html);

    let input_selector = Selector::parse("input").unwrap();
    let form_selector = Selector::parse("form").unwrap();

    let mut fields = Vec::new();
    for input in document.select(&input_selector) {
        let Some(name) = input.value().attr("name") else {
            continue;
        };
        let value = input.value().attr("value").unwrap_or("");
        let lowered = name.to_lowercase();
        if lowered.contains("user") {
            fields.push((name.to_string(), username.to_string()));
        } else if lowered.contains("pass") {
            fields.push((name.to_string(), password.to_string()));
        } else {
            fields.push((name.to_string(), value.to_string()));
        }
    }

    let action = document
        .select(&form_selector)
        .filter_map(|form| form.value().attr("action"))
        .last()
        .context("login page has no form action")?
        .to_string();

    Ok(LoginForm { action, fields })
}

fn resolve_action(idp_url: &str, action: &str) -> Result<Url> {
    let base = Url::parse(idp_url).with_context(|| format!("invalid IdP URL: {idp_url}"))?;
    base.join(action)
        .with_context(|| format!("invalid form action: {action}"))
}
