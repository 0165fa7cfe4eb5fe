use anyhow::{anyhow, bail, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use scraper::Html;
use scraper::Selector;

use crate::ui::Ui;

pub const AWS_ROLE_ATTRIBUTE: &str = "https://aws.amazon.com/SAML/Attributes/Role";

/// A SAML assertion exactly as it came out of the IdP's auto-submit page.
///
/// The base64 blob is the canonical value: it is handed to STS verbatim, so
/// parsing always decodes a copy and never round-trips the blob itself.
#[derive(Debug)]
pub struct SamlAssertion {
    pub encoded: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleBinding {
    pub role_arn: String,
    pub principal_arn: String,
    pub assertion: String,
}

/// Pulls the base64 assertion out of an HTML auto-submit response body.
/// Returns `None` when the page carries no `SAMLResponse` input, which the
/// callers treat as an authentication failure.
pub fn extract_assertion(html: &str) -> Option<SamlAssertion> {
    let document = Html::parse_document(html);

    let selector = Selector::parse(r#"input[name="SAMLResponse"]"#).unwrap();

    let element = document.select(&selector).next()?;
    let value = element.value().attr("value")?;
    Some(SamlAssertion {
        encoded: value.to_string(),
    })
}

impl SamlAssertion {
    /// Extracts one binding per `AttributeValue` of the AWS role attribute.
    pub fn role_bindings(&self) -> Result<Vec<RoleBinding>> {
        let decoded = BASE64
            .decode(&self.encoded)
            .context("SAML assertion is not valid base64")?;
        let xml = String::from_utf8(decoded).context("SAML assertion is not valid UTF-8")?;
        let doc = roxmltree::Document::parse(&xml).context("SAML assertion is not valid XML")?;

        let mut bindings = Vec::new();
        for attribute in doc.descendants().filter(|n| {
            n.tag_name().name() == "Attribute" && n.attribute("Name") == Some(AWS_ROLE_ATTRIBUTE)
        }) {
            for value in attribute
                .children()
                .filter(|n| n.tag_name().name() == "AttributeValue")
                .filter_map(|n| n.text())
            {
                bindings.push(self.parse_role_value(value)?);
            }
        }
        Ok(bindings)
    }

    // Each value is a comma-separated pair whose ordering is not guaranteed:
    // the token containing ":role/" is the role ARN, the other the principal.
    fn parse_role_value(&self, value: &str) -> Result<RoleBinding> {
        let mut role_arn = None;
        let mut principal_arn = None;
        for arn in value.split(',').map(str::trim).filter(|a| !a.is_empty()) {
            if arn.contains(":role/") {
                role_arn = Some(arn);
            } else {
                principal_arn = Some(arn);
            }
        }
        match (role_arn, principal_arn) {
            (Some(role_arn), Some(principal_arn)) => Ok(RoleBinding {
                role_arn: role_arn.to_string(),
                principal_arn: principal_arn.to_string(),
                assertion: self.encoded.clone(),
            }),
            _ => bail!("malformed role attribute value: '{value}'"),
        }
    }
}

/// Resolves the binding list to exactly one binding. A single candidate is
/// selected silently; several candidates put the operator in the loop.
pub fn select_role(mut bindings: Vec<RoleBinding>, ui: &dyn Ui) -> Result<RoleBinding> {
    if bindings.is_empty() {
        bail!("no assumable role found in the SAML assertion");
    }
    if bindings.len() == 1 {
        return Ok(bindings.remove(0));
    }

    println!("\nPlease choose a role you would like to assume:\n");
    for (i, binding) in bindings.iter().enumerate() {
        println!("[{}] - {}", i, binding.role_arn);
    }
    let choice = ui.get_line("Enter the role number you would like to assume");
    let index: usize = choice
        .parse()
        .map_err(|_| anyhow!("'{choice}' is not a valid role choice"))?;
    if index >= bindings.len() {
        bail!("'{index}' is not a valid role choice");
    }
    Ok(bindings.remove(index))
}
