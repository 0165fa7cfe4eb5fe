use fedauth::config::AuthConfig;
use fedauth::provider::Provider;
use fedauth::ui::StdUi;
use fedauth::{aws, credentials, http_client, saml};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = AuthConfig::load()?;
    let client = http_client::create_client(config.sslverify)?;
    let ui = StdUi;

    let provider = Provider::from_config(&config, &client, &ui)?;
    let assertion = provider.authenticate().await?;

    let bindings = assertion.role_bindings()?;
    let binding = saml::select_role(bindings, &ui)?;
    println!("Assuming role: {}", binding.role_arn);

    let temporary_credentials = aws::assume_role_with_saml(&binding).await?;

    let store_path = credentials::default_store_path()?;
    credentials::write_profile(
        &store_path,
        &config.aws_credential_profile,
        &temporary_credentials,
    )
    .await?;

    Ok(())
}
