/// Builds the client every provider request goes through. The cookie jar
/// keeps the IdP login session alive between the form fetch and the submit;
/// the redirect cap stops misconfigured IdPs from bouncing us forever.
pub fn create_client(verify_tls: bool) -> anyhow::Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .cookie_store(true)
        .danger_accept_invalid_certs(!verify_tls)
        .redirect(reqwest::redirect::Policy::custom(|attempt| {
            if attempt.previous().len() > 5 {
                attempt.error("too many redirects")
            } else {
                attempt.follow()
            }
        }))
        .build()?;
    Ok(client)
}
