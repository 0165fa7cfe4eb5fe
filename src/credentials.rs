use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use configparser::ini::Ini;

use crate::aws::TemporaryCredentials;

// Section name the INI parser treats as "global" (headerless keys on load).
// Renamed off "default" so the default AWS profile is always written as a
// regular section with an explicit [default] header, which is what the AWS
// CLI and SDKs expect.
const GLOBAL_SECTION: &str = "fedauth-global";

pub fn default_store_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    Ok(home.join(".aws").join("credentials"))
}

/// Writes one profile's temporary credentials into the shared store,
/// preserving every other profile already in it. The write replaces the whole
/// file in one pass, so a profile is never left half-written.
///
/// The store is not locked: concurrent runs race last-writer-wins.
pub async fn write_profile(
    path: &Path,
    profile: &str,
    credentials: &TemporaryCredentials,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("could not create {}", parent.display()))?;
    }

    let mut store = Ini::new_cs();
    store.set_default_section(GLOBAL_SECTION);
    if path.is_file() {
        store
            .load(path)
            .map_err(|e| anyhow!("could not read {}: {e}", path.display()))?;
    }

    store.set(
        profile,
        "aws_access_key_id",
        Some(credentials.access_key_id.clone()),
    );
    store.set(
        profile,
        "aws_secret_access_key",
        Some(credentials.secret_access_key.clone()),
    );
    // the session token is written under both key names: older consumers
    // still read aws_security_token
    store.set(
        profile,
        "aws_session_token",
        Some(credentials.session_token.clone()),
    );
    store.set(
        profile,
        "aws_security_token",
        Some(credentials.session_token.clone()),
    );
    store.set(profile, "expiration", Some(credentials.expiration.clone()));

    tokio::fs::write(path, store.writes())
        .await
        .with_context(|| format!("could not write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .await
            .with_context(|| format!("could not set permissions on {}", path.display()))?;
    }

    println!("Credentials successfully written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(suffix: &str) -> TemporaryCredentials {
        TemporaryCredentials {
            access_key_id: format!("AKIA{suffix}"),
            secret_access_key: format!("secret-{suffix}"),
            session_token: format!("token-{suffix}"),
            expiration: "2026-08-07T12:00:00Z".to_string(),
        }
    }

    fn read_store(path: &Path) -> Ini {
        let mut store = Ini::new_cs();
        store.set_default_section(GLOBAL_SECTION);
        store.load(path).unwrap();
        store
    }

    #[tokio::test]
    async fn round_trips_all_five_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials");

        write_profile(&path, "federated", &credentials("1")).await.unwrap();

        let store = read_store(&path);
        assert_eq!(store.get("federated", "aws_access_key_id").unwrap(), "AKIA1");
        assert_eq!(
            store.get("federated", "aws_secret_access_key").unwrap(),
            "secret-1"
        );
        assert_eq!(store.get("federated", "aws_session_token").unwrap(), "token-1");
        assert_eq!(store.get("federated", "aws_security_token").unwrap(), "token-1");
        assert_eq!(
            store.get("federated", "expiration").unwrap(),
            "2026-08-07T12:00:00Z"
        );
    }

    #[tokio::test]
    async fn creates_the_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".aws").join("credentials");

        write_profile(&path, "federated", &credentials("1")).await.unwrap();
        assert!(path.is_file());
    }

    #[tokio::test]
    async fn rewriting_a_profile_overwrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials");

        write_profile(&path, "federated", &credentials("old")).await.unwrap();
        write_profile(&path, "federated", &credentials("new")).await.unwrap();

        let store = read_store(&path);
        assert_eq!(store.sections(), vec!["federated".to_string()]);
        assert_eq!(store.get("federated", "aws_access_key_id").unwrap(), "AKIAnew");
        assert_eq!(store.get("federated", "aws_session_token").unwrap(), "token-new");
    }

    #[tokio::test]
    async fn unrelated_profiles_are_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials");
        std::fs::write(
            &path,
            "[longlived]\naws_access_key_id=AKIAPERMANENT\naws_secret_access_key=oldsecret\n",
        )
        .unwrap();

        write_profile(&path, "federated", &credentials("1")).await.unwrap();

        let store = read_store(&path);
        assert_eq!(
            store.get("longlived", "aws_access_key_id").unwrap(),
            "AKIAPERMANENT"
        );
        assert_eq!(
            store.get("longlived", "aws_secret_access_key").unwrap(),
            "oldsecret"
        );
        assert_eq!(store.get("federated", "aws_access_key_id").unwrap(), "AKIA1");
    }

    #[tokio::test]
    async fn default_profile_is_written_with_a_section_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials");

        write_profile(&path, "default", &credentials("1")).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[default]"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn store_is_user_only_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials");

        write_profile(&path, "federated", &credentials("1")).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
