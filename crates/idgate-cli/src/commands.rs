//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{Value, json};

use idgate_auth::client_secret::generate_client_secret;
use idgate_auth::oauth::SessionRequest;
use idgate_auth::token::{KeyProvider, SigningAlgorithm, SigningKeyPair, StaticKeyProvider};
use idgate_auth::types::{Client, ClientCredentials, Identity, RemoteIdentity, User};
use idgate_auth::AuthConfig;
use idgate_auth_memory::MemoryBackend;

use crate::cli::DemoArgs;

const DEMO_CONNECTOR: &str = "local";
const DEMO_REMOTE_ID: &str = "demo";
const DEMO_USER_ID: &str = "demo-user";

/// Builds the key provider from a PEM file, or a freshly generated key.
pub fn load_key_provider(config: &AuthConfig, pem_path: Option<&Path>) -> Result<StaticKeyProvider> {
    let algorithm = SigningAlgorithm::from_name(&config.signing.algorithm)?;

    let key_pair = match pem_path {
        Some(path) => {
            let pem = std::fs::read_to_string(path)
                .with_context(|| format!("reading signing key {}", path.display()))?;
            let kid = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("signing-key")
                .to_string();
            SigningKeyPair::from_pem(kid, algorithm, &pem)
                .with_context(|| format!("parsing signing key {}", path.display()))?
        }
        None => {
            tracing::info!(algorithm = algorithm.as_str(), "Generating ephemeral signing key");
            SigningKeyPair::generate_rsa(algorithm)?
        }
    };

    tracing::info!(kid = %key_pair.kid, "Signing key ready");
    Ok(StaticKeyProvider::from_key_pair(key_pair))
}

/// Returns the public key set.
pub async fn keys(keys: &dyn KeyProvider) -> Result<Value> {
    let jwks = keys.public_keys().await?;
    Ok(serde_json::to_value(jwks)?)
}

/// Runs a complete login against freshly seeded in-memory stores.
pub async fn demo(config: &AuthConfig, keys: Arc<dyn KeyProvider>, args: &DemoArgs) -> Result<Value> {
    let backend = MemoryBackend::new();

    let secret = generate_client_secret();
    backend.clients.register(
        Client::new(&args.client_id, "Demo client", vec![args.redirect_url.clone()]),
        &secret,
    )?;

    let mut user = User::new(DEMO_USER_ID, "demo@example.com");
    user.email_verified = true;
    user.display_name = Some("Demo User".to_string());
    backend.users.create(user)?;
    backend
        .users
        .link_remote_identity(DEMO_USER_ID, RemoteIdentity::new(DEMO_CONNECTOR, DEMO_REMOTE_ID))?;

    let server = backend.authorization_server(config, keys);

    let mut scope = vec!["openid", "email", "profile"];
    if args.offline {
        scope.push(config.tokens.offline_access_scope.as_str());
    }
    let key = server
        .new_session(
            SessionRequest::new(DEMO_CONNECTOR, &args.client_id, &args.redirect_url)
                .state("demo-state")
                .scope(scope),
        )
        .await?;

    let redirect = server
        .login(Identity::new(DEMO_REMOTE_ID), &key)
        .await
        .context("login")?;
    let code = redirect
        .query_pairs()
        .find(|(name, _)| name == "code")
        .map(|(_, value)| value.into_owned())
        .context("redirect carries no code")?;

    let credentials = ClientCredentials::new(&args.client_id, &secret);
    let response = server
        .code_token(&credentials, &code)
        .await
        .context("code exchange")?;

    let refreshed = match response.refresh_token.as_deref() {
        Some(refresh_token) => {
            let token = server
                .refresh_token(&credentials, refresh_token)
                .await
                .context("refresh")?;
            Some(token.to_string())
        }
        None => None,
    };

    Ok(json!({
        "redirect": redirect.as_str(),
        "id_token": response.id_token.as_str(),
        "claims": response.id_token.claims(),
        "refresh_token": response.refresh_token,
        "refreshed_id_token": refreshed,
    }))
}
