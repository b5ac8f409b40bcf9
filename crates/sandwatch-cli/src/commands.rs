/*
[INPUT]:  Parsed CLI configuration and subcommand arguments
[OUTPUT]: Sign-in, refresh, status, connection and logout results on stdout
[POS]:    Command layer - drives the auth client for each subcommand
[UPDATE]: When adding subcommands or changing their output
*/

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use sandwatch_auth::auth::{decode_claims, jwt::now_millis};
use sandwatch_auth::{
    ConnectionProvider, FileTokenStore, SandwatchClient, SignInFlow, SolanaWalletSigner,
    TokenKey, TokenStore, WalletSigner,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::CliConfig;

/// Client and flow wired to the durable token file
pub struct Session {
    client: SandwatchClient,
    store: Arc<FileTokenStore>,
}

impl Session {
    pub async fn open(config: &CliConfig, store_path: &Path) -> Result<Self> {
        let store = Arc::new(
            FileTokenStore::open(store_path)
                .await
                .context("open token store")?,
        );
        let client = SandwatchClient::with_config(config.client_config(), store.clone())
            .context("build http client")?;
        Ok(Self { client, store })
    }

    pub async fn login(&self, keypair: Option<&Path>, secret: Option<&str>) -> Result<()> {
        let wallet = load_wallet(keypair, secret)?;
        let connected = wallet.as_ref().map(|w| w as &dyn WalletSigner);

        let cancel = CancellationToken::new();
        setup_cancel_on_ctrl_c(cancel.clone());

        let flow = SignInFlow::new(self.client.clone());
        let pair = flow
            .sign_in_with_cancel(connected, &cancel)
            .await
            .context("sign in")?;
        cancel.cancel();

        println!(
            "Signed in. access token: {}, refresh token: {}",
            presence(pair.access.is_some()),
            presence(pair.refresh.is_some())
        );
        Ok(())
    }

    pub async fn refresh(&self) -> Result<()> {
        let pair = self.client.refresh().await.context("refresh tokens")?;
        println!(
            "Refreshed. access token: {}, refresh token: {}",
            presence(pair.access.is_some()),
            presence(pair.refresh.is_some())
        );
        Ok(())
    }

    pub async fn status(&self) -> Result<()> {
        let pair = self.store.load_pair().await.context("read token store")?;
        println!("Token file: {}", self.store.path().display());

        match &pair.access {
            None => println!("{}: absent", TokenKey::AccessToken),
            Some(token) => describe_token(TokenKey::AccessToken, token),
        }
        match &pair.refresh {
            None => println!("{}: absent", TokenKey::RefreshToken),
            Some(token) => describe_token(TokenKey::RefreshToken, token),
        }
        Ok(())
    }

    pub async fn connect(&self, provider: ConnectionProvider, task: Option<&str>) -> Result<()> {
        let value = match self.client.connect_account(provider, task).await {
            Ok(value) => value,
            Err(err) => {
                if err.is_auth_error() {
                    warn!("credentials rejected; run `sandwatch login` again");
                }
                return Err(err).with_context(|| format!("connect {provider}"));
            }
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        Ok(())
    }

    pub async fn logout(&self) -> Result<()> {
        self.store.clear().await.context("clear token store")?;
        println!("Signed out.");
        Ok(())
    }
}

fn load_wallet(keypair: Option<&Path>, secret: Option<&str>) -> Result<Option<SolanaWalletSigner>> {
    if let Some(secret) = secret {
        return Ok(Some(SolanaWalletSigner::new(secret).context("load secret key")?));
    }
    if let Some(path) = keypair {
        return Ok(Some(
            SolanaWalletSigner::from_keypair_file(path)
                .with_context(|| format!("load keypair {}", path.display()))?,
        ));
    }
    Ok(None)
}

fn describe_token(key: TokenKey, token: &str) {
    match decode_claims(token) {
        Ok(claims) => {
            let expires = claims
                .expires_at()
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| "out of range".to_string());
            let state = if claims.is_expired_at(now_millis()) {
                "expired"
            } else {
                "valid"
            };
            println!(
                "{key}: {state}, expires {expires}, principal {}",
                claims.principal_id.as_deref().unwrap_or("-")
            );
        }
        Err(err) => println!("{key}: unreadable ({err})"),
    }
}

fn presence(present: bool) -> &'static str {
    if present { "stored" } else { "not issued" }
}

fn setup_cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(err) = result {
                    warn!(error = %err, "failed to install SIGINT handler");
                    return;
                }
                info!("received SIGINT; cancelling pending signature");
                cancel.cancel();
            }
            _ = cancel.cancelled() => {}
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandwatch_auth::TokenPair;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::RefreshConfig;

    /// `{"alg":"HS256"}.{"exp":1}.sig`
    const EXPIRED_JWT: &str = "eyJhbGciOiJIUzI1NiJ9.eyJleHAiOjF9.sig";

    #[tokio::test]
    async fn test_connect_refreshes_once_per_call() {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        let store_path = dir.path().join("tokens.json");
        {
            let store = FileTokenStore::open(&store_path).await.unwrap();
            store
                .save_pair(&TokenPair::new(EXPIRED_JWT, "R"))
                .await
                .unwrap();
        }

        let config = CliConfig {
            base_url: format!("{}/v1", server.uri()),
            refresh: RefreshConfig {
                persist_refreshed: false,
                single_flight: false,
            },
            ..CliConfig::default()
        };

        let body = serde_json::json!({
            "body": serde_json::json!({"token": "fresh", "refresh_token": "R2"}).to_string(),
        });
        Mock::given(method("POST"))
            .and(path("/v1/auth/refresh_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/connections/discord"))
            .and(header("authorization", "Bearer fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let session = Session::open(&config, &store_path).await.unwrap();
        tokio_test::assert_ok!(session.connect(ConnectionProvider::Discord, None).await);
    }
}
