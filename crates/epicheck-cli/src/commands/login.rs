//! `epicheck login <token>` / `epicheck logout`.

use std::sync::Arc;

use anyhow::{Context, Result};

use epicheck_intra::{FileSession, IntraClient, IntraConfig, TokenStore};
use epicheck_roster::{SessionProvider, Token};

/// Verify the token against the intranet, then cache it.
///
/// An invalid token is rejected before anything is written, so a stale
/// cache never replaces a working one.
pub async fn run(base_url: &str, store: &TokenStore, token: &str) -> Result<()> {
    let token = Token::new(token.trim());
    let session = Arc::new(FileSession::with_token(token.clone()));
    let client = IntraClient::new(
        IntraConfig::new(base_url),
        session as Arc<dyn SessionProvider>,
    )?;

    client
        .verify_token()
        .await
        .context("token rejected by the intranet")?;

    store
        .save(&token)
        .with_context(|| format!("writing token to {}", store.path().display()))?;
    println!("token verified and cached at {}", store.path().display());
    Ok(())
}

pub fn logout(store: &TokenStore) -> Result<()> {
    store
        .clear()
        .with_context(|| format!("removing {}", store.path().display()))?;
    println!("cached token removed");
    Ok(())
}
