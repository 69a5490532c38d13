//! Wallet provider seam. Key custody and signing live outside this crate;
//! the provider only connects an account and forwards unsigned contract
//! calls for signing and broadcast.

pub mod signer;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::address::Address;
use crate::config::AppConfig;
use crate::contract::transitions::ContractCall;
use crate::errors::TicketResult;

pub use signer::SignerClient;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WalletConnection {
    pub is_connected: bool,
    pub account: Address,
}

/// Receipt returned once the network accepted a call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmittedCall {
    pub tx_id: String,
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Requests access to the provider's default account. The provider may
    /// prompt the user.
    async fn connect(&self) -> TicketResult<WalletConnection>;

    /// Signs and broadcasts a contract call, resolving once it is accepted.
    async fn call_contract(&self, call: &ContractCall) -> TicketResult<SubmittedCall>;
}

/// Returns the configured provider, or `None` when no signer is installed.
pub fn detect_provider(config: &AppConfig) -> TicketResult<Option<Arc<dyn WalletProvider>>> {
    let endpoint = match config.wallet.signer_endpoint.as_deref().map(str::trim) {
        Some(endpoint) if !endpoint.is_empty() => endpoint,
        _ => return Ok(None),
    };
    let client = SignerClient::from_endpoint(
        endpoint,
        config.wallet.auth_token.clone(),
        config.confirmation_timeout(),
    )?;
    Ok(Some(Arc::new(client)))
}
