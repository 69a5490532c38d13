use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{info, warn};

use crate::address::Address;
use crate::contract::transitions::ContractCall;
use crate::errors::{TicketError, TicketResult};
use crate::rpc::dto::{CallContractResponse, ConnectResponse};
use crate::rpc::{JsonRpcClient, RpcClientError};

use super::{SubmittedCall, WalletConnection, WalletProvider};

/// Wallet provider backed by an external signer daemon speaking JSON-RPC.
#[derive(Debug)]
pub struct SignerClient {
    rpc: JsonRpcClient,
    /// Account granted by the last successful connect.
    account: Mutex<Option<Address>>,
}

impl SignerClient {
    pub fn from_endpoint(
        endpoint: &str,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> TicketResult<Self> {
        let rpc = JsonRpcClient::from_endpoint(endpoint, auth_token, timeout)
            .map_err(|err| TicketError::Config(err.to_string()))?;
        Ok(Self {
            rpc,
            account: Mutex::new(None),
        })
    }
}

#[async_trait]
impl WalletProvider for SignerClient {
    async fn connect(&self) -> TicketResult<WalletConnection> {
        let response: ConnectResponse = self
            .rpc
            .call("wallet_connect", Option::<Value>::None)
            .await
            .map_err(|err| {
                warn!(endpoint = %self.rpc.endpoint(), error = %err, "wallet connect failed");
                connect_error(err)
            })?;

        if !response.connected {
            let reason = response
                .reason
                .unwrap_or_else(|| "the wallet declined the connection".to_string());
            return Err(TicketError::ConnectionRejected(reason));
        }
        let account = response.account.ok_or_else(|| {
            TicketError::ConnectionRejected("the wallet returned no account".into())
        })?;
        let account: Address = account
            .base16
            .parse()
            .map_err(|err| TicketError::ConnectionRejected(format!("unusable account: {err}")))?;

        *self.account.lock() = Some(account);
        info!(account = %account, "wallet connected");
        Ok(WalletConnection {
            is_connected: true,
            account,
        })
    }

    async fn call_contract(&self, call: &ContractCall) -> TicketResult<SubmittedCall> {
        if self.account.lock().is_none() {
            return Err(TicketError::Submission(
                "the wallet has not granted an account yet".into(),
            ));
        }
        let params = call.to_signer_params()?;
        let response: CallContractResponse = self
            .rpc
            .call("wallet_call_contract", Some([params]))
            .await
            .map_err(|err| match err {
                err if err.is_unreachable() => {
                    TicketError::Submission("the signer is not reachable".into())
                }
                RpcClientError::Rpc { message, .. } => TicketError::Submission(message),
                other => TicketError::Submission(other.to_string()),
            })?;
        info!(
            transition = call.transition.as_str(),
            tx_id = %response.tx_id,
            "contract call accepted"
        );
        Ok(SubmittedCall {
            tx_id: response.tx_id,
        })
    }
}

fn connect_error(err: RpcClientError) -> TicketError {
    if err.is_unreachable() {
        return TicketError::ProviderMissing;
    }
    match err {
        RpcClientError::Rpc { message, .. } => TicketError::ConnectionRejected(message),
        other => TicketError::ConnectionRejected(other.to_string()),
    }
}
