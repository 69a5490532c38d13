//! Async entry points shared by the GUI and the command line.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::address::Address;
use crate::config::AppConfig;
use crate::contract::{
    ContractAddress, ContractSnapshot, ContractStateReader, MetadataFetcher, TicketOperation,
    TokenId, TokenMetadata, TransactionBuilder,
};
use crate::errors::{TicketError, TicketResult};
use crate::events::{ContractEvent, EventSubscriber};
use crate::rpc::NodeClient;
use crate::wallet::{self, WalletConnection, WalletProvider};

/// Outcome of a confirmed operation.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationReceipt {
    pub tx_id: String,
    pub event: ContractEvent,
}

#[derive(Clone)]
pub struct TicketServices {
    provider: Option<Arc<dyn WalletProvider>>,
    reader: ContractStateReader,
    fetcher: MetadataFetcher,
    subscriber: EventSubscriber,
    builder: TransactionBuilder,
    confirmation_timeout: Duration,
}

impl std::fmt::Debug for TicketServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketServices")
            .field("provider", &self.provider.is_some())
            .field("subscriber", &self.subscriber)
            .field("builder", &self.builder)
            .finish()
    }
}

impl TicketServices {
    pub fn from_config(config: &AppConfig) -> TicketResult<Self> {
        let node = NodeClient::from_endpoint(&config.network.rpc_endpoint, config.request_timeout())
            .map_err(|err| TicketError::Config(err.to_string()))?;
        Ok(Self {
            provider: wallet::detect_provider(config)?,
            reader: ContractStateReader::new(node),
            fetcher: MetadataFetcher::new(config.request_timeout())?,
            subscriber: EventSubscriber::new(
                config.network.ws_endpoint.clone(),
                config.request_timeout(),
            ),
            builder: TransactionBuilder::from_config(config),
            confirmation_timeout: config.confirmation_timeout(),
        })
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    fn provider(&self) -> TicketResult<&Arc<dyn WalletProvider>> {
        self.provider.as_ref().ok_or(TicketError::ProviderMissing)
    }

    pub async fn connect(&self) -> TicketResult<WalletConnection> {
        self.provider()?.connect().await
    }

    pub async fn read_contract(
        &self,
        contract: &ContractAddress,
        account: &Address,
    ) -> TicketResult<ContractSnapshot> {
        self.reader.read_state(contract, account).await
    }

    pub async fn fetch_metadata(
        &self,
        base_uri: &str,
        token_ids: &[TokenId],
    ) -> TicketResult<Vec<TokenMetadata>> {
        self.fetcher.fetch_all(base_uri, token_ids).await
    }

    /// Runs one full cycle: subscribe, submit, wait for the confirming
    /// event, unsubscribe. The subscription is closed on every path once it
    /// has been opened. `Ok(None)` means the operation was a no-op and
    /// nothing was sent.
    pub async fn run_operation(
        &self,
        operation: &TicketOperation,
        contract: Address,
        account: Address,
        unit_price: u128,
    ) -> TicketResult<Option<OperationReceipt>> {
        let provider = self.provider()?;
        let Some(call) = self
            .builder
            .build(operation, contract, account, unit_price)?
        else {
            return Ok(None);
        };

        let mut subscription = self.subscriber.open(&contract).await?;
        let submitted = match provider.call_contract(&call).await {
            Ok(submitted) => submitted,
            Err(err) => {
                subscription.close().await;
                return Err(err);
            }
        };
        info!(
            tx_id = %submitted.tx_id,
            transition = call.transition.as_str(),
            "awaiting contract event"
        );

        let outcome = subscription
            .wait_for(operation.awaited_event(), self.confirmation_timeout)
            .await;
        subscription.close().await;
        match outcome {
            Ok(event) => Ok(Some(OperationReceipt {
                tx_id: submitted.tx_id,
                event,
            })),
            Err(err) => {
                warn!(tx_id = %submitted.tx_id, error = %err, "operation not confirmed");
                Err(err)
            }
        }
    }
}
