use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{TicketError, TicketResult};

const DEFAULT_RPC_ENDPOINT: &str = "https://dev-api.zilliqa.com";
const DEFAULT_WS_ENDPOINT: &str = "wss://dev-ws.zilliqa.com";
const DEFAULT_SIGNER_ENDPOINT: &str = "http://127.0.0.1:4747";
const DEFAULT_CHAIN_ID: u16 = 333;
const DEFAULT_MSG_VERSION: u16 = 1;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_GAS_PRICE_LI: u64 = 2_000;
const DEFAULT_GAS_LIMIT: u64 = 10_000;
const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 600;

/// Number of Qa in one Li.
pub const QA_PER_LI: u128 = 1_000_000;

/// Application configuration loaded from a TOML file.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub transaction: TransactionConfig,
    pub wallet: WalletConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> TicketResult<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|err| TicketError::Config(format!("unable to parse config: {err}")))
    }

    /// Loads the file when it exists, falling back to defaults otherwise.
    pub fn load_or_default(path: &Path) -> TicketResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> TicketResult<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;
        let encoded = toml::to_string_pretty(self)
            .map_err(|err| TicketError::Config(format!("unable to encode config: {err}")))?;
        fs::write(path, encoded)?;
        Ok(())
    }

    /// Chain identifier and message version packed into the transaction
    /// `version` field.
    pub fn version(&self) -> u32 {
        pack_version(self.network.chain_id, self.network.msg_version)
    }

    pub fn gas_price_qa(&self) -> u128 {
        u128::from(self.transaction.gas_price_li) * QA_PER_LI
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.network.request_timeout_secs.max(1))
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.transaction.confirmation_timeout_secs.max(1))
    }
}

pub fn pack_version(chain_id: u16, msg_version: u16) -> u32 {
    (u32::from(chain_id) << 16) | u32::from(msg_version)
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NetworkConfig {
    /// HTTPS JSON-RPC endpoint of the Zilliqa node.
    pub rpc_endpoint: String,
    /// WebSocket endpoint used for event log subscriptions.
    pub ws_endpoint: String,
    pub chain_id: u16,
    pub msg_version: u16,
    pub request_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_endpoint: DEFAULT_RPC_ENDPOINT.to_string(),
            ws_endpoint: DEFAULT_WS_ENDPOINT.to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            msg_version: DEFAULT_MSG_VERSION,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Fee parameters attached to every contract call. The network rejects
/// calls that omit them, so there is no "unset" state.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransactionConfig {
    pub gas_price_li: u64,
    pub gas_limit: u64,
    /// Upper bound on the wait for the contract event confirming a call.
    pub confirmation_timeout_secs: u64,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            gas_price_li: DEFAULT_GAS_PRICE_LI,
            gas_limit: DEFAULT_GAS_LIMIT,
            confirmation_timeout_secs: DEFAULT_CONFIRMATION_TIMEOUT_SECS,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WalletConfig {
    /// Signer daemon endpoint. An empty string means no provider is installed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signer_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            signer_endpoint: Some(DEFAULT_SIGNER_ENDPOINT.to_string()),
            auth_token: None,
        }
    }
}
