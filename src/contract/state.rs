use std::collections::BTreeMap;
use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::address::Address;
use crate::errors::{TicketError, TicketResult};
use crate::rpc::NodeClient;

/// Scilla `Uint256` token identifier kept in its decimal text form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    pub fn new(value: impl Into<String>) -> TicketResult<Self> {
        let value = value.into();
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TicketError::Read(format!("invalid token id `{value}`")));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Contract address exactly as the user typed it. It is only resolved into
/// an [`Address`] when a call is made.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractAddress(String);

impl ContractAddress {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn resolve(&self) -> TicketResult<Address> {
        self.0.parse()
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of the ticket contract's mutable fields.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ContractState {
    #[serde(default)]
    pub contract_owner: Option<String>,
    #[serde(default)]
    pub token_name: Option<String>,
    /// Unit ticket price in Qa.
    #[serde(deserialize_with = "scilla_uint")]
    pub token_price: u128,
    #[serde(deserialize_with = "scilla_uint")]
    pub max_token_supply: u128,
    #[serde(deserialize_with = "scilla_uint")]
    pub token_id_count: u128,
    #[serde(default)]
    pub base_uri: String,
    /// Token id to owner base16 address.
    #[serde(default)]
    pub token_owners: BTreeMap<TokenId, String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ContractState {
    pub fn from_value(value: Value) -> TicketResult<Self> {
        let state: ContractState = serde_json::from_value(value)
            .map_err(|err| TicketError::Read(format!("malformed contract state: {err}")))?;
        if state.token_id_count > state.max_token_supply {
            return Err(TicketError::Read(format!(
                "issued count {} exceeds supply cap {}",
                state.token_id_count, state.max_token_supply
            )));
        }
        for id in state.token_owners.keys() {
            TokenId::new(id.as_str())?;
        }
        Ok(state)
    }

    pub fn tickets_left(&self) -> u128 {
        self.max_token_supply.saturating_sub(self.token_id_count)
    }

    pub fn is_sold_out(&self) -> bool {
        self.tickets_left() == 0
    }

    /// Token ids whose owner equals `account`, in owner mapping order.
    pub fn owned_tokens(&self, account: &Address) -> Vec<TokenId> {
        self.token_owners
            .iter()
            .filter(|(_, owner)| account.matches_hex(owner))
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn token_uri(&self, id: &TokenId) -> String {
        format!("{}{}", self.base_uri, id)
    }
}

fn scilla_uint<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(raw) => raw
            .parse()
            .map_err(|err| D::Error::custom(format!("invalid unsigned integer `{raw}`: {err}"))),
        Value::Number(number) => number
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| D::Error::custom(format!("invalid unsigned integer {number}"))),
        other => Err(D::Error::custom(format!("expected unsigned integer, got {other}"))),
    }
}

/// A state read together with what the connected account owns.
#[derive(Clone, Debug, PartialEq)]
pub struct ContractSnapshot {
    pub contract: Address,
    pub state: ContractState,
    pub owned: Vec<TokenId>,
}

#[derive(Clone, Debug)]
pub struct ContractStateReader {
    node: NodeClient,
}

impl ContractStateReader {
    pub fn new(node: NodeClient) -> Self {
        Self { node }
    }

    pub async fn read_state(
        &self,
        contract: &ContractAddress,
        account: &Address,
    ) -> TicketResult<ContractSnapshot> {
        let address = contract
            .resolve()
            .map_err(|err| TicketError::Read(err.to_string()))?;
        debug!(
            checksummed = %address.to_checksum(),
            bech32 = %address.to_bech32(),
            "resolved contract address"
        );

        let raw = self
            .node
            .get_smart_contract_state(&address)
            .await
            .map_err(|err| {
                warn!(contract = %address, error = %err, "contract state read failed");
                TicketError::Read(err.to_string())
            })?;
        let state = ContractState::from_value(raw)?;
        let owned = state.owned_tokens(account);
        info!(
            contract = %address,
            issued = %state.token_id_count,
            supply = %state.max_token_supply,
            owned = owned.len(),
            "contract state loaded"
        );
        Ok(ContractSnapshot {
            contract: address,
            state,
            owned,
        })
    }
}
