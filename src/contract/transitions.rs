//! Construction of the three ticket transitions with their Scilla-typed
//! parameters and payment amounts.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::address::Address;
use crate::config::AppConfig;
use crate::errors::{TicketError, TicketResult};
use crate::events::ContractEventKind;
use crate::rpc::dto::CallContractParams;
use crate::session::PendingOperation;

use super::state::TokenId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Transition {
    Mint,
    BatchMint,
    BatchBurn,
}

impl Transition {
    pub const fn as_str(self) -> &'static str {
        match self {
            Transition::Mint => "Mint",
            Transition::BatchMint => "BatchMint",
            Transition::BatchBurn => "BatchBurn",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScillaParam {
    pub vname: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub value: Value,
}

impl ScillaParam {
    fn new(vname: &str, ty: &str, value: Value) -> Self {
        Self {
            vname: vname.to_string(),
            ty: ty.to_string(),
            value,
        }
    }
}

/// Protocol fields that must accompany every call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallOptions {
    pub version: u32,
    /// Payment in Qa.
    pub amount: u128,
    /// Gas price in Qa.
    pub gas_price: u128,
    pub gas_limit: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractCall {
    pub contract: Address,
    pub transition: Transition,
    pub params: Vec<ScillaParam>,
    pub options: CallOptions,
}

impl ContractCall {
    /// The `data` document carried by the transaction.
    pub fn data(&self) -> Value {
        json!({
            "_tag": self.transition.as_str(),
            "params": self.params,
        })
    }

    pub fn to_signer_params(&self) -> TicketResult<CallContractParams> {
        let data = serde_json::to_string(&self.data())
            .map_err(|err| TicketError::Submission(format!("unable to encode call: {err}")))?;
        let checksummed = self.contract.to_checksum();
        Ok(CallContractParams {
            to_addr: checksummed.trim_start_matches("0x").to_string(),
            amount: self.options.amount.to_string(),
            gas_price: self.options.gas_price.to_string(),
            gas_limit: self.options.gas_limit.to_string(),
            version: self.options.version,
            code: String::new(),
            data,
            priority: false,
        })
    }
}

/// User-requested contract operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TicketOperation {
    Mint,
    BatchMint { count: u32 },
    BatchBurn { token_ids: Vec<TokenId> },
}

impl TicketOperation {
    pub fn pending(&self) -> PendingOperation {
        match self {
            TicketOperation::Mint => PendingOperation::Minting,
            TicketOperation::BatchMint { .. } => PendingOperation::BatchMinting,
            TicketOperation::BatchBurn { .. } => PendingOperation::BatchBurning,
        }
    }

    /// Event the contract emits once this operation is applied.
    pub fn awaited_event(&self) -> ContractEventKind {
        match self {
            TicketOperation::Mint => ContractEventKind::Mint,
            TicketOperation::BatchMint { .. } => ContractEventKind::BatchMint,
            TicketOperation::BatchBurn { .. } => ContractEventKind::Burn,
        }
    }

    /// True when submitting would change nothing on chain.
    pub fn is_noop(&self) -> bool {
        match self {
            TicketOperation::Mint => false,
            TicketOperation::BatchMint { count } => *count == 0,
            TicketOperation::BatchBurn { token_ids } => token_ids.is_empty(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransactionBuilder {
    version: u32,
    gas_price: u128,
    gas_limit: u64,
}

impl TransactionBuilder {
    pub fn new(version: u32, gas_price: u128, gas_limit: u64) -> Self {
        Self {
            version,
            gas_price,
            gas_limit,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.version(),
            config.gas_price_qa(),
            config.transaction.gas_limit,
        )
    }

    /// Builds the call for `operation`, or `None` when it is a no-op.
    pub fn build(
        &self,
        operation: &TicketOperation,
        contract: Address,
        recipient: Address,
        unit_price: u128,
    ) -> TicketResult<Option<ContractCall>> {
        match operation {
            TicketOperation::Mint => self.mint(contract, recipient, unit_price).map(Some),
            TicketOperation::BatchMint { count } => {
                self.batch_mint(contract, recipient, *count, unit_price)
            }
            TicketOperation::BatchBurn { token_ids } => Ok(self.batch_burn(contract, token_ids)),
        }
    }

    pub fn mint(
        &self,
        contract: Address,
        recipient: Address,
        unit_price: u128,
    ) -> TicketResult<ContractCall> {
        let params = vec![
            ScillaParam::new("to", "ByStr20", Value::from(recipient.to_checksum())),
            ScillaParam::new("token_uri", "String", Value::from("")),
        ];
        Ok(self.call(contract, Transition::Mint, params, unit_price))
    }

    pub fn batch_mint(
        &self,
        contract: Address,
        recipient: Address,
        count: u32,
        unit_price: u128,
    ) -> TicketResult<Option<ContractCall>> {
        if count == 0 {
            return Ok(None);
        }
        let amount = unit_price.checked_mul(u128::from(count)).ok_or_else(|| {
            TicketError::Submission(format!("payment for {count} tickets overflows"))
        })?;
        let params = vec![ScillaParam::new(
            "to_token_uri_pair_list",
            "List (Pair (ByStr20) (String))",
            Value::Array(batch_mint_pairs(recipient, count)),
        )];
        Ok(Some(self.call(contract, Transition::BatchMint, params, amount)))
    }

    pub fn batch_burn(&self, contract: Address, owned: &[TokenId]) -> Option<ContractCall> {
        if owned.is_empty() {
            return None;
        }
        let ids = owned
            .iter()
            .map(|id| Value::from(id.as_str()))
            .collect::<Vec<_>>();
        let params = vec![ScillaParam::new(
            "token_id_list",
            "List (Uint256)",
            Value::Array(ids),
        )];
        Some(self.call(contract, Transition::BatchBurn, params, 0))
    }

    fn call(
        &self,
        contract: Address,
        transition: Transition,
        params: Vec<ScillaParam>,
        amount: u128,
    ) -> ContractCall {
        ContractCall {
            contract,
            transition,
            params,
            options: CallOptions {
                version: self.version,
                amount,
                gas_price: self.gas_price,
                gas_limit: self.gas_limit,
            },
        }
    }
}

/// One `Pair (ByStr20) (String)` per requested ticket, each minting to
/// `recipient` with an empty token uri.
pub fn batch_mint_pairs(recipient: Address, count: u32) -> Vec<Value> {
    let recipient = recipient.to_checksum();
    (0..count)
        .map(|_| {
            json!({
                "constructor": "Pair",
                "argtypes": ["ByStr20", "String"],
                "arguments": [recipient, ""],
            })
        })
        .collect()
}
