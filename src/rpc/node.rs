use std::time::Duration;

use serde_json::Value;

use crate::address::Address;

use super::client::{JsonRpcClient, RpcClientError};

/// Typed subset of the Zilliqa node API used by the ticket client.
#[derive(Clone, Debug)]
pub struct NodeClient {
    rpc: JsonRpcClient,
}

impl NodeClient {
    pub fn from_endpoint(endpoint: &str, timeout: Duration) -> Result<Self, RpcClientError> {
        Ok(Self {
            rpc: JsonRpcClient::from_endpoint(endpoint, None, timeout)?,
        })
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        self.rpc.endpoint()
    }

    /// Full mutable state of a deployed contract as a JSON object.
    pub async fn get_smart_contract_state(
        &self,
        contract: &Address,
    ) -> Result<Value, RpcClientError> {
        self.rpc
            .request("GetSmartContractState", Some([contract.to_hex()]))
            .await
    }

    pub async fn get_network_id(&self) -> Result<String, RpcClientError> {
        self.rpc.call("GetNetworkId", Some(Vec::<Value>::new())).await
    }
}
