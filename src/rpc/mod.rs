//! JSON-RPC plumbing towards the Zilliqa node and the signer daemon.

pub mod client;
pub mod dto;
pub mod node;

pub use client::{JsonRpcClient, RpcClientError};
pub use node::NodeClient;
