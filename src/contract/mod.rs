pub mod metadata;
pub mod state;
pub mod transitions;

pub use metadata::{MetadataFetcher, TokenMetadata};
pub use state::{ContractAddress, ContractSnapshot, ContractState, ContractStateReader, TokenId};
pub use transitions::{ContractCall, TicketOperation, TransactionBuilder, Transition};
