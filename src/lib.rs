//! Client for a Zilliqa NFT concert-ticket contract.
//!
//! The crate connects a wallet through an external signer, reads the ticket
//! contract state, fetches per-ticket metadata, submits the `Mint`,
//! `BatchMint` and `BatchBurn` transitions, and waits for the confirming
//! contract event over the node's WebSocket API.
//!
//! [`services::TicketServices`] composes those pieces for callers. The
//! [`session::Session`] state machine and the [`view::DashboardView`]
//! projection hold every UI rule, so the iced front end in `ui` (behind the
//! `gui` feature) only renders and dispatches.

pub mod address;
pub mod config;
pub mod contract;
pub mod errors;
pub mod events;
pub mod rpc;
pub mod services;
pub mod session;
#[cfg(feature = "gui")]
pub mod ui;
pub mod view;
pub mod wallet;
