//! Session state machine behind the view.
//!
//! The screens form a one-way chain `Disconnected -> AddressEntry ->
//! Dashboard`. All contract activity happens on the dashboard, where a single
//! [`PendingOperation`] value admits at most one in-flight transaction.

use thiserror::Error;

use crate::address::Address;
use crate::contract::{
    ContractAddress, ContractSnapshot, TicketOperation, TokenId, TokenMetadata,
};
use crate::wallet::WalletConnection;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PendingOperation {
    #[default]
    None,
    Minting,
    BatchMinting,
    BatchBurning,
}

impl PendingOperation {
    pub fn is_none(self) -> bool {
        self == PendingOperation::None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot<T> {
    Idle,
    Loading,
    Loaded(T),
    Error(String),
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Snapshot::Idle
    }
}

impl<T> Snapshot<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            Snapshot::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Snapshot::Loading)
    }
}

/// Operation as requested from the dashboard controls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationRequest {
    Mint,
    BatchMint { count: u32 },
    BatchBurn,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("the wallet is not connected")]
    NotConnected,
    #[error("the wallet is already connected")]
    AlreadyConnected,
    #[error("this action is not available on the current screen")]
    WrongScreen,
    #[error("another operation is still pending ({0:?})")]
    Busy(PendingOperation),
    #[error("the contract state has not been loaded yet")]
    StateNotLoaded,
    #[error("tickets are sold out")]
    SoldOut,
    #[error("only {left} tickets are left, {requested} requested")]
    NotEnoughTickets { requested: u32, left: u128 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub contract: ContractAddress,
    pub state: Snapshot<ContractSnapshot>,
    pub metadata: Snapshot<Vec<TokenMetadata>>,
    pub pending: PendingOperation,
    /// Tickets redeemed by the last confirmed batch burn.
    pub tickets_used: usize,
    burning: usize,
    stale: bool,
}

impl Dashboard {
    fn new(contract: ContractAddress) -> Self {
        Self {
            contract,
            state: Snapshot::Idle,
            metadata: Snapshot::Idle,
            pending: PendingOperation::None,
            tickets_used: 0,
            burning: 0,
            stale: true,
        }
    }

    pub fn owned(&self) -> &[TokenId] {
        self.state
            .loaded()
            .map(|snapshot| snapshot.owned.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Disconnected,
    AddressEntry,
    Dashboard(Dashboard),
}

/// Metadata request produced by a state refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRequest {
    pub base_uri: String,
    pub token_ids: Vec<TokenId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    connection: Option<WalletConnection>,
    screen: Screen,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            connection: None,
            screen: Screen::Disconnected,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn connection(&self) -> Option<&WalletConnection> {
        self.connection.as_ref()
    }

    pub fn account(&self) -> Option<Address> {
        self.connection.as_ref().map(|connection| connection.account)
    }

    pub fn dashboard(&self) -> Option<&Dashboard> {
        match &self.screen {
            Screen::Dashboard(dashboard) => Some(dashboard),
            _ => None,
        }
    }

    fn dashboard_mut(&mut self) -> Result<&mut Dashboard, SessionError> {
        match &mut self.screen {
            Screen::Dashboard(dashboard) => Ok(dashboard),
            _ => Err(SessionError::WrongScreen),
        }
    }

    pub fn pending(&self) -> PendingOperation {
        self.dashboard()
            .map(|dashboard| dashboard.pending)
            .unwrap_or_default()
    }

    pub fn connected(&mut self, connection: WalletConnection) -> Result<(), SessionError> {
        if !matches!(self.screen, Screen::Disconnected) {
            return Err(SessionError::AlreadyConnected);
        }
        if !connection.is_connected {
            return Err(SessionError::NotConnected);
        }
        self.connection = Some(connection);
        self.screen = Screen::AddressEntry;
        Ok(())
    }

    /// Moves to the dashboard. Blank input keeps the entry screen and
    /// returns `Ok(None)`. The address is not validated here; a bad value
    /// surfaces as a read error.
    pub fn submit_address(&mut self, raw: &str) -> Result<Option<ContractAddress>, SessionError> {
        if !matches!(self.screen, Screen::AddressEntry) {
            return Err(SessionError::WrongScreen);
        }
        let contract = ContractAddress::new(raw);
        if contract.is_empty() {
            return Ok(None);
        }
        self.screen = Screen::Dashboard(Dashboard::new(contract.clone()));
        Ok(Some(contract))
    }

    /// Starts a state read when the snapshot is stale and no read is in
    /// flight, returning what to read.
    pub fn begin_read(&mut self) -> Option<(ContractAddress, Address)> {
        let account = self.account()?;
        let dashboard = self.dashboard_mut().ok()?;
        if !dashboard.stale || dashboard.state.is_loading() {
            return None;
        }
        dashboard.stale = false;
        dashboard.state = Snapshot::Loading;
        Some((dashboard.contract.clone(), account))
    }

    /// Marks a failed read for another attempt. Returns false unless the
    /// last read failed.
    pub fn retry_read(&mut self) -> bool {
        match self.dashboard_mut() {
            Ok(dashboard) if matches!(dashboard.state, Snapshot::Error(_)) => {
                dashboard.stale = true;
                true
            }
            _ => false,
        }
    }

    /// Applies a finished state read. Previously fetched metadata is always
    /// discarded; a request is returned when the account owns tickets.
    pub fn state_loaded(
        &mut self,
        result: Result<ContractSnapshot, String>,
    ) -> Option<MetadataRequest> {
        let dashboard = self.dashboard_mut().ok()?;
        match result {
            Ok(snapshot) => {
                let request = if snapshot.owned.is_empty() {
                    dashboard.metadata = Snapshot::Loaded(Vec::new());
                    None
                } else {
                    dashboard.metadata = Snapshot::Loading;
                    Some(MetadataRequest {
                        base_uri: snapshot.state.base_uri.clone(),
                        token_ids: snapshot.owned.clone(),
                    })
                };
                dashboard.state = Snapshot::Loaded(snapshot);
                request
            }
            Err(error) => {
                dashboard.state = Snapshot::Error(error);
                dashboard.metadata = Snapshot::Idle;
                None
            }
        }
    }

    pub fn metadata_loaded(&mut self, result: Result<Vec<TokenMetadata>, String>) {
        if let Ok(dashboard) = self.dashboard_mut() {
            dashboard.metadata = match result {
                Ok(metadata) => Snapshot::Loaded(metadata),
                Err(error) => Snapshot::Error(error),
            };
        }
    }

    /// Marks an operation as pending and returns it for submission.
    /// `Ok(None)` means the request is a no-op and nothing changed.
    pub fn begin_operation(
        &mut self,
        request: OperationRequest,
    ) -> Result<Option<TicketOperation>, SessionError> {
        let dashboard = self.dashboard_mut()?;
        if !dashboard.pending.is_none() {
            return Err(SessionError::Busy(dashboard.pending));
        }
        let snapshot = dashboard
            .state
            .loaded()
            .ok_or(SessionError::StateNotLoaded)?;

        let operation = match request {
            OperationRequest::Mint => TicketOperation::Mint,
            OperationRequest::BatchMint { count } => TicketOperation::BatchMint { count },
            OperationRequest::BatchBurn => TicketOperation::BatchBurn {
                token_ids: snapshot.owned.clone(),
            },
        };
        if operation.is_noop() {
            return Ok(None);
        }
        let is_mint = !matches!(operation, TicketOperation::BatchBurn { .. });
        if is_mint && snapshot.state.is_sold_out() {
            return Err(SessionError::SoldOut);
        }
        if let TicketOperation::BatchMint { count } = &operation {
            let count = *count;
            let left = snapshot.state.tickets_left();
            if u128::from(count) > left {
                return Err(SessionError::NotEnoughTickets {
                    requested: count,
                    left,
                });
            }
        }

        match &operation {
            TicketOperation::BatchBurn { token_ids } => dashboard.burning = token_ids.len(),
            // New tickets can be used again.
            _ => dashboard.tickets_used = 0,
        }
        dashboard.pending = operation.pending();
        Ok(Some(operation))
    }

    /// Clears the pending flag on success and on failure alike. Returns true
    /// when the contract state went stale and must be re-read.
    pub fn finish_operation(
        &mut self,
        operation: PendingOperation,
        result: Result<(), String>,
    ) -> bool {
        let Ok(dashboard) = self.dashboard_mut() else {
            return false;
        };
        if dashboard.pending != operation || operation.is_none() {
            return false;
        }
        dashboard.pending = PendingOperation::None;
        let burned = std::mem::take(&mut dashboard.burning);
        match result {
            Ok(()) => {
                if operation == PendingOperation::BatchBurning {
                    dashboard.tickets_used = burned;
                }
                dashboard.stale = true;
                true
            }
            Err(_) => false,
        }
    }
}
