//! Render-agnostic projection of the dashboard screen.
//!
//! The iced front end draws whatever [`DashboardView::project`] returns, so
//! every visibility rule of the dashboard is decided here.

use crate::address::Address;
use crate::config::QA_PER_LI;
use crate::contract::{ContractSnapshot, TokenMetadata};
use crate::session::{Dashboard, PendingOperation, Snapshot};

/// State of one purchase button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PurchaseControl {
    Available,
    /// This control's own operation is in flight.
    Pending,
    SoldOut,
    /// A different operation is in flight.
    Locked,
}

impl PurchaseControl {
    pub fn is_enabled(self) -> bool {
        self == PurchaseControl::Available
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryPanel {
    Granted { account: String, count: usize },
    NoTickets,
    Burning,
    Ready,
    Locked,
}

impl EntryPanel {
    pub fn message(&self) -> Option<String> {
        match self {
            EntryPanel::Granted { account, count } => {
                Some(format!("{account} has been granted access for {count} pax!"))
            }
            EntryPanel::NoTickets => Some(NO_TICKETS.to_string()),
            _ => None,
        }
    }
}

pub const NO_TICKETS: &str = "You have no concert tickets!";
pub const SOLD_OUT: &str = "Tickets are sold out!";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractInfo {
    pub address: String,
    pub name: String,
    pub owner: String,
    pub price_li: String,
    pub total: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Counters {
    pub sold: u128,
    pub left: u128,
}

impl Counters {
    pub fn sold_label(&self) -> String {
        format!("Tickets sold: {}", self.sold)
    }

    pub fn left_label(&self) -> String {
        format!("Tickets left: {}", self.left)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketCard {
    pub name: String,
    pub image_uri: Option<String>,
    pub gate: String,
    pub row: String,
    pub seat: String,
}

impl TicketCard {
    fn from_metadata(metadata: &TokenMetadata) -> Self {
        let placeholder = || "-".to_string();
        Self {
            name: metadata.name.clone(),
            image_uri: metadata.image_uri().map(str::to_string),
            gate: metadata.gate().unwrap_or_else(placeholder),
            row: metadata.row().unwrap_or_else(placeholder),
            seat: metadata.seat().unwrap_or_else(placeholder),
        }
    }

    pub fn placement(&self) -> String {
        format!("Gate: {} Row: {} Seat: {}", self.gate, self.row, self.seat)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Gallery {
    Loading,
    Empty,
    Cards(Vec<TicketCard>),
    Error(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadyView {
    pub info: ContractInfo,
    pub counters: Counters,
    pub single_purchase: PurchaseControl,
    pub group_purchase: PurchaseControl,
    pub entry: EntryPanel,
    pub gallery: Gallery,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DashboardView {
    Loading { contract: String },
    Unavailable { contract: String, error: String },
    Ready(Box<ReadyView>),
}

impl DashboardView {
    pub fn project(dashboard: &Dashboard, account: Option<&Address>) -> Self {
        let contract = dashboard.contract.as_str().to_string();
        match &dashboard.state {
            Snapshot::Idle | Snapshot::Loading => DashboardView::Loading { contract },
            Snapshot::Error(error) => DashboardView::Unavailable {
                contract,
                error: error.clone(),
            },
            Snapshot::Loaded(snapshot) => {
                DashboardView::Ready(Box::new(ready_view(dashboard, snapshot, account)))
            }
        }
    }

    pub fn ready(&self) -> Option<&ReadyView> {
        match self {
            DashboardView::Ready(view) => Some(view),
            _ => None,
        }
    }
}

fn ready_view(
    dashboard: &Dashboard,
    snapshot: &ContractSnapshot,
    account: Option<&Address>,
) -> ReadyView {
    let state = &snapshot.state;
    let pending = dashboard.pending;
    let sold_out = state.is_sold_out();

    let purchase = |own: PendingOperation| {
        if pending == own {
            PurchaseControl::Pending
        } else if sold_out {
            PurchaseControl::SoldOut
        } else if !pending.is_none() {
            PurchaseControl::Locked
        } else {
            PurchaseControl::Available
        }
    };

    let entry = if pending == PendingOperation::BatchBurning {
        EntryPanel::Burning
    } else if dashboard.tickets_used > 0 {
        EntryPanel::Granted {
            account: account.map(Address::to_checksum).unwrap_or_default(),
            count: dashboard.tickets_used,
        }
    } else if snapshot.owned.is_empty() {
        EntryPanel::NoTickets
    } else if !pending.is_none() {
        EntryPanel::Locked
    } else {
        EntryPanel::Ready
    };

    let gallery = match &dashboard.metadata {
        Snapshot::Loading => Gallery::Loading,
        Snapshot::Error(error) => Gallery::Error(error.clone()),
        Snapshot::Loaded(items) if !items.is_empty() => {
            Gallery::Cards(items.iter().map(TicketCard::from_metadata).collect())
        }
        _ => Gallery::Empty,
    };

    ReadyView {
        info: ContractInfo {
            address: dashboard.contract.as_str().to_string(),
            name: state.token_name.clone().unwrap_or_default(),
            owner: state.contract_owner.clone().unwrap_or_default(),
            price_li: format_li(state.token_price),
            total: state.max_token_supply.to_string(),
        },
        counters: Counters {
            sold: state.token_id_count,
            left: state.tickets_left(),
        },
        single_purchase: purchase(PendingOperation::Minting),
        group_purchase: purchase(PendingOperation::BatchMinting),
        entry,
        gallery,
    }
}

/// Formats an amount in Qa as LI without rounding.
pub fn format_li(qa: u128) -> String {
    let whole = qa / QA_PER_LI;
    let fraction = qa % QA_PER_LI;
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{fraction:06}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}
