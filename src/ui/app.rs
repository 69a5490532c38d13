use std::collections::VecDeque;
use std::path::PathBuf;

use iced::executor;
use iced::widget::{button, column, container, row, scrollable, text, text_input};
use iced::{Alignment, Application, Command, Element, Length, Theme};
use tracing::{info, warn};

use crate::address::Address;
use crate::contract::{ContractAddress, ContractSnapshot, TicketOperation, TokenMetadata};
use crate::services::{OperationReceipt, TicketServices};
use crate::session::{
    MetadataRequest, OperationRequest, PendingOperation, Screen, Session, Snapshot,
};
use crate::view::DashboardView;
use crate::wallet::WalletConnection;

use super::commands::{self, DEFAULT_READ_TIMEOUT};
use super::components::error_banner;
use super::dashboard;
use super::error_map::AppError;
use super::GuiFlags;

pub const APP_TITLE: &str = "Project Concert Tickets";

/// Top-level iced [`Application`] driving the ticket session.
pub struct TicketApp {
    model: Model,
}

#[derive(Debug, Clone)]
pub enum Message {
    ConnectPressed,
    Connected(Result<WalletConnection, AppError>),
    AddressChanged(String),
    AddressSubmitted,
    StateLoaded(Result<ContractSnapshot, AppError>),
    MetadataLoaded(Result<Vec<TokenMetadata>, AppError>),
    Dashboard(dashboard::Message),
    OperationFinished(PendingOperation, Result<Option<OperationReceipt>, AppError>),
    RetryRead,
    DismissError,
}

impl Application for TicketApp {
    type Executor = executor::Default;
    type Message = Message;
    type Theme = Theme;
    type Flags = GuiFlags;

    fn new(flags: Self::Flags) -> (Self, Command<Self::Message>) {
        (
            Self {
                model: Model::new(flags),
            },
            Command::none(),
        )
    }

    fn title(&self) -> String {
        APP_TITLE.to_owned()
    }

    fn update(&mut self, message: Self::Message) -> Command<Self::Message> {
        match message {
            Message::ConnectPressed => {
                if matches!(self.model.session.screen(), Screen::Disconnected) {
                    self.model.queue_async(AsyncAction::Connect);
                }
            }
            Message::Connected(result) => {
                self.model.mark_async_complete();
                match result {
                    Ok(connection) => {
                        info!(account = %connection.account, "wallet connected");
                        if let Err(error) = self.model.session.connected(connection) {
                            self.model.push_error(AppError::new(error.to_string()));
                        }
                    }
                    Err(error) => self.model.push_error(error),
                }
            }
            Message::AddressChanged(value) => {
                self.model.address_input = value;
            }
            Message::AddressSubmitted => {
                let raw = self.model.address_input.clone();
                match self.model.session.submit_address(&raw) {
                    Ok(Some(contract)) => info!(%contract, "contract address submitted"),
                    Ok(None) => {}
                    Err(error) => self.model.push_error(AppError::new(error.to_string())),
                }
            }
            Message::StateLoaded(result) => {
                self.model.mark_async_complete();
                let result = result.map_err(|error| {
                    let text = error.detail.clone().unwrap_or_else(|| error.message.clone());
                    self.model.push_error(error);
                    text
                });
                if let Some(request) = self.model.session.state_loaded(result) {
                    self.model.queue_async(AsyncAction::FetchMetadata(request));
                }
            }
            Message::MetadataLoaded(result) => {
                self.model.mark_async_complete();
                let result = result.map_err(|error| {
                    let text = error.message.clone();
                    self.model.push_error(error);
                    text
                });
                self.model.session.metadata_loaded(result);
            }
            Message::Dashboard(message) => match self.model.dashboard.update(message) {
                Ok(Some(request)) => self.model.start_operation(request),
                Ok(None) => {}
                Err(error) => self.model.push_error(AppError::new(error)),
            },
            Message::OperationFinished(pending, result) => {
                self.model.mark_async_complete();
                let outcome = match result {
                    Ok(Some(receipt)) => {
                        info!(tx_id = %receipt.tx_id, event = receipt.event.kind.as_str(), "operation confirmed");
                        Ok(())
                    }
                    Ok(None) => Err("nothing was submitted".to_string()),
                    Err(error) => {
                        warn!(?pending, error = %error.message, "operation failed");
                        let text = error.message.clone();
                        self.model.push_error(error);
                        Err(text)
                    }
                };
                self.model.session.finish_operation(pending, outcome);
            }
            Message::RetryRead => {
                if self.model.session.retry_read() {
                    self.model.global_error = None;
                }
            }
            Message::DismissError => {
                self.model.global_error = None;
            }
        }

        if let Some((contract, account)) = self.model.session.begin_read() {
            self.model
                .queue_async(AsyncAction::ReadState { contract, account });
        }

        self.model.dispatch_next_async()
    }

    fn view(&self) -> Element<Self::Message> {
        let header = text(APP_TITLE).size(30);
        let mut layout = column![header].spacing(16).padding(20);

        if let Some(error) = &self.model.global_error {
            let read_failed = self
                .model
                .session
                .dashboard()
                .is_some_and(|dashboard| matches!(dashboard.state, Snapshot::Error(_)));
            layout = layout.push(error_banner(
                error,
                Message::DismissError,
                read_failed.then_some(Message::RetryRead),
            ));
        }

        layout = layout.push(self.view_content());

        container(scrollable(layout))
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x()
            .into()
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

impl TicketApp {
    fn view_content(&self) -> Element<Message> {
        match self.model.session.screen() {
            Screen::Disconnected => self.view_disconnected(),
            Screen::AddressEntry => self.view_address_entry(),
            Screen::Dashboard(dashboard) => {
                let projection =
                    DashboardView::project(dashboard, self.model.session.account().as_ref());
                self.model.dashboard.view(projection).map(Message::Dashboard)
            }
        }
    }

    fn view_disconnected(&self) -> Element<Message> {
        let mut connect = button(text("Connect Wallet")).padding(10);
        if !self.model.async_inflight {
            connect = connect.on_press(Message::ConnectPressed);
        }
        let mut content = column![
            text("Connect your wallet to get started!").size(18),
            connect,
        ]
        .spacing(16)
        .align_items(Alignment::Center);
        if let Some(config) = &self.model.config_path {
            content = content.push(text(format!("Config: {}", config.display())).size(13));
        }
        container(content).width(Length::Fill).center_x().into()
    }

    fn view_address_entry(&self) -> Element<Message> {
        let account = self
            .model
            .session
            .account()
            .map(|account| account.to_checksum())
            .unwrap_or_default();
        column![
            text(format!("Connected as {account}")).size(14),
            row![
                text("Contract address:").size(16),
                text_input("Base16 format", &self.model.address_input)
                    .on_input(Message::AddressChanged)
                    .on_submit(Message::AddressSubmitted)
                    .padding(10)
                    .width(Length::Fixed(440.0)),
                button(text("Submit"))
                    .on_press(Message::AddressSubmitted)
                    .padding(10),
            ]
            .spacing(12)
            .align_items(Alignment::Center),
        ]
        .spacing(12)
        .into()
    }
}

struct Model {
    services: TicketServices,
    config_path: Option<PathBuf>,
    session: Session,
    address_input: String,
    dashboard: dashboard::State,
    async_queue: VecDeque<AsyncAction>,
    async_inflight: bool,
    global_error: Option<AppError>,
}

impl Model {
    fn new(flags: GuiFlags) -> Self {
        Self {
            services: flags.services,
            config_path: flags.config_path,
            session: Session::new(),
            address_input: String::new(),
            dashboard: dashboard::State::default(),
            async_queue: VecDeque::new(),
            async_inflight: false,
            global_error: None,
        }
    }

    fn queue_async(&mut self, action: AsyncAction) {
        self.async_queue.push_back(action);
    }

    fn dispatch_next_async(&mut self) -> Command<Message> {
        if self.async_inflight {
            return Command::none();
        }
        if let Some(action) = self.async_queue.pop_front() {
            self.async_inflight = true;
            action.into_command(self.services.clone())
        } else {
            Command::none()
        }
    }

    fn mark_async_complete(&mut self) {
        self.async_inflight = false;
    }

    fn push_error(&mut self, error: AppError) {
        self.global_error = Some(error);
    }

    fn start_operation(&mut self, request: OperationRequest) {
        let Some(account) = self.session.account() else {
            self.push_error(AppError::new("The wallet is not connected."));
            return;
        };
        let target = self
            .session
            .dashboard()
            .and_then(|dashboard| dashboard.state.loaded())
            .map(|snapshot| (snapshot.contract, snapshot.state.token_price));
        let Some((contract, unit_price)) = target else {
            self.push_error(AppError::new("The contract state has not been loaded yet."));
            return;
        };
        match self.session.begin_operation(request) {
            Ok(Some(operation)) => {
                info!(pending = ?operation.pending(), "submitting operation");
                self.queue_async(AsyncAction::Submit {
                    operation,
                    contract,
                    account,
                    unit_price,
                });
            }
            Ok(None) => {}
            Err(error) => self.push_error(AppError::new(error.to_string())),
        }
    }
}

#[derive(Debug)]
enum AsyncAction {
    Connect,
    ReadState {
        contract: ContractAddress,
        account: Address,
    },
    FetchMetadata(MetadataRequest),
    Submit {
        operation: TicketOperation,
        contract: Address,
        account: Address,
        unit_price: u128,
    },
}

impl AsyncAction {
    fn into_command(self, services: TicketServices) -> Command<Message> {
        match self {
            // The signer may wait on the user, so the connect is unbounded.
            AsyncAction::Connect => {
                commands::service(async move { services.connect().await }, Message::Connected)
            }
            AsyncAction::ReadState { contract, account } => commands::service_with_timeout(
                DEFAULT_READ_TIMEOUT,
                async move { services.read_contract(&contract, &account).await },
                Message::StateLoaded,
            ),
            AsyncAction::FetchMetadata(request) => commands::service_with_timeout(
                DEFAULT_READ_TIMEOUT,
                async move {
                    services
                        .fetch_metadata(&request.base_uri, &request.token_ids)
                        .await
                },
                Message::MetadataLoaded,
            ),
            AsyncAction::Submit {
                operation,
                contract,
                account,
                unit_price,
            } => {
                let pending = operation.pending();
                Command::perform(
                    async move {
                        services
                            .run_operation(&operation, contract, account, unit_price)
                            .await
                            .map_err(AppError::from)
                    },
                    move |result| Message::OperationFinished(pending, result),
                )
            }
        }
    }
}
