use iced::widget::{button, column, container, row, text, text_input, Column};
use iced::{Alignment, Element, Length};

use crate::session::OperationRequest;
use crate::view::{
    DashboardView, EntryPanel, Gallery, PurchaseControl, ReadyView, TicketCard, NO_TICKETS,
    SOLD_OUT,
};

use super::components::pending_indicator;

#[derive(Debug, Default)]
pub struct State {
    batch_input: String,
}

#[derive(Debug, Clone)]
pub enum Message {
    MintPressed,
    BatchCountChanged(String),
    BatchMintPressed,
    UseTicketsPressed,
}

impl State {
    /// Turns a control press into an operation request. A malformed ticket
    /// count is reported back as text.
    pub fn update(&mut self, message: Message) -> Result<Option<OperationRequest>, String> {
        match message {
            Message::MintPressed => Ok(Some(OperationRequest::Mint)),
            Message::BatchCountChanged(value) => {
                self.batch_input = value;
                Ok(None)
            }
            Message::BatchMintPressed => {
                let count = parse_count(&self.batch_input)?;
                Ok(Some(OperationRequest::BatchMint { count }))
            }
            Message::UseTicketsPressed => Ok(Some(OperationRequest::BatchBurn)),
        }
    }

    pub fn view(&self, projection: DashboardView) -> Element<'_, Message> {
        match projection {
            DashboardView::Loading { contract } => column![
                text(format!("Contract: {contract}")).size(16),
                text("Loading contract state...").size(16),
            ]
            .spacing(8)
            .into(),
            DashboardView::Unavailable { contract, error } => column![
                text(format!("Contract: {contract}")).size(16),
                text(format!("Failed to load contract state: {error}")).size(16),
            ]
            .spacing(8)
            .into(),
            DashboardView::Ready(ready) => self.ready_view(*ready),
        }
    }

    fn ready_view(&self, view: ReadyView) -> Element<'_, Message> {
        let info = section(
            "Contract Information",
            column![
                text(format!("Address: {}", view.info.address)).size(15),
                text(format!("Name: {}", view.info.name)).size(15),
                text(format!("Owner: {}", view.info.owner)).size(15),
                text(format!("Price: {} LI", view.info.price_li)).size(15),
                text(format!("Total Tickets: {}", view.info.total)).size(15),
            ],
        );

        let mut counter = column![
            text(view.counters.sold_label()).size(15),
            text(view.counters.left_label()).size(15),
        ];
        counter = counter.push(single_purchase(view.single_purchase));
        if let Some(group) = self.group_purchase(view.group_purchase) {
            counter = counter.push(group);
        }
        let counter = section("Purchasing Counter", counter);

        let entry = section("Concert Entry", column![entry_panel(view.entry)]);
        let gallery = section("Your Concert Tickets", gallery(view.gallery));

        column![row![info, counter].spacing(24), row![entry, gallery].spacing(24)]
            .spacing(24)
            .width(Length::Fill)
            .into()
    }

    fn group_purchase(&self, control: PurchaseControl) -> Option<Element<'_, Message>> {
        match control {
            PurchaseControl::SoldOut => None,
            PurchaseControl::Pending => Some(pending_indicator("Group purchase pending...")),
            PurchaseControl::Available | PurchaseControl::Locked => {
                let mut input = text_input("Number of Tickets", &self.batch_input).padding(8);
                let mut submit = button(text("Group Purchase").size(15)).padding(8);
                if control.is_enabled() {
                    input = input
                        .on_input(Message::BatchCountChanged)
                        .on_submit(Message::BatchMintPressed);
                    submit = submit.on_press(Message::BatchMintPressed);
                }
                Some(
                    row![input.width(Length::Fixed(180.0)), submit]
                        .spacing(8)
                        .align_items(Alignment::Center)
                        .into(),
                )
            }
        }
    }
}

fn single_purchase<'a>(control: PurchaseControl) -> Element<'a, Message> {
    match control {
        PurchaseControl::Pending => pending_indicator("Purchase pending..."),
        PurchaseControl::SoldOut => text(SOLD_OUT).size(15).into(),
        PurchaseControl::Available | PurchaseControl::Locked => {
            let mut purchase = button(text("Purchase Single Ticket").size(15)).padding(8);
            if control.is_enabled() {
                purchase = purchase.on_press(Message::MintPressed);
            }
            purchase.into()
        }
    }
}

fn entry_panel<'a>(entry: EntryPanel) -> Element<'a, Message> {
    match entry {
        EntryPanel::Burning => pending_indicator("Checking in tickets..."),
        EntryPanel::Ready => button(text("Use Tickets").size(15))
            .on_press(Message::UseTicketsPressed)
            .padding(8)
            .into(),
        EntryPanel::Locked => button(text("Use Tickets").size(15)).padding(8).into(),
        other => text(other.message().unwrap_or_default()).size(15).into(),
    }
}

fn gallery<'a>(gallery: Gallery) -> Column<'a, Message> {
    match gallery {
        Gallery::Loading => column![text("Loading ticket details...").size(15)],
        Gallery::Empty => column![text(NO_TICKETS).size(15)],
        Gallery::Error(error) => column![text(format!("Failed to load tickets: {error}")).size(15)],
        Gallery::Cards(cards) => cards
            .into_iter()
            .fold(column![].spacing(12), |column, card| column.push(ticket_card(card))),
    }
}

fn ticket_card<'a>(card: TicketCard) -> Element<'a, Message> {
    let mut content = column![text(format!("Name: {}", card.name)).size(15)];
    if let Some(uri) = &card.image_uri {
        content = content.push(text(format!("Image: {uri}")).size(13));
    }
    content = content.push(text(card.placement()).size(15));
    container(content.spacing(4))
        .style(iced::theme::Container::Box)
        .padding(10)
        .width(Length::Fill)
        .into()
}

fn section<'a>(title: &'a str, body: Column<'a, Message>) -> Element<'a, Message> {
    container(column![text(title).size(20), body.spacing(8)].spacing(12))
        .width(Length::FillPortion(1))
        .into()
}

fn parse_count(raw: &str) -> Result<u32, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<u32>()
        .map_err(|_| format!("'{trimmed}' is not a valid number of tickets"))
}
