use iced::widget::{button, column, container, row, text, Row};
use iced::{Alignment, Element, Length};

use crate::ui::error_map::AppError;

/// Global error banner. A `retry` message adds a button that repeats the
/// failed contract read.
pub fn error_banner<'a, Message>(
    error: &'a AppError,
    dismiss: Message,
    retry: Option<Message>,
) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    let mut description = column![text(&error.message).size(16)]
        .spacing(6)
        .width(Length::Fill);
    if let Some(detail) = &error.detail {
        description = description.push(text(detail).size(13));
    }

    let mut actions = Row::new().spacing(8);
    if let Some(retry) = retry {
        actions = actions.push(button(text("Retry").size(14)).on_press(retry).padding(8));
    }
    actions = actions.push(button(text("Dismiss").size(14)).on_press(dismiss).padding(8));

    container(
        row![description, actions]
            .spacing(12)
            .align_items(Alignment::Center),
    )
    .style(iced::theme::Container::Box)
    .padding(12)
    .width(Length::Fill)
    .into()
}
