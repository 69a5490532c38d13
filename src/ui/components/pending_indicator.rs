use iced::widget::{column, progress_bar, text};
use iced::{Alignment, Element, Length};

/// Placeholder shown where a control sits while its transaction confirms.
/// Confirmation time is unknown, so the bar stays at a fixed midpoint.
pub fn pending_indicator<'a, Message>(label: &'a str) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    column![progress_bar(0.0..=1.0, 0.5).height(6), text(label).size(14)]
        .width(Length::Fixed(240.0))
        .align_items(Alignment::Start)
        .spacing(6)
        .into()
}
