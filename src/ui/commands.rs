use std::future::Future;
use std::time::Duration;

use iced::Command;
use tokio::time;

use crate::errors::TicketResult;

use super::error_map::AppError;

/// Default timeout applied to reads triggered from the UI.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(45);

/// Runs a service future as an [`iced::Command`], converting failures into
/// [`AppError`].
pub fn service<Message, Fut, T>(
    future: Fut,
    map: fn(Result<T, AppError>) -> Message,
) -> Command<Message>
where
    Message: 'static,
    Fut: Future<Output = TicketResult<T>> + Send + 'static,
    T: Send + 'static,
{
    Command::perform(async move { future.await.map_err(AppError::from) }, map)
}

/// Variant of [`service`] that gives up after `timeout`.
pub fn service_with_timeout<Message, Fut, T>(
    timeout: Duration,
    future: Fut,
    map: fn(Result<T, AppError>) -> Message,
) -> Command<Message>
where
    Message: 'static,
    Fut: Future<Output = TicketResult<T>> + Send + 'static,
    T: Send + 'static,
{
    Command::perform(
        async move {
            match time::timeout(timeout, future).await {
                Ok(result) => result.map_err(AppError::from),
                Err(_) => Err(AppError::timeout(timeout)),
            }
        },
        map,
    )
}
