use std::path::PathBuf;

use iced::{Application, Settings};

use crate::services::TicketServices;

pub mod app;
pub mod commands;
pub mod components;
pub mod dashboard;
pub mod error_map;

pub use app::{TicketApp, APP_TITLE};

/// Flags supplied by the binary entrypoint when launching the GUI.
#[derive(Debug, Clone)]
pub struct GuiFlags {
    pub services: TicketServices,
    /// Configuration file the services were built from, shown to the user.
    pub config_path: Option<PathBuf>,
}

pub fn launch(flags: GuiFlags) -> iced::Result {
    TicketApp::run(Settings::with_flags(flags))
}
