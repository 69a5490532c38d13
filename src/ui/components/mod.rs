pub mod error_banner;
pub mod pending_indicator;

pub use error_banner::*;
pub use pending_indicator::*;
