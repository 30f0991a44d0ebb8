//! Core value types.

mod api_url;
mod session;
mod tokens;

pub use api_url::ApiUrl;
pub use session::Session;
pub use tokens::{AccessToken, RefreshToken};
