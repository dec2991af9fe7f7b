pub mod client;
pub mod error;
pub mod types;

pub use client::{ClientGateway, RecuperaApi};
pub use error::ApiError;
pub use types::UserEntry;
