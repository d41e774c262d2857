//! Authentication

mod errors;
mod models;
mod repository;
mod service;
mod token;

pub use errors::*;
pub use models::*;
pub use repository::PgAuthRepository;
pub(crate) use repository::decode_principal_columns;
pub use service::*;
pub use token::*;
