//! 应用层

mod authentication_service;
mod commands;

pub use authentication_service::AuthenticationService;
pub use commands::{LoginCommand, RegisterCommand};
