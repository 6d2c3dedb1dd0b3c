//! 请求 / 响应 DTO

use serde::{Deserialize, Serialize};

use super::context::AuthenticatedIdentity;
use crate::application::{LoginCommand, RegisterCommand};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl From<RegisterRequest> for RegisterCommand {
    fn from(req: RegisterRequest) -> Self {
        RegisterCommand::new(req.email, req.first_name, req.last_name, req.password)
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl From<LoginRequest> for LoginCommand {
    fn from(req: LoginRequest) -> Self {
        LoginCommand::new(req.email, req.password)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ActivateRequest {
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActivateResponse {
    pub activated: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub authorities: Vec<String>,
}

impl From<AuthenticatedIdentity> for MeResponse {
    fn from(identity: AuthenticatedIdentity) -> Self {
        Self {
            id: identity.id.to_string(),
            email: identity.email,
            full_name: identity.full_name,
            authorities: identity.authorities,
        }
    }
}
