pub mod reconciliation;
pub mod webhook_auth;
