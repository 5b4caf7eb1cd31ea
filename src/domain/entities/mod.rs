pub mod payment;
pub mod webhook_event;
