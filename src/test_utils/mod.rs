//! Shared test helpers: in-memory ports and entity factories.

mod collaborator_mocks;
mod factories;
mod ledger_mocks;

pub use collaborator_mocks::*;
pub use factories::*;
pub use ledger_mocks::*;
