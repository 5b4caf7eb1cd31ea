mod collaborators;
mod ledger;

pub use collaborators::*;
pub use ledger::*;
