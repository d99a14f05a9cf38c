mod duty;
mod expense;
mod ledger;
mod member;
mod money;
mod room;
mod settlement;
mod treasury;

#[cfg(test)]
mod settlement_props;

pub use duty::*;
pub use expense::*;
pub use ledger::*;
pub use member::*;
pub use money::*;
pub use room::*;
pub use settlement::*;
pub use treasury::*;
