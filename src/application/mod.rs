// Application layer: room use cases on behalf of an acting member.
// Every permission and membership rule lives here; the domain stays pure.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
