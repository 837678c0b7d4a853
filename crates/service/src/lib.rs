//! Demo flows on top of the cloud bindings and the relational entities.
//! - `seed`: repopulate the structured store at startup.
//! - `reservations`: query and log the relational table.
//! - `messaging`: the publishes made by the HTTP endpoint and at startup.

pub mod errors;
pub mod messaging;
pub mod reservations;
pub mod seed;
