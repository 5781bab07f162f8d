//! # Wings Protocol
//!
//! Records shared by every Wings crate and the JSON Command API spoken by
//! the `wings` binary.
//!
//! - [`Item`] is a saved page ("wing"). It is owned by the item store and
//!   only read here.
//! - [`Connection`] is a scored, undirected relation between two items.
//! - [`CommandRequest`] / [`CommandResponse`] form the closed command
//!   surface dispatched by `wings-connections`.

mod command;
mod pair;
mod records;

pub use command::{
    CommandMeta, CommandRequest, CommandResponse, CommandStatus, ErrorEnvelope,
    COMMAND_API_VERSION,
};
pub use pair::{connection_id, same_pair, PairKey};
pub use records::{
    now_ms, Connection, ConnectionKind, ConnectionPatch, ConnectionStats, Item, RelatedItem,
};
