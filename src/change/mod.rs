//! Change records emitted by the primary store and their decoding.
//!
//! The primary store surfaces every insert/update/delete as a change record
//! carrying before/after attribute images in the store's tagged value
//! encoding. `record` holds the wire types; `decode` turns a raw record into
//! a typed domain event or a record-local error.

pub mod decode;
pub mod record;

pub use decode::{decode, DecodeError, DomainEvent};
pub use record::{AttrError, AttrMap, AttrValue, ChangeBatch, ChangeRecord, EntityKind, EventKind};
