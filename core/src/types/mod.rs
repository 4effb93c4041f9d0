//! Structural types and symbols, stored in one arena per project.
//!
//! Everything is addressed by index ([`TypeId`], [`SignifierId`]); files and scopes hold
//! indices only, so the graph can be edited from any pass without shared ownership.

mod feather;
mod kind;
mod registry;
mod signifier;

pub use feather::GENERIC_PLACEHOLDER;
pub use kind::PrimitiveKind;
pub use registry::{Type, TypeId, TypeRegistry};
pub use signifier::{Def, FileId, Flags, RefRecord, Signifier, SignifierId};

#[cfg(test)]
mod types_test;
