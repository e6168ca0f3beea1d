//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row and a `Deserialize` DTO for inserts.

pub mod contract;
pub mod job;
pub mod status;
