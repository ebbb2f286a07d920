#![warn(missing_docs)]

//! WsMirror gateway subsystem: typed entity model, management-API contract, asset fetch

pub mod assets;
pub mod error;
pub mod gateway;
pub mod model;
