//! weather-cache library
//!
//! A read-through cache in front of the Visual Crossing weather API. The
//! binary wires these modules together; they are exposed here for
//! integration tests.

pub mod cache;
pub mod cli;
pub mod data;
pub mod server;
