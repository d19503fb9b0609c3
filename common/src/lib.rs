//! Types shared between the Murmur API, the store and the CLI.

pub mod caller;
pub mod params;
pub mod views;
