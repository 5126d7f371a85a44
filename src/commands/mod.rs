//! Command implementations for the netter-setup CLI

pub mod check;
pub mod completions;
pub mod helpers;
pub mod patch;
pub mod resolve;
pub mod script;
pub mod setup;
pub mod version;
