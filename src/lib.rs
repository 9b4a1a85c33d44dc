// src/lib.rs — Library root for taxres

pub mod bot;
pub mod cli;
pub mod core;
pub mod infra;
pub mod integrations;
pub mod store;
pub mod util;
