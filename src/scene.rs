//! Recording configuration: what is drawn and for how long.

pub mod config;
