//! LAN jukebox: one host machine plays a shared queue that anyone on the network can add to.

pub mod auth;
pub mod cli;
pub mod config;
pub mod enrich;
pub mod http;
pub mod identity;
pub mod queue;
