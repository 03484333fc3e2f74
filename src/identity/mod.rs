//! Who is calling: canonical caller addresses and the host/guest decision.

pub mod authority;
pub mod resolver;

pub use authority::is_host;
pub use resolver::{resolve_caller_address, resolve_host_address, HostAddress};
