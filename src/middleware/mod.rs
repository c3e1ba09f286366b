//! The admission chain, outer to inner:
//! recovery → cors → ddos gate → rate limit gate → logging → auth → router.
//!
//! Recovery sits outermost so a panic anywhere below becomes a clean 500;
//! auth sits innermost so denied requests still show up in the request log.

pub mod auth;
pub mod client_ip;
pub mod cors;
pub mod gates;
pub mod logging;
pub mod recovery;

pub use auth::auth_gate;
pub use client_ip::client_ip;
pub use cors::cors;
pub use gates::{ddos_gate, rate_limit_gate};
pub use logging::logging;
pub use recovery::recovery;
