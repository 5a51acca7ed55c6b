//! Network-level concerns: TLS material for the listener.

pub mod tls;
