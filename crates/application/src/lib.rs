//! Ferrous Resolv Application Layer
pub mod ports;
pub mod services;
