#![cfg_attr(not(test), no_std)]
#![cfg_attr(feature = "strict", deny(warnings))]

pub mod commands;
#[cfg(any(test, feature = "examples"))]
pub mod example;
pub mod http;
pub mod ip;
pub mod serial;
pub mod transport;
pub mod wifi;

#[cfg(test)]
mod tests;
