pub mod bundle;
pub mod config;
pub mod currency;
pub mod error;
pub mod message;
pub mod model;
pub mod provider;
pub mod session;

#[cfg(test)]
mod tests;
