pub mod cli;
pub mod core;
pub mod ledger;
pub mod normalize;
pub mod providers;
pub mod service;
pub mod storage;
