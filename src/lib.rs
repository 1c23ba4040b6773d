pub mod calendar;
pub mod error;
pub mod ledger;
pub mod planner;
pub mod request;
pub mod service;
pub mod state;
pub mod store;
pub mod utils;
