//! Type definitions for the screening pipeline

pub mod alert;
pub mod sample;

pub use alert::{AlertKind, AlertMessage, Recipient};
pub use sample::{Label, TransactionSample};
