//! Commands module - service layer for audit runs

mod audit;
pub(crate) mod service;

pub use service::AuditService;
