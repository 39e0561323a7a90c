//! Dashboard modules

pub mod backups;
pub mod billing;
pub mod sales;

pub use backups::BackupsModule;
pub use billing::BillingModule;
pub use sales::SalesModule;
