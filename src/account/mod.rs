//! Account management module
//!
//! Ledger accounts, their repository contract and the lifecycle service.

pub mod models;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use models::{Account, CreateAccountRequest};
pub use repository::AccountRepository;
pub use service::AccountService;
