//! 后台任务

pub mod bonus_expiry_worker;

pub use bonus_expiry_worker::BonusExpiryWorker;
