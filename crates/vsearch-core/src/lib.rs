pub mod config;
pub mod logging;

pub mod backup;
pub mod operation;
pub mod retry;
