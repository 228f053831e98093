pub mod config;
pub mod logs;
pub mod policy;
pub mod validate;
