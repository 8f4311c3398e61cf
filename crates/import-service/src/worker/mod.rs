//! 后台 Worker 模块

pub mod expire_worker;

pub use expire_worker::ExpireWorker;
