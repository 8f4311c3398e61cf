//! API 处理器模块

pub mod import;
pub mod user_view;
