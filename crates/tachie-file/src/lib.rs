//! 立绘文件处理
//!
//! - `bundle`: 目录资源存储
//! - `document`: 分析、导入与写回的会话
//! - `psd` / `export`: 分层文档输出

pub mod bundle;
pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod psd;

pub use bundle::DirectoryStore;
pub use config::Options;
pub use document::{DecodeReport, Document};
pub use error::FileError;
