//! 请求核心类型 crate
//!
//! 提供请求管道所需的叶子类型：错误分类、请求配置与合并规则、取消令牌。
//! 管道执行、拦截器注册表和传输适配器保留在主 crate 中。
//!
//! ## 模块结构
//!
//! - `error` - 统一错误分类（取消、传输、拦截器、配置、解码）
//! - `config` - 请求配置、默认值合并与 URL 构建
//! - `cancel` - 一次性广播取消令牌

pub mod cancel;
pub mod config;
pub mod error;

// 重新导出
pub use cancel::{CancelSource, CancelToken};
pub use config::{Body, Method, RequestConfig, ResponseKind};
pub use error::{Error, Result};
