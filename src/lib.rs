//! fetchcast：带拦截器管道与取消令牌的 HTTP 客户端门面
//!
//! 调用方通过统一的 [`RequestConfig`] 发起请求；注册在 [`Client`] 上的
//! 请求/响应拦截器与传输派发拼接成一条严格有序的异步链；随配置传入的
//! [`CancelToken`] 可以在任意时刻尽力中止在途请求。
//!
//! ## 模块结构
//!
//! - `interceptor` - 拦截器注册表（注册、摘除、快照）
//! - `pipeline` - 请求链的组装与驱动
//! - `transport` - 传输派发契约与 reqwest 适配器
//! - `response` - 响应记录与解码辅助
//! - `client` - 公开门面与各方法别名
//!
//! ## 快速开始
//!
//! ```no_run
//! use fetchcast::{Client, Interceptor, RequestConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> fetchcast::Result<()> {
//! let client = Client::new();
//!
//! // 请求拦截器：给所有请求补充追踪头
//! client.interceptors.request.register(
//!     Interceptor::new().on_fulfilled(|config: RequestConfig| async move {
//!         Ok(config.header("X-Trace-Id", "abc123"))
//!     }),
//! );
//!
//! let response = client.get("https://api.example.com/users").await?;
//! println!("status = {}", response.status);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod interceptor;
pub mod response;
pub mod transport;

mod pipeline;

// 重新导出
pub use client::{Client, ClientBuilder};
pub use fetchcast_core::{
    Body, CancelSource, CancelToken, Error, Method, RequestConfig, ResponseKind, Result,
};
pub use interceptor::{Interceptor, InterceptorHandle, InterceptorRegistry, Interceptors};
pub use response::Response;
pub use transport::{HttpTransport, Transport};
