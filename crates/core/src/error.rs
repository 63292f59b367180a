//! 统一错误类型
//!
//! 管道各阶段产生的失败统一收敛到 [`Error`]，调用方通过模式匹配区分
//! 取消、传输失败和拦截器失败，而不是探测错误对象上的标记字段。

use thiserror::Error;

/// 本 crate 统一的 Result 别名
pub type Result<T> = std::result::Result<T, Error>;

/// 请求管道错误分类
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// 请求被取消令牌取消，reason 为取消时记录的原因（调用方自定义，管道不解释）
    #[error("请求已取消: {}", .reason.as_deref().unwrap_or("无取消原因"))]
    Cancelled { reason: Option<String> },

    /// 传输层失败（连接、协议等），本组件不做重试
    #[error("传输层失败: {detail}")]
    Transport { detail: String },

    /// 传输层超时，与其他传输失败一样进入管道
    #[error("请求超时")]
    Timeout,

    /// 用户拦截器产生的失败（含校验型拦截器主动将成功转为失败）
    #[error("拦截器失败: {0}")]
    Interceptor(String),

    /// 配置无法使用（URL 缺失或无法解析、请求头非法等）
    #[error("配置无效: {0}")]
    InvalidConfig(String),

    /// 响应体解码失败
    #[error("响应解码失败: {0}")]
    Decode(String),
}

impl Error {
    /// 构造取消错误
    pub fn cancelled(reason: Option<String>) -> Self {
        Error::Cancelled { reason }
    }

    /// 是否为取消错误（`isCancel` 的类型化版本）
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled { .. })
    }

    /// 是否为超时
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout)
    }
}
