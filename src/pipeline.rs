//! 请求链的组装与驱动
//!
//! 每次请求现场组装一条链：请求拦截器 → 传输派发 → 响应拦截器，
//! 作为单条依赖链从左到右折叠执行。任一环节的失败交给其后最近的
//! 失败处理器；没有失败处理器的环节让失败原样透传；失败处理器返回
//! 成功即视为恢复。传输派发这一环没有失败处理器，所以请求阶段的
//! 失败会越过传输、直达响应侧第一个失败处理器。
//!
//! 同一请求的各阶段全序执行，阶段之间的挂起点允许其他请求的链
//! 协作式穿插，但绝不重排本链内部的顺序。

use fetchcast_core::{Error, RequestConfig, Result};

use crate::interceptor::{Interceptor, Interceptors};
use crate::response::Response;
use crate::transport::Transport;

/// 驱动一次请求穿过整条链
pub(crate) async fn run(
    transport: &dyn Transport,
    interceptors: &Interceptors,
    config: RequestConfig,
) -> Result<Response> {
    // 派发时刻同步定格两张注册表：之后的注册/摘除不影响本次链
    let request_chain = interceptors.request.snapshot();
    let response_chain = interceptors.response.snapshot();
    tracing::debug!(
        request_interceptors = request_chain.len(),
        response_interceptors = response_chain.len(),
        "组装请求链"
    );

    let mut state: Result<RequestConfig> = Ok(config);
    for interceptor in &request_chain {
        state = apply_step(state, interceptor).await;
    }

    let mut outcome: Result<Response> = match state {
        Ok(config) => dispatch_guarded(transport, config).await,
        // 传输环节没有失败处理器，请求阶段的失败原样流向响应阶段
        Err(err) => Err(err),
    };

    for interceptor in &response_chain {
        outcome = apply_step(outcome, interceptor).await;
    }

    match &outcome {
        Ok(response) => tracing::debug!(status = response.status, "请求链已完结"),
        Err(err) => tracing::debug!(error = %err, "请求链以失败完结"),
    }
    outcome
}

/// 执行链上的一环
///
/// 成功值交给成功处理器（缺省则透传），失败交给失败处理器（缺省则
/// 透传）；处理器的返回值成为下一环的输入，恢复与转失败都由此发生。
async fn apply_step<T>(state: Result<T>, interceptor: &Interceptor<T>) -> Result<T> {
    match state {
        Ok(value) => match interceptor.fulfilled() {
            Some(handler) => handler(value).await,
            None => Ok(value),
        },
        Err(err) => match interceptor.rejected() {
            Some(handler) => handler(err).await,
            None => Err(err),
        },
    }
}

/// 带取消守护的传输派发
///
/// 已取消的令牌让传输永不启动；在途时取消则丢弃派发 future（reqwest
/// 在 drop 时尽力中止连接——请求可能已经发出，只是结果被丢弃），
/// 本阶段以取消错误完结。链完结之后的取消没有任何可观察效果。
async fn dispatch_guarded(transport: &dyn Transport, config: RequestConfig) -> Result<Response> {
    let Some(token) = config.cancel_token.clone() else {
        return transport.dispatch(config).await;
    };

    token.bail_if_cancelled()?;

    tokio::select! {
        biased;
        reason = token.cancelled() => {
            tracing::debug!(reason = ?reason, "在途请求被取消");
            Err(Error::Cancelled { reason })
        }
        outcome = transport.dispatch(config) => outcome,
    }
}
