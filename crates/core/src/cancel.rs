//! 一次性广播取消令牌
//!
//! 令牌只有两个状态：待定（pending）和已取消（cancelled），只能单向
//! 迁移一次。取消时记录的原因不可变更，之后到达的观察者也会看到同一原因。
//!
//! 持有 [`CancelSource`] 的一方触发取消，持有 [`CancelToken`] 的一方观察
//! 取消。传输适配器在发起网络操作前订阅 `cancelled()`，信号到达时丢弃
//! 在途操作并以 [`Error::Cancelled`] 结束所在阶段。

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::{Error, Result};

/// 取消状态，单向迁移：Pending -> Cancelled
#[derive(Debug, Clone)]
enum CancelState {
    Pending,
    Cancelled(Option<String>),
}

#[derive(Debug)]
struct Shared {
    state: Mutex<CancelState>,
    notify: Notify,
}

impl Shared {
    fn reason_if_cancelled(&self) -> Option<Option<String>> {
        match &*self.state.lock() {
            CancelState::Pending => None,
            CancelState::Cancelled(reason) => Some(reason.clone()),
        }
    }
}

/// 取消触发端
///
/// 与令牌分离，便于把触发能力交给不持有令牌本身的代码。
#[derive(Debug, Clone)]
pub struct CancelSource {
    shared: Arc<Shared>,
}

impl CancelSource {
    /// 创建新的取消源，关联令牌处于待定状态
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(CancelState::Pending),
                notify: Notify::new(),
            }),
        }
    }

    /// 获取观察端令牌，可多次调用、可克隆
    pub fn token(&self) -> CancelToken {
        CancelToken {
            shared: self.shared.clone(),
        }
    }

    /// 触发取消并记录原因
    ///
    /// 幂等：已取消时为空操作，首次记录的原因不会被覆盖。
    pub fn cancel(&self, reason: impl Into<String>) {
        self.cancel_inner(Some(reason.into()));
    }

    /// 触发取消，不附带原因
    pub fn cancel_without_reason(&self) {
        self.cancel_inner(None);
    }

    fn cancel_inner(&self, reason: Option<String>) {
        {
            let mut state = self.shared.state.lock();
            if matches!(*state, CancelState::Cancelled(_)) {
                return;
            }
            tracing::debug!(reason = ?reason, "取消令牌已触发");
            *state = CancelState::Cancelled(reason);
        }
        // 锁外唤醒所有等待者；之后订阅的等待者会先检查状态，不会丢失信号
        self.shared.notify.notify_waiters();
    }
}

impl Default for CancelSource {
    fn default() -> Self {
        Self::new()
    }
}

/// 取消观察端令牌
#[derive(Debug, Clone)]
pub struct CancelToken {
    shared: Arc<Shared>,
}

impl CancelToken {
    /// 便捷构造：返回一对（令牌，触发端）
    pub fn source() -> (CancelToken, CancelSource) {
        let source = CancelSource::new();
        (source.token(), source)
    }

    /// 是否已取消
    pub fn is_cancelled(&self) -> bool {
        self.shared.reason_if_cancelled().is_some()
    }

    /// 已取消时返回记录的原因（原因本身可为空）
    pub fn reason(&self) -> Option<String> {
        self.shared.reason_if_cancelled().flatten()
    }

    /// 等待取消信号，返回取消原因
    ///
    /// 取消后订阅也会立即完成，所有观察者看到同一原因。
    pub async fn cancelled(&self) -> Option<String> {
        loop {
            // 先注册再检查状态，避免检查与唤醒之间丢失通知
            let notified = self.shared.notify.notified();
            if let Some(reason) = self.shared.reason_if_cancelled() {
                return reason;
            }
            notified.await;
        }
    }

    /// 已取消时立即返回取消错误（`throwIfRequested` 的对应物）
    pub fn bail_if_cancelled(&self) -> Result<()> {
        match self.shared.reason_if_cancelled() {
            Some(reason) => Err(Error::Cancelled { reason }),
            None => Ok(()),
        }
    }
}
