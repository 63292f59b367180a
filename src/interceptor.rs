//! 拦截器注册表
//!
//! 每个阶段（请求/响应）各有一张按插入顺序排列的注册表。注册表本身是
//! 纯容器，从不调用处理器；调用由管道执行器负责。摘除只打墓碑不压缩，
//! 句柄因此始终稳定、永不复用。
//!
//! 快照在派发时刻同步完成（锁从不跨越 `.await`），之后对注册表的并发
//! 修改不影响在途请求链。

use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;

use fetchcast_core::{Error, RequestConfig, Result};

use crate::response::Response;

/// 成功处理器：接收上一阶段的值，返回（可能替换过的）新值或失败
pub type FulfilledHandler<T> = Arc<dyn Fn(T) -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// 失败处理器：接收上一阶段的失败，可原样传播、转换或恢复为成功
pub type RejectedHandler<T> = Arc<dyn Fn(Error) -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// 一对成功/失败处理器，两者均可缺省
///
/// 缺省的成功处理器让值原样通过；缺省的失败处理器让失败原样传播。
pub struct Interceptor<T> {
    on_fulfilled: Option<FulfilledHandler<T>>,
    on_rejected: Option<RejectedHandler<T>>,
}

impl<T> Interceptor<T> {
    pub fn new() -> Self {
        Self {
            on_fulfilled: None,
            on_rejected: None,
        }
    }

    /// 设置成功处理器
    pub fn on_fulfilled<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        self.on_fulfilled = Some(Arc::new(move |value| handler(value).boxed()));
        self
    }

    /// 设置失败处理器，返回 `Ok` 即视为恢复，作为成功传给下一阶段
    pub fn on_rejected<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Error) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        self.on_rejected = Some(Arc::new(move |err| handler(err).boxed()));
        self
    }

    pub(crate) fn fulfilled(&self) -> Option<&FulfilledHandler<T>> {
        self.on_fulfilled.as_ref()
    }

    pub(crate) fn rejected(&self) -> Option<&RejectedHandler<T>> {
        self.on_rejected.as_ref()
    }
}

impl<T> Default for Interceptor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Interceptor<T> {
    fn clone(&self) -> Self {
        Self {
            on_fulfilled: self.on_fulfilled.clone(),
            on_rejected: self.on_rejected.clone(),
        }
    }
}

impl<T> std::fmt::Debug for Interceptor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptor")
            .field("on_fulfilled", &self.on_fulfilled.is_some())
            .field("on_rejected", &self.on_rejected.is_some())
            .finish()
    }
}

/// 拦截器句柄，注册时发放，用于之后摘除对应条目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterceptorHandle(usize);

/// 单个阶段的拦截器注册表
///
/// 底层为带墓碑空洞的有序序列：迭代按原始插入顺序并跳过墓碑；
/// 为条目 i 发放的句柄在显式摘除前一直有效，且不会复用给其他条目。
pub struct InterceptorRegistry<T> {
    entries: Mutex<Vec<Option<Interceptor<T>>>>,
}

impl<T> InterceptorRegistry<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// 追加一对处理器，返回稳定句柄
    pub fn register(&self, interceptor: Interceptor<T>) -> InterceptorHandle {
        let mut entries = self.entries.lock();
        entries.push(Some(interceptor));
        let handle = InterceptorHandle(entries.len() - 1);
        tracing::debug!(handle = handle.0, "注册拦截器");
        handle
    }

    /// 摘除句柄对应的条目（打墓碑）
    ///
    /// 总是成功：已摘除或无效的句柄是空操作。
    pub fn eject(&self, handle: InterceptorHandle) {
        let mut entries = self.entries.lock();
        if let Some(slot) = entries.get_mut(handle.0) {
            *slot = None;
        }
    }

    /// 按插入顺序访问全部存活条目，跳过墓碑；每次调用从头扫描
    pub fn for_each(&self, mut visit: impl FnMut(&Interceptor<T>)) {
        let entries = self.entries.lock();
        for interceptor in entries.iter().flatten() {
            visit(interceptor);
        }
    }

    /// 同步拷贝当前存活条目，供管道在派发时刻定格本次请求链
    pub(crate) fn snapshot(&self) -> Vec<Interceptor<T>> {
        let mut snapshot = Vec::new();
        self.for_each(|interceptor| snapshot.push(interceptor.clone()));
        snapshot
    }

    /// 存活条目数量（不含墓碑）
    pub fn len(&self) -> usize {
        self.entries.lock().iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for InterceptorRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for InterceptorRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorRegistry")
            .field("live", &self.len())
            .finish()
    }
}

/// 请求阶段与响应阶段的注册表对，挂在 [`crate::Client`] 上公开
#[derive(Debug, Default)]
pub struct Interceptors {
    pub request: InterceptorRegistry<RequestConfig>,
    pub response: InterceptorRegistry<Response>,
}

impl Interceptors {
    pub fn new() -> Self {
        Self::default()
    }
}
