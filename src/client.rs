//! 客户端门面
//!
//! 持有默认配置、传输适配器和两张拦截器注册表。`request` 负责合并
//! 配置并驱动管道；各方法别名只是配置构造的语法糖，不引入任何
//! 管道语义。

use std::sync::Arc;

use fetchcast_core::{Body, Method, RequestConfig, Result};

use crate::interceptor::Interceptors;
use crate::pipeline;
use crate::response::Response;
use crate::transport::{HttpTransport, Transport};

/// HTTP 客户端门面
///
/// 并发请求彼此独立：不同请求的链之间没有共享可变状态，唯一共享的
/// 注册表在执行期只读（已快照），可以随时从外部注册或摘除拦截器。
pub struct Client {
    defaults: RequestConfig,
    transport: Arc<dyn Transport>,
    /// 请求/响应拦截器注册表，公开给调用方注册与摘除
    pub interceptors: Interceptors,
}

impl Client {
    /// 默认传输与空默认配置的客户端
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// 发起请求：合并默认配置后驱动整条链
    pub async fn request(&self, config: RequestConfig) -> Result<Response> {
        let mut merged = RequestConfig::merge(&self.defaults, config);
        if merged.method.is_none() {
            merged.method = Some(Method::Get);
        }
        pipeline::run(self.transport.as_ref(), &self.interceptors, merged).await
    }

    /// 合并默认配置后构建最终请求地址，不发起请求
    pub fn get_uri(&self, config: RequestConfig) -> Result<String> {
        let merged = RequestConfig::merge(&self.defaults, config);
        Ok(merged.full_url()?.to_string())
    }

    pub async fn get(&self, url: impl Into<String>) -> Result<Response> {
        self.get_with(url, RequestConfig::new()).await
    }

    pub async fn get_with(
        &self,
        url: impl Into<String>,
        config: RequestConfig,
    ) -> Result<Response> {
        self.request(config.url(url).method(Method::Get)).await
    }

    pub async fn delete(&self, url: impl Into<String>) -> Result<Response> {
        self.delete_with(url, RequestConfig::new()).await
    }

    pub async fn delete_with(
        &self,
        url: impl Into<String>,
        config: RequestConfig,
    ) -> Result<Response> {
        self.request(config.url(url).method(Method::Delete)).await
    }

    pub async fn head(&self, url: impl Into<String>) -> Result<Response> {
        self.head_with(url, RequestConfig::new()).await
    }

    pub async fn head_with(
        &self,
        url: impl Into<String>,
        config: RequestConfig,
    ) -> Result<Response> {
        self.request(config.url(url).method(Method::Head)).await
    }

    pub async fn options(&self, url: impl Into<String>) -> Result<Response> {
        self.options_with(url, RequestConfig::new()).await
    }

    pub async fn options_with(
        &self,
        url: impl Into<String>,
        config: RequestConfig,
    ) -> Result<Response> {
        self.request(config.url(url).method(Method::Options)).await
    }

    pub async fn post(&self, url: impl Into<String>, body: Body) -> Result<Response> {
        self.post_with(url, body, RequestConfig::new()).await
    }

    pub async fn post_with(
        &self,
        url: impl Into<String>,
        body: Body,
        config: RequestConfig,
    ) -> Result<Response> {
        self.request(config.url(url).method(Method::Post).body(body))
            .await
    }

    pub async fn put(&self, url: impl Into<String>, body: Body) -> Result<Response> {
        self.put_with(url, body, RequestConfig::new()).await
    }

    pub async fn put_with(
        &self,
        url: impl Into<String>,
        body: Body,
        config: RequestConfig,
    ) -> Result<Response> {
        self.request(config.url(url).method(Method::Put).body(body))
            .await
    }

    pub async fn patch(&self, url: impl Into<String>, body: Body) -> Result<Response> {
        self.patch_with(url, body, RequestConfig::new()).await
    }

    pub async fn patch_with(
        &self,
        url: impl Into<String>,
        body: Body,
        config: RequestConfig,
    ) -> Result<Response> {
        self.request(config.url(url).method(Method::Patch).body(body))
            .await
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("defaults", &self.defaults)
            .field("interceptors", &self.interceptors)
            .finish()
    }
}

/// 客户端构建器
pub struct ClientBuilder {
    defaults: RequestConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            defaults: RequestConfig::new(),
            transport: None,
        }
    }

    /// 实例级默认配置，之后每次请求与之合并（单次配置优先）
    pub fn defaults(mut self, defaults: RequestConfig) -> Self {
        self.defaults = defaults;
        self
    }

    /// 替换传输适配器（测试替身、自定义协议栈等）
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn build(self) -> Client {
        Client {
            defaults: self.defaults,
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(HttpTransport::new())),
            interceptors: Interceptors::new(),
        }
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use bytes::Bytes;
    use indexmap::IndexMap;

    use crate::interceptor::Interceptor;
    use fetchcast_core::{CancelToken, Error};

    /// 回显最终配置的测试传输
    struct EchoTransport {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Transport for EchoTransport {
        async fn dispatch(&self, config: RequestConfig) -> Result<Response> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Response {
                status: 200,
                headers: IndexMap::new(),
                body: Bytes::from_static(b"{\"ok\":true}"),
                config,
            })
        }
    }

    fn echo_client() -> (Client, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = Client::builder()
            .transport(EchoTransport {
                calls: calls.clone(),
            })
            .build();
        (client, calls)
    }

    #[tokio::test]
    async fn test_request_interceptor_adds_header_seen_by_transport() {
        let (client, _) = echo_client();
        client.interceptors.request.register(
            Interceptor::new().on_fulfilled(|config: RequestConfig| async move {
                Ok(config.header("X-Test", "1"))
            }),
        );

        let response = client.get("https://api.example.com/users").await.unwrap();
        // 传输看到的配置必须带上拦截器追加的请求头
        assert_eq!(
            response.config.headers.get("X-Test").map(String::as_str),
            Some("1")
        );
    }

    #[tokio::test]
    async fn test_defaults_merge_into_each_request() {
        let calls = Arc::new(AtomicUsize::new(0));
        let client = Client::builder()
            .defaults(
                RequestConfig::new()
                    .base_url("https://api.example.com")
                    .header("X-App", "fetchcast"),
            )
            .transport(EchoTransport {
                calls: calls.clone(),
            })
            .build();

        let response = client.get("/users").await.unwrap();
        assert_eq!(
            response.config.headers.get("X-App").map(String::as_str),
            Some("fetchcast")
        );
        assert_eq!(
            response.config.full_url().unwrap().as_str(),
            "https://api.example.com/users"
        );
    }

    #[tokio::test]
    async fn test_method_shorthands_build_expected_config() {
        let (client, calls) = echo_client();

        let response = client.head("https://api.example.com/x").await.unwrap();
        assert_eq!(response.config.method, Some(Method::Head));

        let response = client
            .post(
                "https://api.example.com/x",
                Body::Json(serde_json::json!({"name": "张三"})),
            )
            .await
            .unwrap();
        assert_eq!(response.config.method, Some(Method::Post));
        assert!(matches!(response.config.body, Some(Body::Json(_))));

        let response = client
            .put_with(
                "https://api.example.com/x",
                Body::Text("v".to_string()),
                RequestConfig::new().header("X-Rev", "7"),
            )
            .await
            .unwrap();
        assert_eq!(response.config.method, Some(Method::Put));
        assert_eq!(
            response.config.headers.get("X-Rev").map(String::as_str),
            Some("7")
        );

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_request_defaults_method_to_get() {
        let (client, _) = echo_client();
        let response = client
            .request(RequestConfig::new().url("https://api.example.com/x"))
            .await
            .unwrap();
        assert_eq!(response.config.method, Some(Method::Get));
    }

    #[tokio::test]
    async fn test_cancelled_request_end_to_end() {
        let (client, calls) = echo_client();

        let (token, source) = CancelToken::source();
        source.cancel("user-abort");

        let outcome = client
            .request(
                RequestConfig::new()
                    .url("https://api.example.com/x")
                    .cancel_token(token),
            )
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        match outcome {
            Err(Error::Cancelled { reason }) => assert_eq!(reason.as_deref(), Some("user-abort")),
            other => panic!("应以取消完结: {other:?}"),
        }
    }

    #[test]
    fn test_get_uri_builds_without_dispatch() {
        let (client, calls) = echo_client();
        let uri = client
            .get_uri(
                RequestConfig::new()
                    .url("https://api.example.com/search")
                    .param("q", "rust"),
            )
            .unwrap();
        assert_eq!(uri, "https://api.example.com/search?q=rust");
        assert_eq!(calls.load(Ordering::SeqCst), 0, "get_uri 不应发起请求");
    }

    #[tokio::test]
    async fn test_ejected_interceptor_skipped_for_new_requests() {
        let (client, _) = echo_client();
        let handle = client.interceptors.request.register(
            Interceptor::new().on_fulfilled(|config: RequestConfig| async move {
                Ok(config.header("X-Flag", "on"))
            }),
        );

        let response = client.get("https://api.example.com/x").await.unwrap();
        assert_eq!(
            response.config.headers.get("X-Flag").map(String::as_str),
            Some("on")
        );

        client.interceptors.request.eject(handle);
        let response = client.get("https://api.example.com/x").await.unwrap();
        assert!(
            response.config.headers.get("X-Flag").is_none(),
            "摘除后的拦截器不得再参与新请求"
        );
    }
}
