//! 传输派发
//!
//! [`Transport`] 是管道与网络层之间的契约：一次派发恰好产生一个终结
//! 结果（成功响应或失败）。取消由管道在派发阶段统一守护，适配器本身
//! 只负责把底层 HTTP 事件翻译成统一的结果类型。

use async_trait::async_trait;
use indexmap::IndexMap;

use fetchcast_core::{Body, Error, Method, RequestConfig, ResponseKind, Result};

use crate::response::Response;

/// 传输派发契约
///
/// 实现方对同一次调用只允许产生一个终结结果；超时、连接失败等都
/// 折算为对应的错误分类返回，不做重试。
#[async_trait]
pub trait Transport: Send + Sync {
    async fn dispatch(&self, config: RequestConfig) -> Result<Response>;
}

/// 基于 reqwest 的默认传输适配器
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// 复用外部构建好的 reqwest 客户端（连接池、代理等在那边配置）
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn dispatch(&self, config: RequestConfig) -> Result<Response> {
        let url = config.full_url()?;
        let method = config.method.unwrap_or_default();

        let mut builder = self.client.request(to_reqwest_method(method), url.clone());

        for (name, value) in &config.headers {
            builder = builder.header(name, value);
        }
        // 响应提示为 JSON 且调用方未显式指定 Accept 时补充
        if config.response_kind == Some(ResponseKind::Json)
            && !config
                .headers
                .keys()
                .any(|name| name.eq_ignore_ascii_case("accept"))
        {
            builder = builder.header("Accept", "application/json");
        }
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        match &config.body {
            Some(Body::Json(value)) => builder = builder.json(value),
            Some(Body::Text(text)) => builder = builder.body(text.clone()),
            Some(Body::Bytes(bytes)) => builder = builder.body(bytes.clone()),
            None => {}
        }

        tracing::debug!(method = method.as_str(), url = %url, "发起传输派发");

        let resp = builder.send().await.map_err(map_transport_error)?;

        let status = resp.status().as_u16();
        let mut headers = IndexMap::new();
        for (name, value) in resp.headers() {
            headers.insert(
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
        let body = resp.bytes().await.map_err(map_transport_error)?;

        tracing::debug!(status, bytes = body.len(), "传输派发完成");

        Ok(Response {
            status,
            headers,
            body,
            config,
        })
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Head => reqwest::Method::HEAD,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

/// 把 reqwest 错误折算进统一错误分类
fn map_transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout
    } else if err.is_builder() {
        Error::InvalidConfig(err.to_string())
    } else {
        Error::Transport {
            detail: err.to_string(),
        }
    }
}
