//! 请求配置
//!
//! 定义请求配置记录、默认值合并规则和最终 URL 的构建。
//! 配置在管道中按值传递，拦截器返回的新配置会替换流向下一阶段的值。

use std::str::FromStr;
use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cancel::CancelToken;
use crate::error::{Error, Result};

/// HTTP 方法
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    /// 发送到传输层的规范大写形式
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl FromStr for Method {
    type Err = Error;

    /// 大小写不敏感解析，统一方法大小写
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Method::Get),
            "post" => Ok(Method::Post),
            "put" => Ok(Method::Put),
            "patch" => Ok(Method::Patch),
            "delete" => Ok(Method::Delete),
            "head" => Ok(Method::Head),
            "options" => Ok(Method::Options),
            other => Err(Error::InvalidConfig(format!("不支持的 HTTP 方法: {other}"))),
        }
    }
}

/// 请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Body {
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
}

/// 响应体解读提示，传输层据此补充 Accept 请求头
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    Json,
    Text,
    Bytes,
}

/// 请求配置
///
/// 约定为不可变：拦截器不原地修改收到的配置，而是返回（可能修改过的）
/// 新值。`cancel_token` 随配置穿过整条链，由传输层独立观察。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestConfig {
    /// 请求地址，可为相对路径（相对 `base_url`）
    pub url: Option<String>,
    /// 基础地址，仅对相对 `url` 生效
    pub base_url: Option<String>,
    /// HTTP 方法，缺省时由门面补为 GET
    pub method: Option<Method>,
    /// 请求头，保持插入顺序
    pub headers: IndexMap<String, String>,
    /// 查询参数，追加到 URL 上
    pub params: Vec<(String, String)>,
    /// 请求体
    pub body: Option<Body>,
    /// 单次请求超时，缺省时由传输层客户端兜底
    pub timeout: Option<Duration>,
    /// 响应体解读提示
    pub response_kind: Option<ResponseKind>,
    /// 取消令牌
    #[serde(skip)]
    pub cancel_token: Option<CancelToken>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    /// JSON 请求体便捷设置
    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = Some(Body::Json(value));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn response_kind(mut self, kind: ResponseKind) -> Self {
        self.response_kind = Some(kind);
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// 合并默认配置与单次调用配置，纯函数
    ///
    /// 逐字段覆盖：调用方配置存在时取调用方的；请求头与查询参数做并集，
    /// 同名请求头以调用方为准。
    pub fn merge(defaults: &RequestConfig, overrides: RequestConfig) -> RequestConfig {
        let mut merged = defaults.clone();

        if overrides.url.is_some() {
            merged.url = overrides.url;
        }
        if overrides.base_url.is_some() {
            merged.base_url = overrides.base_url;
        }
        if overrides.method.is_some() {
            merged.method = overrides.method;
        }
        for (name, value) in overrides.headers {
            merged.headers.insert(name, value);
        }
        merged.params.extend(overrides.params);
        if overrides.body.is_some() {
            merged.body = overrides.body;
        }
        if overrides.timeout.is_some() {
            merged.timeout = overrides.timeout;
        }
        if overrides.response_kind.is_some() {
            merged.response_kind = overrides.response_kind;
        }
        if overrides.cancel_token.is_some() {
            merged.cancel_token = overrides.cancel_token;
        }

        merged
    }

    /// 构建最终请求 URL：基础地址拼接、查询参数序列化、片段剥离
    pub fn full_url(&self) -> Result<Url> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| Error::InvalidConfig("缺少请求 URL".to_string()))?;

        let combined = if is_absolute_url(url) {
            url.to_string()
        } else if let Some(base) = self.base_url.as_deref() {
            combine_urls(base, url)
        } else {
            url.to_string()
        };

        let with_params = append_params(&combined, &self.params)?;
        Url::parse(&with_params)
            .map_err(|e| Error::InvalidConfig(format!("URL 无法解析 `{with_params}`: {e}")))
    }
}

/// 判断是否为绝对地址：`scheme://` 或协议相对的 `//`
fn is_absolute_url(url: &str) -> bool {
    if url.starts_with("//") {
        return true;
    }
    let Some((scheme, rest)) = url.split_once(':') else {
        return false;
    };
    if !rest.starts_with("//") {
        return false;
    }
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// 拼接基础地址与相对地址，保证恰好一个斜杠分隔
fn combine_urls(base: &str, relative: &str) -> String {
    if relative.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        relative.trim_start_matches('/')
    )
}

/// 序列化查询参数并追加到 URL；存在片段时先剥离，否则地址无效
fn append_params(url: &str, params: &[(String, String)]) -> Result<String> {
    if params.is_empty() {
        return Ok(url.to_string());
    }

    let serialized = serde_urlencoded::to_string(params)
        .map_err(|e| Error::InvalidConfig(format!("查询参数序列化失败: {e}")))?;

    let url = match url.find('#') {
        Some(idx) => &url[..idx],
        None => url,
    };
    let separator = if url.contains('?') { '&' } else { '?' };
    Ok(format!("{url}{separator}{serialized}"))
}
