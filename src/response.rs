//! 响应记录
//!
//! 传输派发的成功结果，随后按注册顺序流经响应拦截器。
//! 携带产生它的最终请求配置，便于拦截器按配置定制处理。

use bytes::Bytes;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use fetchcast_core::{Error, RequestConfig, Result};

/// 一次请求的最终响应
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP 状态码
    pub status: u16,
    /// 响应头，保持到达顺序
    pub headers: IndexMap<String, String>,
    /// 原始响应体
    pub body: Bytes,
    /// 产生本响应的最终请求配置
    pub config: RequestConfig,
}

impl Response {
    /// 状态码是否在 2xx 区间
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 大小写不敏感地查找响应头
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// 按 UTF-8 解码响应体
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| Error::Decode(format!("响应体不是合法 UTF-8: {e}")))
    }

    /// 按 JSON 解码响应体
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| Error::Decode(format!("JSON 解析失败: {e}")))
    }

    /// 非 2xx 状态转为传输失败，便于在响应拦截器里做统一校验
    pub fn error_for_status(self) -> Result<Response> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::Transport {
                detail: format!("HTTP 状态码 {}", self.status),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &'static [u8]) -> Response {
        Response {
            status,
            headers: IndexMap::new(),
            body: Bytes::from_static(body),
            config: RequestConfig::new(),
        }
    }

    #[test]
    fn test_is_success_range() {
        assert!(response(200, b"").is_success());
        assert!(response(204, b"").is_success());
        assert!(!response(301, b"").is_success());
        assert!(!response(404, b"").is_success());
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let mut resp = response(200, b"");
        resp.headers
            .insert("content-type".to_string(), "application/json".to_string());
        assert_eq!(resp.header("Content-Type"), Some("application/json"));
        assert_eq!(resp.header("X-Missing"), None);
    }

    #[test]
    fn test_text_and_json_decoding() {
        let resp = response(200, br#"{"name":"fetchcast"}"#);
        assert_eq!(resp.text().unwrap(), r#"{"name":"fetchcast"}"#);

        let value: serde_json::Value = resp.json().unwrap();
        assert_eq!(value["name"], "fetchcast");

        let bad = response(200, b"\xff\xfe");
        assert!(matches!(bad.text(), Err(Error::Decode(_))));
        assert!(matches!(
            bad.json::<serde_json::Value>(),
            Err(Error::Decode(_))
        ));
    }

    #[test]
    fn test_error_for_status() {
        assert!(response(201, b"").error_for_status().is_ok());
        match response(503, b"").error_for_status() {
            Err(Error::Transport { detail }) => assert!(detail.contains("503")),
            other => panic!("非 2xx 应转为传输失败: {other:?}"),
        }
    }
}
