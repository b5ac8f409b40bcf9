/*
[INPUT]:  reqwest responses
[OUTPUT]: Buffered responses readable by the token stage and by callers
[POS]:    HTTP layer - response wrapper
[UPDATE]: When response handling needs more metadata
*/

use reqwest::header::HeaderMap;
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::http::{Result, SandwatchError};

/// Fully buffered HTTP response
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    url: Url,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ApiResponse {
    pub(crate) async fn read(url: Url, response: Response) -> Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        Ok(Self {
            status,
            url,
            headers,
            body,
        })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// URL the request was sent to
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Decode the body regardless of status
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Decode the body of a successful response, or turn the status into an API error
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T> {
        self.error_for_status()?.json()
    }

    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let message = error_message(&self.body).unwrap_or_else(|| self.text());
        Err(SandwatchError::api_error(self.status, message))
    }
}

/// Pull `{"error": "..."}` or `{"message": "..."}` out of an error body
fn error_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("error")
        .or_else(|| value.get("message"))
        .and_then(|field| field.as_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> ApiResponse {
        ApiResponse {
            status: StatusCode::from_u16(status).unwrap(),
            url: Url::parse("https://example.com/v1/x").unwrap(),
            headers: HeaderMap::new(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_into_json_success() {
        let value: serde_json::Value = response(200, r#"{"ok":true}"#).into_json().unwrap();
        assert_eq!(value["ok"], true);
    }

    #[test]
    fn test_into_json_error_uses_error_field() {
        let err = response(401, r#"{"error":"Invalid signature"}"#)
            .into_json::<serde_json::Value>()
            .unwrap_err();
        match err {
            SandwatchError::Api { code, message } => {
                assert_eq!(code, 401);
                assert_eq!(message, "Invalid signature");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_into_json_error_falls_back_to_text() {
        let err = response(502, "Bad Gateway")
            .into_json::<serde_json::Value>()
            .unwrap_err();
        assert!(matches!(err, SandwatchError::Api { code: 502, ref message } if message == "Bad Gateway"));
    }
}
