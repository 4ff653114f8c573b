use std::fmt::Display;

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use reqwest::Version;

use crate::error::SubscribeError;
use crate::request::ApiVariant;

/// A response read to completion, kept around so that it can be dumped
/// verbatim into an error when something looks off.
pub struct RawResponse {
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Consumes the response; failing to read the body is a transport error.
    pub async fn read(resp: reqwest::Response) -> Result<Self, reqwest::Error> {
        let status = resp.status();
        let version = resp.version();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?.to_vec();
        Ok(Self {
            status,
            version,
            headers,
            body,
        })
    }
}

/// Status line, headers and body, roughly as they went over the wire.
impl Display for RawResponse {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{:?} {}\r\n", self.version, self.status)?;
        for (name, value) in &self.headers {
            write!(f, "{}: {}\r\n", name, String::from_utf8_lossy(value.as_bytes()))?;
        }
        write!(f, "\r\n{}", String::from_utf8_lossy(&self.body))
    }
}

impl ApiVariant {
    /// Decide whether the service accepted the subscription.
    ///
    /// - v3.0: 200 is success, anything else is not
    /// - v1.3: 200 *and* a body of exactly JSON `true`
    pub fn classify(
        &self,
        resp: &RawResponse,
    ) -> Result<(), SubscribeError> {
        if resp.status != StatusCode::OK {
            return Err(SubscribeError::RemoteError {
                reason: "Non-200 response".to_string(),
                response: resp.to_string(),
            });
        }

        match self {
            ApiVariant::StructuredBody { .. } => Ok(()),
            ApiVariant::QueryString => {
                let value: serde_json::Value = serde_json::from_slice(&resp.body).map_err(|e| {
                    SubscribeError::MalformedResponse {
                        source: e,
                        response: resp.to_string(),
                    }
                })?;
                match value {
                    serde_json::Value::Bool(true) => Ok(()),
                    // `false`, or an error object such as {"error": ..., "code": ...}
                    _ => Err(SubscribeError::RemoteError {
                        reason: "Subscribe returned error".to_string(),
                        response: resp.to_string(),
                    }),
                }
            }
        }
    }
}
