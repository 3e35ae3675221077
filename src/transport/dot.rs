//! Dot. device cloud client.
//!
//! ```text
//! POST {base}/text   {refreshNow, deviceId, title?, message, signature?, icon?, link?}
//! POST {base}/image  {refreshNow, deviceId, image, link?, border?, ditherType}
//! Authorization: Bearer {api_key}
//! ```
//!
//! Bitmaps are quantized locally, so images are sent as a 1-bit PNG with
//! `ditherType: "NONE"`.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{DeviceTransport, TransportError};
use crate::config::Config;
use crate::payload::{Bitmap, TextPayload};
use crate::render::dither::DitherType;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TextRequest<'a> {
    refresh_now: bool,
    device_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageRequest<'a> {
    refresh_now: bool,
    device_id: &'a str,
    image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    border: Option<u8>,
    dither_type: DitherType,
}

#[derive(Debug, Default, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    message: Option<String>,
}

/// HTTP client for the Dot. open API.
#[derive(Debug, Clone)]
pub struct DotClient {
    client: reqwest::Client,
    base: String,
    api_key: String,
}

impl DotClient {
    pub fn new(
        base: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dotmate/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base: base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        Self::new(
            config.api_base.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(), TransportError> {
        let url = format!("{}/{}", self.base, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let text = response.text().await.map_err(map_reqwest_error)?;
        let parsed: ApiResponse = serde_json::from_str(&text).unwrap_or_default();

        if !status.is_success() {
            return Err(TransportError::ServerRejected {
                status: status.as_u16(),
                message: parsed.message.unwrap_or(text),
            });
        }

        debug!(url = %url, message = ?parsed.message, "Device cloud accepted request");
        Ok(())
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(e.to_string())
    }
}

#[async_trait]
impl DeviceTransport for DotClient {
    async fn deliver_text(&self, device_id: &str, text: &TextPayload) -> Result<(), TransportError> {
        let body = TextRequest {
            refresh_now: true,
            device_id,
            title: text.title.as_deref(),
            message: &text.body,
            signature: text.signature.as_deref(),
            icon: text.icon.as_deref(),
            link: text.link.as_deref(),
        };
        self.post("text", &body).await
    }

    async fn deliver_bitmap(&self, device_id: &str, bitmap: &Bitmap) -> Result<(), TransportError> {
        let png = bitmap
            .to_png()
            .map_err(|e| TransportError::Network(format!("Cannot encode bitmap: {}", e)))?;
        let body = ImageRequest {
            refresh_now: true,
            device_id,
            image: BASE64.encode(png),
            link: bitmap.link.as_deref(),
            border: bitmap.border,
            dither_type: DitherType::None,
        };
        self.post("image", &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<(String, Option<String>, Value)>>>;

    /// Local stand-in for the device cloud, recording what it receives.
    async fn fake_cloud(status: StatusCode) -> (String, Seen) {
        let seen: Seen = Arc::default();
        let record = move |path: &'static str, seen: Seen| {
            move |headers: HeaderMap, Json(body): Json<Value>| {
                let seen = seen.clone();
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    seen.lock().unwrap().push((path.to_string(), auth, body));
                    (status, Json(json!({"message": "queued"})))
                }
            }
        };
        let app = Router::new()
            .route("/api/open/text", post(record("text", seen.clone())))
            .route("/api/open/image", post(record("image", seen.clone())));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/api/open", addr), seen)
    }

    #[tokio::test]
    async fn test_text_request_shape() {
        let (base, seen) = fake_cloud(StatusCode::OK).await;
        let client = DotClient::new(base, "secret", Duration::from_secs(5)).unwrap();
        let text = TextPayload {
            title: Some("Notice".into()),
            body: "Hello".into(),
            signature: Some("12:00".into()),
            icon: None,
            link: None,
        };
        client.deliver_text("ABCD", &text).await.unwrap();

        let seen = seen.lock().unwrap();
        let (path, auth, body) = &seen[0];
        assert_eq!(path, "text");
        assert_eq!(auth.as_deref(), Some("Bearer secret"));
        assert_eq!(
            body,
            &json!({
                "refreshNow": true,
                "deviceId": "ABCD",
                "title": "Notice",
                "message": "Hello",
                "signature": "12:00"
            })
        );
    }

    #[tokio::test]
    async fn test_image_request_carries_png() {
        let (base, seen) = fake_cloud(StatusCode::OK).await;
        let client = DotClient::new(base, "secret", Duration::from_secs(5)).unwrap();
        let mut bitmap = Bitmap::from_levels(8, 1, &[0, 255, 0, 255, 0, 255, 0, 255]);
        bitmap.border = Some(1);
        client.deliver_bitmap("ABCD", &bitmap).await.unwrap();

        let seen = seen.lock().unwrap();
        let (path, _, body) = &seen[0];
        assert_eq!(path, "image");
        assert_eq!(body["deviceId"], "ABCD");
        assert_eq!(body["border"], 1);
        assert_eq!(body["ditherType"], "NONE");
        assert!(body.get("link").is_none());

        let png = BASE64.decode(body["image"].as_str().unwrap()).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_luma8();
        assert_eq!(decoded.get_pixel(1, 0)[0], 255);
        assert_eq!(decoded.get_pixel(0, 0)[0], 0);
    }

    #[tokio::test]
    async fn test_rejection_carries_message() {
        let (base, _) = fake_cloud(StatusCode::BAD_REQUEST).await;
        let client = DotClient::new(base, "secret", Duration::from_secs(5)).unwrap();
        let text = TextPayload {
            title: None,
            body: "x".into(),
            signature: None,
            icon: None,
            link: None,
        };
        match client.deliver_text("ABCD", &text).await {
            Err(TransportError::ServerRejected { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "queued");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_is_network_error() {
        let client = DotClient::new("http://127.0.0.1:1", "k", Duration::from_secs(5)).unwrap();
        let bitmap = Bitmap::from_levels(8, 1, &[255; 8]);
        assert!(matches!(
            client.deliver_bitmap("ABCD", &bitmap).await,
            Err(TransportError::Network(_))
        ));
    }
}
