//! Client for the remote `/predict` endpoint.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::PredictorConfig;
use crate::error::{PredictError, PredictResult};
use crate::model::{ImageFile, PredictionResult};

#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(&self, image: &ImageFile) -> PredictResult<PredictionResult>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct HttpPredictor {
    http: Client,
    url: String,
}

impl HttpPredictor {
    pub fn new(config: &PredictorConfig) -> PredictResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            url: config.predict_url(),
        })
    }

    fn form(image: &ImageFile) -> PredictResult<Form> {
        let part = Part::bytes(image.bytes.to_vec())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .map_err(|e| PredictError::InvalidUpload(e.to_string()))?;
        Ok(Form::new().part("file", part))
    }
}

#[async_trait]
impl Predictor for HttpPredictor {
    async fn predict(&self, image: &ImageFile) -> PredictResult<PredictionResult> {
        debug!(
            "Uploading {} ({} bytes) to {}",
            image.file_name,
            image.bytes.len(),
            self.url
        );

        let response = self
            .http
            .post(&self.url)
            .multipart(Self::form(image)?)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .ok()
                .map(|b| b.error);
            warn!("Prediction endpoint returned {}: {:?}", status, message);
            return Err(PredictError::server(status, message));
        }

        serde_json::from_slice(&body).map_err(|e| PredictError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn leaf() -> ImageFile {
        ImageFile::new("leaf.jpg", "image/jpeg", b"fake-jpeg-bytes".to_vec())
    }

    fn predictor_for(server: &MockServer) -> HttpPredictor {
        HttpPredictor::new(&PredictorConfig {
            endpoint: server.uri(),
            timeout: None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn uploads_file_field_and_parses_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .and(body_string_contains("name=\"file\"; filename=\"leaf.jpg\""))
            .and(body_string_contains("Content-Type: image/jpeg"))
            .and(body_string_contains("fake-jpeg-bytes"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"label": "Tomato-Leaf-Mold", "confidence": 87})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = predictor_for(&server).predict(&leaf()).await.unwrap();
        assert_eq!(result.label, "Tomato-Leaf-Mold");
        assert_eq!(result.confidence, 87.0);
    }

    #[tokio::test]
    async fn error_body_message_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/predict"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({"error": "cannot identify image"})),
            )
            .mount(&server)
            .await;

        let err = predictor_for(&server).predict(&leaf()).await.unwrap_err();
        match err {
            PredictError::Server { status, message } => {
                assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
                assert_eq!(message.as_deref(), Some("cannot identify image"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_error_body_is_tolerated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = predictor_for(&server).predict(&leaf()).await.unwrap_err();
        assert!(matches!(
            err,
            PredictError::Server { status, message: None } if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
    }

    #[tokio::test]
    async fn malformed_success_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"prediction": []})))
            .mount(&server)
            .await;

        let err = predictor_for(&server).predict(&leaf()).await.unwrap_err();
        assert!(matches!(err, PredictError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn malformed_content_type_fails_before_sending() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let image = ImageFile::new("leaf.png", "image/<png>", b"fake-png-bytes".to_vec());
        let err = predictor_for(&server).predict(&image).await.unwrap_err();
        assert!(matches!(err, PredictError::InvalidUpload(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        let predictor = HttpPredictor::new(&PredictorConfig {
            endpoint: "http://127.0.0.1:9".into(),
            timeout: Some(Duration::from_secs(2)),
        })
        .unwrap();

        let err = predictor.predict(&leaf()).await.unwrap_err();
        assert!(matches!(err, PredictError::Network(_)));
    }

    #[test]
    fn predict_url_ignores_trailing_slash() {
        let predictor = HttpPredictor::new(&PredictorConfig {
            endpoint: "http://localhost:8000/".into(),
            timeout: None,
        })
        .unwrap();
        assert_eq!(predictor.url, "http://localhost:8000/predict");
    }
}
