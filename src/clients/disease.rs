//! Client for the hosted rice-disease classifier.
//!
//! The model runs as a Gradio space. A prediction takes three calls: upload
//! the image, start a `predict` job, then read the job's event stream until it
//! reports `complete` (or `error`).

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::Config;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct DiseaseClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Prediction {
    pub label: String,
    #[serde(default)]
    pub confidences: Vec<Confidence>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Confidence {
    pub label: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    pub disease: String,
    /// Confidence of the top label in percent, two decimals
    pub confidence: Option<f64>,
    pub recommendations: Vec<String>,
}

#[derive(Deserialize)]
struct JobHandle {
    event_id: String,
}

impl DiseaseClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.disease_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.disease_model_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn predict(&self, image: Vec<u8>, filename: &str) -> AppResult<Diagnosis> {
        let path = self.upload(image, filename).await?;
        let event_id = self.start_prediction(&path).await?;
        let stream = self.fetch_result(&event_id).await?;

        let prediction = parse_event_stream(&stream)?;
        tracing::debug!(label = %prediction.label, "Disease model answered");

        Ok(Diagnosis::from(prediction))
    }

    async fn upload(&self, image: Vec<u8>, filename: &str) -> AppResult<String> {
        let form = Form::new().part("files", Part::bytes(image).file_name(filename.to_string()));

        let paths: Vec<String> = self
            .http
            .post(format!("{}/gradio_api/upload", self.base_url))
            .multipart(form)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(upstream("upload image"))?
            .json()
            .await
            .map_err(upstream("read upload response"))?;

        paths
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Upstream("Disease model returned no upload path".to_string()))
    }

    async fn start_prediction(&self, path: &str) -> AppResult<String> {
        let body = json!({
            "data": [{ "path": path, "meta": { "_type": "gradio.FileData" } }]
        });

        let handle: JobHandle = self
            .http
            .post(format!("{}/gradio_api/call/predict", self.base_url))
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(upstream("start prediction"))?
            .json()
            .await
            .map_err(upstream("read prediction handle"))?;

        Ok(handle.event_id)
    }

    async fn fetch_result(&self, event_id: &str) -> AppResult<String> {
        self.http
            .get(format!("{}/gradio_api/call/predict/{}", self.base_url, event_id))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(upstream("fetch prediction"))?
            .text()
            .await
            .map_err(upstream("read prediction stream"))
    }
}

fn upstream(step: &'static str) -> impl Fn(reqwest::Error) -> AppError {
    move |e| {
        tracing::warn!(error = %e, step, "Disease model request failed");
        AppError::Upstream(format!("Prediction failed: could not {}", step))
    }
}

/// Extract the prediction from a Gradio server-sent event stream.
///
/// The payload of the `complete` event is a JSON array whose first element is
/// the label output.
pub fn parse_event_stream(body: &str) -> AppResult<Prediction> {
    let mut event = "";

    for line in body.lines() {
        if let Some(name) = line.strip_prefix("event:") {
            event = name.trim();
            continue;
        }

        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();

        match event {
            "complete" => {
                let outputs: Vec<Prediction> = serde_json::from_str(data).map_err(|e| {
                    AppError::Upstream(format!("Invalid response format from model: {}", e))
                })?;
                return outputs.into_iter().next().ok_or_else(|| {
                    AppError::Upstream("Invalid response format from model".to_string())
                });
            }
            "error" => {
                return Err(AppError::Upstream(format!("Prediction failed: {}", data)));
            }
            _ => {}
        }
    }

    Err(AppError::Upstream(
        "Disease model stream ended without a result".to_string(),
    ))
}

/// Field advice for a diagnosed disease
pub fn recommendations_for(disease: &str) -> &'static [&'static str] {
    match disease {
        "Blast" => &["Use fungicide", "Reduce nitrogen usage", "Improve drainage"],
        "Brownspot" => &["Apply balanced fertilizer", "Ensure clean seed stock"],
        "Leafsmut" => &["Improve air circulation", "Apply copper-based fungicide"],
        _ => &["Monitor closely", "Consult agronomist"],
    }
}

impl From<Prediction> for Diagnosis {
    fn from(prediction: Prediction) -> Self {
        let confidence = prediction
            .confidences
            .iter()
            .find(|c| c.label == prediction.label)
            .map(|c| (c.confidence * 10_000.0).round() / 100.0);

        let recommendations = recommendations_for(&prediction.label)
            .iter()
            .map(|r| r.to_string())
            .collect();

        Self {
            disease: prediction.label,
            confidence,
            recommendations,
        }
    }
}
