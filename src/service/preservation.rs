//! Preservation service
//!
//! Sends a baseline and a current photo of a monastery artefact to the
//! image comparison service and turns its verdict into recommendations.

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{Capability, Identity};
use crate::config::PreservationConfig;
use crate::error::AppError;
use crate::metrics::PRESERVATION_COMPARISONS_TOTAL;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

/// Degradation tier reported by the comparison service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    Poor,
    Moderate,
    Good,
    Excellent,
    NoChange,
    Unknown,
}

impl Severity {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().replace([' ', '-'], "_").as_str() {
            "CRITICAL" => Self::Critical,
            "POOR" => Self::Poor,
            "MODERATE" => Self::Moderate,
            "GOOD" => Self::Good,
            "EXCELLENT" => Self::Excellent,
            "NO_CHANGE" => Self::NoChange,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::Poor => "POOR",
            Self::Moderate => "MODERATE",
            Self::Good => "GOOD",
            Self::Excellent => "EXCELLENT",
            Self::NoChange => "NO_CHANGE",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Conservation advice for this tier
    pub fn recommendations(&self) -> &'static [&'static str] {
        match self {
            Self::Critical => &[
                "Restrict visitor access to the affected area immediately",
                "Contact a professional conservator for an on-site assessment",
                "Document the damage with high-resolution photographs from several angles",
                "Stabilise the surface before any cleaning is attempted",
            ],
            Self::Poor => &[
                "Schedule a conservator inspection within the month",
                "Reduce exposure to butter-lamp smoke, moisture and direct sunlight",
                "Repeat the comparison after any intervention",
            ],
            Self::Moderate => &[
                "Monitor the affected areas monthly with fresh photographs",
                "Check humidity and ventilation around the artefact",
                "Plan preventive conservation during the next maintenance cycle",
            ],
            Self::Good => &[
                "Continue routine quarterly documentation",
                "Keep cleaning gentle and non-abrasive",
            ],
            Self::Excellent | Self::NoChange => &[
                "No intervention needed; keep the current care routine",
                "Repeat the comparison annually to maintain the record",
            ],
            Self::Unknown => &[
                "The comparison result could not be classified; review the images manually",
            ],
        }
    }
}

/// One uploaded image
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct UpstreamComparison {
    similarity_score: f64,
    severity: String,
    #[serde(default)]
    affected_areas: serde_json::Value,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

/// Comparison verdict returned to the client
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub similarity_score: f64,
    pub severity: Severity,
    pub affected_areas: serde_json::Value,
    pub recommendations: Vec<String>,
    /// Any further fields reported by the comparison service
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl From<UpstreamComparison> for ComparisonReport {
    fn from(upstream: UpstreamComparison) -> Self {
        let severity = Severity::parse(&upstream.severity);
        Self {
            similarity_score: upstream.similarity_score,
            severity,
            affected_areas: upstream.affected_areas,
            recommendations: severity
                .recommendations()
                .iter()
                .map(|r| r.to_string())
                .collect(),
            details: upstream.extra,
        }
    }
}

fn check_image(image: &ImageUpload, field: &str) -> Result<(), AppError> {
    if image.data.is_empty() {
        return Err(AppError::Validation(format!("{} image is empty", field)));
    }
    if !image.content_type.starts_with("image/") {
        return Err(AppError::Validation(format!(
            "{} must be an image, got {}",
            field, image.content_type
        )));
    }
    Ok(())
}

fn image_part(image: ImageUpload) -> Result<Part, AppError> {
    Part::bytes(image.data)
        .file_name(image.file_name)
        .mime_str(&image.content_type)
        .map_err(|e| AppError::Validation(format!("Invalid content type: {}", e)))
}

/// Preservation service
pub struct PreservationService {
    http_client: Arc<reqwest::Client>,
    config: PreservationConfig,
}

impl PreservationService {
    /// Create new preservation service
    pub fn new(http_client: Arc<reqwest::Client>, config: PreservationConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.service_url.trim_end_matches('/'), path)
    }

    /// Compare a baseline photo against a current one
    ///
    /// # Errors
    /// - UpstreamUnavailable if the service is unreachable or times out
    /// - Upstream if it answers with an error or an unreadable body
    pub async fn compare(
        &self,
        requester: &Identity,
        baseline: ImageUpload,
        comparison: ImageUpload,
    ) -> Result<ComparisonReport, AppError> {
        requester.require(Capability::ComparePreservation)?;
        check_image(&baseline, "baseline")?;
        check_image(&comparison, "comparison")?;

        let form = Form::new()
            .part("baseline", image_part(baseline)?)
            .part("comparison", image_part(comparison)?);

        let response = self
            .http_client
            .post(self.endpoint("compare"))
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Image comparison service unreachable");
                AppError::UpstreamUnavailable(
                    "Image comparison service is unavailable".to_string(),
                )
            })?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Image comparison service returned HTTP {}",
                response.status()
            )));
        }

        let upstream: UpstreamComparison = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Malformed comparison result: {}", e)))?;
        let report = ComparisonReport::from(upstream);

        PRESERVATION_COMPARISONS_TOTAL
            .with_label_values(&[report.severity.as_str()])
            .inc();
        tracing::info!(
            requested_by = %requester.id,
            severity = report.severity.as_str(),
            similarity = report.similarity_score,
            "Preservation comparison completed"
        );

        Ok(report)
    }

    /// Health of the comparison service, passed through as JSON
    pub async fn health(&self) -> Result<serde_json::Value, AppError> {
        let response = self
            .http_client
            .get(self.endpoint("health"))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .map_err(|_| {
                AppError::UpstreamUnavailable(
                    "Image comparison service is unavailable".to_string(),
                )
            })?;

        if !response.status().is_success() {
            return Err(AppError::UpstreamUnavailable(format!(
                "Image comparison service reported HTTP {}",
                response.status()
            )));
        }

        let body = response.json::<serde_json::Value>().await.unwrap_or_else(|_| {
            serde_json::json!({ "status": "ok" })
        });
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn severity_parsing() {
        assert_eq!(Severity::parse("critical"), Severity::Critical);
        assert_eq!(Severity::parse("No Change"), Severity::NoChange);
        assert_eq!(Severity::parse("no-change"), Severity::NoChange);
        assert_eq!(Severity::parse("EXCELLENT"), Severity::Excellent);
        assert_eq!(Severity::parse("weird"), Severity::Unknown);
    }

    #[test]
    fn excellent_and_no_change_share_advice() {
        assert_eq!(
            Severity::Excellent.recommendations(),
            Severity::NoChange.recommendations()
        );
        assert_ne!(
            Severity::Critical.recommendations(),
            Severity::Good.recommendations()
        );
    }

    #[test]
    fn report_keeps_extra_fields() {
        let upstream: UpstreamComparison = serde_json::from_value(json!({
            "similarity_score": 0.42,
            "severity": "POOR",
            "affected_areas": [{ "x": 1, "y": 2 }],
            "ssim": 0.4
        }))
        .unwrap();

        let report = ComparisonReport::from(upstream);
        assert_eq!(report.severity, Severity::Poor);
        assert_eq!(report.recommendations.len(), 3);
        assert_eq!(report.details["ssim"], json!(0.4));

        let wire = serde_json::to_value(&report).unwrap();
        assert_eq!(wire["severity"], "POOR");
    }

    #[test]
    fn images_must_be_images() {
        let image = ImageUpload {
            file_name: "a.txt".to_string(),
            content_type: "text/plain".to_string(),
            data: vec![1],
        };
        assert!(check_image(&image, "baseline").is_err());

        let empty = ImageUpload {
            file_name: "a.png".to_string(),
            content_type: "image/png".to_string(),
            data: vec![],
        };
        assert!(check_image(&empty, "baseline").is_err());
    }
}
