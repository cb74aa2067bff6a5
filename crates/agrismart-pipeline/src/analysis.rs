//! Analysis engine seam
//!
//! Implement [`AnalysisEngine`] to plug in real inference. The default
//! engine returns a fixed pair of findings.

use crate::error::OperationError;
use agrismart_core::{DiseaseCategory, DiseaseSeverity, Detection, ScanRequest};

/// Produces detections for an uploaded scan
#[async_trait::async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Analyse the imagery attached to `request`
    async fn analyze(&self, request: &ScanRequest) -> Result<Vec<Detection>, OperationError>;
}

/// Returns the same two detections for every request
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticAnalysisEngine;

#[async_trait::async_trait]
impl AnalysisEngine for StaticAnalysisEngine {
    async fn analyze(&self, request: &ScanRequest) -> Result<Vec<Detection>, OperationError> {
        tracing::debug!(request_id = %request.id, "static analysis");
        Ok(vec![
            Detection {
                id: "det-auto-1".to_string(),
                disease_name: "Late Blight".to_string(),
                category: DiseaseCategory::Fungal,
                severity: DiseaseSeverity::High,
                confidence: 94.2,
                affected_area: 18.0,
                description: "Phytophthora infestans detected. Dark water-soaked lesions \
                              visible on leaf tissue."
                    .to_string(),
                treatment: "Apply copper-based fungicide (Mancozeb 75% WP) at 2g/L.".to_string(),
            },
            Detection {
                id: "det-auto-2".to_string(),
                disease_name: "Nitrogen Deficiency".to_string(),
                category: DiseaseCategory::Nutrient,
                severity: DiseaseSeverity::Moderate,
                confidence: 87.1,
                affected_area: 25.0,
                description: "Yellowing of lower leaves indicating nitrogen deficiency."
                    .to_string(),
                treatment: "Apply urea fertilizer at 46kg N/ha.".to_string(),
            },
        ])
    }
}
