use std::path::Path;

use anyhow::{Context, Result, bail};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

/// One detected defect, shaped the way the downstream product API expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefectEntry {
    pub defect_type: String,
    pub coordinates: String,
    pub confidence_rate: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DefectReport<'a> {
    name: &'a str,
    original_image: String,
    processed_image: String,
    timestamp: String,
    defective: bool,
    #[serde(rename = "defectDTOS")]
    defect_dtos: &'a [DefectEntry],
}

/// Ships inspection verdicts to the downstream product service. A non-2xx
/// response is reported as an error to the caller (which logs it) and is
/// never retried.
pub struct ReportClient {
    url: String,
    client: Client,
}

impl ReportClient {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: Client::new(),
        }
    }

    pub async fn send(
        &self,
        original: &Path,
        processed: Option<&Path>,
        defective: bool,
        defects: Vec<DefectEntry>,
    ) -> Result<()> {
        let original_image = encode_image(original).await?;
        let processed_image = match processed {
            Some(path) => encode_image(path).await?,
            None => original_image.clone(),
        };
        let name = original
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let report = DefectReport {
            name: &name,
            original_image,
            processed_image,
            timestamp: Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
            defective,
            defect_dtos: &defects,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&report)
            .send()
            .await
            .context("failed to send defect report")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            bail!("defect report rejected: status={status} body={body}");
        }

        info!("defect report delivered for {name}");
        Ok(())
    }
}

async fn encode_image(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read image {}", path.display()))?;
    Ok(STANDARD.encode(bytes))
}
