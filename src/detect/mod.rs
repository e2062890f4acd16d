pub mod report;

use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::info;

use self::report::{DefectEntry, ReportClient};

/// Defect-classification seam. Implementations receive a fully written
/// image file, run their pipeline and report the verdict downstream; the
/// capture service dispatches fire-and-forget and never inspects the
/// outcome.
#[async_trait]
pub trait Detector: Send + Sync {
    async fn process(&self, image_path: &Path) -> Result<()>;
}

/// Verdict the external inference command prints as JSON on stdout.
#[derive(Debug, Deserialize)]
struct DetectionVerdict {
    defective: bool,
    #[serde(rename = "processedImage")]
    processed_image: Option<PathBuf>,
    #[serde(default)]
    defects: Vec<DefectEntry>,
}

/// Delegates preprocessing and inference to a configured external command
/// (`<program> <image-path>`), then forwards its verdict through the
/// report client.
pub struct ExternalDetector {
    program: String,
    reporter: ReportClient,
}

impl ExternalDetector {
    pub fn new(program: String, reporter: ReportClient) -> Self {
        Self { program, reporter }
    }

    async fn run_inference(&self, image_path: &Path) -> Result<DetectionVerdict> {
        let output = Command::new(&self.program)
            .arg(image_path)
            .stdin(Stdio::null())
            .output()
            .await
            .context("failed to run inference command")?;

        if !output.status.success() {
            bail!("inference command exited with {}", output.status);
        }

        serde_json::from_slice(&output.stdout)
            .context("inference command produced invalid verdict JSON")
    }
}

#[async_trait]
impl Detector for ExternalDetector {
    async fn process(&self, image_path: &Path) -> Result<()> {
        let verdict = self.run_inference(image_path).await?;
        info!(
            "detection verdict for {}: defective={} ({} defects)",
            image_path.display(),
            verdict.defective,
            verdict.defects.len()
        );
        self.reporter
            .send(
                image_path,
                verdict.processed_image.as_deref(),
                verdict.defective,
                verdict.defects,
            )
            .await
    }
}
