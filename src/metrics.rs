// src/metrics.rs
use std::path::Path;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Prometheus recorder for a one-shot process; the exposition is dumped to a
/// textfile instead of served over HTTP.
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global recorder. Call once, before the run.
    pub fn init() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        Ok(Self { handle })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Write the current exposition to `path` (temp file + rename, so a
    /// scraping collector never sees half a file).
    pub fn write_textfile(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating metrics dir {}", dir.display()))?;
        }
        let tmp = path.with_extension("prom.tmp");
        std::fs::write(&tmp, self.render())
            .with_context(|| format!("writing {}", tmp.display()))?;
        std::fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }
}
