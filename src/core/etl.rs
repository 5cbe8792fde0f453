use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::RunMonitor;
use std::sync::Mutex;

/// Runs a [`Pipeline`] phase by phase, logging progress and optionally resource usage.
pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: Mutex<RunMonitor>,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: Mutex::new(RunMonitor::new(monitor_enabled)),
        }
    }

    fn checkpoint(&self, phase: &str) {
        if let Ok(mut monitor) = self.monitor.lock() {
            if monitor.is_enabled() {
                monitor.log_phase(phase);
            }
        }
    }

    pub async fn run(&self) -> Result<P::Report> {
        let name = self.pipeline.name();
        tracing::info!("🚀 Starting {} run", name);

        // Extract
        tracing::info!("📥 Extracting...");
        let extracted = self.pipeline.extract().await?;
        self.checkpoint("Extract");

        // Transform
        tracing::info!("🔄 Transforming...");
        let transformed = self.pipeline.transform(extracted).await?;
        self.checkpoint("Transform");

        // Load
        tracing::info!("💾 Loading...");
        let report = self.pipeline.load(transformed).await?;
        self.checkpoint("Load");

        if let Ok(mut monitor) = self.monitor.lock() {
            monitor.log_final_stats();
        }
        tracing::info!("✅ {} run finished", name);

        Ok(report)
    }
}
