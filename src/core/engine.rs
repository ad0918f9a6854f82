use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct PipelineEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> PipelineEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        let monitor = SystemMonitor::new(pipeline.name(), monitor_enabled);
        Self { pipeline, monitor }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting {} pipeline...", self.pipeline.name());

        tracing::debug!("Extracting data...");
        let raw_data = self.pipeline.extract().await?;
        self.monitor.log_phase("extract");

        tracing::debug!("Transforming data...");
        let transformed = self.pipeline.transform(raw_data).await?;
        self.monitor.log_phase("transform");

        tracing::debug!("Loading data...");
        let output_path = self.pipeline.load(transformed).await?;
        self.monitor.log_phase("load");
        self.monitor.log_summary();

        tracing::info!("Output saved to: {}", output_path);
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::AnnotateError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingPipeline {
        phases: AtomicUsize,
        fail_transform: bool,
    }

    #[async_trait::async_trait]
    impl Pipeline for CountingPipeline {
        type Extracted = Vec<u32>;
        type Transformed = u32;

        fn name(&self) -> &'static str {
            "counting"
        }

        async fn extract(&self) -> Result<Vec<u32>> {
            self.phases.fetch_add(1, Ordering::SeqCst);
            Ok(vec![1, 2, 3])
        }

        async fn transform(&self, data: Vec<u32>) -> Result<u32> {
            self.phases.fetch_add(1, Ordering::SeqCst);
            if self.fail_transform {
                return Err(AnnotateError::ProcessingError {
                    message: "boom".to_string(),
                });
            }
            Ok(data.iter().sum())
        }

        async fn load(&self, result: u32) -> Result<String> {
            self.phases.fetch_add(1, Ordering::SeqCst);
            Ok(format!("sum={}", result))
        }
    }

    #[tokio::test]
    async fn test_engine_runs_all_phases() {
        let engine = PipelineEngine::new(CountingPipeline {
            phases: AtomicUsize::new(0),
            fail_transform: false,
        });
        assert_eq!(engine.run().await.unwrap(), "sum=6");
        assert_eq!(engine.pipeline.phases.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_engine_stops_on_transform_error() {
        let engine = PipelineEngine::new_with_monitoring(
            CountingPipeline {
                phases: AtomicUsize::new(0),
                fail_transform: true,
            },
            true,
        );
        assert!(engine.run().await.is_err());
        assert_eq!(engine.pipeline.phases.load(Ordering::SeqCst), 2);
    }
}
