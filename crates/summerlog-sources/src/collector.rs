//! Per-run log collection

use summerlog_core::{CaptureWindow, Error, LogBundle, Result};

use crate::runtime::{ContainerRuntime, RuntimeError};

/// Gathers one bundle per container for a capture window
pub struct LogCollector<'a> {
    runtime: &'a dyn ContainerRuntime,
    containers: Vec<String>,
}

impl<'a> LogCollector<'a> {
    /// `containers` empty means every running container.
    pub fn new(runtime: &'a dyn ContainerRuntime, containers: Vec<String>) -> Self {
        Self {
            runtime,
            containers,
        }
    }

    /// Names this run will collect from.
    pub async fn targets(&self) -> Result<Vec<String>> {
        if !self.containers.is_empty() {
            return Ok(self.containers.clone());
        }

        match self.runtime.list_containers().await {
            Ok(names) => Ok(names),
            Err(RuntimeError::Unavailable(msg)) => Err(Error::DockerUnavailable(msg)),
            Err(other) => Err(Error::DockerUnavailable(other.to_string())),
        }
    }

    /// Fetch logs for every target. A single container failing is recorded in
    /// its bundle; only failing to enumerate containers is an error.
    pub async fn collect(&self, window: &CaptureWindow) -> Result<Vec<LogBundle>> {
        let targets = self.targets().await?;
        tracing::info!(containers = targets.len(), window = %window.describe(), "collecting logs");

        let mut bundles = Vec::with_capacity(targets.len());
        for name in targets {
            match self.runtime.fetch_logs(&name, window).await {
                Ok(text) => {
                    tracing::debug!(container = %name, chars = text.len(), "captured logs");
                    bundles.push(LogBundle::captured(name, *window, text));
                }
                Err(e) => {
                    tracing::warn!(container = %name, error = %e, "failed to fetch logs");
                    bundles.push(LogBundle::failed(name, *window, e.to_string()));
                }
            }
        }

        Ok(bundles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use time::OffsetDateTime;

    struct FakeRuntime {
        running: std::result::Result<Vec<String>, String>,
        failing: Vec<&'static str>,
        fetched: Mutex<Vec<String>>,
    }

    impl FakeRuntime {
        fn new(running: &[&str]) -> Self {
            Self {
                running: Ok(running.iter().map(|s| s.to_string()).collect()),
                failing: Vec::new(),
                fetched: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ContainerRuntime for FakeRuntime {
        async fn list_containers(&self) -> std::result::Result<Vec<String>, RuntimeError> {
            self.running.clone().map_err(RuntimeError::Unavailable)
        }

        async fn fetch_logs(
            &self,
            name: &str,
            _window: &CaptureWindow,
        ) -> std::result::Result<String, RuntimeError> {
            self.fetched.lock().unwrap().push(name.to_string());
            if self.failing.contains(&name) {
                return Err(RuntimeError::Fetch {
                    container: name.to_string(),
                    reason: "no such container".to_string(),
                });
            }
            Ok(format!("{name}: started\n"))
        }
    }

    fn window() -> CaptureWindow {
        CaptureWindow::since_last_run(None, 24, OffsetDateTime::UNIX_EPOCH)
    }

    #[tokio::test]
    async fn test_collects_every_running_container() {
        let runtime = FakeRuntime::new(&["web", "db"]);
        let collector = LogCollector::new(&runtime, Vec::new());

        let bundles = collector.collect(&window()).await.unwrap();

        assert_eq!(bundles.len(), 2);
        assert!(bundles.iter().all(LogBundle::is_captured));
        assert_eq!(bundles[1].container, "db");
    }

    #[tokio::test]
    async fn test_per_container_failure_is_recorded() {
        let mut runtime = FakeRuntime::new(&["web", "db", "worker"]);
        runtime.failing = vec!["db"];
        let collector = LogCollector::new(&runtime, Vec::new());

        let bundles = collector.collect(&window()).await.unwrap();

        assert_eq!(bundles.len(), 3);
        assert_eq!(bundles.iter().filter(|b| b.is_captured()).count(), 2);
        assert!(bundles[1].failure_reason().unwrap().contains("no such container"));
    }

    #[tokio::test]
    async fn test_configured_containers_skip_listing() {
        let mut runtime = FakeRuntime::new(&[]);
        runtime.running = Err("daemon down".to_string());
        let collector = LogCollector::new(&runtime, vec!["api".to_string()]);

        let bundles = collector.collect(&window()).await.unwrap();

        assert_eq!(bundles.len(), 1);
        assert_eq!(*runtime.fetched.lock().unwrap(), vec!["api".to_string()]);
    }

    #[tokio::test]
    async fn test_enumeration_failure_is_fatal() {
        let mut runtime = FakeRuntime::new(&[]);
        runtime.running = Err("Cannot connect to the Docker daemon".to_string());
        let collector = LogCollector::new(&runtime, Vec::new());

        let err = collector.collect(&window()).await.unwrap_err();
        assert!(matches!(err, Error::DockerUnavailable(_)));
    }
}
