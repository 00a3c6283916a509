use std::sync::Mutex;

/// Receives formatted classification lines for display.
pub trait ResultSink: Send + Sync {
    fn display(&self, lines: &[String]);
}

/// Logs every non-empty line.
#[derive(Debug, Default)]
pub struct TracingResultSink;

impl ResultSink for TracingResultSink {
    fn display(&self, lines: &[String]) {
        for line in lines.iter().filter(|line| !line.is_empty()) {
            tracing::info!("{}", line);
        }
    }
}

/// Keeps the most recent lines, for callers that poll instead of render.
#[derive(Debug, Default)]
pub struct LatestResultSink {
    latest: Mutex<Vec<String>>,
}

impl LatestResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Vec<String> {
        self.latest
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }
}

impl ResultSink for LatestResultSink {
    fn display(&self, lines: &[String]) {
        if let Ok(mut latest) = self.latest.lock() {
            *latest = lines.to_vec();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_sink_keeps_last_lines() {
        let sink = LatestResultSink::new();
        assert!(sink.latest().is_empty());
        sink.display(&["a : 1 reps".to_string()]);
        sink.display(&["b : 2 reps".to_string(), "b : 0.90 confidence".to_string()]);
        assert_eq!(sink.latest(), vec!["b : 2 reps", "b : 0.90 confidence"]);
    }
}
