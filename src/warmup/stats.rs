use std::time::Duration;

/// Outcome of a single warmup request
#[derive(Debug, Clone)]
pub struct Hit {
    pub latency: Duration,
    pub status: Option<u16>,
    pub error: Option<String>,
}

impl Hit {
    /// Only a 2xx response without transport error counts as success.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.status.is_some_and(|code| (200..300).contains(&code))
    }
}

/// Aggregates hits for one run. Percentiles are computed post-hoc over the
/// full latency distribution.
#[derive(Debug, Default)]
pub struct LatencyStats {
    latencies: Vec<Duration>,
    successes: u32,
    last_error: Option<String>,
}

impl LatencyStats {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            latencies: Vec::with_capacity(capacity),
            ..Default::default()
        }
    }

    pub fn record(&mut self, hit: &Hit) {
        self.latencies.push(hit.latency);
        if hit.is_success() {
            self.successes += 1;
        } else if let Some(err) = &hit.error {
            self.last_error = Some(err.clone());
        } else if let Some(code) = hit.status {
            self.last_error = Some(format!("HTTP {}", code));
        }
    }

    pub fn requests(&self) -> u32 {
        self.latencies.len() as u32
    }

    pub fn successes(&self) -> u32 {
        self.successes
    }

    pub fn failures(&self) -> u32 {
        self.requests() - self.successes
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Nearest-rank percentile, `q` in (0, 1]. Zero when nothing was recorded.
    pub fn percentile(&self, q: f64) -> Duration {
        if self.latencies.is_empty() {
            return Duration::ZERO;
        }
        let mut sorted = self.latencies.clone();
        sorted.sort_unstable();
        let rank = (q * sorted.len() as f64).ceil() as usize;
        sorted[rank.clamp(1, sorted.len()) - 1]
    }
}
