//! Request metrics and pass/fail thresholds for a load run

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

/// Samples for one endpoint
#[derive(Debug, Clone, Default)]
pub struct EndpointStats {
    durations: Vec<Duration>,
    failed: u64,
}

impl EndpointStats {
    pub fn record(&mut self, duration: Duration, failed: bool) {
        self.durations.push(duration);
        if failed {
            self.failed += 1;
        }
    }

    pub fn requests(&self) -> u64 {
        self.durations.len() as u64
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }

    pub fn percentile(&self, p: f64) -> Option<Duration> {
        percentile(&self.durations, p)
    }
}

/// Nearest-rank percentile (`p` in 0..=100); `None` with no samples
pub fn percentile(samples: &[Duration], p: f64) -> Option<Duration> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_unstable();
    let rank = ((p.clamp(0.0, 100.0) / 100.0) * sorted.len() as f64).ceil() as usize;
    Some(sorted[rank.saturating_sub(1).min(sorted.len() - 1)])
}

/// Everything collected during a run
#[derive(Debug, Clone, Default)]
pub struct LoadStats {
    pub endpoints: BTreeMap<&'static str, EndpointStats>,
    pub iterations: u64,
    pub failed_checks: u64,
    pub peak_vus: u32,
}

impl LoadStats {
    pub fn record(&mut self, endpoint: &'static str, duration: Duration, failed: bool) {
        self.endpoints
            .entry(endpoint)
            .or_default()
            .record(duration, failed);
    }

    pub fn total_requests(&self) -> u64 {
        self.endpoints.values().map(EndpointStats::requests).sum()
    }

    pub fn total_failed(&self) -> u64 {
        self.endpoints.values().map(EndpointStats::failed).sum()
    }

    /// Share of failed requests, 0.0 with no requests
    pub fn failure_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.0
        } else {
            self.total_failed() as f64 / total as f64
        }
    }

    /// Percentile across every endpoint
    pub fn overall_percentile(&self, p: f64) -> Option<Duration> {
        let all: Vec<Duration> = self
            .endpoints
            .values()
            .flat_map(|e| e.durations.iter().copied())
            .collect();
        percentile(&all, p)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Thresholds
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    /// `http_req_failed` rate must stay below this
    pub max_failure_rate: f64,
    /// `http_req_duration` p(95) must stay below this
    pub max_p95: Duration,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_failure_rate: 0.01,
            max_p95: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdResult {
    pub name: &'static str,
    pub observed: String,
    pub limit: String,
    pub passed: bool,
}

/// Final outcome of a run
#[derive(Debug, Clone)]
pub struct LoadTestReport {
    pub stats: LoadStats,
    pub thresholds: Thresholds,
    pub elapsed: Duration,
}

impl LoadTestReport {
    pub fn threshold_results(&self) -> Vec<ThresholdResult> {
        let rate = self.stats.failure_rate();
        let p95 = self.stats.overall_percentile(95.0);

        vec![
            ThresholdResult {
                name: "http_req_failed",
                observed: format!("rate={:.2}%", rate * 100.0),
                limit: format!("rate<{}", self.thresholds.max_failure_rate),
                passed: rate < self.thresholds.max_failure_rate,
            },
            ThresholdResult {
                name: "http_req_duration",
                observed: match p95 {
                    Some(d) => format!("p(95)={:.1}ms", d.as_secs_f64() * 1000.0),
                    None => "p(95)=n/a".to_string(),
                },
                limit: format!("p(95)<{}ms", self.thresholds.max_p95.as_millis()),
                // No samples means nothing crossed the line
                passed: p95.map_or(true, |d| d < self.thresholds.max_p95),
            },
        ]
    }

    pub fn passed(&self) -> bool {
        self.threshold_results().iter().all(|t| t.passed)
    }

    /// Human-readable summary, one metric per line
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let s = &self.stats;
        let _ = writeln!(out, "duration ........ {:.1}s", self.elapsed.as_secs_f64());
        let _ = writeln!(out, "iterations ...... {}", s.iterations);
        let _ = writeln!(out, "failed checks ... {}", s.failed_checks);
        let _ = writeln!(out, "peak vus ........ {}", s.peak_vus);
        let _ = writeln!(
            out,
            "http_reqs ....... {} ({} failed)",
            s.total_requests(),
            s.total_failed()
        );
        for (name, endpoint) in &s.endpoints {
            let _ = writeln!(
                out,
                "  {:<20} reqs={:<7} failed={:<5} p50={} p95={}",
                name,
                endpoint.requests(),
                endpoint.failed(),
                fmt_ms(endpoint.percentile(50.0)),
                fmt_ms(endpoint.percentile(95.0)),
            );
        }
        out.push('\n');
        for t in self.threshold_results() {
            let mark = if t.passed { "✓" } else { "✗" };
            let _ = writeln!(out, "{} {} {} (limit {})", mark, t.name, t.observed, t.limit);
        }
        out
    }
}

fn fmt_ms(d: Option<Duration>) -> String {
    match d {
        Some(d) => format!("{:.1}ms", d.as_secs_f64() * 1000.0),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn nearest_rank_percentile() {
        let samples: Vec<Duration> = (1..=100).map(ms).collect();
        assert_eq!(percentile(&samples, 95.0), Some(ms(95)));
        assert_eq!(percentile(&samples, 50.0), Some(ms(50)));
        assert_eq!(percentile(&samples, 100.0), Some(ms(100)));
        assert_eq!(percentile(&samples, 0.0), Some(ms(1)));
        assert_eq!(percentile(&[], 95.0), None);
    }

    #[test]
    fn thresholds_pass_on_fast_clean_run() {
        let mut stats = LoadStats::default();
        for _ in 0..200 {
            stats.record("components", ms(20), false);
        }
        let report = LoadTestReport {
            stats,
            thresholds: Thresholds::default(),
            elapsed: Duration::from_secs(1),
        };
        assert!(report.passed());
        assert!(report.summary().contains("http_req_duration"));
    }

    #[test]
    fn failure_rate_threshold_is_strict() {
        let mut stats = LoadStats::default();
        for i in 0..100 {
            stats.record("compatible", ms(10), i == 0);
        }
        // exactly 1% is not below 1%
        assert!((stats.failure_rate() - 0.01).abs() < f64::EPSILON);
        let report = LoadTestReport {
            stats,
            thresholds: Thresholds::default(),
            elapsed: Duration::from_secs(1),
        };
        let results = report.threshold_results();
        assert!(!results[0].passed);
        assert!(results[1].passed);
        assert!(!report.passed());
    }

    #[test]
    fn slow_p95_fails() {
        let mut stats = LoadStats::default();
        for i in 0..20 {
            let d = if i < 18 { ms(50) } else { ms(900) };
            stats.record("components", d, false);
        }
        let report = LoadTestReport {
            stats,
            thresholds: Thresholds::default(),
            elapsed: Duration::from_secs(1),
        };
        assert!(!report.threshold_results()[1].passed);
    }
}
