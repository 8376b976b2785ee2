//! Ramping load generator for the catalog endpoints
//!
//! Each virtual user loops: list CPUs, pick one at random, ask for
//! motherboards compatible with it, think. The number of active users
//! follows a stage schedule, ramping linearly within each stage.

mod stats;

pub use stats::{
    percentile, EndpointStats, LoadStats, LoadTestReport, ThresholdResult, Thresholds,
};

use anyhow::{Context, Result};
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

const ENDPOINT_COMPONENTS: &str = "components";
const ENDPOINT_COMPATIBLE: &str = "compatible";

/// Scheduler resolution
const TICK: Duration = Duration::from_millis(100);

/// One step of the schedule: move to `target` users over `duration`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stage {
    pub duration: Duration,
    pub target: u32,
}

impl Stage {
    pub const fn secs(secs: u64, target: u32) -> Self {
        Self {
            duration: Duration::from_secs(secs),
            target,
        }
    }
}

/// 0 → 200 → 400 → 800 → 1000 → 0, holding at each plateau
pub fn default_stages() -> Vec<Stage> {
    vec![
        Stage::secs(15, 200),
        Stage::secs(30, 200),
        Stage::secs(15, 400),
        Stage::secs(30, 400),
        Stage::secs(15, 800),
        Stage::secs(30, 800),
        Stage::secs(15, 1000),
        Stage::secs(60, 1000),
        Stage::secs(30, 0),
    ]
}

pub fn total_duration(stages: &[Stage]) -> Duration {
    stages.iter().map(|s| s.duration).sum()
}

/// Target user count `elapsed` into the run.
///
/// Ramps linearly from the previous stage's target (0 before the first) to
/// the current one. Past the end of the schedule the last target holds.
pub fn target_vus_at(stages: &[Stage], elapsed: Duration) -> u32 {
    let mut from = 0u32;
    let mut start = Duration::ZERO;
    for stage in stages {
        let end = start + stage.duration;
        if elapsed < end {
            if stage.duration.is_zero() {
                return stage.target;
            }
            let progress = (elapsed - start).as_secs_f64() / stage.duration.as_secs_f64();
            let value = from as f64 + (stage.target as f64 - from as f64) * progress;
            return value.round().max(0.0) as u32;
        }
        from = stage.target;
        start = end;
    }
    from
}

#[derive(Debug, Clone)]
pub struct LoadTestConfig {
    pub base_url: String,
    pub stages: Vec<Stage>,
    /// Pause between iterations of one user
    pub think_time: Duration,
    /// How long running iterations may finish after the schedule ends
    pub graceful_stop: Duration,
    /// Multiplier applied to every stage duration and the graceful stop
    pub time_scale: f64,
    pub request_timeout: Duration,
    pub thresholds: Thresholds,
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            stages: default_stages(),
            think_time: Duration::from_secs(1),
            graceful_stop: Duration::from_secs(30),
            time_scale: 1.0,
            request_timeout: Duration::from_secs(60),
            thresholds: Thresholds::default(),
        }
    }
}

impl LoadTestConfig {
    fn scaled(&self, d: Duration) -> Duration {
        d.mul_f64(self.time_scale.max(0.0))
    }

    pub fn scaled_stages(&self) -> Vec<Stage> {
        self.stages
            .iter()
            .map(|s| Stage {
                duration: self.scaled(s.duration),
                target: s.target,
            })
            .collect()
    }
}

/// Pick the base URL: `BASE_URL` env, then the flag, then config, then default
pub fn resolve_base_url(env: Option<String>, flag: Option<String>, config: Option<&str>) -> String {
    env.filter(|s| !s.trim().is_empty())
        .or(flag)
        .or_else(|| config.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
        .trim_end_matches('/')
        .to_string()
}

type SharedStats = Arc<Mutex<LoadStats>>;

fn record(stats: &SharedStats, endpoint: &'static str, duration: Duration, failed: bool) {
    if let Ok(mut s) = stats.lock() {
        s.record(endpoint, duration, failed);
    }
}

/// Run the whole schedule and report
pub async fn run(config: LoadTestConfig) -> Result<LoadTestReport> {
    let client = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .context("Failed to build HTTP client")?;

    let stages = config.scaled_stages();
    let total = total_duration(&stages);
    let graceful_stop = config.scaled(config.graceful_stop);
    let base_url = config.base_url.trim_end_matches('/').to_string();

    tracing::info!(
        base_url = %base_url,
        stages = stages.len(),
        duration_secs = total.as_secs_f64(),
        "Starting load test"
    );

    let stats: SharedStats = Arc::new(Mutex::new(LoadStats::default()));
    let target = Arc::new(AtomicU32::new(0));
    let finished = Arc::new(AtomicBool::new(false));
    let mut users: Vec<JoinHandle<()>> = Vec::new();

    let started = Instant::now();
    let mut ticker = tokio::time::interval(TICK);
    let mut last_logged = 0u32;

    loop {
        ticker.tick().await;
        let elapsed = started.elapsed();
        if elapsed >= total {
            break;
        }

        let want = target_vus_at(&stages, elapsed);
        target.store(want, Ordering::Relaxed);

        while (users.len() as u32) < want {
            let vu = VirtualUser {
                id: users.len() as u32,
                client: client.clone(),
                base_url: base_url.clone(),
                think_time: config.think_time,
                stats: stats.clone(),
                target: target.clone(),
                finished: finished.clone(),
            };
            users.push(tokio::spawn(vu.run()));
        }

        if let Ok(mut s) = stats.lock() {
            s.peak_vus = s.peak_vus.max(want);
        }
        if want.abs_diff(last_logged) >= 50 || (want == 0) != (last_logged == 0) {
            tracing::info!(vus = want, elapsed_secs = elapsed.as_secs(), "Load level");
            last_logged = want;
        }
    }

    target.store(0, Ordering::Relaxed);
    finished.store(true, Ordering::Relaxed);

    // Let iterations in progress finish, then cut off the rest
    let deadline = Instant::now() + graceful_stop;
    let mut interrupted = 0usize;
    for mut handle in users {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if tokio::time::timeout(remaining, &mut handle).await.is_err() {
            handle.abort();
            interrupted += 1;
        }
    }
    if interrupted > 0 {
        tracing::warn!(interrupted, "Iterations cut off after graceful stop");
    }

    let stats = stats
        .lock()
        .map(|s| s.clone())
        .unwrap_or_else(|poisoned| poisoned.into_inner().clone());

    Ok(LoadTestReport {
        stats,
        thresholds: config.thresholds.clone(),
        elapsed: started.elapsed(),
    })
}

struct VirtualUser {
    id: u32,
    client: reqwest::Client,
    base_url: String,
    think_time: Duration,
    stats: SharedStats,
    target: Arc<AtomicU32>,
    finished: Arc<AtomicBool>,
}

impl VirtualUser {
    async fn run(self) {
        let mut iteration = 0u64;
        loop {
            if self.finished.load(Ordering::Relaxed) {
                break;
            }
            // Users above the current target idle until the level rises again
            if self.id >= self.target.load(Ordering::Relaxed) {
                tokio::time::sleep(TICK).await;
                continue;
            }

            let passed = self.iterate(iteration).await;
            if let Ok(mut s) = self.stats.lock() {
                s.iterations += 1;
                if !passed {
                    s.failed_checks += 1;
                }
            }
            iteration += 1;
            tokio::time::sleep(self.think_time).await;
        }
    }

    /// One scenario pass. Returns whether every check held.
    async fn iterate(&self, iteration: u64) -> bool {
        let started = Instant::now();
        let response = self
            .client
            .get(format!("{}/config/components", self.base_url))
            .query(&[("category", "cpu")])
            .send()
            .await;

        let cpus: Option<Vec<serde_json::Value>> = match response {
            Ok(resp) => {
                let status = resp.status();
                let body = resp.json::<Vec<serde_json::Value>>().await.ok();
                let elapsed = started.elapsed();
                record(&self.stats, ENDPOINT_COMPONENTS, elapsed, !status.is_success());
                if status.is_success() {
                    body
                } else {
                    None
                }
            }
            Err(e) => {
                record(&self.stats, ENDPOINT_COMPONENTS, started.elapsed(), true);
                tracing::trace!(vu = self.id, "components request failed: {}", e);
                None
            }
        };

        let names: Vec<&str> = cpus
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(|c| c.get("name").and_then(|n| n.as_str()))
            .collect();
        if names.is_empty() {
            return false;
        }
        let name = names[pick(names.len(), self.id, iteration)];

        let body = json!({
            "category": "motherboard",
            "bases": [{ "category": "cpu", "name": name }],
        });
        let started = Instant::now();
        match self
            .client
            .post(format!("{}/config/compatible", self.base_url))
            .json(&body)
            .send()
            .await
        {
            Ok(resp) => {
                let status = resp.status();
                // Drain the body so the timing covers the full response
                let _ = resp.bytes().await;
                record(
                    &self.stats,
                    ENDPOINT_COMPATIBLE,
                    started.elapsed(),
                    !status.is_success(),
                );
                status.is_success()
            }
            Err(e) => {
                record(&self.stats, ENDPOINT_COMPATIBLE, started.elapsed(), true);
                tracing::trace!(vu = self.id, "compatible request failed: {}", e);
                false
            }
        }
    }
}

/// Random index below `len`
fn pick(len: usize, vu: u32, iteration: u64) -> usize {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    // RandomState is randomly keyed per instance, so no extra dependency
    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u32(vu);
    hasher.write_u64(iteration);
    (hasher.finish() % len as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_matches_published_plan() {
        let stages = default_stages();
        assert_eq!(stages.len(), 9);
        assert_eq!(total_duration(&stages), Duration::from_secs(240));
        assert_eq!(stages.iter().map(|s| s.target).max(), Some(1000));
        assert_eq!(stages.last().map(|s| s.target), Some(0));
    }

    #[test]
    fn ramps_linearly_within_stage() {
        let stages = default_stages();
        assert_eq!(target_vus_at(&stages, Duration::ZERO), 0);
        assert_eq!(target_vus_at(&stages, Duration::from_millis(7_500)), 100);
        assert_eq!(target_vus_at(&stages, Duration::from_secs(15)), 200);
        assert_eq!(target_vus_at(&stages, Duration::from_secs(30)), 200);
        // halfway through the 200 -> 400 ramp
        assert_eq!(target_vus_at(&stages, Duration::from_millis(52_500)), 300);
        // plateau at 1000, then halfway through the final ramp down
        assert_eq!(target_vus_at(&stages, Duration::from_secs(200)), 1000);
        assert_eq!(target_vus_at(&stages, Duration::from_secs(225)), 500);
        assert_eq!(target_vus_at(&stages, Duration::from_secs(500)), 0);
    }

    #[test]
    fn base_url_precedence() {
        assert_eq!(
            resolve_base_url(
                Some("http://env:1".into()),
                Some("http://flag:2".into()),
                Some("http://cfg:3")
            ),
            "http://env:1"
        );
        assert_eq!(
            resolve_base_url(None, Some("http://flag:2/".into()), Some("http://cfg:3")),
            "http://flag:2"
        );
        assert_eq!(resolve_base_url(None, None, Some("http://cfg:3")), "http://cfg:3");
        assert_eq!(resolve_base_url(Some(" ".into()), None, None), DEFAULT_BASE_URL);
    }

    #[test]
    fn time_scale_shrinks_stages() {
        let config = LoadTestConfig {
            time_scale: 0.01,
            ..Default::default()
        };
        let scaled = config.scaled_stages();
        assert_eq!(scaled[0].duration, Duration::from_millis(150));
        assert_eq!(scaled[0].target, 200);
    }

    #[test]
    fn pick_stays_in_range() {
        for i in 0..100 {
            assert!(pick(3, 7, i) < 3);
        }
    }

    #[tokio::test]
    async fn short_run_against_demo_backend() {
        let server = crate::demo::DemoServer::start("127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();

        let config = LoadTestConfig {
            base_url: server.base_url(),
            stages: vec![
                Stage {
                    duration: Duration::from_millis(300),
                    target: 3,
                },
                Stage {
                    duration: Duration::from_millis(300),
                    target: 0,
                },
            ],
            think_time: Duration::from_millis(20),
            graceful_stop: Duration::from_secs(2),
            ..Default::default()
        };

        let report = run(config).await.unwrap();
        assert!(report.stats.iterations > 0);
        assert!(report.stats.total_requests() >= 2);
        assert_eq!(report.stats.total_failed(), 0);
        assert_eq!(report.stats.failed_checks, 0);
        assert!(report.stats.endpoints.contains_key("compatible"));

        server.shutdown().await;
    }
}
