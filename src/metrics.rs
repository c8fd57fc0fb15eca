use once_cell::sync::Lazy;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use sysinfo::System;

const LATENCY_WINDOW: usize = 100;

#[derive(Debug, Default)]
struct RequestStats {
    response_times: VecDeque<f64>,
    success_count: u64,
    failed_count: u64,
    tokens_sent: u64,
    tokens_received: u64,
}

#[derive(Debug, Clone, Copy, Default)]
struct SystemStats {
    cpu_percent: f32,
    memory_used_mb: u64,
}

static REQUESTS: Lazy<Mutex<RequestStats>> = Lazy::new(|| Mutex::new(RequestStats::default()));
static SYSTEM: Lazy<Mutex<SystemStats>> = Lazy::new(|| Mutex::new(SystemStats::default()));

#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub success_count: u64,
    pub failed_count: u64,
    pub tokens_sent: u64,
    pub tokens_received: u64,
    pub min_response_time: f64,
    pub max_response_time: f64,
    pub avg_response_time: f64,
    pub cpu_percent: f32,
    pub memory_used_mb: u64,
}

/// Rough token estimate from whitespace word count.
pub fn estimate_tokens(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

pub fn record_request(elapsed: Duration, success: bool, tokens_sent: u64, tokens_received: u64) {
    if let Ok(mut stats) = REQUESTS.lock() {
        if stats.response_times.len() >= LATENCY_WINDOW {
            stats.response_times.pop_front();
        }
        stats.response_times.push_back(elapsed.as_secs_f64());
        if success {
            stats.success_count += 1;
        } else {
            stats.failed_count += 1;
        }
        stats.tokens_sent += tokens_sent;
        stats.tokens_received += tokens_received;
    }
}

pub fn snapshot() -> MetricsSnapshot {
    let mut snapshot = MetricsSnapshot::default();

    if let Ok(stats) = REQUESTS.lock() {
        snapshot.success_count = stats.success_count;
        snapshot.failed_count = stats.failed_count;
        snapshot.tokens_sent = stats.tokens_sent;
        snapshot.tokens_received = stats.tokens_received;
        if !stats.response_times.is_empty() {
            snapshot.min_response_time =
                stats.response_times.iter().cloned().fold(f64::INFINITY, f64::min);
            snapshot.max_response_time =
                stats.response_times.iter().cloned().fold(0.0, f64::max);
            snapshot.avg_response_time =
                stats.response_times.iter().sum::<f64>() / stats.response_times.len() as f64;
        }
    }

    if let Ok(system) = SYSTEM.lock() {
        snapshot.cpu_percent = system.cpu_percent;
        snapshot.memory_used_mb = system.memory_used_mb;
    }

    snapshot
}

/// Background sampler polling CPU and memory once per second.
pub fn spawn_sampler() {
    std::thread::spawn(|| {
        let mut system = System::new();
        loop {
            system.refresh_cpu_usage();
            system.refresh_memory();

            if let Ok(mut stats) = SYSTEM.lock() {
                stats.cpu_percent = system.global_cpu_usage();
                stats.memory_used_mb = system.used_memory() / (1024 * 1024);
            }

            std::thread::sleep(Duration::from_secs(1));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("one two  three\nfour"), 4);
    }

    // single test so the global counters are not raced by the test harness
    #[test]
    fn test_record_and_snapshot() {
        record_request(Duration::from_millis(100), true, 10, 20);
        record_request(Duration::from_millis(300), false, 5, 0);

        let snapshot = snapshot();
        assert!(snapshot.success_count >= 1);
        assert!(snapshot.failed_count >= 1);
        assert!(snapshot.tokens_sent >= 15);
        assert!(snapshot.tokens_received >= 20);
        assert!(snapshot.min_response_time > 0.0);
        assert!(snapshot.max_response_time >= snapshot.min_response_time);
        assert!(snapshot.avg_response_time >= snapshot.min_response_time);
        assert!(snapshot.avg_response_time <= snapshot.max_response_time);
    }
}
