//! HTTP client for the Strava v3 API with rate limiting.
//!
//! This module fetches the inputs of the analysis pipeline:
//! - Athlete heart rate zones
//! - Activity streams (heart rate, velocity, altitude, time, distance)
//! - Activity listings filtered to runs
//!
//! The client takes an already-issued access token. Requests share a sliding
//! window rate limiter (100 requests per 15 minutes) and back off
//! exponentially on 429.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Semaphore};

use crate::error::{PaceZonesError, Result};
use crate::zones::{ZoneBoundary, ZoneClassifier};
use crate::ActivityStreams;

const DEFAULT_BASE_URL: &str = "https://www.strava.com/api/v3";

// API rate limits
const SHORT_TERM_LIMIT: usize = 100; // Max read requests per window
const WINDOW_MS: u64 = 15 * 60 * 1000; // 15 minute window

// Concurrency settings
const MAX_CONCURRENCY: usize = 8;
const MAX_RETRIES: u32 = 3;

/// Stream keys requested for every activity.
const STREAM_KEYS: &str = "heartrate,velocity_smooth,altitude,time,distance";

/// Result of fetching one activity's streams in a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamFetchResult {
    pub activity_id: String,
    pub streams: Option<ActivityStreams>,
    pub success: bool,
    pub error: Option<String>,
}

impl StreamFetchResult {
    fn failed(activity_id: &str, error: String) -> Self {
        Self {
            activity_id: activity_id.to_string(),
            streams: None,
            success: false,
            error: Some(error),
        }
    }
}

/// Activity listing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub id: u64,
    pub name: String,
    pub start_date: Option<String>,
    /// Distance in meters
    pub distance: Option<f64>,
    /// Moving time in seconds
    pub moving_time: Option<u32>,
    /// Elapsed time in seconds
    pub elapsed_time: Option<u32>,
    /// Total elevation gain in meters
    pub total_elevation_gain: Option<f64>,
    #[serde(rename = "type", default)]
    pub activity_type: String,
    #[serde(default)]
    pub sport_type: Option<String>,
    /// Average speed in m/s
    pub average_speed: Option<f64>,
    /// Max speed in m/s
    pub max_speed: Option<f64>,
    pub average_heartrate: Option<f64>,
    pub max_heartrate: Option<f64>,
}

impl ActivitySummary {
    /// Runs, trail runs and virtual runs.
    pub fn is_run(&self) -> bool {
        self.activity_type.contains("Run")
            || self
                .sport_type
                .as_deref()
                .map_or(false, |s| s.contains("Run"))
    }
}

/// One stream in a `key_by_type` response
#[derive(Debug, Deserialize)]
pub struct StreamData {
    pub data: Vec<f64>,
}

/// API response for athlete zones
#[derive(Debug, Deserialize)]
struct ZonesApiResponse {
    heart_rate: Option<HeartRateZones>,
}

#[derive(Debug, Deserialize)]
struct HeartRateZones {
    zones: Vec<ZoneBoundary>,
}

/// Progress callback type
pub type ProgressCallback = Arc<dyn Fn(u32, u32) + Send + Sync>;

/// Rate limiter using sliding window
struct RateLimiter {
    request_times: Mutex<VecDeque<Instant>>,
    consecutive_429s: AtomicU32,
}

impl RateLimiter {
    fn new() -> Self {
        Self {
            request_times: Mutex::new(VecDeque::with_capacity(SHORT_TERM_LIMIT + 10)),
            consecutive_429s: AtomicU32::new(0),
        }
    }

    async fn wait_if_needed(&self) {
        loop {
            let wait_time = {
                let mut times = self.request_times.lock().await;
                let now = Instant::now();

                // Prune old requests outside window
                let window = Duration::from_millis(WINDOW_MS);
                while times
                    .front()
                    .map_or(false, |&t| now.duration_since(t) >= window)
                {
                    times.pop_front();
                }

                if times.len() >= SHORT_TERM_LIMIT {
                    times
                        .front()
                        .map(|&oldest| (oldest + window).saturating_duration_since(now))
                        .filter(|d| !d.is_zero())
                } else {
                    None
                }
            };

            match wait_time {
                Some(duration) => {
                    debug!("Rate limit: waiting {:?}", duration);
                    tokio::time::sleep(duration).await;
                }
                None => break,
            }
        }
    }

    async fn record_request(&self) {
        let mut times = self.request_times.lock().await;
        times.push_back(Instant::now());
    }

    fn record_success(&self) {
        self.consecutive_429s.store(0, Ordering::Relaxed);
    }

    fn record_429(&self) -> Duration {
        let count = self.consecutive_429s.fetch_add(1, Ordering::Relaxed) + 1;
        // Exponential backoff: 2s, 4s, 8s, 16s...
        let backoff_ms = 1000 * (1u64 << count.min(4));
        Duration::from_millis(backoff_ms)
    }
}

/// Strava API client
#[derive(Clone)]
pub struct StravaClient {
    client: Client,
    auth_header: String,
    base_url: String,
    rate_limiter: Arc<RateLimiter>,
}

impl StravaClient {
    /// Create a client for the given access token
    pub fn new(access_token: &str) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(MAX_CONCURRENCY)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PaceZonesError::Http {
                message: format!("Failed to create HTTP client: {}", e),
                status_code: None,
            })?;

        Ok(Self {
            client,
            auth_header: format!("Bearer {}", access_token),
            base_url: DEFAULT_BASE_URL.to_string(),
            rate_limiter: Arc::new(RateLimiter::new()),
        })
    }

    /// Point the client at another API root
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Fetch the athlete's heart rate zones, top zone dropped
    pub async fn fetch_hr_zones(&self) -> Result<ZoneClassifier> {
        let url = format!("{}/athlete/zones", self.base_url);
        let response: ZonesApiResponse = self.get_json(&url).await?;
        let zones = response
            .heart_rate
            .map(|hr| hr.zones)
            .ok_or_else(|| PaceZonesError::Http {
                message: "Athlete has no heart rate zones".to_string(),
                status_code: None,
            })?;

        info!("[StravaClient] Loaded {} heart rate zones", zones.len());
        Ok(ZoneClassifier::from_profile(zones))
    }

    /// Fetch one page of the athlete's activities, keeping runs only
    pub async fn list_runs(&self, page: u32, per_page: u32) -> Result<Vec<ActivitySummary>> {
        let url = format!(
            "{}/athlete/activities?page={}&per_page={}",
            self.base_url, page, per_page
        );
        let activities: Vec<ActivitySummary> = self.get_json(&url).await?;
        let total = activities.len();
        let runs: Vec<ActivitySummary> = activities.into_iter().filter(|a| a.is_run()).collect();

        debug!("[StravaClient] Page {}: {}/{} activities are runs", page, runs.len(), total);
        Ok(runs)
    }

    /// Fetch the analysis streams of one activity
    pub async fn fetch_streams(&self, activity_id: &str) -> Result<ActivityStreams> {
        let url = format!(
            "{}/activities/{}/streams?keys={}&key_by_type=true&resolution=high",
            self.base_url, activity_id, STREAM_KEYS
        );
        let response: HashMap<String, StreamData> = self.get_json(&url).await?;
        streams_from_response(activity_id, response)
    }

    /// Fetch streams for multiple activities in parallel
    pub async fn fetch_many_streams(
        &self,
        activity_ids: Vec<String>,
        on_progress: Option<ProgressCallback>,
    ) -> Vec<StreamFetchResult> {
        let total = activity_ids.len() as u32;
        let completed = Arc::new(AtomicU32::new(0));
        let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENCY));

        info!(
            "[StravaClient] Fetching streams for {} activities with {} concurrent workers",
            total, MAX_CONCURRENCY
        );

        let start = Instant::now();

        let (ids, tasks): (Vec<String>, Vec<_>) = activity_ids
            .into_iter()
            .map(|id| {
                let task_id = id.clone();
                let client = self.clone();
                let semaphore = Arc::clone(&semaphore);
                let completed = Arc::clone(&completed);
                let callback = on_progress.clone();

                let handle = tokio::spawn(async move {
                    let result = match semaphore.acquire().await {
                        Ok(_permit) => match client.fetch_streams(&id).await {
                            Ok(streams) => StreamFetchResult {
                                activity_id: id.clone(),
                                streams: Some(streams),
                                success: true,
                                error: None,
                            },
                            Err(e) => StreamFetchResult::failed(&id, e.to_string()),
                        },
                        Err(e) => StreamFetchResult::failed(&id, format!("Semaphore closed: {}", e)),
                    };

                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(ref cb) = callback {
                        cb(done, total);
                    }

                    result
                });
                (task_id, handle)
            })
            .unzip();

        let results = collect_joined(ids, futures::future::join_all(tasks).await);

        let elapsed = start.elapsed();
        let success_count = results.iter().filter(|r| r.success).count();

        info!(
            "[StravaClient] Completed: {}/{} successful in {:.2}s",
            success_count,
            total,
            elapsed.as_secs_f64()
        );

        results
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let mut retries = 0;

        loop {
            self.rate_limiter.wait_if_needed().await;

            let response = self
                .client
                .get(url)
                .header("Authorization", &self.auth_header)
                .send()
                .await;

            self.rate_limiter.record_request().await;

            match response {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        retries += 1;
                        if retries > MAX_RETRIES {
                            return Err(PaceZonesError::Http {
                                message: "Max retries exceeded".to_string(),
                                status_code: Some(status.as_u16()),
                            });
                        }

                        let backoff = self.rate_limiter.record_429();
                        warn!(
                            "[StravaClient] 429 for {}, retry {} after {:?}",
                            url, retries, backoff
                        );
                        tokio::time::sleep(backoff).await;
                        continue;
                    }

                    if !status.is_success() {
                        return Err(PaceZonesError::Http {
                            message: format!("Request to {} failed", url),
                            status_code: Some(status.as_u16()),
                        });
                    }

                    self.rate_limiter.record_success();
                    return resp.json::<T>().await.map_err(|e| PaceZonesError::Http {
                        message: format!("Parse error: {}", e),
                        status_code: None,
                    });
                }
                Err(e) => {
                    retries += 1;
                    if retries > MAX_RETRIES {
                        return Err(PaceZonesError::Http {
                            message: format!("Request error: {}", e),
                            status_code: None,
                        });
                    }

                    let backoff = Duration::from_millis(500 * (1 << retries));
                    warn!(
                        "[StravaClient] Error for {}: {}, retry {} after {:?}",
                        url, e, retries, backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

/// Pair joined task outputs with their activity ids. A task that panicked or
/// was cancelled becomes a failed result for its activity.
fn collect_joined(
    ids: Vec<String>,
    joined: Vec<std::result::Result<StreamFetchResult, tokio::task::JoinError>>,
) -> Vec<StreamFetchResult> {
    ids.into_iter()
        .zip(joined)
        .map(|(id, joined)| match joined {
            Ok(result) => result,
            Err(e) => {
                warn!("[StravaClient] Task for activity {} failed: {}", id, e);
                StreamFetchResult::failed(&id, format!("Task error: {}", e))
            }
        })
        .collect()
}

/// Build [`ActivityStreams`] from a `key_by_type` streams response.
pub fn streams_from_response(
    activity_id: &str,
    mut response: HashMap<String, StreamData>,
) -> Result<ActivityStreams> {
    let mut take = |key: &str| {
        response
            .remove(key)
            .map(|s| s.data)
            .ok_or_else(|| PaceZonesError::MissingStream {
                activity_id: activity_id.to_string(),
                stream: key.to_string(),
            })
    };

    Ok(ActivityStreams {
        heart_rate: take("heartrate")?,
        velocity: take("velocity_smooth")?,
        elevation: take("altitude")?,
        time: take("time")?,
        distance: take("distance")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limiter() {
        let limiter = RateLimiter::new();

        // Should not wait on first request
        let start = Instant::now();
        limiter.wait_if_needed().await;
        limiter.record_request().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_failed_task_keeps_activity_id() {
        let ok = tokio::spawn(async {
            StreamFetchResult {
                activity_id: "101".to_string(),
                streams: Some(ActivityStreams::default()),
                success: true,
                error: None,
            }
        });
        let panicked: tokio::task::JoinHandle<StreamFetchResult> = tokio::spawn(async {
            panic!("worker crashed");
        });
        let joined = vec![ok.await, panicked.await];

        let results = collect_joined(vec!["101".to_string(), "202".to_string()], joined);
        assert_eq!(results.len(), 2);
        assert!(results[0].success);
        assert_eq!(results[1].activity_id, "202");
        assert!(!results[1].success);
        assert!(results[1].error.as_deref().unwrap().starts_with("Task error"));
    }

    #[test]
    fn test_backoff_grows() {
        let limiter = RateLimiter::new();
        assert_eq!(limiter.record_429(), Duration::from_secs(2));
        assert_eq!(limiter.record_429(), Duration::from_secs(4));
        limiter.record_success();
        assert_eq!(limiter.record_429(), Duration::from_secs(2));
    }

    #[test]
    fn test_streams_from_response() {
        let json = r#"{
            "heartrate": {"data": [120, 125], "series_type": "distance", "original_size": 2, "resolution": "high"},
            "velocity_smooth": {"data": [0.0, 3.1]},
            "altitude": {"data": [12.5, 12.9]},
            "time": {"data": [0, 1]},
            "distance": {"data": [0.0, 3.1]}
        }"#;
        let response: HashMap<String, StreamData> = serde_json::from_str(json).unwrap();
        let streams = streams_from_response("42", response).unwrap();
        assert_eq!(streams.heart_rate, vec![120.0, 125.0]);
        assert_eq!(streams.velocity, vec![0.0, 3.1]);
        assert_eq!(streams.len(), 2);
    }

    #[test]
    fn test_missing_stream() {
        let json = r#"{"time": {"data": [0, 1]}, "distance": {"data": [0.0, 3.1]}}"#;
        let response: HashMap<String, StreamData> = serde_json::from_str(json).unwrap();
        assert!(matches!(
            streams_from_response("42", response),
            Err(PaceZonesError::MissingStream { ref stream, .. }) if stream == "heartrate"
        ));
    }

    #[test]
    fn test_zones_response() {
        let json = r#"{"heart_rate": {"custom_zones": false, "zones": [
            {"min": 0, "max": 123}, {"min": 123, "max": 153}, {"min": 153, "max": 169},
            {"min": 169, "max": 184}, {"min": 184, "max": -1}]}}"#;
        let response: ZonesApiResponse = serde_json::from_str(json).unwrap();
        let classifier = ZoneClassifier::from_profile(response.heart_rate.unwrap().zones);
        assert_eq!(classifier.boundaries().len(), 4);
    }

    #[test]
    fn test_activity_is_run() {
        let json = r#"[
            {"id": 1, "name": "Morning Run", "type": "Run", "distance": 8046.7},
            {"id": 2, "name": "Commute", "type": "Ride"},
            {"id": 3, "name": "Hills", "type": "Workout", "sport_type": "TrailRun"}
        ]"#;
        let activities: Vec<ActivitySummary> = serde_json::from_str(json).unwrap();
        let runs: Vec<u64> = activities.iter().filter(|a| a.is_run()).map(|a| a.id).collect();
        assert_eq!(runs, vec![1, 3]);
    }
}
