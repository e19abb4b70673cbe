//! End-to-end loader behavior over scripted sources

use imgload_core::prelude::*;
use imgload_core::{LoadRequest, Loader, RetryController};
use imgload_test_utils::{Behavior, ScriptedSource, StaticResolver};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const A: &str = "https://cdn.example.com/a.png";
const FALLBACK: &str = "https://cdn.example.com/placeholder.png";

#[tokio::test]
async fn cached_key_returns_from_cache_with_zero_latency() {
    let source = Arc::new(ScriptedSource::succeeding());
    let loader = ImageLoader::new(source.clone());

    loader.load_image(A, &LoadOptions::new()).await;
    let hit = loader.load_image(A, &LoadOptions::new()).await;

    assert!(hit.success);
    assert!(hit.from_cache);
    assert_eq!(hit.load_time_ms, 0);
    assert_eq!(hit.url, A);
    assert_eq!(source.total_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_callers_share_one_attempt_sequence() {
    let source = Arc::new(ScriptedSource::new(Behavior::Delay(Duration::from_millis(30))));
    let loader = ImageLoader::new(source.clone());
    let options = LoadOptions::new();

    let (first, second, third) = tokio::join!(
        loader.load_image(A, &options),
        loader.load_image(A, &options),
        loader.load_image(A, &options),
    );

    assert_eq!(source.calls_for(A), 1);
    assert!(first.success);
    assert_eq!(first, second);
    assert_eq!(second, third);
    assert_eq!(loader.coordinator().in_flight_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn concurrent_failure_is_shared_and_retried_once() {
    let gone = "https://cdn.example.com/gone.png";
    let source = Arc::new(ScriptedSource::succeeding().always(gone, Behavior::NotFound));
    let loader = ImageLoader::new(source.clone());
    let options = LoadOptions::new().with_retry_attempts(2);

    let (first, second) = tokio::join!(
        loader.load_image(gone, &options),
        loader.load_image(gone, &options),
    );

    assert!(!first.success);
    assert_eq!(first, second);
    assert_eq!(source.calls_for(gone), 2);
    assert!(!loader.is_image_cached(gone));
}

#[tokio::test]
async fn retry_succeeds_on_third_attempt() {
    let source = Arc::new(
        ScriptedSource::succeeding().script(A, [Behavior::Network, Behavior::NotFound]),
    );
    let retry = RetryController::new(Loader::new(source.clone()));

    let result = retry
        .attempt(&LoadRequest::new(A, Duration::from_secs(1), 3))
        .await;

    assert!(result.success);
    assert_eq!(result.attempts, 3);
    assert_eq!(source.calls_for(A), 3);
}

#[tokio::test]
async fn fallback_wins_after_primary_budget() {
    let source = Arc::new(ScriptedSource::succeeding().always(A, Behavior::NotFound));
    let loader = ImageLoader::new(source.clone());

    let result = loader
        .load_image(
            A,
            &LoadOptions::new()
                .with_retry_attempts(3)
                .with_fallback(FALLBACK),
        )
        .await;

    assert!(result.success);
    assert_eq!(result.url, FALLBACK);
    assert_eq!(result.attempts, 4);
    assert_eq!(source.calls_for(A), 3);
    assert_eq!(source.calls_for(FALLBACK), 1);

    // Only the fallback that actually loaded is cached.
    assert!(loader.is_image_cached(FALLBACK));
    assert!(!loader.is_image_cached(A));

    let direct = loader.load_image(FALLBACK, &LoadOptions::new()).await;
    assert!(direct.from_cache);
    assert_eq!(direct.load_time_ms, 0);
    assert_eq!(source.calls_for(FALLBACK), 1);
}

#[tokio::test]
async fn cached_key_hit_ignores_invalid_budget() {
    let source = Arc::new(ScriptedSource::succeeding());
    let loader = ImageLoader::new(source.clone());
    loader.load_image(A, &LoadOptions::new()).await;

    let hit = loader
        .load_image(A, &LoadOptions::new().with_retry_attempts(0))
        .await;

    assert!(hit.success);
    assert!(hit.from_cache);
    assert_eq!(hit.load_time_ms, 0);
    assert_eq!(source.total_calls(), 1);
}

#[tokio::test]
async fn failed_fallback_reports_absence() {
    let source = Arc::new(
        ScriptedSource::succeeding()
            .always(A, Behavior::Network)
            .always(FALLBACK, Behavior::NotFound),
    );
    let loader = ImageLoader::new(source);

    let result = loader
        .load_image(
            A,
            &LoadOptions::new()
                .with_retry_attempts(2)
                .with_fallback(FALLBACK),
        )
        .await;

    assert!(!result.success);
    assert_eq!(result.url, A);
    assert_eq!(result.attempts, 3);
    assert_eq!(result.error_kind(), Some(ErrorKind::Firebase));
}

#[tokio::test(start_paused = true)]
async fn hanging_source_times_out_each_attempt() {
    let source = Arc::new(ScriptedSource::new(Behavior::Hang));
    let loader = ImageLoader::new(source.clone());

    let started = Instant::now();
    let result = loader
        .load_image(
            A,
            &LoadOptions::new()
                .with_retry_attempts(2)
                .with_timeout(Duration::from_millis(50)),
        )
        .await;

    assert!(!result.success);
    assert_eq!(result.error_kind(), Some(ErrorKind::Unknown));
    assert!(result.error.unwrap().message.contains("timed out"));
    assert_eq!(source.calls_for(A), 2);
    assert!(started.elapsed() >= Duration::from_millis(100));
    assert!(started.elapsed() < Duration::from_millis(120));
}

#[tokio::test(start_paused = true)]
async fn preload_runs_concurrently_and_keeps_order() {
    let source = Arc::new(ScriptedSource::new(Behavior::Delay(Duration::from_millis(40))));
    let loader = ImageLoader::new(source.clone());
    let urls: Vec<String> = (1..=10)
        .map(|i| format!("https://cdn.example.com/{i}.png"))
        .collect();

    let started = Instant::now();
    let results = loader.preload_images(&urls, &LoadOptions::new()).await;
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_millis(80), "took {elapsed:?}");
    assert_eq!(source.peak_concurrency(), 10);
    let loaded: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
    let expected: Vec<&str> = urls.iter().map(String::as_str).collect();
    assert_eq!(loaded, expected);
    assert!(results.iter().all(|r| r.success));
}

#[tokio::test(start_paused = true)]
async fn preload_order_survives_uneven_completion() {
    let slow = "https://cdn.example.com/slow.png";
    let fast = "https://cdn.example.com/fast.png";
    let source = Arc::new(
        ScriptedSource::succeeding()
            .always(slow, Behavior::Delay(Duration::from_millis(90)))
            .always(fast, Behavior::Delay(Duration::from_millis(1))),
    );
    let loader = ImageLoader::new(source);

    let results = loader
        .preload_images(&[slow, fast], &LoadOptions::new())
        .await;

    assert_eq!(results[0].url, slow);
    assert_eq!(results[1].url, fast);
}

#[tokio::test]
async fn clear_resets_cache() {
    let loader = ImageLoader::new(Arc::new(ScriptedSource::succeeding()));
    let urls = ["https://cdn.example.com/1.png", "https://cdn.example.com/2.png"];
    loader.preload_images(&urls, &LoadOptions::new()).await;

    assert_eq!(loader.cache_size(), 2);
    loader.clear_image_cache();

    assert_eq!(loader.cache_size(), 0);
    for url in urls {
        assert!(!loader.is_image_cached(url));
    }
}

#[tokio::test]
async fn separate_loaders_do_not_share_state() {
    let first = ImageLoader::new(Arc::new(ScriptedSource::succeeding()));
    let second = ImageLoader::new(Arc::new(ScriptedSource::succeeding()));

    first.load_image(A, &LoadOptions::new()).await;

    assert!(first.is_image_cached(A));
    assert!(!second.is_image_cached(A));
}

#[tokio::test]
async fn remote_path_loads_resolved_url() {
    let resolver = Arc::new(StaticResolver::new().with("steps/wheel.jpg", A));
    let loader =
        ImageLoader::new(Arc::new(ScriptedSource::succeeding())).with_resolver(resolver.clone());

    let result = loader.load_remote_image("steps/wheel.jpg").await;
    assert!(result.success);
    assert_eq!(result.url, A);

    let missing = loader.load_remote_image("steps/nope.jpg").await;
    assert_eq!(missing.error_kind(), Some(ErrorKind::Firebase));
    assert_eq!(missing.url, "steps/nope.jpg");
    assert_eq!(resolver.calls(), 2);
}

#[tokio::test]
async fn validation_failure_is_fatal_and_free() {
    let source = Arc::new(ScriptedSource::succeeding());
    let loader = ImageLoader::new(source.clone());

    let result = loader
        .load_image(A, &LoadOptions::new().with_retry_attempts(0))
        .await;

    let error = result.error.unwrap();
    assert_eq!(error.kind, ErrorKind::Validation);
    assert!(!error.retryable);
    assert_eq!(source.total_calls(), 0);
}

#[tokio::test]
async fn config_defaults_apply() {
    let source = Arc::new(ScriptedSource::succeeding().always(A, Behavior::Network));
    let config = LoaderConfig::new().with_retry_attempts(5);
    let loader = ImageLoader::with_config(source.clone(), config).unwrap();

    let result = loader.load_image(A, &LoadOptions::new()).await;

    assert!(!result.success);
    assert_eq!(source.calls_for(A), 5);
}

#[test]
fn load_result_serializes_for_ui() {
    let result = imgload_core::LoadResult::cached(A);
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["success"], true);
    assert_eq!(json["from_cache"], true);
    assert_eq!(json["load_time_ms"], 0);
    assert!(json.get("error").is_none());
}
