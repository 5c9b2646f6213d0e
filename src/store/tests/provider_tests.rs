use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{BrokenProvider, FlakyProvider};
use crate::store::{DocumentationProvider, ManPageProvider, RetryPolicy, StaticProvider};

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        initial_backoff: Duration::from_millis(1),
        ..RetryPolicy::default()
    }
}

#[tokio::test]
async fn test_static_provider() {
    let provider: StaticProvider = [("ls", "list directory contents")].into_iter().collect();
    let provider = provider.with("rm", "remove files");

    assert_eq!(
        provider.get_documentation("ls").await,
        Ok(Some("list directory contents".to_string()))
    );
    assert_eq!(provider.get_documentation("rm").await, Ok(Some("remove files".to_string())));
    assert_eq!(provider.get_documentation("cat").await, Ok(None));
}

#[test]
fn test_default_retry_policy() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_attempts, 3);
    assert_eq!(policy.backoff_for(0), Duration::from_millis(50));
    assert_eq!(policy.backoff_for(1), Duration::from_millis(100));
    assert_eq!(policy.backoff_for(2), Duration::from_millis(200));
    // Capped
    assert_eq!(policy.backoff_for(20), Duration::from_secs(2));
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let provider = FlakyProvider {
        calls: AtomicUsize::new(0),
        failures: 2,
        doc: "remove files".to_string(),
    };

    assert_eq!(fast_retry().fetch(&provider, "rm").await, Some("remove files".to_string()));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_exhausted_retries_mean_no_documentation() {
    let provider = FlakyProvider {
        calls: AtomicUsize::new(0),
        failures: 10,
        doc: String::new(),
    };

    assert_eq!(fast_retry().fetch(&provider, "rm").await, None);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_permanent_failure_is_not_retried() {
    let provider = BrokenProvider {
        calls: AtomicUsize::new(0),
    };

    assert_eq!(fast_retry().fetch(&provider, "rm").await, None);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_zero_attempts_still_tries_once() {
    let provider = BrokenProvider {
        calls: AtomicUsize::new(0),
    };
    let policy = RetryPolicy {
        max_attempts: 0,
        ..fast_retry()
    };

    assert_eq!(policy.fetch(&provider, "rm").await, None);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_waits_between_attempts() {
    let provider = FlakyProvider {
        calls: AtomicUsize::new(0),
        failures: 2,
        doc: "ok".to_string(),
    };

    let started = tokio::time::Instant::now();
    assert_eq!(RetryPolicy::default().fetch(&provider, "tool").await, Some("ok".to_string()));
    // 50 ms + 100 ms of backoff
    assert!(started.elapsed() >= Duration::from_millis(150));
}

#[test]
fn test_man_page_names() {
    assert_eq!(ManPageProvider::page_name("ls"), "ls");
    assert_eq!(ManPageProvider::page_name("git push"), "git-push");
    assert_eq!(ManPageProvider::page_name("docker  compose up"), "docker-compose-up");
}

#[tokio::test]
async fn test_missing_man_page_is_never_documentation() {
    // Depending on the host this times out, finds no `man`, or finds no page
    let provider = ManPageProvider::new().with_timeout(Duration::from_millis(1));
    let result = provider.get_documentation("capdesc-no-such-command").await;
    assert!(!matches!(result, Ok(Some(_))));
}
