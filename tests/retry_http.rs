// tests/retry_http.rs
//
// fetch_with_retry against an in-process transport: timeouts must cancel the
// in-flight request and be retried; statuses are classified per attempt.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use irembocare::retry::{
    fetch_once, fetch_with_retry, FetchError, HttpResponse, HttpTransport, NetworkErrorKind,
    RetryExecutor, RetryPolicy,
};

/// Each call sleeps for `delays[n]` (last entry repeats), then answers with `reply(n)`.
struct SlowTransport {
    calls: AtomicU32,
    completed: AtomicUsize,
    delays: Vec<Duration>,
    reply: fn(u32) -> Result<HttpResponse, FetchError>,
}

impl SlowTransport {
    fn new(delays: Vec<Duration>, reply: fn(u32) -> Result<HttpResponse, FetchError>) -> Self {
        Self {
            calls: AtomicU32::new(0),
            completed: AtomicUsize::new(0),
            delays,
            reply,
        }
    }
}

#[async_trait]
impl HttpTransport for SlowTransport {
    async fn get(&self, _url: &str) -> Result<HttpResponse, FetchError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let idx = (n as usize).min(self.delays.len() - 1);
        tokio::time::sleep(self.delays[idx]).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        (self.reply)(n)
    }
}

fn executor(max_retries: u32) -> RetryExecutor {
    RetryExecutor::new(RetryPolicy {
        max_retries,
        base_delay_ms: 50,
        max_delay_ms: 400,
        backoff_factor: 2.0,
    })
}

#[tokio::test(start_paused = true)]
async fn timeout_cancels_request_and_surfaces_timeout_error() {
    let t = SlowTransport::new(vec![Duration::from_secs(60)], |_| Ok(HttpResponse::ok("late")));
    let err = fetch_once(&t, "https://x.test/a", Duration::from_millis(500))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        FetchError::Timeout {
            after: Duration::from_millis(500)
        }
    );
    // The slow request never ran to completion.
    assert_eq!(t.completed.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn timed_out_attempt_is_retried_until_success() {
    let t = SlowTransport::new(
        vec![Duration::from_secs(30), Duration::from_millis(10)],
        |_| Ok(HttpResponse::ok(r#"{"ok":true}"#)),
    );
    let resp = fetch_with_retry(&t, "https://x.test/a", Duration::from_secs(1), &executor(3))
        .await
        .expect("second attempt succeeds");

    assert_eq!(resp.body, r#"{"ok":true}"#);
    assert_eq!(t.calls.load(Ordering::SeqCst), 2);
    assert_eq!(t.completed.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn rate_limited_then_ok() {
    let t = SlowTransport::new(vec![Duration::ZERO], |n| {
        if n < 2 {
            Ok(HttpResponse {
                status: 429,
                reason: "Too Many Requests".into(),
                body: String::new(),
            })
        } else {
            Ok(HttpResponse::ok("fine"))
        }
    });
    let resp = fetch_with_retry(&t, "https://x.test/a", Duration::from_secs(1), &executor(3))
        .await
        .unwrap();
    assert_eq!(resp.body, "fine");
    assert_eq!(t.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn not_found_is_returned_after_one_attempt() {
    let t = SlowTransport::new(vec![Duration::ZERO], |_| {
        Ok(HttpResponse {
            status: 404,
            reason: "Not Found".into(),
            body: "{}".into(),
        })
    });
    let err = fetch_with_retry(&t, "https://x.test/a", Duration::from_secs(1), &executor(5))
        .await
        .unwrap_err();
    assert_eq!(err, FetchError::status(404, "Not Found"));
    assert_eq!(err.to_string(), "HTTP 404: Not Found");
    assert_eq!(t.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn exhausted_budget_returns_last_error_verbatim() {
    let t = SlowTransport::new(vec![Duration::ZERO], |n| {
        Err(FetchError::network(
            NetworkErrorKind::ConnectionRefused,
            format!("refused #{n}"),
        ))
    });
    let err = fetch_with_retry(&t, "https://x.test/a", Duration::from_secs(1), &executor(2))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        FetchError::network(NetworkErrorKind::ConnectionRefused, "refused #2")
    );
    assert_eq!(t.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn concurrent_executions_do_not_block_each_other() {
    let slow = Arc::new(SlowTransport::new(vec![Duration::ZERO], |_| {
        Err(FetchError::status(503, "Service Unavailable"))
    }));
    let fast = Arc::new(SlowTransport::new(vec![Duration::from_millis(5)], |_| {
        Ok(HttpResponse::ok("quick"))
    }));
    let exec = executor(4);

    let start = tokio::time::Instant::now();
    let (a, b) = tokio::join!(
        fetch_with_retry(slow.as_ref(), "https://x.test/slow", Duration::from_secs(1), &exec),
        async {
            let r =
                fetch_with_retry(fast.as_ref(), "https://x.test/fast", Duration::from_secs(1), &exec)
                    .await;
            (r, start.elapsed())
        }
    );

    assert!(a.is_err());
    assert_eq!(slow.calls.load(Ordering::SeqCst), 5);
    let (fast_res, fast_elapsed) = b;
    assert_eq!(fast_res.unwrap().body, "quick");
    // The fast call finished long before the slow one's first backoff (>= 50ms) ended.
    assert!(fast_elapsed < Duration::from_millis(50));
}
