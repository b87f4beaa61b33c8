// src/github/limiter.rs
// =============================================================================
// A client-side rate limiter for outbound API requests.
//
// At most `max_starts` tasks may *begin* inside any rolling window (one
// second by default). Callers beyond that wait their turn. Admission is
// FIFO: tokio's Mutex hands the lock out in the order it was requested, and
// the waiter holding it sleeps until the oldest start leaves the window.
//
// The limiter only delays. It never fails and never touches the task's
// result.
// =============================================================================

use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;

// tokio's Mutex (not std's) because we hold it across an .await,
// and because it queues waiters fairly
use tokio::sync::Mutex;
// tokio's Instant follows the paused test clock; std's would not
use tokio::time::{sleep_until, Instant};

/// Default ceiling for GitHub requests
pub const REQUESTS_PER_SECOND: usize = 10;

// The limiter's state
//
// There is one of these per GithubClient, and one client per run, so every
// request of every repository pipeline passes through the same queue.
#[derive(Debug)]
pub struct RateLimiter {
    // How many tasks may start inside one window
    max_starts: usize,
    // Length of the rolling window (one second for GitHub)
    window: Duration,
    // Start times of the tasks admitted within the current window,
    // oldest at the front
    starts: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    // Creates a limiter
    //
    // Parameters:
    //   max_starts: tasks allowed to begin per window (0 is bumped to 1,
    //               otherwise nothing could ever start)
    //   window: length of the rolling window
    pub fn new(max_starts: usize, window: Duration) -> Self {
        let max_starts = max_starts.max(1);
        RateLimiter {
            max_starts,
            window,
            starts: Mutex::new(VecDeque::with_capacity(max_starts)),
        }
    }

    // Shorthand for the common "N per second" case
    pub fn per_second(max_starts: usize) -> Self {
        Self::new(max_starts, Duration::from_secs(1))
    }

    /// Waits until one more task may start.
    ///
    /// The lock is taken once and held until this caller is admitted, even
    /// while sleeping. Everyone behind us waits in the Mutex queue, so the
    /// order of admission is the order of arrival.
    pub async fn acquire(&self) {
        // Join the queue; tokio's Mutex wakes waiters in FIFO order
        let mut starts = self.starts.lock().await;

        loop {
            let now = Instant::now();

            // Forget starts that have slid out of the window
            while let Some(&oldest) = starts.front() {
                if now.duration_since(oldest) >= self.window {
                    starts.pop_front();
                } else {
                    break;
                }
            }

            // Room left in this window: record our start and go
            if starts.len() < self.max_starts {
                starts.push_back(now);
                return;
            }

            // Window is full. The earliest moment a slot frees up is when
            // the oldest start turns one window old. We sleep with the guard
            // still held, so nobody can jump the queue meanwhile.
            if let Some(&oldest) = starts.front() {
                sleep_until(oldest + self.window).await;
            }
        }
    }

    /// Runs `task` once the limiter admits it and hands back its own result.
    ///
    /// Parameters:
    ///   task: any future; it is not polled until admission
    ///
    /// Returns: whatever `task` returns, untouched (errors included)
    pub async fn schedule<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        self.acquire().await;
        // The lock was released when acquire() returned, so a slow task
        // never blocks the next admission
        task.await
    }
}

impl Default for RateLimiter {
    // 10 requests per second, the ceiling we use for GitHub
    fn default() -> Self {
        Self::per_second(REQUESTS_PER_SECOND)
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why count *starts* and not requests in flight?
//    - The ceiling is about how often we knock on GitHub's door
//    - A slow response should not hold up the next request's start
//    - How many run at once is capped separately (see export/comments.rs)
//
// 2. Why a VecDeque of Instants?
//    - It is a sliding log: push new starts at the back, drop expired ones
//      from the front
//    - It never holds more than max_starts entries
//
// 3. Holding a lock across .await
//    - With std::sync::Mutex this would block the whole thread
//    - tokio::sync::Mutex is designed for it: the guard can live across
//      sleep_until() and other tasks keep running
//
// 4. Why does the task's error pass straight through?
//    - schedule() is generic over the output type T
//    - It never looks inside T, so Ok and Err come back exactly as produced
// -----------------------------------------------------------------------------
