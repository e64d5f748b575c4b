//! Reconnect supervisor behavior under scripted connect and ping failures.
//!
//! Runs on a paused clock: the stock 2 s delays elapse in virtual time, so
//! the suite is fast and deterministic.

use std::time::Duration;

use argus::{HealthCheckConfig, RetryConfig};
use tokio::time::Instant;

use crate::support::{
    test_session, wait_until_not_ready, wait_until_ready, MockAdapter,
};

#[tokio::test(start_paused = true)]
async fn test_connects_on_first_attempt() {
    let adapter = MockAdapter::new();
    let session = test_session(&adapter);

    wait_until_ready(&session).await;

    assert_eq!(adapter.open_calls(), 1);
    assert_eq!(adapter.opened_ids(), vec![1]);
    // The connect path pings once before the monitor ever ticks
    assert!(adapter.ping_calls() >= 1);
}

#[tokio::test(start_paused = true)]
async fn test_retries_on_fixed_delay_until_ready() {
    let adapter = MockAdapter::new();
    adapter.fail_next_opens(2);

    let start = Instant::now();
    let session = test_session(&adapter);
    wait_until_ready(&session).await;

    // Two failures with one fixed delay after each, success on the third
    // attempt. A growing backoff would overshoot the upper bound.
    let delay = RetryConfig::default().reconnect_delay();
    assert_eq!(adapter.open_calls(), 3);
    assert!(start.elapsed() >= delay * 2);
    assert!(start.elapsed() < delay * 2 + Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn test_hung_initial_ping_times_out_and_retries() {
    let adapter = MockAdapter::new();
    // The first pool opens fine but never answers the connect-time ping.
    adapter.hang_pings(1);

    let start = Instant::now();
    let session = test_session(&adapter);
    wait_until_ready(&session).await;

    // The check timeout fails the attempt; one fixed delay later the
    // second attempt gets a responsive pool.
    let timeout = HealthCheckConfig::default().check_timeout();
    let delay = RetryConfig::default().reconnect_delay();
    assert_eq!(adapter.opened_ids(), vec![1, 2]);
    assert!(start.elapsed() >= timeout + delay);
    assert!(start.elapsed() < timeout + delay + Duration::from_millis(500));

    let conn = session.acquire().await.expect("ready on the second pool");
    assert_eq!(conn.pool_id, 2);
}

#[tokio::test(start_paused = true)]
async fn test_monitor_death_triggers_fresh_pool() {
    let adapter = MockAdapter::new();
    let session = test_session(&adapter);
    wait_until_ready(&session).await;
    assert_eq!(adapter.opened_ids(), vec![1]);

    adapter.kill_current();

    // One full check interval passes before the monitor probes the dead
    // pool and hands the supervisor its death notice.
    tokio::time::sleep(HealthCheckConfig::default().check_interval() + Duration::from_millis(50))
        .await;
    wait_until_ready(&session).await;

    assert_eq!(adapter.opened_ids(), vec![1, 2]);
    // The dead pool is discarded, not drained; only Session::close drains.
    assert_eq!(adapter.close_calls(), 0);

    let conn = session.acquire().await.expect("ready after recovery");
    assert_eq!(conn.pool_id, 2);
}

#[tokio::test(start_paused = true)]
async fn test_hung_ping_timeout_triggers_fresh_pool() {
    let adapter = MockAdapter::new();
    let session = test_session(&adapter);
    wait_until_ready(&session).await;
    assert_eq!(adapter.opened_ids(), vec![1]);

    // The live pool stops answering instead of failing outright; only the
    // check timeout can flag it.
    adapter.hang_pings(1);
    let config = HealthCheckConfig::default();

    // The next health check fires one interval out and then sits on the
    // hung ping; until the check timeout elapses the pool counts as live.
    tokio::time::sleep(config.check_interval() + Duration::from_millis(100)).await;
    assert!(session.is_ready());
    assert_eq!(adapter.opened_ids(), vec![1]);

    tokio::time::sleep(config.check_timeout()).await;
    wait_until_ready(&session).await;

    assert_eq!(adapter.opened_ids(), vec![1, 2]);
    // The hung pool is discarded, not drained; only Session::close drains.
    assert_eq!(adapter.close_calls(), 0);

    let conn = session.acquire().await.expect("ready after recovery");
    assert_eq!(conn.pool_id, 2);
}

#[tokio::test(start_paused = true)]
async fn test_readiness_tracks_outage_and_recovery() {
    let adapter = MockAdapter::new();
    let session = test_session(&adapter);
    wait_until_ready(&session).await;
    assert!(session.is_ready());

    // Take the server away entirely: the live pool dies and replacement
    // opens are refused.
    adapter.set_refuse_opens(true);
    adapter.kill_current();
    wait_until_not_ready(&session).await;

    // The supervisor keeps retrying for as long as the outage lasts.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(!session.is_ready());
    assert!(adapter.open_calls() >= 3);

    adapter.set_refuse_opens(false);
    wait_until_ready(&session).await;
    assert!(session.is_ready());
    assert_eq!(adapter.opened_ids().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_each_reconnect_gets_a_fresh_pool() {
    let adapter = MockAdapter::new();
    let session = test_session(&adapter);
    let check_interval = HealthCheckConfig::default().check_interval();

    for round in 1..=3u64 {
        wait_until_ready(&session).await;
        let conn = session.acquire().await.expect("ready session");
        assert_eq!(conn.pool_id, round);

        adapter.kill_current();
        tokio::time::sleep(check_interval + Duration::from_millis(50)).await;
    }

    wait_until_ready(&session).await;
    assert_eq!(adapter.opened_ids(), vec![1, 2, 3, 4]);
}

#[tokio::test(start_paused = true)]
async fn test_acquire_blocks_until_first_connect() {
    let adapter = MockAdapter::new();
    adapter.fail_next_opens(2);

    let start = Instant::now();
    let session = test_session(&adapter);

    // Issued before the session has ever been ready.
    let waiter = {
        let session = session.clone();
        tokio::spawn(async move { session.acquire().await })
    };

    let conn = waiter
        .await
        .expect("waiter not cancelled")
        .expect("acquire resolves once connected");
    assert_eq!(conn.pool_id, 1);
    assert_eq!(adapter.open_calls(), 3);

    let delay = RetryConfig::default().reconnect_delay();
    assert!(start.elapsed() >= delay * 2);
    assert!(start.elapsed() < delay * 4);
}

#[tokio::test(start_paused = true)]
async fn test_acquire_blocks_through_reconnect_window() {
    let adapter = MockAdapter::new();
    let session = test_session(&adapter);
    wait_until_ready(&session).await;

    // Outage: the pool dies and the first replacement attempts fail.
    adapter.set_refuse_opens(true);
    adapter.kill_current();
    wait_until_not_ready(&session).await;

    let waiter = {
        let session = session.clone();
        tokio::spawn(async move { session.acquire().await })
    };

    // Several retry rounds pass; the caller stays parked, no error.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!waiter.is_finished());

    adapter.set_refuse_opens(false);
    let conn = waiter
        .await
        .expect("waiter not cancelled")
        .expect("acquire resolves after recovery");
    assert_eq!(conn.pool_id, 2);
}
