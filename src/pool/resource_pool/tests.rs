use super::*;
use crate::pool::{Connector, MockConnection, MockConnector};
use crate::types::{MaxActive, TableName};
use chrono::{TimeZone, Utc};
use tokio::time::Duration;

fn pool_config(min_active: usize, max_active: usize) -> PoolConfig {
    PoolConfig {
        min_active,
        max_active: MaxActive::new(max_active).unwrap(),
        max_wait_time: Duration::from_secs(2),
        max_idle_time: Duration::from_secs(30),
        idle_check_interval: Duration::from_secs(3600),
    }
}

fn target() -> InsertTarget {
    InsertTarget::new(None, TableName::new("links_statics".to_string()).unwrap())
}

fn create_pool(min_active: usize, max_active: usize) -> (ResourcePool<MockConnector>, MockConnector) {
    let connector = MockConnector::new("test");
    let pool = ResourcePool::new(connector.clone(), pool_config(min_active, max_active), target());
    (pool, connector)
}

fn record() -> IngestionRecord {
    IngestionRecord {
        os: "Windows".into(),
        os_version: Some("10".into()),
        browser: "Chrome".into(),
        browser_version: Some("120.0.0.0".into()),
        client_ip: Some("10.0.0.1".into()),
        base_url: "example.com".into(),
        url_path: "a/b".into(),
        full_url: "https://example.com/a/b".into(),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    }
}

/// Yield until `condition` holds, letting spawned pool tasks run
async fn settle(condition: impl Fn() -> bool) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}

async fn borrow_n(pool: &ResourcePool<MockConnector>, n: usize) -> Vec<Handle<MockConnection>> {
    let mut handles = Vec::with_capacity(n);
    for _ in 0..n {
        handles.push(pool.borrow().await.unwrap());
    }
    handles
}

#[tokio::test]
async fn test_init_only_once() {
    let (pool, _) = create_pool(0, 4);
    assert!(!pool.is_initialized());
    assert!(pool.init());
    assert!(!pool.init());
    assert!(pool.is_initialized());
}

#[tokio::test]
async fn test_borrow_before_init_fails() {
    let (pool, _) = create_pool(0, 4);
    assert!(matches!(pool.borrow().await, Err(PoolError::NotInitialized)));
}

#[tokio::test]
async fn test_return_before_init_fails() {
    let (pool, connector) = create_pool(0, 4);
    let conn = connector.connect().await.unwrap();
    assert!(matches!(
        pool.return_handle(Handle::new(conn)),
        Err(PoolError::NotInitialized)
    ));
}

#[tokio::test]
async fn test_prewarm_fills_min_active() {
    let (pool, connector) = create_pool(3, 5);
    pool.init();
    settle(|| pool.idle_count() == 3).await;
    assert_eq!(connector.connects(), 3);
    assert_eq!(pool.connection_count(), 3);
}

#[tokio::test]
async fn test_prewarm_survives_connect_failures() {
    let (pool, connector) = create_pool(2, 5);
    connector.set_fail_connects(true);
    pool.init();
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
    assert_eq!(pool.idle_count(), 0);
    assert_eq!(pool.connection_count(), 0);

    connector.set_fail_connects(false);
    let handle = pool.borrow().await.unwrap();
    assert_eq!(handle.connection().serial(), 1);
}

#[tokio::test]
async fn test_borrow_reuses_returned_handle() {
    let (pool, connector) = create_pool(0, 4);
    pool.init();

    let handle = pool.borrow().await.unwrap();
    assert_eq!(handle.connection().serial(), 1);
    assert!(pool.return_handle(handle).unwrap());
    assert_eq!(pool.idle_count(), 1);

    let handle = pool.borrow().await.unwrap();
    assert_eq!(handle.connection().serial(), 1);
    assert_eq!(connector.connects(), 1);
    assert_eq!(pool.connection_count(), 1);
}

#[tokio::test]
async fn test_idle_handles_are_fifo() {
    let (pool, _) = create_pool(0, 4);
    pool.init();

    let mut handles = borrow_n(&pool, 3).await;
    let last = handles.pop().unwrap();
    pool.return_handle(last).unwrap();
    for handle in handles {
        pool.return_handle(handle).unwrap();
    }

    let serials: Vec<u64> = borrow_n(&pool, 3)
        .await
        .iter()
        .map(|h| h.connection().serial())
        .collect();
    assert_eq!(serials, vec![3, 1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_borrow_times_out_when_exhausted() {
    let (pool, connector) = create_pool(0, 2);
    pool.init();

    let _held = borrow_n(&pool, 2).await;
    let start = Instant::now();
    let err = pool.borrow().await.unwrap_err();

    assert!(err.is_timeout());
    assert!(start.elapsed() >= Duration::from_secs(2));
    match err {
        PoolError::BorrowTimeout { idle, live, .. } => {
            assert_eq!(idle, 0);
            assert_eq!(live, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(connector.connects(), 2);
}

#[tokio::test]
async fn test_waiting_borrower_gets_returned_handle() {
    let (pool, _) = create_pool(0, 1);
    pool.init();

    let handle = pool.borrow().await.unwrap();
    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.borrow().await })
    };
    tokio::task::yield_now().await;

    pool.return_handle(handle).unwrap();
    let handle = waiter.await.unwrap().unwrap();
    assert_eq!(handle.connection().serial(), 1);
    assert_eq!(pool.connection_count(), 1);
}

#[tokio::test]
async fn test_dead_idle_handle_is_replaced() {
    let (pool, connector) = create_pool(0, 2);
    pool.init();

    for handle in borrow_n(&pool, 2).await {
        pool.return_handle(handle).unwrap();
    }
    connector.kill(1);

    let handle = pool.borrow().await.unwrap();
    assert_eq!(handle.connection().serial(), 3);
    assert_eq!(pool.connection_count(), 2);
    assert_eq!(pool.idle_count(), 1);
    settle(|| connector.disconnected() == vec![1]).await;
}

#[tokio::test]
async fn test_live_count_never_exceeds_max() {
    let (pool, connector) = create_pool(0, 3);
    pool.init();

    for handle in borrow_n(&pool, 3).await {
        pool.return_handle(handle).unwrap();
    }
    connector.kill_all();

    let mut borrowers = Vec::new();
    for _ in 0..3 {
        let pool = pool.clone();
        borrowers.push(tokio::spawn(async move { pool.borrow().await }));
    }

    let mut held = Vec::new();
    for borrower in borrowers {
        held.push(borrower.await.unwrap());
        assert!(pool.connection_count() <= 3);
    }
    assert!(held.iter().all(Result::is_ok));
    assert_eq!(pool.connection_count(), 3);
}

#[tokio::test]
async fn test_connect_failure_releases_slot() {
    let (pool, connector) = create_pool(0, 1);
    pool.init();

    connector.set_fail_connects(true);
    assert!(matches!(pool.borrow().await, Err(PoolError::Connect(_))));
    assert_eq!(pool.connection_count(), 0);

    connector.set_fail_connects(false);
    assert!(pool.borrow().await.is_ok());
}

#[tokio::test]
async fn test_foreign_handle_rejected() {
    let (pool, _) = create_pool(0, 2);
    let (other, _) = create_pool(0, 2);
    pool.init();
    other.init();

    let handle = other.borrow().await.unwrap();
    assert!(matches!(
        pool.return_handle(handle),
        Err(PoolError::ForeignHandle)
    ));
}

#[tokio::test]
async fn test_close_disconnects_idle_handles_once() {
    let (pool, connector) = create_pool(0, 3);
    pool.init();

    for handle in borrow_n(&pool, 3).await {
        pool.return_handle(handle).unwrap();
    }

    assert!(pool.close().await);
    let mut disconnected = connector.disconnected();
    disconnected.sort_unstable();
    assert_eq!(disconnected, vec![1, 2, 3]);
    assert_eq!(pool.connection_count(), 0);
    assert_eq!(pool.idle_count(), 0);

    assert!(!pool.close().await);
    assert!(matches!(pool.borrow().await, Err(PoolError::Closed)));
    assert_eq!(connector.disconnected().len(), 3);
}

#[tokio::test]
async fn test_close_before_init_is_noop() {
    let (pool, _) = create_pool(0, 3);
    assert!(!pool.close().await);
    assert!(!pool.is_closed());
}

#[tokio::test]
async fn test_handle_returned_after_close_is_disconnected() {
    let (pool, connector) = create_pool(0, 3);
    pool.init();

    let handle = pool.borrow().await.unwrap();
    assert!(pool.close().await);
    assert_eq!(pool.connection_count(), 1);

    assert!(!pool.return_handle(handle).unwrap());
    assert_eq!(pool.connection_count(), 0);
    settle(|| connector.disconnected() == vec![1]).await;
}

#[tokio::test]
async fn test_close_wakes_waiting_borrowers() {
    let (pool, _) = create_pool(0, 1);
    pool.init();

    let _held = pool.borrow().await.unwrap();
    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.borrow().await })
    };
    tokio::task::yield_now().await;

    pool.close().await;
    assert!(matches!(waiter.await.unwrap(), Err(PoolError::Closed)));
}

#[tokio::test(start_paused = true)]
async fn test_balancer_retires_down_to_min_active() {
    let (pool, connector) = create_pool(2, 10);
    pool.init();
    settle(|| pool.idle_count() == 2).await;

    for handle in borrow_n(&pool, 5).await {
        pool.return_handle(handle).unwrap();
    }
    assert_eq!(pool.connection_count(), 5);

    tokio::time::advance(Duration::from_secs(31)).await;
    assert_eq!(pool.balance_idle(), 3);
    assert_eq!(pool.idle_count(), 2);
    assert_eq!(pool.connection_count(), 2);
    settle(|| connector.disconnected().len() == 3).await;
}

#[tokio::test(start_paused = true)]
async fn test_balancer_keeps_recent_and_loaned_handles() {
    let (pool, connector) = create_pool(0, 10);
    pool.init();

    let mut handles = borrow_n(&pool, 3).await;
    let loaned = handles.pop().unwrap();
    let stale = handles.pop().unwrap();
    pool.return_handle(stale).unwrap();

    tokio::time::advance(Duration::from_secs(20)).await;
    let fresh = handles.pop().unwrap();
    pool.return_handle(fresh).unwrap();

    tokio::time::advance(Duration::from_secs(15)).await;
    assert_eq!(pool.balance_idle(), 1);
    assert_eq!(pool.idle_count(), 1);
    assert_eq!(pool.connection_count(), 2);
    settle(|| connector.disconnected() == vec![2]).await;

    assert!(pool.return_handle(loaned).unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_background_balancer_runs_on_interval() {
    let connector = MockConnector::new("test");
    let config = PoolConfig {
        idle_check_interval: Duration::from_secs(10),
        ..pool_config(0, 4)
    };
    let pool = ResourcePool::new(connector.clone(), config, target());
    pool.init();

    for handle in borrow_n(&pool, 2).await {
        pool.return_handle(handle).unwrap();
    }

    tokio::time::sleep(Duration::from_secs(45)).await;
    settle(|| pool.connection_count() == 0).await;
    assert_eq!(pool.idle_count(), 0);
}

#[tokio::test]
async fn test_save_record_success() {
    let (pool, connector) = create_pool(0, 2);
    pool.init();

    assert!(pool.save_record(&record()).await);
    let stats = pool.query_stats();
    assert_eq!((stats.all_query, stats.success_query, stats.fail_query), (1, 1, 0));
    assert_eq!(connector.inserted(), vec![record()]);
    assert_eq!(pool.idle_count(), 1);
}

#[tokio::test]
async fn test_save_record_failure_keeps_live_handle() {
    let (pool, connector) = create_pool(0, 2);
    pool.init();

    connector.set_fail_inserts(true);
    assert!(!pool.save_record(&record()).await);
    let stats = pool.query_stats();
    assert_eq!((stats.all_query, stats.success_query, stats.fail_query), (1, 0, 1));
    assert_eq!(pool.idle_count(), 1);
    assert_eq!(pool.connection_count(), 1);
}

#[tokio::test]
async fn test_save_record_discards_dead_handle() {
    let (pool, connector) = create_pool(0, 2);
    pool.init();

    let handle = pool.borrow().await.unwrap();
    pool.return_handle(handle).unwrap();
    connector.kill_all();

    assert!(!pool.save_record(&record()).await);
    assert_eq!(pool.query_stats().fail_query, 1);
    assert_eq!(pool.connection_count(), 0);
    assert_eq!(pool.idle_count(), 0);
    settle(|| connector.disconnected().len() == 2).await;
}

#[tokio::test]
async fn test_save_record_discards_handle_lost_mid_write() {
    let (pool, connector) = create_pool(0, 2);
    pool.init();

    connector.set_lose_on_insert(true);
    assert!(!pool.save_record(&record()).await);
    assert_eq!(pool.query_stats().fail_query, 1);
    assert_eq!(pool.connection_count(), 0);
    assert_eq!(pool.idle_count(), 0);
    settle(|| connector.disconnected() == vec![1]).await;
}

#[tokio::test]
async fn test_save_record_counts_borrow_failure() {
    let (pool, connector) = create_pool(0, 1);
    pool.init();

    connector.set_fail_connects(true);
    assert!(!pool.save_record(&record()).await);
    let stats = pool.query_stats();
    assert_eq!((stats.all_query, stats.success_query, stats.fail_query), (1, 0, 1));
    assert!(connector.inserted().is_empty());
}
