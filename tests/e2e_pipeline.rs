//! End-to-end pipelines across execution contexts.
//!
//! Exercises the engine the way an application would: work confined to a
//! serial store context, results mapped and bounded on the background pool,
//! delivered to a pumped foreground queue, and wrapped as operations.

#[macro_use]
mod common;

use common::*;
use pledge::executor::from_fn;
use pledge::{
    sequence_on, DispatchQueue, Error, ForegroundQueue, Future, FutureOperation, Outcome,
    PoolConfig, SerialContext, SerialContextHandle, WorkerPool,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

/// A toy store that may only be touched from its own serial queue.
struct Store {
    context: SerialContextHandle,
    rows: Arc<Mutex<HashMap<u32, String>>>,
}

impl Store {
    fn new() -> Self {
        Self {
            context: SerialContextHandle::new("e2e.store"),
            rows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn insert(&self, id: u32, name: &str) -> Future<u32> {
        let rows = Arc::clone(&self.rows);
        let name = name.to_string();
        let queue = self.context.queue().clone();
        self.context.perform_future(move || {
            assert!(queue.is_current(), "store touched off its queue");
            rows.lock().unwrap().insert(id, name);
            Ok(id)
        })
    }

    fn fetch(&self, id: u32) -> Future<String> {
        let rows = Arc::clone(&self.rows);
        self.context.perform_future(move || {
            let found = rows.lock().unwrap().get(&id).cloned();
            found.ok_or_else(|| Error::user(format!("row {id} missing")))
        })
    }
}

#[test]
fn store_to_foreground_pipeline() {
    init_test_logging();
    test_phase!("store pipeline");
    let store = Arc::new(Store::new());
    let foreground = Arc::new(ForegroundQueue::new());

    test_section!("insert then fetch through nested futures");
    let fetch_store = Arc::clone(&store);
    let greeting = store
        .insert(7, "ada")
        .transform(move |id| fetch_store.fetch(id))
        .transform(|name| Ok(format!("hello, {name}")))
        .with_timeout(Duration::from_secs(5))
        .with_context(Arc::clone(&foreground) as Arc<dyn pledge::Executor>);

    let delivered = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&delivered);
    greeting.on_success(move |text| {
        *slot.lock().unwrap() = Some((text, thread::current().id()));
    });

    assert!(foreground.run_until(TEST_WAIT, || delivered.lock().unwrap().is_some()));
    let (text, ran_on) = delivered.lock().unwrap().take().unwrap();
    assert_eq!(text, "hello, ada");
    assert_eq!(ran_on, thread::current().id(), "callback ran on the pumping thread");
    test_complete!("store pipeline");
}

#[test]
fn missing_row_recovers_with_default() {
    init_test_logging();
    let store = Store::new();
    let name = store
        .fetch(99)
        .recover(|e| {
            assert!(e.is_user());
            Ok("anonymous".to_string())
        })
        .await_result(TEST_WAIT);
    assert_eq!(name.as_deref(), Ok("anonymous"));
}

#[test]
fn operations_on_concurrent_queue() {
    init_test_logging();
    test_phase!("operations");
    let queue = DispatchQueue::concurrent("e2e.ops", 4);
    let ops: Vec<FutureOperation<usize>> = (0..8)
        .map(|i| {
            FutureOperation::new(move || {
                thread::sleep(Duration::from_millis(5));
                Ok::<_, Error>(i * i)
            })
        })
        .collect();
    for op in &ops {
        op.enqueue(&queue);
    }

    let all = sequence_on(
        queue.executor(),
        ops.iter().map(|op| op.future().clone()),
    );
    assert_outcome_ok!(settle(&all), (0..8).map(|i| i * i).collect::<Vec<_>>());
    assert!(ops.iter().all(FutureOperation::is_finished));
    assert_eq!(ops[3].result(), Some(9));
}

#[test]
fn cancelled_operation_cancels_downstream_work() {
    let upstream = Future::<u32>::new();
    let feed = upstream.clone();
    let op = FutureOperation::new(move || feed.transform(|v| Ok(v * 2)));
    assert!(op.start());
    assert!(op.is_executing());

    op.cancel();
    assert!(upstream.is_cancelled(), "cancel walks operation -> transform -> source");
    assert!(op.wait_until_finished(TEST_WAIT));
    assert!(op.error().is_some_and(|e| e.is_cancelled()));
    assert_outcome_cancelled!(settle(op.future()));
}

#[test]
fn custom_pool_and_runner() {
    init_test_logging();
    let pool = Arc::new(WorkerPool::with_config(PoolConfig {
        min_threads: 0,
        max_threads: 2,
        idle_timeout: Duration::from_millis(50),
        thread_name_prefix: "e2e-pool".into(),
    }));
    let dispatched = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&dispatched);
    let pool_for_runner = Arc::clone(&pool);
    let runner = from_fn(move |job| {
        counter.fetch_add(1, Ordering::SeqCst);
        pool_for_runner.spawn(job);
    });

    let source = Future::spawn_on(Arc::clone(&runner), || Ok::<_, Error>(3));
    let (tx, rx) = mpsc::channel();
    source.on_success(move |v| {
        let name = thread::current().name().map(str::to_owned);
        tx.send((v, name)).unwrap();
    });

    let (value, name) = recv(&rx);
    assert_eq!(value, 3);
    assert!(name.is_some_and(|n| n.starts_with("e2e-pool")));
    assert!(dispatched.load(Ordering::SeqCst) >= 2, "block and callback both dispatched");
    assert!(pool.shutdown_and_wait(TEST_WAIT));
}

#[test]
fn timeout_then_late_source_is_ignored() {
    let source = Future::<i32>::new();
    let bounded = source.with_timeout(Duration::from_millis(30));
    match settle(&bounded) {
        Outcome::Err(e) => assert!(e.is_timeout()),
        other => panic!("expected timeout, got {other:?}"),
    }
    assert!(source.try_success(1), "source still pending after the timeout");
    thread::sleep(Duration::from_millis(20));
    assert!(bounded.is_failed());
}
