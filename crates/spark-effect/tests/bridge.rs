//! 参考引擎桥接的构造器选择与结果转发。
//!
//! # 教案级注释概览
//!
//! - **核心目标 (Why)**：桥接把 `Io` 计算转换为任意 `Async` 类型的计算。静态已知的纯值与失败必须只经过
//!   `pure`/`raise_error`，其余情形必须先被 `suspend` 推迟，直到目标计算真正运行时才单步推进参考引擎。
//! - **设计手法 (How)**：使用 `CountingEffect` 统计桥接调用了哪些构造器；目标计算仍是 `Io`，因此可以直接
//!   `run_blocking` 观察最终结果。
//! - **合同 (What)**：转换本身不运行任何副作用；运行后结果与直接运行参考引擎一致。
use spark_effect::{
    Async, Completion, CoreError, Io, RunSettings, test_stubs::{BuilderCounts, CountingEffect},
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

fn settings() -> RunSettings {
    RunSettings::default().with_blocking_timeout(Duration::from_secs(5))
}

#[test]
fn pure_value_only_uses_pure() {
    let counting = CountingEffect::new();
    let lifted = counting.lift_io(Io::pure(42_u32));
    assert_eq!(
        counting.counts(),
        BuilderCounts {
            pure: 1,
            ..BuilderCounts::default()
        }
    );
    assert_eq!(lifted.run_blocking(&settings()), Ok(42));
}

#[test]
fn raised_error_only_uses_raise_error() {
    let counting = CountingEffect::new();
    let error = CoreError::raised("static failure");
    let lifted = counting.lift_io(Io::<u32>::raise_error(error.clone()));
    assert_eq!(
        counting.counts(),
        BuilderCounts {
            raise_error: 1,
            ..BuilderCounts::default()
        }
    );
    assert_eq!(lifted.run_blocking(&settings()), Err(error));
}

#[test]
fn deferred_work_is_suspended_until_run() {
    let counting = CountingEffect::new();
    let runs = Arc::new(AtomicUsize::new(0));
    let io = {
        let runs = Arc::clone(&runs);
        Io::delay(move || runs.fetch_add(1, Ordering::SeqCst) + 10)
    };

    let lifted = counting.lift_io(io);
    assert_eq!(runs.load(Ordering::SeqCst), 0, "转换期间不得运行副作用");
    assert_eq!(counting.counts().suspend, 1);
    assert_eq!(counting.counts().pure, 0);

    assert_eq!(lifted.run_blocking(&settings()), Ok(10));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(counting.counts().pure, 1, "同步前缀化简为纯值后经由 pure 交付");
    assert_eq!(counting.counts().async_, 0);
}

#[test]
fn deferred_failure_is_raised_after_stepping() {
    let counting = CountingEffect::new();
    let error = CoreError::raised("late failure");
    let io = {
        let error = error.clone();
        Io::<u8>::suspend(move || Io::raise_error(error))
    };
    let lifted = counting.lift_io(io);
    assert_eq!(lifted.run_blocking(&settings()), Err(error));
    assert_eq!(counting.counts().raise_error, 1);
}

#[test]
fn async_boundary_is_forwarded_through_async() {
    let counting = CountingEffect::new();
    let io = Io::async_(|completion: Completion<&'static str>| completion.succeed("x"));
    let lifted = counting.lift_io(io);
    assert_eq!(lifted.run_blocking(&settings()), Ok("x"));
    assert_eq!(counting.counts().suspend, 1);
    assert_eq!(counting.counts().async_, 1);
}

#[test]
fn continuation_after_async_boundary_runs_on_completing_thread() {
    let counting = CountingEffect::new();
    let io = Io::async_(|completion: Completion<u64>| {
        thread::spawn(move || completion.succeed(20));
    })
    .map(|value| value + 1)
    .flat_map(|value| Io::delay(move || value * 2));

    let lifted = counting.lift_io(io);
    assert_eq!(lifted.run_blocking(&settings()), Ok(42));
}

#[test]
fn async_failure_is_forwarded() {
    let counting = CountingEffect::new();
    let error = CoreError::raised("remote failure");
    let io = {
        let error = error.clone();
        Io::<u8>::async_(move |completion: Completion<u8>| completion.fail(error))
    };
    assert_eq!(counting.lift_io(io).run_blocking(&settings()), Err(error));
}
