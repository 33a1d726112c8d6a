//! 异步完成契约的各条定律。
//!
//! 每个函数都以 panic 表示定律不成立，可直接在 `#[test]` 或 proptest 中调用。
use crate::interpreter::Interpreter;
use crate::support::{Recorder, observe};
use spark_effect::{
    Async, Completion, CoreError, Io, Layer, Outcome, SyncEffect, shift,
    test_stubs::RecordingExecutor,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

/// 构造一个把 `outcome` 投递 `invocations` 次的注册函数；`runs` 统计注册函数本身被运行的次数。
fn repeating<A>(
    outcome: Outcome<A>,
    invocations: usize,
    runs: Arc<AtomicUsize>,
) -> impl FnOnce(Completion<A>) + Send + 'static
where
    A: Clone + Send + 'static,
{
    move |completion: Completion<A>| {
        runs.fetch_add(1, Ordering::SeqCst);
        for _ in 0..invocations {
            completion.complete(outcome.clone());
        }
    }
}

/// `async_(k)` 与 `async_suspended(|cb| delay(|| k(cb)))` 不可区分：
/// 通道调用次数相同，运行结果相同。
pub fn async_matches_suspended_delay<I: Interpreter>(
    interpreter: &I,
    outcome: Outcome<i64>,
    invocations: usize,
) {
    let effect = interpreter.effect();

    let direct_runs = Arc::new(AtomicUsize::new(0));
    let direct = effect.async_(repeating(
        outcome.clone(),
        invocations,
        Arc::clone(&direct_runs),
    ));

    let suspended_runs = Arc::new(AtomicUsize::new(0));
    let registration = repeating(outcome, invocations, Arc::clone(&suspended_runs));
    let delayed = effect.clone();
    let suspended = effect.async_suspended(move |completion: Completion<i64>| {
        delayed.delay(move || registration(completion))
    });

    let direct_seen = observe(interpreter, direct);
    let suspended_seen = observe(interpreter, suspended);

    assert_eq!(direct_runs.load(Ordering::SeqCst), 1, "async_ 的注册函数必须恰好运行一次");
    assert_eq!(suspended_runs.load(Ordering::SeqCst), 1, "async_suspended 的注册函数必须恰好运行一次");
    assert_eq!(direct_seen, suspended_seen, "两种构造下观察到的投递次数与结果必须一致");
}

/// `never` 在有界等待内不产生任何投递。
pub fn never_stays_pending<I: Interpreter>(interpreter: &I, wait: Duration) {
    let recorder = Recorder::<u8>::new();
    interpreter.run(interpreter.effect().never::<u8>(), recorder.completion());
    thread::sleep(wait);
    assert!(recorder.is_empty(), "never 不得调用完成通道");
}

/// `shift` 只在执行器运行了被调度的工作单元之后才完成，后续步骤在其之后执行。
pub fn shift_completes_after_executor_item<I: Interpreter>(interpreter: &I) {
    let effect = interpreter.effect().clone();
    let executor = RecordingExecutor::new();
    let observed_runs = Arc::new(AtomicUsize::new(usize::MAX));

    let marker = {
        let executor = executor.clone();
        let observed_runs = Arc::clone(&observed_runs);
        let effect = effect.clone();
        move |()| {
            effect.delay(move || {
                observed_runs.store(executor.executed(), Ordering::SeqCst);
            })
        }
    };
    let program = effect.flat_map(shift(&effect, executor.clone()), marker);

    let recorder = Recorder::<()>::new();
    interpreter.run(program, recorder.completion());
    assert!(recorder.is_empty(), "执行器运行前不得完成");
    assert_eq!(observed_runs.load(Ordering::SeqCst), usize::MAX, "标记不得先于执行器运行");
    assert_eq!(executor.pending(), 1, "shift 必须恰好提交一个工作单元");

    executor.run_all();
    assert_eq!(observed_runs.load(Ordering::SeqCst), 1, "标记必须在执行器运行工作单元之后执行");
    assert_eq!(recorder.snapshot(), vec![Ok(())]);
}

/// 桥接把参考引擎的异步成功原样转发。
pub fn bridge_forwards_async_success<I: Interpreter>(interpreter: &I) {
    let io = Io::async_(|completion: Completion<&'static str>| completion.succeed("x"));
    let lifted = interpreter.effect().lift_io(io);
    assert_eq!(observe(interpreter, lifted), vec![Ok("x")]);
}

/// 桥接保留静态已知的纯值与失败。
pub fn bridge_preserves_pure_and_error<I: Interpreter>(interpreter: &I) {
    let effect = interpreter.effect();
    assert_eq!(observe(interpreter, effect.lift_io(Io::pure(42_i64))), vec![Ok(42)]);

    let error = CoreError::raised("bridge");
    let lifted = effect.lift_io(Io::<i64>::raise_error(error.clone()));
    assert_eq!(observe(interpreter, lifted), vec![Err(error)]);
}

/// 桥接任意深度的组合链不会耗尽调用栈。
pub fn bridge_is_stack_safe<I: Interpreter>(interpreter: &I, depth: usize) {
    let mut io = Io::pure(0_usize);
    for index in 0..depth {
        io = if index % 1_000 == 0 {
            io.flat_map(|n| Io::async_(move |completion: Completion<usize>| completion.succeed(n + 1)))
        } else {
            io.map(|n| n + 1)
        };
    }
    let lifted = interpreter.effect().lift_io(io);
    assert_eq!(observe(interpreter, lifted), vec![Ok(depth)]);
}

/// 注册函数调用通道 `invocations` 次，运行计算时就恰好观察到 `invocations` 次投递。
///
/// 只适用于不去重的解释器（例如 [`CallbackInterpreter`](crate::CallbackInterpreter) 及其上的包装层）；
/// 参考引擎在第一次恢复后忽略后续调用。
pub fn async_forwards_every_invocation<I: Interpreter>(interpreter: &I, invocations: usize) {
    let runs = Arc::new(AtomicUsize::new(0));
    let fa = interpreter.effect().async_(repeating(
        Ok::<i64, CoreError>(3),
        invocations,
        Arc::clone(&runs),
    ));
    let seen = observe(interpreter, fa);
    assert_eq!(runs.load(Ordering::SeqCst), 1, "注册函数必须恰好运行一次");
    assert_eq!(seen, vec![Ok::<i64, CoreError>(3); invocations], "每一次通道调用都必须被投递");
}

/// 包装层的 `async_` 与内层的 `async_` 在注册运行次数、投递次数与投递内容上一致。
///
/// 内层解释器不去重时，本定律能发现增减投递的包装层。
pub fn layer_preserves_cardinality<O, I>(outer: &O, inner: &I, invocations: usize)
where
    O: Interpreter,
    I: Interpreter,
    O::Effect: Layer<Inner = I::Effect>,
{
    let lifted_runs = Arc::new(AtomicUsize::new(0));
    let lifted = outer.effect().async_(repeating(
        Ok::<i64, CoreError>(1),
        invocations,
        Arc::clone(&lifted_runs),
    ));
    let direct_runs = Arc::new(AtomicUsize::new(0));
    let direct = inner.effect().async_(repeating(
        Ok::<i64, CoreError>(1),
        invocations,
        Arc::clone(&direct_runs),
    ));

    let lifted_seen = observe(outer, lifted);
    let direct_seen = observe(inner, direct);

    assert_eq!(lifted_runs.load(Ordering::SeqCst), 1, "包装层不得重复或跳过注册");
    assert_eq!(direct_runs.load(Ordering::SeqCst), 1, "内层不得重复或跳过注册");
    assert_eq!(lifted_seen.len(), direct_seen.len(), "包装层不得增减结果投递");
    assert_eq!(lifted_seen, direct_seen, "包装层不得改写投递内容");
}

/// 内层失败经过包装层后仍是失败。
pub fn layer_keeps_inner_failure<I: Interpreter>(interpreter: &I) {
    let error = CoreError::raised("inner");
    let failing = {
        let error = error.clone();
        interpreter
            .effect()
            .async_(move |completion: Completion<i64>| completion.fail(error))
    };
    assert_eq!(observe(interpreter, failing), vec![Err(error)]);
}
