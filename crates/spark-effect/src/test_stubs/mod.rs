//! 异步契约相关的测试桩集合。
//!
//! # 设计定位（Why）
//! - 执行器切换与参考引擎桥接的测试都需要“可观察”的替身：能够手动驱动的执行器、能够统计构造器调用次数的能力对象；
//! - 统一出口避免各测试文件重复定义，并在契约调整时获得集中编译错误提示。
//!
//! # 使用方式（How）
//! - `RecordingExecutor` 只排队不运行，由测试调用 [`RecordingExecutor::run_next`] 推进；
//! - `CountingEffect` 以参考引擎为载体，逐一统计 `pure`/`raise_error`/`delay`/`suspend`/`async_` 的调用次数；
//! - `CallbackEffect` 不经过运行循环，把通道的每一次调用原样交给调用方，用来检验包装层是否增减投递。
//!
//! # 风险与权衡（Trade-offs）
//! - 桩对象只面向测试与 TCK，计数采用 `SeqCst` 原子操作，不追求性能。

pub mod executor {
    //! 手动驱动的执行器。
    use crate::shift::{Executor, Runnable};
    use alloc::{collections::VecDeque, sync::Arc};
    use core::sync::atomic::{AtomicUsize, Ordering};
    use spin::Mutex;

    /// 把提交的工作单元排入队列、由测试显式运行的执行器。
    ///
    /// # 契约定义（What）
    /// - 克隆共享同一队列；
    /// - `submitted` 统计累计提交次数，`executed` 统计已开始运行的次数（在工作单元运行前递增）。
    #[derive(Clone, Default)]
    pub struct RecordingExecutor {
        queue: Arc<Mutex<VecDeque<Runnable>>>,
        submitted: Arc<AtomicUsize>,
        executed: Arc<AtomicUsize>,
    }

    impl RecordingExecutor {
        /// 创建空执行器。
        pub fn new() -> Self {
            Self::default()
        }

        /// 运行队首工作单元；队列为空时返回 `false`。
        pub fn run_next(&self) -> bool {
            let task = self.queue.lock().pop_front();
            match task {
                Some(task) => {
                    self.executed.fetch_add(1, Ordering::SeqCst);
                    task();
                    true
                }
                None => false,
            }
        }

        /// 运行队列直到为空，返回本次运行的数量。
        pub fn run_all(&self) -> usize {
            let mut ran = 0;
            while self.run_next() {
                ran += 1;
            }
            ran
        }

        /// 等待运行的工作单元数量。
        pub fn pending(&self) -> usize {
            self.queue.lock().len()
        }

        /// 累计提交次数。
        pub fn submitted(&self) -> usize {
            self.submitted.load(Ordering::SeqCst)
        }

        /// 累计开始运行的次数。
        pub fn executed(&self) -> usize {
            self.executed.load(Ordering::SeqCst)
        }
    }

    impl Executor for RecordingExecutor {
        fn execute_dyn(&self, task: Runnable) {
            self.submitted.fetch_add(1, Ordering::SeqCst);
            self.queue.lock().push_back(task);
        }
    }

    impl core::fmt::Debug for RecordingExecutor {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            f.debug_struct("RecordingExecutor")
                .field("pending", &self.pending())
                .field("submitted", &self.submitted())
                .field("executed", &self.executed())
                .finish()
        }
    }
}

pub mod counting {
    //! 统计构造器调用次数的能力对象。
    use crate::{
        capability::{Async, SyncEffect},
        completion::Completion,
        error::CoreError,
        io::Io,
    };
    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicUsize, Ordering};

    /// 某一时刻的调用次数快照。
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct BuilderCounts {
        pub pure: usize,
        pub raise_error: usize,
        pub delay: usize,
        pub suspend: usize,
        pub async_: usize,
    }

    #[derive(Default)]
    struct Counters {
        pure: AtomicUsize,
        raise_error: AtomicUsize,
        delay: AtomicUsize,
        suspend: AtomicUsize,
        async_: AtomicUsize,
    }

    /// 以参考引擎为载体、记录构造器调用次数的能力对象。
    ///
    /// # 行为描述（How）
    /// - 计算类型就是 [`Io`]，语义与 [`IoEffect`](crate::IoEffect) 完全一致；
    /// - `lift_io` 保留默认实现，即经过桥接，用于断言桥接算法调用了哪些构造器；
    /// - `async_suspended` 的计数归入 `async_`。
    #[derive(Clone, Default)]
    pub struct CountingEffect {
        counters: Arc<Counters>,
    }

    impl CountingEffect {
        /// 创建计数为零的能力对象。
        pub fn new() -> Self {
            Self::default()
        }

        /// 当前计数快照。
        pub fn counts(&self) -> BuilderCounts {
            let load = |counter: &AtomicUsize| counter.load(Ordering::SeqCst);
            BuilderCounts {
                pure: load(&self.counters.pure),
                raise_error: load(&self.counters.raise_error),
                delay: load(&self.counters.delay),
                suspend: load(&self.counters.suspend),
                async_: load(&self.counters.async_),
            }
        }

        fn hit(counter: &AtomicUsize) {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl core::fmt::Debug for CountingEffect {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            f.debug_tuple("CountingEffect").field(&self.counts()).finish()
        }
    }

    impl SyncEffect for CountingEffect {
        type Of<A: Send + 'static> = Io<A>;

        fn pure<A: Send + 'static>(&self, value: A) -> Io<A> {
            Self::hit(&self.counters.pure);
            Io::pure(value)
        }

        fn raise_error<A: Send + 'static>(&self, error: CoreError) -> Io<A> {
            Self::hit(&self.counters.raise_error);
            Io::raise_error(error)
        }

        fn delay<A, T>(&self, thunk: T) -> Io<A>
        where
            A: Send + 'static,
            T: FnOnce() -> A + Send + 'static,
        {
            Self::hit(&self.counters.delay);
            Io::delay(thunk)
        }

        fn suspend<A, T>(&self, thunk: T) -> Io<A>
        where
            A: Send + 'static,
            T: FnOnce() -> Io<A> + Send + 'static,
        {
            Self::hit(&self.counters.suspend);
            Io::suspend(thunk)
        }

        fn flat_map<A, B, K>(&self, fa: Io<A>, f: K) -> Io<B>
        where
            A: Send + 'static,
            B: Send + 'static,
            K: FnOnce(A) -> Io<B> + Send + 'static,
        {
            fa.flat_map(f)
        }

        fn handle_error_with<A, K>(&self, fa: Io<A>, f: K) -> Io<A>
        where
            A: Send + 'static,
            K: FnOnce(CoreError) -> Io<A> + Send + 'static,
        {
            fa.handle_error_with(f)
        }
    }

    impl Async for CountingEffect {
        fn async_<A, K>(&self, registration: K) -> Io<A>
        where
            A: Send + 'static,
            K: FnOnce(Completion<A>) + Send + 'static,
        {
            Self::hit(&self.counters.async_);
            Io::async_(registration)
        }

        fn async_suspended<A, K>(&self, registration: K) -> Io<A>
        where
            A: Send + 'static,
            K: FnOnce(Completion<A>) -> Io<()> + Send + 'static,
        {
            Self::hit(&self.counters.async_);
            Io::async_suspended(registration)
        }
    }
}

pub mod callback {
    //! 不去重的回调式能力对象。
    use crate::{
        capability::{Async, SyncEffect},
        completion::Completion,
        error::{CoreError, Outcome},
    };
    use alloc::boxed::Box;
    use core::fmt;
    use spin::Mutex;

    /// 回调式计算：运行时把结果投递给调用方给出的通道，可能投递零次或多次。
    pub struct Callback<A: Send + 'static> {
        run: Box<dyn FnOnce(Completion<A>) + Send>,
    }

    impl<A: Send + 'static> Callback<A> {
        /// 以“接收完成通道”的函数构造。
        pub fn new<T>(run: T) -> Self
        where
            T: FnOnce(Completion<A>) + Send + 'static,
        {
            Self { run: Box::new(run) }
        }

        /// 运行计算，每一次结果都投递给 `sink`。
        pub fn run(self, sink: Completion<A>) {
            (self.run)(sink)
        }
    }

    impl<A: Send + 'static> fmt::Debug for Callback<A> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("Callback").finish_non_exhaustive()
        }
    }

    /// 以 [`Callback`] 为计算类型的能力对象。
    ///
    /// # 行为描述（How）
    /// - `async_` 把调用方的通道直接交给注册函数，没有运行循环，也不丢弃重复调用；
    /// - `flat_map` 与 `handle_error_with` 的后续步骤是一次性闭包，只在第一次匹配的投递上运行，
    ///   之后的同类投递被丢弃；另一类投递照常转发；
    /// - `lift_io` 保留默认实现，即经过桥接。
    ///
    /// # 风险与权衡（Trade-offs）
    /// - 组合按调用栈逐层展开，只适合浅层的测试计算。
    #[derive(Clone, Copy, Debug, Default)]
    pub struct CallbackEffect;

    impl SyncEffect for CallbackEffect {
        type Of<A: Send + 'static> = Callback<A>;

        fn pure<A: Send + 'static>(&self, value: A) -> Callback<A> {
            Callback::new(move |sink: Completion<A>| sink.succeed(value))
        }

        fn raise_error<A: Send + 'static>(&self, error: CoreError) -> Callback<A> {
            Callback::new(move |sink: Completion<A>| sink.fail(error))
        }

        fn delay<A, T>(&self, thunk: T) -> Callback<A>
        where
            A: Send + 'static,
            T: FnOnce() -> A + Send + 'static,
        {
            Callback::new(move |sink: Completion<A>| sink.succeed(thunk()))
        }

        fn suspend<A, T>(&self, thunk: T) -> Callback<A>
        where
            A: Send + 'static,
            T: FnOnce() -> Callback<A> + Send + 'static,
        {
            Callback::new(move |sink: Completion<A>| thunk().run(sink))
        }

        fn flat_map<A, B, K>(&self, fa: Callback<A>, f: K) -> Callback<B>
        where
            A: Send + 'static,
            B: Send + 'static,
            K: FnOnce(A) -> Callback<B> + Send + 'static,
        {
            Callback::new(move |sink: Completion<B>| {
                let next = Mutex::new(Some(f));
                fa.run(Completion::new(move |outcome: Outcome<A>| match outcome {
                    Ok(value) => {
                        let step = next.lock().take();
                        if let Some(step) = step {
                            step(value).run(sink.clone());
                        }
                    }
                    Err(error) => sink.fail(error),
                }))
            })
        }

        fn handle_error_with<A, K>(&self, fa: Callback<A>, f: K) -> Callback<A>
        where
            A: Send + 'static,
            K: FnOnce(CoreError) -> Callback<A> + Send + 'static,
        {
            Callback::new(move |sink: Completion<A>| {
                let handler = Mutex::new(Some(f));
                fa.run(Completion::new(move |outcome: Outcome<A>| match outcome {
                    Ok(value) => sink.succeed(value),
                    Err(error) => {
                        let recover = handler.lock().take();
                        if let Some(recover) = recover {
                            recover(error).run(sink.clone());
                        }
                    }
                }))
            })
        }
    }

    impl Async for CallbackEffect {
        fn async_<A, K>(&self, registration: K) -> Callback<A>
        where
            A: Send + 'static,
            K: FnOnce(Completion<A>) + Send + 'static,
        {
            Callback::new(registration)
        }

        fn async_suspended<A, K>(&self, registration: K) -> Callback<A>
        where
            A: Send + 'static,
            K: FnOnce(Completion<A>) -> Callback<()> + Send + 'static,
        {
            Callback::new(move |sink: Completion<A>| {
                let failures = sink.clone();
                registration(sink).run(Completion::new(move |outcome: Outcome<()>| {
                    if let Err(error) = outcome {
                        failures.fail(error);
                    }
                }))
            })
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use alloc::{sync::Arc, vec, vec::Vec};

        fn collect<A: Send + 'static>(fa: Callback<A>) -> Vec<Outcome<A>> {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&seen);
            fa.run(Completion::new(move |outcome| sink.lock().push(outcome)));
            let collected = core::mem::take(&mut *seen.lock());
            collected
        }

        #[test]
        fn repeated_completions_all_reach_the_sink() {
            let fa = CallbackEffect.async_(|cb: Completion<u8>| {
                cb.succeed(1);
                cb.succeed(2);
                cb.fail(CoreError::raised("late"));
            });
            assert_eq!(collect(fa), vec![Ok(1), Ok(2), Err(CoreError::raised("late"))]);
        }

        #[test]
        fn continuation_runs_on_first_success_only() {
            let source = CallbackEffect.async_(|cb: Completion<u8>| {
                cb.succeed(1);
                cb.succeed(2);
            });
            let fa = CallbackEffect.flat_map(source, |n| CallbackEffect.pure(n * 10));
            assert_eq!(collect(fa), vec![Ok(10)]);
        }
    }
}

pub use callback::{Callback, CallbackEffect};
pub use executor::RecordingExecutor;
pub use counting::{BuilderCounts, CountingEffect};
