//! # 执行器切换
//!
//! ## 契约声明
//! * 本模块只定义“把一个工作单元交给外部执行器”的最小接口，不提供线程池或定时器；
//! * [`shift`] 完全由 [`Async::async_`] 推导，任何 `Async` 实现都自动获得该能力。
//!
//! ## 并发语义
//! * `shift` 的计算在执行器运行了被调度的工作单元之后才完成，后续步骤在执行器的线程上继续；
//! * 除执行器自身提供的顺序保证外，不引入任何额外同步。
use crate::{capability::Async, completion::Completion};
use alloc::{boxed::Box, sync::Arc};

/// 交给执行器的工作单元。
pub type Runnable = Box<dyn FnOnce() + Send + 'static>;

/// `Executor` 描述外部提供的任务调度能力。
///
/// # 设计背景（Why）
/// - 调度器的实现方式（线程池、事件循环、测试队列）与契约无关，只需要“提交一个工作单元”；
/// - 同时提供对象安全入口与泛型入口：前者允许 `dyn Executor` 存放在能力对象中，后者避免调用方手动装箱。
///
/// # 契约说明（What）
/// - **前置条件**：实现者保证被提交的工作单元最终被运行（或在执行器关闭时被丢弃）；
/// - **后置条件**：`execute_dyn` 不得同步 panic；拒绝任务的策略由实现者自行记录。
///
/// # 风险提示（Trade-offs）
/// - 被丢弃的工作单元意味着依赖它的 `shift` 计算永不完成，与 `never` 语义一致。
pub trait Executor: Send + Sync {
    /// 对象安全的提交接口。
    fn execute_dyn(&self, task: Runnable);

    /// 泛型化的提交入口，默认装箱后委托给 [`execute_dyn`](Self::execute_dyn)。
    fn execute<T>(&self, task: T)
    where
        Self: Sized,
        T: FnOnce() + Send + 'static,
    {
        self.execute_dyn(Box::new(task))
    }
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute_dyn(&self, task: Runnable) {
        (**self).execute_dyn(task)
    }
}

impl<E: Executor + ?Sized> Executor for &'static E {
    fn execute_dyn(&self, task: Runnable) {
        (**self).execute_dyn(task)
    }
}

/// 在提交线程上立即运行工作单元的执行器。
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute_dyn(&self, task: Runnable) {
        task()
    }
}

/// 构造一个把后续执行切换到 `executor` 上的计算。
///
/// # 逻辑解析（How）
/// - `async_(|cb| executor.execute(|| cb.succeed(())))`：向执行器提交一个只负责完成通道的工作单元；
/// - 通道在执行器线程上被调用，因此后续步骤也在该线程上继续。
///
/// # 示例（Examples）
/// ```rust
/// use spark_effect::{InlineExecutor, IoEffect, SyncEffect, shift};
///
/// let io = IoEffect.flat_map(shift(&IoEffect, InlineExecutor), |()| IoEffect.pure(1));
/// # #[cfg(feature = "std")]
/// assert_eq!(io.run_blocking(&Default::default()), Ok(1));
/// ```
pub fn shift<F, E>(effect: &F, executor: E) -> F::Of<()>
where
    F: Async,
    E: Executor + 'static,
{
    effect.async_(move |completion: Completion<()>| {
        tracing::trace!("shift scheduling continuation onto executor");
        executor.execute_dyn(Box::new(move || completion.succeed(())));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{Io, IoEffect};
    use core::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn inline_shift_completes_synchronously() {
        let hits = Arc::new(AtomicUsize::new(0));
        let io = {
            let hits = Arc::clone(&hits);
            shift(&IoEffect, InlineExecutor).map(move |()| hits.fetch_add(1, Ordering::SeqCst))
        };
        let observed = Arc::new(AtomicUsize::new(usize::MAX));
        {
            let observed = Arc::clone(&observed);
            io.run_async(move |outcome| {
                observed.store(outcome.unwrap_or(usize::MAX), Ordering::SeqCst)
            });
        }
        assert_eq!(observed.load(Ordering::SeqCst), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropped_task_leaves_shift_pending() {
        struct Discard;
        impl Executor for Discard {
            fn execute_dyn(&self, _task: Runnable) {}
        }

        let hits = Arc::new(AtomicUsize::new(0));
        let io: Io<()> = shift(&IoEffect, Arc::new(Discard));
        {
            let hits = Arc::clone(&hits);
            io.run_async(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
