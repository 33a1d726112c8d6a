//! # 能力契约：同步挂起与异步完成
//!
//! ## 契约声明
//! * **显式能力对象：** 能力以值的形式由调用方持有并传递（`&F`），而不是按类型隐式查找；同一计算类型可以有多个能力对象，
//!   例如包装层能力内部持有其内层能力。
//! * **计算族：** 通过泛型关联类型 `Of<A>` 表达“结果类型为 `A` 的计算”，以此替代类型构造器多态。
//! * **不可变：** 能力对象不持有可变状态，要求 `Clone + Send + Sync + 'static`，以便被捕获进延迟执行的闭包。
//!
//! ## 并发与错误语义
//! * 所有构造器只“描述”计算，不运行任何东西；执行与线程选择完全由最终运行计算的一方决定。
//! * 失败从不以 panic 或返回值的形式同步抛出，而是经由完成通道或 `raise_error` 表达。
use crate::{
    bridge,
    completion::Completion,
    error::{CoreError, Outcome},
    io::Io,
};

/// `SyncEffect` 描述“同步挂起”能力：纯值、失败、延迟副作用、延迟构造与顺序组合。
///
/// # 设计背景（Why）
/// - 异步能力依赖这组操作：桥接算法需要 `pure`/`raise_error`/`suspend`，`async_suspended` 需要 `delay`；
/// - 包装层需要 `flat_map` 才能把内层结果重新打包，因此顺序组合也属于该能力。
///
/// # 契约说明（What）
/// - `pure(a)`：立即成功；
/// - `raise_error(e)`：立即失败；
/// - `delay(thunk)`：运行时才执行 `thunk`；
/// - `suspend(thunk)`：运行时才构造并运行 `thunk` 返回的计算；
/// - `flat_map(fa, f)`：`fa` 成功后以其结果构造下一段计算；`fa` 失败时跳过 `f`；
/// - `handle_error_with(fa, f)`：`fa` 失败时以错误构造替代计算。
///
/// # 风险提示（Trade-offs）
/// - 闭包一律要求 `Send + 'static`：计算可能在其他线程上被运行，且生命周期独立于构造者。
pub trait SyncEffect: Clone + Send + Sync + 'static {
    /// 结果类型为 `A` 的计算。
    type Of<A: Send + 'static>: Send + 'static;

    /// 以纯值构造成功的计算。
    fn pure<A: Send + 'static>(&self, value: A) -> Self::Of<A>;

    /// 构造以 `error` 失败的计算。
    fn raise_error<A: Send + 'static>(&self, error: CoreError) -> Self::Of<A>;

    /// 把副作用延迟到计算运行时执行。
    fn delay<A, T>(&self, thunk: T) -> Self::Of<A>
    where
        A: Send + 'static,
        T: FnOnce() -> A + Send + 'static;

    /// 把计算的构造延迟到运行时。
    fn suspend<A, T>(&self, thunk: T) -> Self::Of<A>
    where
        A: Send + 'static,
        T: FnOnce() -> Self::Of<A> + Send + 'static;

    /// 顺序组合。
    fn flat_map<A, B, K>(&self, fa: Self::Of<A>, f: K) -> Self::Of<B>
    where
        A: Send + 'static,
        B: Send + 'static,
        K: FnOnce(A) -> Self::Of<B> + Send + 'static;

    /// 捕获计算失败并以替代计算继续。
    fn handle_error_with<A, K>(&self, fa: Self::Of<A>, f: K) -> Self::Of<A>
    where
        A: Send + 'static,
        K: FnOnce(CoreError) -> Self::Of<A> + Send + 'static;

    /// 变换成功值。
    fn map<A, B, K>(&self, fa: Self::Of<A>, f: K) -> Self::Of<B>
    where
        A: Send + 'static,
        B: Send + 'static,
        K: FnOnce(A) -> B + Send + 'static,
    {
        let this = self.clone();
        self.flat_map(fa, move |value| this.pure(f(value)))
    }

    /// 把已知结果提升为计算。
    fn from_outcome<A: Send + 'static>(&self, outcome: Outcome<A>) -> Self::Of<A> {
        match outcome {
            Ok(value) => self.pure(value),
            Err(error) => self.raise_error(error),
        }
    }

    /// 把失败物化为成功值，使后续步骤能够观察到它。
    fn attempt<A: Send + 'static>(&self, fa: Self::Of<A>) -> Self::Of<Outcome<A>> {
        let this = self.clone();
        let materialized = self.map(fa, Ok::<A, CoreError>);
        self.handle_error_with(materialized, move |error| this.pure(Err::<A, CoreError>(error)))
    }

    /// 丢弃成功值。
    fn void<A: Send + 'static>(&self, fa: Self::Of<A>) -> Self::Of<()> {
        self.map(fa, |_| ())
    }
}

/// `Async` 描述通过回调而非直接返回来完成的计算。
///
/// # 设计背景（Why）
/// - 任何基于回调的外部设施（定时器、I/O 完成、执行器）都可以借由 [`async_`](Self::async_) 接入；
/// - 两个原语构造器足以推导出 `never`、执行器切换与参考引擎桥接，无需任何特化原语。
///
/// # 逻辑解析（How）
/// - `async_(k)`：运行计算时，由实现调用一次 `k` 并传入完成通道，随后完全依赖 `k` 最终调用该通道；
/// - `async_suspended(k)`：`k` 的调用本身被挂起到运行时，且 `k` 返回一段本计算类型的计算，
///   该计算被运行以执行真正的注册步骤；当注册步骤需要以 `F` 自身的词汇表达副作用（例如原子修改共享单元）时使用；
/// - 定义两者关系的定律：`async_(k)` 与 `async_suspended(|cb| delay(|| k(cb)))` 在结果与通道调用次数上不可区分。
///
/// # 契约说明（What）
/// - **前置条件**：能力对象本身无状态；注册函数中的共享资源由注册方自行同步；
/// - **后置条件**：构造器从不同步失败；注册过程中的失败通过通道报告；
/// - **panic 语义**：`async_` 不捕获注册函数内的 panic，panic 沿运行计算的线程向上展开，通道不会被调用；
///   `async_suspended` 返回的注册计算若以 `raise_error` 失败，该失败会被转发到通道。
///
/// # 风险提示（Trade-offs）
/// - 本契约不提供取消：`never` 是一个永久挂起、没有清理钩子的计算，取消需要更强的上层契约；
/// - 通道调用次数不受约束，“恰好一次”属于更严格的细化契约。
pub trait Async: SyncEffect {
    /// 以回调注册函数构造计算。
    fn async_<A, K>(&self, registration: K) -> Self::Of<A>
    where
        A: Send + 'static,
        K: FnOnce(Completion<A>) + Send + 'static;

    /// 以“返回注册计算”的函数构造计算，注册函数的调用被挂起到运行时。
    fn async_suspended<A, K>(&self, registration: K) -> Self::Of<A>
    where
        A: Send + 'static,
        K: FnOnce(Completion<A>) -> Self::Of<()> + Send + 'static;

    /// 永不完成的计算：注册一个永远不会被调用的回调。
    ///
    /// 该计算刻意挂起，常作为组合的基本构件；任何取消语义都需要调用方在其上自行叠加。
    fn never<A: Send + 'static>(&self) -> Self::Of<A> {
        self.async_(|_completion: Completion<A>| ())
    }

    /// 吸收参考引擎构建的计算。
    ///
    /// 默认实现走 [`bridge::lift_io`]；参考引擎自身与包装层会覆写为更直接的路径。
    fn lift_io<A: Send + 'static>(&self, io: Io<A>) -> Self::Of<A> {
        bridge::lift_io(self, io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{io::IoEffect, layer::run_now};

    #[test]
    fn from_outcome_chooses_pure_or_raise_error() {
        assert_eq!(run_now(IoEffect.from_outcome(Ok::<u8, CoreError>(1))), Some(Ok(1)));
        let error = CoreError::raised("known");
        assert_eq!(run_now(IoEffect.from_outcome::<u8>(Err(error.clone()))), Some(Err(error)));
    }

    #[test]
    fn attempt_materialises_both_outcomes() {
        let error = CoreError::raised("late");
        let failed = IoEffect.attempt(IoEffect.raise_error::<u8>(error.clone()));
        assert_eq!(run_now(failed), Some(Ok(Err(error))));
        assert_eq!(run_now(IoEffect.attempt(IoEffect.pure(2_u8))), Some(Ok(Ok(2))));
    }
}
