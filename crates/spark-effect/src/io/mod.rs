//! # 参考引擎 `Io`
//!
//! ## 定位
//! * `Io<A>` 是一个已经完整可用的异步计算类型：它有自己的节点图、栈安全的运行循环和回调安装机制。
//!   [`bridge`](crate::bridge) 把它构建的计算转换为任意 [`Async`](crate::Async) 类型的计算。
//! * 对外只暴露桥接所需的两个观察操作：[`Io::shape`]（不推进，静态分类）与 [`Io::step`]（单步推进）。
//!
//! ## 并发与错误语义
//! * 构造 `Io` 不运行任何东西；`run_async` 在调用线程上同步执行到第一个异步边界，
//!   之后在回调所在的线程上继续。
//! * 每个异步边界只恢复一次；通道上的重复调用被忽略。这是参考引擎的实例级承诺，不属于 `Async` 契约本身。
//! * 注册函数中的 panic 不被捕获，沿运行线程向上展开。
mod effect;
mod node;
mod run_loop;

#[cfg(feature = "std")]
mod blocking;

pub use effect::IoEffect;

#[cfg(feature = "std")]
pub use blocking::IoFuture;

use crate::{
    completion::Completion,
    error::{CoreError, Outcome},
};
use alloc::{boxed::Box, vec::Vec};
use core::{fmt, marker::PhantomData};
use node::{Frame, Installer, Node, Value, erase, erased_completion, typed_completion, unerase};
use run_loop::Stepped;

/// 结果类型为 `A` 的参考引擎计算。
///
/// # 设计背景（Why）
/// - 节点图以类型擦除的形式保存，`PhantomData<fn() -> A>` 只在边界处携带类型，使 `Io<A>` 对任意 `A` 都满足 `Send`；
/// - 所有组合子都只是构造新的节点，运行时由 [`run_loop`] 以显式帧栈解释，长链 `flat_map` 不会消耗调用栈。
///
/// # 契约说明（What）
/// - 值语义：`Io<A>` 只能被运行一次（运行即消费）；
/// - 失败统一以 [`CoreError`] 表达。
///
/// # 示例（Examples）
/// ```rust
/// use spark_effect::Io;
///
/// let io = Io::pure(20).map(|n| n + 1).flat_map(|n| Io::delay(move || n * 2));
/// # #[cfg(feature = "std")]
/// assert_eq!(io.run_blocking(&Default::default()), Ok(42));
/// ```
pub struct Io<A> {
    node: Node,
    _marker: PhantomData<fn() -> A>,
}

/// [`Io::shape`] 的静态分类结果。
pub enum Shape<A> {
    /// 构造时即为纯值。
    Pure(A),
    /// 构造时即为失败。
    RaiseError(CoreError),
    /// 需要推进才能得到结果。
    Deferred(Io<A>),
}

/// [`Io::step`] 的单步推进结果。
pub enum Step<A> {
    /// 推进后得到纯值。
    Pure(A),
    /// 推进后得到失败。
    RaiseError(CoreError),
    /// 推进停在不可再化简的异步节点上。
    Async(AsyncNode<A>),
}

/// 推进后剩下的异步节点：持有回调安装器以及异步边界之后仍待执行的续体。
///
/// 安装器可以直接交给任意 `Async` 实现的 `async_`，由后者成为参考引擎这一步的实际执行载体。
pub struct AsyncNode<A> {
    installer: Installer,
    _marker: PhantomData<fn() -> A>,
}

impl<A: Send + 'static> AsyncNode<A> {
    /// 发起异步注册；`completion` 最终收到整段剩余计算的结果。
    pub fn install(self, completion: Completion<A>) {
        (self.installer)(erased_completion(completion))
    }
}

impl<A> fmt::Debug for AsyncNode<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncNode").finish_non_exhaustive()
    }
}

impl<A> Io<A> {
    fn from_node(node: Node) -> Self {
        Self {
            node,
            _marker: PhantomData,
        }
    }
}

impl<A: Send + 'static> Io<A> {
    /// 纯值。
    pub fn pure(value: A) -> Self {
        Self::from_node(Node::Pure(erase(value)))
    }

    /// 失败。
    pub fn raise_error(error: CoreError) -> Self {
        Self::from_node(Node::RaiseError(error))
    }

    /// 由已知结果构造。
    pub fn from_outcome(outcome: Outcome<A>) -> Self {
        match outcome {
            Ok(value) => Self::pure(value),
            Err(error) => Self::raise_error(error),
        }
    }

    /// 延迟执行副作用。
    pub fn delay<T>(thunk: T) -> Self
    where
        T: FnOnce() -> A + Send + 'static,
    {
        Self::from_node(Node::Delay(Box::new(move || erase(thunk()))))
    }

    /// 延迟构造计算。
    pub fn suspend<T>(thunk: T) -> Self
    where
        T: FnOnce() -> Io<A> + Send + 'static,
    {
        Self::from_node(Node::Suspend(Box::new(move || thunk().node)))
    }

    /// 以回调注册函数构造计算；注册函数在运行时被调用一次。
    pub fn async_<K>(registration: K) -> Self
    where
        K: FnOnce(Completion<A>) + Send + 'static,
    {
        Self::from_node(Node::Async(Box::new(move |out: Completion<Value>| {
            registration(typed_completion(out))
        })))
    }

    /// 注册函数返回一段 `Io<()>`，在运行时被构造并运行以完成注册。
    ///
    /// # 契约说明（What）
    /// - 注册计算成功时不做任何事，结果完全取决于它是否调用通道；
    /// - 注册计算失败时，失败被转发到通道。
    pub fn async_suspended<K>(registration: K) -> Self
    where
        K: FnOnce(Completion<A>) -> Io<()> + Send + 'static,
    {
        Self::async_(move |completion: Completion<A>| {
            let on_failure = completion.clone();
            registration(completion).run_async(move |outcome: Outcome<()>| {
                if let Err(error) = outcome {
                    tracing::debug!(code = error.code(), "async registration failed; forwarding to completion");
                    on_failure.fail(error);
                }
            });
        })
    }

    /// 永不完成的计算。
    pub fn never() -> Self {
        Self::async_(|_completion: Completion<A>| ())
    }

    /// 变换成功值。
    pub fn map<B, F>(self, f: F) -> Io<B>
    where
        B: Send + 'static,
        F: FnOnce(A) -> B + Send + 'static,
    {
        self.flat_map(move |value| Io::pure(f(value)))
    }

    /// 顺序组合。
    pub fn flat_map<B, F>(self, f: F) -> Io<B>
    where
        B: Send + 'static,
        F: FnOnce(A) -> Io<B> + Send + 'static,
    {
        let frame = Frame::OnSuccess(Box::new(move |value: Value| match unerase::<A>(value) {
            Ok(value) => f(value).node,
            Err(error) => Node::RaiseError(error),
        }));
        Io::from_node(Node::Bind(Box::new(self.node), frame))
    }

    /// 捕获失败并以替代计算继续。
    pub fn handle_error_with<F>(self, f: F) -> Io<A>
    where
        F: FnOnce(CoreError) -> Io<A> + Send + 'static,
    {
        let frame = Frame::OnFailure(Box::new(move |error: CoreError| f(error).node));
        Io::from_node(Node::Bind(Box::new(self.node), frame))
    }

    /// 把失败物化为成功值。
    pub fn attempt(self) -> Io<Outcome<A>> {
        self.map(Ok).handle_error_with(|error| Io::pure(Err(error)))
    }

    /// 静态分类：不推进、不运行任何东西。
    pub fn shape(self) -> Shape<A> {
        match self.node {
            Node::Pure(value) => match unerase::<A>(value) {
                Ok(value) => Shape::Pure(value),
                Err(error) => Shape::RaiseError(error),
            },
            Node::RaiseError(error) => Shape::RaiseError(error),
            node => Shape::Deferred(Io::from_node(node)),
        }
    }

    /// 单步推进：同步执行延迟、挂起与组合层，直到纯值、失败或不可再化简的异步节点。
    pub fn step(self) -> Step<A> {
        match run_loop::step(self.node) {
            Stepped::Pure(value) => match unerase::<A>(value) {
                Ok(value) => Step::Pure(value),
                Err(error) => Step::RaiseError(error),
            },
            Stepped::RaiseError(error) => Step::RaiseError(error),
            Stepped::Async(installer) => Step::Async(AsyncNode {
                installer,
                _marker: PhantomData,
            }),
        }
    }

    /// 运行计算并把结果投递给 `callback`。
    ///
    /// 同步前缀在调用线程上执行；遇到异步边界后，剩余部分在回调所在线程上继续。
    pub fn run_async<F>(self, callback: F)
    where
        F: Fn(Outcome<A>) + Send + Sync + 'static,
    {
        let out = erased_completion(Completion::new(callback));
        run_loop::run(self.node, Vec::new(), out)
    }
}

impl<A> fmt::Debug for Io<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.node {
            Node::Pure(_) => "Pure",
            Node::RaiseError(_) => "RaiseError",
            Node::Delay(_) => "Delay",
            Node::Suspend(_) => "Suspend",
            Node::Bind(..) => "Bind",
            Node::Async(_) => "Async",
        };
        f.debug_tuple("Io").field(&kind).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn shape_does_not_run_deferred_work() {
        let ran = Arc::new(AtomicUsize::new(0));
        let io = {
            let ran = Arc::clone(&ran);
            Io::delay(move || ran.fetch_add(1, Ordering::SeqCst))
        };
        assert!(matches!(io.shape(), Shape::Deferred(_)));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert!(matches!(Io::pure(42).shape(), Shape::Pure(42)));
    }

    #[test]
    fn from_outcome_is_statically_known() {
        assert!(matches!(Io::from_outcome(Ok::<u8, CoreError>(3)).shape(), Shape::Pure(3)));
        let failed = Io::<u8>::from_outcome(Err(CoreError::raised("known")));
        assert!(matches!(failed.shape(), Shape::RaiseError(error) if error.message() == "known"));
    }

    #[test]
    fn step_consumes_synchronous_prefix() {
        let io = Io::suspend(|| Io::delay(|| 20)).map(|n| n + 1).map(|n| n * 2);
        assert!(matches!(io.step(), Step::Pure(42)));
    }

    #[test]
    fn step_folds_frames_after_async_boundary() {
        let io = Io::pure(1)
            .flat_map(|n| Io::async_(move |cb: Completion<i32>| cb.succeed(n + 1)))
            .map(|n| n * 10);
        let node = match io.step() {
            Step::Async(node) => node,
            _ => panic!("异步边界必须停止推进"),
        };
        let seen = Arc::new(AtomicUsize::new(0));
        let sink = {
            let seen = Arc::clone(&seen);
            Completion::new(move |outcome: Outcome<i32>| {
                seen.store(outcome.unwrap_or_default() as usize, Ordering::SeqCst)
            })
        };
        node.install(sink);
        assert_eq!(seen.load(Ordering::SeqCst), 20, "折叠的续体在回调之后执行");
    }
}
