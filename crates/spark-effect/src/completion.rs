//! 完成通道：接收“成功或失败”结果且不返回任何值的可调用对象。
//!
//! # 契约说明（What）
//! - 通道本身没有身份与生命周期，克隆只复制引用；
//! - 符合契约的 `Async` 实现可以调用通道 0 次、1 次或多次；调用方不得假设“恰好一次”，
//!   除非具体实例在文档中作出承诺（参考引擎 [`Io`](crate::Io) 只在首次调用时恢复执行）；
//! - 通道不对并发调用做串行化：多次调用按发生顺序全部投递给监听者。
use crate::error::{CoreError, Outcome};
use alloc::sync::Arc;
use core::fmt;

/// `Completion<A>` 是 `Async` 注册函数拿到的回调句柄。
///
/// # 设计背景（Why）
/// - 注册函数经常把回调交给其他线程（定时器、I/O 完成端口、执行器），因此句柄必须 `Clone + Send + Sync`；
/// - 以 `Arc<dyn Fn>` 承载，允许多次调用，契合“0..n 次”的宽松契约。
///
/// # 逻辑解析（How）
/// - [`complete`](Self::complete) 是唯一的原语，`succeed`/`fail` 只是便捷写法；
/// - [`contramap`](Self::contramap) 在不引入额外缓冲的前提下改变通道接受的值类型。
///
/// # 风险提示（Trade-offs）
/// - 通道不做去重；若注册方多次调用，下游后果由注册方负责。
pub struct Completion<A> {
    inner: Arc<dyn Fn(Outcome<A>) + Send + Sync>,
}

impl<A> Completion<A> {
    /// 以任意可重复调用的闭包构造通道。
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(Outcome<A>) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(callback),
        }
    }

    /// 投递一次结果。
    pub fn complete(&self, outcome: Outcome<A>) {
        (self.inner)(outcome)
    }

    /// 投递成功值。
    pub fn succeed(&self, value: A) {
        self.complete(Ok(value))
    }

    /// 投递计算失败。
    pub fn fail(&self, error: CoreError) {
        self.complete(Err(error))
    }
}

impl<A: 'static> Completion<A> {
    /// 构造一个接收 `B` 的通道：每次调用先经 `adapt` 转换，再原样转发给当前通道。
    ///
    /// # 契约说明（What）
    /// - 调用次数一一对应，不缓存、不去重；
    /// - `adapt` 可以把成功值转换为失败（例如类型恢复失败），反之亦然。
    pub fn contramap<B, F>(self, adapt: F) -> Completion<B>
    where
        B: 'static,
        F: Fn(Outcome<B>) -> Outcome<A> + Send + Sync + 'static,
    {
        Completion::new(move |outcome| self.complete(adapt(outcome)))
    }
}

impl<A> Clone for Completion<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> fmt::Debug for Completion<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion").finish_non_exhaustive()
    }
}
