//! # 包装层能力推导
//!
//! ## 契约声明
//! * 包装层把内层计算 `F::Of<_>` 包成新的计算类型：结果包装（`Result`）、可选值包装（`Option`）、
//!   日志包装（`(L, A)`）、状态包装（`S -> F::Of<(S, A)>`）与环境包装（`R -> F::Of<A>`）。
//! * 每个包装层都借助内层的 `Async` 能力获得自己的 `Async` 能力，且只有一套提升算法：[`Layer`]。
//!
//! ## 逻辑解析（How）
//! * [`Layer::pack`]：把一个成功值打包为内层结果；上下文对结果、可选值与日志包装是 `()`，
//!   对状态包装是调用时刻的状态，对环境包装是环境值。
//! * [`Layer::enter`]：给定“由上下文构造内层计算”的函数，得到包装层的计算。
//! * [`Layer::lower_unit`]：把包装层的 `Of<()>` 在给定上下文下降回内层的 `Of<()>`，用于运行 `async_suspended` 的注册计算。
//! * [`async_`]、[`async_suspended`]、[`lift_io`] 只依赖以上三项，各包装层的 `Async` 实现直接委托给它们。
//!
//! ## 并发与错误语义
//! * 提升过程不拦截、不缓冲、不重新解释通道调用：注册函数拿到的通道只对每次投递的成功值做打包，
//!   调用次数与内层完全一致，不依赖内层是否去重；
//! * 内层失败从不被转换为 `Err`/`None`；包装层的 `raise_error`/`handle_error_with` 只作用于内层失败通道。
mod either;
mod option;
mod reader;
mod state;
mod writer;

pub use either::EitherLayer;
pub use option::OptionLayer;
pub use reader::{Contextual, ReaderLayer};
pub use state::{StateLayer, Stateful};
pub use writer::{Monoid, WriterLayer};

use crate::{
    capability::{Async, SyncEffect},
    completion::Completion,
    error::Outcome,
    io::Io,
};
use alloc::sync::Arc;
use spin::Mutex;

/// 内层 `F` 的计算类型简写。
pub type InnerOf<L, A> = <<L as Layer>::Inner as SyncEffect>::Of<A>;

/// `Layer` 描述一个建立在内层异步能力之上的包装层。
///
/// # 设计背景（Why）
/// - 五类包装层的 `Async` 推导只在两处不同：成功值如何打包、上下文如何穿过；
///   把这两处抽象为 `pack`/`enter`/`lower_unit`，推导算法只需写一次；
/// - 包装层可以嵌套，例如 `StateLayer<EitherLayer<IoEffect, E>, S>`，内层本身也可以是包装层。
///
/// # 逻辑解析（How）
/// - `async_(k)`：`enter(|ctx| inner.async_(|cb| k(cb.contramap(pack(ctx)))))`，打包发生在通道上；
/// - `async_suspended(k)`：同上，注册计算额外经 `lower_unit(k(cb), ctx)` 降回内层；
/// - `lift_io(io)`：`enter(|ctx| inner.map(inner.lift_io(io), pack(ctx)))`，参考引擎计算先被内层吸收再打包。
///
/// # 契约说明（What）
/// - **前置条件**：`pack` 是纯函数，每次通道投递调用一次；`enter` 只把上下文交给 `build`，不得额外运行、重复或丢弃其结果；
/// - **后置条件**：状态包装在注册期间固定调用时刻的状态，环境包装原样传递环境值；
/// - `lower_unit` 遇到包装层自身的短路值（`Err`/`None`）时，以 `effect.layer_short_circuit` 失败结束注册计算。
///
/// # 风险提示（Trade-offs）
/// - 注册计算中写入的日志与状态变化在 `lower_unit` 处被丢弃：注册步骤只负责安装回调，其输出不属于结果；
/// - 通道可能被并发调用，打包时上下文以自旋锁保护，`pack` 不应执行耗时操作。
pub trait Layer: SyncEffect {
    /// 内层异步能力。
    type Inner: Async;

    /// 穿过包装层的上下文。
    type Context: Clone + Send + 'static;

    /// 成功值 `A` 在内层计算中的形态，例如 `Result<A, E>` 或 `(S, A)`。
    type Packed<A: Send + 'static>: Send + 'static;

    /// 内层能力对象。
    fn inner(&self) -> &Self::Inner;

    /// 在给定上下文下打包一个成功值。
    fn pack<A: Send + 'static>(&self, context: &Self::Context, value: A) -> Self::Packed<A>;

    /// 以上下文构造内层计算，得到包装层的计算。
    fn enter<A, B>(&self, build: B) -> Self::Of<A>
    where
        A: Send + 'static,
        B: FnOnce(Self::Context) -> InnerOf<Self, Self::Packed<A>> + Send + 'static;

    /// 在给定上下文下把包装层的单元计算降回内层。
    fn lower_unit(&self, fa: Self::Of<()>, context: Self::Context) -> InnerOf<Self, ()>;
}

/// 把内层通道改写为接收未打包成功值的通道，每次投递都单独打包。
fn packing<L, A>(layer: &L, context: L::Context, completion: Completion<L::Packed<A>>) -> Completion<A>
where
    L: Layer,
    A: Send + 'static,
{
    let this = layer.clone();
    let context = Arc::new(Mutex::new(context));
    completion.contramap(move |outcome: Outcome<A>| {
        outcome.map(|value| this.pack(&context.lock(), value))
    })
}

/// 包装层的 `async_`：通道逐次打包后交给内层。
pub fn async_<L, A, K>(layer: &L, registration: K) -> L::Of<A>
where
    L: Layer,
    A: Send + 'static,
    K: FnOnce(Completion<A>) + Send + 'static,
{
    let inner = layer.inner().clone();
    let this = layer.clone();
    layer.enter(move |context: L::Context| {
        inner.async_(move |completion: Completion<L::Packed<A>>| {
            registration(packing(&this, context, completion))
        })
    })
}

/// 包装层的 `async_suspended`：注册计算在调用时刻的上下文下被降回内层运行。
pub fn async_suspended<L, A, K>(layer: &L, registration: K) -> L::Of<A>
where
    L: Layer,
    A: Send + 'static,
    K: FnOnce(Completion<A>) -> L::Of<()> + Send + 'static,
{
    let inner = layer.inner().clone();
    let this = layer.clone();
    layer.enter(move |context: L::Context| {
        let lowering = context.clone();
        inner.async_suspended(move |completion: Completion<L::Packed<A>>| {
            let unit = registration(packing(&this, context, completion));
            this.lower_unit(unit, lowering)
        })
    })
}

/// 包装层的 `lift_io`：先由内层吸收，再打包。
pub fn lift_io<L, A>(layer: &L, io: Io<A>) -> L::Of<A>
where
    L: Layer,
    A: Send + 'static,
{
    let inner = layer.inner().clone();
    let this = layer.clone();
    layer.enter(move |context: L::Context| {
        inner.map(inner.lift_io(io), move |value: A| this.pack(&context, value))
    })
}

/// 同步运行参考引擎计算，只适用于不跨线程完成的测试计算。
#[cfg(test)]
pub(crate) fn run_now<A: Send + 'static>(io: Io<A>) -> Option<crate::error::Outcome<A>> {
    use alloc::sync::Arc;
    use spin::Mutex;

    let slot = Arc::new(Mutex::new(None));
    {
        let slot = Arc::clone(&slot);
        io.run_async(move |outcome| {
            slot.lock().get_or_insert(outcome);
        });
    }
    slot.lock().take()
}
