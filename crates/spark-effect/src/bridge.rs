//! # 参考引擎桥接
//!
//! ## 契约声明
//! * 把 [`Io`] 构建的计算转换为任意 [`Async`] 类型 `F` 的计算，语义上等价于在 `F` 中运行原计算。
//! * 转换本身不运行任何东西；推进被挂起到 `F` 的运行时刻。
//!
//! ## 逻辑解析（How）
//! 1. 静态为纯值 `Pure(v)`：直接返回 `F.pure(v)`，不推进、不挂起；
//! 2. 静态为失败 `RaiseError(e)`：直接返回 `F.raise_error(e)`；
//! 3. 其余情况：`F.suspend` 中把原计算推进一步，按结果返回 `pure`、`raise_error`，
//!    或把异步节点的安装器交给 `F.async_`，由 `F` 承担这一段的执行。
//!
//! 推进由参考引擎的迭代运行循环完成，任意深度的 `flat_map` 链都不会递归；
//! 异步节点之后的续体已折叠进安装器，`F` 只需要调用一次 `async_`。
use crate::{
    capability::Async,
    completion::Completion,
    io::{Io, Shape, Step},
};

/// 把参考引擎计算转换为 `F` 的计算。
///
/// # 契约说明（What）
/// - 对 `Io::pure(v)`/`Io::raise_error(e)` 只调用 `effect.pure`/`effect.raise_error`，保证零推进开销；
/// - 其余情况调用一次 `effect.suspend`，其运行时再调用 `effect.pure`、`effect.raise_error` 或 `effect.async_` 之一；
/// - 失败只会出现在返回计算的失败通道中，本函数从不同步失败。
///
/// # 示例（Examples）
/// ```rust
/// use spark_effect::{Io, IoEffect, lift_io};
///
/// let lifted = lift_io(&IoEffect, Io::delay(|| "x"));
/// # #[cfg(feature = "std")]
/// assert_eq!(lifted.run_blocking(&Default::default()), Ok("x"));
/// ```
pub fn lift_io<F, A>(effect: &F, io: Io<A>) -> F::Of<A>
where
    F: Async,
    A: Send + 'static,
{
    match io.shape() {
        Shape::Pure(value) => {
            tracing::trace!(path = "pure", "io bridge short-circuit");
            effect.pure(value)
        }
        Shape::RaiseError(error) => {
            tracing::trace!(path = "raise_error", code = error.code(), "io bridge short-circuit");
            effect.raise_error(error)
        }
        Shape::Deferred(io) => {
            let this = effect.clone();
            effect.suspend(move || match io.step() {
                Step::Pure(value) => {
                    tracing::trace!(path = "stepped_pure", "io bridge stepped");
                    this.pure(value)
                }
                Step::RaiseError(error) => {
                    tracing::trace!(path = "stepped_error", code = error.code(), "io bridge stepped");
                    this.raise_error(error)
                }
                Step::Async(node) => {
                    tracing::trace!(path = "async", "io bridge forwarding async node");
                    this.async_(move |completion: Completion<A>| node.install(completion))
                }
            })
        }
    }
}
