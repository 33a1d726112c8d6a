#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![allow(private_bounds)]
#![doc = "spark-effect: 异步完成契约（Async Capability）、参考引擎桥接与包装层能力推导。"]
#![doc = ""]
#![doc = "== 组成 =="]
#![doc = "1. [`completion`]：完成通道 `Completion<A>`，接收 `Outcome<A>` 且不返回值。"]
#![doc = "2. [`capability`]：同步挂起能力 [`SyncEffect`] 与异步能力 [`Async`]。"]
#![doc = "3. [`shift`]：仅凭 `Async::async_` 实现的执行器切换。"]
#![doc = "4. [`bridge`]：把参考引擎 [`Io`] 的计算转换为任意 `Async` 类型的计算。"]
#![doc = "5. [`layer`]：Result/Option/State/Log/Environment 五类包装层的能力推导。"]
#![doc = ""]
#![doc = "== 内存分配依赖 =="]
#![doc = "定位于 `no_std + alloc`：节点图与回调依赖 `Box`/`Arc`；阻塞运行与 `Future` 适配仅在 `std` 下提供。"]

extern crate alloc;

mod sealed;

pub mod bridge;
pub mod capability;
pub mod completion;
pub mod config;
pub mod error;
pub mod io;
pub mod layer;
pub mod shift;
/// 测试桩命名空间，集中暴露官方维护的执行器与计数能力实现，供集成测试与下游 TCK 复用。
///
/// # 设计背景（Why）
/// - 统一维护常见桩对象，避免在各处重复定义记录型执行器；
/// - 契约演进时通过单点更新保证所有测试同步适配。
pub mod test_stubs;

pub use bridge::lift_io;
pub use capability::{Async, SyncEffect};
pub use completion::Completion;
pub use config::{RunSettings, RunSettingsError};
pub use error::{CoreError, ErrorCause, Outcome, Result};
pub use io::{AsyncNode, Io, IoEffect, Shape, Step};
#[cfg(feature = "std")]
pub use io::IoFuture;
pub use layer::{
    Contextual, EitherLayer, Layer, Monoid, OptionLayer, ReaderLayer, StateLayer, Stateful,
    WriterLayer,
};
pub use shift::{Executor, InlineExecutor, Runnable, shift};

use core::fmt;

/// `spark-effect` 中所有错误必须实现的 `no_std` 基础 Trait。
///
/// # 设计背景（Why）
/// - `std::error::Error` 在 `no_std` 环境中不可用，需要一个对象安全、与平台无关的错误抽象来串联底层错误链。
///
/// # 契约说明（What）
/// - 实现者提供 `Debug` 与 `Display`；`source` 返回链路上的上游错误，语义与 `std::error::Error::source` 一致。
pub trait Error: fmt::Debug + fmt::Display + crate::sealed::Sealed {
    /// 返回当前错误的上游来源。
    fn source(&self) -> Option<&(dyn Error + 'static)>;
}
