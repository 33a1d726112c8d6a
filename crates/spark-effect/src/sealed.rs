//! 内部 sealed 模块用于控制外部扩展边界。
//!
//! # 设计背景（Why）
//! - `spark-effect` 暴露的错误 Trait 需要在 SemVer 框架下保留演进空间；
//! - 通过统一的 `Sealed` 标记，可以在不破坏公开 API 的情况下为 Trait 增加默认方法。
//!
//! # 契约说明（What）
//! - `Sealed` 无需调用方显式实现；任意类型默认满足该约束。
pub(crate) trait Sealed {}

impl<T: ?Sized> Sealed for T {}
