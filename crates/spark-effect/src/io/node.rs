//! 参考引擎的类型擦除节点图。
//!
//! `Io<A>` 只在边界上携带类型；内部以 `Box<dyn Any + Send>` 传值，使运行循环可以用一条显式帧栈
//! 处理任意长度的 `flat_map` 链而不依赖递归。
use crate::{
    completion::Completion,
    error::{CoreError, Outcome, codes},
};
use alloc::boxed::Box;
use core::any::Any;

/// 擦除后的值。
pub(crate) type Value = Box<dyn Any + Send>;

/// 异步节点的回调安装器：拿到完成通道后发起真正的异步注册。
pub(crate) type Installer = Box<dyn FnOnce(Completion<Value>) + Send>;

pub(crate) enum Node {
    Pure(Value),
    RaiseError(CoreError),
    Delay(Box<dyn FnOnce() -> Value + Send>),
    Suspend(Box<dyn FnOnce() -> Node + Send>),
    Bind(Box<Node>, Frame),
    Async(Installer),
}

/// 挂在帧栈上的续体。
pub(crate) enum Frame {
    /// 成功续体；失败经过时被跳过。
    OnSuccess(Box<dyn FnOnce(Value) -> Node + Send>),
    /// 失败处理器；成功经过时被跳过。
    OnFailure(Box<dyn FnOnce(CoreError) -> Node + Send>),
}

impl Node {
    pub(crate) fn from_outcome(outcome: Outcome<Value>) -> Self {
        match outcome {
            Ok(value) => Node::Pure(value),
            Err(error) => Node::RaiseError(error),
        }
    }
}

pub(crate) fn erase<A: Send + 'static>(value: A) -> Value {
    Box::new(value)
}

/// 恢复擦除前的类型；失败意味着节点图被错误拼接。
pub(crate) fn unerase<A: 'static>(value: Value) -> Outcome<A> {
    value.downcast::<A>().map(|boxed| *boxed).map_err(|_| {
        CoreError::new(
            codes::TYPE_MISMATCH,
            "erased value does not match the computation's result type",
        )
    })
}

/// 把擦除值的通道转换为带类型的通道，供外部安装器使用。
pub(crate) fn typed_completion<A: Send + 'static>(out: Completion<Value>) -> Completion<A> {
    out.contramap(|outcome: Outcome<A>| outcome.map(erase))
}

/// 把带类型的通道转换为接收擦除值的通道。
pub(crate) fn erased_completion<A: Send + 'static>(out: Completion<A>) -> Completion<Value> {
    out.contramap(|outcome: Outcome<Value>| outcome.and_then(unerase::<A>))
}
