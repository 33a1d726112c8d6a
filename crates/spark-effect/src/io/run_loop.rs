//! 参考引擎的运行循环与单步推进。
//!
//! # 教案级导览
//!
//! - **Why**：桥接算法只需要一个操作，即“把计算推进一步”：同步吞掉 `Delay`/`Suspend`/`Bind` 前缀，停在纯值、
//!   失败或真正的异步边界上。运行循环复用同一个推进过程，再额外负责异步边界之后的恢复。
//! - **How**：[`advance`] 以显式帧栈迭代；遇到异步节点时返回安装器与剩余帧栈。[`run`] 安装回调：
//!   若回调在安装期间同步到达，就在同一轮循环中继续，避免“回调 → 运行循环 → 回调”的递归；
//!   若回调稍后到达，就在回调所在线程上恢复循环。
//! - **What**：每个异步边界只恢复一次；之后的重复回调被忽略并记录 `trace` 日志。
use super::node::{Frame, Installer, Node, Value};
use crate::{completion::Completion, error::CoreError};
use alloc::{boxed::Box, sync::Arc, vec::Vec};
use core::mem;
use spin::Mutex;

/// 单步推进的三种终点。
pub(crate) enum Stepped {
    Pure(Value),
    RaiseError(CoreError),
    Async(Installer),
}

/// 推进到终点，保留异步边界之后仍待执行的帧栈。
enum Advanced {
    Pure(Value),
    RaiseError(CoreError),
    Async(Installer, Vec<Frame>),
}

fn advance(mut node: Node, mut stack: Vec<Frame>) -> Advanced {
    loop {
        node = match node {
            Node::Pure(value) => match pop_on_success(&mut stack) {
                Some(next) => next(value),
                None => return Advanced::Pure(value),
            },
            Node::RaiseError(error) => match pop_on_failure(&mut stack) {
                Some(handler) => handler(error),
                None => return Advanced::RaiseError(error),
            },
            Node::Delay(thunk) => Node::Pure(thunk()),
            Node::Suspend(thunk) => thunk(),
            Node::Bind(source, frame) => {
                stack.push(frame);
                *source
            }
            Node::Async(installer) => return Advanced::Async(installer, stack),
        }
    }
}

fn pop_on_success(stack: &mut Vec<Frame>) -> Option<Box<dyn FnOnce(Value) -> Node + Send>> {
    while let Some(frame) = stack.pop() {
        if let Frame::OnSuccess(next) = frame {
            return Some(next);
        }
    }
    None
}

fn pop_on_failure(
    stack: &mut Vec<Frame>,
) -> Option<Box<dyn FnOnce(CoreError) -> Node + Send>> {
    while let Some(frame) = stack.pop() {
        if let Frame::OnFailure(handler) = frame {
            return Some(handler);
        }
    }
    None
}

/// 单步推进：同步前缀在调用线程上执行完毕，异步边界之后的帧被折叠进返回的安装器。
pub(crate) fn step(node: Node) -> Stepped {
    match advance(node, Vec::new()) {
        Advanced::Pure(value) => Stepped::Pure(value),
        Advanced::RaiseError(error) => Stepped::RaiseError(error),
        Advanced::Async(installer, stack) if stack.is_empty() => Stepped::Async(installer),
        Advanced::Async(installer, stack) => Stepped::Async(Box::new(move |out| {
            run(Node::Async(installer), stack, out)
        })),
    }
}

/// 异步边界的交接槽。
enum Handoff {
    /// 安装器仍在执行，回调尚未到达。
    Registering,
    /// 回调在安装期间同步到达。
    Ready(Result<Value, CoreError>),
    /// 安装器已返回，运行循环把剩余工作交给回调。
    Detached(Vec<Frame>, Completion<Value>),
    /// 已恢复；之后的回调被忽略。
    Resumed,
}

/// 运行计算直到终点，并把结果投递给 `out`。
pub(crate) fn run(mut node: Node, mut stack: Vec<Frame>, out: Completion<Value>) {
    loop {
        let (installer, rest) = match advance(node, stack) {
            Advanced::Pure(value) => return out.succeed(value),
            Advanced::RaiseError(error) => return out.fail(error),
            Advanced::Async(installer, rest) => (installer, rest),
        };

        let handoff = Arc::new(Mutex::new(Handoff::Registering));
        let callback = {
            let handoff = Arc::clone(&handoff);
            Completion::new(move |outcome| deliver(&handoff, outcome))
        };
        installer(callback);

        let mut slot = handoff.lock();
        match mem::replace(&mut *slot, Handoff::Resumed) {
            Handoff::Ready(outcome) => {
                drop(slot);
                node = Node::from_outcome(outcome);
                stack = rest;
            }
            Handoff::Registering => {
                tracing::trace!(
                    pending_frames = rest.len(),
                    "io run loop detached at async boundary"
                );
                *slot = Handoff::Detached(rest, out);
                return;
            }
            Handoff::Detached(..) | Handoff::Resumed => return,
        }
    }
}

fn deliver(handoff: &Mutex<Handoff>, outcome: Result<Value, CoreError>) {
    let mut slot = handoff.lock();
    match mem::replace(&mut *slot, Handoff::Resumed) {
        Handoff::Registering => *slot = Handoff::Ready(outcome),
        Handoff::Detached(stack, out) => {
            drop(slot);
            run(Node::from_outcome(outcome), stack, out);
        }
        previous @ Handoff::Ready(_) => {
            *slot = previous;
            tracing::trace!("duplicate completion ignored by io run loop");
        }
        Handoff::Resumed => tracing::trace!("duplicate completion ignored by io run loop"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::node::{erase, unerase};
    use alloc::vec;
    use core::sync::atomic::{AtomicUsize, Ordering};

    fn collect(node: Node) -> Arc<Mutex<Vec<Result<i32, CoreError>>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = Arc::clone(&seen);
            Completion::new(move |outcome: Result<Value, CoreError>| {
                seen.lock().push(outcome.and_then(unerase::<i32>))
            })
        };
        run(node, Vec::new(), sink);
        seen
    }

    #[test]
    fn deep_left_nested_binds_do_not_recurse() {
        let mut node = Node::Pure(erase(0_i32));
        for _ in 0..100_000 {
            node = Node::Bind(
                Box::new(node),
                Frame::OnSuccess(Box::new(|value: Value| {
                    let current = unerase::<i32>(value).unwrap_or_default();
                    Node::Pure(erase(current + 1))
                })),
            );
        }
        let seen = collect(node);
        assert_eq!(*seen.lock(), vec![Ok(100_000)]);
    }

    #[test]
    fn synchronous_callbacks_continue_in_the_same_loop() {
        let mut node = Node::Pure(erase(0_i32));
        for _ in 0..50_000 {
            node = Node::Bind(
                Box::new(node),
                Frame::OnSuccess(Box::new(|value: Value| {
                    Node::Async(Box::new(move |cb: Completion<Value>| {
                        let current = unerase::<i32>(value).unwrap_or_default();
                        cb.succeed(erase(current + 1));
                    }))
                })),
            );
        }
        let seen = collect(node);
        assert_eq!(*seen.lock(), vec![Ok(50_000)]);
    }

    #[test]
    fn only_first_callback_resumes() {
        let resumed = Arc::new(AtomicUsize::new(0));
        let node = Node::Bind(
            Box::new(Node::Async(Box::new(|cb: Completion<Value>| {
                cb.succeed(erase(1_i32));
                cb.succeed(erase(2_i32));
            }))),
            Frame::OnSuccess({
                let resumed = Arc::clone(&resumed);
                Box::new(move |value: Value| {
                    resumed.fetch_add(1, Ordering::SeqCst);
                    Node::Pure(value)
                })
            }),
        );
        let seen = collect(node);
        assert_eq!(resumed.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock(), vec![Ok(1)]);
    }

    #[test]
    fn failure_skips_success_frames_until_handler() {
        let node = Node::Bind(
            Box::new(Node::Bind(
                Box::new(Node::RaiseError(CoreError::raised("boom"))),
                Frame::OnSuccess(Box::new(|_: Value| Node::Pure(erase(99_i32)))),
            )),
            Frame::OnFailure(Box::new(|error: CoreError| {
                assert_eq!(error.message(), "boom");
                Node::Pure(erase(7_i32))
            })),
        );
        let seen = collect(node);
        assert_eq!(*seen.lock(), vec![Ok(7)]);
    }
}
