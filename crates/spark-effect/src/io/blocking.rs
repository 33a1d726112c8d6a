//! `std` 下的运行入口：阻塞等待与 `Future` 适配。
use super::Io;
use crate::{
    config::RunSettings,
    error::{CoreError, Outcome, codes},
};
use alloc::sync::Arc;
use core::{
    future::Future,
    mem,
    pin::Pin,
    task::{Context, Poll},
};
use futures::channel::oneshot;
use parking_lot::{Condvar, Mutex};
use std::time::Instant;

impl<A: Send + 'static> Io<A> {
    /// 在当前线程上运行计算并阻塞等待结果。
    ///
    /// # 契约说明（What）
    /// - 同步前缀在当前线程执行；异步边界之后，当前线程在条件变量上等待首个结果；
    /// - `settings.blocking_timeout()` 为 `Some` 时，超时返回 `effect.blocking_timeout` 错误，
    ///   计算本身不会被取消，迟到的结果被丢弃；
    /// - 为 `None` 时无限等待，对 `never` 调用将永久阻塞。
    pub fn run_blocking(self, settings: &RunSettings) -> Outcome<A> {
        let slot = Arc::new((Mutex::new(None::<Outcome<A>>), Condvar::new()));
        if settings.trace_run_loop() {
            tracing::trace!("io blocking run started");
        }
        {
            let slot = Arc::clone(&slot);
            self.run_async(move |outcome: Outcome<A>| {
                let (lock, condvar) = &*slot;
                let mut guard = lock.lock();
                if guard.is_none() {
                    *guard = Some(outcome);
                    condvar.notify_all();
                }
            });
        }

        let (lock, condvar) = &*slot;
        let mut guard = lock.lock();
        match settings.blocking_timeout() {
            None => {
                while guard.is_none() {
                    condvar.wait(&mut guard);
                }
            }
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                while guard.is_none() {
                    if condvar.wait_until(&mut guard, deadline).timed_out() {
                        break;
                    }
                }
            }
        }

        let outcome = guard.take().unwrap_or_else(|| {
            tracing::debug!(
                timeout_ms = settings
                    .blocking_timeout()
                    .map(|timeout| timeout.as_millis() as u64),
                "io blocking run timed out"
            );
            Err(CoreError::new(
                codes::BLOCKING_TIMEOUT,
                "computation did not complete within the blocking timeout",
            ))
        });
        if settings.trace_run_loop() {
            tracing::trace!(success = outcome.is_ok(), "io blocking run finished");
        }
        outcome
    }

    /// 把计算适配为 [`Future`]。
    ///
    /// 计算在首次 `poll` 时才开始运行；若计算再也无法完成（通道被丢弃且从未调用），
    /// 返回的 Future 永久保持 `Pending`。
    pub fn into_future(self) -> IoFuture<A> {
        IoFuture {
            state: FutureState::Idle(self),
        }
    }
}

/// [`Io::into_future`] 返回的 Future。
pub struct IoFuture<A> {
    state: FutureState<A>,
}

enum FutureState<A> {
    Idle(Io<A>),
    Running(oneshot::Receiver<Outcome<A>>),
    Stalled,
    Done,
}

impl<A: Send + 'static> Future for IoFuture<A> {
    type Output = Outcome<A>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let FutureState::Idle(_) = this.state {
            if let FutureState::Idle(io) = mem::replace(&mut this.state, FutureState::Done) {
                let (sender, receiver) = oneshot::channel();
                let sender = Mutex::new(Some(sender));
                this.state = FutureState::Running(receiver);
                io.run_async(move |outcome: Outcome<A>| {
                    if let Some(sender) = sender.lock().take() {
                        let _ = sender.send(outcome);
                    }
                });
            }
        }

        let FutureState::Running(receiver) = &mut this.state else {
            return Poll::Pending;
        };
        match Pin::new(receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => {
                this.state = FutureState::Done;
                Poll::Ready(outcome)
            }
            Poll::Ready(Err(oneshot::Canceled)) => {
                this.state = FutureState::Stalled;
                Poll::Pending
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<A> core::fmt::Debug for IoFuture<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = match self.state {
            FutureState::Idle(_) => "Idle",
            FutureState::Running(_) => "Running",
            FutureState::Stalled => "Stalled",
            FutureState::Done => "Done",
        };
        f.debug_struct("IoFuture").field("state", &state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::Completion;
    use std::{thread, time::Duration};

    #[test]
    fn waits_for_callback_from_another_thread() {
        let io = Io::async_(|cb: Completion<&'static str>| {
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(10));
                cb.succeed("x");
            });
        })
        .map(str::len);
        assert_eq!(io.run_blocking(&RunSettings::default()), Ok(1));
    }

    #[test]
    fn bounded_wait_reports_timeout() {
        let settings = RunSettings::default().with_blocking_timeout(Duration::from_millis(20));
        let error = Io::<u8>::never().run_blocking(&settings).unwrap_err();
        assert_eq!(error.code(), codes::BLOCKING_TIMEOUT);
    }

    #[test]
    fn future_resolves_with_outcome() {
        let io = Io::pure(2).flat_map(|n| Io::async_(move |cb: Completion<i32>| cb.succeed(n * 3)));
        assert_eq!(futures::executor::block_on(io.into_future()), Ok(6));
    }
}
