use super::Io;
use crate::{
    capability::{Async, SyncEffect},
    completion::Completion,
    error::CoreError,
};

/// 参考引擎自身的能力对象。
///
/// 所有操作直接委托给 [`Io`] 的同名构造器；`lift_io` 为恒等变换，不经过桥接。
#[derive(Clone, Copy, Debug, Default)]
pub struct IoEffect;

impl SyncEffect for IoEffect {
    type Of<A: Send + 'static> = Io<A>;

    fn pure<A: Send + 'static>(&self, value: A) -> Io<A> {
        Io::pure(value)
    }

    fn raise_error<A: Send + 'static>(&self, error: CoreError) -> Io<A> {
        Io::raise_error(error)
    }

    fn delay<A, T>(&self, thunk: T) -> Io<A>
    where
        A: Send + 'static,
        T: FnOnce() -> A + Send + 'static,
    {
        Io::delay(thunk)
    }

    fn suspend<A, T>(&self, thunk: T) -> Io<A>
    where
        A: Send + 'static,
        T: FnOnce() -> Io<A> + Send + 'static,
    {
        Io::suspend(thunk)
    }

    fn flat_map<A, B, K>(&self, fa: Io<A>, f: K) -> Io<B>
    where
        A: Send + 'static,
        B: Send + 'static,
        K: FnOnce(A) -> Io<B> + Send + 'static,
    {
        fa.flat_map(f)
    }

    fn handle_error_with<A, K>(&self, fa: Io<A>, f: K) -> Io<A>
    where
        A: Send + 'static,
        K: FnOnce(CoreError) -> Io<A> + Send + 'static,
    {
        fa.handle_error_with(f)
    }

    fn map<A, B, K>(&self, fa: Io<A>, f: K) -> Io<B>
    where
        A: Send + 'static,
        B: Send + 'static,
        K: FnOnce(A) -> B + Send + 'static,
    {
        fa.map(f)
    }
}

impl Async for IoEffect {
    fn async_<A, K>(&self, registration: K) -> Io<A>
    where
        A: Send + 'static,
        K: FnOnce(Completion<A>) + Send + 'static,
    {
        Io::async_(registration)
    }

    fn async_suspended<A, K>(&self, registration: K) -> Io<A>
    where
        A: Send + 'static,
        K: FnOnce(Completion<A>) -> Io<()> + Send + 'static,
    {
        Io::async_suspended(registration)
    }

    fn never<A: Send + 'static>(&self) -> Io<A> {
        Io::never()
    }

    fn lift_io<A: Send + 'static>(&self, io: Io<A>) -> Io<A> {
        io
    }
}
