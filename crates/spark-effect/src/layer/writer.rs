//! 日志包装层：`F::Of<(L, A)>`，`L` 为幺半群。
use super::{InnerOf, Layer};
use crate::{
    capability::{Async, SyncEffect},
    completion::Completion,
    error::CoreError,
    io::Io,
};
use alloc::{string::String, vec::Vec};
use core::{fmt, marker::PhantomData};

/// 日志累积所需的幺半群：单位元与结合的合并操作。
///
/// # 契约说明（What）
/// - `empty().combine(x) == x` 且 `x.combine(empty()) == x`；
/// - `combine` 满足结合律，`flat_map` 链依此按执行顺序拼接日志。
pub trait Monoid: Clone + Send + 'static {
    /// 单位元。
    fn empty() -> Self;

    /// 合并，`self` 在前。
    fn combine(self, other: Self) -> Self;
}

impl<T: Clone + Send + 'static> Monoid for Vec<T> {
    fn empty() -> Self {
        Vec::new()
    }

    fn combine(mut self, mut other: Self) -> Self {
        self.append(&mut other);
        self
    }
}

impl Monoid for String {
    fn empty() -> Self {
        String::new()
    }

    fn combine(mut self, other: Self) -> Self {
        self.push_str(&other);
        self
    }
}

impl Monoid for () {
    fn empty() -> Self {}

    fn combine(self, _other: Self) -> Self {}
}

/// 在内层计算上累积日志 `L` 的能力对象。
///
/// 提升后的 `async_` 以 `L::empty()` 作为日志：异步步骤本身不写日志。
pub struct WriterLayer<F, L> {
    inner: F,
    _log: PhantomData<fn() -> L>,
}

impl<F, L> WriterLayer<F, L> {
    /// 以内层能力构造。
    pub const fn new(inner: F) -> Self {
        Self {
            inner,
            _log: PhantomData,
        }
    }
}

impl<F: Clone, L> Clone for WriterLayer<F, L> {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

impl<F: fmt::Debug, L> fmt::Debug for WriterLayer<F, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterLayer").field("inner", &self.inner).finish()
    }
}

impl<F: SyncEffect, L: Monoid> WriterLayer<F, L> {
    /// 写入一段日志。
    pub fn tell(&self, log: L) -> F::Of<(L, ())> {
        self.inner.pure((log, ()))
    }

    /// 在结果中同时暴露 `fa` 写下的日志。
    pub fn listen<A: Send + 'static>(&self, fa: F::Of<(L, A)>) -> F::Of<(L, (L, A))> {
        self.inner
            .map(fa, |(log, value): (L, A)| (log.clone(), (log, value)))
    }
}

impl<F: SyncEffect, L: Monoid> SyncEffect for WriterLayer<F, L> {
    type Of<A: Send + 'static> = F::Of<(L, A)>;

    fn pure<A: Send + 'static>(&self, value: A) -> Self::Of<A> {
        self.inner.pure((L::empty(), value))
    }

    fn raise_error<A: Send + 'static>(&self, error: CoreError) -> Self::Of<A> {
        self.inner.raise_error(error)
    }

    fn delay<A, T>(&self, thunk: T) -> Self::Of<A>
    where
        A: Send + 'static,
        T: FnOnce() -> A + Send + 'static,
    {
        self.inner.delay(move || (L::empty(), thunk()))
    }

    fn suspend<A, T>(&self, thunk: T) -> Self::Of<A>
    where
        A: Send + 'static,
        T: FnOnce() -> Self::Of<A> + Send + 'static,
    {
        self.inner.suspend(thunk)
    }

    fn flat_map<A, B, K>(&self, fa: Self::Of<A>, f: K) -> Self::Of<B>
    where
        A: Send + 'static,
        B: Send + 'static,
        K: FnOnce(A) -> Self::Of<B> + Send + 'static,
    {
        let inner = self.inner.clone();
        self.inner.flat_map(fa, move |(before, value): (L, A)| {
            inner.map(f(value), move |(after, next): (L, B)| (before.combine(after), next))
        })
    }

    fn handle_error_with<A, K>(&self, fa: Self::Of<A>, f: K) -> Self::Of<A>
    where
        A: Send + 'static,
        K: FnOnce(CoreError) -> Self::Of<A> + Send + 'static,
    {
        self.inner.handle_error_with(fa, f)
    }
}

impl<F: Async, L: Monoid> Layer for WriterLayer<F, L> {
    type Inner = F;
    type Context = ();
    type Packed<A: Send + 'static> = (L, A);

    fn inner(&self) -> &F {
        &self.inner
    }

    fn pack<A: Send + 'static>(&self, _context: &(), value: A) -> (L, A) {
        (L::empty(), value)
    }

    fn enter<A, B>(&self, build: B) -> Self::Of<A>
    where
        A: Send + 'static,
        B: FnOnce(Self::Context) -> InnerOf<Self, Self::Packed<A>> + Send + 'static,
    {
        build(())
    }

    fn lower_unit(&self, fa: Self::Of<()>, _context: ()) -> F::Of<()> {
        self.inner.map(fa, |(_log, ()): (L, ())| ())
    }
}

impl<F: Async, L: Monoid> Async for WriterLayer<F, L> {
    fn async_<A, K>(&self, registration: K) -> Self::Of<A>
    where
        A: Send + 'static,
        K: FnOnce(Completion<A>) + Send + 'static,
    {
        super::async_(self, registration)
    }

    fn async_suspended<A, K>(&self, registration: K) -> Self::Of<A>
    where
        A: Send + 'static,
        K: FnOnce(Completion<A>) -> Self::Of<()> + Send + 'static,
    {
        super::async_suspended(self, registration)
    }

    fn lift_io<A: Send + 'static>(&self, io: Io<A>) -> Self::Of<A> {
        super::lift_io(self, io)
    }
}
