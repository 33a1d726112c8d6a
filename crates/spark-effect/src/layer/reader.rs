//! 环境包装层：`R -> F::Of<A>`。
use super::{InnerOf, Layer};
use crate::{
    capability::{Async, SyncEffect},
    completion::Completion,
    error::CoreError,
    io::Io,
};
use alloc::boxed::Box;
use core::{fmt, marker::PhantomData};

/// 环境包装层的计算：给定环境值，得到内层计算。
pub struct Contextual<F: SyncEffect, R, A: Send + 'static> {
    step: Box<dyn FnOnce(R) -> F::Of<A> + Send>,
}

impl<F, R, A> Contextual<F, R, A>
where
    F: SyncEffect,
    R: Send + 'static,
    A: Send + 'static,
{
    /// 以环境读取函数构造。
    pub fn new<T>(step: T) -> Self
    where
        T: FnOnce(R) -> F::Of<A> + Send + 'static,
    {
        Self {
            step: Box::new(step),
        }
    }

    /// 以环境值运行，得到内层计算。
    pub fn run(self, environment: R) -> F::Of<A> {
        (self.step)(environment)
    }
}

impl<F: SyncEffect, R, A: Send + 'static> fmt::Debug for Contextual<F, R, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contextual").finish_non_exhaustive()
    }
}

/// 在内层计算上传递只读环境 `R` 的能力对象。环境值在整个计算中原样传递。
pub struct ReaderLayer<F, R> {
    inner: F,
    _environment: PhantomData<fn() -> R>,
}

impl<F, R> ReaderLayer<F, R> {
    /// 以内层能力构造。
    pub const fn new(inner: F) -> Self {
        Self {
            inner,
            _environment: PhantomData,
        }
    }
}

impl<F: Clone, R> Clone for ReaderLayer<F, R> {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

impl<F: fmt::Debug, R> fmt::Debug for ReaderLayer<F, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderLayer").field("inner", &self.inner).finish()
    }
}

impl<F, R> ReaderLayer<F, R>
where
    F: SyncEffect,
    R: Clone + Send + 'static,
{
    /// 读取环境值。
    pub fn ask(&self) -> Contextual<F, R, R> {
        let inner = self.inner.clone();
        Contextual::new(move |environment: R| inner.pure(environment))
    }

    /// 读取环境值的投影。
    pub fn asks<A, T>(&self, project: T) -> Contextual<F, R, A>
    where
        A: Send + 'static,
        T: FnOnce(&R) -> A + Send + 'static,
    {
        let inner = self.inner.clone();
        Contextual::new(move |environment: R| inner.pure(project(&environment)))
    }

    /// 以局部修改后的环境运行 `fa`。
    pub fn local<A, T>(&self, fa: Contextual<F, R, A>, adjust: T) -> Contextual<F, R, A>
    where
        A: Send + 'static,
        T: FnOnce(R) -> R + Send + 'static,
    {
        Contextual::new(move |environment: R| fa.run(adjust(environment)))
    }
}

impl<F, R> SyncEffect for ReaderLayer<F, R>
where
    F: SyncEffect,
    R: Clone + Send + 'static,
{
    type Of<A: Send + 'static> = Contextual<F, R, A>;

    fn pure<A: Send + 'static>(&self, value: A) -> Self::Of<A> {
        let inner = self.inner.clone();
        Contextual::new(move |_environment: R| inner.pure(value))
    }

    fn raise_error<A: Send + 'static>(&self, error: CoreError) -> Self::Of<A> {
        let inner = self.inner.clone();
        Contextual::new(move |_environment: R| inner.raise_error(error))
    }

    fn delay<A, T>(&self, thunk: T) -> Self::Of<A>
    where
        A: Send + 'static,
        T: FnOnce() -> A + Send + 'static,
    {
        let inner = self.inner.clone();
        Contextual::new(move |_environment: R| inner.delay(thunk))
    }

    fn suspend<A, T>(&self, thunk: T) -> Self::Of<A>
    where
        A: Send + 'static,
        T: FnOnce() -> Self::Of<A> + Send + 'static,
    {
        let inner = self.inner.clone();
        Contextual::new(move |environment: R| inner.suspend(move || thunk().run(environment)))
    }

    fn flat_map<A, B, K>(&self, fa: Self::Of<A>, f: K) -> Self::Of<B>
    where
        A: Send + 'static,
        B: Send + 'static,
        K: FnOnce(A) -> Self::Of<B> + Send + 'static,
    {
        let inner = self.inner.clone();
        Contextual::new(move |environment: R| {
            let rest = environment.clone();
            let entered = inner.suspend::<A, _>(move || fa.run(environment));
            inner.flat_map(entered, move |value: A| f(value).run(rest))
        })
    }

    fn handle_error_with<A, K>(&self, fa: Self::Of<A>, f: K) -> Self::Of<A>
    where
        A: Send + 'static,
        K: FnOnce(CoreError) -> Self::Of<A> + Send + 'static,
    {
        let inner = self.inner.clone();
        Contextual::new(move |environment: R| {
            let rest = environment.clone();
            let entered = inner.suspend::<A, _>(move || fa.run(environment));
            inner.handle_error_with::<A, _>(entered, move |error| f(error).run(rest))
        })
    }
}

impl<F, R> Layer for ReaderLayer<F, R>
where
    F: Async,
    R: Clone + Send + 'static,
{
    type Inner = F;
    type Context = R;
    type Packed<A: Send + 'static> = A;

    fn inner(&self) -> &F {
        &self.inner
    }

    fn pack<A: Send + 'static>(&self, _environment: &R, value: A) -> A {
        value
    }

    fn enter<A, B>(&self, build: B) -> Self::Of<A>
    where
        A: Send + 'static,
        B: FnOnce(Self::Context) -> InnerOf<Self, Self::Packed<A>> + Send + 'static,
    {
        Contextual::new(build)
    }

    fn lower_unit(&self, fa: Self::Of<()>, context: R) -> F::Of<()> {
        fa.run(context)
    }
}

impl<F, R> Async for ReaderLayer<F, R>
where
    F: Async,
    R: Clone + Send + 'static,
{
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
