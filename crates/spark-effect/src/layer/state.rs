//! 状态包装层：`S -> F::Of<(S, A)>`。
use super::{InnerOf, Layer};
use crate::{
    capability::{Async, SyncEffect},
    completion::Completion,
    error::CoreError,
    io::Io,
};
use alloc::boxed::Box;
use core::{fmt, marker::PhantomData};

/// 状态包装层的计算：给定初始状态，得到产出“最终状态与结果”的内层计算。
pub struct Stateful<F: SyncEffect, S: Send + 'static, A: Send + 'static> {
    step: Box<dyn FnOnce(S) -> F::Of<(S, A)> + Send>,
}

impl<F, S, A> Stateful<F, S, A>
where
    F: SyncEffect,
    S: Send + 'static,
    A: Send + 'static,
{
    /// 以状态转换函数构造。
    pub fn new<T>(step: T) -> Self
    where
        T: FnOnce(S) -> F::Of<(S, A)> + Send + 'static,
    {
        Self {
            step: Box::new(step),
        }
    }

    /// 以初始状态运行，得到内层计算。
    pub fn run(self, initial: S) -> F::Of<(S, A)> {
        (self.step)(initial)
    }
}

impl<F, S, A> fmt::Debug for Stateful<F, S, A>
where
    F: SyncEffect,
    S: Send + 'static,
    A: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stateful").finish_non_exhaustive()
    }
}

/// 在内层计算上穿过状态 `S` 的能力对象。
///
/// # 契约说明（What）
/// - 提升后的 `async_` 与 `async_suspended` 在注册期间固定调用时刻的状态 `s`，结果为 `(s, a)`；
/// - 失败处理从进入 `handle_error_with` 时的状态重新开始，失败分支中对状态的修改不可见。
pub struct StateLayer<F, S> {
    inner: F,
    _state: PhantomData<fn() -> S>,
}

impl<F, S> StateLayer<F, S> {
    /// 以内层能力构造。
    pub const fn new(inner: F) -> Self {
        Self {
            inner,
            _state: PhantomData,
        }
    }
}

impl<F: Clone, S> Clone for StateLayer<F, S> {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

impl<F: fmt::Debug, S> fmt::Debug for StateLayer<F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateLayer").field("inner", &self.inner).finish()
    }
}

impl<F, S> StateLayer<F, S>
where
    F: SyncEffect,
    S: Clone + Send + 'static,
{
    /// 读取当前状态。
    pub fn get(&self) -> Stateful<F, S, S> {
        let inner = self.inner.clone();
        Stateful::new(move |state: S| inner.pure((state.clone(), state)))
    }

    /// 替换状态。
    pub fn set(&self, state: S) -> Stateful<F, S, ()> {
        let inner = self.inner.clone();
        Stateful::new(move |_previous: S| inner.pure((state, ())))
    }

    /// 以函数修改状态。
    pub fn modify<T>(&self, update: T) -> Stateful<F, S, ()>
    where
        T: FnOnce(S) -> S + Send + 'static,
    {
        let inner = self.inner.clone();
        Stateful::new(move |state: S| inner.pure((update(state), ())))
    }

    /// 读取状态的投影。
    pub fn inspect<A, T>(&self, project: T) -> Stateful<F, S, A>
    where
        A: Send + 'static,
        T: FnOnce(&S) -> A + Send + 'static,
    {
        let inner = self.inner.clone();
        Stateful::new(move |state: S| {
            let value = project(&state);
            inner.pure((state, value))
        })
    }
}

impl<F, S> SyncEffect for StateLayer<F, S>
where
    F: SyncEffect,
    S: Clone + Send + 'static,
{
    type Of<A: Send + 'static> = Stateful<F, S, A>;

    fn pure<A: Send + 'static>(&self, value: A) -> Self::Of<A> {
        let inner = self.inner.clone();
        Stateful::new(move |state: S| inner.pure((state, value)))
    }

    fn raise_error<A: Send + 'static>(&self, error: CoreError) -> Self::Of<A> {
        let inner = self.inner.clone();
        Stateful::new(move |_state: S| inner.raise_error(error))
    }

    fn delay<A, T>(&self, thunk: T) -> Self::Of<A>
    where
        A: Send + 'static,
        T: FnOnce() -> A + Send + 'static,
    {
        let inner = self.inner.clone();
        Stateful::new(move |state: S| inner.delay(move || (state, thunk())))
    }

    fn suspend<A, T>(&self, thunk: T) -> Self::Of<A>
    where
        A: Send + 'static,
        T: FnOnce() -> Self::Of<A> + Send + 'static,
    {
        let inner = self.inner.clone();
        Stateful::new(move |state: S| inner.suspend(move || thunk().run(state)))
    }

    fn flat_map<A, B, K>(&self, fa: Self::Of<A>, f: K) -> Self::Of<B>
    where
        A: Send + 'static,
        B: Send + 'static,
        K: FnOnce(A) -> Self::Of<B> + Send + 'static,
    {
        let inner = self.inner.clone();
        Stateful::new(move |state: S| {
            let entered = inner.suspend::<(S, A), _>(move || fa.run(state));
            inner.flat_map(entered, move |(next, value): (S, A)| f(value).run(next))
        })
    }

    fn handle_error_with<A, K>(&self, fa: Self::Of<A>, f: K) -> Self::Of<A>
    where
        A: Send + 'static,
        K: FnOnce(CoreError) -> Self::Of<A> + Send + 'static,
    {
        let inner = self.inner.clone();
        Stateful::new(move |state: S| {
            let restart = state.clone();
            let entered = inner.suspend::<(S, A), _>(move || fa.run(state));
            inner.handle_error_with::<(S, A), _>(entered, move |error| f(error).run(restart))
        })
    }
}

impl<F, S> Layer for StateLayer<F, S>
where
    F: Async,
    S: Clone + Send + 'static,
{
    type Inner = F;
    type Context = S;
    type Packed<A: Send + 'static> = (S, A);

    fn inner(&self) -> &F {
        &self.inner
    }

    fn pack<A: Send + 'static>(&self, state: &S, value: A) -> (S, A) {
        (state.clone(), value)
    }

    fn enter<A, B>(&self, build: B) -> Self::Of<A>
    where
        A: Send + 'static,
        B: FnOnce(Self::Context) -> InnerOf<Self, Self::Packed<A>> + Send + 'static,
    {
        Stateful::new(build)
    }

    fn lower_unit(&self, fa: Self::Of<()>, context: S) -> F::Of<()> {
        self.inner.map(fa.run(context), |(_state, ()): (S, ())| ())
    }
}

impl<F, S> Async for StateLayer<F, S>
where
    F: Async,
    S: Clone + Send + 'static,
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
