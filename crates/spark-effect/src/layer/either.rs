//! 结果包装层：`F::Of<Result<A, E>>`。
use super::{InnerOf, Layer};
use crate::{
    capability::{Async, SyncEffect},
    completion::Completion,
    error::{CoreError, codes},
    io::Io,
};
use core::{fmt, marker::PhantomData};

/// 在内层计算上叠加业务短路值 `E` 的能力对象。
///
/// # 契约说明（What）
/// - `Err(e)` 是包装层自身的短路值，与内层失败（[`CoreError`]）互不转换；
/// - `flat_map` 遇到 `Err(e)` 时跳过续体，原样保留 `e`。
pub struct EitherLayer<F, E> {
    inner: F,
    _short_circuit: PhantomData<fn() -> E>,
}

impl<F, E> EitherLayer<F, E> {
    /// 以内层能力构造。
    pub const fn new(inner: F) -> Self {
        Self {
            inner,
            _short_circuit: PhantomData,
        }
    }
}

impl<F: Clone, E> Clone for EitherLayer<F, E> {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

impl<F: fmt::Debug, E> fmt::Debug for EitherLayer<F, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EitherLayer").field("inner", &self.inner).finish()
    }
}

impl<F, E> EitherLayer<F, E>
where
    F: SyncEffect,
    E: Send + 'static,
{
    /// 以短路值结束。
    pub fn left<A: Send + 'static>(&self, error: E) -> F::Of<Result<A, E>> {
        self.inner.pure(Err::<A, E>(error))
    }

    /// 以成功值结束，等价于 `pure`。
    pub fn right<A: Send + 'static>(&self, value: A) -> F::Of<Result<A, E>> {
        self.inner.pure(Ok::<A, E>(value))
    }

    /// 由已知结果构造。
    pub fn from_result<A: Send + 'static>(&self, result: Result<A, E>) -> F::Of<Result<A, E>> {
        self.inner.pure(result)
    }

    /// 从短路值恢复。内层失败不受影响。
    pub fn recover_left<A, K>(&self, fa: F::Of<Result<A, E>>, f: K) -> F::Of<Result<A, E>>
    where
        A: Send + 'static,
        K: FnOnce(E) -> F::Of<Result<A, E>> + Send + 'static,
    {
        let inner = self.inner.clone();
        self.inner.flat_map(fa, move |result| match result {
            Ok(value) => inner.pure(Ok::<A, E>(value)),
            Err(error) => f(error),
        })
    }
}

impl<F, E> SyncEffect for EitherLayer<F, E>
where
    F: SyncEffect,
    E: Send + 'static,
{
    type Of<A: Send + 'static> = F::Of<Result<A, E>>;

    fn pure<A: Send + 'static>(&self, value: A) -> Self::Of<A> {
        self.inner.pure(Ok::<A, E>(value))
    }

    fn raise_error<A: Send + 'static>(&self, error: CoreError) -> Self::Of<A> {
        self.inner.raise_error(error)
    }

    fn delay<A, T>(&self, thunk: T) -> Self::Of<A>
    where
        A: Send + 'static,
        T: FnOnce() -> A + Send + 'static,
    {
        self.inner.delay(move || Ok::<A, E>(thunk()))
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
        self.inner.flat_map(fa, move |result| match result {
            Ok(value) => f(value),
            Err(error) => inner.pure(Err::<B, E>(error)),
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

impl<F, E> Layer for EitherLayer<F, E>
where
    F: Async,
    E: Send + 'static,
{
    type Inner = F;
    type Context = ();
    type Packed<A: Send + 'static> = Result<A, E>;

    fn inner(&self) -> &F {
        &self.inner
    }

    fn pack<A: Send + 'static>(&self, _context: &(), value: A) -> Result<A, E> {
        Ok(value)
    }

    fn enter<A, B>(&self, build: B) -> Self::Of<A>
    where
        A: Send + 'static,
        B: FnOnce(Self::Context) -> InnerOf<Self, Self::Packed<A>> + Send + 'static,
    {
        build(())
    }

    fn lower_unit(&self, fa: Self::Of<()>, _context: ()) -> F::Of<()> {
        let inner = self.inner.clone();
        self.inner.flat_map(fa, move |result| match result {
            Ok(()) => inner.pure(()),
            Err(_) => {
                tracing::debug!("short-circuit value ended an async registration");
                inner.raise_error(CoreError::new(
                    codes::LAYER_SHORT_CIRCUIT,
                    "registration short-circuited with a left value",
                ))
            }
        })
    }
}

impl<F, E> Async for EitherLayer<F, E>
where
    F: Async,
    E: Send + 'static,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{io::IoEffect, layer::run_now};

    type Layered = EitherLayer<IoEffect, &'static str>;

    #[test]
    fn left_skips_continuations() {
        let layer = Layered::new(IoEffect);
        let fa = layer.left::<i32>("stop");
        let chained = layer.flat_map(fa, |n| IoEffect.pure(Ok(n + 1)));
        assert_eq!(run_now(chained), Some(Ok(Err("stop"))));
    }

    #[test]
    fn async_wraps_success_in_right() {
        let layer = Layered::new(IoEffect);
        let fa = layer.async_(|cb: Completion<i32>| cb.succeed(5));
        assert_eq!(run_now(fa), Some(Ok(Ok(5))));
    }

    #[test]
    fn inner_failure_is_not_turned_into_left() {
        let layer = Layered::new(IoEffect);
        let fa = layer.async_(|cb: Completion<i32>| cb.fail(CoreError::raised("io")));
        let outcome = run_now(fa).and_then(Result::err);
        assert_eq!(outcome.map(|error| error.code()), Some(codes::RAISED));
    }

    #[test]
    fn left_in_registration_fails_the_computation() {
        let layer = Layered::new(IoEffect);
        let this = layer.clone();
        let fa = layer.async_suspended(move |_cb: Completion<i32>| this.left("no"));
        let outcome = run_now(fa).and_then(Result::err);
        assert_eq!(outcome.map(|error| error.code()), Some(codes::LAYER_SHORT_CIRCUIT));
    }

    #[test]
    fn recover_left_sees_short_circuit_value() {
        let layer = Layered::new(IoEffect);
        let fa = layer.recover_left(layer.left::<usize>("four"), |e| IoEffect.pure(Ok(e.len())));
        assert_eq!(run_now(fa), Some(Ok(Ok(4))));
    }

    #[test]
    fn from_result_keeps_either_side() {
        let layer = Layered::new(IoEffect);
        assert_eq!(run_now(layer.from_result(Ok::<u8, _>(1))), Some(Ok(Ok(1))));
        assert_eq!(run_now(layer.from_result(Err::<u8, _>("left"))), Some(Ok(Err("left"))));
    }
}
