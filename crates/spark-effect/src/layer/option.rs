//! 可选值包装层：`F::Of<Option<A>>`。
use super::{InnerOf, Layer};
use crate::{
    capability::{Async, SyncEffect},
    completion::Completion,
    error::{CoreError, codes},
    io::Io,
};

/// 在内层计算上叠加“无值”短路的能力对象。
#[derive(Clone, Copy, Debug, Default)]
pub struct OptionLayer<F> {
    inner: F,
}

impl<F> OptionLayer<F> {
    /// 以内层能力构造。
    pub const fn new(inner: F) -> Self {
        Self { inner }
    }
}

impl<F: SyncEffect> OptionLayer<F> {
    /// 以“无值”结束。
    pub fn none<A: Send + 'static>(&self) -> F::Of<Option<A>> {
        self.inner.pure(None::<A>)
    }

    /// 以值结束，等价于 `pure`。
    pub fn some<A: Send + 'static>(&self, value: A) -> F::Of<Option<A>> {
        self.inner.pure(Some(value))
    }

    /// 由已知的可选值构造。
    pub fn from_option<A: Send + 'static>(&self, value: Option<A>) -> F::Of<Option<A>> {
        self.inner.pure(value)
    }

    /// `fa` 以“无值”结束时改走 `fallback`。内层失败不受影响。
    pub fn or_else<A, K>(&self, fa: F::Of<Option<A>>, fallback: K) -> F::Of<Option<A>>
    where
        A: Send + 'static,
        K: FnOnce() -> F::Of<Option<A>> + Send + 'static,
    {
        let inner = self.inner.clone();
        self.inner.flat_map(fa, move |value| match value {
            Some(value) => inner.pure(Some(value)),
            None => fallback(),
        })
    }
}

impl<F: SyncEffect> SyncEffect for OptionLayer<F> {
    type Of<A: Send + 'static> = F::Of<Option<A>>;

    fn pure<A: Send + 'static>(&self, value: A) -> Self::Of<A> {
        self.inner.pure(Some(value))
    }

    fn raise_error<A: Send + 'static>(&self, error: CoreError) -> Self::Of<A> {
        self.inner.raise_error(error)
    }

    fn delay<A, T>(&self, thunk: T) -> Self::Of<A>
    where
        A: Send + 'static,
        T: FnOnce() -> A + Send + 'static,
    {
        self.inner.delay(move || Some(thunk()))
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
        self.inner.flat_map(fa, move |value| match value {
            Some(value) => f(value),
            None => inner.pure(None::<B>),
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

impl<F: Async> Layer for OptionLayer<F> {
    type Inner = F;
    type Context = ();
    type Packed<A: Send + 'static> = Option<A>;

    fn inner(&self) -> &F {
        &self.inner
    }

    fn pack<A: Send + 'static>(&self, _context: &(), value: A) -> Option<A> {
        Some(value)
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
        self.inner.flat_map(fa, move |value: Option<()>| match value {
            Some(()) => inner.pure(()),
            None => {
                tracing::debug!("empty value ended an async registration");
                inner.raise_error(CoreError::new(
                    codes::LAYER_SHORT_CIRCUIT,
                    "registration short-circuited with an empty value",
                ))
            }
        })
    }
}

impl<F: Async> Async for OptionLayer<F> {
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

    #[test]
    fn none_short_circuits_and_or_else_recovers() {
        let layer = OptionLayer::new(IoEffect);
        let skipped = layer.flat_map(layer.none::<i32>(), |n| IoEffect.pure(Some(n * 2)));
        assert_eq!(run_now(skipped), Some(Ok(None)));

        let recovered = layer.or_else(layer.none::<i32>(), || IoEffect.pure(Some(9)));
        assert_eq!(run_now(recovered), Some(Ok(Some(9))));
    }

    #[test]
    fn lift_io_wraps_in_some() {
        let layer = OptionLayer::new(IoEffect);
        let fa = layer.lift_io(Io::delay(|| "v"));
        assert_eq!(run_now(fa), Some(Ok(Some("v"))));
    }

    #[test]
    fn from_option_keeps_presence() {
        let layer = OptionLayer::new(IoEffect);
        assert_eq!(run_now(layer.from_option(Some(2_u8))), Some(Ok(Some(2))));
        assert_eq!(run_now(layer.from_option(None::<u8>)), Some(Ok(None)));
    }
}
