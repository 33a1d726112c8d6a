//! 解释器：把某个 `Async` 能力的计算运行到完成通道上。
//!
//! # 教案式说明
//! - **意图 (Why)**：定律只能通过“运行后观察到的结果”来比较两段计算，而 `Async` 契约本身不规定如何运行；
//!   因此每个被测实现都要提供一个解释器。
//! - **逻辑 (How)**：包装层解释器持有内层解释器，把包装后的结果拆包再交给内层运行；
//!   状态与环境包装层额外持有运行时使用的初始状态或环境值。
//! - **契约 (What)**：`run` 把计算的每一次结果投递给 `sink`；包装层自身的短路值（`Err`/`None`）
//!   以 `effect.layer_short_circuit` 失败的形式投递。
use spark_effect::{
    Async, Completion, CoreError, EitherLayer, IoEffect, Monoid, OptionLayer, Outcome,
    ReaderLayer, StateLayer, SyncEffect, WriterLayer, error::codes,
    test_stubs::{Callback, CallbackEffect},
};

/// 解释器所属能力的计算类型简写。
pub type EffectOf<I, A> = <<I as Interpreter>::Effect as SyncEffect>::Of<A>;

/// 运行某个 `Async` 能力之计算的解释器。
pub trait Interpreter: Send + Sync + 'static {
    /// 被测能力。
    type Effect: Async;

    /// 被测能力对象。
    fn effect(&self) -> &Self::Effect;

    /// 运行 `fa`，每一次结果都投递给 `sink`。
    fn run<A: Send + 'static>(&self, fa: EffectOf<Self, A>, sink: Completion<A>);
}

fn short_circuit() -> CoreError {
    CoreError::new(
        codes::LAYER_SHORT_CIRCUIT,
        "computation ended with the layer's short-circuit value",
    )
}

/// 参考引擎的解释器。
#[derive(Clone, Copy, Debug, Default)]
pub struct IoInterpreter;

impl Interpreter for IoInterpreter {
    type Effect = IoEffect;

    fn effect(&self) -> &IoEffect {
        &IoEffect
    }

    fn run<A: Send + 'static>(&self, fa: spark_effect::Io<A>, sink: Completion<A>) {
        fa.run_async(move |outcome| sink.complete(outcome))
    }
}

/// 回调式测试能力的解释器：通道的每一次调用都原样到达 `sink`。
///
/// 参考引擎只恢复一次，因此“调用次数原样转发”只有在本解释器之上才能被完整观察。
#[derive(Clone, Copy, Debug, Default)]
pub struct CallbackInterpreter;

impl Interpreter for CallbackInterpreter {
    type Effect = CallbackEffect;

    fn effect(&self) -> &CallbackEffect {
        &CallbackEffect
    }

    fn run<A: Send + 'static>(&self, fa: Callback<A>, sink: Completion<A>) {
        fa.run(sink)
    }
}

/// 结果包装层的解释器。
pub struct EitherInterpreter<I: Interpreter, E> {
    inner: I,
    effect: EitherLayer<I::Effect, E>,
}

impl<I: Interpreter, E: Send + 'static> EitherInterpreter<I, E> {
    /// 在内层解释器之上构造。
    pub fn new(inner: I) -> Self {
        let effect = EitherLayer::new(inner.effect().clone());
        Self { inner, effect }
    }
}

impl<I: Interpreter, E: Send + 'static> Interpreter for EitherInterpreter<I, E> {
    type Effect = EitherLayer<I::Effect, E>;

    fn effect(&self) -> &Self::Effect {
        &self.effect
    }

    fn run<A: Send + 'static>(&self, fa: EffectOf<Self, A>, sink: Completion<A>) {
        let sink = sink.contramap(|outcome: Outcome<Result<A, E>>| {
            outcome.and_then(|result| result.map_err(|_| short_circuit()))
        });
        self.inner.run(fa, sink)
    }
}

/// 可选值包装层的解释器。
pub struct OptionInterpreter<I: Interpreter> {
    inner: I,
    effect: OptionLayer<I::Effect>,
}

impl<I: Interpreter> OptionInterpreter<I> {
    /// 在内层解释器之上构造。
    pub fn new(inner: I) -> Self {
        let effect = OptionLayer::new(inner.effect().clone());
        Self { inner, effect }
    }
}

impl<I: Interpreter> Interpreter for OptionInterpreter<I> {
    type Effect = OptionLayer<I::Effect>;

    fn effect(&self) -> &Self::Effect {
        &self.effect
    }

    fn run<A: Send + 'static>(&self, fa: EffectOf<Self, A>, sink: Completion<A>) {
        let sink = sink.contramap(|outcome: Outcome<Option<A>>| {
            outcome.and_then(|value| value.ok_or_else(short_circuit))
        });
        self.inner.run(fa, sink)
    }
}

/// 日志包装层的解释器；日志被丢弃。
pub struct WriterInterpreter<I: Interpreter, L> {
    inner: I,
    effect: WriterLayer<I::Effect, L>,
}

impl<I: Interpreter, L: Monoid> WriterInterpreter<I, L> {
    /// 在内层解释器之上构造。
    pub fn new(inner: I) -> Self {
        let effect = WriterLayer::new(inner.effect().clone());
        Self { inner, effect }
    }
}

impl<I: Interpreter, L: Monoid> Interpreter for WriterInterpreter<I, L> {
    type Effect = WriterLayer<I::Effect, L>;

    fn effect(&self) -> &Self::Effect {
        &self.effect
    }

    fn run<A: Send + 'static>(&self, fa: EffectOf<Self, A>, sink: Completion<A>) {
        let sink = sink.contramap(|outcome: Outcome<(L, A)>| outcome.map(|(_log, value)| value));
        self.inner.run(fa, sink)
    }
}

/// 状态包装层的解释器；每次运行都从同一初始状态开始，最终状态被丢弃。
pub struct StateInterpreter<I: Interpreter, S> {
    inner: I,
    effect: StateLayer<I::Effect, S>,
    initial: S,
}

impl<I, S> StateInterpreter<I, S>
where
    I: Interpreter,
    S: Clone + Send + Sync + 'static,
{
    /// 在内层解释器之上构造。
    pub fn new(inner: I, initial: S) -> Self {
        let effect = StateLayer::new(inner.effect().clone());
        Self {
            inner,
            effect,
            initial,
        }
    }
}

impl<I, S> Interpreter for StateInterpreter<I, S>
where
    I: Interpreter,
    S: Clone + Send + Sync + 'static,
{
    type Effect = StateLayer<I::Effect, S>;

    fn effect(&self) -> &Self::Effect {
        &self.effect
    }

    fn run<A: Send + 'static>(&self, fa: EffectOf<Self, A>, sink: Completion<A>) {
        let sink = sink.contramap(|outcome: Outcome<(S, A)>| outcome.map(|(_state, value)| value));
        self.inner.run(fa.run(self.initial.clone()), sink)
    }
}

/// 环境包装层的解释器；每次运行都注入同一环境值。
pub struct ReaderInterpreter<I: Interpreter, R> {
    inner: I,
    effect: ReaderLayer<I::Effect, R>,
    environment: R,
}

impl<I, R> ReaderInterpreter<I, R>
where
    I: Interpreter,
    R: Clone + Send + Sync + 'static,
{
    /// 在内层解释器之上构造。
    pub fn new(inner: I, environment: R) -> Self {
        let effect = ReaderLayer::new(inner.effect().clone());
        Self {
            inner,
            effect,
            environment,
        }
    }
}

impl<I, R> Interpreter for ReaderInterpreter<I, R>
where
    I: Interpreter,
    R: Clone + Send + Sync + 'static,
{
    type Effect = ReaderLayer<I::Effect, R>;

    fn effect(&self) -> &Self::Effect {
        &self.effect
    }

    fn run<A: Send + 'static>(&self, fa: EffectOf<Self, A>, sink: Completion<A>) {
        self.inner.run(fa.run(self.environment.clone()), sink)
    }
}
