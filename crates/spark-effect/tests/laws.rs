//! 以定律套件校验参考引擎、计数能力与全部包装层。
//!
//! # 教案级注释概览
//!
//! - **核心目标 (Why)**：`spark-effect-laws` 把异步完成契约整理为可复用的定律；本文件把它应用到仓库内
//!   每一个 `Async` 实现上，包括多层嵌套的组合。
//! - **设计手法 (How)**：固定参数的套件覆盖常见情形；proptest 随机化结果与通道调用次数，
//!   检查 `async_` 与 `async_suspended` 的等价性以及包装层对调用次数的保持。
//!   参考引擎只恢复一次，调用次数的比较放在不去重的 `CallbackEffect` 之上进行。
use proptest::prelude::*;
use spark_effect::{Completion, CoreError, Outcome, test_stubs::CountingEffect};
use spark_effect_laws::{
    CallbackInterpreter, EffectOf, EitherInterpreter, Interpreter, IoInterpreter,
    OptionInterpreter, ReaderInterpreter, StateInterpreter, WriterInterpreter,
    async_forwards_every_invocation, async_matches_suspended_delay, layer_preserves_cardinality,
    run_async_suite, run_layer_suite,
};

/// 以计数能力为载体的解释器，用来确认默认 `lift_io`（经过桥接）同样满足定律。
#[derive(Clone, Default)]
struct CountingInterpreter {
    effect: CountingEffect,
}

impl Interpreter for CountingInterpreter {
    type Effect = CountingEffect;

    fn effect(&self) -> &CountingEffect {
        &self.effect
    }

    fn run<A: Send + 'static>(&self, fa: EffectOf<Self, A>, sink: Completion<A>) {
        fa.run_async(move |outcome| sink.complete(outcome))
    }
}

fn outcome_strategy() -> impl Strategy<Value = Outcome<i64>> {
    prop_oneof![
        any::<i64>().prop_map(Ok),
        "[a-z]{1,8}".prop_map(|message| Err(CoreError::raised(message))),
    ]
}

#[test]
fn reference_engine_satisfies_async_laws() {
    run_async_suite(&IoInterpreter);
}

#[test]
fn counting_effect_satisfies_async_laws() {
    run_async_suite(&CountingInterpreter::default());
}

#[test]
fn callback_effect_satisfies_async_laws() {
    run_async_suite(&CallbackInterpreter);
}

#[test]
fn layers_over_callback_effect_satisfy_async_laws() {
    run_layer_suite(&EitherInterpreter::<_, String>::new(CallbackInterpreter));
    run_layer_suite(&OptionInterpreter::new(CallbackInterpreter));
    run_layer_suite(&WriterInterpreter::<_, Vec<u8>>::new(CallbackInterpreter));
    run_layer_suite(&StateInterpreter::new(CallbackInterpreter, 5_u32));
    run_layer_suite(&ReaderInterpreter::new(CallbackInterpreter, 'r'));
}

#[test]
fn every_layer_forwards_three_invocations() {
    async_forwards_every_invocation(&CallbackInterpreter, 3);
    async_forwards_every_invocation(&EitherInterpreter::<_, String>::new(CallbackInterpreter), 3);
    async_forwards_every_invocation(&OptionInterpreter::new(CallbackInterpreter), 3);
    async_forwards_every_invocation(&WriterInterpreter::<_, String>::new(CallbackInterpreter), 3);
    async_forwards_every_invocation(&StateInterpreter::new(CallbackInterpreter, 0_u8), 3);
    async_forwards_every_invocation(&ReaderInterpreter::new(CallbackInterpreter, 0_u8), 3);
}

#[test]
fn either_layer_satisfies_async_laws() {
    run_layer_suite(&EitherInterpreter::<_, String>::new(IoInterpreter));
}

#[test]
fn option_layer_satisfies_async_laws() {
    run_layer_suite(&OptionInterpreter::new(IoInterpreter));
}

#[test]
fn writer_layer_satisfies_async_laws() {
    run_layer_suite(&WriterInterpreter::<_, Vec<String>>::new(IoInterpreter));
}

#[test]
fn state_layer_satisfies_async_laws() {
    run_layer_suite(&StateInterpreter::new(IoInterpreter, 0_u64));
}

#[test]
fn reader_layer_satisfies_async_laws() {
    run_layer_suite(&ReaderInterpreter::new(IoInterpreter, String::from("env")));
}

#[test]
fn nested_layers_satisfy_async_laws() {
    let nested = StateInterpreter::new(
        WriterInterpreter::<_, String>::new(EitherInterpreter::<_, u8>::new(IoInterpreter)),
        7_i32,
    );
    run_layer_suite(&nested);
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_async_matches_suspended_delay_on_reference_engine(
        outcome in outcome_strategy(),
        invocations in 0_usize..4,
    ) {
        async_matches_suspended_delay(&IoInterpreter, outcome, invocations);
    }

    #[test]
    fn prop_async_matches_suspended_delay_on_layers(
        outcome in outcome_strategy(),
        invocations in 0_usize..4,
    ) {
        async_matches_suspended_delay(
            &EitherInterpreter::<_, String>::new(IoInterpreter),
            outcome.clone(),
            invocations,
        );
        async_matches_suspended_delay(&OptionInterpreter::new(IoInterpreter), outcome.clone(), invocations);
        async_matches_suspended_delay(
            &WriterInterpreter::<_, Vec<u8>>::new(IoInterpreter),
            outcome.clone(),
            invocations,
        );
        async_matches_suspended_delay(&StateInterpreter::new(IoInterpreter, 1_u8), outcome.clone(), invocations);
        async_matches_suspended_delay(&ReaderInterpreter::new(IoInterpreter, 2_u8), outcome, invocations);
    }

    #[test]
    fn prop_layers_preserve_channel_cardinality(invocations in 0_usize..6) {
        let base = CallbackInterpreter;
        let either = EitherInterpreter::<_, String>::new(base);
        let option = OptionInterpreter::new(base);
        let writer = WriterInterpreter::<_, Vec<u8>>::new(base);
        let state = StateInterpreter::new(base, 0_u16);
        let reader = ReaderInterpreter::new(base, 0_u16);

        async_forwards_every_invocation(&base, invocations);
        async_forwards_every_invocation(&either, invocations);
        async_forwards_every_invocation(&option, invocations);
        async_forwards_every_invocation(&writer, invocations);
        async_forwards_every_invocation(&state, invocations);
        async_forwards_every_invocation(&reader, invocations);

        layer_preserves_cardinality(&either, &base, invocations);
        layer_preserves_cardinality(&option, &base, invocations);
        layer_preserves_cardinality(&writer, &base, invocations);
        layer_preserves_cardinality(&state, &base, invocations);
        layer_preserves_cardinality(&reader, &base, invocations);
    }

    #[test]
    fn prop_nested_layers_preserve_channel_cardinality(invocations in 0_usize..6) {
        let either = EitherInterpreter::<_, String>::new(CallbackInterpreter);
        let nested = StateInterpreter::new(EitherInterpreter::<_, String>::new(CallbackInterpreter), 1_i32);
        async_forwards_every_invocation(&nested, invocations);
        layer_preserves_cardinality(&nested, &either, invocations);
    }
}
