//! 异步完成契约的定律套件。
//!
//! # 教案式综述（Why / How / What）
//! - **为什么存在**：`Async` 能力可以由参考引擎、包装层或第三方运行时实现，它们必须在“完成通道”这一点上
//!   表现一致。本 crate 把这些约束整理为可复用的定律，任何实现只需提供一个 [`Interpreter`] 即可自测。
//! - **如何集成**：在目标仓库的 `tests` 目录中构造解释器并调用 [`run_async_suite`]；需要随机化输入时，
//!   也可以在 proptest 用例中直接调用 `laws` 下的单条定律函数。
//! - **测试对象**：`async_` 与 `async_suspended` 的等价性、`never` 的永不完成、`shift` 的执行器时序、
//!   参考引擎桥接的保值与栈安全，以及包装层对通道调用次数的保持。
//! - **调用次数**：参考引擎只恢复一次，[`async_forwards_every_invocation`] 与 [`layer_preserves_cardinality`]
//!   需要在 [`CallbackInterpreter`] 这类不去重的解释器上运行才有区分力。
//!
//! # 契约说明（What）
//! - **输入要求**：解释器的 `run` 必须把每一次结果都投递给给定通道，且对同步完成的计算在返回前投递完毕。
//! - **输出保证**：套件全部通过时，实现满足“注册函数恰好运行一次、通道调用原样转发”的显式约束。
//!
//! # 风险提示（Trade-offs）
//! - `never` 定律只能在有界时间内观察，无法证明“永远”；等待时长取较小值以控制测试耗时。
//!
//! # 模块结构
//! - `case` 模块：定律用例的元信息与统一执行辅助函数。
//! - `interpreter`、`laws`、`support` 分别提供解释器、定律断言与记录工具。

mod interpreter;
mod laws;
mod support;

pub use interpreter::{
    CallbackInterpreter, EffectOf, EitherInterpreter, Interpreter, IoInterpreter,
    OptionInterpreter, ReaderInterpreter, StateInterpreter, WriterInterpreter,
};
pub use laws::{
    async_forwards_every_invocation, async_matches_suspended_delay,
    bridge_forwards_async_success, bridge_is_stack_safe, bridge_preserves_pure_and_error,
    layer_keeps_inner_failure, layer_preserves_cardinality, never_stays_pending,
    shift_completes_after_executor_item,
};
pub use support::{Recorder, observe};

use case::{LawCase, run_cases};
use spark_effect::CoreError;
use std::time::Duration;

/// `never` 定律的观察窗口。
const NEVER_WINDOW: Duration = Duration::from_millis(20);

/// 栈安全定律使用的组合深度。
const STACK_DEPTH: usize = 10_000;

mod case {
    use super::support;
    use std::panic;

    /// 单条定律用例。
    ///
    /// # 教案式说明
    /// - **意图 (Why)**：以结构体封装定律函数与名称，失败时可以打印“套件/定律”上下文。
    /// - **契约 (What)**：`test` 在定律不成立时必须 `panic`。
    pub struct LawCase<I> {
        /// 定律名称。
        pub name: &'static str,
        /// 实际执行的断言逻辑。
        pub test: fn(&I),
    }

    /// 在捕获 panic 的前提下依次执行全部用例，首个失败附加上下文后重新抛出。
    pub fn run_cases<I>(suite: &str, interpreter: &I, cases: &[LawCase<I>]) {
        assert!(!cases.is_empty(), "定律套件不应为空");
        for case in cases {
            let outcome = panic::catch_unwind(panic::AssertUnwindSafe(|| (case.test)(interpreter)));
            if let Err(payload) = outcome {
                support::panic_with_context(suite, case.name, payload);
            }
        }
    }
}

fn async_cases<I: Interpreter>() -> [LawCase<I>; 9] {
    [
        LawCase {
            name: "async_matches_suspended_delay/success_once",
            test: |interpreter| async_matches_suspended_delay(interpreter, Ok(7), 1),
        },
        LawCase {
            name: "async_matches_suspended_delay/failure_once",
            test: |interpreter| {
                async_matches_suspended_delay(interpreter, Err(CoreError::raised("boom")), 1)
            },
        },
        LawCase {
            name: "async_matches_suspended_delay/never_invoked",
            test: |interpreter| async_matches_suspended_delay(interpreter, Ok(7), 0),
        },
        LawCase {
            name: "async_matches_suspended_delay/invoked_three_times",
            test: |interpreter| async_matches_suspended_delay(interpreter, Ok(7), 3),
        },
        LawCase {
            name: "never_stays_pending",
            test: |interpreter| never_stays_pending(interpreter, NEVER_WINDOW),
        },
        LawCase {
            name: "shift_completes_after_executor_item",
            test: shift_completes_after_executor_item::<I>,
        },
        LawCase {
            name: "bridge_forwards_async_success",
            test: bridge_forwards_async_success::<I>,
        },
        LawCase {
            name: "bridge_preserves_pure_and_error",
            test: bridge_preserves_pure_and_error::<I>,
        },
        LawCase {
            name: "bridge_is_stack_safe",
            test: |interpreter| bridge_is_stack_safe(interpreter, STACK_DEPTH),
        },
    ]
}

/// 对解释器运行全部异步定律。
///
/// # 教案式说明
/// - **意图 (Why)**：第三方实现只需一行调用即可完成契约自测。
/// - **逻辑 (How)**：按固定顺序执行定律；任一定律失败时在 panic 信息中注明套件与定律名称。
/// - **契约 (What)**：函数成功返回即表示全部定律成立。
pub fn run_async_suite<I: Interpreter>(interpreter: &I) {
    run_cases("async", interpreter, &async_cases::<I>());
}

/// 对包装层解释器额外运行“内层失败保持为失败”的定律。
pub fn run_layer_suite<I: Interpreter>(interpreter: &I) {
    run_async_suite(interpreter);
    run_cases(
        "layer",
        interpreter,
        &[LawCase {
            name: "layer_keeps_inner_failure",
            test: layer_keeps_inner_failure::<I>,
        }],
    );
}
