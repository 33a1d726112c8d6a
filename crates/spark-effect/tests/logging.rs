//! 结构化日志事件的可观察性。
//!
//! # 教案级注释概览
//!
//! - **核心目标 (Why)**：桥接路径选择、重复完成、注册失败与阻塞超时都只能从日志中诊断；
//!   这些事件的消息文本是排障手册引用的稳定标识，不能随意改动。
//! - **设计手法 (How)**：`tracing-test` 捕获测试期间的全部事件（启用 `no-env-filter`，不按 crate 过滤），
//!   通过 `logs_contain` 断言关键字段。
use spark_effect::{
    Async, Completion, CoreError, Io, OptionLayer, RunSettings, SyncEffect, shift,
    test_stubs::{CountingEffect, RecordingExecutor},
};
use std::time::Duration;
use tracing_test::traced_test;

#[traced_test]
#[test]
fn bridge_reports_short_circuit_path() {
    let counting = CountingEffect::new();
    let _ = counting.lift_io(Io::pure(1_u8));
    assert!(logs_contain("io bridge short-circuit"));
    assert!(logs_contain("path=\"pure\""));
}

#[traced_test]
#[test]
fn bridge_reports_async_forwarding() {
    let counting = CountingEffect::new();
    let lifted = counting.lift_io(Io::async_(|completion: Completion<u8>| completion.succeed(1)));
    assert_eq!(lifted.run_blocking(&RunSettings::default()), Ok(1));
    assert!(logs_contain("io bridge forwarding async node"));
}

#[traced_test]
#[test]
fn duplicate_completion_is_traced() {
    let io = Io::async_(|completion: Completion<u8>| {
        completion.succeed(1);
        completion.succeed(2);
    });
    assert_eq!(io.run_blocking(&RunSettings::default()), Ok(1));
    assert!(logs_contain("duplicate completion ignored by io run loop"));
}

#[traced_test]
#[test]
fn registration_failure_is_logged_with_code() {
    let io = Io::<u8>::async_suspended(|_completion: Completion<u8>| {
        Io::raise_error(CoreError::raised("refused"))
    });
    assert!(io.run_blocking(&RunSettings::default()).is_err());
    assert!(logs_contain("async registration failed; forwarding to completion"));
    assert!(logs_contain("effect.raised"));
}

#[traced_test]
#[test]
fn layer_short_circuit_in_registration_is_logged() {
    let layer = OptionLayer::new(spark_effect::IoEffect);
    let this = layer.clone();
    let program = layer.async_suspended(move |_completion: Completion<u8>| this.none::<()>());
    assert!(program.run_blocking(&RunSettings::default()).is_err());
    assert!(logs_contain("empty value ended an async registration"));
}

#[traced_test]
#[test]
fn blocking_timeout_is_logged() {
    let settings = RunSettings::new(Some(Duration::from_millis(10)), true);
    assert!(Io::<u8>::never().run_blocking(&settings).is_err());
    assert!(logs_contain("io blocking run started"));
    assert!(logs_contain("io blocking run timed out"));
    assert!(logs_contain("timeout_ms=10"));
    assert!(logs_contain("io blocking run finished"));
}

#[traced_test]
#[test]
fn shift_submission_is_traced() {
    let executor = RecordingExecutor::new();
    let effect = CountingEffect::new();
    let program = effect.void(shift(&effect, executor.clone()));
    program.run_async(|_outcome| {});
    assert_eq!(executor.run_all(), 1);
    assert!(logs_contain("shift scheduling continuation onto executor"));
}
