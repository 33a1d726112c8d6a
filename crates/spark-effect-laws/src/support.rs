use crate::interpreter::{EffectOf, Interpreter};
use parking_lot::Mutex;
use spark_effect::{Completion, Outcome};
use std::any::Any;
use std::panic;
use std::sync::Arc;

/// 从 panic payload 中取出断言信息；非字符串 payload 以占位文本表示。
fn failure_detail(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("(non-string panic payload)")
}

/// 以“定律 / 套件”上下文重新抛出定律失败。
///
/// 信息形如 ``law `never_stays_pending` failed in suite `async`: <断言信息>``，
/// 原始 payload 被替换为这段文本。只应在 `catch_unwind` 的错误分支中调用。
pub fn panic_with_context(suite: &str, law: &str, payload: Box<dyn Any + Send>) -> ! {
    let message = format!(
        "law `{law}` failed in suite `{suite}`: {}",
        failure_detail(payload.as_ref())
    );
    panic::resume_unwind(Box::new(message))
}

/// 收集完成通道上每一次投递的记录器。
///
/// 克隆共享同一记录；`completion()` 可以被多次调用，所有通道写入同一列表。
pub struct Recorder<A> {
    seen: Arc<Mutex<Vec<Outcome<A>>>>,
}

impl<A> Clone for Recorder<A> {
    fn clone(&self) -> Self {
        Self {
            seen: Arc::clone(&self.seen),
        }
    }
}

impl<A> Default for Recorder<A> {
    fn default() -> Self {
        Self {
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<A: Send + 'static> Recorder<A> {
    /// 创建空记录器。
    pub fn new() -> Self {
        Self::default()
    }

    /// 返回写入本记录器的通道。
    pub fn completion(&self) -> Completion<A> {
        let seen = Arc::clone(&self.seen);
        Completion::new(move |outcome| seen.lock().push(outcome))
    }

    /// 已记录的投递次数。
    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    /// 是否尚无投递。
    pub fn is_empty(&self) -> bool {
        self.seen.lock().is_empty()
    }
}

impl<A: Clone + Send + 'static> Recorder<A> {
    /// 当前记录的副本。
    pub fn snapshot(&self) -> Vec<Outcome<A>> {
        self.seen.lock().clone()
    }
}

/// 运行计算并返回运行期间同步投递的全部结果。
pub fn observe<I, A>(interpreter: &I, fa: EffectOf<I, A>) -> Vec<Outcome<A>>
where
    I: Interpreter,
    A: Clone + Send + 'static,
{
    let recorder = Recorder::new();
    interpreter.run(fa, recorder.completion());
    recorder.snapshot()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_message_names_law_and_suite() {
        let caught = panic::catch_unwind(|| {
            panic_with_context("async", "never_stays_pending", Box::new("channel was invoked"));
        });
        let payload = caught.expect_err("context must re-raise");
        let message = payload.downcast::<String>().expect("message is a String");
        assert_eq!(
            *message,
            "law `never_stays_pending` failed in suite `async`: channel was invoked"
        );
    }

    #[test]
    fn non_string_payload_gets_a_placeholder() {
        let payload: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(failure_detail(payload.as_ref()), "(non-string panic payload)");
    }
}
