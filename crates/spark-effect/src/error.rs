use crate::Error;
use alloc::{borrow::Cow, sync::Arc};
use core::fmt;

/// `CoreError` 是异步完成契约中唯一的失败形态：计算失败。
///
/// # 设计背景（Why）
/// - 契约层只有一种错误：计算失败，它出现在完成通道的 `Err` 分支，或出现在 `raise_error` 描述的计算中；
///   不区分可重试/致命，这些分类属于上层。
/// - 采用“稳定错误码 + 人类可读消息 + 可选底层原因”三元组，日志与断言可以按码值匹配。
///
/// # 逻辑解析（How）
/// - `code` 为 `'static` 字符串，遵循 `<领域>.<语义>` 命名；
/// - `cause` 以 `Arc` 持有，使错误可 `Clone`：同一失败可能被记忆化或广播给多个监听者。
///
/// # 契约说明（What）
/// - **前置条件**：调用方使用 [`codes`] 中的码值或遵循同一命名约定的自定义码值；
/// - **后置条件**：错误满足 `Send + Sync + 'static`，可跨线程经由完成通道传递。
///
/// # 设计取舍与风险（Trade-offs）
/// - 选择 `Arc` 而非 `Box` 保存原因，多一次原子计数，换取 `Clone` 语义。
#[derive(Clone, Debug)]
pub struct CoreError {
    code: &'static str,
    message: Cow<'static, str>,
    cause: Option<ErrorCause>,
}

/// `ErrorCause` 封装底层原因，保持 `Send + Sync` 以方便跨线程传递。
pub type ErrorCause = Arc<dyn Error + Send + Sync + 'static>;

/// `Result` 为框架统一的返回值别名，默认错误类型为 [`CoreError`]。
pub type Result<T, E = CoreError> = core::result::Result<T, E>;

/// 完成通道承载的结果：`Ok(A)` 表示成功，`Err(CoreError)` 表示计算失败。
pub type Outcome<A> = core::result::Result<A, CoreError>;

impl CoreError {
    /// 构造核心错误。
    ///
    /// # 示例（Examples）
    /// ```rust
    /// use spark_effect::CoreError;
    /// use spark_effect::error::codes;
    ///
    /// let err = CoreError::new(codes::RAISED, "boom");
    /// assert_eq!(err.code(), codes::RAISED);
    /// assert_eq!(err.message(), "boom");
    /// assert!(err.cause().is_none());
    /// ```
    pub fn new(code: &'static str, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
        }
    }

    /// 以通用码值 [`codes::RAISED`] 构造错误，供业务直接抛出计算失败。
    pub fn raised(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(codes::RAISED, message)
    }

    /// 附带底层原因并返回新的核心错误。
    pub fn with_cause(mut self, cause: impl Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// 获取稳定错误码。
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// 获取描述。
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 获取底层原因。
    pub fn cause(&self) -> Option<&ErrorCause> {
        self.cause.as_ref()
    }
}

impl PartialEq for CoreError {
    /// 仅比较码值与消息；底层原因不参与相等性判断。
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.message == other.message
    }
}

impl Eq for CoreError {}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| cause.as_ref() as &(dyn Error + 'static))
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CoreError {}

/// 稳定错误码集合。
///
/// # 设计背景（Why）
/// - 错误码遵循 `<领域>.<语义>` 命名约定，方便在日志中检索与聚合；
/// - 契约层本身几乎不制造错误，这里只登记参考引擎与测试套件会产生的少量码值。
pub mod codes {
    /// 业务通过 `raise_error` 抛出的通用计算失败。
    pub const RAISED: &str = "effect.raised";
    /// 参考引擎在类型擦除后恢复值时发现类型不一致；出现即意味着实现缺陷。
    pub const TYPE_MISMATCH: &str = "effect.type_mismatch";
    /// 阻塞运行在配置的时限内未观察到完成。
    pub const BLOCKING_TIMEOUT: &str = "effect.blocking_timeout";
    /// 包装层以自身的短路值（`Err(e)`/`None`）结束，测试解释器据此报告。
    pub const LAYER_SHORT_CIRCUIT: &str = "effect.layer_short_circuit";
}
