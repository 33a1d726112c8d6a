//! 运行设置：阻塞运行的等待上限与运行循环追踪开关。
use alloc::string::String;
use core::{fmt, time::Duration};
use serde::Deserialize;

/// 参考引擎入口（[`Io::run_blocking`](crate::Io)）使用的运行设置。
///
/// ### 设计目的（Why）
/// - 阻塞运行可能永远等不到回调（例如 `never`），测试与嵌入方需要一个可选的等待上限；
/// - 追踪开关让调用方在不安装额外订阅者过滤规则的前提下打开运行边界的 `trace` 事件。
///
/// ### 契约说明（What）
/// - `blocking_timeout`：`None` 表示无限等待；`Some(d)` 时超时以 `effect.blocking_timeout` 失败返回；
/// - `trace_run_loop`：为真时阻塞运行在开始与结束处发出 `trace` 事件；
/// - 默认值为无限等待、关闭追踪。
///
/// ### 配置格式
/// 通过 serde 反序列化时使用毫秒整数，`0` 被拒绝：
/// ```toml
/// blocking_timeout_ms = 250
/// trace_run_loop = true
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawRunSettings")]
pub struct RunSettings {
    blocking_timeout: Option<Duration>,
    trace_run_loop: bool,
}

impl RunSettings {
    /// 构造带自定义阈值的设置。
    pub const fn new(blocking_timeout: Option<Duration>, trace_run_loop: bool) -> Self {
        Self {
            blocking_timeout,
            trace_run_loop,
        }
    }

    /// 阻塞运行的等待上限。
    pub const fn blocking_timeout(&self) -> Option<Duration> {
        self.blocking_timeout
    }

    /// 是否追踪运行边界。
    pub const fn trace_run_loop(&self) -> bool {
        self.trace_run_loop
    }

    /// 返回设置了等待上限的副本。
    pub const fn with_blocking_timeout(mut self, timeout: Duration) -> Self {
        self.blocking_timeout = Some(timeout);
        self
    }

    /// 从 TOML 文本解析设置；缺省字段取默认值。
    #[cfg(feature = "toml_config")]
    pub fn from_toml_str(text: &str) -> Result<Self, RunSettingsError> {
        toml::from_str(text).map_err(|error| RunSettingsError::Malformed {
            detail: alloc::string::ToString::to_string(&error),
        })
    }
}

#[derive(Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawRunSettings {
    blocking_timeout_ms: Option<u64>,
    trace_run_loop: bool,
}

impl TryFrom<RawRunSettings> for RunSettings {
    type Error = RunSettingsError;

    fn try_from(raw: RawRunSettings) -> Result<Self, Self::Error> {
        let blocking_timeout = match raw.blocking_timeout_ms {
            Some(0) => return Err(RunSettingsError::NonPositiveTimeout),
            Some(millis) => Some(Duration::from_millis(millis)),
            None => None,
        };
        Ok(Self::new(blocking_timeout, raw.trace_run_loop))
    }
}

/// 运行设置解析过程中可能出现的错误。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunSettingsError {
    /// `blocking_timeout_ms` 为 0。
    NonPositiveTimeout,
    /// 文本无法解析为设置记录。
    Malformed { detail: String },
}

impl fmt::Display for RunSettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunSettingsError::NonPositiveTimeout => {
                f.write_str("run.blocking_timeout_ms must be > 0")
            }
            RunSettingsError::Malformed { detail } => {
                write!(f, "malformed run settings: {}", detail)
            }
        }
    }
}

impl crate::Error for RunSettingsError {
    fn source(&self) -> Option<&(dyn crate::Error + 'static)> {
        None
    }
}

#[cfg(feature = "std")]
impl std::error::Error for RunSettingsError {}

#[cfg(all(test, feature = "toml_config"))]
mod tests {
    use super::*;

    #[test]
    fn parses_milliseconds_and_defaults_missing_fields() {
        let settings = RunSettings::from_toml_str("blocking_timeout_ms = 250").unwrap();
        assert_eq!(settings.blocking_timeout(), Some(Duration::from_millis(250)));
        assert!(!settings.trace_run_loop());
        assert_eq!(RunSettings::from_toml_str("").unwrap(), RunSettings::default());
    }

    #[test]
    fn rejects_zero_timeout_and_unknown_fields() {
        let zero = RunSettings::from_toml_str("blocking_timeout_ms = 0").unwrap_err();
        assert!(matches!(zero, RunSettingsError::Malformed { .. }));
        assert!(zero.to_string().contains("must be > 0"));
        assert!(RunSettings::from_toml_str("retries = 3").is_err());
    }
}
