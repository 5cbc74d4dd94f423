//! # 夹爪配置
//!
//! 控制频率、接触检测、超时、遥测重试和行程限制。
//!
//! 配置文件为 TOML，所有字段都有默认值，缺省的表或字段使用默认值：
//!
//! ```toml
//! [control]
//! frequency_hz = 500.0
//!
//! [contact]
//! noise_tolerance = 5e-5
//! debounce_window_ms = 50
//!
//! [limits]
//! max_width = 0.08
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::types::{Meters, MetersPerSecond, Newtons};

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读写文件失败
    #[error("Config file I/O error: {0}")]
    Io(#[from] io::Error),

    /// TOML 解析失败
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML 序列化失败
    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// 配置值无效
    #[error("Invalid config value '{param}': {reason}")]
    Invalid {
        /// 参数名
        param: &'static str,
        /// 原因
        reason: String,
    },
}

/// 控制循环配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// 控制频率（Hz）
    pub frequency_hz: f64,

    /// dt 钳位倍数
    ///
    /// 实际 dt 超过标称周期的此倍数时会被钳位，避免线程被调度延迟后
    /// 运动监视器一次"跳过"整个消抖窗口。
    pub dt_clamp_multiplier: f64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 500.0,
            dt_clamp_multiplier: 2.0,
        }
    }
}

impl ControlConfig {
    /// 标称控制周期
    pub fn period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frequency_hz)
    }

    /// 最大 dt
    pub fn max_dt(&self) -> Duration {
        self.period().mul_f64(self.dt_clamp_multiplier)
    }
}

/// 接触（停滞）检测配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    /// 宽度噪声容差（米）：变化不超过该值视为"没动"
    pub noise_tolerance: Meters,

    /// 消抖窗口（毫秒）：持续不动超过该时长才判定为停滞
    pub debounce_window_ms: u64,

    /// 到位容差（米）：与目标宽度之差不超过该值视为到达
    pub goal_tolerance: Meters,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            noise_tolerance: Meters(5e-5),
            debounce_window_ms: 50,
            goal_tolerance: Meters(5e-4),
        }
    }
}

impl ContactConfig {
    /// 消抖窗口
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_window_ms)
    }
}

/// 活性超时配置
///
/// 截止时间 = 预计时长 × `duration_factor` + `margin_ms`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub duration_factor: f64,
    pub margin_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            duration_factor: 2.0,
            margin_ms: 1000,
        }
    }
}

impl TimeoutConfig {
    /// 根据预计时长计算截止时间
    pub fn deadline_for(&self, expected: Duration) -> Duration {
        expected.mul_f64(self.duration_factor) + Duration::from_millis(self.margin_ms)
    }
}

/// 遥测读取配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// 单个 tick 内的重试次数（不含首次读取）
    pub retries: u32,

    /// 单次读取超时（毫秒）
    pub poll_timeout_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            poll_timeout_ms: 5,
        }
    }
}

impl TelemetryConfig {
    /// 单次读取超时
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }
}

/// 行程和命令限制
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GripperLimits {
    /// 最小宽度（完全闭合）
    pub min_width: Meters,
    /// 最大宽度（完全张开）
    pub max_width: Meters,
    /// 最大闭合速度
    pub max_speed: MetersPerSecond,
    /// 最大抓取力
    pub max_force: Newtons,
}

impl Default for GripperLimits {
    fn default() -> Self {
        Self {
            min_width: Meters(0.0),
            max_width: Meters(0.08),
            max_speed: MetersPerSecond(0.2),
            max_force: Newtons(140.0),
        }
    }
}

/// 夹爪完整配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GripperConfig {
    pub control: ControlConfig,
    pub contact: ContactConfig,
    pub timeout: TimeoutConfig,
    pub telemetry: TelemetryConfig,
    pub limits: GripperLimits,
}

impl GripperConfig {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: GripperConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 序列化为 TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(param: &'static str, reason: String) -> ConfigError {
            ConfigError::Invalid { param, reason }
        }

        let control = &self.control;
        if !(control.frequency_hz > 0.0 && control.frequency_hz.is_finite()) {
            return Err(invalid(
                "control.frequency_hz",
                format!("must be > 0, got {}", control.frequency_hz),
            ));
        }
        if control.frequency_hz > 10000.0 {
            tracing::warn!(
                "Very high control frequency: {} Hz. This may cause performance issues.",
                control.frequency_hz
            );
        }
        if !(control.dt_clamp_multiplier >= 1.0) {
            return Err(invalid(
                "control.dt_clamp_multiplier",
                format!("must be >= 1, got {}", control.dt_clamp_multiplier),
            ));
        }

        let contact = &self.contact;
        if !(contact.noise_tolerance.0 > 0.0) {
            return Err(invalid(
                "contact.noise_tolerance",
                format!("must be > 0, got {}", contact.noise_tolerance.0),
            ));
        }
        if !(contact.goal_tolerance.0 > 0.0) {
            return Err(invalid(
                "contact.goal_tolerance",
                format!("must be > 0, got {}", contact.goal_tolerance.0),
            ));
        }
        if contact.debounce_window_ms == 0 {
            return Err(invalid("contact.debounce_window_ms", "must be > 0".to_string()));
        }

        if !(self.timeout.duration_factor >= 1.0) {
            return Err(invalid(
                "timeout.duration_factor",
                format!("must be >= 1, got {}", self.timeout.duration_factor),
            ));
        }

        let limits = &self.limits;
        if !(limits.min_width.0 >= 0.0 && limits.max_width > limits.min_width) {
            return Err(invalid(
                "limits.max_width",
                format!(
                    "travel range [{}, {}] is empty or negative",
                    limits.min_width, limits.max_width
                ),
            ));
        }
        if !(limits.max_speed.0 > 0.0) {
            return Err(invalid(
                "limits.max_speed",
                format!("must be > 0, got {}", limits.max_speed.0),
            ));
        }
        if !(limits.max_force.0 >= 0.0) {
            return Err(invalid(
                "limits.max_force",
                format!("must be >= 0, got {}", limits.max_force.0),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GripperConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.control.period(), Duration::from_millis(2));
        assert_eq!(config.control.max_dt(), Duration::from_millis(4));
        assert_eq!(config.contact.debounce_window(), Duration::from_millis(50));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = GripperConfig::from_toml_str(
            r#"
            [contact]
            debounce_window_ms = 80

            [limits]
            max_width = 0.1
            "#,
        )
        .unwrap();

        assert_eq!(config.contact.debounce_window_ms, 80);
        assert_eq!(config.contact.noise_tolerance, Meters(5e-5));
        assert_eq!(config.limits.max_width, Meters(0.1));
        assert_eq!(config.control, ControlConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = GripperConfig::from_toml_str("[control]\nfrequency_hz = 0.0").unwrap_err();
        assert!(format!("{}", err).contains("control.frequency_hz"));

        let err = GripperConfig::from_toml_str("[limits]\nmax_width = -1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = GripperConfig::from_toml_str("[contact]\ndebounce_window_ms = 0").unwrap_err();
        assert!(format!("{}", err).contains("debounce_window_ms"));
    }

    #[test]
    fn test_parse_error() {
        let err = GripperConfig::from_toml_str("[control\nfrequency_hz = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_deadline() {
        let timeout = TimeoutConfig {
            duration_factor: 2.0,
            margin_ms: 100,
        };
        assert_eq!(
            timeout.deadline_for(Duration::from_millis(480)),
            Duration::from_millis(1060)
        );
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gripper.toml");

        let mut config = GripperConfig::default();
        config.telemetry.retries = 5;
        config.save_to_file(&path).unwrap();

        let loaded = GripperConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
