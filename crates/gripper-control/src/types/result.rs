//! 动作状态与终态结果

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::units::{Meters, Newtons};
use crate::control::GraspVerdict;

/// 目标 ID
///
/// 每次 `submit` 分配一个，单调递增。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GoalId(pub u64);

impl fmt::Display for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 动作状态
///
/// `Idle → Executing → {Succeeded, Failed, Preempted} → Idle`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionState {
    /// 空闲，可接受新命令
    #[default]
    Idle,
    /// 正在执行
    Executing,
    /// 成功结束
    Succeeded,
    /// 失败结束
    Failed,
    /// 被新命令或取消请求抢占
    Preempted,
}

impl ActionState {
    /// 是否为终态
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Preempted)
    }
}

impl fmt::Display for ActionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionState::Idle => "Idle",
            ActionState::Executing => "Executing",
            ActionState::Succeeded => "Succeeded",
            ActionState::Failed => "Failed",
            ActionState::Preempted => "Preempted",
        };
        f.write_str(name)
    }
}

/// 失败原因
///
/// 对只检查布尔值的调用者都表现为 `success = false`，
/// 但保留原因用于诊断。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    /// Move 未到达目标（中途停滞）
    MotionFailure,
    /// Grasp 停止宽度落在容差窗口之外
    GraspMismatch,
    /// 被新命令替代或被显式取消
    Preempted,
    /// 活性保护触发，或遥测在重试后仍不可用
    Timeout,
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureCause::MotionFailure => "motion failure",
            FailureCause::GraspMismatch => "grasp mismatch",
            FailureCause::Preempted => "preempted",
            FailureCause::Timeout => "timeout",
        };
        f.write_str(name)
    }
}

/// 一次运动的结果
///
/// 每条命令恰好产生一个，生成后不再修改。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionOutcome {
    /// 停止宽度（到达目标时为目标宽度，停滞时为最后测量宽度）
    pub stopped_width: Meters,
    /// 运动耗时
    pub elapsed: Duration,
    /// 是否因停滞（接触）结束
    pub stalled: bool,
}

/// 终态结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    /// 是否成功
    pub success: bool,
    /// 终态（Succeeded / Failed / Preempted）
    pub state: ActionState,
    /// 失败原因（成功时为 None）
    pub cause: Option<FailureCause>,
    /// 抓取判定（仅 Grasp 运动结束时存在）
    pub verdict: Option<GraspVerdict>,
    /// 最终宽度
    pub final_width: Meters,
    /// 停止时刻的单指力（两指平均）
    pub final_force_per_finger: Newtons,
    /// 从开始运动到终态的耗时
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
}

impl ActionResult {
    /// 成功结果
    pub fn succeeded(final_width: Meters, force: Newtons, elapsed: Duration) -> Self {
        Self {
            success: true,
            state: ActionState::Succeeded,
            cause: None,
            verdict: None,
            final_width,
            final_force_per_finger: force,
            elapsed,
        }
    }

    /// 失败结果
    ///
    /// `FailureCause::Preempted` 映射到 `ActionState::Preempted`，其他原因映射到 `Failed`。
    pub fn failed(
        cause: FailureCause,
        final_width: Meters,
        force: Newtons,
        elapsed: Duration,
    ) -> Self {
        let state = match cause {
            FailureCause::Preempted => ActionState::Preempted,
            _ => ActionState::Failed,
        };
        Self {
            success: false,
            state,
            cause: Some(cause),
            verdict: None,
            final_width,
            final_force_per_finger: force,
            elapsed,
        }
    }

    /// 附加抓取判定
    pub fn with_verdict(mut self, verdict: GraspVerdict) -> Self {
        self.verdict = Some(verdict);
        self
    }
}

impl fmt::Display for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (width={}, force/finger={}, elapsed={:.3}s",
            self.state,
            self.final_width,
            self.final_force_per_finger,
            self.elapsed.as_secs_f64()
        )?;
        if let Some(cause) = self.cause {
            write!(f, ", cause={}", cause)?;
        }
        if let Some(verdict) = self.verdict {
            write!(f, ", verdict={:?}", verdict)?;
        }
        f.write_str(")")
    }
}

/// 以浮点秒序列化 `Duration`
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
