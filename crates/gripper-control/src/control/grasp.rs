//! Grasp Evaluator - 抓取判定
//!
//! 目标宽度是对物体尺寸的**假设**，用手指因接触而实际停下的位置来验证：
//!
//! ```text
//!   TooNarrow   |      Matched       |   TooWide
//! ──────────────┼────────────────────┼──────────────▶ stopped_width
//!        target − inner          target + outer
//! ```
//!
//! 判定不看力：指令力为 0 时宽度正确的抓取同样成功。

use serde::{Deserialize, Serialize};

use crate::types::{GraspEpsilon, Meters};

/// 抓取判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraspVerdict {
    /// 停止宽度落在容差窗口内
    Matched,
    /// 比目标窄太多（物体偏小，或根本没有物体）
    TooNarrow,
    /// 比目标宽太多（物体偏大，手指过早停下）
    TooWide,
}

impl GraspVerdict {
    /// 是否成功
    #[inline]
    pub fn is_success(self) -> bool {
        self == GraspVerdict::Matched
    }
}

/// 根据停止宽度判定抓取
///
/// 成功当且仅当 `target − inner ≤ stopped ≤ target + outer`。
pub fn evaluate_grasp(stopped: Meters, target: Meters, epsilon: GraspEpsilon) -> GraspVerdict {
    if stopped < target - epsilon.inner {
        GraspVerdict::TooNarrow
    } else if stopped > target + epsilon.outer {
        GraspVerdict::TooWide
    } else {
        GraspVerdict::Matched
    }
}
