//! Trajectory Estimator - 宽度轨迹估计
//!
//! 两指对称地以指令速度闭合 / 张开。指令速度是**总开口**的变化速率，
//! 因此预计时长为：
//!
//! ```text
//! T = |start − target| / speed
//! ```
//!
//! 设定值序列从起点线性趋向目标，并在目标处饱和（单调收敛）。
//!
//! # 示例
//!
//! ```rust
//! use gripper_control::control::{estimate_duration, WidthTrajectory};
//! use gripper_control::types::{Meters, MetersPerSecond};
//! use std::time::Duration;
//!
//! let t = estimate_duration(Meters(0.08), Meters(0.032), MetersPerSecond(0.1));
//! assert!((t.as_secs_f64() - 0.48).abs() < 1e-9);
//!
//! let trajectory = WidthTrajectory::new(Meters(0.08), Meters(0.0), MetersPerSecond(0.1));
//! for width in trajectory.samples(100.0) {
//!     assert!(width <= Meters(0.08));
//! }
//! ```

use std::time::Duration;

use crate::types::{Meters, MetersPerSecond};

/// 预计运动时长
///
/// 纯函数。速度必须为正（命令校验保证），否则返回 `Duration::MAX`。
pub fn estimate_duration(start: Meters, target: Meters, speed: MetersPerSecond) -> Duration {
    if !(speed.0 > 0.0) {
        return Duration::MAX;
    }
    let seconds = (start - target).abs() / speed;
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
}

/// 宽度轨迹
///
/// 匀速线性插值，到达目标后保持目标值。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidthTrajectory {
    start: Meters,
    target: Meters,
    speed: MetersPerSecond,
    duration: Duration,
}

impl WidthTrajectory {
    /// 创建轨迹
    pub fn new(start: Meters, target: Meters, speed: MetersPerSecond) -> Self {
        Self {
            start,
            target,
            speed,
            duration: estimate_duration(start, target, speed),
        }
    }

    /// 起点宽度
    pub fn start(&self) -> Meters {
        self.start
    }

    /// 目标宽度
    pub fn target(&self) -> Meters {
        self.target
    }

    /// 指令速度
    pub fn speed(&self) -> MetersPerSecond {
        self.speed
    }

    /// 预计时长
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// 是否为闭合方向
    pub fn is_closing(&self) -> bool {
        self.target < self.start
    }

    /// 在 `elapsed` 时刻的宽度设定值
    ///
    /// 速度不是正数时轨迹不会前进，始终返回起点。
    pub fn setpoint_at(&self, elapsed: Duration) -> Meters {
        if !(self.speed.0 > 0.0) {
            return self.start;
        }
        if elapsed >= self.duration {
            return self.target;
        }
        let travelled = self.speed.distance_over(elapsed.as_secs_f64());
        let setpoint = if self.is_closing() {
            self.start - travelled
        } else {
            self.start + travelled
        };
        // 数值误差不能越过目标
        if self.is_closing() {
            setpoint.max(self.target)
        } else {
            setpoint.min(self.target)
        }
    }

    /// 以固定频率采样的设定值序列
    ///
    /// 首个样本为起点，最后一个样本恰为目标。
    /// 永远到达不了目标的轨迹（速度不是正数）只产生起点一个样本；
    /// 样本数在 `usize::MAX` 处饱和。
    ///
    /// # Panics
    ///
    /// `frequency_hz` 不是正数时 panic。
    pub fn samples(&self, frequency_hz: f64) -> WidthSamples {
        assert!(
            frequency_hz > 0.0,
            "frequency_hz must be positive, got: {}",
            frequency_hz
        );
        let total_samples = if self.duration == Duration::MAX {
            1
        } else {
            // f64 → usize 的 `as` 转换是饱和的
            ((self.duration.as_secs_f64() * frequency_hz).ceil() as usize).saturating_add(1)
        };
        WidthSamples {
            trajectory: *self,
            period: Duration::try_from_secs_f64(1.0 / frequency_hz).unwrap_or(Duration::MAX),
            current_index: 0,
            total_samples,
        }
    }
}

/// 轨迹采样迭代器
#[derive(Debug, Clone)]
pub struct WidthSamples {
    trajectory: WidthTrajectory,
    period: Duration,
    current_index: usize,
    total_samples: usize,
}

impl WidthSamples {
    /// 总采样点数
    pub fn total_samples(&self) -> usize {
        self.total_samples
    }

    /// 当前进度（0.0 到 1.0）
    pub fn progress(&self) -> f64 {
        if self.total_samples == 0 {
            1.0
        } else {
            (self.current_index as f64) / (self.total_samples as f64)
        }
    }

    /// 重置迭代器到起点
    pub fn reset(&mut self) {
        self.current_index = 0;
    }
}

impl Iterator for WidthSamples {
    type Item = Meters;

    fn next(&mut self) -> Option<Meters> {
        if self.current_index >= self.total_samples {
            return None;
        }
        let elapsed = if self.current_index + 1 == self.total_samples {
            self.trajectory.duration
        } else {
            Duration::try_from_secs_f64(self.period.as_secs_f64() * self.current_index as f64)
                .unwrap_or(self.trajectory.duration)
        };
        self.current_index += 1;
        Some(self.trajectory.setpoint_at(elapsed))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total_samples - self.current_index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for WidthSamples {}
