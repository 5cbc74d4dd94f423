//! Contact Monitor - 接触（停滞）检测
//!
//! 运动期间每个 tick 输入一次测得宽度：
//!
//! - 与目标之差 ≤ `goal_tolerance` → [`ContactEvent::TargetReached`]
//! - 宽度相对锚点的变化 ≤ `noise_tolerance` 并持续超过消抖窗口 →
//!   [`ContactEvent::Stalled`]（解释为接触到物体）
//! - 否则 → [`ContactEvent::Moving`]
//!
//! # 锚点机制
//!
//! 不比较相邻两帧，而是比较"上次明显移动时"的宽度（锚点）。
//! 慢速运动时单帧位移可能小于噪声容差，但在整个窗口内的累计位移不会。
//! 为保证这一点，有效窗口取 `max(debounce_window, 2 × noise_tolerance / speed)`。

use std::time::Duration;

use crate::config::ContactConfig;
use crate::types::{Meters, MetersPerSecond};

/// 单个 tick 的检测结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactEvent {
    /// 仍在运动
    Moving,
    /// 已到达目标
    TargetReached,
    /// 在到达目标前停滞
    Stalled {
        /// 最后测得的宽度
        width: Meters,
        /// 判定前已静止的时长（至少为有效窗口）
        still_for: Duration,
    },
}

/// 接触监视器
#[derive(Debug, Clone)]
pub struct ContactMonitor {
    target: Meters,
    noise_tolerance: Meters,
    goal_tolerance: Meters,
    window: Duration,
    anchor: Option<Meters>,
    still_for: Duration,
    last_width: Option<Meters>,
}

impl ContactMonitor {
    /// 为一次运动创建监视器
    pub fn new(target: Meters, speed: MetersPerSecond, config: &ContactConfig) -> Self {
        Self {
            target,
            noise_tolerance: config.noise_tolerance,
            goal_tolerance: config.goal_tolerance,
            window: Self::effective_window(speed, config),
            anchor: None,
            still_for: Duration::ZERO,
            last_width: None,
        }
    }

    /// 有效消抖窗口
    ///
    /// 保证窗口内以指令速度走过的距离至少是噪声容差的两倍。
    pub fn effective_window(speed: MetersPerSecond, config: &ContactConfig) -> Duration {
        let debounce = config.debounce_window();
        if !(speed.0 > 0.0) {
            return debounce;
        }
        let min_window = 2.0 * config.noise_tolerance.0 / speed.0;
        match Duration::try_from_secs_f64(min_window) {
            Ok(min_window) => debounce.max(min_window),
            Err(_) => debounce,
        }
    }

    /// 目标宽度
    pub fn target(&self) -> Meters {
        self.target
    }

    /// 有效窗口
    pub fn window(&self) -> Duration {
        self.window
    }

    /// 宽度保持在锚点噪声带内的累计时长
    pub fn still_for(&self) -> Duration {
        self.still_for
    }

    /// 最后一次测得的宽度
    pub fn last_width(&self) -> Option<Meters> {
        self.last_width
    }

    /// 是否已在目标容差内
    pub fn is_at_target(&self, width: Meters) -> bool {
        (width - self.target).abs() <= self.goal_tolerance
    }

    /// 输入一个测量值
    ///
    /// `dt` 为距上次调用的控制时间。
    pub fn observe(&mut self, width: Meters, dt: Duration) -> ContactEvent {
        self.last_width = Some(width);

        if self.is_at_target(width) {
            return ContactEvent::TargetReached;
        }

        let Some(anchor) = self.anchor else {
            self.anchor = Some(width);
            self.still_for = Duration::ZERO;
            return ContactEvent::Moving;
        };

        if (width - anchor).abs() > self.noise_tolerance {
            self.anchor = Some(width);
            self.still_for = Duration::ZERO;
            return ContactEvent::Moving;
        }

        self.still_for += dt;
        if self.still_for >= self.window {
            ContactEvent::Stalled {
                width,
                still_for: self.still_for,
            }
        } else {
            ContactEvent::Moving
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: Duration = Duration::from_millis(2);

    fn config() -> ContactConfig {
        ContactConfig::default()
    }

    #[test]
    fn test_effective_window_floor_for_slow_speed() {
        let cfg = config();
        // 0.1 m/s: 2 × 5e-5 / 0.1 = 1ms < 50ms
        assert_eq!(
            ContactMonitor::effective_window(MetersPerSecond(0.1), &cfg),
            Duration::from_millis(50)
        );
        // 0.001 m/s: 2 × 5e-5 / 0.001 = 100ms
        let slow = ContactMonitor::effective_window(MetersPerSecond(0.001), &cfg);
        assert!((slow.as_secs_f64() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_target_reached() {
        let mut monitor = ContactMonitor::new(Meters(0.04), MetersPerSecond(0.1), &config());
        assert_eq!(monitor.observe(Meters(0.05), DT), ContactEvent::Moving);
        assert_eq!(monitor.observe(Meters(0.0402), DT), ContactEvent::TargetReached);
    }

    #[test]
    fn test_stall_after_debounce_window() {
        let mut monitor = ContactMonitor::new(Meters(0.0), MetersPerSecond(0.1), &config());
        // 0.08 → 0.0322，每 tick 0.2mm
        for i in 0..240 {
            let width = 0.08 - i as f64 * 0.0002;
            assert_eq!(monitor.observe(Meters(width), DT), ContactEvent::Moving);
        }

        // 停在 0.032，窗口 50ms / 2ms = 25 个 tick
        let mut ticks = 0;
        let event = loop {
            ticks += 1;
            match monitor.observe(Meters(0.032), DT) {
                ContactEvent::Moving => continue,
                other => break other,
            }
        };
        match event {
            ContactEvent::Stalled { width, still_for } => {
                assert_eq!(width, Meters(0.032));
                // 停在 0.032 的第一帧刷新锚点，之后 25 帧计入静止时长
                assert_eq!(still_for, DT * 25);
            },
            other => panic!("expected stall, got {:?}", other),
        }
        assert_eq!(ticks, 26);
    }

    #[test]
    fn test_noise_below_tolerance_still_stalls() {
        let mut monitor = ContactMonitor::new(Meters(0.0), MetersPerSecond(0.1), &config());
        let mut stalled = false;
        for i in 0..100 {
            let jitter = if i % 2 == 0 { 2e-5 } else { -2e-5 };
            if let ContactEvent::Stalled { .. } = monitor.observe(Meters(0.032 + jitter), DT) {
                stalled = true;
                break;
            }
        }
        assert!(stalled);
    }

    #[test]
    fn test_slow_motion_is_not_a_stall() {
        // 0.01 m/s @ 2ms：单帧 2e-5 m < 噪声容差 5e-5 m，但累计位移会刷新锚点
        let mut monitor = ContactMonitor::new(Meters(0.0), MetersPerSecond(0.01), &config());
        let mut width = 0.08;
        for _ in 0..1000 {
            assert_eq!(monitor.observe(Meters(width), DT), ContactEvent::Moving);
            width -= 0.01 * DT.as_secs_f64();
        }
    }

    #[test]
    fn test_target_check_precedes_stall() {
        let mut monitor = ContactMonitor::new(Meters(0.04), MetersPerSecond(0.1), &config());
        for _ in 0..100 {
            assert_eq!(monitor.observe(Meters(0.04), DT), ContactEvent::TargetReached);
        }
        assert_eq!(monitor.last_width(), Some(Meters(0.04)));
    }
}
