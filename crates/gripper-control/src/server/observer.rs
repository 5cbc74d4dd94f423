//! Observer - 夹爪状态观察器
//!
//! 控制线程每个 tick 发布一次快照，观察者通过 `ArcSwap` 无锁读取，
//! 不会阻塞控制循环。
//!
//! ```rust,no_run
//! # use gripper_control::server::GripperObserver;
//! # fn example(observer: GripperObserver) {
//! let observer2 = observer.clone();
//! std::thread::spawn(move || {
//!     if let Some(width) = observer2.width() {
//!         println!("width: {}", width);
//!     }
//! });
//! # }
//! ```

use arc_swap::ArcSwap;
use serde::Serialize;
use std::sync::Arc;

use crate::hardware::GripperTelemetry;
use crate::types::{ActionState, GoalId, Meters, Newtons};

/// 夹爪状态快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GripperSnapshot {
    /// 最近一次成功读取的遥测
    pub telemetry: Option<GripperTelemetry>,
    /// 动作状态
    pub state: ActionState,
    /// 是否持有物体
    pub is_grasped: bool,
    /// 正在执行的目标
    pub active_goal: Option<GoalId>,
    /// 控制循环已执行的 tick 数
    pub ticks: u64,
}

/// 状态观察器（只读）
#[derive(Clone)]
pub struct GripperObserver {
    snapshot: Arc<ArcSwap<GripperSnapshot>>,
}

impl GripperObserver {
    pub(crate) fn new(snapshot: Arc<ArcSwap<GripperSnapshot>>) -> Self {
        Self { snapshot }
    }

    /// 完整快照
    pub fn snapshot(&self) -> GripperSnapshot {
        **self.snapshot.load()
    }

    /// 动作状态
    pub fn state(&self) -> ActionState {
        self.snapshot.load().state
    }

    /// 当前开口宽度
    pub fn width(&self) -> Option<Meters> {
        self.snapshot.load().telemetry.map(|t| t.width())
    }

    /// 单指平均力
    pub fn force_per_finger(&self) -> Option<Newtons> {
        self.snapshot.load().telemetry.map(|t| t.force_per_finger())
    }

    /// 是否持有物体
    pub fn is_grasped(&self) -> bool {
        self.snapshot.load().is_grasped
    }

    /// 正在执行的目标
    pub fn active_goal(&self) -> Option<GoalId> {
        self.snapshot.load().active_goal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observer_reads_published_snapshot() {
        let shared = Arc::new(ArcSwap::from_pointee(GripperSnapshot::default()));
        let observer = GripperObserver::new(shared.clone());
        assert_eq!(observer.state(), ActionState::Idle);
        assert!(observer.width().is_none());

        shared.store(Arc::new(GripperSnapshot {
            telemetry: Some(GripperTelemetry::symmetric(Meters(0.02), Newtons(3.0))),
            state: ActionState::Executing,
            is_grasped: false,
            active_goal: Some(GoalId(7)),
            ticks: 10,
        }));

        let clone = observer.clone();
        assert_eq!(clone.width(), Some(Meters(0.04)));
        assert_eq!(clone.force_per_finger(), Some(Newtons(3.0)));
        assert_eq!(clone.active_goal(), Some(GoalId(7)));
        assert_eq!(observer.snapshot().ticks, 10);
    }
}
