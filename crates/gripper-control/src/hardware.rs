//! 硬件抽象层
//!
//! 控制核心只通过 [`GripperHardware`] 访问夹爪：每个 tick 读取一次两指的位置和力，
//! 并下发宽度 / 速度 / 力设定值。执行器内部的电流 / 力矩环不在本 crate 范围内。
//!
//! 硬件实例作为独占资源显式传入状态机，不使用全局状态，
//! 因此多个夹爪实例之间没有共享可变状态。

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::{HardwareError, Meters, MetersPerSecond, Newtons};

/// 单指状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FingerState {
    /// 手指相对夹爪中心线的位移（米）
    pub position: Meters,
    /// 测得的力（牛顿）
    pub force: Newtons,
}

/// 两指遥测快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GripperTelemetry {
    pub left: FingerState,
    pub right: FingerState,
}

impl GripperTelemetry {
    /// 由对称的两指状态构造
    pub fn symmetric(position: Meters, force: Newtons) -> Self {
        let finger = FingerState { position, force };
        Self {
            left: finger,
            right: finger,
        }
    }

    /// 总开口宽度
    ///
    /// 两指名义上对称，`total_width = 2 × position`；这里取两指之和，
    /// 对称时二者相等，不对称时等价于用平均位置计算。
    #[inline]
    pub fn width(&self) -> Meters {
        self.left.position + self.right.position
    }

    /// 单指力（两指平均）
    #[inline]
    pub fn force_per_finger(&self) -> Newtons {
        (self.left.force + self.right.force) / 2.0
    }
}

/// 执行器设定值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActuatorCommand {
    /// 总开口宽度设定值
    pub width: Meters,
    /// 总开口变化速率上限
    pub speed: MetersPerSecond,
    /// 接触后施加的总夹持力（由底层力环执行，本核心不复核）
    pub force: Newtons,
}

impl ActuatorCommand {
    /// 在指定宽度保持，不施力
    pub fn hold(width: Meters) -> Self {
        Self {
            width,
            speed: MetersPerSecond::ZERO,
            force: Newtons::ZERO,
        }
    }
}

/// 夹爪硬件接口
///
/// 由物理 / 仿真层实现。`poll` 可能返回过期或带噪声的值，
/// 接触监视器的消抖窗口用于吸收这些噪声。
pub trait GripperHardware: Send {
    /// 读取一次遥测
    ///
    /// 实现必须在 `timeout` 内返回（成功或 `HardwareError::Timeout`）。
    fn poll(&mut self, timeout: Duration) -> Result<GripperTelemetry, HardwareError>;

    /// 下发设定值
    fn command(&mut self, command: &ActuatorCommand) -> Result<(), HardwareError>;
}

impl<H: GripperHardware + ?Sized> GripperHardware for Box<H> {
    fn poll(&mut self, timeout: Duration) -> Result<GripperTelemetry, HardwareError> {
        (**self).poll(timeout)
    }

    fn command(&mut self, command: &ActuatorCommand) -> Result<(), HardwareError> {
        (**self).command(command)
    }
}
