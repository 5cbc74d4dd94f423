//! 夹爪动作命令
//!
//! `Move` 请求到达一个精确宽度；`Grasp` 以目标宽度作为对物体尺寸的假设，
//! 由手指实际停下的位置来验证；`Homing` 张开到最大宽度。

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::{GripperError, Result};
use super::units::{Meters, MetersPerSecond, Newtons};
use crate::config::GripperLimits;

/// 抓取宽度容差窗口
///
/// - `inner`: 允许比目标更窄的量（物体比预期小）
/// - `outer`: 允许比目标更宽的量（物体比预期大）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraspEpsilon {
    pub inner: Meters,
    pub outer: Meters,
}

impl GraspEpsilon {
    /// 创建非对称容差
    pub fn new(inner: Meters, outer: Meters) -> Self {
        Self { inner, outer }
    }

    /// 创建对称容差
    pub fn symmetric(epsilon: Meters) -> Self {
        Self {
            inner: epsilon,
            outer: epsilon,
        }
    }
}

impl Default for GraspEpsilon {
    fn default() -> Self {
        Self::symmetric(Meters(0.005))
    }
}

/// 夹爪命令
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GripperCommand {
    /// 移动到精确宽度，没有容差窗口
    Move {
        width: Meters,
        speed: MetersPerSecond,
    },

    /// 闭合直到接触物体，再按容差窗口判定成功与否
    Grasp {
        width: Meters,
        speed: MetersPerSecond,
        force: Newtons,
        epsilon: GraspEpsilon,
    },

    /// 张开到最大宽度
    Homing { speed: MetersPerSecond },
}

impl GripperCommand {
    /// 创建 Move 命令
    pub fn move_to(width: Meters, speed: MetersPerSecond) -> Self {
        GripperCommand::Move { width, speed }
    }

    /// 创建 Grasp 命令
    pub fn grasp(
        width: Meters,
        speed: MetersPerSecond,
        force: Newtons,
        epsilon: GraspEpsilon,
    ) -> Self {
        GripperCommand::Grasp {
            width,
            speed,
            force,
            epsilon,
        }
    }

    /// 创建 Homing 命令
    pub fn homing(speed: MetersPerSecond) -> Self {
        GripperCommand::Homing { speed }
    }

    /// 命令名称（用于日志）
    pub fn kind(&self) -> &'static str {
        match self {
            GripperCommand::Move { .. } => "move",
            GripperCommand::Grasp { .. } => "grasp",
            GripperCommand::Homing { .. } => "homing",
        }
    }

    /// 命令速度
    pub fn speed(&self) -> MetersPerSecond {
        match *self {
            GripperCommand::Move { speed, .. }
            | GripperCommand::Grasp { speed, .. }
            | GripperCommand::Homing { speed } => speed,
        }
    }

    /// 参数校验
    ///
    /// 非法命令在 `submit` 时同步拒绝，永远不会进入 Executing。
    ///
    /// # 错误
    ///
    /// - `GripperError::InvalidParameter`: 宽度为负或超出行程、速度非正或超限、
    ///   力为负或超限、容差为负、任意值非有限
    pub fn validate(&self, limits: &GripperLimits) -> Result<()> {
        check_speed(self.speed(), limits)?;

        match *self {
            GripperCommand::Move { width, .. } => check_width("width", width, limits),
            GripperCommand::Grasp {
                width,
                force,
                epsilon,
                ..
            } => {
                check_width("width", width, limits)?;
                check_non_negative("epsilon.inner", epsilon.inner.0)?;
                check_non_negative("epsilon.outer", epsilon.outer.0)?;
                check_non_negative("force", force.0)?;
                if force > limits.max_force {
                    return Err(GripperError::invalid_parameter(
                        "force",
                        format!("{} exceeds limit {}", force, limits.max_force),
                    ));
                }
                Ok(())
            },
            GripperCommand::Homing { .. } => Ok(()),
        }
    }
}

impl fmt::Display for GripperCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GripperCommand::Move { width, speed } => {
                write!(f, "Move(width={}, speed={})", width, speed)
            },
            GripperCommand::Grasp {
                width,
                speed,
                force,
                epsilon,
            } => write!(
                f,
                "Grasp(width={}, speed={}, force={}, epsilon=[-{}, +{}])",
                width, speed, force, epsilon.inner, epsilon.outer
            ),
            GripperCommand::Homing { speed } => write!(f, "Homing(speed={})", speed),
        }
    }
}

fn check_non_negative(param: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(GripperError::invalid_parameter(param, "must be finite"));
    }
    if value < 0.0 {
        return Err(GripperError::invalid_parameter(
            param,
            format!("must be >= 0, got {}", value),
        ));
    }
    Ok(())
}

fn check_width(param: &str, width: Meters, limits: &GripperLimits) -> Result<()> {
    check_non_negative(param, width.0)?;
    if width < limits.min_width || width > limits.max_width {
        return Err(GripperError::invalid_parameter(
            param,
            format!(
                "{} outside travel range [{}, {}]",
                width, limits.min_width, limits.max_width
            ),
        ));
    }
    Ok(())
}

fn check_speed(speed: MetersPerSecond, limits: &GripperLimits) -> Result<()> {
    if !speed.is_finite() || speed.0 <= 0.0 {
        return Err(GripperError::invalid_parameter(
            "speed",
            format!("must be > 0, got {}", speed.0),
        ));
    }
    if speed > limits.max_speed {
        return Err(GripperError::invalid_parameter(
            "speed",
            format!("{} exceeds limit {}", speed, limits.max_speed),
        ));
    }
    Ok(())
}
