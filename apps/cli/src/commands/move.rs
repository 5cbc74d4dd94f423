//! 移动命令

use clap::Args;
use gripper_control::types::{GripperCommand, Meters, MetersPerSecond};

/// 移动命令参数
#[derive(Args, Debug)]
pub struct MoveCommand {
    /// 目标开口宽度（米）
    #[arg(short, long)]
    pub width: f64,

    /// 速度（米/秒，总开口变化率）
    #[arg(short, long, default_value_t = 0.1)]
    pub speed: f64,
}

impl MoveCommand {
    pub fn to_command(&self) -> GripperCommand {
        GripperCommand::move_to(Meters(self.width), MetersPerSecond(self.speed))
    }
}
