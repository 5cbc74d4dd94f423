//! 抓取命令

use clap::Args;
use gripper_control::types::{GraspEpsilon, GripperCommand, Meters, MetersPerSecond, Newtons};

/// 抓取命令参数
#[derive(Args, Debug)]
pub struct GraspCommand {
    /// 物体的预期宽度（米）
    #[arg(short, long)]
    pub width: f64,

    /// 闭合速度（米/秒）
    #[arg(short, long, default_value_t = 0.1)]
    pub speed: f64,

    /// 夹持力（牛）
    #[arg(short, long, default_value_t = 5.0)]
    pub force: f64,

    /// 对称容差（米）
    #[arg(short, long, default_value_t = 0.005)]
    pub epsilon: f64,

    /// 内侧容差（米），覆盖 --epsilon
    #[arg(long)]
    pub inner: Option<f64>,

    /// 外侧容差（米），覆盖 --epsilon
    #[arg(long)]
    pub outer: Option<f64>,
}

impl GraspCommand {
    pub fn to_command(&self) -> GripperCommand {
        let epsilon = GraspEpsilon::new(
            Meters(self.inner.unwrap_or(self.epsilon)),
            Meters(self.outer.unwrap_or(self.epsilon)),
        );
        GripperCommand::grasp(
            Meters(self.width),
            MetersPerSecond(self.speed),
            Newtons(self.force),
            epsilon,
        )
    }
}
