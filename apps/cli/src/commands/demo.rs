//! 演示命令
//!
//! 在仿真中放置一个物体（默认 32mm 石块），依次执行：
//!
//! 1. Move 到 0（被物体挡住，应失败）
//! 2. Move 到最大开口（应成功）
//! 3. 抓取表：每次抓取前先张开，按目标宽度与物体宽度之差判定预期结果

use anyhow::Result;
use clap::Args;
use gripper_control::control::evaluate_grasp;
use gripper_control::prelude::*;
use serde::Serialize;

use crate::session::Session;

/// 默认物体宽度
pub const DEFAULT_OBJECT_WIDTH: f64 = 0.032;

/// 抓取容差
const EPSILON: f64 = 0.005;

/// 演示命令参数
#[derive(Args, Debug)]
pub struct DemoCommand {
    /// 跳过慢速（0.01 m/s）抓取
    #[arg(long)]
    pub fast: bool,
}

/// 演示中的一步
#[derive(Debug, Serialize)]
struct DemoStep {
    command: GripperCommand,
    expected_success: bool,
    result: ActionResult,
}

impl DemoStep {
    fn as_expected(&self) -> bool {
        self.result.success == self.expected_success
    }
}

/// (目标宽度相对物体的偏移, 速度, 力)
const GRASP_TABLE: [(f64, f64, f64); 6] = [
    (0.0, 0.1, 0.0),
    (-0.002, 0.1, 5.0),
    (-0.002, 0.01, 0.0),
    (0.002, 0.01, 5.0),
    (0.008, 0.1, 0.0),
    (-0.012, 0.1, 2.0),
];

impl DemoCommand {
    pub fn execute(&self, session: &Session, object_width: f64, limits: &GripperLimits, json: bool) -> Result<()> {
        let open = GripperCommand::move_to(limits.max_width, MetersPerSecond(0.1));
        let mut steps = Vec::new();

        let mut plan = vec![
            (GripperCommand::move_to(limits.min_width, MetersPerSecond(0.1)), false),
            (open, true),
        ];
        for &(offset, speed, force) in &GRASP_TABLE {
            if self.fast && speed < 0.05 {
                continue;
            }
            let target = Meters(object_width + offset);
            let epsilon = GraspEpsilon::symmetric(Meters(EPSILON));
            let expected = evaluate_grasp(Meters(object_width), target, epsilon).is_success();
            plan.push((
                GripperCommand::grasp(target, MetersPerSecond(speed), Newtons(force), epsilon),
                expected,
            ));
            plan.push((open, true));
        }

        for (command, expected_success) in plan {
            if session.is_interrupted() {
                anyhow::bail!("演示被中断");
            }
            let result = session.execute(command)?;
            let step = DemoStep {
                command,
                expected_success,
                result,
            };
            if !json {
                let mark = if step.as_expected() { "✅" } else { "⚠️" };
                println!("{} {} → {}", mark, step.command, step.result);
            }
            steps.push(step);
        }

        if json {
            println!("{}", serde_json::to_string_pretty(&steps)?);
        }

        let unexpected = steps.iter().filter(|s| !s.as_expected()).count();
        if unexpected > 0 {
            anyhow::bail!("{} 个步骤的结果与预期不符", unexpected);
        }
        if !json {
            println!("全部 {} 个步骤符合预期", steps.len());
        }
        Ok(())
    }
}
