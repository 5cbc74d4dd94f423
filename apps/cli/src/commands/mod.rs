//! 命令定义和实现

pub mod config;
pub mod demo;
pub mod grasp;
pub mod r#move;

pub use config::ConfigCommand;
pub use demo::DemoCommand;
pub use grasp::GraspCommand;
pub use r#move::MoveCommand;

use anyhow::Result;
use gripper_control::types::{ActionResult, GripperCommand};
use serde::Serialize;

/// 单条命令的输出
#[derive(Debug, Serialize)]
struct Report<'a> {
    command: &'a GripperCommand,
    result: &'a ActionResult,
}

/// 打印命令结果
pub fn print_result(command: &GripperCommand, result: &ActionResult, json: bool) -> Result<()> {
    if json {
        let report = Report { command, result };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if result.success {
        println!("✅ {}: {}", command, result);
    } else {
        println!("❌ {}: {}", command, result);
    }
    Ok(())
}
