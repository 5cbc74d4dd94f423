//! # Gripper CLI
//!
//! 驱动仿真两指夹爪的命令行工具。
//!
//! ```bash
//! # 写入默认配置
//! gripper-cli config init
//!
//! # 在 32mm 物体上抓取
//! gripper-cli --object-width 0.032 grasp --width 0.032 --force 5
//!
//! # 完整演示（Move 失败 / 成功 + 抓取表）
//! gripper-cli demo --json
//! ```
//!
//! 日志级别由 `RUST_LOG` 控制，例如 `RUST_LOG=gripper_control=debug`。

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gripper_control::types::{GripperCommand, MetersPerSecond};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

mod commands;
mod session;

use commands::{ConfigCommand, DemoCommand, GraspCommand, MoveCommand, print_result};
use session::{Session, SimArgs};

/// Gripper CLI - 夹爪命令行工具
#[derive(Parser, Debug)]
#[command(name = "gripper-cli")]
#[command(about = "Command-line interface for a simulated two-finger gripper", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认 <config_dir>/gripper/config.toml）
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// 以 JSON 输出结果
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    sim: SimArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 配置管理
    #[command(subcommand)]
    Config(ConfigCommand),

    /// 移动到目标开口宽度
    Move {
        #[command(flatten)]
        args: MoveCommand,
    },

    /// 抓取物体
    Grasp {
        #[command(flatten)]
        args: GraspCommand,
    },

    /// 完全张开
    Homing {
        /// 速度（米/秒）
        #[arg(short, long, default_value_t = 0.1)]
        speed: f64,
    },

    /// 显示新建仿真的初始状态
    ///
    /// 每次调用都会启动一个新的仿真夹爪，因此只反映 `--initial-width` /
    /// `--object-width` 配置的初始状态（Idle），不保留之前命令的结果。
    State,

    /// 运行演示序列
    Demo {
        #[command(flatten)]
        args: DemoCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gripper_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    if let Commands::Config(cmd) = cli.command {
        return cmd.execute(cli.config.as_deref());
    }

    let config = commands::config::load_config(cli.config.as_deref())?;
    let limits = config.limits.clone();

    // Ctrl+C 取消正在执行的命令
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        eprintln!("\n收到中断信号，正在取消...");
    })
    .context("设置 Ctrl+C 处理失败")?;

    let mut sim = cli.sim.clone();
    if matches!(cli.command, Commands::Demo { .. }) && sim.object_width.is_none() {
        sim.object_width = Some(commands::demo::DEFAULT_OBJECT_WIDTH);
    }
    let session = Session::open(config, &sim, interrupted)?;

    let outcome = match cli.command {
        Commands::Move { args } => run_one(&session, args.to_command(), cli.json),
        Commands::Grasp { args } => run_one(&session, args.to_command(), cli.json),
        Commands::Homing { speed } => {
            run_one(&session, GripperCommand::homing(MetersPerSecond(speed)), cli.json)
        },
        Commands::State => print_state(&session, cli.json).map(|_| true),
        Commands::Demo { args } => {
            let object_width = sim
                .object_width
                .unwrap_or(commands::demo::DEFAULT_OBJECT_WIDTH);
            args.execute(&session, object_width, &limits, cli.json)
                .map(|_| true)
        },
        Commands::Config(_) => Ok(true),
    };

    session.close();
    if !outcome? {
        std::process::exit(1);
    }
    Ok(())
}

/// 执行单条命令，返回是否成功
fn run_one(session: &Session, command: GripperCommand, json: bool) -> Result<bool> {
    let result = session.execute(command)?;
    print_result(&command, &result, json)?;
    Ok(result.success)
}

fn print_state(session: &Session, json: bool) -> Result<()> {
    let snapshot = session.snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("(新建仿真的初始状态，不包含之前调用的结果)");
    println!("状态: {}", snapshot.state);
    match snapshot.telemetry {
        Some(t) => {
            println!("开口: {}", t.width());
            println!("左指: {} / {}", t.left.position, t.left.force);
            println!("右指: {} / {}", t.right.position, t.right.force);
        },
        None => println!("开口: (无遥测)"),
    }
    println!("持有物体: {}", if snapshot.is_grasped { "是" } else { "否" });
    println!("接触: {}", if session.in_contact() { "是" } else { "否" });
    Ok(())
}
