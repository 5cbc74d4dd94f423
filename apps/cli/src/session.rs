//! 仿真会话
//!
//! 每次 CLI 调用启动一个仿真夹爪和一个动作服务，命令执行完毕后关闭。
//! 调用之间不保留任何状态。

use anyhow::{Context, Result};
use clap::Args;
use gripper_control::prelude::*;
use gripper_control::server::GripperSnapshot;
use gripper_sim::{SimConfig, SimHandle, SimulatedGripper};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// 结果轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// 仿真参数
#[derive(Args, Debug, Clone)]
pub struct SimArgs {
    /// 在手指间放置一个宽度为 W 米的刚性物体
    #[arg(long, global = true, value_name = "W")]
    pub object_width: Option<f64>,

    /// 初始开口宽度（米），默认为最大开口
    #[arg(long, global = true, value_name = "W")]
    pub initial_width: Option<f64>,

    /// 手指最大速度（米/秒）
    #[arg(long, global = true, default_value_t = 0.2)]
    pub sim_max_speed: f64,

    /// 每指位置噪声幅值（米）
    #[arg(long, global = true, default_value_t = 0.0)]
    pub noise: f64,
}

impl SimArgs {
    fn to_sim_config(&self, limits: &GripperLimits) -> SimConfig {
        SimConfig {
            max_width: limits.max_width,
            initial_width: self.initial_width.map(Meters).unwrap_or(limits.max_width),
            max_speed: MetersPerSecond(self.sim_max_speed),
            obstruction: self.object_width.map(Meters),
            position_noise: Meters(self.noise),
            ..SimConfig::default()
        }
    }
}

/// 仿真会话
pub struct Session {
    server: GripperServer,
    sim: SimHandle,
    interrupted: Arc<AtomicBool>,
}

impl Session {
    /// 启动仿真夹爪和动作服务
    pub fn open(config: GripperConfig, sim_args: &SimArgs, interrupted: Arc<AtomicBool>) -> Result<Self> {
        let sim_config = sim_args.to_sim_config(&config.limits);
        info!(
            "Starting simulated gripper (object: {:?}, max speed: {})",
            sim_config.obstruction, sim_config.max_speed
        );

        let gripper = SimulatedGripper::new(sim_config);
        let sim = gripper.handle();
        let server = GripperServer::start(gripper, config).context("启动夹爪服务失败")?;

        Ok(Self {
            server,
            sim,
            interrupted,
        })
    }

    /// 提交命令并等待结果
    ///
    /// 收到 Ctrl+C 时取消命令，仍然等待其终态（Preempted）。
    pub fn execute(&self, command: GripperCommand) -> Result<ActionResult> {
        let handle = self
            .server
            .submit(command)
            .with_context(|| format!("命令被拒绝: {}", command))?;

        let mut cancelled = false;
        loop {
            if let Some(result) = self.server.wait_for_result(&handle, POLL_INTERVAL)? {
                return Ok(result);
            }
            if !cancelled && self.is_interrupted() {
                warn!(goal = %handle.id(), "Interrupted, cancelling {}", command);
                self.server.cancel(&handle)?;
                cancelled = true;
            }
        }
    }

    /// 是否收到中断信号
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// 等待至少一个 tick 后读取快照
    pub fn snapshot(&self) -> GripperSnapshot {
        let observer = self.server.observer();
        let start = observer.snapshot().ticks;
        for _ in 0..20 {
            std::thread::sleep(Duration::from_millis(5));
            if observer.snapshot().ticks > start {
                break;
            }
        }
        observer.snapshot()
    }

    /// 手指是否压在仿真物体上
    pub fn in_contact(&self) -> bool {
        self.sim.is_blocked()
    }

    /// 关闭服务
    pub fn close(self) {
        self.server.shutdown();
    }
}
