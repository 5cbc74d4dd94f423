//! Gripper Control - 两指平行夹爪动作控制核心
//!
//! 接受 Move / Grasp / Homing 命令，驱动执行器沿宽度轨迹运动，
//! 通过停滞检测识别接触，并据停止宽度判定抓取是否成功。
//!
//! # 架构设计
//!
//! 从底层到高层：
//!
//! - **类型层** (`types`): 强类型单位、命令、结果和错误
//! - **硬件层** (`hardware`): 遥测 / 执行器抽象 [`GripperHardware`]
//! - **算法层** (`control`): 轨迹估计、接触检测、抓取判定（纯计算）
//! - **状态机** (`state`): tick 驱动的同步状态机，可确定性测试
//! - **服务层** (`server`): 后台控制线程 + submit / cancel / poll_result
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use gripper_control::prelude::*;
//!
//! # fn example(hardware: impl GripperHardware + 'static) -> Result<()> {
//! let server = GripperServer::start(hardware, GripperConfig::default())?;
//! let handle = server.submit(GripperCommand::homing(MetersPerSecond(0.1)))?;
//! while server.poll_result(&handle)?.is_none() {
//!     std::thread::sleep(std::time::Duration::from_millis(10));
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod control;
pub mod hardware;
pub mod prelude;
pub mod server;
pub mod state;
pub mod types;

pub use config::{ConfigError, GripperConfig, GripperLimits};
pub use control::{GraspVerdict, evaluate_grasp, estimate_duration};
pub use hardware::{ActuatorCommand, FingerState, GripperHardware, GripperTelemetry};
pub use server::{GoalHandle, GripperObserver, GripperServer, GripperSnapshot};
pub use state::{GoalCompletion, GripperStateMachine};
pub use types::{GripperError, HardwareError, Result};
