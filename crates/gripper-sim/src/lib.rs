//! Gripper Sim - 仿真夹爪
//!
//! 为 `gripper-control` 提供可确定性运行的硬件实现：
//!
//! - [`SimClock::Lockstep`]: 与状态机 tick 对齐的固定步长，用于确定性测试
//! - [`SimClock::RealTime`]: 墙上时钟，配合 `GripperServer` 的控制线程使用
//!
//! ```rust
//! use gripper_control::prelude::*;
//! use gripper_sim::{SimConfig, SimulatedGripper};
//! use std::time::Duration;
//!
//! let dt = Duration::from_millis(2);
//! let sim = SimulatedGripper::new(SimConfig::lockstep(dt).with_obstruction(Meters(0.032)));
//! let mut machine = GripperStateMachine::new(sim, GripperConfig::default()).unwrap();
//!
//! let result = machine
//!     .run_to_completion(
//!         GoalId(1),
//!         GripperCommand::grasp(Meters(0.032), MetersPerSecond(0.1), Newtons(5.0), GraspEpsilon::default()),
//!         dt,
//!     )
//!     .unwrap();
//! assert!(result.success);
//! ```

mod gripper;

pub use gripper::{SimClock, SimConfig, SimHandle, SimulatedGripper};
