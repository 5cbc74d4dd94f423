//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use gripper_control::prelude::*;
//! ```

// 服务层（推荐使用）
pub use crate::server::{GoalHandle, GripperObserver, GripperServer};
// 同步状态机（仿真 / 测试）
pub use crate::state::GripperStateMachine;

// 类型系统
pub use crate::types::*;

// 配置
pub use crate::config::{GripperConfig, GripperLimits};

// 硬件抽象
pub use crate::hardware::{ActuatorCommand, GripperHardware, GripperTelemetry};

// 抓取判定
pub use crate::control::GraspVerdict;
