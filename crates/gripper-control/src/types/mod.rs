//! 类型系统
//!
//! 单位、命令、终态结果和错误。

mod command;
mod error;
mod result;
mod units;

pub use command::{GraspEpsilon, GripperCommand};
pub use error::{GripperError, HardwareError, Result};
pub use result::{ActionResult, ActionState, FailureCause, GoalId, MotionOutcome};
pub use units::{Meters, MetersPerSecond, Newtons};
