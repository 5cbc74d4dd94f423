//! 控制算法
//!
//! - [`trajectory`]: 运动时长估计与宽度设定值序列
//! - [`contact`]: 停滞（接触）检测
//! - [`grasp`]: 抓取容差窗口判定
//!
//! 三者都是无副作用的纯计算，由 [`crate::state`] 中的状态机编排。

pub mod contact;
pub mod grasp;
pub mod trajectory;

pub use contact::{ContactEvent, ContactMonitor};
pub use grasp::{GraspVerdict, evaluate_grasp};
pub use trajectory::{WidthSamples, WidthTrajectory, estimate_duration};
