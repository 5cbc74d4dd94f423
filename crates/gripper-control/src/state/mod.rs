//! 动作状态机
//!
//! [`GripperStateMachine`] 是同步的、由 tick 驱动的核心；
//! [`crate::server`] 在其外包一层控制线程和命令队列。

pub mod machine;

pub use machine::{GoalCompletion, GripperStateMachine};
