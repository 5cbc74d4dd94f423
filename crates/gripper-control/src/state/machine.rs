//! Gripper Action State Machine - 夹爪动作状态机
//!
//! 以 tick 驱动的同步状态机，编排轨迹估计、接触检测和抓取判定。
//! 不持有线程、不读取时钟：调用者每个控制周期调用一次 [`GripperStateMachine::tick`]
//! 并传入该周期的 dt，因此在测试中可以用固定步长完全确定地运行。
//!
//! # 状态转换
//!
//! ```text
//!            accept                 目标到达 / 停滞 / 超时
//!   Idle ───────────▶ Executing ──────────────────────────▶ Succeeded | Failed
//!    ▲                    │  accept(新命令) / cancel                   │
//!    │                    └──────────────────────────▶ Preempted       │
//!    └──────────────────────── 下一个 tick ◀────────────────────────────┘
//! ```
//!
//! # 每个 tick
//!
//! 1. 读取遥测（单个 tick 内有限次重试，仍失败则以 `Timeout` 结束）
//! 2. 首个 tick 以当前宽度为起点建立轨迹、接触监视器和截止时间
//! 3. 接触监视器判定：到达目标 / 停滞 / 仍在运动
//! 4. 仍在运动且超过截止时间 → `Timeout`；否则下发下一个设定值

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::GripperConfig;
use crate::control::{ContactEvent, ContactMonitor, WidthTrajectory, evaluate_grasp};
use crate::hardware::{ActuatorCommand, GripperHardware, GripperTelemetry};
use crate::types::{
    ActionResult, ActionState, FailureCause, GoalId, GripperCommand, GripperError, HardwareError,
    Meters, MotionOutcome, Newtons, Result,
};

/// 一条命令的终态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalCompletion {
    pub id: GoalId,
    pub command: GripperCommand,
    pub result: ActionResult,
}

/// 运动中的计划
#[derive(Debug, Clone)]
struct Motion {
    trajectory: WidthTrajectory,
    monitor: ContactMonitor,
    deadline: Duration,
    force: Newtons,
}

/// 正在执行的命令
#[derive(Debug, Clone)]
struct ActiveGoal {
    id: GoalId,
    command: GripperCommand,
    /// 首个成功读取遥测的 tick 才建立
    motion: Option<Motion>,
    elapsed: Duration,
}

/// 夹爪动作状态机
///
/// 硬件作为独占资源传入，状态机是其状态的唯一修改者。
pub struct GripperStateMachine<H: GripperHardware> {
    hardware: H,
    config: GripperConfig,
    state: ActionState,
    active: Option<ActiveGoal>,
    last_telemetry: Option<GripperTelemetry>,
    grasped: bool,
}

impl<H: GripperHardware> GripperStateMachine<H> {
    /// 创建状态机
    ///
    /// # 错误
    ///
    /// - `GripperError::Config`: 配置校验失败
    pub fn new(hardware: H, config: GripperConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            hardware,
            config,
            state: ActionState::Idle,
            active: None,
            last_telemetry: None,
            grasped: false,
        })
    }

    /// 当前动作状态
    pub fn state(&self) -> ActionState {
        self.state
    }

    /// 正在执行的目标
    pub fn active_goal(&self) -> Option<GoalId> {
        self.active.as_ref().map(|goal| goal.id)
    }

    /// 最近一次成功读取的遥测
    pub fn telemetry(&self) -> Option<GripperTelemetry> {
        self.last_telemetry
    }

    /// 上一次 Grasp 是否成功且之后没有新命令
    pub fn is_grasped(&self) -> bool {
        self.grasped
    }

    /// 配置
    pub fn config(&self) -> &GripperConfig {
        &self.config
    }

    /// 硬件引用
    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    /// 硬件可变引用
    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    /// 取回硬件
    pub fn into_hardware(self) -> H {
        self.hardware
    }

    /// 接受一条新命令
    ///
    /// 若已有命令在执行，先以 `Preempted` 结束它，再开始新命令，二者不会交错。
    ///
    /// # 返回
    ///
    /// 被抢占命令的终态（如果有）。
    ///
    /// # 错误
    ///
    /// - `GripperError::InvalidParameter`: 命令参数无效，当前命令不受影响
    pub fn accept(&mut self, id: GoalId, command: GripperCommand) -> Result<Option<GoalCompletion>> {
        command.validate(&self.config.limits)?;

        let preempted = self.preempt_active();

        info!(goal = %id, "Accepted {}", command);
        self.grasped = false;
        self.active = Some(ActiveGoal {
            id,
            command,
            motion: None,
            elapsed: Duration::ZERO,
        });
        self.state = ActionState::Executing;

        Ok(preempted)
    }

    /// 取消指定目标
    ///
    /// 目标不是当前执行的命令时返回 `None`。
    pub fn cancel(&mut self, id: GoalId) -> Option<GoalCompletion> {
        if self.active_goal() != Some(id) {
            return None;
        }
        self.preempt_active()
    }

    /// 执行一个控制周期
    ///
    /// `dt` 为距上一个 tick 的控制时间。返回本周期内结束的命令（如果有）。
    pub fn tick(&mut self, dt: Duration) -> Option<GoalCompletion> {
        let telemetry = self.read_telemetry();

        if self.active.is_none() {
            if self.state.is_terminal() {
                self.state = ActionState::Idle;
            }
            if let Err(e) = telemetry {
                debug!("Idle telemetry read failed: {}", e);
            }
            return None;
        }

        let telemetry = match telemetry {
            Ok(telemetry) => telemetry,
            Err(e) => {
                warn!(
                    "Telemetry unavailable after {} retries: {}",
                    self.config.telemetry.retries, e
                );
                return self.fail_active(FailureCause::Timeout);
            },
        };
        let width = telemetry.width();

        let config = &self.config;
        let goal = self.active.as_mut()?;

        let event = match goal.motion.as_mut() {
            Some(motion) => {
                goal.elapsed += dt;
                motion.monitor.observe(width, dt)
            },
            None => {
                let motion = plan_motion(&goal.command, width, config);
                debug!(
                    goal = %goal.id,
                    "Motion {} -> {} at {}, expected {:.3}s, deadline {:.3}s, window {:?}",
                    width,
                    motion.trajectory.target(),
                    motion.trajectory.speed(),
                    motion.trajectory.duration().as_secs_f64(),
                    motion.deadline.as_secs_f64(),
                    motion.monitor.window()
                );
                goal.motion.insert(motion).monitor.observe(width, Duration::ZERO)
            },
        };

        let elapsed = goal.elapsed;
        let Some(motion) = goal.motion.as_ref() else {
            return None;
        };

        let outcome = match event {
            ContactEvent::TargetReached => Some(MotionOutcome {
                stopped_width: motion.trajectory.target(),
                elapsed,
                stalled: false,
            }),
            // 运动时长截止到宽度停止变化的时刻，不含消抖窗口
            ContactEvent::Stalled { width, still_for } => Some(MotionOutcome {
                stopped_width: width,
                elapsed: elapsed.saturating_sub(still_for),
                stalled: true,
            }),
            ContactEvent::Moving => None,
        };

        if let Some(outcome) = outcome {
            return self.complete_active(outcome, telemetry);
        }

        if elapsed > motion.deadline {
            warn!(
                goal = %goal.id,
                "Motion did not terminate within {:.3}s (width {})",
                motion.deadline.as_secs_f64(),
                width
            );
            return self.fail_active(FailureCause::Timeout);
        }

        let setpoint = ActuatorCommand {
            width: motion.trajectory.setpoint_at(elapsed + dt),
            speed: motion.trajectory.speed(),
            force: motion.force,
        };
        if let Err(e) = self.send_command(&setpoint) {
            warn!("Actuator command failed: {}", e);
            return self.fail_active(FailureCause::Timeout);
        }

        None
    }

    /// 以固定步长同步执行一条命令直到结束
    ///
    /// 不休眠，适合仿真和测试。活性由截止时间保证，循环必然结束。
    ///
    /// # 错误
    ///
    /// - `GripperError::InvalidParameter`: 命令无效或 `dt` 为零
    pub fn run_to_completion(
        &mut self,
        id: GoalId,
        command: GripperCommand,
        dt: Duration,
    ) -> Result<ActionResult> {
        if dt.is_zero() {
            return Err(GripperError::invalid_parameter("dt", "must be > 0"));
        }
        self.accept(id, command)?;
        loop {
            if let Some(completion) = self.tick(dt) {
                if completion.id == id {
                    return Ok(completion.result);
                }
            }
        }
    }

    /// 读取遥测（带重试）
    fn read_telemetry(&mut self) -> std::result::Result<GripperTelemetry, HardwareError> {
        let timeout = self.config.telemetry.poll_timeout();
        let attempts = self.config.telemetry.retries + 1;
        let mut last_error = HardwareError::Timeout {
            timeout_ms: self.config.telemetry.poll_timeout_ms,
        };

        for attempt in 1..=attempts {
            match self.hardware.poll(timeout) {
                Ok(telemetry) => {
                    self.last_telemetry = Some(telemetry);
                    return Ok(telemetry);
                },
                Err(e) if e.is_retryable() => {
                    debug!("Telemetry read attempt {}/{} failed: {}", attempt, attempts, e);
                    last_error = e;
                },
                Err(e) => return Err(e),
            }
        }

        Err(last_error)
    }

    /// 下发设定值（带重试）
    fn send_command(&mut self, command: &ActuatorCommand) -> std::result::Result<(), HardwareError> {
        let attempts = self.config.telemetry.retries + 1;
        let mut result = Ok(());
        for _ in 0..attempts {
            result = self.hardware.command(command);
            match &result {
                Err(e) if e.is_retryable() => continue,
                _ => break,
            }
        }
        result
    }

    /// 运动结束：按命令类型判定结果
    fn complete_active(
        &mut self,
        outcome: MotionOutcome,
        telemetry: GripperTelemetry,
    ) -> Option<GoalCompletion> {
        let goal = self.active.take()?;
        let force = telemetry.force_per_finger();

        let (result, hold) = match goal.command {
            GripperCommand::Move { .. } | GripperCommand::Homing { .. } => {
                let result = if outcome.stalled {
                    ActionResult::failed(
                        FailureCause::MotionFailure,
                        outcome.stopped_width,
                        force,
                        outcome.elapsed,
                    )
                } else {
                    ActionResult::succeeded(outcome.stopped_width, force, outcome.elapsed)
                };
                (result, ActuatorCommand::hold(outcome.stopped_width))
            },
            GripperCommand::Grasp {
                width,
                speed,
                force: grasp_force,
                epsilon,
            } => {
                let verdict = evaluate_grasp(outcome.stopped_width, width, epsilon);
                if verdict.is_success() {
                    // 保持夹持力
                    let hold = ActuatorCommand {
                        width: self.config.limits.min_width,
                        speed,
                        force: grasp_force,
                    };
                    let result =
                        ActionResult::succeeded(outcome.stopped_width, force, outcome.elapsed)
                            .with_verdict(verdict);
                    (result, hold)
                } else {
                    let result = ActionResult::failed(
                        FailureCause::GraspMismatch,
                        outcome.stopped_width,
                        force,
                        outcome.elapsed,
                    )
                    .with_verdict(verdict);
                    (result, ActuatorCommand::hold(outcome.stopped_width))
                }
            },
        };

        if outcome.stalled {
            debug!(goal = %goal.id, "Fingers stalled at {}", outcome.stopped_width);
        }
        self.grasped = matches!(goal.command, GripperCommand::Grasp { .. }) && result.success;
        Some(self.conclude(goal, result, hold))
    }

    /// 以指定原因结束当前命令（失败 / 抢占）
    fn fail_active(&mut self, cause: FailureCause) -> Option<GoalCompletion> {
        let goal = self.active.take()?;
        let (width, force) = match self.last_telemetry {
            Some(t) => (t.width(), t.force_per_finger()),
            None => (Meters::ZERO, Newtons::ZERO),
        };
        let result = ActionResult::failed(cause, width, force, goal.elapsed);
        Some(self.conclude(goal, result, ActuatorCommand::hold(width)))
    }

    fn preempt_active(&mut self) -> Option<GoalCompletion> {
        let completion = self.fail_active(FailureCause::Preempted)?;
        info!(goal = %completion.id, "Preempted {}", completion.command);
        Some(completion)
    }

    fn conclude(
        &mut self,
        goal: ActiveGoal,
        result: ActionResult,
        hold: ActuatorCommand,
    ) -> GoalCompletion {
        // 只有有过运动计划的命令才需要让执行器停下
        if goal.motion.is_some() || self.last_telemetry.is_some() {
            if let Err(e) = self.send_command(&hold) {
                warn!(goal = %goal.id, "Failed to send hold command: {}", e);
            }
        }

        self.state = result.state;
        if result.success {
            info!(goal = %goal.id, "{} succeeded: {}", goal.command.kind(), result);
        } else {
            info!(
                goal = %goal.id,
                cause = ?result.cause,
                "{} failed: {}",
                goal.command.kind(),
                result
            );
        }

        GoalCompletion {
            id: goal.id,
            command: goal.command,
            result,
        }
    }
}

/// 为命令建立运动计划
///
/// Move 以命令宽度为目标；Homing 以最大宽度为目标；Grasp 向最小宽度闭合，
/// 直到接触物体（停滞）或完全闭合，命令宽度只用于事后判定。
fn plan_motion(command: &GripperCommand, start: Meters, config: &GripperConfig) -> Motion {
    let (target, speed, force) = match *command {
        GripperCommand::Move { width, speed } => (width, speed, Newtons::ZERO),
        GripperCommand::Homing { speed } => (config.limits.max_width, speed, Newtons::ZERO),
        GripperCommand::Grasp { speed, force, .. } => (config.limits.min_width, speed, force),
    };

    let trajectory = WidthTrajectory::new(start, target, speed);
    Motion {
        deadline: config.timeout.deadline_for(trajectory.duration()),
        monitor: ContactMonitor::new(target, speed, &config.contact),
        trajectory,
        force,
    }
}
