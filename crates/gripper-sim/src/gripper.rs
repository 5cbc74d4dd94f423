//! 仿真夹爪
//!
//! 一维运动学模型：开口宽度以不超过 `min(指令速度, max_speed)` 的速率趋向设定值。
//! 闭合过程中碰到刚性障碍物（被夹物体）时停在物体宽度，每指输出指令力的一半。
//!
//! 物理状态在每次 `poll` 时推进，时间步长由 [`SimClock`] 决定。

use gripper_control::hardware::{ActuatorCommand, FingerState, GripperHardware, GripperTelemetry};
use gripper_control::types::{HardwareError, Meters, MetersPerSecond, Newtons};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::trace;

/// 仿真时钟
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimClock {
    /// 每次 poll 推进固定步长，与状态机 tick 的 dt 对齐
    Lockstep(Duration),
    /// 按墙上时钟推进
    RealTime,
}

/// 仿真配置
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// 最大开口
    pub max_width: Meters,
    /// 初始开口
    pub initial_width: Meters,
    /// 手指能达到的最大速度（总开口变化率）
    pub max_speed: MetersPerSecond,
    /// 被夹物体宽度
    pub obstruction: Option<Meters>,
    /// 每指位置噪声幅值（均匀分布）
    pub position_noise: Meters,
    /// 噪声随机种子
    pub seed: u64,
    /// 时钟
    pub clock: SimClock,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_width: Meters(0.08),
            initial_width: Meters(0.08),
            max_speed: MetersPerSecond(0.2),
            obstruction: None,
            position_noise: Meters::ZERO,
            seed: 0,
            clock: SimClock::RealTime,
        }
    }
}

impl SimConfig {
    /// 固定步长仿真
    pub fn lockstep(dt: Duration) -> Self {
        Self {
            clock: SimClock::Lockstep(dt),
            ..Self::default()
        }
    }

    /// 放置被夹物体
    pub fn with_obstruction(mut self, width: Meters) -> Self {
        self.obstruction = Some(width);
        self
    }

    /// 设置初始开口
    pub fn with_initial_width(mut self, width: Meters) -> Self {
        self.initial_width = width;
        self
    }

    /// 限制手指速度
    pub fn with_max_speed(mut self, speed: MetersPerSecond) -> Self {
        self.max_speed = speed;
        self
    }

    /// 加入位置噪声
    pub fn with_position_noise(mut self, noise: Meters, seed: u64) -> Self {
        self.position_noise = noise;
        self.seed = seed;
        self
    }
}

/// 仿真世界状态
#[derive(Debug)]
struct SimWorld {
    config: SimConfig,
    width: Meters,
    setpoint: Option<ActuatorCommand>,
    obstruction: Option<Meters>,
    blocked: bool,
    pending_failures: u32,
    unavailable: bool,
    last_step: Option<Instant>,
    polls: u64,
    commands: u64,
    rng: StdRng,
}

impl SimWorld {
    fn new(config: SimConfig) -> Self {
        let width = config.initial_width.clamp(Meters::ZERO, config.max_width);
        Self {
            width,
            setpoint: None,
            obstruction: config.obstruction,
            blocked: false,
            pending_failures: 0,
            unavailable: false,
            last_step: None,
            polls: 0,
            commands: 0,
            rng: StdRng::seed_from_u64(config.seed),
            config,
        }
    }

    fn elapsed_since_last_step(&mut self) -> Duration {
        match self.config.clock {
            SimClock::Lockstep(dt) => dt,
            SimClock::RealTime => {
                let now = Instant::now();
                let dt = self.last_step.map(|t| now - t).unwrap_or(Duration::ZERO);
                self.last_step = Some(now);
                dt
            },
        }
    }

    fn step(&mut self, dt: Duration) {
        let Some(command) = self.setpoint else {
            return;
        };

        let speed = command.speed.min(self.config.max_speed).max(MetersPerSecond::ZERO);
        let max_step = speed.distance_over(dt.as_secs_f64());
        let desired = command.width.clamp(Meters::ZERO, self.config.max_width);

        let delta = (desired - self.width).clamp(-max_step, max_step);
        let mut next = self.width + delta;

        self.blocked = false;
        if let Some(object) = self.obstruction {
            if self.width >= object && desired < object && next <= object {
                next = object;
                self.blocked = true;
            }
        }

        self.width = next;
    }

    fn finger_force(&self) -> Newtons {
        match self.setpoint {
            Some(command) if self.blocked => command.force / 2.0,
            _ => Newtons::ZERO,
        }
    }

    fn telemetry(&mut self) -> GripperTelemetry {
        let half = self.width / 2.0;
        let force = self.finger_force();
        let noise = self.config.position_noise.0;
        let finger = |rng: &mut StdRng| FingerState {
            position: if noise > 0.0 {
                half + Meters(rng.gen_range(-noise..=noise))
            } else {
                half
            },
            force,
        };
        let left = finger(&mut self.rng);
        let right = finger(&mut self.rng);
        GripperTelemetry { left, right }
    }
}

/// 仿真夹爪
///
/// 实现 [`GripperHardware`]，交给状态机或服务使用；
/// 通过 [`SimHandle`] 在测试中观察和扰动仿真世界。
pub struct SimulatedGripper {
    world: Arc<Mutex<SimWorld>>,
}

impl SimulatedGripper {
    /// 创建仿真夹爪
    pub fn new(config: SimConfig) -> Self {
        Self {
            world: Arc::new(Mutex::new(SimWorld::new(config))),
        }
    }

    /// 获取控制句柄
    pub fn handle(&self) -> SimHandle {
        SimHandle {
            world: self.world.clone(),
        }
    }
}

impl GripperHardware for SimulatedGripper {
    fn poll(&mut self, timeout: Duration) -> Result<GripperTelemetry, HardwareError> {
        let mut world = self.world.lock();
        world.polls += 1;

        let dt = world.elapsed_since_last_step();
        world.step(dt);

        if world.unavailable {
            return Err(HardwareError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        if world.pending_failures > 0 {
            world.pending_failures -= 1;
            return Err(HardwareError::Io("injected telemetry failure".to_string()));
        }

        Ok(world.telemetry())
    }

    fn command(&mut self, command: &ActuatorCommand) -> Result<(), HardwareError> {
        let mut world = self.world.lock();
        if world.unavailable {
            return Err(HardwareError::Disconnected);
        }
        trace!(
            "Sim setpoint: width {} speed {} force {}",
            command.width, command.speed, command.force
        );
        world.setpoint = Some(*command);
        world.commands += 1;
        Ok(())
    }
}

/// 仿真世界句柄
///
/// 可克隆，可跨线程使用。
#[derive(Clone)]
pub struct SimHandle {
    world: Arc<Mutex<SimWorld>>,
}

impl SimHandle {
    /// 真实开口宽度（无噪声）
    pub fn width(&self) -> Meters {
        self.world.lock().width
    }

    /// 真实单指力
    pub fn finger_force(&self) -> Newtons {
        self.world.lock().finger_force()
    }

    /// 手指是否被物体挡住
    pub fn is_blocked(&self) -> bool {
        self.world.lock().blocked
    }

    /// 最近一次设定值
    pub fn last_command(&self) -> Option<ActuatorCommand> {
        self.world.lock().setpoint
    }

    /// 已处理的 poll 次数
    pub fn poll_count(&self) -> u64 {
        self.world.lock().polls
    }

    /// 已接收的设定值次数
    pub fn command_count(&self) -> u64 {
        self.world.lock().commands
    }

    /// 放置 / 移除被夹物体
    pub fn set_obstruction(&self, width: Option<Meters>) {
        let mut world = self.world.lock();
        world.obstruction = width;
        if width.is_none() {
            world.blocked = false;
        }
    }

    /// 让接下来 `count` 次 poll 失败
    pub fn inject_poll_failures(&self, count: u32) {
        self.world.lock().pending_failures = count;
    }

    /// 模拟总线断开：poll 超时、命令失败
    pub fn set_unavailable(&self, unavailable: bool) {
        self.world.lock().unavailable = unavailable;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: Duration = Duration::from_millis(2);
    const TIMEOUT: Duration = Duration::from_millis(5);

    fn command(width: f64, speed: f64, force: f64) -> ActuatorCommand {
        ActuatorCommand {
            width: Meters(width),
            speed: MetersPerSecond(speed),
            force: Newtons(force),
        }
    }

    #[test]
    fn test_idle_fingers_stay_put() {
        let mut sim = SimulatedGripper::new(SimConfig::lockstep(DT));
        for _ in 0..10 {
            let t = sim.poll(TIMEOUT).unwrap();
            assert_eq!(t.width(), Meters(0.08));
            assert_eq!(t.force_per_finger(), Newtons::ZERO);
        }
    }

    #[test]
    fn test_fingers_move_at_commanded_speed() {
        let mut sim = SimulatedGripper::new(SimConfig::lockstep(DT));
        sim.command(&command(0.0, 0.1, 0.0)).unwrap();

        // 10 步 × 2ms × 0.1 m/s = 2mm
        let mut t = sim.poll(TIMEOUT).unwrap();
        for _ in 0..9 {
            t = sim.poll(TIMEOUT).unwrap();
        }
        assert!((t.width().0 - 0.078).abs() < 1e-9);
    }

    #[test]
    fn test_speed_limited_by_max_speed() {
        let config = SimConfig::lockstep(DT).with_max_speed(MetersPerSecond(0.01));
        let mut sim = SimulatedGripper::new(config);
        sim.command(&command(0.0, 0.1, 0.0)).unwrap();
        let t = sim.poll(TIMEOUT).unwrap();
        assert!((t.width().0 - (0.08 - 0.01 * 0.002)).abs() < 1e-12);
    }

    #[test]
    fn test_obstruction_blocks_and_applies_half_force() {
        let config = SimConfig::lockstep(DT).with_obstruction(Meters(0.032));
        let mut sim = SimulatedGripper::new(config);
        let handle = sim.handle();
        sim.command(&command(0.0, 0.2, 6.0)).unwrap();

        let mut t = sim.poll(TIMEOUT).unwrap();
        for _ in 0..500 {
            t = sim.poll(TIMEOUT).unwrap();
        }
        assert_eq!(t.width(), Meters(0.032));
        assert_eq!(t.left.force, Newtons(3.0));
        assert_eq!(t.right.force, Newtons(3.0));
        assert!(handle.is_blocked());

        // 张开不受阻挡
        sim.command(&command(0.08, 0.2, 0.0)).unwrap();
        let t = sim.poll(TIMEOUT).unwrap();
        assert!(t.width() > Meters(0.032));
        assert!(!handle.is_blocked());
    }

    #[test]
    fn test_injected_failures_and_unavailable() {
        let mut sim = SimulatedGripper::new(SimConfig::lockstep(DT));
        let handle = sim.handle();

        handle.inject_poll_failures(2);
        assert!(matches!(sim.poll(TIMEOUT), Err(HardwareError::Io(_))));
        assert!(matches!(sim.poll(TIMEOUT), Err(HardwareError::Io(_))));
        assert!(sim.poll(TIMEOUT).is_ok());

        handle.set_unavailable(true);
        assert!(matches!(sim.poll(TIMEOUT), Err(HardwareError::Timeout { timeout_ms: 5 })));
        assert!(matches!(
            sim.command(&command(0.0, 0.1, 0.0)),
            Err(HardwareError::Disconnected)
        ));
        handle.set_unavailable(false);
        assert!(sim.poll(TIMEOUT).is_ok());
        assert_eq!(handle.poll_count(), 5);
    }

    #[test]
    fn test_position_noise_is_bounded() {
        let config = SimConfig::lockstep(DT).with_position_noise(Meters(2e-5), 42);
        let mut sim = SimulatedGripper::new(config);
        for _ in 0..100 {
            let t = sim.poll(TIMEOUT).unwrap();
            assert!((t.left.position.0 - 0.04).abs() <= 2e-5);
            assert!((t.right.position.0 - 0.04).abs() <= 2e-5);
        }
    }
}
