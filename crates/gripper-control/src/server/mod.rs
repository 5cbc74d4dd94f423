//! Gripper Action Server - 动作服务
//!
//! 在后台控制线程中运行 [`GripperStateMachine`]，对外提供非阻塞的
//! submit / cancel / poll_result 接口。
//!
//! # 线程模型
//!
//! - **控制线程**: 独占硬件和状态机，按 `control.frequency_hz` 运行 tick
//! - **调用线程**: 通过 `crossbeam-channel` 投递请求，通过结果表取回终态
//! - **观察者**: 通过 `ArcSwap` 读取每个 tick 发布的快照
//!
//! 请求在下一个 tick 开始时按投递顺序处理，因此"先提交后取消"总是先开始再抢占。
//!
//! 结果表最多保留 [`MAX_RETAINED_RESULTS`] 个未取走的终态，超出时丢弃最早结束的；
//! 被丢弃的句柄查询时返回 `UnknownGoal`。
//!
//! # 使用示例
//!
//! ```rust,no_run
//! # use gripper_control::prelude::*;
//! # use std::time::Duration;
//! # fn example(hardware: impl GripperHardware + 'static) -> Result<()> {
//! let server = GripperServer::start(hardware, GripperConfig::default())?;
//!
//! let handle = server.submit(GripperCommand::grasp(
//!     Meters(0.032),
//!     MetersPerSecond(0.1),
//!     Newtons(5.0),
//!     GraspEpsilon::default(),
//! ))?;
//!
//! if let Some(result) = server.wait_for_result(&handle, Duration::from_secs(5))? {
//!     println!("grasp: {}", result);
//! }
//! # Ok(())
//! # }
//! ```

pub mod observer;

pub use observer::{GripperObserver, GripperSnapshot};

use arc_swap::ArcSwap;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use spin_sleep::SpinSleeper;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

use crate::config::{ControlConfig, GripperConfig, GripperLimits};
use crate::hardware::GripperHardware;
use crate::state::{GoalCompletion, GripperStateMachine};
use crate::types::{
    ActionResult, FailureCause, GoalId, GripperCommand, GripperError, Meters, Newtons, Result,
};

/// 结果表最多保留的未取走终态数
pub const MAX_RETAINED_RESULTS: usize = 256;

/// 已提交命令的句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GoalHandle {
    id: GoalId,
}

impl GoalHandle {
    /// 目标 ID
    pub fn id(&self) -> GoalId {
        self.id
    }
}

/// 控制线程请求
#[derive(Debug)]
enum Request {
    Submit { id: GoalId, command: GripperCommand },
    Cancel(GoalId),
}

/// 结果表中的条目
#[derive(Debug, Clone, Copy)]
enum Slot {
    Pending,
    Done(ActionResult),
}

/// 结果表
///
/// `finished` 按结束顺序记录尚未取走的终态，用于淘汰。
#[derive(Debug, Default)]
struct ResultTable {
    slots: HashMap<GoalId, Slot>,
    finished: VecDeque<GoalId>,
}

impl ResultTable {
    fn register(&mut self, id: GoalId) {
        self.slots.insert(id, Slot::Pending);
    }

    fn forget(&mut self, id: GoalId) {
        self.slots.remove(&id);
    }

    fn complete(&mut self, id: GoalId, result: ActionResult) {
        self.slots.insert(id, Slot::Done(result));
        self.finished.push_back(id);

        while self.finished.len() > MAX_RETAINED_RESULTS {
            if let Some(oldest) = self.finished.pop_front() {
                if self.slots.remove(&oldest).is_some() {
                    debug!(goal = %oldest, "Dropping unclaimed result");
                }
            }
        }
    }

    /// 取走终态；终态只交付一次
    fn take(&mut self, id: GoalId) -> Result<Option<ActionResult>> {
        match self.slots.get(&id) {
            None => Err(GripperError::UnknownGoal(id)),
            Some(Slot::Pending) => Ok(None),
            Some(Slot::Done(_)) => {
                self.finished.retain(|finished| *finished != id);
                match self.slots.remove(&id) {
                    Some(Slot::Done(result)) => Ok(Some(result)),
                    _ => Ok(None),
                }
            },
        }
    }

    fn len(&self) -> usize {
        self.slots.len()
    }
}

/// 调用线程与控制线程共享的状态
struct Shared {
    results: Mutex<ResultTable>,
    completed: Condvar,
    snapshot: Arc<ArcSwap<GripperSnapshot>>,
    shutdown: AtomicBool,
}

impl Shared {
    fn complete(&self, completion: GoalCompletion) {
        self.results.lock().complete(completion.id, completion.result);
        self.completed.notify_all();
    }
}

/// 夹爪动作服务
///
/// Drop 时停止控制线程，正在执行的命令以 `Preempted` 结束。
pub struct GripperServer {
    shared: Arc<Shared>,
    requests: Sender<Request>,
    next_id: AtomicU64,
    limits: GripperLimits,
    handle: Option<thread::JoinHandle<()>>,
}

impl GripperServer {
    /// 启动控制线程
    ///
    /// # 错误
    ///
    /// - `GripperError::Config`: 配置校验失败
    pub fn start<H>(hardware: H, config: GripperConfig) -> Result<Self>
    where
        H: GripperHardware + 'static,
    {
        let limits = config.limits.clone();
        let control = config.control.clone();
        let machine = GripperStateMachine::new(hardware, config)?;

        let shared = Arc::new(Shared {
            results: Mutex::new(ResultTable::default()),
            completed: Condvar::new(),
            snapshot: Arc::new(ArcSwap::from_pointee(GripperSnapshot::default())),
            shutdown: AtomicBool::new(false),
        });
        let (tx, rx) = crossbeam_channel::unbounded();

        let shared_clone = shared.clone();
        let handle = thread::spawn(move || {
            control_loop(machine, rx, shared_clone, control);
        });

        info!("Gripper server started");
        Ok(Self {
            shared,
            requests: tx,
            next_id: AtomicU64::new(1),
            limits,
            handle: Some(handle),
        })
    }

    /// 提交命令
    ///
    /// 参数在调用线程同步校验；通过校验的命令在下一个 tick 开始执行，
    /// 并抢占正在执行的命令。
    ///
    /// # 错误
    ///
    /// - `GripperError::InvalidParameter`: 命令参数无效
    /// - `GripperError::ServerStopped`: 控制线程已停止
    pub fn submit(&self, command: GripperCommand) -> Result<GoalHandle> {
        command.validate(&self.limits)?;
        if !self.is_running() {
            return Err(GripperError::ServerStopped);
        }

        let id = GoalId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.shared.results.lock().register(id);

        if self.requests.send(Request::Submit { id, command }).is_err() {
            self.shared.results.lock().forget(id);
            return Err(GripperError::ServerStopped);
        }

        debug!(goal = %id, "Submitted {}", command);
        Ok(GoalHandle { id })
    }

    /// 请求取消
    ///
    /// 目标已结束时无效果。结果通过 [`poll_result`](Self::poll_result) 取回。
    pub fn cancel(&self, handle: &GoalHandle) -> Result<()> {
        if self.requests.send(Request::Cancel(handle.id)).is_err() {
            return Err(GripperError::ServerStopped);
        }
        Ok(())
    }

    /// 非阻塞查询结果
    ///
    /// 终态只交付一次；交付后句柄失效。
    ///
    /// # 错误
    ///
    /// - `GripperError::UnknownGoal`: 句柄未知、结果已被取走或已被淘汰
    pub fn poll_result(&self, handle: &GoalHandle) -> Result<Option<ActionResult>> {
        self.shared.results.lock().take(handle.id)
    }

    /// 阻塞等待结果，最多等待 `timeout`
    ///
    /// 超时返回 `Ok(None)`，目标仍在执行。
    pub fn wait_for_result(
        &self,
        handle: &GoalHandle,
        timeout: Duration,
    ) -> Result<Option<ActionResult>> {
        let deadline = Instant::now() + timeout;
        let mut results = self.shared.results.lock();
        loop {
            if let Some(result) = results.take(handle.id)? {
                return Ok(Some(result));
            }
            if self
                .shared
                .completed
                .wait_until(&mut results, deadline)
                .timed_out()
            {
                return results.take(handle.id);
            }
        }
    }

    /// 创建观察者
    pub fn observer(&self) -> GripperObserver {
        GripperObserver::new(self.shared.snapshot.clone())
    }

    /// 结果表中的条目数（执行中、排队中和未取走的终态）
    pub fn retained_results(&self) -> usize {
        self.shared.results.lock().len()
    }

    /// 行程限制
    pub fn limits(&self) -> &GripperLimits {
        &self.limits
    }

    /// 控制线程是否在运行
    pub fn is_running(&self) -> bool {
        !self.shared.shutdown.load(Ordering::Acquire)
    }

    /// 停止控制线程并等待其结束
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Gripper control thread panicked");
            }
            info!("Gripper server stopped");
        }
    }
}

impl Drop for GripperServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// 控制循环
///
/// 每个周期：处理请求 → tick → 发布快照 → 休眠到下一个周期。
/// 实际 dt 超过 `max_dt` 时钳位。
fn control_loop<H: GripperHardware>(
    mut machine: GripperStateMachine<H>,
    requests: Receiver<Request>,
    shared: Arc<Shared>,
    control: ControlConfig,
) {
    let period = control.period();
    let max_dt = control.max_dt();
    let sleeper = SpinSleeper::default();

    let mut last_time = Instant::now();
    let mut ticks: u64 = 0;

    while !shared.shutdown.load(Ordering::Acquire) {
        for request in requests.try_iter() {
            handle_request(&mut machine, &shared, request);
        }

        let now = Instant::now();
        let real_dt = now - last_time;
        let dt = if real_dt > max_dt {
            trace!("Control loop overrun: {:?} > {:?}, clamping", real_dt, max_dt);
            max_dt
        } else {
            real_dt
        };
        last_time = now;

        if let Some(completion) = machine.tick(dt) {
            shared.complete(completion);
        }
        ticks += 1;
        publish(&machine, &shared, ticks);

        let next = now + period;
        sleeper.sleep(next.saturating_duration_since(Instant::now()));
    }

    // 关闭：结束正在执行和尚未开始的命令
    if let Some(id) = machine.active_goal() {
        if let Some(completion) = machine.cancel(id) {
            shared.complete(completion);
        }
    }
    for request in requests.try_iter() {
        if let Request::Submit { id, command } = request {
            debug!(goal = %id, "Discarding {} queued at shutdown", command);
            shared.complete(GoalCompletion {
                id,
                command,
                result: ActionResult::failed(
                    FailureCause::Preempted,
                    machine.telemetry().map(|t| t.width()).unwrap_or(Meters::ZERO),
                    Newtons::ZERO,
                    Duration::ZERO,
                ),
            });
        }
    }
    publish(&machine, &shared, ticks);
}

fn handle_request<H: GripperHardware>(
    machine: &mut GripperStateMachine<H>,
    shared: &Shared,
    request: Request,
) {
    match request {
        Request::Submit { id, command } => match machine.accept(id, command) {
            Ok(Some(preempted)) => shared.complete(preempted),
            Ok(None) => {},
            Err(e) => {
                // submit 已做过同样的校验
                warn!(goal = %id, "Command rejected by control thread: {}", e);
                let width = machine.telemetry().map(|t| t.width()).unwrap_or(Meters::ZERO);
                shared.complete(GoalCompletion {
                    id,
                    command,
                    result: ActionResult::failed(
                        FailureCause::MotionFailure,
                        width,
                        Newtons::ZERO,
                        Duration::ZERO,
                    ),
                });
            },
        },
        Request::Cancel(id) => {
            if let Some(completion) = machine.cancel(id) {
                shared.complete(completion);
            } else {
                debug!(goal = %id, "Cancel ignored: goal is not active");
            }
        },
    }
}

fn publish<H: GripperHardware>(machine: &GripperStateMachine<H>, shared: &Shared, ticks: u64) {
    shared.snapshot.store(Arc::new(GripperSnapshot {
        telemetry: machine.telemetry(),
        state: machine.state(),
        is_grasped: machine.is_grasped(),
        active_goal: machine.active_goal(),
        ticks,
    }));
}
