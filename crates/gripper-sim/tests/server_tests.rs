//! 动作服务测试（实时控制线程）
//!
//! 仿真使用墙上时钟，验证 submit / cancel / poll_result、抢占和超时的活性。

use gripper_control::prelude::*;
use gripper_control::server::MAX_RETAINED_RESULTS;
use gripper_sim::{SimConfig, SimHandle, SimulatedGripper};
use std::thread;
use std::time::Duration;

const STONE_WIDTH: f64 = 0.032;
const WAIT: Duration = Duration::from_secs(10);

fn start(sim_config: SimConfig, config: GripperConfig) -> (GripperServer, SimHandle) {
    let gripper = SimulatedGripper::new(sim_config);
    let sim = gripper.handle();
    let server = GripperServer::start(gripper, config).unwrap();
    (server, sim)
}

fn slow_grasp() -> GripperCommand {
    GripperCommand::grasp(
        Meters(0.03),
        MetersPerSecond(0.01),
        Newtons(5.0),
        GraspEpsilon::default(),
    )
}

#[test]
fn test_grasp_through_server() {
    let (server, _sim) = start(
        SimConfig::default().with_obstruction(Meters(STONE_WIDTH)),
        GripperConfig::default(),
    );
    let observer = server.observer();

    let handle = server
        .submit(GripperCommand::grasp(
            Meters(STONE_WIDTH),
            MetersPerSecond(0.1),
            Newtons(5.0),
            GraspEpsilon::default(),
        ))
        .unwrap();

    let result = server.wait_for_result(&handle, WAIT).unwrap().unwrap();
    assert!(result.success, "{}", result);
    assert!((result.final_width.0 - STONE_WIDTH).abs() <= 5e-3);

    // 快照在结果之后的 tick 发布
    thread::sleep(Duration::from_millis(50));
    assert!(observer.is_grasped());
    assert!(observer.active_goal().is_none());
    assert!(observer.snapshot().ticks > 0);
}

#[test]
fn test_poll_result_delivers_once() {
    let (server, _sim) = start(SimConfig::default(), GripperConfig::default());

    let handle = server
        .submit(GripperCommand::move_to(Meters(0.07), MetersPerSecond(0.1)))
        .unwrap();
    assert_eq!(server.poll_result(&handle).unwrap(), None);

    let result = server.wait_for_result(&handle, WAIT).unwrap().unwrap();
    assert!(result.success);

    let err = server.poll_result(&handle).unwrap_err();
    assert!(matches!(err, GripperError::UnknownGoal(id) if id == handle.id()));
}

#[test]
fn test_new_command_preempts_active() {
    let (server, _sim) = start(SimConfig::default(), GripperConfig::default());

    let first = server.submit(slow_grasp()).unwrap();
    thread::sleep(Duration::from_millis(100));
    let second = server
        .submit(GripperCommand::move_to(Meters(0.08), MetersPerSecond(0.1)))
        .unwrap();

    let first_result = server.wait_for_result(&first, WAIT).unwrap().unwrap();
    assert!(!first_result.success);
    assert_eq!(first_result.state, ActionState::Preempted);
    assert_eq!(first_result.cause, Some(FailureCause::Preempted));

    let second_result = server.wait_for_result(&second, WAIT).unwrap().unwrap();
    assert!(second_result.success, "{}", second_result);
    assert_ne!(first.id(), second.id());
}

#[test]
fn test_cancel_yields_preempted() {
    let (server, _sim) = start(SimConfig::default(), GripperConfig::default());

    let handle = server.submit(slow_grasp()).unwrap();
    thread::sleep(Duration::from_millis(50));
    server.cancel(&handle).unwrap();

    let result = server
        .wait_for_result(&handle, Duration::from_secs(1))
        .unwrap()
        .expect("cancellation must be observed promptly");
    assert!(!result.success);
    assert_eq!(result.state, ActionState::Preempted);
}

#[test]
fn test_cancel_after_completion_is_noop() {
    let (server, _sim) = start(SimConfig::default(), GripperConfig::default());

    let handle = server
        .submit(GripperCommand::move_to(Meters(0.08), MetersPerSecond(0.1)))
        .unwrap();
    let result = server.wait_for_result(&handle, WAIT).unwrap().unwrap();
    assert!(result.success);

    server.cancel(&handle).unwrap();
    thread::sleep(Duration::from_millis(20));
    assert!(server.poll_result(&handle).is_err());
}

#[test]
fn test_unclaimed_results_are_bounded() {
    let (server, _sim) = start(SimConfig::default(), GripperConfig::default());
    let slow_close = GripperCommand::move_to(Meters(0.0), MetersPerSecond(0.01));

    // 每次提交都抢占上一次，结果无人取走
    let handles: Vec<GoalHandle> = (0..1000)
        .map(|_| server.submit(slow_close).unwrap())
        .collect();
    thread::sleep(Duration::from_millis(300));

    // 最后一个仍在执行，其余都已结束
    assert!(server.retained_results() <= MAX_RETAINED_RESULTS + 1);

    let oldest = handles[0];
    assert!(matches!(
        server.poll_result(&oldest),
        Err(GripperError::UnknownGoal(id)) if id == oldest.id()
    ));

    let newest_preempted = server.poll_result(&handles[998]).unwrap().unwrap();
    assert_eq!(newest_preempted.state, ActionState::Preempted);
    assert_eq!(server.poll_result(&handles[999]).unwrap(), None);
}

#[test]
fn test_invalid_command_is_rejected_synchronously() {
    let (server, _sim) = start(SimConfig::default(), GripperConfig::default());

    let err = server
        .submit(GripperCommand::move_to(Meters(0.04), MetersPerSecond(0.0)))
        .unwrap_err();
    assert!(err.is_rejection());

    let err = server
        .submit(GripperCommand::move_to(Meters(0.2), MetersPerSecond(0.1)))
        .unwrap_err();
    assert!(err.is_rejection());

    let err = server
        .submit(GripperCommand::grasp(
            Meters(0.03),
            MetersPerSecond(0.1),
            Newtons(-1.0),
            GraspEpsilon::default(),
        ))
        .unwrap_err();
    assert!(err.is_rejection());
}

#[test]
fn test_unavailable_telemetry_times_out() {
    let (server, sim) = start(SimConfig::default(), GripperConfig::default());
    sim.set_unavailable(true);

    let handle = server.submit(slow_grasp()).unwrap();
    let result = server.wait_for_result(&handle, WAIT).unwrap().unwrap();
    assert!(!result.success);
    assert_eq!(result.state, ActionState::Failed);
    assert_eq!(result.cause, Some(FailureCause::Timeout));
}

#[test]
fn test_sluggish_fingers_time_out() {
    let mut config = GripperConfig::default();
    config.timeout.margin_ms = 100;
    let (server, _sim) = start(
        SimConfig::default().with_max_speed(MetersPerSecond(0.01)),
        config,
    );

    // 预计 0.4s，截止 0.9s
    let handle = server
        .submit(GripperCommand::move_to(Meters(0.0), MetersPerSecond(0.2)))
        .unwrap();
    let result = server.wait_for_result(&handle, WAIT).unwrap().unwrap();
    assert_eq!(result.cause, Some(FailureCause::Timeout));
}

#[test]
fn test_observer_tracks_width() {
    let (server, sim) = start(SimConfig::default(), GripperConfig::default());
    let observer = server.observer();

    let handle = server
        .submit(GripperCommand::move_to(Meters(0.05), MetersPerSecond(0.2)))
        .unwrap();
    let result = server.wait_for_result(&handle, WAIT).unwrap().unwrap();
    assert!(result.success);

    thread::sleep(Duration::from_millis(20));
    let width = observer.width().unwrap();
    assert!((width.0 - 0.05).abs() < 1e-3);
    assert!((sim.width().0 - 0.05).abs() < 1e-3);
    assert_eq!(observer.state(), ActionState::Idle);
}

#[test]
fn test_shutdown_preempts_active_goal() {
    let (server, sim) = start(SimConfig::default(), GripperConfig::default());
    let _handle = server.submit(slow_grasp()).unwrap();
    thread::sleep(Duration::from_millis(50));

    assert!(server.is_running());
    server.shutdown();

    // 控制线程已退出：仿真不再被轮询
    let polls = sim.poll_count();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(sim.poll_count(), polls);
    assert_eq!(sim.last_command().map(|c| c.speed), Some(MetersPerSecond::ZERO));
}
