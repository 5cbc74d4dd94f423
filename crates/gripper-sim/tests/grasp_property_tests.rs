//! 抓取的属性测试
//!
//! 对任意物体宽度和速度，闭合运动都停在物体上，判定只取决于目标宽度与物体宽度之差。

use gripper_control::control::GraspVerdict;
use gripper_control::types::{
    ActionResult, GoalId, GraspEpsilon, GripperCommand, Meters, MetersPerSecond, Newtons,
};
use gripper_control::{GripperConfig, GripperStateMachine};
use gripper_sim::{SimConfig, SimulatedGripper};
use proptest::prelude::*;
use std::time::Duration;

const DT: Duration = Duration::from_millis(2);
const EPSILON: f64 = 0.005;

fn grasp_object(object: f64, target: f64, speed: f64) -> ActionResult {
    let sim = SimulatedGripper::new(SimConfig::lockstep(DT).with_obstruction(Meters(object)));
    let mut machine = GripperStateMachine::new(sim, GripperConfig::default()).unwrap();
    let command = GripperCommand::grasp(
        Meters(target),
        MetersPerSecond(speed),
        Newtons(10.0),
        GraspEpsilon::symmetric(Meters(EPSILON)),
    );
    machine.run_to_completion(GoalId(1), command, DT).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// 目标宽度在容差内时抓取成功，手指停在物体上
    #[test]
    fn grasp_within_tolerance_succeeds(
        object in 0.01..0.07f64,
        offset in -0.004..0.004f64,
        speed in 0.05..0.2f64,
    ) {
        let result = grasp_object(object, object + offset, speed);
        prop_assert!(result.success, "{}", result);
        prop_assert!((result.final_width.0 - object).abs() < 1e-9);
        prop_assert!((result.final_force_per_finger.0 - 5.0).abs() < 1e-9);
    }

    /// 目标宽度明显大于物体时判定为 TooNarrow
    #[test]
    fn oversized_target_is_too_narrow(
        object in 0.01..0.06f64,
        offset in 0.006..0.01f64,
        speed in 0.05..0.2f64,
    ) {
        let result = grasp_object(object, object + offset, speed);
        prop_assert!(!result.success);
        prop_assert_eq!(result.verdict, Some(GraspVerdict::TooNarrow));
    }

    /// 目标宽度明显小于物体时判定为 TooWide
    #[test]
    fn undersized_target_is_too_wide(
        object in 0.02..0.07f64,
        offset in 0.006..0.01f64,
        speed in 0.05..0.2f64,
    ) {
        let result = grasp_object(object, object - offset, speed);
        prop_assert!(!result.success);
        prop_assert_eq!(result.verdict, Some(GraspVerdict::TooWide));
    }
}
