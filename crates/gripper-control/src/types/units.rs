//! 强类型单位系统
//!
//! 使用 NewType 模式区分宽度、速度和力，防止参数顺序写错时静默通过编译。
//!
//! # 示例
//!
//! ```rust
//! use gripper_control::types::{Meters, MetersPerSecond};
//!
//! let distance = Meters(0.08) - Meters(0.032);
//! let seconds = distance.abs() / MetersPerSecond(0.1);
//! assert!((seconds - 0.48).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// 为单位 NewType 生成公共方法和运算符
macro_rules! impl_unit {
    ($name:ident, $suffix:literal) => {
        impl $name {
            /// 零值常量
            pub const ZERO: Self = $name(0.0);

            /// 创建新的值
            #[inline]
            pub const fn new(value: f64) -> Self {
                $name(value)
            }

            /// 获取原始值
            #[inline]
            pub fn value(self) -> f64 {
                self.0
            }

            /// 取绝对值
            #[inline]
            pub fn abs(self) -> Self {
                $name(self.0.abs())
            }

            /// 是否为有限值（非 NaN、非无穷）
            #[inline]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }

            /// 限制范围
            #[inline]
            pub fn clamp(self, min: Self, max: Self) -> Self {
                $name(self.0.clamp(min.0, max.0))
            }

            /// 取较小值
            #[inline]
            pub fn min(self, other: Self) -> Self {
                $name(self.0.min(other.0))
            }

            /// 取较大值
            #[inline]
            pub fn max(self, other: Self) -> Self {
                $name(self.0.max(other.0))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:.4} {}", self.0, $suffix)
            }
        }

        impl Add for $name {
            type Output = Self;
            #[inline]
            fn add(self, rhs: Self) -> Self {
                $name(self.0 + rhs.0)
            }
        }

        impl Sub for $name {
            type Output = Self;
            #[inline]
            fn sub(self, rhs: Self) -> Self {
                $name(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $name {
            type Output = Self;
            #[inline]
            fn mul(self, rhs: f64) -> Self {
                $name(self.0 * rhs)
            }
        }

        impl Div<f64> for $name {
            type Output = Self;
            #[inline]
            fn div(self, rhs: f64) -> Self {
                $name(self.0 / rhs)
            }
        }

        impl Neg for $name {
            type Output = Self;
            #[inline]
            fn neg(self) -> Self {
                $name(-self.0)
            }
        }

        impl AddAssign for $name {
            #[inline]
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl SubAssign for $name {
            #[inline]
            fn sub_assign(&mut self, rhs: Self) {
                self.0 -= rhs.0;
            }
        }
    };
}

/// 宽度 / 位移（米）
///
/// 夹爪总开口宽度或单指相对中心线的位移。
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

/// 线速度（米/秒）
///
/// 对夹爪而言，指总开口宽度的闭合速率，而不是单指速度。
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetersPerSecond(pub f64);

/// 力（牛顿）
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Newtons(pub f64);

impl_unit!(Meters, "m");
impl_unit!(MetersPerSecond, "m/s");
impl_unit!(Newtons, "N");

/// 距离 / 速度 = 秒
impl Div<MetersPerSecond> for Meters {
    type Output = f64;
    #[inline]
    fn div(self, rhs: MetersPerSecond) -> f64 {
        self.0 / rhs.0
    }
}

impl MetersPerSecond {
    /// 在给定时长内走过的距离
    #[inline]
    pub fn distance_over(self, seconds: f64) -> Meters {
        Meters(self.0 * seconds)
    }
}
