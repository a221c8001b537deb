use crate::error::{NgonError, NgonResult};
use serde::{Deserialize, Serialize};

/// Meal period for a given clock hour. Half-open hour ranges; the late-night
/// period wraps around midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealPeriod {
    /// 06:00–09:59.
    Breakfast,
    /// 10:00–13:59.
    Lunch,
    /// 14:00–16:59.
    AfternoonSnack,
    /// 17:00–20:59.
    Dinner,
    /// 21:00–05:59.
    LateNight,
}

impl MealPeriod {
    /// Resolve a clock hour (0–23) to its meal period.
    /// Hours outside 0–23 are rejected with [`NgonError::InvalidInput`].
    pub fn from_hour(hour: u32) -> NgonResult<MealPeriod> {
        match hour {
            6..=9 => Ok(MealPeriod::Breakfast),
            10..=13 => Ok(MealPeriod::Lunch),
            14..=16 => Ok(MealPeriod::AfternoonSnack),
            17..=20 => Ok(MealPeriod::Dinner),
            21..=23 | 0..=5 => Ok(MealPeriod::LateNight),
            _ => Err(NgonError::InvalidInput(format!(
                "hour out of range 0-23: {hour}"
            ))),
        }
    }

    /// Vietnamese label used in prompts and templated replies.
    pub fn label(&self) -> &'static str {
        match self {
            MealPeriod::Breakfast => "Bữa sáng",
            MealPeriod::Lunch => "Bữa trưa",
            MealPeriod::AfternoonSnack => "Xế chiều",
            MealPeriod::Dinner => "Bữa tối",
            MealPeriod::LateNight => "Ăn đêm",
        }
    }
}
