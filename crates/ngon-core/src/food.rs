use serde::{Deserialize, Serialize};

/// One retrievable unit: a dish served at a specific place.
///
/// Loaded read-only from a per-city store and never mutated afterwards.
/// `id` is stable but only unique within its city. Prices are VND;
/// `price_min <= price_max`, with `0` meaning "no price data".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FoodItem {
    /// Row id in the city's `food` table.
    pub id: i64,
    /// Restaurant / stall name.
    pub name: String,
    /// Dish name.
    pub dish: String,
    /// Street address.
    pub address: String,
    /// District within the city.
    pub district: String,
    /// Owning city identifier (e.g. `ha_noi`).
    pub city: String,
    /// Lower price bound in VND.
    pub price_min: u32,
    /// Upper price bound in VND.
    pub price_max: u32,
    /// Free-text note; also the text embedded for semantic search.
    #[serde(default)]
    pub note: String,
}

impl FoodItem {
    /// True if the item carries usable price data. Source data uses 0 and 1
    /// as "unknown" sentinels.
    pub fn has_price(&self) -> bool {
        self.price_min > 1 || self.price_max > 1
    }

    /// Midpoint of the price range, for comparisons.
    pub fn price_mid(&self) -> f64 {
        // Convert before adding; the sum of two u32 prices can overflow.
        (f64::from(self.price_min) + f64::from(self.price_max)) / 2.0
    }

    /// Render the price range the way replies display it: "45k–60k",
    /// "40k" when both bounds agree, "Chưa có giá" when unknown.
    pub fn format_price_range(&self) -> String {
        format_price_range(self.price_min, self.price_max)
    }
}

/// Format a VND price range in thousands.
pub fn format_price_range(min: u32, max: u32) -> String {
    if min <= 1 && max <= 1 {
        return "Chưa có giá".to_string();
    }
    if min == max {
        return format!("{}k", max / 1000);
    }
    format!("{}k–{}k", min / 1000, max / 1000)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn item(min: u32, max: u32) -> FoodItem {
        FoodItem {
            id: 1,
            name: "Phở Thìn".to_string(),
            dish: "Phở bò".to_string(),
            address: "13 Lò Đúc".to_string(),
            district: "Hai Bà Trưng".to_string(),
            city: "ha_noi".to_string(),
            price_min: min,
            price_max: max,
            note: String::new(),
        }
    }

    #[test]
    fn test_format_price_range() {
        assert_eq!(item(45_000, 60_000).format_price_range(), "45k–60k");
        assert_eq!(item(40_000, 40_000).format_price_range(), "40k");
        assert_eq!(item(0, 0).format_price_range(), "Chưa có giá");
        assert_eq!(item(1, 1).format_price_range(), "Chưa có giá");
    }

    #[test]
    fn test_has_price_sentinels() {
        assert!(!item(0, 0).has_price());
        assert!(!item(1, 1).has_price());
        assert!(item(0, 30_000).has_price());
    }

    #[test]
    fn test_price_mid() {
        assert!((item(40_000, 60_000).price_mid() - 50_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_price_mid_large_values_do_not_overflow() {
        let mid = item(u32::MAX, u32::MAX).price_mid();
        assert!((mid - f64::from(u32::MAX)).abs() < 1.0);
    }
}
