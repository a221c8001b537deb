use crate::error::{NgonError, NgonResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The six cities with packaged data (one SQLite store + one vector index
/// artifact each). Anything else is rejected with [`NgonError::NotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum City {
    HaNoi,
    HoChiMinh,
    DaNang,
    HaiPhong,
    HaLong,
    ThanhHoa,
}

impl City {
    /// All supported cities, in preload order.
    pub const ALL: [City; 6] = [
        City::HaNoi,
        City::HoChiMinh,
        City::DaNang,
        City::HaiPhong,
        City::HaLong,
        City::ThanhHoa,
    ];

    /// Stable identifier used in artifact paths and wire payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            City::HaNoi => "ha_noi",
            City::HoChiMinh => "ho_chi_minh",
            City::DaNang => "da_nang",
            City::HaiPhong => "hai_phong",
            City::HaLong => "ha_long",
            City::ThanhHoa => "thanh_hoa",
        }
    }

    /// Human-readable name, used in prompts and templated replies.
    pub fn display_name(&self) -> &'static str {
        match self {
            City::HaNoi => "Hà Nội",
            City::HoChiMinh => "TP. Hồ Chí Minh",
            City::DaNang => "Đà Nẵng",
            City::HaiPhong => "Hải Phòng",
            City::HaLong => "Hạ Long",
            City::ThanhHoa => "Thanh Hóa",
        }
    }

    /// Parse a city identifier. Unknown identifiers are a [`NgonError::NotFound`],
    /// not an [`NgonError::InvalidInput`]: the request shape is fine, the city
    /// simply has no data pack.
    pub fn parse(s: &str) -> NgonResult<City> {
        match s.trim() {
            "ha_noi" => Ok(City::HaNoi),
            "ho_chi_minh" => Ok(City::HoChiMinh),
            "da_nang" => Ok(City::DaNang),
            "hai_phong" => Ok(City::HaiPhong),
            "ha_long" => Ok(City::HaLong),
            "thanh_hoa" => Ok(City::ThanhHoa),
            other => Err(NgonError::NotFound(format!("unknown city: {other}"))),
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
