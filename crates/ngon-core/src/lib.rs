//! Shared domain types for the `ngon` food-advisory engine.
//!
//! Everything here is plain data plus a couple of pure functions: the error
//! taxonomy, the supported cities, the [`FoodItem`] unit of retrieval,
//! bounded chat history, and the hour → meal-period table.

/// Conversation turns and history trimming.
pub mod chat;
/// Supported cities.
pub mod city;
/// Error taxonomy.
pub mod error;
/// Retrievable food items and price formatting.
pub mod food;
/// Hour → meal-period resolution.
pub mod meal;

pub use chat::{trim_history, ChatTurn, Role, MAX_HISTORY_TURNS};
pub use city::City;
pub use error::{NgonError, NgonResult};
pub use food::{format_price_range, FoodItem};
pub use meal::MealPeriod;
