use ngon_core::{City, FoodItem, MealPeriod};
use ngon_router::Tier;

/// Maximum number of grounding items rendered into a prompt.
const MAX_CONTEXT_ITEMS: usize = 10;

/// Builds system prompts and grounding context for the generative service.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    /// System prompt for `tier`: flash gets a terse persona, pro a fuller
    /// advisory brief. Both carry the city, the clock hour, and the meal
    /// period so time-appropriate suggestions come naturally.
    pub fn build_system(
        &self,
        tier: Tier,
        city: City,
        hour: u32,
        meal: MealPeriod,
        user_address: Option<&str>,
    ) -> String {
        let loc = match user_address {
            Some(addr) => format!("User ở: {addr}."),
            None => "Không có địa chỉ cụ thể.".to_string(),
        };
        match tier {
            Tier::Flash => format!(
                "Bạn là trợ lý ẩm thực AI cho {}. Hiện tại: {hour}h ({}). {loc} \
                 Trả lời ngắn gọn, chính xác, bằng tiếng Việt.",
                city.display_name(),
                meal.label()
            ),
            Tier::Pro => format!(
                "Bạn là chuyên gia ẩm thực AI cho {}.\n\
                 Thời gian: {hour}h ({}). {loc}\n\
                 Nhiệm vụ: tư vấn món ăn, tìm quán phù hợp, gợi ý theo thời điểm.\n\
                 Luôn trả lời tiếng Việt, thân thiện, cụ thể và hữu ích.",
                city.display_name(),
                meal.label()
            ),
        }
    }

    /// Render retrieved items as a grounding block appended to the system
    /// prompt. Empty input renders nothing.
    pub fn food_context(&self, items: &[FoodItem]) -> String {
        if items.is_empty() {
            return String::new();
        }
        let lines: Vec<String> = items
            .iter()
            .take(MAX_CONTEXT_ITEMS)
            .map(|item| {
                let price = if item.has_price() {
                    format!(", {} đ", item.format_price_range())
                } else {
                    String::new()
                };
                let note = if item.note.is_empty() {
                    String::new()
                } else {
                    format!(", {}", item.note)
                };
                format!(
                    "- {} ({}) | {}, {}{price}{note}",
                    item.name, item.dish, item.address, item.district
                )
            })
            .collect();
        format!("Dữ liệu quán ăn:\n{}", lines.join("\n"))
    }

    /// Prompt asking the model to rank candidate places by proximity to a
    /// textual user address.
    pub fn nearby_prompt(
        &self,
        items: &[FoodItem],
        user_address: &str,
        city: City,
        food_type: &str,
    ) -> String {
        format!(
            "User ở: **{user_address}**, thành phố {}.\n\
             Tìm **{food_type}** gần nhất.\n\n{}\n\n\
             Xếp hạng TOP 5 quán gần user nhất theo địa chỉ. \
             Ưu tiên quán cùng quận/đường. Kèm lý do ngắn.",
            city.display_name(),
            self.food_context(items)
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn item(id: i64, name: &str) -> FoodItem {
        FoodItem {
            id,
            name: name.to_string(),
            dish: "Phở bò".to_string(),
            address: "13 Lò Đúc".to_string(),
            district: "Hai Bà Trưng".to_string(),
            city: "ha_noi".to_string(),
            price_min: 50_000,
            price_max: 70_000,
            note: String::new(),
        }
    }

    #[test]
    fn test_system_prompt_mentions_city_and_meal() {
        let pb = PromptBuilder;
        let prompt = pb.build_system(Tier::Flash, City::HaNoi, 7, MealPeriod::Breakfast, None);
        assert!(prompt.contains("Hà Nội"));
        assert!(prompt.contains("7h"));
        assert!(prompt.contains("Bữa sáng"));
        assert!(prompt.contains("Không có địa chỉ"));
    }

    #[test]
    fn test_system_prompt_includes_address_when_present() {
        let pb = PromptBuilder;
        let prompt = pb.build_system(
            Tier::Pro,
            City::DaNang,
            19,
            MealPeriod::Dinner,
            Some("gần cầu Rồng"),
        );
        assert!(prompt.contains("gần cầu Rồng"));
    }

    #[test]
    fn test_food_context_caps_items() {
        let pb = PromptBuilder;
        let items: Vec<FoodItem> = (0..15).map(|i| item(i, &format!("Quán {i}"))).collect();
        let ctx = pb.food_context(&items);
        assert_eq!(ctx.lines().count(), 1 + MAX_CONTEXT_ITEMS);
        assert!(ctx.contains("50k–70k"));
    }

    #[test]
    fn test_food_context_empty() {
        assert!(PromptBuilder.food_context(&[]).is_empty());
    }
}
