use ngon_core::{FoodItem, MealPeriod, NgonError, NgonResult};
use ngon_retrieval::{HybridRetriever, SearchMode};
use regex::{Regex, RegexBuilder};
use tracing::warn;

/// Search keywords per meal period, used when a suggestion query names no
/// dish of its own.
pub fn meal_keywords(meal: MealPeriod) -> &'static str {
    match meal {
        MealPeriod::Breakfast => "bún phở bánh mì xôi",
        MealPeriod::Lunch => "cơm bún mì",
        MealPeriod::AfternoonSnack => "ăn vặt chè bánh",
        MealPeriod::Dinner => "lẩu nướng cơm",
        MealPeriod::LateNight => "cháo mì bún",
    }
}

/// Structured sub-intent extracted from a template-answerable query,
/// carrying the keyword(s) the retriever should be asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleIntent {
    /// List places serving the keyword.
    Listing(String),
    /// Price range for one keyword.
    PriceLookup(String),
    /// Price ranges for two keywords, side by side.
    PriceCompare(String, String),
    /// Meal-time suggestion; empty keyword means "whatever fits the hour".
    Suggestion(String),
}

/// The deterministic reply of the zero-cost path.
#[derive(Debug, Clone)]
pub struct SimpleReply {
    /// Rendered answer text; never empty.
    pub text: String,
    /// Items the answer references.
    pub items: Vec<FoodItem>,
    /// Always `false` on this path; kept explicit so callers and tests can
    /// assert no model cost was incurred.
    pub used_generative_model: bool,
}

/// Answers `Local`-routed queries from retrieval plus templates, without any
/// generative-model call.
///
/// The router only decided *that* the query is template-answerable; this
/// resolver re-parses the text to pull out the keyword(s) to retrieve.
pub struct SimpleResolver {
    compare: Regex,
    price: Regex,
    want: Regex,
    suggest_trigger: Regex,
    suggest_keyword: Regex,
}

#[allow(clippy::expect_used)] // static patterns, covered by tests
fn compile(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("static intent pattern")
}

impl SimpleResolver {
    /// Resolver with the built-in extraction patterns.
    pub fn new() -> Self {
        Self {
            compare: compile(
                r"so s[aá]nh\s+(?:gi[aá]\s+)?(.+?)\s+(?:v[aà]|v[oớ]i|vs)\s+(.+?)\s*[.?!]?\s*$",
            ),
            price: compile(
                r"(.+?)\s+(?:gi[aá] bao nhi[eê]u|bao nhi[eê]u ti[eề]n|gi[aá] th[eế] n[aà]o|gia bao nhieu|bao nhieu tien)",
            ),
            want: compile(
                r"(?:t[oô]i (?:mu[oố]n|th[ií]ch|c[aầ]n) [aă]n|cho t[oô]i [aă]n|toi (?:muon|thich|can) an|cho toi an)\s+(.+?)\s*[.?!]?\s*$",
            ),
            suggest_trigger: compile(
                r"g[oợ]i [yý]|goi y|[aă]n g[iì] ngon|m[oó]n g[iì] ngon|an gi ngon|mon gi ngon|[aă]n g[iì] (b[aâ]y gi[oờ]|h[oô]m nay)",
            ),
            suggest_keyword: compile(r"(?:g[oợ]i [yý]|goi y)\s+(?:m[oó]n\s+)?(.+?)\s*[.?!]?\s*$"),
        }
    }

    /// Extract a structured sub-intent, or `None` when the query needs the
    /// generative path after all (the caller then escalates).
    pub fn parse_intent(&self, query: &str) -> Option<SimpleIntent> {
        let q = query.trim().to_lowercase();

        if let Some(caps) = self.compare.captures(&q) {
            return Some(SimpleIntent::PriceCompare(
                caps[1].trim().to_string(),
                caps[2].trim().to_string(),
            ));
        }
        if let Some(caps) = self.price.captures(&q) {
            return Some(SimpleIntent::PriceLookup(caps[1].trim().to_string()));
        }
        if let Some(caps) = self.want.captures(&q) {
            return Some(SimpleIntent::Listing(caps[1].trim().to_string()));
        }
        if self.suggest_trigger.is_match(&q) {
            let keyword = self
                .suggest_keyword
                .captures(&q)
                .map(|caps| caps[1].trim().to_string())
                .unwrap_or_default();
            return Some(SimpleIntent::Suggestion(keyword));
        }
        None
    }

    /// Answer `query` deterministically. `Ok(None)` means no structured
    /// intent could be extracted; the caller should escalate instead.
    pub async fn resolve(
        &self,
        query: &str,
        retriever: &HybridRetriever,
        city: &str,
        hour: u32,
    ) -> NgonResult<Option<SimpleReply>> {
        let Some(intent) = self.parse_intent(query) else {
            return Ok(None);
        };

        let reply = match intent {
            SimpleIntent::Listing(kw) => {
                let items = self.retrieve(retriever, city, &kw, 10).await?;
                SimpleReply {
                    text: render_listing(&kw, &items),
                    items,
                    used_generative_model: false,
                }
            }
            SimpleIntent::PriceLookup(kw) => {
                let items = self.retrieve(retriever, city, &kw, 8).await?;
                SimpleReply {
                    text: render_price(&kw, &items),
                    items,
                    used_generative_model: false,
                }
            }
            SimpleIntent::PriceCompare(kw1, kw2) => {
                // The two lookups are independent; run them concurrently and
                // render only once both are in.
                let (left, right) = tokio::join!(
                    self.retrieve(retriever, city, &kw1, 5),
                    self.retrieve(retriever, city, &kw2, 5),
                );
                let (left, right) = (left?, right?);
                let text = render_compare(&kw1, &left, &kw2, &right);
                let mut items = left;
                items.extend(right);
                SimpleReply {
                    text,
                    items,
                    used_generative_model: false,
                }
            }
            SimpleIntent::Suggestion(kw) => {
                let meal = MealPeriod::from_hour(hour)?;
                let keyword = if kw.is_empty() {
                    meal_keywords(meal).to_string()
                } else {
                    kw
                };
                let items = self.retrieve(retriever, city, &keyword, 8).await?;
                SimpleReply {
                    text: render_suggestion(meal, &items),
                    items,
                    used_generative_model: false,
                }
            }
        };
        Ok(Some(reply))
    }

    /// Retrieval with the degradation policy of the zero-cost path: unknown
    /// city and invalid input propagate; infrastructure failures degrade to
    /// an empty result so templates can still answer with "not found".
    async fn retrieve(
        &self,
        retriever: &HybridRetriever,
        city: &str,
        keyword: &str,
        top_k: usize,
    ) -> NgonResult<Vec<FoodItem>> {
        match retriever
            .search(city, keyword, top_k, SearchMode::Hybrid)
            .await
        {
            Ok(hits) => Ok(hits.into_iter().map(|h| h.item).collect()),
            Err(e @ (NgonError::NotFound(_) | NgonError::InvalidInput(_))) => Err(e),
            Err(e) => {
                warn!(city, keyword, error = %e, "retrieval degraded to empty");
                Ok(Vec::new())
            }
        }
    }
}

impl Default for SimpleResolver {
    fn default() -> Self {
        Self::new()
    }
}

// ---- templates ----

/// Plain listing used both by the zero-cost path and as the degraded reply
/// when generation fails.
pub fn render_fallback_listing(keyword: &str, items: &[FoodItem]) -> String {
    render_listing(keyword, items)
}

/// Templated suggestion used when the generative blurb is unavailable.
pub fn render_fallback_suggestion(meal: MealPeriod, items: &[FoodItem]) -> String {
    render_suggestion(meal, items)
}

fn render_listing(keyword: &str, items: &[FoodItem]) -> String {
    if items.is_empty() {
        return format!("Chưa tìm thấy quán **{keyword}** nào. Thử từ khoá khác nhé! 🙏");
    }
    let lines: Vec<String> = items
        .iter()
        .take(5)
        .enumerate()
        .map(|(i, item)| {
            format!(
                "{}. **{}** ({})\n   📍 {}, {}\n   💰 {}",
                i + 1,
                item.name,
                item.dish,
                item.address,
                item.district,
                item.format_price_range()
            )
        })
        .collect();
    format!(
        "Tìm được **{} quán {keyword}** 🍽️\n\n{}",
        items.len(),
        lines.join("\n\n")
    )
}

fn render_price(keyword: &str, items: &[FoodItem]) -> String {
    let priced: Vec<&FoodItem> = items.iter().filter(|i| i.has_price()).take(5).collect();
    if priced.is_empty() {
        return format!("Chưa có thông tin giá của **{keyword}**.");
    }
    let lines: Vec<String> = priced
        .iter()
        .map(|i| format!("• **{}**: {} đ", i.name, i.format_price_range()))
        .collect();
    let lo = priced.iter().map(|i| i.price_min).filter(|p| *p > 1).min();
    let hi = priced.iter().map(|i| i.price_max).filter(|p| *p > 1).max();
    let range = match (lo, hi) {
        (Some(lo), Some(hi)) => {
            format!("\n\n*Dao động: {} đ*", ngon_core::format_price_range(lo, hi))
        }
        _ => String::new(),
    };
    format!("💰 **Giá {keyword}:**\n\n{}{range}", lines.join("\n"))
}

fn render_compare(kw1: &str, left: &[FoodItem], kw2: &str, right: &[FoodItem]) -> String {
    fn block(keyword: &str, items: &[FoodItem]) -> String {
        match items.iter().find(|i| i.has_price()) {
            Some(item) => format!("**{keyword}**: {} đ", item.format_price_range()),
            None => format!("**{keyword}**: chưa có giá"),
        }
    }
    fn avg(items: &[FoodItem]) -> Option<f64> {
        let priced: Vec<&FoodItem> = items.iter().filter(|i| i.has_price()).collect();
        if priced.is_empty() {
            return None;
        }
        Some(priced.iter().map(|i| i.price_mid()).sum::<f64>() / priced.len() as f64)
    }

    let verdict = match (avg(left), avg(right)) {
        (Some(a), Some(b)) => {
            let winner = if a < b { kw1 } else { kw2 };
            format!("\n\n👉 **{winner}** thường rẻ hơn")
        }
        _ => String::new(),
    };
    format!(
        "💰 So sánh giá:\n\n{}\n{}{verdict}",
        block(kw1, left),
        block(kw2, right)
    )
}

fn render_suggestion(meal: MealPeriod, items: &[FoodItem]) -> String {
    if items.is_empty() {
        return format!(
            "Hiện tại {}, chưa có gợi ý phù hợp. Bạn có thể thử các món phổ biến trong vùng.",
            meal.label()
        );
    }
    let lines: Vec<String> = items
        .iter()
        .take(3)
        .enumerate()
        .map(|(i, item)| {
            format!(
                "{}. **{}** – {} – {} đ",
                i + 1,
                item.dish,
                item.name,
                item.format_price_range()
            )
        })
        .collect();
    format!("🍽️ Gợi ý {}:\n\n{}", meal.label(), lines.join("\n"))
}
