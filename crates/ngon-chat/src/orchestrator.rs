use crate::simple::{meal_keywords, SimpleResolver};
use ngon_core::{trim_history, ChatTurn, City, FoodItem, MealPeriod, NgonError, NgonResult};
use ngon_llm::{GenerativeBackend, PromptBuilder, StreamEvent};
use ngon_retrieval::{HybridRetriever, SearchMode};
use ngon_router::{Outcome, RouteDecision, Router, Tier};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Grounding items retrieved for an escalated query without location.
const ESCALATED_TOP_K: usize = 10;
/// Grounding items retrieved when the caller supplied a location; the model
/// filters down by proximity.
const NEARBY_TOP_K: usize = 15;
/// Token budget for the short suggestion blurb.
const SUGGEST_MAX_TOKENS: u32 = 400;
/// Capacity of the stream channel bridging a local reply.
const LOCAL_STREAM_CAPACITY: usize = 4;

/// One incoming chat request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// The user's message.
    pub message: String,
    /// City identifier (e.g. `ha_noi`).
    pub city: String,
    /// Prior turns, oldest first. Trimmed to the history window before use.
    pub history: Vec<ChatTurn>,
    /// Free-text user location, if shared.
    pub user_address: Option<String>,
    /// Local clock hour, 0..=23.
    pub hour: u32,
}

/// A complete (non-streaming) answer.
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// Answer text; never empty.
    pub text: String,
    /// Items the answer was grounded on.
    pub items: Vec<FoodItem>,
    /// Tier used, or `None` when the zero-cost path answered.
    pub tier: Option<Tier>,
}

/// Meal-time suggestion result.
#[derive(Debug, Clone)]
pub struct Suggestion {
    /// The meal period the hour resolved to.
    pub meal: MealPeriod,
    /// Up to three suggested items.
    pub items: Vec<FoodItem>,
    /// Rendered blurb.
    pub text: String,
}

/// Ties routing, retrieval, templates, and the generative backend together.
///
/// Every request flows route → (simple | retrieve + generate), with the
/// degradation ladder applied at each seam: retrieval failures reduce an
/// escalated answer to ungrounded generation, generation failures reduce it
/// to a templated retrieval-only reply.
pub struct ChatOrchestrator {
    router: Router,
    retriever: Arc<HybridRetriever>,
    simple: SimpleResolver,
    prompts: PromptBuilder,
    backend: Arc<dyn GenerativeBackend>,
    generate_timeout: Duration,
}

impl ChatOrchestrator {
    /// Orchestrator over the given retriever and backend.
    pub fn new(
        router: Router,
        retriever: Arc<HybridRetriever>,
        backend: Arc<dyn GenerativeBackend>,
    ) -> Self {
        Self {
            router,
            retriever,
            simple: SimpleResolver::new(),
            prompts: PromptBuilder,
            backend,
            generate_timeout: Duration::from_secs(30),
        }
    }

    /// Override the per-call generation timeout.
    pub fn with_generate_timeout(mut self, timeout: Duration) -> Self {
        self.generate_timeout = timeout;
        self
    }

    /// Answer a request end to end.
    pub async fn answer(&self, request: &ChatRequest) -> NgonResult<ChatReply> {
        let (decision, city) = self.prepare(request)?;

        if decision.is_local() {
            if let Some(reply) = self
                .simple
                .resolve(&request.message, &self.retriever, &request.city, request.hour)
                .await?
            {
                info!(rule = ?decision.rule, "answered on the zero-cost path");
                return Ok(ChatReply {
                    text: reply.text,
                    items: reply.items,
                    tier: None,
                });
            }
            // The router saw a template-answerable shape but extraction
            // failed; fall through to the cheap tier.
            warn!("local intent extraction failed, escalating to flash");
        }

        let tier = match decision.outcome {
            Outcome::Escalate(tier) => tier,
            Outcome::Local(_) => Tier::Flash,
        };
        self.answer_escalated(request, city, tier, decision.uses_location)
            .await
    }

    /// Answer a request as a stream of events. Local replies arrive as one
    /// delta followed by `Done`; escalated replies forward the backend's
    /// stream unchanged.
    pub async fn answer_stream(
        &self,
        request: &ChatRequest,
    ) -> NgonResult<(mpsc::Receiver<StreamEvent>, JoinHandle<NgonResult<String>>)> {
        let (decision, city) = self.prepare(request)?;

        if decision.is_local() {
            if let Some(reply) = self
                .simple
                .resolve(&request.message, &self.retriever, &request.city, request.hour)
                .await?
            {
                return Ok(single_delta_stream(reply.text));
            }
            warn!("local intent extraction failed, escalating to flash");
        }

        let tier = match decision.outcome {
            Outcome::Escalate(tier) => tier,
            Outcome::Local(_) => Tier::Flash,
        };
        let (system, history, items) = self
            .grounded_system(request, city, tier, decision.uses_location)
            .await?;
        match self
            .backend
            .generate_stream(
                tier,
                &system,
                history,
                &request.message,
                tier.max_output_tokens(),
            )
            .await
        {
            Ok(stream) => Ok(stream),
            // Same ladder as the blocking path: a dead or timed-out backend
            // degrades to a templated listing, delivered in stream shape.
            Err(e) => {
                warn!(tier = ?tier, error = %e, "stream start failed, degrading to listing");
                Ok(single_delta_stream(crate::simple::render_fallback_listing(
                    &request.message,
                    &items,
                )))
            }
        }
    }

    /// What should one eat right now: resolve the meal period, retrieve
    /// matching items, and have the cheap tier phrase a short blurb.
    pub async fn suggest(&self, city_id: &str, hour: u32) -> NgonResult<Suggestion> {
        let city = City::parse(city_id)?;
        let meal = MealPeriod::from_hour(hour)?;
        let keywords = meal_keywords(meal);

        let mut items = self.retrieve_degraded(city_id, keywords, 8).await;
        items.truncate(3);

        let system = self.prompts.build_system(Tier::Flash, city, hour, meal, None);
        let message = format!(
            "{}\n\nGợi ý 2-3 món cho {} từ danh sách trên. Ngắn gọn, kèm giá.",
            self.prompts.food_context(&items),
            meal.label()
        );
        let text = match tokio::time::timeout(
            self.generate_timeout,
            self.backend
                .generate(Tier::Flash, &system, &[], &message, SUGGEST_MAX_TOKENS),
        )
        .await
        {
            Ok(Ok(text)) if !text.trim().is_empty() => text,
            Ok(Err(e)) => {
                warn!(error = %e, "suggestion generation failed, using template");
                crate::simple::render_fallback_suggestion(meal, &items)
            }
            Err(_) => {
                warn!("suggestion generation timed out, using template");
                crate::simple::render_fallback_suggestion(meal, &items)
            }
            Ok(Ok(_)) => crate::simple::render_fallback_suggestion(meal, &items),
        };

        Ok(Suggestion { meal, items, text })
    }

    /// Rank places near a textual address: retrieve broadly, let the model
    /// order by proximity, degrade to a plain listing when it cannot.
    pub async fn nearby(
        &self,
        food_type: &str,
        city_id: &str,
        user_address: &str,
        hour: u32,
    ) -> NgonResult<ChatReply> {
        let city = City::parse(city_id)?;
        if food_type.trim().is_empty() {
            return Err(NgonError::InvalidInput("empty food type".to_string()));
        }
        let meal = MealPeriod::from_hour(hour)?;

        let mut items = self.retrieve_degraded(city_id, food_type, NEARBY_TOP_K).await;
        let system = self
            .prompts
            .build_system(Tier::Flash, city, hour, meal, Some(user_address));
        let prompt = self.prompts.nearby_prompt(&items, user_address, city, food_type);

        let text = match tokio::time::timeout(
            self.generate_timeout,
            self.backend.generate(
                Tier::Flash,
                &system,
                &[],
                &prompt,
                Tier::Flash.max_output_tokens(),
            ),
        )
        .await
        {
            Ok(Ok(text)) if !text.trim().is_empty() => text,
            Ok(Err(e)) => {
                warn!(error = %e, "nearby ranking failed, returning plain listing");
                crate::simple::render_fallback_listing(food_type, &items)
            }
            Err(_) => {
                warn!("nearby ranking timed out, returning plain listing");
                crate::simple::render_fallback_listing(food_type, &items)
            }
            Ok(Ok(_)) => crate::simple::render_fallback_listing(food_type, &items),
        };

        items.truncate(10);
        Ok(ChatReply {
            text,
            items,
            tier: Some(Tier::Flash),
        })
    }

    fn prepare(&self, request: &ChatRequest) -> NgonResult<(RouteDecision, City)> {
        if request.message.trim().is_empty() {
            return Err(NgonError::InvalidInput("empty message".to_string()));
        }
        let city = City::parse(&request.city)?;
        let decision = self
            .router
            .route(&request.message, request.user_address.is_some());
        Ok((decision, city))
    }

    async fn answer_escalated(
        &self,
        request: &ChatRequest,
        city: City,
        tier: Tier,
        uses_location: bool,
    ) -> NgonResult<ChatReply> {
        let top_k = if uses_location {
            NEARBY_TOP_K
        } else {
            ESCALATED_TOP_K
        };
        let items = self
            .retrieve_degraded(&request.city, &request.message, top_k)
            .await;

        let meal = MealPeriod::from_hour(request.hour)?;
        let system = self.grounded_prompt(request, city, tier, meal, &items);
        let history = trim_history(&request.history);

        let text = match tokio::time::timeout(
            self.generate_timeout,
            self.backend.generate(
                tier,
                &system,
                history,
                &request.message,
                tier.max_output_tokens(),
            ),
        )
        .await
        {
            Ok(Ok(text)) if !text.trim().is_empty() => text,
            Ok(Err(e)) => {
                warn!(tier = ?tier, error = %e, "generation failed, degrading to listing");
                crate::simple::render_fallback_listing(&request.message, &items)
            }
            Err(_) => {
                warn!(tier = ?tier, "generation timed out, degrading to listing");
                crate::simple::render_fallback_listing(&request.message, &items)
            }
            Ok(Ok(_)) => crate::simple::render_fallback_listing(&request.message, &items),
        };

        Ok(ChatReply {
            text,
            items,
            tier: Some(tier),
        })
    }

    async fn grounded_system<'a>(
        &self,
        request: &'a ChatRequest,
        city: City,
        tier: Tier,
        uses_location: bool,
    ) -> NgonResult<(String, &'a [ChatTurn], Vec<FoodItem>)> {
        let top_k = if uses_location {
            NEARBY_TOP_K
        } else {
            ESCALATED_TOP_K
        };
        let items = self
            .retrieve_degraded(&request.city, &request.message, top_k)
            .await;
        let meal = MealPeriod::from_hour(request.hour)?;
        let system = self.grounded_prompt(request, city, tier, meal, &items);
        Ok((system, trim_history(&request.history), items))
    }

    fn grounded_prompt(
        &self,
        request: &ChatRequest,
        city: City,
        tier: Tier,
        meal: MealPeriod,
        items: &[FoodItem],
    ) -> String {
        let base = self.prompts.build_system(
            tier,
            city,
            request.hour,
            meal,
            request.user_address.as_deref(),
        );
        let context = self.prompts.food_context(items);
        if context.is_empty() {
            base
        } else {
            format!("{base}\n\n{context}")
        }
    }

    /// Retrieval for the escalated path: grounding is best-effort, so every
    /// failure except a bad query degrades to an empty context.
    async fn retrieve_degraded(&self, city: &str, query: &str, top_k: usize) -> Vec<FoodItem> {
        match self
            .retriever
            .search(city, query, top_k, SearchMode::Hybrid)
            .await
        {
            Ok(hits) => hits.into_iter().map(|h| h.item).collect(),
            Err(e) => {
                warn!(city, error = %e, "grounding retrieval failed, continuing without context");
                Vec::new()
            }
        }
    }
}

/// A complete reply in stream shape: one `TextDelta` carrying the whole
/// text, then `Done`. Used for local answers and degraded escalations so
/// stream consumers see one uniform protocol.
fn single_delta_stream(
    text: String,
) -> (mpsc::Receiver<StreamEvent>, JoinHandle<NgonResult<String>>) {
    let (tx, rx) = mpsc::channel(LOCAL_STREAM_CAPACITY);
    let handle = tokio::spawn(async move {
        if tx
            .send(StreamEvent::TextDelta { text: text.clone() })
            .await
            .is_ok()
        {
            let _ = tx.send(StreamEvent::Done).await;
        }
        Ok(text)
    });
    (rx, handle)
}
