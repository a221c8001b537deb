use crate::rules::{compound_markers, conjunctions, local_rules, LocalIntent, Rule};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Generative-model cost tier for escalated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Cheap/fast model, bounded at 800 output tokens.
    Flash,
    /// Expensive/higher-capability model, bounded at 1500 output tokens.
    Pro,
}

impl Tier {
    /// Output-token budget for this tier.
    pub fn max_output_tokens(&self) -> u32 {
        match self {
            Tier::Flash => 800,
            Tier::Pro => 1500,
        }
    }
}

/// Where a query should be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Answerable from structured data via templates, zero model cost.
    Local(LocalIntent),
    /// Needs a generative call at the given tier.
    Escalate(Tier),
}

/// The router's verdict for one query. Constructed per request, never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDecision {
    /// Local vs escalate (and at which tier).
    pub outcome: Outcome,
    /// Whether the caller supplied a location. Surfaced for downstream
    /// geo-aware ranking; never flips local-vs-escalate on its own.
    pub uses_location: bool,
    /// Name of the local rule that matched, for logs and tests.
    pub rule: Option<&'static str>,
}

impl RouteDecision {
    /// True when the decision avoids any generative-model cost.
    pub fn is_local(&self) -> bool {
        matches!(self.outcome, Outcome::Local(_))
    }
}

/// Heuristic knobs. The length threshold is the authoritative part of the
/// contract; the conjunction count is a tunable heuristic, not business
/// logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Queries longer than this (chars) escalate straight to [`Tier::Pro`].
    #[serde(default = "default_pro_length")]
    pub pro_length_threshold: usize,
    /// Number of conjunctions that marks a query as compound.
    #[serde(default = "default_min_conjunctions")]
    pub min_compound_conjunctions: usize,
}

fn default_pro_length() -> usize {
    200
}

fn default_min_conjunctions() -> usize {
    2
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            pro_length_threshold: default_pro_length(),
            min_compound_conjunctions: default_min_conjunctions(),
        }
    }
}

/// Classifies queries as template-answerable or escalated, first-match-wins
/// over the declarative rule table. Total and deterministic: every query
/// gets exactly one decision.
///
/// This is the primary cost-control point — the rule table is written so
/// that the bulk of everyday phrasing resolves to `Local`.
pub struct Router {
    rules: Vec<Rule>,
    compound: Vec<Regex>,
    conjunctions: Regex,
    config: RouterConfig,
}

impl Router {
    /// Router with default thresholds.
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    /// Router with explicit thresholds.
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            rules: local_rules(),
            compound: compound_markers(),
            conjunctions: conjunctions(),
            config,
        }
    }

    /// Decide how to answer `query`.
    pub fn route(&self, query: &str, has_location: bool) -> RouteDecision {
        let q = query.trim();

        for rule in &self.rules {
            if rule.pattern.is_match(q) {
                debug!(rule = rule.name, "query routed local");
                return RouteDecision {
                    outcome: Outcome::Local(rule.intent),
                    uses_location: has_location,
                    rule: Some(rule.name),
                };
            }
        }

        let tier = if self.is_heavy(q) {
            Tier::Pro
        } else {
            Tier::Flash
        };
        debug!(tier = ?tier, len = q.chars().count(), "query escalated");
        RouteDecision {
            outcome: Outcome::Escalate(tier),
            uses_location: has_location,
            rule: None,
        }
    }

    fn is_heavy(&self, q: &str) -> bool {
        if q.chars().count() > self.config.pro_length_threshold {
            return true;
        }
        if self.compound.iter().any(|m| m.is_match(q)) {
            return true;
        }
        self.conjunctions.find_iter(q).count() >= self.config.min_compound_conjunctions
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
