//! Intent routing: decide per query whether a deterministic template can
//! answer it (zero model cost) or a generative call is needed, and at which
//! cost tier.
//!
//! Classification is an ordered table of declarative regex rules evaluated
//! first-match-wins — lightweight pattern matching, not NLP.

/// Router and decision types.
pub mod router;
/// The declarative rule tables.
pub mod rules;

pub use router::{Outcome, RouteDecision, Router, RouterConfig, Tier};
pub use rules::{LocalIntent, Rule};
