use regex::{Regex, RegexBuilder};

/// Sub-kind of a template-answerable query. The simple-query resolver
/// re-parses the text for keyword extraction; this classification only
/// decides that no generative call is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalIntent {
    /// "tôi muốn ăn phở" — list matching places.
    Listing,
    /// "so sánh giá bún chả và phở" — two-sided price comparison.
    PriceComparison,
    /// "phở giá bao nhiêu" — price lookup for one keyword.
    PriceLookup,
    /// "gợi ý món ăn sáng" — meal-time suggestion.
    Suggestion,
}

/// One declarative matcher: first matching rule wins, so order in
/// [`local_rules`] is part of the contract.
pub struct Rule {
    /// Stable name, surfaced in route decisions and logs.
    pub name: &'static str,
    /// Case-insensitive pattern over the raw query text.
    pub pattern: Regex,
    /// Intent the rule classifies to.
    pub intent: LocalIntent,
}

#[allow(clippy::expect_used)] // patterns are static literals, covered by tests
fn compile(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("static rule pattern")
}

/// The ordered local-rule table. Comparison rules come first so that
/// "so sánh giá X và Y" is not swallowed by the generic price lookup.
/// Each class carries a diacritic and a plain-ASCII form, since users type
/// both.
pub fn local_rules() -> Vec<Rule> {
    vec![
        Rule {
            name: "price_compare",
            pattern: compile(r"so s[aá]nh gi[aá]|so sanh gia"),
            intent: LocalIntent::PriceComparison,
        },
        Rule {
            name: "price_lookup",
            pattern: compile(
                r"gi[aá] (bao nhi[eê]u|th[eế] n[aà]o)|bao nhi[eê]u ti[eề]n|gia bao nhieu|bao nhieu tien",
            ),
            intent: LocalIntent::PriceLookup,
        },
        Rule {
            name: "want_to_eat",
            pattern: compile(
                r"t[oô]i (mu[oố]n|th[ií]ch|c[aầ]n) [aă]n|cho t[oô]i ([aă]n|th[uử])|toi (muon|thich|can) an|cho toi (an|thu)",
            ),
            intent: LocalIntent::Listing,
        },
        Rule {
            name: "suggest",
            pattern: compile(r"g[oợ]i [yý] (m[oó]n|đ[oồ] [aă]n|qu[aá]n)|goi y (mon|do an|quan)"),
            intent: LocalIntent::Suggestion,
        },
        Rule {
            name: "what_to_eat",
            pattern: compile(
                r"[aă]n g[iì] (ngon|b[aâ]y gi[oờ]|h[oô]m nay)|m[oó]n g[iì] ngon|an gi (ngon|bay gio|hom nay)|mon gi ngon",
            ),
            intent: LocalIntent::Suggestion,
        },
    ]
}

/// Markers of multi-part/compound requests that justify the expensive tier:
/// a three-way comparison, or a whole-day meal-planning request.
pub fn compound_markers() -> Vec<Regex> {
    vec![
        compile(r"so s[aá]nh.+(v[oớ]i|v[aà]|vs).+(v[oớ]i|v[aà]|vs)"),
        compile(r"(k[eế] ho[aạ]ch|l[iị]ch).+([aă]n|b[uữ]a).+(c[aả] ng[aà]y|h[oô]m nay)"),
    ]
}

/// Conjunctions used to count distinct sub-requests in one query.
pub fn conjunctions() -> Regex {
    compile(r"\b(v[aà]|v[oớ]i|vs|r[oồ]i)\b")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn first_match(query: &str) -> Option<&'static str> {
        local_rules()
            .iter()
            .find(|r| r.pattern.is_match(query))
            .map(|r| r.name)
    }

    #[test]
    fn test_want_to_eat_forms() {
        assert_eq!(first_match("tôi muốn ăn phở"), Some("want_to_eat"));
        assert_eq!(first_match("Tôi Thích Ăn bún chả"), Some("want_to_eat"));
        assert_eq!(first_match("toi muon an pho"), Some("want_to_eat"));
    }

    #[test]
    fn test_compare_wins_over_price_lookup() {
        assert_eq!(first_match("so sánh giá bún chả và phở"), Some("price_compare"));
        assert_eq!(first_match("phở giá bao nhiêu"), Some("price_lookup"));
    }

    #[test]
    fn test_suggestion_forms() {
        assert_eq!(first_match("gợi ý món ăn sáng"), Some("suggest"));
        assert_eq!(first_match("ăn gì ngon hôm nay"), Some("what_to_eat"));
    }

    #[test]
    fn test_non_local_queries_do_not_match() {
        assert_eq!(first_match("quán nào mở cửa sau nửa đêm gần hồ Tây?"), None);
    }

    #[test]
    fn test_compound_markers() {
        let markers = compound_markers();
        let hit = "so sánh phở với bún chả và bánh mì";
        assert!(markers.iter().any(|m| m.is_match(hit)));
        let miss = "so sánh giá bún chả và phở";
        assert!(!markers.iter().any(|m| m.is_match(miss)));
    }

    #[test]
    fn test_conjunction_counting() {
        let re = conjunctions();
        assert_eq!(re.find_iter("phở và bún và xôi").count(), 2);
        assert_eq!(re.find_iter("vàng anh").count(), 0);
    }
}
