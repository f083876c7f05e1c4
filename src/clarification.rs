//! Keyword heuristics over the agent's final reply.
//!
//! Both scans are plain case-insensitive substring tests, so "to" also hits
//! "today" and "what" hits "whatever". Callers depend on that behavior.

use serde::Serialize;

const CLARIFICATION_INDICATORS: &[&str] = &[
    "what",
    "when",
    "where",
    "which",
    "how many",
    "need to know",
    "please provide",
    "can you tell me",
    "missing",
    "require",
    "specify",
];

/// Keyword groups and the missing-parameter token each one reports, in
/// report order.
const MISSING_PARAM_RULES: &[(&[&str], &str)] = &[
    (&["departure", "from"], "departure_location"),
    (&["arrival", "destination", "to"], "arrival_location"),
    (&["check-in", "check in"], "check_in_date"),
    (&["check-out", "check out"], "check_out_date"),
    (&["date", "when"], "dates"),
    (&["passenger", "traveler", "guest"], "passengers_or_guests"),
    (&["location", "where"], "location"),
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClarificationAnalysis {
    pub needs_clarification: bool,
    pub missing_params: Vec<String>,
}

/// Decides whether `reply` asks the user for more information and, if so,
/// which parameters it seems to be asking about.
pub fn analyze_reply(reply: &str) -> ClarificationAnalysis {
    let lower = reply.to_lowercase();
    if !CLARIFICATION_INDICATORS.iter().any(|k| lower.contains(k)) {
        return ClarificationAnalysis::default();
    }

    let missing_params = MISSING_PARAM_RULES
        .iter()
        .filter(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, param)| param.to_string())
        .collect();

    ClarificationAnalysis {
        needs_clarification: true,
        missing_params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_without_indicators_is_final() {
        let analysis = analyze_reply("I found 3 flights departing at 9am.");
        assert_eq!(analysis, ClarificationAnalysis::default());
    }

    #[test]
    fn question_reports_params_in_rule_order() {
        let analysis =
            analyze_reply("Where are you flying from, and what is your departure date?");
        assert!(analysis.needs_clarification);
        assert_eq!(
            analysis.missing_params,
            vec!["departure_location", "dates", "location"]
        );
    }

    #[test]
    fn substring_matches_are_kept() {
        // "today" contains "to" and "whatever" contains "what".
        let analysis = analyze_reply("Whatever works today.");
        assert!(analysis.needs_clarification);
        assert_eq!(analysis.missing_params, vec!["arrival_location"]);
    }

    #[test]
    fn hotel_questions() {
        let analysis = analyze_reply("Please provide your check-in and check out dates and guest count.");
        assert_eq!(
            analysis.missing_params,
            vec!["check_in_date", "check_out_date", "dates", "passengers_or_guests"]
        );
    }

    #[test]
    fn depends_only_on_text() {
        let reply = "Which departure airport should I use?";
        assert_eq!(analyze_reply(reply), analyze_reply(reply));
        assert!(analyze_reply(reply)
            .missing_params
            .contains(&"departure_location".to_string()));
    }
}
