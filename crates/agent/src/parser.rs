//! Response parser: pulls in-band tool requests out of model text.
//!
//! The model is prompted to announce tool use in prose; each tool has one
//! recognition rule (its name as a marker, plus an optional argument
//! pattern). Rules run in a fixed order and each fires at most once per
//! response, so identical text always yields identical requests.

use aulabot_core::tool::ToolRequest;
use regex_lite::{Captures, Regex};
use tracing::error;

pub use aulabot_tools::aula::DEFAULT_CALENDAR_DAYS;

/// Turns raw model output into zero or more tool requests.
///
/// Implementations must be pure: no side effects, same input same output.
/// A native function-calling parser for providers that support it would
/// plug in here.
pub trait ToolCallParser: Send + Sync {
    fn parse(&self, response: &str) -> Vec<ToolRequest>;
}

type Build = fn(&Captures<'_>) -> Option<ToolRequest>;

enum Rule {
    /// Fires when `pattern` matches; arguments come from its captures.
    Pattern { pattern: Regex, build: Build },
    /// Fires when the marker appears anywhere.
    Marker {
        marker: &'static str,
        tool: &'static str,
        description: &'static str,
    },
    /// Fires with captured arguments when `pattern` matches, otherwise
    /// with `fallback` when the marker alone is present.
    WithDefault {
        marker: &'static str,
        pattern: Regex,
        build: Build,
        fallback: fn() -> ToolRequest,
    },
}

impl Rule {
    fn apply(&self, text: &str) -> Option<ToolRequest> {
        match self {
            Rule::Pattern { pattern, build } => pattern.captures(text).and_then(|c| build(&c)),
            Rule::Marker {
                marker,
                tool,
                description,
            } => text
                .contains(marker)
                .then(|| ToolRequest::new(*tool, *description)),
            Rule::WithDefault {
                marker,
                pattern,
                build,
                fallback,
            } => pattern
                .captures(text)
                .and_then(|c| build(&c))
                .or_else(|| text.contains(marker).then(*fallback)),
        }
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(pattern)
        .inspect_err(|e| error!(pattern, error = %e, "Invalid tool pattern"))
        .ok()
}

/// Text-pattern parser with an ordered rule set.
pub struct PatternParser {
    rules: Vec<Rule>,
}

fn search_request(c: &Captures<'_>) -> Option<ToolRequest> {
    let query = c.get(1)?.as_str();
    let number: i64 = c.get(2)?.as_str().parse().ok()?;
    Some(
        ToolRequest::new("google_search", format!("Search for: {query}"))
            .with_param("query", query)
            .with_param("query_number", number),
    )
}

fn fetch_request(c: &Captures<'_>) -> Option<ToolRequest> {
    let url = c.get(1)?.as_str();
    Some(ToolRequest::new("fetch_url", format!("Fetch content from: {url}")).with_param("url", url))
}

fn child_request(c: &Captures<'_>) -> Option<ToolRequest> {
    let name = c.get(1)?.as_str();
    Some(
        ToolRequest::new("set_active_child", format!("Set active child to: {name}"))
            .with_param("name", name),
    )
}

fn calendar_request(days: u64) -> ToolRequest {
    ToolRequest::new(
        "fetch_calendar",
        format!("Fetch calendar for next {days} days"),
    )
    .with_param("days", days)
}

fn calendar_days(c: &Captures<'_>) -> Option<ToolRequest> {
    let days = c.get(1)?.as_str().parse().ok()?;
    Some(calendar_request(days))
}

fn calendar_default() -> ToolRequest {
    calendar_request(DEFAULT_CALENDAR_DAYS)
}

impl PatternParser {
    fn from_rules(rules: Vec<Option<Rule>>) -> Self {
        Self {
            rules: rules.into_iter().flatten().collect(),
        }
    }

    /// `google_search` (query + query_number) then `fetch_url` (url).
    pub fn research() -> Self {
        Self::from_rules(vec![
            compile(r#"(?i)google_search.*?query[:\s]*["']([^"']+)["'].*?query_number[:\s]*(\d+)"#)
                .map(|pattern| Rule::Pattern {
                    pattern,
                    build: search_request,
                }),
            compile(r#"fetch_url.*?url[:\s]*["']([^"']+)["']"#).map(|pattern| Rule::Pattern {
                pattern,
                build: fetch_request,
            }),
        ])
    }

    /// The five portal tools, `fetch_calendar` defaulting to 14 days.
    pub fn aula() -> Self {
        Self::from_rules(vec![
            compile(r#"set_active_child.*?["']([^"']+)["']"#).map(|pattern| Rule::Pattern {
                pattern,
                build: child_request,
            }),
            Some(Rule::Marker {
                marker: "fetch_basic_data",
                tool: "fetch_basic_data",
                description: "Fetch basic data for all children",
            }),
            Some(Rule::Marker {
                marker: "fetch_daily_overview",
                tool: "fetch_daily_overview",
                description: "Fetch daily overview for active child",
            }),
            Some(Rule::Marker {
                marker: "fetch_messages",
                tool: "fetch_messages",
                description: "Fetch messages for active child",
            }),
            compile(r"fetch_calendar.*?(\d+)").map(|pattern| Rule::WithDefault {
                marker: "fetch_calendar",
                pattern,
                build: calendar_days,
                fallback: calendar_default,
            }),
        ])
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl ToolCallParser for PatternParser {
    fn parse(&self, response: &str) -> Vec<ToolRequest> {
        self.rules.iter().filter_map(|r| r.apply(response)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_rules_compile() {
        assert_eq!(PatternParser::research().rule_count(), 2);
        assert_eq!(PatternParser::aula().rule_count(), 5);
    }

    #[test]
    fn plain_answer_has_no_requests() {
        let parser = PatternParser::research();
        assert!(parser.parse("It will be sunny in Aarhus tomorrow.").is_empty());
    }

    #[test]
    fn search_needs_query_and_number() {
        let parser = PatternParser::research();
        let requests =
            parser.parse(r#"I'll call Google_Search with query: "skoleferie 2025" and query_number: 1"#);
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.name, "google_search");
        assert_eq!(req.description, "Search for: skoleferie 2025");
        assert_eq!(req.str_param("query"), Some("skoleferie 2025"));
        assert_eq!(req.int_param("query_number"), Some(1));

        assert!(parser.parse(r#"google_search query: "no number""#).is_empty());
    }

    #[test]
    fn search_and_fetch_in_one_response() {
        let parser = PatternParser::research();
        let text = r#"fetch_url url: "https://kk.dk/ferie" then google_search query 'uge 42' query_number 3"#;
        let requests = parser.parse(text);
        let names: Vec<&str> = requests.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["google_search", "fetch_url"]);
        assert_eq!(requests[1].str_param("url"), Some("https://kk.dk/ferie"));
        assert_eq!(requests[1].description, "Fetch content from: https://kk.dk/ferie");
    }

    #[test]
    fn each_rule_fires_once() {
        let parser = PatternParser::research();
        let text = r#"google_search query: "a" query_number: 1
google_search query: "b" query_number: 2"#;
        let requests = parser.parse(text);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].str_param("query"), Some("a"));
    }

    #[test]
    fn calendar_defaults_to_fourteen_days() {
        let parser = PatternParser::aula();
        let requests = parser.parse("Let me use fetch_calendar to look ahead.");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].int_param("days"), Some(14));
        assert_eq!(requests[0].description, "Fetch calendar for next 14 days");
    }

    #[test]
    fn calendar_uses_given_days() {
        let parser = PatternParser::aula();
        let requests = parser.parse("fetch_calendar for the next 30 days");
        assert_eq!(requests[0].int_param("days"), Some(30));
        assert_eq!(requests[0].description, "Fetch calendar for next 30 days");
    }

    #[test]
    fn aula_rules_keep_fixed_order() {
        let parser = PatternParser::aula();
        let text = r#"fetch_calendar 7, fetch_messages, fetch_daily_overview, fetch_basic_data, set_active_child("Emma")"#;
        let names: Vec<String> = parser.parse(text).into_iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "set_active_child",
                "fetch_basic_data",
                "fetch_daily_overview",
                "fetch_messages",
                "fetch_calendar"
            ]
        );
    }

    #[test]
    fn set_active_child_needs_quoted_name() {
        let parser = PatternParser::aula();
        let requests = parser.parse("set_active_child 'Oscar'");
        assert_eq!(requests[0].str_param("name"), Some("Oscar"));
        assert_eq!(requests[0].description, "Set active child to: Oscar");
        assert!(parser.parse("set_active_child Oscar").is_empty());
    }

    #[test]
    fn parsing_is_deterministic() {
        let parser = PatternParser::aula();
        let text = r#"set_active_child "Emma" then fetch_calendar 21"#;
        let first = parser.parse(text);
        for _ in 0..10 {
            assert_eq!(parser.parse(text), first);
        }
    }
}
