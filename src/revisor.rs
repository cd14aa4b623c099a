//! Pre-execution query rules.
//!
//! The revisor runs over normalized query text before anything reaches the
//! SQL engine. Rules either pass, rewrite the query (LIMIT clamped into
//! range), or reject it outright (joins).

use regex::Regex;

/// Outcome of running the revisor rules over a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Query is fine as written
    Pass,
    /// Query was auto-corrected; execute `query` instead and warn the user
    Rewritten {
        rule: &'static str,
        message: String,
        query: String,
    },
    /// Query must not be executed
    Rejected { rule: &'static str, message: String },
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// Rule engine run over a query before execution
pub struct Revisor {
    /// Normalized query: whitespace collapsed, trimmed, lowercased
    query: String,
    max_rows: usize,
}

impl Revisor {
    pub fn new(query: &str, max_rows: usize) -> Self {
        Self {
            query: normalize(query),
            max_rows,
        }
    }

    /// The normalized text the rules operate on
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Run all rules in order; the first non-pass verdict wins.
    pub fn run(&self) -> Verdict {
        for rule in [Self::rule_limit_range, Self::rule_no_joins] {
            let verdict = rule(self);
            if !verdict.is_pass() {
                return verdict;
            }
        }
        Verdict::Pass
    }

    /// LIMIT value, when present, must parse and stay within 0..=max_rows.
    /// Out-of-range values are clamped rather than rejected.
    fn rule_limit_range(&self) -> Verdict {
        if !self.query.contains("limit") {
            return Verdict::Pass;
        }

        // Unwrap is fine: pattern is a constant.
        let re = Regex::new(r"limit\s+(\d+)").unwrap();
        let limit: usize = match re.captures(&self.query).and_then(|c| c.get(1)) {
            Some(m) => match m.as_str().parse() {
                Ok(n) => n,
                Err(_) => {
                    return Verdict::Rejected {
                        rule: "limit-range",
                        message: format!("unable to parse LIMIT value: '{}'", m.as_str()),
                    }
                }
            },
            None => {
                return Verdict::Rejected {
                    rule: "limit-range",
                    message: "the query mentions LIMIT but carries no limit value".to_string(),
                }
            }
        };

        if limit > self.max_rows {
            let fixed = self.query.replace(
                &format!("limit {}", limit),
                &format!("limit {}", self.max_rows),
            );
            return Verdict::Rewritten {
                rule: "limit-range",
                message: format!(
                    "LIMIT must be between 0 and {}; clamped from {}",
                    self.max_rows, limit
                ),
                query: fixed,
            };
        }

        Verdict::Pass
    }

    /// Joins are not allowed: this is a single-table tool.
    fn rule_no_joins(&self) -> Verdict {
        const JOIN_KEYWORDS: &[&str] = &["left", "right", "full", "inner", "join"];

        if self
            .query
            .split_whitespace()
            .any(|word| JOIN_KEYWORDS.contains(&word))
        {
            return Verdict::Rejected {
                rule: "no-joins",
                message: "joins are not allowed: only one table is loaded".to_string(),
            };
        }
        Verdict::Pass
    }
}

/// Collapse runs of whitespace, trim, and lowercase
fn normalize(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_ROWS: usize = 10_000;

    #[test]
    fn test_normalize_collapses_whitespace() {
        let revisor = Revisor::new("  select * \nfrom     data limit  100  ", MAX_ROWS);
        assert_eq!(revisor.query(), "select * from data limit 100");
    }

    #[test]
    fn test_plain_query_passes() {
        let verdict = Revisor::new("SELECT * FROM data", MAX_ROWS).run();
        assert_eq!(verdict, Verdict::Pass);
    }

    #[test]
    fn test_limit_in_range_passes() {
        let verdict = Revisor::new("SELECT * FROM data LIMIT 100", MAX_ROWS).run();
        assert_eq!(verdict, Verdict::Pass);

        let verdict = Revisor::new("SELECT * FROM data LIMIT 10000", MAX_ROWS).run();
        assert_eq!(verdict, Verdict::Pass);
    }

    #[test]
    fn test_limit_above_max_is_clamped() {
        let verdict = Revisor::new("SELECT * FROM data LIMIT 50000", MAX_ROWS).run();
        match verdict {
            Verdict::Rewritten { rule, query, .. } => {
                assert_eq!(rule, "limit-range");
                assert_eq!(query, "select * from data limit 10000");
            }
            other => panic!("expected rewrite, got {:?}", other),
        }
    }

    #[test]
    fn test_limit_keyword_without_value_is_rejected() {
        let verdict = Revisor::new("SELECT * FROM data LIMIT", MAX_ROWS).run();
        match verdict {
            Verdict::Rejected { rule, .. } => assert_eq!(rule, "limit-range"),
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_joins_are_rejected() {
        for q in [
            "SELECT * FROM data JOIN other ON data.a = other.a",
            "select * from data left join x on 1=1",
            "SELECT * FROM data INNER JOIN y USING (a)",
        ] {
            match Revisor::new(q, MAX_ROWS).run() {
                Verdict::Rejected { rule, .. } => assert_eq!(rule, "no-joins"),
                other => panic!("expected rejection for {:?}, got {:?}", q, other),
            }
        }
    }

    #[test]
    fn test_join_keyword_inside_identifier_passes() {
        // "joined" is not the keyword "join"
        let verdict = Revisor::new("SELECT joined FROM data", MAX_ROWS).run();
        assert_eq!(verdict, Verdict::Pass);
    }

    #[test]
    fn test_limit_rule_runs_before_join_rule() {
        // A join query with a bad limit is rejected by whichever rule runs
        // first; the limit rule is first in the chain.
        let verdict = Revisor::new("SELECT * FROM data JOIN x LIMIT", MAX_ROWS).run();
        match verdict {
            Verdict::Rejected { rule, .. } => assert_eq!(rule, "limit-range"),
            other => panic!("expected rejection, got {:?}", other),
        }
    }
}
