//! Keyword tables, type mappings and bucket layouts used to classify
//! questions and group their numeric features.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

/// Placeholder for a missing difficulty or an undeterminable output type.
pub const DEFAULT_NA_VALUE: &str = "Unknown";
/// Category assigned when no algorithm keyword matches.
pub const UNCATEGORIZED: &str = "Uncategorized";
/// Input type assigned when no input keyword matches.
pub const MIXED_INPUT_TYPE: &str = "Mixed/Other";
/// The sole tag of a question that matched no tag keywords.
pub const UNCATEGORIZED_TAG: &str = "uncategorized";

/// A label and the lower-case keywords that select it.
pub type KeywordGroup = (&'static str, &'static [&'static str]);

// ── Keyword tables ────────────────────────────────────────────────────────────

/// Ordered; the first matching group wins.
pub const ALGORITHM_CATEGORY_KEYWORDS: &[KeywordGroup] = &[
    ("Tree", &["tree", "binary tree"]),
    ("Graph", &["graph", "bfs", "dfs"]),
    ("DP", &["dynamic programming", "dp"]),
    ("Greedy", &["greedy"]),
    ("String", &["string", "substring"]),
    ("Sliding Window", &["sliding window"]),
    ("Binary Search", &["binary search"]),
    ("Heap", &["heap", "priority queue"]),
    ("Math", &["math", "modulo", "gcd"]),
    ("Two Pointers", &["two pointers"]),
    ("Interval", &["interval"]),
    ("Stack", &["stack"]),
    ("Queue", &["queue"]),
];

/// Ordered; the first matching group wins.
pub const INPUT_TYPE_KEYWORDS: &[KeywordGroup] = &[
    ("Array", &["array", "list"]),
    ("Matrix", &["matrix", "grid"]),
    ("Tree", &["tree"]),
    ("Graph", &["graph"]),
    ("String", &["string"]),
];

/// Every matching group contributes its tag, in table order.
pub const TAG_KEYWORDS: &[KeywordGroup] = &[
    ("array", &["array", "list"]),
    ("tree", &["tree"]),
    ("graph", &["graph", "bfs", "dfs"]),
    ("dp", &["dynamic programming", "dp"]),
    ("greedy", &["greedy"]),
    ("string", &["string", "substring"]),
    ("heap", &["heap", "priority queue"]),
    ("binary_search", &["binary search"]),
    ("sliding_window", &["sliding window"]),
    ("math", &["math", "gcd", "lcm", "mod"]),
    ("two_pointers", &["two pointers"]),
    ("matrix", &["matrix", "grid"]),
    ("interval", &["interval"]),
    ("stack", &["stack"]),
    ("queue", &["queue"]),
];

/// `true` when any keyword of `group` occurs in the lower-cased `text`.
pub fn group_matches(group: &KeywordGroup, text_lower: &str) -> bool {
    group.1.iter().any(|kw| text_lower.contains(kw))
}

// ── Output type mapping ───────────────────────────────────────────────────────

/// Runtime kind of a decoded JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonKind {
    Boolean,
    Integer,
    Float,
    String,
    Array,
    Object,
}

impl JsonKind {
    pub fn matches(self, value: &Value) -> bool {
        match self {
            JsonKind::Boolean => value.is_boolean(),
            JsonKind::Integer => value.is_i64() || value.is_u64(),
            JsonKind::Float => value.is_f64(),
            JsonKind::String => value.is_string(),
            JsonKind::Array => value.is_array(),
            JsonKind::Object => value.is_object(),
        }
    }
}

/// Ordered; Boolean must precede Integer.
pub const OUTPUT_TYPE_MAPPINGS: &[(JsonKind, &str)] = &[
    (JsonKind::Boolean, "Boolean"),
    (JsonKind::Integer, "Integer"),
    (JsonKind::Float, "Float"),
    (JsonKind::String, "String"),
    (JsonKind::Array, "Array"),
    (JsonKind::Object, "Object"),
];

// ── Description templates ─────────────────────────────────────────────────────

/// `(name, case-insensitive pattern)` pairs counted over descriptions.
pub const DESCRIPTION_TEMPLATE_PATTERNS: &[(&str, &str)] = &[
    ("given_array", r"(?i)given an array"),
    ("given_binary_tree", r"(?i)given a binary tree"),
    ("given_graph", r"(?i)given a graph"),
    ("return_true_false", r"(?i)return (true|false)"),
];

/// Compiled form of [`DESCRIPTION_TEMPLATE_PATTERNS`], built once.
pub fn description_templates() -> &'static [(&'static str, Regex)] {
    static COMPILED: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        DESCRIPTION_TEMPLATE_PATTERNS
            .iter()
            .map(|(name, pattern)| (*name, Regex::new(pattern).expect("regex is valid")))
            .collect()
    })
}

// ── Buckets ───────────────────────────────────────────────────────────────────

/// Labeled half-open ranges `[edges[i], edges[i + 1])`.
#[derive(Debug, Clone, Copy)]
pub struct BucketSpec {
    pub edges: &'static [f64],
    pub labels: &'static [&'static str],
}

impl BucketSpec {
    /// Label of the bucket containing `value`, or `None` when out of range.
    pub fn label_for(&self, value: f64) -> Option<&'static str> {
        self.edges
            .windows(2)
            .zip(self.labels.iter())
            .find(|(w, _)| value >= w[0] && value < w[1])
            .map(|(_, label)| *label)
    }
}

pub const EXAMPLE_BUCKETS: BucketSpec = BucketSpec {
    edges: &[-0.5, 0.5, 1.5, 2.5, f64::INFINITY],
    labels: &["0", "1", "2", "3+"],
};

pub const TEST_CASE_BUCKETS: BucketSpec = BucketSpec {
    edges: &[-0.5, 1.5, 3.5, 6.5, f64::INFINITY],
    labels: &["0-1", "2-3", "4-6", "7+"],
};

pub const DESCRIPTION_LENGTH_BUCKETS: BucketSpec = BucketSpec {
    edges: &[-1.0, 200.0, 400.0, 600.0, f64::INFINITY],
    labels: &["0-200", "201-400", "401-600", "601+"],
};

pub const CONSTRAINTS_BUCKETS: BucketSpec = BucketSpec {
    edges: &[-1.0, 0.0, 1.0, 3.0, f64::INFINITY],
    labels: &["0", "1", "2-3", "4+"],
};
