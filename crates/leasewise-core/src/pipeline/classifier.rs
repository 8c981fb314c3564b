//! Keyword classifier for incoming queries.
//!
//! Classifies a query by scanning it for keyword groups. No ML, no
//! embeddings, just case-insensitive substring matching. Groups are
//! checked in priority order; the first group with a hit wins, and a
//! query matching nothing falls back to [`Intent::Discovery`].
//!
//! Priority puts the most specific asks first: a query like "total
//! savings across the premium fleet" is a financial question that
//! happens to mention premium hardware, so financial outranks premium.

/// What the user is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Fleet-wide financial summary with top opportunities.
    FinancialSummary,
    /// Deep dive into one concrete VM.
    DeepDive,
    /// Waste distribution across clusters.
    ClusterAnalysis,
    /// Premium (M/L-series) hardware audit.
    PremiumAudit,
    /// Live market pricing research.
    PricingResearch,
    /// Default: zombie instance discovery.
    Discovery,
}

impl Intent {
    /// Stable name used in logs and reports.
    pub fn name(self) -> &'static str {
        match self {
            Self::FinancialSummary => "financial_summary",
            Self::DeepDive => "deep_dive",
            Self::ClusterAnalysis => "cluster_analysis",
            Self::PremiumAudit => "premium_audit",
            Self::PricingResearch => "pricing_research",
            Self::Discovery => "discovery",
        }
    }
}

/// A keyword group and the intent it maps to.
struct KeywordPattern {
    keywords: &'static [&'static str],
    intent: Intent,
}

/// Static keyword groups checked in priority order (first match wins).
const PATTERNS: &[KeywordPattern] = &[
    KeywordPattern {
        keywords: &[
            "calculate",
            "exact",
            "saving",
            "total",
            "annual",
            "roi",
            "financial",
            "summary",
            "budget",
            "how much",
            "downsize all",
        ],
        intent: Intent::FinancialSummary,
    },
    KeywordPattern {
        keywords: &[
            "example",
            "recommend",
            "specific",
            "pick",
            "show me",
            "top",
            "deep dive",
            "walk me through",
            "one vm",
            "single vm",
            "in detail",
        ],
        intent: Intent::DeepDive,
    },
    KeywordPattern {
        keywords: &["cluster", "group", "region", "which team"],
        intent: Intent::ClusterAnalysis,
    },
    KeywordPattern {
        keywords: &["premium", "m-series", "l-series", "m_series", "l_series", "expensive tier"],
        intent: Intent::PremiumAudit,
    },
    KeywordPattern {
        keywords: &[
            "price", "pricing", "market", "current rates", "azure rates", "spot", "discount",
        ],
        intent: Intent::PricingResearch,
    },
];

/// Classify a query into an intent.
pub fn classify(query: &str) -> Intent {
    let text = query.to_lowercase();
    for pattern in PATTERNS {
        if pattern.keywords.iter().any(|kw| text.contains(kw)) {
            return pattern.intent;
        }
    }
    Intent::Discovery
}
