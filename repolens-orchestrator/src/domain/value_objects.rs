//! Orchestrator value objects

use serde::{Deserialize, Serialize};

/// Report kind generated per run. Closed set; "current" content per type is
/// the most recent Analysis row, older versions stay queryable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    /// Product requirements document
    Prd,
    /// Technical architecture overview
    Architecture,
    /// Security review
    Security,
    /// Marketing plan
    Marketing,
    /// Business model breakdown
    BusinessModel,
    /// User personas
    Personas,
    /// Development roadmap
    Roadmap,
    /// Competitive landscape
    Competitors,
}

impl AnalysisType {
    /// Every report kind, in canonical generation order.
    pub const ALL: [AnalysisType; 8] = [
        AnalysisType::Prd,
        AnalysisType::Architecture,
        AnalysisType::Security,
        AnalysisType::Marketing,
        AnalysisType::BusinessModel,
        AnalysisType::Personas,
        AnalysisType::Roadmap,
        AnalysisType::Competitors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::Prd => "prd",
            AnalysisType::Architecture => "architecture",
            AnalysisType::Security => "security",
            AnalysisType::Marketing => "marketing",
            AnalysisType::BusinessModel => "business_model",
            AnalysisType::Personas => "personas",
            AnalysisType::Roadmap => "roadmap",
            AnalysisType::Competitors => "competitors",
        }
    }
}

impl std::fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AnalysisType {
    type Err = UnknownAnalysisType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnalysisType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownAnalysisType(s.to_string()))
    }
}

/// Error for unrecognized analysis-type keys.
#[derive(Debug, thiserror::Error)]
#[error("Unknown analysis type: {0}")]
pub struct UnknownAnalysisType(pub String);

/// Coarse cost/quality tier controlling context size and model choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepthLevel {
    Critical,
    Balanced,
    Complete,
}

impl DepthLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepthLevel::Critical => "critical",
            DepthLevel::Balanced => "balanced",
            DepthLevel::Complete => "complete",
        }
    }
}

impl std::fmt::Display for DepthLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DepthLevel {
    type Err = UnknownDepthLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(DepthLevel::Critical),
            "balanced" => Ok(DepthLevel::Balanced),
            "complete" => Ok(DepthLevel::Complete),
            other => Err(UnknownDepthLevel(other.to_string())),
        }
    }
}

/// Error for unrecognized depth keys.
#[derive(Debug, thiserror::Error)]
#[error("Unknown depth level: {0}")]
pub struct UnknownDepthLevel(pub String);

/// Verbosity register the resolved depth asks the prompts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    Concise,
    Moderate,
    Detailed,
}

impl PromptStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptStyle::Concise => "concise",
            PromptStyle::Moderate => "moderate",
            PromptStyle::Detailed => "detailed",
        }
    }
}

/// Project analysis status — the persisted state machine.
///
/// ```text
/// Pending ──► Extracting ──► Generating(t) ──► ... ──► Completed
///    │             │              │                        ▲
///    │             └──────────────┴──► Error               │
///    └──► QueueReady ─────────────────────────────────────-┘
/// ```
///
/// A cached re-run skips `Extracting` and goes straight to the first
/// `Generating`. Terminal states re-arm through `Pending` when a new
/// request is accepted. The cancellation path is allowed to force any
/// non-terminal state to `Completed` outside this machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Request accepted, background run not yet started
    Pending,
    /// Repository snapshot extraction in progress
    Extracting,
    /// Generating the named report type
    Generating(AnalysisType),
    /// Queue items populated; progress driven one item at a time
    QueueReady,
    /// Run finished (possibly with some types missing)
    Completed,
    /// Fatal error; see the project's error_message
    Error,
}

impl AnalysisStatus {
    /// Check whether transitioning to `target` is allowed from this state.
    pub fn can_transition_to(&self, target: &AnalysisStatus) -> bool {
        use AnalysisStatus::*;
        match (self, target) {
            // A new accepted request re-arms a finished machine.
            (Completed | Error, Pending) => true,
            (Completed | Error, _) => false,
            (_, Pending) => false,
            (Pending, _) => true,
            (Extracting, Generating(_)) | (Extracting, Completed) | (Extracting, Error) => true,
            (Generating(_), Generating(_))
            | (Generating(_), Completed)
            | (Generating(_), Error) => true,
            (QueueReady, Generating(_)) | (QueueReady, Completed) | (QueueReady, Error) => true,
            _ => false,
        }
    }

    /// Whether this status represents a finished run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Error)
    }

    /// Whether a run is currently in flight (callers must not start another).
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisStatus::Pending => write!(f, "pending"),
            AnalysisStatus::Extracting => write!(f, "extracting"),
            AnalysisStatus::Generating(t) => write!(f, "generating_{}", t),
            AnalysisStatus::QueueReady => write!(f, "queue_ready"),
            AnalysisStatus::Completed => write!(f, "completed"),
            AnalysisStatus::Error => write!(f, "error"),
        }
    }
}

/// Error returned when an invalid status transition is attempted.
#[derive(Debug, thiserror::Error)]
#[error("Invalid status transition from {from} to {to}")]
pub struct TransitionError {
    pub from: AnalysisStatus,
    pub to: AnalysisStatus,
}

/// Per-item status on the queue path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueItemStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl std::fmt::Display for QueueItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueItemStatus::Pending => write!(f, "pending"),
            QueueItemStatus::Processing => write!(f, "processing"),
            QueueItemStatus::Completed => write!(f, "completed"),
            QueueItemStatus::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_run_sequence() {
        use AnalysisStatus::*;
        let seq = [
            Pending,
            Extracting,
            Generating(AnalysisType::Prd),
            Generating(AnalysisType::Security),
            Completed,
        ];
        for pair in seq.windows(2) {
            assert!(
                pair[0].can_transition_to(&pair[1]),
                "{} -> {} should be legal",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_cached_run_skips_extracting() {
        assert!(
            AnalysisStatus::Pending
                .can_transition_to(&AnalysisStatus::Generating(AnalysisType::Prd))
        );
    }

    #[test]
    fn test_error_reachable_from_any_active_state() {
        use AnalysisStatus::*;
        for from in [
            Pending,
            Extracting,
            Generating(AnalysisType::Roadmap),
            QueueReady,
        ] {
            assert!(from.can_transition_to(&Error), "{} -> error", from);
        }
    }

    #[test]
    fn test_terminal_states_only_rearm_via_pending() {
        use AnalysisStatus::*;
        assert!(Completed.can_transition_to(&Pending));
        assert!(Error.can_transition_to(&Pending));
        assert!(!Completed.can_transition_to(&Extracting));
        assert!(!Error.can_transition_to(&Generating(AnalysisType::Prd)));
    }

    #[test]
    fn test_no_backwards_transition_to_pending_mid_run() {
        assert!(!AnalysisStatus::Extracting.can_transition_to(&AnalysisStatus::Pending));
        assert!(
            !AnalysisStatus::Generating(AnalysisType::Prd)
                .can_transition_to(&AnalysisStatus::Pending)
        );
    }

    #[test]
    fn test_status_display() {
        assert_eq!(
            AnalysisStatus::Generating(AnalysisType::BusinessModel).to_string(),
            "generating_business_model"
        );
        assert_eq!(AnalysisStatus::QueueReady.to_string(), "queue_ready");
    }

    #[test]
    fn test_analysis_type_round_trip() {
        for t in AnalysisType::ALL {
            let parsed: AnalysisType = t.as_str().parse().unwrap();
            assert_eq!(parsed, t);
        }
        assert!("marketing_plan".parse::<AnalysisType>().is_err());
    }

    #[test]
    fn test_depth_parse() {
        assert_eq!("critical".parse::<DepthLevel>().unwrap(), DepthLevel::Critical);
        assert!("deep".parse::<DepthLevel>().is_err());
    }
}
