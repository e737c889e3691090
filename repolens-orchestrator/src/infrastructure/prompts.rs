//! Builtin prompt pairs, one per analysis type
//!
//! These are the fallbacks used when no active runtime template exists.
//! User prompts carry `{{variable}}` placeholders resolved by the prompt
//! resolver; the supported variables are `project_name`, `github_url`,
//! `readme`, `structure`, `dependencies`, and `source_code`.

use crate::domain::value_objects::AnalysisType;

const PRD_SYSTEM: &str = "You are a senior product manager. You write precise, well-structured product requirement documents grounded in the actual codebase you are shown, not in speculation.";

const PRD_USER: &str = "Write a product requirements document for {{project_name}} ({{github_url}}).

Cover: product summary, target users, core features as observed in the code, functional requirements, and known gaps.

README:
{{readme}}

Repository structure:
{{structure}}

Dependencies:
{{dependencies}}

Source code:
{{source_code}}";

const ARCHITECTURE_SYSTEM: &str = "You are a principal software architect. You produce clear architecture overviews that name concrete modules, data flows, and integration points found in the code.";

const ARCHITECTURE_USER: &str = "Describe the architecture of {{project_name}}.

Cover: high-level component diagram (as text), module responsibilities, data flow, external integrations, and notable design decisions.

Repository structure:
{{structure}}

Dependencies:
{{dependencies}}

Source code:
{{source_code}}";

const SECURITY_SYSTEM: &str = "You are an application security engineer. You assess codebases for concrete risks and report findings with severity, location, and remediation, without inventing vulnerabilities the code does not show.";

const SECURITY_USER: &str = "Produce a security assessment for {{project_name}}.

Cover: authentication and authorization handling, secret management, input validation, dependency risks, and prioritized recommendations.

Dependencies:
{{dependencies}}

Source code:
{{source_code}}";

const MARKETING_SYSTEM: &str = "You are a product marketing lead. You turn technical capability into positioning, messaging, and channel strategy that a founding team can execute.";

const MARKETING_USER: &str = "Create a marketing plan for {{project_name}} ({{github_url}}).

Cover: positioning statement, key messages tied to actual features, target segments, launch channels, and a 90-day plan.

README:
{{readme}}

Source code:
{{source_code}}";

const BUSINESS_MODEL_SYSTEM: &str = "You are a startup strategy advisor. You derive realistic business models from what a product actually does today.";

const BUSINESS_MODEL_USER: &str = "Propose a business model for {{project_name}}.

Cover: value proposition, customer segments, revenue streams, cost drivers, and pricing options with rationale.

README:
{{readme}}

Dependencies:
{{dependencies}}

Source code:
{{source_code}}";

const PERSONAS_SYSTEM: &str = "You are a UX researcher. You construct grounded user personas from product capability, not demographic cliches.";

const PERSONAS_USER: &str = "Derive 3-5 user personas for {{project_name}}.

For each: name, role, goals, frustrations the product addresses, and the features they would use most.

README:
{{readme}}

Source code:
{{source_code}}";

const ROADMAP_SYSTEM: &str = "You are an engineering program manager. You lay out pragmatic roadmaps sequenced by dependency and impact.";

const ROADMAP_USER: &str = "Draft a 6-month roadmap for {{project_name}}.

Cover: current state summary, quarterly themes, concrete milestones with rough sizing, and risks to the sequencing.

Repository structure:
{{structure}}

Source code:
{{source_code}}";

const COMPETITORS_SYSTEM: &str = "You are a market analyst. You map competitive landscapes from a product's observable feature set.";

const COMPETITORS_USER: &str = "Analyze the competitive landscape for {{project_name}} ({{github_url}}).

Cover: likely competitor categories, representative competitors, feature comparison against what this codebase ships, and differentiation opportunities.

README:
{{readme}}

Source code:
{{source_code}}";

/// Builtin `(system, user)` prompt pair for an analysis type.
pub fn builtin_prompts(analysis_type: AnalysisType) -> (&'static str, &'static str) {
    match analysis_type {
        AnalysisType::Prd => (PRD_SYSTEM, PRD_USER),
        AnalysisType::Architecture => (ARCHITECTURE_SYSTEM, ARCHITECTURE_USER),
        AnalysisType::Security => (SECURITY_SYSTEM, SECURITY_USER),
        AnalysisType::Marketing => (MARKETING_SYSTEM, MARKETING_USER),
        AnalysisType::BusinessModel => (BUSINESS_MODEL_SYSTEM, BUSINESS_MODEL_USER),
        AnalysisType::Personas => (PERSONAS_SYSTEM, PERSONAS_USER),
        AnalysisType::Roadmap => (ROADMAP_SYSTEM, ROADMAP_USER),
        AnalysisType::Competitors => (COMPETITORS_SYSTEM, COMPETITORS_USER),
    }
}
