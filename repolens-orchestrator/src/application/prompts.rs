//! Prompt resolution
//!
//! Picks the active runtime template for a report type (builtin pair as
//! fallback), substitutes `{{variable}}` placeholders, appends the
//! verbosity instruction for the resolved depth style, and enforces two
//! output guards: every prompt asks for Markdown, and every prompt
//! actually carries the repository context. Unknown placeholders are left
//! literal so a template typo is visible in the output instead of
//! silently dropped.

use std::sync::Arc;

use tracing::warn;

use crate::domain::value_objects::{AnalysisType, PromptStyle};
use crate::infrastructure::config_provider::ConfigProvider;
use crate::infrastructure::prompts::builtin_prompts;

/// Chars of context compared against the prompt to detect a template that
/// forgot to include the source-code variable.
const CONTEXT_PROBE_CHARS: usize = 200;

const MARKDOWN_INSTRUCTION: &str =
    "\n\nFormat the entire response as well-structured Markdown: headings and lists, tables for comparisons, blockquotes for key takeaways, and bold priority badges (e.g. **[HIGH]**) on recommendations.";

/// Substitution variables available to user prompt templates.
///
/// Each variable answers to both its snake_case and camelCase token
/// (`{{source_code}}` and `{{sourceCode}}`), so operator templates keep
/// working regardless of which convention they were written in.
#[derive(Debug, Clone, Default)]
pub struct PromptVars {
    pub project_name: String,
    pub github_url: String,
    pub readme: String,
    pub structure: String,
    pub dependencies: String,
    /// The assembled, depth-capped repository context
    pub source_code: String,
}

impl PromptVars {
    fn pairs(&self) -> [(&'static str, &str); 12] {
        [
            ("project_name", &self.project_name),
            ("projectName", &self.project_name),
            ("github_url", &self.github_url),
            ("githubUrl", &self.github_url),
            ("readme", &self.readme),
            ("structure", &self.structure),
            ("dependencies", &self.dependencies),
            ("dependencyList", &self.dependencies),
            ("source_code", &self.source_code),
            ("sourceCode", &self.source_code),
            ("file_tree", &self.structure),
            ("fileTree", &self.structure),
        ]
    }
}

/// A fully resolved prompt pair, ready for the gateway.
#[derive(Debug, Clone)]
pub struct ResolvedPrompts {
    pub system: String,
    pub user: String,
}

/// Resolves prompt templates against runtime config with builtin fallbacks.
pub struct PromptResolver {
    config_provider: Arc<dyn ConfigProvider>,
}

impl PromptResolver {
    pub fn new(config_provider: Arc<dyn ConfigProvider>) -> Self {
        Self { config_provider }
    }

    /// Resolve the prompt pair for one report type. Infallible; a failing
    /// config provider degrades to the builtin pair.
    pub async fn resolve(
        &self,
        analysis_type: AnalysisType,
        vars: &PromptVars,
        style: PromptStyle,
    ) -> ResolvedPrompts {
        let (builtin_system, builtin_user) = builtin_prompts(analysis_type);

        let (system_template, user_template) =
            match self.config_provider.active_template(analysis_type).await {
                Ok(Some(template)) => (template.system_prompt, template.user_prompt_template),
                Ok(None) => (builtin_system.to_string(), builtin_user.to_string()),
                Err(e) => {
                    warn!(
                        analysis_type = %analysis_type,
                        error = %e,
                        "Config provider unavailable, using builtin prompts"
                    );
                    (builtin_system.to_string(), builtin_user.to_string())
                }
            };

        let system = substitute(&system_template, vars);
        let mut user = substitute(&user_template, vars);

        user.push_str(style_instruction(style));

        if !system.to_lowercase().contains("markdown") && !user.to_lowercase().contains("markdown")
        {
            user.push_str(MARKDOWN_INSTRUCTION);
        }

        if !context_included(&user, &vars.source_code) {
            warn!(
                analysis_type = %analysis_type,
                "Resolved prompt lacks repository context, appending it"
            );
            user.push_str("\n\n## Project Context\n\n");
            user.push_str(&vars.source_code);
        }

        ResolvedPrompts { system, user }
    }
}

/// Verbosity register appended to every user prompt.
fn style_instruction(style: PromptStyle) -> &'static str {
    match style {
        PromptStyle::Concise => {
            "\n\nKeep the response concise: short sections covering only the most important points."
        }
        PromptStyle::Moderate => {
            "\n\nAim for moderate detail: cover each section thoroughly without exhaustive enumeration."
        }
        PromptStyle::Detailed => {
            "\n\nBe thorough and detailed: expand each section with concrete specifics, examples, and edge cases."
        }
    }
}

/// Replace every known `{{variable}}` occurrence; unknown tokens stay.
fn substitute(template: &str, vars: &PromptVars) -> String {
    let mut out = template.to_string();
    for (name, value) in vars.pairs() {
        let token = format!("{{{{{}}}}}", name);
        if out.contains(&token) {
            out = out.replace(&token, value);
        }
    }
    out
}

/// Whether the prompt carries the context, probed by its leading chars.
fn context_included(prompt: &str, context: &str) -> bool {
    if context.is_empty() {
        return true;
    }
    let probe: String = context.chars().take(CONTEXT_PROBE_CHARS).collect();
    prompt.contains(&probe)
}
