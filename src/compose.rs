//! Prompt composition engine
//!
//! Assembles the final review payload from an optional user template, the
//! uploaded archive handles, the user story, and optional acceptance
//! criteria. This is a pass-through text-substitution system, not a strict
//! template language: recognized placeholders are resolved in a fixed
//! order, unknown tokens are left verbatim, and resolving an absent
//! placeholder is a no-op.
//!
//! Resolution order:
//! 1. `{FILES_LIST}` - one block per archive, 1-indexed in upload order
//! 2. `{FILE_NAME_n}` / `{FILE_DISPLAY_NAME_n}` / `{FILE_URI_n}` for n=1..N
//! 3. `{FILE_NAME}` / `{FILE_DISPLAY_NAME}` / `{FILE_URI}` - legacy
//!    single-archive forms, resolved to archive 1
//! 4. `{USER_STORY}`
//! 5. `{ACCEPTANCE_CRITERIA}` - the fallback sentence when no criteria
//!    document was supplied, never an empty string
//!
//! When the original template never mentioned `{USER_STORY}` (checked
//! before any substitution, so document content can't interfere), the
//! story is appended as a delimited trailing section; likewise for the
//! criteria. The story text therefore lands in the payload exactly once.

use crate::models::{AssetHandle, ReviewPayload};

/// Collective placeholder: expands to one block per uploaded archive
pub const FILES_LIST: &str = "{FILES_LIST}";

/// User-story document text
pub const USER_STORY: &str = "{USER_STORY}";

/// Acceptance-criteria document text (or the fallback sentence)
pub const ACCEPTANCE_CRITERIA: &str = "{ACCEPTANCE_CRITERIA}";

/// Substituted for `{ACCEPTANCE_CRITERIA}` when no criteria were supplied
pub const CRITERIA_FALLBACK: &str = "(The acceptance criteria are likely embedded within or \
implied by the user story. Please infer them as best as possible.)";

/// System instruction sent with every review request. Not user-controlled.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert QA engineer and senior software \
developer. Your task is to meticulously review the provided source code (in the uploaded \
archives) against the given user story and its acceptance criteria.";

/// Which default instructions to synthesize when no template is supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewFocus {
    /// The change is claimed complete; verify every criterion was met
    #[default]
    Completed,
    /// Work in progress; assess direction and flag course corrections
    InProgress,
}

/// Builds the review payload for a fixed, ordered set of uploaded archives
pub struct PromptComposer<'a> {
    assets: &'a [AssetHandle],
    focus: ReviewFocus,
}

impl<'a> PromptComposer<'a> {
    /// Composer over archives in registration order (order defines the
    /// 1-based placeholder indices)
    pub fn new(assets: &'a [AssetHandle]) -> Self {
        Self {
            assets,
            focus: ReviewFocus::default(),
        }
    }

    /// Select the default instructions synthesized when no template is given
    pub fn with_focus(mut self, focus: ReviewFocus) -> Self {
        self.focus = focus;
        self
    }

    /// Produce the final payload
    ///
    /// `template` of `None` (or blank) selects the synthesized default,
    /// which is usable with zero configuration.
    pub fn compose(
        &self,
        template: Option<&str>,
        story: &str,
        criteria: Option<&str>,
    ) -> ReviewPayload {
        let synthesized;
        let template = match template {
            Some(t) if !t.trim().is_empty() => t,
            _ => {
                synthesized = self.default_template();
                synthesized.as_str()
            }
        };

        // Decide the fallback appends against the original template, before
        // any substitution: a document that happens to contain a
        // placeholder-like token must not suppress them.
        let wants_story = template.contains(USER_STORY);
        let wants_criteria = template.contains(ACCEPTANCE_CRITERIA);

        let criteria_text = match criteria {
            Some(c) if !c.trim().is_empty() => c,
            _ => CRITERIA_FALLBACK,
        };

        let mut body = template.to_string();

        if body.contains(FILES_LIST) {
            body = body.replace(FILES_LIST, &self.files_block());
        }

        for (index, asset) in self.assets.iter().enumerate() {
            body = substitute_asset(&body, &format!("_{}", index + 1), asset);
        }
        if let Some(first) = self.assets.first() {
            // Legacy single-archive forms: independent substitutions, not
            // aliases, so a template mixing both resolves both.
            body = substitute_asset(&body, "", first);
        }

        body = body.replace(USER_STORY, story);
        body = body.replace(ACCEPTANCE_CRITERIA, criteria_text);

        if !wants_story {
            body.push_str("\n\n**User Story:**\n");
            body.push_str(story);
            body.push('\n');
        }
        if !wants_criteria {
            body.push_str("\n\n**Acceptance Criteria:**\n");
            body.push_str(criteria_text);
            body.push('\n');
        }

        ReviewPayload {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            body,
        }
    }

    /// One block per archive, 1-indexed, in registration order
    fn files_block(&self) -> String {
        let blocks: Vec<String> = self
            .assets
            .iter()
            .enumerate()
            .map(|(index, asset)| {
                format!(
                    "Archive {n}:\n\
                     \x20 File Name on Server (Resource Name): {id}\n\
                     \x20 Display Name: {display}\n\
                     \x20 URI for Model Access: {uri}",
                    n = index + 1,
                    id = asset.remote_id().unwrap_or_default(),
                    display = asset.display_name,
                    uri = asset.remote_uri().unwrap_or_default(),
                )
            })
            .collect();
        blocks.join("\n\n")
    }

    /// Default template used when the caller supplies none
    fn default_template(&self) -> String {
        let mut t = String::new();
        t.push_str("**User Story:**\n{USER_STORY}\n\n");
        t.push_str("**Acceptance Criteria:**\n{ACCEPTANCE_CRITERIA}\n\n");
        match self.focus {
            ReviewFocus::Completed => {
                t.push_str(
                    "**Source Code:**\n\
                     The complete source code for the project/feature is provided in the \
                     uploaded archives.\n\n\
                     {FILES_LIST}\n\n\
                     **Your Task:**\n\
                     1. Thoroughly analyze the source code accessible via the provided file URIs.\n\
                     2. Verify if all stated acceptance criteria have been met.\n\
                     3. Verify if all changes requested in the user story have been implemented.\n\
                     4. Identify any deviations, bugs, or areas where the implementation does not align.\n\
                     5. Comment on code quality and potential improvements, prioritizing verification of completion.\n\n\
                     **Output Format:**\n\
                     Provide a structured feedback report with an overall assessment, detailed \
                     findings citing file and line evidence, positive confirmations, and an \
                     ordered list of actionable next steps for the developer.",
                );
            }
            ReviewFocus::InProgress => {
                t.push_str(
                    "**Source Code (In-Progress):**\n\
                     The current in-progress source code for the project/feature is provided in \
                     the uploaded archives.\n\n\
                     {FILES_LIST}\n\n\
                     **Review Focus (In-Progress Work):**\n\
                     This review is for work that is not yet complete. Assess whether the current \
                     direction aligns with the story's objectives, identify potential deviations \
                     or roadblocks early, and provide constructive feedback to keep the \
                     development on track.\n\n\
                     **Your Task:**\n\
                     1. Analyze the current state of the source code accessible via the provided file URIs.\n\
                     2. Evaluate the implemented portions against the relevant acceptance criteria, \
                     understanding they may not all be met yet.\n\
                     3. Identify areas where the implementation is well-aligned with the intended goals.\n\
                     4. Identify deviations, risks, or areas needing course correction.\n\n\
                     **Output Format:**\n\
                     Provide a structured progress report with an overall direction assessment, \
                     areas of strong alignment, constructive observations with code evidence, and \
                     key considerations for the next steps.",
                );
            }
        }
        t
    }
}

/// Replace the three asset placeholders carrying `suffix` (`"_3"` or `""`)
fn substitute_asset(body: &str, suffix: &str, asset: &AssetHandle) -> String {
    body.replace(
        &format!("{{FILE_NAME{suffix}}}"),
        asset.remote_id().unwrap_or_default(),
    )
    .replace(&format!("{{FILE_DISPLAY_NAME{suffix}}}"), &asset.display_name)
    .replace(
        &format!("{{FILE_URI{suffix}}}"),
        asset.remote_uri().unwrap_or_default(),
    )
}
