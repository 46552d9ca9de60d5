// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assembly of the generation instruction from retrieved context.
//!
//! Combines the selected template, the user's text, the flattened vision
//! analysis, the top ranked reference prompts, and rated category exemplars
//! into one [`GenerationInstruction`].

use promptloom_core::{
    AnalysisResult, CategoryExample, CategoryKey, GenerationInstruction, PromptloomError,
    SimilarityHit, TemplateStore,
};
use std::fmt::Write as _;
use tracing::debug;

use crate::templates::{template_key, GENERIC_TEMPLATE_KEY};

/// Maximum reference prompts included in the context.
const MAX_REFERENCE_PROMPTS: usize = 5;

/// Inputs to one context assembly.
pub struct ContextInputs<'a> {
    /// User-supplied free text, already trimmed.
    pub text: Option<&'a str>,
    /// Primary vision analysis, when one was obtained.
    pub analysis: Option<&'a AnalysisResult>,
    /// Ranked similarity hits, best first.
    pub hits: &'a [SimilarityHit],
    /// Category explicitly requested by the caller, if any. Detected
    /// categories never select a category template.
    pub explicit_category: Option<CategoryKey>,
    /// Top-rated exemplars for the effective category.
    pub examples: &'a [CategoryExample],
}

/// Select the template key for these inputs.
///
/// A category template is used only when the caller explicitly requested
/// the category and exemplars exist for it; everything else gets the
/// generic template.
pub fn select_template_key(
    explicit_category: Option<CategoryKey>,
    has_examples: bool,
) -> String {
    match explicit_category {
        Some(category) if has_examples => template_key(category),
        _ => GENERIC_TEMPLATE_KEY.to_string(),
    }
}

/// Build the generation instruction.
///
/// Fails with `ConfigurationMissing` when the selected template key is
/// absent from the store. Everything else is best-effort: missing analysis,
/// empty hits, or no exemplars simply shrink the context.
pub async fn build_instruction(
    templates: &dyn TemplateStore,
    inputs: ContextInputs<'_>,
) -> Result<GenerationInstruction, PromptloomError> {
    let key = select_template_key(inputs.explicit_category, !inputs.examples.is_empty());
    let template = templates
        .get_by_key(&key)
        .await?
        .ok_or_else(|| PromptloomError::ConfigurationMissing(format!("template `{key}`")))?;

    debug!(template = %key, hits = inputs.hits.len(), "assembling generation context");

    let mut user = String::new();

    if let Some(text) = inputs.text {
        let _ = writeln!(user, "User request: {text}\n");
    }

    if let Some(analysis) = inputs.analysis {
        user.push_str("Reference image analysis:\n");
        if let Some(desc) = &analysis.short_description {
            let _ = writeln!(user, "- description: {desc}");
        }
        if let Some(mood) = &analysis.mood {
            let _ = writeln!(user, "- mood: {mood}");
        }
        if let Some(lighting) = &analysis.lighting {
            let _ = writeln!(user, "- lighting: {lighting}");
        }
        if !analysis.colors.is_empty() {
            let _ = writeln!(user, "- colors: {}", analysis.colors.join(", "));
        }
        if !analysis.tags.is_empty() {
            let _ = writeln!(user, "- tags: {}", analysis.tags.join(", "));
        }
        user.push('\n');
    }

    let references: Vec<&SimilarityHit> = inputs
        .hits
        .iter()
        .filter(|h| h.prompt.as_deref().map(|p| !p.trim().is_empty()).unwrap_or(false))
        .take(MAX_REFERENCE_PROMPTS)
        .collect();
    if !references.is_empty() {
        user.push_str("Similar prompts from the corpus, best match first:\n");
        for (rank, hit) in references.iter().enumerate() {
            let aesthetic = hit
                .aesthetic_score
                .map(|a| format!(", aesthetic {a:.1}"))
                .unwrap_or_default();
            let curated = if hit.curated.unwrap_or(false) {
                ", curated"
            } else {
                ""
            };
            let _ = writeln!(
                user,
                "{}. {}{aesthetic}{curated}",
                rank + 1,
                hit.prompt.as_deref().unwrap_or_default()
            );
        }
        user.push('\n');
    }

    if !inputs.examples.is_empty() {
        user.push_str("High-rated example prompts for this style:\n");
        for example in inputs.examples {
            let _ = writeln!(user, "- {}", example.prompt);
        }
        user.push('\n');
    }

    Ok(GenerationInstruction {
        system: template.content,
        user: user.trim_end().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::BuiltinTemplates;
    use promptloom_core::ExampleSource;

    fn hit(prompt: Option<&str>, similarity: f32) -> SimilarityHit {
        SimilarityHit {
            image_id: "id".into(),
            image_url: "https://img/x.jpg".into(),
            prompt: prompt.map(str::to_string),
            similarity,
            aesthetic_score: Some(7.0),
            curated: Some(true),
            weight: similarity,
        }
    }

    fn example(prompt: &str, rating: u8) -> CategoryExample {
        CategoryExample {
            prompt: prompt.into(),
            rating,
            source: ExampleSource::Curated,
        }
    }

    #[test]
    fn generic_key_without_explicit_category() {
        assert_eq!(select_template_key(None, true), "prompt-generic");
        assert_eq!(select_template_key(None, false), "prompt-generic");
    }

    #[test]
    fn category_key_requires_examples() {
        assert_eq!(
            select_template_key(Some(CategoryKey::Anime), true),
            "prompt-anime"
        );
        assert_eq!(
            select_template_key(Some(CategoryKey::Anime), false),
            "prompt-generic"
        );
    }

    #[tokio::test]
    async fn instruction_contains_all_context_sections() {
        let analysis = AnalysisResult {
            short_description: Some("a foggy harbor".into()),
            mood: Some("melancholy".into()),
            lighting: Some("diffuse dawn".into()),
            colors: vec!["#8899aa".into()],
            tags: vec!["harbor".into(), "fog".into()],
        };
        let hits = vec![hit(Some("fishing boats in mist"), 0.8)];
        let examples = vec![example("moody seascape, oil on canvas", 90)];

        let instruction = build_instruction(
            &BuiltinTemplates,
            ContextInputs {
                text: Some("a quiet harbor morning"),
                analysis: Some(&analysis),
                hits: &hits,
                explicit_category: Some(CategoryKey::Cinematic),
                examples: &examples,
            },
        )
        .await
        .unwrap();

        assert!(instruction.system.contains("cinematic"));
        assert!(instruction.user.contains("a quiet harbor morning"));
        assert!(instruction.user.contains("a foggy harbor"));
        assert!(instruction.user.contains("fishing boats in mist"));
        assert!(instruction.user.contains("moody seascape"));
    }

    #[tokio::test]
    async fn hits_without_prompt_text_are_skipped() {
        let hits = vec![hit(None, 0.9), hit(Some("  "), 0.8), hit(Some("usable"), 0.7)];
        let instruction = build_instruction(
            &BuiltinTemplates,
            ContextInputs {
                text: Some("anything"),
                analysis: None,
                hits: &hits,
                explicit_category: None,
                examples: &[],
            },
        )
        .await
        .unwrap();
        assert!(instruction.user.contains("usable"));
        assert!(!instruction.user.contains("2."));
    }

    #[tokio::test]
    async fn missing_template_is_a_configuration_error() {
        struct EmptyStore;

        #[async_trait::async_trait]
        impl TemplateStore for EmptyStore {
            async fn get_by_key(
                &self,
                _key: &str,
            ) -> Result<Option<promptloom_core::PromptTemplate>, PromptloomError> {
                Ok(None)
            }
        }

        let err = build_instruction(
            &EmptyStore,
            ContextInputs {
                text: Some("anything"),
                analysis: None,
                hits: &[],
                explicit_category: None,
                examples: &[],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PromptloomError::ConfigurationMissing(_)));
    }
}
