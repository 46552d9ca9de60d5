// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in generation templates.
//!
//! Ships a default template per style category plus the generic fallback so
//! the CLI works without a seeded template store. Callers can still supply
//! their own [`TemplateStore`] backed by the database.

use async_trait::async_trait;
use promptloom_core::{CategoryKey, PromptTemplate, PromptloomError, TemplateStore};

/// Key of the generic template used when no category-specific one applies.
pub const GENERIC_TEMPLATE_KEY: &str = "prompt-generic";

/// Template key for a category-specific generation instruction.
pub fn template_key(category: CategoryKey) -> String {
    format!("prompt-{category}")
}

const GENERIC_TEMPLATE: &str = "You are an expert prompt engineer for generative image models. \
Rewrite the user's intent into one vivid, specific image prompt. Use the reference prompts and \
examples as style guidance, not as text to copy. Reply with the prompt only, no commentary.";

const CATEGORY_TEMPLATES: &[(CategoryKey, &str)] = &[
    (
        CategoryKey::YoutubeThumbnail,
        "You write image prompts for high-impact YouTube thumbnails: bold subjects, exaggerated \
expressions, high contrast, readable at small sizes. Reply with the prompt only.",
    ),
    (
        CategoryKey::Anime,
        "You write image prompts in anime and manga styles: clean line art, cel shading, \
expressive characters. Name a concrete style era or studio aesthetic. Reply with the prompt only.",
    ),
    (
        CategoryKey::Logo,
        "You write image prompts for logo and brand-mark design: flat vector shapes, strong \
silhouettes, limited palettes, no photographic detail. Reply with the prompt only.",
    ),
    (
        CategoryKey::Product,
        "You write image prompts for product photography: studio lighting, clean backgrounds, \
sharp focus on the product, commercial polish. Reply with the prompt only.",
    ),
    (
        CategoryKey::Abstract,
        "You write image prompts for abstract art: form, color, and texture over subject matter. \
Describe composition and movement precisely. Reply with the prompt only.",
    ),
    (
        CategoryKey::Cinematic,
        "You write image prompts for cinematic stills: film grain, anamorphic framing, motivated \
lighting, a clear moment of story. Reply with the prompt only.",
    ),
    (
        CategoryKey::Illustration,
        "You write image prompts for illustration: a stated medium (watercolor, ink, digital \
painting), deliberate color palette, stylized rendering. Reply with the prompt only.",
    ),
    (
        CategoryKey::Realistic,
        "You write image prompts for photorealistic images: physically plausible lighting, \
camera and lens detail, natural textures. Reply with the prompt only.",
    ),
];

/// In-memory template store preloaded with the built-in defaults.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinTemplates;

#[async_trait]
impl TemplateStore for BuiltinTemplates {
    async fn get_by_key(&self, key: &str) -> Result<Option<PromptTemplate>, PromptloomError> {
        if key == GENERIC_TEMPLATE_KEY {
            return Ok(Some(PromptTemplate {
                content: GENERIC_TEMPLATE.to_string(),
            }));
        }
        let found = CATEGORY_TEMPLATES
            .iter()
            .find(|(category, _)| template_key(*category) == key)
            .map(|(_, content)| PromptTemplate {
                content: content.to_string(),
            });
        Ok(found)
    }
}
