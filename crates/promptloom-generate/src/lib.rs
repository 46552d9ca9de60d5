// SPDX-FileCopyrightText: 2026 Promptloom Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt generation for the Promptloom pipeline.
//!
//! Assembles the generation context from retrieved material, calls the
//! completion service, and resolves the fallback chain when generation
//! comes back empty.

pub mod client;
pub mod context;
pub mod fallback;
pub mod templates;

pub use client::{clean_prompt, extract_completion, CompletionClient};
pub use context::{build_instruction, select_template_key, ContextInputs};
pub use fallback::{first_usable, resolve_prompt, PromptProducer};
pub use templates::{template_key, BuiltinTemplates, GENERIC_TEMPLATE_KEY};
