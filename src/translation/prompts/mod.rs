/*!
 * Prompt construction for batch translation.
 *
 * One prompt is rendered per batch. It carries the batch as a JSON array,
 * the output contract and a worked example in the target language.
 */

pub mod templates;

// Re-export main types
pub use templates::{PromptItem, PromptTemplate, TranslationRequestBuilder};
