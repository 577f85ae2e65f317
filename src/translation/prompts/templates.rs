/*!
 * Prompt templates for batch correction and translation.
 *
 * The prompt asks the model to repair the automatic transcription and
 * translate it, and pins the reply to a strict JSON array whose items follow
 * the order of the input.
 */

use serde::Serialize;

use crate::captions::MergedSubtitle;
use crate::translation::batch::Batch;

/// Instruction template for one batch.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// The default correction and translation prompt.
    pub const SUBTITLE_CORRECTOR: &'static str = r#"You are a professional subtitle editor and translator working from {source_language} to {target_language}.

The subtitles below come from an automatic speech transcription. For every item:
1. Correct the transcription: fix misheard words, punctuation, capitalization and filler noise, without changing the meaning.
2. Translate the corrected text into natural, fluent {target_language}.

## Output Requirements
- Return ONLY a JSON array with exactly {count} items, one per input item, in the same order.
- Every item has these fields in this order: "startTime", "endTime", "correctedText", "translation".
- Copy "startTime" and "endTime" unchanged from the input.
- Do not repeat the original "text" field.
- Use double quotes for all strings, no trailing commas, and no line breaks inside strings.
- Do not add explanations before or after the array.

## Example
Input:
{example_input}

Output:
{example_output}
{example_note}
## Subtitles
{subtitles}"#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Create the default template.
    pub fn subtitle_corrector() -> Self {
        Self::new(Self::SUBTITLE_CORRECTOR)
    }

    fn render(&self, values: &[(&str, &str)]) -> String {
        values
            .iter()
            .fold(self.template.clone(), |acc, (key, value)| {
                acc.replace(&format!("{{{}}}", key), value)
            })
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::subtitle_corrector()
    }
}

/// One subtitle as shown to the model.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptItem<'a> {
    pub start_time: u64,
    pub end_time: u64,
    pub text: &'a str,
}

impl<'a> From<&'a MergedSubtitle> for PromptItem<'a> {
    fn from(subtitle: &'a MergedSubtitle) -> Self {
        Self {
            start_time: subtitle.start_ms,
            end_time: subtitle.end_ms,
            text: &subtitle.text,
        }
    }
}

/// One item of the worked example reply, in contract field order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExampleOutput<'a> {
    start_time: u64,
    end_time: u64,
    corrected_text: &'a str,
    translation: &'a str,
}

const EXAMPLE_INPUT: [(u64, u64, &str); 2] = [
    (0, 3200, "so um today we gonna talk about the the weather"),
    (3200, 6100, "its going to rain alot tomorrow"),
];

const EXAMPLE_CORRECTED: [&str; 2] = [
    "So today we're going to talk about the weather.",
    "It's going to rain a lot tomorrow.",
];

/// Worked example translations by primary language subtag
const EXAMPLE_TRANSLATIONS: &[(&str, [&str; 2])] = &[
    ("zh", ["所以今天我们要聊聊天气。", "明天会下很多雨。"]),
    ("ja", ["では今日は天気について話しましょう。", "明日は雨がたくさん降ります。"]),
    ("ko", ["오늘은 날씨에 대해 이야기해 보겠습니다.", "내일은 비가 많이 올 거예요."]),
    ("es", ["Hoy vamos a hablar del tiempo.", "Mañana va a llover mucho."]),
    ("fr", ["Aujourd'hui, nous allons parler de la météo.", "Il va beaucoup pleuvoir demain."]),
    ("de", ["Heute sprechen wir über das Wetter.", "Morgen wird es viel regnen."]),
];

/// Renders a batch into the instruction prompt sent to the translator.
#[derive(Debug, Clone)]
pub struct TranslationRequestBuilder {
    source_language: String,
    target_language: String,
    target_subtag: String,
    template: PromptTemplate,
}

impl TranslationRequestBuilder {
    /// Create a builder.
    ///
    /// `target_tag` is the configured language tag, used to pick the worked
    /// example; the names are what the model reads.
    pub fn new(source_language: &str, target_language: &str, target_tag: &str) -> Self {
        let (target_subtag, _) = crate::language_utils::split_language_tag(target_tag);
        Self {
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            target_subtag,
            template: PromptTemplate::default(),
        }
    }

    /// Replace the instruction template.
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// Build the prompt for one batch.
    pub fn build(&self, batch: &Batch<'_>) -> String {
        let items: Vec<PromptItem<'_>> = batch.items.iter().map(PromptItem::from).collect();
        let subtitles = serde_json::to_string_pretty(&items).unwrap_or_else(|_| "[]".to_string());
        let (example_input, example_output, example_note) = self.example();
        let count = batch.items.len().to_string();

        self.template.render(&[
            ("source_language", &self.source_language),
            ("target_language", &self.target_language),
            ("count", &count),
            ("example_input", &example_input),
            ("example_output", &example_output),
            ("example_note", &example_note),
            ("subtitles", &subtitles),
        ])
    }

    /// Worked example in the target language when one is available.
    fn example(&self) -> (String, String, String) {
        let (translations, note) = match EXAMPLE_TRANSLATIONS
            .iter()
            .find(|(subtag, _)| *subtag == self.target_subtag)
        {
            Some((_, translations)) => (translations, String::new()),
            None => (
                &EXAMPLE_TRANSLATIONS[4].1,
                format!(
                    "(The example translation is in French; write yours in {}.)\n",
                    self.target_language
                ),
            ),
        };

        let input: Vec<PromptItem<'_>> = EXAMPLE_INPUT
            .iter()
            .map(|(start_time, end_time, text)| PromptItem {
                start_time: *start_time,
                end_time: *end_time,
                text,
            })
            .collect();

        let output: Vec<ExampleOutput<'_>> = EXAMPLE_INPUT
            .iter()
            .zip(EXAMPLE_CORRECTED.iter())
            .zip(translations.iter())
            .map(|(((start_time, end_time, _), corrected_text), translation)| ExampleOutput {
                start_time: *start_time,
                end_time: *end_time,
                corrected_text,
                translation,
            })
            .collect();

        (
            serde_json::to_string(&input).unwrap_or_default(),
            serde_json::to_string(&output).unwrap_or_default(),
            note,
        )
    }
}
