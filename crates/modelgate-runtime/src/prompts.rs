//! Prompt templates, one per operation.
//!
//! Renderers are pure: validated request in, prompt text out.

use modelgate_types::{ClassifyRequest, SummarizeRequest, TranslateRequest};

pub fn render_summarize(request: &SummarizeRequest) -> String {
    format!(
        "You are a professional summarization assistant.\n\
         Summarize the following text in exactly {} concise sentence(s). \
         Write the summary in language code '{}'. \
         Output only the summary text, nothing else.\n\n\
         TEXT:\n{}\n\nSUMMARY:",
        request.max_sentences, request.language, request.text
    )
}

pub fn render_translate(request: &TranslateRequest) -> String {
    format!(
        "You are a professional translation assistant.\n\
         Translate the following text from '{}' to '{}'. \
         Output only the translated text, nothing else.\n\n\
         TEXT:\n{}\n\nTRANSLATION:",
        request.source_language, request.target_language, request.text
    )
}

pub fn render_classify(request: &ClassifyRequest) -> String {
    let categories = request
        .categories
        .iter()
        .map(|c| format!("\"{}\"", c))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are a text classification assistant.\n\
         Classify the following text into exactly one of these categories: {}.\n\
         Respond with a JSON object only, in this exact format:\n\
         {{\"label\": \"<chosen_category>\", \"confidence\": <0.0-1.0>}}\n\n\
         TEXT:\n{}\n\nCLASSIFICATION:",
        categories, request.text
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_prompt() {
        let mut request = SummarizeRequest::new("Rust is a systems language.");
        request.max_sentences = 2;
        request.language = "fr".to_string();

        insta::assert_snapshot!(render_summarize(&request), @r"
        You are a professional summarization assistant.
        Summarize the following text in exactly 2 concise sentence(s). Write the summary in language code 'fr'. Output only the summary text, nothing else.

        TEXT:
        Rust is a systems language.

        SUMMARY:
        ");
    }

    #[test]
    fn test_translate_prompt() {
        let request = TranslateRequest::new("Good morning", "en", "de");

        insta::assert_snapshot!(render_translate(&request), @r"
        You are a professional translation assistant.
        Translate the following text from 'en' to 'de'. Output only the translated text, nothing else.

        TEXT:
        Good morning

        TRANSLATION:
        ");
    }

    #[test]
    fn test_classify_prompt_quotes_categories() {
        let request = ClassifyRequest::new("Great product", ["positive", "negative", "neutral"]);

        insta::assert_snapshot!(render_classify(&request), @r#"
        You are a text classification assistant.
        Classify the following text into exactly one of these categories: "positive", "negative", "neutral".
        Respond with a JSON object only, in this exact format:
        {"label": "<chosen_category>", "confidence": <0.0-1.0>}

        TEXT:
        Great product

        CLASSIFICATION:
        "#);
    }
}
