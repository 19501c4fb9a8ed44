use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, ReelsmithError};
use crate::segment::ScriptSegment;
use super::ScriptGenerator;

/// Language the narration text is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationLanguage {
    English,
    /// Devanagari narration; image queries stay English
    Hindi,
}

impl NarrationLanguage {
    pub fn from_voice(voice_id: &str) -> Self {
        if voice_id.contains("hi-IN") {
            NarrationLanguage::Hindi
        } else {
            NarrationLanguage::English
        }
    }

    /// Instruction embedded in the script prompt.
    pub fn instruction(&self) -> &'static str {
        match self {
            NarrationLanguage::English => "ENGLISH",
            NarrationLanguage::Hindi => {
                "HINDI (Devanagari Script). IMPORTANT: Write the 'text' in clear Hindi, \
                 but keep 'image_query' in English."
            }
        }
    }
}

/// System prompt for writing a script.
pub fn build_script_prompt(prompt: &str, segment_count: usize, language: NarrationLanguage) -> String {
    let language = language.instruction();
    format!(
        r#"Role: Professional Video Script Writer.
Input: "{prompt}"
Goal: Create a detailed, engaging video script.

Instructions:
1. If the Input is a TOPIC (e.g. "Facts about Cars"): Write a script about it.
2. If the Input is a QUESTION (e.g. "How does rain happen?"): Answer it in a video script format.
3. If the Input is a LONG SCRIPT (e.g. "Hello everyone, today we..."): KEEP the text exactly as is, just split it into segments and add visual cues.

Constraints:
1. Language for Narration ('text'): {language}
2. Duration: Approximately {segment_count} segments (Ignore if Custom Script).
3. Output Format: a JSON object with a single key "segments" holding an array.

Each segment must have:
- "text": The narration script (in {language}).
- "image_query": A specific, visual English keyword for stock footage search.

Example Output:
{{"segments": [
  {{"text": "India is a land of vibrant culture.", "image_query": "india culture festival"}},
  {{"text": "Taj Mahal is a symbol of love.", "image_query": "taj mahal drone shot"}}
]}}"#
    )
}

/// System prompt for translating a script.
pub fn build_translation_prompt(target_language: &str) -> String {
    format!(
        r#"Role: Professional Translator.
Goal: Translate the 'text' field of the provided JSON to {target_language}.
Constraints:
1. KEEP 'image_query' EXACTLY THE SAME (Do not translate visual cues).
2. Translate 'text' so it sounds natural in spoken {target_language}.
3. Output the exact same JSON structure."#
    )
}

fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag on the opening fence
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse an LLM reply into script segments.
///
/// Accepts a JSON array, or an object with exactly one key whose value is an
/// array. Anything else is a format error.
pub fn parse_script_response(content: &str) -> Result<Vec<ScriptSegment>> {
    let value: Value = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| ReelsmithError::Generation(format!("Script response is not valid JSON: {}", e)))?;

    let list = match value {
        Value::Array(items) => Value::Array(items),
        Value::Object(map) if map.len() == 1 => match map.into_iter().next() {
            Some((_, inner @ Value::Array(_))) => inner,
            _ => return Err(format_error()),
        },
        _ => return Err(format_error()),
    };

    let segments: Vec<ScriptSegment> = serde_json::from_value(list)
        .map_err(|e| ReelsmithError::Generation(format!("Malformed script segment: {}", e)))?;

    if segments.is_empty() {
        return Err(ReelsmithError::Generation("Script response contained no segments".to_string()));
    }

    Ok(segments)
}

fn format_error() -> ReelsmithError {
    ReelsmithError::Generation("AI output format invalid".to_string())
}

/// Single segment standing in for a script that could not be produced.
pub fn placeholder_script(error: &ReelsmithError) -> Vec<ScriptSegment> {
    vec![ScriptSegment {
        text: format!("Error: {}", error),
        image_query: "error".to_string(),
    }]
}

/// Generate a script, degrading to a placeholder segment on any failure.
pub async fn generate_or_placeholder(
    generator: &dyn ScriptGenerator,
    prompt: &str,
    segment_count: usize,
    language: NarrationLanguage,
) -> Vec<ScriptSegment> {
    match generator.generate(prompt, segment_count, language).await {
        Ok(segments) => {
            debug!("Generated {} script segment(s)", segments.len());
            segments
        }
        Err(e) => {
            warn!("Script generation failed, using placeholder: {}", e);
            placeholder_script(&e)
        }
    }
}

/// Result of a translation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Translation {
    Translated(Vec<ScriptSegment>),
    /// The service failed; these are the original segments
    Fallback(Vec<ScriptSegment>),
}

impl Translation {
    pub fn is_translated(&self) -> bool {
        matches!(self, Translation::Translated(_))
    }

    pub fn into_segments(self) -> Vec<ScriptSegment> {
        match self {
            Translation::Translated(segments) | Translation::Fallback(segments) => segments,
        }
    }
}

/// Translate `segments`, falling back to the originals on failure.
///
/// A reply with a different segment count counts as a failure. Image queries
/// are restored from the originals by index.
pub async fn translate_or_original(
    generator: &dyn ScriptGenerator,
    segments: &[ScriptSegment],
    target_language: &str,
) -> Translation {
    match generator.translate(segments, target_language).await {
        Ok(translated) if translated.len() == segments.len() => Translation::Translated(
            translated
                .into_iter()
                .zip(segments)
                .map(|(t, original)| ScriptSegment {
                    text: t.text,
                    image_query: original.image_query.clone(),
                })
                .collect(),
        ),
        Ok(translated) => {
            warn!(
                "Translation returned {} segment(s) for {}, keeping original text",
                translated.len(),
                segments.len()
            );
            Translation::Fallback(segments.to_vec())
        }
        Err(e) => {
            warn!("Translation to {} failed, keeping original text: {}", target_language, e);
            Translation::Fallback(segments.to_vec())
        }
    }
}
