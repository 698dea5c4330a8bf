//! Structured resume generation.
//!
//! Flow: build prompt (resume text + project portfolio + job description) → LLM →
//!       strip fences → cut to the outermost JSON object → sanitize against the schema →
//!       typed `ResumeDocument`.

use tracing::{debug, info};

use crate::editing::schema::RESUME_SHAPE;
use crate::errors::AppError;
use crate::generation::prompts::{build_generation_prompt, GENERATION_SYSTEM};
use crate::llm_client::{strip_code_fences, ChatMessage, GenerationRequest, TextGenerator};
use crate::models::resume::ResumeDocument;

const GENERATION_TEMPERATURE: f32 = 0.1;
const GENERATION_MAX_TOKENS: u32 = 2000;

/// Generates a job-tailored resume document. There is no offline fallback: a model
/// failure surfaces as `ExternalService`, an unusable reply as `MalformedModelOutput`.
pub async fn generate_structured_resume(
    llm: &dyn TextGenerator,
    model: &str,
    resume_text: &str,
    portfolio: &str,
    job_description: &str,
) -> Result<ResumeDocument, AppError> {
    let request = GenerationRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::system(GENERATION_SYSTEM),
            ChatMessage::user(build_generation_prompt(
                resume_text,
                portfolio,
                job_description,
            )),
        ],
        temperature: GENERATION_TEMPERATURE,
        max_tokens: GENERATION_MAX_TOKENS,
    };

    let reply = llm.generate(&request).await?;
    debug!("Raw resume JSON response: {reply}");

    let document = parse_resume_reply(&reply)?;
    info!(
        "Generated resume for '{}': {} skills, {} roles, {} projects",
        document.subject_name(),
        document.skills.len(),
        document.work_experience.len(),
        document.projects.len()
    );
    Ok(document)
}

/// Turns a raw model reply into a schema-conforming document.
pub fn parse_resume_reply(reply: &str) -> Result<ResumeDocument, AppError> {
    let text = strip_code_fences(reply);
    let object = outermost_object(text).ok_or_else(|| {
        AppError::MalformedModelOutput("reply contains no JSON object".to_string())
    })?;

    let raw: serde_json::Value = serde_json::from_str(object)
        .map_err(|e| AppError::MalformedModelOutput(format!("invalid resume JSON: {e}")))?;
    if !raw.is_object() {
        return Err(AppError::MalformedModelOutput(
            "resume JSON is not an object".to_string(),
        ));
    }

    serde_json::from_value(RESUME_SHAPE.sanitize(raw))
        .map_err(|e| AppError::MalformedModelOutput(format!("resume does not fit schema: {e}")))
}

fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
