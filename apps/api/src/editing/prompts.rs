// Prompt constants for turning a chat instruction into mutation commands.

use crate::llm_client::fill_template;

/// System prompt for the chat parse step. Enforces a JSON list reply.
pub const EDIT_SYSTEM: &str =
    "You are an expert at turning natural-language resume edit requests into precise \
    JSON edit commands. Always respond with a JSON array of command objects only.";

/// Edit prompt template. Replace `{resume_json}` and `{instruction}` before sending.
pub const EDIT_PROMPT_TEMPLATE: &str = r#"Analyze the update request below and produce the edit commands that apply it to the resume.

CURRENT RESUME:
```json
{resume_json}
```

UPDATE REQUEST:
{instruction}

Each command is a JSON object with one of these forms:
- {"op": "set", "path": [...], "value": ...}        replace the value at path
- {"op": "append", "path": [...], "value": ...}     add an element to the end of the list at path
- {"op": "remove_at", "path": [...], "index": N}    remove element N from the list at path

"path" is a list of field names (strings) and zero-based list indices (integers), starting at a top-level field of the resume, e.g. ["projects", 1, "description", 0].

RULES:
1. Only use fields that already appear in the resume above. Never invent new fields. The only place a new key may be created is inside "contact_info" -> "profile_links" (platform name -> URL).
2. Keep every field's type: lists stay lists, text stays text. To add one skill, append a string to ["skills"]; never set ["skills"] to a single string.
3. When appending to a list of records (work_experience, projects, education, certifications), the value is a full object using that list's fields.
4. Write real, polished replacement text for summaries, descriptions and bullet points. Never use placeholders such as "new summary" or "updated text".
5. Only change what the request asks for. Use the indices shown in the resume; do not guess.
6. If the request is ambiguous or does not apply to this resume, return [].

EXAMPLES:

Request: "Add React and FastAPI to my skills"
[{"op": "append", "path": ["skills"], "value": "React"}, {"op": "append", "path": ["skills"], "value": "FastAPI"}]

Request: "Revise the second project description to highlight my work on recommender systems"
[{"op": "set", "path": ["projects", 1, "description", 0], "value": "Designed and deployed a recommender system using matrix factorization, increasing user engagement by 30%."}]

Request: "Remove the third skill"
[{"op": "remove_at", "path": ["skills"], "index": 2}]

Request: "Add my GitHub profile https://github.com/ada"
[{"op": "set", "path": ["contact_info", "profile_links", "GitHub"], "value": "https://github.com/ada"}]

Return ONLY the JSON array. No markdown, no explanations."#;

pub fn build_edit_prompt(resume_json: &str, instruction: &str) -> String {
    fill_template(
        EDIT_PROMPT_TEMPLATE,
        &[("resume_json", resume_json), ("instruction", instruction.trim())],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_prompt_embeds_document_and_instruction() {
        let prompt = build_edit_prompt("{\"skills\": []}", "  add Go  ");
        assert!(prompt.contains("{\"skills\": []}"));
        assert!(prompt.contains("UPDATE REQUEST:\nadd Go\n"));
        assert!(!prompt.contains("{resume_json}"));
        assert!(!prompt.contains("{instruction}"));
    }

    #[test]
    fn test_placeholder_text_inside_document_survives() {
        let resume = r#"{"achievements": ["Wrote {instruction} parser"]}"#;
        let prompt = build_edit_prompt(resume, "add Go");
        assert!(prompt.contains(resume));
        assert_eq!(prompt.matches("add Go").count(), 1);
    }
}
