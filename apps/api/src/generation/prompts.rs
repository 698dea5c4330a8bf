// All LLM prompt constants for the Generation module.

use crate::llm_client::fill_template;

/// System prompt for README summarisation.
pub const SUMMARY_SYSTEM: &str =
    "You are a technical resume writing specialist who creates compelling project \
    summaries from GitHub repositories.";

/// README summary template. Replace `{repo_name}` and `{readme}` before sending.
pub const SUMMARY_PROMPT_TEMPLATE: &str = r#"Transform the GitHub README below into a concise, professional project summary suitable for a resume.

PROJECT NAME: {repo_name}

README CONTENT:
"""
{readme}
"""

Write a short summary that covers:
1. Purpose: what problem the project solves or what it provides.
2. Technical stack: key languages, frameworks and tools.
3. Implementation highlights: notable features, algorithms or integrations.
4. Impact: measurable outcomes, only if the README states them.

Guidelines:
- Lead with action verbs (developed, implemented, built, designed, optimized).
- Name concrete technologies, APIs, databases and cloud services for keyword matching.
- Stay factual. No marketing language, no invented numbers.

Reply with the summary text only, without labels or commentary."#;

/// System prompt for structured resume generation. Enforces JSON-only output.
pub const GENERATION_SYSTEM: &str =
    "You are an expert resume optimizer and ATS specialist. You create structured, \
    keyword-optimized resumes tailored to one job description. \
    You MUST respond with a single valid JSON object only. \
    Do NOT include any text outside the JSON object.";

/// Generation template. Replace `{resume_text}`, `{portfolio}` and `{job_description}`.
pub const GENERATION_PROMPT_TEMPLATE: &str = r#"Analyze the resume, the complete project portfolio and the job description below, and produce a customized, keyword-optimized resume as JSON.

ANALYSIS:
1. Match keywords from the job description against the resume and every project in the portfolio.
2. Select the 3-5 projects from the complete portfolio that best fit the role, including projects not on the current resume.
3. Infer skills only where the experience or the selected projects demonstrate them.
4. Prioritize and reorder experience by relevance to the target role.
5. Rephrase existing achievements in the job description's terminology for ATS scanning.

Return a JSON object with this EXACT schema (no extra fields):
{
  "overview": {
    "name": "Full Name",
    "current_role": "Current job title, if any",
    "company": "Current company, if any",
    "professional_summary": "2-3 sentences on the qualifications most relevant to this job"
  },
  "contact_info": {
    "phone": "Phone number",
    "email": "Email address",
    "location": "City, State/Country",
    "profile_links": {"LinkedIn": "", "GitHub": "", "Portfolio": ""}
  },
  "skills": ["Skill", "..."],
  "work_experience": [
    {
      "title": "Job Title",
      "company": "Company Name",
      "duration": "Start - End",
      "location": "City, State",
      "description": ["Achievement or responsibility using job keywords", "..."]
    }
  ],
  "projects": [
    {
      "name": "Project Name",
      "duration": "Timeline",
      "description": ["Outcome or technical achievement", "..."],
      "technologies": ["Technology", "..."],
      "links": ["https://..."]
    }
  ],
  "education": [
    {"degree": "Degree and Major", "institution": "University", "duration": "Start - End"}
  ],
  "certifications": [
    {"name": "Certification", "issuer": "Issuer", "date": "Date", "credential_id": "ID"}
  ],
  "achievements": ["Award, publication or leadership outcome", "..."]
}

NO FABRICATION:
- Never add work experience, education, certifications, companies, dates or achievements that are not in the source material.
- Never invent projects or technologies. Projects may only come from the portfolio or the resume.
- Do not add years of experience or metrics that are not provided.
- Leave a field empty ("" or []) when the source material has nothing for it.

---
RESUME:
{resume_text}

---
COMPLETE PROJECT PORTFOLIO:
{portfolio}

---
TARGET JOB DESCRIPTION:
{job_description}

---
Return ONLY the JSON object."#;

pub fn build_summary_prompt(repo_name: &str, readme: &str) -> String {
    fill_template(
        SUMMARY_PROMPT_TEMPLATE,
        &[("repo_name", repo_name), ("readme", readme)],
    )
}

pub fn build_generation_prompt(resume_text: &str, portfolio: &str, job_description: &str) -> String {
    fill_template(
        GENERATION_PROMPT_TEMPLATE,
        &[
            ("resume_text", resume_text),
            ("portfolio", portfolio),
            ("job_description", job_description),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_prompt_keeps_placeholder_text_from_inputs() {
        let resume = "Built a {portfolio} renderer and a {job_description} linter";
        let prompt = build_generation_prompt(resume, "**engine**: emulator", "Rust engineer");
        assert!(prompt.contains(resume));
        assert_eq!(prompt.matches("**engine**: emulator").count(), 1);
        assert_eq!(prompt.matches("Rust engineer").count(), 1);
    }
}
