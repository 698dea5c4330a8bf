// Resume generation: README summaries for the project portfolio, then one structured
// generation call that tailors the resume to a job description.
// All LLM calls go through the llm_client::TextGenerator seam.

pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod summarizer;
