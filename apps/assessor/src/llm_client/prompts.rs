// Shared prompt fragments. Each agent defines its own prompts in agents/prompts.rs;
// this file holds what every structured call appends.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with a single valid JSON object only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction that keeps extraction agents from inventing facts.
pub const NO_INVENTION_INSTRUCTION: &str = "\
    Only use information that is present in the provided text. \
    If a field is not mentioned, use null for optional values and [] for lists. \
    Never guess contact details, dates or employers.";

/// Joins an agent's system prompt with the JSON-only fragment.
pub fn with_json_only(system: &str) -> String {
    format!("{system}\n\n{JSON_ONLY_SYSTEM}")
}
