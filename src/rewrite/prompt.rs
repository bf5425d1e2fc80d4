use crate::modes::registry::RewriteMode;

/// Everything needed for one model call. Lives only while the call is in
/// flight.
#[derive(Debug, Clone, PartialEq)]
pub struct RewriteRequest {
    pub element_key: String,
    pub original_text: String,
    pub mode: RewriteMode,
    pub context_text: Option<String>,
    pub character_limit: Option<usize>,
}

impl RewriteRequest {
    pub fn prompt(&self) -> String {
        build_prompt(
            &self.mode.prompt_template,
            self.context_text.as_deref(),
            self.character_limit,
            &self.original_text,
        )
    }
}

/// `template`, optional context block and length hint, then the original
/// text, ending with the `Rewritten text:` cue.
pub fn build_prompt(
    template: &str,
    context: Option<&str>,
    character_limit: Option<usize>,
    original: &str,
) -> String {
    let mut prompt = String::with_capacity(template.len() + original.len() + 64);
    prompt.push_str(template);
    prompt.push_str("\n\n");

    if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str("Context (what you're replying to):\n\"");
        prompt.push_str(context);
        prompt.push_str("\"\n\n");
    }

    if let Some(limit) = character_limit {
        prompt.push_str(&format!("Keep your response under {} characters.", limit));
    }

    prompt.push_str("\n\nOriginal text:\n");
    prompt.push_str(original);
    prompt.push_str("\n\nRewritten text:");
    prompt
}
