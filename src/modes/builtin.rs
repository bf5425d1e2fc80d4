use crate::modes::registry::RewriteMode;

/// (key, display name, description, prompt)
const BUILTIN_MODES: &[(&str, &str, &str, &str)] = &[
    (
        "trump",
        "🧑‍💼 Donald Trump",
        "Bold, self-assured, uses superlatives, simple language, often repeats phrases for emphasis, adds humor with exaggeration",
        "Rewrite the following text as if Donald Trump was saying it. Be bold, self-assured, use superlatives, simple language, often repeat phrases for emphasis, and add humor with exaggeration:",
    ),
    (
        "theoVon",
        "🎤 Theo Von",
        "Southern charm, quirky analogies, offbeat humor, conversational, uses unexpected metaphors",
        "Rewrite the following text with Theo Von's style. Use Southern charm, quirky analogies, offbeat humor, conversational tone, and unexpected metaphors:",
    ),
    (
        "joeyDiaz",
        "🔥 Joey Diaz",
        "Raw, energetic, uses strong language, streetwise humor, direct and unfiltered, often includes personal anecdotes",
        "Rewrite the following text in Joey Diaz's style. Be raw, energetic, use strong language, streetwise humor, direct and unfiltered, and include personal anecdotes where appropriate:",
    ),
    (
        "academic",
        "📚 Academic",
        "Clean, professional, formal tone, precise vocabulary, well-structured sentences",
        "Rewrite the following text in an academic style. Use clean, professional, formal tone, precise vocabulary, and well-structured sentences:",
    ),
    (
        "casual",
        "😎 Casual Millennial",
        "Relaxed, uses slang and emojis, conversational, friendly, pop culture references",
        "Rewrite the following text in a casual millennial style. Be relaxed, use slang and emojis, conversational, friendly, and include pop culture references:",
    ),
    (
        "flirty",
        "❤️ Guy looking for a girlfriend",
        "Flirty, lighthearted, sincere, a bit self-deprecating, playful compliments",
        "Rewrite the following text as if it's written by someone looking for a girlfriend. Make it flirty, lighthearted, sincere, a bit self-deprecating, with playful compliments:",
    ),
    (
        "factCheck",
        "🕵️ Fact Check",
        "Objective, cites sources, corrects errors, neutral and informative",
        "Fact check the following text. Be objective, cite sources where possible, correct errors, and maintain a neutral and informative tone:",
    ),
    (
        "mockOpponent",
        "🤡 Make Opponent's Point Look Silly",
        "Sarcastic, uses irony, highlights flaws humorously, playful ridicule",
        "Rewrite the following text to make the opponent's point look silly. Be sarcastic, use irony, highlight flaws humorously, and include playful ridicule:",
    ),
    (
        "strongerArgument",
        "🌟 Overshadow with a Stronger Argument",
        "Confident, assertive, presents superior logic, persuasive tone",
        "Rewrite the following text to overshadow with a stronger argument. Be confident, assertive, present superior logic, and use a persuasive tone:",
    ),
    (
        "diplomatic",
        "🤝 Diplomatic / Neutral Tone",
        "Balanced, non-confrontational, seeks common ground, respectful",
        "Rewrite the following text in a diplomatic, neutral tone. Be balanced, non-confrontational, seek common ground, and maintain a respectful tone:",
    ),
    (
        "creative",
        "🧑‍🎨 Creative / Playful Rewrite",
        "Imaginative, uses wordplay, whimsical, fun and engaging",
        "Rewrite the following text in a creative, playful way. Be imaginative, use wordplay, be whimsical, and make it fun and engaging:",
    ),
    (
        "kids",
        "🧑‍🏫 Simplify for Kids",
        "Simple words, short sentences, clear explanations, friendly tone",
        "Rewrite the following text for children. Use simple words, short sentences, clear explanations, and a friendly tone:",
    ),
    (
        "technical",
        "🧑‍🔬 Technical / Jargon-heavy",
        "Uses domain-specific terminology, detailed, assumes expert audience",
        "Rewrite the following text in a technical, jargon-heavy style. Use domain-specific terminology, be detailed, and assume an expert audience:",
    ),
    (
        "sarcastic",
        "🧑‍🎤 Sarcastic / Satirical",
        "Mocking, uses irony and exaggeration, witty, exposes absurdities",
        "Rewrite the following text in a sarcastic, satirical style. Be mocking, use irony and exaggeration, be witty, and expose absurdities:",
    ),
];

pub fn builtin_modes() -> Vec<RewriteMode> {
    BUILTIN_MODES
        .iter()
        .map(|(key, name, description, prompt)| {
            RewriteMode::builtin(key, name, prompt).with_description(description)
        })
        .collect()
}
