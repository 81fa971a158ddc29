//! Promotional caption generation for page posts.

use rand::seq::SliceRandom;

/// The fixed caption template set. `{topic}` is replaced with the caller's
/// prompt verbatim.
pub const CAPTION_TEMPLATES: &[&str] = &[
    "🚀 You won't believe this: {topic} 🔥 Tag someone who needs to see it! 👇 #viral #trending",
    "⚡ STOP scrolling! {topic} is about to change everything 🤯 Share if you agree! #fyp #mustsee",
    "💥 {topic} — the secret nobody is talking about 🤫 Save this post before it's gone! #tips #viral",
    "🔥 HOT right now: {topic} 🔥 Drop a ❤️ in the comments if you're in! #trending #community",
    "🎯 {topic}: everything you need to know in one post 👀 Follow us for more! #learn #grow",
];

/// Render `prompt` into one of the fixed templates, chosen uniformly at
/// random. No seed control; callers wanting determinism should build their
/// caption themselves.
pub fn pick_template(prompt: &str) -> String {
    let mut rng = rand::thread_rng();
    let template = CAPTION_TEMPLATES
        .choose(&mut rng)
        .expect("template set is non-empty");
    template.replace("{topic}", prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_template_contains_prompt() {
        for _ in 0..50 {
            let caption = pick_template("homemade pizza tutorial");
            assert!(caption.contains("homemade pizza tutorial"));
        }
    }

    #[test]
    fn test_pick_template_matches_a_fixed_template() {
        for _ in 0..50 {
            let caption = pick_template("beginner workout routine");
            let matched = CAPTION_TEMPLATES
                .iter()
                .any(|t| t.replace("{topic}", "beginner workout routine") == caption);
            assert!(matched, "caption did not come from the template set: {caption}");
        }
    }

    #[test]
    fn test_pick_template_with_empty_prompt() {
        let caption = pick_template("");
        assert!(!caption.is_empty());
        assert!(!caption.contains("{topic}"));
    }
}
