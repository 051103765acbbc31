use crate::domain::PostRecord;

const POSTS_PLACEHOLDER: &str = "{posts}";
const TRANSCRIPTION_PLACEHOLDER: &str = "{transcription}";

fn post_listing(records: &[PostRecord], limit: usize) -> String {
    let mut listing = String::new();
    for (i, record) in records.iter().take(limit).enumerate() {
        listing.push_str(&format!("{}. {}\n", i + 1, record.body_text));
        listing.push_str(&format!(
            "   Likes: {}, Reposts: {}\n\n",
            record.engagement.like_count, record.engagement.share_count
        ));
    }
    listing
}

/// Prompt asking for an analysis of the first `limit` posts.
///
/// A template gets the listing substituted for `{posts}`; without the
/// placeholder the listing is appended.
pub fn build_analysis_prompt(records: &[PostRecord], template: Option<&str>, limit: usize) -> String {
    let listing = post_listing(records, limit);

    match template {
        Some(template) if template.contains(POSTS_PLACEHOLDER) => {
            template.replace(POSTS_PLACEHOLDER, &listing)
        }
        Some(template) => format!("{}\n\n{}", template.trim_end(), listing),
        None => {
            let mut prompt = String::from("Analyze the following posts.\n\n");
            prompt.push_str("[What to cover]\n");
            prompt.push_str("1. Overall trends\n");
            prompt.push_str("2. What the most engaging posts have in common\n");
            prompt.push_str("3. Main topics\n\n");
            prompt.push_str("[Data]\n");
            prompt.push_str(&listing);
            prompt
        }
    }
}

pub fn build_transcript_prompt(transcription: &str, template: Option<&str>) -> String {
    match template {
        Some(template) if template.contains(TRANSCRIPTION_PLACEHOLDER) => {
            template.replace(TRANSCRIPTION_PLACEHOLDER, transcription)
        }
        Some(template) => format!("{}\n\n{}", template.trim_end(), transcription),
        None => format!(
            "Analyze this content.\n\n\
             [What to cover]\n\
             1. Overall tendencies and character\n\
             2. Key points and keywords\n\
             3. What makes the most engaging parts work\n\
             4. A 3-5 line summary\n\n\
             [Format]\n\
             - Concise and easy to follow\n\
             - Concrete numbers and examples\n\
             - Practical insights\n\n\
             [Text]\n{}",
            transcription
        ),
    }
}
