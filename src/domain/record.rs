use serde::{Deserialize, Serialize};

/// Substituted for the author name when no profile link is rendered.
pub const USER_NOT_FOUND: &str = "user not found";

/// Substituted for the prompt when the item has no copy control.
pub const PROMPT_NOT_FOUND: &str = "prompt not found";

/// Substituted for the prompt when the copy round-trip fails.
pub const PROMPT_RETRIEVAL_FAILED: &str = "prompt retrieval failed";

/// Token that starts the parameter section of a prompt.
pub const PARAM_MARKER: &str = "--";

/// Author identity attached to a feed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub user_name: String,
    pub user_id: String,
    pub user_profile_link: String,
}

impl Default for Author {
    fn default() -> Self {
        Self {
            user_name: USER_NOT_FOUND.to_string(),
            user_id: String::new(),
            user_profile_link: String::new(),
        }
    }
}

/// One harvested feed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub job_id: String,
    pub job_link: String,
    pub img_link: String,
    pub user_name: String,
    pub user_id: String,
    pub user_profile_link: String,
    pub prompt: String,
    pub prompt_params: String,
    pub metadata: String,
}

impl Record {
    /// Build a record from resolved parts, splitting the raw prompt text.
    pub fn new(
        job_id: impl Into<String>,
        job_link: impl Into<String>,
        img_link: impl Into<String>,
        author: Author,
        raw_prompt: &str,
    ) -> Self {
        let split = split_prompt(raw_prompt);
        Self {
            job_id: job_id.into(),
            job_link: job_link.into(),
            img_link: img_link.into(),
            user_name: author.user_name,
            user_id: author.user_id,
            user_profile_link: author.user_profile_link,
            prompt: split.prompt_text,
            prompt_params: split.prompt_params,
            metadata: String::new(),
        }
    }

    /// Whether the author was found on the page.
    pub fn has_known_author(&self) -> bool {
        self.user_name != USER_NOT_FOUND
    }

    /// Small preview variant of the image, as served by the host CDN.
    pub fn preview_link(&self) -> String {
        insert_before_extension(&self.img_link, "_384_N")
    }

    /// Image link as shown to the operator (PNG rendition).
    pub fn display_link(&self) -> String {
        webp_to_png(&self.img_link)
    }
}

/// Rewrite a trailing `.webp` extension to `.png`.
pub fn webp_to_png(link: &str) -> String {
    match link.strip_suffix(".webp") {
        Some(stem) => format!("{stem}.png"),
        None => link.to_string(),
    }
}

fn insert_before_extension(link: &str, marker: &str) -> String {
    for ext in [".webp", ".png"] {
        if let Some(stem) = link.strip_suffix(ext) {
            return format!("{stem}{marker}{ext}");
        }
    }
    link.to_string()
}

/// Prompt text split at the first parameter marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPrompt {
    pub prompt_text: String,
    pub prompt_params: String,
}

/// Split a copied prompt into its free text and its `--` parameters.
///
/// The parameters keep the marker itself; both halves are trimmed.
pub fn split_prompt(full: &str) -> SplitPrompt {
    match full.find(PARAM_MARKER) {
        Some(idx) => SplitPrompt {
            prompt_text: full[..idx].trim().to_string(),
            prompt_params: full[idx..].trim().to_string(),
        },
        None => SplitPrompt {
            prompt_text: full.trim().to_string(),
            prompt_params: String::new(),
        },
    }
}
