pub mod page;
pub mod record;
pub mod state;

pub use page::FeedPage;
pub use record::{
    split_prompt, webp_to_png, Author, Record, SplitPrompt, PARAM_MARKER, PROMPT_NOT_FOUND,
    PROMPT_RETRIEVAL_FAILED, USER_NOT_FOUND,
};
pub use state::{EngineState, StopReason};
