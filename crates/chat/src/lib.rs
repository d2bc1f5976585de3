//! The shipped reply handler for Corvid: an OpenAI-compatible generation
//! backend wired into the ingestion pipeline's handler seam.

pub mod generate;
pub mod handler;

pub use {
    generate::{DEFAULT_OPENAI_BASE_URL, Generator, OpenAiGenerator},
    handler::{ChatHandler, DEFAULT_SYSTEM_PROMPT, TEXT_ONLY_REPLY},
};
