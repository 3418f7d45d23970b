//! # docqa-cli
//!
//! Terminal front-end for `docqa-rag`: ingest a set of files, then chat about
//! them.
//!
//! ```text
//! docqa handbook.pdf faq.txt --model gpt-4 --top-k 6
//! ```
//!
//! `OPENAI_API_KEY` must be set, either in the environment or in a `.env`
//! file in the working directory.

pub mod args;
pub mod chat;

pub use args::Args;
pub use chat::{ChatCommand, LoadedFiles, load_files, run_chat};
