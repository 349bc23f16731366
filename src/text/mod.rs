//! Text matching for abstracts
//!
//! This module contains the pure, synchronous half of the pipeline:
//! - Splitting an abstract into sentences
//! - Compiling the configured keywords into case-insensitive matchers
//! - Finding the first sentence that mentions a keyword

mod keyword;
mod sentence;

pub use keyword::{Keyword, KeywordSet};
pub use sentence::{find_sentence_with_keyword, split_sentences};
