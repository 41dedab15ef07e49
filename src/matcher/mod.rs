// Matcher module: tiered filename matching and the similarity scoring behind it.

pub mod filename_matcher;
pub mod similarity;

pub use filename_matcher::{FilenameMatcher, Matcher};
