use crate::config::MatchConfig;
use crate::normalizer::keywords;

/// Breakdown of one weighted similarity computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityScore {
    pub prefix: f64,
    pub keyword: f64,
    pub total: f64,
}

/// Length of the strict common prefix divided by the longer length, in chars.
pub fn prefix_similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 0.0;
    }
    let common = a
        .chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .count();
    common as f64 / longest as f64
}

/// Share of query keywords that contain, or are contained by, some candidate
/// keyword. Each query keyword counts at most once.
pub fn keyword_similarity(query: &str, candidate: &str) -> f64 {
    let query_words = keywords(query);
    let candidate_words = keywords(candidate);

    let matched = query_words
        .iter()
        .filter(|q| {
            candidate_words
                .iter()
                .any(|c| q.contains(*c) || c.contains(**q))
        })
        .count();

    let denominator = query_words.len().max(candidate_words.len()).max(1);
    matched as f64 / denominator as f64
}

/// Weighted score of two already normalized strings.
pub fn score(query: &str, candidate: &str, cfg: &MatchConfig) -> SimilarityScore {
    let prefix = prefix_similarity(query, candidate);
    let keyword = keyword_similarity(query, candidate);
    SimilarityScore {
        prefix,
        keyword,
        total: cfg.prefix_weight * prefix + cfg.keyword_weight * keyword,
    }
}
