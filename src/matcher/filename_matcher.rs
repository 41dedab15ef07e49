use crate::config::MatchConfig;
use crate::matcher::similarity::score;
use crate::model::{CatalogError, MatchCandidate, MatchResult, MatchTier};
use crate::normalizer::{base_key, normalize, search_terms};
use crate::storage::MappingPersistence;
use crate::store::MappingStore;
use tracing::debug;

/// Trait defining the interface for a filename matcher.
pub trait Matcher {
    /// Finds the canonical URL candidates for a local file name.
    fn find<P: MappingPersistence>(
        &self,
        query: &str,
        store: &MappingStore<P>,
    ) -> Result<MatchResult, CatalogError>;
}

/// Tiered matcher: exact key, substring containment, weighted similarity,
/// then a search link. The first tier producing a candidate wins.
pub struct FilenameMatcher {
    config: MatchConfig,
}

impl FilenameMatcher {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    fn containment<P: MappingPersistence>(
        &self,
        base: &str,
        normalized_query: &str,
        store: &MappingStore<P>,
    ) -> Option<MatchCandidate> {
        let raw_hit = store
            .all()
            .filter(|(key, _)| !key.is_empty())
            .find(|(key, _)| key.contains(base) || base.contains(*key));

        let hit = raw_hit.or_else(|| {
            if normalized_query.is_empty() {
                return None;
            }
            // Keys that differ only by separators, versions or markers
            store.all().find(|(key, _)| normalize(key) == normalized_query)
        });

        hit.map(|(key, url)| MatchCandidate {
            url: url.to_string(),
            title: format!("{key} - partial match"),
            tier: MatchTier::PartialMatch,
            score: 1.0,
            matched_key: Some(key.to_string()),
        })
    }

    fn best_fuzzy<P: MappingPersistence>(
        &self,
        normalized_query: &str,
        store: &MappingStore<P>,
    ) -> Option<MatchCandidate> {
        let mut best: Option<(&str, &str, f64)> = None;

        for (key, url) in store.all() {
            let s = score(normalized_query, &normalize(key), &self.config);
            debug!(
                "Similarity '{}': prefix {:.2} keyword {:.2} total {:.2}",
                key, s.prefix, s.keyword, s.total
            );
            let best_score = best.map_or(0.0, |(_, _, b)| b);
            if s.total > self.config.suggestion_threshold && s.total > best_score {
                best = Some((key, url, s.total));
            }
        }

        best.map(|(key, url, total)| MatchCandidate {
            url: url.to_string(),
            title: format!("{key} - similar match ({}%)", (total * 100.0).round()),
            tier: MatchTier::FuzzyMatch,
            score: total,
            matched_key: Some(key.to_string()),
        })
    }

    fn search_fallback(&self, base: &str, terms: &[String]) -> MatchCandidate {
        let term = terms.first().map(String::as_str).unwrap_or(base);
        MatchCandidate {
            url: format!("{}{}", self.config.search_base_url, urlencoding::encode(term)),
            title: format!("\"{term}\" search results (check on Booth)"),
            tier: MatchTier::SearchFallback,
            score: 0.0,
            matched_key: None,
        }
    }
}

impl Matcher for FilenameMatcher {
    fn find<P: MappingPersistence>(
        &self,
        query: &str,
        store: &MappingStore<P>,
    ) -> Result<MatchResult, CatalogError> {
        let base = base_key(query);
        if base.trim().is_empty() {
            return Err(CatalogError::InvalidInput(format!(
                "'{query}' is not a usable file name"
            )));
        }
        let keywords: Vec<String> = search_terms(base).into_iter().map(String::from).collect();
        let done = |candidate: MatchCandidate| MatchResult {
            candidates: vec![candidate],
            keywords: keywords.clone(),
        };

        if let Some(url) = store.lookup(base) {
            debug!("Learned mapping hit for '{}'", base);
            return Ok(done(MatchCandidate {
                url: url.to_string(),
                title: format!("{base} - learned"),
                tier: MatchTier::Learned,
                score: 1.0,
                matched_key: Some(base.to_string()),
            }));
        }

        let normalized_query = normalize(base);
        debug!("Normalized '{}' to '{}'", base, normalized_query);

        if let Some(candidate) = self.containment(base, &normalized_query, store) {
            debug!("Partial match for '{}': {:?}", base, candidate.matched_key);
            return Ok(done(candidate));
        }

        if let Some(candidate) = self.best_fuzzy(&normalized_query, store) {
            debug!(
                "Fuzzy match for '{}': {:?} ({:.2})",
                base, candidate.matched_key, candidate.score
            );
            return Ok(done(candidate));
        }

        debug!("No match for '{}', returning a search link", base);
        Ok(done(self.search_fallback(base, &keywords)))
    }
}
