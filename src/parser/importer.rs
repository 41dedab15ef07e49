use crate::model::{CatalogError, ImportReport, PurchaseItem};
use crate::normalizer::base_key;
use crate::parser::Parser;
use crate::storage::MappingPersistence;
use crate::store::MappingStore;
use std::collections::HashSet;
use tracing::info;

/// Parses every document, deduplicates the items by URL (first occurrence
/// wins) and merges the `base key -> url` pairs the store does not know yet.
pub fn import_documents<P, D>(
    parser: &impl Parser,
    store: &mut MappingStore<P>,
    documents: &[D],
) -> Result<ImportReport, CatalogError>
where
    P: MappingPersistence,
    D: AsRef<str>,
{
    let mut all_items = Vec::new();
    for (i, document) in documents.iter().enumerate() {
        let items = parser.parse(document.as_ref())?;
        info!("Document {}/{}: {} items", i + 1, documents.len(), items.len());
        all_items.extend(items);
    }
    let total_items = all_items.len();

    let unique = dedup_by_url(all_items);
    info!("{} unique items after removing duplicate URLs", unique.len());

    let pairs: Vec<(String, String)> = unique
        .iter()
        .filter_map(|item| {
            let filename = item.filename.as_deref()?.trim();
            if filename.is_empty() || item.url.trim().is_empty() {
                return None;
            }
            Some((base_key(filename).to_string(), item.url.clone()))
        })
        .filter(|(key, _)| !key.trim().is_empty())
        .collect();

    let merge = store.bulk_merge(pairs)?;

    Ok(ImportReport {
        documents: documents.len(),
        total_items,
        unique_items: unique.len(),
        added: merge.added,
        skipped: merge.skipped,
        items: unique,
    })
}

fn dedup_by_url(items: Vec<PurchaseItem>) -> Vec<PurchaseItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.url.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ParserError;
    use crate::parser::PurchaseHistoryParser;
    use crate::store::tests::CountingPersistence;

    /// Returns canned items, one list per call, keyed by the document text.
    struct CannedParser;

    impl Parser for CannedParser {
        fn parse(&self, html: &str) -> Result<Vec<PurchaseItem>, ParserError> {
            if html == "broken" {
                return Err(ParserError::HtmlParseError("bad selector".into()));
            }
            Ok(html
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(|line| {
                    let mut parts = line.trim().splitn(2, ' ');
                    let url = parts.next().unwrap_or_default().to_string();
                    let filename = parts.next().map(str::to_string);
                    PurchaseItem {
                        title: None,
                        url,
                        filename,
                        thumbnail_url: None,
                    }
                })
                .collect())
        }
    }

    #[test]
    fn merges_novel_pairs_with_base_keys() {
        let mut store = MappingStore::open(CountingPersistence::seeded(&[(
            "existing",
            "https://booth.pm/ja/items/1",
        )]))
        .unwrap();

        let docs = [
            "https://booth.pm/ja/items/2 avatar_clothes.unitypackage\n\
             https://booth.pm/ja/items/3\n\
             https://booth.pm/ja/items/9 existing.zip",
            "https://booth.pm/ja/items/2 avatar_clothes_copy.zip\n\
             https://booth.pm/ja/items/4 texture.psd",
        ];
        let report = import_documents(&CannedParser, &mut store, &docs).unwrap();

        assert_eq!(report.documents, 2);
        assert_eq!(report.total_items, 5);
        assert_eq!(report.unique_items, 4);
        assert_eq!(report.added, 2);
        assert_eq!(report.skipped, 1);

        assert_eq!(store.lookup("avatar_clothes"), Some("https://booth.pm/ja/items/2"));
        assert_eq!(store.lookup("texture.psd"), Some("https://booth.pm/ja/items/4"));
        assert_eq!(store.lookup("existing"), Some("https://booth.pm/ja/items/1"));
        assert_eq!(store.lookup("avatar_clothes_copy"), None);
        assert_eq!(store.persistence().saves, 1);
    }

    #[test]
    fn parse_failure_is_reported_and_nothing_merged() {
        let mut store = MappingStore::open(CountingPersistence::default()).unwrap();
        let docs = ["https://booth.pm/ja/items/2 a.zip", "broken"];
        let err = import_documents(&CannedParser, &mut store, &docs).unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn imported_keys_are_found_by_the_matcher() {
        use crate::config::MatchConfig;
        use crate::matcher::{FilenameMatcher, Matcher};
        use crate::model::MatchTier;

        let html = r#"
            <div class="mb-16 bg-white p-16">
              <a href="https://booth.pm/ja/items/5840011">x</a>
              <div class="typography-14 !preserve-half-leading">reverse_side_suit_shinra.zip</div>
            </div>
        "#;
        let mut store = MappingStore::open(CountingPersistence::default()).unwrap();
        let report = import_documents(&PurchaseHistoryParser::new(), &mut store, &[html]).unwrap();
        assert_eq!(report.added, 1);

        let matcher = FilenameMatcher::new(MatchConfig::default());
        let result = matcher.find("reverse_side_suit_shinra.zip", &store).unwrap();
        let best = result.best().unwrap();
        assert_eq!(best.tier, MatchTier::Learned);
        assert!(best.is_auto_actionable(matcher.config()));
    }
}
