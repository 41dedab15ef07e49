// Booth purchase-history (library page) HTML parsing
use crate::model::{ParserError, PurchaseItem};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, warn};

static RE_ITEM_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://(?:[\w-]+\.)?booth\.pm/(?:[a-z]{2}/)?items/\d+").expect("Invalid regex")
});

static RE_FILENAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.+?\.(?:zip|rar|unitypackage|pdf|psd|ai|png|jpg|jpeg))\b")
        .expect("Invalid regex")
});

const THUMBNAIL_HOST: &str = "https://booth.pximg.net";

/// How many ancestors above an item link make up its block when the page has
/// no recognizable item cards.
const FALLBACK_BLOCK_DEPTH: usize = 3;

pub trait Parser {
    fn parse(&self, html: &str) -> Result<Vec<PurchaseItem>, ParserError>;
}

pub struct PurchaseHistoryParser;

impl PurchaseHistoryParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PurchaseHistoryParser {
    fn default() -> Self {
        Self::new()
    }
}

fn selector(css: &str) -> Result<Selector, ParserError> {
    Selector::parse(css).map_err(|e| ParserError::HtmlParseError(format!("{css}: {e}")))
}

struct Selectors {
    card: Selector,
    anchor: Selector,
    title: Selector,
    title_fallback: Selector,
    filename: Selector,
    image: Selector,
}

impl Selectors {
    fn build() -> Result<Self, ParserError> {
        Ok(Self {
            card: selector("div.mb-16.bg-white")?,
            anchor: selector("a[href]")?,
            title: selector("div.font-bold")?,
            title_fallback: selector(".typography-16")?,
            filename: selector("div.typography-14")?,
            image: selector("img[src]")?,
        })
    }
}

impl Parser for PurchaseHistoryParser {
    fn parse(&self, html: &str) -> Result<Vec<PurchaseItem>, ParserError> {
        let sel = Selectors::build()?;
        let document = Html::parse_document(html);

        let mut blocks: Vec<ElementRef> = document.select(&sel.card).collect();
        debug!("Found {} library item cards", blocks.len());

        if blocks.is_empty() {
            // No item cards, take the surroundings of every item link instead
            let mut seen = HashSet::new();
            for anchor in document.select(&sel.anchor) {
                let href = anchor.value().attr("href").unwrap_or("");
                if !RE_ITEM_URL.is_match(href) {
                    continue;
                }
                let block = anchor
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .take(FALLBACK_BLOCK_DEPTH)
                    .last()
                    .unwrap_or(anchor);
                if seen.insert(block.id()) {
                    blocks.push(block);
                }
            }
            debug!("Fallback found {} blocks around item links", blocks.len());
        }

        let mut items = Vec::new();
        for block in blocks {
            match parse_block(block, &sel) {
                Some(item) => items.push(item),
                None => warn!("Skipping purchase block without an item URL"),
            }
        }

        debug!("Parsed {} purchased items", items.len());
        Ok(items)
    }
}

fn parse_block(block: ElementRef, sel: &Selectors) -> Option<PurchaseItem> {
    let url = block.select(&sel.anchor).find_map(|a| {
        let href = a.value().attr("href")?;
        RE_ITEM_URL.find(href).map(|m| m.as_str().to_string())
    })?;

    let title = block
        .select(&sel.title)
        .chain(block.select(&sel.title_fallback))
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .find(|t| !t.is_empty());

    let filename = block
        .select(&sel.filename)
        .find_map(|el| file_name_in(&el.text().collect::<String>()))
        .or_else(|| block.text().find_map(file_name_in));

    let thumbnail_url = block
        .select(&sel.image)
        .filter_map(|img| img.value().attr("src"))
        .find(|src| src.starts_with(THUMBNAIL_HOST))
        .map(str::to_string);

    Some(PurchaseItem {
        title,
        url,
        filename,
        thumbnail_url,
    })
}

fn file_name_in(text: &str) -> Option<String> {
    RE_FILENAME
        .captures(text.trim())
        .map(|c| c[1].trim().to_string())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIBRARY_PAGE: &str = r#"
        <html><body>
        <div class="mb-16 bg-white p-16 desktop:rounded-8">
          <div><a href="https://booth.pm/ja/items/5840011">
            <img src="https://booth.pximg.net/c/72x72/users/1/i/5840011/a.jpg">
          </a></div>
          <div class="text-text-default font-bold typography-16 break-all">Reverse Side Suit &amp; Tie</div>
          <div class="typography-14 !preserve-half-leading">Shinra Shop</div>
          <div class="typography-14 !preserve-half-leading">reverse_side_suit_shinra.zip</div>
        </div>
        <div class="mb-16 bg-white p-16">
          <a href="https://booth.pm/ja/items/4764582">link</a>
          <div class="text-text-default font-bold typography-16">Teddy Bear Hair</div>
          <div class="typography-14 !preserve-half-leading">Teddy_Bear_Hair_v.1.0.1.unitypackage</div>
        </div>
        <div class="mb-16 bg-white p-16">
          <a href="https://example.com/elsewhere">not an item</a>
        </div>
        </body></html>
    "#;

    #[test]
    fn parses_library_cards() {
        let items = PurchaseHistoryParser::new().parse(LIBRARY_PAGE).unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].url, "https://booth.pm/ja/items/5840011");
        assert_eq!(items[0].title.as_deref(), Some("Reverse Side Suit & Tie"));
        assert_eq!(items[0].filename.as_deref(), Some("reverse_side_suit_shinra.zip"));
        assert_eq!(
            items[0].thumbnail_url.as_deref(),
            Some("https://booth.pximg.net/c/72x72/users/1/i/5840011/a.jpg")
        );

        assert_eq!(items[1].url, "https://booth.pm/ja/items/4764582");
        assert_eq!(
            items[1].filename.as_deref(),
            Some("Teddy_Bear_Hair_v.1.0.1.unitypackage")
        );
        assert_eq!(items[1].thumbnail_url, None);
    }

    #[test]
    fn falls_back_to_blocks_around_item_links() {
        let html = r#"
            <ul>
              <li><section>
                <p><a href="https://booth.pm/en/items/111">Fluffy Bob</a></p>
                <span>Fluffy_Bob.psd</span>
              </section></li>
              <li><section>
                <p><a href="https://shop.booth.pm/items/222">Gothic Clothes</a></p>
                <span>+Head_Gothic_Clothes.zip (12 MB)</span>
              </section></li>
            </ul>
        "#;
        let items = PurchaseHistoryParser::new().parse(html).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].url, "https://booth.pm/en/items/111");
        assert_eq!(items[0].filename.as_deref(), Some("Fluffy_Bob.psd"));
        assert_eq!(items[0].title, None);
        assert_eq!(items[1].url, "https://shop.booth.pm/items/222");
        assert_eq!(items[1].filename.as_deref(), Some("+Head_Gothic_Clothes.zip"));
    }

    #[test]
    fn page_without_items_is_empty() {
        let items = PurchaseHistoryParser::new()
            .parse("<html><body><p>nothing bought yet</p></body></html>")
            .unwrap();
        assert!(items.is_empty());
    }
}
