//! Filename canonicalization used by the matcher and the importer.

use regex::Regex;
use std::sync::LazyLock;

static RE_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_\s\-.]").expect("Invalid regex"));

static RE_VER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ver\d+").expect("Invalid regex"));

static RE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"v?\d+(?:\.\d+)*").expect("Invalid regex"));

static RE_PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(.*?\)").expect("Invalid regex"));

static RE_TYPE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"type[a-z]").expect("Invalid regex"));

static RE_GENDER_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"men|women").expect("Invalid regex"));

static RE_EXTENSION_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"psd|png|jpg|jpeg|zip|rar|unitypackage").expect("Invalid regex")
});

static RE_PACKAGE_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(?:unitypackage|zip|rar)$").expect("Invalid regex"));

static RE_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z]{3,}").expect("Invalid regex"));

static RE_TERM_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_\-\s]+").expect("Invalid regex"));

/// Canonicalize a raw filename into its comparable form.
///
/// Steps run in a fixed order, each on the previous output:
/// lowercase, drop separators, drop version markers, drop parenthesized notes,
/// drop type/gender markers, drop file-extension tokens, trim.
///
/// Removal is substring based, so it can also eat parts of unrelated words
/// (`"rar"` inside a name, `"men"` inside `"mental"`).
pub fn normalize(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let s = RE_SEPARATORS.replace_all(&lower, "");
    let s = RE_VER_PREFIX.replace_all(&s, "");
    let s = RE_VERSION.replace_all(&s, "");
    let s = RE_PARENTHESIZED.replace_all(&s, "");
    let s = RE_TYPE_MARKER.replace_all(&s, "");
    let s = RE_GENDER_MARKER.replace_all(&s, "");
    let s = RE_EXTENSION_TOKEN.replace_all(&s, "");
    s.trim().to_string()
}

/// Strip one trailing `.unitypackage`, `.zip` or `.rar` (any case).
pub fn base_key(filename: &str) -> &str {
    match RE_PACKAGE_EXTENSION.find(filename) {
        Some(m) => &filename[..m.start()],
        None => filename,
    }
}

/// Lowercase letter runs of three or more, in order of appearance.
pub fn keywords(normalized: &str) -> Vec<&str> {
    RE_KEYWORD.find_iter(normalized).map(|m| m.as_str()).collect()
}

/// Human search terms of a base key: split on `_`, `-` and whitespace,
/// single-character fragments dropped.
pub fn search_terms(base: &str) -> Vec<&str> {
    RE_TERM_SPLIT
        .split(base)
        .filter(|term| term.chars().count() > 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_separators_versions_and_extensions() {
        assert_eq!(normalize("reverse_side_suit_shinra.zip"), "reversesidesuitshinra");
        assert_eq!(normalize("reverse side suit_shinra"), "reversesidesuitshinra");
        assert_eq!(normalize("Teddy_Bear_Hair_v.1.0.1.zip"), "teddybearhair");
        assert_eq!(normalize("avatar_clothes_v1.2.zip"), "avatarclothes");
    }

    #[test]
    fn strips_markers_and_parenthesized_notes() {
        assert_eq!(normalize("character_outfit_type-a.zip"), "characteroutfit");
        assert_eq!(normalize("Dress_women_ver002.zip"), "dress");
        assert_eq!(normalize("Outfit (Quest).unitypackage"), "outfit");
    }

    #[test]
    fn is_case_insensitive() {
        assert_eq!(normalize("Foo_Bar.ZIP"), normalize("foo bar.zip"));
    }

    #[test]
    fn is_idempotent_on_realistic_names() {
        let names = [
            "reverse_side_suit_shinra.zip",
            "Teddy_Bear_Hair_v.1.0.1.zip",
            "+Head_Gothic_Clothes.zip",
            "Fluffy_Bob.psd",
            "character_outfit_type-a.zip",
            "shinra formal wear.unitypackage",
            "Outfit (Quest) ver003.rar",
            "衣装_セット_v2.zip",
        ];
        for name in names {
            let once = normalize(name);
            assert_eq!(normalize(&once), once, "not idempotent for {name}");
        }
    }

    #[test]
    fn never_fails_on_degenerate_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("v1.0.zip"), "");
        assert_eq!(normalize("  ___  "), "");
    }

    #[test]
    fn substring_removal_can_damage_words() {
        // "rar" inside "library" is removed along with real extensions.
        assert_eq!(normalize("library_pack.zip"), "libypack");
    }

    #[test]
    fn base_key_strips_one_package_extension() {
        assert_eq!(base_key("avatar_clothes.unitypackage"), "avatar_clothes");
        assert_eq!(base_key("Avatar.ZIP"), "Avatar");
        assert_eq!(base_key("pack.rar"), "pack");
        assert_eq!(base_key("texture.psd"), "texture.psd");
        assert_eq!(base_key("nested.zip.zip"), "nested.zip");
        assert_eq!(base_key("no_extension"), "no_extension");
    }

    #[test]
    fn keywords_skip_digits_and_short_fragments() {
        assert_eq!(keywords("ab1cde2fghij"), vec!["cde", "fghij"]);
        assert!(keywords("").is_empty());
    }

    #[test]
    fn search_terms_drop_single_characters() {
        assert_eq!(
            search_terms("a_reverse side-suit__shinra"),
            vec!["reverse", "side", "suit", "shinra"]
        );
        assert!(search_terms("x").is_empty());
    }
}
