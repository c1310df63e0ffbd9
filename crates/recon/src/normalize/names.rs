//! Text helpers shared by every normalizer: entity decoding, name
//! cleaning for cross-dataset comparison, slugs.

use quick_xml::escape::{resolve_html5_entity, unescape_with};

/// Substrings that carry no identity when comparing program names.
const NOISE_WORDS: [&str; 2] = ["degree", "program"];

/// Longest entity reference we try to resolve (`&CounterClockwiseContourIntegral;`).
const MAX_ENTITY_LEN: usize = 34;

/// Decode HTML entity references (`&amp;`, `&eacute;`, `&#8217;`).
///
/// Tolerant: a bare `&` or an unknown entity is copied through unchanged.
pub fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let candidate = tail
            .char_indices()
            .take(MAX_ENTITY_LEN)
            .find(|&(_, c)| c == ';')
            .map(|(semi, _)| &tail[..=semi]);

        match candidate.map(|c| (c, unescape_with(c, resolve_html5_entity))) {
            Some((raw, Ok(decoded))) => {
                out.push_str(&decoded);
                rest = &tail[raw.len()..];
            }
            _ => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Map a Latin letter with a diacritic to its base letter.
fn fold_diacritic(c: char) -> Option<char> {
    let base = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => 'a',
        'ç' | 'ć' | 'č' => 'c',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'ī' => 'i',
        'ñ' | 'ń' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => 'o',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' => 'u',
        'ý' | 'ÿ' => 'y',
        'š' | 'ś' => 's',
        'ž' | 'ź' | 'ż' => 'z',
        'ł' => 'l',
        _ => return None,
    };
    Some(base)
}

/// Reduce a name to the form used for cross-dataset comparison.
///
/// Decodes entities, lowercases, folds diacritics, keeps only `[a-z0-9]`,
/// then removes "degree"/"program" until none remain. Removal runs to a
/// fixpoint so the result is idempotent: `clean_name(clean_name(s)) == clean_name(s)`.
pub fn clean_name(name: &str) -> String {
    let decoded = decode_entities(name);
    let mut cleaned: String = decoded
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| fold_diacritic(c).unwrap_or(c))
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect();

    loop {
        let before = cleaned.len();
        for word in NOISE_WORDS {
            cleaned = cleaned.replace(word, "");
        }
        if cleaned.len() == before {
            return cleaned;
        }
    }
}

/// URL slug: lowercase ASCII words joined by single dashes.
///
/// Whitespace, `.`, `/` and `-` separate words; other punctuation is
/// dropped (`"Women's Studies"` -> `"womens-studies"`).
pub fn slugify(input: &str) -> String {
    let decoded = decode_entities(input);
    let mut slug = String::with_capacity(decoded.len());

    for c in decoded.chars().flat_map(char::to_lowercase) {
        let c = fold_diacritic(c).unwrap_or(c);
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
            slug.push(c);
        } else if (c.is_whitespace() || matches!(c, '-' | '.' | '/')) && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    slug.trim_matches('-').to_string()
}

/// Uppercase the first letter of every space-separated word.
pub fn title_case(input: &str) -> String {
    input
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
