//! Small text helpers shared across the command surface: pluralization,
//! grouped item listing, and fuzzy name matching against id collections.

use std::collections::HashMap;

/// Pluralize a single word with the usual English suffix rules.
pub fn pluralize_word(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        format!("{}es", word)
    } else if lower.ends_with('y')
        && !lower.ends_with("ay")
        && !lower.ends_with("ey")
        && !lower.ends_with("oy")
        && !lower.ends_with("uy")
    {
        format!("{}ies", &word[..word.len() - 1])
    } else if lower.ends_with('f') {
        format!("{}ves", &word[..word.len() - 1])
    } else if lower.ends_with("fe") {
        format!("{}ves", &word[..word.len() - 2])
    } else {
        format!("{}s", word)
    }
}

/// Pluralize a display name by its last word: "piece of bread" stays odd
/// either way, but "rusty key" becomes "rusty keys".
pub fn pluralize_name(name: &str, count: usize) -> String {
    if count == 1 {
        return name.to_string();
    }
    // "piece of X" pluralizes the head noun
    if let Some(rest) = name.strip_prefix("piece of ") {
        return format!("pieces of {}", rest);
    }
    match name.rsplit_once(' ') {
        Some((head, last)) => format!("{} {}", head, pluralize_word(last)),
        None => pluralize_word(name),
    }
}

/// Group duplicate entries of a multiset into "(xN)" display strings,
/// preserving first-seen order.
pub fn group_counted<'a, I, F>(ids: I, render: F) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
    F: Fn(&str, usize) -> String,
{
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for id in ids {
        let entry = counts.entry(id.as_str()).or_insert(0);
        if *entry == 0 {
            order.push(id.as_str());
        }
        *entry += 1;
    }
    order
        .into_iter()
        .map(|id| render(id, counts[id]))
        .collect()
}

/// Spell out small counts: "two", "seven", then digits from eleven up.
pub fn count_phrase(count: usize) -> String {
    const WORDS: [&str; 10] = [
        "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    ];
    match count {
        1..=10 => WORDS[count - 1].to_string(),
        other => other.to_string(),
    }
}

/// Prefix a display name with the right indefinite article.
pub fn with_article(name: &str) -> String {
    let article = match name.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('a') | Some('e') | Some('i') | Some('o') | Some('u') => "an",
        _ => "a",
    };
    format!("{} {}", article, name)
}

/// Prefix "the" unless the name already carries its own leading article.
pub fn definite(name: &str) -> String {
    if name.starts_with("The ") || name.starts_with("the ") {
        name.to_string()
    } else {
        format!("the {}", name)
    }
}

/// Join names into a natural-language list: "a", "a and b", "a, b and c".
pub fn join_names(names: &[String]) -> String {
    match names.len() {
        0 => String::new(),
        1 => names[0].clone(),
        2 => format!("{} and {}", names[0], names[1]),
        _ => format!(
            "{} and {}",
            names[..names.len() - 1].join(", "),
            names[names.len() - 1]
        ),
    }
}

/// Match free-typed text against a collection of (id, display name) pairs.
///
/// Matching rules, in order:
/// 1. Exact id match
/// 2. Exact display-name match
/// 3. Substring of the display name or id
/// 4. Word overlap between the query and the display name, best overlap wins
///
/// Returns the id of the best match, or `None`.
pub fn match_named<'a>(query: &str, candidates: &[(&'a str, String)]) -> Option<&'a str> {
    let query_norm = normalize(query);
    if query_norm.is_empty() {
        return None;
    }

    // Exact id, then exact name
    for (id, _) in candidates {
        if normalize(id) == query_norm {
            return Some(id);
        }
    }
    for (id, name) in candidates {
        if normalize(name) == query_norm {
            return Some(id);
        }
    }

    // Substring
    for (id, name) in candidates {
        if normalize(name).contains(&query_norm) || normalize(id).contains(&query_norm) {
            return Some(id);
        }
    }

    // Word overlap, scored
    let query_words: Vec<&str> = query_norm.split(' ').collect();
    let mut best: Option<(&str, usize)> = None;
    for (id, name) in candidates {
        let name_norm = normalize(name);
        let name_words: Vec<&str> = name_norm.split(' ').collect();
        let overlap = query_words
            .iter()
            .filter(|w| name_words.contains(w))
            .count();
        if overlap > 0 {
            match best {
                Some((_, score)) if score >= overlap => {}
                _ => best = Some((id, overlap)),
            }
        }
    }
    best.map(|(id, _)| id)
}

/// Lowercase, trim, collapse internal whitespace, strip a leading article.
pub fn normalize(text: &str) -> String {
    let collapsed = text
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    for article in ["the ", "a ", "an "] {
        if let Some(rest) = collapsed.strip_prefix(article) {
            return rest.to_string();
        }
    }
    collapsed
}

/// True when the text contains any of the keywords, case-insensitively.
pub fn contains_keyword(text: &str, keywords: &[String]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(&k.to_lowercase()))
}
