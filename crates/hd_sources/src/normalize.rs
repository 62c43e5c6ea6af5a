use scraper::{Html, Node};

/// Upper bound, in characters, on text handed to the model.
pub const MAX_ARTICLE_CHARS: usize = 2000;

/// Elements whose whole subtree is dropped before text extraction.
const STRIPPED_TAGS: &[&str] = &["script", "style", "noscript", "header", "footer", "nav", "form"];

/// Reduce an HTML document to trimmed, non-empty lines of text, capped at
/// [`MAX_ARTICLE_CHARS`]. An empty result means the page had nothing usable.
pub fn normalize_html(html: &str) -> String {
    normalize_html_with_limit(html, MAX_ARTICLE_CHARS)
}

pub fn normalize_html_with_limit(html: &str, max_chars: usize) -> String {
    let document = Html::parse_document(html);

    let mut chunks = Vec::new();
    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let stripped = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| STRIPPED_TAGS.contains(&el.name()))
        });
        if !stripped {
            chunks.push(&**text);
        }
    }

    let joined = chunks.join("\n");
    let cleaned = joined
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    truncate_chars(&cleaned, max_chars).trim_end().to_string()
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
