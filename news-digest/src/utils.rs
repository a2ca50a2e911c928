/// Text processing utilities
pub mod text {
    use scraper::{ElementRef, Html, Node};

    /// Elements whose boundaries separate words.
    const BLOCK_TAGS: &[&str] = &[
        "p", "br", "div", "li", "ul", "ol", "tr", "td", "th", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote",
        "section", "article", "pre", "hr",
    ];

    /// Extract readable text from an HTML fragment, decoding entities.
    pub fn html_to_text(html: &str) -> String {
        if !html.contains('<') && !html.contains('&') {
            return collapse_whitespace(html);
        }
        let fragment = Html::parse_fragment(html);
        element_text(fragment.root_element())
    }

    /// Text of an element with inline markup joined as written and block
    /// boundaries turned into single spaces.
    pub fn element_text(element: ElementRef<'_>) -> String {
        let mut out = String::new();
        push_text(element, &mut out);
        collapse_whitespace(&out)
    }

    fn push_text(element: ElementRef<'_>, out: &mut String) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => out.push_str(text),
                Node::Element(el) => {
                    if matches!(el.name(), "script" | "style") {
                        continue;
                    }
                    let Some(child_element) = ElementRef::wrap(child) else {
                        continue;
                    };
                    let block = BLOCK_TAGS.contains(&el.name());
                    if block {
                        out.push(' ');
                    }
                    push_text(child_element, out);
                    if block {
                        out.push(' ');
                    }
                }
                _ => {}
            }
        }
    }

    /// Collapse every run of whitespace (including newlines) into one space.
    pub fn collapse_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Truncate to at most `max_chars` characters, never splitting a code point.
    pub fn truncate_chars(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
            None => text.to_string(),
        }
    }

    pub fn char_len(text: &str) -> usize {
        text.chars().count()
    }
}

/// URL utilities
pub mod url {
    use url::Url;

    /// Validate feed URL format
    pub fn is_valid_feed_url(url_str: &str) -> bool {
        if let Ok(url) = Url::parse(url_str) {
            url.scheme() == "http" || url.scheme() == "https"
        } else {
            false
        }
    }

    /// Resolve a possibly relative link against the page it appeared on.
    pub fn resolve(base: &str, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with("data:") {
            return None;
        }
        match Url::parse(href) {
            Ok(absolute) => Some(absolute.to_string()),
            Err(_) => Url::parse(base).ok()?.join(href).ok().map(|u| u.to_string()),
        }
    }
}
