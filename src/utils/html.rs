use ammonia;

/// Sanitize rich-text input (survey descriptions, question text) using the
/// ammonia library.
///
/// Whitelist-based: keeps safe formatting tags (like <b>, <p>) and strips
/// dangerous tags (like <script>, <iframe>) and malicious attributes (like
/// onclick). Fail-safe against Stored XSS in the admin panel and the
/// respondent-facing frontend.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
