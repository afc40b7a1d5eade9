//! Page handling for extracted certificate text.
//!
//! Text extractors emit one string per page, or a single string with form
//! feeds between pages. Parsing always works on one logical stream; page
//! boundaries only matter for diagnostics.

const PAGE_BREAK: char = '\u{c}';

/// Concatenate page texts into one stream. Each page ends with a newline so
/// the last word of a page never fuses with the first word of the next.
pub fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for page in pages {
        let page = page.as_ref().trim_end_matches(PAGE_BREAK);
        out.push_str(page);
        if !page.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// Split a form-feed separated dump back into pages. A trailing form feed
/// does not open an extra empty page.
pub fn split_pages(text: &str) -> Vec<&str> {
    let mut pages: Vec<&str> = text.split(PAGE_BREAK).collect();
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}

/// Normalise a raw dump into the single stream the parsers expect.
pub fn normalize(text: &str) -> String {
    join_pages(split_pages(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_never_fuse() {
        let joined = join_pages(["3 -> 190172 : TORRE 9 EN EL", "SEXTO PISO\n"]);
        assert_eq!(joined, "3 -> 190172 : TORRE 9 EN EL\nSEXTO PISO\n");
    }

    #[test]
    fn empty_input() {
        assert_eq!(join_pages(Vec::<String>::new()), "");
        assert_eq!(split_pages(""), [""]);
    }

    #[test]
    fn form_feeds_split_pages() {
        let text = "pagina uno\n\u{c}pagina dos\n\u{c}";
        assert_eq!(split_pages(text), ["pagina uno\n", "pagina dos\n"]);
        assert_eq!(normalize(text), "pagina uno\npagina dos\n");
    }
}
