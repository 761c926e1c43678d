//! Lightweight formatting applied to assistant replies.
//!
//! The rules run in a fixed order over the whole text and each runs once:
//! links, line breaks, bold, italic. The output is a small tag vocabulary
//! (`<a>`, `<br>`, `<strong>`, `<em>`) that the terminal renderer turns into
//! styled spans.

use std::sync::LazyLock;

use regex::Regex;

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link pattern"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid bold pattern"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.+?)\*").expect("valid italic pattern"));

pub fn format_message_content(text: &str) -> String {
    let linked = LINK.replace_all(text, r#"<a href="${2}" target="_blank">${1}</a>"#);
    let broken = linked.replace('\n', "<br>");
    let bold = BOLD.replace_all(&broken, "<strong>${1}</strong>");
    ITALIC.replace_all(&bold, "<em>${1}</em>").into_owned()
}
