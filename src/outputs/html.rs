//! Self-contained HTML digest with one card per article.
//!
//! The header shows the date range, the number of articles and a row of
//! pills: the keywords when a keyword filter was used, otherwise the source
//! domains. Every piece of collected text is escaped before it is written.

use crate::models::{Article, Digest};
use html_escape::{encode_double_quoted_attribute, encode_text};
use itertools::Itertools;
use std::error::Error;
use std::fmt::Write;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

const STYLE: &str = r#"
    body { font-family: -apple-system, system-ui, Segoe UI, Roboto, Arial, sans-serif; margin: 0; background: #0b0f19; color: #e8ebf5; }
    .wrap { max-width: 980px; margin: 0 auto; padding: 32px 16px; }
    .card { background: #12182b; border: 1px solid #1e2742; border-radius: 16px; padding: 16px 18px; margin: 12px 0; box-shadow: 0 10px 30px rgba(0,0,0,.25); }
    .muted { color: #a9b2d6; font-size: 13px; }
    .title { font-size: 24px; margin: 0 0 8px 0; }
    .pill { display: inline-block; background: #1c2440; border: 1px solid #2b355a; color: #b5c3ff; padding: 2px 10px; border-radius: 999px; margin-right: 6px; font-size: 12px; }
    .post-title { font-size: 16px; margin: 0; line-height: 1.45; }
    a { color: #8fb3ff; text-decoration: none; }
    a:hover { text-decoration: underline; }
    .header { margin-bottom: 16px; }
    .content p { margin: 0.6em 0; }
"#;

const TITLE: &str = "News digest";

/// Render the digest as a complete HTML document.
pub fn digest_to_html(digest: &Digest) -> String {
    let (pill_label, pills): (&str, Vec<&str>) = if digest.keywords.is_empty() {
        (
            "Sources",
            digest.articles.iter().map(|a| a.source.as_str()).unique().collect(),
        )
    } else {
        ("Keywords", digest.keywords.iter().map(String::as_str).collect())
    };

    let mut html = String::new();
    writeln!(html, "<!doctype html>").unwrap();
    writeln!(html, "<html lang=\"en\">").unwrap();
    writeln!(html, "<head>").unwrap();
    writeln!(html, "  <meta charset=\"utf-8\">").unwrap();
    writeln!(html, "  <title>{TITLE}</title>").unwrap();
    writeln!(html, "  <meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">").unwrap();
    writeln!(html, "  <style>{STYLE}  </style>").unwrap();
    writeln!(html, "</head>").unwrap();
    writeln!(html, "<body>").unwrap();
    writeln!(html, "  <div class=\"wrap\">").unwrap();
    writeln!(html, "    <div class=\"header\">").unwrap();
    writeln!(html, "      <h1 class=\"title\">{TITLE}</h1>").unwrap();
    write!(
        html,
        "      <div class=\"muted\">Period: {} • Found: {} • {pill_label}: ",
        encode_text(&digest.window.label()),
        digest.articles.len()
    )
    .unwrap();
    for pill in pills {
        write!(html, "<span class=\"pill\">{}</span>", encode_text(pill)).unwrap();
    }
    writeln!(html, "</div>").unwrap();
    writeln!(html, "    </div>").unwrap();

    for article in &digest.articles {
        write_card(&mut html, article);
    }

    writeln!(html, "  </div>").unwrap();
    writeln!(html, "</body>").unwrap();
    writeln!(html, "</html>").unwrap();
    html
}

fn write_card(html: &mut String, a: &Article) {
    let date = a
        .timestamp
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "undated".to_string());
    let title = if a.title.is_empty() { a.link.as_str() } else { a.title.as_str() };

    writeln!(html, "    <div class=\"card\">").unwrap();
    writeln!(html, "      <div class=\"muted\">{} • {}</div>", date, encode_text(&a.source)).unwrap();
    writeln!(
        html,
        "      <h3 class=\"post-title\"><a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{}</a></h3>",
        encode_double_quoted_attribute(&a.link),
        encode_text(title)
    )
    .unwrap();
    if !a.description.is_empty() {
        writeln!(html, "      <div class=\"content\"><p>{}</p></div>", encode_text(&a.description)).unwrap();
    }
    writeln!(html, "    </div>").unwrap();
}

#[instrument(level = "info", skip_all, fields(path = %path.display(), count = digest.articles.len()))]
pub async fn write_html(digest: &Digest, path: &Path) -> Result<(), Box<dyn Error>> {
    fs::write(path, digest_to_html(digest)).await?;
    info!("Wrote HTML digest");
    Ok(())
}
