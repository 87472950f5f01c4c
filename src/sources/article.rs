//! Article fetching: download a page and extract its main text.

use std::io::Cursor;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

use super::errors::{Result, SourceError};
use crate::text::html::{extract_html_title, extract_meta_content, html_to_text};

/// Main text extracted from a web page
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub title: String,
    pub text: String,
    pub url: String,
}

/// Validate an article URL entered by the user.
pub fn validate_url(url: &str) -> Result<reqwest::Url> {
    let url = url.trim();
    if url.is_empty() {
        return Err(SourceError::InvalidInput("Enter an article URL.".to_string()));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(SourceError::InvalidInput(
            "URL must start with http:// or https://".to_string(),
        ));
    }
    reqwest::Url::parse(url).map_err(|e| SourceError::InvalidInput(format!("Invalid URL: {}", e)))
}

/// Fetch `url` and extract the article body (navigation, scripts and ads removed).
pub fn fetch_article(client: &Client, url: &str) -> Result<Article> {
    let parsed_url = validate_url(url)?;
    log::info!("Fetching article {}", parsed_url);

    let response = client
        .get(parsed_url.as_str())
        .send()
        .map_err(|e| SourceError::unreachable(parsed_url.as_str(), e))?;

    if !response.status().is_success() {
        return Err(SourceError::unreachable(
            parsed_url.as_str(),
            format!("HTTP {}", response.status()),
        ));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
        return Err(SourceError::NotHtml(if content_type.is_empty() {
            "no content type".to_string()
        } else {
            content_type
        }));
    }

    // Track final URL after redirects
    let final_url = response.url().clone();

    let body_bytes = response
        .bytes()
        .map_err(|e| SourceError::unreachable(final_url.as_str(), e))?;
    let html = String::from_utf8_lossy(&body_bytes).to_string();

    let (readable_title, readable_text) = {
        let mut cursor = Cursor::new(body_bytes.as_ref());
        match readability::extractor::extract(&mut cursor, &final_url) {
            Ok(product) => (product.title, tidy_lines(&product.text)),
            Err(e) => {
                log::debug!("Readability failed for {}: {}", final_url, e);
                (String::new(), String::new())
            }
        }
    };

    let text = if readable_text.is_empty() {
        log::debug!("Readability found no text, falling back to tag stripping");
        html_to_text(&html)
    } else {
        readable_text
    };

    if text.trim().is_empty() {
        return Err(SourceError::NoContent);
    }

    Ok(Article {
        title: article_title(readable_title.trim(), &html),
        text,
        url: final_url.to_string(),
    })
}

/// Readability title, else `og:title`, else `<title>`, else "Untitled".
fn article_title(readable_title: &str, html: &str) -> String {
    if !readable_title.is_empty() {
        return readable_title.to_string();
    }

    // Metadata lives in the head section
    let head = match html.char_indices().nth(50_000) {
        Some((idx, _)) => &html[..idx],
        None => html,
    };

    extract_meta_content(head, "og:title")
        .or_else(|| extract_html_title(head))
        .unwrap_or_else(|| "Untitled".to_string())
}

/// Trim each line and drop blank ones.
fn tidy_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubResponse, StubServer};

    const ARTICLE: &str = r#"<html><head><title>The Powerhouse</title>
<meta property="og:title" content="The Powerhouse of the Cell"></head>
<body><nav><a href="/">Home</a> | <a href="/about">About</a></nav>
<article>
<p>Mitochondria are membrane-bound organelles that generate most of the chemical energy needed to power a cell's biochemical reactions.</p>
<p>Chemical energy produced by the mitochondria is stored in a small molecule called adenosine triphosphate, usually shortened to ATP.</p>
<p>Mitochondria contain their own small chromosomes, which suggests they descended from free-living bacteria.</p>
</article>
<footer>Copyright 2025</footer></body></html>"#;

    #[test]
    fn test_validate_url() {
        assert_eq!(validate_url("  ").unwrap_err().to_string(), "Enter an article URL.");
        assert_eq!(
            validate_url("ftp://example.com/a").unwrap_err().to_string(),
            "URL must start with http:// or https://"
        );
        assert!(validate_url("https://example.com/post").is_ok());
    }

    #[test]
    fn test_fetch_article() {
        let server = StubServer::start(vec![StubResponse::html(ARTICLE)]);
        let article = fetch_article(&Client::new(), &format!("{}/cells", server.url)).unwrap();

        assert!(article.text.contains("Mitochondria are membrane-bound organelles"));
        assert!(article.text.contains("adenosine triphosphate"));
        assert!(!article.title.is_empty());
        assert_eq!(server.next_request().request_line, "GET /cells HTTP/1.1");
    }

    #[test]
    fn test_rejects_non_html() {
        let server = StubServer::start(vec![StubResponse::json("{\"a\": 1}")]);
        let err = fetch_article(&Client::new(), &server.url).unwrap_err();
        assert!(matches!(err, SourceError::NotHtml(_)));
    }

    #[test]
    fn test_http_error_is_unreachable() {
        let server = StubServer::start(vec![StubResponse::html("gone").with_status(404)]);
        let err = fetch_article(&Client::new(), &server.url).unwrap_err();
        assert!(matches!(err, SourceError::Unreachable { .. }));
    }

    #[test]
    fn test_page_without_text() {
        let page = "<html><body><div>  </div><img src=\"chart.png\"></body></html>";
        let server = StubServer::start(vec![StubResponse::html(page)]);
        let err = fetch_article(&Client::new(), &server.url).unwrap_err();
        assert!(matches!(err, SourceError::NoContent));
    }

    #[test]
    fn test_article_title_fallbacks() {
        assert_eq!(article_title("Readable", ARTICLE), "Readable");
        assert_eq!(article_title("", ARTICLE), "The Powerhouse of the Cell");
        assert_eq!(article_title("", "<title>Plain</title>"), "Plain");
        assert_eq!(article_title("", "<p>none</p>"), "Untitled");
    }
}
