use serde::de::IgnoredAny;
use thiserror::Error;

pub const DEFAULT_CATALOG_URL: &str = "https://modern.ie/ja-jp/virtualization-tools#downloads";

const MANIFEST_MARKER: &str = "d.osList=";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to fetch catalog page {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("VM list not found in {url}")]
    ManifestNotFound { url: String },
}

/// Downloads the catalog page and returns the manifest JSON embedded in it.
pub async fn fetch_manifest_json(client: &reqwest::Client, url: &str) -> Result<String, CatalogError> {
    let request_error = |source| CatalogError::Request {
        url: url.to_string(),
        source,
    };

    tracing::info!(url, "Fetching VM catalog");
    let page = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(request_error)?
        .text()
        .await
        .map_err(request_error)?;

    extract_manifest_json(&page)
        .map(str::to_string)
        .ok_or_else(|| CatalogError::ManifestNotFound {
            url: url.to_string(),
        })
}

/// Finds `d.osList=[...]` in the page and returns the JSON array assigned
/// there. Occurrences not followed by an array are skipped.
pub fn extract_manifest_json(page: &str) -> Option<&str> {
    page.match_indices(MANIFEST_MARKER).find_map(|(index, _)| {
        let rest = &page[index + MANIFEST_MARKER.len()..];
        if !rest.starts_with('[') {
            return None;
        }
        let mut values = serde_json::Deserializer::from_str(rest).into_iter::<IgnoredAny>();
        match values.next()? {
            Ok(_) => Some(&rest[..values.byte_offset()]),
            Err(_) => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<html><head>
<script>var d = {};</script>
<script>d.title="downloads";d.osList=[{"osName":"Mac","softwareList":[]}];d.other=[1];</script>
</head></html>"#;

    #[test]
    fn test_extracts_array_from_script() {
        assert_eq!(
            extract_manifest_json(PAGE),
            Some(r#"[{"osName":"Mac","softwareList":[]}]"#)
        );
    }

    #[test]
    fn test_array_may_span_lines() {
        let page = "d.osList=[\n  {\"osName\": \"Mac\"}\n];";
        assert_eq!(
            extract_manifest_json(page),
            Some("[\n  {\"osName\": \"Mac\"}\n]")
        );
    }

    #[test]
    fn test_truncated_array_is_not_found() {
        assert_eq!(extract_manifest_json("d.osList=[{\"osName\":"), None);
    }

    #[test]
    fn test_missing_marker() {
        assert_eq!(extract_manifest_json("<html>nothing here</html>"), None);
    }

    #[test]
    fn test_marker_without_array_is_skipped() {
        let page = "d.osList=null;\n<script>d.osList=[];</script>";
        assert_eq!(extract_manifest_json(page), Some("[]"));
    }

    #[tokio::test]
    async fn test_fetch_manifest_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/virtualization-tools"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<script>d.osList=[{"osName":"Mac"}];</script>"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/virtualization-tools#downloads", server.uri());
        let json = fetch_manifest_json(&reqwest::Client::new(), &url)
            .await
            .unwrap();

        assert_eq!(json, r#"[{"osName":"Mac"}]"#);
    }

    #[tokio::test]
    async fn test_fetch_page_without_manifest() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let err = fetch_manifest_json(&reqwest::Client::new(), &server.uri())
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::ManifestNotFound { .. }));
    }

    #[tokio::test]
    async fn test_fetch_page_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = fetch_manifest_json(&reqwest::Client::new(), &server.uri())
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::Request { .. }));
    }
}
