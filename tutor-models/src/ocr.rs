//! PDF text extraction for the curriculum admin tool.
//!
//! Uses Mistral's OCR endpoint: the PDF is sent inline as a base64 data URL
//! and each page comes back as markdown.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::auth::ApiKey;
use crate::providers::{http_client, status_error};
use crate::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.mistral.ai";
pub const DEFAULT_OCR_MODEL: &str = "mistral-ocr-latest";

/// Separator placed between pages when a document is flattened.
pub const PAGE_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Serialize)]
struct OcrRequest<'a> {
    model: &'a str,
    document: OcrDocumentRef,
}

#[derive(Debug, Serialize)]
struct OcrDocumentRef {
    #[serde(rename = "type")]
    kind: &'static str,
    document_url: String,
}

/// One extracted page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OcrPage {
    pub index: u32,
    #[serde(default)]
    pub markdown: String,
}

/// The result of running OCR over a document.
#[derive(Debug, Clone, Deserialize)]
pub struct OcrDocument {
    #[serde(default)]
    pub pages: Vec<OcrPage>,
}

impl OcrDocument {
    /// Join non-empty pages, in page order, with [`PAGE_SEPARATOR`].
    pub fn to_markdown(&self) -> String {
        let mut pages: Vec<&OcrPage> = self.pages.iter().collect();
        pages.sort_by_key(|p| p.index);
        pages
            .into_iter()
            .map(|p| p.markdown.trim())
            .filter(|md| !md.is_empty())
            .collect::<Vec<_>>()
            .join(PAGE_SEPARATOR)
    }
}

/// Client for the OCR endpoint.
pub struct OcrClient {
    base_url: String,
    model: String,
    api_key: ApiKey,
    client: reqwest::Client,
}

impl OcrClient {
    pub fn new(api_key: ApiKey) -> Result<Self> {
        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_OCR_MODEL.to_string(),
            api_key,
            client: http_client(None)?,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Run OCR over a PDF held in memory.
    pub async fn extract_pdf(&self, pdf: &[u8]) -> Result<OcrDocument> {
        if self.api_key.is_blank() {
            return Err(Error::CredentialsNotFound("mistral".to_string()));
        }
        if pdf.is_empty() {
            return Err(Error::Request("empty PDF".to_string()));
        }

        let body = OcrRequest {
            model: &self.model,
            document: OcrDocumentRef {
                kind: "document_url",
                document_url: pdf_data_url(pdf),
            },
        };

        debug!(bytes = pdf.len(), model = %self.model, "sending OCR request");

        let response = self
            .client
            .post(format!("{}/v1/ocr", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(status_error(status.as_u16(), &text));
        }

        let document: OcrDocument = serde_json::from_str(&text)
            .map_err(|e| Error::MalformedResponse(format!("invalid OCR body: {e}")))?;
        info!(pages = document.pages.len(), "OCR extraction complete");
        Ok(document)
    }
}

fn pdf_data_url(pdf: &[u8]) -> String {
    format!("data:application/pdf;base64,{}", BASE64_STANDARD.encode(pdf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_join_in_index_order_skipping_blanks() {
        let doc: OcrDocument = serde_json::from_str(
            r###"{"pages": [
                {"index": 1, "markdown": "## Orbits\nPlanets move."},
                {"index": 0, "markdown": "# Solar System"},
                {"index": 2, "markdown": "   "}
            ]}"###,
        )
        .unwrap();

        assert_eq!(
            doc.to_markdown(),
            "# Solar System\n\n---\n\n## Orbits\nPlanets move."
        );
    }

    #[test]
    fn data_url_is_base64_pdf() {
        assert_eq!(pdf_data_url(b"%PDF"), "data:application/pdf;base64,JVBERg==");
    }

    #[tokio::test]
    async fn empty_pdf_is_rejected() {
        let client = OcrClient::new(ApiKey::new("k")).unwrap();
        assert!(matches!(client.extract_pdf(&[]).await, Err(Error::Request(_))));
    }

    #[tokio::test]
    async fn blank_key_is_a_credential_error() {
        let client = OcrClient::new(ApiKey::new(" ")).unwrap();
        let err = client.extract_pdf(b"%PDF").await.unwrap_err();
        assert!(err.is_credential());
    }
}
