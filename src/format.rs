//! Turn a [`ParseResponse`] into the string the user asked for.
//!
//! Rendering is a pure function of the response: pick one of the server's
//! whole-document renderings, dump the full response as JSON, or lay the
//! element list out one block per element. Whole-document selection does
//! *not* fall back across formats — an empty `markdown` field renders as an
//! empty document, which tells the user more than silently handing them HTML.
//! Per-element selection does fall back (markdown↔text), since elements
//! routinely carry only one rendering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::api::types::{Element, ParseResponse};
use crate::error::DocParseError;

/// Output renderings the CLI can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Html,
    #[default]
    Markdown,
    Text,
    /// The raw response (or its element list), pretty-printed.
    Json,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Markdown => "markdown",
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }

    /// Extension for output files derived from input names (`report.pdf` →
    /// `report.md`).
    pub fn output_extension(self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Markdown => "md",
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = DocParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "html" => Ok(OutputFormat::Html),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(DocParseError::UnknownFormat {
                value: other.to_string(),
            }),
        }
    }
}

/// Serialization shape for `--elements-only --json`: the element list and
/// nothing else.
#[derive(Serialize)]
struct ElementsOnly<'a> {
    elements: &'a [Element],
}

/// Render `response` in `format`. With `elements_only` the element list is
/// rendered instead of the whole-document content.
pub fn render(
    response: &ParseResponse,
    format: OutputFormat,
    elements_only: bool,
) -> Result<String, DocParseError> {
    if elements_only {
        return render_elements(response, format);
    }

    match format {
        OutputFormat::Html => Ok(response.content.html.clone()),
        OutputFormat::Markdown => Ok(response.content.markdown.clone()),
        OutputFormat::Text => Ok(response.content.text.clone()),
        OutputFormat::Json => {
            serde_json::to_string_pretty(response).map_err(|source| DocParseError::JsonRender { source })
        }
    }
}

fn render_elements(response: &ParseResponse, format: OutputFormat) -> Result<String, DocParseError> {
    if format == OutputFormat::Json {
        let shape = ElementsOnly {
            elements: &response.elements,
        };
        return serde_json::to_string_pretty(&shape)
            .map_err(|source| DocParseError::JsonRender { source });
    }

    let blocks: Vec<String> = response
        .elements
        .iter()
        .map(|e| {
            let header = format!("[{}] {} (page {})", e.id, e.category, e.page);
            let content = element_content(e, format);
            if content.is_empty() {
                // Content-less elements (e.g. image-only figures) keep just
                // the header; a bare content line would dangle.
                header
            } else {
                format!("{header}\n{content}")
            }
        })
        .collect();
    Ok(blocks.join("\n\n"))
}

/// Per-element content selection. Unlike the whole-document path this falls
/// back between markdown and text, because the server often fills only one
/// of the two for a given element category.
fn element_content(element: &Element, format: OutputFormat) -> &str {
    match format {
        OutputFormat::Html => &element.content.html,
        OutputFormat::Markdown => {
            if element.content.markdown.is_empty() {
                &element.content.text
            } else {
                &element.content.markdown
            }
        }
        OutputFormat::Text | OutputFormat::Json => {
            if element.content.text.is_empty() {
                &element.content.markdown
            } else {
                &element.content.text
            }
        }
    }
}
