//! Document loading: turns a CV or job description on disk into plain text.
//!
//! Format is chosen by file extension. PDF and DOCX extraction is CPU-bound and
//! runs on the blocking pool.

use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::ReadError;

const DOCX_BODY_ENTRY: &str = "word/document.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Json,
    Pdf,
    Docx,
}

impl DocumentFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "txt" | "md" => Some(DocumentFormat::PlainText),
            "json" => Some(DocumentFormat::Json),
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            _ => None,
        }
    }
}

/// Reads the document at `path` and returns its trimmed text content.
pub async fn load_document(path: &Path) -> Result<String, ReadError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => {
            return Err(ReadError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ReadError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Err(source) => {
            return Err(ReadError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let format = DocumentFormat::from_extension(&extension).ok_or_else(|| ReadError::UnsupportedExtension {
        path: path.to_path_buf(),
        extension: if extension.is_empty() {
            "(none)".to_string()
        } else {
            extension.clone()
        },
    })?;

    let text = match format {
        DocumentFormat::PlainText => read_utf8(path).await?,
        DocumentFormat::Json => {
            let raw = read_utf8(path).await?;
            let value: serde_json::Value = serde_json::from_str(&raw).map_err(|e| corrupt(path, e))?;
            serde_json::to_string_pretty(&value).map_err(|e| corrupt(path, e))?
        }
        DocumentFormat::Pdf => {
            let owned = path.to_path_buf();
            run_blocking(path, move || {
                pdf_extract::extract_text(&owned).map_err(|e| e.to_string())
            })
            .await?
        }
        DocumentFormat::Docx => {
            let owned = path.to_path_buf();
            run_blocking(path, move || extract_docx_text(&owned)).await?
        }
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(ReadError::Empty {
            path: path.to_path_buf(),
        });
    }

    debug!("Loaded {} ({:?}, {} characters)", path.display(), format, text.len());
    Ok(text.to_string())
}

async fn read_utf8(path: &Path) -> Result<String, ReadError> {
    tokio::fs::read_to_string(path).await.map_err(|source| {
        if source.kind() == std::io::ErrorKind::InvalidData {
            corrupt(path, "file is not valid UTF-8")
        } else {
            ReadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

async fn run_blocking<F>(path: &Path, extract: F) -> Result<String, ReadError>
where
    F: FnOnce() -> Result<String, String> + Send + 'static,
{
    match tokio::task::spawn_blocking(extract).await {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(message)) => Err(corrupt(path, message)),
        Err(join_error) => Err(corrupt(path, format!("extractor aborted: {join_error}"))),
    }
}

fn corrupt(path: &Path, message: impl ToString) -> ReadError {
    ReadError::Corrupt {
        path: PathBuf::from(path),
        message: message.to_string(),
    }
}

fn extract_docx_text(path: &Path) -> Result<String, String> {
    let file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| format!("not a valid DOCX archive: {e}"))?;
    let mut entry = archive
        .by_name(DOCX_BODY_ENTRY)
        .map_err(|e| format!("missing {DOCX_BODY_ENTRY}: {e}"))?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml).map_err(|e| e.to_string())?;
    Ok(docx_xml_to_text(&xml))
}

/// Collects the text runs of a WordprocessingML body, one line per paragraph.
fn docx_xml_to_text(xml: &str) -> String {
    let mut out = String::new();
    let mut in_text = false;
    let mut rest = xml;

    while let Some(open) = rest.find('<') {
        if in_text {
            out.push_str(&decode_entities(&rest[..open]));
        }
        let Some(close) = rest[open..].find('>') else {
            break;
        };
        let tag = &rest[open + 1..open + close];
        rest = &rest[open + close + 1..];

        let self_closing = tag.ends_with('/');
        let name = tag.trim_end_matches('/').split_whitespace().next().unwrap_or_default();
        match name {
            "w:t" => in_text = !self_closing,
            "/w:t" => in_text = false,
            "w:tab" => out.push('\t'),
            "w:br" | "w:cr" | "/w:p" => out.push('\n'),
            _ => {}
        }
    }

    out.lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decodes the five XML named entities and numeric character references.
/// Anything unrecognised is kept verbatim.
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .and_then(|semi| decode_entity(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "amp" => Some('&'),
        _ => {
            let code = match name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => name.strip_prefix('#')?.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}
