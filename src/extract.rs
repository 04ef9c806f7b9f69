//! Reading identifiers back out of the signed request and the registration
//! response.
//!
//! Elements are matched by local name so namespaced documents from the
//! signing and registration tools work without prefix handling.
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Element carrying the IIC attribute in the signed request.
pub const INVOICE_ELEMENT: &str = "Invoice";
/// Attribute on [`INVOICE_ELEMENT`] holding the integrity code.
pub const IIC_ATTRIBUTE: &str = "IIC";
/// Element holding the registration code in the response.
pub const FIC_ELEMENT: &str = "FIC";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid XML in {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    #[error("Invalid XML, no {0}")]
    MissingElement(&'static str),

    #[error("Invalid XML, no {0}")]
    MissingAttribute(&'static str),

    #[error("Invalid XML, {count} {element} elements")]
    Ambiguous { element: &'static str, count: usize },

    #[error("Invalid XML, empty {0}")]
    Empty(&'static str),
}

/// Read the IIC attribute of the `Invoice` element from a signed request.
pub fn read_iic(path: &Path) -> Result<String, ExtractError> {
    let text = read_document(path)?;
    iic_from_str(path, &text)
}

/// Read the text of the `FIC` element from a registration response.
pub fn read_fic(path: &Path) -> Result<String, ExtractError> {
    let text = read_document(path)?;
    fic_from_str(path, &text)
}

pub fn iic_from_str(path: &Path, text: &str) -> Result<String, ExtractError> {
    let doc = parse(path, text)?;
    let invoice = single_element(&doc, INVOICE_ELEMENT)?;
    let value = invoice
        .attribute(IIC_ATTRIBUTE)
        .ok_or(ExtractError::MissingAttribute(IIC_ATTRIBUTE))?
        .trim();
    if value.is_empty() {
        return Err(ExtractError::Empty(IIC_ATTRIBUTE));
    }
    Ok(value.to_string())
}

pub fn fic_from_str(path: &Path, text: &str) -> Result<String, ExtractError> {
    let doc = parse(path, text)?;
    let fic = single_element(&doc, FIC_ELEMENT)?;
    let value = fic.text().map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(ExtractError::Empty(FIC_ELEMENT));
    }
    Ok(value.to_string())
}

fn read_document(path: &Path) -> Result<String, ExtractError> {
    fs::read_to_string(path).map_err(|source| ExtractError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn parse<'a>(path: &Path, text: &'a str) -> Result<roxmltree::Document<'a>, ExtractError> {
    roxmltree::Document::parse(text).map_err(|source| ExtractError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn single_element<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
    name: &'static str,
) -> Result<roxmltree::Node<'a, 'input>, ExtractError> {
    let mut matches = doc
        .descendants()
        .filter(|node| node.is_element() && node.tag_name().name() == name);
    let first = matches.next().ok_or(ExtractError::MissingElement(name))?;
    let extra = matches.count();
    if extra > 0 {
        return Err(ExtractError::Ambiguous {
            element: name,
            count: extra + 1,
        });
    }
    Ok(first)
}
