//! Parsed representation of a controller mapping document.
//!
//! The document format is Mixxx's controller preset XML:
//!
//! ```xml
//! <MixxxControllerPreset>
//!   <info><name/><author/><description/></info>
//!   <controller id="...">
//!     <controls>
//!       <control>
//!         <group>[Channel1]</group><key>play</key>
//!         <status>0x90</status><midino>0x0B</midino>
//!         <options><script-binding/></options>
//!       </control>
//!     </controls>
//!     <outputs> ... </outputs>
//!   </controller>
//! </MixxxControllerPreset>
//! ```
//!
//! A [`MappingDocument`] is built once at load time and never mutated
//! afterwards, so it is safe to share read-only.

use std::collections::BTreeSet;

use roxmltree::Node;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building a [`MappingDocument`].
///
/// All of these abort construction; there is no partially valid document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed mapping XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("<{element}> is missing required field <{field}>")]
    MissingField { element: String, field: String },

    #[error("invalid number {value:?} in field <{field}>")]
    InvalidNumber { field: String, value: String },
}

/// Optional mapping metadata from the `<info>` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingInfo {
    pub name: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
}

/// A declared association between a wire byte pattern and a control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlBinding {
    /// Logical unit the control belongs to, e.g. `[Channel1]`.
    pub group: String,
    /// Semantic function, e.g. `play`, or a dotted script handler path.
    pub key: String,
    /// Status byte the binding matches on.
    pub status: u8,
    /// Identifier byte (first data byte) the binding matches on.
    pub midino: u8,
    /// Lower-cased tag names of the declared `<options>` children.
    pub options: BTreeSet<String>,
}

impl ControlBinding {
    /// Whether resolution delegates to a script handler instead of the
    /// built-in rule table.
    pub fn is_script_binding(&self) -> bool {
        self.options.contains("script-binding")
    }
}

/// An outgoing-direction binding with optional feedback thresholds.
///
/// Parsed and carried, but not consumed by any current behavior; the
/// outgoing direction is reserved for future work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputBinding {
    pub group: String,
    pub key: String,
    pub status: u8,
    pub midino: u8,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub on: Option<f64>,
    pub off: Option<f64>,
}

/// Immutable parsed mapping: metadata plus ordered binding lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingDocument {
    pub info: MappingInfo,
    pub controls: Vec<ControlBinding>,
    pub outputs: Vec<OutputBinding>,
}

impl MappingDocument {
    /// Parses a mapping document from its XML source.
    ///
    /// Every `<control>`/`<output>` element must carry `group`, `key`,
    /// `status` and `midino`; a missing field fails the whole parse.
    /// Missing `<info>` or `<outputs>` sections default to empty.
    pub fn parse(xml_src: &str) -> Result<Self, ParseError> {
        let doc = roxmltree::Document::parse(xml_src)?;
        let root = doc.root_element();

        let info = child_element(root, "info")
            .map(parse_info)
            .unwrap_or_default();

        let mut controls = Vec::new();
        let mut outputs = Vec::new();
        if let Some(controller) = child_element(root, "controller") {
            if let Some(list) = child_element(controller, "controls") {
                for node in list.children().filter(|n| n.has_tag_name("control")) {
                    controls.push(parse_control(node)?);
                }
            }
            if let Some(list) = child_element(controller, "outputs") {
                for node in list.children().filter(|n| n.has_tag_name("output")) {
                    outputs.push(parse_output(node)?);
                }
            }
        }

        Ok(Self {
            info,
            controls,
            outputs,
        })
    }

    /// Resolves the binding for a `(status, midino)` pair.
    ///
    /// Declaration order is resolution priority: when two bindings share a
    /// key, the first declared wins on every lookup. Mappings are small,
    /// so a linear scan keeps that guarantee for free.
    pub fn resolve(&self, status: u8, midino: u8) -> Option<&ControlBinding> {
        self.controls
            .iter()
            .find(|b| b.status == status && b.midino == midino)
    }
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.has_tag_name(name))
}

fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    child_element(node, name)
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn required_text(node: Node<'_, '_>, element: &str, field: &str) -> Result<String, ParseError> {
    child_text(node, field).ok_or_else(|| ParseError::MissingField {
        element: element.to_string(),
        field: field.to_string(),
    })
}

/// Parses a byte literal in decimal (`144`) or hex-prefixed (`0x90`) form.
fn parse_byte(field: &str, text: &str) -> Result<u8, ParseError> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|_| ParseError::InvalidNumber {
        field: field.to_string(),
        value: text.to_string(),
    })
}

/// Parses an optional threshold value in decimal or hex-prefixed form.
fn parse_threshold(node: Node<'_, '_>, field: &str) -> Result<Option<f64>, ParseError> {
    let Some(text) = child_text(node, field) else {
        return Ok(None);
    };
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).map(f64::from).ok(),
        None => text.parse().ok(),
    };
    match parsed {
        Some(value) => Ok(Some(value)),
        None => Err(ParseError::InvalidNumber {
            field: field.to_string(),
            value: text,
        }),
    }
}

fn parse_info(node: Node<'_, '_>) -> MappingInfo {
    MappingInfo {
        name: child_text(node, "name"),
        author: child_text(node, "author"),
        description: child_text(node, "description"),
    }
}

fn parse_control(node: Node<'_, '_>) -> Result<ControlBinding, ParseError> {
    let group = required_text(node, "control", "group")?;
    let key = required_text(node, "control", "key")?;
    let status = parse_byte("status", &required_text(node, "control", "status")?)?;
    let midino = parse_byte("midino", &required_text(node, "control", "midino")?)?;

    let options = child_element(node, "options")
        .map(|opts| {
            opts.children()
                .filter(|n| n.is_element())
                .map(|n| n.tag_name().name().to_ascii_lowercase())
                .collect()
        })
        .unwrap_or_default();

    Ok(ControlBinding {
        group,
        key,
        status,
        midino,
        options,
    })
}

fn parse_output(node: Node<'_, '_>) -> Result<OutputBinding, ParseError> {
    Ok(OutputBinding {
        group: required_text(node, "output", "group")?,
        key: required_text(node, "output", "key")?,
        status: parse_byte("status", &required_text(node, "output", "status")?)?,
        midino: parse_byte("midino", &required_text(node, "output", "midino")?)?,
        minimum: parse_threshold(node, "minimum")?,
        maximum: parse_threshold(node, "maximum")?,
        on: parse_threshold(node, "on")?,
        off: parse_threshold(node, "off")?,
    })
}
