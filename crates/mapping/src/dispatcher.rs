//! Per-mapping message dispatcher.
//!
//! One dispatcher instance owns one mapping session: the parsed document,
//! the script bridge (if the mapping ships a script) and the small bits
//! of carried-forward state. Dispatch is a synchronous request/response
//! cycle: one incoming message in, zero or more actions out, fully
//! completed before the next message is accepted.

use deckbridge_core::{Action, MidiMessage, OutputIntent};
use thiserror::Error;

use crate::document::{MappingDocument, ParseError};
use crate::rules;
use crate::script::{ScriptBridge, ScriptError};

/// Errors raised while handling a single message.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The packet is too short to carry an identifier and a value byte.
    #[error("malformed message: expected at least 2 data bytes, got {len}")]
    MalformedMessage { len: usize },
}

/// Load-time failure: the document or the script was rejected.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Script(#[from] ScriptError),
}

/// Stateful translator from wire messages to host actions.
///
/// Not internally synchronized: if several physical inputs feed one
/// mapping instance, the caller must serialize the calls, because a
/// script handler's side effects are only well-defined for a single
/// in-flight message.
pub struct Dispatcher {
    document: MappingDocument,
    bridge: Option<ScriptBridge>,
    /// Most recent message. Write-only for now; kept as the hook for
    /// correlating multi-part messages across calls.
    last_message: Option<MidiMessage>,
}

impl Dispatcher {
    /// Builds a dispatcher for a parsed document.
    ///
    /// The script, if any, is evaluated here, once; a script failure
    /// aborts construction rather than surfacing on first dispatch.
    pub fn new(document: MappingDocument, script_src: Option<&str>) -> Result<Self, ScriptError> {
        let bridge = script_src.map(ScriptBridge::new).transpose()?;
        Ok(Self {
            document,
            bridge,
            last_message: None,
        })
    }

    /// Convenience constructor from raw sources.
    pub fn from_sources(xml_src: &str, script_src: Option<&str>) -> Result<Self, LoadError> {
        let document = MappingDocument::parse(xml_src)?;
        Ok(Self::new(document, script_src)?)
    }

    pub fn document(&self) -> &MappingDocument {
        &self.document
    }

    /// Translates one incoming message into an ordered action sequence.
    ///
    /// A message no binding matches is not an error; partial mappings are
    /// normal, so it simply yields no actions. A faulting script handler
    /// is logged and swallowed here so one broken control cannot take the
    /// whole pipeline down.
    pub fn handle_incoming(&mut self, msg: MidiMessage) -> Result<Vec<Action>, DispatchError> {
        if msg.data.len() < 2 {
            return Err(DispatchError::MalformedMessage {
                len: msg.data.len(),
            });
        }
        let (status, midino, raw) = (msg.status, msg.data[0], msg.data[1]);
        self.last_message = Some(msg);

        let Some(binding) = self.document.resolve(status, midino) else {
            return Ok(Vec::new());
        };

        let down = raw > 0;
        let value = rules::normalize(raw);
        let deck = rules::deck_from_group(&binding.group);

        if binding.is_script_binding() {
            let Some(bridge) = self.bridge.as_mut() else {
                log::warn!(
                    "binding {:?} wants a script handler but the mapping has no script",
                    binding.key
                );
                return Ok(Vec::new());
            };
            return match bridge.invoke_handler(&binding.key, deck, midino, raw, status, &binding.group)
            {
                Ok(actions) => Ok(actions),
                Err(e) => {
                    log::warn!("{e}");
                    Ok(Vec::new())
                }
            };
        }

        Ok(rules::translate(&binding.group, &binding.key, down, value)
            .into_iter()
            .collect())
    }

    /// Translates an outgoing intent into wire messages.
    ///
    /// The outgoing direction is not wired up yet; the shape is exposed
    /// so hosts can already depend on it, and it always yields nothing.
    pub fn prepare_outgoing(&mut self, _intent: &OutputIntent) -> Vec<MidiMessage> {
        Vec::new()
    }
}
