//! Sandboxed bridge to legacy mapping scripts.
//!
//! Mapping scripts are plain JavaScript, evaluated exactly once at load
//! time inside an isolated Boa context. The only host surface a script
//! sees is the three capability objects installed before evaluation:
//!
//! - `engine`: `setValue` / `setParameter` queue value actions,
//!   `getValue` fails loudly (there is no host state to read from)
//! - `script`: `deckFromGroup`, the same extraction the rule table uses
//! - `console`: `log`, forwarded to the host log
//!
//! Top-level `var` and `function` declarations land on the context's
//! global object, which doubles as the handler table; dotted binding keys
//! (`"MyDeck.playButton"`) resolve through nested objects on it.

use boa_engine::object::builtins::JsArray;
use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{
    js_string, Context, JsArgs, JsError, JsNativeError, JsObject, JsResult, JsString, JsValue,
    NativeFunction, Source,
};
use deckbridge_core::Action;
use thiserror::Error;

use crate::rules;

/// Global array backing the call-scoped action queue.
const ACTION_QUEUE: &str = "__deckbridgeQueue";

/// Errors raised by the script bridge.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script failed during its one-time top-level evaluation.
    /// Fatal to mapping construction.
    #[error("script evaluation failed: {0}")]
    Evaluation(String),

    /// A handler faulted during a dispatch call.
    #[error("script handler {path:?} failed: {message}")]
    Handler { path: String, message: String },

    /// The bridge's own plumbing misbehaved inside the context.
    #[error("script bridge internal error: {0}")]
    Internal(String),
}

fn internal(err: JsError) -> ScriptError {
    ScriptError::Internal(err.to_string())
}

/// Evaluated mapping script plus its call-scoped action queue.
///
/// The queue is reset immediately before every handler invocation and
/// drained immediately after, so contents never leak between two
/// dispatch calls.
pub struct ScriptBridge {
    context: Context,
}

impl ScriptBridge {
    /// Installs the capability objects and evaluates `source` once.
    ///
    /// Any syntax or runtime error during that evaluation aborts
    /// construction; nothing is deferred to first dispatch.
    pub fn new(source: &str) -> Result<Self, ScriptError> {
        let mut context = Context::default();
        install_capabilities(&mut context).map_err(internal)?;
        context
            .eval(Source::from_bytes(source))
            .map_err(|e| ScriptError::Evaluation(e.to_string()))?;
        Ok(Self { context })
    }

    /// Whether a callable exists at the dotted `path`.
    pub fn has_handler(&mut self, path: &str) -> bool {
        matches!(self.lookup_handler(path), Ok(Some(_)))
    }

    /// Invokes the handler at `path` with `(deck, midino, value, status,
    /// group)` and returns the actions it queued, in call order.
    ///
    /// A missing handler is not an error and yields no actions. A
    /// faulting handler is: its queued actions are discarded rather than
    /// half-applied, and the fault is reported to the caller.
    pub fn invoke_handler(
        &mut self,
        path: &str,
        deck: Option<u8>,
        midino: u8,
        value: u8,
        status: u8,
        group: &str,
    ) -> Result<Vec<Action>, ScriptError> {
        let Some(handler) = self.lookup_handler(path).map_err(internal)? else {
            return Ok(Vec::new());
        };

        self.reset_queue().map_err(internal)?;

        let args = [
            deck.map_or(JsValue::undefined(), |d| JsValue::from(i32::from(d))),
            JsValue::from(i32::from(midino)),
            JsValue::from(i32::from(value)),
            JsValue::from(i32::from(status)),
            JsValue::from(JsString::from(group)),
        ];
        let call_result = handler.call(&JsValue::undefined(), &args, &mut self.context);
        let actions = self.drain_queue().map_err(internal)?;

        match call_result {
            Ok(_) => Ok(actions),
            Err(e) => Err(ScriptError::Handler {
                path: path.to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Late-bound lookup of a dotted path through nested objects on the
    /// global object. Returns `None` unless the path ends at a callable.
    fn lookup_handler(&mut self, path: &str) -> JsResult<Option<JsObject>> {
        let mut current = JsValue::from(self.context.global_object());
        for segment in path.split('.') {
            let Some(object) = current.as_object().cloned() else {
                return Ok(None);
            };
            current = object.get(JsString::from(segment), &mut self.context)?;
        }
        Ok(current
            .as_object()
            .filter(|object| object.is_callable())
            .cloned())
    }

    fn reset_queue(&mut self) -> JsResult<()> {
        let empty = JsArray::new(&mut self.context);
        let global = self.context.global_object();
        global.set(JsString::from(ACTION_QUEUE), empty, true, &mut self.context)?;
        Ok(())
    }

    /// Reads and clears the queue, translating each `{group, key, value}`
    /// record with the same mapping the declarative rules use.
    fn drain_queue(&mut self) -> JsResult<Vec<Action>> {
        let queue = action_queue(&mut self.context)?;
        let len = queue.length(&mut self.context)?;

        let mut actions = Vec::new();
        for i in 0..len {
            let record = queue.at(i as i64, &mut self.context)?;
            let Some(record) = record.as_object().cloned() else {
                continue;
            };
            let group = string_field(&record, "group", &mut self.context)?;
            let key = string_field(&record, "key", &mut self.context)?;
            let value = record
                .get(js_string!("value"), &mut self.context)?
                .to_number(&mut self.context)?;

            match rules::value_action(&group, &key, value.clamp(0.0, 1.0)) {
                Some(action) => actions.push(action),
                None => log::debug!("script set unmapped control {group} {key}"),
            }
        }

        self.reset_queue()?;
        Ok(actions)
    }
}

fn string_field(record: &JsObject, field: &str, context: &mut Context) -> JsResult<String> {
    Ok(record
        .get(JsString::from(field), context)?
        .to_string(context)?
        .to_std_string_escaped())
}

fn action_queue(context: &mut Context) -> JsResult<JsArray> {
    let global = context.global_object();
    let queue = global.get(JsString::from(ACTION_QUEUE), context)?;
    let object = queue
        .as_object()
        .cloned()
        .ok_or_else(|| JsNativeError::typ().with_message("action queue is not an object"))?;
    JsArray::from_object(object)
}

/// Installs `engine`, `script` and `console` plus the backing queue.
/// Scripts see nothing else of the host.
fn install_capabilities(context: &mut Context) -> JsResult<()> {
    let queue = JsArray::new(context);
    context.register_global_property(JsString::from(ACTION_QUEUE), queue, Attribute::all())?;

    let engine = ObjectInitializer::new(context)
        .function(
            NativeFunction::from_fn_ptr(engine_set_value),
            js_string!("setValue"),
            3,
        )
        .function(
            NativeFunction::from_fn_ptr(engine_set_value),
            js_string!("setParameter"),
            3,
        )
        .function(
            NativeFunction::from_fn_ptr(engine_get_value),
            js_string!("getValue"),
            2,
        )
        .build();
    context.register_global_property(js_string!("engine"), engine, Attribute::all())?;

    let script = ObjectInitializer::new(context)
        .function(
            NativeFunction::from_fn_ptr(script_deck_from_group),
            js_string!("deckFromGroup"),
            1,
        )
        .build();
    context.register_global_property(js_string!("script"), script, Attribute::all())?;

    let console = ObjectInitializer::new(context)
        .function(NativeFunction::from_fn_ptr(console_log), js_string!("log"), 1)
        .build();
    context.register_global_property(js_string!("console"), console, Attribute::all())?;

    Ok(())
}

/// `engine.setValue(group, key, value)` / `engine.setParameter(...)`.
///
/// Appends a raw record to the call-scoped queue; translation into an
/// [`Action`] happens on drain so it shares the rule table's mapping.
fn engine_set_value(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let group = args.get_or_undefined(0).to_string(context)?;
    let key = args.get_or_undefined(1).to_string(context)?;
    let value = args.get_or_undefined(2).to_number(context)?;

    let record = ObjectInitializer::new(context)
        .property(js_string!("group"), group, Attribute::all())
        .property(js_string!("key"), key, Attribute::all())
        .property(js_string!("value"), value, Attribute::all())
        .build();

    let queue = action_queue(context)?;
    queue.push(record, context)?;
    Ok(JsValue::undefined())
}

/// `engine.getValue(group, key)` fails loudly. Fabricating a value here
/// could drive a visible feedback glitch on the control surface, which is
/// worse than a script error in the log.
fn engine_get_value(_this: &JsValue, _args: &[JsValue], _context: &mut Context) -> JsResult<JsValue> {
    Err(JsNativeError::error()
        .with_message("engine.getValue is not implemented")
        .into())
}

/// `script.deckFromGroup(group)`, backed by the same extraction as
/// [`rules::deck_from_group`].
fn script_deck_from_group(
    _this: &JsValue,
    args: &[JsValue],
    context: &mut Context,
) -> JsResult<JsValue> {
    let group = args
        .get_or_undefined(0)
        .to_string(context)?
        .to_std_string_escaped();
    Ok(match rules::deck_from_group(&group) {
        Some(deck) => JsValue::from(i32::from(deck)),
        None => JsValue::undefined(),
    })
}

/// `console.log(...)`, forwarded to the host log.
fn console_log(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let parts: Vec<String> = args
        .iter()
        .map(|arg| arg.to_string(context).map(|s| s.to_std_string_escaped()))
        .collect::<JsResult<_>>()?;
    log::info!(target: "mapping-script", "{}", parts.join(" "));
    Ok(JsValue::undefined())
}
