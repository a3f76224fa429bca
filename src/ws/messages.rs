//! Wire protocol codec: the `{action, args}` envelope, inbound actions and
//! outbound messages.
//!
//! Every frame is a JSON object with exactly two keys:
//!
//! ```json
//! { "action": "define_property", "args": { "object": "lamp-1", "property": "power", "value": "1" } }
//! ```
//!
//! Decoding never panics: malformed frames become a [`ParseError`] that the
//! session logs before discarding the frame.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::ObjectId;
use crate::service::ObjectProjection;

/// Inbound: client can receive pushes.
pub const CLIENT_READY: &str = "client_ready";
/// Inbound: liveness acknowledgment of the test message.
pub const TEST_ACK: &str = "test_ack";
/// Inbound: acknowledgment of the welcome message.
pub const WELCOME_ACK: &str = "welcome_ack";
/// Inbound: property write request.
pub const DEFINE_PROPERTY: &str = "define_property";
/// Outbound: full filtered snapshot.
pub const UPDATE_OBJECTS: &str = "update_objects";
/// Outbound: an object was clicked.
pub const OBJECT_CLICKED: &str = "object_clicked";

/// Reasons an inbound frame is rejected.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The frame is not valid JSON.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The frame is JSON but not an object.
    #[error("frame is not a JSON object")]
    NotAnObject,

    /// The `action` key is missing or not a string.
    #[error("frame has no string 'action'")]
    MissingAction,

    /// The `args` key is present but not an object.
    #[error("'args' is not a JSON object")]
    InvalidArgs,

    /// A required argument of a recognized action is missing.
    #[error("missing argument '{0}'")]
    MissingArgument(&'static str),
}

/// The unit of exchange, symmetric for both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    /// Action tag.
    pub action: String,
    /// Action arguments.
    pub args: Map<String, Value>,
}

impl WireMessage {
    /// Creates a message.
    #[must_use]
    pub fn new(action: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            action: action.into(),
            args,
        }
    }

    /// Decodes a text frame.
    ///
    /// A missing `args` key decodes as empty arguments.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] describing why the frame was rejected.
    pub fn decode(text: &str) -> Result<Self, ParseError> {
        let Value::Object(mut frame) = serde_json::from_str::<Value>(text)? else {
            return Err(ParseError::NotAnObject);
        };
        let Some(Value::String(action)) = frame.remove("action") else {
            return Err(ParseError::MissingAction);
        };
        let args = match frame.remove("args") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(args)) => args,
            Some(_) => return Err(ParseError::InvalidArgs),
        };
        Ok(Self { action, args })
    }

    /// Encodes the message as a text frame.
    ///
    /// Keys are emitted in sorted order, so equal messages encode equally.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut frame = Map::new();
        frame.insert("action".to_string(), Value::String(self.action.clone()));
        frame.insert("args".to_string(), Value::Object(self.args.clone()));
        Value::Object(frame).to_string()
    }
}

/// Acknowledgment kinds, logged only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckKind {
    /// `test_ack`.
    Test,
    /// `welcome_ack`.
    Welcome,
}

/// Closed set of inbound actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundAction {
    /// `client_ready`: readiness handshake.
    ClientReady,
    /// `test_ack` / `welcome_ack`.
    Acknowledgment(AckKind),
    /// `define_property`: write a property from its textual form.
    DefineProperty {
        /// Target object.
        object: ObjectId,
        /// Property name.
        property: String,
        /// Textual value.
        value: String,
    },
    /// Anything else; ignored.
    Unknown(String),
}

impl InboundAction {
    /// Decodes a text frame straight into an action.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] for malformed frames or missing arguments.
    pub fn decode(text: &str) -> Result<Self, ParseError> {
        Self::try_from(WireMessage::decode(text)?)
    }
}

impl TryFrom<WireMessage> for InboundAction {
    type Error = ParseError;

    fn try_from(message: WireMessage) -> Result<Self, Self::Error> {
        let WireMessage { action, mut args } = message;
        Ok(match action.as_str() {
            CLIENT_READY => Self::ClientReady,
            TEST_ACK => Self::Acknowledgment(AckKind::Test),
            WELCOME_ACK => Self::Acknowledgment(AckKind::Welcome),
            DEFINE_PROPERTY => {
                let object = required_text(&mut args, "object")?;
                let property = required_text(&mut args, "property")?;
                let value = value_as_text(args.remove("value"));
                Self::DefineProperty {
                    object: ObjectId::from(object),
                    property,
                    value,
                }
            }
            _ => Self::Unknown(action),
        })
    }
}

fn required_text(args: &mut Map<String, Value>, key: &'static str) -> Result<String, ParseError> {
    match args.remove(key) {
        None | Some(Value::Null) => Err(ParseError::MissingArgument(key)),
        Some(Value::String(text)) => Ok(text),
        Some(other) => Ok(other.to_string()),
    }
}

/// Converts a `value` argument to the textual form the property engine
/// expects: strings pass through, `null` or a missing value become
/// `"null"`, anything else is its JSON text.
#[must_use]
pub fn value_as_text(value: Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => "null".to_string(),
        Some(Value::String(text)) => text,
        Some(other) => other.to_string(),
    }
}

/// Messages the server pushes to clients.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    /// Full filtered snapshot.
    UpdateObjects {
        /// Projections of every qualifying object.
        objects: Vec<ObjectProjection>,
    },
    /// An object was clicked.
    ObjectClicked {
        /// Clicked object.
        object_id: ObjectId,
    },
}

impl OutboundMessage {
    /// Returns the wire action tag.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::UpdateObjects { .. } => UPDATE_OBJECTS,
            Self::ObjectClicked { .. } => OBJECT_CLICKED,
        }
    }

    /// Converts to the generic envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if a projection cannot be represented as JSON.
    pub fn to_wire(&self) -> Result<WireMessage, serde_json::Error> {
        let mut args = Map::new();
        match self {
            Self::UpdateObjects { objects } => {
                args.insert("objects".to_string(), serde_json::to_value(objects)?);
            }
            Self::ObjectClicked { object_id } => {
                args.insert(
                    "object_id".to_string(),
                    Value::String(object_id.as_str().to_string()),
                );
            }
        }
        Ok(WireMessage::new(self.action(), args))
    }

    /// Encodes straight to a text frame.
    ///
    /// # Errors
    ///
    /// See [`OutboundMessage::to_wire`].
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        Ok(self.to_wire()?.encode())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::{ObjectKind, SceneObject};

    #[test]
    fn decodes_client_ready_without_args() {
        let Ok(action) = InboundAction::decode(r#"{"action":"client_ready"}"#) else {
            panic!("client_ready must decode");
        };
        assert_eq!(action, InboundAction::ClientReady);
    }

    #[test]
    fn decodes_acknowledgments() {
        let Ok(action) = InboundAction::decode(r#"{"action":"welcome_ack","args":{}}"#) else {
            panic!("welcome_ack must decode");
        };
        assert_eq!(action, InboundAction::Acknowledgment(AckKind::Welcome));
    }

    #[test]
    fn decodes_define_property() {
        let text = r##"{"action":"define_property","args":{"object":"lamp","property":"color","value":"#FF0000"}}"##;
        let Ok(action) = InboundAction::decode(text) else {
            panic!("define_property must decode");
        };
        assert_eq!(
            action,
            InboundAction::DefineProperty {
                object: ObjectId::from("lamp"),
                property: "color".to_string(),
                value: "#FF0000".to_string(),
            }
        );
    }

    #[test]
    fn non_string_values_become_json_text() {
        assert_eq!(value_as_text(Some(json!(1.5))), "1.5");
        assert_eq!(value_as_text(Some(json!(true))), "true");
        assert_eq!(value_as_text(Some(Value::Null)), "null");
        assert_eq!(value_as_text(None), "null");
    }

    #[test]
    fn unknown_action_is_kept() {
        let Ok(action) = InboundAction::decode(r#"{"action":"dance","args":{"x":1}}"#) else {
            panic!("unknown actions still decode");
        };
        assert_eq!(action, InboundAction::Unknown("dance".to_string()));
    }

    #[test]
    fn malformed_frames_are_typed_errors() {
        assert!(matches!(
            WireMessage::decode("not json"),
            Err(ParseError::Malformed(_))
        ));
        assert!(matches!(
            WireMessage::decode("[1,2]"),
            Err(ParseError::NotAnObject)
        ));
        assert!(matches!(
            WireMessage::decode(r#"{"args":{}}"#),
            Err(ParseError::MissingAction)
        ));
        assert!(matches!(
            WireMessage::decode(r#"{"action":"x","args":[]}"#),
            Err(ParseError::InvalidArgs)
        ));
        assert!(matches!(
            InboundAction::decode(r#"{"action":"define_property","args":{"property":"x"}}"#),
            Err(ParseError::MissingArgument("object"))
        ));
    }

    #[test]
    fn object_clicked_encodes_exact_shape() {
        let message = OutboundMessage::ObjectClicked {
            object_id: ObjectId::from("switch-1"),
        };
        let Ok(text) = message.encode() else {
            panic!("object_clicked must encode");
        };
        let Ok(value) = serde_json::from_str::<Value>(&text) else {
            panic!("encoded frame must be JSON");
        };
        assert_eq!(
            value,
            json!({"action": "object_clicked", "args": {"object_id": "switch-1"}})
        );
    }

    #[test]
    fn update_objects_carries_projections() {
        let lamp = SceneObject::new(ObjectId::from("l"), "Lamp", ObjectKind::Light);
        let message = OutboundMessage::UpdateObjects {
            objects: vec![ObjectProjection::from_object(&lamp)],
        };
        let Ok(wire) = message.to_wire() else {
            panic!("update_objects must encode");
        };
        assert_eq!(wire.action, UPDATE_OBJECTS);
        let Some(Value::Array(objects)) = wire.args.get("objects") else {
            panic!("objects must be an array");
        };
        assert_eq!(objects.len(), 1);
        assert_eq!(objects.first().and_then(|o| o.get("id")), Some(&json!("l")));
    }

    #[test]
    fn update_objects_keeps_float_values_verbatim() {
        let mut lamp = SceneObject::new(ObjectId::from("l"), "Lamp", ObjectKind::Light).at(12.3, 4.0);
        lamp.power = 0.8;
        let message = OutboundMessage::UpdateObjects {
            objects: vec![ObjectProjection::from_object(&lamp)],
        };
        let Ok(text) = message.encode() else {
            panic!("update_objects must encode");
        };
        assert!(text.contains(r#""power":0.8"#), "{text}");
        assert!(text.contains(r#""x":12.3"#), "{text}");
        assert!(text.contains(r#""y":4.0"#), "{text}");
    }

    #[test]
    fn encoding_is_deterministic() {
        let mut args = Map::new();
        args.insert("b".to_string(), json!(2));
        args.insert("a".to_string(), json!(1));
        let message = WireMessage::new("x", args);
        assert_eq!(message.encode(), message.clone().encode());
        let Ok(back) = WireMessage::decode(&message.encode()) else {
            panic!("encoded frame must decode");
        };
        assert_eq!(back, message);
    }
}
