//! Named wire-format codecs.
//!
//! A [`Codec`] converts between a [`Value`] tree and wire text. The engine
//! never looks inside the text; concrete formats (JSON, RON, YAML, ...) are
//! external collaborators, registered here under a format name. Since
//! [`Value`] implements `Serialize`/`Deserialize`, any serde data format is a
//! codec in a few lines.

use alloc::boxed::Box;
use alloc::string::String;
use core::error::Error;

use crate::hash::HashMap;
use crate::value::Value;

// -----------------------------------------------------------------------------
// Codec

/// A wire format: text in, [`Value`] tree out, and back.
///
/// Implementations must be pure transformations; the engine calls them
/// synchronously and shares them across concurrent calls.
pub trait Codec: Send + Sync {
    /// Renders the value tree as wire text.
    fn marshal(&self, tree: &Value) -> Result<String, CodecError>;

    /// Parses wire text into a value tree.
    fn unmarshal(&self, text: &str) -> Result<Value, CodecError>;
}

// -----------------------------------------------------------------------------
// CodecError

/// Errors produced at the codec boundary.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// No codec was registered under the requested format name.
    ///
    /// This is a configuration error: the mapping setup is broken, not the
    /// data.
    #[error("no codec registered for format `{format}`")]
    UnknownFormat { format: String },

    /// The underlying format implementation failed to encode or decode.
    #[error("codec failed: {0}")]
    Failed(#[source] Box<dyn Error + Send + Sync>),
}

impl CodecError {
    /// Wraps a format implementation's own error.
    #[inline]
    pub fn failed(err: impl Error + Send + Sync + 'static) -> Self {
        Self::Failed(Box::new(err))
    }
}

// -----------------------------------------------------------------------------
// CodecRegistry

/// Registry of wire formats by name.
///
/// Built once at configuration time and read-only afterwards.
///
/// # Examples
///
/// ```
/// use treebind_value::codec::{Codec, CodecError, CodecRegistry};
/// use treebind_value::Value;
///
/// struct Json;
///
/// impl Codec for Json {
///     fn marshal(&self, tree: &Value) -> Result<String, CodecError> {
///         serde_json::to_string(tree).map_err(CodecError::failed)
///     }
///     fn unmarshal(&self, text: &str) -> Result<Value, CodecError> {
///         serde_json::from_str(text).map_err(CodecError::failed)
///     }
/// }
///
/// let mut codecs = CodecRegistry::new();
/// codecs.register("json", Json);
///
/// let codec = codecs.get("json").unwrap();
/// assert_eq!(codec.marshal(&Value::bool(true)).unwrap(), "true");
/// ```
#[derive(Default)]
pub struct CodecRegistry {
    table: HashMap<String, Box<dyn Codec>>,
}

impl CodecRegistry {
    /// Creates an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `codec` under `format`, replacing any previous registration.
    pub fn register(&mut self, format: impl Into<String>, codec: impl Codec + 'static) {
        let format = format.into();
        log::debug!("registered codec for format `{format}`");
        self.table.insert(format, Box::new(codec));
    }

    /// Returns the codec for `format`.
    ///
    /// An unknown format is a configuration error.
    pub fn get(&self, format: &str) -> Result<&dyn Codec, CodecError> {
        match self.table.get(format) {
            Some(codec) => Ok(&**codec),
            None => Err(CodecError::UnknownFormat {
                format: format.into(),
            }),
        }
    }

    /// Whether a codec is registered under `format`.
    #[inline]
    pub fn contains(&self, format: &str) -> bool {
        self.table.contains_key(format)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{Codec, CodecError, CodecRegistry};
    use crate::value::Value;

    struct Json;

    impl Codec for Json {
        fn marshal(&self, tree: &Value) -> Result<String, CodecError> {
            serde_json::to_string(tree).map_err(CodecError::failed)
        }
        fn unmarshal(&self, text: &str) -> Result<Value, CodecError> {
            serde_json::from_str(text).map_err(CodecError::failed)
        }
    }

    #[test]
    fn unknown_format_is_a_config_error() {
        let codecs = CodecRegistry::new();
        assert!(matches!(
            codecs.get("yaml"),
            Err(CodecError::UnknownFormat { .. })
        ));
    }

    #[test]
    fn registered_codec_round_trips() {
        let mut codecs = CodecRegistry::new();
        codecs.register("json", Json);

        let tree = Value::object([("n", Value::int(1))]);
        let text = codecs.get("json").unwrap().marshal(&tree).unwrap();
        let back = codecs.get("json").unwrap().unmarshal(&text).unwrap();
        assert_eq!(tree, back);
    }

    #[test]
    fn malformed_text_is_a_codec_failure() {
        let mut codecs = CodecRegistry::new();
        codecs.register("json", Json);
        assert!(matches!(
            codecs.get("json").unwrap().unmarshal("{oops"),
            Err(CodecError::Failed(_))
        ));
    }
}
