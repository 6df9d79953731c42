use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;

use crate::error::BridgeError;
use crate::router::ParamVec;

type BoxedArg = Box<dyn Any + Send>;
type ScalarParser = fn(&str) -> Result<BoxedArg, ScalarFailure>;
type BodyDecoder = fn(&Value) -> Result<BoxedArg, String>;

enum ScalarFailure {
    Conversion(String),
    UnknownVariant,
}

/// Where a parameter value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamSource {
    PathVariable(String),
    Query(String),
    Header(String),
    Body,
}

impl fmt::Display for ParamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamSource::PathVariable(k) => write!(f, "path variable `{k}`"),
            ParamSource::Query(k) => write!(f, "query `{k}`"),
            ParamSource::Header(k) => write!(f, "header `{k}`"),
            ParamSource::Body => f.write_str("body"),
        }
    }
}

/// Conversion from a raw path/query/header string.
pub trait FromParam: Sized + Send + 'static {
    const TYPE_NAME: &'static str;

    fn from_param(raw: &str) -> Result<Self, String>;
}

macro_rules! from_param_via_parse {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromParam for $ty {
                const TYPE_NAME: &'static str = stringify!($ty);

                fn from_param(raw: &str) -> Result<Self, String> {
                    raw.trim().parse::<$ty>().map_err(|e| e.to_string())
                }
            }
        )*
    };
}

from_param_via_parse!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl FromParam for String {
    const TYPE_NAME: &'static str = "String";

    fn from_param(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }
}

impl FromParam for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_param(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if raw.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(format!("'{raw}' is neither true nor false"))
        }
    }
}

impl FromParam for char {
    const TYPE_NAME: &'static str = "char";

    fn from_param(raw: &str) -> Result<Self, String> {
        raw.chars()
            .next()
            .ok_or_else(|| "empty value".to_string())
    }
}

/// An enumeration resolved from its external (wire) value.
pub trait ExternalEnum: Sized + Send + 'static {
    const TYPE_NAME: &'static str;

    /// Look up the variant for `value`; `None` when nothing matches.
    fn from_external(value: &str) -> Option<Self>;
}

fn parse_scalar<T: FromParam>(raw: &str) -> Result<BoxedArg, ScalarFailure> {
    T::from_param(raw)
        .map(|v| Box::new(v) as BoxedArg)
        .map_err(ScalarFailure::Conversion)
}

fn parse_enum<E: ExternalEnum>(raw: &str) -> Result<BoxedArg, ScalarFailure> {
    E::from_external(raw)
        .map(|v| Box::new(v) as BoxedArg)
        .ok_or(ScalarFailure::UnknownVariant)
}

// A string body may carry a raw JSON document; it is parsed when the
// value itself does not decode.
fn decode_body<T: DeserializeOwned + Send + 'static>(body: &Value) -> Result<BoxedArg, String> {
    match T::deserialize(body) {
        Ok(v) => Ok(Box::new(v)),
        Err(direct) => match body {
            Value::String(raw) => serde_json::from_str::<T>(raw)
                .map(|v| Box::new(v) as BoxedArg)
                .map_err(|_| direct.to_string()),
            _ => Err(direct.to_string()),
        },
    }
}

#[derive(Clone)]
enum Decoder {
    Scalar {
        type_name: &'static str,
        is_enum: bool,
        parse: ScalarParser,
    },
    Body {
        type_name: &'static str,
        decode: BodyDecoder,
    },
}

/// One declared parameter: a source and a target type.
#[derive(Clone)]
pub struct ParamSpec {
    source: ParamSource,
    decoder: Decoder,
}

impl ParamSpec {
    #[must_use]
    pub fn source(&self) -> &ParamSource {
        &self.source
    }

    /// Name of the declared target type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match &self.decoder {
            Decoder::Scalar { type_name, .. } | Decoder::Body { type_name, .. } => type_name,
        }
    }
}

impl fmt::Debug for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamSpec")
            .field("source", &self.source)
            .field("type", &self.type_name())
            .finish()
    }
}

/// Builder for keyed parameter declarations.
///
/// ```rust
/// use bridgeapi::params::{Param, ParamSource};
///
/// let spec = Param::header("X-Token").of::<String>();
/// assert_eq!(spec.source(), &ParamSource::Header("X-Token".to_string()));
/// ```
#[derive(Debug, Clone)]
pub struct Param {
    source: ParamSource,
}

impl Param {
    #[must_use]
    pub fn path(key: impl Into<String>) -> Self {
        Self {
            source: ParamSource::PathVariable(key.into()),
        }
    }

    #[must_use]
    pub fn query(key: impl Into<String>) -> Self {
        Self {
            source: ParamSource::Query(key.into()),
        }
    }

    #[must_use]
    pub fn header(key: impl Into<String>) -> Self {
        Self {
            source: ParamSource::Header(key.into()),
        }
    }

    /// The whole request body decoded into `T`.
    #[must_use]
    pub fn body<T: DeserializeOwned + Send + 'static>() -> ParamSpec {
        ParamSpec {
            source: ParamSource::Body,
            decoder: Decoder::Body {
                type_name: type_name::<T>(),
                decode: decode_body::<T>,
            },
        }
    }

    /// Declare a primitive target type.
    #[must_use]
    pub fn of<T: FromParam>(self) -> ParamSpec {
        ParamSpec {
            source: self.source,
            decoder: Decoder::Scalar {
                type_name: T::TYPE_NAME,
                is_enum: false,
                parse: parse_scalar::<T>,
            },
        }
    }

    /// Declare an enumeration resolved by its external value.
    #[must_use]
    pub fn of_enum<E: ExternalEnum>(self) -> ParamSpec {
        ParamSpec {
            source: self.source,
            decoder: Decoder::Scalar {
                type_name: E::TYPE_NAME,
                is_enum: true,
                parse: parse_enum::<E>,
            },
        }
    }
}

/// Look up a header by exact key, then ASCII case-insensitively.
///
/// When several keys differ from `name` only in case, the lexicographically
/// smallest one wins so the result does not depend on map order.
#[must_use]
pub fn header_value<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .or_else(|| {
            headers
                .iter()
                .filter(|(k, _)| k.eq_ignore_ascii_case(name))
                .min_by(|(a, _), (b, _)| a.cmp(b))
                .map(|(_, v)| v)
        })
        .map(String::as_str)
}

/// The per-request values a binder reads from.
#[derive(Debug, Clone, Copy)]
pub struct BindingSources<'a> {
    pub path_variables: &'a ParamVec,
    pub query: &'a HashMap<String, String>,
    pub headers: &'a HashMap<String, String>,
    pub body: &'a Value,
}

impl<'a> BindingSources<'a> {
    fn lookup(&self, source: &ParamSource) -> Option<&'a str> {
        match source {
            ParamSource::PathVariable(key) => self
                .path_variables
                .iter()
                .rfind(|(k, _)| k.as_ref() == key)
                .map(|(_, v)| v.as_str()),
            ParamSource::Query(key) => self.query.get(key).map(String::as_str),
            ParamSource::Header(key) => header_value(self.headers, key),
            ParamSource::Body => None,
        }
    }
}

/// Positional handler arguments produced by [`bind`].
///
/// Each slot is either absent (no source entry) or holds a value of the
/// declared type. Values are moved out with [`Args::take`] or
/// [`Args::require`].
#[derive(Default)]
pub struct Args {
    slots: Vec<Option<BoxedArg>>,
}

impl Args {
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether slot `index` holds a value.
    #[must_use]
    pub fn is_present(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Some(_)))
    }

    /// Move the value out of slot `index`. `Ok(None)` when the source had no entry.
    pub fn take<T: 'static>(&mut self, index: usize) -> Result<Option<T>, BridgeError> {
        let Some(slot) = self.slots.get_mut(index) else {
            return Err(BridgeError::MissingArgument { index });
        };
        match slot.take() {
            None => Ok(None),
            Some(boxed) => match boxed.downcast::<T>() {
                Ok(v) => Ok(Some(*v)),
                Err(original) => {
                    *slot = Some(original);
                    Err(BridgeError::ArgumentType {
                        index,
                        requested: type_name::<T>(),
                    })
                }
            },
        }
    }

    /// Like [`Args::take`] but an absent value is an error.
    pub fn require<T: 'static>(&mut self, index: usize) -> Result<T, BridgeError> {
        self.take(index)?
            .ok_or(BridgeError::MissingArgument { index })
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.slots.iter().map(|s| if s.is_some() { "<bound>" } else { "<absent>" }))
            .finish()
    }
}

/// Resolve every declared parameter against the request.
///
/// Stops at the first conversion failure.
pub fn bind(specs: &[ParamSpec], sources: &BindingSources<'_>) -> Result<Args, BridgeError> {
    let mut slots = Vec::with_capacity(specs.len());
    for (index, spec) in specs.iter().enumerate() {
        let slot = match &spec.decoder {
            Decoder::Body { type_name, decode } => {
                let value = decode(sources.body).map_err(|reason| BridgeError::Binding {
                    index,
                    source: spec.source.to_string(),
                    expected: type_name,
                    reason,
                })?;
                Some(value)
            }
            Decoder::Scalar {
                type_name,
                is_enum,
                parse,
            } => match sources.lookup(&spec.source) {
                None => None,
                Some(raw) => Some(parse(raw).map_err(|failure| match failure {
                    ScalarFailure::UnknownVariant => BridgeError::UnknownEnumValue {
                        index,
                        source: spec.source.to_string(),
                        enum_name: type_name,
                        value: raw.to_string(),
                    },
                    ScalarFailure::Conversion(reason) => BridgeError::Binding {
                        index,
                        source: spec.source.to_string(),
                        expected: if *is_enum { "enum" } else { type_name },
                        reason,
                    },
                })?),
            },
        };
        slots.push(slot);
    }
    Ok(Args { slots })
}
