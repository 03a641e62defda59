//! Cache Params Module
//!
//! The parameter shapes a cache key can vary on.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Number, Value};

use crate::error::{CacheError, Result};

// == Scalar ==
/// A primitive parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl Scalar {
    /// String form used when a list is flattened with `,` separators.
    ///
    /// Same as [`Display`](fmt::Display) except `Null` renders empty.
    pub(crate) fn joined_form(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            other => other.to_string(),
        }
    }

    fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Scalar::Null),
            Value::Bool(b) => Ok(Scalar::Bool(*b)),
            Value::Number(n) => Ok(Scalar::Number(n.clone())),
            Value::String(s) => Ok(Scalar::String(s.clone())),
            Value::Array(_) | Value::Object(_) => Err(CacheError::InvalidParameterShape(
                format!("cannot format nested value {}", value),
            )),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Number(n) => write!(f, "{}", number_text(n)),
            Scalar::String(s) => write!(f, "{}", s),
        }
    }
}

/// Renders a number the way JavaScript stringifies it, so `1.0` and `1`
/// share one form. Integral floats below 1e21 print without a fraction.
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(value) if n.is_f64() && value.fract() == 0.0 && value.abs() < 1e21 => {
            // Exact: |value| < 1e21 fits in i128
            (value as i128).to_string()
        }
        Some(value) if n.is_f64() => value.to_string(),
        _ => n.to_string(),
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<f64> for Scalar {
    /// Non-finite floats have no JSON number form and become `Null`.
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Scalar::Null, Scalar::Number)
    }
}

macro_rules! scalar_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Scalar {
                fn from(value: $t) -> Self {
                    Scalar::Number(Number::from(value))
                }
            }
        )*
    };
}

scalar_from_integer!(i32, i64, u32, u64, usize);

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Scalar::Null, Into::into)
    }
}

// == Param Value ==
/// The value bound to one name in map-shaped params.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl ParamValue {
    /// True when the value stringifies to nothing: the empty string, the
    /// empty list, or a one-element list whose element renders empty.
    pub(crate) fn is_blank(&self) -> bool {
        match self {
            ParamValue::Scalar(Scalar::String(s)) => s.is_empty(),
            ParamValue::Scalar(_) => false,
            ParamValue::List(items) => match items.as_slice() {
                [] => true,
                [only] => only.joined_form().is_empty(),
                _ => false,
            },
        }
    }
}

macro_rules! param_value_from_scalar {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ParamValue {
                fn from(value: $t) -> Self {
                    ParamValue::Scalar(value.into())
                }
            }
        )*
    };
}

param_value_from_scalar!(Scalar, &str, String, bool, f64, i32, i64, u32, u64, usize);

impl<T: Into<Scalar>> From<Vec<T>> for ParamValue {
    fn from(items: Vec<T>) -> Self {
        ParamValue::List(items.into_iter().map(Into::into).collect())
    }
}

// == Params ==
/// Parameters a cached result depends on.
///
/// Map keys are kept sorted so the same set of pairs always yields the same
/// cache key, whatever order they were inserted in.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Params {
    /// No parameters
    #[default]
    None,
    /// Positional parameters
    List(Vec<Scalar>),
    /// Named parameters
    Map(BTreeMap<String, ParamValue>),
}

impl Params {
    /// Builds map-shaped params from name/value pairs.
    ///
    /// ```
    /// use module_cache::Params;
    ///
    /// let params = Params::map([("id", 1)]);
    /// assert!(!params.is_none());
    /// ```
    pub fn map<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<ParamValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        Params::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Builds list-shaped params.
    pub fn list<V, I>(items: I) -> Self
    where
        V: Into<Scalar>,
        I: IntoIterator<Item = V>,
    {
        Params::List(items.into_iter().map(Into::into).collect())
    }

    /// Returns true for [`Params::None`].
    pub fn is_none(&self) -> bool {
        matches!(self, Params::None)
    }

    /// Converts a dynamic JSON value into params.
    ///
    /// # Errors
    /// - `InvalidArgumentType` when `value` is a bool, number or string
    /// - `InvalidParameterShape` when an object (or a list nested in a list)
    ///   appears as a parameter value or list element
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Params::None),
            Value::Array(items) => Ok(Params::List(
                items.iter().map(Scalar::from_json).collect::<Result<_>>()?,
            )),
            Value::Object(fields) => {
                let mut map = BTreeMap::new();
                for (name, field) in fields {
                    let param = match field {
                        Value::Object(_) => {
                            return Err(CacheError::InvalidParameterShape(format!(
                                "cannot format object for parameter '{}'",
                                name
                            )))
                        }
                        Value::Array(items) => ParamValue::List(
                            items.iter().map(Scalar::from_json).collect::<Result<_>>()?,
                        ),
                        other => ParamValue::Scalar(Scalar::from_json(other)?),
                    };
                    map.insert(name.clone(), param);
                }
                Ok(Params::Map(map))
            }
            other => Err(CacheError::InvalidArgumentType(format!(
                "params must be an object, a list or null, got {}",
                other
            ))),
        }
    }
}

// == Into Params ==
/// Anything a cache call accepts as its params argument.
///
/// Conversion runs inside the cache call, after the disabled check, so a
/// disabled cache never rejects malformed input.
pub trait IntoParams {
    fn into_params(self) -> Result<Params>;
}

impl IntoParams for Params {
    fn into_params(self) -> Result<Params> {
        Ok(self)
    }
}

impl IntoParams for &Params {
    fn into_params(self) -> Result<Params> {
        Ok(self.clone())
    }
}

impl IntoParams for Option<Params> {
    fn into_params(self) -> Result<Params> {
        Ok(self.unwrap_or_default())
    }
}

impl IntoParams for () {
    fn into_params(self) -> Result<Params> {
        Ok(Params::None)
    }
}

impl IntoParams for Value {
    fn into_params(self) -> Result<Params> {
        Params::from_json(&self)
    }
}

impl IntoParams for &Value {
    fn into_params(self) -> Result<Params> {
        Params::from_json(self)
    }
}
