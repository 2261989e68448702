//! value type constraints
//!
//! Decoded values are plain [hcl::Value]s. Attribute grammars may constrain an attribute to a [Type], in which
//! case the evaluated value is converted before it is handed to a block definition.
//!
//! Supported conversions:
//! - every type accepts `null`
//! - `number` and `bool` convert to `string`
//! - a `string` converts to `number` when it parses as one, and to `bool` when it is `"true"` or `"false"`
//! - `list(T)` and `map(T)` convert element-wise
use hcl::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// no constraint
    Any,
    Bool,
    Number,
    String,
    List(Box<Type>),
    Map(Box<Type>),
}

impl Type {
    pub fn list(element: Type) -> Self {
        Self::List(Box::new(element))
    }

    pub fn map(element: Type) -> Self {
        Self::Map(Box::new(element))
    }

    pub fn convert(&self, value: Value) -> Result<Value, ConversionError> {
        match (self, value) {
            (Type::Any, value) => Ok(value),
            (_, Value::Null) => Ok(Value::Null),

            (Type::Bool, Value::Bool(b)) => Ok(Value::Bool(b)),
            (Type::Bool, Value::String(s)) => match s.as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(ConversionError::Unparsable {
                    expected: self.clone(),
                    value: s,
                }),
            },

            (Type::Number, Value::Number(n)) => Ok(Value::Number(n)),
            (Type::Number, Value::String(s)) => parse_number(&s)
                .map(Value::Number)
                .ok_or(ConversionError::Unparsable {
                    expected: self.clone(),
                    value: s,
                }),

            (Type::String, Value::String(s)) => Ok(Value::String(s)),
            (Type::String, Value::Number(n)) => Ok(Value::String(n.to_string())),
            (Type::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),

            (Type::List(element), Value::Array(array)) => array
                .into_iter()
                .enumerate()
                .map(|(index, value)| {
                    element
                        .convert(value)
                        .map_err(|err| ConversionError::Element {
                            key: index.to_string(),
                            source: Box::new(err),
                        })
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),

            (Type::Map(element), Value::Object(object)) => object
                .into_iter()
                .map(|(key, value)| match element.convert(value) {
                    Ok(value) => Ok((key, value)),
                    Err(err) => Err(ConversionError::Element {
                        key,
                        source: Box::new(err),
                    }),
                })
                .collect::<Result<hcl::value::Map<_, _>, _>>()
                .map(Value::Object),

            (expected, value) => Err(ConversionError::Mismatch {
                expected: expected.clone(),
                found: type_name(&value),
            }),
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Any => f.write_str("any"),
            Type::Bool => f.write_str("bool"),
            Type::Number => f.write_str("number"),
            Type::String => f.write_str("string"),
            Type::List(element) => write!(f, "list of {element}"),
            Type::Map(element) => write!(f, "map of {element}"),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConversionError {
    #[error("{expected} required, found {found}")]
    Mismatch { expected: Type, found: &'static str },
    #[error("a {expected} is required, but {value:?} cannot be converted")]
    Unparsable { expected: Type, value: String },
    #[error("element {key:?}: {source}")]
    Element {
        key: String,
        source: Box<ConversionError>,
    },
}

fn parse_number(s: &str) -> Option<hcl::Number> {
    let s = s.trim();
    if let Ok(int) = s.parse::<i64>() {
        return Some(hcl::Number::from(int));
    }

    s.parse::<f64>().ok().and_then(hcl::Number::from_f64)
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "tuple",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn primitive_conversions() {
        assert_eq!(
            Type::String.convert(Value::Number(hcl::Number::from(42i64))),
            Ok(Value::String("42".into()))
        );
        assert_eq!(
            Type::Number.convert(Value::String("42".into())),
            Ok(Value::Number(hcl::Number::from(42i64)))
        );
        assert_eq!(
            Type::Bool.convert(Value::String("true".into())),
            Ok(Value::Bool(true))
        );
        assert_eq!(Type::Number.convert(Value::Null), Ok(Value::Null));
    }

    #[test]
    fn mismatches() {
        assert_eq!(
            Type::Number.convert(Value::Bool(true)),
            Err(ConversionError::Mismatch {
                expected: Type::Number,
                found: "bool"
            })
        );

        let err = Type::list(Type::Number)
            .convert(Value::Array(vec![
                Value::Number(hcl::Number::from(1i64)),
                Value::String("two".into()),
            ]))
            .expect_err("second element is not a number");
        assert_eq!(
            err.to_string(),
            "element \"1\": a number is required, but \"two\" cannot be converted"
        );
    }

    #[test]
    fn map_of_strings() {
        let mut object = hcl::value::Map::new();
        object.insert("a".to_string(), Value::Number(hcl::Number::from(1i64)));
        object.insert("b".to_string(), Value::Bool(false));

        let mut expected = hcl::value::Map::new();
        expected.insert("a".to_string(), Value::String("1".into()));
        expected.insert("b".to_string(), Value::String("false".into()));

        assert_eq!(
            Type::map(Type::String).convert(Value::Object(object)),
            Ok(Value::Object(expected))
        );
    }
}
