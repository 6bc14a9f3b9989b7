use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A loosely typed attribute value, as carried by GraphML `<data>` entries
/// and by attribute-edit requests coming from a dialog.
///
/// Integers and floats compare by numeric value: a GraphML `double` key
/// carries both, so `Int(1)` read back as `Float(1.0)` is the same value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (AttrValue::Bool(a), AttrValue::Bool(b)) => a == b,
            (AttrValue::Int(a), AttrValue::Int(b)) => a == b,
            (AttrValue::Float(a), AttrValue::Float(b)) => a == b,
            (AttrValue::Int(i), AttrValue::Float(f))
            | (AttrValue::Float(f), AttrValue::Int(i)) => *i as f64 == *f,
            (AttrValue::Str(a), AttrValue::Str(b)) => a == b,
            _ => false,
        }
    }
}

/// Named attributes, ordered by name so exports are reproducible.
pub type AttrMap = BTreeMap<String, AttrValue>;

impl AttrValue {
    /// Numeric view; integers widen to floats and numeric strings parse.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Int(i) => Some(*i as f64),
            AttrValue::Float(f) => Some(*f),
            AttrValue::Str(s) => s.trim().parse().ok(),
            AttrValue::Bool(_) => None,
        }
    }

    /// Integral view; floats are accepted only when they carry no fraction.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            AttrValue::Float(f) if f.fract() == 0.0 && f.is_finite() => {
                Some(*f as i64)
            }
            AttrValue::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// GraphML `attr.type` used when this value is declared in a `<key>`.
    pub fn graphml_type(&self) -> &'static str {
        match self {
            AttrValue::Bool(_) => "boolean",
            AttrValue::Int(_) => "long",
            AttrValue::Float(_) => "double",
            AttrValue::Str(_) => "string",
        }
    }

    /// GraphML type able to hold values of both `a` and `b`.
    pub fn widen_type(a: &'static str, b: &'static str) -> &'static str {
        match (a, b) {
            _ if a == b => a,
            ("long", "double") | ("double", "long") => "double",
            _ => "string",
        }
    }

    /// Parse the text of a `<data>` element declared with `attr_type`.
    /// Returns `None` when the text does not fit the declared type. String
    /// text is kept verbatim, whitespace included.
    pub fn parse_typed(attr_type: &str, text: &str) -> Option<AttrValue> {
        match attr_type {
            "boolean" => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(AttrValue::Bool(true)),
                "false" | "0" => Some(AttrValue::Bool(false)),
                _ => None,
            },
            "int" | "long" => text.trim().parse().ok().map(AttrValue::Int),
            "float" | "double" => text.trim().parse().ok().map(AttrValue::Float),
            _ => Some(AttrValue::Str(text.to_string())),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Float(x) => write!(f, "{x}"),
            AttrValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

/// Build an [`AttrMap`] from `(name, value)` pairs.
pub fn attrs<I, K, V>(pairs: I) -> AttrMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<AttrValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_parsing_follows_declared_type() {
        assert_eq!(
            AttrValue::parse_typed("int", " 10 "),
            Some(AttrValue::Int(10))
        );
        assert_eq!(
            AttrValue::parse_typed("double", "0.5"),
            Some(AttrValue::Float(0.5))
        );
        assert_eq!(
            AttrValue::parse_typed("boolean", "True"),
            Some(AttrValue::Bool(true))
        );
        assert_eq!(AttrValue::parse_typed("long", "1.5"), None);
        assert_eq!(
            AttrValue::parse_typed("string", " and "),
            Some(AttrValue::Str(" and ".into()))
        );
    }

    #[test]
    fn integers_widen_to_doubles_only() {
        assert_eq!(AttrValue::widen_type("long", "double"), "double");
        assert_eq!(AttrValue::widen_type("double", "long"), "double");
        assert_eq!(AttrValue::widen_type("long", "long"), "long");
        assert_eq!(AttrValue::widen_type("boolean", "long"), "string");
        assert_eq!(AttrValue::widen_type("double", "string"), "string");
    }

    #[test]
    fn numeric_views_are_lenient_but_exact() {
        assert_eq!(AttrValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(AttrValue::Float(-1.0).as_i64(), Some(-1));
        assert_eq!(AttrValue::Float(0.5).as_i64(), None);
        assert_eq!(AttrValue::Bool(true).as_f64(), None);
    }

    #[test]
    fn numbers_compare_by_value() {
        assert_eq!(AttrValue::Int(1), AttrValue::Float(1.0));
        assert_ne!(AttrValue::Int(1), AttrValue::Float(1.5));
        assert_ne!(AttrValue::Int(1), AttrValue::from("1"));
        assert_ne!(AttrValue::Bool(true), AttrValue::Int(1));
    }

    #[test]
    fn float_display_round_trips() {
        let v = AttrValue::Float(0.1 + 0.2);
        let back = AttrValue::parse_typed("double", &v.to_string());
        assert_eq!(back, Some(v));
    }
}
