use crate::error::MalformedAsset;

/// A typed Tiled custom property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Plain text; the default when no `type` is given
    String(String),
    /// `int`
    Int(i64),
    /// `float`
    Float(f64),
    /// `bool`, written as `true`/`false`
    Bool(bool),
    /// `#AARRGGBB` as authored, or empty for "no colour"
    Color(String),
    /// Path relative to the owning descriptor
    File(String),
    /// Object id, 0 meaning "none"
    Object(u32),
    /// Custom class instance with nested members
    Class {
        /// Name of the custom type (`propertytype`)
        property_type: Option<String>,
        /// Member values
        properties: Properties,
    },
}

impl PropertyValue {
    /// Tiled's name for this value's type, as written in the `type` attribute.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::String(_) => "string",
            PropertyValue::Int(_) => "int",
            PropertyValue::Float(_) => "float",
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Color(_) => "color",
            PropertyValue::File(_) => "file",
            PropertyValue::Object(_) => "object",
            PropertyValue::Class { .. } => "class",
        }
    }

    /// Parses the attribute form of a scalar property.
    ///
    /// `kind` is the `type` attribute; `None` means `string`. Class values
    /// carry nested properties and are built by the readers directly.
    pub fn parse_scalar(name: &str, kind: Option<&str>, raw: &str) -> Result<Self, MalformedAsset> {
        let invalid = |kind: &str| MalformedAsset::InvalidPropertyValue {
            name: name.to_owned(),
            kind: kind.to_owned(),
            value: raw.to_owned(),
        };

        match kind.unwrap_or("string") {
            "string" => Ok(PropertyValue::String(raw.to_owned())),
            "int" => raw.parse().map(PropertyValue::Int).map_err(|_| invalid("int")),
            "float" => raw.parse().map(PropertyValue::Float).map_err(|_| invalid("float")),
            "bool" => match raw {
                "true" => Ok(PropertyValue::Bool(true)),
                "false" => Ok(PropertyValue::Bool(false)),
                _ => Err(invalid("bool")),
            },
            "color" => Ok(PropertyValue::Color(raw.to_owned())),
            "file" => Ok(PropertyValue::File(raw.to_owned())),
            "object" => raw.parse().map(PropertyValue::Object).map_err(|_| invalid("object")),
            other => Err(MalformedAsset::UnsupportedPropertyType {
                name: name.to_owned(),
                kind: other.to_owned(),
            }),
        }
    }

    /// The attribute form of a scalar value. `None` for class values.
    pub fn to_attribute(&self) -> Option<String> {
        match self {
            PropertyValue::String(s) | PropertyValue::Color(s) | PropertyValue::File(s) => {
                Some(s.clone())
            }
            PropertyValue::Int(v) => Some(v.to_string()),
            PropertyValue::Float(v) => Some(v.to_string()),
            PropertyValue::Bool(v) => Some(v.to_string()),
            PropertyValue::Object(v) => Some(v.to_string()),
            PropertyValue::Class { .. } => None,
        }
    }
}

/// Named properties in authoring order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    entries: Vec<(String, PropertyValue)>,
}

impl Properties {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces `name`, keeping the original position on replace.
    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Value of `name`, whatever its type.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// `name` as a string. Other types yield `None`, as do the remaining typed getters.
    pub fn get_string(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// `name` as a bool.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// `name` as an integer.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            PropertyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// `None` when the stored integer does not fit in an `i32`.
    pub fn get_i32(&self, name: &str) -> Option<i32> {
        self.get_i64(name).and_then(|v| i32::try_from(v).ok())
    }

    /// Narrowed from the stored `f64`.
    pub fn get_f32(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            PropertyValue::Float(v) => Some(*v as f32),
            _ => None,
        }
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when nothing is set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in authoring order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl FromIterator<(String, PropertyValue)> for Properties {
    fn from_iter<I: IntoIterator<Item = (String, PropertyValue)>>(iter: I) -> Self {
        let mut out = Properties::new();
        for (name, value) in iter {
            out.insert(name, value);
        }
        out
    }
}
