use crate::diag::Coord;
use serde::Serialize;

/// The syntaxes an attribute value can be declared with
///
/// Anything the schema declares that isn't one of the known syntaxes is
/// [`Syntax::Unspecified`] and is treated as an opaque value
#[derive(
    strum::EnumString,
    strum::IntoStaticStr,
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
)]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
#[serde(rename_all = "camelCase")]
pub enum Syntax {
    CaseExactString,
    CaseIgnoreString,
    DistinguishedName,
    #[strum(to_string = "octetString", serialize = "octetStringMatch")]
    OctetString,
    Binary,
    GeneralizedTime,
    Integer,
    Boolean,
    Jpeg,
    #[default]
    #[strum(disabled)]
    Unspecified,
}

impl Syntax {
    /// The kind of value the syntax maps to in generated code
    pub fn value_kind(self) -> ValueKind {
        match self {
            Self::CaseExactString | Self::CaseIgnoreString | Self::DistinguishedName => {
                ValueKind::Text
            }
            Self::OctetString | Self::Binary => ValueKind::Bytes,
            Self::GeneralizedTime
            | Self::Integer
            | Self::Boolean
            | Self::Jpeg
            | Self::Unspecified => ValueKind::Object,
        }
    }

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            other => other.into(),
        }
    }
}

/// The semantic kind of an attribute's value
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueKind {
    Text,
    Bytes,
    Object,
}

impl ValueKind {
    /// The Rust type a single value of this kind is generated as
    #[inline]
    pub fn rust_type(self) -> &'static str {
        match self {
            Self::Text => "String",
            Self::Bytes => "Vec<u8>",
            Self::Object => "AttributeValue",
        }
    }
}

/// The effective type of an attribute, ie. its value kind, and whether the
/// attribute holds a sequence of them
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ValueType {
    pub kind: ValueKind,
    pub sequence: bool,
}

impl ValueType {
    pub fn rust_type(self) -> String {
        let single = self.kind.rust_type();
        if self.sequence {
            format!("Vec<{single}>")
        } else {
            single.to_owned()
        }
    }
}

/// A directory attribute
#[derive(Clone, Debug)]
pub struct Attribute {
    name: String,
    field_identifier: String,
    /// The raw secondary names the attribute was declared with
    pub alternate_names: Option<String>,
    pub syntax: Syntax,
    pub multi_valued: bool,
    /// Where the attribute was declared, [`None`] for synthesized attributes
    pub origin: Option<Coord>,
}

impl Attribute {
    /// Creates a multi-valued attribute with an unspecified syntax
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        debug_assert!(!name.is_empty(), "attribute names can't be empty");

        Self {
            field_identifier: field_identifier(&name),
            name,
            alternate_names: None,
            syntax: Syntax::Unspecified,
            multi_valued: true,
            origin: None,
        }
    }

    /// Creates the attribute used for a name that is referenced by an object
    /// class but never declared in the schema
    pub fn synthesized(reference: &str) -> Self {
        Self {
            alternate_names: Some(reference.to_owned()),
            syntax: Syntax::CaseIgnoreString,
            multi_valued: false,
            ..Self::new(reference)
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn field_identifier(&self) -> &str {
        &self.field_identifier
    }

    /// The key the attribute is registered under in the schema
    #[inline]
    pub fn key(&self) -> String {
        super::fold(&self.name)
    }

    #[inline]
    pub fn value_kind(&self) -> ValueKind {
        self.syntax.value_kind()
    }

    #[inline]
    pub fn value_type(&self) -> ValueType {
        ValueType {
            kind: self.value_kind(),
            sequence: self.multi_valued,
        }
    }
}

/// `-` are replaced with `_` and the first character is lower cased
fn field_identifier(name: &str) -> String {
    let replaced = name.replace('-', "_");
    let mut chars = replaced.chars();

    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => replaced,
    }
}
