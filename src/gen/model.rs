use super::ArtifactKind;
use crate::schema::{Attribute, ObjectClass, Schema, ValueKind};
use heck::ToSnakeCase;
use serde::Serialize;

/// The model an artifact template is rendered with
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerationModel<'s> {
    pub object_class: ObjectClassView<'s>,
    /// The declared names of the object classes that can be created under
    /// this one
    pub child_object_classes: Vec<&'s str>,
    /// The attribute instances of this class are named by
    pub rdn_attribute: Option<AttributeView<'s>>,
    /// The namespace the artifact is placed in, eg `com.example.mappers`
    pub package: String,
    /// The namespace entity artifacts are placed in
    pub entity_package: String,
    pub class_name: String,
    pub parent_class_name: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ObjectClassView<'s> {
    pub name: &'s str,
    pub alternate_names: Option<&'s str>,
    pub subclass_of: Option<&'s str>,
    pub kind: Option<&'s str>,
    pub required_attributes: Vec<AttributeView<'s>>,
    pub optional_attributes: Vec<AttributeView<'s>>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AttributeView<'s> {
    pub name: &'s str,
    pub field_identifier: &'s str,
    /// A snake_case identifier that is always valid as a Rust field name
    pub field_name: String,
    pub alternate_names: Option<&'s str>,
    pub syntax: &'static str,
    pub multi_valued: bool,
    pub value_kind: ValueKind,
    pub value_type: String,
}

impl<'s> From<&'s Attribute> for AttributeView<'s> {
    fn from(attr: &'s Attribute) -> Self {
        Self {
            name: attr.name(),
            field_identifier: attr.field_identifier(),
            field_name: field_name(attr.name()),
            alternate_names: attr.alternate_names.as_deref(),
            syntax: attr.syntax.as_str(),
            multi_valued: attr.multi_valued,
            value_kind: attr.value_kind(),
            value_type: attr.value_type().rust_type(),
        }
    }
}

impl<'s> GenerationModel<'s> {
    /// Derives the model for one object class of a resolved schema
    pub fn new(
        schema: &'s Schema,
        oc: &'s ObjectClass,
        package: &str,
        kind: ArtifactKind,
    ) -> Self {
        let suffix = kind.class_suffix();
        let namespace = |kind: ArtifactKind| format!("{package}.{}", kind.namespace());

        let parent_class_name = oc
            .subclass_of
            .as_deref()
            .map(|parent| {
                format!("{}{suffix}", capitalize(schema.declared_class_name(parent)))
            });

        let mut child_object_classes = Vec::new();
        for binding in schema.schema_bindings.values() {
            if !binding.allowable_parent.eq_ignore_ascii_case(&oc.name) {
                continue;
            }

            let child = schema.declared_class_name(&binding.ldap_name);
            if !child_object_classes.contains(&child) {
                child_object_classes.push(child);
            }
        }

        let rdn_attribute = schema
            .binding_for(&oc.name)
            .and_then(|binding| schema.attribute(&binding.named_by))
            .map(|attr| AttributeView::from(attr.as_ref()));

        let mut object_class = ObjectClassView {
            name: &oc.name,
            alternate_names: oc.alternate_names.as_deref(),
            subclass_of: oc.subclass_of.as_deref(),
            kind: oc.kind.as_deref(),
            required_attributes: oc
                .required_attributes
                .iter()
                .map(|attr| attr.as_ref().into())
                .collect(),
            optional_attributes: oc
                .optional_attributes
                .iter()
                .map(|attr| attr.as_ref().into())
                .collect(),
        };
        unique_field_names(&mut object_class, parent_class_name.is_some());

        Self {
            object_class,
            child_object_classes,
            rdn_attribute,
            package: namespace(kind),
            entity_package: namespace(ArtifactKind::Entity),
            class_name: format!("{}{suffix}", capitalize(&oc.name)),
            parent_class_name,
        }
    }
}

/// Upper cases the first character
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Converts an attribute name into a valid Rust field name
pub fn field_name(name: &str) -> String {
    let snake = name.to_snake_case();

    match snake.as_str() {
        // These can't be raw identifiers
        "self" | "super" | "crate" | "_" => format!("{snake}_"),
        kw if KEYWORDS.contains(&kw) => format!("r#{snake}"),
        s if s.starts_with(|c: char| c.is_ascii_digit()) => format!("_{snake}"),
        _ => snake,
    }
}

/// The field subclasses embed their parent in
const PARENT_FIELD: &str = "parent";

/// Suffixes field names that collide with an earlier field of the same class,
/// eg `employee-id` and `employeeId` both snake case to `employee_id`
fn unique_field_names(oc: &mut ObjectClassView<'_>, has_parent: bool) {
    let mut taken = std::collections::HashSet::new();
    if has_parent {
        taken.insert(PARENT_FIELD.to_owned());
    }

    for view in oc
        .required_attributes
        .iter_mut()
        .chain(oc.optional_attributes.iter_mut())
    {
        if taken.insert(view.field_name.clone()) {
            continue;
        }

        // `r#type_2` is not a valid identifier, but `type_2` is
        let base = view
            .field_name
            .trim_start_matches("r#")
            .trim_end_matches('_')
            .to_owned();
        let mut n = 2;
        loop {
            let candidate = format!("{base}_{n}");
            if taken.insert(candidate.clone()) {
                view.field_name = candidate;
                break;
            }
            n += 1;
        }
    }
}
