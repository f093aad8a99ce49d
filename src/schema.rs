//! The in-memory model of a directory schema

mod attribute;
mod binding;
mod object_class;

pub use attribute::{Attribute, Syntax, ValueKind, ValueType};
pub use binding::SchemaBinding;
pub use object_class::ObjectClass;

use indexmap::IndexMap;
use std::rc::Rc;

/// Folds a name into the key used for case-insensitive lookups
#[inline]
pub(crate) fn fold(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// The aggregate of every declaration parsed from one or more schema files
#[derive(Default, Debug)]
pub struct Schema {
    /// Keyed by the lower cased attribute name
    pub attributes: IndexMap<String, Rc<Attribute>>,
    /// In parse order, duplicate names are kept as separate entries
    pub object_classes: Vec<ObjectClass>,
    /// Keyed by the name of the bound object class, as it was parsed
    pub schema_bindings: IndexMap<String, SchemaBinding>,
}

impl Schema {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an attribute, replacing any previous attribute whose name
    /// only differs by case
    pub fn add_attribute(&mut self, attr: Attribute) -> Rc<Attribute> {
        let attr = Rc::new(attr);
        self.attributes.insert(attr.key(), attr.clone());
        attr
    }

    /// Case-insensitive attribute lookup
    #[inline]
    pub fn attribute(&self, name: &str) -> Option<&Rc<Attribute>> {
        self.attributes.get(&fold(name))
    }

    #[inline]
    pub fn add_object_class(&mut self, oc: ObjectClass) {
        self.object_classes.push(oc);
    }

    /// Registers a binding, replacing any previous binding for the same
    /// object class
    #[inline]
    pub fn add_binding(&mut self, binding: SchemaBinding) {
        self.schema_bindings
            .insert(binding.ldap_name.clone(), binding);
    }

    /// Gets the binding for the object class, the name must match exactly
    #[inline]
    pub fn binding_for(&self, object_class: &str) -> Option<&SchemaBinding> {
        self.schema_bindings.get(object_class)
    }

    /// Resolves a reference to an object class to the name of the first
    /// declared object class that matches it case-insensitively, or the
    /// reference itself if nothing matches
    pub fn declared_class_name<'s>(&'s self, reference: &'s str) -> &'s str {
        self.object_classes
            .iter()
            .find(|oc| oc.name.eq_ignore_ascii_case(reference))
            .map_or(reference, |oc| oc.name.as_str())
    }

    /// True if every attribute name referenced by an object class has a
    /// registered attribute
    pub fn is_resolved(&self) -> bool {
        self.object_classes.iter().all(|oc| {
            oc.required_attribute_names
                .iter()
                .chain(oc.optional_attribute_names.iter())
                .all(|name| self.attribute(name).is_some())
        })
    }
}
