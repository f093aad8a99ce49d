use super::Attribute;
use crate::diag::Coord;
use indexmap::IndexSet;
use std::rc::Rc;

/// A directory object class
#[derive(Clone, Debug, Default)]
pub struct ObjectClass {
    pub name: String,
    pub alternate_names: Option<String>,
    /// The parent class, as referenced, this might not match the casing of
    /// the class that is actually declared
    pub subclass_of: Option<String>,
    /// structural, auxiliary, abstract...
    pub kind: Option<String>,
    /// Attribute names in the order they were first seen
    pub required_attribute_names: IndexSet<String>,
    pub optional_attribute_names: IndexSet<String>,
    /// Filled in by the resolution pass
    pub required_attributes: Vec<Rc<Attribute>>,
    pub optional_attributes: Vec<Rc<Attribute>>,
    pub origin: Option<Coord>,
}

impl ObjectClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[inline]
    pub fn add_required_attribute_name(&mut self, name: impl Into<String>) {
        self.required_attribute_names.insert(name.into());
    }

    #[inline]
    pub fn add_optional_attribute_name(&mut self, name: impl Into<String>) {
        self.optional_attribute_names.insert(name.into());
    }

    #[inline]
    pub fn add_required_attribute(&mut self, attr: Rc<Attribute>) {
        insert_unique(&mut self.required_attributes, attr);
    }

    #[inline]
    pub fn add_optional_attribute(&mut self, attr: Rc<Attribute>) {
        insert_unique(&mut self.optional_attributes, attr);
    }

    /// All of the resolved attributes, required first
    pub fn attributes(&self) -> impl Iterator<Item = &Rc<Attribute>> {
        self.required_attributes
            .iter()
            .chain(self.optional_attributes.iter())
    }
}

/// The resolved sets hold each attribute instance once, two names that only
/// differ by case resolve to the same attribute
fn insert_unique(set: &mut Vec<Rc<Attribute>>, attr: Rc<Attribute>) {
    if !set.iter().any(|existing| Rc::ptr_eq(existing, &attr)) {
        set.push(attr);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names_keep_first_seen_order() {
        let mut oc = ObjectClass::new("person");
        oc.add_required_attribute_name("sn");
        oc.add_required_attribute_name("cn");
        oc.add_required_attribute_name("sn");
        oc.add_optional_attribute_name("description");

        assert_eq!(
            oc.required_attribute_names.iter().collect::<Vec<_>>(),
            ["sn", "cn"]
        );
        assert_eq!(oc.optional_attribute_names.len(), 1);
    }

    #[test]
    fn resolved_sets_are_identity_sets() {
        let cn = Rc::new(Attribute::new("cn"));
        let other_cn = Rc::new(Attribute::new("cn"));

        let mut oc = ObjectClass::new("person");
        oc.add_required_attribute(cn.clone());
        oc.add_required_attribute(cn.clone());
        oc.add_required_attribute(other_cn);

        assert_eq!(oc.required_attributes.len(), 2);
        assert!(Rc::ptr_eq(&oc.required_attributes[0], &cn));
    }
}
