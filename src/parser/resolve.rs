use crate::{
    diag::{Coord, Diagnostic, Severity, Sink},
    schema::{fold, Attribute, ObjectClass, Schema},
};
use indexmap::IndexMap;
use std::rc::Rc;

#[derive(
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Code {
    SynthesizedAttribute,
}

impl From<Code> for String {
    fn from(c: Code) -> Self {
        c.to_string()
    }
}

struct SynthesizedAttribute<'a> {
    name: &'a str,
    object_class: &'a str,
    origin: Option<Coord>,
}

impl<'a> From<SynthesizedAttribute<'a>> for Diagnostic {
    fn from(sa: SynthesizedAttribute<'a>) -> Self {
        let diag = Diagnostic::new(Severity::Warning)
            .with_message(format!(
                "attribute '{}' referenced by object class '{}' is not declared",
                sa.name, sa.object_class
            ))
            .with_code(Code::SynthesizedAttribute)
            .with_notes(vec![
                "a single-valued caseIgnoreString attribute was synthesized in its place".to_owned(),
            ]);

        match sa.origin {
            Some(origin) => diag.with_labels(vec![origin
                .into_label()
                .with_message("object class declared here")]),
            None => diag,
        }
    }
}

/// Links every attribute name referenced by an object class to an attribute
/// in the schema, synthesizing attributes for names that were never declared
pub fn resolve(schema: &mut Schema, sink: &mut Sink) {
    let Schema {
        attributes,
        object_classes,
        ..
    } = schema;

    for oc in object_classes.iter_mut() {
        let (required, optional) = {
            let oc: &ObjectClass = oc;
            let mut link = |name: &String| lookup_or_synthesize(attributes, name, oc, sink);

            let required: Vec<_> = oc.required_attribute_names.iter().map(&mut link).collect();
            let optional: Vec<_> = oc.optional_attribute_names.iter().map(&mut link).collect();
            (required, optional)
        };

        for attr in required {
            oc.add_required_attribute(attr);
        }
        for attr in optional {
            oc.add_optional_attribute(attr);
        }
    }
}

fn lookup_or_synthesize(
    attributes: &mut IndexMap<String, Rc<Attribute>>,
    name: &str,
    oc: &ObjectClass,
    sink: &mut Sink,
) -> Rc<Attribute> {
    let key = fold(name);
    if let Some(attr) = attributes.get(&key) {
        return attr.clone();
    }

    // Registered before it is handed out so that later references to the
    // same name get this instance
    let attr = Rc::new(Attribute::synthesized(name));
    attributes.insert(key, attr.clone());

    sink.push(SynthesizedAttribute {
        name,
        object_class: &oc.name,
        origin: oc.origin.clone(),
    });

    attr
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::schema::Syntax;

    fn class(name: &str, required: &[&str], optional: &[&str]) -> ObjectClass {
        let mut oc = ObjectClass::new(name);
        for name in required {
            oc.add_required_attribute_name(*name);
        }
        for name in optional {
            oc.add_optional_attribute_name(*name);
        }
        oc
    }

    #[test]
    fn synthesizes_undeclared_attributes_once() {
        let mut schema = Schema::new();
        schema.add_object_class(class("Person", &["cn"], &[]));
        schema.add_object_class(class("organizationalPerson", &["CN"], &["cn"]));

        let mut sink = Sink::new();
        resolve(&mut schema, &mut sink);

        assert_eq!(sink.len(), 1);
        assert_eq!(
            sink.iter().next().unwrap().message,
            "attribute 'cn' referenced by object class 'Person' is not declared"
        );

        let cn = schema.attribute("cn").unwrap();
        assert_eq!(cn.syntax, Syntax::CaseIgnoreString);
        assert!(!cn.multi_valued);

        let person = &schema.object_classes[0];
        let org_person = &schema.object_classes[1];
        assert!(Rc::ptr_eq(&person.required_attributes[0], cn));
        assert!(Rc::ptr_eq(&org_person.required_attributes[0], cn));
        assert!(Rc::ptr_eq(&org_person.optional_attributes[0], cn));
    }

    #[test]
    fn prefers_declared_attributes() {
        let mut schema = Schema::new();
        let mut mail = Attribute::new("mail");
        mail.syntax = Syntax::CaseExactString;
        let mail = schema.add_attribute(mail);

        schema.add_object_class(class("person", &[], &["Mail", "description"]));

        let mut sink = Sink::new();
        resolve(&mut schema, &mut sink);

        assert_eq!(sink.with_code("synthesized-attribute").count(), 1);

        let person = &schema.object_classes[0];
        assert_eq!(person.optional_attributes.len(), 2);
        assert!(Rc::ptr_eq(&person.optional_attributes[0], &mail));
        assert_eq!(person.optional_attributes[1].name(), "description");
        assert!(schema.is_resolved());
    }

    #[test]
    fn resolving_twice_is_stable() {
        let mut schema = Schema::new();
        schema.add_object_class(class("person", &["cn", "sn"], &["description"]));

        let mut sink = Sink::new();
        resolve(&mut schema, &mut sink);
        assert_eq!(sink.len(), 3);

        resolve(&mut schema, &mut sink);
        assert_eq!(sink.len(), 3, "synthesized attributes are permanent");

        let person = &schema.object_classes[0];
        assert_eq!(person.required_attributes.len(), 2);
        assert_eq!(person.optional_attributes.len(), 1);
        assert_eq!(schema.attributes.len(), 3);
    }
}
