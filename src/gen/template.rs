use super::{model::GenerationModel, ArtifactKind, Settings};
use crate::Path;
use anyhow::Context as _;
use handlebars::{handlebars_helper, Handlebars};
use heck::{ToSnakeCase, ToUpperCamelCase};

const DEFAULT_ENTITY: &str = include_str!("../../templates/entity.hbs");
const DEFAULT_MAPPER: &str = include_str!("../../templates/mapper.hbs");

/// The template sources for each kind of artifact
pub struct Templates {
    entity: String,
    mapper: String,
}

impl Templates {
    /// Loads the templates, using the builtin default for each kind of
    /// artifact that doesn't have an override
    ///
    /// Overrides are read even if that kind of artifact is disabled, failing
    /// to read one fails the entire load
    pub fn load(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self {
            entity: load(
                settings.entity_template.as_deref(),
                DEFAULT_ENTITY,
                ArtifactKind::Entity,
            )?,
            mapper: load(
                settings.mapper_template.as_deref(),
                DEFAULT_MAPPER,
                ArtifactKind::Mapper,
            )?,
        })
    }

    /// Creates templates from in-memory sources
    pub fn from_sources(entity: impl Into<String>, mapper: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            mapper: mapper.into(),
        }
    }

    #[inline]
    pub fn get(&self, kind: ArtifactKind) -> &str {
        match kind {
            ArtifactKind::Entity => &self.entity,
            ArtifactKind::Mapper => &self.mapper,
        }
    }
}

impl Default for Templates {
    fn default() -> Self {
        Self::from_sources(DEFAULT_ENTITY, DEFAULT_MAPPER)
    }
}

fn load(path: Option<&Path>, default: &str, kind: ArtifactKind) -> anyhow::Result<String> {
    let Some(path) = path else {
        return Ok(default.to_owned());
    };

    log::info!("loading {kind} template from {path}");
    fs::read_to_string(path).with_context(|| format!("failed to read {kind} template '{path}'"))
}

/// Turns a generation model into source text
pub trait Renderer {
    fn render(&self, template: &str, model: &GenerationModel<'_>) -> anyhow::Result<String>;
}

impl<F> Renderer for F
where
    F: Fn(&str, &GenerationModel<'_>) -> anyhow::Result<String>,
{
    #[inline]
    fn render(&self, template: &str, model: &GenerationModel<'_>) -> anyhow::Result<String> {
        self(template, model)
    }
}

handlebars_helper!(capitalize: |s: str| super::model::capitalize(s));
handlebars_helper!(snake_case: |s: str| s.to_snake_case());
handlebars_helper!(upper_camel_case: |s: str| s.to_upper_camel_case());
// The last segment of a dotted namespace
handlebars_helper!(module_name: |s: str| s.rsplit('.').next().unwrap_or(s).to_owned());

/// Renders handlebars templates
///
/// The registry is in strict mode, so a template referencing a field the
/// model doesn't have fails to render, and output is never HTML escaped
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
}

impl HandlebarsRenderer {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        registry.register_helper("capitalize", Box::new(capitalize));
        registry.register_helper("snake_case", Box::new(snake_case));
        registry.register_helper("upper_camel_case", Box::new(upper_camel_case));
        registry.register_helper("module_name", Box::new(module_name));

        Self { registry }
    }
}

impl Default for HandlebarsRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for HandlebarsRenderer {
    fn render(&self, template: &str, model: &GenerationModel<'_>) -> anyhow::Result<String> {
        Ok(self.registry.render_template(template, model)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        gen::GenerationModel,
        schema::{Attribute, ObjectClass, Schema, Syntax},
    };

    fn schema() -> Schema {
        let mut schema = Schema::new();

        let mut cn = Attribute::new("cn");
        cn.syntax = Syntax::CaseIgnoreString;
        cn.multi_valued = false;
        let cn = schema.add_attribute(cn);

        let mut photo = Attribute::new("jpegPhoto");
        photo.syntax = Syntax::Jpeg;
        let photo = schema.add_attribute(photo);

        let mut oc = ObjectClass::new("employee");
        oc.subclass_of = Some("person".to_owned());
        oc.add_required_attribute(cn);
        oc.add_optional_attribute(photo);
        schema.add_object_class(oc);

        schema
    }

    #[test]
    fn renders_models() {
        let schema = schema();
        let model = GenerationModel::new(
            &schema,
            &schema.object_classes[0],
            "com.example",
            ArtifactKind::Mapper,
        );

        let rendered = HandlebarsRenderer::new()
            .render(
                "{{package}}::{{className}}<{{parentClassName}}>{{#each objectClass.requiredAttributes}} {{fieldName}}: {{valueType}}{{/each}}{{#each objectClass.optionalAttributes}} {{fieldName}}: Option<{{valueType}}>{{/each}}",
                &model,
            )
            .unwrap();

        insta::assert_snapshot!(rendered, @"com.example.mappers::EmployeeMapper<PersonMapper> cn: String jpeg_photo: Option<Vec<AttributeValue>>");
    }

    #[test]
    fn helpers() {
        let schema = schema();
        let model = GenerationModel::new(
            &schema,
            &schema.object_classes[0],
            "com.example",
            ArtifactKind::Entity,
        );

        let rendered = HandlebarsRenderer::new()
            .render(
                r#"{{capitalize objectClass.name}} {{snake_case "employeeNumber"}} {{upper_camel_case "dxc-user"}} {{module_name package}}"#,
                &model,
            )
            .unwrap();

        assert_eq!(rendered, "Employee employee_number DxcUser types");
    }

    #[test]
    fn missing_fields_fail() {
        let schema = schema();
        let model = GenerationModel::new(
            &schema,
            &schema.object_classes[0],
            "com.example",
            ArtifactKind::Entity,
        );

        assert!(HandlebarsRenderer::new()
            .render("{{className}} {{tableName}}", &model)
            .is_err());
    }

    #[test]
    fn output_is_not_escaped() {
        let schema = schema();
        let model = GenerationModel::new(
            &schema,
            &schema.object_classes[0],
            "com.example",
            ArtifactKind::Entity,
        );

        let rendered = HandlebarsRenderer::new()
            .render(
                "{{#each objectClass.optionalAttributes}}{{valueType}}{{/each}}",
                &model,
            )
            .unwrap();

        assert_eq!(rendered, "Vec<AttributeValue>");
    }

    #[test]
    fn default_templates_render() {
        let schema = schema();
        let templates = Templates::default();
        let renderer = HandlebarsRenderer::new();

        for kind in [ArtifactKind::Entity, ArtifactKind::Mapper] {
            let model =
                GenerationModel::new(&schema, &schema.object_classes[0], "com.example", kind);

            let rendered = renderer.render(templates.get(kind), &model).unwrap();
            assert!(rendered.contains(&model.class_name), "{rendered}");
        }
    }

    #[test]
    fn unreadable_overrides_fail() {
        let td = tempfile::tempdir().unwrap();
        let missing = crate::PathBuf::from_path_buf(td.path().join("nope.hbs")).unwrap();

        let mut settings = Settings::new(
            crate::PathBuf::from_path_buf(td.path().to_owned()).unwrap(),
            "com.example",
        );
        settings.generate_mappers = false;
        settings.mapper_template = Some(missing.clone());

        let err = Templates::load(&settings).err().unwrap();
        assert_eq!(
            err.to_string(),
            format!("failed to read mapper template '{missing}'")
        );
    }
}
