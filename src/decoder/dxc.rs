//! Decoder for the DXC schema dialect
//!
//! ```text
//! set attribute employeeNumber = {
//!     name = employeeNumber
//!     syntax = caseExactString
//!     single-valued
//! };
//!
//! set object-class employee = {
//!     name = employee
//!     subclass-of person
//!     must-contain
//!         employeeNumber,
//!         cn
//!     may-contain description
//! };
//!
//! set name-binding employee-nb = {
//!     employee allowable-parent organization
//!     named-by = employeeNumber
//! };
//! ```

use super::{diags, DecodeContext, LineDecoder};
use crate::{
    diag::Coord,
    schema::{Attribute, ObjectClass, SchemaBinding, Syntax},
};

#[derive(strum::EnumString, strum::IntoStaticStr, Copy, Clone, Debug, PartialEq, Eq)]
#[strum(serialize_all = "kebab-case")]
enum BlockKind {
    Attribute,
    ObjectClass,
    SchemaBinding,
    NameBinding,
}

#[derive(Default)]
struct AttributeDecl {
    name: Option<String>,
    alternate_names: Option<String>,
    syntax: Syntax,
    multi_valued: Option<bool>,
}

#[derive(Copy, Clone)]
enum ListKind {
    Required,
    Optional,
}

#[derive(Default)]
struct ClassDecl {
    name: Option<String>,
    alternate_names: Option<String>,
    subclass_of: Option<String>,
    kind: Option<String>,
    required: Vec<String>,
    optional: Vec<String>,
    /// Set while an attribute list is continued on the following line
    list: Option<ListKind>,
}

impl ClassDecl {
    #[inline]
    fn names_mut(&mut self, list: ListKind) -> &mut Vec<String> {
        match list {
            ListKind::Required => &mut self.required,
            ListKind::Optional => &mut self.optional,
        }
    }
}

#[derive(Default)]
struct BindingDecl {
    name: Option<String>,
    ldap_name: Option<String>,
    allowable_parent: Option<String>,
    named_by: Option<String>,
}

enum Body {
    Attribute(AttributeDecl),
    ObjectClass(ClassDecl),
    Binding(BindingDecl),
    /// A block of a kind we don't care about, the depth tracks nested blocks
    Skipped(usize),
}

struct Block {
    kind: &'static str,
    origin: Coord,
    body: Body,
}

impl Block {
    fn open(kind: Option<BlockKind>, origin: Coord) -> Self {
        let body = match kind {
            Some(BlockKind::Attribute) => Body::Attribute(Default::default()),
            Some(BlockKind::ObjectClass) => Body::ObjectClass(Default::default()),
            Some(BlockKind::SchemaBinding | BlockKind::NameBinding) => {
                Body::Binding(Default::default())
            }
            None => Body::Skipped(0),
        };

        Self {
            kind: kind_name(kind),
            origin,
            body,
        }
    }
}

#[inline]
fn kind_name(kind: Option<BlockKind>) -> &'static str {
    kind.map_or("unsupported", Into::into)
}

#[derive(Default)]
enum State {
    #[default]
    Idle,
    /// A header was seen, but the opening brace is on the next line
    AwaitingBrace {
        kind: Option<BlockKind>,
        origin: Coord,
    },
    InBlock(Block),
}

/// Decodes `set <kind> <id> = { ... };` blocks of attributes, object classes
/// and schema/name bindings, skipping all other kinds of blocks
#[derive(Default)]
pub struct DxcDecoder {
    state: State,
}

impl DxcDecoder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LineDecoder for DxcDecoder {
    fn reset(&mut self) {
        self.state = State::Idle;
    }

    fn consume_line(&mut self, line: &str, ctx: &mut DecodeContext<'_>) {
        if line.is_empty() || line.starts_with('#') {
            return;
        }

        self.state = match std::mem::take(&mut self.state) {
            State::Idle => idle_line(line, ctx),
            State::AwaitingBrace { kind, origin } => {
                if line == "{" {
                    State::InBlock(Block::open(kind, origin))
                } else {
                    ctx.sink.push(diags::UnterminatedBlock {
                        kind: kind_name(kind),
                        origin,
                    });
                    idle_line(line, ctx)
                }
            }
            State::InBlock(block) => block_line(block, line, ctx),
        };
    }

    fn finish(&mut self, ctx: &mut DecodeContext<'_>) {
        let (kind, origin) = match std::mem::take(&mut self.state) {
            State::Idle => return,
            State::AwaitingBrace { kind, origin } => (kind_name(kind), origin),
            State::InBlock(block) => (block.kind, block.origin),
        };

        ctx.sink.push(diags::UnterminatedBlock { kind, origin });
    }
}

/// How a `set` statement continues after its header line
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Header {
    /// The block was opened on the same line
    Opened,
    /// The opening brace is expected on the next line
    AwaitingBrace,
    /// A single line statement, eg `set oid-prefix x = (1.2.3);`
    Statement,
}

/// Parses a `set` statement header, returning the kind of block, if it is one
/// we decode, and how the statement continues
fn parse_header(line: &str) -> Option<(Option<BlockKind>, Header)> {
    let rest = line.strip_prefix("set")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let rest = rest.trim_start();
    let (header, rest) = if let Some(rest) = rest.strip_suffix('{') {
        (Header::Opened, rest)
    } else if rest.ends_with(';') {
        (Header::Statement, rest)
    } else {
        (Header::AwaitingBrace, rest)
    };

    let kind = rest.split_whitespace().next()?;
    Some((kind.parse().ok(), header))
}

#[inline]
fn is_block_end(line: &str) -> bool {
    line == "}" || line == "};"
}

fn idle_line(line: &str, ctx: &mut DecodeContext<'_>) -> State {
    match parse_header(line) {
        Some((kind, Header::Opened)) => State::InBlock(Block::open(kind, ctx.coord())),
        Some((kind, Header::AwaitingBrace)) => State::AwaitingBrace {
            kind,
            origin: ctx.coord(),
        },
        Some((_, Header::Statement)) => State::Idle,
        None => {
            ctx.sink.push(diags::UnrecognizedLine { coord: ctx.coord() });
            State::Idle
        }
    }
}

fn block_line(mut block: Block, line: &str, ctx: &mut DecodeContext<'_>) -> State {
    if let Body::Skipped(depth) = &mut block.body {
        if is_block_end(line) {
            if *depth == 0 {
                return State::Idle;
            }
            *depth -= 1;
        } else if line.ends_with('{') {
            *depth += 1;
        }

        return State::InBlock(block);
    }

    if is_block_end(line) {
        commit(block, ctx);
        return State::Idle;
    }

    // A new declaration before the current one was closed
    if parse_header(line).is_some() {
        ctx.sink.push(diags::UnterminatedBlock {
            kind: block.kind,
            origin: block.origin,
        });
        return idle_line(line, ctx);
    }

    let recognized = match &mut block.body {
        Body::Attribute(decl) => attribute_line(decl, line, ctx),
        Body::ObjectClass(decl) => class_line(decl, line, ctx),
        Body::Binding(decl) => binding_line(decl, line),
        Body::Skipped(_) => true,
    };

    if !recognized {
        ctx.sink.push(diags::UnrecognizedLine { coord: ctx.coord() });
    }

    State::InBlock(block)
}

/// Splits an entry into its key and its raw value, entries are either
/// `key = value` or `key value`
fn split_entry(line: &str) -> (&str, &str) {
    let (key, value) = match line.split_once('=') {
        Some((key, value)) => (key.trim_end(), value.trim_start()),
        None => match line.split_once(char::is_whitespace) {
            Some((key, value)) => (key, value.trim_start()),
            None => (line, ""),
        },
    };

    (strip_terminators(key), value)
}

#[inline]
fn strip_terminators(s: &str) -> &str {
    s.trim_end_matches([';', ',']).trim_end()
}

#[inline]
fn non_empty(value: &str) -> Option<String> {
    let value = strip_terminators(value);
    (!value.is_empty()).then(|| value.to_owned())
}

/// Parses a flag, which is set if it has no value at all
#[inline]
fn flag(value: &str) -> Option<bool> {
    match strip_terminators(value) {
        "" | "true" | "TRUE" => Some(true),
        "false" | "FALSE" => Some(false),
        _ => None,
    }
}

/// Adds the comma separated names to the list, returning true if the list
/// continues on the next line
fn push_names(raw: &str, names: &mut Vec<String>) -> bool {
    let terminated = raw.ends_with(';');
    let raw = raw.trim_end_matches(';').trim_end();
    let continues = !terminated && (raw.is_empty() || raw.ends_with(','));

    names.extend(
        raw.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from),
    );

    continues
}

fn attribute_line(decl: &mut AttributeDecl, line: &str, ctx: &mut DecodeContext<'_>) -> bool {
    let (key, value) = split_entry(line);

    match key {
        "name" => decl.name = non_empty(value),
        "ldap-names" => decl.alternate_names = non_empty(value),
        "syntax" => {
            let syntax = strip_terminators(value);
            decl.syntax = match syntax.parse() {
                Ok(syntax) => syntax,
                Err(_) => {
                    ctx.sink.push(diags::UnknownSyntax {
                        syntax,
                        coord: ctx.coord(),
                    });
                    Syntax::Unspecified
                }
            };
        }
        "single-valued" => match flag(value) {
            Some(single) => decl.multi_valued = Some(!single),
            None => return false,
        },
        "multi-valued" => match flag(value) {
            Some(multi) => decl.multi_valued = Some(multi),
            None => return false,
        },
        _ => return false,
    }

    true
}

fn class_line(decl: &mut ClassDecl, line: &str, ctx: &mut DecodeContext<'_>) -> bool {
    if let Some(list) = decl.list.take() {
        if push_names(line, decl.names_mut(list)) {
            decl.list = Some(list);
        }
        return true;
    }

    let (key, value) = split_entry(line);

    match key {
        "name" => decl.name = non_empty(value),
        "ldap-names" => decl.alternate_names = non_empty(value),
        "kind" => decl.kind = non_empty(value),
        "subclass-of" => {
            for parent in strip_terminators(value)
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
            {
                match &decl.subclass_of {
                    Some(kept) => ctx.sink.push(diags::RedundantParent {
                        kept,
                        ignored: parent,
                        coord: ctx.coord(),
                    }),
                    None => decl.subclass_of = Some(parent.to_owned()),
                }
            }
        }
        "must-contain" | "may-contain" => {
            let list = if key == "must-contain" {
                ListKind::Required
            } else {
                ListKind::Optional
            };

            if push_names(value, decl.names_mut(list)) {
                decl.list = Some(list);
            }
        }
        _ => return false,
    }

    true
}

fn binding_line(decl: &mut BindingDecl, line: &str) -> bool {
    let (key, value) = split_entry(line);

    match key {
        "name" => decl.name = non_empty(value),
        "ldap-name" => decl.ldap_name = non_empty(value),
        "allowable-parent" => decl.allowable_parent = non_empty(value),
        "named-by" => decl.named_by = non_empty(value),
        ldap_name => {
            // <ldap-name> allowable-parent <parent>
            let Some(("allowable-parent", parent)) = value.split_once(char::is_whitespace)
            else {
                return false;
            };

            decl.ldap_name = non_empty(ldap_name);
            decl.allowable_parent = non_empty(parent.trim());
        }
    }

    true
}

/// Adds the declaration in a closed block to the schema
fn commit(block: Block, ctx: &mut DecodeContext<'_>) {
    let Block { kind, origin, body } = block;

    let incomplete = |missing: Vec<&'static str>| diags::IncompleteDeclaration {
        kind,
        missing,
        origin: origin.clone(),
    };

    match body {
        Body::Attribute(decl) => {
            let Some(name) = decl.name else {
                ctx.sink.push(incomplete(vec!["name"]));
                return;
            };

            log::debug!("decoded attribute '{name}'");

            let mut attr = Attribute::new(name);
            attr.alternate_names = decl.alternate_names;
            attr.syntax = decl.syntax;
            attr.multi_valued = decl.multi_valued.unwrap_or(true);
            attr.origin = Some(origin);
            ctx.schema.add_attribute(attr);
        }
        Body::ObjectClass(decl) => {
            let Some(name) = decl.name else {
                ctx.sink.push(incomplete(vec!["name"]));
                return;
            };

            log::debug!("decoded object class '{name}'");

            let mut oc = ObjectClass::new(name);
            oc.alternate_names = decl.alternate_names;
            oc.subclass_of = decl.subclass_of;
            oc.kind = decl.kind;
            for name in decl.required {
                oc.add_required_attribute_name(name);
            }
            for name in decl.optional {
                oc.add_optional_attribute_name(name);
            }
            oc.origin = Some(origin);
            ctx.schema.add_object_class(oc);
        }
        Body::Binding(decl) => {
            let missing = [
                ("ldap-name", decl.ldap_name.is_none()),
                ("allowable-parent", decl.allowable_parent.is_none()),
                ("named-by", decl.named_by.is_none()),
            ]
            .into_iter()
            .filter_map(|(key, missing)| missing.then_some(key))
            .collect();

            let (Some(ldap_name), Some(allowable_parent), Some(named_by)) =
                (decl.ldap_name, decl.allowable_parent, decl.named_by)
            else {
                ctx.sink.push(incomplete(missing));
                return;
            };

            log::debug!("decoded binding for '{ldap_name}'");

            ctx.schema.add_binding(SchemaBinding {
                binding_name: decl.name.unwrap_or_else(|| ldap_name.clone()),
                ldap_name,
                allowable_parent,
                named_by,
                origin: Some(origin),
            });
        }
        Body::Skipped(_) => {}
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        decoder::decode_lines,
        diag::{Files, Severity, Sink},
        schema::Schema,
    };

    fn decode(source: &str) -> (Schema, Sink, Files) {
        let mut files = Files::new();
        let file = files.add("test.dxc", source);

        let mut schema = Schema::new();
        let mut sink = Sink::new();
        let mut decoder = DxcDecoder::new();

        decode_lines(&mut decoder, file, source, &mut schema, &mut sink);
        decoder.finish(&mut DecodeContext {
            schema: &mut schema,
            sink: &mut sink,
            file,
            span: source.len()..source.len(),
        });

        (schema, sink, files)
    }

    fn codes(sink: &Sink) -> Vec<&str> {
        sink.iter().filter_map(|d| d.code.as_deref()).collect()
    }

    #[test]
    fn decodes_attributes() {
        let source = r#"
# leading comment
set attribute employeeNumber = {
    name = employeeNumber
    ldap-names = employeeNumber, empNo;
    syntax = caseExactString
    single-valued
};

set attribute photo = {
    name = jpegPhoto
    syntax = JPEG;
};
"#;

        let (schema, sink, files) = decode(source);
        assert!(sink.is_empty(), "{:?}", codes(&sink));

        let emp = schema.attribute("employeenumber").unwrap();
        assert_eq!(emp.name(), "employeeNumber");
        assert_eq!(emp.alternate_names.as_deref(), Some("employeeNumber, empNo"));
        assert_eq!(emp.syntax, Syntax::CaseExactString);
        assert!(!emp.multi_valued);

        let origin = emp.origin.clone().unwrap();
        assert_eq!(
            &files.source(origin.file)[origin.span],
            "set attribute employeeNumber = {"
        );

        let photo = schema.attribute("jpegPhoto").unwrap();
        assert_eq!(photo.syntax, Syntax::Jpeg);
        assert!(photo.multi_valued);
    }

    #[test]
    fn decodes_object_classes() {
        let source = r#"
set object-class employee =
{
    name = employee
    subclass-of person, top
    kind = structural
    must-contain
        employeeNumber,
        cn,
        employeeNumber
    may-contain description, manager,
        telephoneNumber;
    ldap-names = employee
};
"#;

        let (schema, sink, _) = decode(source);
        assert_eq!(codes(&sink), ["redundant-parent"]);

        let [oc] = schema.object_classes.as_slice() else {
            panic!("expected a single object class");
        };

        assert_eq!(oc.name, "employee");
        assert_eq!(oc.subclass_of.as_deref(), Some("person"));
        assert_eq!(oc.kind.as_deref(), Some("structural"));
        assert_eq!(oc.alternate_names.as_deref(), Some("employee"));
        assert_eq!(
            oc.required_attribute_names.iter().collect::<Vec<_>>(),
            ["employeeNumber", "cn"]
        );
        assert_eq!(
            oc.optional_attribute_names.iter().collect::<Vec<_>>(),
            ["description", "manager", "telephoneNumber"]
        );
    }

    #[test]
    fn decodes_bindings() {
        let source = r#"
set name-binding employee-nb = {
    employee allowable-parent organization
    named-by = employeeNumber
};

set schema-binding person-binding = {
    name = person-binding
    ldap-name = person
    allowable-parent = organization
    named-by = cn;
};
"#;

        let (schema, sink, _) = decode(source);
        assert!(sink.is_empty(), "{:?}", codes(&sink));

        let employee = schema.binding_for("employee").unwrap();
        assert_eq!(employee.binding_name, "employee");
        assert_eq!(employee.allowable_parent, "organization");
        assert_eq!(employee.named_by, "employeeNumber");

        let person = schema.binding_for("person").unwrap();
        assert_eq!(person.binding_name, "person-binding");
        assert_eq!(person.named_by, "cn");
    }

    #[test]
    fn skips_unsupported_blocks() {
        let source = r#"
set context "Corporate" = {
    managed-by = {
        dsa = "admin"
    }
    name = nope
};

set attribute cn = {
    name = cn
};
"#;

        let (schema, sink, _) = decode(source);
        assert!(sink.is_empty(), "{:?}", codes(&sink));
        assert_eq!(schema.attributes.len(), 1);
        assert!(schema.object_classes.is_empty());
    }

    #[test]
    fn skips_single_line_statements() {
        let source = r#"
set oid-prefix dxcPrefix = (1.3.6.1.4.1.3327);
set attribute cn = {
    name = cn
};
set oid-prefix other = (1.2.3);
"#;

        let (schema, sink, _) = decode(source);
        assert!(sink.is_empty(), "{:?}", codes(&sink));
        assert_eq!(schema.attributes.len(), 1);
    }

    #[test]
    fn tolerates_malformed_declarations() {
        let source = r#"
source "other.dxc";
set attribute missing-name = {
    syntax = telephoneNumber
};

set name-binding partial = {
    ldap-name = person
    sort-order = ascending
};

set object-class dangling = {
    name = dangling
"#;

        let (schema, sink, _) = decode(source);

        assert_eq!(
            codes(&sink),
            [
                "unrecognized-line",
                "unknown-syntax",
                "incomplete-declaration",
                "unrecognized-line",
                "incomplete-declaration",
                "unterminated-block",
            ]
        );
        assert_eq!(sink.count(Severity::Warning), 3);

        let binding = sink
            .with_code("incomplete-declaration")
            .nth(1)
            .unwrap();
        assert_eq!(
            binding.message,
            "name-binding declaration is missing 'allowable-parent', 'named-by' and was ignored"
        );

        assert!(schema.attributes.is_empty());
        assert!(schema.object_classes.is_empty());
        assert!(schema.schema_bindings.is_empty());
    }

    #[test]
    fn reset_drops_open_blocks() {
        let mut decoder = DxcDecoder::new();
        let mut schema = Schema::new();
        let mut sink = Sink::new();

        decode_lines(
            &mut decoder,
            0,
            "set attribute cn = {\n  name = cn\n",
            &mut schema,
            &mut sink,
        );
        decoder.reset();
        decoder.finish(&mut DecodeContext {
            schema: &mut schema,
            sink: &mut sink,
            file: 0,
            span: 0..0,
        });

        assert!(sink.is_empty());
        assert!(schema.attributes.is_empty());
    }
}
