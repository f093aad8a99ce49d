use crate::diag::{Coord, Diagnostic, Severity};

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
    IncompleteDeclaration,
    RedundantParent,
    UnknownSyntax,
    UnrecognizedLine,
    UnterminatedBlock,
}

impl From<Code> for String {
    fn from(c: Code) -> Self {
        c.to_string()
    }
}

pub(crate) struct IncompleteDeclaration {
    pub(crate) kind: &'static str,
    pub(crate) missing: Vec<&'static str>,
    pub(crate) origin: Coord,
}

impl From<IncompleteDeclaration> for Diagnostic {
    fn from(id: IncompleteDeclaration) -> Self {
        Diagnostic::new(Severity::Warning)
            .with_message(format!(
                "{} declaration is missing '{}' and was ignored",
                id.kind,
                id.missing.join("', '")
            ))
            .with_code(Code::IncompleteDeclaration)
            .with_labels(vec![id
                .origin
                .into_label()
                .with_message("declaration started here")])
    }
}

pub(crate) struct RedundantParent<'p> {
    pub(crate) kept: &'p str,
    pub(crate) ignored: &'p str,
    pub(crate) coord: Coord,
}

impl<'p> From<RedundantParent<'p>> for Diagnostic {
    fn from(rp: RedundantParent<'p>) -> Self {
        Diagnostic::new(Severity::Note)
            .with_message(format!(
                "only a single parent class is supported, '{}' is ignored",
                rp.ignored
            ))
            .with_code(Code::RedundantParent)
            .with_labels(vec![rp.coord.into_label()])
            .with_notes(vec![format!("'{}' is used as the parent class", rp.kept)])
    }
}

pub(crate) struct UnknownSyntax<'s> {
    pub(crate) syntax: &'s str,
    pub(crate) coord: Coord,
}

impl<'s> From<UnknownSyntax<'s>> for Diagnostic {
    fn from(us: UnknownSyntax<'s>) -> Self {
        Diagnostic::new(Severity::Note)
            .with_message(format!(
                "unknown syntax '{}', values are treated as opaque",
                us.syntax
            ))
            .with_code(Code::UnknownSyntax)
            .with_labels(vec![us.coord.into_label()])
    }
}

pub(crate) struct UnrecognizedLine {
    pub(crate) coord: Coord,
}

impl From<UnrecognizedLine> for Diagnostic {
    fn from(ul: UnrecognizedLine) -> Self {
        Diagnostic::new(Severity::Note)
            .with_message("unrecognized line was ignored")
            .with_code(Code::UnrecognizedLine)
            .with_labels(vec![ul.coord.into_label()])
    }
}

pub(crate) struct UnterminatedBlock {
    pub(crate) kind: &'static str,
    pub(crate) origin: Coord,
}

impl From<UnterminatedBlock> for Diagnostic {
    fn from(ub: UnterminatedBlock) -> Self {
        Diagnostic::new(Severity::Warning)
            .with_message(format!(
                "{} declaration was never closed and was ignored",
                ub.kind
            ))
            .with_code(Code::UnterminatedBlock)
            .with_labels(vec![ub
                .origin
                .into_label()
                .with_message("declaration started here")])
    }
}
