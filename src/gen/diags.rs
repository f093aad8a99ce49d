use super::ArtifactKind;
use crate::diag::{Diagnostic, Severity};

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
    ArtifactRenderFailed,
    ArtifactWriteFailed,
    CleanupFailed,
}

impl From<Code> for String {
    fn from(c: Code) -> Self {
        c.to_string()
    }
}

pub(crate) struct ArtifactFailed<'a> {
    pub(crate) code: Code,
    pub(crate) kind: ArtifactKind,
    pub(crate) class_name: &'a str,
    pub(crate) error: &'a anyhow::Error,
}

impl<'a> From<ArtifactFailed<'a>> for Diagnostic {
    fn from(af: ArtifactFailed<'a>) -> Self {
        let action = match af.code {
            Code::ArtifactRenderFailed => "render",
            _ => "write",
        };

        Diagnostic::new(Severity::Error)
            .with_message(format!(
                "failed to {action} {} '{}', it was skipped",
                af.kind, af.class_name
            ))
            .with_code(af.code)
            .with_notes(vec![format!("{:#}", af.error)])
    }
}

pub(crate) struct CleanupFailed<'a> {
    pub(crate) path: String,
    pub(crate) error: &'a dyn std::error::Error,
}

impl<'a> From<CleanupFailed<'a>> for Diagnostic {
    fn from(cf: CleanupFailed<'a>) -> Self {
        Diagnostic::new(Severity::Warning)
            .with_message(format!("failed to remove old output '{}'", cf.path))
            .with_code(Code::CleanupFailed)
            .with_notes(vec![cf.error.to_string()])
    }
}
