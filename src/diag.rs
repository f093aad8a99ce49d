mod sink;

pub use sink::Sink;

use std::{collections::BTreeMap, ops::Range};

use crate::{Path, PathBuf};
pub use codespan_reporting::diagnostic::Severity;

pub type FileId = usize;

pub type FilesErr = codespan_reporting::files::Error;
pub type Diagnostic = codespan_reporting::diagnostic::Diagnostic<FileId>;
pub type Label = codespan_reporting::diagnostic::Label<FileId>;

struct File {
    name: PathBuf,
    source: String,
    line_starts: Vec<usize>,
}

use codespan_reporting::files::Files as _;

/// Implementation of [`codespan_reporting::files::Files`], which can also query
/// [`FileId`] by path
pub struct Files {
    files: Vec<File>,
    /// Since we hand out ids we keep a mapping of path -> id for faster searching
    map: BTreeMap<PathBuf, FileId>,
}

impl Files {
    #[inline]
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            map: Default::default(),
        }
    }

    #[inline]
    pub fn id_for_path(&self, path: &Path) -> Option<FileId> {
        self.map.get(path).copied()
    }

    /// Adds the contents of a file, if the path is already known its contents
    /// are replaced and the existing id is returned
    #[inline]
    pub fn add(&mut self, path: impl Into<PathBuf>, source: impl Into<String>) -> FileId {
        let name = path.into();

        if let Some(id) = self.id_for_path(&name) {
            self.update(id, source);
            return id;
        }

        let id = self.files.len();
        self.map.insert(name.clone(), id);
        self.files.push(File {
            name,
            source: String::new(),
            line_starts: Vec::new(),
        });

        self.update(id, source);
        id
    }

    #[inline]
    pub fn update(&mut self, id: FileId, source: impl Into<String>) {
        let file = &mut self.files[id];

        let source = source.into();
        file.line_starts = codespan_reporting::files::line_starts(&source).collect();
        file.source = source;
    }

    /// Gets the 0-based line and column of the specified byte
    pub fn location(&self, id: FileId, byte_index: usize) -> Result<Location, FilesErr> {
        let line_index = self.line_index(id, byte_index)?;

        let file = &self.files[id];
        let line_start = file.line_starts[line_index];

        let line_src = file.source.get(line_start..byte_index).ok_or_else(|| {
            let max = file.source.len().saturating_sub(1);
            if byte_index > max {
                FilesErr::IndexTooLarge {
                    given: byte_index,
                    max,
                }
            } else {
                FilesErr::InvalidCharBoundary { given: byte_index }
            }
        })?;

        Ok(Location {
            line: line_index,
            column: line_src.chars().count(),
        })
    }

    #[inline]
    pub fn source(&self, id: FileId) -> &str {
        &self.files[id].source
    }

    #[inline]
    pub fn path(&self, id: FileId) -> &Path {
        &self.files[id].name
    }
}

impl<'f> codespan_reporting::files::Files<'f> for Files {
    type FileId = FileId;
    type Name = &'f Path;
    type Source = &'f str;

    fn source(&'f self, id: Self::FileId) -> Result<Self::Source, FilesErr> {
        self.files
            .get(id)
            .map(|f| f.source.as_str())
            .ok_or(FilesErr::FileMissing)
    }

    fn name(&'f self, id: Self::FileId) -> Result<Self::Name, FilesErr> {
        self.files
            .get(id)
            .map(|f| f.name.as_path())
            .ok_or(FilesErr::FileMissing)
    }

    fn line_index(&'f self, id: Self::FileId, byte_index: usize) -> Result<usize, FilesErr> {
        let file = self.files.get(id).ok_or(FilesErr::FileMissing)?;

        Ok(match file.line_starts.binary_search(&byte_index) {
            Ok(line) => line,
            Err(next_line) => next_line - 1,
        })
    }

    fn line_range(&'f self, id: Self::FileId, line_index: usize) -> Result<Range<usize>, FilesErr> {
        let file = self.files.get(id).ok_or(FilesErr::FileMissing)?;

        let start = *file
            .line_starts
            .get(line_index)
            .ok_or(FilesErr::LineTooLarge {
                given: line_index,
                max: file.line_starts.len(),
            })?;
        let end = if line_index + 1 < file.line_starts.len() {
            file.line_starts[line_index + 1]
        } else {
            file.source.len()
        };

        Ok(start..end)
    }
}

/// A 0-based position within a file
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

/// Where in a source file a schema declaration (or config key) was found
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Coord {
    pub file: FileId,
    pub span: Range<usize>,
}

impl Coord {
    #[inline]
    pub fn into_label(self) -> Label {
        self.into()
    }
}

impl From<Coord> for Label {
    fn from(c: Coord) -> Self {
        Label::primary(c.file, c.span)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticCode {
    Decoder(crate::decoder::Code),
    Parser(crate::parser::Code),
    Generator(crate::gen::Code),
    Config(crate::cfg::Code),
}

impl DiagnosticCode {
    pub fn iter() -> impl Iterator<Item = Self> {
        use strum::IntoEnumIterator;
        crate::decoder::Code::iter()
            .map(Self::Decoder)
            .chain(crate::parser::Code::iter().map(Self::Parser))
            .chain(crate::gen::Code::iter().map(Self::Generator))
            .chain(crate::cfg::Code::iter().map(Self::Config))
    }

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Decoder(code) => code.into(),
            Self::Parser(code) => code.into(),
            Self::Generator(code) => code.into(),
            Self::Config(code) => code.into(),
        }
    }
}

use std::fmt;

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DiagnosticCode {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<crate::decoder::Code>()
            .map(Self::Decoder)
            .or_else(|_err| s.parse::<crate::parser::Code>().map(Self::Parser))
            .or_else(|_err| s.parse::<crate::gen::Code>().map(Self::Generator))
            .or_else(|_err| s.parse::<crate::cfg::Code>().map(Self::Config))
    }
}

/// A codespan config that modifies the character set used
///
/// This is a shared function so it is used by both the binary and tests
pub fn codespan_config() -> codespan_reporting::term::Config {
    let mut config = codespan_reporting::term::Config::default();
    config.chars.note_bullet = '├';
    config.chars.multi_primary_caret_start = '┘';
    config.chars.multi_secondary_caret_start = '┘';
    config.chars.single_primary_caret = '━';
    config.chars.single_secondary_caret = '─';
    config
}

/// Converts a diagnostic into the JSON-lines form emitted with `--format json`
pub fn diag_to_json(diag: Diagnostic, files: &Files) -> serde_json::Value {
    let mut fields = serde_json::Map::new();

    fields.insert(
        "severity".to_owned(),
        serde_json::Value::from(match diag.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Help => "help",
            Severity::Bug => "bug",
        }),
    );
    fields.insert("message".to_owned(), serde_json::Value::from(diag.message));

    if let Some(code) = diag.code {
        fields.insert("code".to_owned(), serde_json::Value::String(code));
    }

    if !diag.labels.is_empty() {
        let labels = diag
            .labels
            .into_iter()
            .map(|label| {
                let mut val = serde_json::json!({
                    "message": label.message,
                    "file": files.path(label.file_id).as_str(),
                    "span": files
                        .source(label.file_id)
                        .get(label.range.clone())
                        .unwrap_or_default(),
                });

                if let Ok(location) = files.location(label.file_id, label.range.start) {
                    val["line"] = serde_json::Value::from(location.line + 1);
                    val["column"] = serde_json::Value::from(location.column + 1);
                }

                val
            })
            .collect();

        fields.insert("labels".to_owned(), serde_json::Value::Array(labels));
    }

    if !diag.notes.is_empty() {
        fields.insert(
            "notes".to_owned(),
            serde_json::Value::from(diag.notes),
        );
    }

    serde_json::json!({
        "type": "diagnostic",
        "fields": fields,
    })
}
