use super::{Diagnostic, Severity};

/// Collects the diagnostics emitted while parsing and generating
///
/// Nothing in the pipeline prints diagnostics directly, the owner of the sink
/// decides how (and whether) to report them once a stage is finished
#[derive(Default)]
pub struct Sink {
    diagnostics: Vec<Diagnostic>,
}

impl Sink {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diag: impl Into<Diagnostic>) {
        let diag = diag.into();

        log::debug!(
            "{} {}",
            diag.code.as_deref().unwrap_or("diagnostic"),
            diag.message
        );

        self.diagnostics.push(diag);
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// The number of diagnostics with exactly the specified severity
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Gets the diagnostics that were emitted with the specified code
    pub fn with_code<'s>(&'s self, code: &'s str) -> impl Iterator<Item = &'s Diagnostic> + 's {
        self.diagnostics
            .iter()
            .filter(move |d| d.code.as_deref() == Some(code))
    }
}

impl IntoIterator for Sink {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}
