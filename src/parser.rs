//! The format agnostic parse then resolve pipeline

mod resolve;

pub use resolve::{resolve, Code};

use crate::{
    decoder::{decode_lines, DecodeContext, DxcDecoder, LineDecoder},
    diag::{Files, Sink},
    schema::Schema,
    Path,
};
use anyhow::Context as _;

/// Drives a [`LineDecoder`] over one or more schema files and resolves the
/// result into a fully linked [`Schema`]
pub struct SchemaParser<D> {
    decoder: D,
}

impl Default for SchemaParser<DxcDecoder> {
    fn default() -> Self {
        Self::new(DxcDecoder::new())
    }
}

impl<D: LineDecoder> SchemaParser<D> {
    #[inline]
    pub fn new(decoder: D) -> Self {
        Self { decoder }
    }

    /// Parses the schema files, in order, into a single resolved [`Schema`]
    ///
    /// Failing to read any of the files fails the entire parse. Each parsed
    /// file is added to `files` so that diagnostics can point into it
    pub fn parse<P: AsRef<Path>>(
        &mut self,
        schema_files: &[P],
        files: &mut Files,
        sink: &mut Sink,
    ) -> anyhow::Result<Schema> {
        self.decoder.reset();

        let mut schema = Schema::new();
        let mut last = None;

        for path in schema_files {
            let path = path.as_ref();
            log::info!("parsing {path}");

            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read schema file '{path}'"))?;
            let file = files.add(path.to_owned(), source);

            decode_lines(
                &mut self.decoder,
                file,
                files.source(file),
                &mut schema,
                sink,
            );
            last = Some(file);
        }

        if let Some(file) = last {
            let end = files.source(file).len();
            self.decoder.finish(&mut DecodeContext {
                schema: &mut schema,
                sink: &mut *sink,
                file,
                span: end..end,
            });
        }

        resolve(&mut schema, sink);

        log::info!(
            "parsed {} attributes, {} object classes, {} bindings",
            schema.attributes.len(),
            schema.object_classes.len(),
            schema.schema_bindings.len(),
        );

        Ok(schema)
    }
}
