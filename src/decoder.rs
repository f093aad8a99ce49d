//! Line decoders turn the (trimmed) lines of schema files into declarations
//! in a [`Schema`]
//!
//! The parser driver knows nothing about the syntax of the schema files it
//! reads, it only feeds lines, in order, to a [`LineDecoder`]

mod diags;
pub mod dxc;

pub use diags::Code;
pub use dxc::DxcDecoder;

use crate::{
    diag::{Coord, FileId, Sink},
    schema::Schema,
};
use std::ops::Range;

/// The state a decoder mutates while consuming a line
pub struct DecodeContext<'ctx> {
    /// The schema being accumulated
    pub schema: &'ctx mut Schema,
    pub sink: &'ctx mut Sink,
    /// The file the current line is from
    pub file: FileId,
    /// The byte range of the trimmed line in the file
    pub span: Range<usize>,
}

impl<'ctx> DecodeContext<'ctx> {
    /// The location of the current line
    #[inline]
    pub fn coord(&self) -> Coord {
        Coord {
            file: self.file,
            span: self.span.clone(),
        }
    }
}

/// A stateful, dialect specific, scanner of schema lines
///
/// State is kept across lines _and_ files for a single parse, so a
/// declaration in one file can reference declarations in another
pub trait LineDecoder {
    /// Drops any state accumulated by a previous parse
    fn reset(&mut self);

    /// Consumes a single line that has had leading and trailing whitespace
    /// removed
    fn consume_line(&mut self, line: &str, ctx: &mut DecodeContext<'_>);

    /// Called once after the last line of the last file has been consumed
    fn finish(&mut self, _ctx: &mut DecodeContext<'_>) {}
}

/// Feeds every line of a source file to a decoder, trimming each line and
/// keeping track of where in the file it came from
pub fn decode_lines<D: LineDecoder + ?Sized>(
    decoder: &mut D,
    file: FileId,
    source: &str,
    schema: &mut Schema,
    sink: &mut Sink,
) {
    let mut offset = 0;

    for raw in source.split_inclusive('\n') {
        let start = offset + (raw.len() - raw.trim_start().len());
        let line = raw.trim();
        offset += raw.len();

        let mut ctx = DecodeContext {
            schema: &mut *schema,
            sink: &mut *sink,
            file,
            span: start..start + line.len(),
        };

        decoder.consume_line(line, &mut ctx);
    }
}

impl<D: LineDecoder + ?Sized> LineDecoder for Box<D> {
    #[inline]
    fn reset(&mut self) {
        (**self).reset();
    }

    #[inline]
    fn consume_line(&mut self, line: &str, ctx: &mut DecodeContext<'_>) {
        (**self).consume_line(line, ctx);
    }

    #[inline]
    fn finish(&mut self, ctx: &mut DecodeContext<'_>) {
        (**self).finish(ctx);
    }
}
