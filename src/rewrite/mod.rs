//! Import specifier rewriting.
//!
//! The rewriter works on one line at a time and assumes an import statement
//! never spans lines. Lines that don't look like an import, imports it can't
//! parse, and imports of packages that aren't in the registry are copied
//! through byte for byte.

use std::borrow::Cow;
use std::io::{self, BufRead, Write};

use crate::package::Registry;
use crate::publish::OutputLayout;

/// Counters for one rewritten file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    pub lines: usize,
    pub rewritten: usize,
}

pub struct ImportRewriter<'a> {
    registry: &'a Registry,
    layout: &'a OutputLayout,
}

impl<'a> ImportRewriter<'a> {
    pub fn new(registry: &'a Registry, layout: &'a OutputLayout) -> Self {
        Self { registry, layout }
    }

    /// Stream `reader` into `writer`, rewriting registered import specifiers.
    pub fn rewrite<Rd, W>(&self, mut reader: Rd, writer: &mut W) -> io::Result<RewriteStats>
    where
        Rd: BufRead,
        W: Write + ?Sized,
    {
        let mut stats = RewriteStats::default();
        let mut line = Vec::new();

        loop {
            line.clear();
            // A trailing line without `\n` is returned as-is before EOF
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            stats.lines += 1;

            let output = self.rewrite_line(&line);
            if matches!(output, Cow::Owned(_)) {
                stats.rewritten += 1;
            }
            writer.write_all(&output)?;
        }

        Ok(stats)
    }

    /// Rewrite a single line, borrowing it unchanged when there is nothing
    /// to replace.
    pub fn rewrite_line<'l>(&self, line: &'l [u8]) -> Cow<'l, [u8]> {
        if !line.trim_ascii().starts_with(b"import") {
            return Cow::Borrowed(line);
        }

        let Some((before, specifier, after, quote)) = split_specifier(line) else {
            return Cow::Borrowed(line);
        };
        let Some(package) = std::str::from_utf8(specifier)
            .ok()
            .and_then(|name| self.registry.get(name))
        else {
            return Cow::Borrowed(line);
        };

        let public_path = self
            .layout
            .public_path(package.name(), package.resolved_version());

        let mut rewritten = Vec::with_capacity(line.len() + public_path.len());
        rewritten.extend_from_slice(before);
        rewritten.push(quote);
        rewritten.extend_from_slice(public_path.as_bytes());
        rewritten.push(quote);
        rewritten.extend_from_slice(after);
        Cow::Owned(rewritten)
    }
}

/// Split an import line around its first quoted segment.
///
/// Double quotes win if the line has any; otherwise single quotes are used.
/// Returns `(before, specifier, after, quote)`, or `None` if the line has no
/// complete pair of quotes.
fn split_specifier(line: &[u8]) -> Option<(&[u8], &[u8], &[u8], u8)> {
    let quote = if line.contains(&b'"') { b'"' } else { b'\'' };

    let open = line.iter().position(|&b| b == quote)?;
    let rest = &line[open + 1..];
    let close = rest.iter().position(|&b| b == quote)?;

    Some((&line[..open], &rest[..close], &rest[close + 1..], quote))
}
