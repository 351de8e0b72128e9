//! Destinations for change records.
//!
//! Every change applied by [`update`](crate::update) is written to a
//! [`ChangeSink`] as one informational record carrying
//! `action=runtime_overrides_changed` and the field's old and new values.
//!
//! | Sink | Output |
//! |------|--------|
//! | [`TracingSink`] | `tracing::info!` event (requires `tracing` feature) |
//! | [`WriterSink`] | logfmt line on any [`io::Write`] |
//! | [`MemorySink`] | kept in a `Vec` for inspection |

use std::borrow::Cow;
use std::io::{self, Write};

use crate::reconcile::ChangeRecord;

/// Value of the `action` field on every change record.
pub const CHANGE_ACTION: &str = "runtime_overrides_changed";

/// Prefix of the human-readable message on every change record.
pub const MESSAGE_PREFIX: &str = "runtime overrides";

/// Receives change records from a reconciliation pass.
pub trait ChangeSink {
    /// Record one change.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the record could not be written. The change
    /// itself has already been applied.
    fn record(&mut self, change: &ChangeRecord) -> io::Result<()>;
}

/// Emits change records as `tracing` events at `INFO` level.
///
/// ```text
/// INFO runtime overrides: config 'AutoschemaEnabled' changed from 'false' to 'true'
///      action="runtime_overrides_changed" field="AutoschemaEnabled" old_value="false" new_value="true"
/// ```
#[cfg(feature = "tracing")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

#[cfg(feature = "tracing")]
impl ChangeSink for TracingSink {
    fn record(&mut self, change: &ChangeRecord) -> io::Result<()> {
        tracing::info!(
            action = CHANGE_ACTION,
            field = change.field,
            old_value = %change.old_value,
            new_value = %change.new_value,
            "{MESSAGE_PREFIX}: {change}"
        );
        Ok(())
    }
}

/// Writes change records as logfmt lines.
///
/// ```text
/// level=info msg="runtime overrides: config 'MaximumAllowedCollectionsCount' changed from '7' to '13'" action=runtime_overrides_changed field=MaximumAllowedCollectionsCount new_value=13 old_value=7
/// ```
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    /// Wrap a writer.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Borrow the underlying writer.
    pub const fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Unwrap the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ChangeSink for WriterSink<W> {
    fn record(&mut self, change: &ChangeRecord) -> io::Result<()> {
        let msg = format!("{MESSAGE_PREFIX}: {change}");
        writeln!(
            self.writer,
            "level=info msg={} action={CHANGE_ACTION} field={} new_value={} old_value={}",
            logfmt_value(&msg),
            logfmt_value(change.field),
            logfmt_value(&change.new_value),
            logfmt_value(&change.old_value),
        )?;
        self.writer.flush()
    }
}

/// Collects change records in memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    records: Vec<ChangeRecord>,
}

impl MemorySink {
    /// Create an empty sink.
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Records received so far.
    pub fn records(&self) -> &[ChangeRecord] {
        &self.records
    }

    /// Take all records, leaving the sink empty.
    pub fn drain(&mut self) -> Vec<ChangeRecord> {
        std::mem::take(&mut self.records)
    }
}

impl ChangeSink for MemorySink {
    fn record(&mut self, change: &ChangeRecord) -> io::Result<()> {
        self.records.push(change.clone());
        Ok(())
    }
}

/// Quote a logfmt value when it is empty or contains spaces, `=` or quotes.
fn logfmt_value(value: &str) -> Cow<'_, str> {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '=' || c == '"' || c.is_control());

    if needs_quotes {
        Cow::Owned(format!("{value:?}"))
    } else {
        Cow::Borrowed(value)
    }
}
