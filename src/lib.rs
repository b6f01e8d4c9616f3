//! invoicr generates a one-page invoice PDF from time tracking data pulled from
//! the ClickUp API. It fetches the billable time entries assigned to a user over
//! a calendar-month period, aggregates the tracked time per task, lays out the
//! document (parties, bank credentials, itemized task table, totals) and writes
//! the result to a PDF file with an embedded monospace font.
//!
//! The heart of the crate is the cursor-based [`writer::Writer`]: a stateful
//! text and link placement surface over a single fixed-size page. Renderers in
//! the [`render`] module compose its primitives into the semantic blocks of an
//! invoice, fed by the aggregation in [`tasks`] and the monetary arithmetic in
//! [`billing`]. Everything else (environment configuration, the HTTP fetch, the
//! file-based invoice counter) is thin glue around those three.

/// The low-level representation of the one-page PDF document.
///
/// This module hides the nitty-gritty details of the PDF specification behind
/// the `PdfDocument` struct: embedding a TTF font as a `Type0` CID font with a
/// `ToUnicode` character map, accumulating content stream operations for text
/// and lines, registering link annotations and finally assembling the catalog,
/// page tree and trailer when the document is serialized. Positions here are in
/// points with the origin at the bottom-left page corner, exactly as PDF wants
/// them; anything friendlier is layered on top by the writer.
pub mod pdf;

/// The cursor-based document writer, the layout engine of the crate.
///
/// The `Writer` owns a mutable write position in content coordinates (y grows
/// downwards from the top margin) and exposes the placement primitives the
/// renderers are built from: `write` with per-class sizing and gap advancement,
/// `bulk_write` with skippable optional items, absolute `cursor_to` jumps in
/// padded or raw coordinates, and cursor snapshot/restore for multi-column
/// layouts. It deliberately enforces no column discipline of its own.
pub mod writer;

/// Aggregation of raw time entries into per-task totals.
pub mod tasks;

/// Conversion of aggregated durations into displayable hours and amounts,
/// including the 2-decimal rounding policy and the visible-task overflow cap.
pub mod billing;

/// The section renderers composing writer primitives into invoice blocks.
pub mod render;

/// The error type used throughout this crate.
///
/// Every failure carries a kind (configuration, initialization, fetch or
/// persistence), a human context and possibly the propagated source error. All
/// errors are fatal: this program has no retry layer anywhere, an error of any
/// kind terminates the run.
pub mod error;

/// The blocking HTTP client for the ClickUp time entries endpoint.
pub mod api;

/// Resolution of the "this" / "last" calendar-month period selector into
/// epoch-millisecond query bounds.
pub mod period;

/// The environment-variable configuration surface.
pub mod config;

/// The file-based incrementing invoice sequence counter.
pub mod counter;

/// Small string helpers shared by the renderers.
pub mod utils;
