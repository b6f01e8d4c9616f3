use crate::billing::{InvoiceLine, TotalSummary};
use crate::writer::{Direction, SizeClass, Writer, WriteSpec, PAGE_PADDING};

/// One party of the invoice, either the sender or the recipient.
#[derive(Debug, Clone)]
pub struct Party {
    pub name: String,
    pub address: String,
    pub country: String,
    pub postal_code: String,
    /// Company registration number (ICO), shown only when present.
    pub company_id: Option<String>,
    /// Tax identification number (DIC), shown only when present.
    pub tax_id: Option<String>,
}

/// The bank credentials block of the invoice.
#[derive(Debug, Clone)]
pub struct BankDetails {
    pub bank_name: String,
    pub iban: String,
    pub bic: String,
}

/// Writes the invoice number line at the very top of the page and re-anchors the
/// cursor to the left content margin.
pub fn render_top_bar(writer: &mut Writer, invoice_id: u64) {
    writer.write(
        Direction::Vertical,
        &WriteSpec::text(format!("Invoice #{invoice_id}")),
    );
    writer.new_line(5);
    writer.cursor_to(PAGE_PADDING, writer.cursor().y, true);
}

/// Writes one party block: the header kind line, the sub-header name and the
/// address lines, with the optional registration and tax ids skipped entirely
/// when absent.
fn render_header(writer: &mut Writer, kind: &str, party: &Party) {
    writer.bulk_write(
        Direction::Vertical,
        [
            Some(WriteSpec::text(format!("INVOICE {kind}")).size(SizeClass::Header)),
            Some(WriteSpec::text(party.name.as_str()).size(SizeClass::SubHeader)),
            Some(WriteSpec::text(party.address.as_str())),
            Some(WriteSpec::text(party.country.as_str())),
            Some(WriteSpec::text(party.postal_code.as_str())),
            party
                .company_id
                .as_ref()
                .map(|id| WriteSpec::text(format!("ICO: {id}"))),
            party
                .tax_id
                .as_ref()
                .map(|id| WriteSpec::text(format!("DIC: {id}"))),
        ],
    );
}

/// Writes the two-column party header: the sender block on the left half and the
/// recipient block starting at the horizontal midpoint, both anchored to the same
/// starting y. The cursor ends up below the taller left column, plus some air.
pub fn render_headers(writer: &mut Writer, from: &Party, to: &Party) {
    let initial_cursor = writer.cursor();

    render_header(writer, "FROM", from);

    let first_column_cursor = writer.cursor();
    writer.cursor_to(writer.width / 2.0, initial_cursor.y, true);

    render_header(writer, "TO", to);

    writer.set_cursor(first_column_cursor);
    writer.new_line(5);
}

/// Writes the bank credentials block. The labels are padded with spaces so the
/// values line up in the monospace font.
pub fn render_credentials(writer: &mut Writer, bank: &BankDetails, invoice_id: u64) {
    writer.bulk_write(
        Direction::Vertical,
        [
            Some(WriteSpec::text(format!(
                "Bank name:         {}",
                bank.bank_name
            ))),
            Some(WriteSpec::text(format!("IBAN:              {}", bank.iban))),
            Some(WriteSpec::text(format!("BIC:               {}", bank.bic))),
            Some(WriteSpec::text(format!(
                "Variable symbol:   {invoice_id}"
            ))),
        ],
    );
}

/// Writes the three-column task table: descriptions at the left margin, hours at
/// `width - 180` and amounts at `width - 100`, all three columns anchored to the
/// same starting y. Each description with a URL becomes a clickable link. The
/// cursor is left re-anchored under the hours column, three lines down, ready for
/// the total line.
pub fn render_tasks(writer: &mut Writer, lines: &[InvoiceLine], currency: &str) {
    let table_cursor = writer.cursor();

    for line in lines {
        let mut spec = WriteSpec::text(line.label.as_str());
        if let Some(url) = &line.url {
            spec = spec.url(url.as_str());
        }
        writer.write(Direction::Vertical, &spec);
    }

    writer.cursor_to(writer.width - 180.0, table_cursor.y, true);
    for line in lines {
        writer.write(Direction::Vertical, &WriteSpec::text(format!("{}h", line.hours)));
    }

    writer.cursor_to(writer.width - 100.0, table_cursor.y, true);
    for line in lines {
        writer.write(
            Direction::Vertical,
            &WriteSpec::text(format!("{} {}", line.amount, currency)),
        );
    }

    writer.cursor_to(writer.width - 180.0, writer.cursor().y, true);
    writer.new_line(3);
}

/// Writes the grand total line under the task table.
pub fn render_total(writer: &mut Writer, summary: &TotalSummary, currency: &str) {
    writer.write(
        Direction::Vertical,
        &WriteSpec::text(format!("Total: {} {}", summary.total_amount, currency))
            .size(SizeClass::SubHeader),
    );
}

/// Writes the promotional footer line near the bottom of the page.
pub fn render_promo(writer: &mut Writer) {
    writer.cursor_to(0.0, writer.height - 50.0, false);
    writer.write(
        Direction::None,
        &WriteSpec::text("Invoice generated with invoicr").url("https://crates.io/crates/invoicr"),
    );
}
