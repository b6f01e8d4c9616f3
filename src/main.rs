use clap::Parser as _;
use std::path::PathBuf;

use invoicr::api::fetch_time_entries;
use invoicr::billing::{invoice_lines, total_summary};
use invoicr::config::Config;
use invoicr::counter::next_invoice_id;
use invoicr::error::Error;
use invoicr::period::Period;
use invoicr::render::{
    render_credentials, render_headers, render_promo, render_tasks, render_top_bar, render_total,
};
use invoicr::tasks::aggregate;
use invoicr::writer::Writer;

/// The command line arguments cover the file paths and the period override; the
/// identity, bank and billing values come from environment variables.
#[derive(clap::Parser)]
struct CliArguments {
    /// The path of the output PDF file.
    #[arg(
        short = 'o',
        long = "output",
        value_name = "output_file",
        default_value = "invoice.pdf"
    )]
    output_pdf_path: PathBuf,
    /// The path of the monospace TTF font embedded into the document.
    #[arg(
        long = "font",
        value_name = "font_file",
        default_value = "assets/monospace.ttf"
    )]
    font_path: PathBuf,
    /// The path of the invoice sequence counter file.
    #[arg(
        long = "counter-file",
        value_name = "counter_file",
        default_value = ".iid"
    )]
    counter_path: PathBuf,
    /// Overrides the PERIOD environment variable ("this" or "last").
    #[arg(long = "period", value_name = "period")]
    period: Option<String>,
    /// Skips the promotional footer line.
    #[arg(long = "no-promo")]
    no_promo: bool,
}

fn main() {
    env_logger::init();

    if let Err(error) = run(CliArguments::parse()) {
        log::error!("{error}");
        std::process::exit(1);
    }
}

fn run(cli_arguments: CliArguments) -> Result<(), Error> {
    // Configuration problems must abort before any network or file I/O happens
    let mut config = Config::from_environment()?;
    if let Some(period) = &cli_arguments.period {
        config.period = Period::from_name(period);
    }

    let invoice_id = next_invoice_id(&cli_arguments.counter_path)?;
    let mut writer = Writer::initialize(
        format!("invoice-{invoice_id}"),
        &cli_arguments.font_path,
    )?;

    render_top_bar(&mut writer, invoice_id);
    render_headers(&mut writer, &config.from, &config.to);
    render_credentials(&mut writer, &config.bank, invoice_id);
    writer.new_line(5);

    let (start_date, end_date) = config.period.bounds()?;
    log::info!(
        "Fetching time entries between {} and {}",
        start_date,
        end_date
    );
    let entries = fetch_time_entries(&config.clickup, start_date, end_date)?;
    let tasks = aggregate(&entries);
    log::info!(
        "Aggregated {} tasks from {} time entries",
        tasks.len(),
        entries.len()
    );

    let lines = invoice_lines(&tasks, &config.salary);
    let summary = total_summary(&tasks, &config.salary);

    render_tasks(&mut writer, &lines, &config.salary.currency);
    render_total(&mut writer, &summary, &config.salary.currency);
    if !cli_arguments.no_promo {
        render_promo(&mut writer);
    }

    writer.save(&cli_arguments.output_pdf_path)?;
    log::info!(
        "Saved invoice #{} to {:?}",
        invoice_id,
        cli_arguments.output_pdf_path
    );

    Ok(())
}
