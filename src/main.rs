//! CLI: извлекает сметы из файла или каталога и печатает JSON.

use std::path::PathBuf;

use clap::Parser;
use rozpocet_extract::{BudgetSet, Extraction, Extractor, Workbook};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(about = "Extract construction budget hierarchies from XLSX/XLS/ODS/CSV files.")]
struct Args {
    /// Budget file or directory with budget files.
    path: PathBuf,

    /// Project name overriding the one found in the workbook.
    #[arg(long)]
    name: Option<String>,

    /// Skip de-duplication and price backfill.
    #[arg(long)]
    no_reconcile: bool,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

impl Args {
    fn configure<'a>(&self, builder: Extractor<'a>) -> Extractor<'a> {
        let builder = match &self.name {
            Some(name) => builder.project_name(name.clone()),
            None => builder,
        };
        if self.no_reconcile { builder.raw() } else { builder }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let json = if args.path.is_dir() {
        let set = BudgetSet::from_dir_with(&args.path, |builder| args.configure(builder).extract())?;
        to_json(&set.files, args.pretty)?
    } else {
        let workbook = Workbook::open(&args.path)?;
        let extraction: Extraction = args.configure(Extractor::new(&workbook)).extract();
        to_json(&extraction, args.pretty)?
    };
    println!("{json}");
    Ok(())
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}
