mod display;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tradicion_core::locate::parse_folio_query;
use tradicion_core::{
    OutputFormat, ParserOptions, ReconcileReport, ReconcileRequest, document, locate, reconcile,
    render,
};

#[derive(Parser)]
#[command(name = "tradicion", version)]
#[command(about = "Extract property names and deeds from certificados de tradición")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a folio list and render one record per folio
    Extract(ExtractArgs),

    /// Report where (and whether) folio numbers appear in a certificate
    Locate(LocateArgs),
}

#[derive(Args)]
struct ExtractArgs {
    /// Folio list text. Defaults to the certificate itself.
    #[arg(long, env = "TRADICION_FOLIOS")]
    folios: Option<PathBuf>,

    /// Certificate body text; required for CSV output.
    #[arg(long, env = "TRADICION_CERTIFICATE")]
    certificate: Option<PathBuf>,

    /// List of circuit-folio codes fixing output order.
    #[arg(long, env = "TRADICION_MATRICULAS")]
    matriculas: Option<PathBuf>,

    /// text, csv or json
    #[arg(long, env = "TRADICION_FORMAT", default_value = "text")]
    format: OutputFormat,

    /// Write here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, default_value_t = ParserOptions::default().max_continuation_lines)]
    max_continuation_lines: usize,

    /// Skip the run summary on stderr.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Args)]
struct LocateArgs {
    #[arg(long, env = "TRADICION_CERTIFICATE")]
    certificate: PathBuf,

    /// Folio numbers, any separator: "5537007, 5537071"
    folios: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!("tradicion v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Extract(args) => {
            let (rendered, report) = extract(&args)?;
            write_output(args.output.as_deref(), &rendered)?;
            if !args.quiet {
                display::print_summary(&report)?;
            }
        }
        Command::Locate(args) => {
            let text = read_document(&args.certificate)?;
            let folios = parse_folio_query(&args.folios);
            anyhow::ensure!(!folios.is_empty(), "no folio numbers in {:?}", args.folios);
            let results = locate(&text, &folios);
            display::write_search(&mut io::stdout().lock(), &results)?;
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Read inputs, run one reconciliation and render it.
fn extract(args: &ExtractArgs) -> Result<(String, ReconcileReport)> {
    let folios = args.folios.as_deref().map(read_document).transpose()?;
    let certificate = args.certificate.as_deref().map(read_document).transpose()?;
    let matriculas = args
        .matriculas
        .as_deref()
        .map(|p| fs::read_to_string(p).with_context(|| format!("reading {}", p.display())))
        .transpose()?;

    let options = ParserOptions {
        max_continuation_lines: args.max_continuation_lines,
        ..ParserOptions::default()
    };
    let request = ReconcileRequest {
        folio_list: folios.as_deref(),
        certificate: certificate.as_deref(),
        matriculas: matriculas.as_deref(),
        format: args.format,
        options,
    };

    let report = reconcile(&request)?;
    let rendered = render(&report, args.format)?;
    Ok((rendered, report))
}

/// Certificate dumps may separate pages with form feeds.
fn read_document(path: &Path) -> Result<String> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(document::normalize(&raw))
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote output");
        }
        None => io::stdout()
            .lock()
            .write_all(content.as_bytes())
            .context("writing stdout")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    const FOLIOS: &str = "\
3 -> 190172 : TORRE 9 - APARTAMENTO 103 - PROYECTO MODIGLIANI
4 -> 190173 : TORRE 9 - APARTAMENTO 104 UBICADO EN EL
\u{c}CERTIFICADO DE TRADICION
MATRICULA INMOBILIARIA
SEXTO PISO
";

    const CERTIFICATE: &str = "\
ANOTACION: Nro 003 Fecha: 20-09-2022
Doc: ESCRITURA 4067 DEL 16-09-2022 NOTARIA SEPTIMA DE IBAGUE VALOR ACTO: $574,354,780
ANOTACION: Nro 004 Fecha: 21-09-2022
Doc: OFICIO 12 DEL 21-09-2022 JUZGADO
";

    fn write(dir: &TempDir, name: &str, content: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path.display().to_string()
    }

    fn extract_args(argv: &[&str]) -> ExtractArgs {
        let mut full = vec!["tradicion", "extract"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Command::Extract(args) => args,
            Command::Locate(_) => panic!("expected extract"),
        }
    }

    #[test]
    fn text_output_from_files() {
        let dir = TempDir::new().unwrap();
        let folios = write(&dir, "folios.txt", FOLIOS);
        let args = extract_args(&["--folios", &folios, "--format", "text"]);
        let (rendered, report) = extract(&args).unwrap();
        assert_eq!(
            rendered,
            "190172: TORRE 9 - APARTAMENTO 103 - PROYECTO MODIGLIANI\n\
             190173: TORRE 9 - APARTAMENTO 104 UBICADO EN EL SEXTO PISO\n"
        );
        assert_eq!(report.summary.records, 2);
    }

    #[test]
    fn csv_output_with_deeds() {
        let dir = TempDir::new().unwrap();
        let folios = write(&dir, "folios.txt", FOLIOS);
        let certificate = write(&dir, "cert.txt", CERTIFICATE);
        let args = extract_args(&[
            "--folios",
            &folios,
            "--certificate",
            &certificate,
            "--format",
            "csv",
        ]);
        let (rendered, report) = extract(&args).unwrap();
        assert_eq!(
            rendered,
            "Circulo,Folio,Inmueble,EP\n\
             ,190172,TORRE 9 - APARTAMENTO 103 - PROYECTO MODIGLIANI,ESCRITURA 4067 DEL 16-09-2022\n\
             ,190173,TORRE 9 - APARTAMENTO 104 UBICADO EN EL SEXTO PISO,\n"
        );
        assert_eq!(report.summary.resolutions, 2);
    }

    #[test]
    fn matricula_list_sets_circuit() {
        let dir = TempDir::new().unwrap();
        let folios = write(&dir, "folios.txt", FOLIOS);
        let list = write(&dir, "matriculas.txt", "350-190173\n350-190999\n");
        let args = extract_args(&["--folios", &folios, "--matriculas", &list]);
        let (rendered, report) = extract(&args).unwrap();
        assert_eq!(
            rendered,
            "350-190173: TORRE 9 - APARTAMENTO 104 UBICADO EN EL SEXTO PISO\n\
             350-190999: NO ENCONTRADO\n"
        );
        assert_eq!(report.not_found, ["350-190999"]);
    }

    #[test]
    fn csv_without_certificate_is_rejected() {
        let dir = TempDir::new().unwrap();
        let folios = write(&dir, "folios.txt", FOLIOS);
        let args = extract_args(&["--folios", &folios, "--format", "csv"]);
        let err = extract(&args).unwrap_err();
        assert!(err.to_string().contains("no certificate"));
    }

    #[test]
    fn missing_file_names_path() {
        let args = extract_args(&["--folios", "/nonexistent/folios.txt"]);
        let err = extract(&args).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/folios.txt"));
    }

    #[test]
    fn output_file_is_written() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.txt");
        write_output(Some(&out), "190172: TORRE 9\n").unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "190172: TORRE 9\n");
    }

    #[test]
    fn locate_subcommand_parses() {
        let cli = Cli::try_parse_from([
            "tradicion",
            "-v",
            "locate",
            "--certificate",
            "cert.txt",
            "5537007, 5537071",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Locate(args) => {
                assert_eq!(args.certificate, Path::new("cert.txt"));
                assert_eq!(parse_folio_query(&args.folios), ["5537007", "5537071"]);
            }
            Command::Extract(_) => panic!("expected locate"),
        }
    }

    #[test]
    fn unknown_format_is_rejected() {
        let result = Cli::try_parse_from(["tradicion", "extract", "--format", "xml"]);
        assert!(result.is_err());
    }
}
