//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_export_adapter::CsvExportAdapter;
use crate::adapters::csv_table_adapter::CsvTableAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::column::ColumnMapping;
use crate::domain::config_validation::{parse_delimiter, validate_config};
use crate::domain::error::{KryptoError, ParseError};
use crate::domain::expr::Expr;
use crate::domain::legend::{
    BollingerState, DivergenceState, HistogramCode, SignalCode, MACD_POSITIONS,
};
use crate::domain::observation::ObservationLog;
use crate::domain::pipeline::{self, Evaluation};
use crate::domain::rule_set::{Rule, RuleSet};
use crate::domain::selector::{KeyColumns, ObservationFilter};
use crate::domain::table::Table;
use crate::ports::config_port::ConfigPort;
use crate::ports::export_port::ExportPort;
use crate::ports::table_port::{TablePort, DATA_SHEET, LEGEND_SHEET, RULES_SHEET};

#[derive(Parser, Debug)]
#[command(
    name = "kryptosignal",
    about = "Rule-based recommendations from crypto indicator readings"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate the rule sheet against the data sheet
    Evaluate {
        /// Directory holding Daten.csv and Regeln.csv
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Only observations of this asset (repeatable)
        #[arg(short, long = "asset")]
        assets: Vec<String>,
        /// Only observations of this timeframe (repeatable)
        #[arg(short, long = "timeframe")]
        timeframes: Vec<String>,
        /// Evaluate every row, not just the latest per asset and timeframe
        #[arg(long)]
        all_observations: bool,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Classify fixed-form observations with the built-in decision table
    Classify {
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show how data columns are renamed for rule expressions
    Columns {
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Parse every rule against the data columns and report errors
    CheckRules {
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the indicator code legends, plus the Legenden sheet if one is given
    Legend {
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data: Option<PathBuf>,
    pub assets: Vec<String>,
    pub timeframes: Vec<String>,
    pub all_observations: bool,
    pub output: Option<PathBuf>,
}

/// Everything one command needs, resolved from config and overrides.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub delimiter: u8,
    pub keys: KeyColumns,
    pub filter: ObservationFilter,
    pub output: Option<PathBuf>,
}

impl Settings {
    pub fn table_adapter(&self) -> CsvTableAdapter {
        CsvTableAdapter::new(self.data_dir.clone()).with_delimiter(self.delimiter)
    }
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Evaluate {
            data,
            config,
            assets,
            timeframes,
            all_observations,
            output,
        } => {
            let overrides = Overrides {
                data,
                assets,
                timeframes,
                all_observations,
                output,
            };
            run_evaluate(config.as_ref(), &overrides)
        }
        Command::Classify {
            data,
            config,
            output,
        } => run_classify(
            config.as_ref(),
            &Overrides {
                data,
                output,
                ..Overrides::default()
            },
        ),
        Command::Columns { data, config } => run_columns(
            config.as_ref(),
            &Overrides {
                data,
                ..Overrides::default()
            },
        ),
        Command::CheckRules { data, config } => {
            let overrides = Overrides {
                data,
                ..Overrides::default()
            };
            match resolve_settings(config.as_ref(), &overrides) {
                Ok(settings) => run_check_rules(&settings.table_adapter()),
                Err(code) => code,
            }
        }
        Command::Legend { data, config } => run_legend(
            config.as_ref(),
            &Overrides {
                data,
                ..Overrides::default()
            },
        ),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = KryptoError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Loads and validates the config file, or an empty config when none is given.
fn load_checked_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, ExitCode> {
    let adapter = match path {
        Some(p) => {
            eprintln!("Loading config from {}", p.display());
            load_config(p)?
        }
        None => FileConfigAdapter::from_string("").map_err(|reason| {
            let err = KryptoError::ConfigParse {
                file: "<empty>".into(),
                reason,
            };
            eprintln!("error: {err}");
            ExitCode::from(&err)
        })?,
    };
    if let Err(e) = validate_config(&adapter) {
        eprintln!("error: {e}");
        return Err((&e).into());
    }
    Ok(adapter)
}

pub fn build_key_columns(config: &dyn ConfigPort) -> KeyColumns {
    let defaults = KeyColumns::default();
    let column = |key: &str, default: String| {
        config
            .get_string("columns", key)
            .map(|v| v.trim().to_string())
            .unwrap_or(default)
    };
    KeyColumns {
        asset: column("asset", defaults.asset),
        timeframe: column("timeframe", defaults.timeframe),
        timestamp: column("timestamp", defaults.timestamp),
    }
}

pub fn build_filter(config: &dyn ConfigPort, overrides: &Overrides) -> ObservationFilter {
    let pick = |cli: &[String], key: &str| {
        if cli.is_empty() {
            config.get_list("filter", key).unwrap_or_default()
        } else {
            cli.to_vec()
        }
    };
    ObservationFilter {
        assets: pick(&overrides.assets, "assets"),
        timeframes: pick(&overrides.timeframes, "timeframes"),
        latest_only: !overrides.all_observations
            && config.get_bool("filter", "latest_only", true),
    }
}

pub fn build_settings(
    config: &dyn ConfigPort,
    overrides: &Overrides,
) -> Result<Settings, KryptoError> {
    let data_dir = match &overrides.data {
        Some(d) => d.clone(),
        None => config
            .get_string("data", "dir")
            .map(PathBuf::from)
            .ok_or_else(|| KryptoError::ConfigMissing {
                section: "data".into(),
                key: "dir".into(),
            })?,
    };
    let delimiter = match config.get_string("data", "delimiter") {
        Some(raw) => parse_delimiter(&raw).ok_or_else(|| KryptoError::ConfigInvalid {
            section: "data".into(),
            key: "delimiter".into(),
            reason: format!("unsupported delimiter '{}'", raw.trim()),
        })?,
        None => b',',
    };

    Ok(Settings {
        data_dir,
        delimiter,
        keys: build_key_columns(config),
        filter: build_filter(config, overrides),
        output: overrides
            .output
            .clone()
            .or_else(|| config.get_string("output", "path").map(PathBuf::from)),
    })
}

fn resolve_settings(config: Option<&PathBuf>, overrides: &Overrides) -> Result<Settings, ExitCode> {
    let adapter = load_checked_config(config)?;
    build_settings(&adapter, overrides).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

/// Loads both sheets and runs the rule engine.
pub fn evaluate_sheets(
    port: &dyn TablePort,
    settings: &Settings,
) -> Result<Evaluation, KryptoError> {
    let data = port.load_table(DATA_SHEET)?;
    let rules = RuleSet::from_table(&port.load_table(RULES_SHEET)?);
    if rules.is_empty() {
        eprintln!("warning: no rules in {}", RULES_SHEET);
    }
    Ok(pipeline::evaluate(&data, &rules, &settings.filter, &settings.keys))
}

/// Loads the fixed-form data sheet into a fresh session log.
pub fn classify_sheet(port: &dyn TablePort) -> Result<ObservationLog, KryptoError> {
    let data = port.load_table(DATA_SHEET)?;
    let mut log = ObservationLog::new();
    let taken = log.extend_from_table(&data);
    eprintln!("{} of {} observations classified", taken, data.len());
    Ok(log)
}

/// Outcome of compiling one rule against the data columns.
#[derive(Debug, Clone)]
pub struct RuleCheck {
    pub rule: Rule,
    pub parsed: Result<Expr, ParseError>,
    /// Variables that are not a column of the data sheet.
    pub unknown_columns: Vec<String>,
}

pub fn check_rules(port: &dyn TablePort) -> Result<Vec<RuleCheck>, KryptoError> {
    let data = port.load_table(DATA_SHEET)?;
    let rules = RuleSet::from_table(&port.load_table(RULES_SHEET)?);
    let mapping = ColumnMapping::from_columns(&data.columns);
    let known: BTreeSet<&str> = mapping.entries().iter().map(|(_, n)| n.as_str()).collect();

    let compiled = rules.compile(&mapping);
    let checks = compiled
        .entries()
        .iter()
        .map(|(rule, parsed)| {
            let unknown_columns = match parsed {
                Ok(expr) => expr
                    .variables()
                    .into_iter()
                    .filter(|v| !known.contains(v.as_str()))
                    .collect(),
                Err(_) => Vec::new(),
            };
            RuleCheck {
                rule: (*rule).clone(),
                parsed: parsed.clone(),
                unknown_columns,
            }
        })
        .collect();
    Ok(checks)
}

fn run_evaluate(config_path: Option<&PathBuf>, overrides: &Overrides) -> ExitCode {
    // Stage 1: Resolve settings
    let settings = match resolve_settings(config_path, overrides) {
        Ok(s) => s,
        Err(code) => return code,
    };

    // Stage 2: Load sheets and evaluate
    let evaluation = match evaluate_sheets(&settings.table_adapter(), &settings) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 3: Export
    let exporter = CsvExportAdapter::new();
    let written = match &settings.output {
        Some(path) => exporter.write_recommendations(&evaluation.records, path),
        None => exporter.write_recommendations_to(&evaluation.records, io::stdout().lock()),
    };
    if let Err(e) = written {
        eprintln!("error: {e}");
        return (&e).into();
    }

    eprintln!(
        "{} observations evaluated, {} with a recommendation",
        evaluation.records.len(),
        evaluation.matched()
    );
    if let Some(path) = &settings.output {
        eprintln!("Recommendations written to: {}", path.display());
    }
    ExitCode::SUCCESS
}

fn run_classify(config_path: Option<&PathBuf>, overrides: &Overrides) -> ExitCode {
    let settings = match resolve_settings(config_path, overrides) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let log = match classify_sheet(&settings.table_adapter()) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let exporter = CsvExportAdapter::new();
    let written = match &settings.output {
        Some(path) => exporter.write_classified(&log, path),
        None => exporter.write_classified_to(&log, io::stdout().lock()),
    };
    if let Err(e) = written {
        eprintln!("error: {e}");
        return (&e).into();
    }
    ExitCode::SUCCESS
}

fn run_columns(config_path: Option<&PathBuf>, overrides: &Overrides) -> ExitCode {
    let settings = match resolve_settings(config_path, overrides) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let data = match settings.table_adapter().load_table(DATA_SHEET) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let mapping = ColumnMapping::from_columns(&data.columns);
    if mapping.is_empty() {
        eprintln!("No columns found in {}", DATA_SHEET);
        return ExitCode::SUCCESS;
    }
    for (original, normalized) in mapping.entries() {
        println!("{} -> {}", original, normalized);
    }
    ExitCode::SUCCESS
}

pub fn run_check_rules(port: &dyn TablePort) -> ExitCode {
    let checks = match check_rules(port) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let mut first_error = None;
    for (i, check) in checks.iter().enumerate() {
        let rule = &check.rule;
        eprintln!("\nRule {} ({}, priority {}):", i + 1, rule.recommendation, rule.priority);
        match &check.parsed {
            Ok(expr) => {
                eprintln!("  Parsed: {}", expr);
                eprintln!("  Raw:    {}", rule.expression);
                for column in &check.unknown_columns {
                    eprintln!("  warning: unknown column '{}' never matches", column);
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e.display_with_context(&rule.expression));
                first_error.get_or_insert_with(|| e.clone());
            }
        }
    }

    match first_error {
        Some(e) => {
            let failed = checks.iter().filter(|c| c.parsed.is_err()).count();
            eprintln!("\n{} of {} rules failed to parse", failed, checks.len());
            (&KryptoError::from(e)).into()
        }
        None => {
            eprintln!("\nAll {} rules parsed.", checks.len());
            ExitCode::SUCCESS
        }
    }
}

/// The user's `Legenden` sheet, or `None` when it is missing or has no rows.
pub fn load_legend_sheet(port: &dyn TablePort) -> Result<Option<Table>, KryptoError> {
    let sheet = port.load_table(LEGEND_SHEET)?;
    Ok((!sheet.is_empty()).then_some(sheet))
}

/// Writes the built-in code legends, then the rows of `sheet`.
pub fn write_legend<W: Write>(sheet: Option<&Table>, mut out: W) -> Result<(), KryptoError> {
    writeln!(out, "MACD-Position:")?;
    for (position, description) in MACD_POSITIONS {
        writeln!(out, "  {}  {}", position, description)?;
    }
    writeln!(out, "\nMACD zu Signallinie:")?;
    for signal in SignalCode::ALL {
        writeln!(out, "  {}  {}", signal.code(), signal.description())?;
    }
    writeln!(out, "\nMACD-Histogramm:")?;
    for histogram in HistogramCode::ALL {
        writeln!(out, "  {}  {}", histogram.code(), histogram.description())?;
    }
    writeln!(out, "\nBollinger:")?;
    for state in BollingerState::ALL {
        writeln!(out, "  {}", state.label())?;
    }
    writeln!(out, "\nDivergenz:")?;
    for state in DivergenceState::ALL {
        writeln!(out, "  {}", state.label())?;
    }

    if let Some(sheet) = sheet {
        writeln!(out, "\n{}:", LEGEND_SHEET)?;
        writeln!(out, "  {}", sheet.columns.join(" | "))?;
        for row in &sheet.rows {
            writeln!(out, "  {}", row.join(" | "))?;
        }
    }
    out.flush()?;
    Ok(())
}

fn run_legend(config_path: Option<&PathBuf>, overrides: &Overrides) -> ExitCode {
    let config = match load_checked_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    // Without a data directory only the built-in legends are shown.
    let sheet = if overrides.data.is_some() || config.get_string("data", "dir").is_some() {
        let loaded = build_settings(&config, overrides)
            .and_then(|settings| load_legend_sheet(&settings.table_adapter()));
        match loaded {
            Ok(sheet) => sheet,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        }
    } else {
        None
    };

    match write_legend(sheet.as_ref(), io::stdout().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn cli_parses_repeated_filters() {
        let cli = Cli::try_parse_from([
            "kryptosignal",
            "evaluate",
            "--data",
            "sheets",
            "--asset",
            "BTC",
            "--asset",
            "ETH",
            "--all-observations",
        ])
        .unwrap();
        match cli.command {
            Command::Evaluate {
                assets,
                all_observations,
                data,
                ..
            } => {
                assert_eq!(assets, vec!["BTC", "ETH"]);
                assert!(all_observations);
                assert_eq!(data, Some(PathBuf::from("sheets")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn legend_accepts_optional_data() {
        let cli = Cli::try_parse_from(["kryptosignal", "legend"]).unwrap();
        assert!(matches!(cli.command, Command::Legend { data: None, .. }));
        let cli = Cli::try_parse_from(["kryptosignal", "legend", "-d", "sheets"]).unwrap();
        assert!(
            matches!(cli.command, Command::Legend { data: Some(d), .. } if d == PathBuf::from("sheets"))
        );
    }

    #[test]
    fn legend_without_sheet_has_builtin_tables_only() {
        let mut out = Vec::new();
        write_legend(None, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("MACD-Position:\n  8  Sehr weit über 0\n"));
        assert!(text.contains("\nDivergenz:\n"));
        assert!(!text.contains(LEGEND_SHEET));
    }

    #[test]
    fn legend_appends_sheet_rows() {
        let sheet = Table::new(vec!["Code".into(), "Bedeutung".into()])
            .with_row(&["b", "steigt stark"]);
        let mut out = Vec::new();
        write_legend(Some(&sheet), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("\nLegenden:\n  Code | Bedeutung\n  b | steigt stark\n"));
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn legend_write_failure_is_io_error() {
        let err = write_legend(None, FailingWriter).unwrap_err();
        assert!(matches!(err, KryptoError::Io(_)));
        assert_eq!(format!("{:?}", ExitCode::from(&err)), format!("{:?}", ExitCode::from(1u8)));
    }

    #[test]
    fn check_rules_subcommand_name() {
        let cli = Cli::try_parse_from(["kryptosignal", "check-rules", "-d", "x"]).unwrap();
        assert!(matches!(cli.command, Command::CheckRules { .. }));
    }

    #[test]
    fn defaults_without_config() {
        let overrides = Overrides {
            data: Some(PathBuf::from("sheets")),
            ..Overrides::default()
        };
        let settings = build_settings(&config(""), &overrides).unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("sheets"));
        assert_eq!(settings.delimiter, b',');
        assert_eq!(settings.keys, KeyColumns::default());
        assert!(settings.filter.latest_only);
        assert!(settings.filter.assets.is_empty());
        assert_eq!(settings.output, None);
    }

    #[test]
    fn missing_data_dir_is_config_missing() {
        let err = build_settings(&config(""), &Overrides::default()).unwrap_err();
        assert!(matches!(err, KryptoError::ConfigMissing { key, .. } if key == "dir"));
    }

    #[test]
    fn config_supplies_everything() {
        let cfg = config(
            "[data]\ndir = /tmp/sheets\ndelimiter = semicolon\n\
             [columns]\nasset = Coin\n\
             [filter]\nassets = BTC, ETH\nlatest_only = false\n\
             [output]\npath = out.csv\n",
        );
        let settings = build_settings(&cfg, &Overrides::default()).unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("/tmp/sheets"));
        assert_eq!(settings.delimiter, b';');
        assert_eq!(settings.keys.asset, "Coin");
        assert_eq!(settings.keys.timeframe, "Timeframe");
        assert_eq!(settings.filter.assets, vec!["BTC", "ETH"]);
        assert!(!settings.filter.latest_only);
        assert_eq!(settings.output, Some(PathBuf::from("out.csv")));
    }

    #[test]
    fn command_line_overrides_config() {
        let cfg = config("[data]\ndir = a\n[filter]\nassets = BTC\ntimeframes = 1D\n[output]\npath = a.csv\n");
        let overrides = Overrides {
            data: Some(PathBuf::from("b")),
            assets: vec!["SOL".into()],
            all_observations: true,
            output: Some(PathBuf::from("b.csv")),
            ..Overrides::default()
        };
        let settings = build_settings(&cfg, &overrides).unwrap();
        assert_eq!(settings.data_dir, PathBuf::from("b"));
        assert_eq!(settings.filter.assets, vec!["SOL"]);
        assert_eq!(settings.filter.timeframes, vec!["1D"]);
        assert!(!settings.filter.latest_only);
        assert_eq!(settings.output, Some(PathBuf::from("b.csv")));
    }
}
