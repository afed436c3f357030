use log::{debug, info, warn};

use results_tabulation::*;
use results_tabulation::{format::*, totals::*};
use snafu::{prelude::*, Snafu};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::report::config_reader::*;
use crate::report::context::*;
use crate::report::io_common::OverlayRow;
use crate::report::io_json::*;
use crate::report::writers::*;

pub mod config_reader;
pub mod context;
pub mod io_common;
pub mod io_json;
pub mod io_tsv;
pub mod io_xlsx;
pub mod writers;

#[derive(Debug, Snafu)]
pub enum ReportError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}: {source}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the summary"))]
    WritingJson { source: serde_json::Error },
    #[snafu(display("Error opening file {path}"))]
    OpeningTsv { source: csv::Error, path: String },
    #[snafu(display("Error reading file {path} at line {lineno}"))]
    ReadingTsv {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error writing table {path}"))]
    WritingTsv { source: csv::Error, path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet {sheet} in {path}"))]
    EmptyExcel { path: String, sheet: String },
    #[snafu(display("{path}: missing column {column}"))]
    MissingColumn { path: String, column: String },
    #[snafu(display("{path}: line {lineno}: invalid count {value:?}"))]
    InvalidCount {
        path: String,
        lineno: usize,
        value: String,
    },
    #[snafu(display("{path}: unknown contest {contest}"))]
    UnknownContest { contest: String, path: String },
    #[snafu(display("contest {contest}: unknown {kind} {code}"))]
    UnknownCode {
        contest: String,
        kind: String,
        code: String,
    },
    #[snafu(display("Tabulation error: {source}"))]
    Tabulation { source: TabulationError },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The configuration file has no parent directory"))]
    MissingParentDir {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ReportResult<T> = Result<T, ReportError>;

/// The command line options, which take precedence over the configuration.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RunOptions {
    pub config_path: String,
    pub reference_path: Option<String>,
    pub out_dir: Option<String>,
    pub build_time: Option<String>,
    pub deterministic: bool,
}

fn resolve_path(root: &Path, p: &str) -> String {
    root.join(p).display().to_string()
}

fn read_overlays(root: &Path, config: &ReportConfig) -> ReportResult<Vec<OverlayRow>> {
    let mut res: Vec<OverlayRow> = Vec::new();
    for source in config.inputs.result_files.iter() {
        let path = resolve_path(root, &source.file_path);
        let mut rows = match source.provider.as_str() {
            "tsv" => io_tsv::read_tsv_rows(&path)?,
            "xlsx" => io_xlsx::read_excel_rows(&path, source.worksheet_name.as_deref())?,
            x => whatever!("Provider not implemented {:?}", x),
        };
        res.append(&mut rows);
    }
    Ok(res)
}

// Dispatches the rows of the result files to their contests, keeping the file order.
fn rows_by_contest(
    bundle: &ElectionBundle,
    overlays: Vec<OverlayRow>,
    config: &ReportConfig,
) -> ReportResult<BTreeMap<String, Vec<ResultRow>>> {
    let turnout_id = bundle.turnout.as_ref().map(|t| t.id.clone());
    let mut res: BTreeMap<String, Vec<ResultRow>> = BTreeMap::new();
    for o in overlays.into_iter() {
        let known = bundle.contest(&o.contest).is_some() || turnout_id.as_deref() == Some(o.contest.as_str());
        if !known {
            return UnknownContestSnafu {
                contest: o.contest,
                path: config
                    .inputs
                    .result_files
                    .iter()
                    .map(|f| f.file_path.clone())
                    .collect::<Vec<String>>()
                    .join(", "),
            }
            .fail();
        }
        res.entry(o.contest).or_default().push(o.row);
    }
    Ok(res)
}

fn build_time(options: &RunOptions, config: &ReportConfig, deterministic: bool) -> Option<String> {
    let configured = options
        .build_time
        .clone()
        .or_else(|| config.output_settings.build_time.clone());
    if configured.is_some() || deterministic {
        return configured;
    }
    match SystemTime::now().duration_since(SystemTime::UNIX_EPOCH) {
        Ok(d) => Some(d.as_secs().to_string()),
        Err(e) => {
            warn!("build_time: clock before the epoch: {:?}", e);
            None
        }
    }
}

fn check_reference(reference_path: &str, summary: &str) -> ReportResult<()> {
    let reference = read_summary(reference_path)?;
    let pretty_reference = serde_json::to_string_pretty(&reference).context(WritingJsonSnafu {})?;
    if pretty_reference != summary {
        warn!("Found differences with the reference summary");
        print_diff(pretty_reference.as_str(), summary, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    info!("check_reference: summary matches {}", reference_path);
    Ok(())
}

/// Reads the configuration and the inputs it names, then writes the report.
pub fn run_report(options: &RunOptions) -> ReportResult<()> {
    let config = read_config(&options.config_path)?;
    let root = Path::new(options.config_path.as_str())
        .parent()
        .context(MissingParentDirSnafu {})?;
    let deterministic =
        options.deterministic || config.output_settings.deterministic.unwrap_or(false);
    let precision = config.report.precision()?;

    let bundle = read_election(&resolve_path(root, &config.inputs.election))?;
    let overlays = read_overlays(root, &config)?;
    let mut by_contest = rows_by_contest(&bundle, overlays, &config)?;

    let mut contests: Vec<LoadedContest> = Vec::with_capacity(bundle.contests.len());
    for def in bundle.contests.iter() {
        let extra = by_contest.remove(&def.id).unwrap_or_default();
        contests.push(LoadedContest {
            def,
            contest: build_contest(&bundle, def, &extra)?,
        });
    }
    let turnout = match &bundle.turnout {
        Some(def) => {
            let extra = by_contest.remove(&def.id).unwrap_or_default();
            Some(LoadedContest {
                def,
                contest: build_contest(&bundle, def, &extra)?,
            })
        }
        None => None,
    };

    let settings = ContextSettings {
        summary_selector: config.report.summary_selector(),
        stats_selector: config.report.stats_selector(),
        precision,
        build_time: build_time(options, &config, deterministic),
    };
    debug!("run_report: settings: {:?}", settings);

    let mut files: BTreeMap<String, String> = BTreeMap::new();
    for lang in bundle.languages.iter() {
        let labels = Labels::new(lang, &bundle.translations);
        let ctx = build_context(&labels, &bundle, &contests, turnout.as_ref(), &settings)?;
        files.insert(summary_file_name(lang), summary_json(&ctx)?);
    }
    if !files.contains_key(SUMMARY_FILE) {
        let labels = Labels::new(ENGLISH, &bundle.translations);
        let ctx = build_context(&labels, &bundle, &contests, turnout.as_ref(), &settings)?;
        files.insert(SUMMARY_FILE.to_string(), summary_json(&ctx)?);
    }
    for lc in contests.iter() {
        let selector = Selector::parse(
            lc.def
                .detail_selector
                .as_deref()
                .unwrap_or_else(|| config.report.detail_selector()),
        );
        files.insert(detail_file_name(&lc.def.id), detail_tsv(&bundle, lc, &selector)?);
    }

    let out_dir: Option<PathBuf> = match (&options.out_dir, &config.output_settings.output_directory) {
        (Some(d), _) => Some(PathBuf::from(d)),
        (None, Some(d)) => Some(root.join(d)),
        (None, None) => None,
    };
    let summary = files.get(SUMMARY_FILE).cloned().unwrap_or_default();
    match out_dir {
        Some(dir) => write_outputs(&dir, &files)?,
        None => println!("{}", summary),
    }

    if let Some(reference_path) = &options.reference_path {
        check_reference(reference_path, &summary)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_path(name: &str) -> String {
        format!("{}/tests/data/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    fn out_dir(name: &str) -> String {
        let dir = std::env::temp_dir().join(format!("resultsrpt-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir.display().to_string()
    }

    fn options(out: &str) -> RunOptions {
        RunOptions {
            config_path: data_path("config.json"),
            out_dir: Some(out.to_string()),
            deterministic: true,
            ..RunOptions::default()
        }
    }

    #[test]
    fn end_to_end() {
        let _ = env_logger::builder().is_test(true).try_init();
        let out = out_dir("e2e");
        run_report(&options(&out)).unwrap();
        for f in [
            "summary.json",
            "summary-es.json",
            "results-detail/contest-mayor.tsv",
            "results-detail/contest-measure-a.tsv",
            "results-detail/contest-council.tsv",
            "SHA256SUMS.txt",
        ] {
            assert!(Path::new(&out).join(f).exists(), "missing {}", f);
        }

        let summary = read_summary(&format!("{}/summary.json", out)).unwrap();
        assert_eq!(summary["buildTime"], "2024-11-05T20:00:00");
        let mayor = &summary["contests"][0];
        assert_eq!(mayor["id"], "mayor");
        assert_eq!(mayor["rcv"]["order"][0], "A");
        assert_eq!(mayor["rcv"]["cutoffPercent"], 50.0);
        let carla = &mayor["rcv"]["roundTables"][1]["choices"][2];
        assert_eq!(carla["id"], "C");
        assert_eq!(carla["transfer"], -20);
        assert_eq!(carla["afterEliminated"], true);
        let council = &summary["contests"][2];
        // Rows from the TSV file are added to the election bundle.
        assert_eq!(council["choices"][0]["id"], "X");
        assert_eq!(council["choices"][0]["votes"], 40);
        assert_eq!(summary["turnout"]["percentOfRegistered"], "65.00%");
        assert_eq!(summary["turnout"]["percentOfEligible"], "81.25%");

        let es = read_summary(&format!("{}/summary-es.json", out)).unwrap();
        assert_eq!(es["contests"][0]["title"], "Alcalde");

        let sums = fs::read_to_string(format!("{}/SHA256SUMS.txt", out)).unwrap();
        assert_eq!(sums.lines().count(), 5);
        assert!(sums.contains(" *summary.json"));
    }

    #[test]
    fn deterministic_runs() {
        let out1 = out_dir("det1");
        let out2 = out_dir("det2");
        run_report(&options(&out1)).unwrap();
        let mut opts = options(&out2);
        opts.reference_path = Some(format!("{}/summary.json", out1));
        run_report(&opts).unwrap();
        for f in ["SHA256SUMS.txt", "summary-es.json", "results-detail/contest-council.tsv"] {
            let a = fs::read_to_string(Path::new(&out1).join(f)).unwrap();
            let b = fs::read_to_string(Path::new(&out2).join(f)).unwrap();
            assert_eq!(a, b, "{} differs", f);
        }
    }

    #[test]
    fn reference_mismatch() {
        let out = out_dir("mismatch");
        let mut opts = options(&out);
        opts.reference_path = Some(data_path("election.json"));
        let res = run_report(&opts);
        assert!(matches!(res, Err(ReportError::Whatever { .. })));
    }

    #[test]
    fn cli_build_time_wins() {
        let config: ReportConfig =
            serde_json::from_str(r#"{"inputs": {"election": "e.json"}, "outputSettings": {"buildTime": "t0"}}"#)
                .unwrap();
        let mut opts = RunOptions::default();
        assert_eq!(build_time(&opts, &config, true), Some("t0".to_string()));
        opts.build_time = Some("t1".to_string());
        assert_eq!(build_time(&opts, &config, false), Some("t1".to_string()));
        let bare: ReportConfig = serde_json::from_str(r#"{"inputs": {"election": "e.json"}}"#).unwrap();
        assert_eq!(build_time(&RunOptions::default(), &bare, true), None);
        assert!(build_time(&RunOptions::default(), &bare, false).is_some());
    }

    #[test]
    fn missing_config() {
        let res = run_report(&RunOptions {
            config_path: data_path("no-such-config.json"),
            ..RunOptions::default()
        });
        assert!(matches!(res, Err(ReportError::OpeningJson { .. })));
    }
}
