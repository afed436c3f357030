// Serializes the report: the JSON summaries, the detail tables and the checksums.

use std::collections::BTreeMap;

use crate::report::{context::*, io_json::*, *};

pub const SUMMARY_FILE: &str = "summary.json";
pub const DETAIL_DIR: &str = "results-detail";
pub const CHECKSUM_FILE: &str = "SHA256SUMS.txt";

/// The name of the summary of a language. English is the main summary.
pub fn summary_file_name(lang: &str) -> String {
    if lang == ENGLISH {
        SUMMARY_FILE.to_string()
    } else {
        format!("summary-{}.json", lang)
    }
}

pub fn detail_file_name(contest_id: &str) -> String {
    format!("{}/contest-{}.tsv", DETAIL_DIR, contest_id)
}

pub fn summary_json(ctx: &ReportContext) -> ReportResult<String> {
    let js = serde_json::to_value(ctx).context(WritingJsonSnafu {})?;
    let pretty = serde_json::to_string_pretty(&js).context(WritingJsonSnafu {})?;
    Ok(pretty)
}

/// One line per precinct followed by the contest total. The columns are the keys of
/// the selector, labeled in English.
pub fn detail_tsv(
    bundle: &ElectionBundle,
    lc: &LoadedContest,
    selector: &Selector,
) -> ReportResult<String> {
    let path = detail_file_name(lc.def.id.as_str());
    let contest = &lc.contest;
    let keys = contest.resolve_selector(selector).context(TabulationSnafu {})?;
    let labels = Labels::new(ENGLISH, &bundle.translations);

    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_writer(vec![]);
    let mut header: Vec<String> = vec![labels.phrase("precinct")];
    for key in keys.iter() {
        header.push(key_label(&labels, bundle, lc.def, key));
    }
    wtr.write_record(&header)
        .context(WritingTsvSnafu { path: path.clone() })?;

    let mut lines: Vec<(String, RowFilter)> = contest
        .precincts()
        .iter()
        .map(|p| (p.to_string(), RowFilter::default().precinct(p)))
        .collect();
    lines.push((labels.phrase("total"), RowFilter::default()));
    for (name, filter) in lines.iter() {
        let mut record: Vec<String> = vec![name.clone()];
        for key in keys.iter() {
            let total = contest
                .total_for_key(key, filter)
                .context(TabulationSnafu {})?;
            record.push(total.to_string());
        }
        wtr.write_record(&record)
            .context(WritingTsvSnafu { path: path.clone() })?;
    }
    let data = match wtr.into_inner() {
        Ok(data) => data,
        Err(e) => whatever!("{}: could not flush the table: {}", path, e),
    };
    let res = match String::from_utf8(data) {
        Ok(s) => s,
        Err(e) => whatever!("{}: invalid text: {}", path, e),
    };
    debug!("detail_tsv: {}: {} keys", path, keys.len());
    Ok(res)
}

/// `<hash> *<path>` for every file, sorted by path.
pub fn checksums(files: &BTreeMap<String, String>) -> String {
    let mut res = String::new();
    for (path, contents) in files.iter() {
        res.push_str(&format!("{} *{}\n", sha256::digest(contents.as_str()), path));
    }
    res
}

/// Writes the files under the output directory, then their checksums.
pub fn write_outputs(out_dir: &Path, files: &BTreeMap<String, String>) -> ReportResult<()> {
    let mut all = files.clone();
    all.insert(CHECKSUM_FILE.to_string(), checksums(files));
    for (rel_path, contents) in all.iter() {
        let path: PathBuf = out_dir.join(rel_path);
        let path_str = path.display().to_string();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context(WritingOutputSnafu {
                path: parent.display().to_string(),
            })?;
        }
        fs::write(&path, contents).context(WritingOutputSnafu { path: path_str.clone() })?;
        info!("write_outputs: {} ({} bytes)", path_str, contents.len());
    }
    Ok(())
}
