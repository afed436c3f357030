use crate::report::*;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "buildTime")]
    pub build_time: Option<String>,
    pub deterministic: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    /// `tsv` or `xlsx`
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "worksheetName")]
    pub worksheet_name: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct InputSettings {
    pub election: String,
    #[serde(rename = "resultFiles", default)]
    pub result_files: Vec<FileSource>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReportSettings {
    #[serde(rename = "summarySelector")]
    pub summary_selector: Option<String>,
    #[serde(rename = "statsSelector")]
    pub stats_selector: Option<String>,
    #[serde(rename = "detailSelector")]
    pub detail_selector: Option<String>,
    #[serde(rename = "percentPrecision")]
    pub percent_precision: Option<u32>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    pub inputs: InputSettings,
    #[serde(default)]
    pub report: ReportSettings,
}

pub const DEFAULT_SUMMARY_SELECTOR: &str = "CHOICES";
pub const DEFAULT_STATS_SELECTOR: &str = "STATS";
pub const DEFAULT_DETAIL_SELECTOR: &str = "CHOICES";

impl ReportSettings {
    pub fn precision(&self) -> ReportResult<Precision> {
        match self.percent_precision {
            None => Ok(Precision::default()),
            Some(d) => match Precision::from_decimals(d) {
                Some(p) => Ok(p),
                None => whatever!("percentPrecision must be 0, 1 or 2, got {}", d),
            },
        }
    }

    pub fn summary_selector(&self) -> Selector {
        Selector::parse(
            self.summary_selector
                .as_deref()
                .unwrap_or(DEFAULT_SUMMARY_SELECTOR),
        )
    }

    pub fn stats_selector(&self) -> Selector {
        Selector::parse(self.stats_selector.as_deref().unwrap_or(DEFAULT_STATS_SELECTOR))
    }

    pub fn detail_selector(&self) -> &str {
        self.detail_selector
            .as_deref()
            .unwrap_or(DEFAULT_DETAIL_SELECTOR)
    }
}

pub fn read_config(path: &str) -> ReportResult<ReportConfig> {
    let config_str = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: ReportConfig =
        serde_json::from_str(&config_str).context(ParsingJsonSnafu { path })?;
    info!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> ReportResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_summary: {} bytes", contents.len());
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}
