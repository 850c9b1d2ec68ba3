use crate::rcv::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction")]
    pub contest_jurisdiction: Option<String>,
    #[serde(rename = "contestOffice")]
    pub contest_office: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
    pub office: Option<String>,
    pub threshold: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub question: Option<String>,
    #[serde(rename = "firstVoteColumnIndex")]
    _first_vote_column_index: Option<JSValue>,
    #[serde(rename = "firstVoteRowIndex")]
    _first_vote_row_index: Option<JSValue>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "choices")]
    pub choices: Option<Vec<String>>,
}

impl FileSource {
    /// A source described only by its location, with the default layout.
    pub fn from_input(provider: &str, file_path: &str) -> FileSource {
        FileSource {
            provider: provider.to_string(),
            file_path: file_path.to_string(),
            question: None,
            _first_vote_column_index: None,
            _first_vote_row_index: None,
            excel_worksheet_name: None,
            choices: None,
        }
    }

    /// The first column holding ranks, 0-based. Defaults to the first column.
    pub fn first_vote_column_index(&self) -> RcvResult<usize> {
        let x = read_js_int(&self._first_vote_column_index, 1)?;
        ensure!(x >= 1, ParsingJsonNumberSnafu {});
        Ok(x - 1)
    }

    /// The first row holding a ballot, 0-based. The row just above is the header.
    /// Defaults to the second row.
    pub fn first_vote_row_index(&self) -> RcvResult<usize> {
        let x = read_js_int(&self._first_vote_row_index, 2)?;
        ensure!(x >= 1, ParsingJsonNumberSnafu {});
        Ok(x - 1)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RcvCandidate {
    pub name: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RcvRules {
    #[serde(rename = "numberOfWinners")]
    _number_of_winners: Option<JSValue>,
    #[serde(rename = "rulesDescription")]
    pub rules_description: Option<String>,
}

impl RcvRules {
    pub fn with_seats(seats: u32) -> RcvRules {
        RcvRules {
            _number_of_winners: Some(JSValue::from(seats)),
            rules_description: None,
        }
    }

    pub fn number_of_winners(&self) -> RcvResult<u32> {
        let x = read_js_int(&self._number_of_winners, 1)?;
        u32::try_from(x).ok().context(ParsingJsonNumberSnafu {})
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RcvConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "cvrFileSources")]
    pub cvr_file_sources: Vec<FileSource>,
    pub candidates: Option<Vec<RcvCandidate>>,
    pub rules: RcvRules,
}

pub fn read_config(path: &str) -> BRcvResult<RcvConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: RcvConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> BRcvResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

// Numbers may be written as JSON numbers or as strings.
fn read_js_int(x: &Option<JSValue>, default: usize) -> RcvResult<usize> {
    match x {
        None | Some(JSValue::Null) => Ok(default),
        Some(JSValue::Number(n)) => n
            .as_u64()
            .and_then(|x| usize::try_from(x).ok())
            .context(ParsingJsonNumberSnafu {}),
        Some(JSValue::String(s)) => s
            .trim()
            .parse::<usize>()
            .ok()
            .context(ParsingJsonNumberSnafu {}),
        _ => None.context(ParsingJsonNumberSnafu {}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_or_strings() {
        let config: RcvConfig = serde_json::from_str(
            r#"{
                "outputSettings": { "contestName": "Test" },
                "cvrFileSources": [
                    { "provider": "csv", "filePath": "a.csv", "firstVoteColumnIndex": "3" },
                    { "provider": "xlsx", "filePath": "b.xlsx", "firstVoteRowIndex": 4 }
                ],
                "rules": { "numberOfWinners": "2" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.rules.number_of_winners().unwrap(), 2);
        assert_eq!(config.candidates, None);
        let s = &config.cvr_file_sources;
        assert_eq!(s[0].first_vote_column_index().unwrap(), 2);
        assert_eq!(s[0].first_vote_row_index().unwrap(), 1);
        assert_eq!(s[1].first_vote_column_index().unwrap(), 0);
        assert_eq!(s[1].first_vote_row_index().unwrap(), 3);
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let rules: RcvRules = serde_json::from_str(r#"{ "numberOfWinners": "two" }"#).unwrap();
        assert!(matches!(
            rules.number_of_winners(),
            Err(RcvError::ParsingJsonNumber {})
        ));
        let source: FileSource = serde_json::from_str(
            r#"{ "provider": "csv", "filePath": "a.csv", "firstVoteRowIndex": 0 }"#,
        )
        .unwrap();
        assert!(source.first_vote_row_index().is_err());
    }

    #[test]
    fn seats_beyond_u32_are_rejected() {
        for js in [
            r#"{ "numberOfWinners": "4294967297" }"#,
            r#"{ "numberOfWinners": 4294967297 }"#,
        ] {
            let rules: RcvRules = serde_json::from_str(js).unwrap();
            assert!(matches!(
                rules.number_of_winners(),
                Err(RcvError::ParsingJsonNumber {})
            ));
        }
    }
}
