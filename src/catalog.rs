//! Need and clue catalogs.
//!
//! Catalogs are static data loaded once before either engine runs. The CSV
//! loaders filter malformed rows so the engines only ever see valid entries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Single-symbol need identifier. All per-need bookkeeping is keyed by this
/// type through explicit maps; codes are never synthesized into field names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NeedCode(pub char);

impl fmt::Display for NeedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable need catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeedDefinition {
    pub code: NeedCode,
    pub label: String,
    pub greeting_text: String,
}

/// The four examination methods a clue can come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosisMethod {
    /// 望 — visual observation.
    Observation,
    /// 聞 — listening and smelling.
    Listening,
    /// 問 — asking the patient.
    Inquiry,
    /// 切 — pulse taking.
    Palpation,
}

impl DiagnosisMethod {
    pub fn symbol(&self) -> &'static str {
        match self {
            DiagnosisMethod::Observation => "望",
            DiagnosisMethod::Listening => "聞",
            DiagnosisMethod::Inquiry => "問",
            DiagnosisMethod::Palpation => "切",
        }
    }

    pub fn from_symbol(s: &str) -> Option<DiagnosisMethod> {
        match s {
            "望" => Some(DiagnosisMethod::Observation),
            "聞" => Some(DiagnosisMethod::Listening),
            "問" => Some(DiagnosisMethod::Inquiry),
            "切" => Some(DiagnosisMethod::Palpation),
            _ => None,
        }
    }
}

impl fmt::Display for DiagnosisMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A discrete piece of diagnostic evidence with a fixed per-need confidence
/// contribution. Immutable catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clue {
    pub id: String,
    pub method: DiagnosisMethod,
    pub text: String,
    /// Non-negative confidence weight per need code. Codes absent from the
    /// map contribute zero.
    pub weights: BTreeMap<NeedCode, u32>,
}

impl Clue {
    pub fn weight_for(&self, code: NeedCode) -> u32 {
        self.weights.get(&code).copied().unwrap_or(0)
    }
}

/// Extracts the code column from a list of need definitions.
pub fn catalog_codes(needs: &[NeedDefinition]) -> Vec<NeedCode> {
    needs.iter().map(|n| n.code).collect()
}

/// Minimal CSV split: header row plus trimmed, non-empty data rows.
/// Matches the catalog files' format (no quoting or embedded commas).
fn parse_csv(text: &str) -> Vec<BTreeMap<String, String>> {
    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty());

    let headers: Vec<String> = match lines.next() {
        Some(header) => header.split(',').map(|h| h.trim().to_string()).collect(),
        None => return Vec::new(),
    };

    let mut rows = Vec::new();
    for line in lines {
        let values: Vec<&str> = line.split(',').map(str::trim).collect();
        let mut row = BTreeMap::new();
        let mut is_empty = true;
        for (i, header) in headers.iter().enumerate() {
            let value = values.get(i).copied().unwrap_or("");
            if !value.is_empty() {
                is_empty = false;
            }
            row.insert(header.clone(), value.to_string());
        }
        if !is_empty {
            rows.push(row);
        }
    }
    rows
}

/// Parses need definitions from CSV text (`NeedName,GreetingText` columns).
/// The code is the first symbol of the need name; rows without one are
/// dropped.
pub fn parse_needs(text: &str) -> Vec<NeedDefinition> {
    parse_csv(text)
        .into_iter()
        .filter_map(|row| {
            let label = row.get("NeedName").cloned().unwrap_or_default();
            let code = label.chars().next()?;
            Some(NeedDefinition {
                code: NeedCode(code),
                label,
                greeting_text: row.get("GreetingText").cloned().unwrap_or_default(),
            })
        })
        .collect()
}

/// Parses clues from CSV text. Weight columns are discovered from headers of
/// the form `Conf<code>` (e.g. `ConfA`), so the need-code set is driven by
/// the data, not hardcoded. Rows without a `ClueID` or with an unknown
/// method symbol are dropped.
pub fn parse_clues(text: &str) -> Vec<Clue> {
    parse_csv(text)
        .into_iter()
        .filter_map(|row| {
            let id = row.get("ClueID").filter(|v| !v.is_empty())?.clone();
            let method = DiagnosisMethod::from_symbol(row.get("DiagnosisMethod")?)?;
            let text = row.get("ClueText").cloned().unwrap_or_default();

            let mut weights = BTreeMap::new();
            for (header, value) in &row {
                if let Some(code) = header.strip_prefix("Conf") {
                    let mut chars = code.chars();
                    if let (Some(c), None) = (chars.next(), chars.next()) {
                        let weight = value.parse::<u32>().unwrap_or(0);
                        if weight > 0 {
                            weights.insert(NeedCode(c), weight);
                        }
                    }
                }
            }

            Some(Clue {
                id,
                method,
                text,
                weights,
            })
        })
        .collect()
}

/// Loads the need catalog from a CSV file.
pub fn load_needs(path: &Path) -> io::Result<Vec<NeedDefinition>> {
    let text = fs::read_to_string(path)?;
    Ok(parse_needs(&text))
}

/// Loads the clue catalog from a CSV file.
pub fn load_clues(path: &Path) -> io::Result<Vec<Clue>> {
    let text = fs::read_to_string(path)?;
    Ok(parse_clues(&text))
}
