// src/extractors/report.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::utils::error::AttemptError;
use crate::utils::truncate;

// Para numbers come from headings like "Para-3: ..."; anything outside this
// range is a hallucinated or misread number.
const MIN_PARA_NUMBER: i64 = 1;
const MAX_PARA_NUMBER: i64 = 50;

const DIAGNOSTIC_LIMIT: usize = 200;

// --- Record types ---

/// Document-level fields extracted once per report. Every field is optional;
/// the model is instructed to use null for anything it cannot find.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DarReportHeader {
    pub audit_group_number: Option<i64>,
    pub gstin: Option<String>,
    pub trade_name: Option<String>,
    pub category: Option<String>,
    pub total_amount_detected_overall_rs: Option<f64>,
    pub total_amount_recovered_overall_rs: Option<f64>,
}

impl DarReportHeader {
    pub fn is_empty(&self) -> bool {
        self == &DarReportHeader::default()
    }
}

/// Resolution status of an audit para, restricted to the five wordings the
/// department uses on record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParaStatus {
    #[serde(rename = "Agreed and Paid")]
    AgreedAndPaid,
    #[serde(rename = "Agreed yet to pay")]
    AgreedYetToPay,
    #[serde(rename = "Partially agreed and paid")]
    PartiallyAgreedAndPaid,
    #[serde(rename = "Partially agreed, yet to paid")]
    PartiallyAgreedYetToPaid,
    #[serde(rename = "Not agreed")]
    NotAgreed,
}

impl ParaStatus {
    /// Exact-match parse of the five status literals.
    pub fn parse(label: &str) -> Option<ParaStatus> {
        match label {
            "Agreed and Paid" => Some(ParaStatus::AgreedAndPaid),
            "Agreed yet to pay" => Some(ParaStatus::AgreedYetToPay),
            "Partially agreed and paid" => Some(ParaStatus::PartiallyAgreedAndPaid),
            "Partially agreed, yet to paid" => Some(ParaStatus::PartiallyAgreedYetToPaid),
            "Not agreed" => Some(ParaStatus::NotAgreed),
            _ => None,
        }
    }
}

/// One finding paragraph within the report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditPara {
    pub audit_para_number: Option<i64>,
    pub audit_para_heading: Option<String>,
    pub revenue_involved_lakhs_rs: Option<f64>,
    pub revenue_recovered_lakhs_rs: Option<f64>,
    pub status_of_para: Option<ParaStatus>,
}

/// The structured record handed to the caller.
///
/// `parsing_errors` is `Some` whenever extraction did not fully succeed.
/// `header` and `audit_paras` may still carry partial data alongside it;
/// downstream review decides what to keep.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedDarReport {
    #[serde(default)]
    pub header: DarReportHeader,
    #[serde(default)]
    pub audit_paras: Vec<AuditPara>,
    #[serde(default)]
    pub parsing_errors: Option<String>,
}

impl ParsedDarReport {
    /// Empty record carrying only a diagnostic.
    pub fn from_error(message: impl Into<String>) -> Self {
        ParsedDarReport {
            header: DarReportHeader::default(),
            audit_paras: Vec::new(),
            parsing_errors: Some(message.into()),
        }
    }
}

// --- JSON tree -> typed record coercion ---

/// Builds the typed record from a parsed JSON tree.
///
/// Missing `header`/`audit_paras` keys are synthesized as empty values with a
/// note in `parsing_errors` rather than rejected. Unknown keys are ignored.
/// Field coercion failures are collected across the whole tree and surfaced
/// as a single `SchemaViolation`, so one bad attempt yields one retryable
/// error listing everything that was wrong with it.
pub fn report_from_json(value: Value) -> Result<ParsedDarReport, AttemptError> {
    let Value::Object(mut root) = value else {
        return Err(AttemptError::SchemaViolation(
            "top-level JSON value is not an object".to_string(),
        ));
    };

    let mut missing: Vec<&str> = Vec::new();
    if !root.contains_key("header") {
        root.insert("header".to_string(), Value::Object(Map::new()));
        missing.push("header");
    }
    if !root.contains_key("audit_paras") {
        root.insert("audit_paras".to_string(), Value::Array(Vec::new()));
        missing.push("audit_paras");
    }
    let fallback_note = if missing.is_empty() {
        None
    } else {
        Some(format!(
            "Gemini response missing required key(s) {:?}; using fallback structure.",
            missing
        ))
    };

    let mut failures: Vec<String> = Vec::new();
    let header = coerce_header(&root["header"], &mut failures);
    let audit_paras = coerce_paras(&root["audit_paras"], &mut failures);

    // The model may volunteer its own notes under "parsing_errors"; keep them.
    let model_note = match root.get("parsing_errors") {
        Some(Value::String(note)) if !note.trim().is_empty() => Some(note.clone()),
        _ => None,
    };

    if !failures.is_empty() {
        return Err(AttemptError::SchemaViolation(truncate(
            &failures.join("; "),
            DIAGNOSTIC_LIMIT,
        )));
    }

    let parsing_errors = match (fallback_note, model_note) {
        (None, None) => None,
        (Some(fallback), None) => Some(fallback),
        (None, Some(model)) => Some(model),
        (Some(fallback), Some(model)) => Some(format!("{} | {}", fallback, model)),
    };

    Ok(ParsedDarReport {
        header,
        audit_paras,
        parsing_errors,
    })
}

fn coerce_header(value: &Value, failures: &mut Vec<String>) -> DarReportHeader {
    let Some(map) = value.as_object() else {
        failures.push("'header' is not an object".to_string());
        return DarReportHeader::default();
    };

    DarReportHeader {
        audit_group_number: coerce_integer(
            "header.audit_group_number",
            map.get("audit_group_number"),
            failures,
        ),
        gstin: coerce_string("header.gstin", map.get("gstin"), failures),
        trade_name: coerce_string("header.trade_name", map.get("trade_name"), failures),
        category: coerce_string("header.category", map.get("category"), failures),
        total_amount_detected_overall_rs: coerce_float(
            "header.total_amount_detected_overall_rs",
            map.get("total_amount_detected_overall_rs"),
            failures,
        ),
        total_amount_recovered_overall_rs: coerce_float(
            "header.total_amount_recovered_overall_rs",
            map.get("total_amount_recovered_overall_rs"),
            failures,
        ),
    }
}

fn coerce_paras(value: &Value, failures: &mut Vec<String>) -> Vec<AuditPara> {
    let Some(items) = value.as_array() else {
        failures.push("'audit_paras' is not an array".to_string());
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| coerce_para(idx, item, failures))
        .collect()
}

fn coerce_para(idx: usize, value: &Value, failures: &mut Vec<String>) -> AuditPara {
    let Some(map) = value.as_object() else {
        failures.push(format!("audit_paras[{}] is not an object", idx));
        return AuditPara::default();
    };

    let field = |name: &str| format!("audit_paras[{}].{}", idx, name);

    AuditPara {
        audit_para_number: coerce_para_number(
            &field("audit_para_number"),
            map.get("audit_para_number"),
            failures,
        ),
        audit_para_heading: coerce_string(
            &field("audit_para_heading"),
            map.get("audit_para_heading"),
            failures,
        ),
        revenue_involved_lakhs_rs: coerce_float(
            &field("revenue_involved_lakhs_rs"),
            map.get("revenue_involved_lakhs_rs"),
            failures,
        ),
        revenue_recovered_lakhs_rs: coerce_float(
            &field("revenue_recovered_lakhs_rs"),
            map.get("revenue_recovered_lakhs_rs"),
            failures,
        ),
        status_of_para: coerce_status(&field("status_of_para"), map.get("status_of_para"), failures),
    }
}

// Scalar coercions accept the mistakes the model actually makes (numbers
// quoted as strings, integers written as floats) and reject everything else.

fn coerce_string(field: &str, value: Option<&Value>, failures: &mut Vec<String>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text.clone()),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(other) => {
            failures.push(format!("{}: expected string, got {}", field, type_name(other)));
            None
        }
    }
}

fn coerce_float(field: &str, value: Option<&Value>, failures: &mut Vec<String>) -> Option<f64> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => match text.trim().parse::<f64>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                failures.push(format!(
                    "{}: cannot parse '{}' as a number",
                    field,
                    truncate(text, 40)
                ));
                None
            }
        },
        Some(other) => {
            failures.push(format!("{}: expected number, got {}", field, type_name(other)));
            None
        }
    }
}

fn coerce_integer(field: &str, value: Option<&Value>, failures: &mut Vec<String>) -> Option<i64> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(number)) => {
            if let Some(integer) = number.as_i64() {
                Some(integer)
            } else if let Some(float) = number.as_f64().filter(|float| float.fract() == 0.0) {
                // "3.0" for para three is common model output.
                Some(float as i64)
            } else {
                failures.push(format!("{}: {} is not an integer", field, number));
                None
            }
        }
        Some(Value::String(text)) => match text.trim().parse::<i64>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                failures.push(format!(
                    "{}: cannot parse '{}' as an integer",
                    field,
                    truncate(text, 40)
                ));
                None
            }
        },
        Some(other) => {
            failures.push(format!("{}: expected integer, got {}", field, type_name(other)));
            None
        }
    }
}

fn coerce_para_number(field: &str, value: Option<&Value>, failures: &mut Vec<String>) -> Option<i64> {
    let number = coerce_integer(field, value, failures)?;
    if (MIN_PARA_NUMBER..=MAX_PARA_NUMBER).contains(&number) {
        Some(number)
    } else {
        failures.push(format!(
            "{}: {} is outside the valid range {}..={}",
            field, number, MIN_PARA_NUMBER, MAX_PARA_NUMBER
        ));
        None
    }
}

fn coerce_status(
    field: &str,
    value: Option<&Value>,
    failures: &mut Vec<String>,
) -> Option<ParaStatus> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(label)) => match ParaStatus::parse(label) {
            Some(status) => Some(status),
            None => {
                failures.push(format!(
                    "{}: '{}' is not a recognized para status",
                    field,
                    truncate(label, 60)
                ));
                None
            }
        },
        Some(other) => {
            failures.push(format!("{}: expected string, got {}", field, type_name(other)));
            None
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
