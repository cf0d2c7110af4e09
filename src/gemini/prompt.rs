// src/gemini/prompt.rs

/// Input ceiling ahead of the model call. Longer report text is cut and
/// marked so the model knows it is not seeing the whole document.
pub const MAX_INPUT_CHARS: usize = 25_000;

const TRUNCATION_NOTE: &str = "\n[INFO: Text truncated due to model input limits]";

/// Builds the extraction prompt for one report.
///
/// The JSON shape described here is the contract the response sanitizer and
/// schema validator enforce on the way back; keep the two in sync.
pub fn build_extraction_prompt(source_text: &str) -> String {
    let text = if source_text.chars().count() > MAX_INPUT_CHARS {
        let cut: String = source_text.chars().take(MAX_INPUT_CHARS).collect();
        format!("{}{}", cut, TRUNCATION_NOTE)
    } else {
        source_text.to_string()
    };

    format!(
        r#"You are an expert GST audit report analyst. Based on the following text from a Departmental Audit Report (DAR), extract the specified information and structure it as a JSON object.

The JSON object should follow this structure precisely:
{{
  "header": {{
    "audit_group_number": "integer or null (e.g., for 'Group-VI' or 'Gr 6', extract 6)",
    "gstin": "string or null",
    "trade_name": "string or null",
    "category": "string or null (Large/Medium/Small)",
    "total_amount_detected_overall_rs": "float or null (numeric value in Rupees)",
    "total_amount_recovered_overall_rs": "float or null (numeric value in Rupees)"
  }},
  "audit_paras": [
    {{
      "audit_para_number": "integer or null (primary number from the para heading, between 1 and 50)",
      "audit_para_heading": "string or null (the descriptive title of the para)",
      "revenue_involved_lakhs_rs": "float or null (numeric value in Lakhs of Rupees)",
      "revenue_recovered_lakhs_rs": "float or null (numeric value in Lakhs of Rupees)",
      "status_of_para": "string or null"
    }}
  ],
  "parsing_errors": "string or null"
}}

Instructions:
1. Extract trade_name, gstin, category and the overall amounts from the document.
2. Identify each distinct audit para with its number, heading, amounts (converted to Lakhs) and status.
3. For status_of_para, strictly choose one of: 'Agreed and Paid', 'Agreed yet to pay', 'Partially agreed and paid', 'Partially agreed, yet to paid', 'Not agreed'. If unclear, use null.
4. Use null for missing values. Monetary values as float.
5. If no audit paras are found, audit_paras should be an empty list [].
6. If extraction is incomplete, note it in parsing_errors.

DAR Text:
{text}

Respond with ONLY the JSON object, no explanations."#
    )
}
