//! Prompts for VLM-based company extraction.
//!
//! Callers can override the default via
//! [`crate::config::ScanConfig::extraction_prompt`]; the constant here is
//! used only when no override is provided. The JSON keys listed in the
//! prompt are the ones [`crate::pipeline::extract::parse_extraction`] reads.

/// Default instruction sent ahead of the booth photos.
pub const EXTRACTION_PROMPT: &str = r#"You are given photos from an exhibition booth. Extract only what is clearly visible (company name, website, contact info, location, booth number, product categories). Do not invent anything.

Reply with ONLY a single valid JSON object, no markdown or explanation. Use this exact structure:
{
  "companyName": "string or empty",
  "website": "string or empty",
  "shortDescription": "string or empty",
  "productCategories": ["string"],
  "emails": ["string"],
  "phones": ["string"],
  "country": "string or empty",
  "city": "string or empty",
  "booth": "string or empty",
  "confidence": 0.0 to 1.0
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_every_parsed_key() {
        for key in [
            "companyName",
            "website",
            "shortDescription",
            "productCategories",
            "emails",
            "phones",
            "country",
            "city",
            "booth",
            "confidence",
        ] {
            assert!(EXTRACTION_PROMPT.contains(key), "missing {key}");
        }
    }

    #[test]
    fn prompt_asks_for_json_only() {
        assert!(EXTRACTION_PROMPT.contains("ONLY a single valid JSON object"));
    }
}
