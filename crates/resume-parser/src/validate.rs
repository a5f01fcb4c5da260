//! Post-processing of model output

use serde_json::{Map, Value};
use url::Url;

use crate::error::{Error, Result};

/// Parse the JSON object spanning the first `{` to the last `}` of a reply
pub fn extract_json_object(response: &str) -> Result<Map<String, Value>> {
    let (start, end) = match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => return Err(Error::generation("No JSON found in response")),
    };

    match serde_json::from_str(&response[start..=end]) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(Error::generation("Model reply is not a JSON object")),
        Err(e) => Err(Error::generation(format!(
            "Failed to parse JSON from LLM response: {}",
            e
        ))),
    }
}

/// Trim, title-case and dedupe skill names, keeping first occurrences in order
pub fn normalize_skills(skills: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(skills.len());
    for skill in skills {
        let skill = skill.trim();
        if skill.is_empty() {
            continue;
        }
        let skill = title_case(skill);
        if !normalized.contains(&skill) {
            normalized.push(skill);
        }
    }
    normalized
}

/// Uppercase the first letter of every run of letters, lowercase the rest
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Whether `value` is an absolute URL with both a scheme and a host
pub fn is_valid_url(value: &str) -> bool {
    match Url::parse(value.trim()) {
        Ok(url) => !url.scheme().is_empty() && url.host_str().map_or(false, |h| !h.is_empty()),
        Err(_) => false,
    }
}

/// Null out every social media entry that is not a valid URL
pub fn clean_social_media(social: Map<String, Value>) -> Map<String, Value> {
    social
        .into_iter()
        .map(|(platform, value)| {
            let cleaned = match value {
                Value::String(url) if is_valid_url(&url) => Value::String(url),
                _ => Value::Null,
            };
            (platform, cleaned)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_json_with_fluff() {
        let reply = "Sure! Here is the JSON:\n```json\n{\"name\": \"John Doe\", \"skills\": [\"python\"]}\n```\nLet me know.";
        let object = extract_json_object(reply).unwrap();
        assert_eq!(object["name"], "John Doe");
    }

    #[test]
    fn test_extract_json_without_braces() {
        let err = extract_json_object("I could not read this resume.").unwrap_err();
        assert_eq!(err.to_string(), "Generation error: No JSON found in response");
        assert!(extract_json_object("} backwards {").is_err());
    }

    #[test]
    fn test_extract_json_invalid() {
        assert!(matches!(
            extract_json_object("{name: John}"),
            Err(Error::Generation(_))
        ));
    }

    #[test]
    fn test_normalize_skills() {
        let skills = vec![
            " python ".to_string(),
            "machine learning".to_string(),
            "".to_string(),
            "PYTHON".to_string(),
            "c++".to_string(),
            "   ".to_string(),
        ];
        assert_eq!(
            normalize_skills(skills),
            vec!["Python", "Machine Learning", "C++"]
        );
    }

    #[test]
    fn test_title_case_matches_word_runs() {
        assert_eq!(title_case("node.js"), "Node.Js");
        assert_eq!(title_case("rEST apis"), "Rest Apis");
    }

    #[test]
    fn test_url_validation() {
        assert!(is_valid_url("https://linkedin.com/in/johndoe"));
        assert!(is_valid_url("http://github.com/jdoe"));
        assert!(!is_valid_url("linkedin.com/in/johndoe"));
        assert!(!is_valid_url("mailto:john@example.com"));
        assert!(!is_valid_url(""));
    }

    #[test]
    fn test_clean_social_media() {
        let social = json!({
            "linkedin": "https://linkedin.com/in/johndoe",
            "github": "github.com/johndoe",
            "twitter": null,
            "portfolio": 42
        });

        let cleaned = clean_social_media(social.as_object().cloned().unwrap());
        assert_eq!(cleaned["linkedin"], "https://linkedin.com/in/johndoe");
        assert_eq!(cleaned["github"], Value::Null);
        assert_eq!(cleaned["twitter"], Value::Null);
        assert_eq!(cleaned["portfolio"], Value::Null);
        assert_eq!(cleaned.len(), 4);
    }
}
