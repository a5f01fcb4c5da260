//! Flattening of alumni records into retrieval text
//!
//! A projection is a pure function of a record's fields: known fields come
//! first in a fixed order, then `Skills`, then every other public field in key
//! order, each rendered as `Label: value` and joined with `", "`.

use serde_json::{Map, Value};

/// Known fields and their labels, in output order
const FIELD_LABELS: &[(&str, &str)] = &[
    ("name", "Name"),
    ("profession", "Profession"),
    ("job_title", "Job Title"),
    ("company", "Company"),
    ("graduation_year", "Graduated"),
    ("degree", "Degree"),
    ("department", "Department"),
    ("email", "Email"),
    ("location", "Location"),
    ("phone", "Phone"),
];

const SKILLS_FIELD: &str = "skills";
const SEPARATOR: &str = ", ";

/// Project a record's fields into a single descriptive string
pub fn project(fields: &Map<String, Value>) -> String {
    let mut parts = Vec::with_capacity(fields.len());

    for (field, label) in FIELD_LABELS {
        if let Some(value) = fields.get(*field) {
            parts.push(format!("{}: {}", label, render_value(value)));
        }
    }

    if let Some(skills) = fields.get(SKILLS_FIELD) {
        parts.push(format!("Skills: {}", render_value(skills)));
    }

    // serde_json::Map iterates in key order, which keeps extras deterministic
    for (key, value) in fields {
        if is_handled(key) || key.starts_with('_') {
            continue;
        }
        parts.push(format!("{}: {}", humanize_key(key), render_value(value)));
    }

    parts.join(SEPARATOR)
}

fn is_handled(key: &str) -> bool {
    key == SKILLS_FIELD || FIELD_LABELS.iter().any(|(field, _)| *field == key)
}

/// Render a JSON value the way it should read in retrieval text
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(SEPARATOR),
        Value::Object(_) => value.to_string(),
    }
}

/// `current_salary` -> `Current Salary`
pub fn humanize_key(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut out = String::with_capacity(spaced.len());
    let mut prev_alpha = false;
    for c in spaced.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_known_fields_in_fixed_order() {
        let record = fields(json!({
            "phone": "+91-9876543210",
            "company": "Google",
            "name": "Arjun Sharma",
            "graduation_year": 2019,
        }));

        assert_eq!(
            project(&record),
            "Name: Arjun Sharma, Company: Google, Graduated: 2019, Phone: +91-9876543210"
        );
    }

    #[test]
    fn test_single_skills_segment() {
        let record = fields(json!({
            "name": "Priya Patel",
            "skills": ["Python", "R", "SQL"],
            "department": "Data Science",
        }));

        let text = project(&record);
        assert_eq!(text.matches("Skills:").count(), 1);
        assert!(text.contains("Skills: Python, R, SQL"));
        assert!(text.ends_with("Skills: Python, R, SQL"));
    }

    #[test]
    fn test_scalar_skills_rendered_verbatim() {
        let record = fields(json!({"skills": "Rust"}));
        assert_eq!(project(&record), "Skills: Rust");
    }

    #[test]
    fn test_extra_fields_humanized_and_private_skipped() {
        let record = fields(json!({
            "name": "Sneha Gupta",
            "current_salary": "£85,000",
            "_internal": "hidden",
            "achievements": ["NIPS Best Paper Award", "10+ research papers"],
        }));

        assert_eq!(
            project(&record),
            "Name: Sneha Gupta, Achievements: NIPS Best Paper Award, 10+ research papers, \
             Current Salary: £85,000"
        );
    }

    #[test]
    fn test_projection_is_deterministic() {
        let record = fields(json!({
            "name": "Vikram Singh",
            "company": "Netflix",
            "linkedin": "https://linkedin.com/in/vikram",
            "experience_years": 7,
            "skills": ["Kubernetes", "AWS"],
        }));

        let first = project(&record);
        for _ in 0..5 {
            assert_eq!(project(&record), first);
        }
    }

    #[test]
    fn test_empty_record() {
        assert_eq!(project(&Map::new()), "");
    }

    #[test]
    fn test_humanize_key() {
        assert_eq!(humanize_key("experience_years"), "Experience Years");
        assert_eq!(humanize_key("linkedIN"), "Linkedin");
        assert_eq!(humanize_key("x2_factor"), "X2 Factor");
    }

    #[test]
    fn test_render_values() {
        assert_eq!(render_value(&Value::Null), "None");
        assert_eq!(render_value(&json!(true)), "true");
        assert_eq!(render_value(&json!({"a": 1})), r#"{"a":1}"#);
    }
}
