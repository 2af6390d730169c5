//! Display helpers: entity names and formatted values.

use crate::field::FieldValue;
use serde_json::Value;

/// `"patientVisit"` → `"Patient Visit"`.
pub fn camel_to_sentence_case(input: &str) -> String {
    let mut output = String::with_capacity(input.len() + 4);
    let mut previous: Option<char> = None;

    for ch in input.chars() {
        if ch == '_' || ch == '-' {
            if !output.ends_with(' ') && !output.is_empty() {
                output.push(' ');
            }
            previous = Some(' ');
            continue;
        }
        let boundary = ch.is_uppercase()
            && previous.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit());
        if boundary {
            output.push(' ');
        }
        if output.is_empty() {
            output.extend(ch.to_uppercase());
        } else {
            output.push(ch);
        }
        previous = Some(ch);
    }

    output
}

/// `"Patient Visit"` → `"Patient visit"`.
pub fn to_sentence_case(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Human name of an entity for messages.
pub fn entity_display_name(entity_name: &str) -> String {
    to_sentence_case(&camel_to_sentence_case(entity_name))
}

/// Translate a renderer format (`MM/dd/yyyy hh:mm a`) to a chrono one.
pub fn to_chrono_format(format: &str) -> String {
    let mut output = String::new();
    let chars: Vec<char> = format.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let run = chars[i..].iter().take_while(|c| **c == ch).count();
        let token: String = chars[i..i + run].iter().collect();
        let translated = match token.as_str() {
            "yyyy" => "%Y",
            "yy" => "%y",
            "MM" => "%m",
            "dd" => "%d",
            "hh" => "%I",
            "HH" => "%H",
            "mm" => "%M",
            "ss" => "%S",
            "a" => "%p",
            "%" => "%%",
            _ => "",
        };
        if translated.is_empty() {
            output.push_str(&token);
        } else {
            output.push_str(translated);
        }
        i += run;
    }

    output
}

/// Text shown for a mapped value.
pub fn render_value(value: &FieldValue, format: Option<&str>) -> String {
    match value {
        FieldValue::Empty => String::new(),
        FieldValue::Date(date) => match format {
            Some(format) => date.format(&to_chrono_format(format)).to_string(),
            None => date.to_rfc3339(),
        },
        FieldValue::Raw(Value::Null) => String::new(),
        FieldValue::Raw(Value::String(s)) => s.clone(),
        FieldValue::Raw(other) => other.to_string(),
    }
}
