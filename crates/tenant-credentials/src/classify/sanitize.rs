//! Context sanitization for classified errors

use serde_json::{Map, Value};

use crate::config::Environment;

/// Normalized keys that are dropped outright
const SECRET_KEYS: [&str; 6] = [
    "phonenumber",
    "phone",
    "msisdn",
    "authorization",
    "credentials",
    "cookie",
];

/// Fragments that mark a key as secret wherever they appear
const SECRET_KEY_FRAGMENTS: [&str; 8] = [
    "secret",
    "passkey",
    "password",
    "token",
    "consumerkey",
    "masterkey",
    "encryptionkey",
    "apikey",
];

/// Normalized keys holding identifiers: masked outside production, omitted in production
const IDENTIFIER_KEYS: [&str; 9] = [
    "tenantid",
    "ownerentityid",
    "entityid",
    "barid",
    "tabid",
    "sessionid",
    "sessionhandle",
    "userid",
    "customerid",
];

const MIN_PHONE_DIGITS: usize = 9;
const MAX_PHONE_DIGITS: usize = 15;

/// Characters allowed between the digits of a formatted phone number
const PHONE_SEPARATORS: [char; 5] = [' ', '-', '(', ')', '+'];

enum KeyClass {
    Secret,
    Identifier,
    Plain,
}

fn classify_key(key: &str) -> KeyClass {
    let normalized: String = key
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect();

    if SECRET_KEYS.contains(&normalized.as_str())
        || SECRET_KEY_FRAGMENTS
            .iter()
            .any(|fragment| normalized.contains(fragment))
    {
        KeyClass::Secret
    } else if IDENTIFIER_KEYS.contains(&normalized.as_str()) {
        KeyClass::Identifier
    } else {
        KeyClass::Plain
    }
}

/// Strip secrets and mask identifiers from an error context
///
/// Recurses into nested objects and arrays. Phone numbers inside string
/// values are masked in place regardless of their key.
pub fn sanitize_context(
    context: &Map<String, Value>,
    environment: Environment,
) -> Map<String, Value> {
    context
        .iter()
        .filter_map(|(key, value)| match classify_key(key) {
            KeyClass::Secret => None,
            KeyClass::Identifier if environment.is_production() => None,
            KeyClass::Identifier => Some((key.clone(), mask_identifier(value))),
            KeyClass::Plain => Some((key.clone(), sanitize_value(value, environment))),
        })
        .collect()
}

fn sanitize_value(value: &Value, environment: Environment) -> Value {
    match value {
        Value::Object(map) => Value::Object(sanitize_context(map, environment)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| sanitize_value(item, environment))
                .collect(),
        ),
        Value::String(s) => Value::String(mask_phone_numbers(s)),
        other => other.clone(),
    }
}

fn mask_identifier(value: &Value) -> Value {
    match value {
        Value::String(s) => {
            let prefix: String = s.chars().take(3).collect();
            Value::String(format!("{}***", prefix))
        }
        Value::Null => Value::Null,
        _ => Value::String("***".to_string()),
    }
}

fn starts_phone_run(c: char) -> bool {
    c.is_ascii_digit() || c == '+' || c == '('
}

/// Replace every run of 9 to 15 digits, separators allowed, with `***` and its last three digits
fn mask_phone_numbers(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut masked = String::with_capacity(value.len());
    let mut start = 0;

    while start < chars.len() {
        if !starts_phone_run(chars[start]) {
            masked.push(chars[start]);
            start += 1;
            continue;
        }

        let mut end = start;
        while end < chars.len()
            && (chars[end].is_ascii_digit() || PHONE_SEPARATORS.contains(&chars[end]))
        {
            end += 1;
        }
        // Trailing separators belong to the surrounding text
        while end > start && !chars[end - 1].is_ascii_digit() {
            end -= 1;
        }
        if end == start {
            masked.push(chars[start]);
            start += 1;
            continue;
        }

        let run = &chars[start..end];
        let digits: Vec<char> = run.iter().copied().filter(char::is_ascii_digit).collect();
        if (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
            masked.push_str("***");
            masked.extend(&digits[digits.len() - 3..]);
        } else {
            masked.extend(run);
        }
        start = end;
    }

    masked
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_strips_secret_keys() {
        let context = as_map(json!({
            "consumerKey": "ck-live-123",
            "consumerSecret": "cs-live-456",
            "passkey": "pk-789",
            "phoneNumber": "254712345678",
            "access_token": "tok",
            "password": "pw",
            "operation": "resolve"
        }));

        let sanitized = sanitize_context(&context, Environment::Sandbox);
        assert_eq!(sanitized.len(), 1);
        assert_eq!(sanitized["operation"], "resolve");
    }

    #[test]
    fn test_masks_identifiers_outside_production() {
        let context = as_map(json!({ "tenantId": "bar-12345", "tab_id": 42 }));

        let sanitized = sanitize_context(&context, Environment::Sandbox);
        assert_eq!(sanitized["tenantId"], "bar***");
        assert_eq!(sanitized["tab_id"], "***");
    }

    #[test]
    fn test_omits_identifiers_in_production() {
        let context = as_map(json!({ "tenantId": "bar-12345", "operation": "fetch" }));

        let sanitized = sanitize_context(&context, Environment::Production);
        assert!(!sanitized.contains_key("tenantId"));
        assert_eq!(sanitized["operation"], "fetch");
    }

    #[test]
    fn test_recurses_and_masks_phone_numbers() {
        let context = as_map(json!({
            "request": {
                "consumerSecret": "cs-live-456",
                "msisdnHint": "+254712345678",
                "items": [{ "token": "abc" }, "0712345678"]
            }
        }));

        let sanitized = Value::Object(sanitize_context(&context, Environment::Sandbox));
        let rendered = sanitized.to_string();

        assert!(!rendered.contains("consumerSecret"));
        assert!(!rendered.contains("cs-live-456"));
        assert!(!rendered.contains("254712345678"));
        assert!(!rendered.contains("abc"));
        assert_eq!(sanitized["request"]["msisdnHint"], "***678");
        assert_eq!(sanitized["request"]["items"][1], "***678");
    }

    #[test]
    fn test_strips_prefixed_secret_keys() {
        let context = as_map(json!({
            "mpesa_consumer_key": "ck-live-123",
            "consumerKeyBlob": "Zm9vYmFy",
            "MASTER_KEY": "0123456789abcdef",
            "x-api-key": "ak-1",
            "operation": "decrypt"
        }));

        let sanitized = sanitize_context(&context, Environment::Sandbox);
        assert_eq!(sanitized.len(), 1);
        assert_eq!(sanitized["operation"], "decrypt");
    }

    #[test]
    fn test_masks_formatted_and_embedded_phone_numbers() {
        let context = as_map(json!({
            "note": "+254 712 345 678",
            "detail": "customer 254712345678 failed",
            "local": "(0712) 345-678, retry later"
        }));

        let sanitized = sanitize_context(&context, Environment::Sandbox);
        assert_eq!(sanitized["note"], "***678");
        assert_eq!(sanitized["detail"], "customer ***678 failed");
        assert_eq!(sanitized["local"], "***678, retry later");
    }

    #[test]
    fn test_short_numbers_are_not_phone_numbers() {
        let context = as_map(json!({ "businessShortCode": "174379" }));
        let sanitized = sanitize_context(&context, Environment::Sandbox);
        assert_eq!(sanitized["businessShortCode"], "174379");

        let context = as_map(json!({ "detail": "retry 3 of 5 at 2024-01-15" }));
        let sanitized = sanitize_context(&context, Environment::Sandbox);
        assert_eq!(sanitized["detail"], "retry 3 of 5 at 2024-01-15");
    }
}
