//! Declarative request validation.
//!
//! Every mutating endpoint declares an ordered list of [`FieldRule`]s. Rules
//! run in declaration order against the JSON body and each rule runs its
//! steps in order, so the first failing step across the whole table decides
//! the message returned to the client. Sanitizers (`trim`, `escape`) rewrite
//! the value in place for the steps that follow them and for the handler.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use uuid::Uuid;
use validator::ValidateEmail;

use crate::error::{AppError, AppResult};

static LETTERS_AND_SPACES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z ]+$").expect("valid regex"));

static ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9A-Za-z]+$").expect("valid regex"));

static NO_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^ \t\n\r]+$").expect("valid regex"));

static ISBN10: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[0-9]{9}X|[0-9]{10})$").expect("valid regex"));

/// Allowed booking status values
pub const BOOKING_STATUSES: &[&str] = &["pending", "approved", "cancelled"];

#[derive(Debug, Clone)]
enum Check {
    Exists,
    NotEmpty,
    Trim,
    Escape,
    CompactIsbn,
    Matches(&'static Lazy<Regex>),
    Length { min: usize, max: usize },
    Email,
    Isbn10,
    IntRange { min: i64, max: i64 },
    Boolean,
    String,
    OneOf(&'static [&'static str]),
}

#[derive(Debug, Clone)]
struct Step {
    check: Check,
    message: String,
}

/// Ordered checks and sanitizers for one body field
#[derive(Debug, Clone)]
pub struct FieldRule {
    field: &'static str,
    optional: bool,
    steps: Vec<Step>,
}

impl FieldRule {
    pub fn body(field: &'static str) -> Self {
        Self {
            field,
            optional: false,
            steps: Vec::new(),
        }
    }

    fn push(mut self, check: Check, message: String) -> Self {
        self.steps.push(Step { check, message });
        self
    }

    /// Skip every step when the field is absent or null
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn exists(self) -> Self {
        let msg = format!("body must have a '{}' field", self.field);
        self.push(Check::Exists, msg)
    }

    pub fn not_empty(self) -> Self {
        let msg = format!("'{}' field must be non empty", self.field);
        self.push(Check::NotEmpty, msg)
    }

    pub fn trim(self) -> Self {
        self.push(Check::Trim, String::new())
    }

    pub fn escape(self) -> Self {
        self.push(Check::Escape, String::new())
    }

    /// Strip ISBN separators and uppercase the check digit
    pub fn compact_isbn(self) -> Self {
        self.push(Check::CompactIsbn, String::new())
    }

    pub fn matches(self, pattern: &'static Lazy<Regex>, message: &str) -> Self {
        self.push(Check::Matches(pattern), message.to_string())
    }

    pub fn length(self, min: usize, max: usize) -> Self {
        let msg = format!("'{}' has a length in range[{},{}]", self.field, min, max);
        self.push(Check::Length { min, max }, msg)
    }

    pub fn email(self) -> Self {
        let msg = format!("'{}' must be a valid email address", self.field);
        self.push(Check::Email, msg)
    }

    pub fn isbn10(self) -> Self {
        let msg = format!("'{}' must be a valid ISBN-10", self.field);
        self.push(Check::Isbn10, msg)
    }

    pub fn int_range(self, min: i64, max: i64) -> Self {
        let msg = format!("'{}' must be an integer in range[{},{}]", self.field, min, max);
        self.push(Check::IntRange { min, max }, msg)
    }

    pub fn boolean(self) -> Self {
        let msg = format!("'{}' field must be a boolean", self.field);
        self.push(Check::Boolean, msg)
    }

    pub fn string(self) -> Self {
        let msg = format!("'{}' field must be a string", self.field);
        self.push(Check::String, msg)
    }

    pub fn one_of(self, allowed: &'static [&'static str]) -> Self {
        let msg = format!("'{}' must be one of [{}]", self.field, allowed.join(","));
        self.push(Check::OneOf(allowed), msg)
    }

    /// Run the steps of this rule against `body`, sanitizing in place
    fn apply(&self, body: &mut Map<String, Value>) -> Result<(), String> {
        let present = matches!(body.get(self.field), Some(v) if !v.is_null());
        if !present && self.optional {
            return Ok(());
        }

        for step in &self.steps {
            let value = body.get(self.field).filter(|v| !v.is_null()).cloned();

            match &step.check {
                Check::Exists => {
                    if value.is_none() {
                        return Err(step.message.clone());
                    }
                }
                Check::NotEmpty => {
                    let empty = match value.as_ref() {
                        None => true,
                        Some(v) => as_text(v).map(|s| s.is_empty()).unwrap_or(false),
                    };
                    if empty {
                        return Err(step.message.clone());
                    }
                }
                Check::Trim => {
                    if let Some(Value::String(s)) = value {
                        body.insert(self.field.to_string(), Value::String(s.trim().to_string()));
                    }
                }
                Check::Escape => {
                    if let Some(Value::String(s)) = value {
                        body.insert(self.field.to_string(), Value::String(escape(&s)));
                    }
                }
                Check::CompactIsbn => {
                    if let Some(Value::String(s)) = value {
                        body.insert(self.field.to_string(), Value::String(compact_isbn(&s)));
                    }
                }
                Check::Matches(pattern) => {
                    let ok = value
                        .as_ref()
                        .and_then(as_text)
                        .map(|s| pattern.is_match(&s))
                        .unwrap_or(false);
                    if !ok {
                        return Err(step.message.clone());
                    }
                }
                Check::Length { min, max } => {
                    let ok = value
                        .as_ref()
                        .and_then(as_text)
                        .map(|s| {
                            let len = s.chars().count();
                            len >= *min && len <= *max
                        })
                        .unwrap_or(false);
                    if !ok {
                        return Err(step.message.clone());
                    }
                }
                Check::Email => {
                    let ok = value
                        .as_ref()
                        .and_then(as_text)
                        .map(|s| s.validate_email())
                        .unwrap_or(false);
                    if !ok {
                        return Err(step.message.clone());
                    }
                }
                Check::Isbn10 => {
                    let ok = value
                        .as_ref()
                        .and_then(as_text)
                        .map(|s| is_isbn10(&s))
                        .unwrap_or(false);
                    if !ok {
                        return Err(step.message.clone());
                    }
                }
                Check::IntRange { min, max } => {
                    match value.as_ref().and_then(as_int) {
                        Some(n) if n >= *min && n <= *max => {
                            body.insert(self.field.to_string(), Value::Number(Number::from(n)));
                        }
                        _ => return Err(step.message.clone()),
                    }
                }
                Check::Boolean => match value.as_ref().and_then(as_bool) {
                    Some(b) => {
                        body.insert(self.field.to_string(), Value::Bool(b));
                    }
                    None => return Err(step.message.clone()),
                },
                Check::String => {
                    if !matches!(value, Some(Value::String(_))) {
                        return Err(step.message.clone());
                    }
                }
                Check::OneOf(allowed) => {
                    let ok = value
                        .as_ref()
                        .and_then(as_text)
                        .map(|s| allowed.contains(&s.as_str()))
                        .unwrap_or(false);
                    if !ok {
                        return Err(step.message.clone());
                    }
                }
            }
        }

        Ok(())
    }
}

/// Run `rules` in order against a JSON body; the first failure wins.
pub fn run(rules: &[FieldRule], body: &mut Map<String, Value>) -> AppResult<()> {
    for rule in rules {
        rule.apply(body).map_err(AppError::Validation)?;
    }
    Ok(())
}

/// Validate `body` and deserialize the sanitized result into `T`.
pub fn validated<T: DeserializeOwned>(rules: &[FieldRule], body: Value) -> AppResult<T> {
    let mut map = match body {
        Value::Object(map) => map,
        _ => return Err(AppError::Validation("body must be a JSON object".to_string())),
    };

    run(rules, &mut map)?;

    serde_json::from_value(Value::Object(map))
        .map_err(|e| AppError::Validation(format!("invalid body: {}", e)))
}

/// Parse a path identifier; malformed ids are a validation failure
pub fn parse_id(raw: &str) -> AppResult<Uuid> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::Validation("'id' field must be non empty".to_string()));
    }
    Uuid::parse_str(raw)
        .map_err(|_| AppError::Validation("'id' field must be a valid identifier".to_string()))
}

/// Validate a booking status path segment
pub fn parse_status(raw: &str) -> AppResult<&str> {
    BOOKING_STATUSES
        .iter()
        .copied()
        .find(|s| *s == raw)
        .ok_or_else(|| {
            AppError::Validation(format!(
                "'status' must be one of [{}]",
                BOOKING_STATUSES.join(",")
            ))
        })
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// HTML-escape the characters a browser would interpret
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '/' => out.push_str("&#x2F;"),
            '\\' => out.push_str("&#x5C;"),
            '`' => out.push_str("&#96;"),
            _ => out.push(c),
        }
    }
    out
}

/// Canonical stored form of an ISBN: no hyphens or spaces, uppercase X
pub fn compact_isbn(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '-' && *c != ' ')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// ISBN-10 checksum: hyphens and spaces are ignored, a trailing X counts as 10
pub fn is_isbn10(raw: &str) -> bool {
    let isbn = compact_isbn(raw);
    if !ISBN10.is_match(&isbn) {
        return false;
    }

    let sum: u32 = isbn
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let digit = if c == 'X' { 10 } else { c.to_digit(10).unwrap_or(0) };
            (i as u32 + 1) * digit
        })
        .sum();

    sum % 11 == 0
}

/// Rule table shared by the handlers
pub mod rules {
    use super::*;

    pub fn name() -> FieldRule {
        FieldRule::body("name")
            .exists()
            .not_empty()
            .trim()
            .escape()
            .matches(&LETTERS_AND_SPACES, "'name' can contain only letters and spaces")
            .length(4, 30)
    }

    pub fn username() -> FieldRule {
        FieldRule::body("username")
            .exists()
            .not_empty()
            .trim()
            .escape()
            .matches(&ALPHANUMERIC, "'username' can contain only alphanumerics")
            .length(4, 20)
    }

    pub fn email() -> FieldRule {
        FieldRule::body("email").exists().not_empty().trim().email()
    }

    pub fn password() -> FieldRule {
        FieldRule::body("password")
            .exists()
            .not_empty()
            .matches(
                &NO_WHITESPACE,
                "'password' field cannot contain space or newlines",
            )
            .length(4, 20)
    }

    pub fn is_moderator() -> FieldRule {
        FieldRule::body("isModerator").exists().not_empty().boolean()
    }

    pub fn isbn() -> FieldRule {
        FieldRule::body("ISBN")
            .exists()
            .not_empty()
            .trim()
            .compact_isbn()
            .isbn10()
    }

    pub fn title() -> FieldRule {
        FieldRule::body("title").exists().not_empty().trim().escape().length(1, 200)
    }

    pub fn author() -> FieldRule {
        FieldRule::body("author").exists().not_empty().trim().escape().length(1, 200)
    }

    pub fn details() -> FieldRule {
        FieldRule::body("details").optional().string().trim().length(0, 5000)
    }

    pub fn image() -> FieldRule {
        FieldRule::body("image").optional().string().trim().length(0, 2048)
    }

    pub fn category_name() -> FieldRule {
        FieldRule::body("category_name")
            .exists()
            .not_empty()
            .trim()
            .escape()
            .length(1, 50)
    }

    pub fn quantity() -> FieldRule {
        FieldRule::body("quantity").exists().not_empty().int_range(1, 50)
    }

    pub fn status() -> FieldRule {
        FieldRule::body("status").exists().not_empty().one_of(BOOKING_STATUSES)
    }

    pub fn rating() -> FieldRule {
        FieldRule::body("rating").exists().not_empty().int_range(1, 5)
    }

    pub fn review() -> FieldRule {
        FieldRule::body("review").optional().string().trim().escape().length(0, 500)
    }

    pub fn search() -> FieldRule {
        FieldRule::body("search").exists().string().trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    fn first_error(rules: &[FieldRule], v: Value) -> String {
        match run(rules, &mut body(v)) {
            Err(AppError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_isbn10_checksum() {
        assert!(is_isbn10("0306406152"));
        assert!(is_isbn10("0-306-40615-2"));
        assert!(is_isbn10("080442957X"));
        assert!(!is_isbn10("0306406153"));
        assert!(!is_isbn10("030640615"));
        assert!(!is_isbn10("9780306406157"));
    }

    #[test]
    fn test_isbn_rule_stores_compact_form() {
        for raw in ["0-306-40615-2", " 0 306 40615 2 ", "0-3-0-6-4-0-6-1-5-2"] {
            let mut b = body(json!({ "ISBN": raw }));
            run(&[rules::isbn()], &mut b).unwrap();
            assert_eq!(b["ISBN"], "0306406152");
        }

        let mut b = body(json!({ "ISBN": "080442957x" }));
        run(&[rules::isbn()], &mut b).unwrap();
        assert_eq!(b["ISBN"], "080442957X");

        let msg = first_error(&[rules::isbn()], json!({ "ISBN": "0-306-40615-3" }));
        assert_eq!(msg, "'ISBN' must be a valid ISBN-10");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>Tom & 'Jerry'</b>"), "&lt;b&gt;Tom &amp; &#x27;Jerry&#x27;&lt;&#x2F;b&gt;");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn test_first_failure_wins() {
        let rules = [rules::name(), rules::username(), rules::email(), rules::password()];

        // name and username both invalid: only the name message is reported
        let msg = first_error(
            &rules,
            json!({ "name": "Al", "username": "a!", "email": "a@x.com", "password": "pass1234" }),
        );
        assert_eq!(msg, "'name' has a length in range[4,30]");

        let msg = first_error(
            &rules,
            json!({ "name": "Alice Smith", "username": "a!", "email": "nope", "password": "p" }),
        );
        assert_eq!(msg, "'username' can contain only alphanumerics");
    }

    #[test]
    fn test_missing_and_empty_fields() {
        let msg = first_error(&[rules::name()], json!({}));
        assert_eq!(msg, "body must have a 'name' field");

        let msg = first_error(&[rules::name()], json!({ "name": "" }));
        assert_eq!(msg, "'name' field must be non empty");

        let msg = first_error(&[rules::name()], json!({ "name": null }));
        assert_eq!(msg, "body must have a 'name' field");
    }

    #[test]
    fn test_name_rules() {
        let msg = first_error(&[rules::name()], json!({ "name": "R2 D2" }));
        assert_eq!(msg, "'name' can contain only letters and spaces");

        let mut b = body(json!({ "name": "  Alice Smith  " }));
        run(&[rules::name()], &mut b).unwrap();
        assert_eq!(b["name"], "Alice Smith");
    }

    #[test]
    fn test_password_rules() {
        let msg = first_error(&[rules::password()], json!({ "password": "pass word" }));
        assert_eq!(msg, "'password' field cannot contain space or newlines");

        let msg = first_error(&[rules::password()], json!({ "password": "abc" }));
        assert_eq!(msg, "'password' has a length in range[4,20]");

        run(&[rules::password()], &mut body(json!({ "password": "pass1234" }))).unwrap();
    }

    #[test]
    fn test_email_rule() {
        let msg = first_error(&[rules::email()], json!({ "email": "not-an-email" }));
        assert_eq!(msg, "'email' must be a valid email address");
        run(&[rules::email()], &mut body(json!({ "email": " a@x.com " }))).unwrap();
    }

    #[test]
    fn test_quantity_bounds_and_normalization() {
        for bad in [json!(0), json!(51), json!("abc"), json!(2.5)] {
            let msg = first_error(&[rules::quantity()], json!({ "quantity": bad }));
            assert_eq!(msg, "'quantity' must be an integer in range[1,50]");
        }

        let mut b = body(json!({ "quantity": "31" }));
        run(&[rules::quantity()], &mut b).unwrap();
        assert_eq!(b["quantity"], json!(31));
    }

    #[test]
    fn test_status_allow_list() {
        let msg = first_error(&[rules::status()], json!({ "status": "returned" }));
        assert_eq!(msg, "'status' must be one of [pending,approved,cancelled]");
        run(&[rules::status()], &mut body(json!({ "status": "cancelled" }))).unwrap();
        assert!(parse_status("approved").is_ok());
        assert!(parse_status("lost").is_err());
    }

    #[test]
    fn test_optional_rules_skip_absent_fields() {
        let rules = [rules::quantity().optional(), rules::status().optional()];
        run(&rules, &mut body(json!({}))).unwrap();

        let msg = first_error(&rules, json!({ "status": "done" }));
        assert!(msg.starts_with("'status' must be one of"));
    }

    #[test]
    fn test_review_length() {
        let long = "x".repeat(501);
        let msg = first_error(&[rules::review()], json!({ "review": long }));
        assert_eq!(msg, "'review' has a length in range[0,500]");
        run(&[rules::review()], &mut body(json!({ "review": "" }))).unwrap();
    }

    #[test]
    fn test_parse_id() {
        assert!(parse_id("6f1c5d1e-6a3f-4c36-9a57-0bd4d8a4e6a1").is_ok());
        assert!(matches!(parse_id("not-an-id"), Err(AppError::Validation(_))));
        assert!(matches!(parse_id(""), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validated_deserializes_sanitized_body() {
        #[derive(serde::Deserialize)]
        struct Body {
            quantity: i32,
        }

        let parsed: Body = validated(&[rules::quantity()], json!({ "quantity": "7" })).unwrap();
        assert_eq!(parsed.quantity, 7);

        assert!(validated::<Body>(&[rules::quantity()], json!([1, 2])).is_err());
    }
}
