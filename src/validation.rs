//! Input rules shared by the handlers. Every function returns the exact
//! client-facing message as `AppError::Validation`.

use serde_json::Value;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Characters that count as a "symbol" for passwords and disqualify email domain segments.
pub const SYMBOLS: &str = "!@#$%^&*()-_<>.,?/\\|=+";

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

fn has_symbol(s: &str) -> bool {
    s.chars().any(|c| SYMBOLS.contains(c))
}

fn has_digit(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
}

/// JSON values a form field treats as "not provided".
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(_) => false,
    }
}

/// A `false` or `0` was provided but is the wrong type, not a missing value.
fn is_wrong_type_falsy(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Bool(false)))
        || matches!(value, Some(Value::Number(n)) if n.as_f64() == Some(0.0))
}

fn required_string(value: Option<&Value>, missing: &str, not_string: &str) -> AppResult<String> {
    if is_blank(value) {
        return Err(AppError::validation(missing));
    }
    match value {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(AppError::validation(not_string)),
    }
}

/// email
///
/// A non-empty string with exactly one `@` and a domain of at least two
/// dot-separated segments, none of which contains digits or symbols.
pub fn email(value: Option<&Value>) -> AppResult<String> {
    if is_wrong_type_falsy(value) {
        return Err(AppError::validation("Email must be a string"));
    }
    let email = required_string(value, "Email is missing", "Email must be a string")?;

    let parts: Vec<&str> = email.split('@').collect();
    let [_, domain] = parts.as_slice() else {
        return Err(AppError::validation("Email format is not valid"));
    };
    let segments: Vec<&str> = domain.split('.').collect();
    if segments.len() < 2 {
        return Err(AppError::validation("Email format is not valid"));
    }
    if segments.iter().any(|s| has_symbol(s) || has_digit(s)) {
        return Err(AppError::validation("Email format not valid"));
    }
    Ok(email)
}

/// Presence and type only; used on login where the policy is not re-checked.
pub fn login_password(value: Option<&Value>) -> AppResult<String> {
    required_string(value, "Password is missing", "Password must be a string")
}

/// new_password
///
/// The password policy, checked in order: length, capital letter, number,
/// symbol, lowercase letter.
pub fn new_password(value: Option<&Value>) -> AppResult<String> {
    let password = login_password(value)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation("Password must be at least 8 characters long"));
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(AppError::validation("Password must have one capital letter"));
    }
    if !has_digit(&password) {
        return Err(AppError::validation("Password must have one number"));
    }
    if !has_symbol(&password) {
        return Err(AppError::validation("Password must have one symbol"));
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err(AppError::validation("Password must have one small letter"));
    }
    Ok(password)
}

pub fn password_confirmation(password: &str, value: Option<&Value>) -> AppResult<()> {
    let confirmation = required_string(
        value,
        "Password Confirmation is missing",
        "Password Confirmation must be a string",
    )?;
    if confirmation != password {
        return Err(AppError::validation("Password and Password Confirmation not match"));
    }
    Ok(())
}

/// Section names follow the email rule for wrong-typed falsy values.
pub fn section_name(value: Option<&Value>) -> AppResult<String> {
    if is_wrong_type_falsy(value) {
        return Err(AppError::validation("Name must be a string"));
    }
    let name = required_string(value, "Name is missing", "Name must be a string")?;
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Name is missing"));
    }
    Ok(name.to_string())
}

/// A required free-text field such as an article title or comment text.
pub fn text_field(label: &str, value: Option<&Value>) -> AppResult<String> {
    required_string(
        value,
        &format!("{label} is missing"),
        &format!("{label} must be a string"),
    )
}

/// An optional replacement text; present values must not be empty.
pub fn optional_text(label: &str, value: Option<String>) -> AppResult<Option<String>> {
    match value {
        Some(text) if text.trim().is_empty() => Err(AppError::validation(format!("{label} can not be empty"))),
        other => Ok(other),
    }
}

/// Path identifiers: anything that is not a UUID is reported back verbatim.
pub fn id_param(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::validation(format!("ID: {raw} - Invalid format!")))
}

/// A UUID carried in a JSON body field, e.g. `articleId`.
pub fn id_field(name: &str, value: Option<&Value>) -> AppResult<Uuid> {
    if is_blank(value) {
        return Err(AppError::validation(format!("{name} is missing")));
    }
    match value {
        Some(Value::String(s)) => Uuid::parse_str(s)
            .map_err(|_| AppError::validation(format!("{name}: {s} - Invalid format!"))),
        Some(other) => Err(AppError::validation(format!("{name}: {other} - Invalid format!"))),
        None => Err(AppError::validation(format!("{name} is missing"))),
    }
}

/// Boolean path or query values must be `true` or `false`, in any letter case.
pub fn bool_literal(name: &str, raw: &str) -> AppResult<bool> {
    match raw.to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(AppError::validation(format!("{name} query value must be true or false"))),
    }
}

pub fn optional_bool(name: &str, raw: Option<&str>) -> AppResult<Option<bool>> {
    raw.map(|value| bool_literal(name, value)).transpose()
}

/// image
///
/// Accepts PNG or JPEG content up to 2 MiB, detected from the file's magic bytes.
/// Returns the content type to store the file under.
pub fn image(bytes: &[u8]) -> AppResult<&'static str> {
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(AppError::validation("File must be up to 2mb!"));
    }
    if bytes.starts_with(PNG_MAGIC) {
        return Ok("image/png");
    }
    if bytes.starts_with(JPEG_MAGIC) {
        return Ok("image/jpeg");
    }
    Err(AppError::validation("File format not allowed! Only JPG or PNG..."))
}

/// Stored section names are capitalized: first letter upper, the rest lower.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
