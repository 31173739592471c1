//! Entry submission rules.
//!
//! Field rules run independently and all failures are reported together.
//! The cross-field identical-text rule only runs once every field is valid;
//! the recent-duplicate rule needs the store and is enforced inside the
//! insert transaction (see `guestbook_db::Database::create_entry`).

use std::collections::BTreeMap;
use std::fmt;

use chrono::Duration;
use serde::Serialize;

use guestbook_types::api::CreateEntryRequest;

pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 255;
pub const SUBJECT_MIN_CHARS: usize = 3;
pub const SUBJECT_MAX_CHARS: usize = 255;
pub const MESSAGE_MIN_CHARS: usize = 10;

/// Matched case-insensitively as substrings of the subject.
pub const FORBIDDEN_SUBJECT_WORDS: [&str; 3] = ["spam", "inappropriate", "offensive"];

pub const IDENTICAL_SUBJECT_MESSAGE: &str = "Message cannot be identical to subject.";

/// Rejection for a repost inside the duplicate window, worded after the
/// configured window length.
pub fn duplicate_message(window: Duration) -> String {
    format!(
        "Please wait {} before posting the same message again.",
        describe_window(window)
    )
}

fn describe_window(window: Duration) -> String {
    let secs = window.num_seconds();
    let (amount, unit) = if secs > 0 && secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs > 0 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if amount == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", amount, unit)
    }
}

/// Field name -> messages, serialized as `{"field": ["..."]}`.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl ValidationErrors {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A submission that passed every rule that does not need the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidEntry {
    /// Trimmed.
    pub name: String,
    /// Trimmed.
    pub subject: String,
    /// Trimmed.
    pub message: String,
}

pub fn validate_entry(req: CreateEntryRequest) -> Result<ValidEntry, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let name = validate_name(req.name.as_deref()).map_err(|e| errors.add("name", e)).ok();
    let subject = validate_subject(req.subject.as_deref())
        .map_err(|e| errors.add("subject", e))
        .ok();
    let message = validate_message(req.message.as_deref()).map_err(|e| errors.add("message", e)).ok();

    let (Some(name), Some(subject), Some(message)) = (name, subject, message) else {
        return Err(errors);
    };

    if subject.to_lowercase() == message.to_lowercase() {
        return Err(ValidationErrors::single("message", IDENTICAL_SUBJECT_MESSAGE));
    }

    Ok(ValidEntry {
        name,
        subject,
        message,
    })
}

fn validate_name(raw: Option<&str>) -> Result<String, &'static str> {
    let name = raw.ok_or("Name field is required.")?.trim();

    if name.is_empty() {
        return Err("Name cannot be blank.");
    }
    let len = name.chars().count();
    if len < NAME_MIN_CHARS {
        return Err("Name must be at least 2 characters long.");
    }
    if len > NAME_MAX_CHARS {
        return Err("Name cannot exceed 255 characters.");
    }
    if name.chars().any(char::is_numeric) {
        return Err("Name cannot contain numbers.");
    }
    if !name.chars().all(|c| c.is_alphabetic() || c.is_whitespace() || c == '-') {
        return Err("Name can only contain letters, spaces, and hyphens.");
    }

    Ok(name.to_string())
}

fn validate_subject(raw: Option<&str>) -> Result<String, &'static str> {
    let subject = raw.ok_or("Subject field is required.")?.trim();

    if subject.is_empty() {
        return Err("Subject cannot be blank.");
    }
    let len = subject.chars().count();
    if len < SUBJECT_MIN_CHARS {
        return Err("Subject must be at least 3 characters long.");
    }
    if len > SUBJECT_MAX_CHARS {
        return Err("Subject cannot exceed 255 characters.");
    }
    let lowered = subject.to_lowercase();
    if FORBIDDEN_SUBJECT_WORDS.iter().any(|word| lowered.contains(word)) {
        return Err("Subject contains inappropriate content.");
    }

    Ok(subject.to_string())
}

fn validate_message(raw: Option<&str>) -> Result<String, &'static str> {
    let message = raw.ok_or("Message field is required.")?.trim();

    if message.is_empty() {
        return Err("Message cannot be blank.");
    }
    if message.chars().count() < MESSAGE_MIN_CHARS {
        return Err("Message must be at least 10 characters long.");
    }

    Ok(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, subject: &str, message: &str) -> CreateEntryRequest {
        CreateEntryRequest {
            name: Some(name.into()),
            subject: Some(subject.into()),
            message: Some(message.into()),
        }
    }

    fn errors_for(req: CreateEntryRequest) -> ValidationErrors {
        validate_entry(req).expect_err("expected validation to fail")
    }

    #[test]
    fn test_valid_entry_trims_name_and_subject() {
        let entry = validate_entry(request("  Ada Lovelace ", " Intro  ", " First analytical note ")).unwrap();
        assert_eq!(entry.name, "Ada Lovelace");
        assert_eq!(entry.subject, "Intro");
        assert_eq!(entry.message, "First analytical note");
    }

    #[test]
    fn test_name_accepts_letters_spaces_and_hyphens() {
        for name in ["Jo", "Mary-Jane Watson", "Zoë Ångström", "Ümit Şahin"] {
            assert!(validate_name(Some(name)).is_ok(), "{name} should be accepted");
        }
    }

    #[test]
    fn test_name_with_digit_is_rejected() {
        for name in ["John123", "R2-D2", "4chan"] {
            assert_eq!(validate_name(Some(name)), Err("Name cannot contain numbers."));
        }
    }

    #[test]
    fn test_name_with_punctuation_is_rejected() {
        for name in ["O'Brien", "ada@example", "Dr. Who", "under_score"] {
            assert_eq!(
                validate_name(Some(name)),
                Err("Name can only contain letters, spaces, and hyphens.")
            );
        }
    }

    #[test]
    fn test_name_length_bounds() {
        assert_eq!(validate_name(Some("A")), Err("Name must be at least 2 characters long."));
        assert_eq!(validate_name(Some("  A  ")), Err("Name must be at least 2 characters long."));
        assert_eq!(validate_name(Some("   ")), Err("Name cannot be blank."));
        assert_eq!(validate_name(None), Err("Name field is required."));

        let longest = "a".repeat(NAME_MAX_CHARS);
        assert!(validate_name(Some(&longest)).is_ok());
        let too_long = "a".repeat(NAME_MAX_CHARS + 1);
        assert_eq!(validate_name(Some(&too_long)), Err("Name cannot exceed 255 characters."));
    }

    #[test]
    fn test_subject_forbidden_words_any_case() {
        for subject in ["Spam offer", "totally INAPPROPRIATE", "Inoffensive", "antispam"] {
            assert_eq!(
                validate_subject(Some(subject)),
                Err("Subject contains inappropriate content."),
                "{subject} should be rejected"
            );
        }
        assert!(validate_subject(Some("Span of control")).is_ok());
    }

    #[test]
    fn test_subject_length_bounds() {
        assert_eq!(validate_subject(Some("Hi")), Err("Subject must be at least 3 characters long."));
        assert!(validate_subject(Some("Hey")).is_ok());
        let too_long = "s".repeat(SUBJECT_MAX_CHARS + 1);
        assert_eq!(validate_subject(Some(&too_long)), Err("Subject cannot exceed 255 characters."));
        assert_eq!(validate_subject(Some("")), Err("Subject cannot be blank."));
    }

    #[test]
    fn test_message_min_length() {
        assert_eq!(
            validate_message(Some("Hi")),
            Err("Message must be at least 10 characters long.")
        );
        assert!(validate_message(Some("0123456789")).is_ok());
        assert_eq!(validate_message(Some("   ")), Err("Message cannot be blank."));
        // Padding does not count towards the minimum
        assert_eq!(
            validate_message(Some("   Hi there   ")),
            Err("Message must be at least 10 characters long.")
        );
        assert_eq!(validate_message(None), Err("Message field is required."));
    }

    #[test]
    fn test_all_field_errors_reported_together() {
        let errors = errors_for(request("John123", "spam", "Hi"));
        let fields: Vec<_> = errors.fields().collect();
        assert_eq!(fields, ["message", "name", "subject"]);
        assert_eq!(errors.get("name").unwrap(), ["Name cannot contain numbers."]);
    }

    #[test]
    fn test_missing_fields_are_each_required() {
        let errors = errors_for(CreateEntryRequest::default());
        assert_eq!(errors.get("name").unwrap(), ["Name field is required."]);
        assert_eq!(errors.get("subject").unwrap(), ["Subject field is required."]);
        assert_eq!(errors.get("message").unwrap(), ["Message field is required."]);
    }

    #[test]
    fn test_identical_subject_and_message_rejected() {
        let errors = errors_for(request("Ada", "Hello World!", "hello world!"));
        assert_eq!(errors.get("message").unwrap(), [IDENTICAL_SUBJECT_MESSAGE]);
        assert!(errors.get("subject").is_none());
    }

    #[test]
    fn test_identical_check_ignores_padding() {
        let errors = errors_for(request("Ada", "Hello World!", " hello world! "));
        assert_eq!(errors.get("message").unwrap(), [IDENTICAL_SUBJECT_MESSAGE]);
    }

    #[test]
    fn test_identical_check_skipped_when_a_field_fails() {
        // Both are too short, so only the field errors show up
        let errors = errors_for(request("Ada", "ab", "ab"));
        assert_eq!(errors.get("message").unwrap(), ["Message must be at least 10 characters long."]);
    }

    #[test]
    fn test_duplicate_message_names_the_window() {
        assert_eq!(
            duplicate_message(Duration::minutes(5)),
            "Please wait 5 minutes before posting the same message again."
        );
        assert_eq!(
            duplicate_message(Duration::seconds(60)),
            "Please wait 1 minute before posting the same message again."
        );
        assert_eq!(
            duplicate_message(Duration::hours(2)),
            "Please wait 2 hours before posting the same message again."
        );
        assert_eq!(
            duplicate_message(Duration::seconds(90)),
            "Please wait 90 seconds before posting the same message again."
        );
    }

    #[test]
    fn test_display_lists_every_error() {
        let mut errors = ValidationErrors::single("name", "Name cannot be blank.");
        errors.add("message", "Message cannot be blank.");
        assert_eq!(
            errors.to_string(),
            "message: Message cannot be blank.; name: Name cannot be blank."
        );
    }
}
