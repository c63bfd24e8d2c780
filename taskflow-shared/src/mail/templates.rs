//! Plain-text letter layout shared by every notification email

const SIGNATURE: &str = "Best regards,\nYour Team";

/// Wraps `content` in the standard greeting and signature.
///
/// ```
/// use taskflow_shared::mail::templates::letter;
///
/// let body = letter("ana", &["The task \"Report\" has been deleted."]);
/// assert_eq!(
///     body,
///     "Hello ana,\n\nThe task \"Report\" has been deleted.\n\nBest regards,\nYour Team"
/// );
/// ```
pub fn letter(username: &str, paragraphs: &[&str]) -> String {
    let mut body = format!("Hello {},\n\n", username);
    for paragraph in paragraphs {
        body.push_str(paragraph);
        body.push_str("\n\n");
    }
    body.push_str(SIGNATURE);
    body
}

/// Renders an optional field, falling back to `Not specified`
pub fn or_unspecified<T: std::fmt::Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "Not specified".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_multiple_paragraphs() {
        let body = letter("bo", &["First.", "Second."]);
        assert!(body.starts_with("Hello bo,\n\nFirst.\n\nSecond.\n\n"));
        assert!(body.ends_with("Best regards,\nYour Team"));
    }

    #[test]
    fn test_or_unspecified() {
        assert_eq!(or_unspecified(Some("x")), "x");
        assert_eq!(or_unspecified::<&str>(None), "Not specified");
    }
}
