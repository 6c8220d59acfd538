use crate::error::EmbedError;
use crate::types::EmbedType;

/// Reject an extracted type that the profile does not allow. `None` allows everything.
pub fn check_allowed_type(allowed: Option<&[String]>, actual: &EmbedType) -> Result<(), EmbedError> {
    let Some(allowed) = allowed else { return Ok(()) };
    if allowed.iter().any(|t| EmbedType::from(t.as_str()) == *actual) {
        return Ok(());
    }
    Err(EmbedError::type_not_allowed(format!("The embed content is not a {}", join_with_or(allowed))))
}

/// "a", "a or b", "a, b or c".
pub fn join_with_or(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [head @ .., last] => format!("{} or {}", head.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> { items.iter().map(|s| s.to_string()).collect() }

    #[test]
    fn unrestricted_accepts_anything() {
        assert!(check_allowed_type(None, &EmbedType::Link).is_ok());
        assert!(check_allowed_type(None, &EmbedType::Other("audio".into())).is_ok());
    }

    #[test]
    fn video_only_rejects_link() {
        let allowed = list(&["video"]);
        let err = check_allowed_type(Some(&allowed), &EmbedType::Link).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("video"), "{msg}");
        assert_eq!(msg, "The embed content is not a video");
        assert!(check_allowed_type(Some(&allowed), &EmbedType::Video).is_ok());
    }

    #[test]
    fn allowed_list_is_case_insensitive() {
        let allowed = list(&["Photo"]);
        assert!(check_allowed_type(Some(&allowed), &EmbedType::Photo).is_ok());
    }

    #[test]
    fn last_separator_becomes_or() {
        assert_eq!(join_with_or(&list(&["video", "rich"])), "video or rich");
        assert_eq!(join_with_or(&list(&["video", "rich", "photo"])), "video, rich or photo");
    }
}
