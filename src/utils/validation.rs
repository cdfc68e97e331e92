use crate::utils::error::CustomError;

pub const NAME_MIN_LEN: usize = 3;
pub const NAME_MAX_LEN: usize = 30;
pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 30;
pub const BIO_MIN_LEN: usize = 3;
pub const BIO_MAX_LEN: usize = 1000;

/// Field-level validation for user profile input.
pub fn validate_profile(
    name: &str,
    username: &str,
    bio: &str,
    image: Option<&str>,
) -> Result<(), CustomError> {
    if name.len() < NAME_MIN_LEN || name.len() > NAME_MAX_LEN {
        return Err(CustomError::ValidationError(format!(
            "Name must be between {} and {} characters long.",
            NAME_MIN_LEN, NAME_MAX_LEN
        )));
    }

    if username.len() < USERNAME_MIN_LEN || username.len() > USERNAME_MAX_LEN {
        return Err(CustomError::ValidationError(format!(
            "Username must be between {} and {} characters long.",
            USERNAME_MIN_LEN, USERNAME_MAX_LEN
        )));
    }

    if bio.len() < BIO_MIN_LEN || bio.len() > BIO_MAX_LEN {
        return Err(CustomError::ValidationError(format!(
            "Bio must be between {} and {} characters long.",
            BIO_MIN_LEN, BIO_MAX_LEN
        )));
    }

    if let Some(url) = image {
        if !is_url_shaped(url) {
            return Err(CustomError::ValidationError(
                "Profile photo must be a valid http(s) URL.".into(),
            ));
        }
    }

    Ok(())
}

fn is_url_shaped(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));

    match rest {
        Some(rest) => !rest.is_empty() && !rest.chars().any(|c| c.is_whitespace()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_profile() -> (&'static str, &'static str, &'static str) {
        ("Ada Lovelace", "ada", "First programmer.")
    }

    #[test]
    fn accepts_a_well_formed_profile() {
        let (name, username, bio) = ok_profile();
        assert!(validate_profile(name, username, bio, Some("https://img.example/ada.png")).is_ok());
    }

    #[test]
    fn rejects_out_of_bounds_fields() {
        let (name, username, bio) = ok_profile();
        assert!(validate_profile("ab", username, bio, None).is_err());
        assert!(validate_profile(&"x".repeat(31), username, bio, None).is_err());
        assert!(validate_profile(name, "ab", bio, None).is_err());
        assert!(validate_profile(name, username, "ab", None).is_err());
        assert!(validate_profile(name, username, &"x".repeat(1001), None).is_err());
    }

    #[test]
    fn rejects_non_url_photos() {
        let (name, username, bio) = ok_profile();
        assert!(validate_profile(name, username, bio, Some("not a url")).is_err());
        assert!(validate_profile(name, username, bio, Some("ftp://img.example/a.png")).is_err());
        assert!(validate_profile(name, username, bio, Some("https://")).is_err());
        assert!(validate_profile(name, username, bio, Some("https://a b.example")).is_err());
        assert!(validate_profile(name, username, bio, Some("http://img.example/a.png")).is_ok());
    }
}
