use crate::providers::ProviderError;

/// Read an API key from the environment variable `var`.
///
/// Surrounding whitespace is trimmed; an unset or blank variable is
/// [`ProviderError::MissingCredential`].
pub fn read_credential(var: &str) -> Result<String, ProviderError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_owned()),
        _ => Err(ProviderError::MissingCredential(var.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variable_is_missing() {
        let err = read_credential("VOICE_ASSISTANT_TEST_UNSET_KEY").unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential(v) if v == "VOICE_ASSISTANT_TEST_UNSET_KEY"));
    }

    #[test]
    fn value_is_trimmed() {
        std::env::set_var("VOICE_ASSISTANT_TEST_SET_KEY", "  sk-123 \n");
        assert_eq!(read_credential("VOICE_ASSISTANT_TEST_SET_KEY").unwrap(), "sk-123");
    }

    #[test]
    fn blank_value_is_missing() {
        std::env::set_var("VOICE_ASSISTANT_TEST_BLANK_KEY", "   ");
        assert!(read_credential("VOICE_ASSISTANT_TEST_BLANK_KEY").is_err());
    }
}
