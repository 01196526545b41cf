use crate::utils::error::{KbError, Result};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_positive_number<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min_value: T,
) -> Result<()> {
    if value < min_value {
        return Err(KbError::ConfigValidation {
            field: field_name.to_string(),
            message: format!("value {} must be at least {}", value, min_value),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(KbError::ConfigValidation {
            field: field_name.to_string(),
            message: format!("value {} must be between {} and {}", value, min, max),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(KbError::validation(
            field_name,
            value,
            "value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

/// Checks that every token is one of `known`, reporting the first stranger.
pub fn validate_known_tokens<'a, I>(field_name: &str, tokens: I, known: &[&str]) -> Result<()>
where
    I: IntoIterator<Item = &'a String>,
{
    let known_set: HashSet<&str> = known.iter().copied().collect();

    for token in tokens {
        if !known_set.contains(token.as_str()) {
            return Err(KbError::validation(
                field_name,
                token,
                format!("not present in the catalog (known: {})", known.join(", ")),
            ));
        }
    }

    Ok(())
}
