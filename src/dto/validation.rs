//! Validation helpers for DTOs.
//!
//! These guard payload shape only; lineup rules (squad size, duplicates, slider bounds) are
//! enforced by the prediction service so they surface as domain errors.

use indexmap::IndexMap;
use validator::ValidationError;

/// Longest player name accepted in a roster entry.
pub const MAX_PLAYER_NAME_LENGTH: usize = 64;
/// Longest slider name accepted in a tactics map.
pub const MAX_TACTIC_NAME_LENGTH: usize = 32;

/// Validates that a player name fits in [`MAX_PLAYER_NAME_LENGTH`] characters.
///
/// Blank names pass: intake drops them before counting the squad.
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    let length = name.trim().chars().count();
    if length > MAX_PLAYER_NAME_LENGTH {
        let mut err = ValidationError::new("player_name_length");
        err.message = Some(
            format!(
                "Player name must be at most {MAX_PLAYER_NAME_LENGTH} characters (got {length})"
            )
            .into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates that every slider name is non-blank and reasonably short.
///
/// # Examples
///
/// ```ignore
/// validate_tactic_names(&[("pressing".into(), 60)].into()) // Ok
/// validate_tactic_names(&[("  ".into(), 60)].into())       // Err - blank
/// ```
pub fn validate_tactic_names(tactics: &IndexMap<String, i32>) -> Result<(), ValidationError> {
    for name in tactics.keys() {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            let mut err = ValidationError::new("tactic_name_blank");
            err.message = Some("Tactic names must not be blank".into());
            return Err(err);
        }
        if trimmed.chars().count() > MAX_TACTIC_NAME_LENGTH {
            let mut err = ValidationError::new("tactic_name_length");
            err.message = Some(
                format!("Tactic name `{trimmed}` exceeds {MAX_TACTIC_NAME_LENGTH} characters")
                    .into(),
            );
            return Err(err);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_player_name() {
        assert!(validate_player_name("Lewandowski").is_ok());
        assert!(validate_player_name("   ").is_ok());
        assert!(validate_player_name(&"x".repeat(64)).is_ok());
        assert!(validate_player_name(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_tactic_names() {
        let mut tactics = IndexMap::new();
        tactics.insert("pressing".to_string(), 60);
        assert!(validate_tactic_names(&tactics).is_ok());

        tactics.insert(" ".to_string(), 10);
        assert!(validate_tactic_names(&tactics).is_err());

        let mut long = IndexMap::new();
        long.insert("p".repeat(33), 1);
        assert!(validate_tactic_names(&long).is_err());
    }
}
