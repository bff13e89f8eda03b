//! Pure field validation shared by the request engine, profile service, and
//! shelter seed import. Every check is deterministic and side-effect free;
//! error `Display` text is the user-facing message for the offending field.

use crate::geo::UNSET_COORD_EPSILON;

pub const TITLE_MIN_LEN: usize = 3;
pub const TITLE_MAX_LEN: usize = 100;
pub const NOTES_MAX_LEN: usize = 500;
pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 100;
pub const ADDRESS_MAX_LEN: usize = 200;
pub const PHONE_MIN_DIGITS: usize = 10;
pub const PHONE_MAX_LEN: usize = 20;
pub const ESTIMATED_DAYS_MAX: u32 = 365;
pub const EMAIL_MAX_LEN: usize = 254;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Title is required")]
    TitleRequired,
    #[error("Title must be at least {TITLE_MIN_LEN} characters")]
    TitleTooShort,
    #[error("Title must be at most {TITLE_MAX_LEN} characters")]
    TitleTooLong,
    #[error("Notes are required")]
    NotesRequired,
    #[error("Notes must be at most {NOTES_MAX_LEN} characters")]
    NotesTooLong,
    #[error("Name is required")]
    NameRequired,
    #[error("Name must be at least {NAME_MIN_LEN} characters")]
    NameTooShort,
    #[error("Name must be at most {NAME_MAX_LEN} characters")]
    NameTooLong,
    #[error("Phone number is required")]
    PhoneRequired,
    #[error("Phone number must contain at least {PHONE_MIN_DIGITS} digits")]
    PhoneTooFewDigits,
    #[error("Phone number must be at most {PHONE_MAX_LEN} characters")]
    PhoneTooLong,
    #[error("Address is required")]
    AddressRequired,
    #[error("Address must be at most {ADDRESS_MAX_LEN} characters")]
    AddressTooLong,
    #[error("Latitude must be between -90 and 90")]
    LatitudeOutOfRange,
    #[error("Longitude must be between -180 and 180")]
    LongitudeOutOfRange,
    #[error("Invalid latitude coordinate")]
    LatitudeUnset,
    #[error("Invalid longitude coordinate")]
    LongitudeUnset,
    #[error("Estimated days cannot exceed {ESTIMATED_DAYS_MAX}")]
    EstimatedDaysTooLarge,
    #[error("Email is required")]
    EmailRequired,
    #[error("Email address is too long")]
    EmailTooLong,
    #[error("Invalid email format")]
    EmailInvalid,
}

pub fn title(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::TitleRequired);
    }
    let trimmed = value.trim();
    if trimmed.chars().count() < TITLE_MIN_LEN {
        return Err(ValidationError::TitleTooShort);
    }
    if trimmed.chars().count() > TITLE_MAX_LEN {
        return Err(ValidationError::TitleTooLong);
    }
    Ok(())
}

pub fn notes(value: &str, required: bool) -> Result<(), ValidationError> {
    if required && value.trim().is_empty() {
        return Err(ValidationError::NotesRequired);
    }
    if value.chars().count() > NOTES_MAX_LEN {
        return Err(ValidationError::NotesTooLong);
    }
    Ok(())
}

pub fn name(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::NameRequired);
    }
    let trimmed = value.trim();
    if trimmed.chars().count() < NAME_MIN_LEN {
        return Err(ValidationError::NameTooShort);
    }
    if trimmed.chars().count() > NAME_MAX_LEN {
        return Err(ValidationError::NameTooLong);
    }
    Ok(())
}

/// Phone check tolerant of separators: whitespace is stripped before counting,
/// and only the digit count is held to the minimum.
pub fn phone(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::PhoneRequired);
    }
    let stripped: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    if stripped.chars().count() > PHONE_MAX_LEN {
        return Err(ValidationError::PhoneTooLong);
    }
    let digit_count = stripped.chars().filter(|c| c.is_ascii_digit()).count();
    if digit_count < PHONE_MIN_DIGITS {
        return Err(ValidationError::PhoneTooFewDigits);
    }
    Ok(())
}

pub fn address(value: &str, required: bool) -> Result<(), ValidationError> {
    if required && value.trim().is_empty() {
        return Err(ValidationError::AddressRequired);
    }
    if value.chars().count() > ADDRESS_MAX_LEN {
        return Err(ValidationError::AddressTooLong);
    }
    Ok(())
}

pub fn latitude(value: f64) -> Result<(), ValidationError> {
    if !(-90.0..=90.0).contains(&value) {
        return Err(ValidationError::LatitudeOutOfRange);
    }
    if value.abs() < UNSET_COORD_EPSILON {
        return Err(ValidationError::LatitudeUnset);
    }
    Ok(())
}

pub fn longitude(value: f64) -> Result<(), ValidationError> {
    if !(-180.0..=180.0).contains(&value) {
        return Err(ValidationError::LongitudeOutOfRange);
    }
    if value.abs() < UNSET_COORD_EPSILON {
        return Err(ValidationError::LongitudeUnset);
    }
    Ok(())
}

pub fn coordinates(lat: f64, lng: f64) -> Result<(), ValidationError> {
    latitude(lat)?;
    longitude(lng)
}

/// `None` is valid: the field is optional on completion. The non-negative
/// bound of the original rule is carried by the unsigned type.
pub fn estimated_days(days: Option<u32>) -> Result<(), ValidationError> {
    match days {
        Some(d) if d > ESTIMATED_DAYS_MAX => Err(ValidationError::EstimatedDaysTooLarge),
        _ => Ok(()),
    }
}

pub fn email(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmailRequired);
    }
    if value.chars().count() > EMAIL_MAX_LEN {
        return Err(ValidationError::EmailTooLong);
    }
    let Some((local, domain)) = value.split_once('@') else {
        return Err(ValidationError::EmailInvalid);
    };
    let tld_ok = domain
        .rsplit_once('.')
        .map(|(host, tld)| !host.is_empty() && tld.chars().count() >= 2)
        .unwrap_or(false);
    if local.is_empty() || domain.contains('@') || !tld_ok {
        return Err(ValidationError::EmailInvalid);
    }
    Ok(())
}
