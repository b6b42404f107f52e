use crate::core::models::User;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io;

pub const FIRST_NAME_LENGTH: usize = 50;
pub const LAST_NAME_LENGTH: usize = 50;
pub const ADDRESS_LENGTH: usize = 100;
pub const CITY_LENGTH: usize = 50;
pub const EMAIL_LENGTH: usize = 100;

// (123) 456-7890
static US_PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(\d{3}\)\s\d{3}-\d{4}$").expect("valid phone regex"));

// Matches every US state abbreviation and nothing else.
static STATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(A[LKZR]|C[AOT]|D[CE]|F[LM]|G[AU]|HI|I[ADLN]|K[SY]|LA|M[ADEHINOPST]|N[CDEHJMVY]|O[HKR]|P[AR]|RI|S[CD]|T[NX]|UT|V[AT]|[WV]A|W[IY])$",
    )
    .expect("valid state regex")
});

static ZIP_CODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{5}$").expect("valid zip regex"));

// mm/dd/yyyy
static DATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(0[1-9]|1[0-2])/(0[1-9]|[12]\d|3[01])/(19|20)\d{2}$").expect("valid date regex")
});

// 123-45-6789; the never-issued area/group/serial values are rejected in
// validate_ssn where the message can say why.
static SSN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-8]\d{2}-\d{2}-\d{4}$").expect("valid ssn regex"));

// Deliberately loose; full URL validation is a rabbit hole.
static URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)(https?|ftp)://[^\s/$.?#].\S*$").expect("valid url regex")
});

fn invalid(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message)
}

fn validate_required_text(field: &str, value: &str, max_length: usize) -> io::Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(format!("{field} is required")));
    }
    if value.len() > max_length {
        return Err(invalid(format!(
            "{field} too long (max {max_length} characters)"
        )));
    }
    Ok(())
}

pub fn validate_state(state: &str) -> io::Result<()> {
    if !STATE_REGEX.is_match(state) {
        return Err(invalid(format!(
            "'{state}' is not a US state abbreviation"
        )));
    }
    Ok(())
}

pub fn validate_zip_code(zip: &str) -> io::Result<()> {
    if !ZIP_CODE_REGEX.is_match(zip) {
        return Err(invalid(format!("'{zip}' is not a 5-digit zip code")));
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> io::Result<()> {
    // Optional field.
    if phone.is_empty() {
        return Ok(());
    }
    if !US_PHONE_REGEX.is_match(phone) {
        return Err(invalid(format!(
            "'{phone}' is not a phone number of the form (123) 456-7890"
        )));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> io::Result<()> {
    validate_required_text("email", email, EMAIL_LENGTH)?;
    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| invalid(format!("'{email}' is not an email address")))?;
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(invalid(format!("'{email}' is not an email address")));
    }
    Ok(())
}

pub fn validate_dob(dob: &str) -> io::Result<()> {
    if !DATE_REGEX.is_match(dob) {
        return Err(invalid(format!("'{dob}' is not a date of the form mm/dd/yyyy")));
    }
    Ok(())
}

pub fn validate_ssn(ssn: &str) -> io::Result<()> {
    if !SSN_REGEX.is_match(ssn)
        || ssn.starts_with("000")
        || ssn.starts_with("666")
        || &ssn[4..6] == "00"
        || &ssn[7..] == "0000"
    {
        return Err(invalid(format!(
            "'{ssn}' is not a valid SSN of the form 123-45-6789"
        )));
    }
    Ok(())
}

pub fn validate_picture(picture: &str) -> io::Result<()> {
    // Optional field.
    if picture.is_empty() {
        return Ok(());
    }
    if !URL_REGEX.is_match(picture) {
        return Err(invalid(format!("'{picture}' is not an http/ftp URL")));
    }
    Ok(())
}

/// Run every field validator against a record before it is sent to the
/// server. Mirrors the constraints the server enforces so most rejections
/// happen locally with a readable message.
pub fn validate_user(user: &User) -> io::Result<()> {
    validate_required_text("first name", &user.first_name, FIRST_NAME_LENGTH)?;
    validate_required_text("last name", &user.last_name, LAST_NAME_LENGTH)?;
    validate_required_text("address", &user.address, ADDRESS_LENGTH)?;
    validate_required_text("city", &user.city, CITY_LENGTH)?;
    validate_state(&user.state)?;
    validate_zip_code(&user.zip_code)?;
    validate_phone(&user.phone)?;
    validate_email(&user.email)?;
    validate_dob(&user.dob)?;
    validate_ssn(&user.ssn)?;
    validate_picture(&user.picture)?;
    Ok(())
}
