use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::domain::{Department, EmployeeDraft, EmployeeForm};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
    #[error("unknown department '{0}'")]
    UnknownDepartment(String),
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").expect("static email pattern compiles")
    })
}

pub fn is_valid_email(email: &str) -> bool {
    email_re().is_match(email)
}

/// Checks required fields in form order, then the email shape, then the
/// department. Values are trimmed in the returned draft.
pub fn validate_form(form: &EmployeeForm) -> Result<EmployeeDraft, ValidationError> {
    let name = required("name", &form.name)?;
    let email = required("email", &form.email)?;
    let department = required("department", &form.department)?;
    let role = required("role", &form.role)?;

    if !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }
    let department = department
        .parse::<Department>()
        .map_err(ValidationError::UnknownDepartment)?;

    Ok(EmployeeDraft {
        name: name.to_string(),
        email: email.to_string(),
        department,
        role: role.to_string(),
        status: form.status,
    })
}

/// Re-validates a draft received over the wire.
pub fn validate_draft(draft: &EmployeeDraft) -> Result<(), ValidationError> {
    required("name", &draft.name)?;
    let email = required("email", &draft.email)?;
    required("role", &draft.role)?;
    if !is_valid_email(email) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EmployeeStatus;

    fn form() -> EmployeeForm {
        EmployeeForm {
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            department: "Engineering".into(),
            role: "Staff Engineer".into(),
            status: Some(EmployeeStatus::Active),
        }
    }

    #[test]
    fn accepts_complete_form_and_trims_fields() {
        let mut input = form();
        input.name = "  Ada Lovelace ".into();
        input.department = " human-resources ".into();

        let draft = validate_form(&input).expect("valid form");
        assert_eq!(draft.name, "Ada Lovelace");
        assert_eq!(draft.department, Department::HumanResources);
        assert_eq!(draft.status, Some(EmployeeStatus::Active));
    }

    #[test]
    fn reports_first_missing_field() {
        let mut input = form();
        input.name = "   ".into();
        input.role = String::new();
        assert_eq!(
            validate_form(&input),
            Err(ValidationError::MissingField("name"))
        );

        let mut input = form();
        input.department = String::new();
        assert_eq!(
            validate_form(&input),
            Err(ValidationError::MissingField("department"))
        );
    }

    #[test]
    fn rejects_malformed_email() {
        for email in [
            "ada",
            "ada@",
            "@example.com",
            "ada@example",
            "ada@@example.com",
            "ada lovelace@example.com",
            "ada@example..com",
            "ada@.example.com",
        ] {
            let mut input = form();
            input.email = email.into();
            assert_eq!(
                validate_form(&input),
                Err(ValidationError::InvalidEmail(email.to_string())),
                "{email} should be rejected"
            );
        }
    }

    #[test]
    fn accepts_common_email_shapes() {
        for email in ["a@b.co", "first.last+tag@mail.example.org", "x_y@sub.domain.io"] {
            assert!(is_valid_email(email), "{email} should be accepted");
        }
    }

    #[test]
    fn rejects_unknown_department() {
        let mut input = form();
        input.department = "Legal".into();
        assert_eq!(
            validate_form(&input),
            Err(ValidationError::UnknownDepartment("Legal".into()))
        );
    }

    #[test]
    fn draft_validation_catches_blank_wire_fields() {
        let mut draft = validate_form(&form()).expect("valid form");
        draft.role = " ".into();
        assert_eq!(
            validate_draft(&draft),
            Err(ValidationError::MissingField("role"))
        );
    }
}
