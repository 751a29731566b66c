use shared::domain::{Department, Employee, EmployeeStatus};

/// Client-side search over the loaded collection. Unset or blank terms
/// don't constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeQuery {
    /// Matched against name, email and role.
    pub text: Option<String>,
    pub department: Option<Department>,
    pub role: Option<String>,
    pub status: Option<EmployeeStatus>,
}

impl EmployeeQuery {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        term(&self.text).is_none()
            && term(&self.role).is_none()
            && self.department.is_none()
            && self.status.is_none()
    }

    pub fn matches(&self, employee: &Employee) -> bool {
        if let Some(department) = self.department {
            if employee.department != department {
                return false;
            }
        }
        if let Some(status) = self.status {
            if employee.status != Some(status) {
                return false;
            }
        }
        if let Some(role) = term(&self.role) {
            if !contains_ignore_case(&employee.role, &role) {
                return false;
            }
        }
        match term(&self.text) {
            Some(text) => [&employee.name, &employee.email, &employee.role]
                .into_iter()
                .any(|field| contains_ignore_case(field, &text)),
            None => true,
        }
    }

    /// Matching records in collection order.
    pub fn apply<'a>(&self, employees: &'a [Employee]) -> Vec<&'a Employee> {
        employees.iter().filter(|e| self.matches(e)).collect()
    }
}

fn term(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

#[cfg(test)]
#[path = "tests/filter_tests.rs"]
mod tests;
