use chrono::Utc;
use shared::{
    domain::{Employee, EmployeeDraft, EmployeeId, EmployeeStatus},
    error::ApiError,
    validation::validate_draft,
};
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory employee collection, kept in insertion order and keyed by email
/// for mutations.
#[derive(Default)]
pub struct Directory {
    employees: RwLock<Vec<Employee>>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seeded(drafts: Vec<EmployeeDraft>) -> Result<Self, ApiError> {
        let directory = Self::new();
        for draft in drafts {
            directory.create(draft).await?;
        }
        Ok(directory)
    }

    pub async fn list(&self) -> Vec<Employee> {
        self.employees.read().await.clone()
    }

    pub async fn create(&self, draft: EmployeeDraft) -> Result<Employee, ApiError> {
        let draft = normalized(draft)?;
        let mut employees = self.employees.write().await;
        if employees.iter().any(|e| e.email == draft.email) {
            return Err(ApiError::conflict(format!(
                "an employee with email {} already exists",
                draft.email
            )));
        }

        let now = Utc::now();
        let employee = Employee {
            id: EmployeeId::Text(Uuid::new_v4().to_string()),
            name: draft.name,
            email: draft.email,
            department: draft.department,
            role: draft.role,
            status: Some(draft.status.unwrap_or(EmployeeStatus::Active)),
            created_at: Some(now),
            updated_at: Some(now),
        };
        employees.push(employee.clone());
        Ok(employee)
    }

    /// Replaces the editable fields of the record at `email`. The id and
    /// creation time survive; the email itself may change.
    pub async fn update(&self, email: &str, draft: EmployeeDraft) -> Result<Employee, ApiError> {
        let draft = normalized(draft)?;
        let mut employees = self.employees.write().await;
        let index = employees
            .iter()
            .position(|e| e.email == email)
            .ok_or_else(|| not_found(email))?;
        if draft.email != email && employees.iter().any(|e| e.email == draft.email) {
            return Err(ApiError::conflict(format!(
                "an employee with email {} already exists",
                draft.email
            )));
        }

        let slot = &mut employees[index];
        slot.name = draft.name;
        slot.email = draft.email;
        slot.department = draft.department;
        slot.role = draft.role;
        if draft.status.is_some() {
            slot.status = draft.status;
        }
        slot.updated_at = Some(Utc::now());
        Ok(slot.clone())
    }

    pub async fn delete(&self, email: &str) -> Result<Employee, ApiError> {
        let mut employees = self.employees.write().await;
        let index = employees
            .iter()
            .position(|e| e.email == email)
            .ok_or_else(|| not_found(email))?;
        Ok(employees.remove(index))
    }
}

fn normalized(mut draft: EmployeeDraft) -> Result<EmployeeDraft, ApiError> {
    validate_draft(&draft).map_err(|err| ApiError::validation(err.to_string()))?;
    draft.name = draft.name.trim().to_string();
    draft.email = draft.email.trim().to_string();
    draft.role = draft.role.trim().to_string();
    Ok(draft)
}

fn not_found(email: &str) -> ApiError {
    ApiError::not_found(format!("no employee with email {email}"))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
