use client_core::StoreEvent;
use shared::domain::Employee;

const HEADERS: [&str; 6] = ["ID", "NAME", "EMAIL", "DEPARTMENT", "ROLE", "STATUS"];

pub fn print_json(employees: &[Employee]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(employees)?);
    Ok(())
}

pub fn print_table(employees: &[Employee]) {
    if employees.is_empty() {
        println!("(no employees)");
        return;
    }
    print!("{}", render_table(employees));
}

pub fn render_table(employees: &[Employee]) -> String {
    let rows: Vec<[String; 6]> = employees
        .iter()
        .map(|e| {
            [
                e.id.to_string(),
                e.name.clone(),
                e.email.clone(),
                e.department.to_string(),
                e.role.clone(),
                e.status.map(|s| s.to_string()).unwrap_or_else(|| "-".into()),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS.map(String::from), &widths);
    push_row(&mut out, &widths.map(|w| "-".repeat(w)), &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String; 6], widths: &[usize; 6]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:width$}"))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

/// One line per store event, as a toast would show it.
pub fn notification(event: &StoreEvent) -> String {
    match event {
        StoreEvent::Loaded { count } => format!("loaded {count} employees"),
        StoreEvent::Created(e) => format!("created {} <{}>", e.name, e.email),
        StoreEvent::Updated(e) => format!("updated {} <{}>", e.name, e.email),
        StoreEvent::Deleted { email } => format!("deleted <{email}>"),
        StoreEvent::Error(message) => format!("error: {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{Department, EmployeeId, EmployeeStatus};

    fn employee(id: i64, name: &str, email: &str, status: Option<EmployeeStatus>) -> Employee {
        Employee {
            id: EmployeeId::Number(id),
            name: name.into(),
            email: email.into(),
            department: Department::HumanResources,
            role: "Recruiter".into(),
            status,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn table_aligns_columns_to_widest_cell() {
        let table = render_table(&[
            employee(1, "Ada", "ada@example.com", Some(EmployeeStatus::Active)),
            employee(22, "Grace Hopper", "g@example.com", None),
        ]);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "ID  NAME          EMAIL            DEPARTMENT       ROLE       STATUS"
        );
        assert!(lines[1].starts_with("--  ------------  ---------------"));
        assert_eq!(
            lines[2],
            "1   Ada           ada@example.com  Human Resources  Recruiter  active"
        );
        assert_eq!(
            lines[3],
            "22  Grace Hopper  g@example.com    Human Resources  Recruiter  -"
        );
    }

    #[test]
    fn notifications_describe_events() {
        let ada = employee(1, "Ada", "ada@example.com", None);
        assert_eq!(
            notification(&StoreEvent::Created(ada)),
            "created Ada <ada@example.com>"
        );
        assert_eq!(
            notification(&StoreEvent::Error("name is required".into())),
            "error: name is required"
        );
    }
}
