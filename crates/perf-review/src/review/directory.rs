use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{
    Department, Employee, EmployeeId, NewDepartment, NewEmployee, NewProject, Project,
};
use super::error::ReviewError;
use super::repository::DirectoryStore;

/// Departments, employees and projects.
pub struct Directory<R> {
    repository: Arc<R>,
}

impl<R> Directory<R>
where
    R: DirectoryStore + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn create_department(&self, department: NewDepartment) -> Result<Department, ReviewError> {
        require_name("department", &department.name)?;
        let stored = self.repository.insert_department(department)?;
        info!(department = stored.id.0, name = %stored.name, "department created");
        Ok(stored)
    }

    /// Duplicate display names are accepted, but leader matching is by name, so they are
    /// logged.
    pub fn create_employee(&self, employee: NewEmployee) -> Result<Employee, ReviewError> {
        require_name("employee", &employee.name)?;
        if self.repository.employee_by_name(&employee.name)?.is_some() {
            warn!(
                name = %employee.name.trim(),
                "employee name already in use; leader references will resolve to the oldest record"
            );
        }
        let stored = self.repository.insert_employee(employee)?;
        info!(
            employee = stored.id.0,
            department = stored.department_id.0,
            role = stored.role.label(),
            "employee created"
        );
        Ok(stored)
    }

    pub fn create_project(&self, project: NewProject) -> Result<Project, ReviewError> {
        require_name("project", &project.name)?;
        Ok(self.repository.insert_project(project)?)
    }

    pub fn departments(&self) -> Result<Vec<Department>, ReviewError> {
        Ok(self.repository.departments()?)
    }

    pub fn employees(&self) -> Result<Vec<Employee>, ReviewError> {
        Ok(self.repository.employees()?)
    }

    pub fn employee(&self, id: EmployeeId) -> Result<Employee, ReviewError> {
        self.repository
            .employee(id)?
            .ok_or_else(|| ReviewError::not_found(id.to_string()))
    }

    pub fn employee_by_name(&self, name: &str) -> Result<Employee, ReviewError> {
        self.repository
            .employee_by_name(name)?
            .ok_or_else(|| ReviewError::not_found(format!("employee '{}'", name.trim())))
    }

    pub fn projects(&self) -> Result<Vec<Project>, ReviewError> {
        Ok(self.repository.projects()?)
    }
}

fn require_name(what: &str, name: &str) -> Result<(), ReviewError> {
    if name.trim().is_empty() {
        return Err(ReviewError::validation(format!("{what} name is required")));
    }
    Ok(())
}
