//! # Employee Repository
//!
//! Read model of the people who ring up sales. Accounts and passwords are
//! managed by the auth service; this table only carries display fields.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::Employee;

const EMPLOYEE_COLUMNS: &str = "id, name, username, role, created_at";

#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        EmployeeRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?1");
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(employee)
    }

    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE username = ?1");
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(employee)
    }

    /// ## Errors
    /// * `DbError::UniqueViolation` - username taken
    pub async fn insert(&self, employee: &Employee) -> DbResult<()> {
        debug!(id = %employee.id, username = %employee.username, "Inserting employee");

        sqlx::query(
            "INSERT INTO employees (id, name, username, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&employee.id)
        .bind(&employee.name)
        .bind(&employee.username)
        .bind(employee.role)
        .bind(employee.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_duplicate_value(&employee.username))?;

        Ok(())
    }
}
