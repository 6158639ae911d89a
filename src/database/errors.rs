//! Translating database failures into service errors.
//!
//! SQLSTATE reference: <https://www.postgresql.org/docs/current/errcodes-appendix.html>

use sqlx::postgres::PgDatabaseError;

use crate::errors::{Code, Details, Reason, ServiceError};

pub const UNIQUE_VIOLATION: &str = "23505";
pub const FOREIGN_KEY_VIOLATION: &str = "23503";
pub const CHECK_VIOLATION: &str = "23514";
pub const NOT_NULL_VIOLATION: &str = "23502";
pub const INVALID_TEXT_REPRESENTATION: &str = "22P02";
pub const SERIALIZATION_FAILURE: &str = "40001";
pub const DEADLOCK_DETECTED: &str = "40P01";

/// The parts of a PostgreSQL error report the mapping looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PgErrorReport {
    pub code: String,
    pub message: String,
    pub detail: Option<String>,
    pub constraint: Option<String>,
    pub table: Option<String>,
    pub schema: Option<String>,
    pub column: Option<String>,
    pub r#where: Option<String>,
}

impl From<&PgDatabaseError> for PgErrorReport {
    fn from(err: &PgDatabaseError) -> Self {
        let owned = |value: Option<&str>| value.map(str::to_string);
        Self {
            code: err.code().to_string(),
            message: err.message().to_string(),
            detail: owned(err.detail()),
            constraint: owned(err.constraint()),
            table: owned(err.table()),
            schema: owned(err.schema()),
            column: owned(err.column()),
            r#where: owned(err.r#where()),
        }
    }
}

#[derive(Clone, Copy)]
enum Field {
    Constraint,
    Table,
    Schema,
    Column,
    Where,
}

/// Map any `sqlx` error into the service taxonomy.
pub fn map_error(err: &sqlx::Error) -> ServiceError {
    match err {
        sqlx::Error::RowNotFound => {
            ServiceError::not_found("record not found").with_reason(Reason::NOT_FOUND)
        }
        sqlx::Error::PoolTimedOut => ServiceError::unavailable("database connection pool timed out")
            .with_reason(Reason::UNAVAILABLE),
        sqlx::Error::Database(db) => match db.try_downcast_ref::<PgDatabaseError>() {
            Some(pg) => map_pg_error(&PgErrorReport::from(pg)),
            None => ServiceError::internal(db.message()).with_reason(Reason::INTERNAL),
        },
        other => ServiceError::internal(other.to_string()).with_reason(Reason::INTERNAL),
    }
}

/// Map a PostgreSQL error report by SQLSTATE.
pub fn map_pg_error(report: &PgErrorReport) -> ServiceError {
    use Field::*;

    let (code, message, reason, fields): (Code, &str, Reason, &[Field]) = match report.code.as_str() {
        UNIQUE_VIOLATION => (
            Code::Conflict,
            "unique constraint violation",
            Reason::CONFLICT,
            &[Constraint, Table, Schema, Column, Where],
        ),
        FOREIGN_KEY_VIOLATION => (
            Code::Conflict,
            "foreign key violation",
            Reason::CONFLICT,
            &[Constraint, Table, Schema],
        ),
        CHECK_VIOLATION => (
            Code::BadRequest,
            "check constraint violation",
            Reason::BAD_REQUEST,
            &[Constraint, Table, Schema],
        ),
        NOT_NULL_VIOLATION => (
            Code::BadRequest,
            "null value in column violates not-null constraint",
            Reason::BAD_REQUEST,
            &[Table, Schema, Column],
        ),
        INVALID_TEXT_REPRESENTATION => (
            Code::BadRequest,
            "invalid text representation",
            Reason::BAD_REQUEST,
            &[],
        ),
        SERIALIZATION_FAILURE => (Code::Conflict, "serialization failure", Reason::CONFLICT, &[]),
        DEADLOCK_DETECTED => (Code::Conflict, "deadlock detected", Reason::CONFLICT, &[]),
        _ => (Code::Internal, report.message.as_str(), Reason::INTERNAL, &[Where]),
    };

    let mut details = Details::new()
        .with_field("code", report.code.as_str())
        .with_field("detail", report.detail.as_deref().unwrap_or_default())
        .with_field("message", report.message.as_str());
    for field in fields {
        let (key, value) = match field {
            Constraint => ("constraint", &report.constraint),
            Table => ("table", &report.table),
            Schema => ("schema", &report.schema),
            Column => ("column", &report.column),
            Where => ("where", &report.r#where),
        };
        details = details.with_field(key, value.as_deref().unwrap_or_default());
    }

    ServiceError::new(code, message)
        .with_reason(reason)
        .with_details(details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn report(code: &str) -> PgErrorReport {
        PgErrorReport {
            code: code.to_string(),
            message: "server said no".to_string(),
            detail: Some("Key (email)=(a@b.c) already exists.".to_string()),
            constraint: Some("users_email_key".to_string()),
            table: Some("users".to_string()),
            schema: Some("public".to_string()),
            column: Some("email".to_string()),
            r#where: None,
        }
    }

    #[test]
    fn sqlstate_table() {
        let cases = [
            (UNIQUE_VIOLATION, Code::Conflict, "unique constraint violation"),
            (FOREIGN_KEY_VIOLATION, Code::Conflict, "foreign key violation"),
            (CHECK_VIOLATION, Code::BadRequest, "check constraint violation"),
            (
                NOT_NULL_VIOLATION,
                Code::BadRequest,
                "null value in column violates not-null constraint",
            ),
            (INVALID_TEXT_REPRESENTATION, Code::BadRequest, "invalid text representation"),
            (SERIALIZATION_FAILURE, Code::Conflict, "serialization failure"),
            (DEADLOCK_DETECTED, Code::Conflict, "deadlock detected"),
            ("57014", Code::Internal, "server said no"),
        ];

        for (sqlstate, code, message) in cases {
            let err = map_pg_error(&report(sqlstate));
            assert_eq!(err.code(), code, "{sqlstate}");
            assert_eq!(err.message(), message, "{sqlstate}");
            assert_eq!(
                err.details().and_then(|d| d.field("code")),
                Some(&Value::from(sqlstate))
            );
        }
    }

    #[test]
    fn unique_violation_details() {
        let err = map_pg_error(&report(UNIQUE_VIOLATION));
        let details = err.details().unwrap();

        assert_eq!(err.reason(), Some(&Reason::CONFLICT));
        assert_eq!(details.field("constraint"), Some(&Value::from("users_email_key")));
        assert_eq!(details.field("table"), Some(&Value::from("users")));
        assert_eq!(details.field("column"), Some(&Value::from("email")));
        assert_eq!(details.field("message"), Some(&Value::from("server said no")));
        assert!(details.field("where").is_none());
    }

    #[test]
    fn invalid_text_keeps_only_core_fields() {
        let err = map_pg_error(&report(INVALID_TEXT_REPRESENTATION));
        let details = err.details().unwrap();
        assert!(details.field("constraint").is_none());
        assert!(details.field("table").is_none());
        assert!(details.field("detail").is_some());
    }

    #[test]
    fn driver_errors() {
        let err = map_error(&sqlx::Error::RowNotFound);
        assert_eq!(err.code(), Code::NotFound);

        let err = map_error(&sqlx::Error::PoolTimedOut);
        assert_eq!(err.code(), Code::Unavailable);

        let err = map_error(&sqlx::Error::PoolClosed);
        assert_eq!(err.code(), Code::Internal);
        assert_eq!(err.reason(), Some(&Reason::INTERNAL));
    }
}
