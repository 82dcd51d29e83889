/// Constraint violations the services translate into domain errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintViolation {
    Unique,
    ForeignKey,
}

/// SQLite extended result codes: 2067 unique, 1555 primary key, 787 foreign key.
/// 1811 is a trigger abort; `ON DELETE RESTRICT` raises it with the foreign key message.
fn classify_code(code: &str, message: &str) -> Option<ConstraintViolation> {
    match code {
        "2067" | "1555" => Some(ConstraintViolation::Unique),
        "787" => Some(ConstraintViolation::ForeignKey),
        "1811" if message.contains("FOREIGN KEY constraint failed") => {
            Some(ConstraintViolation::ForeignKey)
        }
        _ => None,
    }
}

pub fn constraint_violation(err: &sqlx::Error) -> Option<ConstraintViolation> {
    let db = err.as_database_error()?;

    if db.is_unique_violation() {
        return Some(ConstraintViolation::Unique);
    }
    if db.is_foreign_key_violation() {
        return Some(ConstraintViolation::ForeignKey);
    }

    db.code()
        .and_then(|code| classify_code(code.as_ref(), db.message()))
}
