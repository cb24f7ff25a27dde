use crate::record::{RawField, RawRecord, Record};
use crate::ValidationError;

/// Validates raw film fields and builds a [`Record`]
///
/// # Rules
///
/// | Field | Accepted | Rejected |
/// |-------|----------|----------|
/// | `title` | any text, trimmed | missing, non-text, empty after trim |
/// | `year`, `nominations`, `awards` | integers, integral floats, numeric text | missing, non-numeric, negative counts |
/// | `best_picture` | booleans, `true/false/yes/no/1/0`, `0`/`1`; absent means `false` | anything else |
///
/// Only `title` is altered (surrounding whitespace stripped), so normalizing
/// an already-normalized record yields the same record.
///
/// `awards > nominations` is accepted and logged; it is a property of the
/// source data rather than of the row's shape.
///
/// # Example
///
/// ```
/// use oscar_crawl::record::{normalize, RawRecord};
///
/// let raw = RawRecord {
///     title: Some(" The Hurt Locker ".into()),
///     year: Some(2010i64.into()),
///     nominations: Some("9".into()),
///     awards: Some(6i64.into()),
///     best_picture: Some(true.into()),
/// };
/// let record = normalize(&raw).unwrap();
/// assert_eq!(record.title, "The Hurt Locker");
/// ```
pub fn normalize(raw: &RawRecord) -> Result<Record, ValidationError> {
    let title = match required(&raw.title, "title")? {
        RawField::Text(text) => text.trim().to_string(),
        other => {
            return Err(ValidationError::NotText {
                field: "title",
                value: other.to_string(),
            })
        }
    };

    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }

    let year = to_integer(required(&raw.year, "year")?, "year")?;
    let year = i32::try_from(year).map_err(|_| ValidationError::OutOfRange {
        field: "year",
        value: year.to_string(),
    })?;

    let nominations = to_count(required(&raw.nominations, "nominations")?, "nominations")?;
    let awards = to_count(required(&raw.awards, "awards")?, "awards")?;

    let best_picture = match &raw.best_picture {
        Some(field) => to_bool(field)?,
        None => false,
    };

    let record = Record {
        title,
        year,
        nominations,
        awards,
        best_picture,
    };

    if !record.is_consistent() {
        tracing::warn!(
            "Record '{}' ({}) reports {} awards for {} nominations",
            record.title,
            record.year,
            record.awards,
            record.nominations
        );
    }

    Ok(record)
}

fn required<'a>(
    field: &'a Option<RawField>,
    name: &'static str,
) -> Result<&'a RawField, ValidationError> {
    field.as_ref().ok_or(ValidationError::MissingField(name))
}

fn to_integer(field: &RawField, name: &'static str) -> Result<i64, ValidationError> {
    let not_numeric = || ValidationError::NotNumeric {
        field: name,
        value: field.to_string(),
    };

    match field {
        RawField::Int(value) => Ok(*value),
        RawField::Float(value) if value.fract() == 0.0 && value.is_finite() => Ok(*value as i64),
        RawField::Text(text) => text.trim().parse::<i64>().map_err(|_| not_numeric()),
        _ => Err(not_numeric()),
    }
}

fn to_count(field: &RawField, name: &'static str) -> Result<u32, ValidationError> {
    let value = to_integer(field, name)?;
    u32::try_from(value).map_err(|_| ValidationError::OutOfRange {
        field: name,
        value: value.to_string(),
    })
}

fn to_bool(field: &RawField) -> Result<bool, ValidationError> {
    match field {
        RawField::Bool(value) => Ok(*value),
        RawField::Int(0) => Ok(false),
        RawField::Int(1) => Ok(true),
        RawField::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" | "" => Ok(false),
            _ => Err(ValidationError::NotBoolean(field.to_string())),
        },
        _ => Err(ValidationError::NotBoolean(field.to_string())),
    }
}
