//! Generic request builder: one code path for every catalog operation.

use crate::catalog::{Operation, RequestShape};
use crate::definition::substitute;
use crate::errors::ApiError;
use crate::value::{Args, Value};
use crate::xml::{encode_rows, map_to_xml, RelationalRow};

/// Validates `args` against `op`, applies defaults, and serializes the request.
pub fn build_request(op: &Operation, args: &Args) -> Result<String, ApiError> {
    let args = resolve_args(op, args)?;

    match op.shape {
        RequestShape::Definition(definition) => {
            let tree = substitute(definition, &args);
            Ok(map_to_xml(&tree, Some(op.command))?)
        }
        RequestShape::Relational { column_tag } => {
            let table_id = scalar_arg(op, &args, "table_id")?;
            let rows = relational_rows(op, args.get("rows"))?;
            Ok(encode_rows(op.command, column_tag, &table_id, &rows)?)
        }
    }
}

/// Schema check plus defaults. Returns a fresh argument set.
pub fn resolve_args(op: &Operation, args: &Args) -> Result<Args, ApiError> {
    if let Some(unknown) = args.labels().find(|label| !op.accepts(label)) {
        return Err(ApiError::UnknownArgument {
            operation: op.name.to_string(),
            argument: unknown.to_string(),
        });
    }

    if let Some(missing) = op.required.iter().find(|label| !args.contains(label)) {
        return Err(ApiError::MissingArgument {
            operation: op.name.to_string(),
            argument: missing.to_string(),
        });
    }

    let mut resolved = args.clone();
    for (label, default) in op.optional {
        if resolved.contains(label) {
            continue;
        }
        if let Some(value) = default.to_value() {
            resolved.insert(*label, value);
        }
    }
    Ok(resolved)
}

fn invalid(op: &Operation, argument: &str, reason: impl Into<String>) -> ApiError {
    ApiError::InvalidArgument {
        operation: op.name.to_string(),
        argument: argument.to_string(),
        reason: reason.into(),
    }
}

fn scalar_arg(op: &Operation, args: &Args, label: &str) -> Result<String, ApiError> {
    args.get(label)
        .and_then(Value::as_scalar_text)
        .ok_or_else(|| invalid(op, label, "expected a text or integer value"))
}

/// `rows` must be a list of maps (or trees) whose values are scalars.
fn relational_rows(op: &Operation, rows: Option<&Value>) -> Result<Vec<RelationalRow>, ApiError> {
    let items = match rows {
        Some(Value::List(items)) => items,
        Some(other) => {
            return Err(invalid(
                op,
                "rows",
                format!("expected a list of rows, got {}", other.kind()),
            ))
        }
        None => return Err(invalid(op, "rows", "expected a list of rows")),
    };

    items
        .iter()
        .enumerate()
        .map(|(index, row)| relational_row(op, index, row))
        .collect()
}

fn relational_row(op: &Operation, index: usize, row: &Value) -> Result<RelationalRow, ApiError> {
    let columns = match row {
        Value::Map(columns) | Value::Tree(columns) => columns,
        other => {
            return Err(invalid(
                op,
                "rows",
                format!("row {} is a {}, expected a map", index, other.kind()),
            ))
        }
    };

    let mut encoded = RelationalRow::with_capacity(columns.len());
    for (name, value) in columns {
        let text = match value {
            Value::Null => String::new(),
            scalar => scalar.as_scalar_text().ok_or_else(|| {
                invalid(
                    op,
                    "rows",
                    format!("row {} column '{}' is a {}", index, name, scalar.kind()),
                )
            })?,
        };
        encoded.push((name.clone(), text));
    }
    Ok(encoded)
}
