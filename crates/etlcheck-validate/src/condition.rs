use std::cmp::Ordering;

use regex::Regex;

use etlcheck_core::{CellValue, Dataset};

use crate::errors::ConditionError;

const COLUMN: &str = r"(\w+|`[^`]+`)";

static NULL: CellValue = CellValue::Null;

/// Comparison operator of a row-condition clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    fn parse(op: &str) -> Option<Self> {
        match op {
            "=" | "==" => Some(CompareOp::Eq),
            "!=" | "<>" => Some(CompareOp::Ne),
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::Ge),
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Le),
            _ => None,
        }
    }

    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
        }
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(CellValue),
    Column(String),
}

/// Parsed boolean predicate over the fields of one row.
///
/// A null value fails every comparison, so rows with nulls in a compared
/// column are excluded by the condition.
#[derive(Debug, Clone, PartialEq)]
pub enum RowCondition {
    And(Vec<RowCondition>),
    Or(Vec<RowCondition>),
    Compare {
        column: String,
        op: CompareOp,
        rhs: Operand,
    },
    InSet {
        column: String,
        values: Vec<CellValue>,
        negated: bool,
    },
    Between {
        column: String,
        min: CellValue,
        max: CellValue,
    },
    IsNull {
        column: String,
        negated: bool,
    },
}

#[derive(Debug, Clone, Copy)]
enum Connective {
    And,
    Or,
}

impl Connective {
    fn keyword(&self) -> &'static str {
        match self {
            Connective::And => " and ",
            Connective::Or => " or ",
        }
    }

    fn symbol(&self) -> u8 {
        match self {
            Connective::And => b'&',
            Connective::Or => b'|',
        }
    }
}

impl RowCondition {
    /// Parse an expression such as `PurchaseAmount > 0 and Status != 'Closed'`.
    pub fn parse(expression: &str) -> Result<Self, ConditionError> {
        let expr = strip_outer_parens(expression.trim());
        if expr.is_empty() {
            return Err(ConditionError::Unsupported("empty expression".to_string()));
        }

        for connective in [Connective::Or, Connective::And] {
            let parts = split_top_level(expr, connective)?;
            if parts.len() > 1 {
                let parsed = parts
                    .iter()
                    .map(|part| RowCondition::parse(part))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(match connective {
                    Connective::And => RowCondition::And(parsed),
                    Connective::Or => RowCondition::Or(parsed),
                });
            }
        }

        parse_clause(expr)
    }

    /// Columns referenced anywhere in the condition, in order of appearance.
    pub fn columns(&self) -> Vec<&str> {
        let mut columns = Vec::new();
        self.collect_columns(&mut columns);
        columns
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            RowCondition::And(parts) | RowCondition::Or(parts) => {
                for part in parts {
                    part.collect_columns(out);
                }
            }
            RowCondition::Compare { column, rhs, .. } => {
                out.push(column);
                if let Operand::Column(other) = rhs {
                    out.push(other);
                }
            }
            RowCondition::InSet { column, .. }
            | RowCondition::Between { column, .. }
            | RowCondition::IsNull { column, .. } => out.push(column),
        }
    }

    /// Fails when the condition references a column the dataset lacks.
    pub fn bind(&self, dataset: &Dataset) -> Result<(), ConditionError> {
        match self
            .columns()
            .into_iter()
            .find(|column| !dataset.has_column(column))
        {
            Some(column) => Err(ConditionError::UnknownColumn(column.to_string())),
            None => Ok(()),
        }
    }

    /// Indices of the rows satisfying the condition.
    pub fn filter_rows(&self, dataset: &Dataset) -> Result<Vec<usize>, ConditionError> {
        self.bind(dataset)?;
        Ok((0..dataset.row_count())
            .filter(|row| self.matches(dataset, *row))
            .collect())
    }

    /// Evaluate the condition on one row of a bound dataset.
    pub fn matches(&self, dataset: &Dataset, row: usize) -> bool {
        match self {
            RowCondition::And(parts) => parts.iter().all(|part| part.matches(dataset, row)),
            RowCondition::Or(parts) => parts.iter().any(|part| part.matches(dataset, row)),
            RowCondition::IsNull { column, negated } => {
                cell(dataset, column, row).is_null() != *negated
            }
            RowCondition::InSet {
                column,
                values,
                negated,
            } => {
                let value = cell(dataset, column, row);
                if value.is_null() {
                    return false;
                }
                values.iter().any(|candidate| candidate.loosely_equals(value)) != *negated
            }
            RowCondition::Between { column, min, max } => {
                let value = cell(dataset, column, row);
                matches!(compare_values(value, min), Some(ord) if ord != Ordering::Less)
                    && matches!(compare_values(value, max), Some(ord) if ord != Ordering::Greater)
            }
            RowCondition::Compare { column, op, rhs } => {
                let left = cell(dataset, column, row);
                let right = match rhs {
                    Operand::Literal(value) => value,
                    Operand::Column(other) => cell(dataset, other, row),
                };
                compare_values(left, right)
                    .map(|ordering| op.holds(ordering))
                    .unwrap_or(false)
            }
        }
    }
}

fn cell<'a>(dataset: &'a Dataset, column: &str, row: usize) -> &'a CellValue {
    dataset.value(column, row).unwrap_or(&NULL)
}

fn compare_values(left: &CellValue, right: &CellValue) -> Option<Ordering> {
    if left.is_null() || right.is_null() {
        return None;
    }
    // Text is read as a number only when the other side is numeric.
    match (left, right) {
        (CellValue::Int(left), CellValue::Int(right)) => return Some(left.cmp(right)),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(left), Some(right)) => return left.partial_cmp(&right),
            (Some(left), None) => {
                return parse_number(right).and_then(|right| left.partial_cmp(&right));
            }
            (None, Some(right)) => {
                return parse_number(left).and_then(|left| left.partial_cmp(&right));
            }
            (None, None) => {}
        },
    }
    if let (Some(left), Some(right)) = (left.as_bool(), right.as_bool()) {
        return Some(left.cmp(&right));
    }
    Some(left.to_string().cmp(&right.to_string()))
}

fn parse_number(value: &CellValue) -> Option<f64> {
    value.as_str().and_then(|text| text.trim().parse::<f64>().ok())
}

fn strip_outer_parens(mut expr: &str) -> &str {
    while expr.starts_with('(') && expr.ends_with(')') && wraps_whole(expr) {
        expr = expr[1..expr.len() - 1].trim();
    }
    expr
}

fn wraps_whole(expr: &str) -> bool {
    let mut depth = 0i32;
    let mut quote = None;
    for (idx, byte) in expr.bytes().enumerate() {
        match (quote, byte) {
            (Some(q), b) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'\'' | b'"' | b'`') => quote = Some(byte),
            (None, b'(') => depth += 1,
            (None, b')') => {
                depth -= 1;
                if depth == 0 && idx != expr.len() - 1 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Split on a connective at nesting depth zero, outside quotes.
///
/// The `and` that belongs to a `between x and y` clause is not a split point.
fn split_top_level(expr: &str, connective: Connective) -> Result<Vec<String>, ConditionError> {
    let between_pending = Regex::new(r"(?i)\bbetween\s+\S+$")
        .map_err(|err| ConditionError::Unsupported(err.to_string()))?;
    let bytes = expr.as_bytes();
    let lower = expr.to_ascii_lowercase().into_bytes();
    let keyword = connective.keyword();
    let symbol = connective.symbol();

    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<u8> = None;
    let mut start = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        let byte = bytes[idx];
        if let Some(q) = quote {
            if byte == q {
                quote = None;
            }
            idx += 1;
            continue;
        }
        match byte {
            b'\'' | b'"' | b'`' => quote = Some(byte),
            b'(' | b'[' => depth += 1,
            b')' | b']' => depth -= 1,
            _ if depth == 0 && byte == symbol => {
                parts.push(expr[start..idx].trim().to_string());
                idx += 1;
                while idx < bytes.len() && bytes[idx] == symbol {
                    idx += 1;
                }
                start = idx;
                continue;
            }
            _ if depth == 0 && lower[idx..].starts_with(keyword.as_bytes()) => {
                let segment = expr[start..idx].trim_end();
                let belongs_to_between =
                    matches!(connective, Connective::And) && between_pending.is_match(segment);
                if !belongs_to_between {
                    parts.push(segment.trim().to_string());
                    idx += keyword.len();
                    start = idx;
                    continue;
                }
            }
            _ => {}
        }
        idx += 1;
    }

    if quote.is_some() || depth != 0 {
        return Err(ConditionError::Unsupported(format!(
            "unbalanced quotes or parentheses in '{expr}'"
        )));
    }

    parts.push(expr[start..].trim().to_string());
    if parts.len() > 1 && parts.iter().any(|part| part.is_empty()) {
        return Err(ConditionError::Unsupported(format!(
            "dangling connective in '{expr}'"
        )));
    }
    Ok(parts)
}

fn parse_clause(expr: &str) -> Result<RowCondition, ConditionError> {
    if let Some(condition) = parse_is_null(expr) {
        return Ok(condition);
    }
    if let Some(condition) = parse_in_list(expr)? {
        return Ok(condition);
    }
    if let Some(condition) = parse_between(expr)? {
        return Ok(condition);
    }
    if let Some(condition) = parse_comparison(expr)? {
        return Ok(condition);
    }
    Err(ConditionError::Unsupported(expr.to_string()))
}

fn parse_is_null(expr: &str) -> Option<RowCondition> {
    let re = Regex::new(&format!(r"(?i)^\s*{COLUMN}\s+is\s+(not\s+)?null\s*$")).ok()?;
    let caps = re.captures(expr)?;
    Some(RowCondition::IsNull {
        column: column_name(&caps[1]),
        negated: caps.get(2).is_some(),
    })
}

fn parse_in_list(expr: &str) -> Result<Option<RowCondition>, ConditionError> {
    let Some(re) =
        Regex::new(&format!(r"(?i)^\s*{COLUMN}\s+(not\s+)?in\s*[\(\[](.*)[\)\]]\s*$")).ok()
    else {
        return Ok(None);
    };
    let Some(caps) = re.captures(expr) else {
        return Ok(None);
    };
    let values = split_list(&caps[3])
        .iter()
        .map(|item| parse_literal(item))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(RowCondition::InSet {
        column: column_name(&caps[1]),
        values,
        negated: caps.get(2).is_some(),
    }))
}

fn parse_between(expr: &str) -> Result<Option<RowCondition>, ConditionError> {
    let Some(re) = Regex::new(&format!(
        r"(?i)^\s*{COLUMN}\s+between\s+(\S+)\s+and\s+(\S+)\s*$"
    ))
    .ok() else {
        return Ok(None);
    };
    let Some(caps) = re.captures(expr) else {
        return Ok(None);
    };
    Ok(Some(RowCondition::Between {
        column: column_name(&caps[1]),
        min: parse_literal(&caps[2])?,
        max: parse_literal(&caps[3])?,
    }))
}

fn parse_comparison(expr: &str) -> Result<Option<RowCondition>, ConditionError> {
    let Some(re) = Regex::new(&format!(
        r"^\s*{COLUMN}\s*(==|!=|<>|>=|<=|=|>|<)\s*(.+?)\s*$"
    ))
    .ok() else {
        return Ok(None);
    };
    let Some(caps) = re.captures(expr) else {
        return Ok(None);
    };
    let Some(op) = CompareOp::parse(&caps[2]) else {
        return Ok(None);
    };
    Ok(Some(RowCondition::Compare {
        column: column_name(&caps[1]),
        op,
        rhs: parse_operand(&caps[3])?,
    }))
}

fn parse_operand(raw: &str) -> Result<Operand, ConditionError> {
    let raw = raw.trim();
    if raw.starts_with('`') && raw.ends_with('`') && raw.len() >= 2 {
        return Ok(Operand::Column(column_name(raw)));
    }
    match parse_literal(raw) {
        Ok(value) => Ok(Operand::Literal(value)),
        Err(err) => {
            if raw.chars().all(|ch| ch.is_alphanumeric() || ch == '_') {
                Ok(Operand::Column(raw.to_string()))
            } else {
                Err(err)
            }
        }
    }
}

fn parse_literal(raw: &str) -> Result<CellValue, ConditionError> {
    let raw = raw.trim();
    for quote in ['\'', '"'] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return Ok(CellValue::Text(raw[1..raw.len() - 1].to_string()));
        }
    }
    if let Ok(value) = raw.parse::<i64>() {
        return Ok(CellValue::Int(value));
    }
    if let Ok(value) = raw.parse::<f64>() {
        return Ok(CellValue::Float(value));
    }
    match raw.to_ascii_lowercase().as_str() {
        "true" => Ok(CellValue::Bool(true)),
        "false" => Ok(CellValue::Bool(false)),
        "null" | "none" => Ok(CellValue::Null),
        _ => Err(ConditionError::Unsupported(format!("invalid literal '{raw}'"))),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut quote = None;
    for ch in raw.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => {
                quote = None;
                current.push(c);
            }
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(ch);
                current.push(ch);
            }
            (None, ',') => items.push(std::mem::take(&mut current)),
            (None, c) => current.push(c),
        }
    }
    items.push(current);
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn column_name(raw: &str) -> String {
    raw.trim().trim_matches('`').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use etlcheck_core::Column;

    fn dataset() -> Dataset {
        Dataset::new(vec![
            Column {
                name: "PurchaseAmount".to_string(),
                values: vec![
                    CellValue::Int(100),
                    CellValue::Int(0),
                    CellValue::Float(50.5),
                    CellValue::Null,
                ],
            },
            Column {
                name: "Status".to_string(),
                values: vec![
                    CellValue::from("Active"),
                    CellValue::from("Inactive"),
                    CellValue::from("Pending"),
                    CellValue::from("Active"),
                ],
            },
        ])
        .expect("dataset")
    }

    fn rows(expr: &str) -> Vec<usize> {
        RowCondition::parse(expr)
            .expect("parse")
            .filter_rows(&dataset())
            .expect("filter")
    }

    #[test]
    fn comparison_without_spaces() {
        assert_eq!(rows("PurchaseAmount>0"), vec![0, 2]);
        assert_eq!(rows("PurchaseAmount <= 50.5"), vec![1, 2]);
    }

    #[test]
    fn null_values_fail_every_comparison() {
        assert_eq!(rows("PurchaseAmount != 0"), vec![0, 2]);
        assert_eq!(rows("PurchaseAmount is null"), vec![3]);
        assert_eq!(rows("PurchaseAmount is not null"), vec![0, 1, 2]);
    }

    #[test]
    fn text_membership_and_equality() {
        assert_eq!(rows("Status == 'Active'"), vec![0, 3]);
        assert_eq!(rows("Status in ('Active', 'Pending')"), vec![0, 2, 3]);
        assert_eq!(rows("Status not in [\"Active\"]"), vec![1, 2]);
    }

    #[test]
    fn numeric_text_only_coerces_against_numbers() {
        let codes = Dataset::new(vec![
            Column {
                name: "Code".to_string(),
                values: vec![CellValue::from("1"), CellValue::from("01")],
            },
            Column {
                name: "Amount".to_string(),
                values: vec![CellValue::Int(5), CellValue::Int(50)],
            },
        ])
        .expect("dataset");
        let matching = |expr: &str| {
            RowCondition::parse(expr)
                .expect("parse")
                .filter_rows(&codes)
                .expect("filter")
        };

        assert_eq!(matching("Code == '01'"), vec![1]);
        assert_eq!(matching("Code == 1"), vec![0, 1]);
        assert_eq!(matching("Amount > '10'"), vec![1]);
    }

    #[test]
    fn between_keeps_its_own_and() {
        let parsed = RowCondition::parse("PurchaseAmount between 1 and 60 and Status = 'Pending'")
            .expect("parse");
        assert!(matches!(&parsed, RowCondition::And(parts) if parts.len() == 2));
        assert_eq!(parsed.filter_rows(&dataset()).expect("filter"), vec![2]);
    }

    #[test]
    fn connectives_and_parentheses() {
        assert_eq!(rows("(PurchaseAmount > 60) | (Status == 'Pending')"), vec![0, 2]);
        assert_eq!(rows("PurchaseAmount > 0 & Status == 'Active'"), vec![0]);
        assert_eq!(
            rows("Status = 'Inactive' or (PurchaseAmount > 0 and Status = 'Pending')"),
            vec![1, 2]
        );
    }

    #[test]
    fn unknown_column_is_reported_on_bind() {
        let condition = RowCondition::parse("Amount > 0").expect("parse");
        assert_eq!(
            condition.filter_rows(&dataset()).unwrap_err(),
            ConditionError::UnknownColumn("Amount".to_string())
        );
    }

    #[test]
    fn column_operands_are_bound_too() {
        let condition = RowCondition::parse("PurchaseAmount = Missing").expect("parse");
        assert_eq!(
            condition.bind(&dataset()).unwrap_err(),
            ConditionError::UnknownColumn("Missing".to_string())
        );
    }

    #[test]
    fn rejects_unparseable_expressions() {
        assert!(matches!(
            RowCondition::parse("PurchaseAmount >"),
            Err(ConditionError::Unsupported(_))
        ));
        assert!(matches!(
            RowCondition::parse("Status = 'open"),
            Err(ConditionError::Unsupported(_))
        ));
        assert!(matches!(
            RowCondition::parse(""),
            Err(ConditionError::Unsupported(_))
        ));
    }
}
