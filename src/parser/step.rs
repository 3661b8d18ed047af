use std::collections::HashMap;

use tracing::warn;

use crate::error::ParseError;
use crate::model::{ExpressId, Value};

/// One `#id=TYPE(...)` instance as written in the DATA section.
#[derive(Debug, Clone, PartialEq)]
pub struct StepEntity {
    pub id: ExpressId,
    pub entity_type: String,
    pub values: Vec<Value>,
}

/// A STEP physical file, with entities kept in file order.
#[derive(Debug, Default)]
pub struct StepFile {
    pub schema: String,
    entities: Vec<StepEntity>,
    positions: HashMap<ExpressId, usize>,
}

impl StepFile {
    pub fn parse(content: &str) -> Result<Self, ParseError> {
        let content = content.trim_start_matches('\u{feff}').trim_start();
        if !content.starts_with("ISO-10303-21") {
            return Err(ParseError::InvalidStep {
                message: "missing ISO-10303-21 header".to_string(),
            });
        }

        let mut file = StepFile::default();
        let mut in_data = false;
        let mut saw_data = false;

        for statement in split_statements(content) {
            let statement = statement.trim();
            if statement.is_empty() {
                continue;
            }

            if !in_data {
                if statement.starts_with("FILE_SCHEMA") {
                    file.schema = parse_schema(statement).unwrap_or_default();
                } else if statement == "DATA" {
                    in_data = true;
                    saw_data = true;
                }
                continue;
            }

            if statement == "ENDSEC" {
                in_data = false;
                continue;
            }

            match parse_entity(statement) {
                Some(entity) => file.push(entity),
                None => warn!(statement = %truncate(statement, 80), "skipping malformed entity"),
            }
        }

        if !saw_data {
            return Err(ParseError::InvalidStep {
                message: "no DATA section".to_string(),
            });
        }

        Ok(file)
    }

    fn push(&mut self, entity: StepEntity) {
        self.positions.insert(entity.id, self.entities.len());
        self.entities.push(entity);
    }

    /// Every instance in file order. A repeated id appears once per occurrence.
    pub fn entities(&self) -> impl Iterator<Item = &StepEntity> {
        self.entities.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Latest definition of `id`.
    #[must_use]
    pub fn get_entity(&self, id: ExpressId) -> Option<&StepEntity> {
        self.positions.get(&id).map(|&pos| &self.entities[pos])
    }

    #[must_use]
    pub fn get_entities_by_type(&self, entity_type: &str) -> Vec<&StepEntity> {
        self.entities
            .iter()
            .filter(|e| e.entity_type == entity_type)
            .collect()
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Splits the file on `;` outside string literals, dropping `/* */` comments.
fn split_statements(content: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                in_string = !in_string;
                current.push(ch);
            }
            '/' if !in_string && chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            ';' if !in_string => statements.push(std::mem::take(&mut current)),
            '\r' | '\n' if !in_string => {}
            _ => current.push(ch),
        }
    }

    statements
}

fn parse_schema(statement: &str) -> Option<String> {
    let start = statement.find('\'')? + 1;
    let len = statement[start..].find('\'')?;
    Some(statement[start..start + len].to_string())
}

fn parse_entity(statement: &str) -> Option<StepEntity> {
    // #123=IFCWALL('guid',#5,'name',...)
    let rest = statement.strip_prefix('#')?;
    let eq = rest.find('=')?;
    let id = rest[..eq].trim().parse().ok().map(ExpressId)?;

    let body = rest[eq + 1..].trim();
    let open = body.find('(')?;
    let entity_type = body[..open].trim().to_ascii_uppercase();
    if entity_type.is_empty() {
        return None;
    }
    let args = body[open + 1..].strip_suffix(')')?;

    Some(StepEntity {
        id,
        entity_type,
        values: parse_values(args),
    })
}

fn parse_values(s: &str) -> Vec<Value> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut depth = 0usize;

    for ch in s.chars() {
        match ch {
            '\'' => {
                in_string = !in_string;
                current.push(ch);
            }
            '(' if !in_string => {
                depth += 1;
                current.push(ch);
            }
            ')' if !in_string => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if !in_string && depth == 0 => {
                values.push(parse_single_value(&current));
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if !current.trim().is_empty() || !values.is_empty() {
        values.push(parse_single_value(&current));
    }

    values
}

fn parse_single_value(s: &str) -> Value {
    let s = s.trim();

    match s {
        "$" | "" => return Value::Null,
        "*" => return Value::Derived,
        _ => {}
    }
    if let Some(id) = s.strip_prefix('#').and_then(|n| n.parse().ok()) {
        return Value::Reference(ExpressId(id));
    }
    if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
        return Value::Text(decode_step_string(&s[1..s.len() - 1]));
    }
    if s.len() >= 2 && s.starts_with('.') && s.ends_with('.') {
        return match &s[1..s.len() - 1] {
            "T" => Value::Boolean(true),
            "F" => Value::Boolean(false),
            other => Value::Enum(other.to_string()),
        };
    }
    if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        return Value::List(parse_values(inner));
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Real(f);
    }
    // Typed value such as IFCLENGTHMEASURE(2.5)
    if let Some(open) = s.find('(') {
        if let Some(inner) = s[open + 1..].strip_suffix(')') {
            return parse_single_value(inner);
        }
    }

    Value::Text(s.to_string())
}

/// Decodes STEP string escapes: `''`, `\\`, `\S\c`, `\X\hh` and `\X2\hhhh...\X0\`.
fn decode_step_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find(['\\', '\'']) {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if let Some(after) = rest.strip_prefix("''") {
            out.push('\'');
            rest = after;
        } else if let Some(after) = rest.strip_prefix("\\\\") {
            out.push('\\');
            rest = after;
        } else if let Some(after) = rest.strip_prefix("\\X2\\") {
            let end = after.find("\\X0\\").unwrap_or(after.len());
            let hex = &after[..end];
            out.extend(
                hex.as_bytes()
                    .chunks(4)
                    .filter_map(|chunk| std::str::from_utf8(chunk).ok())
                    .filter_map(|code| u32::from_str_radix(code, 16).ok())
                    .filter_map(char::from_u32),
            );
            rest = after.get(end + 4..).unwrap_or("");
        } else if let Some(after) = rest.strip_prefix("\\X\\") {
            match after.get(..2).and_then(|h| u8::from_str_radix(h, 16).ok()) {
                Some(byte) => {
                    out.push(char::from(byte));
                    rest = &after[2..];
                }
                None => {
                    out.push_str("\\X\\");
                    rest = after;
                }
            }
        } else if let Some(after) = rest.strip_prefix("\\S\\") {
            let mut chars = after.chars();
            if let Some(c) = chars.next() {
                if let Ok(low) = u8::try_from(u32::from(c)) {
                    out.push(char::from(low | 0x80));
                }
            }
            rest = chars.as_str();
        } else {
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                out.push(c);
            }
            rest = chars.as_str();
        }
    }

    out.push_str(rest);
    out
}
