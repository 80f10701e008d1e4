// https://docs.oracle.com/javase/specs/jvms/se19/html/jvms-4.html#jvms-4.3

use std::{fmt, iter::Peekable, str::Chars};

use crate::{ClassFileError, Result};

/// A field type may have at most this many array dimensions.
pub const MAX_ARRAY_DIMENSIONS: usize = 255;

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub enum FieldType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Object(String),
    Short,
    Boolean,
    Array(Box<FieldType>),
}
impl FieldType {
    pub fn parse(descriptor: &str) -> Result<Self> {
        let mut chars = descriptor.chars().peekable();
        let field_type = parse_field_type(&mut chars, descriptor)?;
        match chars.next() {
            None => Ok(field_type),
            Some(_) => Err(invalid(descriptor)),
        }
    }
}
impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Byte => f.write_str("byte"),
            FieldType::Char => f.write_str("char"),
            FieldType::Double => f.write_str("double"),
            FieldType::Float => f.write_str("float"),
            FieldType::Int => f.write_str("int"),
            FieldType::Long => f.write_str("long"),
            FieldType::Object(class_name) => f.write_str(&display_name(class_name)),
            FieldType::Short => f.write_str("short"),
            FieldType::Boolean => f.write_str("boolean"),
            FieldType::Array(component) => write!(f, "{component}[]"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub struct MethodDescriptor {
    pub parameters: Vec<FieldType>,
    /// `None` for `void`.
    pub return_type: Option<FieldType>,
}
impl MethodDescriptor {
    pub fn parse(descriptor: &str) -> Result<Self> {
        let mut chars = descriptor.chars().peekable();
        if chars.next() != Some('(') {
            return Err(invalid(descriptor));
        }

        let mut parameters = Vec::new();
        while chars.peek() != Some(&')') {
            parameters.push(parse_field_type(&mut chars, descriptor)?);
        }
        chars.next();

        let return_type = if chars.peek() == Some(&'V') {
            chars.next();
            None
        } else {
            Some(parse_field_type(&mut chars, descriptor)?)
        };

        match chars.next() {
            None => Ok(MethodDescriptor {
                parameters,
                return_type,
            }),
            Some(_) => Err(invalid(descriptor)),
        }
    }

    /// The parameter list as Java source, e.g. `int, java.lang.String[]`.
    pub fn parameter_list(&self) -> String {
        self.parameters
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn return_type_name(&self) -> String {
        match &self.return_type {
            Some(field_type) => field_type.to_string(),
            None => "void".to_owned(),
        }
    }
}

/// Turns an internal binary name (`java/lang/Object`) into its dotted form.
pub fn display_name(internal_name: &str) -> String {
    internal_name.replace('/', ".")
}

/// The unqualified part of a class name, e.g. `Inner` for `my.Outer$Inner`.
pub fn simple_name(name: &str) -> &str {
    let name = name.rsplit(|c| c == '/' || c == '.').next().unwrap_or(name);
    name.rsplit('$').next().unwrap_or(name)
}

fn parse_field_type(chars: &mut Peekable<Chars<'_>>, descriptor: &str) -> Result<FieldType> {
    let mut dimensions = 0;
    while chars.next_if_eq(&'[').is_some() {
        dimensions += 1;
        if dimensions > MAX_ARRAY_DIMENSIONS {
            return Err(invalid(descriptor));
        }
    }

    let component = match chars.next().ok_or_else(|| invalid(descriptor))? {
        'B' => FieldType::Byte,
        'C' => FieldType::Char,
        'D' => FieldType::Double,
        'F' => FieldType::Float,
        'I' => FieldType::Int,
        'J' => FieldType::Long,
        'S' => FieldType::Short,
        'Z' => FieldType::Boolean,
        'L' => {
            let mut class_name = String::new();
            loop {
                match chars.next() {
                    Some(';') => break,
                    Some(c) => class_name.push(c),
                    None => return Err(invalid(descriptor)),
                }
            }
            if class_name.is_empty() {
                return Err(invalid(descriptor));
            }
            FieldType::Object(class_name)
        }
        _ => return Err(invalid(descriptor)),
    };

    let field_type = (0..dimensions).fold(component, |field_type, _| {
        FieldType::Array(Box::new(field_type))
    });
    Ok(field_type)
}

fn invalid(descriptor: &str) -> ClassFileError {
    ClassFileError::InvalidDescriptor(descriptor.to_owned())
}
