use std::fmt;

use crate::AccessFlags;

/// The attribute names this crate decodes. Every other name is skipped by length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeTag {
    SourceFile,
    ConstantValue,
    Code,
    Exceptions,
    InnerClasses,
    LineNumberTable,
    LocalVariableTable,
    Synthetic,
    Deprecated,
}
impl AttributeTag {
    pub fn from_name(name: &str) -> Option<Self> {
        let tag = match name {
            "SourceFile" => AttributeTag::SourceFile,
            "ConstantValue" => AttributeTag::ConstantValue,
            "Code" => AttributeTag::Code,
            "Exceptions" => AttributeTag::Exceptions,
            "InnerClasses" => AttributeTag::InnerClasses,
            "LineNumberTable" => AttributeTag::LineNumberTable,
            "LocalVariableTable" => AttributeTag::LocalVariableTable,
            "Synthetic" => AttributeTag::Synthetic,
            "Deprecated" => AttributeTag::Deprecated,
            _ => return None,
        };
        Some(tag)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Attribute {
    pub name: String,
    /// The `attribute_length` from the header, in bytes.
    pub length: u32,
    pub info: AttributeInfo,
}
impl Attribute {
    pub fn tag(&self) -> AttributeTag {
        match self.info {
            AttributeInfo::SourceFile(_) => AttributeTag::SourceFile,
            AttributeInfo::ConstantValue(_) => AttributeTag::ConstantValue,
            AttributeInfo::Code(_) => AttributeTag::Code,
            AttributeInfo::Exceptions(_) => AttributeTag::Exceptions,
            AttributeInfo::InnerClasses(_) => AttributeTag::InnerClasses,
            AttributeInfo::LineNumberTable(_) => AttributeTag::LineNumberTable,
            AttributeInfo::LocalVariableTable(_) => AttributeTag::LocalVariableTable,
            AttributeInfo::Synthetic => AttributeTag::Synthetic,
            AttributeInfo::Deprecated => AttributeTag::Deprecated,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum AttributeInfo {
    SourceFile(String),
    ConstantValue(ConstantValue),
    Code(CodeAttribute),
    /// Internal names of the declared checked exceptions.
    Exceptions(Vec<String>),
    InnerClasses(Vec<InnerClass>),
    LineNumberTable(Vec<LineNumber>),
    LocalVariableTable(Vec<LocalVariable>),
    Synthetic,
    Deprecated,
}

#[derive(Debug, Default, PartialEq, Clone)]
pub struct Attributes(pub Vec<Attribute>);
impl Attributes {
    pub fn find_by_name(&self, name: &str) -> Option<&Attribute> {
        self.0.iter().find(|a| a.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn code(&self) -> Option<&CodeAttribute> {
        self.0.iter().find_map(|a| match &a.info {
            AttributeInfo::Code(code) => Some(code),
            _ => None,
        })
    }

    pub fn source_file(&self) -> Option<&str> {
        self.0.iter().find_map(|a| match &a.info {
            AttributeInfo::SourceFile(source_file) => Some(source_file.as_str()),
            _ => None,
        })
    }

    pub fn constant_value(&self) -> Option<&ConstantValue> {
        self.0.iter().find_map(|a| match &a.info {
            AttributeInfo::ConstantValue(value) => Some(value),
            _ => None,
        })
    }

    pub fn exceptions(&self) -> Option<&[String]> {
        self.0.iter().find_map(|a| match &a.info {
            AttributeInfo::Exceptions(exceptions) => Some(exceptions.as_slice()),
            _ => None,
        })
    }

    pub fn inner_classes(&self) -> Option<&[InnerClass]> {
        self.0.iter().find_map(|a| match &a.info {
            AttributeInfo::InnerClasses(inner_classes) => Some(inner_classes.as_slice()),
            _ => None,
        })
    }

    pub fn line_number_table(&self) -> Option<&[LineNumber]> {
        self.0.iter().find_map(|a| match &a.info {
            AttributeInfo::LineNumberTable(table) => Some(table.as_slice()),
            _ => None,
        })
    }

    pub fn local_variable_table(&self) -> Option<&[LocalVariable]> {
        self.0.iter().find_map(|a| match &a.info {
            AttributeInfo::LocalVariableTable(table) => Some(table.as_slice()),
            _ => None,
        })
    }

    pub fn is_synthetic(&self) -> bool {
        self.0.iter().any(|a| matches!(a.info, AttributeInfo::Synthetic))
    }

    pub fn is_deprecated(&self) -> bool {
        self.0.iter().any(|a| matches!(a.info, AttributeInfo::Deprecated))
    }
}
impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum ConstantValue {
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
}
impl fmt::Display for ConstantValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantValue::Integer(i) => write!(f, "{i}"),
            ConstantValue::Long(l) => write!(f, "{l}L"),
            ConstantValue::Float(v) => write!(f, "{v}f"),
            ConstantValue::Double(d) => write!(f, "{d}"),
            ConstantValue::String(s) => write!(f, "{s:?}"),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    /// Internal name of the caught class; `None` catches everything (`finally`).
    pub catch_type: Option<String>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub attributes: Attributes,
}
impl CodeAttribute {
    pub fn local_variable_table(&self) -> Option<&[LocalVariable]> {
        self.attributes.local_variable_table()
    }

    pub fn line_number_table(&self) -> Option<&[LineNumber]> {
        self.attributes.line_number_table()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct InnerClass {
    pub inner_class: String,
    pub outer_class: Option<String>,
    pub inner_name: Option<String>,
    pub access_flags: AccessFlags,
}

#[derive(Debug, PartialEq, Clone)]
pub struct LineNumber {
    pub start_pc: u16,
    pub line_number: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct LocalVariable {
    pub start_pc: u16,
    pub length: u16,
    pub name: String,
    pub descriptor: String,
    pub index: u16,
}
