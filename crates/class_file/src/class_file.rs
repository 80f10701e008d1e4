use std::{
    fmt,
    fs::File,
    io::Read,
    path::Path,
};

use crate::{
    attributes::{Attributes, CodeAttribute, ConstantValue},
    descriptor::{display_name, simple_name, FieldType, MethodDescriptor},
    parser::Parser,
    AccessFlags, ClassFileError, ConstantPool, FlagContext, Result,
};

pub const CONSTRUCTOR_NAME: &str = "<init>";

/// A fully decoded class file. Every constant pool reference has already been
/// resolved, so the accessors below cannot fail.
#[derive(Debug, PartialEq, Clone)]
pub struct ClassFile {
    pub(crate) version: (u16, u16),
    pub(crate) constant_pool: ConstantPool,
    pub(crate) access_flags: AccessFlags,
    pub(crate) this_class: String,
    pub(crate) super_class: Option<String>,
    pub(crate) interfaces: Vec<String>,
    pub(crate) fields: Vec<FieldInfo>,
    pub(crate) methods: Vec<MethodInfo>,
    pub(crate) attributes: Attributes,
}
impl ClassFile {
    pub fn parse(bytes: impl Read) -> Result<ClassFile> {
        Parser::new(bytes).parse()
    }

    /// Decodes the class file at `path`. The file handle is released before this
    /// returns, whether decoding succeeded or not.
    pub fn open(path: impl AsRef<Path>) -> Result<ClassFile> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ClassFileError::UnopenableInput {
            path: path.to_owned(),
            source,
        })?;
        log::debug!("decoding {}", path.display());

        Self::parse(file)
    }

    /// `(major, minor)`
    pub fn version(&self) -> (u16, u16) {
        self.version
    }

    pub fn constant_pool(&self) -> &ConstantPool {
        &self.constant_pool
    }

    pub fn access_flags(&self) -> AccessFlags {
        self.access_flags
    }

    pub fn modifiers(&self) -> String {
        self.access_flags.modifiers(FlagContext::Class)
    }

    /// Dotted name of this class, e.g. `my.MyClass`.
    pub fn class_name(&self) -> &str {
        &self.this_class
    }

    /// Dotted name of the direct superclass; `None` only for `java.lang.Object`.
    pub fn super_class(&self) -> Option<&str> {
        self.super_class.as_deref()
    }

    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn source_file(&self) -> Option<&str> {
        self.attributes.source_file()
    }

    pub fn constructors(&self) -> impl Iterator<Item = &MethodInfo> {
        self.methods.iter().filter(|m| m.is_constructor())
    }

    pub fn field_descriptions(&self) -> Vec<String> {
        self.fields.iter().map(FieldInfo::description).collect()
    }

    /// Descriptions of every method except constructors, in declaration order.
    pub fn method_descriptions(&self) -> Vec<String> {
        self.methods
            .iter()
            .filter(|m| !m.is_constructor())
            .map(|m| m.description(&self.this_class))
            .collect()
    }

    pub fn constructor_descriptions(&self) -> Vec<String> {
        self.constructors()
            .map(|m| m.description(&self.this_class))
            .collect()
    }
}

impl fmt::Display for ClassFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Version: {}.{}", self.version.0, self.version.1)?;

        writeln!(f, "Constant pool:")?;
        for (index, cp_info) in self.constant_pool.entries() {
            write!(f, "  #{index} = {cp_info}")?;
            if let Ok(Some(symbolic)) = self.constant_pool.symbolic(cp_info) {
                write!(f, "  // {symbolic}")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "Modifiers: {}", self.modifiers())?;
        writeln!(f, "Class: {}", self.this_class)?;
        writeln!(
            f,
            "Superclass: {}",
            self.super_class.as_deref().unwrap_or("none")
        )?;

        writeln!(f, "Interfaces:")?;
        for interface in &self.interfaces {
            writeln!(f, "  {interface}")?;
        }

        writeln!(f, "Fields:")?;
        for field in &self.fields {
            writeln!(f, "  {}", field.description())?;
        }

        writeln!(f, "Methods:")?;
        for method in &self.methods {
            writeln!(f, "  {}", method.description(&self.this_class))?;
            if let Some(code) = method.code() {
                write_code(f, code)?;
            }
        }

        if let Some(inner_classes) = self.attributes.inner_classes() {
            writeln!(f, "Inner classes:")?;
            for inner_class in inner_classes {
                writeln!(
                    f,
                    "  {}",
                    with_modifiers(
                        inner_class.access_flags.modifiers(FlagContext::InnerClass),
                        display_name(&inner_class.inner_class),
                    )
                )?;
            }
        }

        if let Some(source_file) = self.source_file() {
            writeln!(f, "Source file: {source_file}")?;
        }

        Ok(())
    }
}

fn write_code(f: &mut fmt::Formatter<'_>, code: &CodeAttribute) -> fmt::Result {
    writeln!(
        f,
        "    Code: max_stack={}, max_locals={}, code_length={}",
        code.max_stack,
        code.max_locals,
        code.code.len()
    )?;

    if !code.exception_table.is_empty() {
        writeln!(f, "    Exception table:")?;
        for entry in &code.exception_table {
            let catch_type = entry
                .catch_type
                .as_deref()
                .map(display_name)
                .unwrap_or_else(|| "any".to_owned());
            writeln!(
                f,
                "      {} {} {} {}",
                entry.start_pc, entry.end_pc, entry.handler_pc, catch_type
            )?;
        }
    }

    if let Some(line_numbers) = code.line_number_table() {
        writeln!(f, "    Line numbers:")?;
        for line_number in line_numbers {
            writeln!(
                f,
                "      line {}: pc {}",
                line_number.line_number, line_number.start_pc
            )?;
        }
    }

    if let Some(local_variables) = code.local_variable_table() {
        writeln!(f, "    Local variables:")?;
        for local_variable in local_variables {
            writeln!(
                f,
                "      {} {} {} [{}, {})",
                local_variable.index,
                local_variable.name,
                local_variable.descriptor,
                local_variable.start_pc,
                local_variable.start_pc as u32 + local_variable.length as u32
            )?;
        }
    }

    Ok(())
}

fn with_modifiers(modifiers: String, rest: String) -> String {
    if modifiers.is_empty() {
        rest
    } else {
        format!("{modifiers} {rest}")
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct FieldInfo {
    pub(crate) access_flags: AccessFlags,
    pub(crate) name: String,
    pub(crate) descriptor: String,
    pub(crate) field_type: FieldType,
    pub(crate) attributes: Attributes,
}
impl FieldInfo {
    pub fn access_flags(&self) -> AccessFlags {
        self.access_flags
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn constant_value(&self) -> Option<&ConstantValue> {
        self.attributes.constant_value()
    }

    /// e.g. `private static final int MAX = 10`
    pub fn description(&self) -> String {
        let mut rest = format!("{} {}", self.field_type, self.name);
        if let Some(value) = self.constant_value() {
            rest.push_str(&format!(" = {value}"));
        }
        with_modifiers(self.access_flags.modifiers(FlagContext::Field), rest)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct MethodInfo {
    pub(crate) access_flags: AccessFlags,
    pub(crate) name: String,
    pub(crate) descriptor: String,
    pub(crate) method_descriptor: MethodDescriptor,
    pub(crate) attributes: Attributes,
}
impl MethodInfo {
    pub fn access_flags(&self) -> AccessFlags {
        self.access_flags
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn method_descriptor(&self) -> &MethodDescriptor {
        &self.method_descriptor
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// The method body; absent for native and abstract methods.
    pub fn code(&self) -> Option<&CodeAttribute> {
        self.attributes.code()
    }

    /// Internal names of the checked exceptions this method declares.
    pub fn exceptions(&self) -> &[String] {
        self.attributes.exceptions().unwrap_or_default()
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }

    /// e.g. `public float add(int) throws java.io.IOException`. Constructors are
    /// named after the simple name of `class_name`.
    pub fn description(&self, class_name: &str) -> String {
        let parameters = self.method_descriptor.parameter_list();
        let mut rest = if self.is_constructor() {
            format!("{}({parameters})", simple_name(class_name))
        } else {
            format!(
                "{} {}({parameters})",
                self.method_descriptor.return_type_name(),
                self.name
            )
        };

        let exceptions = self.exceptions();
        if !exceptions.is_empty() {
            let exceptions = exceptions
                .iter()
                .map(|e| display_name(e))
                .collect::<Vec<_>>()
                .join(", ");
            rest.push_str(&format!(" throws {exceptions}"));
        }

        with_modifiers(self.access_flags.modifiers(FlagContext::Method), rest)
    }
}
