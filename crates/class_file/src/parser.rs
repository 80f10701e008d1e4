use std::io::{self, BufReader, Read};

use byteorder::{BigEndian, ReadBytesExt};
use java_string::JavaString;

use crate::{
    attributes::{
        Attribute, AttributeInfo, AttributeTag, Attributes, CodeAttribute, ConstantValue,
        ExceptionTableEntry, InnerClass, LineNumber, LocalVariable,
    },
    class_file::{FieldInfo, MethodInfo},
    constant_pool::{
        ClassInfo, CpInfo, DynamicInfo, MethodHandleInfo, MethodTypeInfo, ModuleInfo,
        NameAndTypeInfo, PackageInfo, RefInfo, StringInfo,
    },
    descriptor::{display_name, FieldType, MethodDescriptor},
};

use super::*;

type Endian = BigEndian;

const MAGIC: u32 = 0xCAFEBABE;

/// Single pass, forward-only class file decoder.
///
/// Every read is big-endian and advances [`Parser::position`]; running out of input
/// anywhere yields [`ClassFileError::TruncatedStream`] pointing at the field that
/// could not be read.
pub struct Parser<R> {
    r: BufReader<R>,
    position: u64,
    in_code: bool,
}
impl<R: Read> Parser<R> {
    pub fn new(r: R) -> Self {
        Self {
            r: BufReader::new(r),
            position: 0,
            in_code: false,
        }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn parse(&mut self) -> Result<ClassFile> {
        self.parse_magic_identifier()?;
        let version = self.parse_version()?;
        log::debug!("class file version {}.{}", version.0, version.1);

        let constant_pool = self.parse_constant_pool()?;
        let access_flags = AccessFlags::from_bits_truncate(self.read_u16()?);
        let this_class = display_name(constant_pool.class_name(self.read_u16()?)?);
        let super_class = match self.read_u16()? {
            // Only java.lang.Object has no superclass.
            0 => None,
            index => Some(display_name(constant_pool.class_name(index)?)),
        };

        let interfaces_count = self.read_u16()?;
        let interfaces = (0..interfaces_count)
            .map(|_| Ok(display_name(constant_pool.class_name(self.read_u16()?)?)))
            .collect::<Result<Vec<_>>>()?;

        let fields_count = self.read_u16()?;
        let fields = (0..fields_count)
            .map(|_| self.parse_field_info(&constant_pool))
            .collect::<Result<Vec<_>>>()?;

        let methods_count = self.read_u16()?;
        let methods = (0..methods_count)
            .map(|_| self.parse_method_info(&constant_pool))
            .collect::<Result<Vec<_>>>()?;

        let attributes = self.parse_attributes(&constant_pool)?;

        log::debug!(
            "decoded {this_class}: {} fields, {} methods, {} bytes",
            fields.len(),
            methods.len(),
            self.position
        );

        Ok(ClassFile {
            version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    fn parse_field_info(&mut self, constant_pool: &ConstantPool) -> Result<FieldInfo> {
        let access_flags = AccessFlags::from_bits_truncate(self.read_u16()?);
        let name = constant_pool.utf8(self.read_u16()?)?.to_owned();
        let descriptor = constant_pool.utf8(self.read_u16()?)?.to_owned();
        let field_type = FieldType::parse(&descriptor)?;
        let attributes = self.parse_attributes(constant_pool)?;

        Ok(FieldInfo {
            access_flags,
            name,
            descriptor,
            field_type,
            attributes,
        })
    }

    fn parse_method_info(&mut self, constant_pool: &ConstantPool) -> Result<MethodInfo> {
        let access_flags = AccessFlags::from_bits_truncate(self.read_u16()?);
        let name = constant_pool.utf8(self.read_u16()?)?.to_owned();
        let descriptor = constant_pool.utf8(self.read_u16()?)?.to_owned();
        let method_descriptor = MethodDescriptor::parse(&descriptor)?;
        let attributes = self.parse_attributes(constant_pool)?;

        Ok(MethodInfo {
            access_flags,
            name,
            descriptor,
            method_descriptor,
            attributes,
        })
    }

    fn parse_magic_identifier(&mut self) -> Result<()> {
        match self.read_u32()? {
            MAGIC => Ok(()),
            magic_identifier => Err(ClassFileError::InvalidMagicIdentifier(magic_identifier)),
        }
    }

    fn parse_version(&mut self) -> Result<(u16, u16)> {
        let minor = self.read_u16()?;
        let major = self.read_u16()?;
        Ok((major, minor))
    }

    fn parse_constant_pool(&mut self) -> Result<ConstantPool> {
        let constant_pool_count = self.read_u16()?;

        let count = constant_pool_count.saturating_sub(1) as usize;
        let mut res = Vec::with_capacity(count);
        while res.len() < count {
            let cp_info = self.parse_cp_info(res.len() as u16 + 1)?;
            let is_wide = cp_info.is_wide();
            res.push(cp_info);
            if is_wide && res.len() < count {
                res.push(CpInfo::Unusable);
            }
        }
        log::debug!("constant pool: {count} slots");

        let constant_pool = ConstantPool::new(res);
        constant_pool.validate()?;
        Ok(constant_pool)
    }

    fn parse_cp_info(&mut self, index: u16) -> Result<CpInfo> {
        let tag = self.read_u8()?;
        let cp_info = match tag {
            1 => self.parse_utf8(index)?,
            3 => CpInfo::Integer(self.read_i32()?),
            4 => CpInfo::Float(f32::from_bits(self.read_u32()?)),
            5 => CpInfo::Long(self.read_i64()?),
            6 => CpInfo::Double(f64::from_bits(self.read_u64()?)),
            7 => CpInfo::Class(ClassInfo {
                name_index: self.read_u16()?,
            }),
            8 => CpInfo::String(StringInfo {
                string_index: self.read_u16()?,
            }),
            9 => CpInfo::FieldRef(self.parse_ref_info()?),
            10 => CpInfo::MethodRef(self.parse_ref_info()?),
            11 => CpInfo::InterfaceMethodRef(self.parse_ref_info()?),
            12 => self.parse_name_and_type_info()?,
            15 => self.parse_method_handle()?,
            16 => CpInfo::MethodType(MethodTypeInfo {
                descriptor_index: self.read_u16()?,
            }),
            17 => CpInfo::Dynamic(self.parse_dynamic_info()?),
            18 => CpInfo::InvokeDynamic(self.parse_dynamic_info()?),
            19 => CpInfo::Module(ModuleInfo {
                name_index: self.read_u16()?,
            }),
            20 => CpInfo::Package(PackageInfo {
                name_index: self.read_u16()?,
            }),
            _ => return Err(ClassFileError::InvalidCpInfoTag { index, tag }),
        };

        Ok(cp_info)
    }

    // Class files store strings as modified UTF-8: NUL takes two bytes and
    // supplementary characters are written as surrogate pairs.
    fn parse_utf8(&mut self, index: u16) -> Result<CpInfo> {
        let length = self.read_u16()?;
        let bytes = self.read_bytes(length as u32)?;
        let string = JavaString::from_modified_utf8(bytes)
            .ok()
            .and_then(|s| s.into_string().ok())
            .ok_or(ClassFileError::InvalidModifiedUtf8 { index })?;

        Ok(CpInfo::Utf8(string))
    }

    fn parse_name_and_type_info(&mut self) -> Result<CpInfo> {
        let name_index = self.read_u16()?;
        let descriptor_index = self.read_u16()?;

        Ok(CpInfo::NameAndType(NameAndTypeInfo {
            name_index,
            descriptor_index,
        }))
    }

    fn parse_method_handle(&mut self) -> Result<CpInfo> {
        let reference_kind = self.read_u8()?;
        let reference_index = self.read_u16()?;

        Ok(CpInfo::MethodHandle(MethodHandleInfo {
            reference_kind,
            reference_index,
        }))
    }

    fn parse_dynamic_info(&mut self) -> Result<DynamicInfo> {
        let bootstrap_method_attr_index = self.read_u16()?;
        let name_and_type_index = self.read_u16()?;

        Ok(DynamicInfo {
            bootstrap_method_attr_index,
            name_and_type_index,
        })
    }

    fn parse_ref_info(&mut self) -> Result<RefInfo> {
        let class_index = self.read_u16()?;
        let name_and_type_index = self.read_u16()?;

        Ok(RefInfo {
            class_index,
            name_and_type_index,
        })
    }

    /// Decodes one `attribute_info`. Unknown attribute names are skipped by their
    /// declared length and produce `None`.
    pub fn parse_attribute(&mut self, constant_pool: &ConstantPool) -> Result<Option<Attribute>> {
        let offset = self.position;
        let attribute_name_index = self.read_u16()?;
        let attribute_length = self.read_u32()?;

        let name = match constant_pool.get(attribute_name_index) {
            Ok(CpInfo::Utf8(name)) => name.clone(),
            _ => {
                return Err(ClassFileError::MalformedAttributeHeader {
                    offset,
                    index: attribute_name_index,
                })
            }
        };

        let Some(tag) = AttributeTag::from_name(&name) else {
            log::debug!("skipping unknown attribute {name} ({attribute_length} bytes)");
            self.skip(attribute_length)?;
            return Ok(None);
        };

        if tag == AttributeTag::Code && self.in_code {
            return Err(ClassFileError::NestedCodeAttribute { offset });
        }

        let start = self.position;
        let info = match tag {
            AttributeTag::SourceFile => {
                AttributeInfo::SourceFile(constant_pool.utf8(self.read_u16()?)?.to_owned())
            }
            AttributeTag::ConstantValue => {
                AttributeInfo::ConstantValue(self.parse_constant_value(constant_pool)?)
            }
            AttributeTag::Code => AttributeInfo::Code(self.parse_code_attribute(constant_pool)?),
            AttributeTag::Exceptions => {
                let number_of_exceptions = self.read_u16()?;
                let exceptions = (0..number_of_exceptions)
                    .map(|_| Ok(constant_pool.class_name(self.read_u16()?)?.to_owned()))
                    .collect::<Result<Vec<_>>>()?;
                AttributeInfo::Exceptions(exceptions)
            }
            AttributeTag::InnerClasses => {
                let number_of_classes = self.read_u16()?;
                let inner_classes = (0..number_of_classes)
                    .map(|_| self.parse_inner_class(constant_pool))
                    .collect::<Result<Vec<_>>>()?;
                AttributeInfo::InnerClasses(inner_classes)
            }
            AttributeTag::LineNumberTable => {
                let line_number_table_length = self.read_u16()?;
                let line_numbers = (0..line_number_table_length)
                    .map(|_| {
                        Ok(LineNumber {
                            start_pc: self.read_u16()?,
                            line_number: self.read_u16()?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                AttributeInfo::LineNumberTable(line_numbers)
            }
            AttributeTag::LocalVariableTable => {
                let local_variable_table_length = self.read_u16()?;
                let local_variables = (0..local_variable_table_length)
                    .map(|_| self.parse_local_variable(constant_pool))
                    .collect::<Result<Vec<_>>>()?;
                AttributeInfo::LocalVariableTable(local_variables)
            }
            AttributeTag::Synthetic => AttributeInfo::Synthetic,
            AttributeTag::Deprecated => AttributeInfo::Deprecated,
        };

        let consumed = self.position - start;
        if consumed != attribute_length as u64 {
            return Err(ClassFileError::AttributeLengthMismatch {
                name,
                declared: attribute_length,
                consumed,
            });
        }
        log::trace!("attribute {name} ({attribute_length} bytes) at offset {offset}");

        Ok(Some(Attribute {
            name,
            length: attribute_length,
            info,
        }))
    }

    fn parse_constant_value(&mut self, constant_pool: &ConstantPool) -> Result<ConstantValue> {
        let index = self.read_u16()?;
        let value = match constant_pool.get(index)? {
            CpInfo::Integer(i) => ConstantValue::Integer(*i),
            CpInfo::Long(l) => ConstantValue::Long(*l),
            CpInfo::Float(f) => ConstantValue::Float(*f),
            CpInfo::Double(d) => ConstantValue::Double(*d),
            CpInfo::String(StringInfo { string_index }) => {
                ConstantValue::String(constant_pool.utf8(*string_index)?.to_owned())
            }
            c => {
                return Err(ClassFileError::InvalidConstantValue {
                    index,
                    found: c.kind(),
                })
            }
        };
        Ok(value)
    }

    pub fn parse_code_attribute(&mut self, constant_pool: &ConstantPool) -> Result<CodeAttribute> {
        let max_stack = self.read_u16()?;
        let max_locals = self.read_u16()?;
        let code_length = self.read_u32()?;
        let code = self.read_bytes(code_length)?;
        let exception_table_length = self.read_u16()?;
        let exception_table = (0..exception_table_length)
            .map(|_| self.parse_exception_table_entry(constant_pool))
            .collect::<Result<Vec<_>>>()?;

        // A Code attribute never carries another Code attribute.
        let in_code = std::mem::replace(&mut self.in_code, true);
        let attributes = self.parse_attributes(constant_pool);
        self.in_code = in_code;
        let attributes = attributes?;

        Ok(CodeAttribute {
            max_stack,
            max_locals,
            code,
            exception_table,
            attributes,
        })
    }

    fn parse_exception_table_entry(
        &mut self,
        constant_pool: &ConstantPool,
    ) -> Result<ExceptionTableEntry> {
        let start_pc = self.read_u16()?;
        let end_pc = self.read_u16()?;
        let handler_pc = self.read_u16()?;
        let catch_type = match self.read_u16()? {
            0 => None,
            index => Some(constant_pool.class_name(index)?.to_owned()),
        };

        Ok(ExceptionTableEntry {
            start_pc,
            end_pc,
            handler_pc,
            catch_type,
        })
    }

    fn parse_inner_class(&mut self, constant_pool: &ConstantPool) -> Result<InnerClass> {
        let inner_class = constant_pool.class_name(self.read_u16()?)?.to_owned();
        let outer_class = match self.read_u16()? {
            0 => None,
            index => Some(constant_pool.class_name(index)?.to_owned()),
        };
        let inner_name = match self.read_u16()? {
            0 => None,
            index => Some(constant_pool.utf8(index)?.to_owned()),
        };
        let access_flags = AccessFlags::from_bits_truncate(self.read_u16()?);

        Ok(InnerClass {
            inner_class,
            outer_class,
            inner_name,
            access_flags,
        })
    }

    fn parse_local_variable(&mut self, constant_pool: &ConstantPool) -> Result<LocalVariable> {
        let start_pc = self.read_u16()?;
        let length = self.read_u16()?;
        let name = constant_pool.utf8(self.read_u16()?)?.to_owned();
        let descriptor = constant_pool.utf8(self.read_u16()?)?.to_owned();
        let index = self.read_u16()?;

        Ok(LocalVariable {
            start_pc,
            length,
            name,
            descriptor,
            index,
        })
    }

    fn parse_attributes(&mut self, constant_pool: &ConstantPool) -> Result<Attributes> {
        let attributes_count = self.read_u16()?;
        let mut attributes = Vec::with_capacity(attributes_count as usize);
        for _ in 0..attributes_count {
            if let Some(attribute) = self.parse_attribute(constant_pool)? {
                attributes.push(attribute);
            }
        }
        Ok(Attributes(attributes))
    }

    fn read<T>(
        &mut self,
        width: u64,
        read: impl FnOnce(&mut BufReader<R>) -> io::Result<T>,
    ) -> Result<T> {
        match read(&mut self.r) {
            Ok(value) => {
                self.position += width;
                Ok(value)
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(ClassFileError::TruncatedStream {
                    offset: self.position,
                    needed: width,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    // Bounded by `take`; a declared length never allocates more than the input holds.
    fn read_bytes(&mut self, length: u32) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.r.by_ref().take(length as u64).read_to_end(&mut bytes)?;
        if bytes.len() < length as usize {
            return Err(ClassFileError::TruncatedStream {
                offset: self.position,
                needed: length as u64,
            });
        }
        self.position += length as u64;
        Ok(bytes)
    }

    fn skip(&mut self, length: u32) -> Result<()> {
        let skipped = io::copy(&mut self.r.by_ref().take(length as u64), &mut io::sink())?;
        if skipped < length as u64 {
            return Err(ClassFileError::TruncatedStream {
                offset: self.position,
                needed: length as u64,
            });
        }
        self.position += skipped;
        Ok(())
    }

    fn read_u64(&mut self) -> Result<u64> {
        self.read(8, |r| r.read_u64::<Endian>())
    }

    fn read_i64(&mut self) -> Result<i64> {
        self.read(8, |r| r.read_i64::<Endian>())
    }

    fn read_u32(&mut self) -> Result<u32> {
        self.read(4, |r| r.read_u32::<Endian>())
    }

    fn read_i32(&mut self) -> Result<i32> {
        self.read(4, |r| r.read_i32::<Endian>())
    }

    fn read_u16(&mut self) -> Result<u16> {
        self.read(2, |r| r.read_u16::<Endian>())
    }

    fn read_u8(&mut self) -> Result<u8> {
        self.read(1, |r| r.read_u8())
    }
}
