use std::fmt;

use crate::{ClassFileError, Result};

#[macro_export]
macro_rules! matches_cp_info {
    ($cp:expr, $index:expr, $i:ident) => {
        match $cp.get($index)? {
            $crate::constant_pool::CpInfo::$i(n) => Ok(n),
            c => Err($crate::ClassFileError::ConstantPoolTypeMismatch {
                index: $index,
                expected: $crate::constant_pool::CpKind::$i,
                found: c.kind(),
            }),
        }
    };
}

/// The constant pool of a single class file, addressed by 1-based index.
///
/// Slot `i` of the inner vector holds entry `i + 1`. The slot following a `Long` or
/// `Double` is [`CpInfo::Unusable`] and cannot be resolved.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct ConstantPool {
    cp_infos: Vec<CpInfo>,
}
impl ConstantPool {
    pub fn new(cp_infos: Vec<CpInfo>) -> Self {
        Self { cp_infos }
    }

    /// The `constant_pool_count` this pool was decoded from.
    pub fn count(&self) -> u16 {
        self.cp_infos.len() as u16 + 1
    }

    /// Looks up an entry, failing for index 0, out of range indices and the
    /// continuation slot of a long or double.
    pub fn get(&self, index: u16) -> Result<&CpInfo> {
        match index
            .checked_sub(1)
            .and_then(|i| self.cp_infos.get(i as usize))
        {
            None | Some(CpInfo::Unusable) => Err(ClassFileError::InvalidConstantPoolIndex(index)),
            Some(cp_info) => Ok(cp_info),
        }
    }

    pub fn resolve(&self, index: u16, expected: CpKind) -> Result<&CpInfo> {
        let cp_info = self.get(index)?;
        if cp_info.kind() == expected {
            Ok(cp_info)
        } else {
            Err(ClassFileError::ConstantPoolTypeMismatch {
                index,
                expected,
                found: cp_info.kind(),
            })
        }
    }

    pub fn utf8(&self, index: u16) -> Result<&str> {
        matches_cp_info!(self, index, Utf8).map(String::as_str)
    }

    /// Resolves a `Class` entry to its name in internal form (`java/lang/Object`).
    pub fn class_name(&self, index: u16) -> Result<&str> {
        let ClassInfo { name_index } = matches_cp_info!(self, index, Class)?;
        self.utf8(*name_index)
    }

    /// Resolves a `NameAndType` entry to its `(name, descriptor)` pair.
    pub fn name_and_type(&self, index: u16) -> Result<(&str, &str)> {
        let NameAndTypeInfo {
            name_index,
            descriptor_index,
        } = matches_cp_info!(self, index, NameAndType)?;
        Ok((self.utf8(*name_index)?, self.utf8(*descriptor_index)?))
    }

    /// Populated entries with their indices, in index order.
    pub fn entries(&self) -> impl Iterator<Item = (u16, &CpInfo)> {
        self.cp_infos
            .iter()
            .enumerate()
            .filter(|(_, cp_info)| **cp_info != CpInfo::Unusable)
            .map(|(i, cp_info)| (i as u16 + 1, cp_info))
    }

    /// Checks that every cross reference inside the pool lands on an entry of the
    /// kind its referrer requires.
    pub(crate) fn validate(&self) -> Result<()> {
        for (_, cp_info) in self.entries() {
            match cp_info {
                CpInfo::Class(ClassInfo { name_index })
                | CpInfo::Module(ModuleInfo { name_index })
                | CpInfo::Package(PackageInfo { name_index }) => {
                    self.utf8(*name_index)?;
                }
                CpInfo::String(StringInfo { string_index }) => {
                    self.utf8(*string_index)?;
                }
                CpInfo::FieldRef(ref_info)
                | CpInfo::MethodRef(ref_info)
                | CpInfo::InterfaceMethodRef(ref_info) => {
                    self.class_name(ref_info.class_index)?;
                    self.name_and_type(ref_info.name_and_type_index)?;
                }
                CpInfo::NameAndType(NameAndTypeInfo {
                    name_index,
                    descriptor_index,
                }) => {
                    self.utf8(*name_index)?;
                    self.utf8(*descriptor_index)?;
                }
                CpInfo::MethodHandle(MethodHandleInfo {
                    reference_index, ..
                }) => match self.get(*reference_index)?.kind() {
                    CpKind::FieldRef | CpKind::MethodRef | CpKind::InterfaceMethodRef => {}
                    found => {
                        return Err(ClassFileError::ConstantPoolTypeMismatch {
                            index: *reference_index,
                            expected: CpKind::MethodRef,
                            found,
                        })
                    }
                },
                CpInfo::MethodType(MethodTypeInfo { descriptor_index }) => {
                    self.utf8(*descriptor_index)?;
                }
                CpInfo::Dynamic(DynamicInfo {
                    name_and_type_index,
                    ..
                })
                | CpInfo::InvokeDynamic(DynamicInfo {
                    name_and_type_index,
                    ..
                }) => {
                    self.name_and_type(*name_and_type_index)?;
                }
                CpInfo::Utf8(_)
                | CpInfo::Integer(_)
                | CpInfo::Float(_)
                | CpInfo::Long(_)
                | CpInfo::Double(_)
                | CpInfo::Unusable => {}
            }
        }
        Ok(())
    }

    /// The symbolic meaning of an entry's references, e.g. `java/lang/Object.<init>:()V`
    /// for a method reference. Literals have none.
    pub fn symbolic(&self, cp_info: &CpInfo) -> Result<Option<String>> {
        let text = match cp_info {
            CpInfo::Class(ClassInfo { name_index })
            | CpInfo::Module(ModuleInfo { name_index })
            | CpInfo::Package(PackageInfo { name_index }) => self.utf8(*name_index)?.to_owned(),
            CpInfo::String(StringInfo { string_index }) => self.utf8(*string_index)?.to_owned(),
            CpInfo::FieldRef(ref_info)
            | CpInfo::MethodRef(ref_info)
            | CpInfo::InterfaceMethodRef(ref_info) => {
                let class_name = self.class_name(ref_info.class_index)?;
                let (name, descriptor) = self.name_and_type(ref_info.name_and_type_index)?;
                format!("{class_name}.{name}:{descriptor}")
            }
            CpInfo::NameAndType(NameAndTypeInfo {
                name_index,
                descriptor_index,
            }) => format!(
                "{}:{}",
                self.utf8(*name_index)?,
                self.utf8(*descriptor_index)?
            ),
            CpInfo::MethodHandle(MethodHandleInfo {
                reference_kind,
                reference_index,
            }) => {
                let target = self.get(*reference_index)?;
                match self.symbolic(target)? {
                    Some(target) => format!("{reference_kind}:{target}"),
                    None => return Ok(None),
                }
            }
            CpInfo::MethodType(MethodTypeInfo { descriptor_index }) => {
                self.utf8(*descriptor_index)?.to_owned()
            }
            CpInfo::Dynamic(DynamicInfo {
                bootstrap_method_attr_index,
                name_and_type_index,
            })
            | CpInfo::InvokeDynamic(DynamicInfo {
                bootstrap_method_attr_index,
                name_and_type_index,
            }) => {
                let (name, descriptor) = self.name_and_type(*name_and_type_index)?;
                format!("#{bootstrap_method_attr_index}:{name}:{descriptor}")
            }
            CpInfo::Utf8(_)
            | CpInfo::Integer(_)
            | CpInfo::Float(_)
            | CpInfo::Long(_)
            | CpInfo::Double(_)
            | CpInfo::Unusable => return Ok(None),
        };
        Ok(Some(text))
    }
}
impl<'a> IntoIterator for &'a ConstantPool {
    type Item = &'a CpInfo;
    type IntoIter = std::slice::Iter<'a, CpInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.cp_infos.iter()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum CpInfo {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(ClassInfo),
    String(StringInfo),
    FieldRef(RefInfo),
    MethodRef(RefInfo),
    InterfaceMethodRef(RefInfo),
    NameAndType(NameAndTypeInfo),
    MethodHandle(MethodHandleInfo),
    MethodType(MethodTypeInfo),
    Dynamic(DynamicInfo),
    InvokeDynamic(DynamicInfo),
    Module(ModuleInfo),
    Package(PackageInfo),
    Unusable,
}
impl CpInfo {
    pub fn kind(&self) -> CpKind {
        match self {
            CpInfo::Utf8(_) => CpKind::Utf8,
            CpInfo::Integer(_) => CpKind::Integer,
            CpInfo::Float(_) => CpKind::Float,
            CpInfo::Long(_) => CpKind::Long,
            CpInfo::Double(_) => CpKind::Double,
            CpInfo::Class(_) => CpKind::Class,
            CpInfo::String(_) => CpKind::String,
            CpInfo::FieldRef(_) => CpKind::FieldRef,
            CpInfo::MethodRef(_) => CpKind::MethodRef,
            CpInfo::InterfaceMethodRef(_) => CpKind::InterfaceMethodRef,
            CpInfo::NameAndType(_) => CpKind::NameAndType,
            CpInfo::MethodHandle(_) => CpKind::MethodHandle,
            CpInfo::MethodType(_) => CpKind::MethodType,
            CpInfo::Dynamic(_) => CpKind::Dynamic,
            CpInfo::InvokeDynamic(_) => CpKind::InvokeDynamic,
            CpInfo::Module(_) => CpKind::Module,
            CpInfo::Package(_) => CpKind::Package,
            CpInfo::Unusable => CpKind::Unusable,
        }
    }

    /// Long and double entries take up two slots in the pool.
    pub fn is_wide(&self) -> bool {
        matches!(self, CpInfo::Long(_) | CpInfo::Double(_))
    }
}
impl fmt::Display for CpInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.kind())?;
        match self {
            CpInfo::Utf8(s) => write!(f, "{s}"),
            CpInfo::Integer(i) => write!(f, "{i}"),
            CpInfo::Float(v) => write!(f, "{v}f"),
            CpInfo::Long(l) => write!(f, "{l}l"),
            CpInfo::Double(d) => write!(f, "{d}d"),
            CpInfo::Class(ClassInfo { name_index })
            | CpInfo::Module(ModuleInfo { name_index })
            | CpInfo::Package(PackageInfo { name_index }) => write!(f, "#{name_index}"),
            CpInfo::String(StringInfo { string_index }) => write!(f, "#{string_index}"),
            CpInfo::FieldRef(r) | CpInfo::MethodRef(r) | CpInfo::InterfaceMethodRef(r) => {
                write!(f, "#{}.#{}", r.class_index, r.name_and_type_index)
            }
            CpInfo::NameAndType(n) => write!(f, "#{}:#{}", n.name_index, n.descriptor_index),
            CpInfo::MethodHandle(h) => write!(f, "{}:#{}", h.reference_kind, h.reference_index),
            CpInfo::MethodType(m) => write!(f, "#{}", m.descriptor_index),
            CpInfo::Dynamic(d) | CpInfo::InvokeDynamic(d) => write!(
                f,
                "#{}:#{}",
                d.bootstrap_method_attr_index, d.name_and_type_index
            ),
            CpInfo::Unusable => Ok(()),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CpKind {
    Utf8,
    Integer,
    Float,
    Long,
    Double,
    Class,
    String,
    FieldRef,
    MethodRef,
    InterfaceMethodRef,
    NameAndType,
    MethodHandle,
    MethodType,
    Dynamic,
    InvokeDynamic,
    Module,
    Package,
    Unusable,
}
impl fmt::Display for CpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CpKind::Utf8 => "Utf8",
            CpKind::Integer => "Integer",
            CpKind::Float => "Float",
            CpKind::Long => "Long",
            CpKind::Double => "Double",
            CpKind::Class => "Class",
            CpKind::String => "String",
            CpKind::FieldRef => "Fieldref",
            CpKind::MethodRef => "Methodref",
            CpKind::InterfaceMethodRef => "InterfaceMethodref",
            CpKind::NameAndType => "NameAndType",
            CpKind::MethodHandle => "MethodHandle",
            CpKind::MethodType => "MethodType",
            CpKind::Dynamic => "Dynamic",
            CpKind::InvokeDynamic => "InvokeDynamic",
            CpKind::Module => "Module",
            CpKind::Package => "Package",
            CpKind::Unusable => "(unusable)",
        };
        f.write_str(name)
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct RefInfo {
    pub class_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ClassInfo {
    // Must index a Utf8 entry holding a binary class or interface name in internal form.
    pub name_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct StringInfo {
    pub string_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct NameAndTypeInfo {
    pub name_index: u16,
    pub descriptor_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct DynamicInfo {
    pub bootstrap_method_attr_index: u16,
    pub name_and_type_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MethodHandleInfo {
    pub reference_kind: u8,
    pub reference_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MethodTypeInfo {
    pub descriptor_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ModuleInfo {
    pub name_index: u16,
}

#[derive(Debug, PartialEq, Clone)]
pub struct PackageInfo {
    pub name_index: u16,
}
