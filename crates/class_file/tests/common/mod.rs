#![allow(dead_code)]

pub const OBJECT: &str = "java/lang/Object";

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_SUPER: u16 = 0x0020;
pub const ACC_ABSTRACT: u16 = 0x0400;

#[derive(Default, Clone, Debug)]
pub struct Bytes(pub Vec<u8>);
impl Bytes {
    pub fn u1(&mut self, v: u8) -> &mut Self {
        self.0.push(v);
        self
    }

    pub fn u2(&mut self, v: u16) -> &mut Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn u4(&mut self, v: u32) -> &mut Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn raw(&mut self, v: &[u8]) -> &mut Self {
        self.0.extend_from_slice(v);
        self
    }
}

/// Writes constant pool entries and hands out their indices. Utf8 entries are shared.
#[derive(Default)]
pub struct Pool {
    pub bytes: Bytes,
    slots: u16,
    utf8s: Vec<(String, u16)>,
}
impl Pool {
    /// The `constant_pool_count` for the entries written so far.
    pub fn count(&self) -> u16 {
        self.slots + 1
    }

    fn push(&mut self, entry: &[u8], slots: u16) -> u16 {
        let index = self.slots + 1;
        self.bytes.raw(entry);
        self.slots += slots;
        index
    }

    pub fn utf8(&mut self, s: &str) -> u16 {
        if let Some((_, index)) = self.utf8s.iter().find(|(u, _)| u == s) {
            return *index;
        }
        let mut entry = Bytes::default();
        entry.u1(1).u2(s.len() as u16).raw(s.as_bytes());
        let index = self.push(&entry.0, 1);
        self.utf8s.push((s.to_owned(), index));
        index
    }

    /// A Utf8 entry holding `bytes` as is, valid modified UTF-8 or not.
    pub fn utf8_bytes(&mut self, bytes: &[u8]) -> u16 {
        let mut entry = Bytes::default();
        entry.u1(1).u2(bytes.len() as u16).raw(bytes);
        self.push(&entry.0, 1)
    }

    pub fn integer(&mut self, v: i32) -> u16 {
        let mut entry = Bytes::default();
        entry.u1(3).raw(&v.to_be_bytes());
        self.push(&entry.0, 1)
    }

    pub fn float(&mut self, v: f32) -> u16 {
        let mut entry = Bytes::default();
        entry.u1(4).u4(v.to_bits());
        self.push(&entry.0, 1)
    }

    pub fn long(&mut self, v: i64) -> u16 {
        let mut entry = Bytes::default();
        entry.u1(5).raw(&v.to_be_bytes());
        self.push(&entry.0, 2)
    }

    pub fn double(&mut self, v: f64) -> u16 {
        let mut entry = Bytes::default();
        entry.u1(6).raw(&v.to_bits().to_be_bytes());
        self.push(&entry.0, 2)
    }

    pub fn class(&mut self, name: &str) -> u16 {
        let name_index = self.utf8(name);
        self.class_at(name_index)
    }

    /// A `Class` entry pointing at an arbitrary index, valid or not.
    pub fn class_at(&mut self, name_index: u16) -> u16 {
        let mut entry = Bytes::default();
        entry.u1(7).u2(name_index);
        self.push(&entry.0, 1)
    }

    pub fn string(&mut self, s: &str) -> u16 {
        let string_index = self.utf8(s);
        let mut entry = Bytes::default();
        entry.u1(8).u2(string_index);
        self.push(&entry.0, 1)
    }

    pub fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        let mut entry = Bytes::default();
        entry.u1(12).u2(name_index).u2(descriptor_index);
        self.push(&entry.0, 1)
    }

    pub fn method_ref(&mut self, class_index: u16, name: &str, descriptor: &str) -> u16 {
        let name_and_type_index = self.name_and_type(name, descriptor);
        let mut entry = Bytes::default();
        entry.u1(10).u2(class_index).u2(name_and_type_index);
        self.push(&entry.0, 1)
    }
}

pub fn attribute(name_index: u16, body: &[u8]) -> Vec<u8> {
    let mut bytes = Bytes::default();
    bytes.u2(name_index).u4(body.len() as u32).raw(body);
    bytes.0
}

pub fn member(access_flags: u16, name_index: u16, descriptor_index: u16, attributes: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = Bytes::default();
    bytes
        .u2(access_flags)
        .u2(name_index)
        .u2(descriptor_index)
        .u2(attributes.len() as u16);
    for attribute in attributes {
        bytes.raw(attribute);
    }
    bytes.0
}

pub struct ClassBuilder {
    pub pool: Pool,
    pub access_flags: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<Vec<u8>>,
    pub methods: Vec<Vec<u8>>,
    pub attributes: Vec<Vec<u8>>,
}
impl ClassBuilder {
    /// Takes pool indices 1 to 4: the class name, its `Class`, `java/lang/Object`
    /// and its `Class`.
    pub fn new(name: &str) -> Self {
        let mut pool = Pool::default();
        let this_class = pool.class(name);
        let super_class = pool.class(OBJECT);
        Self {
            pool,
            access_flags: ACC_PUBLIC | ACC_SUPER,
            this_class,
            super_class,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn attribute(&mut self, name: &str, body: &[u8]) -> Vec<u8> {
        let name_index = self.pool.utf8(name);
        attribute(name_index, body)
    }

    pub fn field(&mut self, access_flags: u16, name: &str, descriptor: &str, attributes: Vec<Vec<u8>>) {
        let name_index = self.pool.utf8(name);
        let descriptor_index = self.pool.utf8(descriptor);
        self.fields
            .push(member(access_flags, name_index, descriptor_index, &attributes));
    }

    pub fn method(&mut self, access_flags: u16, name: &str, descriptor: &str, attributes: Vec<Vec<u8>>) {
        let name_index = self.pool.utf8(name);
        let descriptor_index = self.pool.utf8(descriptor);
        self.methods
            .push(member(access_flags, name_index, descriptor_index, &attributes));
    }

    /// A `Code` attribute. Exception table rows are `[start_pc, end_pc, handler_pc, catch_type]`.
    pub fn code(
        &mut self,
        max_stack: u16,
        max_locals: u16,
        code: &[u8],
        exception_table: &[[u16; 4]],
        attributes: Vec<Vec<u8>>,
    ) -> Vec<u8> {
        let name_index = self.pool.utf8("Code");
        let mut body = Bytes::default();
        body.u2(max_stack)
            .u2(max_locals)
            .u4(code.len() as u32)
            .raw(code)
            .u2(exception_table.len() as u16);
        for row in exception_table {
            body.u2(row[0]).u2(row[1]).u2(row[2]).u2(row[3]);
        }
        body.u2(attributes.len() as u16);
        for attribute in &attributes {
            body.raw(attribute);
        }
        attribute(name_index, &body.0)
    }

    /// Rows are `(start_pc, line_number)`.
    pub fn line_number_table(&mut self, rows: &[(u16, u16)]) -> Vec<u8> {
        let name_index = self.pool.utf8("LineNumberTable");
        let mut body = Bytes::default();
        body.u2(rows.len() as u16);
        for (start_pc, line_number) in rows {
            body.u2(*start_pc).u2(*line_number);
        }
        attribute(name_index, &body.0)
    }

    /// Rows are `(start_pc, length, name, descriptor, index)`.
    pub fn local_variable_table(&mut self, rows: &[(u16, u16, &str, &str, u16)]) -> Vec<u8> {
        let name_index = self.pool.utf8("LocalVariableTable");
        let mut body = Bytes::default();
        body.u2(rows.len() as u16);
        for (start_pc, length, name, descriptor, index) in rows {
            let name = self.pool.utf8(name);
            let descriptor = self.pool.utf8(descriptor);
            body.u2(*start_pc).u2(*length).u2(name).u2(descriptor).u2(*index);
        }
        attribute(name_index, &body.0)
    }

    pub fn source_file(&mut self, file_name: &str) -> Vec<u8> {
        let name_index = self.pool.utf8("SourceFile");
        let file_name_index = self.pool.utf8(file_name);
        attribute(name_index, &file_name_index.to_be_bytes())
    }

    pub fn build(&self) -> Vec<u8> {
        let mut bytes = Bytes::default();
        bytes
            .u4(0xCAFEBABE)
            .u2(0)
            .u2(52)
            .u2(self.pool.count())
            .raw(&self.pool.bytes.0)
            .u2(self.access_flags)
            .u2(self.this_class)
            .u2(self.super_class)
            .u2(self.interfaces.len() as u16);
        for interface in &self.interfaces {
            bytes.u2(*interface);
        }
        bytes.u2(self.fields.len() as u16);
        for field in &self.fields {
            bytes.raw(field);
        }
        bytes.u2(self.methods.len() as u16);
        for method in &self.methods {
            bytes.raw(method);
        }
        bytes.u2(self.attributes.len() as u16);
        for attribute in &self.attributes {
            bytes.raw(attribute);
        }
        bytes.0
    }
}

/// ```java
/// package my;
///
/// public class MyClass {
///     private final int myField;
///
///     public MyClass() { }
///
///     public float add(int i) { return i; }
/// }
/// ```
pub fn my_class() -> Vec<u8> {
    let mut class = ClassBuilder::new("my/MyClass");
    class.field(ACC_PRIVATE | ACC_FINAL, "myField", "I", vec![]);

    let [hi, lo] = class.pool.method_ref(class.super_class, "<init>", "()V").to_be_bytes();
    let line_numbers = class.line_number_table(&[(0, 3)]);
    let local_variables = class.local_variable_table(&[(0, 5, "this", "Lmy/MyClass;", 0)]);
    let code = class.code(
        1,
        1,
        &[0x2a, 0xb7, hi, lo, 0xb1],
        &[],
        vec![line_numbers, local_variables],
    );
    class.method(ACC_PUBLIC, "<init>", "()V", vec![code]);

    let code = class.code(1, 2, &[0x1b, 0x86, 0xae], &[], vec![]);
    class.method(ACC_PUBLIC, "add", "(I)F", vec![code]);

    let source_file = class.source_file("MyClass.java");
    class.attributes.push(source_file);

    class.build()
}
