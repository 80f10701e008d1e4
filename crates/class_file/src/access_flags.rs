use bitflags::bitflags;

bitflags! {
    /// Access and property flags shared by classes, fields, methods and inner classes.
    ///
    /// Some bits mean different things depending on where they appear (`0x0020` is
    /// `ACC_SUPER` on a class but `ACC_SYNCHRONIZED` on a method), so rendering goes
    /// through [`AccessFlags::modifiers`] with an explicit [`FlagContext`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u16 {
        const PUBLIC = 0x0001;
        const PRIVATE = 0x0002;
        const PROTECTED = 0x0004;
        const STATIC = 0x0008;
        const FINAL = 0x0010;
        const SUPER = 0x0020;
        const SYNCHRONIZED = 0x0020;
        const VOLATILE = 0x0040;
        const BRIDGE = 0x0040;
        const TRANSIENT = 0x0080;
        const VARARGS = 0x0080;
        const NATIVE = 0x0100;
        const INTERFACE = 0x0200;
        const ABSTRACT = 0x0400;
        const STRICT = 0x0800;
        const SYNTHETIC = 0x1000;
        const ANNOTATION = 0x2000;
        const ENUM = 0x4000;
        const MODULE = 0x8000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagContext {
    Class,
    InnerClass,
    Field,
    Method,
}

const CLASS_KEYWORDS: &[(AccessFlags, &str)] = &[
    (AccessFlags::PUBLIC, "public"),
    (AccessFlags::ABSTRACT, "abstract"),
    (AccessFlags::FINAL, "final"),
    (AccessFlags::INTERFACE, "interface"),
];

const INNER_CLASS_KEYWORDS: &[(AccessFlags, &str)] = &[
    (AccessFlags::PUBLIC, "public"),
    (AccessFlags::PROTECTED, "protected"),
    (AccessFlags::PRIVATE, "private"),
    (AccessFlags::ABSTRACT, "abstract"),
    (AccessFlags::STATIC, "static"),
    (AccessFlags::FINAL, "final"),
    (AccessFlags::INTERFACE, "interface"),
];

const FIELD_KEYWORDS: &[(AccessFlags, &str)] = &[
    (AccessFlags::PUBLIC, "public"),
    (AccessFlags::PROTECTED, "protected"),
    (AccessFlags::PRIVATE, "private"),
    (AccessFlags::STATIC, "static"),
    (AccessFlags::FINAL, "final"),
    (AccessFlags::TRANSIENT, "transient"),
    (AccessFlags::VOLATILE, "volatile"),
];

const METHOD_KEYWORDS: &[(AccessFlags, &str)] = &[
    (AccessFlags::PUBLIC, "public"),
    (AccessFlags::PROTECTED, "protected"),
    (AccessFlags::PRIVATE, "private"),
    (AccessFlags::ABSTRACT, "abstract"),
    (AccessFlags::STATIC, "static"),
    (AccessFlags::FINAL, "final"),
    (AccessFlags::SYNCHRONIZED, "synchronized"),
    (AccessFlags::NATIVE, "native"),
    (AccessFlags::STRICT, "strictfp"),
];

impl AccessFlags {
    /// Renders the flags as Java source modifiers, in the order `javac` would print them.
    ///
    /// Flags with no source keyword (synthetic, bridge, enum, ...) are left out.
    pub fn modifiers(self, context: FlagContext) -> String {
        let keywords = match context {
            FlagContext::Class => CLASS_KEYWORDS,
            FlagContext::InnerClass => INNER_CLASS_KEYWORDS,
            FlagContext::Field => FIELD_KEYWORDS,
            FlagContext::Method => METHOD_KEYWORDS,
        };

        keywords
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, keyword)| *keyword)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
