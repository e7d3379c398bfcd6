// https://docs.oracle.com/javase/specs/jvms/se19/html/jvms-4.html#jvms-4.7.16

mod parser;

use std::fmt;

pub use self::parser::AnnotationParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationVisibility {
    /// Retained by the class file and visible through reflection.
    Runtime,
    /// Retained by the class file but invisible at run time.
    Build,
    /// Nested inside another annotation's element value.
    Embedded,
}

#[derive(Debug, PartialEq, Clone)]
pub enum ElementValue {
    Byte(i8),
    Char(u16),
    Double(f64),
    Float(f32),
    Int(i32),
    Long(i64),
    Short(i16),
    Boolean(bool),
    String(String),
    Enum {
        type_name: String,
        const_name: String,
    },
    /// A return descriptor, such as `Ljava/lang/Object;` or `V`.
    Class(String),
    Annotation(Annotation),
    Array(Box<[ElementValue]>),
}

#[derive(Debug, PartialEq, Clone)]
pub struct NameValuePair {
    pub name: String,
    pub value: ElementValue,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Annotation {
    /// Field descriptor of the annotation interface.
    pub annotation_type: String,
    pub visibility: AnnotationVisibility,
    pub elements: Box<[NameValuePair]>,
}
impl Annotation {
    pub fn element(&self, name: &str) -> Option<&ElementValue> {
        self.elements
            .iter()
            .find(|pair| pair.name == name)
            .map(|pair| &pair.value)
    }
}

/// The annotations attached to one class, member or parameter. Each
/// annotation type appears at most once.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct Annotations(Box<[Annotation]>);
impl Annotations {
    pub(crate) fn new(annotations: Vec<Annotation>) -> Self {
        Self(annotations.into_boxed_slice())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.0.iter()
    }

    pub fn get(&self, annotation_type: &str) -> Option<&Annotation> {
        self.0.iter().find(|a| a.annotation_type == annotation_type)
    }
}
impl<'a> IntoIterator for &'a Annotations {
    type Item = &'a Annotation;
    type IntoIter = std::slice::Iter<'a, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for ElementValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementValue::Byte(v) => write!(f, "{}", v),
            ElementValue::Char(v) => match char::from_u32(*v as u32) {
                Some(c) => write!(f, "{:?}", c),
                None => write!(f, "'\\u{:04x}'", v),
            },
            ElementValue::Double(v) => write!(f, "{}", v),
            ElementValue::Float(v) => write!(f, "{}", v),
            ElementValue::Int(v) => write!(f, "{}", v),
            ElementValue::Long(v) => write!(f, "{}", v),
            ElementValue::Short(v) => write!(f, "{}", v),
            ElementValue::Boolean(v) => write!(f, "{}", v),
            ElementValue::String(s) => write!(f, "{:?}", s),
            ElementValue::Enum {
                type_name,
                const_name,
            } => write!(f, "{}.{}", type_name, const_name),
            ElementValue::Class(descriptor) => write!(f, "{}.class", descriptor),
            ElementValue::Annotation(annotation) => write!(f, "@{}", annotation.annotation_type),
            ElementValue::Array(values) => {
                write!(f, "{{")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "}}")
            }
        }
    }
}
