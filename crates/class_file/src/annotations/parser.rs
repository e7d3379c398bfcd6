use crate::{
    annotations::{Annotation, AnnotationVisibility, Annotations, ElementValue, NameValuePair},
    bytes::ByteArray,
    matches_cp_info,
    observer::ParseObserver,
    ClassFileError, ConstantPool, Result,
};

/// Deepest nesting of array and annotation element values accepted.
const MAX_NESTING_DEPTH: usize = 256;

/// Parses the annotation grammar shared by `AnnotationDefault` and the
/// `Runtime*Annotations` attributes.
///
/// The parser is confined to `[offset, offset + length)`: reading past the
/// end is [`ClassFileError::Truncated`], and stopping short of it is
/// [`ClassFileError::BadLength`].
pub struct AnnotationParser<'a, 'o> {
    bytes: ByteArray<'a>,
    pool: &'a ConstantPool,
    observer: Option<&'o mut dyn ParseObserver>,
    start: usize,
    offset: usize,
    end: usize,
    depth: usize,
}

impl<'a, 'o> AnnotationParser<'a, 'o> {
    pub fn new(
        bytes: ByteArray<'a>,
        pool: &'a ConstantPool,
        offset: usize,
        length: usize,
        observer: Option<&'o mut dyn ParseObserver>,
    ) -> Self {
        Self {
            bytes,
            pool,
            observer,
            start: offset,
            offset,
            end: offset.saturating_add(length),
            depth: 0,
        }
    }

    /// Parses the single element value of an `AnnotationDefault` attribute.
    pub fn parse_value_attribute(mut self) -> Result<ElementValue> {
        let value = self.parse_element_value()?;
        self.finish()?;

        Ok(value)
    }

    pub fn parse_annotation_attribute(
        mut self,
        visibility: AnnotationVisibility,
    ) -> Result<Annotations> {
        let annotations = self.parse_annotations(visibility)?;
        self.finish()?;

        Ok(annotations)
    }

    /// Parses one annotation set per method parameter.
    pub fn parse_parameter_attribute(
        mut self,
        visibility: AnnotationVisibility,
    ) -> Result<Box<[Annotations]>> {
        let offset = self.offset;
        let num_parameters = self.read_u1()?;
        self.parsed(offset, 1, || format!("num_parameters: {:02x}", num_parameters));

        let mut parameters = Vec::with_capacity(num_parameters as usize);
        for i in 0..num_parameters {
            self.parsed(self.offset, 0, || format!("parameter_annotations[{}]:", i));
            self.change_indent(1);
            parameters.push(self.parse_annotations(visibility)?);
            self.change_indent(-1);
        }
        self.finish()?;

        Ok(parameters.into_boxed_slice())
    }

    fn parse_annotations(&mut self, visibility: AnnotationVisibility) -> Result<Annotations> {
        let offset = self.offset;
        let count = self.read_u2()?;
        self.parsed(offset, 2, || format!("num_annotations: {:04x}", count));

        let mut annotations: Vec<Annotation> = Vec::with_capacity(count as usize);
        for i in 0..count {
            self.parsed(self.offset, 0, || format!("annotations[{}]:", i));
            self.change_indent(1);
            let annotation = self.parse_annotation(visibility)?;
            self.change_indent(-1);

            if annotations
                .iter()
                .any(|a| a.annotation_type == annotation.annotation_type)
            {
                return Err(ClassFileError::DuplicateAnnotation(
                    annotation.annotation_type,
                ));
            }
            annotations.push(annotation);
        }

        Ok(Annotations::new(annotations))
    }

    fn parse_annotation(&mut self, visibility: AnnotationVisibility) -> Result<Annotation> {
        let offset = self.offset;
        let type_index = self.read_u2()?;
        let annotation_type = self.pool.utf8(type_index)?.to_owned();
        self.parsed(offset, 2, || format!("type: {}", annotation_type));

        let offset = self.offset;
        let num_pairs = self.read_u2()?;
        self.parsed(offset, 2, || format!("num_elements: {:04x}", num_pairs));

        let mut elements = Vec::with_capacity(num_pairs as usize);
        for i in 0..num_pairs {
            let offset = self.offset;
            let name_index = self.read_u2()?;
            let name = self.pool.utf8(name_index)?.to_owned();
            self.parsed(offset, 2, || format!("elements[{}]: {}", i, name));

            self.change_indent(1);
            let value = self.parse_element_value()?;
            self.change_indent(-1);

            elements.push(NameValuePair { name, value });
        }

        Ok(Annotation {
            annotation_type,
            visibility,
            elements: elements.into_boxed_slice(),
        })
    }

    fn parse_element_value(&mut self) -> Result<ElementValue> {
        let offset = self.offset;
        let tag = self.read_u1()? as char;

        let value = match tag {
            'B' => ElementValue::Byte(self.read_int_constant()? as i8),
            'C' => ElementValue::Char(self.read_int_constant()? as u16),
            'I' => ElementValue::Int(self.read_int_constant()?),
            'S' => ElementValue::Short(self.read_int_constant()? as i16),
            'Z' => ElementValue::Boolean(self.read_int_constant()? != 0),
            'D' => {
                let index = self.read_u2()?;
                ElementValue::Double(*matches_cp_info!(self.pool, index, Double)?)
            }
            'F' => {
                let index = self.read_u2()?;
                ElementValue::Float(*matches_cp_info!(self.pool, index, Float)?)
            }
            'J' => {
                let index = self.read_u2()?;
                ElementValue::Long(*matches_cp_info!(self.pool, index, Long)?)
            }
            's' => ElementValue::String(self.read_utf8()?),
            'e' => ElementValue::Enum {
                type_name: self.read_utf8()?,
                const_name: self.read_utf8()?,
            },
            'c' => ElementValue::Class(self.read_utf8()?),
            '@' => {
                self.parsed(offset, 1, || "tag: '@'".to_owned());
                self.enter(offset)?;
                let annotation = self.parse_annotation(AnnotationVisibility::Embedded)?;
                self.leave();
                return Ok(ElementValue::Annotation(annotation));
            }
            '[' => {
                let num_values = self.read_u2()?;
                self.parsed(offset, 3, || format!("tag: '[' num_values: {:04x}", num_values));

                self.enter(offset)?;
                let values = (0..num_values)
                    .map(|_| self.parse_element_value())
                    .collect::<Result<Vec<_>>>()?;
                self.leave();
                return Ok(ElementValue::Array(values.into_boxed_slice()));
            }
            _ => return Err(ClassFileError::InvalidElementValueTag(tag)),
        };

        let len = self.offset - offset;
        self.parsed(offset, len, || format!("tag: {:?} value: {}", tag, value));

        Ok(value)
    }

    /// Descends into the nested value starting at `offset`.
    fn enter(&mut self, offset: usize) -> Result<()> {
        if self.depth == MAX_NESTING_DEPTH {
            return Err(ClassFileError::NestingTooDeep { offset });
        }

        self.depth += 1;
        self.change_indent(1);
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
        self.change_indent(-1);
    }

    fn read_int_constant(&mut self) -> Result<i32> {
        let index = self.read_u2()?;
        Ok(*matches_cp_info!(self.pool, index, Integer)?)
    }

    fn read_utf8(&mut self) -> Result<String> {
        let index = self.read_u2()?;
        Ok(self.pool.utf8(index)?.to_owned())
    }

    fn finish(&self) -> Result<()> {
        if self.offset != self.end {
            return Err(ClassFileError::bad_length(self.offset - self.start));
        }

        Ok(())
    }

    fn read_u1(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let value = self.bytes.u1(self.offset)?;
        self.offset += 1;
        Ok(value)
    }

    fn read_u2(&mut self) -> Result<u16> {
        self.ensure(2)?;
        let value = self.bytes.u2(self.offset)?;
        self.offset += 2;
        Ok(value)
    }

    fn ensure(&self, len: usize) -> Result<()> {
        if self.end - self.offset < len {
            return Err(ClassFileError::Truncated);
        }

        Ok(())
    }

    fn parsed(&mut self, offset: usize, len: usize, human: impl FnOnce() -> String) {
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.parsed(self.bytes.as_slice(), offset, len, &human());
        }
    }

    fn change_indent(&mut self, delta: i32) {
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.change_indent(delta);
        }
    }
}
