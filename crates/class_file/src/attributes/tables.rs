//! Tables nested inside attributes. Each parser starts just past the table's
//! `u2` count, which the caller has already read.

use crate::{
    attributes::{
        AttributeParser, BootstrapMethod, ExceptionTableEntry, InnerClass, LineNumber,
        LocalVariable,
    },
    ClassFileError, InnerClassAccessFlags, Result,
};

/// What the fourth column of a local variable row holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum LocalVariableFlavor {
    /// `LocalVariableTable`: an erased field descriptor.
    Descriptor,
    /// `LocalVariableTypeTable`: a generic signature.
    Signature,
}
impl LocalVariableFlavor {
    pub(super) fn table_prefix(self) -> &'static str {
        match self {
            LocalVariableFlavor::Descriptor => "local_variable",
            LocalVariableFlavor::Signature => "local_variable_type",
        }
    }
}

impl AttributeParser<'_, '_> {
    /// Parses `u2 exception_table_length` and the table that follows. `length`
    /// is what remains of the `Code` attribute. Returns the entries and the
    /// number of bytes they took.
    pub(super) fn parse_exception_table(
        &mut self,
        offset: usize,
        length: usize,
    ) -> Result<(Box<[ExceptionTableEntry]>, usize)> {
        let count = self.bytes.u2(offset)? as usize;
        self.parsed(offset, 2, || format!("exception_table_length: {:04x}", count));

        let offset = offset + 2;
        let length = length - 2;
        // The nested attributes_count still has to fit after the table.
        if length < count * 8 + 2 {
            return Err(ClassFileError::Truncated);
        }

        let pool = self.pool;
        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let row = offset + i * 8;
            let start_pc = self.bytes.u2(row)?;
            let end_pc = self.bytes.u2(row + 2)?;
            let handler_pc = self.bytes.u2(row + 4)?;
            let catch_type = pool.class_name_0_ok(self.bytes.u2(row + 6)?)?;

            self.change_indent(1);
            self.parsed(row, 8, || {
                format!(
                    "{:04x}..{:04x} -> {:04x} {}",
                    start_pc,
                    end_pc,
                    handler_pc,
                    catch_type.unwrap_or("<any>")
                )
            });
            self.change_indent(-1);

            entries.push(ExceptionTableEntry {
                start_pc,
                end_pc,
                handler_pc,
                catch_type: catch_type.map(str::to_owned),
            });
        }

        Ok((entries.into_boxed_slice(), 2 + count * 8))
    }

    pub(super) fn parse_bootstrap_methods(
        &mut self,
        count: u16,
        offset: usize,
        length: usize,
    ) -> Result<Box<[BootstrapMethod]>> {
        let pool = self.pool;
        let table_length = length;
        let mut offset = offset;
        let mut length = length;

        let mut methods = Vec::with_capacity(count as usize);
        for _ in 0..count {
            if length < 4 {
                return Err(ClassFileError::Truncated);
            }

            let method_ref = self.bytes.u2(offset)?;
            let num_arguments = self.bytes.u2(offset + 2)? as usize;
            self.parsed(offset, 2, || format!("bootstrap_method_ref: {:04x}", method_ref));
            self.parsed(offset + 2, 2, || {
                format!("num_bootstrap_arguments: {:04x}", num_arguments)
            });

            offset += 4;
            length -= 4;
            if length < num_arguments * 2 {
                return Err(ClassFileError::Truncated);
            }

            let method_handle = pool.method_handle(method_ref)?;
            let mut arguments = Vec::with_capacity(num_arguments);
            for i in 0..num_arguments {
                let argument_ref = self.bytes.u2(offset)?;
                self.parsed(offset, 2, || {
                    format!("bootstrap_arguments[{}]: {:04x}", i, argument_ref)
                });
                arguments.push(pool.loadable(argument_ref)?);

                offset += 2;
                length -= 2;
            }

            methods.push(BootstrapMethod {
                method_handle,
                arguments: arguments.into_boxed_slice(),
            });
        }

        if length != 0 {
            // "+ 2" is for num_bootstrap_methods.
            return Err(ClassFileError::bad_length(table_length - length + 2));
        }

        Ok(methods.into_boxed_slice())
    }

    pub(super) fn parse_inner_classes(
        &mut self,
        count: u16,
        offset: usize,
        length: usize,
    ) -> Result<Box<[InnerClass]>> {
        let count = count as usize;
        if length != count * 8 {
            return Err(ClassFileError::bad_length(count * 8 + 2));
        }

        let pool = self.pool;
        let mut classes = Vec::with_capacity(count);
        for i in 0..count {
            let row = offset + i * 8;
            let inner_class = pool.class_name(self.bytes.u2(row)?)?;
            let outer_class = pool.class_name_0_ok(self.bytes.u2(row + 2)?)?;
            let inner_name = pool.utf8_0_ok(self.bytes.u2(row + 4)?)?;
            let access_flags = InnerClassAccessFlags::from_bits_truncate(self.bytes.u2(row + 6)?);

            self.parsed(row, 2, || format!("inner_class: {}", inner_class));
            self.parsed(row + 2, 2, || {
                format!("  outer_class: {}", outer_class.unwrap_or("none"))
            });
            self.parsed(row + 4, 2, || format!("  name: {}", inner_name.unwrap_or("none")));
            self.parsed(row + 6, 2, || format!("  access_flags: {:?}", access_flags));

            classes.push(InnerClass {
                inner_class: inner_class.to_owned(),
                outer_class: outer_class.map(str::to_owned),
                inner_name: inner_name.map(str::to_owned),
                access_flags,
            });
        }

        Ok(classes.into_boxed_slice())
    }

    pub(super) fn parse_line_numbers(
        &mut self,
        count: u16,
        offset: usize,
        length: usize,
    ) -> Result<Box<[LineNumber]>> {
        let count = count as usize;
        if length != count * 4 {
            return Err(ClassFileError::bad_length(count * 4 + 2));
        }

        let mut lines = Vec::with_capacity(count);
        for i in 0..count {
            let row = offset + i * 4;
            let start_pc = self.bytes.u2(row)?;
            let line_number = self.bytes.u2(row + 2)?;
            self.parsed(row, 4, || format!("{:04x} {}", start_pc, line_number));

            lines.push(LineNumber {
                start_pc,
                line_number,
            });
        }

        Ok(lines.into_boxed_slice())
    }

    /// Rows shared by `LocalVariableTable` and `LocalVariableTypeTable`.
    pub(super) fn parse_local_variables(
        &mut self,
        count: u16,
        offset: usize,
        length: usize,
        flavor: LocalVariableFlavor,
    ) -> Result<Box<[LocalVariable]>> {
        let count = count as usize;
        if length != count * 10 {
            return Err(ClassFileError::bad_length(count * 10 + 2));
        }

        let pool = self.pool;
        let mut locals = Vec::with_capacity(count);
        for i in 0..count {
            let row = offset + i * 10;
            let start_pc = self.bytes.u2(row)?;
            let range_length = self.bytes.u2(row + 2)?;
            let name = pool.utf8(self.bytes.u2(row + 4)?)?;
            let type_ = pool.utf8(self.bytes.u2(row + 6)?)?;
            let index = self.bytes.u2(row + 8)?;

            self.parsed(row, 10, || {
                format!(
                    "{:04x}..{:04x} {:04x} {} {}",
                    start_pc,
                    start_pc as u32 + range_length as u32,
                    index,
                    name,
                    type_
                )
            });

            let (descriptor, signature) = match flavor {
                LocalVariableFlavor::Descriptor => (Some(type_.to_owned()), None),
                LocalVariableFlavor::Signature => (None, Some(type_.to_owned())),
            };
            locals.push(LocalVariable {
                start_pc,
                length: range_length,
                name: name.to_owned(),
                descriptor,
                signature,
                index,
            });
        }

        Ok(locals.into_boxed_slice())
    }
}
