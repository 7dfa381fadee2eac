//! Parsing and IR-lowering of class-file-style type descriptors
//! (`Z|B|S|C|I|J|F|D|V`, `L<name>;`, `[<desc>`, `(<params>)<ret>`).

use std::sync::Arc;

use crate::error::DescriptorError;
use crate::ir_type::{IntWidth, IrType};

/// A fully-qualified internal class name, e.g. `java/lang/String`.
pub type InternalName = Arc<str>;

/// A field (or array-element, or parameter) type descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldDescriptor {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
    Reference(InternalName),
    Array(Box<FieldDescriptor>),
}

impl FieldDescriptor {
    /// `Char` is the one primitive that is unsigned; everything else
    /// (including the smaller integer types) is signed. Front-end
    /// instruction selection uses this to decide between zero- and
    /// sign-extension when widening to a local.
    pub fn is_unsigned(&self) -> bool {
        matches!(self, FieldDescriptor::Char)
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(self, FieldDescriptor::Reference(_) | FieldDescriptor::Array(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, FieldDescriptor::Reference(_) | FieldDescriptor::Array(_))
    }

    /// The narrow, as-stored IR type: no widening.
    pub fn storage_ir_type(&self) -> IrType {
        match self {
            FieldDescriptor::Boolean | FieldDescriptor::Byte => IrType::Integer(IntWidth::W8),
            FieldDescriptor::Short | FieldDescriptor::Char => IrType::Integer(IntWidth::W16),
            FieldDescriptor::Int => IrType::Integer(IntWidth::W32),
            FieldDescriptor::Long => IrType::Integer(IntWidth::W64),
            FieldDescriptor::Float => IrType::Float,
            FieldDescriptor::Double => IrType::Double,
            FieldDescriptor::Reference(name) => IrType::ptr(IrType::opaque(name.clone())),
            FieldDescriptor::Array(elem) => IrType::ptr(elem.storage_ir_type()),
        }
    }

    /// The IR type used for a local variable / stack slot: every sub-word
    /// integer (`boolean`, `byte`, `short`, `char`) is widened to 32 bits,
    /// matching how the class-file bytecode's local-variable and operand
    /// stack slots are word-sized.
    pub fn local_ir_type(&self) -> IrType {
        match self {
            FieldDescriptor::Boolean
            | FieldDescriptor::Byte
            | FieldDescriptor::Short
            | FieldDescriptor::Char
            | FieldDescriptor::Int => IrType::Integer(IntWidth::W32),
            FieldDescriptor::Long => IrType::Integer(IntWidth::W64),
            FieldDescriptor::Float => IrType::Float,
            FieldDescriptor::Double => IrType::Double,
            FieldDescriptor::Reference(_) | FieldDescriptor::Array(_) => self.storage_ir_type(),
        }
    }
}

/// A method descriptor: `(param1 param2 ...)return`, where `return` is
/// `None` for `void`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub params: Vec<FieldDescriptor>,
    pub ret: Option<FieldDescriptor>,
}

/// Parses a single field descriptor starting at `input`'s first character,
/// returning the parsed descriptor and the unconsumed remainder.
fn parse_one(input: &str) -> Result<(FieldDescriptor, &str), DescriptorError> {
    let mut chars = input.chars();
    let tag = chars
        .next()
        .ok_or_else(|| DescriptorError::Truncated(input.to_string()))?;
    let rest = chars.as_str();

    match tag {
        'Z' => Ok((FieldDescriptor::Boolean, rest)),
        'B' => Ok((FieldDescriptor::Byte, rest)),
        'S' => Ok((FieldDescriptor::Short, rest)),
        'C' => Ok((FieldDescriptor::Char, rest)),
        'I' => Ok((FieldDescriptor::Int, rest)),
        'J' => Ok((FieldDescriptor::Long, rest)),
        'F' => Ok((FieldDescriptor::Float, rest)),
        'D' => Ok((FieldDescriptor::Double, rest)),
        'L' => {
            let end = rest
                .find(';')
                .ok_or_else(|| DescriptorError::UnterminatedReference(input.to_string()))?;
            let name = &rest[..end];
            if name.is_empty() {
                return Err(DescriptorError::EmptyReferenceName(input.to_string()));
            }
            Ok((
                FieldDescriptor::Reference(Arc::from(name)),
                &rest[end + 1..],
            ))
        }
        '[' => {
            let (elem, rest) = parse_one(rest)?;
            Ok((FieldDescriptor::Array(Box::new(elem)), rest))
        }
        other => Err(DescriptorError::UnknownTag(other, input.to_string())),
    }
}

/// Parses a complete field descriptor, requiring the whole string to be
/// consumed.
pub fn parse_field_descriptor(input: &str) -> Result<FieldDescriptor, DescriptorError> {
    let (desc, rest) = parse_one(input)?;
    if !rest.is_empty() {
        return Err(DescriptorError::TrailingData(input.to_string()));
    }
    Ok(desc)
}

/// Parses a complete method descriptor `(params)ret`.
pub fn parse_method_descriptor(input: &str) -> Result<MethodDescriptor, DescriptorError> {
    let body = input
        .strip_prefix('(')
        .ok_or_else(|| DescriptorError::MissingOpenParen(input.to_string()))?;
    let close = body
        .find(')')
        .ok_or_else(|| DescriptorError::MissingCloseParen(input.to_string()))?;
    let (mut params_str, ret_str) = (&body[..close], &body[close + 1..]);

    let mut params = Vec::new();
    while !params_str.is_empty() {
        let (desc, rest) = parse_one(params_str)?;
        params.push(desc);
        params_str = rest;
    }

    let ret = if ret_str == "V" {
        None
    } else {
        Some(parse_field_descriptor(ret_str)?)
    };

    Ok(MethodDescriptor { params, ret })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_primitives() {
        assert_eq!(parse_field_descriptor("I").unwrap(), FieldDescriptor::Int);
        assert_eq!(parse_field_descriptor("J").unwrap(), FieldDescriptor::Long);
        assert_eq!(
            parse_field_descriptor("Z").unwrap(),
            FieldDescriptor::Boolean
        );
    }

    #[test]
    fn parses_reference_preserving_name() {
        let desc = parse_field_descriptor("Ljava/lang/String;").unwrap();
        assert_eq!(
            desc,
            FieldDescriptor::Reference(Arc::from("java/lang/String"))
        );
    }

    #[test]
    fn parses_nested_array() {
        let desc = parse_field_descriptor("[[I").unwrap();
        assert_eq!(
            desc,
            FieldDescriptor::Array(Box::new(FieldDescriptor::Array(Box::new(
                FieldDescriptor::Int
            ))))
        );
    }

    #[test]
    fn parses_method_descriptor_with_void_return() {
        let desc = parse_method_descriptor("(ILjava/lang/String;)V").unwrap();
        assert_eq!(desc.params.len(), 2);
        assert_eq!(desc.ret, None);
    }

    #[test]
    fn parses_method_descriptor_with_no_params() {
        let desc = parse_method_descriptor("()I").unwrap();
        assert!(desc.params.is_empty());
        assert_eq!(desc.ret, Some(FieldDescriptor::Int));
    }

    #[test]
    fn rejects_malformed_descriptors() {
        assert!(parse_field_descriptor("Q").is_err());
        assert!(parse_field_descriptor("Ljava/lang/String").is_err());
        assert!(parse_field_descriptor("II").is_err());
        assert!(parse_method_descriptor("I)V").is_err());
        assert!(parse_method_descriptor("(I").is_err());
    }

    #[test]
    fn char_is_the_only_unsigned_primitive() {
        assert!(FieldDescriptor::Char.is_unsigned());
        assert!(!FieldDescriptor::Byte.is_unsigned());
        assert!(!FieldDescriptor::Short.is_unsigned());
        assert!(!FieldDescriptor::Int.is_unsigned());
    }

    #[test]
    fn sub_word_locals_widen_to_32_bits() {
        use crate::ir_type::{IntWidth, IrType};
        assert_eq!(FieldDescriptor::Byte.local_ir_type(), IrType::Integer(IntWidth::W32));
        assert_eq!(FieldDescriptor::Boolean.local_ir_type(), IrType::Integer(IntWidth::W32));
        assert_eq!(FieldDescriptor::Long.local_ir_type(), IrType::Integer(IntWidth::W64));
    }
}
