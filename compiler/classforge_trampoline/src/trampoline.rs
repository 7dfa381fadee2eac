//! The trampoline model: a tagged sum type over every cross-class linkage
//! action, a deterministic total order, and stable symbol mangling.
//!
//! Sits at the layer between a bytecode operation (invoke, field access,
//! allocation, native bridge) and what a backend can actually declare —
//! the answer to "what stub does this managed-bytecode operation need
//! linked in", never how that stub's body runs.

use std::sync::Arc;

use classforge_ir::descriptor::{parse_field_descriptor, parse_method_descriptor};
use classforge_ir::error::DescriptorError;
use classforge_ir::signature::{build_signature, env_ptr_type, object_ptr_type, MethodShape};
use classforge_ir::{IntWidth, IrType};

use crate::error::TrampolineError;

/// The kind of cross-class linkage action a trampoline represents. Order
/// matters: it is the primary key of the total order `Trampoline` is sorted
/// by, and it is derived from declaration order here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrampolineKind {
    InvokeVirtual,
    InvokeSpecial,
    InvokeStatic,
    InvokeInterface,
    GetField,
    PutField,
    GetStatic,
    PutStatic,
    LdcClass,
    Checkcast,
    Instanceof,
    New,
    NewArray,
    BridgeCall,
    NativeCall,
}

impl TrampolineKind {
    /// Whether this kind carries a member name/descriptor (a method or
    /// field being addressed), as opposed to purely a class reference.
    fn requires_member(self) -> bool {
        !matches!(
            self,
            TrampolineKind::LdcClass
                | TrampolineKind::Checkcast
                | TrampolineKind::Instanceof
                | TrampolineKind::New
        )
    }

    fn tag(self) -> &'static str {
        match self {
            TrampolineKind::InvokeVirtual => "invokevirtual",
            TrampolineKind::InvokeSpecial => "invokespecial",
            TrampolineKind::InvokeStatic => "invokestatic",
            TrampolineKind::InvokeInterface => "invokeinterface",
            TrampolineKind::GetField => "getfield",
            TrampolineKind::PutField => "putfield",
            TrampolineKind::GetStatic => "getstatic",
            TrampolineKind::PutStatic => "putstatic",
            TrampolineKind::LdcClass => "ldcclass",
            TrampolineKind::Checkcast => "checkcast",
            TrampolineKind::Instanceof => "instanceof",
            TrampolineKind::New => "new",
            TrampolineKind::NewArray => "newarray",
            TrampolineKind::BridgeCall => "bridgecall",
            TrampolineKind::NativeCall => "nativecall",
        }
    }
}

/// A single linkage stub: the calling class that needs it, the class it
/// targets, and — for member-addressing kinds — the member's name and
/// descriptor.
///
/// Field declaration order here IS the ordering key
/// `(kind, calling_class, target_class, member_name, member_descriptor)`:
/// `#[derive(Ord)]` compares fields in declaration order, and `Option`'s
/// derived `Ord` already sorts `None` before `Some`, which is exactly the
/// "nulls sort before non-nulls" rule this model requires — no custom
/// `Ord` impl needed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Trampoline {
    pub kind: TrampolineKind,
    pub calling_class: Arc<str>,
    pub target_class: Arc<str>,
    pub member_name: Option<Arc<str>>,
    pub member_descriptor: Option<Arc<str>>,
}

impl Trampoline {
    fn from_parts(
        kind: TrampolineKind,
        calling_class: impl Into<Arc<str>>,
        target_class: impl Into<Arc<str>>,
        member_name: Option<Arc<str>>,
        member_descriptor: Option<Arc<str>>,
    ) -> Result<Self, TrampolineError> {
        if kind.requires_member() && (member_name.is_none() || member_descriptor.is_none()) {
            return Err(TrampolineError::MissingMember(kind));
        }
        if !kind.requires_member() && (member_name.is_some() || member_descriptor.is_some()) {
            return Err(TrampolineError::UnexpectedMember(kind));
        }
        Ok(Trampoline {
            kind,
            calling_class: calling_class.into(),
            target_class: target_class.into(),
            member_name,
            member_descriptor,
        })
    }

    pub fn new_invoke_virtual(
        calling_class: impl Into<Arc<str>>,
        target_class: impl Into<Arc<str>>,
        method_name: impl Into<Arc<str>>,
        method_descriptor: impl Into<Arc<str>>,
    ) -> Self {
        Self::from_parts(
            TrampolineKind::InvokeVirtual,
            calling_class,
            target_class,
            Some(method_name.into()),
            Some(method_descriptor.into()),
        )
        .expect("invokevirtual always carries a member")
    }

    pub fn new_invoke_special(
        calling_class: impl Into<Arc<str>>,
        target_class: impl Into<Arc<str>>,
        method_name: impl Into<Arc<str>>,
        method_descriptor: impl Into<Arc<str>>,
    ) -> Self {
        Self::from_parts(
            TrampolineKind::InvokeSpecial,
            calling_class,
            target_class,
            Some(method_name.into()),
            Some(method_descriptor.into()),
        )
        .expect("invokespecial always carries a member")
    }

    pub fn new_invoke_static(
        calling_class: impl Into<Arc<str>>,
        target_class: impl Into<Arc<str>>,
        method_name: impl Into<Arc<str>>,
        method_descriptor: impl Into<Arc<str>>,
    ) -> Self {
        Self::from_parts(
            TrampolineKind::InvokeStatic,
            calling_class,
            target_class,
            Some(method_name.into()),
            Some(method_descriptor.into()),
        )
        .expect("invokestatic always carries a member")
    }

    pub fn new_invoke_interface(
        calling_class: impl Into<Arc<str>>,
        target_class: impl Into<Arc<str>>,
        method_name: impl Into<Arc<str>>,
        method_descriptor: impl Into<Arc<str>>,
    ) -> Self {
        Self::from_parts(
            TrampolineKind::InvokeInterface,
            calling_class,
            target_class,
            Some(method_name.into()),
            Some(method_descriptor.into()),
        )
        .expect("invokeinterface always carries a member")
    }

    pub fn new_get_field(
        calling_class: impl Into<Arc<str>>,
        target_class: impl Into<Arc<str>>,
        field_name: impl Into<Arc<str>>,
        field_descriptor: impl Into<Arc<str>>,
    ) -> Self {
        Self::from_parts(
            TrampolineKind::GetField,
            calling_class,
            target_class,
            Some(field_name.into()),
            Some(field_descriptor.into()),
        )
        .expect("getfield always carries a member")
    }

    pub fn new_put_field(
        calling_class: impl Into<Arc<str>>,
        target_class: impl Into<Arc<str>>,
        field_name: impl Into<Arc<str>>,
        field_descriptor: impl Into<Arc<str>>,
    ) -> Self {
        Self::from_parts(
            TrampolineKind::PutField,
            calling_class,
            target_class,
            Some(field_name.into()),
            Some(field_descriptor.into()),
        )
        .expect("putfield always carries a member")
    }

    pub fn new_get_static(
        calling_class: impl Into<Arc<str>>,
        target_class: impl Into<Arc<str>>,
        field_name: impl Into<Arc<str>>,
        field_descriptor: impl Into<Arc<str>>,
    ) -> Self {
        Self::from_parts(
            TrampolineKind::GetStatic,
            calling_class,
            target_class,
            Some(field_name.into()),
            Some(field_descriptor.into()),
        )
        .expect("getstatic always carries a member")
    }

    pub fn new_put_static(
        calling_class: impl Into<Arc<str>>,
        target_class: impl Into<Arc<str>>,
        field_name: impl Into<Arc<str>>,
        field_descriptor: impl Into<Arc<str>>,
    ) -> Self {
        Self::from_parts(
            TrampolineKind::PutStatic,
            calling_class,
            target_class,
            Some(field_name.into()),
            Some(field_descriptor.into()),
        )
        .expect("putstatic always carries a member")
    }

    pub fn new_ldc_class(calling_class: impl Into<Arc<str>>, target_class: impl Into<Arc<str>>) -> Self {
        Self::from_parts(TrampolineKind::LdcClass, calling_class, target_class, None, None)
            .expect("ldcclass never carries a member")
    }

    pub fn new_checkcast(calling_class: impl Into<Arc<str>>, target_class: impl Into<Arc<str>>) -> Self {
        Self::from_parts(TrampolineKind::Checkcast, calling_class, target_class, None, None)
            .expect("checkcast never carries a member")
    }

    pub fn new_instanceof(calling_class: impl Into<Arc<str>>, target_class: impl Into<Arc<str>>) -> Self {
        Self::from_parts(TrampolineKind::Instanceof, calling_class, target_class, None, None)
            .expect("instanceof never carries a member")
    }

    pub fn new_new(calling_class: impl Into<Arc<str>>, target_class: impl Into<Arc<str>>) -> Self {
        Self::from_parts(TrampolineKind::New, calling_class, target_class, None, None)
            .expect("new never carries a member")
    }

    pub fn new_new_array(
        calling_class: impl Into<Arc<str>>,
        target_class: impl Into<Arc<str>>,
        element_descriptor: impl Into<Arc<str>>,
    ) -> Self {
        Self::from_parts(
            TrampolineKind::NewArray,
            calling_class,
            target_class,
            Some(element_descriptor.into()),
            Some(Arc::from("")),
        )
        .expect("newarray always carries a member")
    }

    pub fn new_bridge_call(
        calling_class: impl Into<Arc<str>>,
        target_class: impl Into<Arc<str>>,
        bridge_name: impl Into<Arc<str>>,
        bridge_descriptor: impl Into<Arc<str>>,
    ) -> Self {
        Self::from_parts(
            TrampolineKind::BridgeCall,
            calling_class,
            target_class,
            Some(bridge_name.into()),
            Some(bridge_descriptor.into()),
        )
        .expect("bridgecall always carries a member")
    }

    pub fn new_native_call(
        calling_class: impl Into<Arc<str>>,
        target_class: impl Into<Arc<str>>,
        native_name: impl Into<Arc<str>>,
        native_descriptor: impl Into<Arc<str>>,
    ) -> Self {
        Self::from_parts(
            TrampolineKind::NativeCall,
            calling_class,
            target_class,
            Some(native_name.into()),
            Some(native_descriptor.into()),
        )
        .expect("nativecall always carries a member")
    }

    /// A stable, injective, valid-linker-symbol encoding of this
    /// trampoline. Every component is escaped (`$` doubled to `$$`) before
    /// being joined with a single unescaped `$`, so the boundary between
    /// components can never be confused with a literal `$` inside one.
    pub fn mangled_symbol(&self) -> String {
        let mut out = String::from("__classforge_trampoline$");
        out.push_str(&escape(self.kind.tag()));
        out.push('$');
        out.push_str(&escape(&self.calling_class));
        out.push('$');
        out.push_str(&escape(&self.target_class));
        out.push('$');
        out.push_str(&self.member_name.as_deref().map(escape).unwrap_or_default());
        out.push('$');
        out.push_str(
            &self
                .member_descriptor
                .as_deref()
                .map(escape)
                .unwrap_or_default(),
        );
        out
    }

    /// The IR function type the emitted stub must have. `BridgeCall` and
    /// `NativeCall` always get the native signature — a receiver/class-handle
    /// parameter is passed even when the callee is static, because the
    /// native calling convention needs the handle to resolve static state.
    /// Every other member-addressing kind projects its own managed
    /// signature (method or field-access); the remaining class-reference
    /// kinds have a fixed signature independent of any descriptor.
    pub fn function_type(&self) -> Result<IrType, DescriptorError> {
        match self.kind {
            TrampolineKind::InvokeVirtual | TrampolineKind::InvokeSpecial | TrampolineKind::InvokeInterface => {
                let descriptor = parse_method_descriptor(self.member_descriptor_or_empty())?;
                Ok(build_signature(
                    &descriptor,
                    MethodShape { is_static: false, is_native: false },
                ))
            }
            TrampolineKind::InvokeStatic => {
                let descriptor = parse_method_descriptor(self.member_descriptor_or_empty())?;
                Ok(build_signature(
                    &descriptor,
                    MethodShape { is_static: true, is_native: false },
                ))
            }
            TrampolineKind::BridgeCall | TrampolineKind::NativeCall => {
                let descriptor = parse_method_descriptor(self.member_descriptor_or_empty())?;
                Ok(build_signature(
                    &descriptor,
                    // `is_static: false` forces the receiver-shaped hidden
                    // parameter unconditionally, which is exactly the
                    // "receiver even for static" native convention.
                    MethodShape { is_static: false, is_native: true },
                ))
            }
            TrampolineKind::GetField => {
                let field = parse_field_descriptor(self.member_descriptor_or_empty())?;
                Ok(IrType::Function {
                    ret: Box::new(field.local_ir_type()),
                    params: vec![env_ptr_type(), object_ptr_type()],
                    varargs: false,
                })
            }
            TrampolineKind::PutField => {
                let field = parse_field_descriptor(self.member_descriptor_or_empty())?;
                Ok(IrType::Function {
                    ret: Box::new(IrType::Void),
                    params: vec![env_ptr_type(), object_ptr_type(), field.local_ir_type()],
                    varargs: false,
                })
            }
            TrampolineKind::GetStatic => {
                let field = parse_field_descriptor(self.member_descriptor_or_empty())?;
                Ok(IrType::Function {
                    ret: Box::new(field.local_ir_type()),
                    params: vec![env_ptr_type()],
                    varargs: false,
                })
            }
            TrampolineKind::PutStatic => {
                let field = parse_field_descriptor(self.member_descriptor_or_empty())?;
                Ok(IrType::Function {
                    ret: Box::new(IrType::Void),
                    params: vec![env_ptr_type(), field.local_ir_type()],
                    varargs: false,
                })
            }
            TrampolineKind::LdcClass => Ok(IrType::Function {
                ret: Box::new(object_ptr_type()),
                params: vec![env_ptr_type()],
                varargs: false,
            }),
            TrampolineKind::Checkcast => Ok(IrType::Function {
                ret: Box::new(object_ptr_type()),
                params: vec![env_ptr_type(), object_ptr_type()],
                varargs: false,
            }),
            TrampolineKind::Instanceof => Ok(IrType::Function {
                ret: Box::new(IrType::Integer(IntWidth::W32)),
                params: vec![env_ptr_type(), object_ptr_type()],
                varargs: false,
            }),
            TrampolineKind::New => Ok(IrType::Function {
                ret: Box::new(object_ptr_type()),
                params: vec![env_ptr_type()],
                varargs: false,
            }),
            TrampolineKind::NewArray => Ok(IrType::Function {
                ret: Box::new(object_ptr_type()),
                params: vec![env_ptr_type(), IrType::Integer(IntWidth::W32)],
                varargs: false,
            }),
        }
    }

    fn member_descriptor_or_empty(&self) -> &str {
        self.member_descriptor.as_deref().unwrap_or("")
    }
}

fn escape(s: &str) -> String {
    s.replace('$', "$$")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_follows_kind_then_classes_then_member() {
        let a = Trampoline::new_get_field("A", "B", "x", "I");
        let b = Trampoline::new_get_field("A", "B", "y", "I");
        let c = Trampoline::new_put_field("A", "B", "x", "I");
        assert!(a < b);
        assert!(a < c); // GetField < PutField by declaration order
    }

    #[test]
    fn nulls_sort_before_non_null_members() {
        let no_member = Trampoline::new_new("A", "B");
        let with_member = Trampoline::new_get_field("A", "B", "x", "I");
        // New < GetField by kind rank already, so force same kind comparison
        // by comparing member fields directly.
        assert!(no_member.member_name < with_member.member_name);
    }

    #[test]
    fn mangled_symbol_escapes_reserved_separator() {
        let t = Trampoline::new_get_field("pkg/A$Inner", "pkg/B", "x", "I");
        let mangled = t.mangled_symbol();
        assert!(mangled.contains("pkg/A$$Inner"));
    }

    #[test]
    fn mangling_is_injective_for_distinct_trampolines() {
        let a = Trampoline::new_get_field("A", "B", "x", "I");
        let b = Trampoline::new_get_field("A", "B", "xI", "");
        assert_ne!(a.mangled_symbol(), b.mangled_symbol());
    }

    #[test]
    fn get_field_projects_field_signature_not_method_signature() {
        let t = Trampoline::new_get_field("A", "B", "x", "I");
        match t.function_type().unwrap() {
            IrType::Function { params, ret, .. } => {
                assert_eq!(params.len(), 2); // env, receiver
                assert_eq!(ret, Box::new(IrType::Integer(IntWidth::W32)));
            }
            _ => panic!("expected function type"),
        }
    }

    #[test]
    fn invoke_virtual_projects_managed_signature() {
        let t = Trampoline::new_invoke_virtual("A", "B", "getX", "()I");
        match t.function_type().unwrap() {
            IrType::Function { params, .. } => assert_eq!(params.len(), 2), // env, receiver
            _ => panic!("expected function type"),
        }
    }

    #[test]
    fn bridge_call_and_native_call_carry_receiver_even_when_static() {
        let bridge = Trampoline::new_bridge_call("A", "B", "init", "()V");
        let native = Trampoline::new_native_call("A", "B", "hashCode0", "()I");
        for t in [bridge, native] {
            match t.function_type().unwrap() {
                IrType::Function { params, .. } => {
                    assert_eq!(params.len(), 2); // env + class-handle/receiver, no visible args
                    assert_eq!(params[1], object_ptr_type());
                }
                _ => panic!("expected function type"),
            }
        }
    }

    #[test]
    fn new_and_checkcast_have_fixed_class_reference_signatures() {
        let new_t = Trampoline::new_new("A", "B");
        match new_t.function_type().unwrap() {
            IrType::Function { params, ret, .. } => {
                assert_eq!(params.len(), 1); // env only
                assert_eq!(*ret, object_ptr_type());
            }
            _ => panic!("expected function type"),
        }

        let checkcast = Trampoline::new_checkcast("A", "B");
        match checkcast.function_type().unwrap() {
            IrType::Function { params, .. } => assert_eq!(params.len(), 2), // env, object
            _ => panic!("expected function type"),
        }
    }

    #[test]
    fn construction_rejects_misuse() {
        let err = Trampoline::from_parts(TrampolineKind::New, "A", "B", Some(Arc::from("x")), Some(Arc::from("I")));
        assert!(matches!(err, Err(TrampolineError::UnexpectedMember(_))));

        let err = Trampoline::from_parts(TrampolineKind::GetField, "A", "B", None, None);
        assert!(matches!(err, Err(TrampolineError::MissingMember(_))));
    }
}
