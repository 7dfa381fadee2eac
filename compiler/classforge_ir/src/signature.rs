//! Method signature construction: the mapping from a managed method
//! descriptor and its static/native flags to a fully hidden-parameter-
//! expanded [`IrType::Function`].

use crate::descriptor::MethodDescriptor;
use crate::ir_type::IrType;

/// Describes how a method's visible parameters need hidden parameters
/// prepended, per the four-case algorithm:
///
/// - `EnvPtr` is prepended unconditionally.
/// - An instance method (static == false) additionally gets a receiver
///   `ObjectPtr` right after `EnvPtr`.
/// - A static *native* method gets a class-handle `ObjectPtr` right after
///   `EnvPtr` instead (native code still needs a handle to address static
///   state, even with no receiver).
/// - A static, non-native method gets no second hidden parameter.
#[derive(Debug, Clone, Copy)]
pub struct MethodShape {
    pub is_static: bool,
    pub is_native: bool,
}

/// Pointer to the per-thread execution-environment record; always the
/// first parameter of every compiled method and every trampoline stub.
pub fn env_ptr_type() -> IrType {
    IrType::ptr(IrType::opaque("ExecEnv"))
}

/// Pointer to a managed object; used both as the instance-method receiver
/// and as the generic handle produced/consumed by class-reference and
/// field-access trampolines.
pub fn object_ptr_type() -> IrType {
    IrType::ptr(IrType::opaque("Object"))
}

/// Builds the low-level function type for a method, prepending the hidden
/// parameters `MethodShape` calls for ahead of the descriptor's own
/// (locally-widened) parameter types.
pub fn build_signature(descriptor: &MethodDescriptor, shape: MethodShape) -> IrType {
    let mut params = Vec::with_capacity(descriptor.params.len() + 2);
    params.push(env_ptr_type());

    if !shape.is_static {
        params.push(object_ptr_type());
    } else if shape.is_native {
        params.push(object_ptr_type());
    }

    for param in &descriptor.params {
        params.push(param.local_ir_type());
    }

    let ret = descriptor
        .ret
        .as_ref()
        .map(|d| d.local_ir_type())
        .unwrap_or(IrType::Void);

    IrType::Function {
        ret: Box::new(ret),
        params,
        varargs: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::parse_method_descriptor;

    #[test]
    fn instance_method_gets_env_and_receiver() {
        let desc = parse_method_descriptor("(I)V").unwrap();
        let sig = build_signature(
            &desc,
            MethodShape {
                is_static: false,
                is_native: false,
            },
        );
        match sig {
            IrType::Function { params, .. } => {
                assert_eq!(params.len(), 3); // env, receiver, int
                assert_eq!(params[0], env_ptr_type());
                assert_eq!(params[1], object_ptr_type());
            }
            _ => panic!("expected function type"),
        }
    }

    #[test]
    fn static_non_native_method_gets_only_env() {
        let desc = parse_method_descriptor("(I)V").unwrap();
        let sig = build_signature(
            &desc,
            MethodShape {
                is_static: true,
                is_native: false,
            },
        );
        match sig {
            IrType::Function { params, .. } => assert_eq!(params.len(), 2),
            _ => panic!("expected function type"),
        }
    }

    #[test]
    fn static_native_method_gets_env_and_class_handle() {
        let desc = parse_method_descriptor("()V").unwrap();
        let sig = build_signature(
            &desc,
            MethodShape {
                is_static: true,
                is_native: true,
            },
        );
        match sig {
            IrType::Function { params, .. } => {
                assert_eq!(params.len(), 2);
                assert_eq!(params[1], object_ptr_type());
            }
            _ => panic!("expected function type"),
        }
    }

    #[test]
    fn void_return_lowers_to_ir_void() {
        let desc = parse_method_descriptor("()V").unwrap();
        let sig = build_signature(
            &desc,
            MethodShape {
                is_static: true,
                is_native: false,
            },
        );
        match sig {
            IrType::Function { ret, .. } => assert_eq!(*ret, IrType::Void),
            _ => panic!("expected function type"),
        }
    }
}
