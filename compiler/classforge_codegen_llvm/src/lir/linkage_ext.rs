//! Conversions from this workspace's linkage vocabulary
//! (`classforge_ir::linkage`) to inkwell's equivalents.
//!
//! Kept as a separate trait-per-conversion module because of the orphan
//! rule: neither `classforge_ir::linkage::Linkage` nor
//! `inkwell::module::Linkage` is defined in this crate.

use classforge_ir::linkage::{CallConv, Linkage, UnnamedAddress, Visibility};
use inkwell::{module::Linkage as LlvmLinkage, values::UnnamedAddress as LlvmUnnamedAddress, GlobalVisibility};

pub trait LinkageUtils {
    fn into_llvm_linkage(self) -> LlvmLinkage;
}

pub trait VisibilityUtils {
    fn into_llvm_visibility(self) -> GlobalVisibility;
}

pub trait CallConvUtils {
    fn into_llvm_call_conv(self) -> u32;
}

pub trait UnnamedAddressUtils {
    fn into_llvm_unnamed_address(self) -> LlvmUnnamedAddress;
}

impl LinkageUtils for Linkage {
    fn into_llvm_linkage(self) -> LlvmLinkage {
        match self {
            Linkage::Private => LlvmLinkage::Private,
            Linkage::Internal => LlvmLinkage::Internal,
            Linkage::AvailableExternally => LlvmLinkage::AvailableExternally,
            Linkage::LinkOnce => LlvmLinkage::LinkOnceAny,
            Linkage::Weak => LlvmLinkage::WeakAny,
            Linkage::Common => LlvmLinkage::Common,
            Linkage::Appending => LlvmLinkage::Appending,
            Linkage::ExternWeak => LlvmLinkage::ExternalWeak,
            Linkage::LinkOnceODR => LlvmLinkage::LinkOnceODR,
            Linkage::WeakODR => LlvmLinkage::WeakODR,
            Linkage::External => LlvmLinkage::External,
        }
    }
}

impl VisibilityUtils for Visibility {
    fn into_llvm_visibility(self) -> GlobalVisibility {
        match self {
            Visibility::Default => GlobalVisibility::Default,
            Visibility::Hidden => GlobalVisibility::Hidden,
            Visibility::Protected => GlobalVisibility::Protected,
        }
    }
}

impl CallConvUtils for CallConv {
    fn into_llvm_call_conv(self) -> u32 {
        self as u32
    }
}

impl UnnamedAddressUtils for UnnamedAddress {
    fn into_llvm_unnamed_address(self) -> LlvmUnnamedAddress {
        match self {
            UnnamedAddress::None => LlvmUnnamedAddress::None,
            UnnamedAddress::Local => LlvmUnnamedAddress::Local,
            UnnamedAddress::Global => LlvmUnnamedAddress::Global,
        }
    }
}
