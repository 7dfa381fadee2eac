//! Linkage, visibility, and calling-convention vocabulary shared between a
//! defined IR body and a trampoline's declared stub.
//!
//! `classforge_trampoline`'s stub-emission policy needs exactly this
//! vocabulary to declare cross-class linkage symbols; full instruction
//! lowering (basic blocks, function bodies) is out of this subsystem's
//! scope and is not modeled here.

/// A stable identifier for a compiled item (method, trampoline stub, or
/// class-layout constant) within one compilation.
#[derive(Debug, Eq, PartialEq, Hash, Clone, Copy, PartialOrd, Ord)]
pub struct DefId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
/// Specifies the linkage of a symbol.
///
/// NOTE: a symbol with internal or private linkage must have default
/// visibility. It is illegal for a declaration to have any linkage other
/// than external or extern_weak.
pub enum Linkage {
    /// Only directly accessible by objects in the current compilation
    /// unit; not present in any object-file symbol table.
    Private,
    /// Like `Private`, but shows as a local symbol (`STB_LOCAL` on ELF) —
    /// the `static` keyword's linkage in C.
    Internal,
    /// Never emitted into the object file; equivalent to an external
    /// declaration from the linker's perspective, but known to the
    /// optimizer. Definitions only.
    AvailableExternally,
    /// Merged with other globals of the same name at link time; may be
    /// discarded if unreferenced.
    LinkOnce,
    /// Like `LinkOnce`, but may not be discarded even if unreferenced.
    Weak,
    /// Tentative-definition semantics (C's `int X;` at file scope).
    Common,
    /// Only valid on pointer-to-array globals; arrays are concatenated
    /// across translation units at link time.
    Appending,
    /// Weak until linked; becomes null (not an undefined reference) if
    /// never linked, per the ELF object model.
    ExternWeak,
    /// All definitions are equivalent per the "one definition rule",
    /// enabling inlining and constant folding across them.
    LinkOnceODR,
    WeakODR,
    /// Externally visible; participates in linkage and resolves external
    /// references. The default for anything not given another linkage.
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
/// Specifies the symbol visibility with regard to dynamic linking. A
/// symbol with internal or private linkage must have default visibility.
pub enum Visibility {
    /// Visible to other modules; may be overridden in a shared library.
    Default,
    /// Not placed in the dynamic symbol table; not directly referenceable
    /// from another module.
    Hidden,
    /// Placed in the dynamic symbol table, but references within the
    /// defining module bind locally and cannot be overridden.
    Protected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
/// Whether a global value's address is significant, enabling constant
/// merging/deduplication optimizations when it is not.
pub enum UnnamedAddress {
    /// The address is significant; must not be merged with others.
    None,
    /// Significant only within the current translation unit.
    Local,
    /// Completely insignificant; may be merged or deduplicated freely.
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
/// The calling convention of a function, mirroring LLVM's calling
/// convention identifiers (a trampoline stub and the body it bridges to
/// must agree on this).
pub enum CallConv {
    C = 0,
    Fast = 8,
    Cold = 9,
    X86StdCall = 64,
    X86FastCall = 65,
    X86_64SysV = 78,
    Win64 = 79,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linkage_ordering_is_total_and_stable() {
        let mut v = vec![Linkage::External, Linkage::Private, Linkage::Internal];
        v.sort();
        assert_eq!(v, vec![Linkage::Private, Linkage::Internal, Linkage::External]);
    }
}
