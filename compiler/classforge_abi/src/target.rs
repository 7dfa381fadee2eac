use thiserror::Error;
use tracing::{info, instrument};

use crate::size_and_align::{AbiAndPrefAlign, Size};

#[derive(Debug)]
/// Describes the target configuration used during code generation.
///
/// This struct encapsulates information about the backend, data layout,
/// and optional target triple. It is used to drive architecture- and
/// platform-specific decisions throughout the compiler.
pub struct CompileTarget {
    /// The codegen backend to use.
    pub codegen_backend: BackendKind,
    /// The data layout configuration for the target, including type alignments,
    /// pointer size, and other ABI-relevant properties.
    pub data_layout: TargetDataLayout,
    /// The target triple string identifying the target architecture, vendor,
    /// operating system, and environment.
    ///
    /// If this is `None`, the target triple will not be set in the LLVM module,
    /// which may affect platform-specific codegen behavior or defaults.
    pub target_triple: Option<TargetTriple>,
}

impl CompileTarget {
    /// Builds a target from an already-parsed triple, deriving the data layout
    /// from the triple's pointer width and architecture.
    #[instrument]
    pub fn from_triple(codegen_backend: BackendKind, triple: TargetTriple) -> Self {
        let data_layout = TargetDataLayout::for_triple(&triple);
        CompileTarget {
            codegen_backend,
            data_layout,
            target_triple: Some(triple),
        }
    }

    pub fn new(codegen_backend: BackendKind) -> Self {
        CompileTarget {
            data_layout: TargetDataLayout::new(),
            codegen_backend,
            target_triple: None,
        }
    }

    pub fn data_layout_string(&self) -> String {
        match self.codegen_backend {
            BackendKind::Llvm => self.data_layout.as_llvm_datalayout_string(),
            BackendKind::Cranelift => self.data_layout.as_cranelift_datalayout_string(),
            BackendKind::Gcc => self.data_layout.as_gcc_datalayout_string(),
        }
    }

    pub fn target_triple_string(&self) -> Option<String> {
        self.target_triple.as_ref()?;

        match self.codegen_backend {
            BackendKind::Llvm => Some(
                self.target_triple
                    .as_ref()
                    .unwrap()
                    .into_llvm_triple_string(),
            ),
            BackendKind::Cranelift => Some(
                self.target_triple
                    .as_ref()
                    .unwrap()
                    .into_cranelift_triple_string(),
            ),
            BackendKind::Gcc => Some(
                self.target_triple
                    .as_ref()
                    .unwrap()
                    .into_gcc_triple_string(),
            ),
        }
    }
}

#[derive(Debug)]
/// The backend kind for code generation.
pub enum BackendKind {
    /// The LLVM backend.
    Llvm,

    /// The Cranelift backend.
    Cranelift,

    /// The GCC (GNU Compiler Collection) backend.
    Gcc,
}

#[derive(Debug)]
/// Describes the target platform's data layout, including type alignments, pointer size,
/// and other ABI-related information used during code generation.
pub struct TargetDataLayout {
    /// The endianness of the target architecture.
    pub endianess: Endianess,

    // Integer type alignments
    pub i1_align: AbiAndPrefAlign,
    pub i8_align: AbiAndPrefAlign,
    pub i16_align: AbiAndPrefAlign,
    pub i32_align: AbiAndPrefAlign,
    pub i64_align: AbiAndPrefAlign,
    pub i128_align: AbiAndPrefAlign,

    // Floating point type alignments
    pub f16_align: AbiAndPrefAlign,
    pub f32_align: AbiAndPrefAlign,
    pub f64_align: AbiAndPrefAlign,
    pub f128_align: AbiAndPrefAlign,

    /// The size of pointers in bytes.
    pub pointer_size: u64,

    /// The ABI and preferred alignment for pointers.
    pub pointer_align: AbiAndPrefAlign,

    /// The minimum and preferred alignment for aggregate types (e.g., structs, arrays).
    pub aggregate_align: AbiAndPrefAlign,

    /// Alignments for vector types.
    pub vector_align: Vec<(Size, AbiAndPrefAlign)>,

    /// An identifier that specifies the address space that some operation
    /// should operate on.
    pub instruction_address_space: AddressSpace,
}

impl Default for TargetDataLayout {
    fn default() -> Self {
        TargetDataLayout {
            endianess: Endianess::Little,
            i1_align: AbiAndPrefAlign::new(1, 1),
            i8_align: AbiAndPrefAlign::new(1, 1),
            i16_align: AbiAndPrefAlign::new(2, 2),
            i32_align: AbiAndPrefAlign::new(4, 4),
            i64_align: AbiAndPrefAlign::new(4, 8),
            i128_align: AbiAndPrefAlign::new(4, 8),
            f16_align: AbiAndPrefAlign::new(2, 2),
            f32_align: AbiAndPrefAlign::new(4, 4),
            f64_align: AbiAndPrefAlign::new(8, 8),
            f128_align: AbiAndPrefAlign::new(16, 16),
            pointer_size: 64,
            pointer_align: AbiAndPrefAlign::new(8, 8),
            aggregate_align: AbiAndPrefAlign::new(0, 8),
            vector_align: vec![
                (Size::from_bits(64), AbiAndPrefAlign::new(8, 8)),
                (Size::from_bits(128), AbiAndPrefAlign::new(16, 16)),
            ],
            instruction_address_space: AddressSpace::DATA,
        }
    }
}

impl TargetDataLayout {
    #[instrument]
    pub fn new() -> Self {
        let target_data_layout = TargetDataLayout::default();
        info!("TargetDataLayout created: {:?}", target_data_layout);
        target_data_layout
    }

    /// Derives a data layout from a parsed triple: 32-bit architectures get a
    /// 32-bit pointer and 32-bit-pointer-aligned `i64`/`f64`, matching the
    /// common ABI convention that LLVM's own datalayout strings encode for
    /// `i686`/`arm`/`armv7` targets.
    pub fn for_triple(triple: &TargetTriple) -> Self {
        let mut dl = TargetDataLayout::default();
        if triple.is_32_bit() {
            dl.pointer_size = 32;
            dl.pointer_align = AbiAndPrefAlign::new(4, 4);
            dl.i64_align = AbiAndPrefAlign::new(4, 8);
            dl.i128_align = AbiAndPrefAlign::new(4, 8);
            dl.aggregate_align = AbiAndPrefAlign::new(0, 4);
        }
        if triple.os.eq_ignore_ascii_case("windows") {
            dl.endianess = Endianess::Little;
        }
        dl
    }

    /// Pointer size in bytes, the unit everything else in this crate is
    /// expressed in.
    pub fn pointer_bytes(&self) -> u64 {
        self.pointer_size / 8
    }

    /// For example, for x86_64-unknown-linux-gnu, the data layout string could be:
    /// `e-m:e-p270:32:32-p271:32:32-p272:64:64-i64:64-i128:128-f80:128-n8:16:32:64-S128`
    pub fn as_llvm_datalayout_string(&self) -> String {
        // LLVM's datalayout string encodes alignments in bits; `AbiAndPrefAlign`
        // stores them in bytes, so every alignment is scaled back up here.
        let format_align = |name: &str, align: &AbiAndPrefAlign| {
            format!(
                "-{}:{}:{}",
                name,
                align.abi.bytes() * 8,
                align.pref.bytes() * 8
            )
        };

        let mut s = String::new();

        s.push(if self.endianess == Endianess::Little {
            'e'
        } else {
            'E'
        });

        s.push_str(&format!(
            "-p:{}:{}:{}",
            self.pointer_size,
            self.pointer_align.abi.bytes() * 8,
            self.pointer_align.pref.bytes() * 8
        ));

        s.push_str(&format_align("i1", &self.i1_align));
        s.push_str(&format_align("i8", &self.i8_align));
        s.push_str(&format_align("i16", &self.i16_align));
        s.push_str(&format_align("i32", &self.i32_align));
        s.push_str(&format_align("i64", &self.i64_align));
        s.push_str(&format_align("i128", &self.i128_align));

        s.push_str(&format_align("f16", &self.f16_align));
        s.push_str(&format_align("f32", &self.f32_align));
        s.push_str(&format_align("f64", &self.f64_align));
        s.push_str(&format_align("f128", &self.f128_align));

        s.push_str(&format_align("a", &self.aggregate_align));

        for (size, align) in &self.vector_align {
            s.push_str(&format!(
                "-v{}:{}:{}",
                size.bytes() * 8,
                align.abi.bytes() * 8,
                align.pref.bytes() * 8
            ));
        }

        s.push_str(&format!("-P{}", u32::from(&self.instruction_address_space)));

        s
    }

    fn as_cranelift_datalayout_string(&self) -> String {
        unimplemented!()
    }

    fn as_gcc_datalayout_string(&self) -> String {
        unimplemented!()
    }
}

#[derive(Debug, PartialEq, Eq)]
/// The endianness of the target architecture.
pub enum Endianess {
    /// Little-endian.
    Little,

    /// Big-endian.
    Big,
}

/// Errors produced while parsing a target triple string.
#[derive(Debug, Error)]
pub enum TargetTripleError {
    #[error("target triple `{0}` has no architecture component")]
    Empty(String),
    #[error("target triple `{0}` has an unrecognized architecture `{1}`")]
    UnsupportedArch(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Represents a target triple, which uniquely identifies a compilation target.
///
/// A target triple is a string that encodes information about the target architecture,
/// vendor, operating system, environment, and ABI. Trailing components may be omitted;
/// e.g. `"x86_64-unknown-linux"` is accepted with `env` and `abi` defaulting to empty.
///
/// Example: `"x86_64-unknown-linux-gnu"`
pub struct TargetTriple {
    /// The target architecture (e.g., "x86_64", "aarch64", "arm").
    pub arch: String,
    /// The target vendor (e.g., "unknown", "apple").
    pub vendor: String,
    /// The target operating system (e.g., "linux", "windows").
    pub os: String,
    /// The target environment or runtime (e.g., "gnu", "msvc", "musl").
    pub env: String,
    /// The ABI used on the target (e.g., "eabi", "gnu").
    pub abi: String,
}

impl TargetTriple {
    #[tracing::instrument]
    pub fn new(arch: &str, vendor: &str, os: &str, env: &str, abi: &str) -> Self {
        TargetTriple {
            arch: arch.to_string(),
            vendor: vendor.to_string(),
            os: os.to_string(),
            env: env.to_string(),
            abi: abi.to_string(),
        }
    }

    /// Parses the conventional `arch-vendor-os[-env[-abi]]` triple form.
    /// Missing trailing components default to the empty string, the way
    /// most target-triple consumers tolerate shortened triples.
    #[tracing::instrument]
    pub fn parse(input: &str) -> Result<Self, TargetTripleError> {
        let parts: Vec<&str> = input.split('-').collect();
        if parts.is_empty() || parts[0].is_empty() {
            return Err(TargetTripleError::Empty(input.to_string()));
        }
        if !KNOWN_ARCHES.contains(&parts[0]) {
            return Err(TargetTripleError::UnsupportedArch(
                input.to_string(),
                parts[0].to_string(),
            ));
        }

        Ok(TargetTriple {
            arch: parts.first().copied().unwrap_or("").to_string(),
            vendor: parts.get(1).copied().unwrap_or("").to_string(),
            os: parts.get(2).copied().unwrap_or("").to_string(),
            env: parts.get(3).copied().unwrap_or("").to_string(),
            abi: parts.get(4).copied().unwrap_or("").to_string(),
        })
    }

    /// Whether this triple names an ARM architecture (`arm`, `armv7`, `thumbv7`, ...).
    /// AArch64 is a distinct 64-bit architecture and is not considered ARM here.
    pub fn is_arm(&self) -> bool {
        self.arch.starts_with("arm") || self.arch.starts_with("thumb")
    }

    /// Whether this triple is a 32-bit target, used to select the pointer-size
    /// half of the data layout.
    pub fn is_32_bit(&self) -> bool {
        self.is_arm() || self.arch == "i686" || self.arch == "i386" || self.arch == "x86"
    }

    /// True exactly for the ABI carve-out this spec's field-layout algorithm
    /// applies: on 32-bit ARM, 8-byte fields (`long`, `double`) are aligned to
    /// 8 bytes rather than the architecture's natural 4-byte word alignment.
    pub fn long_long_align_on_32_bit_arm(&self) -> bool {
        self.is_arm() && self.is_32_bit()
    }

    // ARCHITECTURE-VENDOR-OPERATING_SYSTEM-ENVIRONMENT
    pub fn into_llvm_triple_string(&self) -> String {
        format!(
            "{}-{}-{}-{}-{}",
            self.arch, self.vendor, self.os, self.env, self.abi
        )
    }

    pub fn into_cranelift_triple_string(&self) -> String {
        unimplemented!()
    }

    pub fn into_gcc_triple_string(&self) -> String {
        unimplemented!()
    }
}

const KNOWN_ARCHES: &[&str] = &[
    "x86_64", "i686", "i386", "x86", "aarch64", "arm", "armv7", "thumbv7",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressSpace {
    /// The default address space.
    DATA = 0,
}

impl From<&AddressSpace> for u32 {
    fn from(addr_space: &AddressSpace) -> Self {
        match *addr_space {
            AddressSpace::DATA => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_triple() {
        let t = TargetTriple::parse("x86_64-unknown-linux-gnu").unwrap();
        assert_eq!(t.arch, "x86_64");
        assert_eq!(t.vendor, "unknown");
        assert_eq!(t.os, "linux");
        assert_eq!(t.env, "gnu");
        assert!(!t.is_arm());
        assert!(!t.is_32_bit());
    }

    #[test]
    fn parses_short_triple_with_empty_trailing_components() {
        let t = TargetTriple::parse("x86_64-unknown-linux").unwrap();
        assert_eq!(t.env, "");
        assert_eq!(t.abi, "");
    }

    #[test]
    fn rejects_empty_and_unknown_arch() {
        assert!(TargetTriple::parse("").is_err());
        assert!(TargetTriple::parse("not-a-real-arch-unknown-linux").is_err());
    }

    #[test]
    fn arm_32_bit_triple_triggers_long_align_override() {
        let t = TargetTriple::parse("armv7-unknown-linux-gnueabihf").unwrap();
        assert!(t.long_long_align_on_32_bit_arm());
    }

    #[test]
    fn aarch64_is_not_32_bit_arm() {
        let t = TargetTriple::parse("aarch64-unknown-linux-gnu").unwrap();
        assert!(!t.long_long_align_on_32_bit_arm());
    }

    #[test]
    fn data_layout_for_32_bit_triple_has_32_bit_pointer() {
        let t = TargetTriple::parse("armv7-unknown-linux-gnueabihf").unwrap();
        let dl = TargetDataLayout::for_triple(&t);
        assert_eq!(dl.pointer_bytes(), 4);
    }
}
