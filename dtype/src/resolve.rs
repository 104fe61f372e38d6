//! Backend type resolution.
//!
//! A [`TypeTable`] maps each [`DType`] to the storage a backend uses for it.
//! Default tables are total over the supported kinds; a backend configuration
//! may withhold kinds the target cannot store (e.g. a device without double
//! precision), in which case resolution fails with
//! [`Error::UnsupportedKind`](crate::Error::UnsupportedKind).

use strum::{EnumCount, IntoEnumIterator};

use crate::{Backend, DType, HostTypeTag, Result, UnsupportedKindSnafu};

/// Backend storage representation of a numeric kind.
///
/// The byte width is always derived from the storage kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolvedType {
    storage: DType,
    byte_width: usize,
    host_tag: HostTypeTag,
}

impl ResolvedType {
    pub const fn new(storage: DType, host_tag: HostTypeTag) -> Self {
        Self { storage, byte_width: storage.bytes(), host_tag }
    }

    /// Kind of the storage cell.
    pub const fn storage(&self) -> DType {
        self.storage
    }

    /// Width of one element in bytes.
    pub const fn byte_width(&self) -> usize {
        self.byte_width
    }

    /// Host array type tag.
    pub const fn host_tag(&self) -> HostTypeTag {
        self.host_tag
    }
}

/// NumPy type number and character for each kind.
///
/// 64-bit integers use `NPY_LONGLONG`/`NPY_ULONGLONG` so the tag does not
/// depend on the platform's `long` width.
const fn numpy_tag(dtype: DType) -> HostTypeTag {
    match dtype {
        DType::Bool => HostTypeTag::new(0, '?'),
        DType::Int8 => HostTypeTag::new(1, 'b'),
        DType::UInt8 => HostTypeTag::new(2, 'B'),
        DType::Int16 => HostTypeTag::new(3, 'h'),
        DType::UInt16 => HostTypeTag::new(4, 'H'),
        DType::Int32 => HostTypeTag::new(5, 'i'),
        DType::UInt32 => HostTypeTag::new(6, 'I'),
        DType::Int64 => HostTypeTag::new(9, 'q'),
        DType::UInt64 => HostTypeTag::new(10, 'Q'),
        DType::Float32 => HostTypeTag::new(11, 'f'),
        DType::Float64 => HostTypeTag::new(12, 'd'),
    }
}

/// Resolves numeric kinds to backend storage.
pub trait TypeResolver {
    /// Backend this resolver targets.
    fn backend(&self) -> Backend;

    /// Resolve a single kind.
    fn resolve(&self, dtype: DType) -> Result<ResolvedType>;

    /// Resolve a list of named kinds, preserving order.
    ///
    /// Fails on the first unsupported kind.
    fn resolve_all<'a, I>(&self, kinds: I) -> Result<Vec<(String, ResolvedType)>>
    where
        Self: Sized,
        I: IntoIterator<Item = (&'a str, DType)>,
    {
        kinds.into_iter().map(|(name, dtype)| Ok((name.to_string(), self.resolve(dtype)?))).collect()
    }
}

/// Per-backend mapping table from numeric kind to storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeTable {
    backend: Backend,
    entries: [Option<ResolvedType>; DType::COUNT],
}

impl TypeTable {
    /// Default, total table for a backend.
    pub fn for_backend(backend: Backend) -> Self {
        let mut entries = [None; DType::COUNT];
        for dtype in DType::iter() {
            // Both backends hand their results to NumPy, so the tags agree;
            // the backends differ in how the storage type is spelled.
            entries[dtype as usize] = Some(ResolvedType::new(dtype, numpy_tag(dtype)));
        }
        Self { backend, entries }
    }

    /// Table without any mapping.
    pub fn empty(backend: Backend) -> Self {
        Self { backend, entries: [None; DType::COUNT] }
    }

    /// Add or replace the mapping for a kind.
    pub fn with(mut self, dtype: DType, resolved: ResolvedType) -> Self {
        self.entries[dtype as usize] = Some(resolved);
        self
    }

    /// Remove the mapping for a kind.
    pub fn without(mut self, dtype: DType) -> Self {
        self.entries[dtype as usize] = None;
        self
    }

    pub fn supports(&self, dtype: DType) -> bool {
        self.entries[dtype as usize].is_some()
    }

    /// Kinds this table can resolve.
    pub fn supported(&self) -> impl Iterator<Item = DType> + '_ {
        DType::iter().filter(|dtype| self.supports(*dtype))
    }
}

impl TypeResolver for TypeTable {
    fn backend(&self) -> Backend {
        self.backend
    }

    fn resolve(&self, dtype: DType) -> Result<ResolvedType> {
        match self.entries[dtype as usize] {
            Some(resolved) => Ok(resolved),
            None => UnsupportedKindSnafu { dtype, backend: self.backend }.fail(),
        }
    }
}

/// Resolve a kind against a backend's default table.
pub fn resolve(dtype: DType, backend: Backend) -> Result<ResolvedType> {
    TypeTable::for_backend(backend).resolve(dtype)
}
