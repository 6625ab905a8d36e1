//! A routable resource and the interface-mask scope bitset.

/// Interface-mask scope bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterfaceMask(u16);

impl InterfaceMask {
    pub const I: Self = Self(1 << 0);
    pub const O: Self = Self(1 << 1);
    pub const G: Self = Self(1 << 2);
    pub const C: Self = Self(1 << 3);
    pub const P: Self = Self(1 << 4);
    pub const D: Self = Self(1 << 5);
    pub const A: Self = Self(1 << 6);
    pub const S: Self = Self(1 << 7);
    pub const LL: Self = Self(1 << 8);
    pub const B: Self = Self(1 << 9);
    pub const SEC: Self = Self(1 << 10);
    pub const SWU: Self = Self(1 << 11);
    pub const PM: Self = Self(1 << 12);
    pub const M: Self = Self(1 << 13);

    pub const NONE: Self = Self(0);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn contains_all(self, required: Self) -> bool {
        (self.0 & required.0) == required.0
    }

    pub const fn bits(self) -> u16 {
        self.0
    }
}

impl std::ops::BitOr for InterfaceMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Which CRUD methods a resource handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MethodMask(u8);

impl MethodMask {
    pub const GET: Self = Self(1 << 0);
    pub const PUT: Self = Self(1 << 1);
    pub const POST: Self = Self(1 << 2);
    pub const DELETE: Self = Self(1 << 3);
    pub const NONE: Self = Self(0);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn allows(self, method: Self) -> bool {
        (self.0 & method.0) != 0
    }
}

impl std::ops::BitOr for MethodMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// A single routable resource.
///
/// Handler dispatch itself (the GET/PUT/POST/DELETE callbacks) is left to
/// the application layer; the router's job ends at matching, access
/// control, and content negotiation.
#[derive(Debug, Clone)]
pub struct Resource {
    pub device_index: usize,
    pub uri: String,
    pub resource_types: Vec<String>,
    pub interface_mask: InterfaceMask,
    pub content_format: u16,
    pub methods: MethodMask,
    pub discoverable: bool,
    pub observable: bool,
    pub secure: bool,
    /// Resources an unauthenticated request may invoke, e.g. the discovery
    /// endpoint itself.
    pub public: bool,
}

impl Resource {
    pub fn new(uri: impl Into<String>, interface_mask: InterfaceMask, content_format: u16) -> Self {
        Self {
            device_index: 0,
            uri: uri.into(),
            resource_types: Vec::new(),
            interface_mask,
            content_format,
            methods: MethodMask::NONE,
            discoverable: true,
            observable: false,
            secure: true,
            public: false,
        }
    }

    pub fn with_methods(mut self, methods: MethodMask) -> Self {
        self.methods = methods;
        self
    }

    pub fn with_resource_type(mut self, rt: impl Into<String>) -> Self {
        self.resource_types.push(rt.into());
        self
    }

    pub fn public(mut self) -> Self {
        self.public = true;
        self.secure = false;
        self
    }

    pub fn observable(mut self) -> Self {
        self.observable = true;
        self
    }

    /// Is `uri` a wildcard template?
    pub fn is_wildcard(&self) -> bool {
        self.uri.ends_with('*')
    }

    /// The fixed prefix of a wildcard resource, e.g. `/fp/g/*` -> `/fp/g/`.
    fn wildcard_prefix(&self) -> &str {
        self.uri.trim_end_matches('*')
    }

    /// Does this resource match `path`, either exactly or via its wildcard
    /// prefix? For a wildcard match, also returns the matched suffix.
    pub fn matches<'a>(&self, path: &'a str) -> Option<&'a str> {
        if !self.is_wildcard() {
            return (self.uri == path).then_some("");
        }
        path.strip_prefix(self.wildcard_prefix())
    }
}

/// Parse a wildcard suffix as an integer instance id, e.g. `/fp/g/17` against
/// template `/fp/g/*` yields `Some(17)`.
pub fn instance_suffix_as_int(suffix: &str) -> Option<u32> {
    suffix.parse().ok()
}
