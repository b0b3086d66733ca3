use bitflags::bitflags;

bitflags! {
    /// Modifiers of a declared member or type.
    ///
    /// `PUBLIC` and `PRIVATE` are independent bits; a member with neither is
    /// treated as accessible.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MemberFlags: u16 {
        const PUBLIC    = 1 << 0;
        const PRIVATE   = 1 << 1;
        const STATIC    = 1 << 2;
        const FINAL     = 1 << 3;
        const ABSTRACT  = 1 << 4;
        /// Compiler generated forwarding method, never a property candidate.
        const BRIDGE    = 1 << 5;
        const SYNTHETIC = 1 << 6;
    }
}

impl MemberFlags {
    /// Whether calling the member requires forcing visibility.
    #[inline]
    pub const fn is_private(self) -> bool {
        self.contains(Self::PRIVATE)
    }

    /// `static final`, a constant that nobody can assign.
    #[inline]
    pub const fn is_constant(self) -> bool {
        self.contains(Self::STATIC.union(Self::FINAL))
    }
}
