use std::ops::{BitOr, BitOrAssign};

/// Flags controlling `getnameinfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NameInfoFlags(u32);

impl NameInfoFlags {
    pub const NOFQDN: Self = Self(1 << 0);
    pub const NUMERICHOST: Self = Self(1 << 1);
    pub const NAMEREQD: Self = Self(1 << 2);
    pub const NUMERICSERV: Self = Self(1 << 3);
    pub const DGRAM: Self = Self(1 << 4);
    pub const TCP: Self = Self(0);
    pub const UDP: Self = Self::DGRAM;
    pub const LOOKUPHOST: Self = Self(1 << 8);
    pub const LOOKUPSERVICE: Self = Self(1 << 9);

    const KNOWN: u32 = Self::NOFQDN.0
        | Self::NUMERICHOST.0
        | Self::NAMEREQD.0
        | Self::NUMERICSERV.0
        | Self::DGRAM.0
        | Self::LOOKUPHOST.0
        | Self::LOOKUPSERVICE.0;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn contains(&self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    /// False when a bit outside the defined flags is set.
    pub const fn is_valid(&self) -> bool {
        self.0 & !Self::KNOWN == 0
    }

    /// Asks for neither a host nor a service lookup.
    pub const fn lookup_unspecified(&self) -> bool {
        self.0 & (Self::LOOKUPHOST.0 | Self::LOOKUPSERVICE.0) == 0
    }

    pub fn protocol(&self) -> &'static str {
        if self.contains(Self::DGRAM) {
            "udp"
        } else {
            "tcp"
        }
    }
}

impl BitOr for NameInfoFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for NameInfoFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Result of `getnameinfo`: the resolved node and/or service name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NameInfo {
    pub node: Option<String>,
    pub service: Option<String>,
}
