use std::{fmt, str::FromStr};

use crate::netem::LinkConditions;

/// Preset link conditions for common connection types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    /// `3g`
    ThreeG,
    /// `3gfast`
    ThreeGFast,
    /// `3gslow`
    ThreeGSlow,
    /// `3gem`, emerging markets 3G.
    ThreeGEm,
    /// `2g`
    TwoG,
    /// `cable`
    Cable,
    /// `dsl`
    Dsl,
    /// `4g`
    FourG,
    /// `lte`
    Lte,
    /// `edge`
    Edge,
    /// `dial`, dial-up.
    Dial,
    /// `fois`, fiber.
    Fois,
}

impl Profile {
    /// Every profile, in display order.
    pub const ALL: [Self; 12] = [
        Self::ThreeG,
        Self::ThreeGFast,
        Self::ThreeGSlow,
        Self::ThreeGEm,
        Self::TwoG,
        Self::Cable,
        Self::Dsl,
        Self::FourG,
        Self::Lte,
        Self::Edge,
        Self::Dial,
        Self::Fois,
    ];

    /// The name used on the command line.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ThreeG => "3g",
            Self::ThreeGFast => "3gfast",
            Self::ThreeGSlow => "3gslow",
            Self::ThreeGEm => "3gem",
            Self::TwoG => "2g",
            Self::Cable => "cable",
            Self::Dsl => "dsl",
            Self::FourG => "4g",
            Self::Lte => "lte",
            Self::Edge => "edge",
            Self::Dial => "dial",
            Self::Fois => "fois",
        }
    }

    /// Upload kbit/s, download kbit/s and RTT in ms.
    const fn values(self) -> (u64, u64, u32) {
        match self {
            Self::ThreeG => (768, 1600, 150),
            Self::ThreeGFast => (768, 1600, 75),
            Self::ThreeGSlow | Self::ThreeGEm => (400, 400, 200),
            Self::TwoG => (256, 280, 400),
            Self::Cable => (1000, 5000, 28),
            Self::Dsl => (384, 1500, 50),
            Self::FourG => (9000, 9000, 85),
            Self::Lte => (12000, 12000, 70),
            Self::Edge => (200, 240, 840),
            Self::Dial => (30, 49, 120),
            Self::Fois => (5000, 20000, 2),
        }
    }

    /// The profile's rates and RTT, with no jitter or loss.
    pub fn conditions(self) -> LinkConditions {
        let (up, down, rtt) = self.values();
        LinkConditions { up_kbit: up, down_kbit: down, rtt_ms: rtt, jitter_ms: 0, packet_loss: 0.0 }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A profile name that matches no [`Profile`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown profile {0:?}, expected one of: {names}", names = profile_names())]
pub struct UnknownProfile(pub String);

fn profile_names() -> String {
    Profile::ALL.iter().map(|p| p.name()).collect::<Vec<_>>().join(", ")
}

impl FromStr for Profile {
    type Err = UnknownProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|profile| profile.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownProfile(s.to_string()))
    }
}
