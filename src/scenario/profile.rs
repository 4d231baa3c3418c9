//! Organization profile selectors for the scenario generator.

use std::fmt;
use std::str::FromStr;

/// An option label that matches none of the selector's choices.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {field} option {value:?}, expected one of: {expected}")]
pub struct UnknownOption {
    /// Selector name.
    pub field: &'static str,
    /// Rejected input.
    pub value: String,
    /// Comma-separated accepted labels.
    pub expected: String,
}

fn unknown(field: &'static str, value: &str, labels: &[&str]) -> UnknownOption {
    UnknownOption {
        field,
        value: value.to_owned(),
        expected: labels.join(", "),
    }
}

/// Number of directory users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UserCountBucket {
    /// 1-100.
    #[default]
    UpTo100,
    /// 101-500.
    UpTo500,
    /// 501-1000.
    UpTo1000,
    /// 1000+.
    Over1000,
}

impl UserCountBucket {
    /// All choices in display order.
    pub const ALL: [Self; 4] = [Self::UpTo100, Self::UpTo500, Self::UpTo1000, Self::Over1000];

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::UpTo100 => "1-100",
            Self::UpTo500 => "101-500",
            Self::UpTo1000 => "501-1000",
            Self::Over1000 => "1000+",
        }
    }
}

/// Number of branch offices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BranchCountBucket {
    /// A single site.
    #[default]
    One,
    /// 2-5.
    UpTo5,
    /// 6-10.
    UpTo10,
    /// 10+.
    Over10,
}

impl BranchCountBucket {
    /// All choices in display order.
    pub const ALL: [Self; 4] = [Self::One, Self::UpTo5, Self::UpTo10, Self::Over10];

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::One => "1",
            Self::UpTo5 => "2-5",
            Self::UpTo10 => "6-10",
            Self::Over10 => "10+",
        }
    }
}

/// Identity platform in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlatformType {
    /// On-premise AD synchronized with Entra ID.
    #[default]
    Hybrid,
    /// Cloud-only Entra ID.
    EntraId,
    /// On-premise Active Directory only.
    OnPremise,
}

impl PlatformType {
    /// All choices in display order.
    pub const ALL: [Self; 3] = [Self::Hybrid, Self::EntraId, Self::OnPremise];

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Hybrid => "Híbrido",
            Self::EntraId => "Entra ID",
            Self::OnPremise => "Active Directory On-Premise",
        }
    }
}

macro_rules! label_conversions {
    ($ty:ty, $field:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownOption;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_lowercase();
                Self::ALL
                    .into_iter()
                    .find(|choice| choice.label().to_lowercase() == wanted)
                    .ok_or_else(|| {
                        let labels: Vec<&str> = Self::ALL.iter().map(|c| c.label()).collect();
                        unknown($field, s, &labels)
                    })
            }
        }
    };
}

label_conversions!(UserCountBucket, "users");
label_conversions!(BranchCountBucket, "branches");
label_conversions!(PlatformType, "platform");

/// Small enumerated description of a hypothetical organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ImpactProfile {
    /// Directory size.
    pub users: UserCountBucket,
    /// Number of sites.
    pub branches: BranchCountBucket,
    /// Identity platform.
    pub platform: PlatformType,
}

impl ImpactProfile {
    /// One-sentence description embedded in the prompt.
    pub fn describe(&self) -> String {
        format!(
            "Una empresa con {} usuarios, {} sucursales, y una plataforma {}.",
            self.users, self.branches, self.platform
        )
    }
}
