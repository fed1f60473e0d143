use core::str::FromStr;

use serde::{Deserialize, Serialize};

use docgate_core::DomainError;

/// Kind of resource an access rule points at.
///
/// Target ids are only meaningful within their type: folder `"7"` and
/// document `"7"` are unrelated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Document,
    Folder,
    Tag,
    Category,
}

impl TargetType {
    pub const ALL: [TargetType; 4] = [
        TargetType::Document,
        TargetType::Folder,
        TargetType::Tag,
        TargetType::Category,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Document => "document",
            TargetType::Folder => "folder",
            TargetType::Tag => "tag",
            TargetType::Category => "category",
        }
    }
}

impl core::fmt::Display for TargetType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "document" => Ok(TargetType::Document),
            "folder" => Ok(TargetType::Folder),
            "tag" => Ok(TargetType::Tag),
            "category" => Ok(TargetType::Category),
            other => Err(DomainError::validation(format!("invalid target type '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_variant_from_its_own_name() {
        for ty in TargetType::ALL {
            assert_eq!(ty.as_str().parse::<TargetType>().unwrap(), ty);
        }
    }

    #[test]
    fn rejects_unknown_types() {
        assert!("cabinet".parse::<TargetType>().is_err());
        assert!("Document".parse::<TargetType>().is_err());
    }
}
