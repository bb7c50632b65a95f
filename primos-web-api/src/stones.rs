use rocket::serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// EvoZtone kinds, all ERC-1155 ids on the stones contract.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, Display, EnumString, EnumIter,
)]
#[serde(crate = "rocket::serde")]
pub enum StoneType {
    #[serde(rename = "PRIMAL")]
    #[strum(serialize = "PRIMAL")]
    Primal,
    #[serde(rename = "MOUNT_X")]
    #[strum(serialize = "MOUNT_X")]
    MountX,
    #[serde(rename = "MOUNT_Y")]
    #[strum(serialize = "MOUNT_Y")]
    MountY,
}

impl StoneType {
    pub fn token_id(&self) -> i64 {
        match self {
            StoneType::Primal => 1,
            StoneType::MountX => 2,
            StoneType::MountY => 3,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StoneType::Primal => "PRIMAL EvoZtone",
            StoneType::MountX => "MOUNT-X EvoZtone",
            StoneType::MountY => "MOUNT-Y EvoZtone",
        }
    }

    /// Primo rarities this stone can evolve, spelled as in the metadata.
    pub fn compatible_with(&self) -> &'static [&'static str] {
        match self {
            StoneType::Primal => &["original"],
            StoneType::MountX | StoneType::MountY => &["shiny"],
        }
    }

    pub fn is_compatible(&self, primo_rarity: &str) -> bool {
        self.compatible_with().contains(&primo_rarity)
    }

    pub fn all() -> Vec<StoneType> {
        use strum::IntoEnumIterator;
        StoneType::iter().collect()
    }
}

/// Stone types able to evolve a Primo of `rarity`.
pub fn compatible_stones(rarity: &str) -> Vec<StoneType> {
    StoneType::all()
        .into_iter()
        .filter(|stone| stone.is_compatible(rarity))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_wire_names() {
        assert_eq!(StoneType::from_str("PRIMAL").unwrap(), StoneType::Primal);
        assert_eq!(StoneType::from_str("MOUNT_X").unwrap(), StoneType::MountX);
        assert_eq!(StoneType::from_str("MOUNT_Y").unwrap(), StoneType::MountY);
        assert!(StoneType::from_str("FIRE_DUST").is_err());
        assert_eq!(StoneType::MountY.to_string(), "MOUNT_Y");
    }

    #[test]
    fn token_ids() {
        assert_eq!(StoneType::Primal.token_id(), 1);
        assert_eq!(StoneType::MountX.token_id(), 2);
        assert_eq!(StoneType::MountY.token_id(), 3);
    }

    #[test]
    fn compatibility_is_exact_rarity() {
        assert!(StoneType::Primal.is_compatible("original"));
        assert!(!StoneType::Primal.is_compatible("Original"));
        assert!(!StoneType::MountX.is_compatible("SHINY"));
        assert!(!StoneType::Primal.is_compatible("shiny"));
        assert!(StoneType::MountX.is_compatible("shiny"));
        // Z variants are their own rarity
        assert!(!StoneType::MountY.is_compatible("shiny Z"));
        assert_eq!(
            compatible_stones("shiny"),
            vec![StoneType::MountX, StoneType::MountY]
        );
        assert!(compatible_stones("unique").is_empty());
    }
}
