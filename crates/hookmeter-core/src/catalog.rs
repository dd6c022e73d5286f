//! Lookup entities: characters, maps, items and teammates.
//!
//! Characters, maps and items are reference data seeded once when the store is
//! created. Teammates are created lazily the first time a nickname is used.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::{Error, Result};

/// Name of the sentinel item meaning "no item used, gained or lost".
///
/// It is a real catalog entry, but item aggregates never count it.
pub const NONE_ITEM: &str = "None";

// ─── Tables ──────────────────────────────────────────────────────────────────

/// One of the lookup tables a [`crate::store::MatchStore`] exposes.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LookupTable {
  Characters,
  Maps,
  Items,
  Teammates,
}

impl LookupTable {
  pub fn table_name(self) -> &'static str {
    match self {
      Self::Characters => "characters",
      Self::Maps => "maps",
      Self::Items => "items",
      Self::Teammates => "teammates",
    }
  }

  pub fn name_column(self) -> &'static str {
    match self {
      Self::Teammates => "nickname",
      _ => "name",
    }
  }

  /// Reference rows inserted when the store is created. Teammates have none.
  pub fn seed(self) -> &'static [&'static str] {
    match self {
      Self::Characters => SEED_CHARACTERS,
      Self::Maps => SEED_MAPS,
      Self::Items => SEED_ITEMS,
      Self::Teammates => &[],
    }
  }
}

// ─── Entries ─────────────────────────────────────────────────────────────────

/// An `(id, name)` row from a lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LookupEntry {
  pub id:   i64,
  pub name: String,
}

impl LookupEntry {
  pub fn new(id: i64, name: impl Into<String>) -> Self {
    Self { id, name: name.into() }
  }

  /// Whether this is the [`NONE_ITEM`] sentinel.
  pub fn is_none_item(&self) -> bool { self.name == NONE_ITEM }
}

/// A co-player, unique by case-insensitive nickname.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Teammate {
  pub id:       i64,
  pub nickname: String,
}

/// Trim a nickname, rejecting one that is blank.
pub fn normalize_nickname(raw: &str) -> Result<&str> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Err(Error::EmptyNickname);
  }
  Ok(trimmed)
}

// ─── Seed data ───────────────────────────────────────────────────────────────

pub const SEED_CHARACTERS: &[&str] = &[
  "The Trapper",
  "The Wraith",
  "The Hillbilly",
  "The Nurse",
  "The Shape",
  "The Hag",
  "The Doctor",
  "The Huntress",
  "The Cannibal",
  "The Nightmare",
  "The Pig",
  "The Clown",
  "The Spirit",
  "The Legion",
  "The Plague",
  "The Ghost Face",
  "The Demogorgon",
  "The Oni",
  "The Deathslinger",
  "The Executioner",
  "The Blight",
  "The Twins",
  "The Trickster",
  "The Nemesis",
  "The Cenobite",
  "The Artist",
  "The Onryo",
  "The Dredge",
  "The Mastermind",
  "The Knight",
  "The Skull Merchant",
  "The Singularity",
  "The Xenomorph",
  "The Good Guy",
  "The Unknown",
  "The Lich",
  "The Dark Lord",
  "The Houndmaster",
  "The Ghoul",
  "The Animatronic",
];

pub const SEED_MAPS: &[&str] = &[
  "MacMillan Estate - Coal Tower",
  "MacMillan Estate - Ironworks of Misery",
  "MacMillan Estate - Shelter Woods",
  "MacMillan Estate - Suffocation Pit",
  "MacMillan Estate - Groaning Storehouse",
  "Autohaven Wreckers - Azarov's Resting Place",
  "Autohaven Wreckers - Gas Heaven",
  "Autohaven Wreckers - Wretched Shop",
  "Autohaven Wreckers - Blood Lodge",
  "Autohaven Wreckers - Wreckers' Yard",
  "Coldwind Farm - Rotten Fields",
  "Coldwind Farm - The Thompson House",
  "Coldwind Farm - Fractured Cowshed",
  "Coldwind Farm - Rancid Abattoir",
  "Coldwind Farm - Torment Creek",
  "Crotus Prenn Asylum - Father Campbell's Chapel",
  "Crotus Prenn Asylum - Disturbed Ward",
  "Haddonfield - Lampkin Lane",
  "Backwater Swamp - The Pale Rose",
  "Backwater Swamp - Grim Pantry",
  "Lery's Memorial Institute - Treatment Theatre",
  "Red Forest - Mother's Dwelling",
  "Red Forest - The Temple of Purgation",
  "Springwood - Badham Preschool I",
  "Springwood - Badham Preschool II",
  "Springwood - Badham Preschool III",
  "Springwood - Badham Preschool IV",
  "Springwood - Badham Preschool V",
  "Gideon Meat Plant - The Game",
  "Yamaoka Estate - Family Residence",
  "Yamaoka Estate - Sanctum of Wrath",
  "Ormond - Mount Ormond Resort",
  "Ormond - Ormond Lake Mine",
  "Grave of Glenvale - Dead Dawg Saloon",
  "Raccoon City - Police Station East Wing",
  "Raccoon City - Police Station West Wing",
  "Forsaken Boneyard - Eyrie of Crows",
  "Withered Isle - Garden of Joy",
  "Withered Isle - Greenville Square",
  "Withered Isle - Freddy Fazbear's Pizza",
  "Dvarka Deepwood - Toba Landing",
  "Dvarka Deepwood - Nostromo Wreckage",
  "Decimated Borgo - The Shattered Square",
  "Decimated Borgo - Forgotten Ruins",
];

pub const SEED_ITEMS: &[&str] = &[
  NONE_ITEM,
  "Worn-Out Tools",
  "Toolbox",
  "Mechanic's Toolbox",
  "Commodious Toolbox",
  "Alex's Toolbox",
  "Engineer's Toolbox",
  "Camping Aid Kit",
  "First Aid Kit",
  "Emergency Med-Kit",
  "Ranger Med-Kit",
  "Flashlight",
  "Sport Flashlight",
  "Utility Flashlight",
  "Broken Key",
  "Dull Key",
  "Skeleton Key",
  "Map",
  "Rainbow Map",
  "Firecracker (Event)",
  "Chinese Lantern (Event)",
  "Lunar New Year Lantern (Event)",
];
