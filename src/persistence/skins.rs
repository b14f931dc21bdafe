//! Chicken skins and the points shop

use serde::{Deserialize, Serialize};

use super::{Persistence, StoreError};

/// Stable skin identifier (persisted as its string id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum SkinId {
    #[default]
    #[serde(rename = "WHITE")]
    White,
    #[serde(rename = "BROWN")]
    Brown,
    #[serde(rename = "PIXEL")]
    Pixel,
    #[serde(rename = "PARTY")]
    Party,
}

impl SkinId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkinId::White => "WHITE",
            SkinId::Brown => "BROWN",
            SkinId::Pixel => "PIXEL",
            SkinId::Party => "PARTY",
        }
    }

    /// Unknown ids map to `None`; callers usually fall back to the default skin
    pub fn parse(s: &str) -> Option<Self> {
        CATALOG.iter().map(|skin| skin.id).find(|id| id.as_str() == s)
    }

    pub fn skin(&self) -> &'static Skin {
        // Catalog order matches the enum
        &CATALOG[*self as usize]
    }

    pub fn is_free(&self) -> bool {
        self.skin().price == 0
    }
}

/// A purchasable chicken look
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Skin {
    pub id: SkinId,
    pub title: &'static str,
    pub price: u32,
}

pub const CATALOG: [Skin; 4] = [
    Skin {
        id: SkinId::White,
        title: "White Hen",
        price: 0,
    },
    Skin {
        id: SkinId::Brown,
        title: "Brown Hen",
        price: 450,
    },
    Skin {
        id: SkinId::Pixel,
        title: "Pixel Hen",
        price: 1500,
    },
    Skin {
        id: SkinId::Party,
        title: "Ghost Chick",
        price: 2200,
    },
];

/// Result of a shop purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Purchased,
    AlreadyOwned,
    InsufficientPoints { needed: u32, available: u32 },
}

/// Spend points on a skin, then unlock and select it
pub fn purchase_skin<P: Persistence + ?Sized>(
    store: &mut P,
    id: SkinId,
) -> Result<PurchaseOutcome, StoreError> {
    let profile = store.profile();
    if profile.is_unlocked(id) {
        return Ok(PurchaseOutcome::AlreadyOwned);
    }

    let price = id.skin().price;
    if !store.spend_points(price)? {
        return Ok(PurchaseOutcome::InsufficientPoints {
            needed: price,
            available: profile.points,
        });
    }
    store.unlock_skin(id)?;
    store.set_selected_skin(id)?;
    log::info!("Purchased skin {} for {} points", id.as_str(), price);
    Ok(PurchaseOutcome::Purchased)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_catalog_order_matches_ids() {
        for (i, skin) in CATALOG.iter().enumerate() {
            assert_eq!(skin.id as usize, i);
            assert_eq!(SkinId::parse(skin.id.as_str()), Some(skin.id));
        }
        assert_eq!(SkinId::parse("GOLD"), None);
    }

    #[test]
    fn test_serializes_as_string_id() {
        assert_eq!(serde_json::to_string(&SkinId::Pixel).unwrap(), "\"PIXEL\"");
    }

    #[test]
    fn test_purchase_flow() {
        let mut store = MemoryStore::new();
        store.add_points(500).unwrap();

        assert_eq!(
            purchase_skin(&mut store, SkinId::Pixel).unwrap(),
            PurchaseOutcome::InsufficientPoints {
                needed: 1500,
                available: 500
            }
        );
        assert_eq!(store.points(), 500);

        assert_eq!(purchase_skin(&mut store, SkinId::Brown).unwrap(), PurchaseOutcome::Purchased);
        assert_eq!(store.points(), 50);
        assert_eq!(store.selected_skin(), SkinId::Brown);

        assert_eq!(
            purchase_skin(&mut store, SkinId::Brown).unwrap(),
            PurchaseOutcome::AlreadyOwned
        );
        assert_eq!(
            purchase_skin(&mut store, SkinId::White).unwrap(),
            PurchaseOutcome::AlreadyOwned
        );
        assert_eq!(store.points(), 50);
    }
}
