use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Theme,
    Sticker,
    Frame,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ShopItem {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: ItemKind,
    pub price: i64,
}

pub const CATALOG: &[ShopItem] = &[
    ShopItem {
        id: "theme-sunrise",
        name: "Sunrise Theme",
        kind: ItemKind::Theme,
        price: 120,
    },
    ShopItem {
        id: "theme-midnight",
        name: "Midnight Theme",
        kind: ItemKind::Theme,
        price: 120,
    },
    ShopItem {
        id: "sticker-cloud",
        name: "Cloud Sticker",
        kind: ItemKind::Sticker,
        price: 30,
    },
    ShopItem {
        id: "sticker-cat",
        name: "Cat Sticker",
        kind: ItemKind::Sticker,
        price: 30,
    },
    ShopItem {
        id: "frame-gold",
        name: "Gold Frame",
        kind: ItemKind::Frame,
        price: 200,
    },
];

pub fn find_item(id: &str) -> Option<&'static ShopItem> {
    CATALOG.iter().find(|item| item.id == id)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PurchaseOutcome {
    pub item_id: String,
    pub price: i64,
    pub balance: i64,
}
