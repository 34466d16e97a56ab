use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::wishlist::WishlistEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    Electronics,
    Apparel,
    Home,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Electronics => write!(f, "Electronics"),
            Category::Apparel => write!(f, "Apparel"),
            Category::Home => write!(f, "Home"),
        }
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "electronics" => Ok(Category::Electronics),
            "apparel" => Ok(Category::Apparel),
            "home" => Ok(Category::Home),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: i64,
    pub title: &'static str,
    pub price: f64,
    pub category: Category,
    pub ai_recommended: bool,
    pub description: &'static str,
}

impl Product {
    pub fn wishlist_entry(&self) -> WishlistEntry {
        WishlistEntry {
            id: self.id,
            title: self.title.to_string(),
            price: self.price,
        }
    }
}

/// The built-in storefront catalog. Ids are stable and externally visible
/// (the product-scoped chat route embeds them).
pub const CATALOG: &[Product] = &[
    Product {
        id: 1,
        title: "Earbuds Bluetooth",
        price: 199_000.0,
        category: Category::Electronics,
        ai_recommended: true,
        description: "Earbuds wireless untuk musik dan panggilan sehari-hari.",
    },
    Product {
        id: 2,
        title: "Power Bank 10.000mAh",
        price: 149_000.0,
        category: Category::Electronics,
        ai_recommended: false,
        description: "Power bank kapasitas 10.000mAh untuk isi ulang HP di luar rumah.",
    },
    Product {
        id: 3,
        title: "Kaos Oversize",
        price: 99_000.0,
        category: Category::Apparel,
        ai_recommended: false,
        description: "Kaos oversize nyaman untuk harian, style santai.",
    },
    Product {
        id: 4,
        title: "Hoodie Basic",
        price: 179_000.0,
        category: Category::Apparel,
        ai_recommended: true,
        description: "Hoodie basic untuk cuaca sejuk, look minimalis.",
    },
    Product {
        id: 5,
        title: "Lampu Meja Minimalis",
        price: 89_000.0,
        category: Category::Home,
        ai_recommended: false,
        description: "Lampu meja minimalis untuk belajar dan kerja.",
    },
    Product {
        id: 6,
        title: "Set Handuk Rumah",
        price: 45_000.0,
        category: Category::Home,
        ai_recommended: false,
        description: "Set handuk untuk kebutuhan rumah, mandi atau tamu.",
    },
    Product {
        id: 7,
        title: "Sarung Tangan",
        price: 35_000.0,
        category: Category::Apparel,
        ai_recommended: false,
        description: "Sarung tangan untuk riding ringan atau kerja ringan.",
    },
    Product {
        id: 8,
        title: "Sabun",
        price: 12_000.0,
        category: Category::Home,
        ai_recommended: false,
        description: "Sabun untuk kebutuhan mandi harian, praktis dan ekonomis.",
    },
    Product {
        id: 9,
        title: "Handuk",
        price: 45_000.0,
        category: Category::Home,
        ai_recommended: false,
        description: "Handuk untuk mandi dan olahraga ringan.",
    },
    Product {
        id: 10,
        title: "Lampu",
        price: 89_000.0,
        category: Category::Home,
        ai_recommended: false,
        description: "Lampu rumah untuk kamar atau ruang tamu.",
    },
];

pub fn find(id: i64) -> Option<&'static Product> {
    CATALOG.iter().find(|p| p.id == id)
}

/// Category filter matching the storefront's category chips; `None` is the
/// "All" chip.
pub fn by_category(category: Option<Category>) -> Vec<&'static Product> {
    CATALOG
        .iter()
        .filter(|p| category.map_or(true, |c| p.category == c))
        .collect()
}
