//! Division catalog. Compiled in, never persisted.

use serde::Serialize;

/// A fixed organizational category that scopes a team roster.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Division {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub track_theme: &'static str,
}

const fn division(
    id: &'static str,
    name: &'static str,
    icon: &'static str,
    color: &'static str,
    track_theme: &'static str,
) -> Division {
    Division {
        id,
        name,
        icon,
        color,
        track_theme,
    }
}

pub static DIVISIONS: [Division; 10] = [
    division("sales-project", "Sales Project", "🎯", "from-orange-500 to-red-500", "city"),
    division("sales-distribusi", "Sales Distribusi", "🚚", "from-blue-500 to-indigo-500", "highway"),
    division("marketing", "Marketing", "📢", "from-pink-500 to-purple-500", "neon"),
    division("hr", "HR", "👥", "from-green-500 to-teal-500", "forest"),
    division("operasional", "Operasional", "⚙️", "from-gray-500 to-slate-500", "industrial"),
    division("finance", "Finance", "💰", "from-yellow-500 to-orange-500", "gold"),
    division("teknisi", "Teknisi", "🔧", "from-cyan-500 to-blue-500", "tech"),
    division("logistik", "Logistik", "📦", "from-brown-500 to-orange-500", "warehouse"),
    division("marketplace", "Marketplace", "🛒", "from-violet-500 to-purple-500", "digital"),
    division("umum", "Umum", "🏢", "from-slate-500 to-gray-500", "office"),
];

/// Look up a division by its slug.
pub fn find_division(id: &str) -> Option<&'static Division> {
    DIVISIONS.iter().find(|division| division.id == id)
}
