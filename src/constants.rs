use crate::domain::Color;

pub const COLORS: [Color; 10] = [
    Color::Green,
    Color::Blue,
    Color::Orange,
    Color::Pink,
    Color::Purple,
    Color::Cyan,
    Color::DeepOrange,
    Color::BlueGrey,
    Color::Brown,
    Color::Indigo,
];

pub const DEFAULT_CATEGORIES: [DefaultCategory; 4] = [
    DefaultCategory {
        name: "問い合わせ",
        color: Color::Green,
    },
    DefaultCategory {
        name: "予約",
        color: Color::Blue,
    },
    DefaultCategory {
        name: "クレーム",
        color: Color::Orange,
    },
    DefaultCategory {
        name: "その他",
        color: Color::BlueGrey,
    },
];

pub const STORAGE_KEYS: StorageKeys = StorageKeys {
    categories: "fc_categories",
    entries: "fc_entries",
};

pub const UNDO_SETTINGS: UndoSettings = UndoSettings { window_ms: 30_000 };

pub const EXPORT_SETTINGS: ExportSettings = ExportSettings {
    header: ["timestamp_display", "category_name", "category_id"],
    bom: '\u{FEFF}',
    timestamp_format: "%Y/%m/%d %H:%M",
    file_prefix: "front_counter_",
};

pub const DELETED_CATEGORY_LABEL: &str = "(削除済み)";

pub const MAX_BACKUPS: usize = 10;

pub struct DefaultCategory {
    pub name: &'static str,
    pub color: Color,
}

pub struct StorageKeys {
    pub categories: &'static str,
    pub entries: &'static str,
}

pub struct UndoSettings {
    pub window_ms: i64,
}

pub struct ExportSettings {
    pub header: [&'static str; 3],
    pub bom: char,
    pub timestamp_format: &'static str,
    pub file_prefix: &'static str,
}
