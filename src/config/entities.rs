//! The five tables served by the API.

use super::types::{
    ColumnDef, ColumnDefault, ColumnType, EntityDef, IncludeDef, ValidationRule,
};

const CODE_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9_.\-]*$";

/// Counter columns of a sales record, in ledger order.
pub const SALES_COUNTERS: &[&str] = &[
    "initial",
    "sold",
    "returns",
    "donations",
    "reroutes_in",
    "reroutes_out",
    "recycled",
    "final",
];

pub static SKUS: EntityDef = EntityDef {
    table: "skus",
    label: "SKU",
    pk_columns: &["sku_id"],
    columns: &[
        ColumnDef::new("sku_id", ColumnType::Text),
        ColumnDef::new("name", ColumnType::Text),
        ColumnDef::new("shelf_life_days", ColumnType::Integer)
            .default(ColumnDefault::Int(0))
            .non_negative(),
        ColumnDef::new("created_at", ColumnType::Timestamptz).default(ColumnDefault::Now),
    ],
    includes: &[],
    default_order: &[("sku_id", true)],
    validation: &[
        (
            "sku_id",
            ValidationRule::new().required().max_length(64).pattern(CODE_PATTERN),
        ),
        ("name", ValidationRule::new().required().max_length(255)),
        ("shelf_life_days", ValidationRule::new().minimum(0.0)),
    ],
};

pub static STORES: EntityDef = EntityDef {
    table: "stores",
    label: "Store",
    pk_columns: &["store_id"],
    columns: &[
        ColumnDef::new("store_id", ColumnType::Text),
        ColumnDef::new("geo", ColumnType::Text),
        ColumnDef::new("religion", ColumnType::Text).nullable(),
        ColumnDef::new("created_at", ColumnType::Timestamptz).default(ColumnDefault::Now),
    ],
    includes: &[],
    default_order: &[("store_id", true)],
    validation: &[
        (
            "store_id",
            ValidationRule::new().required().max_length(64).pattern(CODE_PATTERN),
        ),
        ("geo", ValidationRule::new().required().max_length(255)),
        ("religion", ValidationRule::new().max_length(255)),
    ],
};

pub static STORE_SKUS: EntityDef = EntityDef {
    table: "store_skus",
    label: "Store-SKU relationship",
    pk_columns: &["store_id", "sku_id"],
    columns: &[
        ColumnDef::new("store_id", ColumnType::Text).references("stores", "store_id"),
        ColumnDef::new("sku_id", ColumnType::Text).references("skus", "sku_id"),
        ColumnDef::new("created_at", ColumnType::Timestamptz).default(ColumnDefault::Now),
    ],
    includes: &[
        IncludeDef {
            related: &STORES,
            our_key: "store_id",
            their_key: "store_id",
        },
        IncludeDef {
            related: &SKUS,
            our_key: "sku_id",
            their_key: "sku_id",
        },
    ],
    default_order: &[("store_id", true), ("sku_id", true)],
    validation: &[
        ("store_id", ValidationRule::new().required()),
        ("sku_id", ValidationRule::new().required()),
    ],
};

const COUNTER_RULE: ValidationRule = ValidationRule::new().minimum(0.0);

pub static SALES_DATA: EntityDef = EntityDef {
    table: "sales_data",
    label: "Sales data",
    pk_columns: &["store_id", "sku_id", "year", "day"],
    columns: &[
        ColumnDef::new("store_id", ColumnType::Text).references("stores", "store_id"),
        ColumnDef::new("sku_id", ColumnType::Text).references("skus", "sku_id"),
        ColumnDef::new("year", ColumnType::Integer),
        ColumnDef::new("day", ColumnType::Integer),
        ColumnDef::new("date", ColumnType::Date),
        ColumnDef::new("type_of_day", ColumnType::Text).nullable(),
        ColumnDef::new("initial", ColumnType::Integer).default(ColumnDefault::Int(0)).non_negative(),
        ColumnDef::new("sold", ColumnType::Integer).default(ColumnDefault::Int(0)).non_negative(),
        ColumnDef::new("returns", ColumnType::Integer).default(ColumnDefault::Int(0)).non_negative(),
        ColumnDef::new("donations", ColumnType::Integer).default(ColumnDefault::Int(0)).non_negative(),
        ColumnDef::new("reroutes_in", ColumnType::Integer).default(ColumnDefault::Int(0)).non_negative(),
        ColumnDef::new("reroutes_out", ColumnType::Integer).default(ColumnDefault::Int(0)).non_negative(),
        ColumnDef::new("recycled", ColumnType::Integer).default(ColumnDefault::Int(0)).non_negative(),
        ColumnDef::new("final", ColumnType::Integer).default(ColumnDefault::Int(0)).non_negative(),
        ColumnDef::new("created_at", ColumnType::Timestamptz).default(ColumnDefault::Now),
    ],
    includes: &[
        IncludeDef {
            related: &STORES,
            our_key: "store_id",
            their_key: "store_id",
        },
        IncludeDef {
            related: &SKUS,
            our_key: "sku_id",
            their_key: "sku_id",
        },
    ],
    default_order: &[
        ("date", false),
        ("store_id", true),
        ("sku_id", true),
        ("year", true),
        ("day", true),
    ],
    validation: &[
        ("store_id", ValidationRule::new().required()),
        ("sku_id", ValidationRule::new().required()),
        ("year", ValidationRule::new().required().minimum(1.0)),
        ("day", ValidationRule::new().required().minimum(1.0)),
        ("date", ValidationRule::new().required().format("date")),
        ("type_of_day", ValidationRule::new().max_length(32)),
        ("initial", COUNTER_RULE),
        ("sold", COUNTER_RULE),
        ("returns", COUNTER_RULE),
        ("donations", COUNTER_RULE),
        ("reroutes_in", COUNTER_RULE),
        ("reroutes_out", COUNTER_RULE),
        ("recycled", COUNTER_RULE),
        ("final", COUNTER_RULE),
    ],
};

pub static PROFILES: EntityDef = EntityDef {
    table: "profiles",
    label: "User",
    pk_columns: &["id"],
    columns: &[
        ColumnDef::new("id", ColumnType::Uuid).default(ColumnDefault::RandomUuid),
        ColumnDef::new("email", ColumnType::Text).unique(),
        ColumnDef::new("username", ColumnType::Text).nullable().unique(),
        ColumnDef::new("full_name", ColumnType::Text).nullable(),
        ColumnDef::new("role", ColumnType::Text).default(ColumnDefault::Text("user")),
        ColumnDef::new("is_active", ColumnType::Boolean).default(ColumnDefault::Bool(true)),
        ColumnDef::new("created_at", ColumnType::Timestamptz).default(ColumnDefault::Now),
    ],
    includes: &[],
    default_order: &[("created_at", false), ("id", true)],
    validation: &[
        ("id", ValidationRule::new().format("uuid")),
        ("email", ValidationRule::new().required().format("email").max_length(320)),
        ("username", ValidationRule::new().max_length(64).pattern(CODE_PATTERN)),
        ("full_name", ValidationRule::new().max_length(255)),
        ("role", ValidationRule::new().allowed(&["user", "admin"])),
    ],
};

/// Every table, parents before children (DDL order).
pub static ALL_ENTITIES: &[&EntityDef] = &[&SKUS, &STORES, &STORE_SKUS, &SALES_DATA, &PROFILES];
