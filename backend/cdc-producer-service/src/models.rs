use serde::Serialize;

/// Source database family whose replication log is being imitated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceSystem {
    Oracle,
    Db2,
}

impl SourceSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceSystem::Oracle => "oracle",
            SourceSystem::Db2 => "db2",
        }
    }
}

/// Tables the producer synthesizes rows for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Customer,
    Order,
    Product,
    Inventory,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Customer,
        EntityKind::Order,
        EntityKind::Product,
        EntityKind::Inventory,
    ];

    pub fn system(&self) -> SourceSystem {
        match self {
            EntityKind::Customer | EntityKind::Order => SourceSystem::Oracle,
            EntityKind::Product | EntityKind::Inventory => SourceSystem::Db2,
        }
    }

    /// Upper-case table name as the source catalog reports it
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Customer => "CUSTOMERS",
            EntityKind::Order => "ORDERS",
            EntityKind::Product => "PRODUCTS",
            EntityKind::Inventory => "INVENTORY",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Customer => "customer",
            EntityKind::Order => "order",
            EntityKind::Product => "product",
            EntityKind::Inventory => "inventory",
        }
    }
}
