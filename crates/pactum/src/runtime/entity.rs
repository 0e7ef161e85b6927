use derive_more::Display;

///
/// Backend
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Backend {
    #[display("document")]
    Document,

    #[display("relational")]
    Relational,
}

///
/// ColumnDef
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub column_type: &'static str,
    pub nullable: bool,
    pub unique: bool,
    pub array: bool,
    pub primary: bool,
}

///
/// RelationDef
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RelationDef {
    /// Column holding the reference.
    pub field: &'static str,

    /// Generated entity type of the target.
    pub target: &'static str,
    pub target_contract: &'static str,
    pub target_field: &'static str,
    pub array: bool,
    pub create_relationship: bool,
}

///
/// EntityIndex
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EntityIndex {
    pub name: &'static str,
    pub fields: &'static [&'static str],
    pub unique: bool,
}

///
/// EntitySchema
///
/// Storage shape of a generated entity, as constants a repository driver
/// can read without touching contract metadata.
///

pub trait EntitySchema {
    const CONTRACT: &'static str;
    const TABLE: &'static str;
    const BACKEND: Backend;
    const COLUMNS: &'static [ColumnDef];
    const RELATIONS: &'static [RelationDef];
    const INDEXES: &'static [EntityIndex];

    #[must_use]
    fn column(name: &str) -> Option<&'static ColumnDef> {
        Self::COLUMNS.iter().find(|c| c.name == name)
    }

    #[must_use]
    fn primary_key() -> Option<&'static ColumnDef> {
        Self::COLUMNS.iter().find(|c| c.primary)
    }

    #[must_use]
    fn relation(field: &str) -> Option<&'static RelationDef> {
        Self::RELATIONS.iter().find(|r| r.field == field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Groups;

    impl EntitySchema for Groups {
        const CONTRACT: &'static str = "Groups";
        const TABLE: &'static str = "groups";
        const BACKEND: Backend = Backend::Relational;
        const COLUMNS: &'static [ColumnDef] = &[
            ColumnDef {
                name: "id",
                column_type: "uuid",
                nullable: false,
                unique: true,
                array: false,
                primary: true,
            },
            ColumnDef {
                name: "role",
                column_type: "varchar",
                nullable: true,
                unique: false,
                array: false,
                primary: false,
            },
        ];
        const RELATIONS: &'static [RelationDef] = &[RelationDef {
            field: "role",
            target: "RolesEntity",
            target_contract: "Roles",
            target_field: "id",
            array: false,
            create_relationship: false,
        }];
        const INDEXES: &'static [EntityIndex] = &[];
    }

    #[test]
    fn lookups() {
        assert_eq!(Groups::primary_key().map(|c| c.name), Some("id"));
        assert_eq!(Groups::column("role").map(|c| c.nullable), Some(true));
        assert_eq!(Groups::relation("role").map(|r| r.target), Some("RolesEntity"));
        assert_eq!(Groups::BACKEND.to_string(), "relational");
    }
}
