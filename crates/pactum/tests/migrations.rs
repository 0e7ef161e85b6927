use pactum::{
    build::{
        Manifest, MigrationTranspiler, Module, ModuleRegistry, Pipeline,
        migrate::{ChangeKind, plan},
        module::names,
    },
    config::{GenerateConfig, RepositoryBackend},
    schema::{
        declare::ContractBuilder,
        migration::{Column, MigrationOp},
        node::{Contract, ContractHeader, Field},
        registry::MetadataRegistry,
        types::ProtoType,
    },
};
use std::{fs, path::PathBuf};
use tempfile::TempDir;

const RELATIONAL: RepositoryBackend = RepositoryBackend::Relational;

fn groups(fields: Vec<Field>) -> Contract {
    Contract {
        header: ContractHeader {
            generate_entities: true,
            ..ContractHeader::new("Groups")
        },
        fields,
        ..Contract::default()
    }
}

fn column(name: &str, column_type: &str) -> Column {
    Column {
        name: name.to_string(),
        column_type: column_type.to_string(),
        nullable: false,
        unique: false,
        array: false,
        default: None,
        references: None,
    }
}

#[test]
fn dropping_a_field_drops_its_column_and_down_adds_it_back() {
    let prev = groups(vec![
        Field::new("name", ProtoType::String),
        Field::new("roles", ProtoType::String).repeated(true),
    ]);
    let cur = groups(vec![Field::new("name", ProtoType::String)]);

    let plan = plan(Some(&prev), Some(&cur), RELATIONAL).unwrap().unwrap();
    let roles = Column {
        array: true,
        ..column("roles", "varchar")
    };

    assert_eq!(plan.kind, ChangeKind::Changed);
    assert_eq!(
        plan.up,
        vec![MigrationOp::DropColumn {
            table: "groups".to_string(),
            column: roles.clone(),
        }]
    );
    assert_eq!(
        plan.down,
        vec![MigrationOp::AddColumn {
            table: "groups".to_string(),
            column: roles,
        }]
    );
    assert!(plan.data_loss_possible);
}

#[test]
fn new_contract_creates_its_table() {
    let cur = groups(vec![
        Field::new("name", ProtoType::String).unique(true),
        Field::new("enabled", ProtoType::Bool).default_value(true),
    ]);

    let plan = plan(None, Some(&cur), RELATIONAL).unwrap().unwrap();
    let columns = vec![
        Column {
            unique: true,
            ..column("id", "uuid")
        },
        Column {
            unique: true,
            ..column("name", "varchar")
        },
        Column {
            default: Some("true".to_string()),
            ..column("enabled", "boolean")
        },
    ];

    assert_eq!(plan.kind, ChangeKind::New);
    assert_eq!(
        plan.up,
        vec![MigrationOp::CreateTable {
            table: "groups".to_string(),
            columns: columns.clone(),
            indexes: vec![],
        }]
    );
    assert_eq!(
        plan.down,
        vec![MigrationOp::DropTable {
            table: "groups".to_string(),
            columns,
            indexes: vec![],
        }]
    );
    assert!(!plan.data_loss_possible);
}

#[test]
fn removing_unique_is_reversible() {
    let prev = groups(vec![Field::new("name", ProtoType::String).unique(true)]);
    let cur = groups(vec![Field::new("name", ProtoType::String)]);

    let plan = plan(Some(&prev), Some(&cur), RELATIONAL).unwrap().unwrap();
    let [MigrationOp::AlterColumn { from, to, .. }] = plan.up.as_slice() else {
        panic!("expected one alter, got {:?}", plan.up);
    };
    assert!(from.unique);
    assert!(!to.unique);

    let [MigrationOp::AlterColumn { from, to, .. }] = plan.down.as_slice() else {
        panic!("expected one alter, got {:?}", plan.down);
    };
    assert!(!from.unique);
    assert!(to.unique);
}

#[test]
fn custom_type_fails_only_that_migration() {
    let cur = groups(vec![Field::new("location", "geopoint")]);

    let err = plan(None, Some(&cur), RELATIONAL).unwrap_err();
    assert!(err.to_string().contains("geopoint"));
}

// ----------------------------------------------------------------------
// Through the pipeline
// ----------------------------------------------------------------------

fn migration_files(dir: &std::path::Path) -> Vec<PathBuf> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.file_name().is_some_and(|n| n != "mod.rs"))
        .collect();
    files.sort();

    files
}

fn run(reg: &MetadataRegistry, config: &GenerateConfig, timestamp: u64) {
    let mut modules = ModuleRegistry::new();
    modules.register(
        Module::new("generators").transpiler(MigrationTranspiler::new().with_timestamp(timestamp)),
    );
    modules.register(Module::new(names::REPOSITORY));
    modules.register(Module::new("app").contract("Groups"));

    let report = Pipeline::new(reg, &modules, config).run().unwrap();
    assert!(report.is_success(), "failures: {:?}", report.failures);
}

#[test]
fn versions_produce_ordered_migration_files() {
    let dir = TempDir::new().unwrap();
    let config = GenerateConfig::default().rooted_at(dir.path());

    let mut v1 = MetadataRegistry::new();
    ContractBuilder::new("Groups")
        .generate_entities(true)
        .field(Field::new("name", ProtoType::String))
        .field(Field::new("roles", ProtoType::String).repeated(true))
        .declare(&mut v1)
        .unwrap();
    run(&v1, &config, 1_000);

    let mut v2 = MetadataRegistry::new();
    ContractBuilder::new("Groups")
        .generate_entities(true)
        .field(Field::new("name", ProtoType::String))
        .declare(&mut v2)
        .unwrap();
    run(&v2, &config, 2_000);

    // unchanged: nothing new
    run(&v2, &config, 3_000);

    let dir = config.migrations_dir();
    let files = migration_files(&dir);
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["1000_groups.rs", "2000_groups.rs"]);

    let second = fs::read_to_string(&files[1]).unwrap();
    assert!(second.contains("// Groups: changed (table groups)"));
    assert!(second.contains("//   drop column groups.roles"));
    assert!(second.contains("//   add column groups.roles varchar[] NOT NULL"));
    assert!(second.contains("// WARNING: this migration may lose data"));

    let index = fs::read_to_string(dir.join("mod.rs")).unwrap();
    assert!(index.contains("# [path = \"1000_groups.rs\"]"));
    assert!(index.contains("# [path = \"2000_groups.rs\"]"));

    let manifest = Manifest::read(config.output_dir.join("schema.json")).unwrap();
    assert_eq!(manifest.contracts["Groups"].fields.len(), 1);
}

#[test]
fn colliding_timestamps_get_distinct_names() {
    let dir = TempDir::new().unwrap();
    let config = GenerateConfig::default().rooted_at(dir.path());

    let mut v1 = MetadataRegistry::new();
    ContractBuilder::new("Groups")
        .generate_entities(true)
        .field(Field::new("name", ProtoType::String))
        .declare(&mut v1)
        .unwrap();
    run(&v1, &config, 5_000);

    let mut v2 = MetadataRegistry::new();
    ContractBuilder::new("Groups")
        .generate_entities(true)
        .field(Field::new("name", ProtoType::String))
        .field(Field::new("enabled", ProtoType::Bool))
        .declare(&mut v2)
        .unwrap();
    run(&v2, &config, 5_000);

    let files = migration_files(&config.migrations_dir());
    assert_eq!(files.len(), 2);
    assert!(files[1].ends_with("5001_groups.rs"));
}

#[test]
fn dropped_contract_gets_a_drop_table_migration() {
    let dir = TempDir::new().unwrap();
    let config = GenerateConfig::default().rooted_at(dir.path());

    let mut v1 = MetadataRegistry::new();
    ContractBuilder::new("Groups")
        .generate_entities(true)
        .field(Field::new("name", ProtoType::String))
        .declare(&mut v1)
        .unwrap();
    run(&v1, &config, 1_000);

    let mut modules = ModuleRegistry::new();
    modules.register(
        Module::new("generators").transpiler(MigrationTranspiler::new().with_timestamp(2_000)),
    );
    modules.register(Module::new(names::REPOSITORY));
    let report = Pipeline::new(&MetadataRegistry::new(), &modules, &config)
        .run()
        .unwrap();
    assert!(report.is_success());

    let files = migration_files(&config.migrations_dir());
    let removed = fs::read_to_string(&files[1]).unwrap();
    assert!(removed.contains("// Groups: removed (table groups)"));
    assert!(removed.contains("//   drop table groups"));

    let manifest = Manifest::read(config.output_dir.join("schema.json")).unwrap();
    assert!(manifest.contracts.is_empty());
}
