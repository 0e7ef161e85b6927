use pactum::{
    build::{
        ControllerTranspiler, EntityTranspiler, GatewayTranspiler, Manifest, MigrationTranspiler,
        Module, ModuleRegistry, OpenApiTranspiler, Pipeline, PipelineReport, ResolverTranspiler,
        ServiceTranspiler, core_module, module::names,
    },
    config::GenerateConfig,
    schema::{
        declare::ContractBuilder,
        node::{Field, Message, Property, Service},
        registry::MetadataRegistry,
        types::{Method, OperationKind, ProtoType},
    },
};
use proptest::prelude::*;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use tempfile::TempDir;

// ----------------------------------------------------------------------
// Fixtures
// ----------------------------------------------------------------------

fn groups() -> ContractBuilder {
    ContractBuilder::new("Groups")
        .sub_path("groups")
        .generate_controller(true)
        .generate_entities(true)
        .field(Field::new("name", ProtoType::String).unique(true))
        .field(Field::new("enabled", ProtoType::Bool).default_value(true))
        .message(Message::new("GroupReply").property(Property::new("name", "string").required(true)))
        .message(Message::new("CreateGroup").property(Property::new("name", "string").required(true)))
        .service(
            Service::new("listGroups")
                .method(Method::Get)
                .response("GroupReply"),
        )
        .service(
            Service::new("createGroup")
                .method(Method::Post)
                .request("CreateGroup")
                .response("GroupReply"),
        )
}

fn registry() -> MetadataRegistry {
    let mut reg = MetadataRegistry::new();
    groups().declare(&mut reg).unwrap();

    reg
}

fn app(optional: &[&str]) -> ModuleRegistry {
    let mut modules = ModuleRegistry::new();
    modules.register(core_module());
    for name in optional {
        modules.register(Module::new(*name));
    }
    modules.register(Module::new("app").contract("Groups"));

    modules
}

fn run(reg: &MetadataRegistry, modules: &ModuleRegistry, config: &GenerateConfig) -> PipelineReport {
    let report = Pipeline::new(reg, modules, config).run().unwrap();
    assert!(report.is_success(), "failures: {:?}", report.failures);

    report
}

fn read(path: impl AsRef<Path>) -> String {
    fs::read_to_string(path).unwrap()
}

/// Every file under `root`, keyed by relative path.
fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    fn walk(root: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                let rel = path.strip_prefix(root).unwrap().to_path_buf();
                out.insert(rel, fs::read(&path).unwrap());
            }
        }
    }

    let mut out = BTreeMap::new();
    walk(root, root, &mut out);

    out
}

// ----------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------

#[test]
fn bodyless_get_has_no_body_parameter_or_request_body() {
    let dir = TempDir::new().unwrap();
    let config = GenerateConfig::default().rooted_at(dir.path());
    run(&registry(), &app(&[names::OPENAPI]), &config);

    let controller = read(config.source_root.join("controllers/groups_controller.rs"));
    assert!(controller.contains(
        "pub fn list_groups (& self , ctx : & :: pactum :: runtime :: RequestContext) ->"
    ));
    assert!(controller.contains("pub fn create_group (& self , ctx : & :: pactum :: runtime :: RequestContext , request :"));

    let doc: serde_json::Value =
        serde_json::from_str(&read(config.output_dir.join("openapi.json"))).unwrap();
    let list = &doc["paths"]["/groups"]["get"];
    assert_eq!(list["operationId"], "Groups.listGroups");
    assert!(list.get("requestBody").is_none());
    assert!(doc["paths"]["/groups"]["post"].get("requestBody").is_some());
}

#[test]
fn graphql_absent_writes_no_resolvers() {
    let dir = TempDir::new().unwrap();
    let config = GenerateConfig::default().rooted_at(dir.path());
    let report = run(&registry(), &app(&[names::REPOSITORY]), &config);

    assert!(!config.source_root.join("resolvers").exists());
    assert!(report.written.iter().all(|p| !p.starts_with(config.source_root.join("resolvers"))));

    let manifest = Manifest::read(report.manifest.unwrap()).unwrap();
    assert!(!manifest.modules.graphql);
    assert!(manifest.modules.repository);
}

#[test]
fn graphql_forced_off_by_config() {
    let dir = TempDir::new().unwrap();
    let mut config = GenerateConfig::default().rooted_at(dir.path());
    config.modules.insert(names::GRAPHQL.to_string(), false);

    let report = run(&registry(), &app(&[names::GRAPHQL]), &config);

    assert!(!report.flags.graphql);
    assert!(!config.source_root.join("resolvers").exists());
    let value: serde_json::Value =
        serde_json::from_str(&read(config.output_dir.join("schema.json"))).unwrap();
    assert_eq!(value["modules"]["graphql"], false);
}

#[test]
fn reads_are_queries_and_writes_are_mutations() {
    let dir = TempDir::new().unwrap();
    let config = GenerateConfig::default().rooted_at(dir.path());
    run(&registry(), &app(&[names::GRAPHQL]), &config);

    let resolver = read(config.source_root.join("resolvers/groups_resolver.rs"));
    assert!(resolver.contains("extend type Query"));
    assert!(resolver.contains("extend type Mutation"));
    assert!(resolver.contains(":: pactum :: schema :: types :: OperationKind :: Query"));

    for method in [Method::Get, Method::Post, Method::Put, Method::Patch, Method::Delete] {
        let expected = if method == Method::Get {
            OperationKind::Query
        } else {
            OperationKind::Mutation
        };
        assert_eq!(OperationKind::from_method(method), expected);
    }
}

#[test]
fn every_artifact_lands_under_its_subpath() {
    let dir = TempDir::new().unwrap();
    let config = GenerateConfig::default().rooted_at(dir.path());
    let report = run(
        &registry(),
        &app(&[names::RPC, names::GRAPHQL, names::REPOSITORY]),
        &config,
    );

    for file in [
        "services/groups_service.rs",
        "controllers/groups_controller.rs",
        "gateways/groups_gateway.rs",
        "entities/groups_entity.rs",
        "resolvers/groups_resolver.rs",
        "migrations/mod.rs",
        "mod.rs",
    ] {
        assert!(config.source_root.join(file).exists(), "missing {file}");
    }

    let root = read(config.source_root.join("mod.rs"));
    assert!(root.contains("pub mod controllers ;"));
    assert!(root.contains("pub mod migrations ;"));

    let kinds: Vec<_> = report.providers.iter().map(|p| p.name.as_str()).collect();
    assert!(kinds.contains(&"GroupsController"));
    assert!(kinds.contains(&"GroupsEntity"));
}

/// Every generator, with migration names pinned to one timestamp.
fn fixed_modules(contract: &str) -> ModuleRegistry {
    let mut modules = ModuleRegistry::new();
    modules.register(
        Module::new("generators")
            .transpiler(ServiceTranspiler)
            .transpiler(ControllerTranspiler)
            .transpiler(GatewayTranspiler)
            .transpiler(EntityTranspiler)
            .transpiler(ResolverTranspiler)
            .transpiler(OpenApiTranspiler::default())
            .transpiler(MigrationTranspiler::new().with_timestamp(1_700_000_000_000)),
    );
    for name in [names::RPC, names::GRAPHQL, names::OPENAPI, names::REPOSITORY, names::CACHE] {
        modules.register(Module::new(name));
    }
    modules.register(Module::new("app").contract(contract));

    modules
}

#[test]
fn unchanged_metadata_regenerates_identical_files() {
    let reg = registry();
    let (a, b) = (TempDir::new().unwrap(), TempDir::new().unwrap());
    run(&reg, &fixed_modules("Groups"), &GenerateConfig::default().rooted_at(a.path()));
    run(&reg, &fixed_modules("Groups"), &GenerateConfig::default().rooted_at(b.path()));

    let first = snapshot(a.path());
    assert!(!first.is_empty());
    assert_eq!(first, snapshot(b.path()));

    // a second run in place changes nothing and adds no migration
    run(&reg, &fixed_modules("Groups"), &GenerateConfig::default().rooted_at(a.path()));
    assert_eq!(first, snapshot(a.path()));
}

#[test]
fn broken_contract_is_reported_and_others_generate() {
    let mut reg = registry();
    ContractBuilder::new("Places")
        .generate_entities(true)
        .field(Field::new("location", "geopoint"))
        .declare(&mut reg)
        .unwrap();

    let dir = TempDir::new().unwrap();
    let config = GenerateConfig::default().rooted_at(dir.path());
    let mut modules = app(&[names::REPOSITORY]);
    modules.register(Module::new("places").contract("Places"));

    let report = Pipeline::new(&reg, &modules, &config).run().unwrap();

    assert_eq!(report.failed_contracts().into_iter().collect::<Vec<_>>(), vec!["Places"]);
    assert!(config.source_root.join("entities/groups_entity.rs").exists());
    assert!(!config.source_root.join("entities/places_entity.rs").exists());

    let manifest = Manifest::read(report.manifest.unwrap()).unwrap();
    assert!(manifest.contracts.contains_key("Groups"));
    assert!(!manifest.contracts.contains_key("Places"));
}

fn proto_type() -> impl Strategy<Value = ProtoType> {
    prop_oneof![
        Just(ProtoType::String),
        Just(ProtoType::Bool),
        Just(ProtoType::Int32),
        Just(ProtoType::Uint64),
        Just(ProtoType::Float),
        Just(ProtoType::Date),
        Just(ProtoType::Bytes),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn generation_is_deterministic(
        fields in prop::collection::btree_map("[a-z]{3,8}", (proto_type(), any::<bool>()), 1..6),
    ) {
        let mut builder = ContractBuilder::new("Things")
            .generate_controller(true)
            .generate_entities(true)
            .message(Message::new("ThingReply").property(Property::new("id", "string")))
            .service(Service::new("listThings").method(Method::Get).response("ThingReply"));
        for (key, (ty, nullable)) in fields {
            builder = builder.field(Field::new(key, ty).nullable(nullable));
        }
        let mut reg = MetadataRegistry::new();
        prop_assume!(builder.declare(&mut reg).is_ok());

        let (a, b) = (TempDir::new().unwrap(), TempDir::new().unwrap());
        for dir in [&a, &b] {
            let config = GenerateConfig::default().rooted_at(dir.path());
            let report = Pipeline::new(&reg, &fixed_modules("Things"), &config).run().unwrap();
            prop_assert!(report.is_success(), "failures: {:?}", report.failures);
        }

        prop_assert_eq!(snapshot(a.path()), snapshot(b.path()));
    }
}
