use pactum::{
    build::{Manifest, ManifestWriter, ModuleFlags},
    schema::{
        declare::{ContractBuilder, DeclareError},
        node::{Field, Message, Property, Service},
        registry::{Metadata, MetadataRegistry, RegisterMode, Target},
        types::{Method, ProtoType},
    },
};
use proptest::prelude::*;
use tempfile::TempDir;

#[test]
fn second_contract_with_the_same_name_fails_fast() {
    let mut reg = MetadataRegistry::new();
    ContractBuilder::new("Groups")
        .field(Field::new("name", ProtoType::String))
        .declare(&mut reg)
        .unwrap();

    let err = ContractBuilder::new("Groups")
        .namespace("admin")
        .field(Field::new("title", ProtoType::String))
        .declare(&mut reg)
        .unwrap_err();

    assert!(matches!(err, DeclareError::DuplicateContract { ref contract, .. } if contract == "Groups"));
    let groups = reg.contract("Groups").unwrap();
    assert_eq!(groups.fields.len(), 1);
    assert_eq!(groups.fields[0].property_key, "name");
}

#[test]
fn re_registering_a_field_merges_or_replaces() {
    let mut reg = MetadataRegistry::new();
    ContractBuilder::new("Groups")
        .field(Field::new("name", ProtoType::String))
        .declare(&mut reg)
        .unwrap();
    let target = Target::contract("Groups");

    reg.register(
        &target,
        Metadata::Field(Field::new("name", ProtoType::String).unique(true)),
        RegisterMode::Merge,
    );
    let fields = &reg.get(&target).fields;
    assert_eq!(fields.len(), 1);
    assert!(fields[0].unique);

    reg.register(
        &target,
        Metadata::Field(Field::new("name", ProtoType::Int32)),
        RegisterMode::Override,
    );
    let fields = &reg.get(&target).fields;
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].proto_type, ProtoType::Int32);
    assert!(!fields[0].unique);
}

#[test]
fn unregistered_targets_read_as_empty() {
    let reg = MetadataRegistry::new();
    let meta = reg.get(&Target::member("Nowhere", "list"));

    assert!(meta.contract.is_none());
    assert!(meta.fields.is_empty());
}

#[test]
fn declared_contract_survives_the_manifest() {
    let mut reg = MetadataRegistry::new();
    ContractBuilder::new("Groups")
        .auth(true)
        .generate_controller(true)
        .field(Field::new("name", ProtoType::String).unique(true))
        .field(Field::new("roles", ProtoType::String).repeated(true))
        .message(Message::new("GroupReply").property(Property::new("name", "string")))
        .service(Service::new("listGroups").method(Method::Get).response("GroupReply"))
        .service(Service::new("removeGroup").method(Method::Delete).root_only(true))
        .declare(&mut reg)
        .unwrap();
    let contracts = reg.contracts();

    let dir = TempDir::new().unwrap();
    let writer = ManifestWriter::new(dir.path(), "schema");
    writer.write(&contracts, ModuleFlags::default()).unwrap();

    for path in [writer.json_path(), writer.yaml_path()] {
        let manifest = Manifest::read(&path).unwrap();
        let groups = &manifest.contracts["Groups"];

        assert_eq!(groups, &contracts[0]);
        let services: Vec<_> = groups.services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(services, vec!["listGroups", "removeGroup"]);
        assert!(groups.header.auth);
        assert!(groups.services[1].root_only);
    }
}

// ----------------------------------------------------------------------
// Properties
// ----------------------------------------------------------------------

fn proto_type() -> impl Strategy<Value = ProtoType> {
    prop_oneof![
        Just(ProtoType::String),
        Just(ProtoType::Bool),
        Just(ProtoType::Int32),
        Just(ProtoType::Int64),
        Just(ProtoType::Double),
        Just(ProtoType::Timestamp),
        Just(ProtoType::Json),
    ]
}

fn field() -> impl Strategy<Value = Field> {
    ("[a-z][a-zA-Z]{2,10}", proto_type(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(key, ty, nullable, unique, repeated)| {
            Field::new(key, ty)
                .nullable(nullable)
                .unique(unique)
                .repeated(repeated)
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn manifest_round_trip_keeps_order_and_flags(fields in prop::collection::vec(field(), 0..8)) {
        let mut reg = MetadataRegistry::new();
        let mut builder = ContractBuilder::new("Groups").generate_entities(true);
        for field in fields {
            builder = builder.field(field);
        }
        prop_assume!(builder.declare(&mut reg).is_ok());
        let contracts = reg.contracts();

        let dir = TempDir::new().unwrap();
        let writer = ManifestWriter::new(dir.path(), "schema");
        writer.write(&contracts, ModuleFlags::default()).unwrap();

        let json = Manifest::read(writer.json_path()).unwrap();
        let yaml = Manifest::read(writer.yaml_path()).unwrap();
        prop_assert_eq!(&json.contracts["Groups"], &contracts[0]);
        prop_assert_eq!(json, yaml);
    }
}
