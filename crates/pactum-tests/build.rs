//! Runs the generator over the fixture contracts so the crate compiles and
//! tests the real output.

use pactum::{
    build::{Module, ModuleRegistry, Pipeline, core_module},
    config::GenerateConfig,
    schema::{
        declare::ContractBuilder,
        node::{Field, Message, Property, Service, Validation, ValidationRule},
        registry::MetadataRegistry,
        types::{Method, ProtoType},
    },
};
use std::{env::var, error::Error, fs, path::PathBuf};

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = PathBuf::from(var("OUT_DIR")?);
    let config = GenerateConfig::default().rooted_at(&out_dir);

    let mut registry = MetadataRegistry::new();
    groups().declare(&mut registry)?;
    profiles().declare(&mut registry)?;

    let mut modules = ModuleRegistry::new();
    modules.register(core_module());
    modules.register(Module::new("fixtures").contracts(["Groups", "Profiles"]));

    let report = Pipeline::new(&registry, &modules, &config).run()?;
    if !report.is_success() {
        return Err(format!("generation failed: {:?}", report.failures).into());
    }

    // mounted at crate::generated, where the generated files expect to live
    let root = config.source_root.join("mod.rs").display().to_string();
    let include = format!(
        "#[path = {root:?}]\n#[allow(clippy::pedantic, clippy::nursery)]\npub mod generated;\n"
    );
    fs::write(out_dir.join("generated.rs"), include)?;

    Ok(())
}

// ----------------------------------------------------------------------
// Fixtures
// ----------------------------------------------------------------------

/// REST surface with a literal route beside a `:id` route.
fn groups() -> ContractBuilder {
    ContractBuilder::new("Groups")
        .sub_path("groups")
        .generate_controller(true)
        .field(Field::new("name", ProtoType::String).validation(ValidationRule::NotEmpty.into()))
        .message(
            Message::new("GroupReply")
                .property(Property::new("id", "string").required(true))
                .property(Property::new("name", "string").required(true)),
        )
        .message(Message::new("CreateGroup").property(Property::new("name", "string").required(true)))
        .service(Service::new("listGroups").response("GroupReply"))
        .service(Service::new("mineGroup").path("/mine").response("GroupReply"))
        .service(Service::new("getGroup").path("/:id").response("GroupReply"))
        .service(
            Service::new("createGroup")
                .method(Method::Post)
                .request("CreateGroup")
                .response("GroupReply"),
        )
        .service(Service::new("deleteGroup").path("/:id").method(Method::Delete))
}

/// Every validation rule on every field shape it accepts.
fn profiles() -> ContractBuilder {
    let text = |key: &str| {
        Field::new(key, ProtoType::String)
            .validation(ValidationRule::NotEmpty.into())
            .validation(ValidationRule::MinLength(3).into())
            .validation(ValidationRule::MaxLength(5).into())
            .validation(
                Validation::new(ValidationRule::OneOf(vec![
                    "ann".to_string(),
                    "bob".to_string(),
                    "carol".to_string(),
                ]))
                .message("unknown handle"),
            )
    };
    let number = |key: &str, ty: ProtoType| {
        Field::new(key, ty)
            .validation(ValidationRule::Min(1.0).into())
            .validation(ValidationRule::Max(5.0).into())
    };

    ContractBuilder::new("Profiles")
        .field(text("handle"))
        .field(text("nickname").nullable(true))
        .field(text("tags").repeated(true))
        .field(text("labels").repeated(true).nullable(true))
        .field(number("age", ProtoType::Int32))
        .field(number("score", ProtoType::Double).nullable(true))
        .field(
            number("levels", ProtoType::Uint32)
                .repeated(true)
                .validation(ValidationRule::MaxLength(3).into()),
        )
        .field(number("ratios", ProtoType::Float).repeated(true).nullable(true))
        .field(Field::new("avatar", ProtoType::Bytes).validation(ValidationRule::MaxLength(4).into()))
        .message(
            Message::new("ProfileRequest")
                .property(Property::new("handle", "string").required(true))
                .property(Property::new("nickname", "string")),
        )
        .service(
            Service::new("saveProfile")
                .method(Method::Put)
                .request("ProfileRequest"),
        )
}
