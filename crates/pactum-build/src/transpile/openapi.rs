//! OpenAPI document generation.
//!
//! Emitted only when the openapi module is present, as
//! `<output_dir>/openapi.json`. Schemas are keyed `<Contract>.<Message>`;
//! paths use `{param}` placeholders in place of `:param` segments.

use crate::transpile::{TranspileContext, TranspileError, Transpiler, naming};
use pactum_schema::{
    node::{Contract, Message, ParamType, Property},
    types::ProtoType,
};
use serde_json::{Map, Value, json};

/// File name of the generated document inside the output directory.
pub const OPENAPI_FILE: &str = "openapi.json";

const SECURITY_SCHEME: &str = "bearerAuth";

///
/// OpenApiTranspiler
///

#[derive(Clone, Debug)]
pub struct OpenApiTranspiler {
    title: String,
    version: String,
}

impl OpenApiTranspiler {
    #[must_use]
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
        }
    }
}

impl Default for OpenApiTranspiler {
    fn default() -> Self {
        Self::new("pactum", "0.0.0")
    }
}

impl Transpiler for OpenApiTranspiler {
    fn name(&self) -> &'static str {
        "openapi"
    }

    fn run(&self, ctx: &mut TranspileContext<'_>) -> Result<(), TranspileError> {
        if !ctx.flags().openapi {
            return Ok(());
        }

        let mut schemas = Map::new();
        let mut paths = Map::new();
        let mut secured = false;

        ctx.each_contract(self.name(), |_| true, |_, contract| {
            // build per contract first so a failure leaves nothing behind
            let (contract_schemas, contract_paths, contract_secured) = document(contract)?;

            schemas.extend(contract_schemas);
            for (route, operations) in contract_paths {
                let Value::Object(operations) = operations else {
                    continue;
                };
                if let Value::Object(existing) =
                    paths.entry(route).or_insert_with(|| Value::Object(Map::new()))
                {
                    existing.extend(operations);
                }
            }
            secured |= contract_secured;

            Ok(())
        });

        let mut components = Map::new();
        components.insert("schemas".to_string(), Value::Object(schemas));
        if secured {
            components.insert(
                "securitySchemes".to_string(),
                json!({ SECURITY_SCHEME: { "type": "http", "scheme": "bearer", "bearerFormat": "JWT" } }),
            );
        }

        let doc = json!({
            "openapi": "3.0.3",
            "info": { "title": self.title, "version": self.version },
            "paths": paths,
            "components": components,
        });

        let path = ctx.config().output_dir.join(OPENAPI_FILE);
        let text = serde_json::to_string_pretty(&doc)?;
        ctx.write_file(&path, &format!("{text}\n"))
    }
}

/// Schemas, path items, and whether any operation is secured, for one
/// contract.
pub fn document(
    contract: &Contract,
) -> Result<(Map<String, Value>, Map<String, Value>, bool), TranspileError> {
    let mut schemas = Map::new();
    for message in &contract.messages {
        schemas.insert(schema_name(contract, &message.name), message_schema(contract, message)?);
    }

    let mut paths = Map::new();
    let mut secured = false;
    for service in &contract.services {
        let request = naming::service_message(contract, service, &service.request)?;
        let response = naming::service_message(contract, service, &service.response)?;
        let auth = contract.header.auth || service.auth;
        secured |= auth;

        let mut operation = Map::new();
        operation.insert(
            "operationId".to_string(),
            json!(naming::operation_name(contract, service)),
        );
        operation.insert("tags".to_string(), json!([contract.name()]));

        if let Some(message) = request {
            let params = parameters(contract, message, service.method.is_read())?;
            if !params.is_empty() {
                operation.insert("parameters".to_string(), Value::Array(params));
            }
            if !service.method.is_read() {
                operation.insert(
                    "requestBody".to_string(),
                    json!({
                        "required": true,
                        "content": {
                            "application/json": { "schema": reference(contract, &message.name) }
                        }
                    }),
                );
            }
        }

        let responses = match response {
            Some(message) => json!({
                "200": {
                    "description": "OK",
                    "content": {
                        "application/json": { "schema": reference(contract, &message.name) }
                    }
                }
            }),
            None => json!({ "204": { "description": "No Content" } }),
        };
        operation.insert("responses".to_string(), responses);

        if auth {
            operation.insert("security".to_string(), json!([{ SECURITY_SCHEME: [] }]));
        }

        let route = openapi_path(&naming::route_path(contract, service));
        let method = service.method.as_str().to_ascii_lowercase();
        if let Value::Object(item) = paths.entry(route).or_insert_with(|| Value::Object(Map::new())) {
            item.insert(method, Value::Object(operation));
        }
    }

    Ok((schemas, paths, secured))
}

/// `/groups/:id` -> `/groups/{id}`.
#[must_use]
pub fn openapi_path(route: &str) -> String {
    route
        .split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(param) => format!("{{{param}}}"),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn schema_name(contract: &Contract, message: &str) -> String {
    format!("{}.{message}", contract.name())
}

fn reference(contract: &Contract, message: &str) -> Value {
    json!({ "$ref": format!("#/components/schemas/{}", schema_name(contract, message)) })
}

fn message_schema(contract: &Contract, message: &Message) -> Result<Value, TranspileError> {
    let mut properties = Map::new();
    for property in &message.properties {
        properties.insert(property.name.clone(), property_schema(contract, message, property)?);
    }

    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));

    let required: Vec<_> = message.required().collect();
    if !required.is_empty() {
        schema.insert("required".to_string(), json!(required));
    }

    Ok(Value::Object(schema))
}

fn property_schema(
    contract: &Contract,
    message: &Message,
    property: &Property,
) -> Result<Value, TranspileError> {
    let mut schema = if property.is_array() {
        let item = property.array_type.as_deref().unwrap_or_default();
        json!({ "type": "array", "items": type_schema(contract, message, property, item)? })
    } else {
        type_schema(contract, message, property, &property.ty)?
    };

    if let (Some(default), Value::Object(map)) = (&property.default, &mut schema) {
        map.insert("default".to_string(), default.clone());
    }

    Ok(schema)
}

fn type_schema(
    contract: &Contract,
    message: &Message,
    property: &Property,
    ty: &str,
) -> Result<Value, TranspileError> {
    let schema = match ProtoType::from(ty) {
        ProtoType::Any | ProtoType::Json => json!({ "type": "object" }),
        ProtoType::Bool => json!({ "type": "boolean" }),
        ProtoType::Bytes => json!({ "type": "string", "format": "byte" }),
        ProtoType::Date => json!({ "type": "string", "format": "date" }),
        ProtoType::Double => json!({ "type": "number", "format": "double" }),
        ProtoType::Enum | ProtoType::String => json!({ "type": "string" }),
        ProtoType::Float => json!({ "type": "number", "format": "float" }),
        ProtoType::Int32 => json!({ "type": "integer", "format": "int32" }),
        ProtoType::Int64 | ProtoType::Timestamp => json!({ "type": "integer", "format": "int64" }),
        ProtoType::Uint32 => json!({ "type": "integer", "format": "int32", "minimum": 0 }),
        ProtoType::Uint64 => json!({ "type": "integer", "format": "int64", "minimum": 0 }),
        ProtoType::Custom(_) => match contract.get_message(ty) {
            Some(nested) => reference(contract, &nested.name),
            None => {
                return Err(TranspileError::UnresolvedType {
                    message: message.name.clone(),
                    property: property.name.clone(),
                    ty: ty.to_string(),
                });
            }
        },
    };

    Ok(schema)
}

/// Path and query parameters of a request. Reads carry no body, so their
/// body properties move to the query string.
fn parameters(
    contract: &Contract,
    message: &Message,
    read: bool,
) -> Result<Vec<Value>, TranspileError> {
    let mut params = Vec::new();

    for property in &message.properties {
        let location = match property.param_type {
            Some(ParamType::Path) => ParamType::Path,
            Some(ParamType::Query) => ParamType::Query,
            Some(ParamType::Body) | None if read => ParamType::Query,
            Some(ParamType::Body) | None => continue,
        };

        params.push(json!({
            "name": property.name,
            "in": location.as_str(),
            "required": location == ParamType::Path || property.required,
            "schema": property_schema(contract, message, property)?,
        }));
    }

    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pactum_schema::{
        node::{ContractHeader, Service},
        types::Method,
    };

    fn groups() -> Contract {
        Contract {
            header: ContractHeader::new("Groups"),
            messages: vec![
                Message::new("GroupRequest")
                    .property(
                        Property::new("id", "string")
                            .required(true)
                            .param_type(ParamType::Path),
                    )
                    .property(Property::new("name", "string").required(true))
                    .property(Property::new("note", "string")),
                Message::new("GroupReply").property(Property::array_of("roles", "string")),
                Message::new("GroupFilter")
                    .property(Property::new("name", "string").required(true))
                    .property(Property::new("note", "string")),
            ],
            services: vec![
                Service::new("getGroup").path("/groups/:id").response("GroupReply"),
                Service::new("searchGroups")
                    .path("/groups")
                    .request("GroupFilter")
                    .response("GroupReply"),
                Service::new("updateGroup")
                    .path("/groups/:id")
                    .method(Method::Put)
                    .request("GroupRequest")
                    .auth(true),
            ],
            ..Contract::default()
        }
    }

    #[test]
    fn required_lists_only_required_properties() {
        let (schemas, _, _) = document(&groups()).unwrap();

        assert_eq!(schemas["Groups.GroupRequest"]["required"], json!(["id", "name"]));
        assert!(schemas["Groups.GroupReply"].get("required").is_none());
        assert_eq!(
            schemas["Groups.GroupReply"]["properties"]["roles"],
            json!({ "type": "array", "items": { "type": "string" } })
        );
    }

    #[test]
    fn bodiless_get_has_no_request_body() {
        let (_, paths, secured) = document(&groups()).unwrap();
        let item = &paths["/groups/{id}"];

        assert!(item["get"].get("requestBody").is_none());
        assert_eq!(
            item["get"]["responses"]["200"]["content"]["application/json"]["schema"]["$ref"],
            "#/components/schemas/Groups.GroupReply"
        );

        let put = &item["put"];
        assert_eq!(put["operationId"], "Groups.updateGroup");
        assert_eq!(put["parameters"][0]["in"], "path");
        assert!(put["requestBody"].is_object());
        assert!(put["responses"]["204"].is_object());
        assert_eq!(put["security"], json!([{ "bearerAuth": [] }]));
        assert!(secured);
    }

    #[test]
    fn read_body_properties_become_query_parameters() {
        let (_, paths, _) = document(&groups()).unwrap();
        let get = &paths["/groups"]["get"];

        assert!(get.get("requestBody").is_none());
        assert_eq!(
            get["parameters"],
            json!([
                { "name": "name", "in": "query", "required": true, "schema": { "type": "string" } },
                { "name": "note", "in": "query", "required": false, "schema": { "type": "string" } }
            ])
        );

        let put = &paths["/groups/{id}"]["put"];
        assert_eq!(put["parameters"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn colon_params_become_braces() {
        assert_eq!(openapi_path("/groups/:id/roles/:role"), "/groups/{id}/roles/{role}");
        assert_eq!(openapi_path("/"), "/");
    }
}
