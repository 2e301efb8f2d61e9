//! Integration tests for building the load-test model

use openapi2locust_common::{
    AuthKind, BodyEncoding, ConfigOverride, CredentialLocation, GenerationConfig, HttpMethod,
    ResponseValidation,
};
use openapi2locust_parser::OpenApiParser;
use serde_json::json;

fn build(yaml: &str) -> openapi2locust_common::LoadTestModel {
    build_with(yaml, &GenerationConfig::default())
}

fn build_with(yaml: &str, config: &GenerationConfig) -> openapi2locust_common::LoadTestModel {
    OpenApiParser::from_yaml(yaml)
        .unwrap()
        .build_model(config)
        .unwrap()
}

const ITEMS_API: &str = r#"
openapi: 3.0.0
info:
  title: Items API
  version: "1.0"
paths:
  /items:
    get:
      responses:
        '200':
          description: ok
    post:
      requestBody:
        content:
          application/json:
            schema:
              type: object
              properties:
                name:
                  type: string
      responses:
        '201':
          description: created
"#;

#[test]
fn test_items_api_tasks_and_weights() {
    let model = build(ITEMS_API);

    assert_eq!(model.class_name, "ItemsAPIUser");
    assert_eq!(model.base_url, "http://localhost");
    assert_eq!(model.endpoints.len(), 2);

    let get = model.endpoint("get_items").unwrap();
    assert_eq!(get.method, HttpMethod::Get);
    assert_eq!(get.weight, 10);
    assert_eq!(get.expected_status.codes, vec![200]);
    assert!(get.request_body.is_none());

    let post = model.endpoint("post_items").unwrap();
    assert_eq!(post.weight, 3);
    assert_eq!(post.expected_status.codes, vec![201]);
    let body = post.request_body.as_ref().unwrap();
    assert_eq!(body.encoding, BodyEncoding::Json);
    assert!(body.value["name"].is_string());
}

#[test]
fn test_task_names_unique() {
    let model = build(
        r#"
openapi: 3.0.0
paths:
  /users/{id}:
    get:
      responses: {'200': {description: ok}}
  /users/{userId}:
    get:
      responses: {'200': {description: ok}}
  /users/id:
    get:
      responses: {'200': {description: ok}}
"#,
    );

    let names: Vec<&str> = model.endpoints.iter().map(|e| e.task_name.as_str()).collect();
    assert_eq!(names, vec!["get_users_id", "get_users_user_id", "get_users_id_2"]);
}

#[test]
fn test_default_only_response_is_wildcard() {
    let model = build(
        r#"
openapi: 3.0.0
paths:
  /ping:
    get:
      responses:
        default:
          description: anything
"#,
    );

    let ping = &model.endpoints[0];
    assert!(ping.expected_status.codes.is_empty());
    assert!(ping.expected_status.wildcard);
}

#[test]
fn test_recursive_schema_terminates() {
    let model = build(
        r##"
openapi: 3.0.0
paths:
  /trees:
    post:
      requestBody:
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/Tree'
      responses:
        '201': {description: created}
components:
  schemas:
    Tree:
      type: object
      required: [label]
      properties:
        label:
          type: string
        parent:
          $ref: '#/components/schemas/Tree'
        children:
          type: array
          items:
            $ref: '#/components/schemas/Tree'
"##,
    );

    let body = &model.endpoints[0].request_body.as_ref().unwrap().value;
    assert!(body["label"].is_string());
    assert!(body["parent"].is_null());
    assert_eq!(body["children"], json!([]));
}

#[test]
fn test_generation_is_deterministic() {
    let first = build(ITEMS_API);
    let second = build(ITEMS_API);
    assert_eq!(first, second);
}

#[test]
fn test_enum_and_example_samples() {
    let model = build(
        r#"
openapi: 3.0.0
paths:
  /orders:
    get:
      parameters:
        - name: status
          in: query
          required: true
          schema:
            type: string
            enum: [pending, shipped]
        - name: page
          in: query
          required: true
          example: 3
        - name: verbose
          in: query
          schema:
            type: boolean
      responses: {'200': {description: ok}}
"#,
    );

    let orders = &model.endpoints[0];
    assert_eq!(orders.query_params["status"], json!("pending"));
    assert_eq!(orders.query_params["page"], json!(3));
    assert!(!orders.query_params.contains_key("verbose"));
}

#[test]
fn test_unresolvable_operation_ref_skips_endpoint() {
    let model = build(
        r##"
openapi: 3.0.0
paths:
  /good:
    get:
      responses: {'200': {description: ok}}
  /bad:
    post:
      requestBody:
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/Nope'
      responses: {'201': {description: created}}
"##,
    );

    assert_eq!(model.endpoints.len(), 1);
    assert_eq!(model.endpoints[0].task_name, "get_good");
    assert_eq!(model.skipped.len(), 1);
    assert_eq!(model.skipped[0].method, HttpMethod::Post);
    assert_eq!(model.skipped[0].path, "/bad");
}

#[test]
fn test_parameters_merge_and_header_filtering() {
    let model = build(
        r##"
openapi: 3.0.0
paths:
  /accounts/{accountId}/items:
    parameters:
      - name: accountId
        in: path
        required: true
        schema: {type: integer}
      - name: X-Trace
        in: header
        required: true
        schema: {type: string, example: path-level}
    get:
      parameters:
        - name: X-Trace
          in: header
          required: true
          schema: {type: string, example: op-level}
        - name: Authorization
          in: header
          required: true
          schema: {type: string}
        - $ref: '#/components/parameters/Session'
      responses: {'200': {description: ok}}
components:
  parameters:
    Session:
      name: session
      in: cookie
      required: true
      schema: {type: string, example: abc123}
"##,
    );

    let endpoint = &model.endpoints[0];
    assert_eq!(endpoint.path_params["accountId"], "1");
    assert_eq!(endpoint.headers.len(), 1);
    assert_eq!(endpoint.headers["X-Trace"], "op-level");
    assert_eq!(endpoint.cookies["session"], "abc123");
}

#[test]
fn test_undeclared_path_param_uses_name_hint() {
    let model = build(
        r#"
openapi: 3.0.0
paths:
  /files/{fileName}:
    get:
      responses: {'200': {description: ok}}
"#,
    );

    assert_eq!(model.endpoints[0].path_params["fileName"], "John Smith");
}

#[test]
fn test_request_body_preference_and_example() {
    let model = build(
        r#"
openapi: 3.0.0
paths:
  /upload:
    post:
      requestBody:
        content:
          text/plain:
            schema: {type: string}
          application/x-www-form-urlencoded:
            example:
              field: value
      responses: {'204': {description: done}}
"#,
    );

    let body = model.endpoints[0].request_body.as_ref().unwrap();
    assert_eq!(body.content_type, "application/x-www-form-urlencoded");
    assert_eq!(body.encoding, BodyEncoding::Form);
    assert_eq!(body.value, json!({"field": "value"}));
}

#[test]
fn test_response_validation_rules() {
    let yaml = r##"
openapi: 3.0.0
paths:
  /users/{id}:
    get:
      responses:
        '200':
          description: ok
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/User'
  /users:
    get:
      responses:
        '200':
          description: ok
          content:
            application/json:
              schema:
                type: array
                items: {$ref: '#/components/schemas/User'}
components:
  schemas:
    User:
      type: object
      required: [id, email]
      properties:
        id: {type: integer}
        email: {type: string, format: email}
"##;

    let model = build(yaml);
    assert_eq!(
        model.endpoint("get_users_id").unwrap().response_validation,
        Some(ResponseValidation::Object {
            required: vec!["id".to_string(), "email".to_string()]
        })
    );
    assert_eq!(
        model.endpoint("get_users").unwrap().response_validation,
        Some(ResponseValidation::Array)
    );

    let config = GenerationConfig::default().merged(
        ConfigOverride::from_yaml("template:\n  add_response_validation: false\n").unwrap(),
    );
    let model = build_with(yaml, &config);
    assert!(model
        .endpoints
        .iter()
        .all(|e| e.response_validation.is_none()));
}

#[test]
fn test_weights_from_config() {
    let config = GenerationConfig::default().merged(
        ConfigOverride::from_yaml("default_weight:\n  get: 7\n").unwrap(),
    );
    let model = build_with(ITEMS_API, &config);

    assert_eq!(model.endpoint("get_items").unwrap().weight, 7);
    assert_eq!(model.endpoint("post_items").unwrap().weight, 3);
}

#[test]
fn test_locale_changes_samples() {
    let config = GenerationConfig::default()
        .merged(ConfigOverride::from_yaml("data_faker:\n  locale: de_DE\n").unwrap());
    let model = build_with(
        r#"
openapi: 3.0.0
paths:
  /cities:
    get:
      parameters:
        - name: city
          in: query
          required: true
          schema: {type: string}
      responses: {'200': {description: ok}}
"#,
        &config,
    );

    assert_eq!(model.endpoints[0].query_params["city"], json!("Berlin"));
}

#[test]
fn test_query_api_key_auth_and_opt_out() {
    let model = build(
        r#"
openapi: 3.0.0
security:
  - key: []
paths:
  /secure:
    get:
      responses: {'200': {description: ok}}
  /public:
    get:
      security: []
      responses: {'200': {description: ok}}
components:
  securitySchemes:
    key:
      type: apiKey
      in: query
      name: api_key
"#,
    );

    let auth = model.auth.as_ref().unwrap();
    assert_eq!(
        auth.kind,
        AuthKind::ApiKey {
            param_name: "api_key".to_string(),
            location: CredentialLocation::Query,
        }
    );
    assert_eq!(auth.env_vars, vec!["KEY_API_KEY"]);
    assert!(model.endpoint("get_secure").unwrap().uses_auth);
    assert!(!model.endpoint("get_public").unwrap().uses_auth);
}
