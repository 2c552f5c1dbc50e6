use std::collections::{HashMap, HashSet};
use std::time::Duration;

use assert_cmd::Command;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::{Credentials, Region};
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, KeySchemaElement, KeyType, ProvisionedThroughput,
    ScalarAttributeType,
};
use color_eyre::Result;
use serde_json::Value;
use testcontainers::{
    ContainerAsync, GenericImage, ImageExt,
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
};

#[allow(dead_code)]
struct DynamoDBEnv {
    container: ContainerAsync<GenericImage>,
    endpoint_url: String,
}

const CREATE_TABLE_MAX_ATTEMPTS: u32 = 6;
const CREATE_TABLE_RETRY_DELAY_MS: u64 = 150;

fn is_transient_dispatch_failure(err: &impl std::fmt::Debug) -> bool {
    let rendered = format!("{err:?}");
    rendered.contains("DispatchFailure")
        || rendered.contains("TransientError")
        || rendered.contains("IncompleteMessage")
}

async fn create_table_with_retry(
    client: &aws_sdk_dynamodb::Client,
    table_name: &str,
) -> Result<()> {
    for attempt in 1..=CREATE_TABLE_MAX_ATTEMPTS {
        let key_schema = KeySchemaElement::builder()
            .attribute_name("PK".to_string())
            .key_type(KeyType::Hash)
            .build()
            .unwrap();
        let attribute_def = AttributeDefinition::builder()
            .attribute_name("PK".to_string())
            .attribute_type(ScalarAttributeType::S)
            .build()
            .unwrap();
        let provisioned_throughput = ProvisionedThroughput::builder()
            .read_capacity_units(10)
            .write_capacity_units(5)
            .build()
            .unwrap();

        match client
            .create_table()
            .table_name(table_name)
            .key_schema(key_schema)
            .attribute_definitions(attribute_def)
            .provisioned_throughput(provisioned_throughput)
            .send()
            .await
        {
            Ok(_) => return Ok(()),
            Err(err)
                if attempt < CREATE_TABLE_MAX_ATTEMPTS && is_transient_dispatch_failure(&err) =>
            {
                let delay_ms = CREATE_TABLE_RETRY_DELAY_MS * u64::from(attempt);
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
            Err(err) => {
                return Err(color_eyre::eyre::eyre!(
                    "failed to create table {table_name} after {attempt} attempt(s): {err:?}"
                ));
            }
        }
    }
    unreachable!("create_table_with_retry must return from loop")
}

async fn new_dynamodb_env() -> Result<DynamoDBEnv> {
    let container = GenericImage::new("amazon/dynamodb-local", "2.5.2")
        .with_exposed_port(8000.tcp())
        .with_wait_for(WaitFor::message_on_stdout("CorsParams"))
        .with_user("root")
        .with_cmd(vec!["-jar", "DynamoDBLocal.jar", "-inMemory", "-sharedDb"])
        .start()
        .await
        .expect("Failed to start DynamoDB");
    let port = container.get_host_port_ipv4(8000).await?;
    Ok(DynamoDBEnv {
        container,
        endpoint_url: format!("http://127.0.0.1:{}", port),
    })
}

async fn new_local_client(endpoint_url: &str) -> Result<aws_sdk_dynamodb::Client> {
    let config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(Credentials::new("local", "local", None, None, "test"))
        .endpoint_url(endpoint_url)
        .load()
        .await;
    Ok(aws_sdk_dynamodb::Client::new(&config))
}

async fn put_item(
    client: &aws_sdk_dynamodb::Client,
    table_name: &str,
    attributes: Vec<(&str, AttributeValue)>,
) {
    let item: HashMap<String, AttributeValue> = attributes
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();
    client
        .put_item()
        .table_name(table_name)
        .set_item(Some(item))
        .send()
        .await
        .unwrap();
}

fn s(value: &str) -> AttributeValue {
    AttributeValue::S(value.to_string())
}

fn gridmate(endpoint_url: &str) -> Command {
    let mut cmd = Command::cargo_bin("gridmate").unwrap();
    cmd.env("AWS_REGION", "us-east-1")
        .env("AWS_ACCESS_KEY_ID", "local")
        .env("AWS_SECRET_ACCESS_KEY", "local")
        .arg("--endpoint-url")
        .arg(endpoint_url);
    cmd
}

fn items_json(endpoint_url: &str, args: &[&str]) -> Value {
    let stdout = gridmate(endpoint_url)
        .arg("items")
        .args(args)
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&stdout).expect("output is valid JSON")
}

fn item_by_id<'a>(output: &'a Value, id: &str) -> &'a serde_json::Map<String, Value> {
    output["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_object)
        .find(|item| item["_ItemName_"] == id)
        .unwrap_or_else(|| panic!("item {id} missing from output"))
}

#[tokio::test]
async fn list_tables() {
    let env = new_dynamodb_env().await.unwrap();
    let table_names = vec![
        String::from("test-table1"),
        String::from("test-table2"),
        String::from("test-table3"),
    ];
    let client = new_local_client(&env.endpoint_url).await.unwrap();
    for table_name in &table_names {
        create_table_with_retry(&client, table_name).await.unwrap();
    }
    let stdout = gridmate(&env.endpoint_url)
        .arg("list-tables")
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: serde_json::Value = serde_json::from_slice(&stdout).expect("output is valid JSON");
    let names: Vec<String> = parsed
        .as_array()
        .expect("expected top-level JSON array")
        .iter()
        .filter_map(|v| v.as_str().map(|s| s.to_string()))
        .collect();
    assert_eq!(names, table_names);
}

#[tokio::test]
async fn items_flatten_into_sparse_rows() {
    let env = new_dynamodb_env().await.unwrap();
    let client = new_local_client(&env.endpoint_url).await.unwrap();
    create_table_with_retry(&client, "inventory").await.unwrap();
    put_item(&client, "inventory", vec![("PK", s("a")), ("x", s("1")), ("y", s("2"))]).await;
    put_item(&client, "inventory", vec![("PK", s("b")), ("x", s("3"))]).await;
    put_item(
        &client,
        "inventory",
        vec![
            ("PK", s("c")),
            (
                "tag",
                AttributeValue::Ss(vec!["red".to_string(), "blue".to_string()]),
            ),
        ],
    )
    .await;

    let output = items_json(&env.endpoint_url, &["--table", "inventory"]);

    let columns: Vec<&String> = output["attr"].as_object().unwrap().keys().collect();
    assert_eq!(columns[0], "_ItemName_");
    for expected in ["x#0", "y#0", "tag#0", "tag#1"] {
        assert!(
            columns.iter().any(|column| column.as_str() == expected),
            "missing column {expected} in {columns:?}"
        );
    }
    assert_eq!(columns.len(), 5);
    assert_eq!(output["attr"]["tag#1"]["name"], "tag");
    assert_eq!(output["items"].as_array().unwrap().len(), 3);

    let a = item_by_id(&output, "a");
    assert_eq!(a["x#0"], "1");
    assert_eq!(a["y#0"], "2");
    let b = item_by_id(&output, "b");
    assert_eq!(b["x#0"], "3");
    assert!(b.get("y#0").is_none());
    let c = item_by_id(&output, "c");
    let tags: HashSet<&str> = [c["tag#0"].as_str().unwrap(), c["tag#1"].as_str().unwrap()]
        .into_iter()
        .collect();
    assert_eq!(tags, HashSet::from(["red", "blue"]));
    assert_eq!(output["meta"]["truncated"], false);
}

#[tokio::test]
async fn page_limit_truncates_listing() {
    let env = new_dynamodb_env().await.unwrap();
    let client = new_local_client(&env.endpoint_url).await.unwrap();
    create_table_with_retry(&client, "paged").await.unwrap();
    for n in 0..5 {
        put_item(&client, "paged", vec![("PK", s(&format!("item-{n}")))]).await;
    }

    let output = items_json(
        &env.endpoint_url,
        &["--table", "paged", "--page-size", "1", "--max-pages", "2"],
    );

    assert_eq!(output["items"].as_array().unwrap().len(), 2);
    assert_eq!(output["meta"]["pages"], 2);
    assert_eq!(output["meta"]["truncated"], true);
}

#[tokio::test]
async fn update_remove_and_clear() {
    let env = new_dynamodb_env().await.unwrap();
    let client = new_local_client(&env.endpoint_url).await.unwrap();
    create_table_with_retry(&client, "editable").await.unwrap();
    put_item(&client, "editable", vec![("PK", s("a")), ("color", s("red"))]).await;
    put_item(&client, "editable", vec![("PK", s("b"))]).await;

    gridmate(&env.endpoint_url)
        .args(["update", "--table", "editable", "--pk", "a", "--set", "color=green"])
        .assert()
        .success();
    let output = items_json(&env.endpoint_url, &["--table", "editable"]);
    assert_eq!(item_by_id(&output, "a")["color#0"], "green");

    gridmate(&env.endpoint_url)
        .args(["remove", "--table", "editable", "--pk", "b"])
        .assert()
        .success();
    let output = items_json(&env.endpoint_url, &["--table", "editable"]);
    assert_eq!(output["items"].as_array().unwrap().len(), 1);

    gridmate(&env.endpoint_url)
        .args(["clear", "--table", "editable", "--yes"])
        .assert()
        .success();
    let output = items_json(&env.endpoint_url, &["--table", "editable"]);
    assert!(output["items"].as_array().unwrap().is_empty());
    assert_eq!(output["attr"].as_object().unwrap().len(), 1);
}
