use std::collections::{HashMap, HashSet};

use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, GlobalSecondaryIndex, KeySchemaElement, KeyType,
    LocalSecondaryIndex, Projection, ProjectionType, ScalarAttributeType, TableDescription,
};

use super::{extract_hash_range_from_schema, format_sdk_error, send_dynamo_request};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Number,
    Binary,
}

impl AttributeType {
    pub fn from_scalar(scalar: &ScalarAttributeType) -> Option<Self> {
        match scalar {
            ScalarAttributeType::S => Some(AttributeType::String),
            ScalarAttributeType::N => Some(AttributeType::Number),
            ScalarAttributeType::B => Some(AttributeType::Binary),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AttributeType::String => "S",
            AttributeType::Number => "N",
            AttributeType::Binary => "B",
        }
    }

    pub fn to_scalar(self) -> ScalarAttributeType {
        match self {
            AttributeType::String => ScalarAttributeType::S,
            AttributeType::Number => ScalarAttributeType::N,
            AttributeType::Binary => ScalarAttributeType::B,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexProjection {
    All,
    KeysOnly,
    Include(Vec<String>),
}

impl IndexProjection {
    fn from_projection(projection: Option<&Projection>) -> Self {
        let Some(projection) = projection else {
            return IndexProjection::All;
        };
        match projection.projection_type() {
            Some(ProjectionType::KeysOnly) => IndexProjection::KeysOnly,
            Some(ProjectionType::Include) => {
                IndexProjection::Include(projection.non_key_attributes().to_vec())
            }
            _ => IndexProjection::All,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if let IndexProjection::Include(attrs) = self
            && attrs.is_empty()
        {
            return Err("Include projection requires attributes".to_string());
        }
        Ok(())
    }

    pub fn build_projection(&self) -> Result<Projection, String> {
        match self {
            IndexProjection::All => Ok(Projection::builder()
                .projection_type(ProjectionType::All)
                .build()),
            IndexProjection::KeysOnly => Ok(Projection::builder()
                .projection_type(ProjectionType::KeysOnly)
                .build()),
            IndexProjection::Include(attrs) => {
                if attrs.is_empty() {
                    return Err("Include projection requires attributes".to_string());
                }
                Ok(Projection::builder()
                    .projection_type(ProjectionType::Include)
                    .set_non_key_attributes(Some(attrs.clone()))
                    .build())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpec {
    pub name: String,
    pub attr_type: AttributeType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GsiSpec {
    pub name: String,
    pub hash_key: KeySpec,
    pub sort_key: Option<KeySpec>,
    pub projection: IndexProjection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LsiSpec {
    pub name: String,
    pub sort_key: KeySpec,
    pub projection: IndexProjection,
}

/// Everything needed to create a table with the same shape as an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableSpec {
    pub table_name: String,
    pub hash_key: KeySpec,
    pub sort_key: Option<KeySpec>,
    pub gsis: Vec<GsiSpec>,
    pub lsis: Vec<LsiSpec>,
}

impl CreateTableSpec {
    /// Capture the key schema and secondary indexes of a described table.
    pub fn from_description(table_desc: &TableDescription) -> Result<Self, String> {
        let types: HashMap<&str, AttributeType> = table_desc
            .attribute_definitions()
            .iter()
            .filter_map(|def| {
                AttributeType::from_scalar(def.attribute_type())
                    .map(|attr_type| (def.attribute_name(), attr_type))
            })
            .collect();
        let key_spec = |name: String| -> Result<KeySpec, String> {
            let attr_type = types
                .get(name.as_str())
                .copied()
                .ok_or_else(|| format!("no attribute definition for {name}"))?;
            Ok(KeySpec { name, attr_type })
        };

        let table_name = table_desc
            .table_name()
            .ok_or_else(|| "table description has no name".to_string())?
            .to_string();
        let (hash, range) = extract_hash_range_from_schema(table_desc.key_schema());
        let hash_key = key_spec(hash.ok_or_else(|| "table has no partition key".to_string())?)?;
        let sort_key = range.map(&key_spec).transpose()?;

        let mut gsis = Vec::new();
        for gsi in table_desc.global_secondary_indexes() {
            let (hash, range) = extract_hash_range_from_schema(gsi.key_schema());
            gsis.push(GsiSpec {
                name: gsi.index_name().unwrap_or_default().to_string(),
                hash_key: key_spec(hash.ok_or_else(|| "GSI has no partition key".to_string())?)?,
                sort_key: range.map(&key_spec).transpose()?,
                projection: IndexProjection::from_projection(gsi.projection()),
            });
        }

        let mut lsis = Vec::new();
        for lsi in table_desc.local_secondary_indexes() {
            let (_, range) = extract_hash_range_from_schema(lsi.key_schema());
            lsis.push(LsiSpec {
                name: lsi.index_name().unwrap_or_default().to_string(),
                sort_key: key_spec(range.ok_or_else(|| "LSI has no sort key".to_string())?)?,
                projection: IndexProjection::from_projection(lsi.projection()),
            });
        }

        Ok(Self {
            table_name,
            hash_key,
            sort_key,
            gsis,
            lsis,
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.table_name.trim().is_empty() {
            return Err("Table name is required".to_string());
        }
        if self.hash_key.name.trim().is_empty() {
            return Err("Partition key is required".to_string());
        }
        if let Some(sort_key) = self.sort_key.as_ref()
            && sort_key.name.trim().is_empty()
        {
            return Err("Sort key name is required".to_string());
        }

        if !self.lsis.is_empty() && self.sort_key.is_none() {
            return Err("LSI requires a table sort key".to_string());
        }

        let mut index_names = HashSet::new();
        for gsi in &self.gsis {
            if gsi.name.trim().is_empty() {
                return Err("GSI name is required".to_string());
            }
            if !index_names.insert(gsi.name.clone()) {
                return Err(format!("Duplicate index name: {}", gsi.name));
            }
            gsi.projection.validate()?;
        }

        for lsi in &self.lsis {
            if lsi.name.trim().is_empty() {
                return Err("LSI name is required".to_string());
            }
            if !index_names.insert(lsi.name.clone()) {
                return Err(format!("Duplicate index name: {}", lsi.name));
            }
            lsi.projection.validate()?;
        }

        self.attribute_map()?;
        Ok(())
    }

    fn attribute_map(&self) -> Result<HashMap<String, AttributeType>, String> {
        let mut map = HashMap::new();
        register_attribute(&mut map, &self.hash_key)?;
        if let Some(sort_key) = self.sort_key.as_ref() {
            register_attribute(&mut map, sort_key)?;
        }
        for gsi in &self.gsis {
            register_attribute(&mut map, &gsi.hash_key)?;
            if let Some(sort_key) = gsi.sort_key.as_ref() {
                register_attribute(&mut map, sort_key)?;
            }
        }
        for lsi in &self.lsis {
            register_attribute(&mut map, &lsi.sort_key)?;
        }
        Ok(map)
    }
}

fn register_attribute(
    map: &mut HashMap<String, AttributeType>,
    key: &KeySpec,
) -> Result<(), String> {
    if let Some(existing) = map.get(&key.name) {
        if *existing != key.attr_type {
            return Err(format!(
                "Attribute {} has conflicting types ({} vs {})",
                key.name,
                existing.label(),
                key.attr_type.label()
            ));
        }
        return Ok(());
    }
    map.insert(key.name.clone(), key.attr_type);
    Ok(())
}

fn key_schema_element(name: &str, key_type: KeyType) -> Result<KeySchemaElement, String> {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(key_type)
        .build()
        .map_err(|err| err.to_string())
}

pub async fn create_table(client: &Client, spec: &CreateTableSpec) -> Result<(), String> {
    spec.validate()?;

    let mut attribute_definitions = Vec::new();
    for (name, attr_type) in spec.attribute_map()? {
        let def = AttributeDefinition::builder()
            .attribute_name(name)
            .attribute_type(attr_type.to_scalar())
            .build()
            .map_err(|err| err.to_string())?;
        attribute_definitions.push(def);
    }

    let mut key_schema = vec![key_schema_element(&spec.hash_key.name, KeyType::Hash)?];
    if let Some(sort_key) = spec.sort_key.as_ref() {
        key_schema.push(key_schema_element(&sort_key.name, KeyType::Range)?);
    }

    let mut gsi_defs = Vec::new();
    for gsi in &spec.gsis {
        let mut gsi_key_schema = vec![key_schema_element(&gsi.hash_key.name, KeyType::Hash)?];
        if let Some(sort_key) = gsi.sort_key.as_ref() {
            gsi_key_schema.push(key_schema_element(&sort_key.name, KeyType::Range)?);
        }
        let gsi_def = GlobalSecondaryIndex::builder()
            .index_name(gsi.name.clone())
            .set_key_schema(Some(gsi_key_schema))
            .projection(gsi.projection.build_projection()?)
            .build()
            .map_err(|err| err.to_string())?;
        gsi_defs.push(gsi_def);
    }

    let mut lsi_defs = Vec::new();
    for lsi in &spec.lsis {
        let lsi_key_schema = vec![
            key_schema_element(&spec.hash_key.name, KeyType::Hash)?,
            key_schema_element(&lsi.sort_key.name, KeyType::Range)?,
        ];
        let lsi_def = LocalSecondaryIndex::builder()
            .index_name(lsi.name.clone())
            .set_key_schema(Some(lsi_key_schema))
            .projection(lsi.projection.build_projection()?)
            .build()
            .map_err(|err| err.to_string())?;
        lsi_defs.push(lsi_def);
    }

    let mut request = client
        .create_table()
        .table_name(spec.table_name.clone())
        .billing_mode(BillingMode::PayPerRequest)
        .set_attribute_definitions(Some(attribute_definitions))
        .set_key_schema(Some(key_schema));
    if !gsi_defs.is_empty() {
        request = request.set_global_secondary_indexes(Some(gsi_defs));
    }
    if !lsi_defs.is_empty() {
        request = request.set_local_secondary_indexes(Some(lsi_defs));
    }

    let span = tracing::trace_span!(
        "CreateTable",
        table = %spec.table_name,
        gsi_count = spec.gsis.len(),
        lsi_count = spec.lsis.len()
    );
    let result = send_dynamo_request(span, || request.send(), format_sdk_error).await;
    result.map(|_| ()).map_err(|err| format_sdk_error(&err))
}

#[cfg(test)]
mod tests {
    use aws_sdk_dynamodb::types::GlobalSecondaryIndexDescription;

    use super::*;

    fn element(name: &str, key_type: KeyType) -> KeySchemaElement {
        key_schema_element(name, key_type).unwrap()
    }

    fn definition(name: &str, scalar: ScalarAttributeType) -> AttributeDefinition {
        AttributeDefinition::builder()
            .attribute_name(name)
            .attribute_type(scalar)
            .build()
            .unwrap()
    }

    #[test]
    fn spec_is_captured_from_description() {
        let gsi = GlobalSecondaryIndexDescription::builder()
            .index_name("ByStatus")
            .key_schema(element("status", KeyType::Hash))
            .projection(
                Projection::builder()
                    .projection_type(ProjectionType::KeysOnly)
                    .build(),
            )
            .build();
        let table = TableDescription::builder()
            .table_name("orders")
            .key_schema(element("PK", KeyType::Hash))
            .key_schema(element("SK", KeyType::Range))
            .attribute_definitions(definition("PK", ScalarAttributeType::S))
            .attribute_definitions(definition("SK", ScalarAttributeType::N))
            .attribute_definitions(definition("status", ScalarAttributeType::S))
            .global_secondary_indexes(gsi)
            .build();

        let spec = CreateTableSpec::from_description(&table).unwrap();

        assert_eq!(spec.table_name, "orders");
        assert_eq!(spec.hash_key.name, "PK");
        assert_eq!(spec.sort_key.as_ref().unwrap().attr_type, AttributeType::Number);
        assert_eq!(spec.gsis.len(), 1);
        assert_eq!(spec.gsis[0].name, "ByStatus");
        assert_eq!(spec.gsis[0].projection, IndexProjection::KeysOnly);
        assert!(spec.lsis.is_empty());
        spec.validate().unwrap();
    }

    #[test]
    fn missing_key_definition_is_reported() {
        let table = TableDescription::builder()
            .table_name("orders")
            .key_schema(element("PK", KeyType::Hash))
            .build();
        let err = CreateTableSpec::from_description(&table).unwrap_err();
        assert!(err.contains("no attribute definition for PK"));
    }

    #[test]
    fn lsi_requires_table_sort_key() {
        let spec = CreateTableSpec {
            table_name: "demo".to_string(),
            hash_key: KeySpec {
                name: "PK".to_string(),
                attr_type: AttributeType::String,
            },
            sort_key: None,
            gsis: Vec::new(),
            lsis: vec![LsiSpec {
                name: "LSI1".to_string(),
                sort_key: KeySpec {
                    name: "LSI1SK".to_string(),
                    attr_type: AttributeType::String,
                },
                projection: IndexProjection::All,
            }],
        };
        let err = spec.validate().unwrap_err();
        assert!(err.contains("LSI requires a table sort key"));
    }

    #[test]
    fn conflicting_attribute_types_fail() {
        let spec = CreateTableSpec {
            table_name: "demo".to_string(),
            hash_key: KeySpec {
                name: "PK".to_string(),
                attr_type: AttributeType::String,
            },
            sort_key: None,
            gsis: vec![GsiSpec {
                name: "GSI1".to_string(),
                hash_key: KeySpec {
                    name: "PK".to_string(),
                    attr_type: AttributeType::Number,
                },
                sort_key: None,
                projection: IndexProjection::All,
            }],
            lsis: Vec::new(),
        };
        let err = spec.validate().unwrap_err();
        assert!(err.contains("conflicting types"));
    }
}
