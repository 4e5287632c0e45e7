use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::AttributeValue;
use std::collections::HashMap;
use uuid::Uuid;

use super::{LedgerClient, LedgerError, LedgerRow};

/// Ledger kept in a DynamoDB table keyed by a random `id`.
#[derive(Clone)]
pub struct DynamoLedger {
    client: Client,
    table_name: String,
}

impl DynamoLedger {
    pub fn new(client: Client, table_name: String) -> Self {
        log::info!("DynamoDB ledger using table: {}", table_name);
        Self { client, table_name }
    }

    pub fn row_to_attributes(id: Uuid, row: &LedgerRow) -> HashMap<String, AttributeValue> {
        let mut attributes = HashMap::new();
        attributes.insert("id".to_string(), AttributeValue::S(id.to_string()));
        for (column, value) in LedgerRow::COLUMNS.iter().zip(row.values()) {
            if *column == "Analysis" && row.analysis.is_none() {
                continue;
            }
            attributes.insert(column.to_string(), AttributeValue::S(value));
        }
        attributes
    }
}

#[async_trait]
impl LedgerClient for DynamoLedger {
    async fn append_row(&self, row: &LedgerRow) -> Result<(), LedgerError> {
        let id = Uuid::new_v4();
        let attributes = Self::row_to_attributes(id, row);
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(attributes))
            .send()
            .await
            .map_err(|e| {
                log::debug!("put_item for ledger row {} failed: {:?}", id, e);
                LedgerError::DynamoDb(e.to_string())
            })?;
        Ok(())
    }
}
